/// Daily dispatch scheduler
///
/// Sleeps until the next occurrence of the configured local wall-clock time
/// (fixed UTC offset, no DST), runs the dispatcher with that day's date, and
/// repeats. A failed run is logged and counted; the loop continues with the
/// next occurrence so a transient failure never stops the schedule.
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::services::dispatcher::EngagementDispatcher;

pub struct DailyScheduler {
    dispatcher: Arc<EngagementDispatcher>,
    hour: u32,
    minute: u32,
    offset: FixedOffset,
}

impl DailyScheduler {
    /// Rejects out-of-range schedule times and offsets rather than panicking
    /// later, so callers other than `Config::from_env` are safe too.
    pub fn new(dispatcher: Arc<EngagementDispatcher>, config: &SchedulerConfig) -> Result<Self> {
        if config.hour > 23 || config.minute > 59 {
            return Err(AppError::Config(format!(
                "invalid schedule time {:02}:{:02}",
                config.hour, config.minute
            )));
        }
        if config.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::Config(format!(
                "invalid UTC offset: {} minutes",
                config.utc_offset_minutes
            )));
        }
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Config(format!(
                "invalid UTC offset: {} minutes",
                config.utc_offset_minutes
            ))
        })?;
        Ok(Self {
            dispatcher,
            hour: config.hour,
            minute: config.minute,
            offset,
        })
    }

    /// Time remaining until the next scheduled occurrence after `now`.
    fn until_next_run(&self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&self.offset);
        let today_target = local
            .date_naive()
            .and_hms_opt(self.hour, self.minute, 0)
            .expect("schedule time validated at construction");
        let mut target = today_target
            .and_local_timezone(self.offset)
            .single()
            .expect("fixed offsets have unambiguous local times");

        if target <= local {
            target = target + chrono::Duration::days(1);
        }

        (target - local)
            .to_std()
            .unwrap_or_else(|_| Duration::from_secs(0))
    }

    pub async fn run(self) {
        info!(
            "Engagement dispatch scheduled daily at {:02}:{:02} (UTC{})",
            self.hour, self.minute, self.offset
        );

        loop {
            let delay = self.until_next_run(Utc::now());
            info!("Next engagement dispatch in {:?}", delay);
            tokio::time::sleep(delay).await;

            let today = Utc::now().with_timezone(&self.offset).date_naive();
            let started = std::time::Instant::now();
            match self.dispatcher.run(today).await {
                Ok(summary) => {
                    metrics::observe_run("success", started.elapsed());
                    info!(
                        "Engagement dispatch for {} complete: {} sent",
                        today, summary.sent
                    );
                }
                Err(e) => {
                    metrics::observe_run("failure", started.elapsed());
                    error!("Engagement dispatch for {} failed: {}", today, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::services::push::{PushError, PushSender};
    use crate::services::store::UserStore;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    struct NoopStore;

    #[async_trait]
    impl UserStore for NoopStore {
        async fn list_candidates(&self, _today: NaiveDate) -> crate::Result<Vec<crate::models::User>> {
            Ok(Vec::new())
        }
        async fn get_user(&self, _user_id: Uuid) -> crate::Result<Option<crate::models::User>> {
            Ok(None)
        }
        async fn set_daily_preference(&self, _user_id: Uuid, _enabled: bool) -> crate::Result<bool> {
            Ok(false)
        }
        async fn commit_engagement_updates(
            &self,
            _updates: &[crate::models::EngagementUpdate],
        ) -> crate::Result<()> {
            Ok(())
        }
    }

    struct NoopSender;

    #[async_trait]
    impl PushSender for NoopSender {
        async fn send(
            &self,
            _token: &str,
            _title: &str,
            _body: &str,
            _message_type: &str,
        ) -> std::result::Result<String, PushError> {
            Ok("noop".to_string())
        }
    }

    fn try_scheduler(hour: u32, minute: u32, offset_minutes: i32) -> Result<DailyScheduler> {
        let dispatcher = Arc::new(EngagementDispatcher::new(
            Arc::new(NoopStore),
            Arc::new(NoopSender),
        ));
        DailyScheduler::new(
            dispatcher,
            &SchedulerConfig {
                enabled: true,
                hour,
                minute,
                utc_offset_minutes: offset_minutes,
            },
        )
    }

    fn scheduler(hour: u32, minute: u32, offset_minutes: i32) -> DailyScheduler {
        try_scheduler(hour, minute, offset_minutes).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        // 03:00 UTC is 08:00 at +05:00; the 10:00 run is two hours away.
        let s = scheduler(10, 0, 300);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        assert_eq!(s.until_next_run(now), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        // 06:00 UTC is 11:00 at +05:00, past today's 10:00; next run is
        // tomorrow, 23 hours away.
        let s = scheduler(10, 0, 300);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap();
        assert_eq!(s.until_next_run(now), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn test_exact_schedule_time_rolls_forward() {
        // At exactly 10:00 local the next run is a full day out.
        let s = scheduler(10, 0, 300);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();
        assert_eq!(s.until_next_run(now), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_out_of_range_config_is_rejected() {
        assert!(matches!(
            try_scheduler(24, 0, 300),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            try_scheduler(10, 60, 300),
            Err(AppError::Config(_))
        ));
        // Offset past +14:00 never silently wraps into a valid FixedOffset.
        assert!(matches!(
            try_scheduler(10, 0, 15 * 60),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_negative_offset() {
        let s = scheduler(10, 30, -120);
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        // 12:00 UTC is 10:00 at -02:00; the 10:30 run is 30 minutes away.
        assert_eq!(s.until_next_run(now), Duration::from_secs(30 * 60));
    }
}
