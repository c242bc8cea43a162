use actix_web::{middleware, web, App, HttpServer};
use engagement_service::handlers::{register_engagement, register_preferences};
use engagement_service::services::{
    EngagementDispatcher, FcmPushSender, NotificationQueue, NotificationRequestWorker,
    PgNotificationQueue, PgUserStore, PushSender, ScheduledNotificationWorker, UserStore,
};
use engagement_service::{metrics, scheduler::DailyScheduler, Config};
use pulse_fcm_shared::{FcmClient, ServiceAccountKey};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting engagement service");

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Successfully connected to database");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "Database connection failed",
            ));
        }
    };

    let fcm_client = match &config.fcm.credentials_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let credentials: ServiceAccountKey = serde_json::from_str(&raw)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            tracing::info!("FCM client configured for project {}", credentials.project_id);
            Some(Arc::new(FcmClient::new(credentials)))
        }
        None => {
            tracing::warn!("FCM_CREDENTIALS_PATH not set; push delivery disabled");
            None
        }
    };

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db_pool.clone()));
    let sender: Arc<dyn PushSender> = Arc::new(FcmPushSender::new(fcm_client));
    let dispatcher = Arc::new(EngagementDispatcher::new(store.clone(), sender.clone()));

    if config.scheduler.enabled {
        let daily = DailyScheduler::new(dispatcher.clone(), &config.scheduler)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        tokio::spawn(daily.run());
    } else {
        tracing::warn!("Daily engagement schedule disabled by configuration");
    }

    let queue: Arc<dyn NotificationQueue> = Arc::new(PgNotificationQueue::new(db_pool.clone()));

    let scheduled_worker = ScheduledNotificationWorker::new(
        queue.clone(),
        store.clone(),
        sender.clone(),
        &config.workers,
    );
    tokio::spawn(scheduled_worker.run());

    let request_worker =
        NotificationRequestWorker::new(queue.clone(), sender.clone(), &config.workers);
    tokio::spawn(request_worker.run());

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(store.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/", web::get().to(|| async { "Engagement Service v1.0" }))
            .configure(|cfg| {
                register_engagement(cfg);
                register_preferences(cfg);
            })
    })
    .bind(&addr)?
    .run()
    .await
}
