/// Engagement endpoints
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::ApiResponse;
use crate::services::EngagementDispatcher;

/// Request to send one engagement notification immediately
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImmediateSendPayload {
    pub user_id: Uuid,
}

/// Send an engagement notification to a single user, right now.
///
/// POST /api/v1/engagement/send
///
/// Operational testing hook; does not stamp the user's last-notified date.
pub async fn send_immediate(
    dispatcher: web::Data<Arc<EngagementDispatcher>>,
    req: web::Json<ImmediateSendPayload>,
) -> ActixResult<HttpResponse> {
    match dispatcher.send_immediate(req.user_id).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::ok(result))),
        Err(e) => Ok(HttpResponse::build(e.status_code())
            .json(ApiResponse::<()>::err(e.to_string()))),
    }
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/engagement").route("/send", web::post().to(send_immediate)),
    );
}
