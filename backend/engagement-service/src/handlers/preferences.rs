/// Notification preference handlers
///
/// Only the `daily` engagement flag is owned here; other preference keys are
/// passed through untouched.
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::ApiResponse;
use crate::services::UserStore;

/// Update notification preferences request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdatePreferencesPayload {
    pub daily: Option<bool>,
}

/// Get a user's notification preferences
///
/// GET /api/v1/preferences/{user_id}
pub async fn get_preferences(
    store: web::Data<Arc<dyn UserStore>>,
    path: web::Path<Uuid>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    match store.get_user(user_id).await {
        Ok(Some(user)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::ok(user.notification_preferences)))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::err("User not found".to_string()))),
        Err(e) => {
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::err(e.to_string())))
        }
    }
}

/// Update a user's notification preferences
///
/// PUT /api/v1/preferences/{user_id}
pub async fn update_preferences(
    store: web::Data<Arc<dyn UserStore>>,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePreferencesPayload>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    // Targeted write: only the `daily` key is touched, so a concurrent
    // preference write by the surrounding application is never reverted.
    if let Some(daily) = req.daily {
        match store.set_daily_preference(user_id, daily).await {
            Ok(true) => {}
            Ok(false) => {
                return Ok(HttpResponse::NotFound()
                    .json(ApiResponse::<()>::err("User not found".to_string())))
            }
            Err(e) => {
                return Ok(HttpResponse::InternalServerError()
                    .json(ApiResponse::<()>::err(e.to_string())))
            }
        }
    }

    match store.get_user(user_id).await {
        Ok(Some(user)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::ok(user.notification_preferences)))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::err("User not found".to_string()))),
        Err(e) => {
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::err(e.to_string())))
        }
    }
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/preferences")
            .route("/{user_id}", web::get().to(get_preferences))
            .route("/{user_id}", web::put().to(update_preferences)),
    );
}
