use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::core::{Coordinator, PairingError};
use crate::models::{
    ErrorResponse, HealthResponse, Notification, NotificationsQuery, PairId, PairingResponse, Request,
    SubmitRequest, UserRequest, VoteRequest,
};
use crate::services::{Outbox, StartLimiter};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub outbox: Arc<Outbox>,
    pub limiter: Arc<StartLimiter>,
}

/// Configure all pairing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stats", web::get().to(stats))
        .route("/start", web::post().to(start))
        .route("/requests", web::post().to(submit_request))
        .route("/votes", web::post().to(vote))
        .route("/cancel", web::post().to(cancel))
        .route("/notifications", web::get().to(notifications));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Waiting and pending counts
async fn stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.coordinator.stats().await)
}

/// Start over
///
/// POST /api/v1/start
///
/// Rate limited. Removes the caller from the waiting registry and cancels any
/// pair they are part of; the stranded partner is notified through the outbox.
async fn start(state: web::Data<AppState>, req: web::Json<UserRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    if !state.limiter.check(&req.user_id).await {
        return HttpResponse::TooManyRequests().json(ErrorResponse {
            error: "rate_limited".to_string(),
            message: "Too many attempts in a short time, try again in a few minutes".to_string(),
            status_code: 429,
        });
    }

    let notifications = state.coordinator.handle_reset(&req.user_id).await;
    respond(&state, &req.user_id, notifications).await
}

/// Submit a meal request
///
/// POST /api/v1/requests
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "chatId": "string",
///   "location": "Center",
///   "offsetMinutes": 30,
///   "displayName": "string",
///   "username": "string"
/// }
/// ```
async fn submit_request(state: web::Data<AppState>, req: web::Json<SubmitRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let req = req.into_inner();
    let when = req.desired_time(Utc::now());

    let request = match Request::new(req.user_id.clone(), req.chat_id, req.location, when) {
        Ok(request) => request
            .with_display_name(req.display_name)
            .with_username(req.username),
        Err(e) => return pairing_error(e),
    };

    match state.coordinator.handle_request(request).await {
        Ok(notifications) => respond(&state, &req.user_id, notifications).await,
        Err(e) => pairing_error(e),
    }
}

/// Accept or decline a proposed pair
///
/// POST /api/v1/votes
///
/// Request body:
/// ```json
/// { "pairId": "string", "userId": "string", "accept": true }
/// ```
async fn vote(state: web::Data<AppState>, req: web::Json<VoteRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let pair_id = PairId::from(req.pair_id.as_str());
    match state
        .coordinator
        .handle_vote(&pair_id, &req.user_id, req.accept)
        .await
    {
        Ok(notifications) => respond(&state, &req.user_id, notifications).await,
        Err(e) => pairing_error(e),
    }
}

/// Stop waiting for a match
async fn cancel(state: web::Data<AppState>, req: web::Json<UserRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    match state.coordinator.handle_cancel(&req.user_id).await {
        Ok(()) => HttpResponse::Ok().json(PairingResponse { notifications: vec![] }),
        Err(e) => pairing_error(e),
    }
}

/// Drain the caller's outbox
///
/// GET /api/v1/notifications?userId={userId}
async fn notifications(
    state: web::Data<AppState>,
    query: web::Query<NotificationsQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors);
    }

    let notifications = state.outbox.drain(&query.user_id).await;
    HttpResponse::Ok().json(PairingResponse { notifications })
}

/// Return the caller's notices inline and queue everyone else's
async fn respond(state: &AppState, caller: &str, notifications: Vec<Notification>) -> HttpResponse {
    let (own, others): (Vec<Notification>, Vec<Notification>) = notifications
        .into_iter()
        .partition(|n| n.recipient == caller);

    if !others.is_empty() {
        state.outbox.deliver(others).await;
    }

    HttpResponse::Ok().json(PairingResponse { notifications: own })
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: field_errors={:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn pairing_error(err: PairingError) -> HttpResponse {
    let status = match &err {
        PairingError::AlreadyWaiting(_) => StatusCode::CONFLICT,
        PairingError::SessionNotFound(_) | PairingError::NotWaiting(_) => StatusCode::NOT_FOUND,
        PairingError::UnknownParty { .. } => StatusCode::FORBIDDEN,
        PairingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };

    tracing::debug!("Pairing operation rejected: {}", err);
    HttpResponse::build(status).json(ErrorResponse {
        error: err.code().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_error_status() {
        let response = pairing_error(PairingError::AlreadyWaiting("u1".into()));
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = pairing_error(PairingError::UnknownParty {
            pair_id: "p".into(),
            user_id: "u".into(),
        });
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = pairing_error(PairingError::NotWaiting("u1".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
