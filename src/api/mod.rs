use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Course, NewCourseRequest, UpdateCourseRequest};
use crate::services::{
    CheckoutRequest, CheckoutService, EnrollmentDetails, EnrollmentStatusService,
    WebhookReconciler,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/api/checkout-session", post(create_checkout_session))
        .route("/api/webhook", post(stripe_webhook))
        .route("/api/enrollment-details", get(enrollment_details))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.store.list_courses().await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = Course::new(req);
    state.store.insert_course(&course).await?;
    Ok(Json(course))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let course = state
        .store
        .get_course(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = state
        .store
        .update_course(&id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.delete_course(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

#[derive(Serialize)]
struct CheckoutResponse {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn create_checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let service = CheckoutService::new(
        state.store.clone(),
        state.payments.clone(),
        state.config.base_url.clone(),
    );
    let session_id = service.create_session(req).await?;
    Ok(Json(CheckoutResponse { session_id }))
}

#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

/// Raw-body endpoint: the signature covers the exact bytes on the wire, so
/// the payload must not go through the JSON extractor first.
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe signature".to_string()))?;

    let reconciler = WebhookReconciler::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.webhook_secret.clone(),
    );
    reconciler.process(&body, signature).await?;

    // Acknowledge every verified outcome, ignored and duplicate ones
    // included, so the provider stops redelivering.
    Ok(Json(WebhookAck { received: true }))
}

#[derive(Deserialize)]
struct DetailsQuery {
    session_id: Option<String>,
}

async fn enrollment_details(
    State(state): State<AppState>,
    Query(query): Query<DetailsQuery>,
) -> Result<Json<EnrollmentDetails>, AppError> {
    let session_id = query
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing session ID".to_string()))?;

    let service = EnrollmentStatusService::new(state.store.clone(), state.payments.clone());
    let details = service.lookup(&session_id).await?;
    Ok(Json(details))
}
