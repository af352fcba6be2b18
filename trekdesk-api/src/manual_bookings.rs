use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use trekdesk_booking::{BookingForm, IntakeFlow, IntakeService, UserDetailsForm};
use trekdesk_core::RecordingNotifier;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::ActionResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PhoneLookupRequest {
    pub phone: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/manual-bookings", post(start_flow))
        .route("/v1/manual-bookings/{flow_id}", get(get_flow))
        .route("/v1/manual-bookings/{flow_id}/phone", post(lookup_phone))
        .route("/v1/manual-bookings/{flow_id}/user", post(create_user))
        .route("/v1/manual-bookings/{flow_id}/back", post(go_back))
        .route("/v1/manual-bookings/{flow_id}/submit", post(submit))
}

fn service(state: &AppState) -> (IntakeService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let service = IntakeService::new(
        state.users.clone(),
        state.bookings.clone(),
        state.batches.clone(),
        notifier.clone(),
    );
    (service, notifier)
}

async fn find_flow(state: &AppState, flow_id: Uuid) -> Result<Arc<Mutex<IntakeFlow>>, AppError> {
    state
        .flows
        .read()
        .await
        .get(&flow_id)
        .cloned()
        .ok_or_else(|| AppError::NotFoundError(format!("Manual booking {} not found", flow_id)))
}

/// POST /v1/manual-bookings
async fn start_flow(State(state): State<AppState>) -> (StatusCode, Json<IntakeFlow>) {
    let flow = IntakeFlow::new();
    tracing::info!(flow_id = %flow.id, "Manual booking started");
    state
        .flows
        .write()
        .await
        .insert(flow.id, Arc::new(Mutex::new(flow.clone())));
    (StatusCode::CREATED, Json(flow))
}

/// GET /v1/manual-bookings/{flow_id}
async fn get_flow(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<IntakeFlow>, AppError> {
    let flow = find_flow(&state, flow_id).await?;
    let flow = flow.lock().await.clone();
    Ok(Json(flow))
}

/// POST /v1/manual-bookings/{flow_id}/phone
async fn lookup_phone(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
    Json(req): Json<PhoneLookupRequest>,
) -> Result<Json<ActionResponse<IntakeFlow>>, AppError> {
    let handle = find_flow(&state, flow_id).await?;
    let mut flow = handle.lock().await;
    let (service, notifier) = service(&state);

    service.lookup_phone(&mut flow, &req.phone).await?;
    Ok(Json(ActionResponse::new(flow.clone(), &notifier)))
}

/// POST /v1/manual-bookings/{flow_id}/user
async fn create_user(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
    Json(form): Json<UserDetailsForm>,
) -> Result<Json<ActionResponse<IntakeFlow>>, AppError> {
    let handle = find_flow(&state, flow_id).await?;
    let mut flow = handle.lock().await;
    let (service, notifier) = service(&state);

    service.create_user(&mut flow, form).await?;
    Ok(Json(ActionResponse::new(flow.clone(), &notifier)))
}

/// POST /v1/manual-bookings/{flow_id}/back
async fn go_back(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<IntakeFlow>, AppError> {
    let handle = find_flow(&state, flow_id).await?;
    let mut flow = handle.lock().await;

    flow.back()?;
    Ok(Json(flow.clone()))
}

/// POST /v1/manual-bookings/{flow_id}/submit
async fn submit(
    State(state): State<AppState>,
    Path(flow_id): Path<Uuid>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<ActionResponse<IntakeFlow>>), AppError> {
    let handle = find_flow(&state, flow_id).await?;
    let mut flow = handle.lock().await;
    let (service, notifier) = service(&state);

    service.submit(&mut flow, form).await?;
    Ok((StatusCode::CREATED, Json(ActionResponse::new(flow.clone(), &notifier))))
}
