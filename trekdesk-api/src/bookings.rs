use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use trekdesk_booking::{CancellationService, RefundQuote};
use trekdesk_core::RecordingNotifier;
use trekdesk_shared::RefundType;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::ActionResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuery {
    #[serde(default)]
    pub refund_type: RefundType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub refund_type: RefundType,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{booking_id}/refund-quote", get(refund_quote))
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
}

fn service(state: &AppState) -> (CancellationService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let service = CancellationService::new(
        state.bookings.clone(),
        state.batches.clone(),
        notifier.clone(),
        state.refund_policy,
    );
    (service, notifier)
}

/// GET /v1/bookings/{booking_id}/refund-quote?refundType=auto
async fn refund_quote(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Query(query): Query<RefundQuery>,
) -> Result<Json<RefundQuote>, AppError> {
    let (service, _) = service(&state);
    let quote = service.quote(booking_id, query.refund_type, Utc::now()).await?;
    Ok(Json(quote))
}

/// POST /v1/bookings/{booking_id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<ActionResponse<RefundQuote>>, AppError> {
    let (service, notifier) = service(&state);
    let quote = service.cancel(booking_id, req.refund_type, Utc::now()).await?;
    Ok(Json(ActionResponse::new(quote, &notifier)))
}
