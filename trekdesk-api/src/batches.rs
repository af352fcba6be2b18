use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trekdesk_catalog::{BatchAdmin, BatchCapacity, CapacitySnapshot};
use trekdesk_core::RecordingNotifier;
use trekdesk_shared::Batch;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::ActionResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BatchCapacityResponse {
    pub batch: Batch,
    pub capacity: CapacitySnapshot,
}

impl From<Batch> for BatchCapacityResponse {
    fn from(batch: Batch) -> Self {
        let capacity = BatchCapacity::of(&batch);
        Self { batch, capacity }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReserveSlotsRequest {
    pub slots: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxParticipantsRequest {
    pub max_participants: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/treks/{trek_id}/batches/{batch_id}/capacity", get(get_capacity))
        .route("/v1/treks/{trek_id}/batches/{batch_id}/mark-full", post(mark_full))
        .route("/v1/treks/{trek_id}/batches/{batch_id}/unmark-full", post(unmark_full))
        .route("/v1/treks/{trek_id}/batches/{batch_id}/reserved-slots", put(reserve_slots))
        .route("/v1/treks/{trek_id}/batches/{batch_id}/max-participants", put(update_max_participants))
}

fn admin(state: &AppState) -> (BatchAdmin, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (BatchAdmin::new(state.batches.clone(), notifier.clone()), notifier)
}

/// GET /v1/treks/{trek_id}/batches/{batch_id}/capacity
async fn get_capacity(
    State(state): State<AppState>,
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BatchCapacityResponse>, AppError> {
    let (admin, _) = admin(&state);
    let (batch, capacity) = admin.capacity(trek_id, batch_id).await?;
    Ok(Json(BatchCapacityResponse { batch, capacity }))
}

/// POST /v1/treks/{trek_id}/batches/{batch_id}/mark-full
async fn mark_full(
    State(state): State<AppState>,
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ActionResponse<BatchCapacityResponse>>, AppError> {
    let (admin, notifier) = admin(&state);
    let batch = admin.mark_as_full(trek_id, batch_id).await?;
    Ok(Json(ActionResponse::new(batch.into(), &notifier)))
}

/// POST /v1/treks/{trek_id}/batches/{batch_id}/unmark-full
async fn unmark_full(
    State(state): State<AppState>,
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ActionResponse<BatchCapacityResponse>>, AppError> {
    let (admin, notifier) = admin(&state);
    let batch = admin.unmark_as_full(trek_id, batch_id).await?;
    Ok(Json(ActionResponse::new(batch.into(), &notifier)))
}

/// PUT /v1/treks/{trek_id}/batches/{batch_id}/reserved-slots
async fn reserve_slots(
    State(state): State<AppState>,
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ReserveSlotsRequest>,
) -> Result<Json<ActionResponse<BatchCapacityResponse>>, AppError> {
    let (admin, notifier) = admin(&state);
    let batch = admin.reserve_slots(trek_id, batch_id, req.slots).await?;
    Ok(Json(ActionResponse::new(batch.into(), &notifier)))
}

/// PUT /v1/treks/{trek_id}/batches/{batch_id}/max-participants
async fn update_max_participants(
    State(state): State<AppState>,
    Path((trek_id, batch_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<MaxParticipantsRequest>,
) -> Result<Json<ActionResponse<BatchCapacityResponse>>, AppError> {
    let (admin, notifier) = admin(&state);
    let batch = admin
        .update_max_participants(trek_id, batch_id, req.max_participants)
        .await?;
    Ok(Json(ActionResponse::new(batch.into(), &notifier)))
}
