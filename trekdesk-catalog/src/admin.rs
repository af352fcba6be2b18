use std::sync::Arc;
use trekdesk_core::{BatchRepository, Notifier};
use trekdesk_shared::{Batch, BatchUpdate};
use uuid::Uuid;

use crate::capacity::{BatchCapacity, CapacityError, CapacitySnapshot};

/// Runs capacity operations against a batch held by the backend.
///
/// Validation happens locally and is reported before any network call;
/// only a valid change is sent with `updateBatch`. Nothing is retried.
pub struct BatchAdmin {
    batches: Arc<dyn BatchRepository>,
    notifier: Arc<dyn Notifier>,
}

impl BatchAdmin {
    pub fn new(batches: Arc<dyn BatchRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { batches, notifier }
    }

    pub async fn capacity(&self, trek_id: Uuid, batch_id: Uuid) -> Result<(Batch, CapacitySnapshot), BatchAdminError> {
        let batch = self.load(trek_id, batch_id).await?;
        let snapshot = BatchCapacity::of(&batch);
        Ok((batch, snapshot))
    }

    pub async fn mark_as_full(&self, trek_id: Uuid, batch_id: Uuid) -> Result<Batch, BatchAdminError> {
        self.apply(trek_id, batch_id, "Batch marked as full", |batch| {
            Ok(BatchCapacity::mark_as_full(batch))
        })
        .await
    }

    pub async fn unmark_as_full(&self, trek_id: Uuid, batch_id: Uuid) -> Result<Batch, BatchAdminError> {
        self.apply(trek_id, batch_id, "Batch is open for bookings again", BatchCapacity::unmark_as_full)
            .await
    }

    pub async fn reserve_slots(&self, trek_id: Uuid, batch_id: Uuid, slots: i32) -> Result<Batch, BatchAdminError> {
        self.apply(trek_id, batch_id, "Reserved slots updated", |batch| {
            BatchCapacity::reserve_slots(batch, slots)
        })
        .await
    }

    pub async fn update_max_participants(
        &self,
        trek_id: Uuid,
        batch_id: Uuid,
        max_participants: i32,
    ) -> Result<Batch, BatchAdminError> {
        self.apply(trek_id, batch_id, "Max participants updated", |batch| {
            BatchCapacity::update_max_participants(batch, max_participants)
        })
        .await
    }

    async fn load(&self, trek_id: Uuid, batch_id: Uuid) -> Result<Batch, BatchAdminError> {
        match self.batches.get_batch(trek_id, batch_id).await {
            Ok(Some(batch)) => Ok(batch),
            Ok(None) => {
                self.notifier.error("Batch not found");
                Err(BatchAdminError::NotFound { trek_id, batch_id })
            }
            Err(e) => {
                tracing::error!(%trek_id, %batch_id, "Failed to load batch: {}", e);
                self.notifier.error("Failed to load batch");
                Err(BatchAdminError::Backend(e.to_string()))
            }
        }
    }

    async fn apply<F>(
        &self,
        trek_id: Uuid,
        batch_id: Uuid,
        success_message: &str,
        operation: F,
    ) -> Result<Batch, BatchAdminError>
    where
        F: FnOnce(&mut Batch) -> Result<BatchUpdate, CapacityError>,
    {
        let mut batch = self.load(trek_id, batch_id).await?;

        let update = match operation(&mut batch) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(%trek_id, %batch_id, "Rejected capacity change: {}", e);
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        match self.batches.update_batch(trek_id, batch_id, &update).await {
            Ok(updated) => {
                tracing::info!(
                    %trek_id,
                    %batch_id,
                    reserved_slots = updated.reserved_slots,
                    max_participants = updated.max_participants,
                    "Batch capacity updated"
                );
                self.notifier.success(success_message);
                Ok(updated)
            }
            Err(e) => {
                tracing::error!(%trek_id, %batch_id, "updateBatch failed: {}", e);
                self.notifier.error("Failed to update batch");
                Err(BatchAdminError::Backend(e.to_string()))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchAdminError {
    #[error("Batch {batch_id} of trek {trek_id} not found")]
    NotFound {
        trek_id: Uuid,
        batch_id: Uuid,
    },

    #[error(transparent)]
    Validation(#[from] CapacityError),

    #[error("Booking backend error: {0}")]
    Backend(String),
}
