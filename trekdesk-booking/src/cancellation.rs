use chrono::{DateTime, Utc};
use std::sync::Arc;
use trekdesk_core::{BatchRepository, BookingRepository, Notifier};
use trekdesk_shared::{AdminCancelRequest, Batch, Booking, RefundType};
use uuid::Uuid;

use crate::refund::{RefundError, RefundPolicy, RefundQuote};

/// Admin cancellation of bookings with refund computation
pub struct CancellationService {
    bookings: Arc<dyn BookingRepository>,
    batches: Arc<dyn BatchRepository>,
    notifier: Arc<dyn Notifier>,
    policy: RefundPolicy,
}

impl CancellationService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        batches: Arc<dyn BatchRepository>,
        notifier: Arc<dyn Notifier>,
        policy: RefundPolicy,
    ) -> Self {
        Self {
            bookings,
            batches,
            notifier,
            policy,
        }
    }

    /// Refund the booking would get if cancelled at `now`. No side effects.
    pub async fn quote(
        &self,
        booking_id: Uuid,
        refund_type: RefundType,
        now: DateTime<Utc>,
    ) -> Result<RefundQuote, CancellationError> {
        let booking = self.load_booking(booking_id).await?;
        let batch = self.load_batch(&booking).await?;
        self.quote_for(&booking, &batch, refund_type, now)
    }

    pub async fn cancel(
        &self,
        booking_id: Uuid,
        refund_type: RefundType,
        now: DateTime<Utc>,
    ) -> Result<RefundQuote, CancellationError> {
        let booking = self.load_booking(booking_id).await?;
        if booking.is_cancelled() {
            tracing::warn!(%booking_id, "Booking already cancelled");
            return Err(self.fail(CancellationError::AlreadyCancelled(booking_id)));
        }

        let batch = self.load_batch(&booking).await?;
        let quote = self.quote_for(&booking, &batch, refund_type, now)?;

        let request = AdminCancelRequest {
            booking_id,
            refund: quote.refund,
            refund_type,
        };
        if let Err(e) = self.bookings.admin_cancel_booking(&request).await {
            tracing::error!(%booking_id, "adminCancelBooking failed: {}", e);
            return Err(self.fail(CancellationError::Backend(e.to_string())));
        }

        tracing::info!(
            %booking_id,
            refund = quote.refund,
            days_until_departure = quote.days_until_departure,
            "Booking cancelled"
        );
        self.notifier.success(&format!(
            "Booking cancelled, refund of {} initiated",
            quote.refund
        ));
        Ok(quote)
    }

    fn quote_for(
        &self,
        booking: &Booking,
        batch: &Batch,
        refund_type: RefundType,
        now: DateTime<Utc>,
    ) -> Result<RefundQuote, CancellationError> {
        self.policy
            .quote(booking.id, booking.total_price, batch.start_date, now, refund_type)
            .map_err(|e| {
                tracing::warn!(booking_id = %booking.id, "Refund not computable: {}", e);
                self.fail(e.into())
            })
    }

    async fn load_booking(&self, booking_id: Uuid) -> Result<Booking, CancellationError> {
        match self.bookings.get_booking(booking_id).await {
            Ok(Some(booking)) => Ok(booking),
            Ok(None) => Err(self.fail(CancellationError::BookingNotFound(booking_id))),
            Err(e) => {
                tracing::error!(%booking_id, "Failed to load booking: {}", e);
                Err(self.fail(CancellationError::Backend(e.to_string())))
            }
        }
    }

    async fn load_batch(&self, booking: &Booking) -> Result<Batch, CancellationError> {
        match self.batches.get_batch(booking.trek_id, booking.batch_id).await {
            Ok(Some(batch)) => Ok(batch),
            Ok(None) => Err(self.fail(CancellationError::BatchNotFound(booking.batch_id))),
            Err(e) => {
                tracing::error!(batch_id = %booking.batch_id, "Failed to load batch: {}", e);
                Err(self.fail(CancellationError::Backend(e.to_string())))
            }
        }
    }

    fn fail(&self, err: CancellationError) -> CancellationError {
        self.notifier.error(&err.to_string());
        err
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CancellationError {
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Batch not found: {0}")]
    BatchNotFound(Uuid),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error(transparent)]
    Refund(#[from] RefundError),

    #[error("Booking backend error: {0}")]
    Backend(String),
}
