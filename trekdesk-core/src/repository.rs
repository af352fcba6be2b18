use async_trait::async_trait;
use uuid::Uuid;
use trekdesk_shared::{
    AdminCancelRequest, Batch, BatchUpdate, Booking, ManualBookingRequest, NewUser, User,
};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Access to trek batches held by the booking backend
#[async_trait]
pub trait BatchRepository: Send + Sync {
    async fn get_batch(
        &self,
        trek_id: Uuid,
        batch_id: Uuid,
    ) -> RepoResult<Option<Batch>>;

    /// `updateBatch(trekId, batchId, {reservedSlots?, maxParticipants?})`
    async fn update_batch(
        &self,
        trek_id: Uuid,
        batch_id: Uuid,
        update: &BatchUpdate,
    ) -> RepoResult<Batch>;
}

/// Access to bookings held by the booking backend
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking(
        &self,
        id: Uuid,
    ) -> RepoResult<Option<Booking>>;

    async fn create_manual_booking(
        &self,
        request: &ManualBookingRequest,
    ) -> RepoResult<Booking>;

    /// `adminCancelBooking({bookingId, refund, refundType})`
    async fn admin_cancel_booking(
        &self,
        request: &AdminCancelRequest,
    ) -> RepoResult<()>;
}

/// Access to customer accounts held by the booking backend
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_phone(
        &self,
        phone: &str,
    ) -> RepoResult<Option<User>>;

    async fn create_user(
        &self,
        user: &NewUser,
    ) -> RepoResult<User>;
}
