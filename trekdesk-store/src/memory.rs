use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use trekdesk_core::{BatchRepository, BookingRepository, RepoResult, UserRepository};
use trekdesk_shared::{
    AdminCancelRequest, Batch, BatchUpdate, Booking, BookingStatus, ManualBookingRequest, Masked,
    NewUser, Participant, PaymentStatus, User,
};
use uuid::Uuid;

use crate::rest::RestError;

#[derive(Default)]
struct State {
    batches: HashMap<Uuid, Batch>,
    bookings: HashMap<Uuid, Booking>,
    users: HashMap<Uuid, User>,
    batch_updates: Vec<BatchUpdate>,
    cancellations: Vec<AdminCancelRequest>,
    fail_next: Option<String>,
}

/// Process-local stand-in for the booking backend.
///
/// Mirrors the server-side effects the admin tools rely on: bookings
/// take seats from their batch and cancellations give them back.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail the next repository call with `message`
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    fn check_failure(state: &mut State) -> RepoResult<()> {
        match state.fail_next.take() {
            Some(message) => Err(Box::new(RestError::Unavailable(message))),
            None => Ok(()),
        }
    }

    pub fn insert_batch(&self, batch: Batch) {
        self.lock().batches.insert(batch.id, batch);
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.lock().bookings.insert(booking.id, booking);
    }

    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    pub fn batch(&self, batch_id: Uuid) -> Option<Batch> {
        self.lock().batches.get(&batch_id).cloned()
    }

    pub fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.lock().bookings.get(&booking_id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.lock().bookings.values().cloned().collect()
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    /// Every `updateBatch` payload received, oldest first
    pub fn batch_updates(&self) -> Vec<BatchUpdate> {
        self.lock().batch_updates.clone()
    }

    /// Every `adminCancelBooking` payload received, oldest first
    pub fn cancellations(&self) -> Vec<AdminCancelRequest> {
        self.lock().cancellations.clone()
    }
}

fn seat_count(participants: &[Participant]) -> Result<i32, RestError> {
    i32::try_from(participants.len()).map_err(|_| RestError::Status {
        status: 422,
        body: format!("{} participants exceed batch capacity", participants.len()),
    })
}

#[async_trait]
impl BatchRepository for InMemoryBackend {
    async fn get_batch(&self, trek_id: Uuid, batch_id: Uuid) -> RepoResult<Option<Batch>> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;
        Ok(state
            .batches
            .get(&batch_id)
            .filter(|b| b.trek_id == trek_id)
            .cloned())
    }

    async fn update_batch(&self, trek_id: Uuid, batch_id: Uuid, update: &BatchUpdate) -> RepoResult<Batch> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;

        let batch = state
            .batches
            .get_mut(&batch_id)
            .filter(|b| b.trek_id == trek_id)
            .ok_or_else(|| RestError::NotFound(format!("batch {batch_id}")))?;
        batch.apply(update);
        let updated = batch.clone();

        state.batch_updates.push(update.clone());
        info!("Batch {} updated in memory", batch_id);
        Ok(updated)
    }
}

#[async_trait]
impl BookingRepository for InMemoryBackend {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;
        Ok(state.bookings.get(&id).cloned())
    }

    async fn create_manual_booking(&self, request: &ManualBookingRequest) -> RepoResult<Booking> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;

        let seats = seat_count(&request.participant_details)?;
        let batch = state
            .batches
            .get_mut(&request.batch_id)
            .filter(|b| b.trek_id == request.trek_id)
            .ok_or_else(|| RestError::NotFound(format!("batch {}", request.batch_id)))?;
        batch.current_participants = batch.current_participants.saturating_add(seats);

        let booking = Booking {
            id: Uuid::new_v4(),
            trek_id: request.trek_id,
            batch_id: request.batch_id,
            user_id: request.user_id,
            participant_details: request.participant_details.clone(),
            contact: Some(request.contact.clone()),
            emergency_contact: request.emergency_contact.clone(),
            total_price: request.total_price,
            payment_status: request.payment_status,
            status: BookingStatus::Confirmed,
            refund_amount: None,
            created_at: Utc::now(),
        };
        state.bookings.insert(booking.id, booking.clone());
        info!("Manual booking {} stored in memory ({} seats)", booking.id, seats);
        Ok(booking)
    }

    async fn admin_cancel_booking(&self, request: &AdminCancelRequest) -> RepoResult<()> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;

        let booking = state
            .bookings
            .get_mut(&request.booking_id)
            .ok_or_else(|| RestError::NotFound(format!("booking {}", request.booking_id)))?;
        if booking.status == BookingStatus::Cancelled {
            return Err(Box::new(RestError::Status {
                status: 409,
                body: "booking already cancelled".to_string(),
            }));
        }
        let seats = seat_count(&booking.participant_details)?;

        booking.status = BookingStatus::Cancelled;
        booking.refund_amount = Some(request.refund);
        if request.refund > 0 {
            booking.payment_status = PaymentStatus::Refunded;
        }
        let batch_id = booking.batch_id;

        if let Some(batch) = state.batches.get_mut(&batch_id) {
            batch.current_participants = (batch.current_participants - seats).max(0);
        }
        state.cancellations.push(request.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryBackend {
    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;
        Ok(state.users.values().find(|u| u.phone == phone).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let mut state = self.lock();
        Self::check_failure(&mut state)?;

        if state.users.values().any(|u| u.phone == user.phone) {
            return Err(Box::new(RestError::Status {
                status: 409,
                body: format!("user with phone {} already exists", Masked(&user.phone)),
            }));
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            age: user.age,
            gender: user.gender.clone(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }
}
