use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use trekdesk_booking::{IntakeFlow, RefundPolicy};
use trekdesk_core::{BatchRepository, BookingRepository, UserRepository};
use uuid::Uuid;

/// In-progress manual bookings, one lock per flow
pub type FlowStore = Arc<RwLock<HashMap<Uuid, Arc<Mutex<IntakeFlow>>>>>;

#[derive(Clone)]
pub struct AppState {
    pub batches: Arc<dyn BatchRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub flows: FlowStore,
    pub refund_policy: RefundPolicy,
}

impl AppState {
    /// State backed by a single backend serving all three repositories
    pub fn new<B>(backend: Arc<B>, refund_policy: RefundPolicy) -> Self
    where
        B: BatchRepository + BookingRepository + UserRepository + 'static,
    {
        Self {
            batches: backend.clone(),
            bookings: backend.clone(),
            users: backend,
            flows: Arc::new(RwLock::new(HashMap::new())),
            refund_policy,
        }
    }
}
