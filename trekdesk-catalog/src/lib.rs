pub mod admin;
pub mod capacity;

pub use admin::{BatchAdmin, BatchAdminError};
pub use capacity::{BatchCapacity, CapacityError, CapacitySnapshot};
