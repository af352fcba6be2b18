pub mod models;
pub mod pii;

pub use models::{
    AdminCancelRequest, Batch, BatchUpdate, Booking, BookingStatus, ContactDetails,
    EmergencyContact, ManualBookingRequest, NewUser, Notification, NotifyLevel, Participant,
    PaymentStatus, RefundType, User,
};
pub use pii::Masked;
