pub mod batch;
pub mod booking;
pub mod notification;
pub mod user;

pub use batch::{Batch, BatchUpdate};
pub use booking::{
    AdminCancelRequest, Booking, BookingStatus, ContactDetails, EmergencyContact,
    ManualBookingRequest, Participant, PaymentStatus, RefundType,
};
pub use notification::{Notification, NotifyLevel};
pub use user::{NewUser, User};
