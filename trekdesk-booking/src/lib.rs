pub mod cancellation;
pub mod intake;
pub mod refund;

pub use cancellation::{CancellationError, CancellationService};
pub use intake::{
    BookingDraft, BookingForm, IntakeError, IntakeFlow, IntakeService, IntakeStep,
    ParticipantDraft, UserDetailsForm,
};
pub use refund::{calculate_refund, RefundError, RefundPolicy, RefundQuote};
