use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use trekdesk_catalog::BatchCapacity;
use trekdesk_core::validation::{
    is_blank, validate_age, validate_email, validate_emergency_contact, validate_name,
    validate_phone,
};
use trekdesk_core::{BatchRepository, BookingRepository, CoreError, Notifier, UserRepository};
use trekdesk_shared::{
    Booking, ContactDetails, EmergencyContact, ManualBookingRequest, Masked, NewUser, NotifyLevel,
    Participant, PaymentStatus, User,
};
use uuid::Uuid;

/// Steps of the manual booking wizard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    PhoneLookup,
    /// Only visited when no user exists for the phone number
    UserDetails,
    BookingDetails,
    /// Booking posted; nothing further is accepted
    Completed,
}

impl fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntakeStep::PhoneLookup => "phone lookup",
            IntakeStep::UserDetails => "user details",
            IntakeStep::BookingDetails => "booking details",
            IntakeStep::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDraft {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Values pre-filled into the booking details step
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub contact: ContactDetails,
    pub lead_participant: ParticipantDraft,
}

impl BookingDraft {
    fn from_user(user: &User) -> Self {
        Self {
            contact: ContactDetails {
                name: user.name.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
            },
            lead_participant: ParticipantDraft {
                name: user.name.clone(),
                age: user.age,
                gender: user.gender.clone(),
            },
        }
    }
}

/// State of one manual booking in progress. Nothing here is persisted by
/// the backend until the final submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeFlow {
    pub id: Uuid,
    step: IntakeStep,
    phone: Option<String>,
    user: Option<User>,
    /// User was created by this flow rather than found
    user_created: bool,
    draft: BookingDraft,
    booking: Option<Booking>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntakeFlow {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            step: IntakeStep::PhoneLookup,
            phone: None,
            user: None,
            user_created: false,
            draft: BookingDraft::default(),
            booking: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    fn move_to(&mut self, step: IntakeStep) {
        self.step = step;
        self.updated_at = Utc::now();
    }

    fn expect_step(&self, expected: IntakeStep) -> Result<(), IntakeError> {
        if self.step == IntakeStep::Completed {
            return Err(IntakeError::Completed);
        }
        if self.step != expected {
            return Err(IntakeError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    fn select_user(&mut self, user: User, created: bool) {
        self.draft = BookingDraft::from_user(&user);
        self.user = Some(user);
        self.user_created = created;
        self.move_to(IntakeStep::BookingDetails);
    }

    pub fn user_created(&self) -> bool {
        self.user_created
    }

    /// Return to phone lookup, forgetting the selected user. A user created
    /// by this flow already exists in the backend and is found on the next
    /// lookup, so there is no way back into the user details step.
    pub fn back(&mut self) -> Result<IntakeStep, IntakeError> {
        match self.step {
            IntakeStep::Completed => return Err(IntakeError::Completed),
            IntakeStep::PhoneLookup => return Err(IntakeError::AtFirstStep),
            IntakeStep::UserDetails | IntakeStep::BookingDetails => {}
        }

        self.phone = None;
        self.user = None;
        self.user_created = false;
        self.draft = BookingDraft::default();
        self.move_to(IntakeStep::PhoneLookup);
        Ok(IntakeStep::PhoneLookup)
    }
}

impl Default for IntakeFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Input of the user details step. The phone number comes from the lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// Input of the booking details step
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    pub trek_id: Uuid,
    pub batch_id: Uuid,
    pub participants: Vec<Participant>,
    pub contact: ContactDetails,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Overrides `batch price x participants`
    #[serde(default)]
    pub total_price: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated booking details, ready to be priced against a batch
struct CheckedBooking {
    participants: Vec<Participant>,
    contact: ContactDetails,
    emergency_contact: Option<EmergencyContact>,
    total_price: Option<i64>,
    notes: Option<String>,
}

fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .filter(|v| !is_blank(v))
        .map(|v| v.trim().to_string())
}

fn check_participant(index: usize, participant: &Participant) -> Result<Participant, CoreError> {
    let label = format!("Participant {}", index + 1);
    let phone = optional_text(participant.phone.as_ref())
        .map(|phone| validate_phone(&format!("{label} phone"), &phone))
        .transpose()?;
    let email = optional_text(participant.email.as_ref())
        .map(|email| validate_email(&format!("{label} email"), &email))
        .transpose()?;

    Ok(Participant {
        name: validate_name(&format!("{label} name"), &participant.name)?,
        age: validate_age(&format!("{label} age"), participant.age)?,
        gender: optional_text(participant.gender.as_ref()),
        phone,
        email,
    })
}

fn check_booking_form(form: &BookingForm) -> Result<CheckedBooking, CoreError> {
    if form.participants.is_empty() {
        return Err(CoreError::validation("At least one participant is required"));
    }

    let participants = form
        .participants
        .iter()
        .enumerate()
        .map(|(i, p)| check_participant(i, p))
        .collect::<Result<Vec<_>, _>>()?;

    let contact = ContactDetails {
        name: validate_name("Contact name", &form.contact.name)?,
        email: validate_email("Contact email", &form.contact.email)?,
        phone: validate_phone("Contact phone", &form.contact.phone)?,
    };
    let emergency_contact = validate_emergency_contact(form.emergency_contact.as_ref())?;

    if let Some(total) = form.total_price {
        if total < 0 {
            return Err(CoreError::validation("Total price cannot be negative"));
        }
    }

    Ok(CheckedBooking {
        participants,
        contact,
        emergency_contact,
        total_price: form.total_price,
        notes: optional_text(form.notes.as_ref()),
    })
}

/// Drives an [`IntakeFlow`] against the backend.
///
/// Every failure is reported through the notifier and leaves the flow on
/// the step it was on.
pub struct IntakeService {
    users: Arc<dyn UserRepository>,
    bookings: Arc<dyn BookingRepository>,
    batches: Arc<dyn BatchRepository>,
    notifier: Arc<dyn Notifier>,
}

impl IntakeService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        bookings: Arc<dyn BookingRepository>,
        batches: Arc<dyn BatchRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            bookings,
            batches,
            notifier,
        }
    }

    /// Phone lookup. A known customer skips straight to booking details.
    pub async fn lookup_phone(&self, flow: &mut IntakeFlow, phone: &str) -> Result<IntakeStep, IntakeError> {
        flow.expect_step(IntakeStep::PhoneLookup).map_err(|e| self.fail(e))?;
        let phone = validate_phone("Phone number", phone).map_err(|e| self.fail(e.into()))?;

        let found = self
            .users
            .find_by_phone(&phone)
            .await
            .map_err(|e| {
                tracing::error!(phone = %Masked(&phone), "User lookup failed: {}", e);
                self.fail(IntakeError::Backend(e.to_string()))
            })?;

        flow.phone = Some(phone.clone());
        match found {
            Some(user) => {
                tracing::info!(flow_id = %flow.id, user_id = %user.id, "Existing user found");
                self.notifier.success(&format!("Found user {}", user.name));
                flow.select_user(user, false);
            }
            None => {
                tracing::info!(flow_id = %flow.id, phone = %Masked(&phone), "No user for phone");
                self.notifier
                    .notify("No user found for this phone number, please add their details", NotifyLevel::Info);
                flow.move_to(IntakeStep::UserDetails);
            }
        }
        Ok(flow.step)
    }

    pub async fn create_user(&self, flow: &mut IntakeFlow, form: UserDetailsForm) -> Result<User, IntakeError> {
        flow.expect_step(IntakeStep::UserDetails).map_err(|e| self.fail(e))?;
        let Some(phone) = flow.phone.clone() else {
            return Err(self.fail(IntakeError::WrongStep {
                expected: IntakeStep::PhoneLookup,
                actual: flow.step,
            }));
        };

        let new_user = Self::check_user_form(&form, phone).map_err(|e| self.fail(e.into()))?;

        let user = self.users.create_user(&new_user).await.map_err(|e| {
            tracing::error!(flow_id = %flow.id, "User creation failed: {}", e);
            self.fail(IntakeError::Backend(e.to_string()))
        })?;

        tracing::info!(flow_id = %flow.id, user_id = %user.id, "User created for manual booking");
        self.notifier.success("User created");
        flow.select_user(user.clone(), true);
        Ok(user)
    }

    fn check_user_form(form: &UserDetailsForm, phone: String) -> Result<NewUser, CoreError> {
        Ok(NewUser {
            name: validate_name("Name", &form.name)?,
            email: validate_email("Email", &form.email)?,
            phone,
            age: form.age.map(|age| validate_age("Age", age)).transpose()?,
            gender: optional_text(form.gender.as_ref()),
        })
    }

    /// Validate everything, check the batch has room, then post the booking.
    pub async fn submit(&self, flow: &mut IntakeFlow, form: BookingForm) -> Result<Booking, IntakeError> {
        flow.expect_step(IntakeStep::BookingDetails).map_err(|e| self.fail(e))?;
        let Some(user_id) = flow.user.as_ref().map(|u| u.id) else {
            return Err(self.fail(IntakeError::WrongStep {
                expected: IntakeStep::PhoneLookup,
                actual: flow.step,
            }));
        };

        let checked = check_booking_form(&form).map_err(|e| {
            tracing::warn!(flow_id = %flow.id, "Booking form rejected: {}", e);
            self.fail(e.into())
        })?;

        let batch = match self.batches.get_batch(form.trek_id, form.batch_id).await {
            Ok(Some(batch)) => batch,
            Ok(None) => return Err(self.fail(IntakeError::BatchNotFound(form.batch_id))),
            Err(e) => {
                tracing::error!(flow_id = %flow.id, "Failed to load batch: {}", e);
                return Err(self.fail(IntakeError::Backend(e.to_string())));
            }
        };

        let seats = i32::try_from(checked.participants.len()).map_err(|_| {
            self.fail(IntakeError::Validation("Too many participants".to_string()))
        })?;
        if !BatchCapacity::can_accommodate(&batch, seats) {
            let available = BatchCapacity::available_slots(&batch);
            return Err(self.fail(IntakeError::Validation(format!(
                "Only {available} slots available, {seats} participants requested"
            ))));
        }

        let total_price = match checked.total_price {
            Some(total) => total,
            None => batch.price.checked_mul(i64::from(seats)).ok_or_else(|| {
                tracing::warn!(flow_id = %flow.id, price = batch.price, seats, "Booking total out of range");
                self.fail(IntakeError::Validation(format!(
                    "Total for {seats} participants at {} each is out of range",
                    batch.price
                )))
            })?,
        };

        let request = ManualBookingRequest {
            trek_id: form.trek_id,
            batch_id: form.batch_id,
            user_id,
            total_price,
            participant_details: checked.participants,
            contact: checked.contact,
            emergency_contact: checked.emergency_contact,
            payment_status: form.payment_status,
            notes: checked.notes,
        };

        let booking = self.bookings.create_manual_booking(&request).await.map_err(|e| {
            tracing::error!(flow_id = %flow.id, "Manual booking failed: {}", e);
            self.fail(IntakeError::Backend(e.to_string()))
        })?;

        tracing::info!(
            flow_id = %flow.id,
            booking_id = %booking.id,
            seats,
            total_price = booking.total_price,
            "Manual booking created"
        );
        self.notifier.success("Booking created");
        flow.booking = Some(booking.clone());
        flow.move_to(IntakeStep::Completed);
        Ok(booking)
    }

    fn fail(&self, err: IntakeError) -> IntakeError {
        self.notifier.error(&err.to_string());
        err
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Expected the {expected} step, flow is at {actual}")]
    WrongStep {
        expected: IntakeStep,
        actual: IntakeStep,
    },

    #[error("Booking already submitted")]
    Completed,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Batch not found: {0}")]
    BatchNotFound(Uuid),

    #[error("Booking backend error: {0}")]
    Backend(String),
}

impl From<CoreError> for IntakeError {
    fn from(err: CoreError) -> Self {
        let CoreError::ValidationError(msg) = err;
        IntakeError::Validation(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trekdesk_core::RecordingNotifier;
    use trekdesk_shared::Batch;
    use trekdesk_store::InMemoryBackend;

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        notifier: Arc<RecordingNotifier>,
        service: IntakeService,
        batch: Batch,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemoryBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let start = Utc::now() + Duration::days(25);
        let batch = Batch {
            id: Uuid::new_v4(),
            trek_id: Uuid::new_v4(),
            start_date: start,
            end_date: start + Duration::days(6),
            price: 7_500,
            max_participants: 10,
            current_participants: 6,
            reserved_slots: 1,
        };
        backend.insert_batch(batch.clone());
        let service = IntakeService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            notifier.clone(),
        );
        Fixture { backend, notifier, service, batch }
    }

    fn existing_user(backend: &InMemoryBackend) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9123456789".to_string(),
            age: Some(29),
            gender: Some("female".to_string()),
        };
        backend.insert_user(user.clone());
        user
    }

    fn participant(name: &str, age: u32) -> Participant {
        Participant {
            name: name.to_string(),
            age,
            gender: None,
            phone: None,
            email: None,
        }
    }

    fn form(batch: &Batch, participants: Vec<Participant>) -> BookingForm {
        BookingForm {
            trek_id: batch.trek_id,
            batch_id: batch.id,
            participants,
            contact: ContactDetails {
                name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                phone: "9123456789".to_string(),
            },
            emergency_contact: None,
            payment_status: PaymentStatus::Paid,
            total_price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_known_phone_skips_user_details() {
        let f = fixture();
        let user = existing_user(&f.backend);
        let mut flow = IntakeFlow::new();

        let step = f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        assert_eq!(step, IntakeStep::BookingDetails);
        assert_eq!(flow.user(), Some(&user));
        assert_eq!(flow.draft().contact.name, "Asha Rao");
        assert_eq!(flow.draft().contact.email, "asha@example.com");
        assert_eq!(flow.draft().contact.phone, "9123456789");
        assert_eq!(flow.draft().lead_participant.age, Some(29));
        assert_eq!(flow.draft().lead_participant.gender.as_deref(), Some("female"));
    }

    #[tokio::test]
    async fn test_unknown_phone_creates_user_first() {
        let f = fixture();
        let mut flow = IntakeFlow::new();

        let step = f.service.lookup_phone(&mut flow, "9876543210").await.unwrap();
        assert_eq!(step, IntakeStep::UserDetails);

        let user = f
            .service
            .create_user(
                &mut flow,
                UserDetailsForm {
                    name: "Ravi Kumar".to_string(),
                    email: "ravi@example.com".to_string(),
                    age: Some(35),
                    gender: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.phone, "9876543210");
        assert_eq!(flow.step(), IntakeStep::BookingDetails);
        assert_eq!(flow.draft().contact.phone, "9876543210");
        assert_eq!(f.backend.users().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_phone_stays_on_step() {
        let f = fixture();
        let mut flow = IntakeFlow::new();

        let err = f.service.lookup_phone(&mut flow, "12345").await.unwrap_err();

        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(flow.step(), IntakeStep::PhoneLookup);
        assert_eq!(f.notifier.take()[0].level, NotifyLevel::Error);
    }

    #[tokio::test]
    async fn test_lookup_failure_stays_on_step() {
        let f = fixture();
        f.backend.fail_next("connection refused");
        let mut flow = IntakeFlow::new();

        let err = f.service.lookup_phone(&mut flow, "9123456789").await.unwrap_err();

        assert!(matches!(err, IntakeError::Backend(_)));
        assert_eq!(flow.step(), IntakeStep::PhoneLookup);
        assert!(flow.phone().is_none());
    }

    #[tokio::test]
    async fn test_invalid_user_details() {
        let f = fixture();
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9876543210").await.unwrap();

        let err = f
            .service
            .create_user(
                &mut flow,
                UserDetailsForm {
                    name: "Ravi".to_string(),
                    email: "not-an-email".to_string(),
                    age: None,
                    gender: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(flow.step(), IntakeStep::UserDetails);
        assert!(f.backend.users().is_empty());
    }

    #[tokio::test]
    async fn test_submit_creates_booking() {
        let f = fixture();
        existing_user(&f.backend);
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        let booking = f
            .service
            .submit(
                &mut flow,
                form(&f.batch, vec![participant("Asha Rao", 29), participant("Meera Rao", 27)]),
            )
            .await
            .unwrap();

        assert_eq!(booking.total_price, 15_000);
        assert_eq!(booking.participant_details.len(), 2);
        assert_eq!(flow.step(), IntakeStep::Completed);
        assert_eq!(flow.booking().map(|b| b.id), Some(booking.id));
        assert_eq!(f.backend.batch(f.batch.id).unwrap().current_participants, 8);

        let err = f
            .service
            .submit(&mut flow, form(&f.batch, vec![participant("Asha Rao", 29)]))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Completed));
    }

    #[tokio::test]
    async fn test_submit_respects_available_slots() {
        let f = fixture();
        existing_user(&f.backend);
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        // 10 max, 6 booked, 1 reserved: 3 available
        let err = f
            .service
            .submit(
                &mut flow,
                form(
                    &f.batch,
                    vec![
                        participant("A", 20),
                        participant("B", 21),
                        participant("C", 22),
                        participant("D", 23),
                    ],
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(flow.step(), IntakeStep::BookingDetails);
        assert!(f.backend.bookings().is_empty());
    }

    #[tokio::test]
    async fn test_total_out_of_range_is_not_posted() {
        let f = fixture();
        existing_user(&f.backend);
        let pricey = Batch {
            price: i64::MAX / 2,
            ..f.batch.clone()
        };
        f.backend.insert_batch(pricey.clone());
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();
        f.notifier.take();

        let err = f
            .service
            .submit(
                &mut flow,
                form(&pricey, vec![participant("Asha Rao", 29), participant("Meera Rao", 27), participant("Dev Rao", 5)]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Validation(_)));
        assert_eq!(flow.step(), IntakeStep::BookingDetails);
        assert!(f.backend.bookings().is_empty());
        assert_eq!(f.notifier.take()[0].level, NotifyLevel::Error);
    }

    #[tokio::test]
    async fn test_partial_emergency_contact_rejected() {
        let f = fixture();
        existing_user(&f.backend);
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        let mut booking_form = form(&f.batch, vec![participant("Asha Rao", 29)]);
        booking_form.emergency_contact = Some(EmergencyContact {
            name: "Ravi".to_string(),
            phone: String::new(),
            relation: "Brother".to_string(),
        });

        let err = f.service.submit(&mut flow, booking_form.clone()).await.unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));

        booking_form.emergency_contact = Some(EmergencyContact {
            name: "Ravi".to_string(),
            phone: "9876543210".to_string(),
            relation: "Brother".to_string(),
        });
        let booking = f.service.submit(&mut flow, booking_form).await.unwrap();
        assert_eq!(booking.emergency_contact.unwrap().relation, "Brother");
    }

    #[tokio::test]
    async fn test_participant_fields_validated() {
        let f = fixture();
        existing_user(&f.backend);
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        let err = f
            .service
            .submit(&mut flow, form(&f.batch, vec![participant("Asha", 29), participant("Kid", 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Validation(ref msg) if msg.contains("Participant 2 age")));

        let err = f
            .service
            .submit(&mut flow, form(&f.batch, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_price_override_and_wrong_trek() {
        let f = fixture();
        existing_user(&f.backend);
        let mut flow = IntakeFlow::new();
        f.service.lookup_phone(&mut flow, "9123456789").await.unwrap();

        let mut wrong_trek = form(&f.batch, vec![participant("Asha", 29)]);
        wrong_trek.trek_id = Uuid::new_v4();
        let err = f.service.submit(&mut flow, wrong_trek).await.unwrap_err();
        assert!(matches!(err, IntakeError::BatchNotFound(_)));

        let mut discounted = form(&f.batch, vec![participant("Asha", 29)]);
        discounted.total_price = Some(6_000);
        let booking = f.service.submit(&mut flow, discounted).await.unwrap();
        assert_eq!(booking.total_price, 6_000);
    }

    #[tokio::test]
    async fn test_steps_are_enforced() {
        let f = fixture();
        let mut flow = IntakeFlow::new();

        let err = f
            .service
            .submit(&mut flow, form(&f.batch, vec![participant("Asha", 29)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IntakeError::WrongStep { expected: IntakeStep::BookingDetails, actual: IntakeStep::PhoneLookup }
        ));
    }

    #[tokio::test]
    async fn test_back_navigation() {
        let f = fixture();
        let mut flow = IntakeFlow::new();
        assert!(matches!(flow.back(), Err(IntakeError::AtFirstStep)));

        f.service.lookup_phone(&mut flow, "9876543210").await.unwrap();
        f.service
            .create_user(
                &mut flow,
                UserDetailsForm {
                    name: "Ravi Kumar".to_string(),
                    email: "ravi@example.com".to_string(),
                    age: None,
                    gender: None,
                },
            )
            .await
            .unwrap();

        assert!(flow.user_created());

        assert_eq!(flow.back().unwrap(), IntakeStep::PhoneLookup);
        assert!(flow.user().is_none());
        assert!(flow.phone().is_none());

        // The user created above is now found directly
        let step = f.service.lookup_phone(&mut flow, "9876543210").await.unwrap();
        assert_eq!(step, IntakeStep::BookingDetails);
        assert!(!flow.user_created());
        assert_eq!(flow.draft().contact.name, "Ravi Kumar");
    }
}
