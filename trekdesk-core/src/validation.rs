//! Field rules applied to admin input before anything is sent to the backend.

use once_cell::sync::Lazy;
use regex::Regex;
use trekdesk_shared::EmergencyContact;
use crate::{CoreError, CoreResult};

/// 10-digit mobile number, leading digit 6-9
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").expect("phone pattern"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern")
});

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 120;
pub const MAX_NAME_LEN: usize = 100;

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the trimmed phone number if it is a valid mobile number.
pub fn validate_phone(field: &str, phone: &str) -> CoreResult<String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    if !PHONE_RE.is_match(phone) {
        return Err(CoreError::validation(format!(
            "{field} must be a valid 10-digit mobile number"
        )));
    }
    Ok(phone.to_string())
}

pub fn validate_email(field: &str, email: &str) -> CoreResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(CoreError::validation(format!("{field} must be a valid email address")));
    }
    Ok(email.to_string())
}

pub fn validate_age(field: &str, age: u32) -> CoreResult<u32> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(CoreError::validation(format!(
            "{field} must be between {MIN_AGE} and {MAX_AGE}"
        )));
    }
    Ok(age)
}

pub fn validate_name(field: &str, name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation(format!("{field} is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Emergency contact is optional, but once any of its fields is filled in
/// all three become required.
pub fn validate_emergency_contact(
    contact: Option<&EmergencyContact>,
) -> CoreResult<Option<EmergencyContact>> {
    let Some(contact) = contact else {
        return Ok(None);
    };

    if is_blank(&contact.name) && is_blank(&contact.phone) && is_blank(&contact.relation) {
        return Ok(None);
    }

    if is_blank(&contact.name) || is_blank(&contact.phone) || is_blank(&contact.relation) {
        return Err(CoreError::validation(
            "Emergency contact name, phone and relation are all required once any is provided",
        ));
    }

    Ok(Some(EmergencyContact {
        name: validate_name("Emergency contact name", &contact.name)?,
        phone: validate_phone("Emergency contact phone", &contact.phone)?,
        relation: validate_name("Emergency contact relation", &contact.relation)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rules() {
        assert_eq!(validate_phone("Phone", " 9123456789 ").unwrap(), "9123456789");
        assert!(validate_phone("Phone", "5123456789").is_err());
        assert!(validate_phone("Phone", "912345678").is_err());
        assert!(validate_phone("Phone", "91234567890").is_err());
        assert!(validate_phone("Phone", "91234abcde").is_err());

        let err = validate_phone("Phone", "").unwrap_err();
        assert_eq!(err, CoreError::ValidationError("Phone is required".to_string()));
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("Email", "asha.rao+treks@example.co.in").is_ok());
        assert!(validate_email("Email", "asha@example").is_err());
        assert!(validate_email("Email", "asha.example.com").is_err());
        assert!(validate_email("Email", "@example.com").is_err());
    }

    #[test]
    fn test_age_bounds() {
        assert!(validate_age("Age", 0).is_err());
        assert!(validate_age("Age", 1).is_ok());
        assert!(validate_age("Age", 120).is_ok());
        assert!(validate_age("Age", 121).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("Name", "  Asha Rao ").unwrap(), "Asha Rao");
        assert!(validate_name("Name", "   ").is_err());
        assert!(validate_name("Name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn test_emergency_contact_all_or_nothing() {
        assert_eq!(validate_emergency_contact(None).unwrap(), None);

        let empty = EmergencyContact::default();
        assert_eq!(validate_emergency_contact(Some(&empty)).unwrap(), None);

        let partial = EmergencyContact {
            name: "Ravi".to_string(),
            ..Default::default()
        };
        assert!(validate_emergency_contact(Some(&partial)).is_err());

        let complete = EmergencyContact {
            name: "Ravi".to_string(),
            phone: "9876543210".to_string(),
            relation: "Brother".to_string(),
        };
        assert_eq!(
            validate_emergency_contact(Some(&complete)).unwrap(),
            Some(complete.clone())
        );

        let bad_phone = EmergencyContact {
            phone: "12345".to_string(),
            ..complete
        };
        assert!(validate_emergency_contact(Some(&bad_phone)).is_err());
    }
}
