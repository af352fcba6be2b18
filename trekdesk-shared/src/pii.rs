use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wraps a customer contact value (phone number, e-mail) so that log output
/// only shows enough of it to correlate entries.
///
/// Phone numbers keep their last four characters, e-mail addresses keep the
/// first character of the local part and the domain. Serialization is not
/// masked: API payloads still need the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let value = self.0.as_ref().trim();
        if let Some((local, domain)) = value.split_once('@') {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            return format!("{first}***@{domain}");
        }

        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
