//! Buyer contact details and their validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

/// Longest accepted name or organization, in characters.
pub const MAX_NAME_LENGTH: usize = 120;

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Contact details collected on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl ContactInfo {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            organization: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Trimmed copy with blank optional fields dropped.
    pub fn normalized(&self) -> Self {
        fn optional(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            organization: optional(&self.organization),
        }
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let contact = self.normalized();
        let mut errors = ValidationErrors::new();

        if contact.name.is_empty() {
            errors.push("name", "name is required");
        } else if contact.name.chars().count() > MAX_NAME_LENGTH {
            errors.push(
                "name",
                format!("name must be at most {} characters", MAX_NAME_LENGTH),
            );
        }

        if contact.email.is_empty() {
            errors.push("email", "email is required");
        } else if !is_valid_email(&contact.email) {
            errors.push("email", "email address is not valid");
        }

        if let Some(phone) = &contact.phone {
            if !is_valid_phone(phone) {
                errors.push("phone", "phone number is not valid");
            }
        }

        if let Some(organization) = &contact.organization {
            if organization.chars().count() > MAX_NAME_LENGTH {
                errors.push(
                    "organization",
                    format!("organization must be at most {} characters", MAX_NAME_LENGTH),
                );
            }
        }

        errors.into_result()
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.');
    if !phone.chars().all(allowed) {
        return false;
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactInfo {
        ContactInfo::new("Ada Lovelace", "ada@example.org")
    }

    #[test]
    fn test_valid_contact() {
        assert!(valid().validate().is_ok());
        assert!(valid()
            .with_phone("+44 (20) 7946-0958")
            .with_organization("Analytical Engines Ltd")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_required_fields_reported_together() {
        let errors = ContactInfo::new("  ", "").validate().unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert_eq!(errors.message_for("name"), Some("name is required"));
        assert_eq!(errors.message_for("email"), Some("email is required"));
    }

    #[test]
    fn test_email_rules() {
        for bad in [
            "ada",
            "@example.org",
            "ada@",
            "ada@example",
            "ada@@example.org",
            "ada@exa@mple.org",
            "ada lovelace@example.org",
            "ada@example..org",
            "ada@.example.org",
        ] {
            let errors = ContactInfo::new("Ada", bad).validate().unwrap_err();
            assert!(errors.has_field("email"), "{} should be rejected", bad);
        }

        assert!(ContactInfo::new("Ada", "  ada@sub.example.org ")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_phone_rules() {
        for bad in ["12345", "1234567890123456", "555-CALL-NOW", "+1 555 0100 ext 4"] {
            let errors = valid().with_phone(bad).validate().unwrap_err();
            assert!(errors.has_field("phone"), "{} should be rejected", bad);
        }

        assert!(valid().with_phone("555 0100 12").validate().is_ok());
        assert!(valid().with_phone("   ").validate().is_ok());
    }

    #[test]
    fn test_length_limits() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let errors = ContactInfo::new(long.clone(), "ada@example.org")
            .with_organization(long)
            .validate()
            .unwrap_err();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("organization"));

        let exact = "é".repeat(MAX_NAME_LENGTH);
        assert!(ContactInfo::new(exact, "ada@example.org").validate().is_ok());
    }

    #[test]
    fn test_normalized() {
        let contact = ContactInfo::new(" Ada ", " ada@example.org ")
            .with_phone(" ")
            .with_organization(" NatCon ")
            .normalized();
        assert_eq!(contact.name, "Ada");
        assert_eq!(contact.email, "ada@example.org");
        assert_eq!(contact.phone, None);
        assert_eq!(contact.organization.as_deref(), Some("NatCon"));
    }
}
