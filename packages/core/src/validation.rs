// ABOUTME: Input validation for grant/reject forms, admin login and replies
// ABOUTME: Runs before any backend call so invalid input never reaches the network

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{GrantDetails, PatentFiling, RejectDetails};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cannot {action} patent! Please fill in the following required fields: {}", .fields.join(", "))]
    MissingFields {
        action: &'static str,
        fields: Vec<String>,
    },

    #[error("All fields are required")]
    MissingCredentials,

    #[error("Admin ID must be a number")]
    InvalidAdminId,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Reply cannot be empty")]
    EmptyReply,

    #[error("Maximum of 4 replies reached for this filing")]
    ReplyLimitReached,
}

impl ValidationError {
    /// Labels of the missing fields, empty for other variants
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::MissingFields { fields, .. } => fields,
            _ => &[],
        }
    }
}

/// Raw contents of the grant or reject detail form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub patent_number: String,
    pub person_name: String,
    pub location: String,
}

impl DetailFields {
    pub fn new(
        patent_number: impl Into<String>,
        person_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            patent_number: patent_number.into(),
            person_name: person_name.into(),
            location: location.into(),
        }
    }

    fn missing(&self, labels: [&str; 3]) -> Vec<String> {
        [&self.patent_number, &self.person_name, &self.location]
            .iter()
            .zip(labels)
            .filter(|(value, _)| value.trim().is_empty())
            .map(|(_, label)| label.to_string())
            .collect()
    }
}

pub fn validate_grant(fields: &DetailFields) -> Result<GrantDetails, ValidationError> {
    let missing = fields.missing(["Patent Number", "Granted Patent Person Name", "Location"]);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            action: "grant",
            fields: missing,
        });
    }

    Ok(GrantDetails {
        patent_number: fields.patent_number.clone(),
        granted_person_name: fields.person_name.clone(),
        location: fields.location.clone(),
    })
}

pub fn validate_reject(fields: &DetailFields) -> Result<RejectDetails, ValidationError> {
    let missing = fields.missing([
        "Rejected Patent Number",
        "Rejected Patent Person Name",
        "Location",
    ]);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            action: "reject",
            fields: missing,
        });
    }

    Ok(RejectDetails {
        rejected_patent_number: fields.patent_number.clone(),
        rejected_person_name: fields.person_name.clone(),
        location: fields.location.clone(),
    })
}

/// Login form as typed by the admin
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub admin_id: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /admin/login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub admin_id: i64,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_login(input: &LoginInput) -> Result<LoginRequest, ValidationError> {
    if [&input.admin_id, &input.admin_name, &input.email, &input.password]
        .iter()
        .any(|v| v.trim().is_empty())
    {
        return Err(ValidationError::MissingCredentials);
    }

    let admin_id = input.admin_id.trim();
    if !admin_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidAdminId);
    }
    let admin_id: i64 = admin_id
        .parse()
        .map_err(|_| ValidationError::InvalidAdminId)?;

    if !EMAIL_RE.is_match(input.email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(LoginRequest {
        admin_id,
        admin_name: input.admin_name.trim().to_string(),
        email: input.email.trim().to_string(),
        password: input.password.clone(),
    })
}

/// Body of `PUT /patent-filing/{id}/reply`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub reply_field: String,
    pub reply_content: String,
}

/// Picks the next reply slot for `filing`, refusing once r1..r4 are used
pub fn validate_reply(filing: &PatentFiling, content: &str) -> Result<ReplyRequest, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyReply);
    }

    let reply_field = filing
        .next_reply_field()
        .ok_or(ValidationError::ReplyLimitReached)?;

    Ok(ReplyRequest {
        reply_field,
        reply_content: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", "A. Singh", "Delhi", vec!["Patent Number"])]
    #[case("IN-1", "   ", "Delhi", vec!["Granted Patent Person Name"])]
    #[case("IN-1", "A. Singh", "\t", vec!["Location"])]
    #[case(" ", "", "", vec!["Patent Number", "Granted Patent Person Name", "Location"])]
    fn test_grant_reports_exactly_missing_fields(
        #[case] number: &str,
        #[case] person: &str,
        #[case] location: &str,
        #[case] expected: Vec<&str>,
    ) {
        let err = validate_grant(&DetailFields::new(number, person, location)).unwrap_err();
        assert_eq!(err.missing_fields(), expected.as_slice());
    }

    #[test]
    fn test_reject_missing_location() {
        let err = validate_reject(&DetailFields::new("IN-7", "R. Rao", "  ")).unwrap_err();
        assert_eq!(err.missing_fields(), ["Location".to_string()]);
        assert_eq!(
            err.to_string(),
            "Cannot reject patent! Please fill in the following required fields: Location"
        );
    }

    #[test]
    fn test_valid_grant_keeps_values() {
        let details = validate_grant(&DetailFields::new("IN-123", "A. Singh", "Delhi")).unwrap();
        assert_eq!(details.patent_number, "IN-123");
        assert_eq!(details.granted_person_name, "A. Singh");
        assert_eq!(details.location, "Delhi");
    }

    fn login(admin_id: &str, email: &str) -> LoginInput {
        LoginInput {
            admin_id: admin_id.to_string(),
            admin_name: "Meera".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_login_validation() {
        let request = validate_login(&login("101", "meera@example.com")).unwrap();
        assert_eq!(request.admin_id, 101);

        assert_eq!(
            validate_login(&login("", "meera@example.com")),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_login(&login("10a", "meera@example.com")),
            Err(ValidationError::InvalidAdminId)
        );
        assert_eq!(
            validate_login(&login("-5", "meera@example.com")),
            Err(ValidationError::InvalidAdminId)
        );
        assert_eq!(
            validate_login(&login("101", "meera@example")),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_reply_uses_next_slot() {
        let filing = PatentFiling {
            r1: Some("first".to_string()),
            ..Default::default()
        };
        let request = validate_reply(&filing, "  second  ").unwrap();
        assert_eq!(request.reply_field, "r2");
        assert_eq!(request.reply_content, "second");
    }

    #[test]
    fn test_fifth_reply_refused() {
        let filing = PatentFiling {
            r1: Some("a".to_string()),
            r2: Some("b".to_string()),
            r3: Some("c".to_string()),
            r4: Some("d".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate_reply(&filing, "one more"),
            Err(ValidationError::ReplyLimitReached)
        );
        assert_eq!(validate_reply(&filing, "   "), Err(ValidationError::EmptyReply));
    }
}
