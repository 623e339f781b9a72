use chrono::{DateTime, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::{
    attendance::AttendanceStatus,
    error::{Error, Result},
    event::Event,
};

/// Length of the generated login credential handed to the mail job.
pub const CREDENTIAL_LENGTH: usize = 8;

/// A participant account
#[derive(PartialEq, Debug, FromRow, Clone, Serialize)]
pub struct Participant {
    /// Unique participant ID
    pub id: i64,

    /// Full name, as drawn on certificates
    pub name: String,

    pub email: String,

    pub branch: String,

    pub year: i64,

    pub phone: String,

    /// Stored credential hash; issued at creation, never returned to callers
    #[serde(skip_serializing)]
    pub credential: String,

    /// Revoked accounts may not register or mark attendance
    pub is_revoked: bool,

    pub created_at: DateTime<Utc>,
}

/// A Json struct to create a participant
#[derive(Debug, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub branch: String,
    pub year: i64,
    pub phone: String,
}

impl NewParticipant {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("branch", &self.branch),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("missing required field '{field}'")));
            }
        }
        if !self.email.contains('@') {
            return Err(Error::Validation("invalid email".to_string()));
        }
        Ok(())
    }
}

/// A Json struct to update a participant; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct ParticipantUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i64>,
    pub phone: Option<String>,
}

/// One entry of a participant's event overview
#[derive(Debug, Serialize)]
pub struct RegisteredEvent {
    pub event: Event,
    pub status: AttendanceStatus,
    pub attendance: Vec<NaiveDate>,
}

/// Profile data plus the per-event registration entries
#[derive(Debug, Serialize)]
pub struct ParticipantOverview {
    pub name: String,
    pub email: String,
    pub branch: String,
    pub year: i64,
    pub phone: String,
    pub events: Vec<RegisteredEvent>,
}

/// Generate a random login credential for a fresh account. Hashing and
/// delivery belong to external collaborators.
pub fn generate_credential() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CREDENTIAL_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewParticipant {
        NewParticipant {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            branch: "CSE".to_string(),
            year: 2,
            phone: "5551234".to_string(),
        }
    }

    #[test]
    fn validate_accepts_complete_payload() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields_and_bad_email() {
        let mut p = sample();
        p.name = "  ".to_string();
        assert!(p.validate().is_err());

        let mut p = sample();
        p.email = "not-an-email".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn credentials_have_fixed_length() {
        let cred = generate_credential();
        assert_eq!(cred.len(), CREDENTIAL_LENGTH);
        assert!(cred.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
