//! Student sign-up: a validated single-row insert.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::{RepositoryError, StudentRepository};

/// Identifier assigned to a stored registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub i64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredContact {
    #[default]
    Email,
    Phone,
}

impl PreferredContact {
    pub fn as_str(self) -> &'static str {
        match self {
            PreferredContact::Email => "email",
            PreferredContact::Phone => "phone",
        }
    }
}

/// Registration form payload. The form posts every field as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub university: String,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub preferred_contact: PreferredContact,
}

/// Normalized registration ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub student_id: String,
    pub university: String,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub phone_number: Option<String>,
    pub preferred_contact: PreferredContact,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),
    #[error("graduationYear must be a four digit year, found '{0}'")]
    InvalidGraduationYear(String),
    #[error("a phone number is required when phone is the preferred contact")]
    PhoneRequired,
}

fn required(value: &str, field: &'static str) -> Result<String, RegistrationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RegistrationError::Missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

impl StudentRegistration {
    pub fn validate(self) -> Result<NewStudent, RegistrationError> {
        let first_name = required(&self.first_name, "firstName")?;
        let last_name = required(&self.last_name, "lastName")?;
        let email = required(&self.email, "email")?.to_ascii_lowercase();
        if !looks_like_email(&email) {
            return Err(RegistrationError::InvalidEmail(email));
        }
        let student_id = required(&self.student_id, "studentId")?;
        let university = required(&self.university, "university")?;

        let graduation_year = match optional(self.graduation_year) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(year) if (1900..=2200).contains(&year) => Some(year),
                _ => return Err(RegistrationError::InvalidGraduationYear(raw)),
            },
            None => None,
        };

        let phone_number = optional(self.phone_number);
        if self.preferred_contact == PreferredContact::Phone && phone_number.is_none() {
            return Err(RegistrationError::PhoneRequired);
        }

        Ok(NewStudent {
            first_name,
            last_name,
            email,
            student_id,
            university,
            major: optional(self.major),
            graduation_year,
            phone_number,
            preferred_contact: self.preferred_contact,
        })
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error(transparent)]
    Invalid(#[from] RegistrationError),
    #[error("a student with this email is already registered")]
    Duplicate,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<RepositoryError> for RegistrationServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(_) => Self::Duplicate,
            other => Self::StorageUnavailable(other.to_string()),
        }
    }
}

pub struct RegistrationService<S> {
    students: Arc<S>,
}

impl<S> RegistrationService<S>
where
    S: StudentRepository + 'static,
{
    pub fn new(students: Arc<S>) -> Self {
        Self { students }
    }

    pub fn register(
        &self,
        registration: StudentRegistration,
    ) -> Result<StudentId, RegistrationServiceError> {
        let student = registration.validate()?;
        match self.students.register(&student, Utc::now()) {
            Ok(id) => {
                info!(student = id.0, university = %student.university, "student registered");
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "student registration failed");
                Err(err.into())
            }
        }
    }
}
