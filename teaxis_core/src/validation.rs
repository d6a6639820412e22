//! Client-side form validation.
//!
//! Everything here runs before a request is built; a failure means no
//! network round-trip happens.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Accepted rating scores: 1.0 to 5.0 in half steps
pub const RATING_STEPS: [f64; 9] = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\S+@\S+\.\S+").unwrap_or_else(|e| panic!("invalid email pattern: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Please enter a valid e-mail address.")]
    InvalidEmail,

    #[error("The passwords do not match.")]
    PasswordMismatch,

    #[error("The password must be at least {min} characters long.")]
    PasswordTooShort { min: usize },

    #[error("Dates must use the YYYY-MM-DD format.")]
    InvalidDate,

    #[error("Date and time must use the YYYY-MM-DDTHH:MM:SS format.")]
    InvalidDateTime,

    #[error("Ratings go from 1.0 to 5.0 in steps of 0.5.")]
    InvalidRating,

    #[error("An empty session token cannot be stored.")]
    EmptyToken,
}

impl ValidationError {
    /// Short title for an alert
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::MissingFields(_) => "Required fields",
            ValidationError::InvalidEmail => "Invalid e-mail",
            ValidationError::PasswordMismatch => "Password error",
            ValidationError::PasswordTooShort { .. } => "Weak password",
            ValidationError::InvalidDate | ValidationError::InvalidDateTime => "Invalid date",
            ValidationError::InvalidRating => "Invalid rating",
            ValidationError::EmptyToken => "Invalid session",
        }
    }
}

/// Collects the names of blank fields, in the order they were checked
#[derive(Default)]
struct Required(Vec<&'static str>);

impl Required {
    fn check(mut self, name: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.0.push(name);
        }
        self
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(self.0))
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    Required::default()
        .check("e-mail", email)
        .check("password", password)
        .finish()
}

/// Raw registration form input
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub birth_date: String,
    pub neurodivergence: String,
    pub hobbies: String,
    pub communication_mode: String,
    pub sensory_preferences: String,
}

impl fmt::Display for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the password fields
        write!(f, "RegistrationForm({}, {})", self.name, self.email)
    }
}

/// Checks run in order: required, mismatch, length, e-mail shape, date
pub fn validate_registration(form: &RegistrationForm) -> Result<NaiveDate, ValidationError> {
    Required::default()
        .check("name", &form.name)
        .check("e-mail", &form.email)
        .check("password", &form.password)
        .check("password confirmation", &form.confirm_password)
        .check("birth date", &form.birth_date)
        .finish()?;

    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    if !is_valid_email(&form.email) {
        return Err(ValidationError::InvalidEmail);
    }
    parse_date(&form.birth_date)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate)
}

pub fn parse_date_time(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ValidationError::InvalidDateTime)
}

/// Checks the scheduling form and returns the parsed date-time
pub fn validate_schedule(date_time: &str, location: &str) -> Result<NaiveDateTime, ValidationError> {
    Required::default()
        .check("date and time", date_time)
        .check("place or link", location)
        .finish()?;
    parse_date_time(date_time)
}

/// Positive integer minutes, or `fallback` for anything else
pub fn parse_duration(value: &str, fallback: u32) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(minutes) if minutes > 0 => minutes,
        _ => fallback,
    }
}

pub fn validate_rating(score: f64) -> Result<f64, ValidationError> {
    if RATING_STEPS.iter().any(|s| (s - score).abs() < f64::EPSILON) {
        Ok(score)
    } else {
        Err(ValidationError::InvalidRating)
    }
}

/// Split a comma-separated field, trimming entries and dropping empties
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `None` for blank input, trimmed text otherwise
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            birth_date: "1995-08-20".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_registration() {
        let date = validate_registration(&form()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1995, 8, 20).unwrap());
    }

    #[test]
    fn test_missing_fields_listed_in_order() {
        let mut f = form();
        f.name.clear();
        f.birth_date = "  ".into();
        assert_eq!(
            validate_registration(&f),
            Err(ValidationError::MissingFields(vec!["name", "birth date"]))
        );
    }

    #[test]
    fn test_mismatch_checked_before_length() {
        let mut f = form();
        f.password = "abc".into();
        f.confirm_password = "abd".into();
        assert_eq!(
            validate_registration(&f),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_short_password() {
        let mut f = form();
        f.password = "abc".into();
        f.confirm_password = "abc".into();
        assert_eq!(
            validate_registration(&f),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
    }

    #[test]
    fn test_malformed_email() {
        let mut f = form();
        f.email = "ana.example.com".into();
        assert_eq!(validate_registration(&f), Err(ValidationError::InvalidEmail));
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_bad_birth_date() {
        let mut f = form();
        f.birth_date = "20/08/1995".into();
        assert_eq!(validate_registration(&f), Err(ValidationError::InvalidDate));
    }

    #[test]
    fn test_login_requires_both() {
        assert!(validate_login("a@b.co", "x").is_ok());
        assert_eq!(
            validate_login("", ""),
            Err(ValidationError::MissingFields(vec!["e-mail", "password"]))
        );
    }

    #[test]
    fn test_schedule_form() {
        let dt = validate_schedule("2025-07-15T14:00:00", "https://meet.example/x").unwrap();
        assert_eq!(dt.to_string(), "2025-07-15 14:00:00");
        assert_eq!(
            validate_schedule("2025-07-15T14:00:00", ""),
            Err(ValidationError::MissingFields(vec!["place or link"]))
        );
        assert_eq!(
            validate_schedule("tomorrow", "room 3"),
            Err(ValidationError::InvalidDateTime)
        );
    }

    #[test]
    fn test_duration_fallback() {
        assert_eq!(parse_duration("45", 50), 45);
        assert_eq!(parse_duration("0", 50), 50);
        assert_eq!(parse_duration("abc", 50), 50);
    }

    #[test]
    fn test_rating_steps() {
        assert_eq!(validate_rating(4.5), Ok(4.5));
        assert_eq!(validate_rating(4.2), Err(ValidationError::InvalidRating));
        assert_eq!(validate_rating(0.5), Err(ValidationError::InvalidRating));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" Leitura, Música,, Jogos ,"),
            vec!["Leitura", "Música", "Jogos"]
        );
        assert!(split_list("").is_empty());
    }
}
