//! Per-category required-field and format checks run before normalization.
//!
//! Validation is all-or-nothing: every problem is collected, and a record with
//! any error must be rejected as a whole.

use crate::error::FieldError;
use crate::record::{FieldValue, SubmissionRecord};
use crate::schema::{FeedbackCategory, FieldKind, schema_for};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_DIGIT_REGEX: Regex = Regex::new(r"\D").unwrap();
}

/// Number of digits a mobile number must carry
pub const PHONE_DIGITS: usize = 10;

/// Outcome of validating one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any error names the given field
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the result into `Ok(())` or the collected errors
    pub fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Check an email address syntactically
///
/// Exactly one `@`, non-empty local and domain parts, and at least one `.` in the
/// domain with text on both sides of it.
///
/// # Arguments
/// * `email` - The address to check
///
/// # Returns
/// * `bool` - True if the address is acceptable
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Strip everything but digits from a phone number
///
/// # Examples
/// ```
/// use feedback::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("98765-43210"), "9876543210");
/// assert_eq!(normalize_phone("+91 98765 43210"), "919876543210");
/// ```
pub fn normalize_phone(phone: &str) -> String {
    NON_DIGIT_REGEX.replace_all(phone, "").into_owned()
}

/// Whether a phone number normalizes to exactly [`PHONE_DIGITS`] digits
pub fn is_valid_phone(phone: &str) -> bool {
    normalize_phone(phone).len() == PHONE_DIGITS
}

fn is_valid_rating(value: &str) -> bool {
    matches!(value.trim().parse::<u8>(), Ok(1..=5))
}

/// Validate a submission against its category's rules
///
/// Checks required fields, email syntax, the participation vocabulary, the
/// free-text companion of `Other`, phone digit counts, rating ranges and
/// multi-select items. Errors come back in schema column order.
///
/// # Arguments
/// * `category` - The feedback form the record was submitted on
/// * `record` - The submitted answers
///
/// # Returns
/// * `ValidationResult` - Empty when the record may be stored
pub fn validate(category: FeedbackCategory, record: &SubmissionRecord) -> ValidationResult {
    let schema = schema_for(category);
    let mut errors = Vec::new();

    for field in schema.fields {
        let name = field.name;
        let required = schema.required.contains(&name);
        let text = record.text(name);

        let Some(value) = text else {
            if required {
                errors.push(FieldError::new(name, "is required"));
            }
            continue;
        };

        match field.kind {
            FieldKind::Email if !is_valid_email(&value) => {
                errors.push(FieldError::new(name, "is not a valid email address"));
            }
            FieldKind::Phone if !is_valid_phone(&value) => {
                errors.push(FieldError::new(
                    name,
                    format!("must contain exactly {PHONE_DIGITS} digits"),
                ));
            }
            FieldKind::Rating if !is_valid_rating(&value) => {
                errors.push(FieldError::new(name, "must be a rating from 1 to 5"));
            }
            FieldKind::Choice => {
                if !schema.accepts_participation(&value) {
                    errors.push(FieldError::new(
                        name,
                        format!("'{value}' is not an accepted participation level"),
                    ));
                } else if value == "Other" && record.text("participation_other").is_none() {
                    errors.push(FieldError::new(
                        "participation_other",
                        "please describe your participation",
                    ));
                }
            }
            FieldKind::MultiSelect => {
                if let Some(FieldValue::List(items)) = record.get(name) {
                    if items.iter().any(|item| item.contains(',')) {
                        errors.push(FieldError::new(name, "options must not contain commas"));
                    }
                }
            }
            _ => {}
        }
    }

    if !errors.is_empty() {
        log::debug!("{category} submission rejected with {} error(s)", errors.len());
    }

    ValidationResult { errors }
}
