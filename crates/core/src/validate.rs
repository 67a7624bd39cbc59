use serde::Serialize;
use thiserror::Error;

use crate::types::{AssignmentRequest, JobPatch, LaborerPatch, NewJob, NewLaborer};

pub const NAME_MAX: usize = 100;
pub const SKILL_MAX: usize = 50;
pub const LOCATION_MAX: usize = 100;
pub const LANGUAGE_MAX: usize = 30;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;

/// A single field-level constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

/// Schema-level rejection of a payload, carrying every violated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload failed validation on {} field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<ValidationError>);

/// Checks the E.164-like phone pattern: optional `+`, first digit
/// nonzero, 2 to 15 digits in total.
pub fn is_valid_phone(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    if !(2..=15).contains(&digits.len()) {
        return false;
    }
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() && first != '0' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_digit())
}

/// Strips spaces, dashes and parentheses from a phone number and adds a
/// leading `+` when the result does not already start with `+` or `0`.
pub fn normalize_phone(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if cleaned.starts_with('+') || cleaned.starts_with('0') {
        cleaned
    } else {
        format!("+{cleaned}")
    }
}

struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn bounded(&mut self, field: &'static str, value: &str, max: usize) {
        if value.is_empty() {
            self.errors.push(ValidationError {
                field,
                message: "must not be empty".to_string(),
            });
        } else if value.chars().count() > max {
            self.errors.push(ValidationError {
                field,
                message: format!("must be at most {max} characters"),
            });
        }
    }

    fn non_empty(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            self.errors.push(ValidationError {
                field,
                message: "must not be empty".to_string(),
            });
        }
    }

    fn phone(&mut self, field: &'static str, value: &str) {
        if !is_valid_phone(value) {
            self.errors.push(ValidationError {
                field,
                message: "must match +?[1-9] followed by 1 to 14 digits".to_string(),
            });
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Validates a registration payload.
pub fn new_laborer(payload: &NewLaborer) -> Result<(), ValidationErrors> {
    let mut checker = Checker::new();
    checker.bounded("name", &payload.name, NAME_MAX);
    checker.phone("phone", &payload.phone);
    checker.bounded("skill", &payload.skill, SKILL_MAX);
    checker.bounded("location", &payload.location, LOCATION_MAX);
    checker.bounded("language", &payload.language, LANGUAGE_MAX);
    checker.finish()
}

/// Validates the fields present in a laborer update.
pub fn laborer_patch(patch: &LaborerPatch) -> Result<(), ValidationErrors> {
    let mut checker = Checker::new();
    if let Some(name) = &patch.name {
        checker.bounded("name", name, NAME_MAX);
    }
    if let Some(phone) = &patch.phone {
        checker.phone("phone", phone);
    }
    if let Some(skill) = &patch.skill {
        checker.bounded("skill", skill, SKILL_MAX);
    }
    if let Some(location) = &patch.location {
        checker.bounded("location", location, LOCATION_MAX);
    }
    if let Some(language) = &patch.language {
        checker.bounded("language", language, LANGUAGE_MAX);
    }
    checker.finish()
}

/// Validates a job posting payload. Date and time are only required to
/// be non-empty; no calendar semantics are enforced.
pub fn new_job(payload: &NewJob) -> Result<(), ValidationErrors> {
    let mut checker = Checker::new();
    checker.bounded("title", &payload.title, TITLE_MAX);
    checker.bounded("description", &payload.description, DESCRIPTION_MAX);
    checker.bounded("skill_required", &payload.skill_required, SKILL_MAX);
    checker.bounded("location", &payload.location, LOCATION_MAX);
    checker.non_empty("date", &payload.date);
    checker.non_empty("time", &payload.time);
    checker.phone("contact_number", &payload.contact_number);
    checker.finish()
}

/// Validates the fields present in a job update.
pub fn job_patch(patch: &JobPatch) -> Result<(), ValidationErrors> {
    let mut checker = Checker::new();
    if let Some(title) = &patch.title {
        checker.bounded("title", title, TITLE_MAX);
    }
    if let Some(description) = &patch.description {
        checker.bounded("description", description, DESCRIPTION_MAX);
    }
    if let Some(skill_required) = &patch.skill_required {
        checker.bounded("skill_required", skill_required, SKILL_MAX);
    }
    if let Some(location) = &patch.location {
        checker.bounded("location", location, LOCATION_MAX);
    }
    if let Some(date) = &patch.date {
        checker.non_empty("date", date);
    }
    if let Some(time) = &patch.time {
        checker.non_empty("time", time);
    }
    if let Some(contact_number) = &patch.contact_number {
        checker.phone("contact_number", contact_number);
    }
    checker.finish()
}

/// Validates an assignment request: at least one phone number, all
/// matching the phone pattern.
pub fn assignment(request: &AssignmentRequest) -> Result<(), ValidationErrors> {
    let mut checker = Checker::new();
    if request.phone_numbers.is_empty() {
        checker.errors.push(ValidationError {
            field: "phone_numbers",
            message: "must contain at least one phone number".to_string(),
        });
    }
    for phone in &request.phone_numbers {
        checker.phone("phone_numbers", phone);
    }
    checker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raju() -> NewLaborer {
        NewLaborer {
            name: "Raju".to_string(),
            phone: "+919876543210".to_string(),
            skill: "mason".to_string(),
            location: "Delhi".to_string(),
            language: "hindi".to_string(),
        }
    }

    #[test]
    fn accepts_valid_phone_formats() {
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("919876543210"));
        assert!(is_valid_phone("12"));
        assert!(is_valid_phone("+123456789012345"));
    }

    #[test]
    fn rejects_malformed_phones() {
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("1"));
        assert!(!is_valid_phone("0123456789"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("+91-987"));
        assert!(!is_valid_phone("98abc43210"));
    }

    #[test]
    fn normalize_strips_punctuation_and_prefixes_plus() {
        assert_eq!(normalize_phone("91 9876 543-210"), "+919876543210");
        assert_eq!(normalize_phone("+91 (987) 654-3210"), "+919876543210");
        assert_eq!(normalize_phone("09876"), "09876");
    }

    #[test]
    fn valid_registration_passes() {
        assert!(new_laborer(&raju()).is_ok());
    }

    #[test]
    fn registration_collects_every_violation() {
        let payload = NewLaborer {
            name: String::new(),
            phone: "bad".to_string(),
            skill: "x".repeat(SKILL_MAX + 1),
            location: "Delhi".to_string(),
            language: "hindi".to_string(),
        };
        let err = new_laborer(&payload).unwrap_err();
        let fields: Vec<_> = err.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "phone", "skill"]);
    }

    #[test]
    fn patch_only_checks_present_fields() {
        let patch = LaborerPatch {
            available: Some(false),
            ..LaborerPatch::default()
        };
        assert!(laborer_patch(&patch).is_ok());

        let patch = LaborerPatch {
            phone: Some("invalid".to_string()),
            ..LaborerPatch::default()
        };
        assert!(laborer_patch(&patch).is_err());
    }

    #[test]
    fn job_requires_non_empty_date_and_time() {
        let mut payload = NewJob {
            title: "Build wall".to_string(),
            description: "Two day masonry project".to_string(),
            skill_required: "mason".to_string(),
            location: "Delhi".to_string(),
            date: "2025-07-15".to_string(),
            time: "08:00".to_string(),
            contact_number: "+919876543211".to_string(),
        };
        assert!(new_job(&payload).is_ok());

        payload.date = String::new();
        let err = new_job(&payload).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].field, "date");
    }

    #[test]
    fn assignment_rejects_empty_list() {
        let err = assignment(&AssignmentRequest {
            phone_numbers: vec![],
        })
        .unwrap_err();
        assert_eq!(err.0[0].field, "phone_numbers");
    }

    #[test]
    fn assignment_rejects_malformed_numbers() {
        let err = assignment(&AssignmentRequest {
            phone_numbers: vec!["+919876543210".to_string(), "oops".to_string()],
        })
        .unwrap_err();
        assert_eq!(err.0.len(), 1);
    }
}
