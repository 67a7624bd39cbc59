use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered worker profile, unique by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laborer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub skill: String,
    pub location: String,
    pub language: String,
    pub available: bool,
    pub registered_at: DateTime<Utc>,
}

/// Payload accepted when registering a laborer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLaborer {
    pub name: String,
    pub phone: String,
    pub skill: String,
    pub location: String,
    pub language: String,
}

/// Partial update for a laborer. Absent fields are left untouched, so a
/// field cannot be cleared to empty through this payload, only
/// overwritten with a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaborerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl LaborerPatch {
    /// Returns `true` when at least one field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.skill.is_none()
            && self.location.is_none()
            && self.language.is_none()
            && self.available.is_none()
    }
}

/// Lifecycle status of a job posting.
///
/// `open` at creation; the assignment workflow moves a job to
/// `assigned`. Generic updates may set any value with no transition
/// guard, so terminal states are not enforced as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Returns the canonical database representation for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A posted work opportunity with its assignment set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub skill_required: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub contact_number: String,
    pub status: JobStatus,
    /// Phone numbers of assigned laborers. Conceptually a set; the
    /// store deduplicates on write.
    pub assigned_laborers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload accepted when posting a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub skill_required: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub contact_number: String,
}

/// Partial update for a job, with the same absent-field semantics as
/// [`LaborerPatch`]. A supplied `status` is applied as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.skill_required.is_none()
            && self.location.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.contact_number.is_none()
            && self.status.is_none()
    }
}

/// Body of an assignment request: one or more laborer phone numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub phone_numbers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trips_through_serde() {
        let status: JobStatus = serde_json::from_str("\"assigned\"").expect("parse");
        assert_eq!(status, JobStatus::Assigned);
        assert_eq!(serde_json::to_string(&status).expect("serialize"), "\"assigned\"");
    }

    #[test]
    fn job_status_rejects_unknown_value() {
        let result: Result<JobStatus, _> = serde_json::from_str("\"paused\"");
        assert!(result.is_err());
    }

    #[test]
    fn laborer_patch_reports_absent_fields() {
        let patch: LaborerPatch = serde_json::from_str("{}").expect("parse");
        assert!(patch.is_empty());

        let patch: LaborerPatch =
            serde_json::from_str(r#"{"available": false}"#).expect("parse");
        assert!(!patch.is_empty());
        assert_eq!(patch.available, Some(false));
        assert_eq!(patch.name, None);
    }

    #[test]
    fn job_status_as_str_matches_wire_format() {
        assert_eq!(JobStatus::Open.as_str(), "open");
        assert_eq!(JobStatus::Cancelled.as_str(), "cancelled");
    }
}
