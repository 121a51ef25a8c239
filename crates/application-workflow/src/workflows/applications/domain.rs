use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when an application is first written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique number handed out when an application is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationNumber(pub i64);

impl fmt::Display for ApplicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle stage of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Created,
    Verified,
    Accepted,
    Published,
    Rejected,
    Deleted,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Created,
            Self::Verified,
            Self::Accepted,
            Self::Published,
            Self::Rejected,
            Self::Deleted,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Verified => "VERIFIED",
            Self::Accepted => "ACCEPTED",
            Self::Published => "PUBLISHED",
            Self::Rejected => "REJECTED",
            Self::Deleted => "DELETED",
        }
    }

    /// Whether an application in this status may hold a reason.
    pub const fn carries_reason(self) -> bool {
        matches!(self, Self::Rejected | Self::Deleted)
    }

    /// Whether an application in this status may hold an application number.
    pub const fn carries_number(self) -> bool {
        matches!(self, Self::Published)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Free-text content supplied when creating or editing an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

impl ApplicationDraft {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// Input-shape check applied at the API boundary before the draft reaches the lifecycle.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::BlankName);
        }
        if self.body.trim().is_empty() {
            return Err(DraftError::BlankBody);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("your application needs a name")]
    BlankName,
    #[error("your application needs a body")]
    BlankBody,
}

/// Current state of an application as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
    pub body: String,
    pub status: ApplicationStatus,
    pub application_number: Option<ApplicationNumber>,
    pub reason: Option<String>,
}

impl Application {
    pub fn created(id: ApplicationId, draft: ApplicationDraft) -> Self {
        Self {
            id,
            name: draft.name,
            body: draft.body,
            status: ApplicationStatus::Created,
            application_number: None,
            reason: None,
        }
    }

    /// Re-derive the optional fields from the status; every write path goes through here.
    pub fn with_derived_fields(mut self) -> Self {
        let (number, reason) =
            derive_invariant_fields(self.status, self.application_number, self.reason.take());
        self.application_number = number;
        self.reason = reason;
        self
    }

    /// True when the optional fields agree with the status.
    pub fn is_consistent(&self) -> bool {
        self.application_number.is_some() == self.status.carries_number()
            && (self.reason.is_none() || self.status.carries_reason())
    }
}

/// Keep the number only for published applications and the reason only for rejected or deleted ones.
pub fn derive_invariant_fields(
    status: ApplicationStatus,
    number: Option<ApplicationNumber>,
    reason: Option<String>,
) -> (Option<ApplicationNumber>, Option<String>) {
    let number = number.filter(|_| status.carries_number());
    let reason = reason.filter(|_| status.carries_reason());
    (number, reason)
}

/// Blank reasons count as missing.
pub fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason.filter(|value| !value.trim().is_empty())
}

/// Kind of write a revision records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevisionType {
    Insert,
    Update,
    Delete,
}

/// Immutable snapshot of an application taken with a store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub revision_number: u64,
    pub timestamp: DateTime<Utc>,
    pub revision_type: RevisionType,
    pub application: Application,
}

impl Revision {
    pub fn audit_entry(&self) -> AuditEntry {
        AuditEntry {
            revision: self.revision_number,
            revision_date: self.timestamp,
            revision_type: self.revision_type,
            id: self.application.id,
            name: self.application.name.clone(),
            body: self.application.body.clone(),
            status: self.application.status,
            application_number: self.application.application_number,
            reason: self.application.reason.clone(),
        }
    }
}

/// Flattened revision shape returned by the audit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub revision: u64,
    pub revision_date: DateTime<Utc>,
    pub revision_type: RevisionType,
    pub id: ApplicationId,
    pub name: String,
    pub body: String,
    pub status: ApplicationStatus,
    pub application_number: Option<ApplicationNumber>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_status() {
        let number = Some(ApplicationNumber(42));
        let reason = Some("bad".to_string());

        for status in ApplicationStatus::ordered() {
            let (kept_number, kept_reason) =
                derive_invariant_fields(status, number, reason.clone());
            assert_eq!(kept_number.is_some(), status == ApplicationStatus::Published);
            assert_eq!(
                kept_reason.is_some(),
                matches!(
                    status,
                    ApplicationStatus::Rejected | ApplicationStatus::Deleted
                )
            );
        }
    }

    #[test]
    fn derivation_never_invents_values() {
        let (number, reason) = derive_invariant_fields(ApplicationStatus::Published, None, None);
        assert!(number.is_none());
        assert!(reason.is_none());
    }

    #[test]
    fn blank_draft_fields_are_rejected() {
        assert_eq!(
            ApplicationDraft::new("  ", "body").validate(),
            Err(DraftError::BlankName)
        );
        assert_eq!(
            ApplicationDraft::new("name", "").validate(),
            Err(DraftError::BlankBody)
        );
        assert!(ApplicationDraft::new("name", "body").validate().is_ok());
    }

    #[test]
    fn blank_reason_counts_as_missing() {
        assert_eq!(normalize_reason(Some("   ".to_string())), None);
        assert_eq!(normalize_reason(None), None);
        assert_eq!(
            normalize_reason(Some("bad".to_string())),
            Some("bad".to_string())
        );
    }

    #[test]
    fn status_serializes_in_upper_case() {
        let json = serde_json::to_string(&ApplicationStatus::Published).expect("serializes");
        assert_eq!(json, "\"PUBLISHED\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"REJECTED\"").expect("parses");
        assert_eq!(parsed, ApplicationStatus::Rejected);
    }
}
