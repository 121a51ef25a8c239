//! Status transition table for the application lifecycle.
//!
//! The table is plain data so it can be inspected and tested without a store. The
//! service consults [`plan_transition`] before touching storage, so a refused move
//! never produces a write.

use super::domain::{ApplicationId, ApplicationStatus};
use super::repository::RepositoryError;

/// Extra work a legal transition carries out before the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    None,
    RecordReason,
    AllocateNumber,
}

/// One legal `(from, to)` move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub effect: TransitionEffect,
}

/// Every status move reachable through a transition request. Anything absent is refused.
pub const TRANSITION_TABLE: [TransitionRule; 5] = [
    TransitionRule {
        from: ApplicationStatus::Created,
        to: ApplicationStatus::Verified,
        effect: TransitionEffect::None,
    },
    TransitionRule {
        from: ApplicationStatus::Verified,
        to: ApplicationStatus::Accepted,
        effect: TransitionEffect::None,
    },
    TransitionRule {
        from: ApplicationStatus::Verified,
        to: ApplicationStatus::Rejected,
        effect: TransitionEffect::RecordReason,
    },
    TransitionRule {
        from: ApplicationStatus::Accepted,
        to: ApplicationStatus::Published,
        effect: TransitionEffect::AllocateNumber,
    },
    TransitionRule {
        from: ApplicationStatus::Accepted,
        to: ApplicationStatus::Rejected,
        effect: TransitionEffect::RecordReason,
    },
];

pub const EDIT_REFUSED: &str = "you cannot edit this application";
pub const DELETE_REFUSED: &str = "you cannot delete this application";

pub fn rule_for(from: ApplicationStatus, to: ApplicationStatus) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

pub fn allowed_targets(from: ApplicationStatus) -> Vec<ApplicationStatus> {
    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.from == from)
        .map(|rule| rule.to)
        .collect()
}

/// Explanation returned when a transition out of `from` is refused.
pub const fn refusal_message(from: ApplicationStatus) -> &'static str {
    match from {
        ApplicationStatus::Created => "you can only verify or delete this application",
        ApplicationStatus::Verified => "you can only accept or reject this application",
        ApplicationStatus::Accepted => "you can only publish or reject this application",
        ApplicationStatus::Rejected => "you can not edit rejected application",
        ApplicationStatus::Published => "you can not change published application",
        ApplicationStatus::Deleted => "application was deleted",
    }
}

/// Edits keep the status and are limited to applications still under review.
pub const fn is_editable(status: ApplicationStatus) -> bool {
    matches!(status, ApplicationStatus::Created | ApplicationStatus::Verified)
}

pub const fn is_deletable(status: ApplicationStatus) -> bool {
    matches!(status, ApplicationStatus::Created)
}

/// Validate a requested move and return the effect to apply.
///
/// Legality is checked before the reason so an illegal rejection reports the legal
/// targets rather than the missing reason.
pub fn plan_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
    reason: Option<&str>,
) -> Result<TransitionEffect, LifecycleError> {
    let rule = rule_for(from, to).ok_or_else(|| LifecycleError::InvalidTransition {
        from,
        to,
        message: refusal_message(from),
    })?;

    if rule.effect == TransitionEffect::RecordReason && reason.is_none() {
        return Err(LifecycleError::MissingReason);
    }

    Ok(rule.effect)
}

/// Errors surfaced by lifecycle operations. None of them leave a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("application with id: {0} not found")]
    NotFound(ApplicationId),
    #[error("{message}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
        message: &'static str,
    },
    #[error("missing reason")]
    MissingReason,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
