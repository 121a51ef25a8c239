//! Application approval lifecycle.
//!
//! The service is the single write path: it reads the current row, checks the move
//! against the transition table, derives the optional fields and hands the result to
//! the store, which records a revision alongside every write.

pub mod domain;
pub mod lifecycle;
pub mod locks;
pub mod memory;
pub mod numbers;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    derive_invariant_fields, Application, ApplicationDraft, ApplicationId, ApplicationNumber,
    ApplicationStatus, AuditEntry, DraftError, Revision, RevisionType,
};
pub use lifecycle::{
    allowed_targets, plan_transition, LifecycleError, TransitionEffect, TransitionRule,
    TRANSITION_TABLE,
};
pub use memory::InMemoryApplicationStore;
pub use numbers::NumberAllocator;
pub use repository::{ApplicationQuery, ApplicationStore, Page, RepositoryError, RevisionStore};
pub use router::application_router;
pub use service::ApplicationService;
