use std::sync::Arc;

use tracing::{debug, info, warn};

use super::domain::{
    normalize_reason, Application, ApplicationDraft, ApplicationId, ApplicationStatus, Revision,
};
use super::lifecycle::{
    is_deletable, is_editable, plan_transition, LifecycleError, TransitionEffect, DELETE_REFUSED,
    EDIT_REFUSED,
};
use super::locks::IdLocks;
use super::numbers::NumberAllocator;
use super::repository::{ApplicationQuery, ApplicationStore, Page, RepositoryError, RevisionStore};
use crate::config::PagingConfig;

/// Lifecycle engine: the only write path into the application and revision stores.
///
/// Each mutating call holds the per-id lock from the initial read until the write
/// commits, and validates before it writes, so a refused request leaves no trace.
pub struct ApplicationService<S> {
    store: Arc<S>,
    numbers: NumberAllocator,
    locks: IdLocks,
    paging: PagingConfig,
}

impl<S> ApplicationService<S>
where
    S: ApplicationStore + RevisionStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_allocator(store, NumberAllocator::new())
    }

    pub fn with_allocator(store: Arc<S>, numbers: NumberAllocator) -> Self {
        Self {
            store,
            numbers,
            locks: IdLocks::new(),
            paging: PagingConfig::default(),
        }
    }

    pub fn with_paging(mut self, paging: PagingConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn paging(&self) -> PagingConfig {
        self.paging
    }

    /// Create a new application in the `CREATED` status.
    pub fn create(&self, draft: ApplicationDraft) -> Result<Application, LifecycleError> {
        let id = self.store.next_id()?;
        let stored = self.persist(Application::created(id, draft))?;
        info!(application_id = %stored.id, status = %stored.status, "application created");
        Ok(stored)
    }

    /// Replace name and body while the application is still under review.
    pub fn edit(
        &self,
        id: ApplicationId,
        draft: ApplicationDraft,
    ) -> Result<Application, LifecycleError> {
        let _guard = self.locks.acquire(id);
        let mut application = self.load(id)?;

        if !is_editable(application.status) {
            warn!(application_id = %id, status = %application.status, "edit refused");
            return Err(LifecycleError::InvalidTransition {
                from: application.status,
                to: application.status,
                message: EDIT_REFUSED,
            });
        }

        application.name = draft.name;
        application.body = draft.body;

        let stored = self.persist(application)?;
        info!(application_id = %id, status = %stored.status, "application edited");
        Ok(stored)
    }

    /// Move an application to `target` if the transition table allows it.
    pub fn transition(
        &self,
        id: ApplicationId,
        target: ApplicationStatus,
        reason: Option<String>,
    ) -> Result<Application, LifecycleError> {
        let reason = normalize_reason(reason);
        let _guard = self.locks.acquire(id);
        let mut application = self.load(id)?;
        let from = application.status;

        let effect = plan_transition(from, target, reason.as_deref()).inspect_err(|err| {
            warn!(application_id = %id, %from, to = %target, error = %err, "transition refused");
        })?;

        application.status = target;
        application.reason = None;
        application.application_number = None;

        let stored = match effect {
            TransitionEffect::None => self.persist(application)?,
            TransitionEffect::RecordReason => {
                application.reason = reason;
                self.persist(application)?
            }
            TransitionEffect::AllocateNumber => self.commit_with_number(application)?,
        };

        info!(application_id = %id, %from, to = %stored.status, "application transitioned");
        Ok(stored)
    }

    pub fn verify(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.transition(id, ApplicationStatus::Verified, None)
    }

    pub fn accept(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.transition(id, ApplicationStatus::Accepted, None)
    }

    pub fn publish(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.transition(id, ApplicationStatus::Published, None)
    }

    pub fn reject(
        &self,
        id: ApplicationId,
        reason: Option<String>,
    ) -> Result<Application, LifecycleError> {
        self.transition(id, ApplicationStatus::Rejected, reason)
    }

    /// Delete a freshly created application, keeping the reason in its history.
    ///
    /// The store records the `DELETED` snapshot as an UPDATE revision and the removal
    /// as a DELETE revision.
    pub fn delete(&self, id: ApplicationId, reason: Option<String>) -> Result<(), LifecycleError> {
        let reason = normalize_reason(reason);
        let _guard = self.locks.acquire(id);
        let mut application = self.load(id)?;

        if !is_deletable(application.status) {
            warn!(application_id = %id, status = %application.status, "delete refused");
            return Err(LifecycleError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Deleted,
                message: DELETE_REFUSED,
            });
        }
        let reason = reason.ok_or(LifecycleError::MissingReason)?;

        application.status = ApplicationStatus::Deleted;
        application.reason = Some(reason);
        self.store.delete(application.with_derived_fields())?;

        info!(application_id = %id, "application deleted");
        Ok(())
    }

    pub fn get(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.load(id)
    }

    /// Full revision history for `id`, oldest first. Unknown ids yield an empty list.
    pub fn audit(&self, id: ApplicationId) -> Result<Vec<Revision>, LifecycleError> {
        Ok(self.store.revisions_for(id)?)
    }

    /// Filtered listing; the page size is resolved against the paging configuration.
    pub fn list(
        &self,
        name: Option<String>,
        status: Option<ApplicationStatus>,
        page: usize,
        size: Option<usize>,
    ) -> Result<Page<Application>, LifecycleError> {
        let query = ApplicationQuery {
            name: name.filter(|value| !value.is_empty()),
            status,
            page,
            size: self.paging.resolve(size),
        };
        Ok(self.store.query(&query)?)
    }

    fn load(&self, id: ApplicationId) -> Result<Application, LifecycleError> {
        self.store
            .find_by_id(id)?
            .ok_or(LifecycleError::NotFound(id))
    }

    fn persist(&self, application: Application) -> Result<Application, LifecycleError> {
        Ok(self.store.save(application.with_derived_fields())?)
    }

    /// Allocate a number and commit. A number claimed between the lookup and the commit
    /// is refused by the store, and the allocator draws again.
    fn commit_with_number(
        &self,
        mut application: Application,
    ) -> Result<Application, LifecycleError> {
        loop {
            let number = self.numbers.allocate(self.store.as_ref())?;
            application.application_number = Some(number);
            match self.persist(application.clone()) {
                Err(LifecycleError::Repository(RepositoryError::DuplicateNumber(taken))) => {
                    debug!(
                        application_id = %application.id,
                        %taken,
                        "number claimed during commit, redrawing"
                    );
                }
                other => return other,
            }
        }
    }
}
