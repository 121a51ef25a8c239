use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::applications::domain::{
    Application, ApplicationDraft, ApplicationId, ApplicationNumber, Revision,
};
use crate::workflows::applications::memory::InMemoryApplicationStore;
use crate::workflows::applications::numbers::NumberAllocator;
use crate::workflows::applications::repository::{
    ApplicationQuery, ApplicationStore, Page, RepositoryError, RevisionStore,
};
use crate::workflows::applications::{application_router, ApplicationService};

pub(super) fn draft() -> ApplicationDraft {
    ApplicationDraft::new("new app", "Something")
}

pub(super) fn build_service() -> (
    ApplicationService<InMemoryApplicationStore>,
    Arc<InMemoryApplicationStore>,
) {
    let store = Arc::new(InMemoryApplicationStore::new());
    let service = ApplicationService::new(store.clone());
    (service, store)
}

pub(super) fn application_router_with_service(
    service: ApplicationService<InMemoryApplicationStore>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every call fails, standing in for a lost database connection.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_id(&self, _id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_number(
        &self,
        _number: ApplicationNumber,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn query(&self, _query: &ApplicationQuery) -> Result<Page<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl RevisionStore for UnavailableStore {
    fn revisions_for(&self, _id: ApplicationId) -> Result<Vec<Revision>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Wraps the memory store but hides existing numbers from lookups, so a stale
/// allocation only surfaces when the publishing write commits.
#[derive(Default)]
pub(super) struct StaleLookupStore {
    pub(super) inner: InMemoryApplicationStore,
}

impl ApplicationStore for StaleLookupStore {
    fn next_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.inner.next_id()
    }

    fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_by_id(id)
    }

    fn find_by_number(
        &self,
        _number: ApplicationNumber,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn save(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.save(application)
    }

    fn delete(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner.delete(application)
    }

    fn query(&self, query: &ApplicationQuery) -> Result<Page<Application>, RepositoryError> {
        self.inner.query(query)
    }
}

impl RevisionStore for StaleLookupStore {
    fn revisions_for(&self, id: ApplicationId) -> Result<Vec<Revision>, RepositoryError> {
        self.inner.revisions_for(id)
    }
}

pub(super) fn seeded_service(
    seed: u64,
) -> (ApplicationService<StaleLookupStore>, Arc<StaleLookupStore>) {
    let store = Arc::new(StaleLookupStore::default());
    let service = ApplicationService::with_allocator(store.clone(), NumberAllocator::seeded(seed));
    (service, store)
}

/// Drive a fresh application to `ACCEPTED`.
pub(super) fn accepted<S>(service: &ApplicationService<S>) -> Application
where
    S: ApplicationStore + RevisionStore + 'static,
{
    let created = service.create(draft()).expect("create");
    service.verify(created.id).expect("verify");
    service.accept(created.id).expect("accept")
}
