use application_workflow::config::PagingConfig;
use application_workflow::workflows::applications::{
    ApplicationService, InMemoryApplicationStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Lifecycle service backed by the process-local store.
pub(crate) fn in_memory_service(
    paging: PagingConfig,
) -> Arc<ApplicationService<InMemoryApplicationStore>> {
    let store = Arc::new(InMemoryApplicationStore::new());
    Arc::new(ApplicationService::new(store).with_paging(paging))
}
