use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationDraft, ApplicationId, ApplicationStatus, AuditEntry};
use super::lifecycle::{allowed_targets, LifecycleError, DELETE_REFUSED, EDIT_REFUSED};
use super::repository::{ApplicationStore, RepositoryError, RevisionStore};
use super::service::ApplicationService;

/// Router builder exposing the application lifecycle over HTTP.
pub fn application_router<S>(service: Arc<ApplicationService<S>>) -> Router
where
    S: ApplicationStore + RevisionStore + 'static,
{
    Router::new()
        .route(
            "/api/applications",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/applications/:id",
            get(get_handler::<S>)
                .put(edit_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route("/api/applications/:id/verify", patch(verify_handler::<S>))
        .route("/api/applications/:id/accept", patch(accept_handler::<S>))
        .route("/api/applications/:id/publish", patch(publish_handler::<S>))
        .route("/api/applications/:id/reject", patch(reject_handler::<S>))
        .route("/api/applications/:id/audit", get(audit_handler::<S>))
        .with_state(service)
}

/// Query string accepted by the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name: Option<String>,
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub page: usize,
    pub size: Option<usize>,
}

/// Body carried by reject and delete requests.
#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    match service.list(params.name, params.status, params.page, params.size) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    match service.get(ApplicationId(id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    payload: Result<axum::Json<ApplicationDraft>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    let draft = match payload {
        Ok(axum::Json(draft)) => draft,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    if let Err(error) = draft.validate() {
        return bad_request(error.to_string());
    }

    match service.create(draft) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn edit_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
    payload: Result<axum::Json<ApplicationDraft>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    let draft = match payload {
        Ok(axum::Json(draft)) => draft,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    if let Err(error) = draft.validate() {
        return bad_request(error.to_string());
    }

    match service.edit(ApplicationId(id), draft) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn verify_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    transition_response(&service, id, ApplicationStatus::Verified, None)
}

pub(crate) async fn accept_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    transition_response(&service, id, ApplicationStatus::Accepted, None)
}

pub(crate) async fn publish_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    transition_response(&service, id, ApplicationStatus::Published, None)
}

pub(crate) async fn reject_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
    payload: Result<axum::Json<ReasonRequest>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    transition_response(&service, id, ApplicationStatus::Rejected, reason_from(payload))
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
    payload: Result<axum::Json<ReasonRequest>, JsonRejection>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    match service.delete(ApplicationId(id), reason_from(payload)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn audit_handler<S>(
    State(service): State<Arc<ApplicationService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    match service.audit(ApplicationId(id)) {
        Ok(revisions) => {
            let entries: Vec<AuditEntry> = revisions.iter().map(|r| r.audit_entry()).collect();
            (StatusCode::OK, axum::Json(entries)).into_response()
        }
        Err(error) => failure_response(error),
    }
}

fn transition_response<S>(
    service: &ApplicationService<S>,
    id: u64,
    target: ApplicationStatus,
    reason: Option<String>,
) -> Response
where
    S: ApplicationStore + RevisionStore + 'static,
{
    match service.transition(ApplicationId(id), target, reason) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => failure_response(error),
    }
}

/// A missing or unreadable reason body is treated as no reason, so the lifecycle
/// decides between an illegal move and a missing reason.
fn reason_from(payload: Result<axum::Json<ReasonRequest>, JsonRejection>) -> Option<String> {
    payload.ok().and_then(|axum::Json(request)| request.reason)
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

pub(crate) fn failure_response(error: LifecycleError) -> Response {
    match &error {
        LifecycleError::NotFound(_) | LifecycleError::Repository(RepositoryError::NotFound(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        LifecycleError::InvalidTransition { message, .. }
            if *message == EDIT_REFUSED || *message == DELETE_REFUSED =>
        {
            bad_request(error.to_string())
        }
        LifecycleError::InvalidTransition { from, .. } => {
            let payload = json!({
                "error": error.to_string(),
                "status": from,
                "allowed": allowed_targets(*from),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        LifecycleError::MissingReason => bad_request(error.to_string()),
        LifecycleError::Repository(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
