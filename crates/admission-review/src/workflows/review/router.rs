use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::classification::{ReviewClass, ReviewTally};
use super::commit::{PresetConfirmation, ValidationError};
use super::domain::{
    Application, ApplicationId, Document, DocumentId, DocumentType, ExportKind, ReviewDecision,
};
use super::gate::{is_export_eligible, ExportError};
use super::service::{CommitOutcome, DocumentReviewService, ReviewServiceError};
use super::session::SessionError;
use super::store::{DocumentStore, ExportService, StoreError};

/// Router builder exposing the review queues, decision commits, and exports.
pub fn review_router<S, E>(service: Arc<DocumentReviewService<S, E>>) -> Router
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    Router::new()
        .route("/api/v1/review/queues", get(queue_counts_handler::<S, E>))
        .route("/api/v1/review/queues/:class", get(queue_handler::<S, E>))
        .route(
            "/api/v1/review/applications/:application_id",
            get(application_handler::<S, E>),
        )
        .route(
            "/api/v1/review/applications/:application_id/decisions",
            post(decisions_handler::<S, E>),
        )
        .route(
            "/api/v1/review/applications/:application_id/exports",
            post(export_handler::<S, E>),
        )
        .with_state(service)
}

/// Application as shown on the review screen.
#[derive(Debug, Serialize)]
pub struct ApplicationReviewView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub review_class: ReviewClass,
    pub tally: ReviewTally,
    pub export_eligible: bool,
    pub documents: Vec<Document>,
}

impl From<Application> for ApplicationReviewView {
    fn from(application: Application) -> Self {
        let tally = ReviewTally::from_documents(&application.documents);
        Self {
            export_eligible: is_export_eligible(&application),
            status: application.status.label(),
            review_class: tally.class(),
            tally,
            application_id: application.application_id,
            documents: application.documents,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DecisionEntry {
    pub document_type: DocumentType,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBatchRequest {
    pub decisions: Vec<DecisionEntry>,
    /// Without confirmation the batch is only validated and summarized.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequestBody {
    pub kind: ExportKind,
    /// Omitted means every approved document.
    #[serde(default)]
    pub document_ids: Option<Vec<DocumentId>>,
}

pub(crate) async fn queue_counts_handler<S, E>(
    State(service): State<Arc<DocumentReviewService<S, E>>>,
) -> Response
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    match service.queue_counts().await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<S, E>(
    State(service): State<Arc<DocumentReviewService<S, E>>>,
    Path(class): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    let class = match class.parse::<ReviewClass>() {
        Ok(class) => class,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.queue(class).await {
        Ok(applications) => {
            let views: Vec<ApplicationReviewView> = applications
                .into_iter()
                .map(ApplicationReviewView::from)
                .collect();
            let payload = json!({ "class": class, "applications": views });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn application_handler<S, E>(
    State(service): State<Arc<DocumentReviewService<S, E>>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    match service.get(&ApplicationId(application_id)).await {
        Ok(application) => {
            (StatusCode::OK, Json(ApplicationReviewView::from(application))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decisions_handler<S, E>(
    State(service): State<Arc<DocumentReviewService<S, E>>>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionBatchRequest>,
) -> Response
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    let id = ApplicationId(application_id);
    let mut session = match service.open_session(&id).await {
        Ok(session) => session,
        Err(error) => return error_response(error),
    };

    for entry in request.decisions {
        let staged = session.stage(
            entry.document_type,
            entry.decision,
            entry.remarks.as_deref(),
        );
        if let Err(error) = staged {
            return error_response(error.into());
        }
    }

    match service
        .commit(&mut session, &PresetConfirmation(request.confirm))
        .await
    {
        Ok(CommitOutcome::Declined { summary }) => {
            let payload = json!({
                "status": "awaiting_confirmation",
                "summary": summary,
                "message": summary.to_string(),
            });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<S, E>(
    State(service): State<Arc<DocumentReviewService<S, E>>>,
    Path(application_id): Path<String>,
    Json(request): Json<ExportRequestBody>,
) -> Response
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    let id = ApplicationId(application_id);
    let result = match request.document_ids {
        Some(document_ids) => service.export_documents(&id, request.kind, &document_ids).await,
        None => match service.open_session(&id).await {
            Ok(session) => service.request_export(&session, request.kind).await,
            Err(error) => Err(error),
        },
    };

    match result {
        Ok(handle) => (StatusCode::CREATED, Json(handle)).into_response(),
        Err(error) => error_response(error),
    }
}

impl ReviewServiceError {
    /// HTTP status shared by the review routes and the process-level error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewServiceError::Validation(_)
            | ReviewServiceError::Session(SessionError::UnknownDocument { .. })
            | ReviewServiceError::Export(
                ExportError::Validation(_)
                | ExportError::NotSelectable { .. }
                | ExportError::UnknownDocument(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            ReviewServiceError::Export(ExportError::Ineligible { .. }) => StatusCode::CONFLICT,
            ReviewServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ReviewServiceError::Store(_) => StatusCode::BAD_GATEWAY,
            ReviewServiceError::Session(SessionError::ApplicationMismatch { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn error_response(error: ReviewServiceError) -> Response {
    let status = error.status_code();

    let payload = match &error {
        ReviewServiceError::Validation(ValidationError::MissingRemarks { document_types }) => {
            json!({ "error": error.to_string(), "document_types": document_types })
        }
        _ => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}
