use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::classification::{
    aggregate, classify, filter_queue, reconcile, ReconciledCounts, ReviewClass,
};
use super::commit::{
    submit_with_retry, validate, CommitSummary, ReviewConfirmation, ValidationError,
};
use super::domain::{Application, ApplicationId, DocumentId, ExportKind};
use super::gate::{prepare_export, ExportError, ExportHandle, ExportSelection};
use super::session::{ReviewSession, SessionError};
use super::store::{DocumentStore, ExportService, StoreError};
use crate::config::ReviewConfig;

/// Service wiring review sessions to the document store and the export service.
pub struct DocumentReviewService<S, E> {
    store: Arc<S>,
    exports: Arc<E>,
    config: ReviewConfig,
}

/// Successful commit together with the state re-read from the store.
#[derive(Debug, Clone, Serialize)]
pub struct CommitReceipt {
    pub summary: CommitSummary,
    pub application: Application,
    pub review_class: ReviewClass,
    /// Absent when the applications could not be listed after the commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ReconciledCounts>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed(CommitReceipt),
    /// The reviewer declined; nothing was sent.
    Declined { summary: CommitSummary },
    /// The store accepted the batch but the application could not be re-read.
    RefreshFailed {
        summary: CommitSummary,
        application_id: ApplicationId,
        reason: String,
    },
}

impl<S, E> DocumentReviewService<S, E>
where
    S: DocumentStore + 'static,
    E: ExportService + 'static,
{
    pub fn new(store: Arc<S>, exports: Arc<E>, config: ReviewConfig) -> Self {
        Self {
            store,
            exports,
            config,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Start reviewing an application using freshly fetched state.
    pub async fn open_session(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ReviewSession, ReviewServiceError> {
        let application = self.store.fetch_application(application_id).await?;
        Ok(ReviewSession::with_default_remark(
            application,
            self.config.default_approval_remark.clone(),
        ))
    }

    /// Point an existing session at another application; staged work is discarded.
    pub async fn switch_session(
        &self,
        session: &mut ReviewSession,
        application_id: &ApplicationId,
    ) -> Result<(), ReviewServiceError> {
        let application = self.store.fetch_application(application_id).await?;
        if !session.buffer().is_empty() {
            info!(
                from = %session.application_id(),
                to = %application_id,
                discarded = session.buffer().len(),
                "switching review session; staged decisions discarded"
            );
        }
        session.switch_to(application);
        Ok(())
    }

    /// Validate, confirm, and persist the session's staged decisions.
    ///
    /// The buffer is cleared only after the store accepted the batch; any failure before that
    /// leaves it as it was so the reviewer can retry. Once accepted, the outcome is always
    /// `Committed` or `RefreshFailed`, never an error.
    pub async fn commit<C>(
        &self,
        session: &mut ReviewSession,
        confirmation: &C,
    ) -> Result<CommitOutcome, ReviewServiceError>
    where
        C: ReviewConfirmation + ?Sized,
    {
        let batch = validate(session.buffer())?;
        let summary = batch.summary();

        if !confirmation.confirm(&summary) {
            info!(application_id = %batch.application_id(), "review commit declined");
            return Ok(CommitOutcome::Declined { summary });
        }

        submit_with_retry(self.store.as_ref(), &batch, &self.config.commit_retry)
            .await
            .map_err(|error| {
                warn!(
                    application_id = %batch.application_id(),
                    %error,
                    "review commit failed; staged decisions kept"
                );
                ReviewServiceError::Store(error)
            })?;
        session.clear_buffer();

        let application = match self.refresh_session(session).await {
            Ok(application) => application,
            Err(error) => {
                warn!(
                    application_id = %batch.application_id(),
                    %error,
                    "review decisions committed but the application could not be re-read"
                );
                return Ok(CommitOutcome::RefreshFailed {
                    summary,
                    application_id: batch.application_id().clone(),
                    reason: error.to_string(),
                });
            }
        };
        let review_class = classify(&application.documents);
        let counts = match self.queue_counts().await {
            Ok(counts) => Some(counts),
            Err(error) => {
                warn!(%error, "queue counts unavailable after commit");
                None
            }
        };

        info!(
            application_id = %batch.application_id(),
            approvals = summary.approvals,
            rejections = summary.rejections,
            %review_class,
            "review decisions committed"
        );

        Ok(CommitOutcome::Committed(CommitReceipt {
            summary,
            application,
            review_class,
            counts,
        }))
    }

    async fn refresh_session(
        &self,
        session: &mut ReviewSession,
    ) -> Result<Application, ReviewServiceError> {
        let application = self.store.fetch_application(session.application_id()).await?;
        session.refresh(application.clone())?;
        Ok(application)
    }

    /// Tab counts across all applications, cross-checked against the store's statistics.
    pub async fn queue_counts(&self) -> Result<ReconciledCounts, ReviewServiceError> {
        let applications = self.store.list_applications().await?;
        let local = aggregate(&applications);
        let remote = self.store.fetch_review_stats().await;
        Ok(reconcile(local, remote))
    }

    /// Applications in one work-queue tab.
    pub async fn queue(&self, class: ReviewClass) -> Result<Vec<Application>, ReviewServiceError> {
        let applications = self.store.list_applications().await?;
        Ok(filter_queue(&applications, class)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Export the session's selection, or every approved document if no export was opened.
    /// Never retried.
    pub async fn request_export(
        &self,
        session: &ReviewSession,
        kind: ExportKind,
    ) -> Result<ExportHandle, ReviewServiceError> {
        let selected = match session.selection() {
            Some(selection) => selection.selected(),
            None => ExportSelection::open(session.application()).selected(),
        };
        self.export_documents(session.application_id(), kind, &selected)
            .await
    }

    /// Export explicit documents of an application after re-checking its current state.
    pub async fn export_documents(
        &self,
        application_id: &ApplicationId,
        kind: ExportKind,
        document_ids: &[DocumentId],
    ) -> Result<ExportHandle, ReviewServiceError> {
        let application = self.store.fetch_application(application_id).await?;
        let request = prepare_export(&application, kind, document_ids)?;

        let location = self
            .exports
            .generate_combined_artifact(
                &request.application_id,
                request.kind,
                &request.document_ids,
            )
            .await?;

        info!(
            application_id = %request.application_id,
            kind = request.kind.label(),
            documents = request.document_ids.len(),
            "export accepted"
        );

        Ok(ExportHandle {
            application_id: request.application_id,
            kind: request.kind,
            content_type: request.kind.content_type().to_string(),
            document_ids: request.document_ids,
            url: location.url,
        })
    }

    pub async fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ReviewServiceError> {
        Ok(self.store.fetch_application(application_id).await?)
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
