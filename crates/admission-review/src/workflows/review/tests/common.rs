use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::{RetryPolicy, ReviewConfig};
use crate::workflows::review::classification::{aggregate, QueueCounts};
use crate::workflows::review::domain::{
    Application, ApplicationId, ApplicationStatus, Document, DocumentId, DocumentStatus,
    DocumentType, ExportKind, FileRef,
};
use crate::workflows::review::service::DocumentReviewService;
use crate::workflows::review::store::{
    ArtifactLocation, DocumentStore, ExportService, ReviewDecisionPayload, StoreError,
};

pub(super) fn uploaded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn document(document_type: &str, status: DocumentStatus) -> Document {
    Document {
        id: DocumentId(format!("doc-{document_type}")),
        document_type: DocumentType::new(document_type),
        file: FileRef {
            name: format!("{document_type}.pdf"),
            size_bytes: 48_213,
            mime_type: Some("application/pdf".to_string()),
            location: format!("uploads/{document_type}.pdf"),
        },
        status,
        remarks: None,
        uploaded_at: uploaded_at(),
        reviewed_at: status.is_reviewed().then(uploaded_at),
    }
}

pub(super) fn application(id: &str, documents: &[(&str, DocumentStatus)]) -> Application {
    Application {
        application_id: ApplicationId(id.to_string()),
        status: ApplicationStatus::UnderReview,
        documents: documents
            .iter()
            .map(|(document_type, status)| document(document_type, *status))
            .collect(),
    }
}

pub(super) fn pending_application(id: &str) -> Application {
    application(
        id,
        &[
            ("passport", DocumentStatus::Pending),
            ("transcript", DocumentStatus::Pending),
            ("photo", DocumentStatus::Pending),
        ],
    )
}

pub(super) fn approved_application(id: &str) -> Application {
    application(
        id,
        &[
            ("passport", DocumentStatus::Approved),
            ("transcript", DocumentStatus::Approved),
            ("photo", DocumentStatus::Approved),
            ("recommendation", DocumentStatus::Approved),
        ],
    )
}

pub(super) fn review_config() -> ReviewConfig {
    ReviewConfig {
        default_approval_remark: "Document approved".to_string(),
        commit_retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        },
    }
}

/// Store keeping applications in memory, applying review batches all-or-nothing.
#[derive(Default)]
pub(super) struct MemoryStore {
    applications: Mutex<BTreeMap<ApplicationId, Application>>,
    submit_failures: Mutex<VecDeque<StoreError>>,
    stats_override: Mutex<Option<Result<QueueCounts, StoreError>>>,
    submissions: Mutex<Vec<(ApplicationId, Vec<ReviewDecisionPayload>)>>,
    submit_attempts: Mutex<usize>,
    fetch_failure: Mutex<Option<StoreError>>,
    list_failure: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub(super) fn with(applications: Vec<Application>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.applications.lock().expect("store mutex poisoned");
            for application in applications {
                guard.insert(application.application_id.clone(), application);
            }
        }
        store
    }

    pub(super) fn fail_next_submits(&self, errors: Vec<StoreError>) {
        self.submit_failures
            .lock()
            .expect("store mutex poisoned")
            .extend(errors);
    }

    /// Make every later `fetch_application` fail.
    pub(super) fn fail_fetches(&self, error: StoreError) {
        *self.fetch_failure.lock().expect("store mutex poisoned") = Some(error);
    }

    /// Make every later `list_applications` fail.
    pub(super) fn fail_listing(&self, error: StoreError) {
        *self.list_failure.lock().expect("store mutex poisoned") = Some(error);
    }

    pub(super) fn override_stats(&self, stats: Result<QueueCounts, StoreError>) {
        *self.stats_override.lock().expect("store mutex poisoned") = Some(stats);
    }

    pub(super) fn snapshot(&self, id: &str) -> Application {
        self.applications
            .lock()
            .expect("store mutex poisoned")
            .get(&ApplicationId(id.to_string()))
            .cloned()
            .expect("application present")
    }

    pub(super) fn submissions(&self) -> Vec<(ApplicationId, Vec<ReviewDecisionPayload>)> {
        self.submissions.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn submit_attempts(&self) -> usize {
        *self.submit_attempts.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_application(&self, id: &ApplicationId) -> Result<Application, StoreError> {
        if let Some(error) = self.fetch_failure.lock().expect("store mutex poisoned").clone() {
            return Err(error);
        }
        self.applications
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        if let Some(error) = self.list_failure.lock().expect("store mutex poisoned").clone() {
            return Err(error);
        }
        Ok(self
            .applications
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect())
    }

    async fn submit_review(
        &self,
        id: &ApplicationId,
        decisions: &[ReviewDecisionPayload],
    ) -> Result<(), StoreError> {
        *self.submit_attempts.lock().expect("store mutex poisoned") += 1;
        if let Some(error) = self
            .submit_failures
            .lock()
            .expect("store mutex poisoned")
            .pop_front()
        {
            return Err(error);
        }

        let mut guard = self.applications.lock().expect("store mutex poisoned");
        let mut updated = guard.get(id).cloned().ok_or(StoreError::NotFound)?;
        let reviewed_at = Utc::now();
        for decision in decisions {
            let document = updated
                .documents
                .iter_mut()
                .find(|document| document.document_type == decision.document_type)
                .ok_or_else(|| {
                    StoreError::Rejected(format!("unknown document {}", decision.document_type))
                })?;
            document.status = decision.status;
            document.remarks = Some(decision.remarks.clone());
            document.reviewed_at = Some(reviewed_at);
        }
        guard.insert(id.clone(), updated);
        self.submissions
            .lock()
            .expect("store mutex poisoned")
            .push((id.clone(), decisions.to_vec()));
        Ok(())
    }

    async fn fetch_review_stats(&self) -> Result<QueueCounts, StoreError> {
        if let Some(stats) = self
            .stats_override
            .lock()
            .expect("store mutex poisoned")
            .clone()
        {
            return stats;
        }
        let applications: Vec<Application> = self
            .applications
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect();
        Ok(aggregate(&applications))
    }
}

/// Export service recording every request it receives.
#[derive(Default)]
pub(super) struct MemoryExports {
    requests: Mutex<Vec<(ApplicationId, ExportKind, Vec<DocumentId>)>>,
    failure: Mutex<Option<StoreError>>,
}

impl MemoryExports {
    pub(super) fn fail_with(&self, error: StoreError) {
        *self.failure.lock().expect("exports mutex poisoned") = Some(error);
    }

    pub(super) fn requests(&self) -> Vec<(ApplicationId, ExportKind, Vec<DocumentId>)> {
        self.requests.lock().expect("exports mutex poisoned").clone()
    }
}

#[async_trait]
impl ExportService for MemoryExports {
    async fn generate_combined_artifact(
        &self,
        id: &ApplicationId,
        kind: ExportKind,
        document_ids: &[DocumentId],
    ) -> Result<ArtifactLocation, StoreError> {
        self.requests
            .lock()
            .expect("exports mutex poisoned")
            .push((id.clone(), kind, document_ids.to_vec()));
        if let Some(error) = self.failure.lock().expect("exports mutex poisoned").clone() {
            return Err(error);
        }
        Ok(ArtifactLocation {
            url: format!("https://files.example.edu/exports/{}.{}", id, kind.label()),
        })
    }
}

pub(super) fn build_service(
    applications: Vec<Application>,
) -> (
    DocumentReviewService<MemoryStore, MemoryExports>,
    Arc<MemoryStore>,
    Arc<MemoryExports>,
) {
    let store = Arc::new(MemoryStore::with(applications));
    let exports = Arc::new(MemoryExports::default());
    let service = DocumentReviewService::new(store.clone(), exports.clone(), review_config());
    (service, store, exports)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
