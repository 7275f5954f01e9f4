use admission_review::workflows::review::{
    aggregate, Application, ApplicationId, ApplicationStatus, ArtifactLocation, Document,
    DocumentId, DocumentStatus, DocumentStore, DocumentType, ExportKind, ExportService, FileRef,
    QueueCounts, ReviewDecisionPayload, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document store backed by a process-local map; batches apply all-or-nothing.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn seeded(applications: Vec<Application>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.records.lock().expect("store mutex poisoned");
            for application in applications {
                guard.insert(application.application_id.clone(), application);
            }
        }
        store
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch_application(&self, id: &ApplicationId) -> Result<Application, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        guard.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut applications: Vec<Application> = guard.values().cloned().collect();
        applications.sort_by(|a, b| a.application_id.cmp(&b.application_id));
        Ok(applications)
    }

    async fn submit_review(
        &self,
        id: &ApplicationId,
        decisions: &[ReviewDecisionPayload],
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let mut updated = guard.get(id).cloned().ok_or(StoreError::NotFound)?;
        let reviewed_at = Utc::now();

        for decision in decisions {
            let document = updated
                .documents
                .iter_mut()
                .find(|document| document.document_type == decision.document_type)
                .ok_or_else(|| {
                    StoreError::Rejected(format!(
                        "application {id} has no {} document",
                        decision.document_type
                    ))
                })?;
            document.status = decision.status;
            document.remarks = Some(decision.remarks.clone());
            document.reviewed_at = Some(reviewed_at);
        }

        if updated.status == ApplicationStatus::Submitted {
            updated.status = ApplicationStatus::UnderReview;
        }
        guard.insert(id.clone(), updated);
        Ok(())
    }

    async fn fetch_review_stats(&self) -> Result<QueueCounts, StoreError> {
        let applications = self.list_applications().await?;
        Ok(aggregate(&applications))
    }
}

/// Export service that hands out download links without producing files.
#[derive(Clone)]
pub(crate) struct InMemoryExportService {
    base_url: String,
    sequence: Arc<AtomicU64>,
}

impl InMemoryExportService {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl ExportService for InMemoryExportService {
    async fn generate_combined_artifact(
        &self,
        id: &ApplicationId,
        kind: ExportKind,
        document_ids: &[DocumentId],
    ) -> Result<ArtifactLocation, StoreError> {
        if document_ids.is_empty() {
            return Err(StoreError::Rejected("no documents selected".to_string()));
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(ArtifactLocation {
            url: format!(
                "{}/exports/{id}/bundle-{sequence:04}.{}",
                self.base_url.trim_end_matches('/'),
                kind.label()
            ),
        })
    }
}

fn seeded_document(
    application: &str,
    document_type: &str,
    file_name: &str,
    status: DocumentStatus,
    uploaded_at: DateTime<Utc>,
) -> Document {
    let mime_type = mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string());
    let mut document = Document::uploaded(
        DocumentId(format!("{application}-{document_type}")),
        DocumentType::new(document_type),
        FileRef {
            name: file_name.to_string(),
            size_bytes: 250_000,
            mime_type,
            location: format!("uploads/{application}/{file_name}"),
        },
        uploaded_at,
    );
    if status.is_reviewed() {
        document.status = status;
        document.reviewed_at = Some(uploaded_at + Duration::days(1));
        document.remarks = Some(match status {
            DocumentStatus::Rejected => "Scan is unreadable".to_string(),
            _ => "Document approved".to_string(),
        });
    }
    document
}

/// Sample applications covering every work-queue tab.
pub(crate) fn demo_applications() -> Vec<Application> {
    let uploaded_at = Utc::now() - Duration::days(3);
    let build = |id: &str, status: ApplicationStatus, docs: &[(&str, &str, DocumentStatus)]| {
        Application {
            application_id: ApplicationId(id.to_string()),
            status,
            documents: docs
                .iter()
                .map(|(document_type, file_name, status)| {
                    seeded_document(id, document_type, file_name, *status, uploaded_at)
                })
                .collect(),
        }
    };

    vec![
        build("APP-1001", ApplicationStatus::Submitted, &[]),
        build(
            "APP-1002",
            ApplicationStatus::Submitted,
            &[
                ("passport", "passport.pdf", DocumentStatus::Pending),
                ("transcript", "transcript.pdf", DocumentStatus::Pending),
                ("photo", "photo.jpg", DocumentStatus::Pending),
            ],
        ),
        build(
            "APP-1003",
            ApplicationStatus::UnderReview,
            &[
                ("passport", "passport.pdf", DocumentStatus::Approved),
                ("transcript", "transcript.pdf", DocumentStatus::Approved),
                ("photo", "photo.png", DocumentStatus::Pending),
            ],
        ),
        build(
            "APP-1004",
            ApplicationStatus::UnderReview,
            &[
                ("passport", "passport.pdf", DocumentStatus::Approved),
                ("transcript", "transcript.pdf", DocumentStatus::Approved),
                ("photo", "photo.jpg", DocumentStatus::Approved),
                ("recommendation", "recommendation.docx", DocumentStatus::Approved),
            ],
        ),
        build(
            "APP-1005",
            ApplicationStatus::UnderReview,
            &[
                ("passport", "passport.pdf", DocumentStatus::Approved),
                ("photo", "photo.jpg", DocumentStatus::Rejected),
            ],
        ),
    ]
}
