use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::classification::QueueCounts;
use super::domain::{
    Application, ApplicationId, DocumentId, DocumentStatus, DocumentType, ExportKind,
};

/// One committed decision as sent to the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecisionPayload {
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub remarks: String,
}

/// Persistence boundary for applications and their documents.
///
/// `submit_review` must apply the whole batch or nothing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_application(&self, id: &ApplicationId) -> Result<Application, StoreError>;

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError>;

    async fn submit_review(
        &self,
        id: &ApplicationId,
        decisions: &[ReviewDecisionPayload],
    ) -> Result<(), StoreError>;

    /// Precomputed per-class counts, if the backend maintains them.
    async fn fetch_review_stats(&self) -> Result<QueueCounts, StoreError>;
}

/// Where a generated artifact can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub url: String,
}

/// File service producing combined PDF / ZIP artifacts.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn generate_combined_artifact(
        &self,
        id: &ApplicationId,
        kind: ExportKind,
        document_ids: &[DocumentId],
    ) -> Result<ArtifactLocation, StoreError>;
}

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("application not found")]
    NotFound,
    #[error("store rejected the request: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store request timed out")]
    Timeout,
}

impl StoreError {
    /// Whether repeating the same request may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout)
    }
}
