use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted admission applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single uploaded file, used when selecting export members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category label of an uploaded document (e.g. `passport`, `transcript`).
///
/// Decisions are keyed by this label, so it is unique within one application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentType(pub String);

impl DocumentType {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque handle to the stored file; the object service owns the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub location: String,
}

/// Review state of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Approved => "APPROVED",
            DocumentStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_reviewed(self) -> bool {
        !matches!(self, DocumentStatus::Pending)
    }
}

/// One uploaded file tied to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub document_type: DocumentType,
    pub file: FileRef,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Document {
    /// A freshly uploaded document awaiting review.
    pub fn uploaded(
        id: DocumentId,
        document_type: DocumentType,
        file: FileRef,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_type,
            file,
            status: DocumentStatus::Pending,
            remarks: None,
            uploaded_at,
            reviewed_at: None,
        }
    }
}

/// Externally managed admission status; read-only from the review workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    UnderReview,
    Verified,
    Rejected,
    Enrolled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Verified => "verified",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Enrolled => "enrolled",
        }
    }
}

/// One student's admission submission and the documents it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Application {
    pub fn document(&self, document_type: &DocumentType) -> Option<&Document> {
        self.documents
            .iter()
            .find(|document| &document.document_type == document_type)
    }

    pub fn document_by_id(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|document| &document.id == id)
    }
}

/// Decision a reviewer can stage for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// Document status a committed decision produces.
    pub const fn resulting_status(self) -> DocumentStatus {
        match self {
            ReviewDecision::Approve => DocumentStatus::Approved,
            ReviewDecision::Reject => DocumentStatus::Rejected,
        }
    }
}

/// Requested export artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Pdf,
    Zip,
}

impl ExportKind {
    pub const fn label(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Zip => "zip",
        }
    }

    pub fn content_type(self) -> mime::Mime {
        match self {
            ExportKind::Pdf => mime::APPLICATION_PDF,
            ExportKind::Zip => "application/zip"
                .parse()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        }
    }
}
