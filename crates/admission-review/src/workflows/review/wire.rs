//! Adapters from the store's JSON payloads to the internal document model.
//!
//! Backends report an application's documents either as an array of document objects or
//! as an object keyed by document type. Both normalize into `Vec<Document>`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Document, DocumentId, DocumentStatus,
    DocumentType, FileRef,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("unknown document status '{0}'")]
    UnknownStatus(String),
    #[error("unknown application status '{0}'")]
    UnknownApplicationStatus(String),
    #[error("document type '{0}' appears more than once")]
    DuplicateDocumentType(String),
    #[error("document entry has an empty document type")]
    EmptyDocumentType,
}

/// Fields shared by both document shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct WireDocumentFields {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default, alias = "fileName", alias = "file_name")]
    pub name: Option<String>,
    #[serde(default, alias = "size", alias = "sizeBytes")]
    pub size_bytes: u64,
    #[serde(default, alias = "mimeType", alias = "mimetype")]
    pub mime_type: Option<String>,
    #[serde(default, alias = "url", alias = "fileUrl")]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(alias = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, alias = "reviewedAt")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Array-shaped document entry carrying its own type label.
#[derive(Debug, Clone, Deserialize)]
pub struct WireDocument {
    #[serde(alias = "documentType", alias = "type")]
    pub document_type: String,
    #[serde(flatten)]
    pub fields: WireDocumentFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireDocuments {
    List(Vec<WireDocument>),
    Keyed(BTreeMap<String, WireDocumentFields>),
}

impl WireDocuments {
    pub fn normalize(self) -> Result<Vec<Document>, WireError> {
        let entries: Vec<(String, WireDocumentFields)> = match self {
            WireDocuments::List(items) => items
                .into_iter()
                .map(|item| (item.document_type, item.fields))
                .collect(),
            WireDocuments::Keyed(map) => map.into_iter().collect(),
        };

        let mut seen = BTreeSet::new();
        entries
            .into_iter()
            .map(|(document_type, fields)| {
                let document_type = document_type.trim().to_string();
                if document_type.is_empty() {
                    return Err(WireError::EmptyDocumentType);
                }
                if !seen.insert(document_type.clone()) {
                    return Err(WireError::DuplicateDocumentType(document_type));
                }
                normalize_document(document_type, fields)
            })
            .collect()
    }
}

fn normalize_document(
    document_type: String,
    fields: WireDocumentFields,
) -> Result<Document, WireError> {
    let status = parse_document_status(fields.status.as_deref())?;
    let remarks = fields
        .remarks
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    let reviewed_at = if status.is_reviewed() {
        fields.reviewed_at
    } else {
        None
    };

    Ok(Document {
        id: DocumentId(fields.id.unwrap_or_else(|| document_type.clone())),
        file: FileRef {
            name: fields.name.unwrap_or_else(|| document_type.clone()),
            size_bytes: fields.size_bytes,
            mime_type: fields.mime_type.as_deref().and_then(normalize_mime),
            location: fields.location.unwrap_or_default(),
        },
        document_type: DocumentType(document_type),
        status,
        remarks,
        uploaded_at: fields.uploaded_at,
        reviewed_at,
    })
}

/// Media type without parameters; malformed values are dropped.
fn normalize_mime(raw: &str) -> Option<String> {
    let parsed: mime::Mime = raw.trim().parse().ok()?;
    Some(parsed.essence_str().to_ascii_lowercase())
}

/// Lenient status parsing; a missing or blank status means the document is unreviewed.
pub fn parse_document_status(raw: Option<&str>) -> Result<DocumentStatus, WireError> {
    let Some(raw) = raw else {
        return Ok(DocumentStatus::Pending);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "pending" => Ok(DocumentStatus::Pending),
        "approved" | "verified" => Ok(DocumentStatus::Approved),
        "rejected" => Ok(DocumentStatus::Rejected),
        _ => Err(WireError::UnknownStatus(raw.to_string())),
    }
}

fn parse_application_status(raw: Option<&str>) -> Result<ApplicationStatus, WireError> {
    let Some(raw) = raw else {
        return Ok(ApplicationStatus::Submitted);
    };
    let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "" | "submitted" => Ok(ApplicationStatus::Submitted),
        "under_review" => Ok(ApplicationStatus::UnderReview),
        "verified" => Ok(ApplicationStatus::Verified),
        "rejected" => Ok(ApplicationStatus::Rejected),
        "enrolled" => Ok(ApplicationStatus::Enrolled),
        _ => Err(WireError::UnknownApplicationStatus(raw.to_string())),
    }
}

/// Application payload as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct WireApplication {
    #[serde(alias = "applicationId", alias = "_id")]
    pub application_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub documents: Option<WireDocuments>,
}

impl WireApplication {
    pub fn into_application(self) -> Result<Application, WireError> {
        let documents = match self.documents {
            Some(documents) => documents.normalize()?,
            None => Vec::new(),
        };
        Ok(Application {
            application_id: ApplicationId(self.application_id),
            status: parse_application_status(self.status.as_deref())?,
            documents,
        })
    }
}
