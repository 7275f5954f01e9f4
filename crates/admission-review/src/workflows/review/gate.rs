//! Export eligibility and document selection for combined PDF / ZIP artifacts.

use std::collections::BTreeSet;

use serde::Serialize;

use super::classification::{classify, ReviewClass};
use super::commit::ValidationError;
use super::domain::{Application, ApplicationId, Document, DocumentId, DocumentStatus, ExportKind};

/// Reasons an export cannot be requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("application {application_id} is not fully approved (currently {class})")]
    Ineligible {
        application_id: ApplicationId,
        class: ReviewClass,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("document {document_id} is {} and cannot be exported", .status.label())]
    NotSelectable {
        document_id: DocumentId,
        status: DocumentStatus,
    },
    #[error("document {0} does not belong to this application")]
    UnknownDocument(DocumentId),
}

/// Exports are only available once every document is approved.
pub fn is_export_eligible(application: &Application) -> bool {
    classify(&application.documents) == ReviewClass::AllApproved
}

/// Documents that may take part in an export.
pub fn selectable_documents(application: &Application) -> Vec<&Document> {
    application
        .documents
        .iter()
        .filter(|document| document.status == DocumentStatus::Approved)
        .collect()
}

/// Reviewer's choice of documents for an export, restricted to approved ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSelection {
    selectable: BTreeSet<DocumentId>,
    selected: BTreeSet<DocumentId>,
}

impl ExportSelection {
    /// Start with every approved document selected.
    pub fn open(application: &Application) -> Self {
        let selectable: BTreeSet<DocumentId> = selectable_documents(application)
            .into_iter()
            .map(|document| document.id.clone())
            .collect();
        Self {
            selected: selectable.clone(),
            selectable,
        }
    }

    pub fn select(
        &mut self,
        application: &Application,
        id: &DocumentId,
    ) -> Result<(), ExportError> {
        let document = application
            .document_by_id(id)
            .ok_or_else(|| ExportError::UnknownDocument(id.clone()))?;
        if !self.selectable.contains(id) || document.status != DocumentStatus::Approved {
            return Err(ExportError::NotSelectable {
                document_id: id.clone(),
                status: document.status,
            });
        }
        self.selected.insert(id.clone());
        Ok(())
    }

    pub fn deselect(&mut self, id: &DocumentId) -> bool {
        self.selected.remove(id)
    }

    pub fn select_all(&mut self) {
        self.selected = self.selectable.clone();
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &DocumentId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> Vec<DocumentId> {
        self.selected.iter().cloned().collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.selected.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(())
    }
}

/// A gated export ready to hand to the file service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    pub application_id: ApplicationId,
    pub kind: ExportKind,
    pub document_ids: Vec<DocumentId>,
}

/// Result of an accepted export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportHandle {
    pub application_id: ApplicationId,
    pub kind: ExportKind,
    pub content_type: String,
    pub document_ids: Vec<DocumentId>,
    pub url: String,
}

/// Check eligibility and the selection against the application's current documents.
pub fn prepare_export(
    application: &Application,
    kind: ExportKind,
    document_ids: &[DocumentId],
) -> Result<ExportRequest, ExportError> {
    let class = classify(&application.documents);
    if class != ReviewClass::AllApproved {
        return Err(ExportError::Ineligible {
            application_id: application.application_id.clone(),
            class,
        });
    }

    if document_ids.is_empty() {
        return Err(ValidationError::EmptySelection.into());
    }

    let mut unique = BTreeSet::new();
    for id in document_ids {
        let document = application
            .document_by_id(id)
            .ok_or_else(|| ExportError::UnknownDocument(id.clone()))?;
        if document.status != DocumentStatus::Approved {
            return Err(ExportError::NotSelectable {
                document_id: id.clone(),
                status: document.status,
            });
        }
        unique.insert(id.clone());
    }

    Ok(ExportRequest {
        application_id: application.application_id.clone(),
        kind,
        document_ids: unique.into_iter().collect(),
    })
}
