use super::buffer::{DecisionBuffer, StagedDecision};
use super::classification::{classify, ReviewClass};
use super::domain::{Application, ApplicationId, DocumentType, ReviewDecision};
use super::gate::ExportSelection;
use crate::config::DEFAULT_APPROVAL_REMARK;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("document type '{document_type}' is not part of application {application_id}")]
    UnknownDocument {
        application_id: ApplicationId,
        document_type: DocumentType,
    },
    #[error("refreshed application {found} does not match the open session for {expected}")]
    ApplicationMismatch {
        expected: ApplicationId,
        found: ApplicationId,
    },
}

/// One reviewer's working state for a single application.
///
/// Staged decisions and the export selection never outlive the application they were
/// made for: switching applications or cancelling drops both.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    application: Application,
    buffer: DecisionBuffer,
    selection: Option<ExportSelection>,
}

impl ReviewSession {
    pub fn open(application: Application) -> Self {
        Self::with_default_remark(application, DEFAULT_APPROVAL_REMARK)
    }

    pub fn with_default_remark(
        application: Application,
        default_remark: impl Into<String>,
    ) -> Self {
        let buffer =
            DecisionBuffer::with_default_remark(application.application_id.clone(), default_remark);
        Self {
            application,
            buffer,
            selection: None,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application.application_id
    }

    pub fn buffer(&self) -> &DecisionBuffer {
        &self.buffer
    }

    pub fn review_class(&self) -> ReviewClass {
        classify(&self.application.documents)
    }

    pub fn stage(
        &mut self,
        document_type: DocumentType,
        decision: ReviewDecision,
        remarks: Option<&str>,
    ) -> Result<(), SessionError> {
        if self.application.document(&document_type).is_none() {
            return Err(SessionError::UnknownDocument {
                application_id: self.application.application_id.clone(),
                document_type,
            });
        }
        self.buffer.stage(document_type, decision, remarks);
        Ok(())
    }

    /// Approve every document that is still pending and not already staged.
    pub fn approve_remaining(&mut self) -> usize {
        let remaining: Vec<DocumentType> = self
            .application
            .documents
            .iter()
            .filter(|document| !document.status.is_reviewed())
            .filter(|document| self.buffer.get(&document.document_type).is_none())
            .map(|document| document.document_type.clone())
            .collect();
        let staged = remaining.len();
        self.buffer.stage_all(ReviewDecision::Approve, remaining);
        staged
    }

    pub fn unstage(&mut self, document_type: &DocumentType) -> Option<StagedDecision> {
        self.buffer.unstage(document_type)
    }

    /// Abandon staged decisions; nothing has been persisted.
    pub fn cancel(&mut self) {
        self.buffer.clear();
        self.selection = None;
    }

    /// Move to another application, discarding everything staged for the current one.
    pub fn switch_to(&mut self, application: Application) {
        let default_remark = self.buffer.default_approval_remark().to_string();
        self.buffer =
            DecisionBuffer::with_default_remark(application.application_id.clone(), default_remark);
        self.application = application;
        self.selection = None;
    }

    /// Install authoritative state fetched from the store after a commit.
    pub fn refresh(&mut self, application: Application) -> Result<(), SessionError> {
        if application.application_id != self.application.application_id {
            return Err(SessionError::ApplicationMismatch {
                expected: self.application.application_id.clone(),
                found: application.application_id,
            });
        }
        self.application = application;
        self.selection = None;
        Ok(())
    }

    pub(crate) fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Begin an export with every approved document selected.
    pub fn open_export(&mut self) -> &mut ExportSelection {
        let selection = ExportSelection::open(&self.application);
        self.selection.insert(selection)
    }

    pub fn selection(&self) -> Option<&ExportSelection> {
        self.selection.as_ref()
    }

    /// Selection together with the application it is checked against.
    pub fn selection_mut(&mut self) -> Option<(&Application, &mut ExportSelection)> {
        let application = &self.application;
        self.selection
            .as_mut()
            .map(|selection| (application, selection))
    }
}
