use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::domain::{ApplicationId, DocumentType, ReviewDecision};
use crate::config::DEFAULT_APPROVAL_REMARK;

/// A decision staged by the reviewer but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedDecision {
    pub decision: ReviewDecision,
    pub remarks: String,
}

/// Pending decisions for one application's review session.
///
/// Rejections may be staged with empty remarks; that is only caught when the batch is
/// validated, so a reviewer can reject first and explain afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionBuffer {
    application_id: ApplicationId,
    default_approval_remark: String,
    entries: BTreeMap<DocumentType, StagedDecision>,
}

impl DecisionBuffer {
    pub fn for_application(application_id: ApplicationId) -> Self {
        Self::with_default_remark(application_id, DEFAULT_APPROVAL_REMARK)
    }

    pub fn with_default_remark(
        application_id: ApplicationId,
        default_approval_remark: impl Into<String>,
    ) -> Self {
        Self {
            application_id,
            default_approval_remark: default_approval_remark.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn default_approval_remark(&self) -> &str {
        &self.default_approval_remark
    }

    /// Stage a decision, replacing any earlier one for the same document type.
    pub fn stage(
        &mut self,
        document_type: DocumentType,
        decision: ReviewDecision,
        remarks: Option<&str>,
    ) {
        let remarks = match (decision, remarks) {
            (ReviewDecision::Approve, Some(text)) if !text.trim().is_empty() => text.to_string(),
            (ReviewDecision::Approve, _) => self.default_approval_remark.clone(),
            (ReviewDecision::Reject, text) => text.unwrap_or_default().to_string(),
        };

        debug!(
            application_id = %self.application_id,
            %document_type,
            ?decision,
            "staged review decision"
        );
        self.entries
            .insert(document_type, StagedDecision { decision, remarks });
    }

    /// Stage the same decision for several documents at once.
    pub fn stage_all<I>(&mut self, decision: ReviewDecision, document_types: I)
    where
        I: IntoIterator<Item = DocumentType>,
    {
        for document_type in document_types {
            self.stage(document_type, decision, None);
        }
    }

    pub fn unstage(&mut self, document_type: &DocumentType) -> Option<StagedDecision> {
        self.entries.remove(document_type)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, document_type: &DocumentType) -> Option<&StagedDecision> {
        self.entries.get(document_type)
    }

    pub fn entries(&self) -> &BTreeMap<DocumentType, StagedDecision> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
