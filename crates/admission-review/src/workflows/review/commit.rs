use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::buffer::DecisionBuffer;
use super::domain::{ApplicationId, DocumentType, ReviewDecision};
use super::store::{DocumentStore, ReviewDecisionPayload, StoreError};
use crate::config::RetryPolicy;

/// Reviewer-correctable problems that block a commit or export.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("provide remarks for all rejected documents: {}", join(.document_types))]
    MissingRemarks { document_types: Vec<DocumentType> },
    #[error("select at least one document decision before submitting")]
    EmptyBatch,
    #[error("select at least one approved document to export")]
    EmptySelection,
}

fn join(document_types: &[DocumentType]) -> String {
    document_types
        .iter()
        .map(DocumentType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Approval and rejection counts shown to the reviewer before sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub approvals: usize,
    pub rejections: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.approvals + self.rejections
    }
}

impl fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn documents(count: usize) -> &'static str {
            if count == 1 {
                "document"
            } else {
                "documents"
            }
        }

        match (self.approvals, self.rejections) {
            (approvals, 0) => write!(f, "Approve {approvals} {}?", documents(approvals)),
            (0, rejections) => write!(f, "Reject {rejections} {}?", documents(rejections)),
            (approvals, rejections) => write!(
                f,
                "Approve {approvals} {} and reject {rejections} {}?",
                documents(approvals),
                documents(rejections)
            ),
        }
    }
}

/// A buffer snapshot that passed validation, ready to be confirmed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    application_id: ApplicationId,
    decisions: Vec<ReviewDecisionPayload>,
    summary: CommitSummary,
}

impl ValidatedBatch {
    pub fn application_id(&self) -> &ApplicationId {
        &self.application_id
    }

    pub fn decisions(&self) -> &[ReviewDecisionPayload] {
        &self.decisions
    }

    pub fn summary(&self) -> CommitSummary {
        self.summary
    }
}

/// Check a buffer and snapshot it into the payload sent to the store.
pub fn validate(buffer: &DecisionBuffer) -> Result<ValidatedBatch, ValidationError> {
    if buffer.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let missing: Vec<DocumentType> = buffer
        .entries()
        .iter()
        .filter(|(_, staged)| {
            staged.decision == ReviewDecision::Reject && staged.remarks.trim().is_empty()
        })
        .map(|(document_type, _)| document_type.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingRemarks {
            document_types: missing,
        });
    }

    let mut summary = CommitSummary {
        approvals: 0,
        rejections: 0,
    };
    let decisions = buffer
        .entries()
        .iter()
        .map(|(document_type, staged)| {
            let remarks = match staged.decision {
                ReviewDecision::Approve => {
                    summary.approvals += 1;
                    if staged.remarks.trim().is_empty() {
                        buffer.default_approval_remark().to_string()
                    } else {
                        staged.remarks.trim().to_string()
                    }
                }
                ReviewDecision::Reject => {
                    summary.rejections += 1;
                    staged.remarks.trim().to_string()
                }
            };
            ReviewDecisionPayload {
                document_type: document_type.clone(),
                status: staged.decision.resulting_status(),
                remarks,
            }
        })
        .collect();

    Ok(ValidatedBatch {
        application_id: buffer.application_id().clone(),
        decisions,
        summary,
    })
}

/// Explicit reviewer sign-off on a batch before it is sent.
pub trait ReviewConfirmation {
    fn confirm(&self, summary: &CommitSummary) -> bool;
}

impl<F> ReviewConfirmation for F
where
    F: Fn(&CommitSummary) -> bool,
{
    fn confirm(&self, summary: &CommitSummary) -> bool {
        self(summary)
    }
}

/// Confirmation answered up front, e.g. by a `confirm` flag in an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetConfirmation(pub bool);

impl ReviewConfirmation for PresetConfirmation {
    fn confirm(&self, _summary: &CommitSummary) -> bool {
        self.0
    }
}

/// Send a batch, retrying transient store failures with bounded backoff.
pub(crate) async fn submit_with_retry<S>(
    store: &S,
    batch: &ValidatedBatch,
    policy: &RetryPolicy,
) -> Result<(), StoreError>
where
    S: DocumentStore + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match store
            .submit_review(batch.application_id(), batch.decisions())
            .await
        {
            Ok(()) => return Ok(()),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff_after(attempt);
                warn!(
                    application_id = %batch.application_id(),
                    attempt,
                    max_attempts,
                    ?delay,
                    %error,
                    "review submission failed; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
