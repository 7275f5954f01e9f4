//! Document review and bulk verification for admission applications.
//!
//! Reviewers stage per-document decisions in a [`ReviewSession`], commit them as one
//! batch through [`DocumentReviewService`], and may export combined artifacts once every
//! document of an application is approved.

pub mod buffer;
pub mod classification;
pub mod commit;
pub mod domain;
pub mod gate;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod wire;

#[cfg(test)]
mod tests;

pub use buffer::{DecisionBuffer, StagedDecision};
pub use classification::{
    aggregate, classify, classify_optional, filter_queue, reconcile, CountsSource, QueueCounts,
    ReconciledCounts, ReviewClass, ReviewTally,
};
pub use commit::{
    validate, CommitSummary, PresetConfirmation, ReviewConfirmation, ValidatedBatch,
    ValidationError,
};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Document, DocumentId, DocumentStatus,
    DocumentType, ExportKind, FileRef, ReviewDecision,
};
pub use gate::{
    is_export_eligible, prepare_export, selectable_documents, ExportError, ExportHandle,
    ExportRequest, ExportSelection,
};
pub use router::review_router;
pub use service::{CommitOutcome, CommitReceipt, DocumentReviewService, ReviewServiceError};
pub use session::{ReviewSession, SessionError};
pub use store::{ArtifactLocation, DocumentStore, ExportService, ReviewDecisionPayload, StoreError};
pub use wire::{WireApplication, WireDocuments, WireError};
