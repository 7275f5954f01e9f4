//! Review classification of applications and the per-tab counts derived from it.
//!
//! Every document set falls into exactly one [`ReviewClass`]; the work-queue tabs of the
//! console are the five classes and their counts come from [`aggregate`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Application, Document, DocumentStatus};
use super::store::StoreError;

/// Aggregate review progress of an application's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewClass {
    NoDocuments,
    NotReviewed,
    PartiallyReviewed,
    AllApproved,
    HasRejected,
}

impl ReviewClass {
    /// Tab order used by the console.
    pub const ALL: [ReviewClass; 5] = [
        ReviewClass::NoDocuments,
        ReviewClass::NotReviewed,
        ReviewClass::PartiallyReviewed,
        ReviewClass::AllApproved,
        ReviewClass::HasRejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ReviewClass::NoDocuments => "no_documents",
            ReviewClass::NotReviewed => "not_reviewed",
            ReviewClass::PartiallyReviewed => "partially_reviewed",
            ReviewClass::AllApproved => "all_approved",
            ReviewClass::HasRejected => "has_rejected",
        }
    }
}

impl fmt::Display for ReviewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown review class '{0}'")]
pub struct UnknownReviewClass(pub String);

impl FromStr for ReviewClass {
    type Err = UnknownReviewClass;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        ReviewClass::ALL
            .into_iter()
            .find(|class| class.label() == normalized)
            .ok_or_else(|| UnknownReviewClass(value.to_string()))
    }
}

/// Document counts backing a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewTally {
    pub total: usize,
    pub reviewed: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ReviewTally {
    pub fn from_documents(documents: &[Document]) -> Self {
        documents
            .iter()
            .fold(Self::default(), |mut tally, document| {
                tally.total += 1;
                match document.status {
                    DocumentStatus::Pending => {}
                    DocumentStatus::Approved => {
                        tally.reviewed += 1;
                        tally.approved += 1;
                    }
                    DocumentStatus::Rejected => {
                        tally.reviewed += 1;
                        tally.rejected += 1;
                    }
                }
                tally
            })
    }

    pub fn pending(&self) -> usize {
        self.total - self.reviewed
    }

    pub fn class(&self) -> ReviewClass {
        if self.total == 0 {
            ReviewClass::NoDocuments
        } else if self.reviewed == 0 {
            ReviewClass::NotReviewed
        } else if self.reviewed < self.total {
            ReviewClass::PartiallyReviewed
        } else if self.rejected == 0 {
            ReviewClass::AllApproved
        } else {
            ReviewClass::HasRejected
        }
    }
}

/// Classify a document set. Total over every input, including the empty set.
pub fn classify(documents: &[Document]) -> ReviewClass {
    ReviewTally::from_documents(documents).class()
}

/// Classify a possibly missing document list; absence counts as no documents.
pub fn classify_optional(documents: Option<&[Document]>) -> ReviewClass {
    documents.map(classify).unwrap_or(ReviewClass::NoDocuments)
}

/// Number of applications per review class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub no_documents: usize,
    pub not_reviewed: usize,
    pub partially_reviewed: usize,
    pub all_approved: usize,
    pub has_rejected: usize,
}

impl QueueCounts {
    pub fn get(&self, class: ReviewClass) -> usize {
        match class {
            ReviewClass::NoDocuments => self.no_documents,
            ReviewClass::NotReviewed => self.not_reviewed,
            ReviewClass::PartiallyReviewed => self.partially_reviewed,
            ReviewClass::AllApproved => self.all_approved,
            ReviewClass::HasRejected => self.has_rejected,
        }
    }

    pub fn increment(&mut self, class: ReviewClass) {
        let slot = match class {
            ReviewClass::NoDocuments => &mut self.no_documents,
            ReviewClass::NotReviewed => &mut self.not_reviewed,
            ReviewClass::PartiallyReviewed => &mut self.partially_reviewed,
            ReviewClass::AllApproved => &mut self.all_approved,
            ReviewClass::HasRejected => &mut self.has_rejected,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        ReviewClass::ALL.into_iter().map(|class| self.get(class)).sum()
    }

    /// Counts in tab order.
    pub fn entries(&self) -> [(ReviewClass, usize); 5] {
        ReviewClass::ALL.map(|class| (class, self.get(class)))
    }
}

/// Count applications per class.
pub fn aggregate(applications: &[Application]) -> QueueCounts {
    applications
        .iter()
        .fold(QueueCounts::default(), |mut counts, application| {
            counts.increment(classify(&application.documents));
            counts
        })
}

/// Applications currently sitting in the given tab, in input order.
pub fn filter_queue(applications: &[Application], class: ReviewClass) -> Vec<&Application> {
    applications
        .iter()
        .filter(|application| classify(&application.documents) == class)
        .collect()
}

/// Where reconciled counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountsSource {
    Store,
    Local,
}

/// Tab counts after cross-checking the store's statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledCounts {
    pub counts: QueueCounts,
    pub source: CountsSource,
    /// Store figures that disagreed with the local computation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<QueueCounts>,
}

/// Accept store statistics only when they match the locally computed counts.
pub fn reconcile(local: QueueCounts, remote: Result<QueueCounts, StoreError>) -> ReconciledCounts {
    match remote {
        Ok(remote) if remote == local => ReconciledCounts {
            counts: remote,
            source: CountsSource::Store,
            discrepancy: None,
        },
        Ok(remote) => {
            warn!(?local, ?remote, "review stats disagree with local classification");
            ReconciledCounts {
                counts: local,
                source: CountsSource::Local,
                discrepancy: Some(remote),
            }
        }
        Err(error) => {
            warn!(%error, "review stats unavailable; using local classification");
            ReconciledCounts {
                counts: local,
                source: CountsSource::Local,
                discrepancy: None,
            }
        }
    }
}
