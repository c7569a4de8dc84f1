use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::review::{Review, ReviewStatus, Subject};

/// A store call that failed, annotated with what was being attempted and on
/// which record, so callers can decide on messaging or retry.
#[derive(Debug, Error)]
#[error("{operation} failed for `{target}`")]
pub struct StoreError {
    pub operation: &'static str,
    pub target: String,
    #[source]
    pub source: anyhow::Error,
}

impl StoreError {
    pub fn new(operation: &'static str, target: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            operation,
            target: target.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReviewInput {
    pub topic: String,
    pub subject_id: String,
    pub notes: String,
    pub initial_date: NaiveDate,
    /// Marks the initial-study occurrence completed at creation time.
    #[serde(default)]
    pub mark_first: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewPatch {
    pub topic: Option<String>,
    pub subject_id: Option<String>,
    pub notes: Option<String>,
    /// A new anchor date: the store regenerates the whole occurrence
    /// sequence from it and resets every status to pending.
    pub initial_date: Option<NaiveDate>,
    pub mark_first: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSubjectInput {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// The remote review/subject backend. Calls are failable and individually
/// atomic at best; the core never assumes atomicity across two of them.
pub trait ReviewStore: Send + Sync {
    fn list_reviews(&self) -> StoreResult<Vec<Review>>;
    fn create_review(&self, input: NewReviewInput) -> StoreResult<Review>;
    fn update_review(&self, id: &str, patch: ReviewPatch) -> StoreResult<Review>;
    fn update_status(
        &self,
        id: &str,
        date: NaiveDate,
        status: ReviewStatus,
    ) -> StoreResult<Review>;
    fn delete_review(&self, id: &str) -> StoreResult<()>;

    fn list_subjects(&self) -> StoreResult<Vec<Subject>>;
    fn create_subject(&self, input: NewSubjectInput) -> StoreResult<Subject>;
    fn update_subject(&self, id: &str, patch: SubjectPatch) -> StoreResult<Subject>;
    /// Deleting a subject also deletes every review that references it.
    fn delete_subject(&self, id: &str) -> StoreResult<()>;
}
