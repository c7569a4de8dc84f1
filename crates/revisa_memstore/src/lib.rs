//! In-memory stand-ins for the platform collaborators: the remote
//! review/subject backend, the notification service, and the preference
//! key-value store. Used by integration tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::NaiveDate;
use parking_lot::RwLock;

use revisa_core::notifications::{
    NotificationContent, NotificationSink, NotificationTime, PermissionStatus, PreferenceStore,
};
use revisa_core::review::{Review, ReviewDate, ReviewStatus, Subject};
use revisa_core::store::{
    NewReviewInput, NewSubjectInput, ReviewPatch, ReviewStore, StoreError, StoreResult,
    SubjectPatch,
};

#[derive(Default)]
struct Records {
    reviews: Vec<Review>,
    subjects: Vec<Subject>,
}

/// A `ReviewStore` over plain vectors with sequential ids. Subject deletion
/// cascades to the reviews owned by the subject, the way the remote backend
/// does.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let serial = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, serial)
    }
}

fn valid_color(color: &str) -> bool {
    let digits = color.strip_prefix('#').unwrap_or(color);
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

impl ReviewStore for MemoryStore {
    fn list_reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(self.records.read().reviews.clone())
    }

    fn create_review(&self, input: NewReviewInput) -> StoreResult<Review> {
        let mut records = self.records.write();
        let subject = records
            .subjects
            .iter()
            .find(|subject| subject.id == input.subject_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::new("create review", &input.subject_id, anyhow!("unknown subject"))
            })?;
        let mut review_dates = ReviewDate::schedule(input.initial_date);
        if input.mark_first {
            review_dates[0].status = ReviewStatus::Completed;
        }
        let review = Review {
            id: self.next_id("review"),
            topic: input.topic,
            subject,
            notes: input.notes,
            review_dates,
        };
        records.reviews.push(review.clone());
        Ok(review)
    }

    fn update_review(&self, id: &str, patch: ReviewPatch) -> StoreResult<Review> {
        let mut records = self.records.write();
        let new_subject = match &patch.subject_id {
            Some(subject_id) => Some(
                records
                    .subjects
                    .iter()
                    .find(|subject| subject.id == *subject_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::new("update review", subject_id, anyhow!("unknown subject"))
                    })?,
            ),
            None => None,
        };
        let review = records
            .reviews
            .iter_mut()
            .find(|review| review.id == id)
            .ok_or_else(|| StoreError::new("update review", id, anyhow!("no such review")))?;
        if let Some(topic) = patch.topic {
            review.topic = topic;
        }
        if let Some(subject) = new_subject {
            review.subject = subject;
        }
        if let Some(notes) = patch.notes {
            review.notes = notes;
        }
        if let Some(initial) = patch.initial_date {
            let rescheduled = review.reschedule(initial);
            *review = rescheduled;
            if patch.mark_first == Some(true) {
                review.review_dates[0].status = ReviewStatus::Completed;
            }
        }
        Ok(review.clone())
    }

    fn update_status(
        &self,
        id: &str,
        date: NaiveDate,
        status: ReviewStatus,
    ) -> StoreResult<Review> {
        let mut records = self.records.write();
        let review = records
            .reviews
            .iter_mut()
            .find(|review| review.id == id)
            .ok_or_else(|| StoreError::new("update status", id, anyhow!("no such review")))?;
        let updated = review
            .set_status(date, status)
            .map_err(|error| StoreError::new("update status", id, anyhow!(error)))?;
        *review = updated.clone();
        Ok(updated)
    }

    fn delete_review(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let before = records.reviews.len();
        records.reviews.retain(|review| review.id != id);
        if records.reviews.len() == before {
            return Err(StoreError::new("delete review", id, anyhow!("no such review")));
        }
        Ok(())
    }

    fn list_subjects(&self) -> StoreResult<Vec<Subject>> {
        Ok(self.records.read().subjects.clone())
    }

    fn create_subject(&self, input: NewSubjectInput) -> StoreResult<Subject> {
        let mut records = self.records.write();
        if input.name.trim().is_empty() {
            return Err(StoreError::new(
                "create subject",
                &input.name,
                anyhow!("subject name must not be empty"),
            ));
        }
        if !valid_color(&input.color) {
            return Err(StoreError::new(
                "create subject",
                &input.name,
                anyhow!("`{}` is not a 6-hex-digit color", input.color),
            ));
        }
        if records.subjects.iter().any(|subject| subject.name == input.name) {
            return Err(StoreError::new(
                "create subject",
                &input.name,
                anyhow!("subject name already in use"),
            ));
        }
        if records.subjects.iter().any(|subject| subject.color == input.color) {
            return Err(StoreError::new(
                "create subject",
                &input.name,
                anyhow!("subject color already in use"),
            ));
        }
        let subject = Subject {
            id: self.next_id("subject"),
            name: input.name,
            color: input.color,
        };
        records.subjects.push(subject.clone());
        Ok(subject)
    }

    fn update_subject(&self, id: &str, patch: SubjectPatch) -> StoreResult<Subject> {
        let mut records = self.records.write();
        let index = records
            .subjects
            .iter()
            .position(|subject| subject.id == id)
            .ok_or_else(|| StoreError::new("update subject", id, anyhow!("no such subject")))?;
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(StoreError::new(
                    "update subject",
                    id,
                    anyhow!("subject name must not be empty"),
                ));
            }
            if records
                .subjects
                .iter()
                .any(|subject| subject.id != id && subject.name == *name)
            {
                return Err(StoreError::new(
                    "update subject",
                    id,
                    anyhow!("subject name already in use"),
                ));
            }
        }
        if let Some(color) = &patch.color {
            if !valid_color(color) {
                return Err(StoreError::new(
                    "update subject",
                    id,
                    anyhow!("`{}` is not a 6-hex-digit color", color),
                ));
            }
            if records
                .subjects
                .iter()
                .any(|subject| subject.id != id && subject.color == *color)
            {
                return Err(StoreError::new(
                    "update subject",
                    id,
                    anyhow!("subject color already in use"),
                ));
            }
        }
        let subject = &mut records.subjects[index];
        if let Some(name) = patch.name {
            subject.name = name;
        }
        if let Some(color) = patch.color {
            subject.color = color;
        }
        let updated = subject.clone();
        // reviews embed a copy of their subject
        for review in records
            .reviews
            .iter_mut()
            .filter(|review| review.subject.id == id)
        {
            review.subject = updated.clone();
        }
        Ok(updated)
    }

    fn delete_subject(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write();
        let before = records.subjects.len();
        records.subjects.retain(|subject| subject.id != id);
        if records.subjects.len() == before {
            return Err(StoreError::new("delete subject", id, anyhow!("no such subject")));
        }
        records.reviews.retain(|review| review.subject.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub identifier: String,
    pub trigger: NotificationTime,
    pub title: String,
}

struct SinkState {
    permission: PermissionStatus,
    scheduled: Vec<ScheduledReminder>,
    cancelled: Vec<String>,
}

/// A `NotificationSink` that records what was asked of it. Clones share
/// state, so a test can keep a handle while the service owns the sink.
#[derive(Clone)]
pub struct RecordingSink {
    state: Arc<RwLock<SinkState>>,
}

impl RecordingSink {
    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            state: Arc::new(RwLock::new(SinkState {
                permission,
                scheduled: Vec::new(),
                cancelled: Vec::new(),
            })),
        }
    }

    pub fn granted() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::with_permission(PermissionStatus::Denied)
    }

    pub fn set_permission(&self, permission: PermissionStatus) {
        self.state.write().permission = permission;
    }

    pub fn scheduled(&self) -> Vec<ScheduledReminder> {
        self.state.read().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.read().cancelled.clone()
    }
}

impl NotificationSink for RecordingSink {
    fn schedule_daily(
        &self,
        trigger: NotificationTime,
        content: &NotificationContent,
        identifier: &str,
    ) -> anyhow::Result<()> {
        let mut state = self.state.write();
        // same identifier replaces the existing trigger
        state
            .scheduled
            .retain(|reminder| reminder.identifier != identifier);
        state.scheduled.push(ScheduledReminder {
            identifier: identifier.to_string(),
            trigger,
            title: content.title.clone(),
        });
        Ok(())
    }

    fn cancel(&self, identifier: &str) -> anyhow::Result<()> {
        let mut state = self.state.write();
        state
            .scheduled
            .retain(|reminder| reminder.identifier != identifier);
        state.cancelled.push(identifier.to_string());
        Ok(())
    }

    fn cancel_all(&self) -> anyhow::Result<()> {
        let mut state = self.state.write();
        state.scheduled.clear();
        Ok(())
    }

    fn permission(&self) -> PermissionStatus {
        self.state.read().permission
    }

    fn request_permission(&self) -> PermissionStatus {
        self.state.read().permission
    }
}

/// A `PreferenceStore` over a shared map. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
