use anyhow::{anyhow, ensure, Context, Result};
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::{
    agenda, dates,
    notifications::{
        self, daily_reminder_content, NotificationSink, NotificationTime, PermissionStatus,
        PreferenceStore, ReminderAction, DAILY_REMINDER_ID,
    },
    review::{Review, ReviewStatus, ScheduleError, Subject},
    store::{NewReviewInput, NewSubjectInput, ReviewPatch, ReviewStore, SubjectPatch},
};

/// Owns the in-memory snapshot of reviews and subjects and mediates every
/// mutation through the store collaborator.
///
/// All operations are synchronous. Two callers mutating the same occurrence
/// resolve last-write-wins at the store; the service does not merge
/// concurrent edits.
pub struct ReviewService {
    store: Box<dyn ReviewStore>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    preferences: Option<Box<dyn PreferenceStore>>,
    reviews: RwLock<Vec<Review>>,
    subjects: RwLock<Vec<Subject>>,
}

pub struct ReviewServiceBuilder {
    store: Option<Box<dyn ReviewStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    preferences: Option<Box<dyn PreferenceStore>>,
}

impl ReviewServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            notification_sink: None,
            preferences: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn ReviewStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn with_preferences(mut self, preferences: Box<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn build(self) -> Result<ReviewService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("a review store is required"))?;
        let service = ReviewService {
            store,
            notification_sink: self.notification_sink,
            preferences: self.preferences,
            reviews: RwLock::new(Vec::new()),
            subjects: RwLock::new(Vec::new()),
        };
        service.refresh()?;
        Ok(service)
    }
}

impl Default for ReviewServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewService {
    pub fn builder() -> ReviewServiceBuilder {
        ReviewServiceBuilder::new()
    }

    /// Pulls fresh review and subject lists from the store and re-publishes
    /// the in-memory snapshots.
    pub fn refresh(&self) -> Result<()> {
        let reviews = self.store.list_reviews().context("refreshing reviews")?;
        let subjects = self.store.list_subjects().context("refreshing subjects")?;
        tracing::debug!(
            reviews = reviews.len(),
            subjects = subjects.len(),
            "snapshot refreshed"
        );
        *self.reviews.write() = reviews;
        *self.subjects.write() = subjects;
        Ok(())
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.read().clone()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.subjects.read().clone()
    }

    /// Reviews with an occurrence on the current local day, any status.
    pub fn due_today(&self) -> Vec<Review> {
        agenda::due_on(&self.reviews.read(), dates::today_local())
    }

    /// Ids of the reviews already completed today.
    pub fn completed_today(&self) -> Vec<String> {
        agenda::completed_ids_on(&self.reviews.read(), dates::today_local())
    }

    pub fn add_review(&self, input: NewReviewInput) -> Result<Review> {
        let created = self.store.create_review(input)?;
        self.refresh()?;
        Ok(created)
    }

    pub fn update_review(&self, id: &str, patch: ReviewPatch) -> Result<Review> {
        let updated = self.store.update_review(id, patch)?;
        self.refresh()?;
        Ok(updated)
    }

    pub fn delete_review(&self, id: &str) -> Result<()> {
        self.store.delete_review(id)?;
        self.reviews.write().retain(|review| review.id != id);
        Ok(())
    }

    /// Cycles today's occurrence of the given review and persists the
    /// change. Fails when the review has no occurrence today; other dates
    /// are read-only (see [`crate::review::can_toggle`]).
    pub fn toggle_review(&self, id: &str) -> Result<Review> {
        let today = dates::today_local();
        let current = self.find_review(id)?;
        let status = current
            .occurrence_on(today)
            .ok_or(ScheduleError::UnknownOccurrence { date: today })?
            .status
            .toggled();
        self.persist_status(id, today, status)
    }

    /// Replaces the status of one occurrence. This is the path that can
    /// mark an occurrence skipped.
    pub fn set_review_status(
        &self,
        id: &str,
        date: NaiveDate,
        status: ReviewStatus,
    ) -> Result<Review> {
        let current = self.find_review(id)?;
        // validate locally for a precise error before going to the store
        current.set_status(date, status)?;
        self.persist_status(id, date, status)
    }

    /// Re-anchors the review's whole schedule at `new_initial`, given as a
    /// `YYYY-MM-DD` string. Every occurrence resets to pending: completion
    /// and skip history under the old anchor is discarded.
    pub fn reschedule_review(&self, id: &str, new_initial: &str) -> Result<Review> {
        let parsed = dates::parse_date(new_initial).ok_or_else(|| ScheduleError::InvalidDate {
            input: new_initial.to_string(),
        })?;
        let patch = ReviewPatch {
            initial_date: Some(parsed),
            ..ReviewPatch::default()
        };
        let updated = self.store.update_review(id, patch)?;
        self.refresh()?;
        Ok(updated)
    }

    pub fn add_subject(&self, input: NewSubjectInput) -> Result<Subject> {
        let created = self.store.create_subject(input)?;
        self.subjects.write().push(created.clone());
        Ok(created)
    }

    /// Updates a subject. Reviews embed a copy of their subject, so the
    /// review snapshot is refreshed as well.
    pub fn update_subject(&self, id: &str, patch: SubjectPatch) -> Result<Subject> {
        let updated = self.store.update_subject(id, patch)?;
        self.refresh()?;
        Ok(updated)
    }

    /// Removes a subject. The store cascades the deletion to every review
    /// owned by it, so the review snapshot is refreshed afterwards.
    pub fn remove_subject(&self, id: &str) -> Result<()> {
        self.store.delete_subject(id)?;
        self.refresh()?;
        Ok(())
    }

    /// The user's preferred reminder time, 08:00 when none is stored.
    pub fn notification_time(&self) -> NotificationTime {
        match &self.preferences {
            Some(store) => notifications::load_notification_time(store.as_ref()),
            None => NotificationTime::default(),
        }
    }

    pub fn set_notification_time(&self, hour: u32, minute: u32) -> Result<ReminderAction> {
        ensure!(hour < 24, "hour {} is out of range", hour);
        ensure!(minute < 60, "minute {} is out of range", minute);
        let time = NotificationTime { hour, minute };
        if let Some(store) = &self.preferences {
            notifications::save_notification_time(store.as_ref(), time)
                .context("persisting notification time")?;
        }
        self.reconcile_reminder()
    }

    /// Decides and, permission allowing, applies the daily reminder state.
    ///
    /// The decision is always computed and returned; when the platform has
    /// not granted notification permission the sink call is suppressed and
    /// a warning is logged instead. Permission is never re-requested here.
    pub fn reconcile_reminder(&self) -> Result<ReminderAction> {
        let action = notifications::reconcile(&self.due_today(), self.notification_time());
        let Some(sink) = &self.notification_sink else {
            return Ok(action);
        };
        if sink.permission() != PermissionStatus::Granted {
            tracing::warn!(?action, "notification permission not granted, reminder not applied");
            return Ok(action);
        }
        match &action {
            ReminderAction::ScheduleDaily(time) => sink
                .schedule_daily(*time, &daily_reminder_content(), DAILY_REMINDER_ID)
                .context("scheduling daily reminder")?,
            ReminderAction::CancelDaily => sink
                .cancel(DAILY_REMINDER_ID)
                .context("cancelling daily reminder")?,
        }
        Ok(action)
    }

    fn persist_status(&self, id: &str, date: NaiveDate, status: ReviewStatus) -> Result<Review> {
        let stored = self.store.update_status(id, date, status)?;
        let mut reviews = self.reviews.write();
        if let Some(slot) = reviews.iter_mut().find(|review| review.id == id) {
            *slot = stored.clone();
        }
        Ok(stored)
    }

    fn find_review(&self, id: &str) -> Result<Review> {
        self.reviews
            .read()
            .iter()
            .find(|review| review.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("review `{}` is not loaded", id))
    }
}
