use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates;

/// Day offsets, relative to the initial study date, at which a review comes
/// back around. The first slot is the initial study itself.
pub const REVIEW_OFFSETS: [i64; 6] = [0, 1, 7, 14, 28, 56];

/// User-facing label for each slot of [`REVIEW_OFFSETS`], in occurrence order.
pub const SCHEDULE_LABELS: [&str; 6] = [
    "Estudo Inicial",
    "Revisão (1 dia)",
    "Revisão (1 semana)",
    "Revisão (2 semanas)",
    "Revisão (1 mês)",
    "Revisão (2 meses)",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Completed,
    Skipped,
}

impl ReviewStatus {
    /// The status after the user taps the occurrence: pending becomes
    /// completed, anything else falls back to pending. `Skipped` can only be
    /// left through here, never entered; entering it goes through
    /// [`Review::set_status`].
    pub fn toggled(self) -> Self {
        match self {
            ReviewStatus::Pending => ReviewStatus::Completed,
            ReviewStatus::Completed | ReviewStatus::Skipped => ReviewStatus::Pending,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pendente",
            ReviewStatus::Completed => "Concluída",
            ReviewStatus::Skipped => "Perdida",
        }
    }
}

/// One scheduled study date belonging to a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewDate {
    pub scheduled_for: NaiveDate,
    pub status: ReviewStatus,
}

impl ReviewDate {
    /// The canonical occurrence sequence anchored at `initial`, all pending.
    pub fn schedule(initial: NaiveDate) -> Vec<ReviewDate> {
        schedule_dates(initial, &REVIEW_OFFSETS)
            .into_iter()
            .map(|scheduled_for| ReviewDate {
                scheduled_for,
                status: ReviewStatus::Pending,
            })
            .collect()
    }
}

/// One occurrence date per offset, in table order. The first date equals
/// `initial` whenever the table starts at zero.
pub fn schedule_dates(initial: NaiveDate, offsets: &[i64]) -> Vec<NaiveDate> {
    offsets
        .iter()
        .map(|&days| dates::add_days(initial, days))
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("`{input}` is not a valid calendar date")]
    InvalidDate { input: String },
    #[error("review has no occurrence scheduled for {date}")]
    UnknownOccurrence { date: NaiveDate },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub topic: String,
    pub subject: Subject,
    pub notes: String,
    pub review_dates: Vec<ReviewDate>,
}

impl Review {
    pub fn occurrence_on(&self, date: NaiveDate) -> Option<&ReviewDate> {
        self.review_dates
            .iter()
            .find(|occurrence| occurrence.scheduled_for == date)
    }

    /// Cycles the status of the occurrence scheduled for `date` and returns
    /// the updated review. The receiver is left untouched; callers
    /// re-publish the returned value themselves.
    pub fn toggle(&self, date: NaiveDate) -> Result<Review, ScheduleError> {
        let current = self
            .occurrence_on(date)
            .ok_or(ScheduleError::UnknownOccurrence { date })?
            .status;
        self.set_status(date, current.toggled())
    }

    /// Replaces the status of the occurrence scheduled for `date`. Unlike
    /// [`Review::toggle`] this can enter `Skipped`.
    pub fn set_status(
        &self,
        date: NaiveDate,
        status: ReviewStatus,
    ) -> Result<Review, ScheduleError> {
        if self.occurrence_on(date).is_none() {
            return Err(ScheduleError::UnknownOccurrence { date });
        }
        let review_dates = self
            .review_dates
            .iter()
            .map(|occurrence| {
                if occurrence.scheduled_for == date {
                    ReviewDate {
                        scheduled_for: date,
                        status,
                    }
                } else {
                    occurrence.clone()
                }
            })
            .collect();
        Ok(Review {
            review_dates,
            ..self.clone()
        })
    }

    /// Regenerates the whole occurrence sequence from `new_initial`.
    ///
    /// Every occurrence comes back as pending: all completion and skip
    /// history recorded under the old schedule is discarded. Rescheduling
    /// into the past is allowed.
    pub fn reschedule(&self, new_initial: NaiveDate) -> Review {
        Review {
            review_dates: ReviewDate::schedule(new_initial),
            ..self.clone()
        }
    }
}

/// Whether the occurrence on `date` may be toggled right now. Only today's
/// occurrence accepts status changes; other dates are read-only.
pub fn can_toggle(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_review(initial: NaiveDate) -> Review {
        Review {
            id: "review-1".to_string(),
            topic: "Funções orgânicas".to_string(),
            subject: Subject {
                id: "subject-1".to_string(),
                name: "Química".to_string(),
                color: "f87171".to_string(),
            },
            notes: String::new(),
            review_dates: ReviewDate::schedule(initial),
        }
    }

    #[test]
    fn schedule_matches_the_offset_table() {
        let dates = schedule_dates(ymd(2025, 4, 15), &REVIEW_OFFSETS);
        let expected = [
            ymd(2025, 4, 15),
            ymd(2025, 4, 16),
            ymd(2025, 4, 22),
            ymd(2025, 4, 29),
            ymd(2025, 5, 13),
            ymd(2025, 6, 10),
        ];
        assert_eq!(dates, expected);
    }

    #[test]
    fn schedule_is_strictly_increasing_and_starts_at_the_initial_date() {
        let initial = ymd(2025, 12, 29);
        let occurrences = ReviewDate::schedule(initial);
        assert_eq!(occurrences.len(), REVIEW_OFFSETS.len());
        assert_eq!(occurrences[0].scheduled_for, initial);
        assert!(occurrences
            .windows(2)
            .all(|pair| pair[0].scheduled_for < pair[1].scheduled_for));
        assert!(occurrences
            .iter()
            .all(|occurrence| occurrence.status == ReviewStatus::Pending));
    }

    #[test]
    fn toggle_cycles_pending_and_completed() {
        let initial = ymd(2025, 4, 15);
        let review = sample_review(initial);

        let completed = review.toggle(initial).unwrap();
        assert_eq!(
            completed.occurrence_on(initial).unwrap().status,
            ReviewStatus::Completed
        );
        // the original value is untouched
        assert_eq!(
            review.occurrence_on(initial).unwrap().status,
            ReviewStatus::Pending
        );

        let back = completed.toggle(initial).unwrap();
        assert_eq!(back, review);
    }

    #[test]
    fn toggle_leaves_skipped_through_pending_only() {
        let initial = ymd(2025, 4, 15);
        let review = sample_review(initial)
            .set_status(initial, ReviewStatus::Skipped)
            .unwrap();

        let once = review.toggle(initial).unwrap();
        assert_eq!(
            once.occurrence_on(initial).unwrap().status,
            ReviewStatus::Pending
        );

        // toggling twice from skipped is not an involution: it lands on
        // completed, not back on skipped
        let twice = once.toggle(initial).unwrap();
        assert_eq!(
            twice.occurrence_on(initial).unwrap().status,
            ReviewStatus::Completed
        );
    }

    #[test]
    fn toggle_rejects_dates_outside_the_schedule() {
        let review = sample_review(ymd(2025, 4, 15));
        let stranger = ymd(2025, 4, 17);
        assert_eq!(
            review.toggle(stranger),
            Err(ScheduleError::UnknownOccurrence { date: stranger })
        );
    }

    #[test]
    fn reschedule_discards_history_and_re_anchors() {
        let review = sample_review(ymd(2025, 4, 15))
            .set_status(ymd(2025, 4, 15), ReviewStatus::Completed)
            .unwrap()
            .set_status(ymd(2025, 4, 16), ReviewStatus::Skipped)
            .unwrap();

        let new_initial = ymd(2025, 6, 1);
        let rescheduled = review.reschedule(new_initial);

        assert_eq!(rescheduled.review_dates[0].scheduled_for, new_initial);
        assert!(rescheduled
            .review_dates
            .iter()
            .all(|occurrence| occurrence.status == ReviewStatus::Pending));
        assert_eq!(rescheduled.topic, review.topic);
        assert_eq!(rescheduled.subject, review.subject);
        assert_eq!(rescheduled.id, review.id);
    }

    #[test]
    fn reschedule_into_the_past_is_allowed() {
        let review = sample_review(ymd(2025, 4, 15));
        let past = ymd(2020, 1, 1);
        assert_eq!(review.reschedule(past).review_dates[0].scheduled_for, past);
    }

    #[test]
    fn only_today_is_toggleable() {
        let today = ymd(2025, 4, 16);
        assert!(can_toggle(today, today));
        assert!(!can_toggle(ymd(2025, 4, 15), today));
        assert!(!can_toggle(ymd(2025, 4, 17), today));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ReviewStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let parsed: ReviewStatus = serde_json::from_str("\"skipped\"").unwrap();
        assert_eq!(parsed, ReviewStatus::Skipped);
    }

    #[test]
    fn status_display_names() {
        assert_eq!(ReviewStatus::Pending.display_name(), "Pendente");
        assert_eq!(ReviewStatus::Completed.display_name(), "Concluída");
        assert_eq!(ReviewStatus::Skipped.display_name(), "Perdida");
    }
}
