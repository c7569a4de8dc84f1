use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates;
use crate::review::{Review, ReviewStatus, SCHEDULE_LABELS};

/// Subject filter applied to review lists. `All` keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubjectFilter {
    #[default]
    All,
    Only(String),
}

impl SubjectFilter {
    pub fn matches(&self, review: &Review) -> bool {
        match self {
            SubjectFilter::All => true,
            SubjectFilter::Only(id) => review.subject.id == *id,
        }
    }
}

pub fn status_on(review: &Review, date: NaiveDate) -> Option<ReviewStatus> {
    review.occurrence_on(date).map(|occurrence| occurrence.status)
}

pub fn is_pending_on(review: &Review, date: NaiveDate) -> bool {
    status_on(review, date) == Some(ReviewStatus::Pending)
}

pub fn is_completed_on(review: &Review, date: NaiveDate) -> bool {
    status_on(review, date) == Some(ReviewStatus::Completed)
}

pub fn is_skipped_on(review: &Review, date: NaiveDate) -> bool {
    status_on(review, date) == Some(ReviewStatus::Skipped)
}

/// Reviews with an occurrence on `date`, whatever its status. Narrowing by
/// status is left to the caller.
pub fn due_on(reviews: &[Review], date: NaiveDate) -> Vec<Review> {
    reviews
        .iter()
        .filter(|review| review.occurrence_on(date).is_some())
        .cloned()
        .collect()
}

/// Ids of the reviews whose occurrence on `date` is completed.
pub fn completed_ids_on(reviews: &[Review], date: NaiveDate) -> Vec<String> {
    reviews
        .iter()
        .filter(|review| is_completed_on(review, date))
        .map(|review| review.id.clone())
        .collect()
}

/// Buckets every occurrence inside the given calendar month under its date.
/// A review shows up once per distinct occurrence date. Iterating the map
/// yields the dates in chronological order.
pub fn group_by_date(
    reviews: &[Review],
    year: i32,
    month: u32,
) -> BTreeMap<NaiveDate, Vec<Review>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<Review>> = BTreeMap::new();
    for review in reviews {
        for occurrence in &review.review_dates {
            if dates::in_month(occurrence.scheduled_for, year, month) {
                buckets
                    .entry(occurrence.scheduled_for)
                    .or_default()
                    .push(review.clone());
            }
        }
    }
    buckets
}

pub fn filter_by_subject(reviews: &[Review], filter: &SubjectFilter) -> Vec<Review> {
    reviews
        .iter()
        .filter(|review| filter.matches(review))
        .cloned()
        .collect()
}

/// Label for the slot `date` occupies in the review's schedule, empty when
/// the date is not part of it.
pub fn schedule_label(review: &Review, date: NaiveDate) -> &'static str {
    review
        .review_dates
        .iter()
        .position(|occurrence| occurrence.scheduled_for == date)
        .and_then(|index| SCHEDULE_LABELS.get(index).copied())
        .unwrap_or("")
}
