use revisa_core::agenda::{self, SubjectFilter};
use revisa_core::dates;
use revisa_core::notifications::{NotificationTime, ReminderAction, DAILY_REMINDER_ID};
use revisa_core::review::{ReviewStatus, ScheduleError};
use revisa_core::store::{NewReviewInput, NewSubjectInput, ReviewPatch};
use revisa_core::ReviewService;
use revisa_memstore::{MemoryPreferences, MemoryStore, RecordingSink};

fn service_with_sink(sink: RecordingSink) -> ReviewService {
    ReviewService::builder()
        .with_store(Box::new(MemoryStore::new()))
        .with_notification_sink(Box::new(sink))
        .with_preferences(Box::new(MemoryPreferences::new()))
        .build()
        .expect("build review service")
}

fn seeded_review(service: &ReviewService, initial: chrono::NaiveDate) -> (String, String) {
    let subject = service
        .add_subject(NewSubjectInput {
            name: "Matemática".to_string(),
            color: "f87171".to_string(),
        })
        .expect("create subject");
    let review = service
        .add_review(NewReviewInput {
            topic: "Funções logarítmicas".to_string(),
            subject_id: subject.id.clone(),
            notes: "Capítulo 7".to_string(),
            initial_date: initial,
            mark_first: false,
        })
        .expect("create review");
    (review.id, subject.id)
}

#[test]
fn daily_flow_from_creation_to_reminder() {
    let sink = RecordingSink::granted();
    let service = service_with_sink(sink.clone());
    let today = dates::today_local();
    let (review_id, _) = seeded_review(&service, today);

    let due = service.due_today();
    assert_eq!(due.len(), 1);
    assert_eq!(agenda::schedule_label(&due[0], today), "Estudo Inicial");
    assert!(service.completed_today().is_empty());

    // toggling twice lands back on pending
    let toggled = service.toggle_review(&review_id).expect("first toggle");
    assert_eq!(
        toggled.occurrence_on(today).unwrap().status,
        ReviewStatus::Completed
    );
    assert_eq!(service.completed_today(), vec![review_id.clone()]);

    let toggled = service.toggle_review(&review_id).expect("second toggle");
    assert_eq!(
        toggled.occurrence_on(today).unwrap().status,
        ReviewStatus::Pending
    );
    assert!(service.completed_today().is_empty());

    // a due review schedules the reminder at the default time
    let action = service.reconcile_reminder().expect("reconcile");
    assert_eq!(
        action,
        ReminderAction::ScheduleDaily(NotificationTime { hour: 8, minute: 0 })
    );
    let scheduled = sink.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].identifier, DAILY_REMINDER_ID);

    // reconciling again replaces rather than duplicates
    service.reconcile_reminder().expect("reconcile again");
    assert_eq!(sink.scheduled().len(), 1);

    // a new preferred time reprograms the trigger
    let action = service
        .set_notification_time(20, 30)
        .expect("set notification time");
    assert_eq!(
        action,
        ReminderAction::ScheduleDaily(NotificationTime {
            hour: 20,
            minute: 30
        })
    );
    assert_eq!(
        sink.scheduled()[0].trigger,
        NotificationTime {
            hour: 20,
            minute: 30
        }
    );
    assert_eq!(
        service.notification_time(),
        NotificationTime {
            hour: 20,
            minute: 30
        }
    );

    assert!(service.set_notification_time(24, 0).is_err());
    assert!(service.set_notification_time(8, 60).is_err());
}

#[test]
fn rescheduling_discards_history_and_cancels_the_reminder() {
    let sink = RecordingSink::granted();
    let service = service_with_sink(sink.clone());
    let today = dates::today_local();
    let (review_id, _) = seeded_review(&service, today);

    service.toggle_review(&review_id).expect("complete today");
    service.reconcile_reminder().expect("reconcile");
    assert_eq!(sink.scheduled().len(), 1);

    // re-anchor three days out; completion history is discarded
    let new_initial = dates::add_days(today, 3);
    let rescheduled = service
        .reschedule_review(&review_id, &dates::format_date(new_initial))
        .expect("reschedule");
    assert_eq!(rescheduled.review_dates[0].scheduled_for, new_initial);
    assert!(rescheduled
        .review_dates
        .iter()
        .all(|occurrence| occurrence.status == ReviewStatus::Pending));

    // nothing is due today any more, so the reminder goes away
    assert!(service.due_today().is_empty());
    let action = service.reconcile_reminder().expect("reconcile after");
    assert_eq!(action, ReminderAction::CancelDaily);
    assert!(sink.scheduled().is_empty());
    assert_eq!(sink.cancelled(), vec![DAILY_REMINDER_ID.to_string()]);
}

#[test]
fn rescheduling_rejects_malformed_dates() {
    let service = service_with_sink(RecordingSink::granted());
    let today = dates::today_local();
    let (review_id, _) = seeded_review(&service, today);

    let error = service
        .reschedule_review(&review_id, "15/04/2031")
        .expect_err("malformed date");
    assert!(matches!(
        error.downcast_ref::<ScheduleError>(),
        Some(ScheduleError::InvalidDate { .. })
    ));
}

#[test]
fn toggling_requires_an_occurrence_today() {
    let service = service_with_sink(RecordingSink::granted());
    let ten_days_ago = dates::add_days(dates::today_local(), -10);
    let (review_id, _) = seeded_review(&service, ten_days_ago);

    let error = service.toggle_review(&review_id).expect_err("not due today");
    assert!(matches!(
        error.downcast_ref::<ScheduleError>(),
        Some(ScheduleError::UnknownOccurrence { .. })
    ));
}

#[test]
fn denied_permission_suppresses_the_sink_but_not_the_decision() {
    let sink = RecordingSink::denied();
    let service = service_with_sink(sink.clone());
    let today = dates::today_local();
    seeded_review(&service, today);

    let action = service.reconcile_reminder().expect("reconcile");
    assert_eq!(
        action,
        ReminderAction::ScheduleDaily(NotificationTime { hour: 8, minute: 0 })
    );
    assert!(sink.scheduled().is_empty());
}

#[test]
fn deleting_the_subject_cascades_into_the_aggregated_views() {
    let service = service_with_sink(RecordingSink::granted());
    let today = dates::today_local();
    let (_, subject_id) = seeded_review(&service, today);

    service.remove_subject(&subject_id).expect("remove subject");

    let reviews = service.reviews();
    assert!(reviews.is_empty());
    let filtered = agenda::filter_by_subject(&reviews, &SubjectFilter::Only(subject_id));
    assert!(filtered.is_empty());
    assert!(service.due_today().is_empty());
}

#[test]
fn edits_round_trip_through_the_store() {
    let service = service_with_sink(RecordingSink::granted());
    let today = dates::today_local();
    let (review_id, _) = seeded_review(&service, today);

    let updated = service
        .update_review(
            &review_id,
            ReviewPatch {
                topic: Some("Funções exponenciais".to_string()),
                notes: Some("Capítulo 8".to_string()),
                ..ReviewPatch::default()
            },
        )
        .expect("update review");
    assert_eq!(updated.topic, "Funções exponenciais");
    assert_eq!(service.reviews()[0].notes, "Capítulo 8");

    service.delete_review(&review_id).expect("delete review");
    assert!(service.reviews().is_empty());
}
