//! Integration tests against a live PostgreSQL database.
//!
//! Run with: DATABASE_URL=postgresql://... cargo test -- --ignored
//!
//! Tests isolate themselves by using fresh instructor/member ids per test
//! and distinct time-of-day windows, since they share one database.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use sqlx::PgPool;
use uuid::Uuid;

use rollcall::db;
use rollcall::db::handlers::Reservations;
use rollcall::errors::Error;
use rollcall::schedule::{AttendanceState, Policy};
use rollcall::services::{
    InstanceScheduler, ReservationEngine, TemplateCreate, TemplateService, TemplateUpdate,
    UpdateOutcome,
};

async fn create_test_pool() -> PgPool {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    db::connect(&database_url)
        .await
        .expect("failed to connect to test database")
}

async fn seed_instructor(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO instructors (id, name, role) VALUES ($1, $2, 'instructor')")
        .bind(id)
        .bind(format!("instructor-{id}"))
        .execute(pool)
        .await
        .expect("failed to seed instructor");
    id
}

/// A policy whose rest day never collides with the weekdays a test uses.
fn policy_allowing(weekdays: &[Weekday]) -> Policy {
    let mut policy = Policy::default();
    while weekdays.contains(&policy.rest_day) {
        policy.rest_day = policy.rest_day.succ();
    }
    policy
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn days_ahead(n: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(n))
        .unwrap()
}

fn template_for(instructor: Uuid, weekday: Weekday, start: NaiveTime, end: NaiveTime, capacity: i32) -> TemplateCreate {
    TemplateCreate {
        instructor_id: instructor,
        name: format!("class-{}", Uuid::new_v4()),
        weekday,
        start_time: start,
        end_time: end,
        capacity,
    }
}

#[tokio::test]
#[ignore]
async fn overlapping_template_for_same_instructor_is_refused() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let weekday = Weekday::Mon;
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);

    service
        .create(template_for(instructor, weekday, t(5, 0), t(6, 0), 10))
        .await
        .unwrap();

    let err = service
        .create(template_for(instructor, weekday, t(5, 30), t(6, 30), 10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Touching windows are fine.
    service
        .create(template_for(instructor, weekday, t(6, 0), t(7, 0), 10))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn rest_day_template_is_refused() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let policy = Policy::default();
    let service = TemplateService::new(pool.clone(), policy);

    let err = service
        .create(template_for(
            instructor,
            policy.rest_day,
            t(5, 0),
            t(6, 0),
            10,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
#[ignore]
async fn update_with_identical_values_is_a_no_op() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let weekday = Weekday::Tue;
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(7, 0), t(8, 0), 10))
        .await
        .unwrap();

    let outcome = service
        .update(
            template.id,
            TemplateUpdate {
                weekday: Some(weekday),
                start_time: Some(t(7, 0)),
                end_time: Some(t(8, 0)),
                capacity: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::NoChanges));
}

#[tokio::test]
#[ignore]
async fn exact_conflict_swaps_slots_when_forced() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let (wd_a, wd_b) = (Weekday::Mon, Weekday::Wed);
    let policy = policy_allowing(&[wd_a, wd_b]);
    let service = TemplateService::new(pool.clone(), policy);

    let a = service
        .create(template_for(instructor, wd_a, t(8, 0), t(9, 0), 10))
        .await
        .unwrap();
    let b = service
        .create(template_for(instructor, wd_b, t(9, 0), t(10, 0), 10))
        .await
        .unwrap();

    // Moving A onto B's exact slot without the flag is a conflict.
    let err = service
        .update(
            a.id,
            TemplateUpdate {
                weekday: Some(wd_b),
                start_time: Some(t(9, 0)),
                end_time: Some(t(10, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // With the flag the slots are exchanged.
    let outcome = service
        .update(
            a.id,
            TemplateUpdate {
                weekday: Some(wd_b),
                start_time: Some(t(9, 0)),
                end_time: Some(t(10, 0)),
                force_swap: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let Some(swapped_with) = (match outcome {
        UpdateOutcome::Swapped { with, .. } => Some(with),
        _ => None,
    }) else {
        panic!("expected a swap");
    };
    assert_eq!(swapped_with, b.id);

    let templates = service.list(Default::default()).await.unwrap();
    let a_after = templates.iter().find(|x| x.id == a.id).unwrap();
    let b_after = templates.iter().find(|x| x.id == b.id).unwrap();
    assert_eq!(a_after.weekday, wd_b);
    assert_eq!(a_after.start_time, t(9, 0));
    assert_eq!(b_after.weekday, wd_a);
    assert_eq!(b_after.start_time, t(8, 0));
}

#[tokio::test]
#[ignore]
async fn swap_is_refused_while_future_instances_exist() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(7);
    let other_date = days_ahead(8);
    let (wd_a, wd_b) = (date.weekday(), other_date.weekday());
    let policy = policy_allowing(&[wd_a, wd_b]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);

    let a = service
        .create(template_for(instructor, wd_a, t(10, 0), t(11, 0), 10))
        .await
        .unwrap();
    let b = service
        .create(template_for(instructor, wd_b, t(11, 0), t(12, 0), 10))
        .await
        .unwrap();
    scheduler.create_instance(b.id, other_date, 1).await.unwrap();

    let err = service
        .update(
            a.id,
            TemplateUpdate {
                weekday: Some(wd_b),
                start_time: Some(t(11, 0)),
                end_time: Some(t(12, 0)),
                force_swap: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn instance_date_must_match_template_weekday() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(3);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(12, 0), t(13, 0), 10))
        .await
        .unwrap();

    // Every other day of that week is refused.
    for offset in 4..10 {
        let wrong_date = days_ahead(offset);
        if wrong_date.weekday() == weekday {
            continue;
        }
        let err = scheduler
            .create_instance(template.id, wrong_date, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "offset {offset}");
    }

    let instance = scheduler.create_instance(template.id, date, 1).await.unwrap();
    assert_eq!(instance.class_date, date);

    // Same (template, date) again is a duplicate.
    let err = scheduler
        .create_instance(template.id, date, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn bulk_generation_creates_one_instance_per_matching_day() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(2);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);

    service
        .create(template_for(instructor, weekday, t(13, 0), t(14, 0), 10))
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let expected = (0..=15u64)
        .filter(|offset| days_ahead(*offset).weekday() == weekday)
        .count() as u32;

    let created = scheduler
        .generate_for_instructor(instructor, None)
        .await
        .unwrap();
    assert_eq!(created, expected);
    assert!(days_ahead(0) == today, "clock moved mid-test");

    // Re-running skips every existing instance.
    let created_again = scheduler
        .generate_for_instructor(instructor, None)
        .await
        .unwrap();
    assert_eq!(created_again, 0);
}

#[tokio::test]
#[ignore]
async fn generation_without_active_templates_is_refused() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let scheduler = InstanceScheduler::new(pool.clone(), Policy::default());

    let err = scheduler
        .generate_for_instructor(instructor, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

#[tokio::test]
#[ignore]
async fn booking_respects_capacity_and_duplicates() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(5);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);
    let engine = ReservationEngine::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(14, 0), t(15, 0), 2))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, date, 2).await.unwrap();

    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    engine.reserve(a, instance.id).await.unwrap();
    engine.reserve(b, instance.id).await.unwrap();

    // Third member bounces off the capacity.
    let err = engine.reserve(c, instance.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(ref msg) if msg == "class full"));

    // A double booking by the same member is refused.
    let err = engine.reserve(a, instance.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    // After A cancels, C fits; A's cancelled row stays behind as history.
    engine.cancel(a, instance.id).await.unwrap();
    engine.reserve(c, instance.id).await.unwrap();

    let rows = engine.list_for_instance(instance.id).await.unwrap();
    assert_eq!(rows.len(), 3);
    let live = rows
        .iter()
        .filter(|r| r.state == AttendanceState::Reserved)
        .count();
    assert_eq!(live, 2);
}

#[tokio::test]
#[ignore]
async fn booking_window_boundaries() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let far = days_ahead(16);
    let max = days_ahead(15);
    let weekdays = [far.weekday(), max.weekday()];
    let policy = policy_allowing(&weekdays);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);
    let engine = ReservationEngine::new(pool.clone(), policy);
    let member = Uuid::new_v4();

    // 16 days out: too far.
    let template = service
        .create(template_for(instructor, far.weekday(), t(15, 0), t(16, 0), 5))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, far, 3).await.unwrap();
    let err = engine.reserve(member, instance.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));

    // Exactly 15 days out: allowed.
    let template = service
        .create(template_for(instructor, max.weekday(), t(16, 0), t(17, 0), 5))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, max, 3).await.unwrap();
    engine.reserve(member, instance.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn concurrent_bookings_never_oversell_a_class() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(6);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(17, 0), t(18, 0), 1))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, date, 4).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = ReservationEngine::new(pool.clone(), policy);
        let instance_id = instance.id;
        handles.push(tokio::spawn(async move {
            engine.reserve(Uuid::new_v4(), instance_id).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(Error::InvalidOperation(_)) | Err(Error::Retry) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1, "exactly one booking may win a single seat");

    let engine = ReservationEngine::new(pool.clone(), policy);
    let rows = engine.list_for_instance(instance.id).await.unwrap();
    let live = rows
        .iter()
        .filter(|r| r.state == AttendanceState::Reserved)
        .count();
    assert_eq!(live, 1);
}

#[tokio::test]
#[ignore]
async fn cancelling_an_instance_cascades_to_live_reservations_only() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(4);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);
    let engine = ReservationEngine::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(18, 0), t(19, 0), 5))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, date, 5).await.unwrap();

    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    engine.reserve(a, instance.id).await.unwrap();
    engine.reserve(b, instance.id).await.unwrap();
    engine.cancel(b, instance.id).await.unwrap();

    // Only A's live row is cascaded; B's cancelled row is untouched.
    let cascaded = scheduler.cancel_instance(instance.id).await.unwrap();
    assert_eq!(cascaded, 1);

    let rows = engine.list_for_instance(instance.id).await.unwrap();
    assert!(rows.iter().all(|r| r.state == AttendanceState::Cancelled));

    // Cancelling again is refused.
    let err = scheduler.cancel_instance(instance.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}

#[tokio::test]
#[ignore]
async fn attendance_marks_present_and_absent() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let today = Utc::now().date_naive();
    let weekday = today.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);
    let engine = ReservationEngine::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(19, 0), t(20, 0), 5))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, today, 5).await.unwrap();

    // Booking a same-day class is outside the lead-time window, so seed the
    // reservations directly.
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    {
        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);
        reservations.insert(instance.id, a).await.unwrap();
        reservations.insert(instance.id, b).await.unwrap();
    }

    let present: HashSet<Uuid> = [a].into_iter().collect();
    let summary = engine.mark_attendance(instance.id, present).await.unwrap();
    assert_eq!((summary.present, summary.absent), (1, 1));

    // Re-marking with a corrected roster is idempotent.
    let present: HashSet<Uuid> = [a, b].into_iter().collect();
    let summary = engine.mark_attendance(instance.id, present).await.unwrap();
    assert_eq!((summary.present, summary.absent), (2, 0));

    // Marked rows are terminal for cancellation purposes: nothing cascades.
    let cascaded = scheduler.cancel_instance(instance.id).await.unwrap();
    assert_eq!(cascaded, 0);
}

#[tokio::test]
#[ignore]
async fn attendance_before_the_class_date_is_refused() {
    let pool = create_test_pool().await;
    let instructor = seed_instructor(&pool).await;
    let date = days_ahead(9);
    let weekday = date.weekday();
    let policy = policy_allowing(&[weekday]);
    let service = TemplateService::new(pool.clone(), policy);
    let scheduler = InstanceScheduler::new(pool.clone(), policy);
    let engine = ReservationEngine::new(pool.clone(), policy);

    let template = service
        .create(template_for(instructor, weekday, t(20, 0), t(21, 0), 5))
        .await
        .unwrap();
    let instance = scheduler.create_instance(template.id, date, 5).await.unwrap();
    engine.reserve(Uuid::new_v4(), instance.id).await.unwrap();

    let err = engine
        .mark_attendance(instance.id, HashSet::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}
