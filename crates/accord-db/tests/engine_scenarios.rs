//! End-to-end engine scenarios.
//!
//! - Mutual accept lifecycle: record, match, busy actor, terminate, re-terminate
//! - Reject blocks reciprocation
//! - Outsider termination
//! - Daily quota: 12 per UTC day, reset at midnight
//! - Error precedence and caller-facing error bodies

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

use accord_core::clock::ManualClock;
use accord_core::enums::{Direction, ErrorKind, Guidance, RelationshipStatus};
use accord_core::quota::DAILY_LIMIT;
use accord_core::responses::{DecisionResponse, RelationshipView};
use accord_db::error::EngineError;
use accord_db::service::AccordService;

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, day, hour, minute, 0).unwrap()
}

async fn service_at(start: DateTime<Utc>) -> (AccordService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let svc = AccordService::new_local(":memory:", None)
        .await
        .unwrap()
        .with_clock(clock.clone());
    (svc, clock)
}

fn kind(err: &EngineError) -> ErrorKind {
    err.kind()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mutual_accept_lifecycle() {
    let (svc, clock) = service_at(at(10, 9, 0)).await;

    // A accepts B: recorded, quota down by one.
    let first = svc.submit_decision("A", "B", Direction::Accept).await.unwrap();
    assert!(first.is_none());
    assert_eq!(svc.remaining_quota("A").await.unwrap(), 11);

    // B accepts A: relationship created, visible to both.
    clock.advance(Duration::minutes(5));
    let rel = svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap()
        .expect("reciprocated accept creates a relationship");
    assert_eq!(rel.status, RelationshipStatus::Active);
    assert_eq!(svc.active_relationship("A").await.unwrap().as_ref(), Some(&rel));
    assert_eq!(svc.active_relationship("B").await.unwrap().as_ref(), Some(&rel));

    // A may not evaluate anyone else while matched.
    let err = svc
        .submit_decision("A", "C", Direction::Accept)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::ActiveRelationshipExists);
    assert!(!svc.ledger().has_decided("A", "C").await.unwrap());

    // A ends it.
    clock.advance(Duration::hours(1));
    let ended = svc.terminate(&rel.id, "A").await.unwrap();
    assert_eq!(ended.status, RelationshipStatus::Ended);
    assert_eq!(ended.ended_by.as_deref(), Some("A"));
    assert_eq!(ended.ended_at, Some(at(10, 10, 5)));
    assert!(svc.active_relationship("A").await.unwrap().is_none());
    assert!(svc.active_relationship("B").await.unwrap().is_none());

    // Ending it again fails.
    let err = svc.terminate(&rel.id, "A").await.unwrap_err();
    assert_eq!(kind(&err), ErrorKind::AlreadyEnded);

    // A is free to decide again.
    svc.submit_decision("A", "C", Direction::Reject).await.unwrap();
}

#[tokio::test]
async fn reject_then_accept_never_matches() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;

    assert!(svc
        .submit_decision("A", "B", Direction::Reject)
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap()
        .is_none());

    assert!(svc.active_relationship("A").await.unwrap().is_none());
    assert!(svc.active_relationship("B").await.unwrap().is_none());
    assert!(svc.store().find_by_pair("A", "B").await.unwrap().is_none());
}

#[tokio::test]
async fn accept_after_reject_by_other_side_never_matches() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    svc.submit_decision("A", "B", Direction::Accept).await.unwrap();
    assert!(svc
        .submit_decision("B", "A", Direction::Reject)
        .await
        .unwrap()
        .is_none());
    assert!(svc.active_relationship("A").await.unwrap().is_none());
}

#[tokio::test]
async fn outsider_cannot_terminate() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    svc.submit_decision("A", "B", Direction::Accept).await.unwrap();
    let rel = svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap()
        .unwrap();

    let err = svc.terminate(&rel.id, "C").await.unwrap_err();
    assert_eq!(kind(&err), ErrorKind::NotAParty);

    let still = svc.store().get(&rel.id).await.unwrap().unwrap();
    assert_eq!(still.status, RelationshipStatus::Active);
    assert_eq!(svc.active_relationship("A").await.unwrap(), Some(still));
}

#[tokio::test]
async fn ended_pair_stays_ended() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    svc.submit_decision("A", "B", Direction::Accept).await.unwrap();
    let rel = svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap()
        .unwrap();
    svc.terminate(&rel.id, "B").await.unwrap();

    // Both ordered decisions already exist, so no fresh cycle is possible.
    let err = svc
        .submit_decision("A", "B", Direction::Accept)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::AlreadyDecided);
    let err = svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::AlreadyDecided);
}

// ---------------------------------------------------------------------------
// Quota
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thirteenth_decision_exceeds_quota() {
    let (svc, clock) = service_at(at(10, 8, 0)).await;

    for i in 0..DAILY_LIMIT {
        let direction = if i % 2 == 0 {
            Direction::Accept
        } else {
            Direction::Reject
        };
        svc.submit_decision("A", &format!("T{i}"), direction)
            .await
            .unwrap();
        clock.advance(Duration::minutes(10));
        assert_eq!(svc.remaining_quota("A").await.unwrap(), DAILY_LIMIT - i - 1);
    }

    let err = svc
        .submit_decision("A", "T99", Direction::Accept)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::QuotaExceeded);
    assert_eq!(err.to_response().guidance, Guidance::WaitForReset);
    assert_eq!(svc.remaining_quota("A").await.unwrap(), 0);
    assert!(!svc.ledger().has_decided("A", "T99").await.unwrap());

    let status = svc.quota_status("A").await.unwrap();
    assert_eq!(status.used, DAILY_LIMIT);
    assert_eq!(status.limit, DAILY_LIMIT);
    assert_eq!(status.resets_at, at(11, 0, 0));
}

#[tokio::test]
async fn quota_resets_at_utc_midnight() {
    let (svc, clock) = service_at(at(10, 23, 0)).await;
    for i in 0..DAILY_LIMIT {
        svc.submit_decision("A", &format!("T{i}"), Direction::Reject)
            .await
            .unwrap();
    }
    clock.set(at(10, 23, 59));
    assert_eq!(svc.remaining_quota("A").await.unwrap(), 0);

    clock.set(at(11, 0, 0));
    assert_eq!(svc.remaining_quota("A").await.unwrap(), DAILY_LIMIT);
    svc.submit_decision("A", "T99", Direction::Accept).await.unwrap();
    assert_eq!(svc.remaining_quota("A").await.unwrap(), DAILY_LIMIT - 1);
}

#[tokio::test]
async fn quota_is_per_actor() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    svc.submit_decision("A", "B", Direction::Reject).await.unwrap();
    svc.submit_decision("A", "C", Direction::Reject).await.unwrap();
    assert_eq!(svc.remaining_quota("A").await.unwrap(), 10);
    assert_eq!(svc.remaining_quota("B").await.unwrap(), 12);
}

// ---------------------------------------------------------------------------
// Error precedence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn active_relationship_is_checked_before_quota() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    for i in 0..(DAILY_LIMIT - 1) {
        svc.submit_decision("A", &format!("T{i}"), Direction::Reject)
            .await
            .unwrap();
    }
    svc.submit_decision("B", "A", Direction::Accept).await.unwrap();
    // A's twelfth decision completes a match.
    svc.submit_decision("A", "B", Direction::Accept)
        .await
        .unwrap()
        .unwrap();

    // Over quota and matched: the active relationship is reported.
    let err = svc
        .submit_decision("A", "C", Direction::Accept)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::ActiveRelationshipExists);
}

#[tokio::test]
async fn quota_is_checked_before_duplicate() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    for i in 0..DAILY_LIMIT {
        svc.submit_decision("A", &format!("T{i}"), Direction::Reject)
            .await
            .unwrap();
    }
    let err = svc
        .submit_decision("A", "T0", Direction::Reject)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::QuotaExceeded);
}

#[tokio::test]
async fn error_bodies_are_stable() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    let err = svc
        .submit_decision("A", "A", Direction::Accept)
        .await
        .unwrap_err();
    let body = serde_json::to_value(err.to_response()).unwrap();
    assert_eq!(body["kind"], "self_reference");
    assert_eq!(body["guidance"], "stop");

    let err = svc.terminate("rel-00000000", "A").await.unwrap_err();
    let body = serde_json::to_value(err.to_response()).unwrap();
    assert_eq!(body["kind"], "not_found");
}

// ---------------------------------------------------------------------------
// Response shaping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn decision_response_names_the_counterpart() {
    let (svc, _clock) = service_at(at(10, 9, 0)).await;
    svc.submit_decision("A", "B", Direction::Accept).await.unwrap();
    let rel = svc
        .submit_decision("B", "A", Direction::Accept)
        .await
        .unwrap();

    let for_b = DecisionResponse::from_relationship(rel.as_ref(), "B");
    assert!(for_b.matched);
    assert_eq!(
        for_b.relationship.as_ref().map(|v| v.counterpart_id.as_str()),
        Some("A")
    );

    let rel = rel.unwrap();
    let for_a = RelationshipView::for_actor(&rel, "A").unwrap();
    assert_eq!(for_a.counterpart_id, "B");
    assert_eq!(for_a.relationship_id, rel.id);
}
