//! Integration tests for report processing against the in-memory store.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::panic
)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use hunt_core::MobCatalog;
use hunt_db::{DocumentStore, MemoryStore};
use hunt_reports::{
    NewReport, ReconcileOutcome, ReportError, ReportPolicy, ReportService, ResetOutcome,
    RevertOutcome, RevertTarget, ToggleOutcome,
};
use hunt_types::{
    Collection, MobDefinition, MobId, MobLocationState, MobStatus, MobStatusDocument, Rank,
    Report, SkipReason, SpawnPoint, SuppressionAction,
};

const T0: i64 = 1_700_000_000;
const REPOP: i64 = 3_600;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn catalog() -> MobCatalog {
    let point = |id: &str, ranks: Vec<Rank>| SpawnPoint {
        id: id.to_owned(),
        x: 1.0,
        y: 1.0,
        ranks,
    };
    let mob = |id: &str, rank: Rank, points: Vec<SpawnPoint>| MobDefinition {
        id: MobId::from(id),
        name: format!("Mob {id}"),
        rank,
        area: String::from("Test Area"),
        repop_seconds: 3_600,
        max_repop_seconds: 7_200,
        condition: None,
        spawn_points: points,
    };
    MobCatalog::from_definitions([
        mob(
            "62001",
            Rank::S,
            vec![point("p1", vec![Rank::S]), point("p2", vec![Rank::S, Rank::A])],
        ),
        mob("62002", Rank::S, Vec::new()),
        mob("41001", Rank::A, vec![point("a1", vec![Rank::A])]),
        mob("53001", Rank::F, Vec::new()),
    ])
    .unwrap()
}

fn service() -> ReportService<MemoryStore> {
    service_with(ReportPolicy::default())
}

fn service_with(policy: ReportPolicy) -> ReportService<MemoryStore> {
    ReportService::new(MemoryStore::new(), Arc::new(catalog()), policy)
}

fn report(mob: &str, kill: i64) -> NewReport {
    NewReport {
        mob_id: MobId::from(mob),
        kill_time: at(kill),
        reporter_uid: String::from("anon-1"),
        memo: format!("kill at {kill}"),
        repop_seconds: None,
    }
}

async fn status_of(service: &ReportService<MemoryStore>, mob: &str) -> MobStatus {
    let mob_id = MobId::from(mob);
    let rank = mob_id.rank().unwrap();
    let bucket: MobStatusDocument = service
        .store()
        .get(Collection::MobStatus, rank.status_document())
        .await
        .unwrap()
        .unwrap_or_default();
    bucket.mobs.get(&mob_id).cloned().unwrap_or_default()
}

async fn stored_report(service: &ReportService<MemoryStore>, id: hunt_types::ReportId) -> Report {
    service
        .store()
        .get(Collection::Reports, &id.to_string())
        .await
        .unwrap()
        .unwrap()
}

async fn submit(service: &ReportService<MemoryStore>, mob: &str, kill: i64) -> ReconcileOutcome {
    service.submit(report(mob, kill)).await.unwrap().reconciliation
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn first_report_is_accepted() {
    let service = service();
    let outcome = service.submit(report("62001", T0)).await.unwrap();

    assert_eq!(
        outcome.reconciliation,
        ReconcileOutcome::Accepted {
            mob_id: MobId::from("62001"),
            kill_time: at(T0),
        }
    );

    let status = status_of(&service, "62001").await;
    assert_eq!(status.current_kill_time, Some(at(T0)));
    assert_eq!(status.prev_kill_time, None);
    assert_eq!(status.current_kill_memo, format!("kill at {T0}"));
    assert_eq!(status.history.len(), 1);

    let stored = stored_report(&service, outcome.report_id).await;
    assert!(stored.is_processed);
    assert!(stored.averaging_eligible);
    assert!(stored.skip_reason.is_none());
    assert!(stored.processed_at.is_some());
}

#[tokio::test]
async fn stale_and_early_reports_are_rejected() {
    let service = service();
    assert!(matches!(submit(&service, "62001", T0).await, ReconcileOutcome::Accepted { .. }));

    assert_eq!(
        submit(&service, "62001", T0 - 1).await,
        ReconcileOutcome::Rejected {
            reason: SkipReason::TooOldOrDuplicate
        }
    );
    assert_eq!(
        submit(&service, "62001", T0).await,
        ReconcileOutcome::Rejected {
            reason: SkipReason::TooOldOrDuplicate
        }
    );
    assert_eq!(
        submit(&service, "62001", T0 + REPOP - 301).await,
        ReconcileOutcome::Rejected {
            reason: SkipReason::TooEarly
        }
    );

    // Rejections leave the status untouched.
    let status = status_of(&service, "62001").await;
    assert_eq!(status.current_kill_time, Some(at(T0)));
    assert_eq!(status.history.len(), 1);

    assert!(matches!(
        submit(&service, "62001", T0 + REPOP - 299).await,
        ReconcileOutcome::Accepted { .. }
    ));
    let status = status_of(&service, "62001").await;
    assert_eq!(status.current_kill_time, Some(at(T0 + REPOP - 299)));
    assert_eq!(status.prev_kill_time, Some(at(T0)));
    assert_eq!(status.prev_kill_memo, format!("kill at {T0}"));
}

#[tokio::test]
async fn rejected_report_is_marked_processed() {
    let service = service();
    submit(&service, "41001", T0).await;
    let outcome = service.submit(report("41001", T0 - 10)).await.unwrap();

    let stored = stored_report(&service, outcome.report_id).await;
    assert!(stored.is_processed);
    assert!(!stored.averaging_eligible);
    assert_eq!(stored.skip_reason, Some(SkipReason::TooOldOrDuplicate));
}

#[tokio::test]
async fn reconciling_twice_is_a_no_op() {
    let service = service();
    let outcome = service.submit(report("62001", T0)).await.unwrap();
    let again = service.reconcile(outcome.report_id).await.unwrap();
    assert_eq!(again, ReconcileOutcome::AlreadyProcessed);
    assert_eq!(status_of(&service, "62001").await.history.len(), 1);
}

#[tokio::test]
async fn missing_report_is_an_error() {
    let service = service();
    let result = service.reconcile(hunt_types::ReportId::new()).await;
    assert!(matches!(result, Err(ReportError::ReportNotFound(_))));
}

#[tokio::test]
async fn future_kill_time_is_refused_before_storing() {
    let service = service();
    let mut far_future = report("62001", T0);
    far_future.kill_time = DateTime::<Utc>::MAX_UTC - TimeDelta::days(1);
    let result = service.submit(far_future).await;
    assert!(matches!(result, Err(ReportError::InvalidReport(_))));

    let mut next_year = report("62001", T0);
    next_year.kill_time = Utc::now() + TimeDelta::days(365);
    let result = service.submit(next_year).await;
    assert!(matches!(result, Err(ReportError::InvalidReport(_))));

    let stored = service
        .reports_in_range(&MobId::from("62001"), None, None)
        .await
        .unwrap();
    assert!(stored.is_empty());
    assert!(matches!(submit(&service, "62001", T0).await, ReconcileOutcome::Accepted { .. }));
}

/// Store a report directly, skipping submission checks.
async fn store_unchecked(
    service: &ReportService<MemoryStore>,
    mob: &str,
    kill: DateTime<Utc>,
) -> hunt_types::ReportId {
    let report = Report {
        id: hunt_types::ReportId::new(),
        mob_id: MobId::from(mob),
        kill_time: kill,
        reporter_uid: String::from("anon-1"),
        memo: String::new(),
        repop_seconds: 172_800,
        created_at: at(T0),
        is_processed: false,
        skip_reason: None,
        averaging_eligible: false,
        processed_at: None,
    };
    service
        .store()
        .create(Collection::Reports, &report.id.to_string(), &report)
        .await
        .unwrap();
    report.id
}

#[tokio::test]
async fn kill_near_end_of_time_reconciles_without_overflow() {
    let service = service();
    let end = DateTime::<Utc>::MAX_UTC;

    let first = store_unchecked(&service, "62001", end - TimeDelta::days(1)).await;
    assert!(matches!(
        service.reconcile(first).await.unwrap(),
        ReconcileOutcome::Accepted { .. }
    ));
    let location: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "62001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(location.expires_at, None);

    // The prior kill's repop runs past the end of time.
    let later = store_unchecked(&service, "62001", end - TimeDelta::hours(1)).await;
    assert_eq!(
        service.reconcile(later).await.unwrap(),
        ReconcileOutcome::Rejected {
            reason: SkipReason::TooEarly
        }
    );
    assert_eq!(
        submit(&service, "62001", T0).await,
        ReconcileOutcome::Rejected {
            reason: SkipReason::TooOldOrDuplicate
        }
    );
}

#[tokio::test]
async fn unknown_bucket_is_rejected() {
    let service = service();
    let mut unknown = report("69999", T0);
    unknown.repop_seconds = Some(60);
    let outcome = service.submit(unknown).await.unwrap();
    assert_eq!(
        outcome.reconciliation,
        ReconcileOutcome::Rejected {
            reason: SkipReason::UnknownMob
        }
    );
    assert!(stored_report(&service, outcome.report_id).await.is_processed);
}

#[tokio::test]
async fn history_is_bounded_newest_first() {
    let service = service();
    for n in 0..7 {
        let kill = T0 + n * REPOP * 2;
        assert!(matches!(submit(&service, "62001", kill).await, ReconcileOutcome::Accepted { .. }));
    }

    let status = status_of(&service, "62001").await;
    assert_eq!(status.history.len(), 5);
    assert_eq!(status.history[0].kill_time, at(T0 + 6 * REPOP * 2));
    assert_eq!(status.history[4].kill_time, at(T0 + 2 * REPOP * 2));
    assert!(status.history.windows(2).all(|w| w[0].kill_time > w[1].kill_time));

    // Every replaced record is archived.
    let log = service.status_log(&MobId::from("62001")).await.unwrap();
    assert_eq!(log.len(), 6);
    assert_eq!(log[0].record.current_kill_time, Some(at(T0)));
}

#[tokio::test]
async fn accepted_kill_sets_location_expiry() {
    let service = service();
    submit(&service, "41001", T0).await;
    submit(&service, "62001", T0).await;
    submit(&service, "53001", T0).await;

    let a_rank: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "41001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a_rank.last_kill_time, Some(at(T0)));
    assert_eq!(a_rank.expires_at, Some(at(T0) + TimeDelta::days(1)));

    let s_rank: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "62001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(s_rank.expires_at, Some(at(T0) + TimeDelta::days(7)));

    let f_rank: Option<MobLocationState> = service
        .store()
        .get(Collection::MobLocations, "53001")
        .await
        .unwrap();
    assert!(f_rank.is_none());
}

#[tokio::test]
async fn new_kill_archives_points_without_clearing_them() {
    let service = service();
    let mob = MobId::from("62001");
    submit(&service, "62001", T0).await;
    service
        .toggle_point(&mob, "p1", SuppressionAction::Suppress, at(T0 + 60))
        .await
        .unwrap();

    submit(&service, "62001", T0 + REPOP).await;

    let archived = service.location_log(&mob).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].points.contains_key("p1"));

    let state: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "62001")
        .await
        .unwrap()
        .unwrap();
    assert!(state.points.contains_key("p1"));
    assert_eq!(state.last_kill_time, Some(at(T0 + REPOP)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_accept_exactly_one() {
    let service = service_with(ReportPolicy {
        max_attempts: 32,
        ..ReportPolicy::default()
    });

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move {
                let mut new = report("62001", T0);
                new.reporter_uid = format!("anon-{n}");
                service.submit(new).await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap().reconciliation {
            ReconcileOutcome::Accepted { .. } => accepted += 1,
            ReconcileOutcome::Rejected {
                reason: SkipReason::TooOldOrDuplicate,
            } => duplicates += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(status_of(&service, "62001").await.history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mobs_in_one_bucket_both_land() {
    let service = service_with(ReportPolicy {
        max_attempts: 32,
        ..ReportPolicy::default()
    });

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.submit(report("62001", T0)).await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.submit(report("62002", T0)).await })
    };
    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());

    assert_eq!(status_of(&service, "62001").await.current_kill_time, Some(at(T0)));
    assert_eq!(status_of(&service, "62002").await.current_kill_time, Some(at(T0)));
}

// =============================================================================
// Revert
// =============================================================================

#[tokio::test]
async fn revert_restores_previous_then_fails() {
    let service = service();
    let mob = MobId::from("62001");
    submit(&service, "62001", T0).await;
    submit(&service, "62001", T0 + REPOP).await;

    let first = service.revert(&mob, RevertTarget::Previous).await.unwrap();
    assert_eq!(
        first,
        RevertOutcome::Reverted {
            mob_id: mob.clone(),
            kill_time: at(T0),
        }
    );
    let status = status_of(&service, "62001").await;
    assert_eq!(status.current_kill_time, Some(at(T0)));
    assert_eq!(status.prev_kill_time, None);
    assert!(status.is_reverted);
    assert_eq!(status.history.len(), 2);

    let second = service.revert(&mob, RevertTarget::Previous).await.unwrap();
    assert_eq!(second, RevertOutcome::NothingToRevert);
}

#[tokio::test]
async fn revert_moves_location_record_back_to_restored_kill() {
    let service = service();
    let mob = MobId::from("41001");
    submit(&service, "41001", T0).await;
    submit(&service, "41001", T0 + REPOP).await;

    let outcome = service.revert(&mob, RevertTarget::Previous).await.unwrap();
    assert!(matches!(outcome, RevertOutcome::Reverted { .. }));

    let location: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "41001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(location.last_kill_time, Some(at(T0)));
    assert_eq!(location.expires_at, Some(at(T0) + TimeDelta::days(1)));
}

#[tokio::test]
async fn revert_of_unreported_mob_has_nothing_to_restore() {
    let service = service();
    let outcome = service
        .revert(&MobId::from("62002"), RevertTarget::Previous)
        .await
        .unwrap();
    assert_eq!(outcome, RevertOutcome::NothingToRevert);
}

#[tokio::test]
async fn deeper_revert_is_unsupported() {
    let service = service();
    submit(&service, "62001", T0).await;
    let outcome = service
        .revert(&MobId::from("62001"), RevertTarget::History(3))
        .await
        .unwrap();
    assert_eq!(outcome, RevertOutcome::Unsupported);
}

#[tokio::test]
async fn new_report_after_revert_clears_flag() {
    let service = service();
    let mob = MobId::from("41001");
    submit(&service, "41001", T0).await;
    submit(&service, "41001", T0 + REPOP).await;
    service.revert(&mob, RevertTarget::Previous).await.unwrap();

    assert!(matches!(
        submit(&service, "41001", T0 + 2 * REPOP).await,
        ReconcileOutcome::Accepted { .. }
    ));
    let status = status_of(&service, "41001").await;
    assert!(!status.is_reverted);
    assert_eq!(status.prev_kill_time, Some(at(T0)));
}

// =============================================================================
// Suppression
// =============================================================================

#[tokio::test]
async fn toggle_and_reset_points() {
    let service = service();
    let mob = MobId::from("62001");

    let applied = service
        .toggle_point(&mob, "p1", SuppressionAction::Suppress, at(T0))
        .await
        .unwrap();
    assert_eq!(
        applied,
        ToggleOutcome::Applied {
            point_id: String::from("p1"),
            action: SuppressionAction::Suppress,
            marked_at: at(T0),
        }
    );
    service
        .toggle_point(&mob, "p2", SuppressionAction::Unsuppress, at(T0))
        .await
        .unwrap();

    let reset = service.reset_points(&mob).await.unwrap();
    assert_eq!(reset, ResetOutcome::Reset { cleared: 2 });

    let state: MobLocationState = service
        .store()
        .get(Collection::MobLocations, "62001")
        .await
        .unwrap()
        .unwrap();
    assert!(state.points.is_empty());
}

#[tokio::test]
async fn reset_without_record_succeeds() {
    let service = service();
    let reset = service.reset_points(&MobId::from("41001")).await.unwrap();
    assert_eq!(reset, ResetOutcome::Reset { cleared: 0 });
}

#[tokio::test]
async fn invalid_toggles_are_rejected_without_writes() {
    let service = service();
    let outcome = service
        .toggle_point(&MobId::from("53001"), "p1", SuppressionAction::Suppress, at(T0))
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::NotTracked);

    let outcome = service
        .toggle_point(&MobId::from("41001"), "nope", SuppressionAction::Suppress, at(T0))
        .await
        .unwrap();
    assert_eq!(outcome, ToggleOutcome::UnknownPoint);

    let state: Option<MobLocationState> = service
        .store()
        .get(Collection::MobLocations, "41001")
        .await
        .unwrap();
    assert!(state.is_none());
}

// =============================================================================
// Memos and queries
// =============================================================================

#[tokio::test]
async fn memos_list_newest_first() {
    let service = service();
    let mob = MobId::from("62001");
    service.add_memo(&mob, "first note").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service.add_memo(&mob, "second note").await.unwrap();

    let memos = service.memos(&mob).await.unwrap();
    let texts: Vec<&str> = memos.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["second note", "first note"]);
}

#[tokio::test]
async fn memo_validation() {
    let service = service();
    assert!(matches!(
        service.add_memo(&MobId::from("62999"), "hi").await,
        Err(ReportError::UnknownMob(_))
    ));
    assert!(matches!(
        service.add_memo(&MobId::from("62001"), &"x".repeat(201)).await,
        Err(ReportError::InvalidMemo(_))
    ));
}

#[tokio::test]
async fn reports_are_queryable_by_range() {
    let service = service();
    let mob = MobId::from("62001");
    for n in 0..4 {
        submit(&service, "62001", T0 + n * REPOP * 2).await;
    }
    submit(&service, "41001", T0).await;

    let all = service.reports_in_range(&mob, None, None).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|r| r.mob_id == mob));

    let window = service
        .reports_in_range(&mob, Some(at(T0 + REPOP)), Some(at(T0 + 4 * REPOP)))
        .await
        .unwrap();
    let kills: Vec<DateTime<Utc>> = window.iter().map(|r| r.kill_time).collect();
    assert_eq!(kills, vec![at(T0 + 2 * REPOP)]);
}
