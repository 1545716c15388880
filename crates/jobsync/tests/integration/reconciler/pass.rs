/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Single-pass behaviour: upserts, aggregation, lock-in and the handling of
//! identifiers one side or the other does not know.

use jobsync::reconciler::UNKNOWN_ERROR_CREATING_JOBS_MESSAGE;
use jobsync::{JobRequestStatus, JobStatus, ReconcileError, StatusClientError, StatusResponse};
use serde_json::json;
use tracing_test::traced_test;

use crate::fixtures::{at, ids, reconciler, record, response, RecordingNotifier, ScriptedController, TestDb};

#[tokio::test]
async fn test_new_job_is_created_once() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![record("j1", "jr1", "pending")]));
    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();

    assert_eq!(outcome.created_jobs, ids(&["j1"]));
    assert!(outcome.updated_jobs.is_empty());
    assert_eq!(db.jobs_for("jr1").await.len(), 1);
    assert_eq!(controller.calls(), vec![ids(&["jr1"])]);
}

#[tokio::test]
async fn test_same_response_twice_is_idempotent() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, true).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    let poll = response(vec![
        record("j1", "jr1", "succeeded").with_completed_at(at(10, 0)),
        record("j2", "jr1", "running").with_metrics(json!({"cpu_peak": 50})),
    ]);
    controller.push(poll.clone());
    controller.push(poll);

    let first = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    let jobs_after_first = db.jobs_for("jr1").await;
    let request_after_first = db.request("jr1").await;

    let second = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    let jobs_after_second = db.jobs_for("jr1").await;
    let request_after_second = db.request("jr1").await;

    assert_eq!(first.created_jobs, ids(&["j1", "j2"]));
    assert_eq!(
        first.status_changes.get("jr1"),
        Some(&JobRequestStatus::Running)
    );
    assert_eq!(first.notified_jobs, ids(&["j1"]));

    assert!(second.created_jobs.is_empty());
    assert_eq!(second.updated_jobs, ids(&["j1", "j2"]));
    assert!(second.status_changes.is_empty());
    assert!(second.notified_jobs.is_empty());

    assert_eq!(jobs_after_first.len(), 2);
    assert_eq!(request_after_first.cached_status, request_after_second.cached_status);
    let strip = |jobs: Vec<jobsync::Job>| -> Vec<(String, JobStatus, serde_json::Value)> {
        jobs.into_iter()
            .map(|j| (j.identifier, j.status, j.metrics))
            .collect()
    };
    assert_eq!(strip(jobs_after_first), strip(jobs_after_second));
    assert_eq!(notifier.notified_jobs(), ids(&["j1"]));
}

#[tokio::test]
async fn test_terminal_status_is_locked_in() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![
        record("j1", "jr1", "succeeded"),
        record("j2", "jr1", "succeeded"),
    ]));
    controller.push(response(vec![
        record("j1", "jr1", "running"),
        record("j2", "jr1", "succeeded"),
    ]));

    reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Succeeded
    );

    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    assert!(outcome.status_changes.is_empty());
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Succeeded
    );
    assert_eq!(db.job("j1").await.unwrap().status, JobStatus::Running);
}

#[tokio::test]
async fn test_aggregate_written_through_store() {
    let db = TestDb::new().await;
    db.create_request("mixed", JobRequestStatus::Pending, false).await;
    db.create_request("broken", JobRequestStatus::Running, false).await;
    db.create_request("odd", JobRequestStatus::Running, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![
        record("m1", "mixed", "pending"),
        record("m2", "mixed", "pending"),
        record("m3", "mixed", "failed"),
        record("b1", "broken", "failed"),
        record("b2", "broken", "succeeded"),
        record("o1", "odd", "foo"),
        record("o2", "odd", "bar"),
    ]));

    let outcome = reconciler
        .run_pass(&ids(&["mixed", "broken", "odd"]))
        .await
        .unwrap();

    assert_eq!(
        db.request("mixed").await.cached_status,
        JobRequestStatus::Running
    );
    assert_eq!(
        db.request("broken").await.cached_status,
        JobRequestStatus::Failed
    );
    assert_eq!(
        db.request("odd").await.cached_status,
        JobRequestStatus::Unknown
    );
    assert_eq!(outcome.status_changes.len(), 3);
    assert!(outcome.failed_rap_ids.is_empty());
}

#[tokio::test]
async fn test_request_without_jobs_keeps_cached_status() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::UnknownErrorCreatingJobs, false)
        .await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();

    assert!(outcome.is_quiet());
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::UnknownErrorCreatingJobs
    );
}

#[traced_test]
#[tokio::test]
async fn test_missing_jobs_are_reported_not_touched() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Running, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![
        record("j1", "jr1", "running"),
        record("j2", "jr1", "running").with_status_code("started", "Running on backend"),
    ]));
    controller.push(response(vec![record("j1", "jr1", "succeeded")]));

    reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    let before = db.job("j2").await.unwrap();

    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    let after = db.job("j2").await.unwrap();

    assert_eq!(outcome.missing_jobs, ids(&["j2"]));
    assert_eq!(outcome.updated_jobs, ids(&["j1"]));
    assert_eq!(before, after);
    assert_eq!(db.jobs_for("jr1").await.len(), 2);
    // j1 succeeded and j2 is still running as far as we know.
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Running
    );
    assert!(logs_contain("Job missing from controller response"));
}

#[tokio::test]
async fn test_unrecognised_request_with_unconfirmed_jobs_fails() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::UnknownErrorCreatingJobs, true)
        .await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(StatusResponse::new(vec![], ids(&["jr1"])));
    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();

    let request = db.request("jr1").await;
    assert_eq!(request.cached_status, JobRequestStatus::Failed);
    assert_eq!(
        request.status_message.as_deref(),
        Some(UNKNOWN_ERROR_CREATING_JOBS_MESSAGE)
    );
    assert_eq!(outcome.unrecognised_rap_ids, ids(&["jr1"]));
    assert_eq!(outcome.failed_rap_ids, ids(&["jr1"]));
    assert_eq!(
        outcome.status_changes.get("jr1"),
        Some(&JobRequestStatus::Failed)
    );
}

#[traced_test]
#[tokio::test]
async fn test_unrecognised_pending_request_is_left_alone() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(StatusResponse::new(vec![], ids(&["jr1"])));
    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();

    let request = db.request("jr1").await;
    assert_eq!(request.cached_status, JobRequestStatus::Pending);
    assert_eq!(request.status_message, None);
    assert_eq!(outcome.unrecognised_rap_ids, ids(&["jr1"]));
    assert!(outcome.failed_rap_ids.is_empty());
    assert!(outcome.status_changes.is_empty());
    assert!(logs_contain("Controller has no record of RAP id"));
}

#[traced_test]
#[tokio::test]
async fn test_locally_unknown_ids_never_reach_the_controller() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![record("j1", "jr1", "running")]));
    let outcome = reconciler
        .run_pass(&ids(&["ghost", "jr1", "ghost"]))
        .await
        .unwrap();

    assert_eq!(controller.calls(), vec![ids(&["jr1"])]);
    assert_eq!(outcome.unknown_rap_ids, ids(&["ghost"]));
    assert_eq!(outcome.created_jobs, ids(&["j1"]));
    assert!(logs_contain("Job-server does not recognise RAP id"));
}

#[tokio::test]
async fn test_only_unknown_ids_skips_the_controller() {
    let db = TestDb::new().await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    let outcome = reconciler.run_pass(&ids(&["ghost"])).await.unwrap();
    assert_eq!(outcome.unknown_rap_ids, ids(&["ghost"]));
    assert!(controller.calls().is_empty());

    let empty = reconciler.run_pass(&[]).await.unwrap();
    assert!(empty.is_quiet());
    assert!(controller.calls().is_empty());
}

#[tokio::test]
async fn test_records_for_other_requests_are_ignored() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    db.create_request("jr2", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(response(vec![
        record("j1", "jr1", "running"),
        record("stray", "jr2", "running"),
        record("nowhere", "jr404", "running"),
    ]));
    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();

    assert_eq!(outcome.created_jobs, ids(&["j1"]));
    assert!(db.job("stray").await.is_none());
    assert!(db.job("nowhere").await.is_none());
    assert_eq!(
        db.request("jr2").await.cached_status,
        JobRequestStatus::Pending
    );
}

#[tokio::test]
async fn test_controller_failure_aborts_pass() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push_failure(503);
    let err = reconciler.run_pass(&ids(&["jr1"])).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::StatusClient(StatusClientError::Status { status: 503, .. })
    ));
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Pending
    );

    // The next pass starts over and succeeds.
    controller.push(response(vec![record("j1", "jr1", "running")]));
    let outcome = reconciler.run_pass(&ids(&["jr1"])).await.unwrap();
    assert_eq!(outcome.created_jobs, ids(&["j1"]));
}

#[tokio::test]
async fn test_many_requests_reconciled_concurrently() {
    let db = TestDb::new().await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    let mut jobs = Vec::new();
    let mut rap_ids = Vec::new();
    for i in 0..12 {
        let rap_id = format!("jr{:02}", i);
        db.create_request(&rap_id, JobRequestStatus::Pending, false).await;
        jobs.push(record(&format!("j{:02}a", i), &rap_id, "succeeded"));
        jobs.push(record(&format!("j{:02}b", i), &rap_id, "failed"));
        rap_ids.push(rap_id);
    }
    controller.push(response(jobs));

    let outcome = reconciler.run_pass(&rap_ids).await.unwrap();

    assert_eq!(outcome.created_jobs.len(), 24);
    assert_eq!(outcome.status_changes.len(), 12);
    for rap_id in &rap_ids {
        assert_eq!(
            db.request(rap_id).await.cached_status,
            JobRequestStatus::Failed
        );
    }
    let mut sorted = outcome.created_jobs.clone();
    sorted.sort();
    assert_eq!(outcome.created_jobs, sorted);
}

#[traced_test]
#[tokio::test]
async fn test_pass_summary_names_affected_jobs() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    db.create_request("jr2", JobRequestStatus::UnknownErrorCreatingJobs, false)
        .await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);

    controller.push(StatusResponse::new(
        vec![record("fresh_job", "jr1", "running")],
        ids(&["jr2"]),
    ));
    reconciler.run_pass(&ids(&["jr1", "jr2"])).await.unwrap();

    assert!(logs_contain("Reconciliation pass complete"));
    assert!(logs_contain("created_jobs=[\"fresh_job\"]"));
    assert!(logs_contain("unrecognised_rap_ids=[\"jr2\"]"));
    assert!(logs_contain("failed_rap_ids=[\"jr2\"]"));
}
