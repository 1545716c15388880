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

//! A job request followed through its whole life across four polls.

use jobsync::{JobRequestStatus, JobStatus};

use crate::fixtures::{at, ids, reconciler, record, response, RecordingNotifier, ScriptedController, TestDb};

#[tokio::test]
async fn test_four_poll_lifecycle() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, true).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler(&db, &controller, &notifier);
    let rap_ids = ids(&["jr1"]);

    // Poll 1: the controller has started the job.
    controller.push(response(vec![
        record("j1", "jr1", "running").with_started_at(at(9, 1))
    ]));
    let outcome = reconciler.run_pass(&rap_ids).await.unwrap();
    assert_eq!(outcome.created_jobs, ids(&["j1"]));
    assert_eq!(db.job("j1").await.unwrap().status, JobStatus::Running);
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Running
    );
    assert!(notifier.notified_jobs().is_empty());

    // Poll 2: it finished.
    let finished = record("j1", "jr1", "succeeded")
        .with_started_at(at(9, 1))
        .with_completed_at(at(9, 45));
    controller.push(response(vec![finished.clone()]));
    let outcome = reconciler.run_pass(&rap_ids).await.unwrap();
    assert_eq!(
        outcome.status_changes.get("jr1"),
        Some(&JobRequestStatus::Succeeded)
    );
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Succeeded
    );
    assert_eq!(notifier.notified_jobs(), ids(&["j1"]));
    assert_eq!(db.job("j1").await.unwrap().completed_at, Some(at(9, 45)));

    // Poll 3: the same answer again.
    controller.push(response(vec![finished]));
    let outcome = reconciler.run_pass(&rap_ids).await.unwrap();
    assert!(outcome.notified_jobs.is_empty());
    assert!(outcome.status_changes.is_empty());
    assert_eq!(notifier.notified_jobs(), ids(&["j1"]));
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Succeeded
    );

    // Poll 4: stale data claims the job is running again.
    controller.push(response(vec![
        record("j1", "jr1", "running").with_started_at(at(9, 1))
    ]));
    let outcome = reconciler.run_pass(&rap_ids).await.unwrap();
    assert!(outcome.status_changes.is_empty());
    assert_eq!(db.job("j1").await.unwrap().status, JobStatus::Running);
    assert_eq!(
        db.request("jr1").await.cached_status,
        JobRequestStatus::Succeeded
    );
    assert_eq!(notifier.notified_jobs(), ids(&["j1"]));

    // The request has left the active set for good.
    assert!(db
        .dal
        .job_request()
        .list_active_identifiers()
        .await
        .unwrap()
        .is_empty());
}
