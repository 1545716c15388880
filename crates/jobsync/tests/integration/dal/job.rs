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

use chrono::{Duration, Utc};
use jobsync::{JobRequestStatus, JobStatus};
use serde_json::json;

use crate::fixtures::{at, record, TestDb};

#[tokio::test]
async fn test_upsert_creates_with_reported_created_at() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;

    let upserted = db
        .dal
        .job()
        .upsert(&record("j1", "jr1", "pending").with_created_at(at(3, 15)))
        .await
        .unwrap();

    assert!(upserted.created);
    assert_eq!(upserted.previous_status, None);
    assert_eq!(upserted.job.created_at, at(3, 15));
    assert_eq!(upserted.job.job_request_id, "jr1");
    assert_eq!(upserted.job.status, JobStatus::Pending);
    assert_eq!(upserted.job.metrics, json!({}));
}

#[tokio::test]
async fn test_upsert_overwrites_mutable_fields() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Running, false).await;

    db.dal
        .job()
        .upsert(
            &record("j1", "jr1", "running")
                .with_status_code("started", "Job running")
                .with_started_at(at(9, 5))
                .with_metrics(json!({"cpu_peak": 10})),
        )
        .await
        .unwrap();

    let second = record("j1", "jr1", "succeeded")
        .with_created_at(at(12, 0))
        .with_run_command("cohortextractor:v2 generate_cohort")
        .with_status_code("succeeded", "Completed successfully")
        .with_completed_at(at(9, 30))
        .with_metrics(json!({"cpu_peak": 99}));
    let upserted = db.dal.job().upsert(&second).await.unwrap();

    assert!(!upserted.created);
    assert_eq!(upserted.previous_status, Some(JobStatus::Running));
    assert!(upserted.newly_completed());

    let job = upserted.job;
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.status_code, "succeeded");
    assert_eq!(job.status_message, "Completed successfully");
    assert_eq!(job.run_command, "cohortextractor:v2 generate_cohort");
    assert_eq!(job.completed_at, Some(at(9, 30)));
    // The latest record had no start time, and the latest record wins.
    assert_eq!(job.started_at, None);
    assert_eq!(job.metrics, json!({"cpu_peak": 99}));
    // Creation time and owner are fixed at creation.
    assert_eq!(job.created_at, at(9, 0));
    assert_eq!(job.job_request_id, "jr1");

    assert_eq!(db.jobs_for("jr1").await.len(), 1);
}

#[tokio::test]
async fn test_upsert_keeps_unknown_status_verbatim() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Running, false).await;

    db.dal
        .job()
        .upsert(&record("j1", "jr1", "cancelled_by_admin"))
        .await
        .unwrap();

    let job = db.job("j1").await.unwrap();
    assert_eq!(job.status, JobStatus::Other("cancelled_by_admin".to_string()));
}

#[tokio::test]
async fn test_list_for_request_orders_by_creation() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Running, false).await;
    db.create_request("jr2", JobRequestStatus::Running, false).await;

    for (id, minute) in [("late", 40), ("early", 10), ("middle", 20)] {
        db.dal
            .job()
            .upsert(&record(id, "jr1", "running").with_created_at(at(9, minute)))
            .await
            .unwrap();
    }
    db.dal.job().upsert(&record("other", "jr2", "running")).await.unwrap();

    let jobs: Vec<String> = db
        .jobs_for("jr1")
        .await
        .into_iter()
        .map(|job| job.identifier)
        .collect();
    assert_eq!(jobs, vec!["early", "middle", "late"]);
}

#[tokio::test]
async fn test_list_stale_reports_unfinished_jobs_only() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Running, false).await;
    let now = Utc::now();
    let two_hours_ago = now - Duration::hours(2);

    let mut old_running = record("old_running", "jr1", "running");
    old_running.updated_at = Some(two_hours_ago);
    let mut old_done = record("old_done", "jr1", "succeeded");
    old_done.updated_at = Some(two_hours_ago);
    let mut fresh = record("fresh", "jr1", "pending");
    fresh.updated_at = Some(now);

    for r in [&old_running, &old_done, &fresh] {
        db.dal.job().upsert(r).await.unwrap();
    }

    let stale = db
        .dal
        .job()
        .list_stale(now - Duration::hours(1))
        .await
        .unwrap();
    let stale_ids: Vec<&str> = stale.iter().map(|j| j.identifier.as_str()).collect();
    assert_eq!(stale_ids, vec!["old_running"]);
}
