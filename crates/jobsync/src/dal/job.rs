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

//! Job DAL
//!
//! Jobs are keyed by their controller-assigned identifier. The only write
//! path is [`JobDAL::upsert`], which creates a job the first time the
//! controller reports it and overwrites its mutable fields afterwards.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::models::{timestamp_to_text, NewSqliteJob, SqliteJob, SqliteJobChanges};
use super::DAL;
use crate::database::schema::jobs;
use crate::error::StoreError;
use crate::models::job::{Job, JobRecord};
use crate::models::status::JobStatus;

/// Result of applying one controller record.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertedJob {
    /// The job as stored after the write
    pub job: Job,
    /// True when the job did not exist before this write
    pub created: bool,
    /// Status held before this write, `None` when newly created
    pub previous_status: Option<JobStatus>,
}

impl UpsertedJob {
    /// True when this write moved the job into a terminal status.
    pub fn newly_completed(&self) -> bool {
        self.job.status.is_terminal()
            && !self
                .previous_status
                .as_ref()
                .is_some_and(JobStatus::is_terminal)
    }
}

/// Data access layer for job operations.
#[derive(Clone)]
pub struct JobDAL<'a> {
    dal: &'a DAL,
}

impl<'a> JobDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates or updates the job described by `record`.
    ///
    /// A new job is attached to `record.rap_id` and keeps the controller's
    /// `created_at`. An existing job has its mutable fields overwritten with
    /// the record's values; its owner and creation time never change. The
    /// previous-status read and the write share one transaction.
    pub async fn upsert(&self, record: &JobRecord) -> Result<UpsertedJob, StoreError> {
        let conn = self.dal.database.get_connection().await?;

        let now = Utc::now();
        let identifier = record.identifier.clone();
        let metrics = serde_json::to_string(&record.metrics)?;
        let updated_at = timestamp_to_text(&record.updated_at.unwrap_or(now));
        let started_at = record.started_at.as_ref().map(timestamp_to_text);
        let completed_at = record.completed_at.as_ref().map(timestamp_to_text);

        let new_row = NewSqliteJob {
            identifier: identifier.clone(),
            job_request_id: record.rap_id.clone(),
            action: record.action.clone(),
            run_command: record.run_command.clone(),
            status: record.status.as_str().to_string(),
            status_code: record.status_code.clone(),
            status_message: record.status_message.clone(),
            metrics: metrics.clone(),
            created_at: timestamp_to_text(&record.created_at.unwrap_or(now)),
            updated_at: updated_at.clone(),
            started_at: started_at.clone(),
            completed_at: completed_at.clone(),
        };
        let changes = SqliteJobChanges {
            run_command: record.run_command.clone(),
            status: record.status.as_str().to_string(),
            status_code: record.status_code.clone(),
            status_message: record.status_message.clone(),
            metrics,
            updated_at,
            started_at,
            completed_at,
        };

        let (row, previous_status): (SqliteJob, Option<String>) = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let previous_status: Option<String> = jobs::table
                        .filter(jobs::identifier.eq(&identifier))
                        .select(jobs::status)
                        .first(conn)
                        .optional()?;

                    if previous_status.is_some() {
                        diesel::update(jobs::table.filter(jobs::identifier.eq(&identifier)))
                            .set(&changes)
                            .execute(conn)?;
                    } else {
                        diesel::insert_into(jobs::table)
                            .values(&new_row)
                            .execute(conn)?;
                    }

                    let row: SqliteJob = jobs::table
                        .filter(jobs::identifier.eq(&identifier))
                        .select(SqliteJob::as_select())
                        .first(conn)?;
                    Ok((row, previous_status))
                })
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(UpsertedJob {
            job: row.try_into()?,
            created: previous_status.is_none(),
            previous_status: previous_status.map(JobStatus::from),
        })
    }

    /// Retrieves a job by identifier.
    pub async fn get(&self, identifier: &str) -> Result<Option<Job>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let identifier = identifier.to_string();

        let row: Option<SqliteJob> = conn
            .interact(move |conn| {
                jobs::table
                    .filter(jobs::identifier.eq(&identifier))
                    .select(SqliteJob::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.map(Job::try_from).transpose()
    }

    /// All jobs of one job request, oldest first.
    pub async fn list_for_request(&self, job_request_id: &str) -> Result<Vec<Job>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let job_request_id = job_request_id.to_string();

        let rows: Vec<SqliteJob> = conn
            .interact(move |conn| {
                jobs::table
                    .filter(jobs::job_request_id.eq(&job_request_id))
                    .order((jobs::created_at.asc(), jobs::identifier.asc()))
                    .select(SqliteJob::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(Job::try_from).collect()
    }

    /// Non-terminal jobs that no poll has refreshed since `cutoff`.
    ///
    /// These are reported for operator follow-up only; nothing here changes
    /// their status.
    pub async fn list_stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let cutoff = timestamp_to_text(&cutoff);

        let rows: Vec<SqliteJob> = conn
            .interact(move |conn| {
                jobs::table
                    .filter(jobs::status.ne_all(vec!["succeeded", "failed"]))
                    .filter(jobs::updated_at.lt(&cutoff))
                    .order((jobs::updated_at.asc(), jobs::identifier.asc()))
                    .select(SqliteJob::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(Job::try_from).collect()
    }
}
