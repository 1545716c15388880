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

//! Job Request DAL
//!
//! Creation, batched fetch-with-jobs, active-set listing and the conditional
//! status write that enforces terminal lock-in.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use tracing::debug;

use super::models::{timestamp_to_text, NewSqliteJobRequest, SqliteJob, SqliteJobRequest};
use super::DAL;
use crate::database::schema::{job_requests, jobs};
use crate::error::StoreError;
use crate::models::job::Job;
use crate::models::job_request::{generate_identifier, JobRequest, JobRequestWithJobs, NewJobRequest};
use crate::models::status::JobRequestStatus;

fn terminal_statuses() -> Vec<&'static str> {
    JobRequestStatus::TERMINAL.iter().map(|s| s.as_str()).collect()
}

fn active_statuses() -> Vec<&'static str> {
    JobRequestStatus::ACTIVE.iter().map(|s| s.as_str()).collect()
}

/// Data access layer for job request operations.
#[derive(Clone)]
pub struct JobRequestDAL<'a> {
    dal: &'a DAL,
}

impl<'a> JobRequestDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates a new job request, generating an identifier when none is given.
    pub async fn create(&self, new_request: NewJobRequest) -> Result<JobRequest, StoreError> {
        let conn = self.dal.database.get_connection().await?;

        let identifier = new_request
            .identifier
            .unwrap_or_else(generate_identifier);
        let now = timestamp_to_text(&Utc::now());
        let row = NewSqliteJobRequest {
            identifier: identifier.clone(),
            cached_status: new_request
                .cached_status
                .unwrap_or(JobRequestStatus::Pending)
                .as_str()
                .to_string(),
            status_message: None,
            will_notify: i32::from(new_request.will_notify),
            created_at: now.clone(),
            updated_at: now,
        };

        // SQLite: insert, then read the row back
        let created: SqliteJobRequest = conn
            .interact(move |conn| {
                diesel::insert_into(job_requests::table)
                    .values(&row)
                    .execute(conn)?;
                job_requests::table
                    .filter(job_requests::identifier.eq(&identifier))
                    .select(SqliteJobRequest::as_select())
                    .first(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        created.try_into()
    }

    /// Retrieves a job request by identifier.
    pub async fn get(&self, identifier: &str) -> Result<Option<JobRequest>, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let identifier = identifier.to_string();

        let row: Option<SqliteJobRequest> = conn
            .interact(move |conn| {
                job_requests::table
                    .filter(job_requests::identifier.eq(&identifier))
                    .select(SqliteJobRequest::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        row.map(JobRequest::try_from).transpose()
    }

    /// Loads the named job requests with their jobs attached.
    ///
    /// Issues exactly two queries regardless of batch size: one for the
    /// requests and one `IN` query for all of their jobs. Identifiers with no
    /// matching row are simply absent from the result, which otherwise keeps
    /// the order of `identifiers`.
    pub async fn fetch_with_jobs(
        &self,
        identifiers: &[String],
    ) -> Result<Vec<JobRequestWithJobs>, StoreError> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.dal.database.get_connection().await?;
        let ids = identifiers.to_vec();

        let (request_rows, job_rows): (Vec<SqliteJobRequest>, Vec<SqliteJob>) = conn
            .interact(move |conn| {
                let requests: Vec<SqliteJobRequest> = job_requests::table
                    .filter(job_requests::identifier.eq_any(&ids))
                    .select(SqliteJobRequest::as_select())
                    .load(conn)?;
                let jobs: Vec<SqliteJob> = jobs::table
                    .filter(jobs::job_request_id.eq_any(&ids))
                    .order((jobs::created_at.asc(), jobs::identifier.asc()))
                    .select(SqliteJob::as_select())
                    .load(conn)?;
                Ok::<_, diesel::result::Error>((requests, jobs))
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        debug!(
            requested = identifiers.len(),
            found = request_rows.len(),
            jobs = job_rows.len(),
            "Fetched job requests with jobs"
        );

        let mut jobs_by_request: HashMap<String, Vec<Job>> = HashMap::new();
        for row in job_rows {
            let job = Job::try_from(row)?;
            jobs_by_request
                .entry(job.job_request_id.clone())
                .or_default()
                .push(job);
        }

        let mut requests_by_id: HashMap<String, JobRequest> = HashMap::new();
        for row in request_rows {
            let request = JobRequest::try_from(row)?;
            requests_by_id.insert(request.identifier.clone(), request);
        }

        let mut result = Vec::with_capacity(requests_by_id.len());
        for identifier in identifiers {
            if let Some(job_request) = requests_by_id.remove(identifier) {
                let jobs = jobs_by_request.remove(identifier).unwrap_or_default();
                result.push(JobRequestWithJobs { job_request, jobs });
            }
        }
        Ok(result)
    }

    /// Identifiers of every job request whose cached status is not terminal,
    /// oldest first.
    pub async fn list_active_identifiers(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.dal.database.get_connection().await?;

        let identifiers: Vec<String> = conn
            .interact(move |conn| {
                job_requests::table
                    .filter(job_requests::cached_status.eq_any(active_statuses()))
                    .order((job_requests::created_at.asc(), job_requests::identifier.asc()))
                    .select(job_requests::identifier)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(identifiers)
    }

    /// Writes `candidate` to the cached status unless the current status is
    /// terminal.
    ///
    /// The check and the write are a single `UPDATE ... WHERE` statement, so
    /// concurrent passes can never regress a terminal status. Returns whether
    /// a row was written. `message` replaces the stored status message when
    /// given and leaves it untouched otherwise.
    pub async fn conditionally_set_status(
        &self,
        identifier: &str,
        candidate: JobRequestStatus,
        message: Option<&str>,
    ) -> Result<bool, StoreError> {
        let conn = self.dal.database.get_connection().await?;
        let identifier = identifier.to_string();
        let message = message.map(str::to_string);
        let now = timestamp_to_text(&Utc::now());

        let updated: usize = conn
            .interact(move |conn| {
                let target = job_requests::table
                    .filter(job_requests::identifier.eq(&identifier))
                    .filter(job_requests::cached_status.ne_all(terminal_statuses()));
                match message {
                    Some(message) => diesel::update(target)
                        .set((
                            job_requests::cached_status.eq(candidate.as_str()),
                            job_requests::status_message.eq(Some(message)),
                            job_requests::updated_at.eq(&now),
                        ))
                        .execute(conn),
                    None => diesel::update(target)
                        .set((
                            job_requests::cached_status.eq(candidate.as_str()),
                            job_requests::updated_at.eq(&now),
                        ))
                        .execute(conn),
                }
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(updated > 0)
    }
}
