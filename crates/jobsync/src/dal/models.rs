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

//! SQLite row models
//!
//! Diesel model definitions that use SQLite-compatible types: timestamps as
//! TEXT (RFC3339 strings), booleans as INTEGER (0/1) and metrics as JSON TEXT.
//! These are converted to/from domain types at the DAL boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;

use crate::database::schema::{job_requests, jobs};
use crate::error::StoreError;
use crate::models::job::Job;
use crate::models::job_request::JobRequest;
use crate::models::status::JobStatus;
use crate::models::timestamp::parse_timestamp;

// ============================================================================
// Job Request Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = job_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteJobRequest {
    pub identifier: String,
    pub cached_status: String,
    pub status_message: Option<String>,
    pub will_notify: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = job_requests)]
pub struct NewSqliteJobRequest {
    pub identifier: String,
    pub cached_status: String,
    pub status_message: Option<String>,
    pub will_notify: i32,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// Job Models
// ============================================================================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteJob {
    pub identifier: String,
    pub job_request_id: String,
    pub action: String,
    pub run_command: String,
    pub status: String,
    pub status_code: String,
    pub status_message: String,
    pub metrics: String,
    pub created_at: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewSqliteJob {
    pub identifier: String,
    pub job_request_id: String,
    pub action: String,
    pub run_command: String,
    pub status: String,
    pub status_code: String,
    pub status_message: String,
    pub metrics: String,
    pub created_at: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// The fields a poll overwrites on an existing job. `None` clears the column.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = jobs)]
#[diesel(treat_none_as_null = true)]
pub struct SqliteJobChanges {
    pub run_command: String,
    pub status: String,
    pub status_code: String,
    pub status_message: String,
    pub metrics: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Formats a timestamp for TEXT storage.
///
/// A fixed precision and a `Z` suffix keep stored values lexically ordered,
/// so range filters and `ORDER BY` can compare the strings directly.
pub fn timestamp_to_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn text_to_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    parse_timestamp(value).map_err(|e| StoreError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn optional_text_to_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    value.as_deref().map(text_to_timestamp).transpose()
}

impl TryFrom<SqliteJobRequest> for JobRequest {
    type Error = StoreError;

    fn try_from(row: SqliteJobRequest) -> Result<Self, Self::Error> {
        Ok(JobRequest {
            cached_status: row.cached_status.parse()?,
            created_at: text_to_timestamp(&row.created_at)?,
            updated_at: text_to_timestamp(&row.updated_at)?,
            identifier: row.identifier,
            status_message: row.status_message,
            will_notify: row.will_notify != 0,
        })
    }
}

impl TryFrom<SqliteJob> for Job {
    type Error = StoreError;

    fn try_from(row: SqliteJob) -> Result<Self, Self::Error> {
        Ok(Job {
            metrics: serde_json::from_str(&row.metrics)?,
            created_at: text_to_timestamp(&row.created_at)?,
            updated_at: text_to_timestamp(&row.updated_at)?,
            started_at: optional_text_to_timestamp(row.started_at)?,
            completed_at: optional_text_to_timestamp(row.completed_at)?,
            status: JobStatus::from(row.status),
            identifier: row.identifier,
            job_request_id: row.job_request_id,
            action: row.action,
            run_command: row.run_command,
            status_code: row.status_code,
            status_message: row.status_message,
        })
    }
}
