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

//! Job Request Model
//!
//! A job request is a named batch of jobs. Its identifier is generated locally
//! and used as the `rap_id` when querying the controller.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::job::Job;
use super::status::JobRequestStatus;
use crate::reconciler::aggregate::aggregate_status;

/// Length of generated job request identifiers.
const IDENTIFIER_LENGTH: usize = 16;

/// A job request record (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub identifier: String,
    /// Monotonic status; frozen once terminal
    pub cached_status: JobRequestStatus,
    /// Diagnostic attached to the last explicit status transition
    pub status_message: Option<String>,
    /// Whether terminal job transitions should notify the requester
    pub will_notify: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a job request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJobRequest {
    /// Explicit identifier; one is generated when absent
    pub identifier: Option<String>,
    pub will_notify: bool,
    /// Starting status; defaults to `pending`
    pub cached_status: Option<JobRequestStatus>,
}

impl NewJobRequest {
    pub fn new(will_notify: bool) -> Self {
        Self {
            identifier: None,
            will_notify,
            cached_status: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_status(mut self, status: JobRequestStatus) -> Self {
        self.cached_status = Some(status);
        self
    }
}

/// Generates a random lowercase alphanumeric job request identifier.
pub fn generate_identifier() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(IDENTIFIER_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// A job request together with all of its jobs, as loaded in one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequestWithJobs {
    pub job_request: JobRequest,
    pub jobs: Vec<Job>,
}

impl JobRequestWithJobs {
    pub fn identifier(&self) -> &str {
        &self.job_request.identifier
    }

    /// Status derived from the attached jobs, falling back to the cached
    /// status when there are no jobs to derive it from.
    pub fn computed_status(&self) -> JobRequestStatus {
        aggregate_status(self.jobs.iter().map(|job| &job.status))
            .unwrap_or(self.job_request.cached_status)
    }

    /// Earliest start time across the jobs.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.jobs.iter().filter_map(|job| job.started_at).min()
    }

    /// Latest completion time, once every job has completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        if self.jobs.is_empty() || !self.jobs.iter().all(Job::is_completed) {
            return None;
        }
        self.jobs.iter().filter_map(|job| job.completed_at).max()
    }
}
