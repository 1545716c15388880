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

//! Status enumerations for jobs and job requests.
//!
//! Job statuses are owned by the controller and may grow new values at any
//! time, so [`JobStatus`] keeps unrecognised values verbatim. Job request
//! statuses are owned locally and form a closed set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Status of a single job as reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// A value the controller sent that this engine does not know about.
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Other(value) => value.as_str(),
        }
    }

    /// Returns true for `succeeded` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl From<&str> for JobStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => JobStatus::Pending,
            "running" => JobStatus::Running,
            "succeeded" => JobStatus::Succeeded,
            "failed" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match JobStatus::from(value.as_str()) {
            JobStatus::Other(_) => JobStatus::Other(value),
            known => known,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The cached, lockable status of a job request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRequestStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
    /// Job creation on the controller was attempted but its outcome was never
    /// confirmed.
    UnknownErrorCreatingJobs,
}

impl JobRequestStatus {
    /// Statuses from which a job request can never move again.
    pub const TERMINAL: [JobRequestStatus; 2] =
        [JobRequestStatus::Succeeded, JobRequestStatus::Failed];

    /// Statuses that keep a job request in the active polling set.
    pub const ACTIVE: [JobRequestStatus; 4] = [
        JobRequestStatus::Pending,
        JobRequestStatus::Running,
        JobRequestStatus::Unknown,
        JobRequestStatus::UnknownErrorCreatingJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobRequestStatus::Pending => "pending",
            JobRequestStatus::Running => "running",
            JobRequestStatus::Succeeded => "succeeded",
            JobRequestStatus::Failed => "failed",
            JobRequestStatus::Unknown => "unknown",
            JobRequestStatus::UnknownErrorCreatingJobs => "unknown_error_creating_jobs",
        }
    }

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

impl FromStr for JobRequestStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobRequestStatus::Pending),
            "running" => Ok(JobRequestStatus::Running),
            "succeeded" => Ok(JobRequestStatus::Succeeded),
            "failed" => Ok(JobRequestStatus::Failed),
            "unknown" => Ok(JobRequestStatus::Unknown),
            "unknown_error_creating_jobs" => Ok(JobRequestStatus::UnknownErrorCreatingJobs),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for JobRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
