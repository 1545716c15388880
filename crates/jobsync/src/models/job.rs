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

//! Job Model
//!
//! A [`Job`] is one unit of work executed by the controller. Jobs are never
//! created locally from scratch: they come into existence the first time the
//! controller reports a [`JobRecord`] for them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::status::JobStatus;
use super::timestamp;

/// A job as stored locally (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Controller-assigned identifier, unique across the store
    pub identifier: String,
    /// Identifier of the owning job request
    pub job_request_id: String,
    pub action: String,
    pub run_command: String,
    pub status: JobStatus,
    pub status_code: String,
    pub status_message: String,
    /// Opaque controller metrics, replaced wholesale on every update
    pub metrics: Value,
    /// Creation time as reported by the controller
    pub created_at: DateTime<Utc>,
    /// Last time a poll refreshed this record
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Wall-clock runtime, when the job has both started and completed.
    pub fn runtime(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) if completed >= started => Some(completed - started),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One job entry of a controller status response.
///
/// Optional fields tolerate both absence and explicit `null`; unknown fields
/// are ignored so that controller-side additions do not break polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub identifier: String,
    pub rap_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub backend: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub run_command: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires_db: bool,
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_message: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default = "empty_metrics", deserialize_with = "metrics_object")]
    pub metrics: Value,
}

impl JobRecord {
    /// Creates a record with every optional field left empty.
    pub fn new(
        identifier: impl Into<String>,
        rap_id: impl Into<String>,
        status: impl Into<JobStatus>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            rap_id: rap_id.into(),
            action: String::new(),
            backend: String::new(),
            run_command: String::new(),
            requires_db: false,
            status: status.into(),
            status_code: String::new(),
            status_message: String::new(),
            created_at: None,
            started_at: None,
            updated_at: None,
            completed_at: None,
            metrics: empty_metrics(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_run_command(mut self, run_command: impl Into<String>) -> Self {
        self.run_command = run_command.into();
        self
    }

    pub fn with_status_code(
        mut self,
        status_code: impl Into<String>,
        status_message: impl Into<String>,
    ) -> Self {
        self.status_code = status_code.into();
        self.status_message = status_message.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    pub fn with_metrics(mut self, metrics: Value) -> Self {
        self.metrics = metrics;
        self
    }
}

fn empty_metrics() -> Value {
    Value::Object(serde_json::Map::new())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn metrics_object<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(empty_metrics()),
        value => Ok(value),
    }
}
