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

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::ConfigError;
use super::reconciler::ReconcilerConfig;

/// Top-level configuration file layout.
///
/// ```toml
/// [database]
/// url = "sqlite:///var/lib/jobsync/jobsync.db"
///
/// [controller]
/// base_url = "https://jobs.example.org/controller"
/// token = "${JOBSYNC_CONTROLLER_TOKEN}"
/// timeout_secs = 30
///
/// [reconciler]
/// max_concurrent_requests = 4
/// poll_interval_secs = 60
/// notifications_enabled = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSyncConfig {
    pub database: DatabaseConfig,
    pub controller: ControllerConfig,
    pub reconciler: ReconcilerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerSection {
    pub max_concurrent_requests: usize,
    pub poll_interval_secs: u64,
    pub notifications_enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "jobsync.db".to_string(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for ReconcilerSection {
    fn default() -> Self {
        let defaults = ReconcilerConfig::default();
        Self {
            max_concurrent_requests: defaults.max_concurrent_requests(),
            poll_interval_secs: defaults.poll_interval().as_secs(),
            notifications_enabled: defaults.notifications_enabled(),
        }
    }
}

impl ControllerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl JobSyncConfig {
    /// Checks values that would otherwise only fail at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.controller.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "controller.timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.reconciler.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid {
                field: "reconciler.max_concurrent_requests",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.reconciler.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reconciler.poll_interval_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// The `[reconciler]` section as a [`ReconcilerConfig`].
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig::builder()
            .max_concurrent_requests(self.reconciler.max_concurrent_requests)
            .poll_interval(Duration::from_secs(self.reconciler.poll_interval_secs))
            .notifications_enabled(self.reconciler.notifications_enabled)
            .build()
    }
}
