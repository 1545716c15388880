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

//! Runtime configuration for the [`Reconciler`](crate::reconciler::Reconciler).

use std::time::Duration;

/// Shortest poll interval the builder accepts; a zero period cannot drive a ticker.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the reconciler
///
/// # Construction
///
/// ```rust,ignore
/// let config = ReconcilerConfig::builder()
///     .max_concurrent_requests(8)
///     .poll_interval(Duration::from_secs(30))
///     .build();
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ReconcilerConfig {
    max_concurrent_requests: usize,
    poll_interval: Duration,
    notifications_enabled: bool,
}

impl ReconcilerConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> ReconcilerConfigBuilder {
        ReconcilerConfigBuilder::default()
    }

    /// How many job requests a pass reconciles at once.
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    /// Delay between passes when running under [`watch`](crate::reconciler::Reconciler::watch).
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether completed jobs are handed to the notifier at all.
    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfigBuilder::default().build()
    }
}

/// Builder for [`ReconcilerConfig`].
#[derive(Debug, Clone)]
pub struct ReconcilerConfigBuilder {
    config: ReconcilerConfig,
}

impl Default for ReconcilerConfigBuilder {
    fn default() -> Self {
        Self {
            config: ReconcilerConfig {
                max_concurrent_requests: 4,
                poll_interval: Duration::from_secs(60),
                notifications_enabled: true,
            },
        }
    }
}

impl ReconcilerConfigBuilder {
    /// Sets the request concurrency. Values below one are raised to one.
    pub fn max_concurrent_requests(mut self, value: usize) -> Self {
        self.config.max_concurrent_requests = value.max(1);
        self
    }

    /// Sets the watch-mode poll interval. Values below [`MIN_POLL_INTERVAL`]
    /// are raised to it.
    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.config.poll_interval = value.max(MIN_POLL_INTERVAL);
        self
    }

    /// Enables or disables completion notifications.
    pub fn notifications_enabled(mut self, value: bool) -> Self {
        self.config.notifications_enabled = value;
        self
    }

    pub fn build(self) -> ReconcilerConfig {
        self.config
    }
}
