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

//! Notifier
//!
//! Delivery of user-facing messages when a job finishes. Delivery mechanics
//! (chat, email) live behind the [`Notifier`] trait; the reconciler only
//! decides when to call it.

use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;
use crate::models::{Job, JobRequest};

/// Sends a message about a job that has just reached a terminal status.
///
/// The reconciler calls this at most once per terminal transition and never
/// retries; an error is logged and counted, nothing more.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_job_completed(
        &self,
        job_request: &JobRequest,
        job: &Job,
    ) -> Result<(), NotifyError>;
}

/// Notifier that records completions as structured log events.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_job_completed(
        &self,
        job_request: &JobRequest,
        job: &Job,
    ) -> Result<(), NotifyError> {
        info!(
            rap_id = %job_request.identifier,
            job_id = %job.identifier,
            action = %job.action,
            status = %job.status,
            status_message = %job.status_message,
            runtime_secs = job.runtime().map(|d| d.num_seconds()),
            "Job completed"
        );
        Ok(())
    }
}
