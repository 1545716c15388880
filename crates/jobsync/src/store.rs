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

//! The narrow storage contract the reconciler depends on.
//!
//! [`DAL`] implements [`JobStore`] on top of SQLite. Tests and alternative
//! deployments can provide their own implementation without touching the
//! engine.

use async_trait::async_trait;

use crate::dal::{UpsertedJob, DAL};
use crate::error::StoreError;
use crate::models::{JobRecord, JobRequestStatus, JobRequestWithJobs};

/// Storage operations consumed by a reconciliation pass.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Loads the named job requests with their jobs attached, in one batch.
    /// Unknown identifiers are omitted from the result.
    async fn fetch_with_jobs(
        &self,
        identifiers: &[String],
    ) -> Result<Vec<JobRequestWithJobs>, StoreError>;

    /// Creates or overwrites the job described by `record`.
    async fn upsert_job(&self, record: &JobRecord) -> Result<UpsertedJob, StoreError>;

    /// Writes `candidate` unless the cached status is already terminal.
    /// Returns whether a row was written.
    async fn conditionally_set_job_request_status(
        &self,
        identifier: &str,
        candidate: JobRequestStatus,
        message: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Identifiers of every job request with a non-terminal cached status.
    async fn active_job_request_identifiers(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl JobStore for DAL {
    async fn fetch_with_jobs(
        &self,
        identifiers: &[String],
    ) -> Result<Vec<JobRequestWithJobs>, StoreError> {
        self.job_request().fetch_with_jobs(identifiers).await
    }

    async fn upsert_job(&self, record: &JobRecord) -> Result<UpsertedJob, StoreError> {
        self.job().upsert(record).await
    }

    async fn conditionally_set_job_request_status(
        &self,
        identifier: &str,
        candidate: JobRequestStatus,
        message: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.job_request()
            .conditionally_set_status(identifier, candidate, message)
            .await
    }

    async fn active_job_request_identifiers(&self) -> Result<Vec<String>, StoreError> {
        self.job_request().list_active_identifiers().await
    }
}
