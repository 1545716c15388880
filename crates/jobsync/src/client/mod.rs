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

//! Status Client
//!
//! The controller is reachable only through a polling status API: given a
//! set of RAP identifiers it answers with the job records it holds for them
//! and the identifiers it has never heard of.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StatusClientError;

pub mod http;

pub use crate::models::job::JobRecord;
pub use http::HttpStatusClient;

/// A controller status document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub jobs: Vec<JobRecord>,
    #[serde(default)]
    pub unrecognised_rap_ids: Vec<String>,
}

impl StatusResponse {
    pub fn new(jobs: Vec<JobRecord>, unrecognised_rap_ids: Vec<String>) -> Self {
        Self {
            jobs,
            unrecognised_rap_ids,
        }
    }
}

/// Queries the controller for the authoritative state of job requests.
///
/// Implementations must not retry internally; a failed call fails the whole
/// pass and the next scheduled pass starts over.
#[async_trait]
pub trait StatusClient: Send + Sync {
    async fn fetch_status(&self, rap_ids: &[String]) -> Result<StatusResponse, StatusClientError>;
}
