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

//! Domain models for jobs and job requests.
//!
//! These are API-level types; the SQLite row structs live in
//! [`crate::dal::models`] and are converted at the DAL boundary.

pub mod job;
pub mod job_request;
pub mod status;
pub mod timestamp;

pub use job::{Job, JobRecord};
pub use job_request::{JobRequest, JobRequestWithJobs, NewJobRequest};
pub use status::{JobRequestStatus, JobStatus};
