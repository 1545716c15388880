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

//! Aggregate status computation and the terminal lock-in rule.

use crate::models::status::{JobRequestStatus, JobStatus};

/// Derives a job request status from the statuses of its jobs.
///
/// Rules, first match wins:
///
/// 1. every job has the same status: that status
/// 2. any job is `running`: `running`
/// 3. any job is `pending`: `running`, since the batch is mid-flight
/// 4. any job is `failed`: `failed`
/// 5. otherwise `unknown`
///
/// A shared status the controller invented (outside the known four) maps to
/// `unknown`. Returns `None` for an empty job set; callers keep the cached
/// status in that case.
pub fn aggregate_status<'a, I>(statuses: I) -> Option<JobRequestStatus>
where
    I: IntoIterator<Item = &'a JobStatus>,
{
    let statuses: Vec<&JobStatus> = statuses.into_iter().collect();
    let first = *statuses.first()?;

    if statuses.iter().all(|status| *status == first) {
        return Some(request_status_for(first));
    }
    if statuses.contains(&&JobStatus::Running) || statuses.contains(&&JobStatus::Pending) {
        return Some(JobRequestStatus::Running);
    }
    if statuses.contains(&&JobStatus::Failed) {
        return Some(JobRequestStatus::Failed);
    }
    Some(JobRequestStatus::Unknown)
}

fn request_status_for(status: &JobStatus) -> JobRequestStatus {
    match status {
        JobStatus::Pending => JobRequestStatus::Pending,
        JobStatus::Running => JobRequestStatus::Running,
        JobStatus::Succeeded => JobRequestStatus::Succeeded,
        JobStatus::Failed => JobRequestStatus::Failed,
        JobStatus::Other(_) => JobRequestStatus::Unknown,
    }
}

/// The status to write, if any, when `candidate` is computed for a request
/// whose cached status is `current`.
///
/// Terminal statuses are frozen, and writing the value already held is
/// skipped.
pub fn status_transition(
    current: JobRequestStatus,
    candidate: JobRequestStatus,
) -> Option<JobRequestStatus> {
    if current.is_terminal() || current == candidate {
        None
    } else {
        Some(candidate)
    }
}
