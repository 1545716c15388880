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

//! The structured result of one reconciliation pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{field, Span};

use crate::models::status::JobRequestStatus;

/// What a pass did, accumulated as it runs.
///
/// Assembled entirely from values seen during the pass; producing it never
/// reads the store again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassOutcome {
    /// Jobs created by this pass
    pub created_jobs: Vec<String>,
    /// Existing jobs overwritten by this pass
    pub updated_jobs: Vec<String>,
    /// Local jobs absent from the controller response (left untouched)
    pub missing_jobs: Vec<String>,
    /// Requested RAP ids with no local job request
    pub unknown_rap_ids: Vec<String>,
    /// RAP ids the controller reported it does not know
    pub unrecognised_rap_ids: Vec<String>,
    /// RAP ids moved to `failed` because the controller never saw them
    pub failed_rap_ids: Vec<String>,
    /// Jobs whose completion was notified
    pub notified_jobs: Vec<String>,
    /// New cached status for each job request whose status was written
    pub status_changes: BTreeMap<String, JobRequestStatus>,
    /// Notifications that raised an error
    pub notification_failures: usize,
}

impl PassOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds another partial outcome into this one.
    pub fn merge(&mut self, other: PassOutcome) {
        self.created_jobs.extend(other.created_jobs);
        self.updated_jobs.extend(other.updated_jobs);
        self.missing_jobs.extend(other.missing_jobs);
        self.unknown_rap_ids.extend(other.unknown_rap_ids);
        self.unrecognised_rap_ids.extend(other.unrecognised_rap_ids);
        self.failed_rap_ids.extend(other.failed_rap_ids);
        self.notified_jobs.extend(other.notified_jobs);
        self.status_changes.extend(other.status_changes);
        self.notification_failures += other.notification_failures;
    }

    /// Sorts every identifier list so output does not depend on the order
    /// concurrent work completed in.
    pub fn normalize(&mut self) {
        self.created_jobs.sort();
        self.updated_jobs.sort();
        self.missing_jobs.sort();
        self.unknown_rap_ids.sort();
        self.unrecognised_rap_ids.sort();
        self.failed_rap_ids.sort();
        self.notified_jobs.sort();
    }

    /// True when the pass changed nothing and found nothing worth reporting.
    pub fn is_quiet(&self) -> bool {
        self.created_jobs.is_empty()
            && self.updated_jobs.is_empty()
            && self.missing_jobs.is_empty()
            && self.unknown_rap_ids.is_empty()
            && self.unrecognised_rap_ids.is_empty()
            && self.failed_rap_ids.is_empty()
            && self.notified_jobs.is_empty()
            && self.status_changes.is_empty()
            && self.notification_failures == 0
    }

    /// Writes the per-pass counts and identifier lists onto a span declared
    /// with matching `Empty` fields.
    pub fn record_on(&self, span: &Span) {
        span.record("created", self.created_jobs.len());
        span.record("updated", self.updated_jobs.len());
        span.record("missing", self.missing_jobs.len());
        span.record("unknown", self.unknown_rap_ids.len());
        span.record("unrecognised", self.unrecognised_rap_ids.len());
        span.record("failed", self.failed_rap_ids.len());
        span.record("notified", self.notified_jobs.len());
        span.record("created_jobs", field::debug(&self.created_jobs));
        span.record("updated_jobs", field::debug(&self.updated_jobs));
        span.record("missing_jobs", field::debug(&self.missing_jobs));
        span.record("unrecognised_rap_ids", field::debug(&self.unrecognised_rap_ids));
        span.record("failed_rap_ids", field::debug(&self.failed_rap_ids));
    }
}
