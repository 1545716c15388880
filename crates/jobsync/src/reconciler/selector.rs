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

//! Active-Set Selector
//!
//! Chooses which job requests a pass polls for.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::StoreError;
use crate::store::JobStore;

/// Picks the job requests a reconciliation pass covers.
#[derive(Clone)]
pub struct ActiveSetSelector {
    store: Arc<dyn JobStore>,
}

impl ActiveSetSelector {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Resolves the identifiers for one pass.
    ///
    /// An explicit list is used as given, minus duplicates, with no status
    /// filtering; a terminal request may be re-polled deliberately. Without
    /// one, every request whose cached status is non-terminal is selected,
    /// whatever its age and whether or not it has jobs yet.
    pub async fn select(&self, explicit: Option<Vec<String>>) -> Result<Vec<String>, StoreError> {
        match explicit {
            Some(identifiers) => {
                let mut seen = HashSet::new();
                let selected: Vec<String> = identifiers
                    .into_iter()
                    .filter(|id| seen.insert(id.clone()))
                    .collect();
                debug!(count = selected.len(), "Using explicit RAP id list");
                Ok(selected)
            }
            None => {
                let selected = self.store.active_job_request_identifiers().await?;
                debug!(count = selected.len(), "Selected active job requests");
                Ok(selected)
            }
        }
    }
}
