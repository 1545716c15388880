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

//! # Reconciler
//!
//! Keeps local job requests and jobs in step with the controller. One call
//! to [`Reconciler::run_pass`] is one pass:
//!
//! 1. load the requested job requests with their jobs in one batch, dropping
//!    identifiers with no local row before anything goes over the network
//! 2. ask the [`StatusClient`] about the remaining identifiers
//! 3. per job request, either resolve a controller-unrecognised request or
//!    upsert its job records, recompute the aggregate status and write it
//!    through the lock-in rule
//! 4. notify each newly completed job once, if the request asked for it
//!
//! Job requests are reconciled concurrently; the upserts and the status
//! write of any one request run in order. Every write is idempotent, so a
//! pass that fails partway is simply run again.
//!
//! ```rust,ignore
//! let reconciler = Reconciler::new(store, client, notifier, ReconcilerConfig::default());
//! let outcome = reconciler.run_active_pass().await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};

use crate::client::StatusClient;
use crate::config::ReconcilerConfig;
use crate::error::ReconcileError;
use crate::models::{Job, JobRecord, JobRequestStatus, JobRequestWithJobs};
use crate::notifier::Notifier;
use crate::store::JobStore;

pub mod aggregate;
pub mod outcome;
pub mod selector;

pub use aggregate::{aggregate_status, status_transition};
pub use outcome::PassOutcome;
pub use selector::ActiveSetSelector;

/// Status message stored when a request that never confirmed job creation
/// turns out to be unknown to the controller.
pub const UNKNOWN_ERROR_CREATING_JOBS_MESSAGE: &str = "Unknown error creating jobs";

/// Drives reconciliation passes against a store, a controller and a notifier.
pub struct Reconciler {
    store: Arc<dyn JobStore>,
    client: Arc<dyn StatusClient>,
    notifier: Arc<dyn Notifier>,
    selector: ActiveSetSelector,
    config: ReconcilerConfig,
}

/// One job request's share of a pass, ready to be reconciled.
struct RequestWork {
    with_jobs: JobRequestWithJobs,
    records: Vec<JobRecord>,
    unrecognised: bool,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn JobStore>,
        client: Arc<dyn StatusClient>,
        notifier: Arc<dyn Notifier>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            selector: ActiveSetSelector::new(store.clone()),
            store,
            client,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn selector(&self) -> &ActiveSetSelector {
        &self.selector
    }

    /// Runs one pass over every job request with a non-terminal status.
    pub async fn run_active_pass(&self) -> Result<PassOutcome, ReconcileError> {
        let identifiers = self.selector.select(None).await?;
        self.run_pass(&identifiers).await
    }

    /// Runs one pass over the given job request identifiers.
    ///
    /// Store and controller failures abort the pass and are returned as is;
    /// writes already made stay in place. Notification failures never abort
    /// a pass.
    pub async fn run_pass(&self, identifiers: &[String]) -> Result<PassOutcome, ReconcileError> {
        let span = info_span!(
            "reconcile_pass",
            requested = identifiers.len(),
            created = field::Empty,
            updated = field::Empty,
            missing = field::Empty,
            unknown = field::Empty,
            unrecognised = field::Empty,
            failed = field::Empty,
            notified = field::Empty,
            created_jobs = field::Empty,
            updated_jobs = field::Empty,
            missing_jobs = field::Empty,
            unrecognised_rap_ids = field::Empty,
            failed_rap_ids = field::Empty,
        );

        let result = self.run_pass_inner(identifiers).instrument(span).await;
        metrics::counter!("jobsync_passes_total").increment(1);
        match &result {
            Ok(outcome) => record_metrics(outcome),
            Err(e) => {
                metrics::counter!("jobsync_pass_failures_total").increment(1);
                error!(error = %e, "Reconciliation pass failed");
            }
        }
        result
    }

    async fn run_pass_inner(&self, identifiers: &[String]) -> Result<PassOutcome, ReconcileError> {
        let mut outcome = PassOutcome::new();
        if identifiers.is_empty() {
            debug!("No RAP ids to reconcile");
            return Ok(outcome);
        }

        let requests = self.store.fetch_with_jobs(identifiers).await?;
        let known: HashSet<String> = requests
            .iter()
            .map(|request| request.identifier().to_string())
            .collect();

        for rap_id in identifiers {
            if !known.contains(rap_id) && !outcome.unknown_rap_ids.contains(rap_id) {
                warn!(rap_id = %rap_id, "Job-server does not recognise RAP id");
                outcome.unknown_rap_ids.push(rap_id.clone());
            }
        }

        if requests.is_empty() {
            return Ok(self.finish(outcome));
        }

        let rap_ids: Vec<String> = requests
            .iter()
            .map(|request| request.identifier().to_string())
            .collect();
        let response = self.client.fetch_status(&rap_ids).await?;
        debug!(
            jobs = response.jobs.len(),
            unrecognised = response.unrecognised_rap_ids.len(),
            "Received controller status"
        );

        let mut records_by_rap_id: HashMap<String, Vec<JobRecord>> = HashMap::new();
        for record in response.jobs {
            if !known.contains(&record.rap_id) {
                warn!(
                    rap_id = %record.rap_id,
                    job_id = %record.identifier,
                    "Ignoring job record for a RAP id outside this pass"
                );
                continue;
            }
            debug!(
                job_id = %record.identifier,
                backend = %record.backend,
                requires_db = record.requires_db,
                "Job record received"
            );
            records_by_rap_id
                .entry(record.rap_id.clone())
                .or_default()
                .push(record);
        }
        let unrecognised: HashSet<String> = response.unrecognised_rap_ids.into_iter().collect();

        let work: Vec<RequestWork> = requests
            .into_iter()
            .map(|with_jobs| RequestWork {
                records: records_by_rap_id
                    .remove(with_jobs.identifier())
                    .unwrap_or_default(),
                unrecognised: unrecognised.contains(with_jobs.identifier()),
                with_jobs,
            })
            .collect();

        let notified: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
        let partials: Vec<PassOutcome> = stream::iter(
            work.into_iter()
                .map(|item| self.reconcile_request(item, &notified)),
        )
        .buffer_unordered(self.config.max_concurrent_requests())
        .try_collect()
        .await?;

        for partial in partials {
            outcome.merge(partial);
        }
        Ok(self.finish(outcome))
    }

    fn finish(&self, mut outcome: PassOutcome) -> PassOutcome {
        outcome.normalize();
        outcome.record_on(&Span::current());
        info!(
            created = outcome.created_jobs.len(),
            updated = outcome.updated_jobs.len(),
            missing = outcome.missing_jobs.len(),
            unknown = outcome.unknown_rap_ids.len(),
            unrecognised = outcome.unrecognised_rap_ids.len(),
            failed = outcome.failed_rap_ids.len(),
            notified = outcome.notified_jobs.len(),
            status_changes = outcome.status_changes.len(),
            notification_failures = outcome.notification_failures,
            created_jobs = ?outcome.created_jobs,
            updated_jobs = ?outcome.updated_jobs,
            missing_jobs = ?outcome.missing_jobs,
            unrecognised_rap_ids = ?outcome.unrecognised_rap_ids,
            failed_rap_ids = ?outcome.failed_rap_ids,
            "Reconciliation pass complete"
        );
        outcome
    }

    async fn reconcile_request(
        &self,
        work: RequestWork,
        notified: &Mutex<HashSet<String>>,
    ) -> Result<PassOutcome, ReconcileError> {
        let RequestWork {
            with_jobs,
            records,
            unrecognised,
        } = work;
        let JobRequestWithJobs {
            mut job_request,
            jobs,
        } = with_jobs;
        let rap_id = job_request.identifier.clone();
        let mut outcome = PassOutcome::new();

        if unrecognised {
            outcome.unrecognised_rap_ids.push(rap_id.clone());
            if job_request.cached_status == JobRequestStatus::UnknownErrorCreatingJobs {
                let applied = self
                    .store
                    .conditionally_set_job_request_status(
                        &rap_id,
                        JobRequestStatus::Failed,
                        Some(UNKNOWN_ERROR_CREATING_JOBS_MESSAGE),
                    )
                    .await?;
                if applied {
                    warn!(
                        rap_id = %rap_id,
                        "Controller has no record of RAP id whose job creation was never confirmed, marking failed"
                    );
                    outcome.failed_rap_ids.push(rap_id.clone());
                    outcome
                        .status_changes
                        .insert(rap_id, JobRequestStatus::Failed);
                }
            } else {
                warn!(
                    rap_id = %rap_id,
                    cached_status = %job_request.cached_status,
                    "Controller has no record of RAP id"
                );
            }
            return Ok(outcome);
        }

        let mut current: Vec<Job> = jobs;
        let mut touched: HashSet<String> = HashSet::new();
        let mut newly_completed: Vec<Job> = Vec::new();

        for record in &records {
            let upserted = self.store.upsert_job(record).await?;
            let job_id = upserted.job.identifier.clone();

            if touched.insert(job_id.clone()) {
                if upserted.created {
                    outcome.created_jobs.push(job_id.clone());
                } else {
                    outcome.updated_jobs.push(job_id.clone());
                }
            }

            // Notification and aggregation belong to the owning job request.
            if upserted.job.job_request_id != rap_id {
                warn!(
                    rap_id = %rap_id,
                    job_id = %job_id,
                    owner = %upserted.job.job_request_id,
                    "Job reported under a different RAP id than it belongs to"
                );
                continue;
            }

            if upserted.newly_completed() && claim_notification(notified, &job_id) {
                newly_completed.push(upserted.job.clone());
            }
            match current.iter_mut().find(|job| job.identifier == job_id) {
                Some(existing) => *existing = upserted.job,
                None => current.push(upserted.job),
            }
        }

        for job in current.iter().filter(|job| !touched.contains(&job.identifier)) {
            error!(
                rap_id = %rap_id,
                job_id = %job.identifier,
                status = %job.status,
                "Job missing from controller response"
            );
            outcome.missing_jobs.push(job.identifier.clone());
        }

        let previous = job_request.cached_status;
        let candidate = aggregate_status(current.iter().map(|job| &job.status)).unwrap_or(previous);
        match status_transition(previous, candidate) {
            Some(next) => {
                let applied = self
                    .store
                    .conditionally_set_job_request_status(&rap_id, next, None)
                    .await?;
                if applied {
                    info!(
                        rap_id = %rap_id,
                        from = %previous,
                        to = %next,
                        "Job request status changed"
                    );
                    outcome.status_changes.insert(rap_id.clone(), next);
                    job_request.cached_status = next;
                } else {
                    debug!(
                        rap_id = %rap_id,
                        "Job request became terminal concurrently, status write skipped"
                    );
                }
            }
            None if previous.is_terminal() && candidate != previous => {
                debug!(
                    rap_id = %rap_id,
                    cached_status = %previous,
                    computed_status = %candidate,
                    "Job request status is locked"
                );
            }
            None => {}
        }

        if newly_completed.is_empty() {
            return Ok(outcome);
        }
        if !job_request.will_notify || !self.config.notifications_enabled() {
            debug!(
                rap_id = %rap_id,
                completed = newly_completed.len(),
                "Notifications disabled for job request"
            );
            return Ok(outcome);
        }

        for job in &newly_completed {
            match self.notifier.notify_job_completed(&job_request, job).await {
                Ok(()) => outcome.notified_jobs.push(job.identifier.clone()),
                Err(e) => {
                    warn!(
                        rap_id = %rap_id,
                        job_id = %job.identifier,
                        error = %e,
                        "Failed to send job completion notification"
                    );
                    outcome.notification_failures += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Runs [`run_active_pass`](Self::run_active_pass) once per poll interval
    /// until `shutdown` turns true or its sender is dropped.
    ///
    /// The first pass starts immediately. A failed pass is logged and the
    /// loop waits for the next tick; a pass in progress always runs to
    /// completion. Returns the number of passes that completed successfully.
    pub async fn watch(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0u64;

        info!(
            interval_secs = self.config.poll_interval().as_secs(),
            "Starting reconciliation loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if self.run_active_pass().await.is_ok() {
                        completed += 1;
                    } else {
                        warn!("Retrying on next tick");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(passes = completed, "Reconciliation loop stopped");
        completed
    }
}

/// Marks a job as notified for this pass; false if it already was.
fn claim_notification(notified: &Mutex<HashSet<String>>, job_id: &str) -> bool {
    notified
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(job_id.to_string())
}

fn record_metrics(outcome: &PassOutcome) {
    metrics::counter!("jobsync_jobs_created_total").increment(outcome.created_jobs.len() as u64);
    metrics::counter!("jobsync_jobs_updated_total").increment(outcome.updated_jobs.len() as u64);
    metrics::counter!("jobsync_jobs_missing_total").increment(outcome.missing_jobs.len() as u64);
    metrics::counter!("jobsync_rap_ids_unknown_total")
        .increment(outcome.unknown_rap_ids.len() as u64);
    metrics::counter!("jobsync_rap_ids_unrecognised_total")
        .increment(outcome.unrecognised_rap_ids.len() as u64);
    metrics::counter!("jobsync_rap_ids_failed_total")
        .increment(outcome.failed_rap_ids.len() as u64);
    metrics::counter!("jobsync_notifications_sent_total")
        .increment(outcome.notified_jobs.len() as u64);
    metrics::counter!("jobsync_notification_failures_total")
        .increment(outcome.notification_failures as u64);
}
