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

//! # jobsync
//!
//! A status reconciliation engine. It keeps a local SQLite record of batch
//! jobs, grouped into job requests, in step with a remote execution
//! controller that can only be polled.
//!
//! ## Guarantees
//!
//! - **Upsert by controller identifier**: jobs come into existence the first
//!   time the controller reports them and are overwritten on every later poll.
//! - **Terminal lock-in**: once a job request is `succeeded` or `failed` its
//!   cached status never changes again, whatever a stale poll reports.
//! - **Missing jobs are kept**: a job absent from a response is reported,
//!   never deleted.
//! - **One notification per completion**: a job reaching a terminal status
//!   triggers the notifier once; re-polls do not.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use jobsync::{Database, DAL, HttpStatusClient, LogNotifier, Reconciler, ReconcilerConfig};
//!
//! let database = Database::try_new("sqlite://jobsync.db")?;
//! database.run_migrations().await?;
//!
//! let reconciler = Reconciler::new(
//!     Arc::new(DAL::new(database)),
//!     Arc::new(HttpStatusClient::new("https://controller.example.org", "token", Duration::from_secs(30))?),
//!     Arc::new(LogNotifier),
//!     ReconcilerConfig::default(),
//! );
//! let outcome = reconciler.run_active_pass().await?;
//! ```

pub mod client;
pub mod config;
pub mod dal;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod reconciler;
pub mod store;

pub use client::{HttpStatusClient, StatusClient, StatusResponse};
pub use config::{ConfigError, ConfigLoader, JobSyncConfig, ReconcilerConfig};
pub use dal::{UpsertedJob, DAL};
pub use database::Database;
pub use error::{NotifyError, ReconcileError, StatusClientError, StoreError};
pub use logging::init_logging;
pub use models::{
    Job, JobRecord, JobRequest, JobRequestStatus, JobRequestWithJobs, JobStatus, NewJobRequest,
};
pub use notifier::{LogNotifier, Notifier};
pub use reconciler::{ActiveSetSelector, PassOutcome, Reconciler};
pub use store::JobStore;
