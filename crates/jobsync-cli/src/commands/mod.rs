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

//! Subcommand implementations and the settings they share.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use jobsync::{
    ConfigLoader, Database, HttpStatusClient, JobSyncConfig, LogNotifier, Reconciler, DAL,
};
use tracing::debug;

pub mod migrate;
pub mod request;
pub mod stale_jobs;
pub mod sync;
pub mod watch;

/// Configuration file values with command-line overrides applied.
pub struct Settings {
    pub config: JobSyncConfig,
}

impl Settings {
    pub fn resolve(
        config_file: Option<&Path>,
        database_url: Option<String>,
        controller_url: Option<String>,
        controller_token: Option<String>,
    ) -> Result<Self> {
        let mut config = ConfigLoader::new()
            .load_or_default(config_file)
            .context("Failed to load configuration")?;

        if let Some(url) = database_url {
            config.database.url = url;
        }
        if let Some(url) = controller_url {
            config.controller.base_url = url;
        }
        if let Some(token) = controller_token {
            config.controller.token = token;
        }
        config.validate().context("Invalid configuration")?;

        debug!(database = %config.database.url, controller = %config.controller.base_url, "Resolved settings");
        Ok(Self { config })
    }

    /// Opens the database and brings its schema up to date.
    pub async fn open_dal(&self) -> Result<DAL> {
        let database = Database::try_new(&self.config.database.url)
            .context("Failed to connect to database")?;
        database
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
        Ok(DAL::new(database))
    }

    /// Builds a reconciler backed by the database and the HTTP controller.
    pub async fn reconciler(&self) -> Result<Reconciler> {
        let dal = self.open_dal().await?;
        let client = HttpStatusClient::new(
            &self.config.controller.base_url,
            &self.config.controller.token,
            self.config.controller.timeout(),
        )
        .context("Controller URL is required. Set [controller].base_url, --controller-url or JOBSYNC_CONTROLLER_URL")?;

        Ok(Reconciler::new(
            Arc::new(dal),
            Arc::new(client),
            Arc::new(LogNotifier),
            self.config.reconciler_config(),
        ))
    }
}
