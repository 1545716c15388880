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

//! jobsync CLI - keeps local job records in step with the execution controller.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod duration;

/// jobsync - reconcile local job state with the execution controller
#[derive(Parser)]
#[command(name = "jobsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the search path, or JOBSYNC_CONFIG)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Database URL, overriding [database].url
    #[arg(long, env = "JOBSYNC_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Controller base URL, overriding [controller].base_url
    #[arg(long, env = "JOBSYNC_CONTROLLER_URL", global = true)]
    controller_url: Option<String>,

    /// Controller API token, overriding [controller].token
    #[arg(long, env = "JOBSYNC_CONTROLLER_TOKEN", global = true, hide_env_values = true)]
    controller_token: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Run one reconciliation pass
    Sync {
        /// Reconcile only these RAP ids (repeatable); defaults to every active request
        #[arg(long = "rap-id")]
        rap_ids: Vec<String>,

        /// Print the pass outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile active requests periodically until interrupted
    Watch {
        /// Time between passes (e.g. "60s", "5m"), overriding [reconciler].poll_interval_secs
        #[arg(long)]
        interval: Option<String>,
    },

    /// Manage job requests
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },

    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Register a new job request
    Create {
        /// Use this identifier instead of a generated one
        #[arg(long)]
        identifier: Option<String>,

        /// Do not notify when its jobs complete
        #[arg(long)]
        no_notify: bool,
    },

    /// Show a job request and its jobs
    Show {
        identifier: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List unfinished jobs no poll has refreshed recently
    StaleJobs {
        /// Report jobs not updated for this long (e.g. "30m", "1h", "2d")
        #[arg(long, default_value = "1h")]
        older_than: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    jobsync::init_logging(cli.verbose.then_some("debug"));

    let settings = commands::Settings::resolve(
        cli.config.as_deref(),
        cli.database_url,
        cli.controller_url,
        cli.controller_token,
    )?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&settings).await?,
        Commands::Sync { rap_ids, json } => commands::sync::run(&settings, rap_ids, json).await?,
        Commands::Watch { interval } => commands::watch::run(&settings, interval.as_deref()).await?,
        Commands::Request { command } => match command {
            RequestCommands::Create {
                identifier,
                no_notify,
            } => commands::request::create(&settings, identifier, !no_notify).await?,
            RequestCommands::Show { identifier, json } => {
                commands::request::show(&settings, &identifier, json).await?
            }
        },
        Commands::Admin { command } => match command {
            AdminCommands::StaleJobs { older_than } => {
                commands::stale_jobs::run(&settings, &older_than).await?
            }
        },
    }

    Ok(())
}
