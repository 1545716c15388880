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

//! Implementation of the `watch` command.

use anyhow::Result;
use jobsync::Reconciler;
use tokio::sync::watch;
use tracing::{info, warn};

use super::Settings;
use crate::duration::parse_std_duration;

pub async fn run(settings: &Settings, interval: Option<&str>) -> Result<()> {
    let mut config = settings.config.clone();
    if let Some(interval) = interval {
        config.reconciler.poll_interval_secs = parse_std_duration(interval)?.as_secs().max(1);
    }
    let settings = Settings { config };
    let reconciler: Reconciler = settings.reconciler().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for interrupt signal");
            // Keep the sender alive; dropping it would stop the loop.
            std::future::pending::<()>().await;
        }
        info!("Interrupt received, finishing current pass");
        let _ = shutdown_tx.send(true);
    });

    let passes = reconciler.watch(shutdown_rx).await;
    info!(passes, "Stopped");
    Ok(())
}
