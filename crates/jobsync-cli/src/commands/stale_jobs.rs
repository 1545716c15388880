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

//! Implementation of the `admin stale-jobs` command.
//!
//! Lists unfinished jobs that no poll has refreshed within the given window.
//! Reporting only: stale jobs are never timed out or deleted.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::Settings;
use crate::duration::parse_duration;

pub async fn run(settings: &Settings, older_than: &str) -> Result<()> {
    let duration = parse_duration(older_than)
        .with_context(|| format!("Invalid duration: '{}'", older_than))?;
    let cutoff = Utc::now() - duration;

    let dal = settings.open_dal().await?;
    let stale = dal
        .job()
        .list_stale(cutoff)
        .await
        .context("Failed to list stale jobs")?;

    if stale.is_empty() {
        info!("No unfinished jobs older than {} (cutoff: {})", older_than, cutoff);
        return Ok(());
    }

    info!(count = stale.len(), "Found stale jobs");
    for job in stale {
        println!(
            "{}\t{}\t{}\tlast updated {}",
            job.identifier,
            job.job_request_id,
            job.status,
            job.updated_at.to_rfc3339()
        );
    }
    Ok(())
}
