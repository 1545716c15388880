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

//! Implementation of the `sync` command.
//!
//! Runs a single reconciliation pass, either over every active job request
//! or over the RAP ids given with `--rap-id`.

use anyhow::{Context, Result};
use jobsync::PassOutcome;

use super::Settings;

pub async fn run(settings: &Settings, rap_ids: Vec<String>, json: bool) -> Result<()> {
    let reconciler = settings.reconciler().await?;

    let explicit = if rap_ids.is_empty() {
        None
    } else {
        Some(rap_ids)
    };
    let identifiers = reconciler
        .selector()
        .select(explicit)
        .await
        .context("Failed to select job requests")?;

    let outcome = reconciler
        .run_pass(&identifiers)
        .await
        .context("Reconciliation pass failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_summary(identifiers.len(), &outcome));
    }
    Ok(())
}

fn render_summary(requested: usize, outcome: &PassOutcome) -> String {
    let mut out = format!(
        "Reconciled {} job request(s): {} job(s) created, {} updated, {} missing\n",
        requested,
        outcome.created_jobs.len(),
        outcome.updated_jobs.len(),
        outcome.missing_jobs.len()
    );
    for (rap_id, status) in &outcome.status_changes {
        out.push_str(&format!("  {} -> {}\n", rap_id, status));
    }
    if !outcome.unknown_rap_ids.is_empty() {
        out.push_str(&format!(
            "  Unknown locally: {}\n",
            outcome.unknown_rap_ids.join(", ")
        ));
    }
    if !outcome.unrecognised_rap_ids.is_empty() {
        out.push_str(&format!(
            "  Unrecognised by controller: {}\n",
            outcome.unrecognised_rap_ids.join(", ")
        ));
    }
    if !outcome.missing_jobs.is_empty() {
        out.push_str(&format!(
            "  Missing from response: {}\n",
            outcome.missing_jobs.join(", ")
        ));
    }
    if outcome.notification_failures > 0 {
        out.push_str(&format!(
            "  {} notification(s) failed\n",
            outcome.notification_failures
        ));
    }
    out
}
