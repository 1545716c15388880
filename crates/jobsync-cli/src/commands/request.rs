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

//! Implementation of the `request create` and `request show` commands.

use anyhow::{anyhow, Context, Result};
use jobsync::{JobRequestWithJobs, NewJobRequest};
use serde_json::json;
use tracing::info;

use super::Settings;

pub async fn create(settings: &Settings, identifier: Option<String>, will_notify: bool) -> Result<()> {
    let dal = settings.open_dal().await?;

    let mut new_request = NewJobRequest::new(will_notify);
    if let Some(identifier) = identifier {
        new_request = new_request.with_identifier(identifier);
    }

    let request = dal
        .job_request()
        .create(new_request)
        .await
        .context("Failed to create job request")?;

    info!(rap_id = %request.identifier, will_notify, "Created job request");
    println!("{}", request.identifier);
    Ok(())
}

pub async fn show(settings: &Settings, identifier: &str, as_json: bool) -> Result<()> {
    let dal = settings.open_dal().await?;

    let request = dal
        .job_request()
        .fetch_with_jobs(&[identifier.to_string()])
        .await
        .context("Failed to load job request")?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Job request not found: {}", identifier))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&to_json(&request))?);
    } else {
        print!("{}", render(&request));
    }
    Ok(())
}

fn to_json(request: &JobRequestWithJobs) -> serde_json::Value {
    json!({
        "job_request": request.job_request,
        "computed_status": request.computed_status(),
        "started_at": request.started_at(),
        "completed_at": request.completed_at(),
        "jobs": request.jobs.iter().map(|job| json!({
            "job": job,
            "runtime_secs": job.runtime().map(|d| d.num_seconds()),
        })).collect::<Vec<_>>(),
    })
}

fn render(request: &JobRequestWithJobs) -> String {
    let job_request = &request.job_request;
    let mut out = format!(
        "Job request {}\n  cached status:   {}\n  computed status: {}\n  notify:          {}\n  created:         {}\n",
        job_request.identifier,
        job_request.cached_status,
        request.computed_status(),
        if job_request.will_notify { "yes" } else { "no" },
        job_request.created_at.to_rfc3339(),
    );
    if let Some(message) = &job_request.status_message {
        out.push_str(&format!("  message:         {}\n", message));
    }
    if let Some(started) = request.started_at() {
        out.push_str(&format!("  started:         {}\n", started.to_rfc3339()));
    }
    if let Some(completed) = request.completed_at() {
        out.push_str(&format!("  completed:       {}\n", completed.to_rfc3339()));
    }

    if request.jobs.is_empty() {
        out.push_str("  no jobs reported yet\n");
        return out;
    }
    out.push_str(&format!("  jobs ({}):\n", request.jobs.len()));
    for job in &request.jobs {
        let runtime = job
            .runtime()
            .map(|d| format!("{}s", d.num_seconds()))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "    {:<24} {:<10} {:<24} {}\n",
            job.identifier, job.status, job.action, runtime
        ));
    }
    out
}
