use std::{future::Future, time::Duration};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use client::App;
use shared::models::{ExportJob, ExportStatus};
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// Queue a PDF export for a project
    Start {
        project_id: i64,
        /// Poll until the export finishes
        #[arg(long)]
        wait: bool,
        /// Seconds between status checks when waiting
        #[arg(long, default_value_t = 2)]
        interval: u64,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,
    },
    /// Show the state of an export job
    Status { job_id: String },
    /// Print the download link for a finished export
    Url { job_id: String },
}

pub async fn run(app: &App, command: ExportCommand) -> Result<()> {
    let api = app.api();
    match command {
        ExportCommand::Start {
            project_id,
            wait,
            interval,
            timeout,
        } => {
            let job = api
                .export_project(project_id)
                .await
                .with_context(|| format!("failed to queue export of project {project_id}"))?;
            println!("Queued export {}", job.job_id);

            if wait {
                let job = poll_until_finished(
                    job,
                    Duration::from_secs(interval.max(1)),
                    Duration::from_secs(timeout),
                    |job_id| async move {
                        api.export_status(&job_id)
                            .await
                            .with_context(|| format!("failed to poll export {job_id}"))
                    },
                )
                .await?;
                print_job(&job);
                if job.status == ExportStatus::Failed {
                    bail!(
                        "export {} failed: {}",
                        job.job_id,
                        job.error_message.as_deref().unwrap_or("no reason given")
                    );
                }
                println!("{}", api.download_url(&job.job_id)?);
            }
        }
        ExportCommand::Status { job_id } => {
            let job = api
                .export_status(&job_id)
                .await
                .with_context(|| format!("failed to load export {job_id}"))?;
            print_job(&job);
        }
        ExportCommand::Url { job_id } => {
            println!("{}", api.download_url(&job_id)?);
        }
    }
    Ok(())
}

/// Re-fetches `job` every `interval` until it reaches a terminal state or `limit` elapses.
async fn poll_until_finished<F, Fut>(
    mut job: ExportJob,
    interval: Duration,
    limit: Duration,
    mut fetch: F,
) -> Result<ExportJob>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ExportJob>>,
{
    let deadline = Instant::now() + limit;
    while !job.status.is_terminal() {
        if Instant::now() + interval > deadline {
            bail!(
                "timed out after {}s waiting for export {} (last status: {})",
                limit.as_secs(),
                job.job_id,
                job.status
            );
        }
        sleep(interval).await;
        job = fetch(job.job_id.clone()).await?;
        debug!(
            job = %job.job_id,
            status = %job.status,
            progress = job.progress,
            "export progress"
        );
    }
    Ok(job)
}

fn print_job(job: &ExportJob) {
    println!("job: {}", job.job_id);
    println!("project: {}", job.project_id);
    println!("status: {} ({}%)", job.status, job.progress);
    if let Some(error) = &job.error_message {
        println!("error: {error}");
    }
}
