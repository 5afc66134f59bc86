//! Job command implementation.
//!
//! Connects to an archive, waits for the job to settle and reports its
//! counts.

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use qlab_hal::{Backend, JobId};

use super::common::{connect_archive, load_config, pipeline, print_artifacts};

/// Execute the job command.
pub async fn execute(
    job_id: &str,
    archive: &str,
    title: Option<&str>,
    config: Option<&str>,
    no_export: bool,
) -> Result<()> {
    let config = load_config(config, no_export)?;
    let service = connect_archive(archive)?;
    let backend = service.backend();
    let job_id = JobId::new(job_id);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Waiting for job {job_id}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = backend.wait(&job_id).await;
    spinner.finish_and_clear();
    let result = result?;

    info!(
        "Job {} finished on {} ({} shots)",
        job_id, result.backend, result.shots
    );
    println!(
        "{} Job {} on {}\n",
        style("✓").green().bold(),
        style(&job_id).cyan(),
        style(&result.backend).yellow()
    );

    let title = title.unwrap_or(job_id.as_str());
    let stdout = std::io::stdout();
    let report = pipeline(&config).run_result(&mut stdout.lock(), &result, title)?;
    print_artifacts(&report);

    if let Some(ms) = result.execution_time_ms {
        println!("\n  Execution time: {} ms", style(ms).yellow());
    }

    Ok(())
}
