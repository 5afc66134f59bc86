//! Report command implementation.

use anyhow::{Context, Result};
use tracing::debug;

use qlab_report::file_stem;

use super::common::{default_title, load_config, load_result, pipeline, print_artifacts};
use crate::OutputFormat;

/// Arguments of `qlab report`.
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub input: String,
    pub shots: Option<u32>,
    pub context: Option<String>,
    pub title: Option<String>,
    pub stem: Option<String>,
    pub config: Option<String>,
    pub no_export: bool,
    pub format: OutputFormat,
}

/// Execute the report command.
pub fn execute(args: &ReportArgs) -> Result<()> {
    let result = load_result(&args.input)?;
    let config = load_config(args.config.as_deref(), args.no_export)?;

    let shots = args.shots.unwrap_or(result.shots);

    let context = args.context.as_deref().unwrap_or(&result.backend);
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| default_title(&args.input));
    let stem = args.stem.clone().unwrap_or_else(|| file_stem(&title));
    debug!("Reporting {} as '{}' ({})", args.input, title, stem);

    let pipeline = pipeline(&config);
    match args.format {
        OutputFormat::Table => {
            let stdout = std::io::stdout();
            let report = pipeline.run_named(
                &mut stdout.lock(),
                &result.counts,
                shots,
                context,
                &title,
                &stem,
            )?;
            print_artifacts(&report);
        }
        OutputFormat::Json => {
            let report = pipeline.run_named(
                &mut std::io::sink(),
                &result.counts,
                shots,
                context,
                &title,
                &stem,
            )?;
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
    }

    Ok(())
}
