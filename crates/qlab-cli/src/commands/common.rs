//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qlab_adapter_archive::ArchiveService;
use qlab_hal::{
    AccountStore, Connection, CredentialOrigin, Counts, EnvCredentialSource, ExecutionResult,
    connect_with_fallback,
};
use qlab_report::{Report, ReportConfig, ReportPipeline, SvgChartRenderer};

/// Context label for counts that came without a backend name.
pub const LOCAL_CONTEXT: &str = "local";

/// Load counts from a JSON file.
///
/// Accepts either a full execution result (`{"counts": {...}, "shots": ...,
/// "backend": ...}`) or a bare `{"00": 250, "11": 250}` map. A bare map is
/// treated as a local run whose shot total is the sum of its counts.
pub fn load_result(path: &str) -> Result<ExecutionResult> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    parse_result(&source).with_context(|| format!("Invalid counts file: {path}"))
}

/// Parse the contents of a counts file. See [`load_result`].
pub fn parse_result(source: &str) -> Result<ExecutionResult> {
    let value: serde_json::Value = serde_json::from_str(source)?;

    if value.get("counts").is_some() {
        return Ok(serde_json::from_value(value)?);
    }

    let counts: Counts = serde_json::from_value(value)?;
    let shots = u32::try_from(counts.total_shots())
        .map_err(|_| anyhow::anyhow!("Shot total does not fit in 32 bits"))?;
    Ok(ExecutionResult::new(counts, shots, LOCAL_CONTEXT))
}

/// Default chart title for an input file: its name without extension.
pub fn default_title(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("result")
        .to_string()
}

/// Load the report configuration, applying `--no-export`.
pub fn load_config(path: Option<&str>, no_export: bool) -> Result<ReportConfig> {
    let mut config = ReportConfig::load(path.map(Path::new))?;
    if no_export {
        config.export = false;
    }
    Ok(config)
}

/// The standard SVG pipeline for `config`.
pub fn pipeline(config: &ReportConfig) -> ReportPipeline<SvgChartRenderer> {
    ReportPipeline::from_config(config)
}

/// Print where the charts went, and which ones failed.
pub fn print_artifacts(report: &Report) {
    if report.artifacts.is_empty() && report.render_failures.is_empty() {
        return;
    }

    println!();
    for path in &report.artifacts {
        println!("{} Wrote {}", style("✓").green().bold(), path.display());
    }
    for failure in &report.render_failures {
        println!(
            "{} {} chart not written: {}",
            style("!").yellow().bold(),
            failure.kind.prefix(),
            failure.error
        );
    }
}

/// Open the archive at `dir`, trying the saved account first and the
/// environment (or `.env`) second.
pub fn connect_archive(dir: &str) -> Result<ArchiveService> {
    let store = AccountStore::default_location()?;
    let env = EnvCredentialSource::default();

    match connect_with_fallback(&store, &env, |creds| ArchiveService::connect(dir, creds)) {
        Connection::Connected { service, origin } => {
            if origin == CredentialOrigin::Environment {
                println!(
                    "{} Using token from the environment (saved to {})",
                    style("→").cyan().bold(),
                    style(store.path().display()).dim()
                );
            }
            Ok(service)
        }
        Connection::NeedsAuth { reason } => {
            anyhow::bail!(
                "Not authenticated: {reason}. Set QLAB_TOKEN or run {}",
                style("qlab auth login").dim()
            )
        }
        Connection::Failed(e) => Err(e.into()),
    }
}
