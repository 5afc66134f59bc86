//! Measurement-result reporting
//!
//! Turns the counts a backend returns into something a person can read:
//! probabilities, a deterministic outcome order, a printed table, and a pair
//! of bar charts.
//!
//! # Overview
//!
//! The flow is always the same and always in this order:
//!
//! 1. [`normalize`]: divide every count by the shot total
//! 2. [`sort_outcomes`]: order outcomes by ascending bit-string
//! 3. [`Reporter`]: write a header and one line per outcome
//! 4. [`Exporter`]: render a counts histogram and a probability
//!    distribution through a [`ChartRenderer`]
//!
//! Invalid input (zero shots, malformed bit-strings) fails before anything
//! is written. Chart failures are logged and returned alongside the
//! report; they never undo the printed table.
//!
//! # Example
//!
//! ```ignore
//! use qlab_hal::Counts;
//!
//! let counts: Counts = [("00", 250), ("11", 250)].into_iter().collect();
//! let report = qlab_report::report(&counts, 500, "ibm_brisbane", "Bell state")?;
//! assert_eq!(report.probabilities.get("11"), Some(&0.5));
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod reporter;
pub mod sort;
pub mod svg;

pub use config::{ConfigError, MIN_DECIMALS, ReportConfig};
pub use error::{RenderError, ReportError, ReportResult};
pub use export::{
    BarChart, ChartKind, ChartRenderer, ExportFailure, ExportOutcome, Exporter, file_stem,
};
pub use normalize::{normalize, normalize_counts};
pub use outcome::{CountMap, Outcome, OutcomeMap, ProbabilityMap};
pub use pipeline::{Report, ReportPipeline};
pub use reporter::{ReportRecord, Reporter, records};
pub use sort::{SortedMap, sort_outcomes};
pub use svg::SvgChartRenderer;

use qlab_hal::Counts;

/// Normalize, sort, print to stdout and export charts to the working
/// directory with the default configuration.
///
/// `title_stem` is used verbatim in chart titles and, sanitized, in the
/// chart file names.
pub fn report(
    counts: &Counts,
    shots: u32,
    context: &str,
    title_stem: &str,
) -> ReportResult<Report> {
    let pipeline = ReportPipeline::from_config(&ReportConfig::default());
    let stdout = std::io::stdout();
    pipeline.run(&mut stdout.lock(), counts, shots, context, title_stem)
}
