//! Chart export.
//!
//! The [`Exporter`] turns sorted counts and probabilities into two
//! [`BarChart`]s and hands them to a [`ChartRenderer`]. It does no drawing
//! of its own.

use std::path::PathBuf;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::sort::SortedMap;

/// Data for a single bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    /// Category labels, left to right.
    pub labels: Vec<String>,
    /// Bar heights, one per label.
    pub values: Vec<f64>,
    /// Y-axis description.
    pub y_label: String,
}

impl BarChart {
    /// Chart of raw counts.
    pub fn counts(counts: &SortedMap<u64>) -> Self {
        Self {
            labels: counts.keys().map(ToString::to_string).collect(),
            values: counts.values().map(|&c| c as f64).collect(),
            y_label: "Counts".into(),
        }
    }

    /// Chart of probabilities.
    pub fn probabilities(probabilities: &SortedMap<f64>) -> Self {
        Self {
            labels: probabilities.keys().map(ToString::to_string).collect(),
            values: probabilities.values().copied().collect(),
            y_label: "Probability".into(),
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest bar, or zero.
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Something that can turn a [`BarChart`] into a file.
pub trait ChartRenderer {
    /// Render `chart` and return the path of the written artifact.
    fn render_bar_chart(
        &self,
        chart: &BarChart,
        title: &str,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError>;
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for &R {
    fn render_bar_chart(
        &self,
        chart: &BarChart,
        title: &str,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError> {
        (**self).render_bar_chart(chart, title, file_stem)
    }
}

/// Which of the two charts a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Raw counts.
    Histogram,
    /// Normalized probabilities.
    Distribution,
}

impl ChartKind {
    /// File name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Distribution => "distribution",
        }
    }

    /// Chart title for a report titled `title`.
    pub fn title(self, title: &str) -> String {
        match self {
            ChartKind::Histogram => format!("Counts measurement result of {title}"),
            ChartKind::Distribution => format!("Probability distribution of {title}"),
        }
    }
}

/// A chart that could not be rendered.
#[derive(Debug)]
pub struct ExportFailure {
    /// Which chart.
    pub kind: ChartKind,
    /// Why.
    pub error: RenderError,
}

/// Serialized as `{"kind": "histogram", "error": "..."}`.
impl Serialize for ExportFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExportFailure", 2)?;
        state.serialize_field("kind", self.kind.prefix())?;
        state.serialize_field("error", &self.error.to_string())?;
        state.end()
    }
}

/// Result of exporting both charts.
#[derive(Debug, Default)]
pub struct ExportOutcome {
    /// Paths written, in render order.
    pub artifacts: Vec<PathBuf>,
    /// Charts that failed.
    pub failures: Vec<ExportFailure>,
}

impl ExportOutcome {
    /// Whether both charts were written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turn a free-form title into a file stem: lowercase ASCII alphanumerics,
/// everything else collapsed to single underscores.
pub fn file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    while stem.ends_with('_') {
        stem.pop();
    }
    if stem.is_empty() {
        stem.push_str("result");
    }
    stem
}

/// Sends counts and probabilities to a renderer.
#[derive(Debug, Clone)]
pub struct Exporter<R> {
    renderer: R,
}

impl<R: ChartRenderer> Exporter<R> {
    /// Wrap a renderer.
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// The wrapped renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render the counts histogram and the probability distribution.
    ///
    /// Each failure is logged and recorded; the second chart is attempted
    /// even if the first fails.
    pub fn export(
        &self,
        counts: &SortedMap<u64>,
        probabilities: &SortedMap<f64>,
        title: &str,
        stem: &str,
    ) -> ExportOutcome {
        let mut outcome = ExportOutcome::default();
        let charts = [
            (ChartKind::Histogram, BarChart::counts(counts)),
            (ChartKind::Distribution, BarChart::probabilities(probabilities)),
        ];

        for (kind, chart) in charts {
            let name = format!("{}_{stem}", kind.prefix());
            debug!("Rendering {} ({} bars)", name, chart.values.len());

            match self
                .renderer
                .render_bar_chart(&chart, &kind.title(title), &name)
            {
                Ok(path) => {
                    info!("Wrote {}", path.display());
                    outcome.artifacts.push(path);
                }
                Err(error) => {
                    warn!("Failed to render {}: {}", name, error);
                    outcome.failures.push(ExportFailure { kind, error });
                }
            }
        }

        outcome
    }
}
