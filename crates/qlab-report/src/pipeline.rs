//! Normalize, sort, print and export in one call.

use std::io::Write;
use std::path::PathBuf;

use qlab_hal::{Counts, ExecutionResult};
use serde::Serialize;
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::ReportResult;
use crate::export::{ChartRenderer, ExportFailure, Exporter, file_stem};
use crate::normalize::normalize;
use crate::outcome::CountMap;
use crate::reporter::Reporter;
use crate::sort::SortedMap;
use crate::svg::SvgChartRenderer;

/// What a report produced.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Counts in ascending outcome order.
    pub counts: SortedMap<u64>,
    /// Probabilities in ascending outcome order.
    pub probabilities: SortedMap<f64>,
    /// Shot total the probabilities were divided by.
    pub shots: u32,
    /// Where the counts came from.
    pub context: String,
    /// Chart files written.
    pub artifacts: Vec<PathBuf>,
    /// Charts that could not be rendered.
    pub render_failures: Vec<ExportFailure>,
}

/// A configured reporter plus an optional chart exporter.
pub struct ReportPipeline<R> {
    reporter: Reporter,
    exporter: Option<Exporter<R>>,
}

impl ReportPipeline<SvgChartRenderer> {
    /// Pipeline built from a configuration, exporting SVG charts if enabled.
    pub fn from_config(config: &ReportConfig) -> Self {
        let exporter = config
            .export
            .then(|| Exporter::new(SvgChartRenderer::from_config(config)));
        Self {
            reporter: Reporter::from_config(config),
            exporter,
        }
    }
}

impl<R: ChartRenderer> ReportPipeline<R> {
    /// Pipeline with an explicit reporter and renderer.
    pub fn new(reporter: Reporter, renderer: R) -> Self {
        Self {
            reporter,
            exporter: Some(Exporter::new(renderer)),
        }
    }

    /// Skip chart export.
    pub fn without_export(mut self) -> Self {
        self.exporter = None;
        self
    }

    /// Run on raw backend counts.
    ///
    /// Invalid input fails before anything is written. Render failures are
    /// returned in [`Report::render_failures`] after the text is out.
    pub fn run<W: Write>(
        &self,
        out: &mut W,
        counts: &Counts,
        shots: u32,
        context: &str,
        title: &str,
    ) -> ReportResult<Report> {
        self.run_named(out, counts, shots, context, title, &file_stem(title))
    }

    /// Like [`run`](Self::run), with chart files named after `stem` instead
    /// of the sanitized title.
    pub fn run_named<W: Write>(
        &self,
        out: &mut W,
        counts: &Counts,
        shots: u32,
        context: &str,
        title: &str,
        stem: &str,
    ) -> ReportResult<Report> {
        let counts = CountMap::from_counts(counts)?;
        let probabilities = normalize(&counts, shots)?;
        debug!("Normalized {} outcomes over {} shots", counts.len(), shots);

        let counts = counts.sorted();
        let probabilities = probabilities.sorted();

        self.reporter
            .write(out, &counts, &probabilities, shots, context)?;

        let (artifacts, render_failures) = match &self.exporter {
            Some(exporter) => {
                let outcome = exporter.export(&counts, &probabilities, title, stem);
                (outcome.artifacts, outcome.failures)
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok(Report {
            counts,
            probabilities,
            shots,
            context: context.to_string(),
            artifacts,
            render_failures,
        })
    }

    /// Run on an [`ExecutionResult`], using its backend name as context.
    pub fn run_result<W: Write>(
        &self,
        out: &mut W,
        result: &ExecutionResult,
        title: &str,
    ) -> ReportResult<Report> {
        debug!(
            "Reporting register '{}' from {}",
            result.register, result.backend
        );
        self.run(out, &result.counts, result.shots, &result.backend, title)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::{RenderError, ReportError};
    use crate::export::BarChart;

    struct CountingRenderer {
        calls: Cell<usize>,
        fail: bool,
    }

    impl CountingRenderer {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl ChartRenderer for CountingRenderer {
        fn render_bar_chart(
            &self,
            _chart: &BarChart,
            _title: &str,
            file_stem: &str,
        ) -> Result<PathBuf, RenderError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(RenderError::EmptyData)
            } else {
                Ok(PathBuf::from(file_stem))
            }
        }
    }

    fn bell() -> Counts {
        [("11", 250u64), ("00", 250)].into_iter().collect()
    }

    #[test]
    fn test_run_writes_then_exports() {
        let renderer = CountingRenderer::new(false);
        let pipeline = ReportPipeline::new(Reporter::new(), &renderer);
        let mut out = Vec::new();

        let report = pipeline
            .run(&mut out, &bell(), 500, "sim", "Bell state")
            .unwrap();

        assert_eq!(renderer.calls.get(), 2);
        assert_eq!(
            report.artifacts,
            vec![
                PathBuf::from("histogram_bell_state"),
                PathBuf::from("distribution_bell_state")
            ]
        );
        assert_eq!(report.probabilities.get("00"), Some(&0.5));
        assert!(String::from_utf8(out).unwrap().starts_with(
            "Measurement results on a total of 500 shots (sim):"
        ));
    }

    #[test]
    fn test_render_failure_keeps_text() {
        let renderer = CountingRenderer::new(true);
        let pipeline = ReportPipeline::new(Reporter::new(), &renderer);
        let mut out = Vec::new();

        let report = pipeline.run(&mut out, &bell(), 500, "sim", "Bell").unwrap();

        assert_eq!(report.render_failures.len(), 2);
        assert!(report.artifacts.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["render_failures"],
            serde_json::json!([
                {"kind": "histogram", "error": "Nothing to render: the mapping is empty"},
                {"kind": "distribution", "error": "Nothing to render: the mapping is empty"},
            ])
        );
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_invalid_input_writes_nothing() {
        let renderer = CountingRenderer::new(false);
        let pipeline = ReportPipeline::new(Reporter::new(), &renderer);
        let mut out: Vec<u8> = Vec::new();

        let err = pipeline.run(&mut out, &bell(), 0, "sim", "Bell").unwrap_err();

        assert!(matches!(err, ReportError::ZeroShots));
        assert!(out.is_empty());
        assert_eq!(renderer.calls.get(), 0);
    }

    #[test]
    fn test_run_named_uses_stem() {
        let renderer = CountingRenderer::new(false);
        let pipeline = ReportPipeline::new(Reporter::new(), &renderer);
        let report = pipeline
            .run_named(&mut Vec::<u8>::new(), &bell(), 500, "sim", "Bell state", "b1")
            .unwrap();
        assert_eq!(
            report.artifacts,
            vec![PathBuf::from("histogram_b1"), PathBuf::from("distribution_b1")]
        );
    }

    #[test]
    fn test_without_export() {
        let renderer = CountingRenderer::new(false);
        let pipeline = ReportPipeline::new(Reporter::new(), &renderer).without_export();
        let report = pipeline
            .run(&mut Vec::<u8>::new(), &bell(), 500, "sim", "Bell")
            .unwrap();
        assert_eq!(renderer.calls.get(), 0);
        assert!(report.artifacts.is_empty());
    }

    #[test]
    fn test_run_result_uses_backend_as_context() {
        let result = ExecutionResult::new(bell(), 500, "ibm_brisbane");
        let pipeline = ReportPipeline::from_config(&ReportConfig::plain());
        let mut out: Vec<u8> = Vec::new();

        let report = pipeline.run_result(&mut out, &result, "Bell").unwrap();

        assert_eq!(report.context, "ibm_brisbane");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["counts"]["00"], 250);
        assert_eq!(json["shots"], 500);
        assert_eq!(json["render_failures"], serde_json::json!([]));
    }
}
