//! Textual report of a measurement.

use std::io::Write;

use console::{StyledObject, style};

use crate::config::{MIN_DECIMALS, ReportConfig};
use crate::error::{ReportError, ReportResult};
use crate::outcome::Outcome;
use crate::sort::SortedMap;

/// Length of the bar drawn for probability 1.
const BAR_WIDTH: usize = 50;

/// One printed line: an outcome with its count and probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRecord<'a> {
    /// Measured bit-string.
    pub outcome: &'a Outcome,
    /// Times it was observed.
    pub count: u64,
    /// `count / shots`.
    pub probability: f64,
}

/// Pair sorted counts with their probabilities.
///
/// Fails if a counted outcome has no probability.
pub fn records<'a>(
    counts: &'a SortedMap<u64>,
    probabilities: &SortedMap<f64>,
) -> ReportResult<Vec<ReportRecord<'a>>> {
    counts
        .iter()
        .map(|(outcome, &count)| {
            let probability = probabilities.get(outcome.as_str()).copied().ok_or_else(|| {
                ReportError::MissingProbability {
                    outcome: outcome.to_string(),
                }
            })?;
            Ok(ReportRecord {
                outcome,
                count,
                probability,
            })
        })
        .collect()
}

/// Writes a header line and one line per outcome.
#[derive(Debug, Clone)]
pub struct Reporter {
    decimals: usize,
    color: bool,
    show_bars: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Plain reporter with the minimum precision.
    pub fn new() -> Self {
        Self {
            decimals: MIN_DECIMALS,
            color: false,
            show_bars: false,
        }
    }

    /// Reporter matching a configuration.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new()
            .with_decimals(config.decimals)
            .with_color(config.color)
            .with_bars(config.show_bars)
    }

    /// Set the decimals; anything below four is raised to four.
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals.max(MIN_DECIMALS);
        self
    }

    /// Enable or disable ANSI colour.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Enable or disable the proportional bar.
    pub fn with_bars(mut self, show_bars: bool) -> Self {
        self.show_bars = show_bars;
        self
    }

    /// Decimals printed for each probability.
    pub fn decimals(&self) -> usize {
        self.decimals
    }

    // Colour still follows the terminal when enabled.
    fn paint<D>(&self, styled: StyledObject<D>) -> StyledObject<D> {
        if self.color {
            styled
        } else {
            styled.force_styling(false)
        }
    }

    /// The header line.
    pub fn header(&self, shots: u32, context: &str) -> String {
        format!(
            "Measurement results on a total of {} shots ({}):",
            self.paint(style(shots).bold()),
            context
        )
    }

    /// Format one outcome line.
    pub fn line(&self, record: &ReportRecord<'_>, count_width: usize) -> String {
        let mut line = format!(
            "  {}: {:>count_width$}  {:.prec$} ({:>6.2}%)",
            self.paint(style(record.outcome).cyan()),
            record.count,
            record.probability,
            record.probability * 100.0,
            prec = self.decimals,
        );
        if self.show_bars {
            // Counts above the shot total push probabilities past 1.
            let width = (record.probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round();
            let bar = "█".repeat(width as usize);
            line.push(' ');
            line.push_str(&self.paint(style(bar).green()).to_string());
        }
        line
    }

    /// All lines of the report, header first.
    pub fn lines(
        &self,
        counts: &SortedMap<u64>,
        probabilities: &SortedMap<f64>,
        shots: u32,
        context: &str,
    ) -> ReportResult<Vec<String>> {
        let records = records(counts, probabilities)?;
        let count_width = records
            .iter()
            .map(|r| r.count.to_string().len())
            .max()
            .unwrap_or(1);

        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(self.header(shots, context));
        lines.extend(records.iter().map(|r| self.line(r, count_width)));
        Ok(lines)
    }

    /// Write the report to `out`.
    pub fn write<W: Write>(
        &self,
        out: &mut W,
        counts: &SortedMap<u64>,
        probabilities: &SortedMap<f64>,
        shots: u32,
        context: &str,
    ) -> ReportResult<()> {
        for line in self.lines(counts, probabilities, shots, context)? {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }
}
