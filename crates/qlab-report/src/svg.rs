//! SVG bar charts drawn with `plotters`.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::RenderError;
use crate::export::{BarChart, ChartRenderer};

/// Writes `<out_dir>/<file_stem>.svg`.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    out_dir: PathBuf,
    size: (u32, u32),
}

impl SvgChartRenderer {
    /// Renderer writing 1200x800 charts into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            size: (1200, 800),
        }
    }

    /// Renderer configured from a [`ReportConfig`].
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(&config.output_dir).with_size(config.chart_width, config.chart_height)
    }

    /// Set the image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Output directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn target(&self, file_stem: &str) -> Result<PathBuf, RenderError> {
        let valid = !file_stem.is_empty()
            && file_stem != "."
            && file_stem != ".."
            && !file_stem.contains(['/', '\\']);
        if !valid {
            return Err(RenderError::InvalidStem(file_stem.to_string()));
        }

        fs::create_dir_all(&self.out_dir).map_err(|source| RenderError::Io {
            path: self.out_dir.clone(),
            source,
        })?;

        Ok(self.out_dir.join(format!("{file_stem}.svg")))
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render_bar_chart(
        &self,
        chart: &BarChart,
        title: &str,
        file_stem: &str,
    ) -> Result<PathBuf, RenderError> {
        if chart.is_empty() {
            return Err(RenderError::EmptyData);
        }
        let path = self.target(file_stem)?;
        debug!("Drawing {} bars to {}", chart.values.len(), path.display());

        draw(&path, self.size, chart, title).map_err(|e| RenderError::Draw(e.to_string()))?;
        Ok(path)
    }
}

fn draw(
    path: &Path,
    size: (u32, u32),
    chart: &BarChart,
    title: &str,
) -> Result<(), Box<dyn Error>> {
    let n = chart.values.len();
    let y_max = match chart.max_value() {
        m if m > 0.0 => m * 1.15,
        _ => 1.0,
    };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        // Integer ranges are inclusive of their end here.
        .build_cartesian_2d((0..n - 1).into_segmented(), 0f64..y_max)?;

    let labels = &chart.labels;
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc("Outcome")
        .y_desc(chart.y_label.as_str())
        .x_labels(n)
        .x_label_formatter(&|v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    ctx.draw_series(
        Histogram::vertical(&ctx)
            .style(BLUE.mix(0.7).filled())
            .margin(12)
            .data(chart.values.iter().enumerate().map(|(i, v)| (i, *v))),
    )?;

    // Value above each bar; whole numbers for counts.
    let fmt = |v: f64| {
        if v.fract() == 0.0 {
            format!("{v:.0}")
        } else {
            format!("{v:.3}")
        }
    };
    ctx.draw_series(chart.values.iter().enumerate().map(|(i, v)| {
        Text::new(
            fmt(*v),
            (SegmentValue::CenterOf(i), *v + y_max * 0.01),
            ("sans-serif", 16).into_font().color(&BLACK),
        )
    }))?;

    root.present()?;
    Ok(())
}
