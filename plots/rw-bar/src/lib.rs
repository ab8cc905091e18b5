use std::{fs, ops::Range, path::PathBuf};

use common::{
    config::Settings,
    plot::{OutputLayout, PlotTarget},
    record::filter_series,
    series::Series,
};
use eyre::{Result, WrapErr, ensure};
use plotters::{coord::Shift, prelude::*};
use tracing::{debug, info};

/// Share of each slot taken by its bar
const BAR_WIDTH: f64 = 0.35;
const Y_HEADROOM: f64 = 1.1;
const CAPTION_FONT_SIZE: u32 = 20;
const AXIS_FONT_SIZE: u32 = 15;

/// Write/read timing chart for a single file on a single filesystem
#[derive(Debug, Clone)]
pub struct RwBar {
    pub title: String,
    pub series: Series,
    pub labels: Vec<String>,
    pub size: (u32, u32),
}

impl RwBar {
    pub fn new(target: &PlotTarget, series: Series, settings: &Settings) -> Self {
        let labels = series.labels(settings.labels);
        Self {
            title: target.title(),
            series,
            labels,
            size: settings.size(),
        }
    }

    /// Reads the target's rows and builds the chart
    pub fn load(target: &PlotTarget, settings: &Settings) -> Result<Self> {
        let series = filter_series(&target.csv, &target.filesystem, &target.file)
            .wrap_err_with(|| format!("Collecting data for {}", target.title()))?;
        Ok(Self::new(target, series, settings))
    }

    pub fn render_svg(&self) -> Result<String> {
        ensure!(!self.series.is_empty(), "Nothing to plot for {}", self.title);
        ensure!(
            self.labels.len() == self.series.len(),
            "Got {} labels for {} bars",
            self.labels.len(),
            self.series.len()
        );

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size).into_drawing_area();
            self.draw(&root)?;
            root.present()?;
        }
        Ok(svg)
    }

    fn draw(&self, root: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
        root.fill(&WHITE)?;

        let bars = self.series.len() as u32;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", CAPTION_FONT_SIZE))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(
                (0..bars).into_segmented(),
                y_range(&self.series),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.labels.len())
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => {
                    self.labels.get(*i as usize).cloned().unwrap_or_default()
                }
                _ => String::new(),
            })
            .x_desc("index of w/r")
            .y_desc("time (s)")
            .axis_desc_style(("sans-serif", AXIS_FONT_SIZE))
            .draw()?;

        let slot_px = chart.plotting_area().dim_in_pixel().0 as f64 / bars as f64;
        let margin = (slot_px * (1.0 - BAR_WIDTH) / 2.0) as u32;
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(margin)
                .data(
                    self.series
                        .values()
                        .iter()
                        .enumerate()
                        .map(|(i, d)| (i as u32, *d)),
                ),
        )?;
        Ok(())
    }

    /// Renders into the file `layout` resolves for `target`, replacing any previous chart
    pub fn plot(&self, target: &PlotTarget, layout: &OutputLayout) -> Result<PathBuf> {
        let svg = self.render_svg()?;
        let path = layout.resolve(target)?;
        fs::write(&path, svg).wrap_err_with(|| format!("Writing plot {path:?}"))?;
        info!("Plotted {} bars to {path:?}", self.series.len());
        Ok(path)
    }
}

/// Always spans 0, with headroom on the side of each extreme
fn y_range(series: &Series) -> Range<f64> {
    let (low, high) = (series.min() * Y_HEADROOM, series.max() * Y_HEADROOM);
    if high > low { low..high } else { 0.0..1.0 }
}

/// Loads, renders and writes one chart
pub fn plot_target(
    target: &PlotTarget,
    settings: &Settings,
    layout: &OutputLayout,
) -> Result<PathBuf> {
    let chart = RwBar::load(target, settings)?;
    if let Some(mean) = chart.series.mean() {
        debug!("{}: {} bars, mean {mean:.3}s", chart.title, chart.series.len());
    }
    chart.plot(target, layout)
}

#[cfg(test)]
mod tests {
    use common::series::LabelScheme;

    use super::*;

    fn has_text(svg: &str, text: &str) -> bool {
        svg.split(['<', '>']).any(|s| s.trim() == text)
    }

    fn chart(values: Vec<f64>) -> RwBar {
        RwBar::new(
            &PlotTarget::new("testResult.csv", "ext4", "file.txt"),
            Series::new(values),
            &Settings::default(),
        )
    }

    #[test]
    fn svg_carries_title_axes_and_labels() {
        let svg = chart(vec![1.0, 2.0, 1.5]).render_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(has_text(&svg, "write/read test of file.txt in ext4"));
        assert!(has_text(&svg, "time (s)"));
        assert!(has_text(&svg, "index of w/r"));
        for label in ["w", "r1", "r2"] {
            assert!(has_text(&svg, label), "missing tick {label}");
        }
        assert!(!has_text(&svg, "r3"));
    }

    #[test]
    fn reads_only_labels() {
        let settings = Settings {
            labels: LabelScheme::ReadsOnly,
            ..Settings::default()
        };
        let bar = RwBar::new(
            &PlotTarget::new("a.csv", "xfs", "test1"),
            Series::new(vec![0.5, 0.7]),
            &settings,
        );
        assert_eq!(bar.labels, vec!["r1", "r2"]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = chart(vec![0.25, 3.0, 2.0, 2.5]).render_svg().unwrap();
        let b = chart(vec![0.25, 3.0, 2.0, 2.5]).render_svg().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_series_is_refused() {
        assert!(chart(vec![]).render_svg().is_err());
    }

    #[test]
    fn all_zero_series_still_renders() {
        assert!(chart(vec![0.0, 0.0]).render_svg().is_ok());
    }

    #[test]
    fn y_axis_has_headroom() {
        let range = y_range(&Series::new(vec![1.0, 10.0]));
        assert_eq!(range.start, 0.0);
        assert!((range.end - 11.0).abs() < 1e-9);
        assert_eq!(y_range(&Series::new(vec![0.0])), 0.0..1.0);
    }

    #[test]
    fn negative_durations_extend_the_axis_below_zero() {
        let range = y_range(&Series::new(vec![1.0, 2.0, -0.5]));
        assert!((range.start + 0.55).abs() < 1e-9);
        assert!((range.end - 2.2).abs() < 1e-9);

        let range = y_range(&Series::new(vec![-1.0, -2.0]));
        assert!((range.start + 2.2).abs() < 1e-9);
        assert_eq!(range.end, 0.0);

        assert!(chart(vec![1.0, 2.0, -0.5]).render_svg().is_ok());
    }
}
