//! Chart rendering behind the [`ChartRenderer`] capability, with a
//! `plotters` implementation that draws into in-memory RGB bitmaps.

use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::AppError;
use crate::models::{CategoricalSummary, CorrelationMatrix};

pub const INTERACTIVE_HISTOGRAM_SIZE: (u32, u32) = (800, 300);
pub const INTERACTIVE_HEATMAP_SIZE: (u32, u32) = (800, 600);
pub const CATEGORY_BARS_SIZE: (u32, u32) = (800, 400);
pub const REPORT_HISTOGRAM_SIZE: (u32, u32) = (600, 300);
pub const REPORT_HEATMAP_SIZE: (u32, u32) = (600, 600);

const MAX_INTERACTIVE_BINS: usize = 50;

const SKYBLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHTCORAL: RGBColor = RGBColor(240, 128, 128);
const MISSING_CELL: RGBColor = RGBColor(235, 235, 235);

/// Packed RGB8 pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderedChart {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: vec![255; (width * height * 3) as usize],
        }
    }

    pub fn to_image(&self) -> Result<DynamicImage, AppError> {
        RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| AppError::Chart("pixel buffer does not match chart size".to_string()))
    }

    pub fn to_png(&self) -> Result<Vec<u8>, AppError> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&self.rgb, self.width, self.height, ColorType::Rgb8)
            .map_err(|e| AppError::Chart(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }
}

pub trait ChartRenderer {
    fn histogram(
        &self,
        title: &str,
        values: &[f64],
        bins: usize,
        size: (u32, u32),
    ) -> Result<RenderedChart, AppError>;

    fn heatmap(&self, matrix: &CorrelationMatrix, size: (u32, u32)) -> Result<RenderedChart, AppError>;

    fn category_bars(
        &self,
        summary: &CategoricalSummary,
        size: (u32, u32),
    ) -> Result<RenderedChart, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// `bins` equal-width bins over `[min, max]`, the last one closed on the right.
/// A constant series is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let bins = bins.max(1);
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for value in finite {
        let idx = (((value - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// `floor(sqrt(n))` capped at 50, never below one.
pub fn interactive_bin_count(n: usize) -> usize {
    ((n as f64).sqrt() as usize).clamp(1, MAX_INTERACTIVE_BINS)
}

/// Diverging blue-white-red ramp centred on zero.
pub fn coolwarm(value: f64) -> RGBColor {
    if !value.is_finite() {
        return MISSING_CELL;
    }
    let cold = (59.0, 76.0, 192.0);
    let mid = (221.0, 221.0, 221.0);
    let warm = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 { (mid, cold, -t) } else { (mid, warm, t) };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

fn render<F>(size: (u32, u32), draw: F) -> Result<RenderedChart, AppError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> DrawResult,
{
    let (width, height) = size;
    let mut chart = RenderedChart::blank(width, height);
    {
        let root = BitMapBackend::with_buffer(&mut chart.rgb, size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| AppError::Chart(e.to_string()))?;
        draw(&root).map_err(|e| AppError::Chart(e.to_string()))?;
        root.present().map_err(|e| AppError::Chart(e.to_string()))?;
    }
    Ok(chart)
}

fn short_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let cut: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn histogram(
        &self,
        title: &str,
        values: &[f64],
        bins: usize,
        size: (u32, u32),
    ) -> Result<RenderedChart, AppError> {
        let bins = histogram_bins(values, bins);
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Err(AppError::Chart(format!("{} has no finite values to plot", title)));
        };
        let (lo, hi) = (first.start, last.end);
        let tallest = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32;
        let y_top = tallest + tallest / 10 + 1;

        render(size, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, ("sans-serif", 18))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(40)
                .build_cartesian_2d(lo..hi, 0u32..y_top)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .y_desc("Count")
                .draw()?;

            chart.draw_series(bins.iter().map(|bin| {
                Rectangle::new([(bin.start, 0u32), (bin.end, bin.count as u32)], SKYBLUE.filled())
            }))?;
            chart.draw_series(bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.start, 0u32), (bin.end, bin.count as u32)],
                    BLACK.stroke_width(1),
                )
            }))?;
            Ok(())
        })
    }

    fn heatmap(&self, matrix: &CorrelationMatrix, size: (u32, u32)) -> Result<RenderedChart, AppError> {
        let n = matrix.size() as i32;
        if n == 0 {
            return Err(AppError::Chart("empty correlation matrix".to_string()));
        }
        let names: Vec<String> = matrix.columns.iter().map(|c| short_label(c, 12)).collect();

        render(size, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("How the numbers relate to each other", ("sans-serif", 18))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(90)
                .build_cartesian_2d(0i32..n, n..0i32)?;

            let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
            let cell_w = plot_w as i32 / n;
            let cell_h = plot_h as i32 / n;
            let label = |v: &i32| names.get(*v as usize).cloned().unwrap_or_default();

            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(n as usize)
                .y_labels(n as usize)
                .x_label_offset(cell_w / 2)
                .y_label_offset(-cell_h / 2)
                .x_label_formatter(&label)
                .y_label_formatter(&label)
                .draw()?;

            let cells = (0..n).flat_map(|row| (0..n).map(move |col| (row, col)));
            chart.draw_series(cells.clone().map(|(row, col)| {
                let r = matrix.get(row as usize, col as usize);
                Rectangle::new([(col, row), (col + 1, row + 1)], coolwarm(r).filled())
            }))?;

            let annotation = ("sans-serif", 14).into_font();
            chart.draw_series(cells.map(|(row, col)| {
                let r = matrix.get(row as usize, col as usize);
                let text = if r.is_finite() { format!("{:.2}", r) } else { "–".to_string() };
                EmptyElement::at((col, row))
                    + Text::new(text, (cell_w / 2 - 14, cell_h / 2 - 7), annotation.clone())
            }))?;
            Ok(())
        })
    }

    fn category_bars(
        &self,
        summary: &CategoricalSummary,
        size: (u32, u32),
    ) -> Result<RenderedChart, AppError> {
        let labels: Vec<String> = summary.top_values.keys().map(|k| short_label(k, 10)).collect();
        let counts: Vec<u32> = summary.top_values.values().map(|c| *c as u32).collect();
        if counts.is_empty() {
            return Err(AppError::Chart(format!("{} has no values to plot", summary.column)));
        }
        let k = counts.len() as u32;
        let tallest = counts.iter().copied().max().unwrap_or(0);

        render(size, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(
                    format!("Most common values in {}", summary.column),
                    ("sans-serif", 18),
                )
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(40)
                .build_cartesian_2d((0u32..k).into_segmented(), 0u32..(tallest + tallest / 10 + 1))?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(k as usize)
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .y_desc("Count")
                .draw()?;

            chart.draw_series(
                Histogram::vertical(&chart)
                    .style(LIGHTCORAL.filled())
                    .margin(6)
                    .data(counts.iter().enumerate().map(|(i, c)| (i as u32, *c))),
            )?;
            Ok(())
        })
    }
}
