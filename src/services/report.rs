//! PDF summary of one analysis run.
//!
//! Layout is planned first as a flat list of [`LayoutOp`]s in PDF points
//! (origin bottom-left), then replayed onto a [`DocumentBuilder`].

use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};

use crate::error::AppError;
use crate::models::{CategoricalSummary, ColumnStats, CorrelationMatrix, DatasetOverview};
use crate::services::charts::{
    ChartRenderer, RenderedChart, CATEGORY_BARS_SIZE, REPORT_HEATMAP_SIZE, REPORT_HISTOGRAM_SIZE,
};

// A4 in points
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN_X: f32 = 50.0;
pub const TOP_MARGIN: f32 = 50.0;
/// Below this cursor height a numeric block starts on a fresh page.
pub const MIN_BLOCK_SPACE: f32 = 250.0;
pub const WRAP_WIDTH: usize = 90;
pub const REPORT_HISTOGRAM_BINS: usize = 20;

const IMAGE_DPI: f32 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub title: String,
    /// Appends a bar chart per categorical summary after the heatmap.
    pub include_categories: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "Statscope Report".to_string(),
            include_categories: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOp {
    NewPage,
    Text {
        font: Font,
        size: f32,
        x: f32,
        y: f32,
        text: String,
    },
    Image {
        chart: RenderedChart,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

pub struct ReportInput<'a> {
    pub dataset_name: &'a str,
    pub overview: &'a DatasetOverview,
    pub numeric: &'a [ColumnStats],
    pub correlation_matrix: Option<&'a CorrelationMatrix>,
    pub categories: &'a [CategoricalSummary],
}

struct Cursor {
    y: f32,
    ops: Vec<LayoutOp>,
}

impl Cursor {
    fn new() -> Self {
        Self {
            y: PAGE_HEIGHT - TOP_MARGIN,
            ops: Vec::new(),
        }
    }

    fn new_page(&mut self) {
        self.ops.push(LayoutOp::NewPage);
        self.y = PAGE_HEIGHT - TOP_MARGIN;
    }

    fn ensure_space(&mut self) {
        if self.y < MIN_BLOCK_SPACE {
            self.new_page();
        }
    }

    fn line(&mut self, font: Font, size: f32, text: impl Into<String>, advance: f32) {
        self.ops.push(LayoutOp::Text {
            font,
            size,
            x: MARGIN_X,
            y: self.y,
            text: text.into(),
        });
        self.y -= advance;
    }

    /// Image hanging below the cursor; the cursor moves by `advance`.
    fn image(&mut self, chart: RenderedChart, width: f32, height: f32, advance: f32) {
        self.ops.push(LayoutOp::Image {
            chart,
            x: MARGIN_X,
            y: self.y - height,
            width,
            height,
        });
        self.y -= advance;
    }
}

pub fn plan_report(
    input: &ReportInput<'_>,
    renderer: &dyn ChartRenderer,
    options: &ReportOptions,
) -> Result<Vec<LayoutOp>, AppError> {
    let mut cursor = Cursor::new();

    cursor.line(Font::Bold, 16.0, options.title.as_str(), 25.0);
    cursor.line(Font::Oblique, 11.0, format!("Dataset: {}", input.dataset_name), 30.0);

    cursor.line(Font::Regular, 11.0, format!("Rows: {}", input.overview.total_rows), 15.0);
    cursor.line(Font::Regular, 11.0, format!("Columns: {}", input.overview.total_columns), 15.0);
    cursor.line(Font::Regular, 11.0, format!("Date range: {}", input.overview.date_range), 30.0);

    if !input.numeric.is_empty() {
        cursor.line(Font::Bold, 13.0, "Numeric Insights", 20.0);
    }
    for stat in input.numeric {
        cursor.ensure_space();
        cursor.line(Font::Bold, 12.0, stat.column.as_str(), 15.0);
        for line in textwrap::wrap(&stat.insight, WRAP_WIDTH) {
            cursor.line(Font::Regular, 11.0, line.into_owned(), 14.0);
        }
        let chart = renderer.histogram(&stat.column, &stat.values, REPORT_HISTOGRAM_BINS, REPORT_HISTOGRAM_SIZE)?;
        cursor.image(chart, 300.0, 120.0, 150.0);
    }

    if let Some(matrix) = input.correlation_matrix {
        cursor.new_page();
        cursor.line(Font::Bold, 13.0, "Correlation Heatmap", 20.0);
        let chart = renderer.heatmap(matrix, REPORT_HEATMAP_SIZE)?;
        cursor.image(chart, 300.0, 300.0, 300.0);
    }

    if options.include_categories && !input.categories.is_empty() {
        cursor.new_page();
        cursor.line(Font::Bold, 13.0, "Top Categories", 20.0);
        for summary in input.categories {
            cursor.ensure_space();
            cursor.line(
                Font::Bold,
                12.0,
                format!("{} ({} unique values)", summary.column, summary.unique_count),
                15.0,
            );
            if summary.top_values.is_empty() {
                continue;
            }
            let chart = renderer.category_bars(summary, CATEGORY_BARS_SIZE)?;
            cursor.image(chart, 300.0, 150.0, 180.0);
        }
    }

    Ok(cursor.ops)
}

pub trait DocumentBuilder {
    fn new_page(&mut self) -> Result<(), AppError>;
    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) -> Result<(), AppError>;
    fn image(&mut self, chart: &RenderedChart, x: f32, y: f32, width: f32, height: f32) -> Result<(), AppError>;
    fn finish(self) -> Result<Vec<u8>, AppError>;
}

pub fn write_document<B: DocumentBuilder>(ops: &[LayoutOp], mut builder: B) -> Result<Vec<u8>, AppError> {
    for op in ops {
        match op {
            LayoutOp::NewPage => builder.new_page()?,
            LayoutOp::Text { font, size, x, y, text } => builder.text(*font, *size, *x, *y, text)?,
            LayoutOp::Image { chart, x, y, width, height } => {
                builder.image(chart, *x, *y, *width, *height)?
            }
        }
    }
    builder.finish()
}

fn pdf_err(e: printpdf::Error) -> AppError {
    AppError::Report(e.to_string())
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

pub struct PdfDocumentBuilder {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl PdfDocumentBuilder {
    pub fn new(title: &str) -> Result<Self, AppError> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        let oblique = doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            oblique,
        })
    }
}

impl DocumentBuilder for PdfDocumentBuilder {
    fn new_page(&mut self) -> Result<(), AppError> {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        Ok(())
    }

    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) -> Result<(), AppError> {
        let font = match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Oblique => &self.oblique,
        };
        self.layer.use_text(text, size, mm(x), mm(y), font);
        Ok(())
    }

    fn image(&mut self, chart: &RenderedChart, x: f32, y: f32, width: f32, height: f32) -> Result<(), AppError> {
        // natural size in points at IMAGE_DPI
        let natural_w = chart.width as f32 * 72.0 / IMAGE_DPI;
        let natural_h = chart.height as f32 * 72.0 / IMAGE_DPI;

        let image = Image::from_dynamic_image(&chart.to_image()?);
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(x)),
                translate_y: Some(mm(y)),
                scale_x: Some(width / natural_w),
                scale_y: Some(height / natural_h),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, AppError> {
        self.doc.save_to_bytes().map_err(pdf_err)
    }
}

/// Plans and writes the PDF in one go.
pub fn generate_pdf_report(
    input: &ReportInput<'_>,
    renderer: &dyn ChartRenderer,
    options: &ReportOptions,
) -> Result<Vec<u8>, AppError> {
    let start = std::time::Instant::now();
    let ops = plan_report(input, renderer, options)?;
    let pages = 1 + ops.iter().filter(|op| matches!(op, LayoutOp::NewPage)).count();

    let bytes = write_document(&ops, PdfDocumentBuilder::new(&options.title)?)?;
    tracing::info!(
        "Report for {} rendered: {} pages, {}KB in {:?}",
        input.dataset_name,
        pages,
        bytes.len() / 1024,
        start.elapsed()
    );
    Ok(bytes)
}
