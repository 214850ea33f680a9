use axum::{
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::{
        CategoricalSummary, ColumnStats, CorrelationPair, DataPreview, DatasetOverview, MissingData,
    },
    services::{
        analysis::{self, AnalysisOptions},
        charts::{self, ChartRenderer, PlottersRenderer},
        fetch,
        pipeline::{self, AnalysisRun},
        table::{FileKind, LoadedTable, SampleDataset, TableSource, UploadedFile},
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/datasets/analyze", post(analyze_dataset))
        .route("/datasets/report", post(download_report))
        .route("/datasets/chart", post(render_chart))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetSource {
    Sample,
    Url { file_name: String, signed_url: String },
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    source: DatasetSource,
    /// Plain-language explanations; falls back to the configured default.
    beginner: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartKind {
    Histogram { column: String },
    Heatmap,
    Categories { column: String },
}

#[derive(Debug, Deserialize)]
pub struct ChartRequest {
    #[serde(flatten)]
    dataset: AnalyzeRequest,
    chart: ChartKind,
}

#[derive(Debug, Serialize)]
pub struct MissingLine {
    #[serde(flatten)]
    record: MissingData,
    line: String,
}

#[derive(Debug, Serialize)]
pub struct NumericSection {
    #[serde(flatten)]
    stats: ColumnStats,
    technical_details: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationLine {
    #[serde(flatten)]
    pair: CorrelationPair,
    strength: f64,
    line: String,
}

#[derive(Debug, Serialize)]
pub struct CategorySection {
    #[serde(flatten)]
    summary: CategoricalSummary,
    chart_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    dataset_name: String,
    notices: Vec<String>,
    preview: DataPreview,
    overview: DatasetOverview,
    missing: Vec<MissingLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_message: Option<String>,
    numeric: Vec<NumericSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    numeric_message: Option<String>,
    correlations: Vec<CorrelationLine>,
    correlation_caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    heatmap_explanation: Option<String>,
    heatmap_available: bool,
    categories: Vec<CategorySection>,
    report_file_name: String,
}

const PREVIEW_ROWS: usize = 5;

const HEATMAP_EXPLANATION: &str = "This chart shows how numbers move together.\n\n\
Blue = values increase together\n\
Red = one increases while the other decreases\n\
Darker color = stronger relationship";

fn options_for(state: &AppState, request: &AnalyzeRequest) -> AnalysisOptions {
    AnalysisOptions {
        beginner: request.beginner.unwrap_or(state.config.analysis.beginner),
        ..state.config.analysis.clone()
    }
}

async fn load_dataset(state: &AppState, source: &DatasetSource) -> Result<LoadedTable, AppError> {
    match source {
        DatasetSource::Sample => SampleDataset.load(),
        DatasetSource::Url { file_name, signed_url } => {
            // reject before spending a download on it
            FileKind::from_file_name(file_name)?;
            let bytes =
                fetch::load_file_from_url(&state.http, signed_url, state.config.max_file_size).await?;
            UploadedFile::new(file_name.clone(), bytes).load()
        }
    }
}

fn build_response(
    loaded: LoadedTable,
    run: AnalysisRun,
    options: &AnalysisOptions,
    chart_limit: usize,
) -> Result<AnalyzeResponse, AppError> {
    let LoadedTable { table, mut notices } = loaded;
    let preview = table.preview(PREVIEW_ROWS)?;
    notices.push(format!(
        "Loaded {} rows × {} columns",
        table.height(),
        table.width()
    ));

    let missing_message = run.missing.is_empty().then(|| "No missing data found.".to_string());
    let missing = run
        .missing
        .into_iter()
        .map(|record| MissingLine {
            line: format!(
                "{}: {} missing ({:.1}%)",
                record.column, record.count, record.percentage
            ),
            record,
        })
        .collect();

    let numeric_message = run
        .numeric
        .is_empty()
        .then(|| "No usable numeric columns found.".to_string());
    let numeric = run
        .numeric
        .into_iter()
        .map(|stats| NumericSection {
            technical_details: vec![
                format!("Average: {:.2}", stats.mean),
                format!("Median: {:.2}", stats.median),
                format!("Range: {:.2} → {:.2}", stats.min, stats.max),
                format!("Outliers detected: {}", stats.outlier_count),
            ],
            stats,
        })
        .collect();

    let has_correlations = !run.correlations.is_empty();
    let correlations = run
        .correlations
        .into_iter()
        .map(|pair| CorrelationLine {
            strength: pair.correlation.abs(),
            line: format!(
                "{} vs {} (strength: {:.2}, {})",
                pair.column1,
                pair.column2,
                pair.correlation.abs(),
                pair.direction.as_str()
            ),
            pair,
        })
        .collect();

    let categories = run
        .categories
        .into_iter()
        .map(|summary| {
            let too_many = summary.too_many_to_visualize(chart_limit);
            CategorySection {
                chart_available: !too_many && !summary.top_values.is_empty(),
                note: too_many.then(|| "Too many unique values to visualize clearly.".to_string()),
                summary,
            }
        })
        .collect();

    Ok(AnalyzeResponse {
        report_file_name: pipeline::report_file_name(&table),
        dataset_name: table.name().to_string(),
        notices,
        preview,
        overview: run.overview,
        missing,
        missing_message,
        numeric,
        numeric_message,
        correlations,
        correlation_caption: Some(if has_correlations {
            "Correlation shows association, not causation.".to_string()
        } else {
            "No strong relationships detected.".to_string()
        }),
        heatmap_explanation: (has_correlations && options.beginner)
            .then(|| HEATMAP_EXPLANATION.to_string()),
        heatmap_available: has_correlations && run.correlation_matrix.is_some(),
        categories,
    })
}

async fn analyze_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let start = std::time::Instant::now();
    let options = options_for(&state, &request);

    let loaded = load_dataset(&state, &request.source).await?;
    let run = pipeline::run_analysis(&loaded.table, &options)?;
    let response = build_response(loaded, run, &options, state.config.max_chart_categories)?;

    tracing::info!("Analysis of {} served in {:?}", response.dataset_name, start.elapsed());
    Ok(Json(response))
}

async fn download_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Response, AppError> {
    let options = options_for(&state, &request);

    let loaded = load_dataset(&state, &request.source).await?;
    let run = pipeline::run_analysis(&loaded.table, &options)?;
    let pdf = pipeline::build_report(&loaded.table, &run, &PlottersRenderer, &state.config.report)?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        pipeline::report_file_name(&loaded.table).replace('"', "'")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

async fn render_chart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChartRequest>,
) -> Result<Response, AppError> {
    let options = options_for(&state, &request.dataset);
    let loaded = load_dataset(&state, &request.dataset.source).await?;
    let table = &loaded.table;
    let renderer = PlottersRenderer;

    let chart = match &request.chart {
        ChartKind::Histogram { column } => {
            let series = table
                .column(column)
                .filter(|s| s.dtype().is_numeric())
                .ok_or_else(|| AppError::InvalidInput(format!("{} is not a numeric column", column)))?;
            let values: Vec<f64> = analysis::as_f64(&series.drop_nulls())?
                .into_no_null_iter()
                .collect();
            renderer.histogram(
                &format!("Distribution of {}", column),
                &values,
                charts::interactive_bin_count(values.len()),
                charts::INTERACTIVE_HISTOGRAM_SIZE,
            )?
        }
        ChartKind::Heatmap => {
            let matrix = analysis::correlation_matrix(table)?.ok_or_else(|| {
                AppError::InvalidInput("At least two numeric columns are needed for a heatmap".to_string())
            })?;
            renderer.heatmap(&matrix, charts::INTERACTIVE_HEATMAP_SIZE)?
        }
        ChartKind::Categories { column } => {
            let summary = analysis::analyze_categorical_columns(
                table,
                options.max_categorical_columns,
                options.top_values,
            )?
            .into_iter()
            .find(|summary| &summary.column == column)
            .ok_or_else(|| {
                AppError::InvalidInput(format!("{} is not a summarized text column", column))
            })?;
            if summary.too_many_to_visualize(state.config.max_chart_categories) {
                return Err(AppError::InvalidInput(
                    "Too many unique values to visualize clearly.".to_string(),
                ));
            }
            renderer.category_bars(&summary, charts::CATEGORY_BARS_SIZE)?
        }
    };

    Ok(([(header::CONTENT_TYPE, "image/png")], chart.to_png()?).into_response())
}
