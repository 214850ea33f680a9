use crate::error::AppError;
use crate::models::{
    CategoricalSummary, ColumnStats, CorrelationMatrix, CorrelationPair, DatasetOverview, MissingData,
};
use crate::services::analysis::{self, AnalysisOptions};
use crate::services::charts::ChartRenderer;
use crate::services::report::{self, ReportInput, ReportOptions};
use crate::services::table::Table;

/// Everything derived from one table in one request.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub overview: DatasetOverview,
    pub missing: Vec<MissingData>,
    pub numeric: Vec<ColumnStats>,
    pub correlations: Vec<CorrelationPair>,
    pub correlation_matrix: Option<CorrelationMatrix>,
    pub categories: Vec<CategoricalSummary>,
}

pub fn run_analysis(table: &Table, options: &AnalysisOptions) -> Result<AnalysisRun, AppError> {
    let start = std::time::Instant::now();
    tracing::info!(
        "Analyzing {} ({} rows x {} columns)",
        table.name(),
        table.height(),
        table.width()
    );

    let overview = analysis::get_dataset_overview(table, options.date_parse_ratio);
    let missing = analysis::check_missing_data(table);
    let numeric = analysis::analyze_numeric_columns(table, options)?;

    let correlation_matrix = analysis::correlation_matrix(table)?;
    let correlations = correlation_matrix
        .as_ref()
        .map(|matrix| {
            analysis::correlation::pairs_above_threshold(matrix, options.correlation_threshold)
        })
        .unwrap_or_default();

    let categories = analysis::analyze_categorical_columns(
        table,
        options.max_categorical_columns,
        options.top_values,
    )?;

    tracing::info!(
        "Analysis of {} finished in {:?}: {} incomplete columns, {} numeric summaries, {} correlations, {} categorical summaries",
        table.name(),
        start.elapsed(),
        missing.len(),
        numeric.len(),
        correlations.len(),
        categories.len()
    );

    Ok(AnalysisRun {
        overview,
        missing,
        numeric,
        correlations,
        correlation_matrix,
        categories,
    })
}

pub fn build_report(
    table: &Table,
    run: &AnalysisRun,
    renderer: &dyn ChartRenderer,
    options: &ReportOptions,
) -> Result<Vec<u8>, AppError> {
    let input = ReportInput {
        dataset_name: table.name(),
        overview: &run.overview,
        numeric: &run.numeric,
        correlation_matrix: run.correlation_matrix.as_ref(),
        categories: &run.categories,
    };
    report::generate_pdf_report(&input, renderer, options)
}

/// Download name offered for a table's report.
pub fn report_file_name(table: &Table) -> String {
    format!("{} report.pdf", table.display_stem())
}
