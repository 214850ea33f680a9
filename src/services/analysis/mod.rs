//! The analyzers. Each one is a pure function over a loaded [`Table`].
//!
//! [`Table`]: crate::services::table::Table

pub mod categorical;
pub mod correlation;
pub mod numeric;
pub mod overview;
pub mod quality;

use polars::prelude::*;

pub use categorical::analyze_categorical_columns;
pub use correlation::{correlation_matrix, find_correlations};
pub use numeric::{analyze_numeric_columns, generate_numeric_insight, is_likely_identifier};
pub use overview::{get_dataset_overview, identify_date_range};
pub use quality::check_missing_data;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub max_numeric_columns: usize,
    pub max_categorical_columns: usize,
    pub correlation_threshold: f64,
    pub top_values: usize,
    /// Distinct/row ratio above which a numeric column is treated as a key.
    pub identifier_unique_ratio: f64,
    /// Share of parseable values needed to call a text column a date column.
    pub date_parse_ratio: f64,
    pub beginner: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_numeric_columns: 3,
            max_categorical_columns: 2,
            correlation_threshold: 0.5,
            top_values: 10,
            identifier_unique_ratio: 0.95,
            date_parse_ratio: 0.7,
            beginner: true,
        }
    }
}

/// Numeric series as `f64`, nulls preserved.
pub(crate) fn as_f64(series: &Series) -> PolarsResult<Float64Chunked> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.clone())
}
