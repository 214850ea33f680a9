use indexmap::IndexMap;
use serde::Serialize;

pub const NO_DATE_COLUMN: &str = "No date column detected";

/// First rows of a table with every cell rendered as text; `None` is a null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_rows: usize,
    pub total_columns: usize,
    pub date_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingData {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; undefined for a single observation.
    pub std: Option<f64>,
    /// Always zero: outlier detection is not performed.
    pub outlier_count: usize,
    pub insight: String,
    /// Non-null values, kept for chart rendering.
    #[serde(skip)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Zero is labelled negative; only reachable with a threshold <= 0.
    pub fn of(coefficient: f64) -> Self {
        if coefficient > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub column1: String,
    pub column2: String,
    pub correlation: f64,
    pub direction: Direction,
}

/// Square, symmetric matrix of Pearson coefficients over the numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub unique_count: usize,
    /// Most frequent values, descending by count.
    pub top_values: IndexMap<String, usize>,
}

impl CategoricalSummary {
    pub fn too_many_to_visualize(&self, limit: usize) -> bool {
        self.unique_count > limit
    }
}
