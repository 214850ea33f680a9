use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DatasetOverview, NO_DATE_COLUMN};
use crate::services::table::Table;

struct DateShape {
    pattern: Regex,
    formats: &'static [&'static str],
    allow_rfc3339: bool,
}

impl DateShape {
    fn new(pattern: &str, formats: &'static [&'static str], allow_rfc3339: bool) -> Self {
        Self {
            // patterns are literals below
            pattern: Regex::new(pattern).unwrap(),
            formats,
            allow_rfc3339,
        }
    }
}

static DATE_SHAPES: Lazy<Vec<DateShape>> = Lazy::new(|| {
    vec![
        DateShape::new(r"^\d{4}-\d{1,2}-\d{1,2}$", &["%Y-%m-%d"], false),
        DateShape::new(r"^\d{4}/\d{1,2}/\d{1,2}$", &["%Y/%m/%d"], false),
        DateShape::new(r"^\d{1,2}/\d{1,2}/\d{4}$", &["%m/%d/%Y", "%d/%m/%Y"], false),
        DateShape::new(r"^\d{1,2}-\d{1,2}-\d{4}$", &["%m-%d-%Y", "%d-%m-%Y"], false),
        DateShape::new(r"^\d{1,2}\.\d{1,2}\.\d{4}$", &["%d.%m.%Y"], false),
        DateShape::new(
            r"^\d{4}-\d{1,2}-\d{1,2}[ T]\d{1,2}:\d{2}",
            &[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%dT%H:%M",
            ],
            true,
        ),
        DateShape::new(r"^\d{1,2} [A-Za-z]{3,9} \d{4}$", &["%d %b %Y"], false),
        DateShape::new(r"^[A-Za-z]{3,9} \d{1,2}, \d{4}$", &["%b %d, %Y"], false),
    ]
});

/// Parses a single cell as a calendar date; anything unrecognised is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    let shape = DATE_SHAPES.iter().find(|shape| shape.pattern.is_match(value))?;

    shape
        .formats
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(value, fmt).ok().map(|dt| dt.date()))
        })
        .or_else(|| {
            shape
                .allow_rfc3339
                .then(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
                .flatten()
        })
}

/// First text column whose values mostly parse as dates, rendered as `"<min> to <max>"`.
pub fn identify_date_range(table: &Table, min_parse_ratio: f64) -> String {
    for series in table.text_columns() {
        let Ok(values) = series.str() else {
            continue;
        };
        if values.is_empty() {
            continue;
        }

        let dates: Vec<NaiveDate> = values
            .into_iter()
            .filter_map(|value| value.and_then(parse_date))
            .collect();
        let ratio = dates.len() as f64 / values.len() as f64;
        tracing::debug!("Date probe on {}: {:.2} parsed", series.name(), ratio);

        if ratio > min_parse_ratio {
            if let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) {
                return format!("{} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d"));
            }
        }
    }

    NO_DATE_COLUMN.to_string()
}

pub fn get_dataset_overview(table: &Table, min_parse_ratio: f64) -> DatasetOverview {
    DatasetOverview {
        total_rows: table.height(),
        total_columns: table.width(),
        date_range: identify_date_range(table, min_parse_ratio),
    }
}
