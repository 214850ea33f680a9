use polars::prelude::*;

use super::{as_f64, AnalysisOptions};
use crate::error::AppError;
use crate::models::ColumnStats;
use crate::services::table::Table;

pub fn generate_numeric_insight(column: &str, mean: f64, min: f64, max: f64, beginner: bool) -> String {
    if beginner {
        format!(
            "This column shows {}. Most values are around {:.1}. Values usually fall between {:.1} and {:.1}.",
            column, mean, min, max
        )
    } else {
        format!("For {}, the mean is {:.2}.", column, mean)
    }
}

/// Row keys look like measurements but carry no signal: match on the name,
/// or on nearly every row holding a distinct value.
pub fn is_likely_identifier(
    non_null: &Series,
    column_name: &str,
    total_rows: usize,
    max_unique_ratio: f64,
) -> PolarsResult<bool> {
    let name = column_name.to_lowercase();
    if name.contains("id") || name.contains("uuid") {
        return Ok(true);
    }
    if total_rows == 0 {
        return Ok(false);
    }
    Ok(non_null.n_unique()? as f64 / total_rows as f64 > max_unique_ratio)
}

/// Summaries of the first `max_numeric_columns` usable numeric columns.
pub fn analyze_numeric_columns(
    table: &Table,
    options: &AnalysisOptions,
) -> Result<Vec<ColumnStats>, AppError> {
    let mut results = Vec::new();
    if options.max_numeric_columns == 0 {
        return Ok(results);
    }

    for series in table.numeric_columns() {
        let name = series.name();
        let non_null = series.drop_nulls();
        if non_null.is_empty() {
            tracing::debug!("Skipping {}: no values", name);
            continue;
        }
        if is_likely_identifier(&non_null, name, table.height(), options.identifier_unique_ratio)? {
            tracing::debug!("Skipping {}: looks like an identifier", name);
            continue;
        }

        let values = as_f64(&non_null)?;
        let (Some(mean), Some(median), Some(min), Some(max)) =
            (values.mean(), values.median(), values.min(), values.max())
        else {
            continue;
        };
        let std = if values.len() > 1 {
            values.std(1).filter(|s| s.is_finite())
        } else {
            None
        };

        results.push(ColumnStats {
            column: name.to_string(),
            mean,
            median,
            min,
            max,
            std,
            outlier_count: 0,
            insight: generate_numeric_insight(name, mean, min, max, options.beginner),
            values: values.into_no_null_iter().collect(),
        });

        if results.len() >= options.max_numeric_columns {
            break;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::fixtures::{floats, table, texts};

    fn repeating(name: &str, n: usize, cycle: usize) -> Series {
        let values: Vec<Option<f64>> = (0..n).map(|i| Some((i % cycle) as f64)).collect();
        floats(name, &values)
    }

    #[test]
    fn insight_templates() {
        assert_eq!(
            generate_numeric_insight("price", 12.345, 1.0, 99.96, true),
            "This column shows price. Most values are around 12.3. Values usually fall between 1.0 and 100.0."
        );
        assert_eq!(
            generate_numeric_insight("price", 12.345, 1.0, 99.96, false),
            "For price, the mean is 12.35."
        );
    }

    #[test]
    fn identifier_names_are_excluded() {
        let t = table(vec![
            repeating("Product_ID", 20, 3),
            repeating("session_uuid", 20, 3),
            repeating("score", 20, 3),
        ]);
        let stats = analyze_numeric_columns(&t, &AnalysisOptions::default()).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["score"]);
    }

    #[test]
    fn mostly_unique_columns_are_excluded() {
        let t = table(vec![repeating("serial", 40, 40), repeating("level", 40, 4)]);
        let stats = analyze_numeric_columns(&t, &AnalysisOptions::default()).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].column, "level");
    }

    #[test]
    fn stops_at_the_cap_in_table_order() {
        let t = table(vec![
            repeating("a", 10, 2),
            texts("label", &[Some("x"); 10]),
            repeating("b", 10, 3),
            repeating("c", 10, 4),
            repeating("d", 10, 5),
        ]);
        let options = AnalysisOptions {
            max_numeric_columns: 2,
            ..AnalysisOptions::default()
        };
        let stats = analyze_numeric_columns(&t, &options).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn computes_summary_over_non_null_values() {
        let t = table(vec![floats(
            "load",
            &[Some(1.0), Some(2.0), None, Some(2.0), Some(5.0), Some(2.0)],
        )]);
        let stats = analyze_numeric_columns(&t, &AnalysisOptions::default()).unwrap();
        let load = &stats[0];
        assert!((load.mean - 2.4).abs() < 1e-9);
        assert_eq!(load.median, 2.0);
        assert_eq!(load.min, 1.0);
        assert_eq!(load.max, 5.0);
        assert!((load.std.unwrap() - 1.516575).abs() < 1e-5);
        assert_eq!(load.outlier_count, 0);
        assert_eq!(load.values, vec![1.0, 2.0, 2.0, 5.0, 2.0]);
    }

    #[test]
    fn all_null_columns_are_skipped() {
        let t = table(vec![floats("empty", &[None, None]), floats("v", &[Some(1.0), Some(1.0)])]);
        let stats = analyze_numeric_columns(&t, &AnalysisOptions::default()).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].column, "v");
        assert!(stats[0].std.is_none() || stats[0].std == Some(0.0));
    }
}
