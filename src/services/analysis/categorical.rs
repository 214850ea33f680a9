use indexmap::IndexMap;

use crate::error::AppError;
use crate::models::CategoricalSummary;
use crate::services::table::Table;

/// Summaries for the first `max_columns` text columns. Nulls are neither
/// counted as a distinct value nor listed among the top values.
pub fn analyze_categorical_columns(
    table: &Table,
    max_columns: usize,
    top_n: usize,
) -> Result<Vec<CategoricalSummary>, AppError> {
    table
        .text_columns()
        .into_iter()
        .take(max_columns)
        .map(|series| {
            let values = series.str()?;

            // insertion order doubles as the first-appearance tie-break
            let mut counts: IndexMap<&str, usize> = IndexMap::new();
            for value in values.into_iter().flatten() {
                *counts.entry(value).or_insert(0) += 1;
            }
            let unique_count = counts.len();

            let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            Ok(CategoricalSummary {
                column: series.name().to_string(),
                unique_count,
                top_values: ranked
                    .into_iter()
                    .take(top_n)
                    .map(|(value, count)| (value.to_string(), count))
                    .collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::fixtures::{floats, table, texts};

    #[test]
    fn ranks_by_count_then_first_appearance() {
        let t = table(vec![texts(
            "fruit",
            &[Some("pear"), Some("fig"), Some("apple"), Some("fig"), None, Some("apple"), Some("kiwi")],
        )]);
        let summaries = analyze_categorical_columns(&t, 2, 10).unwrap();
        assert_eq!(summaries.len(), 1);
        let fruit = &summaries[0];
        assert_eq!(fruit.unique_count, 4);
        let order: Vec<(&str, usize)> = fruit.top_values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(order, vec![("fig", 2), ("apple", 2), ("pear", 1), ("kiwi", 1)]);
    }

    #[test]
    fn keeps_only_top_n_values() {
        let labels: Vec<String> = (0..15).map(|i| format!("v{i}")).collect();
        let values: Vec<Option<&str>> = labels.iter().map(|s| Some(s.as_str())).collect();
        let t = table(vec![texts("code", &values)]);
        let summary = &analyze_categorical_columns(&t, 2, 10).unwrap()[0];
        assert_eq!(summary.unique_count, 15);
        assert_eq!(summary.top_values.len(), 10);
        assert!(summary.too_many_to_visualize(12));
        assert!(!summary.too_many_to_visualize(50));
    }

    #[test]
    fn caps_columns_in_table_order() {
        let t = table(vec![
            texts("a", &[Some("x")]),
            floats("n", &[Some(1.0)]),
            texts("b", &[Some("y")]),
            texts("c", &[Some("z")]),
        ]);
        let names: Vec<String> = analyze_categorical_columns(&t, 2, 10)
            .unwrap()
            .into_iter()
            .map(|s| s.column)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
