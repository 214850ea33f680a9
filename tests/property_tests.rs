//! Property-based tests for the analyzers.
//!
//! Tables are generated with a random mix of numeric and text columns,
//! including nulls, and every analyzer is checked against its invariants.
//!
//! ```bash
//! PROPTEST_CASES=2000 cargo test --test property_tests
//! ```

use polars::prelude::*;
use proptest::prelude::*;

use statscope::services::analysis::{self, AnalysisOptions};
use statscope::services::table::Table;

// =============================================================================
// Test Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum GeneratedColumn {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

fn numeric_column(rows: usize) -> impl Strategy<Value = GeneratedColumn> {
    prop::collection::vec(prop::option::weighted(0.85, -1_000i32..1_000), rows)
        .prop_map(|values| GeneratedColumn::Numeric(values.into_iter().map(|v| v.map(f64::from)).collect()))
}

fn text_column(rows: usize) -> impl Strategy<Value = GeneratedColumn> {
    prop::collection::vec(prop::option::weighted(0.85, "[a-e]{1,2}"), rows).prop_map(GeneratedColumn::Text)
}

fn column_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{3,8}",
        "[a-z]{0,4}_?(id|ID|uuid)",
    ]
}

fn arbitrary_table() -> impl Strategy<Value = Table> {
    (1usize..40).prop_flat_map(|rows| {
        prop::collection::vec(
            (column_name(), prop_oneof![numeric_column(rows), text_column(rows)]),
            1..7,
        )
        .prop_map(|columns| {
            let series: Vec<Series> = columns
                .into_iter()
                .enumerate()
                .map(|(index, (name, column))| {
                    // suffix keeps generated names unique
                    let name = format!("{}{}", name, index);
                    match column {
                        GeneratedColumn::Numeric(values) => Series::new(&name, values),
                        GeneratedColumn::Text(values) => Series::new(&name, values),
                    }
                })
                .collect();
            Table::new("generated.csv", DataFrame::new(series).unwrap())
        })
    })
}

fn options() -> impl Strategy<Value = AnalysisOptions> {
    (0usize..5, 0usize..4, 0.05f64..1.0).prop_map(|(numeric, categorical, threshold)| AnalysisOptions {
        max_numeric_columns: numeric,
        max_categorical_columns: categorical,
        correlation_threshold: threshold,
        ..AnalysisOptions::default()
    })
}

// =============================================================================
// Overview & Quality
// =============================================================================

proptest! {
    #[test]
    fn overview_matches_table_shape(table in arbitrary_table()) {
        let overview = analysis::get_dataset_overview(&table, 0.7);
        prop_assert_eq!(overview.total_rows, table.height());
        prop_assert_eq!(overview.total_columns, table.width());
    }

    #[test]
    fn missing_records_only_for_columns_with_nulls(table in arbitrary_table()) {
        let missing = analysis::check_missing_data(&table);
        for record in &missing {
            prop_assert!(record.count > 0);
            let expected = 100.0 * record.count as f64 / table.height() as f64;
            prop_assert!((record.percentage - expected).abs() < 1e-9);
        }
        let with_nulls = table.columns().iter().filter(|s| s.null_count() > 0).count();
        prop_assert_eq!(missing.len(), with_nulls);
    }
}

// =============================================================================
// Numeric & Correlation
// =============================================================================

proptest! {
    #[test]
    fn numeric_selection_respects_cap_and_identifier_rule(
        table in arbitrary_table(),
        options in options(),
    ) {
        let stats = analysis::analyze_numeric_columns(&table, &options).unwrap();
        prop_assert!(stats.len() <= options.max_numeric_columns);
        for record in &stats {
            let name = record.column.to_lowercase();
            prop_assert!(!name.contains("id") && !name.contains("uuid"));

            let distinct = table.column(&record.column).unwrap().drop_nulls().n_unique().unwrap();
            prop_assert!(distinct as f64 / table.height() as f64 <= options.identifier_unique_ratio);

            prop_assert!(record.min <= record.mean && record.mean <= record.max);
            prop_assert_eq!(record.outlier_count, 0);
            prop_assert!(!record.values.is_empty());
        }
    }

    #[test]
    fn correlation_pairs_meet_threshold_without_repeats(
        table in arbitrary_table(),
        threshold in 0.05f64..1.0,
    ) {
        let pairs = analysis::find_correlations(&table, threshold).unwrap();
        let mut seen = std::collections::HashSet::new();
        for pair in &pairs {
            prop_assert!(pair.correlation.abs() >= threshold);
            prop_assert_ne!(&pair.column1, &pair.column2);
            let key = if pair.column1 < pair.column2 {
                (pair.column1.clone(), pair.column2.clone())
            } else {
                (pair.column2.clone(), pair.column1.clone())
            };
            prop_assert!(seen.insert(key));
        }
    }

    #[test]
    fn correlation_matrix_shape(table in arbitrary_table()) {
        let numeric = table.numeric_columns().len();
        match analysis::correlation_matrix(&table).unwrap() {
            None => prop_assert!(numeric < 2),
            Some(matrix) => {
                prop_assert!(numeric >= 2);
                prop_assert_eq!(matrix.size(), numeric);
                for i in 0..matrix.size() {
                    let diagonal = matrix.get(i, i);
                    prop_assert!(diagonal.is_nan() || (diagonal - 1.0).abs() < 1e-9);
                    for j in 0..matrix.size() {
                        let (a, b) = (matrix.get(i, j), matrix.get(j, i));
                        prop_assert!((a.is_nan() && b.is_nan()) || a == b);
                    }
                }
            }
        }
    }
}

// =============================================================================
// Categorical
// =============================================================================

proptest! {
    #[test]
    fn categorical_summaries_are_capped_and_sorted(
        table in arbitrary_table(),
        options in options(),
    ) {
        let summaries = analysis::analyze_categorical_columns(
            &table,
            options.max_categorical_columns,
            options.top_values,
        )
        .unwrap();
        prop_assert!(summaries.len() <= options.max_categorical_columns);
        for summary in &summaries {
            prop_assert!(summary.top_values.len() <= 10);
            prop_assert!(summary.top_values.len() <= summary.unique_count);
            let counts: Vec<usize> = summary.top_values.values().copied().collect();
            prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
