use super::as_f64;
use crate::error::AppError;
use crate::models::{CorrelationMatrix, CorrelationPair, Direction};
use crate::services::table::Table;

/// Pearson's r over the rows where both sides are present. NaN when fewer
/// than two such rows exist or either side is constant.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Full matrix over every numeric column; `None` with fewer than two.
pub fn correlation_matrix(table: &Table) -> Result<Option<CorrelationMatrix>, AppError> {
    let numeric = table.numeric_columns();
    if numeric.len() < 2 {
        return Ok(None);
    }

    let columns: Vec<String> = numeric.iter().map(|s| s.name().to_string()).collect();
    let data = numeric
        .iter()
        .map(|series| Ok(as_f64(series)?.into_iter().collect::<Vec<Option<f64>>>()))
        .collect::<Result<Vec<_>, AppError>>()?;

    let n = data.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(Some(CorrelationMatrix { columns, values }))
}

/// Upper-triangle pairs with `|r| >= threshold`, in column order.
pub fn pairs_above_threshold(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelationPair> {
    let n = matrix.size();
    let mut results = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let r = matrix.get(i, j);
            if r.abs() >= threshold {
                results.push(CorrelationPair {
                    column1: matrix.columns[i].clone(),
                    column2: matrix.columns[j].clone(),
                    correlation: r,
                    direction: Direction::of(r),
                });
            }
        }
    }

    results
}

pub fn find_correlations(table: &Table, threshold: f64) -> Result<Vec<CorrelationPair>, AppError> {
    Ok(correlation_matrix(table)?
        .map(|matrix| pairs_above_threshold(&matrix, threshold))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::fixtures::{floats, table, texts};

    fn series(name: &str, values: &[f64]) -> polars::prelude::Series {
        let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        floats(name, &values)
    }

    #[test]
    fn perfect_relationships() {
        let x = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let up = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let down = [Some(8.0), Some(6.0), Some(4.0), Some(2.0)];
        assert!((pearson(&x, &up) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &down) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn uses_pairwise_complete_rows() {
        let x = [Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let y = [Some(2.0), Some(100.0), Some(6.0), None, Some(10.0)];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_undefined() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let flat = [Some(5.0), Some(5.0), Some(5.0)];
        assert!(pearson(&x, &flat).is_nan());
    }

    #[test]
    fn matrix_needs_two_numeric_columns() {
        let t = table(vec![series("only", &[1.0, 2.0, 3.0]), texts("t", &[Some("a"), Some("b"), Some("c")])]);
        assert!(correlation_matrix(&t).unwrap().is_none());
        assert!(find_correlations(&t, 0.5).unwrap().is_empty());
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let t = table(vec![
            series("a", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            series("b", &[2.0, 1.0, 4.0, 3.0, 6.0]),
            series("c", &[9.0, 7.0, 8.0, 3.0, 1.0]),
        ]);
        let matrix = correlation_matrix(&t).unwrap().unwrap();
        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert!((matrix.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn anti_correlated_pair_is_negative() {
        let t = table(vec![
            series("supply", &[1.0, 2.0, 3.0, 4.0]),
            series("price", &[40.0, 30.0, 20.0, 10.0]),
        ]);
        let pairs = find_correlations(&t, 0.5).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].column1, "supply");
        assert_eq!(pairs[0].column2, "price");
        assert_eq!(pairs[0].direction, Direction::Negative);
        assert!((pairs[0].correlation + 1.0).abs() < 1e-12);
    }

    #[test]
    fn weak_pairs_are_filtered_in_upper_triangle_order() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![1.0, 0.2, 0.5],
                vec![0.2, 1.0, -0.7],
                vec![0.5, -0.7, 1.0],
            ],
        };
        let pairs = pairs_above_threshold(&matrix, 0.5);
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.column1.as_str(), p.column2.as_str()))
            .collect();
        assert_eq!(names, vec![("a", "c"), ("b", "c")]);
        assert_eq!(pairs[0].direction, Direction::Positive);
        assert_eq!(pairs[1].direction, Direction::Negative);
    }

    #[test]
    fn zero_coefficient_is_labelled_negative() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".into(), "b".into()],
            values: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        let pairs = pairs_above_threshold(&matrix, 0.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].direction, Direction::Negative);
    }
}
