use crate::models::MissingData;
use crate::services::table::Table;

/// One record per column with at least one null, in table order.
pub fn check_missing_data(table: &Table) -> Vec<MissingData> {
    let total_rows = table.height();

    table
        .columns()
        .iter()
        .filter_map(|series| {
            let count = series.null_count();
            (count > 0).then(|| MissingData {
                column: series.name().to_string(),
                count,
                percentage: count as f64 / total_rows as f64 * 100.0,
            })
        })
        .collect()
}
