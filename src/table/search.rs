use super::column::ColumnDescriptor;
use super::value::{display_text, Row};

/// True when any column's text contains `needle`, which must already be
/// lower-cased. Matches against the raw value, not the rendered cell.
pub fn row_matches(row: &Row, columns: &[ColumnDescriptor], needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    columns
        .iter()
        .any(|c| display_text(c.value(row)).to_lowercase().contains(needle))
}

/// Indices of the rows that match `query`, in input order.
pub fn filter_rows(rows: &[Row], columns: &[ColumnDescriptor], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, r)| row_matches(r, columns, &needle))
        .map(|(i, _)| i)
        .collect()
}
