use crate::models::{TableData, TableRow};

/// Finds the table row describing a booking.
///
/// A row whose container cell contains `container_number` wins; otherwise the
/// row whose ID cell equals `tv_app_id`.
pub fn find_row(table: &TableData, container_number: &str, tv_app_id: &str) -> Option<TableRow> {
    let rows = table.rows();
    let container = container_number.trim();
    if !container.is_empty() {
        if let Some(row) = rows
            .iter()
            .find(|row| row.container_number.contains(container))
        {
            return Some(row.clone());
        }
    }
    rows.into_iter().find(|row| row.id == tv_app_id)
}
