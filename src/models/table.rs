//! Grid snapshot of the booking page table (`tableData`).
//!
//! The first row holds the column names; every following row is one booking.

use serde::{Deserialize, Serialize};

pub const COLUMN_STATUS: &str = "Status";
pub const COLUMN_ID: &str = "ID";
pub const COLUMN_DATE: &str = "Date";
pub const COLUMN_START: &str = "Start";
pub const COLUMN_END: &str = "End";
pub const COLUMN_CONTAINER_NUMBER: &str = "Container Number";

/// 2-D string grid as scraped from the booking page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableData(pub Vec<Vec<String>>);

/// A data row with cells resolved by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub status: String,
    pub id: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub container_number: String,
}

impl TableRow {
    /// `"{date} {start}"`, trimmed when either part is missing.
    pub fn slot(&self) -> String {
        format!("{} {}", self.date, self.start).trim().to_string()
    }
}

impl TableData {
    /// Index of a column by header name (case and surrounding whitespace ignored).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.0
            .first()?
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(name))
    }

    /// Data rows (every row after the header), with cells resolved by name.
    ///
    /// Missing columns and short rows yield empty cells.
    pub fn rows(&self) -> Vec<TableRow> {
        let status = self.column(COLUMN_STATUS);
        let id = self.column(COLUMN_ID);
        let date = self.column(COLUMN_DATE);
        let start = self.column(COLUMN_START);
        let end = self.column(COLUMN_END);
        let container = self.column(COLUMN_CONTAINER_NUMBER);

        let cell = |row: &[String], idx: Option<usize>| -> String {
            idx.and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        self.0
            .iter()
            .skip(1)
            .map(|row| TableRow {
                status: cell(row, status),
                id: cell(row, id),
                date: cell(row, date),
                start: cell(row, start),
                end: cell(row, end),
                container_number: cell(row, container),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() <= 1
    }
}
