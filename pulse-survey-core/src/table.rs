//! In-memory result table produced by the data fetch.
//!
//! Column names are exactly the query's output aliases; cell values are
//! nullable strings in server row order. The table is materialized in full
//! before any export begins.

use std::collections::HashMap;

/// A fully materialized query result: named columns plus rows of nullable
/// string cells, preserving the order the server returned them in.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultTable {
    /// Builds a table from column names and row data.
    ///
    /// Rows shorter than the column list read as null in the missing
    /// trailing positions.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in select-list order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Cell value at (`row`, `column name`); `None` for SQL null, an absent
    /// column, or an out-of-range row.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Cell value at (`row`, positional `col`).
    pub fn value_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Appends additional rows, used when draining result partitions.
    pub fn extend_rows(&mut self, rows: Vec<Vec<Option<String>>>) {
        self.rows.extend(rows);
    }
}
