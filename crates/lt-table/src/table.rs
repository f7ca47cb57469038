use std::cmp::Ordering;

use lt_core::{stable_hash_string, LtError};
use serde::{Deserialize, Serialize};

/// One indexed row of a [`LightTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub index: Vec<f64>,
    pub values: Vec<f64>,
}

/// Detection probabilities indexed by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightTable {
    pub index_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl LightTable {
    pub fn new(index_columns: Vec<String>, value_columns: Vec<String>) -> Self {
        Self {
            index_columns,
            value_columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Orders rows by their index, lexicographically.
    pub fn sort_index(&mut self) {
        self.rows.sort_by(|a, b| compare_index(&a.index, &b.index));
    }

    /// Prefixes every value column with `<prefix>_`.
    pub fn prefix_columns(&mut self, prefix: &str) {
        for column in &mut self.value_columns {
            *column = format!("{prefix}_{column}");
        }
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.value_columns.iter().position(|name| name == column)
    }

    pub fn row(&self, index: &[f64]) -> Option<&TableRow> {
        self.rows.iter().find(|row| row.index == index)
    }

    /// Value of `column` at `index`, if both exist.
    pub fn value(&self, index: &[f64], column: &str) -> Option<f64> {
        let position = self.column_position(column)?;
        self.row(index).map(|row| row.values[position])
    }

    /// SHA-256 of the canonical JSON encoding.
    pub fn fingerprint(&self) -> Result<String, LtError> {
        stable_hash_string(self)
    }
}

fn compare_index(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}
