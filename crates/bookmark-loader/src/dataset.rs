//! Tabular in-memory dataset
//!
//! Rows are JSON objects; the dataset tracks the union of column names in
//! first-seen order. Appending a dataset with different columns widens the
//! column set and leaves missing cells null, the same way a row-wise
//! concatenation of data frames behaves.

use std::io::Write;

use bookmark_common::Result;
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty dataset with a known column order.
    pub fn with_columns(columns: Vec<String>) -> Self {
        let mut dataset = Self::new();
        for column in columns {
            dataset.add_column(column);
        }
        dataset
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `index`; missing cells read as null.
    pub fn value(&self, index: usize, column: &str) -> &Value {
        self.rows
            .get(index)
            .and_then(|row| row.get(column))
            .unwrap_or(&NULL)
    }

    pub fn push_row(&mut self, row: Row) {
        for column in row.keys() {
            self.add_column(column.clone());
        }
        self.rows.push(row);
    }

    /// Append all rows of `other`, widening the column set as needed.
    pub fn append(&mut self, other: Dataset) {
        for column in other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }

    /// Write the dataset as CSV with a header row. Nulls become empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns).map_err(std::io::Error::from)?;

        for index in 0..self.rows.len() {
            let record = self.columns.iter().map(|column| match self.value(index, column) {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            csv.write_record(record).map_err(std::io::Error::from)?;
        }

        csv.flush()?;
        Ok(())
    }

    fn add_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }
}
