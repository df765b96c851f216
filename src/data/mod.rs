//! Raw dataset loading
//!
//! The raw listing table arrives from the data provider as CSV. Schema and
//! sentinel codes are documented externally; loading only gets the table
//! into memory and fails fast on unreadable input.

use crate::error::{ListingError, Result};
use polars::prelude::*;
use std::fs::File;

/// Loader for the raw listing table.
pub struct DatasetLoader {
    infer_schema_length: Option<usize>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Set the number of rows used for dtype inference.
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n);
        self
    }

    /// Load a CSV file with a header row.
    pub fn load_csv(&self, path: &str) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| ListingError::Data(format!("cannot open '{}': {}", path, e)))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| ListingError::Data(e.to_string()))
    }
}
