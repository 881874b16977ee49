//! CSV sink.
//!
//! Each harvest writes one table in a single pass: the fixed column header
//! first, then one record per row. The destination file is overwritten on
//! every run; a failure partway through leaves a partially-written table,
//! which the next run replaces wholesale.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// A row type bound to one output table.
///
/// `HEADERS` is written explicitly so that a table with zero data rows still
/// gets its header line, and field order must match the header order.
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Writes a complete row set to one destination file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header and all rows, truncating any prior content.
    pub fn write<R: TableRow>(&self, rows: &[R]) -> Result<(), SinkError> {
        let fail = |source| SinkError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(fail)?;

        writer.write_record(R::HEADERS).map_err(fail)?;
        for row in rows {
            writer.serialize(row).map_err(fail)?;
        }
        writer.flush().map_err(|e| fail(csv::Error::from(e)))?;
        Ok(())
    }
}
