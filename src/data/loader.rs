//! CSV Dataset Loader Module
//! Reads a CSV with Polars and hands every row over as raw text records.

use crate::data::record::{Datum, RawRecord};
use polars::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load CSV: {0}")]
    Read(#[from] PolarsError),
    #[error("No rows in {}", .0.display())]
    Empty(PathBuf),
    #[error("{} is missing column(s): {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("No valid rows left in {} after coercion", .0.display())]
    NoValidRows(PathBuf),
    #[error("{} line {line}: expected {expected} fields, found {found}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        expected: u64,
        found: u64,
    },
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A loaded CSV: immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub rows: Arc<[RawRecord]>,
}

impl Dataset {
    /// Run the page's derived-field calculator over every row, in parallel.
    ///
    /// Row order is preserved; rows the page rejects are dropped.
    pub fn derive<D: Datum>(&self) -> Result<Vec<D>, LoadError> {
        let records: Vec<D> = self
            .rows
            .par_iter()
            .enumerate()
            .filter_map(|(row, raw)| D::from_raw(row, raw))
            .collect();

        debug!(
            path = %self.path.display(),
            kept = records.len(),
            dropped = self.rows.len() - records.len(),
            "derived records"
        );

        if records.is_empty() {
            return Err(LoadError::NoValidRows(self.path.clone()));
        }
        Ok(records)
    }
}

/// Handles CSV file loading with Polars.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a CSV file, keeping every cell as text.
    ///
    /// `required` column names are matched exactly (case-sensitive).
    pub fn load_csv(path: &Path, required: &[&str]) -> Result<Dataset, LoadError> {
        info!(path = %path.display(), "loading dataset");
        check_row_lengths(path)?;

        // Schema inference is off so every column arrives as a string column;
        // coercion is the page's job.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !columns.iter().any(|c| c == *name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        if df.height() == 0 {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        let mut rows: Vec<RawRecord> = vec![RawRecord::with_capacity(columns.len()); df.height()];
        for column in df.get_columns() {
            let name = column.name().to_string();
            let values = column.as_materialized_series().str()?;
            for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                if let Some(text) = value {
                    if !text.is_empty() {
                        row.insert(name.clone(), text.to_string());
                    }
                }
            }
        }

        info!(
            path = %path.display(),
            rows = rows.len(),
            columns = columns.len(),
            "dataset loaded"
        );

        Ok(Dataset {
            path: path.to_path_buf(),
            rows: rows.into(),
        })
    }
}

/// Every record must have as many fields as the header.
fn check_row_lengths(path: &Path) -> Result<(), LoadError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    for record in reader.byte_records() {
        let Err(e) = record else {
            continue;
        };
        if let csv::ErrorKind::UnequalLengths { pos, expected_len, len } = e.kind() {
            return Err(LoadError::Malformed {
                path: path.to_path_buf(),
                line: pos.as_ref().map_or(0, |p| p.line()),
                expected: *expected_len,
                found: *len,
            });
        }
        return Err(LoadError::Csv(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_every_cell_as_text() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "games.csv",
            "name,price,release_date\nPortal,19.99,2007-10-10\nFree Thing,,2015-01-01\n",
        );

        let dataset = DatasetLoader::load_csv(&path, &["name", "price"]).unwrap();
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[0].get("price").map(String::as_str), Some("19.99"));
        assert_eq!(
            dataset.rows[0].get("release_date").map(String::as_str),
            Some("2007-10-10")
        );
        assert!(dataset.rows[1].get("price").is_none());
    }

    #[test]
    fn missing_columns_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "twitch.csv", "channel,followers\nabc,10\n");

        let err = DatasetLoader::load_csv(&path, &["Channel", "Followers"]).unwrap_err();
        match err {
            LoadError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["Channel", "Followers"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "name,price\n");

        let err = DatasetLoader::load_csv(&path, &["name"]).unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)), "unexpected error: {err}");
    }

    #[test]
    fn short_row_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "steam.csv", "name,price,owners\nPortal,19.99,100\nBroken\n");

        match DatasetLoader::load_csv(&path, &["name"]).unwrap_err() {
            LoadError::Malformed { line, expected, found, .. } => {
                assert_eq!((line, expected, found), (3, 3, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quoted_commas_do_not_split_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "steam.csv", "name,price\n\"Portal, Still Alive\",9.99\n");

        let dataset = DatasetLoader::load_csv(&path, &["name"]).unwrap();
        assert_eq!(
            dataset.rows[0].get("name").map(String::as_str),
            Some("Portal, Still Alive")
        );
    }

    #[test]
    fn unreachable_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.csv");

        assert!(DatasetLoader::load_csv(&path, &[]).is_err());
    }
}
