//! Whitespace separated data files. The first line is a header and is
//! skipped; columns are selected by their 1-based index.
//!
//! ```text
//! time   speed   distance
//! 10     20      30
//! 40     50      60
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::Point2D;
use crate::PlotError;

#[derive(Error, Debug)]
pub enum DataFileError {
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error("line with less columns than expected: \"{0}\"")]
  MissingColumns(String),
  #[error("column {column} expected to be numeric: \"{line}\"")]
  NotNumeric { column: usize, line: String },
}

/// Read `(x, y)` pairs from the given columns of every line after the header.
pub fn read_points<R: BufRead>(
  reader: R,
  x_column: usize,
  y_column: usize,
) -> Result<Vec<Point2D>, DataFileError> {
  let mut points = Vec::new();

  for line in reader.lines().skip(1) {
    let line = line?;
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    let columns: Vec<&str> = line.split_whitespace().collect();
    let column = |index: usize| -> Result<f64, DataFileError> {
      let text = index
        .checked_sub(1)
        .and_then(|i| columns.get(i))
        .ok_or_else(|| DataFileError::MissingColumns(line.to_string()))?;
      text.parse().map_err(|_| DataFileError::NotNumeric {
        column: index,
        line: line.to_string(),
      })
    };

    if columns.len() < x_column.max(y_column) {
      return Err(DataFileError::MissingColumns(line.to_string()));
    }
    points.push(Point2D::new(column(x_column)?, column(y_column)?));
  }

  Ok(points)
}

/// Load a data file; `name` is the file as written in the script and is
/// only used in error messages.
pub fn load_data_file(
  name: &str,
  path: &Path,
  x_column: usize,
  y_column: usize,
) -> Result<Vec<Point2D>, PlotError> {
  let wrap = |error| PlotError::DataFile {
    path: name.to_string(),
    error,
  };

  let file = File::open(path).map_err(|err| wrap(err.into()))?;
  let points = read_points(BufReader::new(file), x_column, y_column).map_err(wrap)?;
  debug!(file = name, points = points.len(), "loaded data file");
  Ok(points)
}
