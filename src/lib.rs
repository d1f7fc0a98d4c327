//! Render gnuplot-like plot scripts and math functions to SVG, canvas
//! scripts and raster images.
//!
//! ```no_run
//! use plotscript::{driver, plot};
//!
//! let plot = plot::load_plot_file("sine.plot")?;
//! let mut output = Vec::new();
//! {
//!   let mut driver = driver::new_driver(plot.terminal, &mut output, "fonts".as_ref());
//!   plot::render(&plot, driver.as_mut())?;
//! }
//! # Ok::<(), plotscript::PlotError>(())
//! ```

use thiserror::Error;

pub mod api;
pub mod driver;
pub mod expression;
pub mod plot;

pub use driver::DriverError;
pub use expression::{Expression, ExpressionError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum PlotError {
  /// Semantic problems in a script or request: scope, style, terminal.
  #[error("{0}")]
  Validation(String),
  #[error("fail attempting to load data file {path}: {error}")]
  DataFile {
    path: String,
    error: plot::DataFileError,
  },
  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: std::io::Error,
  },
  #[error("{0}")]
  Render(String),
  #[error("error parsing function to be plotted: {0}")]
  FunctionParse(ExpressionError),
  #[error("error evaluating function to be plotted: {0}")]
  FunctionEvaluation(ExpressionError),
  #[error(transparent)]
  Driver(#[from] DriverError),
  #[error("fail parsing plot file: {0}")]
  Script(Box<PlotError>),
}

impl PlotError {
  pub(crate) fn validation(message: impl Into<String>) -> Self {
    PlotError::Validation(message.into())
  }
}
