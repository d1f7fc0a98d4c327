//! Plot descriptions, the plot-script parser, the data file loader and the
//! rendering engine.

pub mod data_file;
pub mod render;
pub mod script;

use std::fmt;
use std::str::FromStr;

use crate::PlotError;

pub use data_file::{load_data_file, read_points, DataFileError};
pub use render::render;
pub use script::{load_plot_file, parse_plot_script};

/// Domain used for functions when the plot command has no `[min:max]`.
pub const DEFAULT_MIN_X: f64 = -10.0;
pub const DEFAULT_MAX_X: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
  Boxes,
  Dots,
  Lines,
  LinesPoints,
  Points,
  /// Sampled function, drawn as one continuous path.
  FunctionPath,
}

const STYLE_NAMES: [(&str, Style); 5] = [
  ("boxes", Style::Boxes),
  ("dots", Style::Dots),
  ("lines", Style::Lines),
  ("linespoints", Style::LinesPoints),
  ("points", Style::Points),
];

impl FromStr for Style {
  type Err = PlotError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    STYLE_NAMES
      .iter()
      .find(|(candidate, _)| *candidate == name)
      .map(|(_, style)| *style)
      .ok_or_else(|| PlotError::validation(format!("invalid style: {name}")))
  }
}

impl fmt::Display for Style {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = STYLE_NAMES
      .iter()
      .find(|(_, style)| style == self)
      .map_or("function", |(name, _)| name);
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminal {
  Canvas,
  Gif,
  Jpeg,
  Png,
  #[default]
  Svg,
}

const TERMINAL_NAMES: [(&str, Terminal); 5] = [
  ("canvas", Terminal::Canvas),
  ("gif", Terminal::Gif),
  ("jpeg", Terminal::Jpeg),
  ("png", Terminal::Png),
  ("svg", Terminal::Svg),
];

impl Terminal {
  /// File extension of the output written for this terminal.
  pub fn extension(self) -> &'static str {
    match self {
      Terminal::Canvas => "js",
      Terminal::Gif => "gif",
      Terminal::Jpeg => "jpeg",
      Terminal::Png => "png",
      Terminal::Svg => "svg",
    }
  }

  pub fn content_type(self) -> &'static str {
    match self {
      Terminal::Canvas => "text/javascript",
      Terminal::Gif => "image/gif",
      Terminal::Jpeg => "image/jpeg",
      Terminal::Png => "image/png",
      Terminal::Svg => "image/svg+xml",
    }
  }
}

impl FromStr for Terminal {
  type Err = PlotError;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    TERMINAL_NAMES
      .iter()
      .find(|(candidate, _)| *candidate == name)
      .map(|(_, terminal)| *terminal)
      .ok_or_else(|| {
        PlotError::validation(format!("invalid terminal type: {name}"))
      })
  }
}

impl fmt::Display for Terminal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = TERMINAL_NAMES
      .iter()
      .find(|(_, terminal)| terminal == self)
      .map_or("svg", |(name, _)| name);
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
  pub x: f64,
  pub y: f64,
}

impl Point2D {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// An ordered set of points sharing a title and a draw style.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSeries {
  pub title: String,
  pub style: Style,
  pub points: Vec<Point2D>,
  /// 1-based position among all series and functions, for the legend.
  pub order: usize,
}

/// A function expression and the domain it is sampled over.
#[derive(Debug, Clone, PartialEq)]
pub struct Function2D {
  pub title: String,
  pub style: Style,
  pub function: String,
  pub min_x: f64,
  pub max_x: f64,
  pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plot2D {
  pub x_label: String,
  pub y_label: String,
  pub set_points: Vec<PointSeries>,
  pub functions: Vec<Function2D>,
  pub terminal: Terminal,
  /// Target of `set output`.
  pub output: Option<String>,
  /// Pixel dimensions overriding the driver default, when positive.
  pub width: Option<i64>,
  pub height: Option<i64>,
}

impl Plot2D {
  /// Order index for the next series or function added.
  pub fn next_order(&self) -> usize {
    self.set_points.len() + self.functions.len() + 1
  }

  pub fn is_empty(&self) -> bool {
    self.set_points.is_empty() && self.functions.is_empty()
  }
}
