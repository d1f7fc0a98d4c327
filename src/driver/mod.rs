//! Graphics drivers: the primitives the renderer draws with, and one
//! implementation per output format.

pub mod canvas;
mod display_list;
pub mod image;
pub mod svg;

use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::plot::Terminal;

pub use self::canvas::CanvasDriver;
pub use self::image::ImageDriver;
pub use self::svg::SvgDriver;

#[derive(Error, Debug)]
pub enum DriverError {
  #[error(transparent)]
  Io(#[from] io::Error),
  /// Path primitives called out of sequence.
  #[error("{0}")]
  Path(String),
  #[error(transparent)]
  Image(#[from] ::image::ImageError),
  #[error("{0}")]
  Uninitialized(String),
  #[error("{0}")]
  Font(String),
  /// Failure reported by the plotters drawing backend.
  #[error("{0}")]
  Backend(String),
}

// ── Colour ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColour {
  pub red: u8,
  pub green: u8,
  pub blue: u8,
}

impl RgbColour {
  pub const BLACK: RgbColour = RgbColour::new(0, 0, 0);
  pub const WHITE: RgbColour = RgbColour::new(255, 255, 255);
  pub const RED: RgbColour = RgbColour::new(255, 0, 0);
  pub const GREEN: RgbColour = RgbColour::new(0, 255, 0);
  pub const BLUE: RgbColour = RgbColour::new(0, 0, 255);

  pub const fn new(red: u8, green: u8, blue: u8) -> Self {
    Self { red, green, blue }
  }

  /// `rrggbb`, lowercase, without the leading `#`.
  pub fn hex(&self) -> String {
    format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
  }

  pub fn to_svg_rgb(&self) -> String {
    format!("rgb({},{},{})", self.red, self.green, self.blue)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
  pub family: String,
  pub size: u32,
}

impl Font {
  pub fn new(family: impl Into<String>, size: u32) -> Self {
    Self {
      family: family.into(),
      size,
    }
  }
}

impl Default for Font {
  fn default() -> Self {
    Font::new("Verdana", 10)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverPoint {
  pub x: i64,
  pub y: i64,
}

/// Drawing primitives in pixel coordinates with the origin at the
/// bottom-left corner. Implementations flip y against their own height.
pub trait GraphicsDriver {
  fn dimensions(&self) -> (i64, i64);

  /// Fix the canvas size. Formats with a header write it here.
  fn set_dimensions(&mut self, width: i64, height: i64) -> Result<(), DriverError>;

  fn font(&self) -> Font;

  fn set_font(&mut self, font: Font) -> Result<(), DriverError>;

  fn comment(&mut self, text: &str) -> Result<(), DriverError>;

  fn point(&mut self, x: i64, y: i64, colour: RgbColour) -> Result<(), DriverError>;

  fn line(
    &mut self,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
    colour: RgbColour,
  ) -> Result<(), DriverError>;

  fn begin_path(&mut self, colour: RgbColour) -> Result<(), DriverError>;

  fn point_to_path(&mut self, x: i64, y: i64) -> Result<(), DriverError>;

  fn end_path(&mut self) -> Result<(), DriverError>;

  /// Width and height of `text` in the current font. Used for centring, so
  /// an approximation is fine.
  fn text_box(&self, text: &str) -> (i64, i64);

  /// Draw `text` starting at `(x, y)`, rotated clockwise by `angle` degrees.
  fn text(
    &mut self,
    x: i64,
    y: i64,
    angle: i64,
    text: &str,
    colour: RgbColour,
  ) -> Result<(), DriverError>;

  /// Finish the output and flush it.
  fn close(&mut self) -> Result<(), DriverError>;
}

/// Points collected between `begin_path` and `end_path`.
#[derive(Debug, Default)]
pub(crate) struct PathBuilder {
  open: Option<(RgbColour, Vec<DriverPoint>)>,
}

impl PathBuilder {
  pub(crate) fn begin(&mut self, colour: RgbColour) {
    self.open = Some((colour, Vec::new()));
  }

  pub(crate) fn push(&mut self, x: i64, y: i64) -> Result<(), DriverError> {
    let (_, points) = self.open.as_mut().ok_or_else(|| {
      DriverError::Path("cannot add to uninitialized path".to_string())
    })?;
    points.push(DriverPoint { x, y });
    Ok(())
  }

  pub(crate) fn finish(
    &mut self,
  ) -> Result<(RgbColour, Vec<DriverPoint>), DriverError> {
    self
      .open
      .take()
      .ok_or_else(|| DriverError::Path("cannot end unstarted path".to_string()))
  }
}

/// Rough text extent for fonts we have no metrics for.
pub(crate) fn approximate_text_box(font: &Font, text: &str) -> (i64, i64) {
  let size = font.size as f64;
  let width = 0.37 * size * text.chars().count() as f64;
  (width as i64, (0.8 * size) as i64)
}

/// Build the driver for `terminal`, writing its output to `writer`.
/// Raster drivers look for `<font_dir>/<family>.ttf`.
pub fn new_driver<'a, W: Write + 'a>(
  terminal: Terminal,
  writer: W,
  font_dir: &Path,
) -> Box<dyn GraphicsDriver + 'a> {
  match terminal {
    Terminal::Svg => Box::new(SvgDriver::new(writer)),
    Terminal::Canvas => Box::new(CanvasDriver::new(writer)),
    Terminal::Png => Box::new(ImageDriver::new(writer, ::image::ImageFormat::Png, font_dir)),
    Terminal::Gif => Box::new(ImageDriver::new(writer, ::image::ImageFormat::Gif, font_dir)),
    Terminal::Jpeg => {
      Box::new(ImageDriver::new(writer, ::image::ImageFormat::Jpeg, font_dir))
    }
  }
}
