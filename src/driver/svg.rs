use std::io::{BufWriter, Write};

use plotters::prelude::*;

use super::display_list::{backend_error, DisplayList};
use super::{
  approximate_text_box, DriverError, Font, GraphicsDriver, PathBuilder, RgbColour,
};

pub const DEFAULT_WIDTH: i64 = 640;
pub const DEFAULT_HEIGHT: i64 = 480;

/// SVG output through plotters' `SVGBackend`. Primitives are kept until
/// `close`, which writes the whole document.
pub struct SvgDriver<W: Write> {
  writer: BufWriter<W>,
  width: i64,
  height: i64,
  list: DisplayList,
  font: Font,
  path: PathBuilder,
}

impl<W: Write> SvgDriver<W> {
  pub fn new(writer: W) -> Self {
    Self {
      writer: BufWriter::new(writer),
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      list: DisplayList::sized(DEFAULT_WIDTH as u32, DEFAULT_HEIGHT as u32),
      font: Font::default(),
      path: PathBuilder::default(),
    }
  }
}

impl<W: Write> GraphicsDriver for SvgDriver<W> {
  fn dimensions(&self) -> (i64, i64) {
    (self.width, self.height)
  }

  fn set_dimensions(&mut self, width: i64, height: i64) -> Result<(), DriverError> {
    self.list = DisplayList::new(width, height)?;
    self.width = width;
    self.height = height;
    Ok(())
  }

  fn font(&self) -> Font {
    self.font.clone()
  }

  fn set_font(&mut self, font: Font) -> Result<(), DriverError> {
    self.font = font;
    Ok(())
  }

  /// `SVGBackend` owns the document and has no comment element.
  fn comment(&mut self, _text: &str) -> Result<(), DriverError> {
    Ok(())
  }

  fn point(&mut self, x: i64, y: i64, colour: RgbColour) -> Result<(), DriverError> {
    self.list.point(x, y, colour);
    Ok(())
  }

  fn line(
    &mut self,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
    colour: RgbColour,
  ) -> Result<(), DriverError> {
    self.list.line(x1, y1, x2, y2, colour);
    Ok(())
  }

  fn begin_path(&mut self, colour: RgbColour) -> Result<(), DriverError> {
    self.path.begin(colour);
    Ok(())
  }

  fn point_to_path(&mut self, x: i64, y: i64) -> Result<(), DriverError> {
    self.path.push(x, y)
  }

  fn end_path(&mut self) -> Result<(), DriverError> {
    let (colour, points) = self.path.finish()?;
    self.list.path(&points, colour);
    Ok(())
  }

  fn text_box(&self, text: &str) -> (i64, i64) {
    approximate_text_box(&self.font, text)
  }

  fn text(
    &mut self,
    x: i64,
    y: i64,
    angle: i64,
    text: &str,
    colour: RgbColour,
  ) -> Result<(), DriverError> {
    self.list.text(x, y, angle, text, self.font.clone(), colour);
    Ok(())
  }

  fn close(&mut self) -> Result<(), DriverError> {
    let mut svg = String::new();
    {
      let root = SVGBackend::with_string(&mut svg, self.list.size()).into_drawing_area();
      self.list.replay(&root)?;
      root.present().map_err(backend_error)?;
    }

    self.writer.write_all(svg.as_bytes())?;
    self.writer.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn render(draw: impl FnOnce(&mut SvgDriver<&mut Vec<u8>>)) -> String {
    let mut output = Vec::new();
    {
      let mut driver = SvgDriver::new(&mut output);
      draw(&mut driver);
      driver.close().unwrap();
    }
    String::from_utf8(output).unwrap()
  }

  #[test]
  fn header_and_background() {
    let svg = render(|driver| driver.set_dimensions(200, 100).unwrap());
    assert!(svg.starts_with("<svg "));
    assert!(svg.contains("width=\"200\""));
    assert!(svg.contains("height=\"100\""));
    assert!(svg.contains("<rect"));
    assert!(svg.trim_end().ends_with("</svg>"));
  }

  #[test]
  fn lines_and_paths_become_polylines() {
    let svg = render(|driver| {
      driver.set_dimensions(100, 100).unwrap();
      driver.line(0, 10, 50, 90, RgbColour::RED).unwrap();
      driver.begin_path(RgbColour::BLUE).unwrap();
      driver.point_to_path(0, 1).unwrap();
      driver.point_to_path(10, 20).unwrap();
      driver.point_to_path(20, 20).unwrap();
      driver.end_path().unwrap();
    });
    assert_eq!(svg.matches("<polyline").count(), 2);
  }

  #[test]
  fn escaped_rotated_text() {
    let svg = render(|driver| {
      driver.set_dimensions(100, 100).unwrap();
      driver.text(5, 50, -90, "a<b", RgbColour::BLACK).unwrap();
    });
    assert!(svg.contains("a&lt;b"));
    assert!(svg.contains("rotate("));
    assert!(svg.contains("Verdana"));
  }

  #[test]
  fn invalid_dimensions() {
    let mut driver = SvgDriver::new(Vec::new());
    assert_eq!(
      driver.set_dimensions(0, 100).unwrap_err().to_string(),
      "invalid image dimensions: 0x100"
    );
  }

  #[test]
  fn end_path_without_begin() {
    let mut driver = SvgDriver::new(Vec::new());
    assert_eq!(
      driver.end_path().unwrap_err().to_string(),
      "cannot end unstarted path"
    );
  }
}
