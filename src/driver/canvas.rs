use std::io::{BufWriter, Write};

use super::{
  approximate_text_box, DriverError, Font, GraphicsDriver, PathBuilder, RgbColour,
};

pub const DEFAULT_WIDTH: i64 = 600;
pub const DEFAULT_HEIGHT: i64 = 400;

/// Name of the generated function and id of the `<canvas>` it draws on.
pub const PLOT_FUNCTION: &str = "canvas_plot";

/// Emits a JavaScript function that draws the plot on an HTML5 canvas.
pub struct CanvasDriver<W: Write> {
  writer: BufWriter<W>,
  width: i64,
  height: i64,
  font: Font,
  path: PathBuilder,
}

/// A JavaScript string literal. JSON strings are valid JavaScript.
fn js_string(text: &str) -> String {
  serde_json::Value::from(text).to_string()
}

impl<W: Write> CanvasDriver<W> {
  pub fn new(writer: W) -> Self {
    Self {
      writer: BufWriter::new(writer),
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      font: Font::default(),
      path: PathBuilder::default(),
    }
  }

  fn stroke(&mut self, colour: RgbColour, points: &[(i64, i64)]) -> Result<(), DriverError> {
    writeln!(self.writer, "  ctx.beginPath();")?;
    writeln!(self.writer, "  ctx.strokeStyle = \"#{}\";", colour.hex())?;
    for (i, (x, y)) in points.iter().enumerate() {
      let command = if i == 0 { "moveTo" } else { "lineTo" };
      writeln!(self.writer, "  ctx.{command}({x}, {});", self.height - y)?;
    }
    writeln!(self.writer, "  ctx.stroke();")?;
    Ok(())
  }
}

impl<W: Write> GraphicsDriver for CanvasDriver<W> {
  fn dimensions(&self) -> (i64, i64) {
    (self.width, self.height)
  }

  fn set_dimensions(&mut self, width: i64, height: i64) -> Result<(), DriverError> {
    self.width = width;
    self.height = height;

    writeln!(self.writer, "function {PLOT_FUNCTION}() {{")?;
    writeln!(
      self.writer,
      "  let canvas = document.getElementById(\"{PLOT_FUNCTION}\");"
    )?;
    writeln!(self.writer, "  let ctx = canvas.getContext(\"2d\");\n")?;
    self.comment("image background")?;
    writeln!(self.writer, "  ctx.fillStyle = \"#{}\";", RgbColour::WHITE.hex())?;
    writeln!(self.writer, "  ctx.fillRect(0, 0, {width}, {height});")?;
    Ok(())
  }

  fn font(&self) -> Font {
    self.font.clone()
  }

  fn set_font(&mut self, font: Font) -> Result<(), DriverError> {
    self.font = font;
    Ok(())
  }

  fn comment(&mut self, text: &str) -> Result<(), DriverError> {
    writeln!(self.writer, "  // {}", text.replace('\n', " "))?;
    Ok(())
  }

  fn point(&mut self, x: i64, y: i64, colour: RgbColour) -> Result<(), DriverError> {
    self.stroke(colour, &[(x, y), (x + 1, y)])
  }

  fn line(
    &mut self,
    x1: i64,
    y1: i64,
    x2: i64,
    y2: i64,
    colour: RgbColour,
  ) -> Result<(), DriverError> {
    self.stroke(colour, &[(x1, y1), (x2, y2)])
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
    let points: Vec<(i64, i64)> = points.iter().map(|p| (p.x, p.y)).collect();
    self.stroke(colour, &points)
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
    let font = js_string(&format!("{}px {}", self.font.size, self.font.family));
    let y = self.height - y;

    writeln!(self.writer, "  ctx.font = {font};")?;
    writeln!(self.writer, "  ctx.fillStyle = \"#{}\";", colour.hex())?;
    if angle == 0 {
      writeln!(self.writer, "  ctx.fillText({}, {x}, {y});", js_string(text))?;
    } else {
      writeln!(self.writer, "  ctx.save();")?;
      writeln!(self.writer, "  ctx.translate({x}, {y});")?;
      writeln!(self.writer, "  ctx.rotate({angle} * Math.PI / 180);")?;
      writeln!(self.writer, "  ctx.fillText({}, 0, 0);", js_string(text))?;
      writeln!(self.writer, "  ctx.restore();")?;
    }
    Ok(())
  }

  fn close(&mut self) -> Result<(), DriverError> {
    writeln!(self.writer, "}}\n")?;
    self.writer.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn script(draw: impl FnOnce(&mut CanvasDriver<&mut Vec<u8>>)) -> String {
    let mut output = Vec::new();
    {
      let mut driver = CanvasDriver::new(&mut output);
      draw(&mut driver);
      driver.close().unwrap();
    }
    String::from_utf8(output).unwrap()
  }

  #[test]
  fn function_wrapper() {
    let js = script(|driver| driver.set_dimensions(600, 400).unwrap());
    assert!(js.starts_with("function canvas_plot() {\n"));
    assert!(js.contains("document.getElementById(\"canvas_plot\")"));
    assert!(js.contains("ctx.fillStyle = \"#ffffff\";"));
    assert!(js.contains("ctx.fillRect(0, 0, 600, 400);"));
    assert!(js.ends_with("}\n\n"));
  }

  #[test]
  fn line_is_flipped() {
    let js = script(|driver| {
      driver.set_dimensions(100, 100).unwrap();
      driver.line(10, 0, 20, 30, RgbColour::GREEN).unwrap();
    });
    assert!(js.contains(
      "  ctx.strokeStyle = \"#00ff00\";\n  ctx.moveTo(10, 100);\n  ctx.lineTo(20, 70);\n"
    ));
  }

  #[test]
  fn text_is_quoted() {
    let js = script(|driver| {
      driver.set_dimensions(100, 100).unwrap();
      driver.text(1, 2, 0, "say \"hi\"", RgbColour::BLACK).unwrap();
      driver.text(1, 50, -90, "y", RgbColour::BLACK).unwrap();
    });
    assert!(js.contains("ctx.font = \"10px Verdana\";"));
    assert!(js.contains("ctx.fillText(\"say \\\"hi\\\"\", 1, 98);"));
    assert!(js.contains("ctx.rotate(-90 * Math.PI / 180);"));
  }

  #[test]
  fn point_to_path_without_begin() {
    let mut driver = CanvasDriver::new(Vec::new());
    assert_eq!(
      driver.point_to_path(1, 1).unwrap_err().to_string(),
      "cannot add to uninitialized path"
    );
  }
}
