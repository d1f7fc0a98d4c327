//! Primitives recorded by the plotters-backed drivers, clipped to the canvas,
//! and replayed onto a drawing area when the driver closes.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use super::{DriverError, DriverPoint, Font, RgbColour};

/// Top-left pixel coordinates, as plotters takes them.
type Coord = (i32, i32);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Primitive {
  Pixel(Coord, RgbColour),
  Path(Vec<Coord>, RgbColour),
  Text {
    at: Coord,
    angle: i64,
    text: String,
    font: Font,
    colour: RgbColour,
  },
}

pub(crate) fn backend_error(err: impl std::fmt::Display) -> DriverError {
  DriverError::Backend(err.to_string())
}

fn rgb(colour: RgbColour) -> RGBColor {
  RGBColor(colour.red, colour.green, colour.blue)
}

/// Nearest quarter turn for a clockwise angle in degrees.
fn quarter_turn(angle: i64) -> FontTransform {
  match (angle.rem_euclid(360) + 45) / 90 % 4 {
    1 => FontTransform::Rotate90,
    2 => FontTransform::Rotate180,
    3 => FontTransform::Rotate270,
    _ => FontTransform::None,
  }
}

fn saturate(value: i64) -> i32 {
  value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Liang-Barsky clip of a segment to the pixel grid `[0, width) × [0, height)`.
pub(crate) fn clip_segment(
  from: (i64, i64),
  to: (i64, i64),
  width: u32,
  height: u32,
) -> Option<(Coord, Coord)> {
  let (x0, y0) = (from.0 as f64, from.1 as f64);
  let (dx, dy) = (to.0 as f64 - x0, to.1 as f64 - y0);
  let (max_x, max_y) = ((width - 1) as f64, (height - 1) as f64);

  let mut enter = 0.0f64;
  let mut leave = 1.0f64;
  for (p, q) in [(-dx, x0), (dx, max_x - x0), (-dy, y0), (dy, max_y - y0)] {
    if p == 0.0 {
      if q < 0.0 {
        return None;
      }
      continue;
    }
    let t = q / p;
    if p < 0.0 {
      enter = enter.max(t);
    } else {
      leave = leave.min(t);
    }
    if enter > leave {
      return None;
    }
  }

  let at = |t: f64| {
    (
      (x0 + t * dx).round().clamp(0.0, max_x) as i32,
      (y0 + t * dy).round().clamp(0.0, max_y) as i32,
    )
  };
  Some((at(enter), at(leave)))
}

#[derive(Debug)]
pub(crate) struct DisplayList {
  width: u32,
  height: u32,
  primitives: Vec<Primitive>,
}

impl DisplayList {
  pub(crate) fn sized(width: u32, height: u32) -> Self {
    Self {
      width: width.max(1),
      height: height.max(1),
      primitives: Vec::new(),
    }
  }

  pub(crate) fn new(width: i64, height: i64) -> Result<Self, DriverError> {
    match (u32::try_from(width), u32::try_from(height)) {
      (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Self::sized(w, h)),
      _ => Err(DriverError::Uninitialized(format!(
        "invalid image dimensions: {width}x{height}"
      ))),
    }
  }

  pub(crate) fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  /// Bottom-left origin to top-left.
  fn flip(&self, x: i64, y: i64) -> (i64, i64) {
    (x, (self.height as i64).saturating_sub(y))
  }

  pub(crate) fn point(&mut self, x: i64, y: i64, colour: RgbColour) {
    let (x, y) = self.flip(x, y);
    if (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y) {
      self.primitives.push(Primitive::Pixel((x as i32, y as i32), colour));
    }
  }

  pub(crate) fn line(&mut self, x1: i64, y1: i64, x2: i64, y2: i64, colour: RgbColour) {
    let clipped =
      clip_segment(self.flip(x1, y1), self.flip(x2, y2), self.width, self.height);
    if let Some((from, to)) = clipped {
      self.primitives.push(Primitive::Path(vec![from, to], colour));
    }
  }

  /// Polyline through `points`, split into runs where it leaves the canvas.
  pub(crate) fn path(&mut self, points: &[DriverPoint], colour: RgbColour) {
    let mut run: Vec<Coord> = Vec::new();
    for pair in points.windows(2) {
      let from = self.flip(pair[0].x, pair[0].y);
      let to = self.flip(pair[1].x, pair[1].y);
      match clip_segment(from, to, self.width, self.height) {
        Some((start, end)) => {
          if run.last() != Some(&start) {
            self.flush(&mut run, colour);
            run.push(start);
          }
          run.push(end);
        }
        None => self.flush(&mut run, colour),
      }
    }
    self.flush(&mut run, colour);
  }

  fn flush(&mut self, run: &mut Vec<Coord>, colour: RgbColour) {
    if run.len() > 1 {
      self.primitives.push(Primitive::Path(std::mem::take(run), colour));
    } else {
      run.clear();
    }
  }

  /// `font.family` is the name plotters knows the face by.
  pub(crate) fn text(
    &mut self,
    x: i64,
    y: i64,
    angle: i64,
    text: &str,
    font: Font,
    colour: RgbColour,
  ) {
    let (x, y) = self.flip(x, y);
    self.primitives.push(Primitive::Text {
      at: (saturate(x), saturate(y)),
      angle,
      text: text.to_string(),
      font,
      colour,
    });
  }

  /// Paint the white background and every recorded primitive.
  pub(crate) fn replay<DB: DrawingBackend>(
    &self,
    area: &DrawingArea<DB, Shift>,
  ) -> Result<(), DriverError> {
    area.fill(&WHITE).map_err(backend_error)?;

    for primitive in &self.primitives {
      match primitive {
        Primitive::Pixel(at, colour) => {
          area.draw_pixel(*at, &rgb(*colour)).map_err(backend_error)?;
        }
        Primitive::Path(points, colour) => {
          let element = PathElement::new(points.clone(), rgb(*colour).stroke_width(1));
          area.draw(&element).map_err(backend_error)?;
        }
        Primitive::Text {
          at,
          angle,
          text,
          font,
          colour,
        } => {
          let style = (font.family.as_str(), font.size as f64)
            .into_font()
            .transform(quarter_turn(*angle))
            .color(&rgb(*colour))
            .pos(Pos::new(HPos::Left, VPos::Bottom));
          area.draw_text(text, &style, *at).map_err(backend_error)?;
        }
      }
    }
    Ok(())
  }
}
