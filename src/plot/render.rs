//! Maps plot descriptions onto a pixel canvas and issues drawing primitives
//! to a [`GraphicsDriver`].
//!
//! Pixel coordinates have their origin at the bottom-left corner. The data
//! bounding box is mapped affinely into `[MARGIN, dimension - MARGIN]` on
//! both axes.

use tracing::debug;

use super::{Function2D, Plot2D, Point2D, PointSeries, Style};
use crate::driver::{DriverError, GraphicsDriver, RgbColour};
use crate::expression::{Expression, FloatSymbolTable, SymbolTable};
use crate::PlotError;

pub const X_MARGIN: i64 = 30;
pub const Y_MARGIN: i64 = 30;

pub const MIN_SCALE_DIVISIONS: i64 = 10;
pub const MAX_SCALE_DIVISIONS: i64 = 20;

pub const SCALE_WIDTH: i64 = 6;
pub const POINT_WIDTH: i64 = 8;
pub const COLOUR_TITLE_WIDTH: i64 = 10;
pub const TITLE_MARGIN: i64 = 10;

const PALETTE: [RgbColour; 3] = [RgbColour::RED, RgbColour::GREEN, RgbColour::BLUE];

fn series_colour(index: usize) -> RgbColour {
  PALETTE[index % PALETTE.len()]
}

/// Render `plot` and close the driver.
pub fn render(
  plot: &Plot2D,
  driver: &mut dyn GraphicsDriver,
) -> Result<(), PlotError> {
  if plot.is_empty() {
    return Err(PlotError::Render(
      "no set of points or functions to be plotted".to_string(),
    ));
  }

  let (default_width, default_height) = driver.dimensions();
  let width = plot.width.filter(|w| *w > 0).unwrap_or(default_width);
  let height = plot.height.filter(|h| *h > 0).unwrap_or(default_height);

  let function_series = plot
    .functions
    .iter()
    .map(|function| sample_function(function, width))
    .collect::<Result<Vec<_>, _>>()?;

  let mut bounds = plot
    .set_points
    .iter()
    .chain(&function_series)
    .map(BoundingBox::of_series)
    .try_fold(None, |acc: Option<BoundingBox>, next| {
      let next = next?;
      Ok::<_, PlotError>(Some(acc.map_or(next, |acc| acc.union(next))))
    })?
    .ok_or_else(|| PlotError::Render("no points in the set".to_string()))?
    .widen();
  if plot.functions.is_empty() {
    bounds = bounds.round_to_tens();
  }
  debug!(?bounds, width, height, "plot bounding box");

  driver.set_dimensions(width, height)?;
  let font = driver.font();
  driver.set_font(font)?;

  let scale = Scale {
    bounds,
    width,
    height,
  };
  draw_grid(driver, &scale)?;
  draw_axis_labels(driver, plot, &scale)?;

  for (index, series) in plot.set_points.iter().enumerate() {
    draw_series(driver, &scale, series, series_colour(index))?;
  }
  for (index, series) in function_series.iter().enumerate() {
    draw_series(driver, &scale, series, series_colour(index))?;
  }

  driver.close()?;
  Ok(())
}

/// Evaluate a function at one x per pixel column of the grid.
pub fn sample_function(
  function: &Function2D,
  width: i64,
) -> Result<PointSeries, PlotError> {
  let expression =
    Expression::parse(&function.function).map_err(PlotError::FunctionParse)?;
  let mut symbols = FloatSymbolTable::with_standard_functions();

  let columns = (width - 2 * X_MARGIN).max(1);
  let step = (function.max_x - function.min_x) / columns as f64;

  let points = (0..=columns)
    .map(|column| {
      let x = function.min_x + column as f64 * step;
      symbols.set_value("x", x);
      expression.evaluate(&symbols).map(|y| Point2D::new(x, y))
    })
    .collect::<Result<Vec<_>, _>>()
    .map_err(PlotError::FunctionEvaluation)?;
  debug!(function = %function.function, samples = points.len(), "sampled function");

  Ok(PointSeries {
    title: function.title.clone(),
    style: Style::FunctionPath,
    points,
    order: function.order,
  })
}

/// Mean distance between consecutive x values; 0 below two points.
pub fn mean_x_spacing(points: &[Point2D]) -> f64 {
  match points {
    [first, .., last] => (last.x - first.x) / (points.len() - 1) as f64,
    _ => 0.0,
  }
}

fn finite_points(points: &[Point2D]) -> impl Iterator<Item = &Point2D> {
  points.iter().filter(|p| p.x.is_finite() && p.y.is_finite())
}

// ── Bounding box ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub min_x: f64,
  pub min_y: f64,
  pub max_x: f64,
  pub max_y: f64,
}

impl BoundingBox {
  /// Extent of the finite points of `series`. Boxes are padded on x by three
  /// times the mean x spacing so the outermost bars stay inside the grid.
  pub fn of_series(series: &PointSeries) -> Result<Self, PlotError> {
    let mut points = finite_points(&series.points);
    let first = points
      .next()
      .ok_or_else(|| PlotError::Render("no points in the set".to_string()))?;

    let mut bounds = BoundingBox {
      min_x: first.x,
      min_y: first.y,
      max_x: first.x,
      max_y: first.y,
    };
    for point in points {
      bounds.min_x = bounds.min_x.min(point.x);
      bounds.min_y = bounds.min_y.min(point.y);
      bounds.max_x = bounds.max_x.max(point.x);
      bounds.max_y = bounds.max_y.max(point.y);
    }

    if series.style == Style::Boxes {
      let padding = 3.0 * mean_x_spacing(&series.points).abs();
      bounds.min_x -= padding;
      bounds.max_x += padding;
    }
    Ok(bounds)
  }

  pub fn union(self, other: Self) -> Self {
    BoundingBox {
      min_x: self.min_x.min(other.min_x),
      min_y: self.min_y.min(other.min_y),
      max_x: self.max_x.max(other.max_x),
      max_y: self.max_y.max(other.max_y),
    }
  }

  /// Give a zero width axis a range of 2 around its value.
  pub fn widen(mut self) -> Self {
    if self.max_x <= self.min_x {
      self.min_x -= 1.0;
      self.max_x += 1.0;
    }
    if self.max_y <= self.min_y {
      self.min_y -= 1.0;
      self.max_y += 1.0;
    }
    self
  }

  /// Round every edge outward to a multiple of 10.
  pub fn round_to_tens(self) -> Self {
    let down = |v: f64| (v / 10.0).floor() * 10.0;
    let up = |v: f64| (v / 10.0).ceil() * 10.0;
    BoundingBox {
      min_x: down(self.min_x),
      min_y: down(self.min_y),
      max_x: up(self.max_x),
      max_y: up(self.max_y),
    }
  }
}

// ── Scaling ──────────────────────────────────────────────────────────────

struct Scale {
  bounds: BoundingBox,
  width: i64,
  height: i64,
}

impl Scale {
  fn x(&self, x: f64) -> i64 {
    let b = &self.bounds;
    let span = (self.width - 2 * X_MARGIN) as f64;
    (X_MARGIN as f64 + span * (x - b.min_x) / (b.max_x - b.min_x)) as i64
  }

  fn y(&self, y: f64) -> i64 {
    let b = &self.bounds;
    let span = (self.height - 2 * Y_MARGIN) as f64;
    (Y_MARGIN as f64 + span * (y - b.min_y) / (b.max_y - b.min_y)) as i64
  }

  fn point(&self, point: &Point2D) -> (i64, i64) {
    (self.x(point.x), self.y(point.y))
  }
}

/// Number of scale divisions for an axis spanning `range`.
pub fn scale_divisions(range: f64) -> i64 {
  ((range / 10.0).trunc() as i64).clamp(MIN_SCALE_DIVISIONS, MAX_SCALE_DIVISIONS)
}

/// Tick label: integers print bare, otherwise enough decimals for `step`.
pub fn format_tick(value: f64, step: f64) -> String {
  if (value - value.round()).abs() < 1e-9 {
    return format!("{}", value.round() as i64);
  }
  let decimals = (-step.abs().log10().floor()).clamp(1.0, 6.0) as usize;
  format!("{value:.decimals$}")
}

fn draw_grid(
  driver: &mut dyn GraphicsDriver,
  scale: &Scale,
) -> Result<(), DriverError> {
  let (width, height) = (scale.width, scale.height);
  let black = RgbColour::BLACK;
  let b = scale.bounds;

  driver.comment("plot grid")?;
  driver.line(X_MARGIN, Y_MARGIN, width - X_MARGIN, Y_MARGIN, black)?;
  driver.line(X_MARGIN, height - Y_MARGIN, width - X_MARGIN, height - Y_MARGIN, black)?;
  driver.line(X_MARGIN, Y_MARGIN, X_MARGIN, height - Y_MARGIN, black)?;
  driver.line(width - X_MARGIN, Y_MARGIN, width - X_MARGIN, height - Y_MARGIN, black)?;

  driver.comment("grid x scale")?;
  let divisions = scale_divisions(b.max_x - b.min_x);
  let step = (b.max_x - b.min_x) / divisions as f64;
  for i in 0..=divisions {
    let value = b.min_x + i as f64 * step;
    let x = scale.x(value);

    driver.line(x, Y_MARGIN, x, Y_MARGIN + SCALE_WIDTH, black)?;
    driver.line(x, height - Y_MARGIN, x, height - Y_MARGIN - SCALE_WIDTH, black)?;

    let label = format_tick(value, step);
    let (text_width, text_height) = driver.text_box(&label);
    driver.text(
      x - text_width / 2,
      Y_MARGIN - SCALE_WIDTH - text_height,
      0,
      &label,
      black,
    )?;
  }

  driver.comment("grid y scale")?;
  let divisions = scale_divisions(b.max_y - b.min_y);
  let step = (b.max_y - b.min_y) / divisions as f64;
  for i in 0..=divisions {
    let value = b.min_y + i as f64 * step;
    let y = scale.y(value);

    driver.line(X_MARGIN, y, X_MARGIN + SCALE_WIDTH, y, black)?;
    driver.line(width - X_MARGIN, y, width - X_MARGIN - SCALE_WIDTH, y, black)?;

    let label = format_tick(value, step);
    let (text_width, text_height) = driver.text_box(&label);
    driver.text(
      X_MARGIN - SCALE_WIDTH - text_width,
      y - text_height / 2,
      0,
      &label,
      black,
    )?;
  }

  Ok(())
}

fn draw_axis_labels(
  driver: &mut dyn GraphicsDriver,
  plot: &Plot2D,
  scale: &Scale,
) -> Result<(), DriverError> {
  if !plot.x_label.is_empty() {
    let (text_width, text_height) = driver.text_box(&plot.x_label);
    driver.text(
      scale.width / 2 - text_width / 2,
      Y_MARGIN - 2 * SCALE_WIDTH - text_height,
      0,
      &plot.x_label,
      RgbColour::BLACK,
    )?;
  }
  if !plot.y_label.is_empty() {
    let (text_width, text_height) = driver.text_box(&plot.y_label);
    driver.text(
      X_MARGIN - 2 * SCALE_WIDTH - text_height,
      scale.height / 2 - text_width / 2,
      -90,
      &plot.y_label,
      RgbColour::BLACK,
    )?;
  }
  Ok(())
}

fn draw_cross(
  driver: &mut dyn GraphicsDriver,
  (x, y): (i64, i64),
  colour: RgbColour,
) -> Result<(), DriverError> {
  driver.line(x - POINT_WIDTH / 2, y, x + POINT_WIDTH / 2, y, colour)?;
  driver.line(x, y - POINT_WIDTH / 2, x, y + POINT_WIDTH / 2, colour)
}

fn draw_series(
  driver: &mut dyn GraphicsDriver,
  scale: &Scale,
  series: &PointSeries,
  colour: RgbColour,
) -> Result<(), DriverError> {
  driver.comment(&format!("plotting {}", series.title))?;

  let pixels: Vec<(i64, i64)> =
    finite_points(&series.points).map(|p| scale.point(p)).collect();

  match series.style {
    Style::Points => {
      for pixel in &pixels {
        draw_cross(driver, *pixel, colour)?;
      }
    }
    Style::Dots => {
      for &(x, y) in &pixels {
        driver.point(x, y, colour)?;
      }
    }
    Style::Lines => {
      for pair in pixels.windows(2) {
        driver.line(pair[0].0, pair[0].1, pair[1].0, pair[1].1, colour)?;
      }
    }
    Style::LinesPoints => {
      for (i, pixel) in pixels.iter().enumerate() {
        draw_cross(driver, *pixel, colour)?;
        if i > 0 {
          let (px, py) = pixels[i - 1];
          driver.line(px, py, pixel.0, pixel.1, colour)?;
        }
      }
    }
    Style::Boxes => draw_boxes(driver, scale, series, colour)?,
    Style::FunctionPath => {
      for segment in split_into_segments(&series.points) {
        driver.begin_path(colour)?;
        for point in &segment {
          let (x, y) = scale.point(point);
          driver.point_to_path(x, y)?;
        }
        driver.end_path()?;
      }
    }
  }

  draw_legend(driver, scale, series, colour)
}

/// Bars from the y = 0 baseline. The stroke shared by two neighbouring bars
/// is drawn once, as the left stroke of the later bar, up to the taller top.
fn draw_boxes(
  driver: &mut dyn GraphicsDriver,
  scale: &Scale,
  series: &PointSeries,
  colour: RgbColour,
) -> Result<(), DriverError> {
  let half_width = mean_x_spacing(&series.points).abs() / 2.0;
  let baseline = scale.y(0.0);
  let mut previous_top = baseline;
  let mut last = None;

  for point in finite_points(&series.points) {
    let left = scale.x(point.x - half_width);
    let right = scale.x(point.x + half_width);
    let top = scale.y(point.y);

    let low = baseline.min(top).min(previous_top);
    let high = baseline.max(top).max(previous_top);
    driver.line(left, low, left, high, colour)?;
    driver.line(left, top, right, top, colour)?;

    previous_top = top;
    last = Some((right, top));
  }

  if let Some((right, top)) = last {
    driver.line(right, baseline, right, top, colour)?;
  }
  Ok(())
}

/// Split a sampled function at non-finite values. Runs of fewer than two
/// points are dropped.
pub fn split_into_segments(points: &[Point2D]) -> Vec<Vec<Point2D>> {
  let mut segments = Vec::new();
  let mut current: Vec<Point2D> = Vec::new();

  for point in points {
    if point.x.is_finite() && point.y.is_finite() {
      current.push(*point);
    } else if current.len() > 1 {
      segments.push(std::mem::take(&mut current));
    } else {
      current.clear();
    }
  }
  if current.len() > 1 {
    segments.push(current);
  }
  segments
}

/// Colour swatch and title, stacked down from the top-right of the grid by
/// order index.
fn draw_legend(
  driver: &mut dyn GraphicsDriver,
  scale: &Scale,
  series: &PointSeries,
  colour: RgbColour,
) -> Result<(), DriverError> {
  let (width, height) = (scale.width, scale.height);
  let order = series.order as i64;
  let (text_width, text_height) = driver.text_box(&series.title);

  let swatch_y = height - Y_MARGIN - order * (TITLE_MARGIN + text_height / 2);
  driver.line(
    width - X_MARGIN - TITLE_MARGIN - COLOUR_TITLE_WIDTH,
    swatch_y,
    width - X_MARGIN - TITLE_MARGIN,
    swatch_y,
    colour,
  )?;
  driver.text(
    width - X_MARGIN - 2 * TITLE_MARGIN - COLOUR_TITLE_WIDTH - text_width,
    height - Y_MARGIN - order * (TITLE_MARGIN + text_height),
    0,
    &series.title,
    RgbColour::BLACK,
  )
}
