//! PNG, GIF and JPEG output: primitives are rasterized by plotters'
//! `BitMapBackend` and the pixel buffer is encoded by the `image` crate.
//! Text needs a TrueType font on disk, registered with plotters by path.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};

use ::image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::register_font;
use tracing::{debug, warn};

use super::display_list::{backend_error, DisplayList};
use super::{
  approximate_text_box, DriverError, Font, GraphicsDriver, PathBuilder, RgbColour,
};

pub const DEFAULT_WIDTH: i64 = 640;
pub const DEFAULT_HEIGHT: i64 = 480;

/// Font files already offered to plotters, and whether they parsed. Font
/// data handed to plotters lives for the rest of the process.
static FACES: LazyLock<Mutex<HashMap<PathBuf, bool>>> = LazyLock::new(Default::default);

fn uninitialized() -> DriverError {
  DriverError::Uninitialized("cannot draw to an uninitialized image".to_string())
}

fn invalid_font(path: &Path, reason: impl std::fmt::Display) -> DriverError {
  DriverError::Font(format!("invalid font file {}: {reason}", path.display()))
}

/// Register `path` with plotters under its own path, so faces from
/// different font directories never shadow each other. `None` when the
/// file cannot be read.
fn register_face(path: &Path) -> Result<Option<String>, DriverError> {
  let face = path.display().to_string();
  let mut faces = FACES.lock().unwrap_or_else(PoisonError::into_inner);
  match faces.get(path) {
    Some(true) => return Ok(Some(face)),
    Some(false) => return Err(invalid_font(path, "not a TrueType font")),
    None => {}
  }

  let data = match fs::read(path) {
    Ok(data) => data,
    Err(err) => {
      warn!(path = %path.display(), %err, "font not available, text will not be drawn");
      return Ok(None);
    }
  };

  let registered = register_font(&face, FontStyle::Normal, Box::leak(data.into_boxed_slice()));
  faces.insert(path.to_path_buf(), registered.is_ok());
  registered.map_err(|_| invalid_font(path, "not a TrueType font"))?;
  debug!(path = %path.display(), "loaded font");
  Ok(Some(face))
}

pub struct ImageDriver<W: Write> {
  writer: BufWriter<W>,
  format: ImageFormat,
  width: i64,
  height: i64,
  list: Option<DisplayList>,
  font: Font,
  font_dir: PathBuf,
  /// Name of the registered face for `font`, when its file was found.
  face: Option<String>,
  path: PathBuilder,
}

impl<W: Write> ImageDriver<W> {
  pub fn new(writer: W, format: ImageFormat, font_dir: &Path) -> Self {
    Self {
      writer: BufWriter::new(writer),
      format,
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      list: None,
      font: Font::default(),
      font_dir: font_dir.to_path_buf(),
      face: None,
      path: PathBuilder::default(),
    }
  }

  fn canvas(&mut self) -> Result<&mut DisplayList, DriverError> {
    self.list.as_mut().ok_or_else(uninitialized)
  }

  /// Font of the registered face at the current size.
  fn face_font(&self) -> Option<Font> {
    self
      .face
      .as_ref()
      .map(|face| Font::new(face.as_str(), self.font.size))
  }
}

impl<W: Write> GraphicsDriver for ImageDriver<W> {
  fn dimensions(&self) -> (i64, i64) {
    (self.width, self.height)
  }

  fn set_dimensions(&mut self, width: i64, height: i64) -> Result<(), DriverError> {
    self.list = Some(DisplayList::new(width, height)?);
    self.width = width;
    self.height = height;
    Ok(())
  }

  fn font(&self) -> Font {
    self.font.clone()
  }

  fn set_font(&mut self, font: Font) -> Result<(), DriverError> {
    let reload = self.face.is_none() || font.family != self.font.family;
    self.font = font;
    if reload {
      let path = self.font_dir.join(format!("{}.ttf", self.font.family));
      self.face = register_face(&path)?;
    }
    Ok(())
  }

  /// Raster formats have nowhere to put comments.
  fn comment(&mut self, _text: &str) -> Result<(), DriverError> {
    Ok(())
  }

  fn point(&mut self, x: i64, y: i64, colour: RgbColour) -> Result<(), DriverError> {
    self.canvas()?.point(x, y, colour);
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
    self.canvas()?.line(x1, y1, x2, y2, colour);
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
    if points.len() < 2 {
      return Err(DriverError::Path("not enough points to draw a path".to_string()));
    }
    self.canvas()?.path(&points, colour);
    Ok(())
  }

  fn text_box(&self, text: &str) -> (i64, i64) {
    let measured = self.face_font().and_then(|font| {
      (font.family.as_str(), font.size as f64)
        .into_font()
        .box_size(text)
        .ok()
    });
    match measured {
      Some((width, height)) => (width as i64, height as i64),
      None => approximate_text_box(&self.font, text),
    }
  }

  fn text(
    &mut self,
    x: i64,
    y: i64,
    angle: i64,
    text: &str,
    colour: RgbColour,
  ) -> Result<(), DriverError> {
    let font = self.face_font();
    let canvas = self.canvas()?;
    if let Some(font) = font {
      canvas.text(x, y, angle, text, font, colour);
    }
    Ok(())
  }

  fn close(&mut self) -> Result<(), DriverError> {
    let list = self.list.take().ok_or_else(uninitialized)?;
    let (width, height) = list.size();

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
      let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
      list.replay(&root)?;
      root.present().map_err(backend_error)?;
    }

    let image = RgbImage::from_raw(width, height, buffer)
      .ok_or_else(|| DriverError::Backend("pixel buffer does not match the image size".to_string()))?;
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut encoded), self.format)?;
    self.writer.write_all(&encoded)?;
    self.writer.flush()?;
    Ok(())
  }
}
