//! REST front end: `POST /plot/api/{svg,canvas,gif,jpeg,png}` with a JSON
//! plot description, answered with the rendered plot.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::driver;
use crate::plot::{self, Function2D, Plot2D, Point2D, PointSeries, Style, Terminal};
use crate::PlotError;

// ── Request payload ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlotRequest {
  pub x_label: String,
  pub y_label: String,
  pub width: i64,
  pub height: i64,
  pub plot: Vec<PlotDefinition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlotDefinition {
  pub title: String,
  pub data_set: DataSetPlot,
  pub math_function: MathFunctionPlot,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DataSetPlot {
  pub points: Vec<PlotPoint>,
  pub style: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlotPoint {
  pub x: f64,
  pub y: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MathFunctionPlot {
  pub min_x: f64,
  pub max_x: f64,
  pub function: String,
}

/// Largest width or height a request may ask for, in pixels.
pub const MAX_DIMENSION: i64 = 4096;

impl PlotRequest {
  /// Map the payload onto a plot description for `terminal`.
  pub fn into_plot(self, terminal: Terminal) -> Result<Plot2D, PlotError> {
    if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
      return Err(PlotError::validation(format!(
        "width and height must not exceed {MAX_DIMENSION}"
      )));
    }

    let mut plot = Plot2D {
      x_label: self.x_label,
      y_label: self.y_label,
      terminal,
      width: Some(self.width).filter(|w| *w > 0),
      height: Some(self.height).filter(|h| *h > 0),
      ..Plot2D::default()
    };

    for (position, definition) in self.plot.into_iter().enumerate() {
      let has_points = !definition.data_set.points.is_empty();
      let has_function = !definition.math_function.function.is_empty();

      match (has_points, has_function) {
        (false, false) => {
          return Err(PlotError::validation(
            "each plot must contain at least one function or one data set",
          ))
        }
        (true, true) => {
          return Err(PlotError::validation(
            "each plot must be either function or data set",
          ))
        }
        (true, false) => {
          let data_set = definition.data_set;
          let style = if data_set.style.is_empty() {
            Style::Points
          } else {
            data_set.style.parse()?
          };
          let title = if definition.title.is_empty() {
            format!("data set #{}", position + 1)
          } else {
            definition.title
          };

          let order = plot.next_order();
          plot.set_points.push(PointSeries {
            title,
            style,
            points: data_set
              .points
              .iter()
              .map(|p| Point2D::new(p.x, p.y))
              .collect(),
            order,
          });
        }
        (false, true) => {
          let math = definition.math_function;
          let title = if definition.title.is_empty() {
            math.function.clone()
          } else {
            definition.title
          };

          let order = plot.next_order();
          plot.functions.push(Function2D {
            title,
            style: Style::Dots,
            function: math.function,
            min_x: math.min_x,
            max_x: math.max_x,
            order,
          });
        }
      }
    }

    Ok(plot)
  }
}

// ── Router ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
  /// Directory searched for `<family>.ttf` by the raster drivers.
  pub font_dir: PathBuf,
  /// Static web app served under `/plot/`.
  pub web_app_dir: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState {
  font_dir: Arc<PathBuf>,
}

pub fn router(config: &ApiConfig) -> Router {
  let state = AppState {
    font_dir: Arc::new(config.font_dir.clone()),
  };

  let app = Router::new()
    .route("/plot/api/{terminal}", post(plot_handler))
    .with_state(state);

  let app = match &config.web_app_dir {
    Some(dir) => app.nest_service("/plot", ServeDir::new(dir)),
    None => app,
  };

  app.layer(CorsLayer::permissive())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

fn is_json(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(';').next())
    .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

async fn plot_handler(
  State(state): State<AppState>,
  Path(terminal): Path<String>,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let Ok(terminal) = terminal.parse::<Terminal>() else {
    return StatusCode::NOT_FOUND.into_response();
  };

  if !is_json(&headers) {
    return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
  }
  if !headers.contains_key(header::CONTENT_LENGTH) {
    return StatusCode::LENGTH_REQUIRED.into_response();
  }
  if body.is_empty() {
    return StatusCode::BAD_REQUEST.into_response();
  }

  let request: PlotRequest = match serde_json::from_slice(&body) {
    Ok(request) => request,
    Err(err) => {
      return error_response(
        StatusCode::BAD_REQUEST,
        format!("invalid request payload: {err}"),
      )
    }
  };
  let plot = match request.into_plot(terminal) {
    Ok(plot) => plot,
    Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
  };
  info!(%terminal, series = plot.set_points.len(), functions = plot.functions.len(), "plot request");

  let font_dir = Arc::clone(&state.font_dir);
  let rendered = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PlotError> {
    let mut output = Vec::new();
    {
      let mut driver = driver::new_driver(plot.terminal, &mut output, &font_dir);
      plot::render(&plot, driver.as_mut())?;
    }
    Ok(output)
  })
  .await;

  match rendered {
    Ok(Ok(output)) => {
      info!(%terminal, bytes = output.len(), "plot rendered");
      ([(header::CONTENT_TYPE, terminal.content_type())], output).into_response()
    }
    Ok(Err(err)) => {
      warn!(%terminal, %err, "plot rendering failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
    Err(err) => {
      warn!(%err, "rendering task failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(json: &str) -> PlotRequest {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn defaults_for_titles_and_styles() {
    let plot = request(
      r#"{"plot": [
        {"data_set": {"points": [{"x": 1, "y": 2}]}},
        {"math_function": {"min_x": -1, "max_x": 1, "function": "x*x"}},
        {"title": "bars", "data_set": {"points": [{"x": 0, "y": 1}], "style": "boxes"}}
      ]}"#,
    )
    .into_plot(Terminal::Svg)
    .unwrap();

    assert_eq!(plot.set_points[0].title, "data set #1");
    assert_eq!(plot.set_points[0].style, Style::Points);
    assert_eq!(plot.functions[0].title, "x*x");
    assert_eq!(plot.functions[0].style, Style::Dots);
    assert_eq!(plot.set_points[1].title, "bars");
    assert_eq!(plot.set_points[1].style, Style::Boxes);
    assert_eq!(plot.set_points[1].order, 3);
    assert_eq!((plot.width, plot.height), (None, None));
  }

  #[test]
  fn dimensions_are_capped() {
    let plot = request(r#"{"width": 4096, "height": 1}"#)
      .into_plot(Terminal::Png)
      .unwrap();
    assert_eq!((plot.width, plot.height), (Some(4096), Some(1)));

    let err = request(r#"{"width": 10, "height": 4097}"#)
      .into_plot(Terminal::Png)
      .unwrap_err();
    assert_eq!(err.to_string(), "width and height must not exceed 4096");
  }

  #[test]
  fn content_type_with_parameters() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::CONTENT_TYPE,
      "application/json; charset=utf-8".parse().unwrap(),
    );
    assert!(is_json(&headers));
    headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
    assert!(!is_json(&headers));
  }
}
