use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use plotscript::api::{router, ApiConfig};
use serde_json::Value;
use tower::ServiceExt;

const POINTS: &str = r#"{
  "x_label": "time",
  "y_label": "speed",
  "plot": [
    {"title": "measured", "data_set": {"points": [{"x": 1, "y": 2}, {"x": 3, "y": 5}], "style": "lines"}},
    {"math_function": {"min_x": -1, "max_x": 4, "function": "x*x"}}
  ]
}"#;

fn app() -> Router {
  router(&ApiConfig {
    font_dir: "no-such-font-dir".into(),
    web_app_dir: None,
  })
}

struct Reply {
  status: StatusCode,
  content_type: Option<String>,
  body: Bytes,
}

impl Reply {
  fn error(&self) -> String {
    let json: Value = serde_json::from_slice(&self.body).unwrap();
    json["error"].as_str().unwrap().to_string()
  }

  /// Contents of every `<text>` element in an SVG body.
  fn svg_texts(&self) -> Vec<String> {
    let svg = String::from_utf8(self.body.to_vec()).unwrap();
    svg
      .split("</text>")
      .filter_map(|chunk| chunk.rsplit_once('>'))
      .map(|(_, text)| text.trim().to_string())
      .collect()
  }
}

async fn send(uri: &str, content_type: Option<&str>, body: &str, length: bool) -> Reply {
  let mut builder = Request::builder().method(Method::POST).uri(uri);
  if let Some(content_type) = content_type {
    builder = builder.header(header::CONTENT_TYPE, content_type);
  }
  if length {
    builder = builder.header(header::CONTENT_LENGTH, body.len());
  }
  let request = builder.body(Body::from(body.to_string())).unwrap();

  let response = app().oneshot(request).await.unwrap();
  let status = response.status();
  let content_type = response
    .headers()
    .get(header::CONTENT_TYPE)
    .map(|value| value.to_str().unwrap().to_string());
  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  Reply {
    status,
    content_type,
    body,
  }
}

async fn post_json(terminal: &str, body: &str) -> Reply {
  send(
    &format!("/plot/api/{terminal}"),
    Some("application/json"),
    body,
    true,
  )
  .await
}

mod api_tests {
  use super::*;

  mod rendering {
    use super::*;

    #[tokio::test]
    async fn svg() {
      let reply = post_json("svg", POINTS).await;
      assert_eq!(reply.status, StatusCode::OK);
      assert_eq!(reply.content_type.as_deref(), Some("image/svg+xml"));

      let svg = String::from_utf8(reply.body.to_vec()).unwrap();
      assert!(svg.starts_with("<svg "));
      assert!(svg.contains("width=\"640\""));
      let texts = reply.svg_texts();
      assert!(texts.iter().any(|text| text == "measured"), "{texts:?}");
      assert!(texts.iter().any(|text| text == "x*x"), "{texts:?}");
    }

    #[tokio::test]
    async fn requested_dimensions() {
      let body = r#"{"width": 300, "height": 200,
        "plot": [{"data_set": {"points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]}}]}"#;
      let reply = post_json("svg", body).await;
      assert_eq!(reply.status, StatusCode::OK);

      let svg = String::from_utf8(reply.body.to_vec()).unwrap();
      assert!(svg.contains("width=\"300\""));
      assert!(svg.contains("height=\"200\""));
      assert!(reply.svg_texts().iter().any(|text| text == "data set #1"));
    }

    #[tokio::test]
    async fn canvas() {
      let reply = post_json("canvas", POINTS).await;
      assert_eq!(reply.status, StatusCode::OK);
      assert_eq!(reply.content_type.as_deref(), Some("text/javascript"));
      let script = String::from_utf8(reply.body.to_vec()).unwrap();
      assert!(script.starts_with("function canvas_plot() {"));
    }

    #[tokio::test]
    async fn png_without_fonts() {
      let reply = post_json("png", POINTS).await;
      assert_eq!(reply.status, StatusCode::OK);
      assert_eq!(reply.content_type.as_deref(), Some("image/png"));
      assert!(reply.body.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[tokio::test]
    async fn gif_and_jpeg() {
      let reply = post_json("gif", POINTS).await;
      assert_eq!(reply.content_type.as_deref(), Some("image/gif"));
      assert!(reply.body.starts_with(b"GIF8"));

      let reply = post_json("jpeg", POINTS).await;
      assert_eq!(reply.content_type.as_deref(), Some("image/jpeg"));
      assert!(reply.body.starts_with(&[0xff, 0xd8]));
    }
  }

  mod request_errors {
    use super::*;

    #[tokio::test]
    async fn unknown_terminal() {
      let reply = post_json("pdf", POINTS).await;
      assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method() {
      let request = Request::builder()
        .method(Method::GET)
        .uri("/plot/api/svg")
        .body(Body::empty())
        .unwrap();
      let response = app().oneshot(request).await.unwrap();
      assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn not_json() {
      let reply = send("/plot/api/svg", Some("text/plain"), POINTS, true).await;
      assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

      let reply = send("/plot/api/svg", None, POINTS, true).await;
      assert_eq!(reply.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn missing_length() {
      let reply =
        send("/plot/api/svg", Some("application/json"), POINTS, false).await;
      assert_eq!(reply.status, StatusCode::LENGTH_REQUIRED);
    }

    #[tokio::test]
    async fn empty_body() {
      let reply = post_json("svg", "").await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_payload() {
      let reply = post_json("svg", "{\"plot\": [").await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert!(reply.error().starts_with("invalid request payload: "));
    }
  }

  mod validation {
    use super::*;

    #[tokio::test]
    async fn empty_definition() {
      let reply = post_json("svg", r#"{"plot": [{"title": "nothing"}]}"#).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(
        reply.error(),
        "each plot must contain at least one function or one data set"
      );
    }

    #[tokio::test]
    async fn function_and_data_set() {
      let body = r#"{"plot": [{
        "data_set": {"points": [{"x": 1, "y": 1}]},
        "math_function": {"min_x": 0, "max_x": 1, "function": "x"}
      }]}"#;
      let reply = post_json("svg", body).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(reply.error(), "each plot must be either function or data set");
    }

    #[tokio::test]
    async fn oversized_image() {
      let body = r#"{"width": 200000, "height": 200000,
        "plot": [{"data_set": {"points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]}}]}"#;
      let reply = post_json("png", body).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(reply.error(), "width and height must not exceed 4096");
    }

    #[tokio::test]
    async fn invalid_style() {
      let body =
        r#"{"plot": [{"data_set": {"points": [{"x": 1, "y": 1}], "style": "pie"}}]}"#;
      let reply = post_json("svg", body).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(reply.error(), "invalid style: pie");
    }
  }

  mod render_errors {
    use super::*;

    #[tokio::test]
    async fn nothing_to_plot() {
      let reply = post_json("svg", "{}").await;
      assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(reply.error(), "no set of points or functions to be plotted");
    }

    #[tokio::test]
    async fn bad_function() {
      let body =
        r#"{"plot": [{"math_function": {"min_x": 0, "max_x": 1, "function": "x +* 2"}}]}"#;
      let reply = post_json("svg", body).await;
      assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
      assert!(reply
        .error()
        .starts_with("error parsing function to be plotted: "));
    }
  }
}
