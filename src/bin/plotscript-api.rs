use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use plotscript::api::{self, ApiConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve plots over HTTP.
#[derive(Parser)]
#[command(name = "plotscript-api", author, version, about, long_about = None)]
struct Cli {
  /// Port to listen on
  #[arg(short, long, env = "PLOTSCRIPT_PORT", default_value_t = 8080)]
  port: u16,

  /// Static web app served under /plot/
  #[arg(long, env = "PLOTSCRIPT_WEB_APP_DIR")]
  web_app_dir: Option<PathBuf>,

  /// Directory holding `<family>.ttf` fonts for raster output
  #[arg(long, env = "PLOTSCRIPT_FONT_DIR", default_value = "fonts")]
  font_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  if let Some(dir) = &cli.web_app_dir {
    info!("serving web app from {}", dir.display());
  }

  let app = api::router(&ApiConfig {
    font_dir: cli.font_dir,
    web_app_dir: cli.web_app_dir,
  });

  let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .with_context(|| format!("cannot listen on {addr}"))?;
  info!("listening on {addr}");

  axum::serve(listener, app).await.context("server failed")?;
  Ok(())
}
