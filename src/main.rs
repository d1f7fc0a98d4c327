use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use plotscript::plot::{self, Plot2D};
use plotscript::{driver, PlotError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render a gnuplot-like plot script.
#[derive(Parser)]
#[command(name = "plotscript", author, version, about, long_about = None)]
struct Cli {
  /// The plot script to render
  script: PathBuf,

  /// Output file, overriding `set output` in the script
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Directory holding `<family>.ttf` fonts for raster output
  #[arg(long, env = "PLOTSCRIPT_FONT_DIR", default_value = "fonts")]
  font_dir: PathBuf,
}

/// `--output`, then `set output`, then the script name with the terminal's
/// extension.
fn output_path(cli: &Cli, plot: &Plot2D) -> PathBuf {
  if let Some(output) = &cli.output {
    return output.clone();
  }
  if let Some(output) = &plot.output {
    return PathBuf::from(output);
  }
  cli.script.with_extension(plot.terminal.extension())
}

fn run(cli: &Cli) -> Result<PathBuf, PlotError> {
  let plot = plot::load_plot_file(&cli.script)?;

  let mut rendered = Vec::new();
  {
    let mut driver = driver::new_driver(plot.terminal, &mut rendered, &cli.font_dir);
    plot::render(&plot, driver.as_mut())?;
  }

  let path = output_path(cli, &plot);
  fs::write(&path, rendered).map_err(|source| PlotError::Io {
    context: format!("cannot write {}", path.display()),
    source,
  })?;
  Ok(path)
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match run(&cli) {
    Ok(path) => {
      info!(output = %path.display(), "plot written");
      ExitCode::SUCCESS
    }
    Err(err) => {
      eprintln!("error: {err}");
      ExitCode::FAILURE
    }
  }
}
