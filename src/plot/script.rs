//! Line oriented parser for plot scripts.
//!
//! ```text
//! set xlabel "time"
//! set terminal png
//! plot [0:6.28] sin(x) with lines title "sine", "data.txt" using 1:3 with boxes
//! ```
//!
//! `set` directives match whole lines. Everything else is consumed as plot
//! fragments from the front of the line. A sub-clause (one data file or one
//! function plus its options) is materialized at a comma, at the end of the
//! line, at the next `plot` keyword or at the next directive.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{
  data_file, Function2D, Plot2D, PointSeries, Style, Terminal, DEFAULT_MAX_X,
  DEFAULT_MIN_X,
};
use crate::PlotError;

fn pattern(source: &str) -> Regex {
  Regex::new(source).expect("plot script patterns are valid")
}

// ── Directives ───────────────────────────────────────────────────────────

static SET_XLABEL: LazyLock<Regex> =
  LazyLock::new(|| pattern(r#"^\s*set\s+xlabel\s+"(.+)"\s*$"#));
static SET_YLABEL: LazyLock<Regex> =
  LazyLock::new(|| pattern(r#"^\s*set\s+ylabel\s+"(.+)"\s*$"#));
static SET_TERMINAL: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"^\s*set\s+terminal\s+(\S+)\s*$"));
static SET_OUTPUT: LazyLock<Regex> =
  LazyLock::new(|| pattern(r#"^\s*set\s+output\s+"(.+)"\s*$"#));

// ── Plot fragments ───────────────────────────────────────────────────────

static PLOT: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*plot\b\s*"));
static RANGE: LazyLock<Regex> = LazyLock::new(|| {
  pattern(r"^\s*\[([-+]?[0-9.]+):([-+]?[0-9.]+)\]\s*")
});
static DATA_FILE: LazyLock<Regex> =
  LazyLock::new(|| pattern(r#"^\s*"([^"]+)"\s*"#));
static USING: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"^\s*using\s+(\d+):(\d+)\s*"));
static WITH: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"^\s*with\s+([a-z]+)\s*"));
static TITLE: LazyLock<Regex> =
  LazyLock::new(|| pattern(r#"^\s*title\s+"([^"]+)"\s*"#));
static COMMA: LazyLock<Regex> = LazyLock::new(|| pattern(r"^\s*(,)\s*"));
/// An expression runs up to a comma, an option keyword or the end of line.
static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
  pattern(r"^\s*([^,]+?)(?:\s+(?:with|title|using)\b|\s*,|\s*$)")
});

/// A data file or a function with its options, waiting to be materialized.
#[derive(Debug)]
struct Clause {
  data_file: Option<String>,
  function: Option<String>,
  columns: (usize, usize),
  style: Style,
  title: Option<String>,
  /// Set once `using`, `with` or `title` has been seen.
  has_options: bool,
}

impl Default for Clause {
  fn default() -> Self {
    Self {
      data_file: None,
      function: None,
      columns: (1, 2),
      style: Style::Points,
      title: None,
      has_options: false,
    }
  }
}

struct ScriptParser<'a> {
  base_dir: &'a Path,
  plot: Plot2D,
  in_plot: bool,
  /// Function domain, kept until the plot command ends.
  range: (f64, f64),
  clause: Clause,
}

fn outside_plot(what: &str, fragment: &str) -> PlotError {
  PlotError::validation(format!(
    "{what} without a plot command: {}",
    fragment.trim()
  ))
}

fn parse_bound(which: &str, text: &str) -> Result<f64, PlotError> {
  text.parse().map_err(|_| {
    PlotError::validation(format!("{which} x expected to be numeric: {text}"))
  })
}

impl<'a> ScriptParser<'a> {
  fn new(base_dir: &'a Path) -> Self {
    Self {
      base_dir,
      plot: Plot2D::default(),
      in_plot: false,
      range: (DEFAULT_MIN_X, DEFAULT_MAX_X),
      clause: Clause::default(),
    }
  }

  fn parse_line(&mut self, line: &str) -> Result<(), PlotError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      return Ok(());
    }

    if self.parse_directive(line)? {
      return Ok(());
    }

    let mut rest = line;
    while !rest.trim().is_empty() {
      rest = self.parse_fragment(rest)?;
    }
    // The clause stays open: options may follow on continuation lines.
    Ok(())
  }

  /// Handle a `set ...` line. Returns false when the line is not a directive.
  fn parse_directive(&mut self, line: &str) -> Result<bool, PlotError> {
    if let Some(captures) = SET_XLABEL.captures(line) {
      self.close_plot()?;
      self.plot.x_label = captures[1].to_string();
    } else if let Some(captures) = SET_YLABEL.captures(line) {
      self.close_plot()?;
      self.plot.y_label = captures[1].to_string();
    } else if let Some(captures) = SET_TERMINAL.captures(line) {
      let terminal: Terminal = captures[1].parse()?;
      self.close_plot()?;
      self.plot.terminal = terminal;
    } else if let Some(captures) = SET_OUTPUT.captures(line) {
      self.close_plot()?;
      self.plot.output = Some(captures[1].to_string());
    } else {
      return Ok(false);
    }

    debug!(directive = line.trim(), "parsed directive");
    Ok(true)
  }

  /// Consume one fragment from the front of `rest`, returning what is left.
  fn parse_fragment<'l>(&mut self, rest: &'l str) -> Result<&'l str, PlotError> {
    if let Some(found) = PLOT.find(rest) {
      self.materialize()?;
      self.in_plot = true;
      self.range = (DEFAULT_MIN_X, DEFAULT_MAX_X);
      return Ok(&rest[found.end()..]);
    }

    if let Some(captures) = RANGE.captures(rest) {
      let fragment = &captures[0];
      if !self.in_plot {
        return Err(outside_plot("range specification", fragment));
      }
      self.range = (
        parse_bound("min", &captures[1])?,
        parse_bound("max", &captures[2])?,
      );
      return Ok(&rest[fragment.len()..]);
    }

    if let Some(captures) = DATA_FILE.captures(rest) {
      let fragment = &captures[0];
      if !self.in_plot {
        return Err(outside_plot("data file specification", fragment));
      }
      self.clause.data_file = Some(captures[1].to_string());
      return Ok(&rest[fragment.len()..]);
    }

    if let Some(captures) = USING.captures(rest) {
      let fragment = &captures[0];
      if !self.in_plot {
        return Err(outside_plot("'using' option", fragment));
      }
      let column = |text: &str| {
        text.parse::<usize>().map_err(|_| {
          PlotError::validation(format!("invalid column index: {text}"))
        })
      };
      self.clause.columns = (column(&captures[1])?, column(&captures[2])?);
      self.clause.has_options = true;
      return Ok(&rest[fragment.len()..]);
    }

    if let Some(captures) = WITH.captures(rest) {
      let fragment = &captures[0];
      if !self.in_plot {
        return Err(outside_plot("'with' option", fragment));
      }
      self.clause.style = captures[1].parse()?;
      self.clause.has_options = true;
      return Ok(&rest[fragment.len()..]);
    }

    if let Some(captures) = TITLE.captures(rest) {
      let fragment = &captures[0];
      if !self.in_plot {
        return Err(outside_plot("'title' option", fragment));
      }
      self.clause.title = Some(captures[1].to_string());
      self.clause.has_options = true;
      return Ok(&rest[fragment.len()..]);
    }

    if let Some(captures) = COMMA.captures(rest) {
      if !self.in_plot {
        return Err(PlotError::validation("unexpected syntax: ,"));
      }
      self.materialize()?;
      return Ok(&rest[captures[0].len()..]);
    }

    match FUNCTION.captures(rest).and_then(|captures| captures.get(1)) {
      Some(expression) => {
        if !self.in_plot {
          return Err(outside_plot(
            "function specification",
            expression.as_str(),
          ));
        }
        if self.clause.function.is_some() {
          self.materialize()?;
        }
        self.clause.function = Some(expression.as_str().to_string());
        Ok(&rest[expression.end()..])
      }
      None => Err(PlotError::validation(format!(
        "unexpected syntax: {}",
        rest.trim()
      ))),
    }
  }

  /// Materialize the pending clause and leave the plot command.
  fn close_plot(&mut self) -> Result<(), PlotError> {
    self.materialize()?;
    self.in_plot = false;
    self.range = (DEFAULT_MIN_X, DEFAULT_MAX_X);
    Ok(())
  }

  /// Turn the pending clause into a series or function and reset it.
  fn materialize(&mut self) -> Result<(), PlotError> {
    let clause = std::mem::take(&mut self.clause);

    match (clause.data_file, clause.function) {
      (Some(_), Some(_)) => Err(PlotError::validation(
        "function and data file must be described separate in plot command",
      )),
      (Some(file), None) => {
        let (x_column, y_column) = clause.columns;
        let points = data_file::load_data_file(
          &file,
          &self.resolve(&file),
          x_column,
          y_column,
        )?;
        let title = clause
          .title
          .unwrap_or_else(|| format!("{file} u {x_column}:{y_column}"));
        debug!(%title, style = %clause.style, "materialized data series");

        let order = self.plot.next_order();
        self.plot.set_points.push(PointSeries {
          title,
          style: clause.style,
          points,
          order,
        });
        Ok(())
      }
      (None, Some(function)) => {
        let title = clause.title.unwrap_or_else(|| function.clone());
        let (min_x, max_x) = self.range;
        debug!(%function, min_x, max_x, "materialized function");

        let order = self.plot.next_order();
        self.plot.functions.push(Function2D {
          title,
          style: clause.style,
          function,
          min_x,
          max_x,
          order,
        });
        Ok(())
      }
      (None, None) if clause.has_options => Err(PlotError::validation(
        "plot options given without a data file or function",
      )),
      (None, None) => Ok(()),
    }
  }

  fn resolve(&self, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base_dir.join(path)
    }
  }
}

/// Parse a plot script. Relative data file names are resolved against
/// `base_dir`.
pub fn parse_plot_script(
  script: &str,
  base_dir: &Path,
) -> Result<Plot2D, PlotError> {
  let mut parser = ScriptParser::new(base_dir);
  for line in script.lines() {
    parser.parse_line(line)?;
  }
  parser.close_plot()?;
  Ok(parser.plot)
}

/// Read and parse the plot script at `path`.
pub fn load_plot_file(path: impl AsRef<Path>) -> Result<Plot2D, PlotError> {
  let path = path.as_ref();
  let script = fs::read_to_string(path).map_err(|source| {
    PlotError::Script(Box::new(PlotError::Io {
      context: format!("cannot read {}", path.display()),
      source,
    }))
  })?;
  let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

  parse_plot_script(&script, base_dir)
    .map_err(|err| PlotError::Script(Box::new(err)))
}
