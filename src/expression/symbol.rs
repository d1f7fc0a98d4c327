use std::collections::HashMap;
use std::f64::consts::PI;

use super::ExpressionError;

/// A native function callable from expressions.
pub type NativeFunction = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Variable and function bindings consulted while evaluating expressions.
pub trait SymbolTable {
  fn exists(&self, name: &str) -> bool;

  /// Bind `name` to `value`, replacing any previous binding.
  fn set_value(&mut self, name: &str, value: f64);

  fn get_value(&self, name: &str) -> Result<f64, ExpressionError>;

  fn define_func(&mut self, name: &str, function: NativeFunction, arity: usize);

  fn invoke_func(&self, name: &str, args: &[f64]) -> Result<f64, ExpressionError>;
}

struct FunctionEntry {
  function: NativeFunction,
  arity: usize,
}

#[derive(Default)]
pub struct FloatSymbolTable {
  values: HashMap<String, f64>,
  functions: HashMap<String, FunctionEntry>,
}

impl FloatSymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// A table with the standard math functions already defined.
  pub fn with_standard_functions() -> Self {
    let mut table = Self::new();
    add_standard_math_funcs(&mut table);
    table
  }
}

impl std::fmt::Debug for FloatSymbolTable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut functions: Vec<&String> = self.functions.keys().collect();
    functions.sort();
    f.debug_struct("FloatSymbolTable")
      .field("values", &self.values)
      .field("functions", &functions)
      .finish()
  }
}

impl SymbolTable for FloatSymbolTable {
  fn exists(&self, name: &str) -> bool {
    self.values.contains_key(name) || self.functions.contains_key(name)
  }

  fn set_value(&mut self, name: &str, value: f64) {
    self.values.insert(name.to_string(), value);
  }

  fn get_value(&self, name: &str) -> Result<f64, ExpressionError> {
    self.values.get(name).copied().ok_or_else(|| {
      ExpressionError::Evaluation(format!("unknown symbol name: {name}"))
    })
  }

  fn define_func(&mut self, name: &str, function: NativeFunction, arity: usize) {
    self
      .functions
      .insert(name.to_string(), FunctionEntry { function, arity });
  }

  fn invoke_func(&self, name: &str, args: &[f64]) -> Result<f64, ExpressionError> {
    let entry = self.functions.get(name).ok_or_else(|| {
      ExpressionError::Evaluation(format!("unknown function name: {name}"))
    })?;
    if entry.arity != args.len() {
      return Err(ExpressionError::Evaluation(format!(
        "invalid number or parameters invoking function: {name}"
      )));
    }
    Ok((entry.function)(args))
  }
}

// ── Standard functions ───────────────────────────────────────────────────

/// Lanczos approximation (g = 7, n = 9) with the reflection formula below 1/2.
pub fn gamma(x: f64) -> f64 {
  const G: f64 = 7.0;
  const COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
  ];

  if x < 0.5 {
    return PI / ((PI * x).sin() * gamma(1.0 - x));
  }

  let z = x - 1.0;
  let series = COEFFICIENTS
    .iter()
    .enumerate()
    .skip(1)
    .fold(COEFFICIENTS[0], |sum, (i, c)| sum + c / (z + i as f64));
  let t = z + G + 0.5;
  (2.0 * PI).sqrt() * t.powf(z + 0.5) * (-t).exp() * series
}

fn unary(function: fn(f64) -> f64) -> NativeFunction {
  Box::new(move |args: &[f64]| function(args[0]))
}

/// Register abs, acos, asin, atan, cos, exp, gamma, log (natural), sin,
/// sqrt and tan, each taking one argument.
pub fn add_standard_math_funcs(table: &mut dyn SymbolTable) {
  let functions: [(&str, fn(f64) -> f64); 11] = [
    ("abs", f64::abs),
    ("acos", f64::acos),
    ("asin", f64::asin),
    ("atan", f64::atan),
    ("cos", f64::cos),
    ("exp", f64::exp),
    ("gamma", gamma),
    ("log", f64::ln),
    ("sin", f64::sin),
    ("sqrt", f64::sqrt),
    ("tan", f64::tan),
  ];

  for (name, function) in functions {
    table.define_func(name, unary(function), 1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn values_replace_previous_bindings() {
    let mut table = FloatSymbolTable::new();
    assert!(!table.exists("x"));
    table.set_value("x", 1.0);
    table.set_value("x", 2.5);
    assert!(table.exists("x"));
    assert_eq!(table.get_value("x").unwrap(), 2.5);
  }

  #[test]
  fn unknown_names() {
    let table = FloatSymbolTable::new();
    assert_eq!(
      table.get_value("y").unwrap_err().to_string(),
      "unknown symbol name: y"
    );
    assert_eq!(
      table.invoke_func("foo", &[1.0]).unwrap_err().to_string(),
      "unknown function name: foo"
    );
  }

  #[test]
  fn arity_is_checked() {
    let table = FloatSymbolTable::with_standard_functions();
    assert_eq!(
      table.invoke_func("sin", &[1.0, 2.0]).unwrap_err().to_string(),
      "invalid number or parameters invoking function: sin"
    );
  }

  #[test]
  fn custom_function() {
    let mut table = FloatSymbolTable::new();
    table.define_func("hypot", Box::new(|a: &[f64]| a[0].hypot(a[1])), 2);
    assert_eq!(table.invoke_func("hypot", &[3.0, 4.0]).unwrap(), 5.0);
  }

  #[test]
  fn standard_functions() {
    let table = FloatSymbolTable::with_standard_functions();
    let call = |name: &str, x: f64| table.invoke_func(name, &[x]).unwrap();
    assert_eq!(call("abs", -3.0), 3.0);
    assert_eq!(call("sqrt", 16.0), 4.0);
    assert_eq!(call("log", 1.0), 0.0);
    assert!((call("exp", 1.0) - std::f64::consts::E).abs() < 1e-12);
    assert!((call("gamma", 5.0) - 24.0).abs() < 1e-9);
    assert!((call("gamma", 0.5) - PI.sqrt()).abs() < 1e-9);
  }
}
