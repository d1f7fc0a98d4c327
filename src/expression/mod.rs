//! Infix math expressions compiled once to postfix and evaluated many times.
//!
//! ```text
//! "2 * sin(x) + 1"  ->  2 x sin * 1 +
//! ```
//!
//! The tokenizer lives in [`token`], the grammar table in [`grammar`], the
//! LL parser and the postfix emitter in [`parser`], and variable/function
//! bindings in [`symbol`].

pub mod grammar;
pub mod parser;
pub mod symbol;
pub mod token;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use parser::{Operator, PostfixItem};
pub use symbol::{add_standard_math_funcs, FloatSymbolTable, NativeFunction, SymbolTable};
pub use token::{Token, TokenCategory};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
  #[error("{0}")]
  Lexical(String),
  #[error("syntax error: {0}")]
  Syntax(String),
  #[error("expression with unbalanced parenthesis")]
  UnbalancedParenthesis,
  #[error("{0}")]
  Evaluation(String),
  #[error("error parsing expression: {0}")]
  Parse(Box<ExpressionError>),
}

/// A parsed expression, ready to be evaluated against a symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
  source: String,
  postfix: Vec<PostfixItem>,
}

impl Expression {
  /// Tokenize and parse `source` into its postfix form.
  pub fn parse(source: &str) -> Result<Self, ExpressionError> {
    let postfix = token::tokenize(source)
      .and_then(parser::infix_to_postfix)
      .map_err(|err| ExpressionError::Parse(Box::new(err)))?;

    Ok(Self {
      source: source.to_string(),
      postfix,
    })
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn postfix(&self) -> &[PostfixItem] {
    &self.postfix
  }

  /// Evaluate the postfix form with the current bindings of `symbols`.
  ///
  /// Division by zero is not an error: the result follows IEEE 754
  /// (`inf`, `-inf` or `NaN`). An empty expression evaluates to 0.
  pub fn evaluate(
    &self,
    symbols: &dyn SymbolTable,
  ) -> Result<f64, ExpressionError> {
    let mut operands: Vec<f64> = Vec::with_capacity(self.postfix.len());

    for item in &self.postfix {
      match item {
        PostfixItem::Number(value) => operands.push(*value),
        PostfixItem::Variable(name) => operands.push(symbols.get_value(name)?),
        PostfixItem::Function { name, arguments } => {
          if operands.len() < *arguments {
            return Err(ExpressionError::Evaluation(format!(
              "function {name} requires {arguments} operands"
            )));
          }
          let args = operands.split_off(operands.len() - arguments);
          operands.push(symbols.invoke_func(name, &args)?);
        }
        PostfixItem::Operator(operator) => {
          let (Some(operand2), Some(operand1)) = (operands.pop(), operands.pop())
          else {
            return Err(ExpressionError::Evaluation(
              "operation requires two operands".to_string(),
            ));
          };
          operands.push(operator.apply(operand1, operand2));
        }
      }
    }

    Ok(operands.pop().unwrap_or(0.0))
  }
}

impl FromStr for Expression {
  type Err = ExpressionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

/// Displays the postfix form, e.g. `4 6 + 2 /`.
impl fmt::Display for Expression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, item) in self.postfix.iter().enumerate() {
      if i > 0 {
        f.write_str(" ")?;
      }
      write!(f, "{item}")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn eval(source: &str) -> f64 {
    let table = FloatSymbolTable::with_standard_functions();
    Expression::parse(source).unwrap().evaluate(&table).unwrap()
  }

  #[test]
  fn postfix_display() {
    assert_eq!(Expression::parse("2 + 5").unwrap().to_string(), "2 5 +");
    assert_eq!(
      Expression::parse("( 4 + ( 2 * 3 ) ) / 2").unwrap().to_string(),
      "4 2 3 * + 2 /"
    );
    assert_eq!(
      Expression::parse("2*sin(x)+1").unwrap().to_string(),
      "2 x sin * 1 +"
    );
  }

  #[test]
  fn empty_expression_is_zero() {
    assert_eq!(eval(""), 0.0);
    assert_eq!(eval("   "), 0.0);
  }

  #[test]
  fn division_by_zero_follows_ieee() {
    assert_eq!(eval("1/0"), f64::INFINITY);
    assert_eq!(eval("0-1/0"), f64::NEG_INFINITY);
    assert!(eval("0/0").is_nan());
  }

  #[test]
  fn starved_operator_stack() {
    let expression = Expression {
      source: "+".to_string(),
      postfix: vec![PostfixItem::Number(1.0), PostfixItem::Operator(Operator::Add)],
    };
    let table = FloatSymbolTable::new();
    assert_eq!(
      expression.evaluate(&table).unwrap_err().to_string(),
      "operation requires two operands"
    );
  }

  #[test]
  fn parse_errors_are_wrapped() {
    let err = Expression::parse("2 $ 3").unwrap_err();
    assert_eq!(
      err.to_string(),
      "error parsing expression: invalid character in expression: $"
    );
  }
}
