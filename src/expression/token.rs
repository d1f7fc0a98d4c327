use std::fmt;

use super::ExpressionError;

/// Terminal symbols of the expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
  Literal,
  Name,
  FunctionName,
  AddOperator,
  SubOperator,
  TimesOperator,
  DivOperator,
  OpenParenthesis,
  CloseParenthesis,
  /// Epsilon marker; never produced by the tokenizer.
  Empty,
}

impl fmt::Display for TokenCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      TokenCategory::Literal => "literal",
      TokenCategory::Name => "name",
      TokenCategory::FunctionName => "function name",
      TokenCategory::AddOperator => "+",
      TokenCategory::SubOperator => "-",
      TokenCategory::TimesOperator => "*",
      TokenCategory::DivOperator => "/",
      TokenCategory::OpenParenthesis => "(",
      TokenCategory::CloseParenthesis => ")",
      TokenCategory::Empty => "empty",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub category: TokenCategory,
  pub value: String,
}

impl Token {
  pub fn new(category: TokenCategory, value: impl Into<String>) -> Self {
    Self {
      category,
      value: value.into(),
    }
  }
}

/// Split an infix expression into tokens.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, ExpressionError> {
  let mut tokens = Vec::new();
  let mut identifier = String::new();
  let mut literal = String::new();

  for ch in expression.chars() {
    match ch {
      ' ' | '\t' | '+' | '-' | '*' | '/' | '(' | ')' => {
        flush(&mut tokens, &mut identifier, &mut literal)?;

        let category = match ch {
          '+' => TokenCategory::AddOperator,
          '-' => TokenCategory::SubOperator,
          '*' => TokenCategory::TimesOperator,
          '/' => TokenCategory::DivOperator,
          '(' => TokenCategory::OpenParenthesis,
          ')' => TokenCategory::CloseParenthesis,
          _ => continue,
        };
        tokens.push(Token::new(category, ch.to_string()));
      }
      '0'..='9' => {
        if identifier.is_empty() {
          literal.push(ch);
        } else {
          identifier.push(ch);
        }
      }
      '.' => {
        if !identifier.is_empty() {
          return Err(ExpressionError::Lexical(format!(
            "invalid character in identifier: {identifier}{ch}"
          )));
        }
        literal.push(ch);
      }
      'a'..='z' | 'A'..='Z' | '_' => {
        if !literal.is_empty() {
          return Err(ExpressionError::Lexical(format!(
            "invalid numeric literal: {literal}{ch}"
          )));
        }
        identifier.push(ch);
      }
      _ => {
        return Err(ExpressionError::Lexical(format!(
          "invalid character in expression: {ch}"
        )));
      }
    }
  }
  flush(&mut tokens, &mut identifier, &mut literal)?;

  Ok(tokens)
}

/// Emit whichever buffer is open as a completed token.
fn flush(
  tokens: &mut Vec<Token>,
  identifier: &mut String,
  literal: &mut String,
) -> Result<(), ExpressionError> {
  if !identifier.is_empty() {
    tokens.push(Token::new(TokenCategory::Name, std::mem::take(identifier)));
  }
  if !literal.is_empty() {
    if literal.parse::<f64>().is_err() {
      return Err(ExpressionError::Lexical(format!(
        "invalid numeric literal: {literal}"
      )));
    }
    tokens.push(Token::new(TokenCategory::Literal, std::mem::take(literal)));
  }
  Ok(())
}
