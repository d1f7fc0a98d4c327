//! The context free grammar for infix expressions.
//!
//! ```text
//! TARGET          -> EXPRESSION
//! EXPRESSION      -> TERM EXPRESSION_LINE
//! EXPRESSION_LINE -> + TERM EXPRESSION_LINE | - TERM EXPRESSION_LINE | EMPTY
//! TERM            -> FACTOR TERM_LINE
//! TERM_LINE       -> * FACTOR TERM_LINE | / FACTOR TERM_LINE | EMPTY
//! FACTOR          -> ( EXPRESSION ) | NAME ( PARAMETER_LIST ) | LITERAL | NAME
//! PARAMETER_LIST  -> EXPRESSION
//! ```

use std::fmt;

use super::token::{Token, TokenCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
  Terminal(TokenCategory),
  Target,
  Expression,
  ExpressionLine,
  Term,
  TermLine,
  Factor,
  ParameterList,
}

impl Symbol {
  pub fn is_terminal(self) -> bool {
    matches!(self, Symbol::Terminal(_))
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Symbol::Terminal(category) => write!(f, "{category}"),
      Symbol::Target => f.write_str("target"),
      Symbol::Expression => f.write_str("expression"),
      Symbol::ExpressionLine => f.write_str("expression line"),
      Symbol::Term => f.write_str("term"),
      Symbol::TermLine => f.write_str("term line"),
      Symbol::Factor => f.write_str("factor"),
      Symbol::ParameterList => f.write_str("parameter list"),
    }
  }
}

/// One alternative of a non-terminal.
#[derive(Debug, PartialEq, Eq)]
pub struct Production {
  pub symbol: Symbol,
  pub derives: &'static [Symbol],
  /// Leading terminals of `derives` that must match the input.
  pub lookahead: usize,
}

const LITERAL: Symbol = Symbol::Terminal(TokenCategory::Literal);
const NAME: Symbol = Symbol::Terminal(TokenCategory::Name);
const ADD: Symbol = Symbol::Terminal(TokenCategory::AddOperator);
const SUB: Symbol = Symbol::Terminal(TokenCategory::SubOperator);
const TIMES: Symbol = Symbol::Terminal(TokenCategory::TimesOperator);
const DIV: Symbol = Symbol::Terminal(TokenCategory::DivOperator);
const OPEN: Symbol = Symbol::Terminal(TokenCategory::OpenParenthesis);
const CLOSE: Symbol = Symbol::Terminal(TokenCategory::CloseParenthesis);
pub const EMPTY: Symbol = Symbol::Terminal(TokenCategory::Empty);

const fn production(
  symbol: Symbol,
  derives: &'static [Symbol],
  lookahead: usize,
) -> Production {
  Production {
    symbol,
    derives,
    lookahead,
  }
}

/// Alternatives sharing a symbol are tried in table order, so the two token
/// function call must come before the bare `NAME`.
pub static GRAMMAR: [Production; 13] = [
  production(Symbol::Target, &[Symbol::Expression], 0),
  production(Symbol::Expression, &[Symbol::Term, Symbol::ExpressionLine], 0),
  production(Symbol::ExpressionLine, &[ADD, Symbol::Term, Symbol::ExpressionLine], 1),
  production(Symbol::ExpressionLine, &[SUB, Symbol::Term, Symbol::ExpressionLine], 1),
  production(Symbol::ExpressionLine, &[EMPTY], 0),
  production(Symbol::Term, &[Symbol::Factor, Symbol::TermLine], 0),
  production(Symbol::TermLine, &[TIMES, Symbol::Factor, Symbol::TermLine], 1),
  production(Symbol::TermLine, &[DIV, Symbol::Factor, Symbol::TermLine], 1),
  production(Symbol::TermLine, &[EMPTY], 0),
  production(Symbol::Factor, &[OPEN, Symbol::Expression, CLOSE], 1),
  production(Symbol::Factor, &[NAME, OPEN, Symbol::ParameterList, CLOSE], 2),
  production(Symbol::Factor, &[LITERAL], 1),
  production(Symbol::Factor, &[NAME], 1),
];

pub fn productions(symbol: Symbol) -> impl Iterator<Item = &'static Production> {
  GRAMMAR.iter().filter(move |entry| entry.symbol == symbol)
}

impl Production {
  pub fn derives_empty(&self) -> bool {
    matches!(self.derives, [EMPTY])
  }

  /// Whether the leading terminals match `input`.
  pub fn matches(&self, input: &[Token]) -> bool {
    if input.len() < self.lookahead {
      return false;
    }
    self.derives[..self.lookahead]
      .iter()
      .zip(input)
      .all(|(symbol, token)| *symbol == Symbol::Terminal(token.category))
  }
}

/// Why no production could be selected.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectError<'t> {
  Unexpected(&'t Token),
  Expected(Symbol),
}

/// Choose the production used to expand `symbol` at the head of `input`.
pub fn select(
  symbol: Symbol,
  input: &[Token],
) -> Result<&'static Production, SelectError<'_>> {
  let mut empty = None;

  for alternative in productions(symbol) {
    if alternative.lookahead == 0 && !alternative.derives_empty() {
      return Ok(alternative);
    }
    if alternative.derives_empty() {
      empty = Some(alternative);
    } else if alternative.matches(input) {
      return Ok(alternative);
    }
  }

  if let Some(empty) = empty {
    return Ok(empty);
  }
  match input.first() {
    Some(token) => Err(SelectError::Unexpected(token)),
    None => Err(SelectError::Expected(symbol)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokens(spec: &[(TokenCategory, &str)]) -> Vec<Token> {
    spec.iter().map(|(c, v)| Token::new(*c, *v)).collect()
  }

  #[test]
  fn function_call_needs_two_tokens() {
    let call = tokens(&[
      (TokenCategory::Name, "sin"),
      (TokenCategory::OpenParenthesis, "("),
    ]);
    let chosen = select(Symbol::Factor, &call).unwrap();
    assert_eq!(chosen.derives.len(), 4);

    let bare = tokens(&[
      (TokenCategory::Name, "x"),
      (TokenCategory::AddOperator, "+"),
    ]);
    assert_eq!(select(Symbol::Factor, &bare).unwrap().derives, &[NAME]);
  }

  #[test]
  fn line_falls_back_to_empty() {
    let close = tokens(&[(TokenCategory::CloseParenthesis, ")")]);
    assert!(select(Symbol::TermLine, &close).unwrap().derives_empty());
    assert!(select(Symbol::ExpressionLine, &[]).unwrap().derives_empty());
  }

  #[test]
  fn factor_without_match() {
    let plus = tokens(&[(TokenCategory::AddOperator, "+")]);
    assert!(matches!(
      select(Symbol::Factor, &plus),
      Err(SelectError::Unexpected(token)) if token.value == "+"
    ));
    assert_eq!(
      select(Symbol::Factor, &[]),
      Err(SelectError::Expected(Symbol::Factor))
    );
  }
}
