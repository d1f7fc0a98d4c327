//! Top-down LL parser, syntax tree desugaring and postfix emission.

use std::fmt;

use super::grammar::{self, SelectError, Symbol};
use super::token::{Token, TokenCategory};
use super::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Add,
  Sub,
  Times,
  Div,
}

impl Operator {
  fn from_category(category: TokenCategory) -> Option<Self> {
    match category {
      TokenCategory::AddOperator => Some(Operator::Add),
      TokenCategory::SubOperator => Some(Operator::Sub),
      TokenCategory::TimesOperator => Some(Operator::Times),
      TokenCategory::DivOperator => Some(Operator::Div),
      _ => None,
    }
  }

  pub fn apply(self, operand1: f64, operand2: f64) -> f64 {
    match self {
      Operator::Add => operand1 + operand2,
      Operator::Sub => operand1 - operand2,
      Operator::Times => operand1 * operand2,
      Operator::Div => operand1 / operand2,
    }
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Operator::Add => "+",
      Operator::Sub => "-",
      Operator::Times => "*",
      Operator::Div => "/",
    })
  }
}

/// One element of a postfix (Reverse Polish) sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixItem {
  Number(f64),
  Variable(String),
  Function { name: String, arguments: usize },
  Operator(Operator),
}

impl fmt::Display for PostfixItem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PostfixItem::Number(value) => write!(f, "{value}"),
      PostfixItem::Variable(name) => f.write_str(name),
      PostfixItem::Function { name, .. } => f.write_str(name),
      PostfixItem::Operator(operator) => write!(f, "{operator}"),
    }
  }
}

// ── Parse tree ───────────────────────────────────────────────────────────

#[derive(Debug)]
struct ParseNode {
  symbol: Symbol,
  children: Vec<usize>,
  /// Index into the token list, for terminals.
  token: Option<usize>,
}

impl ParseNode {
  fn new(symbol: Symbol) -> Self {
    Self {
      symbol,
      children: Vec::new(),
      token: None,
    }
  }
}

/// Arena of nodes; the root is at index 0.
#[derive(Debug)]
struct ParseTree {
  nodes: Vec<ParseNode>,
  tokens: Vec<Token>,
}

fn expected(symbol: Symbol) -> ExpressionError {
  ExpressionError::Syntax(format!("expected token {symbol}"))
}

fn unexpected(token: &Token) -> ExpressionError {
  ExpressionError::Syntax(format!("unexpected token {}", token.value))
}

impl ParseTree {
  /// Expand the grammar top-down, leftmost node first, until every leaf is
  /// a terminal bound to an input token (or EMPTY).
  fn build(tokens: Vec<Token>) -> Result<Self, ExpressionError> {
    let mut nodes = vec![ParseNode::new(Symbol::Target)];
    let mut work = vec![0usize];
    let mut position = 0usize;

    while let Some(index) = work.pop() {
      let symbol = nodes[index].symbol;

      match symbol {
        Symbol::Terminal(TokenCategory::Empty) => {}
        Symbol::Terminal(category) => {
          let token = tokens.get(position).ok_or_else(|| expected(symbol))?;
          if token.category != category {
            return Err(unexpected(token));
          }
          nodes[index].token = Some(position);
          position += 1;
        }
        _ => {
          let production =
            grammar::select(symbol, &tokens[position..]).map_err(|err| {
              match err {
                SelectError::Unexpected(token) => unexpected(token),
                SelectError::Expected(symbol) => expected(symbol),
              }
            })?;

          let first = nodes.len();
          nodes.extend(production.derives.iter().map(|d| ParseNode::new(*d)));
          let children: Vec<usize> = (first..nodes.len()).collect();
          work.extend(children.iter().rev());
          nodes[index].children = children;
        }
      }
    }

    if let Some(token) = tokens.get(position) {
      return Err(unexpected(token));
    }

    Ok(Self { nodes, tokens })
  }

  fn node(&self, index: usize) -> &ParseNode {
    &self.nodes[index]
  }

  fn token(&self, index: usize) -> &Token {
    // Terminal children are always bound once `build` succeeds.
    let node = self.node(index);
    &self.tokens[node.token.unwrap_or_default()]
  }
}

// ── Syntax tree ──────────────────────────────────────────────────────────

/// Parse tree with the `_LINE`/EMPTY chains folded into fixed arity nodes,
/// so that a post-order walk yields postfix order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SyntaxNode {
  Operand(Token),
  Binary {
    left: Box<SyntaxNode>,
    operator: Token,
    right: Box<SyntaxNode>,
  },
  Call {
    argument: Box<SyntaxNode>,
    function: Token,
  },
}

impl SyntaxNode {
  fn from_parse_tree(tree: &ParseTree, index: usize) -> Self {
    let node = tree.node(index);

    match node.symbol {
      Symbol::Target | Symbol::ParameterList => {
        Self::from_parse_tree(tree, node.children[0])
      }
      Symbol::Expression | Symbol::Term => {
        Self::fold_chain(tree, node.children[0], node.children[1])
      }
      Symbol::Factor => match node.children.as_slice() {
        [open, inner, _close]
          if tree.node(*open).symbol
            == Symbol::Terminal(TokenCategory::OpenParenthesis) =>
        {
          Self::from_parse_tree(tree, *inner)
        }
        [name, _open, parameters, _close] => {
          let mut function = tree.token(*name).clone();
          function.category = TokenCategory::FunctionName;
          SyntaxNode::Call {
            argument: Box::new(Self::from_parse_tree(tree, *parameters)),
            function,
          }
        }
        [operand] => SyntaxNode::Operand(tree.token(*operand).clone()),
        _ => unreachable!("factor productions have 1, 3 or 4 children"),
      },
      Symbol::ExpressionLine | Symbol::TermLine | Symbol::Terminal(_) => {
        unreachable!("{} is folded by its parent", node.symbol)
      }
    }
  }

  /// `head (op operand line)*` associates left to right.
  fn fold_chain(tree: &ParseTree, head: usize, mut line: usize) -> Self {
    let mut left = Self::from_parse_tree(tree, head);

    while let [operator, operand, rest] = tree.node(line).children.as_slice() {
      left = SyntaxNode::Binary {
        left: Box::new(left),
        operator: tree.token(*operator).clone(),
        right: Box::new(Self::from_parse_tree(tree, *operand)),
      };
      line = *rest;
    }
    left
  }

  fn emit_postfix(
    &self,
    postfix: &mut Vec<PostfixItem>,
  ) -> Result<(), ExpressionError> {
    match self {
      SyntaxNode::Operand(token) => postfix.push(match token.category {
        TokenCategory::Literal => {
          PostfixItem::Number(token.value.parse().map_err(|_| {
            ExpressionError::Lexical(format!(
              "invalid numeric literal: {}",
              token.value
            ))
          })?)
        }
        _ => PostfixItem::Variable(token.value.clone()),
      }),
      SyntaxNode::Binary {
        left,
        operator,
        right,
      } => {
        left.emit_postfix(postfix)?;
        right.emit_postfix(postfix)?;
        let operator = Operator::from_category(operator.category)
          .ok_or_else(|| unexpected(operator))?;
        postfix.push(PostfixItem::Operator(operator));
      }
      SyntaxNode::Call { argument, function } => {
        argument.emit_postfix(postfix)?;
        postfix.push(PostfixItem::Function {
          name: function.value.clone(),
          arguments: 1,
        });
      }
    }
    Ok(())
  }
}

fn check_parenthesis(tokens: &[Token]) -> Result<(), ExpressionError> {
  let mut depth = 0i64;
  for token in tokens {
    match token.category {
      TokenCategory::OpenParenthesis => depth += 1,
      TokenCategory::CloseParenthesis => depth -= 1,
      _ => {}
    }
    if depth < 0 {
      return Err(ExpressionError::UnbalancedParenthesis);
    }
  }
  if depth != 0 {
    return Err(ExpressionError::UnbalancedParenthesis);
  }
  Ok(())
}

pub(crate) fn syntax_tree(
  tokens: Vec<Token>,
) -> Result<SyntaxNode, ExpressionError> {
  check_parenthesis(&tokens)?;
  let tree = ParseTree::build(tokens)?;
  Ok(SyntaxNode::from_parse_tree(&tree, 0))
}

/// Convert a token list into its postfix form.
pub fn infix_to_postfix(
  tokens: Vec<Token>,
) -> Result<Vec<PostfixItem>, ExpressionError> {
  if tokens.is_empty() {
    return Ok(Vec::new());
  }

  let tree = syntax_tree(tokens)?;
  let mut postfix = Vec::new();
  tree.emit_postfix(&mut postfix)?;
  Ok(postfix)
}
