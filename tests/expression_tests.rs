use plotscript::expression::{
  add_standard_math_funcs, Expression, ExpressionError, FloatSymbolTable,
  SymbolTable,
};

fn eval(source: &str) -> f64 {
  let table = FloatSymbolTable::with_standard_functions();
  Expression::parse(source).unwrap().evaluate(&table).unwrap()
}

fn parse_error(source: &str) -> String {
  Expression::parse(source).unwrap_err().to_string()
}

mod expression_tests {
  use super::*;

  mod arithmetic {
    use super::*;

    #[test]
    fn precedence() {
      assert_eq!(eval("2+5"), 7.0);
      assert_eq!(eval("2*5+8"), 18.0);
      assert_eq!(eval("2+5*8"), 42.0);
    }

    #[test]
    fn parenthesis() {
      assert_eq!(eval("(4+6)/2"), 5.0);
      assert_eq!(eval("(4+(2*3))/2"), 5.0);
      assert_eq!(eval("((((1))))"), 1.0);
    }

    #[test]
    fn left_associative() {
      assert_eq!(eval("10-3-2"), 5.0);
      assert_eq!(eval("8/4/2"), 1.0);
      assert_eq!(eval("2*3/6*4"), 4.0);
    }

    #[test]
    fn decimals() {
      assert_eq!(eval("0.5 * 3"), 1.5);
      assert_eq!(eval(".25 + 1."), 1.25);
    }
  }

  mod variables {
    use super::*;

    #[test]
    fn compiled_once_evaluated_many_times() {
      let expression = Expression::parse("2+x").unwrap();
      let mut table = FloatSymbolTable::new();

      table.set_value("x", 5.0);
      assert_eq!(expression.evaluate(&table).unwrap(), 7.0);

      table.set_value("x", 2.0);
      assert_eq!(expression.evaluate(&table).unwrap(), 4.0);
    }

    #[test]
    fn unbound_variable() {
      let expression = Expression::parse("x*y").unwrap();
      let mut table = FloatSymbolTable::new();
      table.set_value("x", 1.0);
      assert_eq!(
        expression.evaluate(&table).unwrap_err(),
        ExpressionError::Evaluation("unknown symbol name: y".to_string())
      );
    }
  }

  mod functions {
    use super::*;

    #[test]
    fn sine_at_zero() {
      let expression = Expression::parse("sin(x)").unwrap();
      let mut table = FloatSymbolTable::new();
      add_standard_math_funcs(&mut table);
      table.set_value("x", 0.0);
      assert_eq!(expression.evaluate(&table).unwrap(), 0.0);
    }

    #[test]
    fn nested_calls() {
      assert_eq!(eval("sqrt(abs(0-16))"), 4.0);
      assert!((eval("2*cos(0)+log(exp(3))") - 5.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_function() {
      let table = FloatSymbolTable::with_standard_functions();
      let err = Expression::parse("foo(1)")
        .unwrap()
        .evaluate(&table)
        .unwrap_err();
      assert_eq!(err.to_string(), "unknown function name: foo");
    }

    #[test]
    fn wrong_arity() {
      let mut table = FloatSymbolTable::new();
      table.define_func("two", Box::new(|args: &[f64]| args[0] + args[1]), 2);
      let err = Expression::parse("two(1)")
        .unwrap()
        .evaluate(&table)
        .unwrap_err();
      assert_eq!(
        err.to_string(),
        "invalid number or parameters invoking function: two"
      );
    }
  }

  mod errors {
    use super::*;

    #[test]
    fn unbalanced_parenthesis() {
      assert_eq!(
        parse_error("(4+6/2"),
        "error parsing expression: expression with unbalanced parenthesis"
      );
    }

    #[test]
    fn trailing_tokens() {
      assert_eq!(
        parse_error("2 + 3 4"),
        "error parsing expression: syntax error: unexpected token 4"
      );
      assert_eq!(
        parse_error("(1) (2)"),
        "error parsing expression: syntax error: unexpected token ("
      );
    }

    #[test]
    fn lexical() {
      assert_eq!(
        parse_error("3y"),
        "error parsing expression: invalid numeric literal: 3y"
      );
      assert_eq!(
        parse_error("a.b"),
        "error parsing expression: invalid character in identifier: a."
      );
    }

    #[test]
    fn missing_operand() {
      assert_eq!(
        parse_error("4 *"),
        "error parsing expression: syntax error: expected token factor"
      );
    }
  }
}
