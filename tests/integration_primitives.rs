// End-to-end tests for the primitive-procedure catalog: arithmetic,
// predicates, list operations, equal?, apply, eval.

use scheme_core::{new_global_environment, parser, Env, Result, SchemeError, Value};

fn eval_source(source: &str, env: &Env) -> Result<Value> {
    let expr = parser::parse_one(source)?;
    scheme_core::eval(&expr, env)
}

#[test]
fn arithmetic_and_mixed_numeric_promotion() {
    let env = new_global_environment();
    assert_eq!(eval_source("(+ 1 2 3 4)", &env).unwrap(), Value::int(10));
    assert_eq!(eval_source("(- 10 3 2)", &env).unwrap(), Value::int(5));
    assert_eq!(eval_source("(* 2 3 4)", &env).unwrap(), Value::int(24));
    assert_eq!(eval_source("(+ 1 0.5)", &env).unwrap(), Value::float(1.5));
}

#[test]
fn division_by_zero_is_an_error_not_a_panic() {
    let env = new_global_environment();
    let err = eval_source("(/ 1 0)", &env).unwrap_err();
    assert!(matches!(err, SchemeError::PrimitiveError(_)));
}

#[test]
fn list_construction_and_traversal() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(car (cons 1 2))", &env).unwrap(),
        Value::int(1)
    );
    assert_eq!(
        eval_source("(cdr (list 1 2 3))", &env).unwrap(),
        Value::list(vec![Value::int(2), Value::int(3)])
    );
    assert_eq!(eval_source("(null? '())", &env).unwrap(), Value::Boolean(true));
    assert_eq!(
        eval_source("(pair? (cons 1 2))", &env).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn equal_is_structural() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(equal? (list 1 2) (list 1 2))", &env).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_source("(equal? (list 1 2) (list 1 3))", &env).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn type_predicates() {
    let env = new_global_environment();
    assert_eq!(eval_source("(number? 1)", &env).unwrap(), Value::Boolean(true));
    assert_eq!(eval_source("(symbol? 'a)", &env).unwrap(), Value::Boolean(true));
    assert_eq!(eval_source("(string? \"x\")", &env).unwrap(), Value::Boolean(true));
    assert_eq!(
        eval_source("(procedure? car)", &env).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval_source("(procedure? (lambda (x) x))", &env).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn apply_spreads_arguments_from_a_list() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(apply + (list 1 2 3 4))", &env).unwrap(),
        Value::int(10)
    );
}

#[test]
fn eval_runs_a_quoted_expression_in_the_calling_environment() {
    let env = new_global_environment();
    eval_source("(define x 99)", &env).unwrap();
    assert_eq!(eval_source("(eval (quote (+ x 1)))", &env).unwrap(), Value::int(100));
}

#[test]
fn calling_a_non_procedure_reports_not_callable() {
    let env = new_global_environment();
    assert!(eval_source("(5 1 2)", &env).is_err());
}

#[test]
fn unknown_identifier_is_reported() {
    let env = new_global_environment();
    assert!(eval_source("undefined-name", &env).is_err());
}
