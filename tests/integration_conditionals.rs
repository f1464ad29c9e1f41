// End-to-end tests for if, cond, and, or.

use scheme_core::{new_global_environment, parser, Env, Result, SchemeError, Value};

fn eval_source(source: &str, env: &Env) -> Result<Value> {
    let expr = parser::parse_one(source)?;
    scheme_core::eval(&expr, env)
}

#[test]
fn if_only_evaluates_the_taken_branch() {
    let env = new_global_environment();
    assert_eq!(eval_source("(if #t 1 (/ 1 0))", &env).unwrap(), Value::int(1));
    assert_eq!(eval_source("(if #f (/ 1 0) 2)", &env).unwrap(), Value::int(2));
}

#[test]
fn if_without_an_alternative_returns_okay_when_false() {
    let env = new_global_environment();
    assert_eq!(eval_source("(if #f 1)", &env).unwrap(), Value::Okay);
}

#[test]
fn cond_dispatches_to_the_first_true_clause() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(cond (#f 1) (#t 2) (else 3))", &env).unwrap(),
        Value::int(2)
    );
    assert_eq!(eval_source("(cond (#f 1) (else 3))", &env).unwrap(), Value::int(3));
}

#[test]
fn cond_else_must_be_the_last_clause() {
    let env = new_global_environment();
    let err = eval_source("(cond (else 1) (#t 2))", &env).unwrap_err();
    assert!(matches!(err, SchemeError::ElseNotLast));
}

#[test]
fn cond_with_no_matching_clause_returns_okay() {
    let env = new_global_environment();
    assert_eq!(eval_source("(cond (#f 1) (#f 2))", &env).unwrap(), Value::Okay);
}

#[test]
fn and_short_circuits_on_the_first_false() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(and 1 2 #f (/ 1 0))", &env).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(eval_source("(and 1 2 3)", &env).unwrap(), Value::int(3));
    assert_eq!(eval_source("(and)", &env).unwrap(), Value::Boolean(true));
}

#[test]
fn or_short_circuits_on_the_first_true() {
    let env = new_global_environment();
    assert_eq!(
        eval_source("(or #f 2 (/ 1 0))", &env).unwrap(),
        Value::int(2)
    );
    assert_eq!(eval_source("(or #f #f)", &env).unwrap(), Value::Boolean(false));
    assert_eq!(eval_source("(or)", &env).unwrap(), Value::Boolean(false));
}
