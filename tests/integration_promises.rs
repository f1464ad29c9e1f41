// End-to-end tests for delay, force, and cons-stream.

use scheme_core::{new_global_environment, parser, Env, Result, Value};

fn eval_source(source: &str, env: &Env) -> Result<Value> {
    let expr = parser::parse_one(source)?;
    scheme_core::eval(&expr, env)
}

#[test]
fn delay_defers_evaluation_until_forced() {
    let env = new_global_environment();
    eval_source("(define p (delay (+ 1 2)))", &env).unwrap();
    assert_eq!(eval_source("(force p)", &env).unwrap(), Value::int(3));
}

#[test]
fn delay_does_not_evaluate_its_body_at_creation_time() {
    let env = new_global_environment();
    // If `delay` evaluated eagerly, building this promise would itself
    // divide by zero. It must only raise once forced.
    let promise = eval_source("(delay (/ 1 0))", &env).unwrap();
    assert!(!promise.to_string().is_empty());
    assert!(eval_source("(force (delay (/ 1 0)))", &env).is_err());
}

#[test]
fn forcing_twice_yields_the_same_value() {
    let env = new_global_environment();
    eval_source("(define p (delay (+ 1 2)))", &env).unwrap();
    let first = eval_source("(force p)", &env).unwrap();
    let second = eval_source("(force p)", &env).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Value::int(3));
}

#[test]
fn cons_stream_evaluates_its_head_eagerly_and_tail_lazily() {
    let env = new_global_environment();
    let stream = eval_source("(cons-stream 1 (/ 1 0))", &env).unwrap();
    let head = eval_source("(car (cons-stream 1 (/ 1 0)))", &env).unwrap();
    assert_eq!(head, Value::int(1));
    // Forcing the tail would divide by zero; as long as we don't force it,
    // building the stream itself must not fail.
    assert!(stream.is_pair());
}

#[test]
fn integer_stream_can_be_walked_lazily() {
    let env = new_global_environment();
    eval_source(
        "(define (integers-from n) (cons-stream n (integers-from (+ n 1))))",
        &env,
    )
    .unwrap();
    eval_source("(define s (integers-from 1))", &env).unwrap();
    assert_eq!(eval_source("(car s)", &env).unwrap(), Value::int(1));
    assert_eq!(
        eval_source("(car (force (cdr s)))", &env).unwrap(),
        Value::int(2)
    );
    assert_eq!(
        eval_source("(car (force (cdr (force (cdr s)))))", &env).unwrap(),
        Value::int(3)
    );
}

#[test]
fn forcing_a_non_promise_is_a_type_error() {
    let env = new_global_environment();
    assert!(eval_source("(force 5)", &env).is_err());
}
