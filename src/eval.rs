// Dispatch atoms/special forms/applications, apply procedures, and drive the
// tail-call trampoline. eval loops until a concrete Value is produced;
// tail-position evaluation returns a deferred Thunk instead of recursing
// natively, so chains of tail calls grow the native stack by O(1).

use std::cell::Cell;
use std::rc::Rc;

use crate::env::{Env, Frame};
use crate::error::{Result, SchemeError};
use crate::special_forms;
use crate::value::{PrimitiveFn, Value};

// A deferred expr/env pair pending evaluation in tail position.
pub struct Thunk {
    pub expr: Value,
    pub env: Env,
}

// Either a concrete value, or a tail call the trampoline should continue
// from.
pub enum EvalOutcome {
    Value(Value),
    Tail(Thunk),
}

// Bounds native Rust stack usage from non-tail recursion: argument and
// predicate evaluation, non-final body expressions, the positions the
// trampoline deliberately does not cover. Turns what would otherwise be an
// uncatchable stack overflow into a SchemeError::DeepRecursion.
const MAX_DEPTH: u32 = 4000;

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard> {
        let depth = DEPTH.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        if depth > MAX_DEPTH {
            DEPTH.with(|d| d.set(d.get() - 1));
            return Err(SchemeError::DeepRecursion);
        }
        Ok(DepthGuard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get() - 1));
    }
}

// Loops through tail calls until a concrete value is produced. This is the
// only entry point that recurses through Rust's native call stack, for
// non-tail sub-expressions, so it's the only one guarded against unbounded
// depth.
pub fn eval(expr: &Value, env: &Env) -> Result<Value> {
    let _guard = DepthGuard::enter()?;
    let mut cur_expr = expr.clone();
    let mut cur_env = Rc::clone(env);
    loop {
        match eval_step(&cur_expr, &cur_env)? {
            EvalOutcome::Value(v) => return Ok(v),
            EvalOutcome::Tail(thunk) => {
                cur_expr = thunk.expr;
                cur_env = thunk.env;
            }
        }
    }
}

// Atoms resolve directly; combinations hand off to a special-form handler
// or become a procedure application. Never recurses on expr itself, only on
// its non-tail sub-expressions; eval's trampoline drives this forward.
fn eval_step(expr: &Value, env: &Env) -> Result<EvalOutcome> {
    match expr {
        Value::Symbol(name) => Ok(EvalOutcome::Value(Frame::lookup(env, name)?)),
        Value::EmptyList => Err(SchemeError::Malformed("()".to_string())),
        Value::Pair(pair) => {
            let head = &pair.first;
            let operands = &pair.second;

            if let Some(name) = head.as_symbol_name() {
                if let Some(handler) = special_forms::lookup(name) {
                    return handler(operands, env);
                }
            }

            let procedure = eval(head, env)?;
            let mut args = Vec::new();
            operands.map_list(|operand| {
                args.push(eval(operand, env)?);
                Ok(Value::Okay)
            })?;
            apply_tail(procedure, args, env)
        }
        other => Ok(EvalOutcome::Value(other.clone())),
    }
}

// Body of a lambda/mu/let/begin: a proper list of at least one expression,
// implicit begin semantics. Every expression but the last runs for effect
// in non-tail position; the last becomes a tail thunk.
pub fn eval_body_tail(body: &Value, env: &Env) -> Result<EvalOutcome> {
    let mut cur = body.clone();
    loop {
        let pair = cur
            .as_pair()
            .ok_or_else(|| SchemeError::BadForm(cur.to_string()))?;
        if pair.second.is_empty_list() {
            return Ok(EvalOutcome::Tail(Thunk {
                expr: pair.first.clone(),
                env: Rc::clone(env),
            }));
        }
        eval(&pair.first, env)?;
        cur = pair.second.clone();
    }
}

// Applies procedure to already-evaluated args, draining any trailing tail
// call to a final value.
pub fn apply(procedure: Value, args: Vec<Value>, env: &Env) -> Result<Value> {
    match apply_tail(procedure, args, env)? {
        EvalOutcome::Value(v) => Ok(v),
        EvalOutcome::Tail(thunk) => eval(&thunk.expr, &thunk.env),
    }
}

// Primitive: invoked directly, with or without the calling env per its
// declared shape, never itself produces a tail call.
// Lambda: new frame parented by the lambda's captured environment, lexical
// scope.
// Mu: new frame parented by the caller's environment, dynamic scope.
pub(crate) fn apply_tail(procedure: Value, args: Vec<Value>, env: &Env) -> Result<EvalOutcome> {
    match procedure {
        Value::Primitive(prim) => {
            let result = match prim.func {
                PrimitiveFn::Plain(f) => f(&args)?,
                PrimitiveFn::WithEnv(f) => f(&args, env)?,
            };
            Ok(EvalOutcome::Value(result))
        }
        Value::Lambda(lambda) => {
            let new_env = Frame::make_child(&lambda.defining_env, &lambda.formals, &args)?;
            eval_body_tail(&lambda.body, &new_env)
        }
        Value::Mu(mu) => {
            let new_env = Frame::make_child(env, &mu.formals, &args)?;
            eval_body_tail(&mu.body, &new_env)
        }
        other => Err(SchemeError::NotCallable(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::parser::parse_one;

    fn global_with_builtins() -> Env {
        let env = Frame::new_global();
        builtins::populate(&env);
        env
    }

    fn run(src: &str, env: &Env) -> Result<Value> {
        eval(&parse_one(src).unwrap(), env)
    }

    #[test]
    fn self_evaluating_atoms_evaluate_to_themselves() {
        let env = global_with_builtins();
        assert_eq!(run("42", &env).unwrap(), Value::int(42));
        assert_eq!(run("\"hi\"", &env).unwrap(), Value::string("hi"));
        assert_eq!(run("#t", &env).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn quote_returns_its_operand_unevaluated() {
        let env = global_with_builtins();
        assert_eq!(
            run("(quote (a b))", &env).unwrap(),
            Value::list(vec![Value::symbol("a"), Value::symbol("b")])
        );
    }

    #[test]
    fn arithmetic_application() {
        let env = global_with_builtins();
        assert_eq!(run("(+ 2 2)", &env).unwrap(), Value::int(4));
    }

    #[test]
    fn recursive_factorial_via_lambda() {
        let env = global_with_builtins();
        run("(define (f x) (if (= x 0) 1 (* x (f (- x 1)))))", &env).unwrap();
        assert_eq!(run("(f 5)", &env).unwrap(), Value::int(120));
    }

    #[test]
    fn deeply_tail_recursive_loop_does_not_overflow_the_stack() {
        let env = global_with_builtins();
        run("(define (loop n) (if (= n 0) 'done (loop (- n 1))))", &env).unwrap();
        assert_eq!(run("(loop 200000)", &env).unwrap(), Value::symbol("done"));
    }

    #[test]
    fn calling_a_non_procedure_is_an_error() {
        let env = global_with_builtins();
        assert!(run("(1 2 3)", &env).is_err());
    }

    #[test]
    fn lambda_captures_its_defining_environment() {
        let env = global_with_builtins();
        run("(define x 1)", &env).unwrap();
        run("(define (get) x)", &env).unwrap();
        run("(define (caller) (define x 2) (get))", &env).unwrap();
        assert_eq!(run("(caller)", &env).unwrap(), Value::int(1));
    }

    #[test]
    fn mu_resolves_free_variables_in_the_callers_environment() {
        let env = global_with_builtins();
        run("(define x 1)", &env).unwrap();
        run("(define get (mu () x))", &env).unwrap();
        run("(define (caller) (define x 2) (get))", &env).unwrap();
        assert_eq!(run("(caller)", &env).unwrap(), Value::int(2));
    }

    #[test]
    fn unbounded_non_tail_recursion_raises_deep_recursion() {
        let env = global_with_builtins();
        run("(define (count-up n) (+ 1 (count-up (+ n 1))))", &env).unwrap();
        let err = run("(count-up 0)", &env).unwrap_err();
        assert!(matches!(err, SchemeError::DeepRecursion));
    }
}
