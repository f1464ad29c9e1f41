// Handlers for define, quote, if, lambda, mu, let, begin, and, or, cond,
// delay, cons-stream, plus the structural validation (check_form,
// check_formals) they all lean on. Each handler returns either a concrete
// Value or a Thunk marking a tail position, per the trampoline in eval.rs.
// The registry is a lazy_static table built once at process start.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::env::{Env, Frame};
use crate::error::{Result, SchemeError};
use crate::eval::{eval, eval_body_tail, EvalOutcome};
use crate::promise::make_promise;
use crate::value::{LambdaData, MuData, Value};
use std::rc::Rc;

pub type SpecialFormFn = fn(&Value, &Env) -> Result<EvalOutcome>;

lazy_static! {
    pub static ref SPECIAL_FORMS: HashMap<&'static str, SpecialFormFn> = {
        let mut m: HashMap<&'static str, SpecialFormFn> = HashMap::new();
        m.insert("define", do_define as SpecialFormFn);
        m.insert("quote", do_quote as SpecialFormFn);
        m.insert("if", do_if as SpecialFormFn);
        m.insert("lambda", do_lambda as SpecialFormFn);
        m.insert("mu", do_mu as SpecialFormFn);
        m.insert("let", do_let as SpecialFormFn);
        m.insert("begin", do_begin as SpecialFormFn);
        m.insert("and", do_and as SpecialFormFn);
        m.insert("or", do_or as SpecialFormFn);
        m.insert("cond", do_cond as SpecialFormFn);
        m.insert("delay", do_delay as SpecialFormFn);
        m.insert("cons-stream", do_cons_stream as SpecialFormFn);
        m
    };
}

pub fn lookup(name: &str) -> Option<SpecialFormFn> {
    SPECIAL_FORMS.get(name).copied()
}

// expr must be a proper list whose length lies in [min, max].
pub fn check_form(expr: &Value, min: usize, max: usize) -> Result<()> {
    if !expr.is_list() {
        return Err(SchemeError::BadForm(expr.to_string()));
    }
    let len = expr.list_len()?;
    if len < min {
        return Err(SchemeError::BadForm(format!(
            "too few operands in form: {expr}"
        )));
    }
    if len > max {
        return Err(SchemeError::BadForm(format!(
            "too many operands in form: {expr}"
        )));
    }
    Ok(())
}

// formals must be a proper list of distinct symbols.
pub fn check_formals(formals: &Value) -> Result<()> {
    let names = formals.to_vec()?;
    for (i, name) in names.iter().enumerate() {
        let Some(sym) = name.as_symbol_name() else {
            return Err(SchemeError::NonSymbolFormal(name.to_string()));
        };
        if names[i + 1..]
            .iter()
            .any(|other| other.as_symbol_name() == Some(sym))
        {
            return Err(SchemeError::DuplicateFormal(sym.to_string()));
        }
    }
    Ok(())
}

fn first(list: &Value) -> Result<Value> {
    list.as_pair()
        .map(|p| p.first.clone())
        .ok_or_else(|| SchemeError::BadForm(list.to_string()))
}

fn rest(list: &Value) -> Result<Value> {
    list.as_pair()
        .map(|p| p.second.clone())
        .ok_or_else(|| SchemeError::BadForm(list.to_string()))
}

fn nth(list: &Value, n: usize) -> Result<Value> {
    let mut cur = list.clone();
    for _ in 0..n {
        cur = rest(&cur)?;
    }
    first(&cur)
}

fn tail(expr: Value, env: &Env) -> Result<EvalOutcome> {
    Ok(EvalOutcome::Tail(crate::eval::Thunk {
        expr,
        env: Rc::clone(env),
    }))
}

// (define sym value-expr) or (define (sym . formals) body...).
fn do_define(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, usize::MAX)?;
    let target = first(operands)?;
    let body_and_rest = rest(operands)?;

    if let Some(name) = target.as_symbol_name() {
        check_form(operands, 2, 2)?;
        let value_expr = first(&body_and_rest)?;
        let value = eval(&value_expr, env)?;
        Frame::define(env, name.into(), value);
        return Ok(EvalOutcome::Value(target));
    }

    if let Some(pair) = target.as_pair() {
        let Some(name) = pair.first.as_symbol_name() else {
            return Err(SchemeError::NonSymbolTarget(pair.first.to_string()));
        };
        let formals = pair.second.clone();
        check_formals(&formals)?;
        let lambda = Value::Lambda(Rc::new(LambdaData {
            formals,
            body: body_and_rest,
            defining_env: Rc::clone(env),
        }));
        let name_value = Value::symbol(name);
        Frame::define(env, name.into(), lambda);
        return Ok(EvalOutcome::Value(name_value));
    }

    Err(SchemeError::NonSymbolTarget(target.to_string()))
}

// (quote x): exactly one operand, returned unevaluated.
fn do_quote(operands: &Value, _env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 1, 1)?;
    Ok(EvalOutcome::Value(first(operands)?))
}

// (if pred conseq [alt]).
fn do_if(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, 3)?;
    let predicate = eval(&first(operands)?, env)?;
    if predicate.is_true() {
        tail(nth(operands, 1)?, env)
    } else if operands.list_len()? == 3 {
        tail(nth(operands, 2)?, env)
    } else {
        Ok(EvalOutcome::Value(Value::Okay))
    }
}

// (lambda formals body...): captures the current environment.
fn do_lambda(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, usize::MAX)?;
    let formals = first(operands)?;
    check_formals(&formals)?;
    let body = rest(operands)?;
    Ok(EvalOutcome::Value(Value::Lambda(Rc::new(LambdaData {
        formals,
        body,
        defining_env: Rc::clone(env),
    }))))
}

// (mu formals body...): no captured environment, resolves free variables
// in the caller's environment at each call site.
fn do_mu(operands: &Value, _env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, usize::MAX)?;
    let formals = first(operands)?;
    check_formals(&formals)?;
    let body = rest(operands)?;
    Ok(EvalOutcome::Value(Value::Mu(Rc::new(MuData {
        formals,
        body,
    }))))
}

// (begin expr...): last expression is in tail position.
fn do_begin(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 1, usize::MAX)?;
    eval_body_tail(operands, env)
}

// (let ((v1 e1) (v2 e2) ...) body...): simultaneous binding, no ei sees
// any vj.
fn do_let(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, usize::MAX)?;
    let bindings = first(operands)?;
    let body = rest(operands)?;

    if !bindings.is_list() {
        return Err(SchemeError::BadForm(format!(
            "bad bindings list in let form: {bindings}"
        )));
    }
    let clauses = bindings.to_vec()?;
    let mut names = Vec::with_capacity(clauses.len());
    let mut vals = Vec::with_capacity(clauses.len());
    for clause in &clauses {
        check_form(clause, 2, 2)?;
        names.push(first(clause)?);
        vals.push(eval(&nth(clause, 1)?, env)?);
    }
    let formals = Value::list(names);
    let let_env = Frame::make_child(env, &formals, &vals)?;
    eval_body_tail(&body, &let_env)
}

// (and e...): zero operands is #t, short-circuits on the first #f, the
// last operand is in tail position regardless of its value.
fn do_and(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    if operands.is_empty_list() {
        return Ok(EvalOutcome::Value(Value::Boolean(true)));
    }
    let mut cur = operands.clone();
    loop {
        let head = first(&cur)?;
        let remaining = rest(&cur)?;
        if remaining.is_empty_list() {
            return tail(head, env);
        }
        let value = eval(&head, env)?;
        if value.is_false() {
            return Ok(EvalOutcome::Value(Value::Boolean(false)));
        }
        cur = remaining;
    }
}

// (or e...): zero operands is #f, returns the first non-#f result, the
// last operand is in tail position regardless of its value.
fn do_or(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    if operands.is_empty_list() {
        return Ok(EvalOutcome::Value(Value::Boolean(false)));
    }
    let mut cur = operands.clone();
    loop {
        let head = first(&cur)?;
        let remaining = rest(&cur)?;
        if remaining.is_empty_list() {
            return tail(head, env);
        }
        let value = eval(&head, env)?;
        if value.is_true() {
            return Ok(EvalOutcome::Value(value));
        }
        cur = remaining;
    }
}

// (cond (test expr...)... [(else expr...)]).
fn do_cond(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    let clauses = operands.to_vec()?;
    let num_clauses = clauses.len();
    for (i, clause) in clauses.iter().enumerate() {
        check_form(clause, 1, usize::MAX)?;
        let test_expr = first(clause)?;
        let is_else = test_expr.as_symbol_name() == Some("else");
        if is_else && i != num_clauses - 1 {
            return Err(SchemeError::ElseNotLast);
        }
        let test_value = if is_else {
            Value::Boolean(true)
        } else {
            eval(&test_expr, env)?
        };
        if test_value.is_true() {
            let body = rest(clause)?;
            if body.is_empty_list() {
                return Ok(EvalOutcome::Value(if is_else {
                    Value::Boolean(true)
                } else {
                    test_value
                }));
            }
            return eval_body_tail(&body, env);
        }
    }
    Ok(EvalOutcome::Value(Value::Okay))
}

// (delay expr): an unforced promise over the single operand.
fn do_delay(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 1, 1)?;
    Ok(EvalOutcome::Value(make_promise(
        first(operands)?,
        Rc::clone(env),
    )))
}

// (cons-stream a b): a is evaluated eagerly, b is wrapped in an unforced
// promise.
fn do_cons_stream(operands: &Value, env: &Env) -> Result<EvalOutcome> {
    check_form(operands, 2, 2)?;
    let head = eval(&first(operands)?, env)?;
    let tail_expr = nth(operands, 1)?;
    let promise = make_promise(tail_expr, Rc::clone(env));
    Ok(EvalOutcome::Value(Value::cons(head, promise)))
}
