// The primitive-procedure catalog: arithmetic, comparison, list/pair
// operations, type predicates, and the handful of primitives that need
// the calling environment (eval, apply, load).
//
// Every primitive raises SchemeError::PrimitiveError on a bad argument
// shape or type, kept distinct from SchemeError::Arity, which is the
// evaluator's own bookkeeping when a user procedure is called wrong.

use std::fs;
use std::rc::Rc;

use crate::env::{Env, Frame};
use crate::error::{Result, SchemeError};
use crate::eval;
use crate::promise;
use crate::value::{Number, PrimitiveData, PrimitiveFn, Value};

macro_rules! check_arity {
    ($args:expr, $exact:expr, $name:expr) => {
        if $args.len() != $exact {
            return Err(SchemeError::PrimitiveError(format!(
                "{}: expected {} argument(s), got {}",
                $name,
                $exact,
                $args.len()
            )));
        }
    };
    ($args:expr, >= $min:expr, $name:expr) => {
        if $args.len() < $min {
            return Err(SchemeError::PrimitiveError(format!(
                "{}: expected at least {} argument(s), got {}",
                $name,
                $min,
                $args.len()
            )));
        }
    };
}

fn extract_number(val: &Value, name: &str) -> Result<Number> {
    match val {
        Value::Number(n) => Ok(*n),
        other => Err(SchemeError::PrimitiveError(format!(
            "{name}: expected a number, got {}",
            other.type_name()
        ))),
    }
}

// Int+Int stays Int; anything touching a Float promotes to Float.
fn numeric_fold(args: &[Value], name: &str, init: i64, op: fn(Number, Number) -> Number) -> Result<Value> {
    let mut acc = Number::Int(init);
    for val in args {
        acc = op(acc, extract_number(val, name)?);
    }
    Ok(Value::Number(acc))
}

fn add_numbers(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x + y),
        _ => Number::Float(a.as_f64() + b.as_f64()),
    }
}

fn mul_numbers(a: Number, b: Number) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Number::Int(x * y),
        _ => Number::Float(a.as_f64() * b.as_f64()),
    }
}

fn add(args: &[Value]) -> Result<Value> {
    numeric_fold(args, "+", 0, add_numbers)
}

fn multiply(args: &[Value]) -> Result<Value> {
    numeric_fold(args, "*", 1, mul_numbers)
}

fn subtract(args: &[Value]) -> Result<Value> {
    check_arity!(args, >= 1, "-");
    let first = extract_number(&args[0], "-")?;
    if args.len() == 1 {
        return Ok(Value::Number(match first {
            Number::Int(i) => Number::Int(-i),
            Number::Float(f) => Number::Float(-f),
        }));
    }
    let mut result = first;
    for val in &args[1..] {
        let rhs = extract_number(val, "-")?;
        result = match (result, rhs) {
            (Number::Int(x), Number::Int(y)) => Number::Int(x - y),
            _ => Number::Float(result.as_f64() - rhs.as_f64()),
        };
    }
    Ok(Value::Number(result))
}

fn divide(args: &[Value]) -> Result<Value> {
    check_arity!(args, >= 1, "/");
    let first = extract_number(&args[0], "/")?;
    let (mut num, mut denom_is_float) = (first.as_f64(), matches!(first, Number::Float(_)));
    if args.len() == 1 {
        if num == 0.0 {
            return Err(SchemeError::PrimitiveError("/: division by zero".to_string()));
        }
        return Ok(Value::Number(Number::Float(1.0 / num)));
    }
    for val in &args[1..] {
        let rhs = extract_number(val, "/")?;
        if rhs.as_f64() == 0.0 {
            return Err(SchemeError::PrimitiveError("/: division by zero".to_string()));
        }
        denom_is_float = denom_is_float || matches!(rhs, Number::Float(_));
        num /= rhs.as_f64();
    }
    if denom_is_float {
        Ok(Value::Number(Number::Float(num)))
    } else {
        Ok(Value::Number(Number::Int(num as i64)))
    }
}

fn compare_chain(args: &[Value], name: &str, ok: fn(f64, f64) -> bool) -> Result<Value> {
    check_arity!(args, >= 1, name);
    let mut prev = extract_number(&args[0], name)?.as_f64();
    for val in &args[1..] {
        let cur = extract_number(val, name)?.as_f64();
        if !ok(prev, cur) {
            return Ok(Value::Boolean(false));
        }
        prev = cur;
    }
    Ok(Value::Boolean(true))
}

fn num_eq(args: &[Value]) -> Result<Value> {
    compare_chain(args, "=", |a, b| a == b)
}

fn less_than(args: &[Value]) -> Result<Value> {
    compare_chain(args, "<", |a, b| a < b)
}

fn greater_than(args: &[Value]) -> Result<Value> {
    compare_chain(args, ">", |a, b| a > b)
}

fn less_or_equal(args: &[Value]) -> Result<Value> {
    compare_chain(args, "<=", |a, b| a <= b)
}

fn greater_or_equal(args: &[Value]) -> Result<Value> {
    compare_chain(args, ">=", |a, b| a >= b)
}

fn cons(args: &[Value]) -> Result<Value> {
    check_arity!(args, 2, "cons");
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

fn car(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "car");
    args[0]
        .as_pair()
        .map(|p| p.first.clone())
        .ok_or_else(|| Value::type_error("pair", &args[0]))
}

fn cdr(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "cdr");
    args[0]
        .as_pair()
        .map(|p| p.second.clone())
        .ok_or_else(|| Value::type_error("pair", &args[0]))
}

fn list(args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.to_vec()))
}

fn is_pair(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "pair?");
    Ok(Value::Boolean(args[0].is_pair()))
}

fn is_null(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "null?");
    Ok(Value::Boolean(args[0].is_empty_list()))
}

fn is_boolean(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "boolean?");
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}

fn is_symbol(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "symbol?");
    Ok(Value::Boolean(args[0].is_symbol()))
}

fn is_number(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "number?");
    Ok(Value::Boolean(matches!(args[0], Value::Number(_))))
}

fn is_string(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "string?");
    Ok(Value::Boolean(args[0].is_string()))
}

fn is_procedure(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "procedure?");
    Ok(Value::Boolean(matches!(
        args[0],
        Value::Primitive(_) | Value::Lambda(_) | Value::Mu(_)
    )))
}

fn is_list(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "list?");
    Ok(Value::Boolean(args[0].is_list()))
}

fn equal_q(args: &[Value]) -> Result<Value> {
    check_arity!(args, 2, "equal?");
    Ok(Value::Boolean(args[0] == args[1]))
}

fn not(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "not");
    Ok(Value::Boolean(args[0].is_false()))
}

fn display(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "display");
    match &args[0] {
        Value::Str(s) => print!("{s}"),
        other => print!("{other}"),
    }
    Ok(Value::Okay)
}

fn newline(args: &[Value]) -> Result<Value> {
    check_arity!(args, 0, "newline");
    println!();
    Ok(Value::Okay)
}

fn force_builtin(args: &[Value]) -> Result<Value> {
    check_arity!(args, 1, "force");
    promise::force(&args[0])
}

// (eval expr): evaluates expr in the calling environment.
fn builtin_eval(args: &[Value], env: &Env) -> Result<Value> {
    check_arity!(args, 1, "eval");
    eval::eval(&args[0], env)
}

// (apply proc args-list): applies proc to the elements of args-list in
// the calling environment.
fn builtin_apply(args: &[Value], env: &Env) -> Result<Value> {
    check_arity!(args, 2, "apply");
    let proc = args[0].clone();
    let arg_list = args[1]
        .to_vec()
        .map_err(|_| SchemeError::PrimitiveError("apply: second argument must be a list".to_string()))?;
    eval::apply(proc, arg_list, env)
}

// (load "path"): reads, parses, and evaluates every top-level form in
// the named file in the calling environment, in order.
fn builtin_load(args: &[Value], env: &Env) -> Result<Value> {
    check_arity!(args, 1, "load");
    let Value::Str(path) = &args[0] else {
        return Err(SchemeError::PrimitiveError(
            "load: expected a string path".to_string(),
        ));
    };
    let source = fs::read_to_string(path.as_ref())
        .map_err(|_| SchemeError::FileNotFound(path.to_string()))?;
    let forms = crate::parser::parse(&source)?;
    let mut result = Value::Okay;
    for form in &forms {
        result = eval::eval(form, env)?;
    }
    Ok(result)
}

fn primitive(name: &'static str, func: fn(&[Value]) -> Result<Value>) -> Value {
    Value::Primitive(Rc::new(PrimitiveData {
        name: name.to_string(),
        func: PrimitiveFn::Plain(func),
    }))
}

fn primitive_with_env(
    name: &'static str,
    func: fn(&[Value], &Env) -> Result<Value>,
) -> Value {
    Value::Primitive(Rc::new(PrimitiveData {
        name: name.to_string(),
        func: PrimitiveFn::WithEnv(func),
    }))
}

// Binds every primitive procedure into env. Called once against the
// global frame before a REPL/file-load session begins.
pub fn populate(env: &Env) {
    let plain: &[(&'static str, fn(&[Value]) -> Result<Value>)] = &[
        ("+", add),
        ("-", subtract),
        ("*", multiply),
        ("/", divide),
        ("=", num_eq),
        ("<", less_than),
        (">", greater_than),
        ("<=", less_or_equal),
        (">=", greater_or_equal),
        ("cons", cons),
        ("car", car),
        ("cdr", cdr),
        ("list", list),
        ("pair?", is_pair),
        ("null?", is_null),
        ("boolean?", is_boolean),
        ("symbol?", is_symbol),
        ("number?", is_number),
        ("string?", is_string),
        ("procedure?", is_procedure),
        ("list?", is_list),
        ("equal?", equal_q),
        ("not", not),
        ("display", display),
        ("newline", newline),
        ("force", force_builtin),
    ];
    for (name, func) in plain {
        Frame::define(env, Rc::from(*name), primitive(name, *func));
    }

    let with_env: &[(&'static str, fn(&[Value], &Env) -> Result<Value>)] = &[
        ("eval", builtin_eval),
        ("apply", builtin_apply),
        ("load", builtin_load),
    ];
    for (name, func) in with_env {
        Frame::define(env, Rc::from(*name), primitive_with_env(name, *func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;

    fn run(src: &str, env: &Env) -> Result<Value> {
        eval::eval(&parse_one(src).unwrap(), env)
    }

    fn env() -> Env {
        let env = Frame::new_global();
        populate(&env);
        env
    }

    #[test]
    fn arithmetic_promotes_to_float_on_mixed_input() {
        let env = env();
        assert_eq!(run("(+ 1 2 3)", &env).unwrap(), Value::int(6));
        assert_eq!(run("(+ 1 2.5)", &env).unwrap(), Value::float(3.5));
    }

    #[test]
    fn division_by_zero_is_a_primitive_error() {
        let env = env();
        let err = run("(/ 1 0)", &env).unwrap_err();
        assert!(matches!(err, SchemeError::PrimitiveError(_)));
    }

    #[test]
    fn comparison_chains() {
        let env = env();
        assert_eq!(run("(< 1 2 3)", &env).unwrap(), Value::Boolean(true));
        assert_eq!(run("(< 1 3 2)", &env).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn car_of_non_pair_is_a_type_error() {
        let env = env();
        assert!(run("(car 5)", &env).is_err());
    }

    #[test]
    fn apply_spreads_a_list_of_arguments() {
        let env = env();
        assert_eq!(
            run("(apply + (list 1 2 3))", &env).unwrap(),
            Value::int(6)
        );
    }

    #[test]
    fn eval_runs_in_the_calling_environment() {
        let env = env();
        run("(define x 10)", &env).unwrap();
        assert_eq!(run("(eval (quote x))", &env).unwrap(), Value::int(10));
    }
}
