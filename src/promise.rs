// Memoized lazy values: the collaborator behind delay, cons-stream, and
// force.

use std::rc::Rc;

use crate::env::{Env, Frame};
use crate::error::{Result, SchemeError};
use crate::eval::eval;
use crate::value::{PromiseData, Value};

pub fn make_promise(expr: Value, defining_env: Env) -> Value {
    Value::Promise(Rc::new(PromiseData::new(expr, defining_env)))
}

// If p is unforced, evaluate its expression in a fresh child of its
// defining environment, so bindings made inside the delayed expression
// don't leak into it, memoize the result, and mark it forced. Forcing
// twice evaluates the body once.
pub fn force(value: &Value) -> Result<Value> {
    let Value::Promise(promise) = value else {
        return Err(Value::type_error("promise", value));
    };
    if let Some(memoized) = promise.memoized() {
        return Ok(memoized);
    }
    let fresh = Frame::new_child_of(&promise.defining_env);
    let result = eval(&promise.expr, &fresh)?;
    promise.set_forced(result.clone());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;
    use crate::value::{PrimitiveData, PrimitiveFn};
    use std::cell::Cell;

    thread_local! {
        static TICKS: Cell<i64> = const { Cell::new(0) };
    }

    fn tick(_args: &[Value]) -> Result<Value> {
        TICKS.with(|t| {
            let v = t.get() + 1;
            t.set(v);
            Ok(Value::int(v))
        })
    }

    #[test]
    fn forcing_twice_evaluates_the_body_once() {
        TICKS.with(|t| t.set(0));
        let env = Frame::new_global();
        Frame::define(
            &env,
            "tick!".into(),
            Value::Primitive(Rc::new(PrimitiveData {
                name: "tick!".to_string(),
                func: PrimitiveFn::Plain(tick),
            })),
        );
        let expr = parse_one("(delay (tick!))").unwrap();
        let promise = eval(&expr, &env).unwrap();

        let first = force(&promise).unwrap();
        let second = force(&promise).unwrap();
        assert_eq!(first, Value::int(1));
        assert_eq!(second, Value::int(1));
    }

    #[test]
    fn forcing_a_non_promise_is_a_type_error() {
        assert!(force(&Value::int(1)).is_err());
    }
}
