// Pairs, lambdas, mus and promises are Rc-shared handles onto immutable data.
// Only a Promise's forcing state and a Frame's bindings are ever mutated.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::env::Env;
use crate::error::{Result, SchemeError};

// Mixed arithmetic promotes to Float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

// first/second chain: proper lists terminate in EmptyList, but a pair can
// also be improper/dotted. No set-car!/set-cdr! in this core, so it's never
// mutated after construction.
#[derive(Debug)]
pub struct PairData {
    pub first: Value,
    pub second: Value,
}

// Lexically scoped procedure.
#[derive(Debug)]
pub struct LambdaData {
    pub formals: Value,
    pub body: Value,
    pub defining_env: Env,
}

// Dynamically scoped procedure, no captured env.
#[derive(Debug)]
pub struct MuData {
    pub formals: Value,
    pub body: Value,
}

// Some primitives only need their arguments, some need the calling env too.
// apply matches on this instead of always splicing the env into the args.
#[derive(Clone, Copy)]
pub enum PrimitiveFn {
    Plain(fn(&[Value]) -> Result<Value>),
    WithEnv(fn(&[Value], &Env) -> Result<Value>),
}

pub struct PrimitiveData {
    pub name: String,
    pub func: PrimitiveFn,
}

impl fmt::Debug for PrimitiveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<primitive:{}>", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromiseState {
    Unforced,
    Forced,
}

// Memoized lazy value. state and val live behind a RefCell because forcing
// mutates them in place; everything else about a Value is immutable.
#[derive(Debug)]
pub struct PromiseData {
    pub expr: Value,
    pub defining_env: Env,
    state: RefCell<PromiseState>,
    val: RefCell<Option<Value>>,
}

impl PromiseData {
    pub fn new(expr: Value, defining_env: Env) -> Self {
        PromiseData {
            expr,
            defining_env,
            state: RefCell::new(PromiseState::Unforced),
            val: RefCell::new(None),
        }
    }

    pub fn is_forced(&self) -> bool {
        *self.state.borrow() == PromiseState::Forced
    }

    pub fn memoized(&self) -> Option<Value> {
        self.val.borrow().clone()
    }

    // Idempotent: a second call just overwrites with the same value, so
    // force can call this unconditionally.
    pub fn set_forced(&self, value: Value) {
        *self.val.borrow_mut() = Some(value);
        *self.state.borrow_mut() = PromiseState::Forced;
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Pair(Rc<PairData>),
    EmptyList,
    Symbol(Rc<str>),
    Number(Number),
    Str(Rc<str>),
    Boolean(bool),
    // Unit value non-value-producing forms return. The REPL suppresses it
    // from printing.
    Okay,
    Primitive(Rc<PrimitiveData>),
    Lambda(Rc<LambdaData>),
    Mu(Rc<MuData>),
    Promise(Rc<PromiseData>),
}

impl Value {
    pub fn symbol(name: impl Into<Rc<str>>) -> Value {
        Value::Symbol(name.into())
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn int(i: i64) -> Value {
        Value::Number(Number::Int(i))
    }

    pub fn float(f: f64) -> Value {
        Value::Number(Number::Float(f))
    }

    pub fn cons(first: Value, second: Value) -> Value {
        Value::Pair(Rc::new(PairData { first, second }))
    }

    // Builds a proper list right to left.
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut result = Value::EmptyList;
        for item in items.into_iter().rev() {
            result = Value::cons(item, result);
        }
        result
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Value::Boolean(false))
    }

    pub fn is_true(&self) -> bool {
        !self.is_false()
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Value::EmptyList)
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    // An atom is anything that is not a pair and not the empty list.
    pub fn is_atom(&self) -> bool {
        !self.is_pair() && !self.is_empty_list()
    }

    // EmptyList is deliberately excluded, it is not a valid expression.
    pub fn is_self_evaluating(&self) -> bool {
        matches!(
            self,
            Value::Number(_) | Value::Str(_) | Value::Boolean(_) | Value::Okay
        )
    }

    pub fn as_symbol_name(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<&Rc<PairData>> {
        match self {
            Value::Pair(p) => Some(p),
            _ => None,
        }
    }

    // A proper list is a chain of pairs terminated by EmptyList.
    pub fn is_list(&self) -> bool {
        let mut cur = self;
        loop {
            match cur {
                Value::EmptyList => return true,
                Value::Pair(p) => cur = &p.second,
                _ => return false,
            }
        }
    }

    // Errors if self is not a proper list.
    pub fn list_len(&self) -> Result<usize> {
        let mut cur = self;
        let mut n = 0;
        loop {
            match cur {
                Value::EmptyList => return Ok(n),
                Value::Pair(p) => {
                    n += 1;
                    cur = &p.second;
                }
                _ => return Err(SchemeError::BadForm(format!("not a list: {self}"))),
            }
        }
    }

    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        let mut cur = self.clone();
        loop {
            match cur {
                Value::EmptyList => return Ok(out),
                Value::Pair(p) => {
                    out.push(p.first.clone());
                    cur = p.second.clone();
                }
                other => return Err(SchemeError::BadForm(format!("not a list: {other}"))),
            }
        }
    }

    // Used to evaluate argument lists.
    pub fn map_list<F>(&self, mut f: F) -> Result<Value>
    where
        F: FnMut(&Value) -> Result<Value>,
    {
        let mut items = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                Value::EmptyList => break,
                Value::Pair(p) => {
                    items.push(f(&p.first)?);
                    cur = &p.second;
                }
                other => return Err(SchemeError::BadForm(format!("not a list: {other}"))),
            }
        }
        Ok(Value::list(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Pair(_) => "pair",
            Value::EmptyList => "empty-list",
            Value::Symbol(_) => "symbol",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Okay => "okay",
            Value::Primitive(_) => "primitive",
            Value::Lambda(_) => "procedure",
            Value::Mu(_) => "procedure",
            Value::Promise(_) => "promise",
        }
    }

    pub fn type_error(expected: &str, found: &Value) -> SchemeError {
        SchemeError::Type {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }
}

impl PartialEq for Value {
    // equal?. Procedures and promises compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::EmptyList, Value::EmptyList) => true,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Okay, Value::Okay) => true,
            (Value::Pair(a), Value::Pair(b)) => {
                Rc::ptr_eq(a, b) || (a.first == b.first && a.second == b.second)
            }
            (Value::Primitive(a), Value::Primitive(b)) => Rc::ptr_eq(a, b),
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Mu(a), Value::Mu(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::EmptyList => write!(f, "()"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Okay => Ok(()),
            Value::Pair(pair) => write_pair(f, pair),
            Value::Primitive(p) => write!(f, "#[primitive {}]", p.name),
            Value::Lambda(l) => write!(f, "#[compound-procedure {}]", l.formals),
            Value::Mu(m) => write!(f, "#[mu-procedure {}]", m.formals),
            Value::Promise(p) => {
                if p.is_forced() {
                    write!(f, "#[promise (forced)]")
                } else {
                    write!(f, "#[promise (not forced)]")
                }
            }
        }
    }
}

fn write_pair(f: &mut fmt::Formatter<'_>, pair: &Rc<PairData>) -> fmt::Result {
    write!(f, "(")?;
    write!(f, "{}", pair.first)?;
    let mut cur = &pair.second;
    loop {
        match cur {
            Value::EmptyList => break,
            Value::Pair(next) => {
                write!(f, " {}", next.first)?;
                cur = &next.second;
            }
            other => {
                write!(f, " . {other}")?;
                break;
            }
        }
    }
    write!(f, ")")
}
