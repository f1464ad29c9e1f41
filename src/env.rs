// Name->value bindings with a parent link. A frame is owned by every
// procedure or promise that closes over it and by its transitive children.
// Frames are acyclic, a child's parent is fixed at construction, so Rc
// reference counting is enough.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, SchemeError};
use crate::special_forms::check_formals;
use crate::value::Value;

// Cloning an Env clones the Rc, not the bindings.
pub type Env = Rc<RefCell<Frame>>;

#[derive(Debug)]
pub struct Frame {
    bindings: HashMap<Rc<str>, Value>,
    parent: Option<Env>,
}

impl Frame {
    pub fn new_global() -> Env {
        Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: None,
        }))
    }

    pub fn new_child_of(parent: &Env) -> Env {
        Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    // Searches outward through parent frames.
    pub fn lookup(env: &Env, name: &str) -> Result<Value> {
        let frame = env.borrow();
        if let Some(value) = frame.bindings.get(name) {
            return Ok(value.clone());
        }
        match &frame.parent {
            Some(parent) => {
                let parent = Rc::clone(parent);
                drop(frame);
                Frame::lookup(&parent, name)
            }
            None => Err(SchemeError::UnknownIdentifier(name.to_string())),
        }
    }

    // Shadows any binding of the same name in an ancestor frame.
    pub fn define(env: &Env, name: Rc<str>, value: Value) {
        env.borrow_mut().bindings.insert(name, value);
    }

    // Binds formals to vals positionally. Errors if the lists have
    // different lengths or formals is not a proper list of distinct symbols.
    pub fn make_child(parent: &Env, formals: &Value, vals: &[Value]) -> Result<Env> {
        check_formals(formals)?;
        let names = formals.to_vec()?;
        if names.len() != vals.len() {
            return Err(SchemeError::Arity {
                expected: names.len().to_string(),
                got: vals.len(),
            });
        }
        let child = Frame::new_child_of(parent);
        for (name, val) in names.iter().zip(vals.iter()) {
            let name = name
                .as_symbol_name()
                .expect("check_formals guarantees symbols")
                .into();
            Frame::define(&child, name, val.clone());
        }
        Ok(child)
    }
}
