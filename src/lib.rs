pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod parser;
pub mod promise;
pub mod special_forms;
pub mod value;

pub use env::{Env, Frame};
pub use error::{ErrorKind, Result, SchemeError};
pub use eval::{apply, eval};
pub use value::Value;

// Builds a global frame with every primitive bound, ready for a REPL or
// file-load session.
pub fn new_global_environment() -> Env {
    let env = Frame::new_global();
    builtins::populate(&env);
    env
}
