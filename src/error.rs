// Error kinds for the evaluator core, plus the four driver-visible buckets
// the REPL boundary classifies them into.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SchemeError {
    // Reader-level lexical/syntactic failure: unmatched paren, bad escape,
    // unterminated string.
    #[error("Parser Error: {0}")]
    Parser(String),

    // expr was not a proper list where the evaluator required one, or the
    // empty list appeared where an expression was required.
    #[error("malformed list: {0}")]
    Malformed(String),

    // A special form's operand list was the wrong length or shape.
    #[error("badly formed expression: {0}")]
    BadForm(String),

    // env.lookup walked off the top of the frame chain.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    // define's target was not a symbol, nor (symbol . formals).
    #[error("Non-symbol: {0}")]
    NonSymbolTarget(String),

    // apply was asked to call something that isn't a procedure.
    #[error("cannot call: {0}")]
    NotCallable(String),

    // A formal-parameter list contained a duplicate name.
    #[error("duplicate formal parameter: {0}")]
    DuplicateFormal(String),

    // A formal-parameter list contained a non-symbol.
    #[error("non-symbol formal parameter: {0}")]
    NonSymbolFormal(String),

    // cond's else clause was not the last clause.
    #[error("else must be last")]
    ElseNotLast,

    // make_child: formals and argument values had different lengths, or one
    // of the two was not a proper list.
    #[error("arity mismatch: expected {expected}, got {got}")]
    Arity { expected: String, got: usize },

    // A primitive rejected its own arguments: wrong type, wrong count for a
    // variadic primitive, domain error like division by zero. Kept distinct
    // from Arity, the evaluator's own bookkeeping, so a primitive signaling
    // a bad argument never gets confused with the evaluator calling it wrong.
    #[error("{0}")]
    PrimitiveError(String),

    #[error("Type Error: expected {expected}, found {found}")]
    Type { expected: String, found: String },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("maximum recursion depth exceeded")]
    DeepRecursion,
}

pub type Result<T> = std::result::Result<T, SchemeError>;

// The four categories the REPL catches per top-level expression and reports
// as "Error: <message>".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemeError,
    SyntaxError,
    ValueError,
    DeepRecursion,
}

impl SchemeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemeError::Parser(_) => ErrorKind::SyntaxError,
            SchemeError::Malformed(_) | SchemeError::BadForm(_) | SchemeError::ElseNotLast => {
                ErrorKind::SyntaxError
            }
            SchemeError::Type { .. }
            | SchemeError::NonSymbolTarget(_)
            | SchemeError::DuplicateFormal(_)
            | SchemeError::NonSymbolFormal(_) => ErrorKind::ValueError,
            SchemeError::DeepRecursion => ErrorKind::DeepRecursion,
            SchemeError::UnknownIdentifier(_)
            | SchemeError::NotCallable(_)
            | SchemeError::Arity { .. }
            | SchemeError::PrimitiveError(_)
            | SchemeError::FileNotFound(_) => ErrorKind::SchemeError,
        }
    }
}
