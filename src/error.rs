//! Error taxonomy for the MTL engine (see `spec.md` §7).
//!
//! The parser is all-or-nothing per template string and reports a
//! [`SyntaxError`]. Evaluation aborts the current statement (and therefore
//! the render for that file) with an [`EvalError`]; empty resolution is
//! *not* an error, it is the trigger for default substitution.

use std::fmt;

/// A malformed template, reported before any evaluation happens.
#[derive(Debug, PartialEq, Eq, Clone, Fail)]
#[fail(display = "syntax error at offset {}: {}", offset, reason)]
pub struct SyntaxError {
    pub offset: usize,
    pub reason: String,
}

impl SyntaxError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        SyntaxError {
            offset,
            reason: reason.into(),
        }
    }
}

/// Failure raised while walking the AST against a context.
#[derive(Debug, Fail)]
pub enum EvalError {
    /// No provider registered for `namespace` claimed `subfield`.
    #[fail(display = "unknown field {}:{}", namespace, subfield)]
    UnknownField {
        namespace: String,
        subfield: String,
    },

    /// A `|filter` segment named a filter the engine does not implement.
    #[fail(display = "unknown filter {}", _0)]
    UnknownFilter(String),

    /// A filter argument could not be interpreted (e.g. `chop(x)`).
    #[fail(display = "bad argument to filter {}: {}", name, reason)]
    BadFilterArg { name: String, reason: String },

    /// `{format:TYPE:...}` could not coerce its value to `kind`.
    #[fail(display = "cannot coerce {:?} to {}", value, kind)]
    Coercion { kind: String, value: String },

    /// `%name` referenced before any `{var:name,...}` bound it in this render.
    #[fail(display = "unbound variable {}", _0)]
    UnboundVariable(String),

    /// A provider claimed a namespace but failed while resolving it.
    #[fail(display = "provider error in namespace {}: {}", namespace, inner)]
    ProviderError {
        namespace: String,
        inner: String,
    },
}

impl EvalError {
    pub fn unknown_field(namespace: impl Into<String>, subfield: impl Into<String>) -> Self {
        EvalError::UnknownField {
            namespace: namespace.into(),
            subfield: subfield.into(),
        }
    }

    pub fn provider(namespace: impl Into<String>, inner: impl fmt::Display) -> Self {
        EvalError::ProviderError {
            namespace: namespace.into(),
            inner: inner.to_string(),
        }
    }
}

/// Either side of the pipeline can fail; this is what `render_string`
/// returns (see `spec.md` §6).
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Syntax(#[cause] SyntaxError),
    #[fail(display = "{}", _0)]
    Eval(#[cause] EvalError),
}

impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Error::Syntax(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}
