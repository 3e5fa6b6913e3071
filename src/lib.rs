extern crate chrono;
extern crate regex;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate itertools;
extern crate log;
extern crate phf;
#[macro_use]
extern crate phf_macros;

pub mod ast;
pub mod builtins;
pub mod catalog;
pub mod context;
pub mod error;
pub mod eval;
pub mod filters;
mod lexer;
pub mod parser;
pub mod provider;

pub use ast::{Conditional, ConditionalOp, FilterCall, Node, Statement, Template};
pub use context::EvalContext;
pub use error::{EvalError, Error, SyntaxError};
pub use eval::{render, render_string};
pub use parser::parse;
pub use provider::{Provider, Registry, ResolvedField};
