//! Built-in no-namespace providers shipped with the engine (`spec.md` §4.4).
//! `Registry::builtins()` in `src/provider.rs` wires these together.

pub mod file;
pub mod misc;
pub mod punctuation;
