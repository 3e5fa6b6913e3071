//! Punctuation fields (`spec.md` §6): fields that exist only to let a
//! template emit a character the grammar otherwise treats as reserved.
//!
//! Modeled on the teacher's `entities.rs`, which maps static names to their
//! literal replacements via `phf_map!` instead of a runtime `HashMap`.

use std::any::Any;

use crate::ast::Template;
use crate::error::EvalError;
use crate::provider::{EvalCallback, Provider, ResolvedField};

static PUNCTUATION: phf::Map<&'static str, &'static str> = phf_map! {
    "comma" => ",",
    "semicolon" => ";",
    "questionmark" => "?",
    "pipe" => "|",
    "percent" => "%",
    "ampersand" => "&",
    "openbrace" => "{",
    "closebrace" => "}",
    "openparens" => "(",
    "closeparens" => ")",
    "openbracket" => "[",
    "closebracket" => "]",
    "newline" => "\n",
    "lf" => "\n",
    "cr" => "\r",
    "crlf" => "\r\n",
};

pub struct PunctuationProvider;

impl Provider for PunctuationProvider {
    fn namespaces(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn resolve(
        &self,
        _namespace: &str,
        subfield: &str,
        _attributes: &[String],
        _default_template: Option<&Template>,
        _file: &dyn Any,
        _eval: &mut EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError> {
        Ok(PUNCTUATION
            .get(subfield)
            .map(|literal| ResolvedField::values(vec![(*literal).to_string()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_punctuation() {
        let p = PunctuationProvider;
        let mut eval = |_: &Template| Ok(vec![]);
        let result = p
            .resolve("", "comma", &[], None, &(), &mut eval)
            .unwrap()
            .unwrap();
        assert_eq!(result.values, vec![",".to_string()]);
    }

    #[test]
    fn declines_unknown_names() {
        let p = PunctuationProvider;
        let mut eval = |_: &Template| Ok(vec![]);
        assert!(p.resolve("", "audio", &[], None, &(), &mut eval).unwrap().is_none());
    }
}
