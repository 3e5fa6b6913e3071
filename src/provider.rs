//! Provider dispatch contract (`spec.md` §4.4, §6).
//!
//! A provider claims zero or more namespaces. The registry tries every
//! provider registered for a namespace, in registration order, until one
//! returns `Some` (override semantics); `None` from all of them (or no
//! providers at all for that namespace) is an [`EvalError::UnknownField`].

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Template;
use crate::error::EvalError;

/// Lets a provider evaluate a sub-template (a filter argument, a default,
/// a format string) without depending on the evaluator directly.
pub type EvalCallback<'a> = dyn FnMut(&Template) -> Result<Vec<String>, EvalError> + 'a;

/// What a provider hands back from a successful resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedField {
    pub values: Vec<String>,
    /// Set when the provider used `default_template` as its own payload
    /// (e.g. `strftime`'s format string, `var`'s bound value). The
    /// evaluator must not also apply it as a phase-9 default in that case
    /// (`spec.md` §4.2 phase 1).
    pub default_consumed: bool,
}

impl ResolvedField {
    pub fn values(values: Vec<String>) -> Self {
        ResolvedField {
            values,
            default_consumed: false,
        }
    }

    pub fn consumed(values: Vec<String>) -> Self {
        ResolvedField {
            values,
            default_consumed: true,
        }
    }
}

pub trait Provider {
    /// Namespaces this provider wants dispatched to it. A bare field with
    /// no `field:subfield` syntax dispatches under the empty string.
    fn namespaces(&self) -> Vec<String>;

    /// Attempts to resolve one field. Returning `Ok(None)` declines,
    /// letting the registry fall through to the next provider registered
    /// for `namespace` (or fail with `UnknownField` if none is left).
    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &self,
        namespace: &str,
        subfield: &str,
        attributes: &[String],
        default_template: Option<&Template>,
        file: &dyn Any,
        eval: &mut EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError>;
}

#[derive(Default)]
pub struct Registry {
    providers: HashMap<String, Vec<Rc<dyn Provider>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// A registry pre-populated with every no-namespace built-in provider
    /// (`spec.md` §4.4): punctuation fields, file metadata, `format`,
    /// `strip`. Hosts layer `audio`/`pdf`/`docx`/plugin namespaces on top
    /// with [`Registry::register`].
    ///
    /// `today`, `now`, and `var` are not providers: they need mutable
    /// access to [`crate::context::EvalContext`] (sticky timestamp cache,
    /// variable bindings) that the `Provider` trait's `file: &dyn Any`
    /// handle cannot reach, so `src/eval.rs` resolves them directly before
    /// falling through to the registry.
    pub fn builtins() -> Self {
        let mut registry = Registry::new();
        registry.register(Rc::new(crate::builtins::punctuation::PunctuationProvider));
        registry.register(Rc::new(crate::builtins::file::FileMetaProvider));
        registry.register(Rc::new(crate::builtins::misc::MiscProvider));
        registry.register(Rc::new(crate::builtins::misc::FormatProvider));
        registry
    }

    pub fn register(&mut self, provider: Rc<dyn Provider>) {
        for namespace in provider.namespaces() {
            self.providers
                .entry(namespace)
                .or_insert_with(Vec::new)
                .push(provider.clone());
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        namespace: &str,
        subfield: &str,
        attributes: &[String],
        default_template: Option<&Template>,
        file: &dyn Any,
        eval: &mut EvalCallback,
    ) -> Result<ResolvedField, EvalError> {
        let providers = self
            .providers
            .get(namespace)
            .ok_or_else(|| EvalError::unknown_field(namespace, subfield))?;

        for provider in providers {
            if let Some(resolved) =
                provider.resolve(namespace, subfield, attributes, default_template, file, eval)?
            {
                return Ok(resolved);
            }
            log::debug!(
                "provider declined {}:{}, falling through to next registered provider",
                namespace,
                subfield
            );
        }
        Err(EvalError::unknown_field(namespace, subfield))
    }
}
