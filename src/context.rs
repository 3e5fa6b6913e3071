//! Per-render evaluation context (`spec.md` §3).
//!
//! Created once per `(file, template_set)` invocation and discarded
//! afterwards; nothing here outlives a single [`crate::eval::render`] call.

use std::any::Any;
use std::collections::HashMap;

use chrono::{DateTime, Local};

/// Key used by the provider cache: a field resolves to the same value for
/// the whole render as long as it carries no default-template payload
/// (consuming fields like `var`/`format`/`strftime` are never cached, since
/// their result depends on the payload, not just the field identity).
type CacheKey = (String, String, Vec<String>);

pub struct EvalContext<'f> {
    pub file: &'f dyn Any,
    pub variables: HashMap<String, Vec<String>>,
    /// Timestamp captured on first use of `{today}` in this render; `{now}`
    /// never consults or updates this (`spec.md` §9).
    now_cached: Option<DateTime<Local>>,
    provider_cache: HashMap<CacheKey, Vec<String>>,
}

impl<'f> EvalContext<'f> {
    pub fn new(file: &'f dyn Any) -> Self {
        EvalContext {
            file,
            variables: HashMap::new(),
            now_cached: None,
            provider_cache: HashMap::new(),
        }
    }

    /// Returns the sticky `{today}` timestamp, capturing it on first call.
    pub fn today(&mut self) -> DateTime<Local> {
        *self.now_cached.get_or_insert_with(Local::now)
    }

    pub fn cache_get(&self, namespace: &str, subfield: &str, attributes: &[String]) -> Option<&Vec<String>> {
        self.provider_cache
            .get(&(namespace.to_string(), subfield.to_string(), attributes.to_vec()))
    }

    pub fn cache_put(&mut self, namespace: &str, subfield: &str, attributes: &[String], values: Vec<String>) {
        self.provider_cache
            .insert((namespace.to_string(), subfield.to_string(), attributes.to_vec()), values);
    }

    pub fn bind_variable(&mut self, name: impl Into<String>, value: Vec<String>) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<&Vec<String>> {
        self.variables.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_is_sticky_within_one_context() {
        let file: &dyn Any = &();
        let mut ctx = EvalContext::new(file);
        let first = ctx.today();
        let second = ctx.today();
        assert_eq!(first, second);
    }

    #[test]
    fn two_contexts_do_not_share_bindings() {
        let file: &dyn Any = &();
        let mut a = EvalContext::new(file);
        a.bind_variable("x", vec!["1".to_string()]);
        let b = EvalContext::new(file);
        assert!(b.variable("x").is_none());
    }
}
