//! The nine-phase statement evaluator (`spec.md` §4.2) and the public
//! `parse`/`render`/`render_string` API (§6).

use std::any::Any;

use chrono::Local;
use regex::Regex;

use crate::ast::{ConditionalOp, Node, Statement, Template};
use crate::context::EvalContext;
use crate::error::{EvalError, Error};
use crate::provider::{Registry, ResolvedField};
use crate::{builtins, filters, parser};

/// Parses and renders `template_string` in one call (`spec.md` §6).
pub fn render_string(template_string: &str, file: &dyn Any, registry: &Registry) -> Result<Vec<String>, Error> {
    let template = parser::parse(template_string)?;
    Ok(render(&template, file, registry)?)
}

/// Renders an already-parsed template against `file` through `registry`.
/// Creates a fresh [`EvalContext`] for this render and discards it when
/// done (`spec.md` §3 lifecycle).
pub fn render(template: &Template, file: &dyn Any, registry: &Registry) -> Result<Vec<String>, EvalError> {
    let mut ctx = EvalContext::new(file);
    eval_template(template, &mut ctx, registry)
}

fn eval_template(template: &Template, ctx: &mut EvalContext, registry: &Registry) -> Result<Vec<String>, EvalError> {
    let mut out = Vec::new();
    for node in template {
        match node {
            Node::Literal(text) => out.push(substitute_variables(text, ctx)?),
            Node::Statement(stmt) => out.extend(eval_statement(stmt, ctx, registry)?),
        }
    }
    Ok(out)
}

/// Replaces `%name` with the joined rendered value bound by an earlier
/// `{var:name,...}`, and `%%` with a literal `%`. Applies everywhere a
/// template's literal text is rendered: top-level output, filter
/// arguments, conditional values, and combine/true/default templates
/// (`spec.md` §4.4's description of `%NAME`).
///
/// Not applied inside a `strftime` format string (see
/// `builtins::file::flatten_raw`): `%Y`/`%m`/`%d` there are format
/// directives, not variable reads.
fn substitute_variables(text: &str, ctx: &EvalContext) -> Result<String, EvalError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push('%');
            continue;
        }
        let value = ctx
            .variable(&name)
            .ok_or_else(|| EvalError::UnboundVariable(name.clone()))?;
        log::trace!("%{} read as {:?}", name, value);
        out.push_str(&value.join(""));
    }
    Ok(out)
}

fn namespace_and_subfield(stmt: &Statement) -> (&str, &str) {
    match &stmt.subfield {
        Some(sub) => (stmt.field.as_str(), sub.as_str()),
        None => ("", stmt.field.as_str()),
    }
}

fn eval_statement(stmt: &Statement, ctx: &mut EvalContext, registry: &Registry) -> Result<Vec<String>, EvalError> {
    let resolved = resolve_field(stmt, ctx, registry)?;
    let mut values = resolved.values;

    // Phase 2: filter pipeline.
    for call in &stmt.filters {
        let arg = match &call.arg {
            Some(tpl) => Some(eval_template(tpl, ctx, registry)?.join("")),
            None => None,
        };
        values = match filters::apply(&call.name, arg.as_deref(), values) {
            Ok(v) => v,
            Err(EvalError::BadFilterArg { name, reason }) => {
                log::warn!("filter {} argument error: {}", name, reason);
                return Err(EvalError::BadFilterArg { name, reason });
            }
            Err(e) => return Err(e),
        };
    }

    // Phase 3: find/replace, literal sides with %name substitution applied
    // at apply time.
    for (find, replace) in &stmt.replacements {
        let find = substitute_variables(find, ctx)?;
        let replace = substitute_variables(replace, ctx)?;
        values = values.into_iter().map(|s| s.replace(&find, &replace)).collect();
    }

    // Phase 4: conditional -> boolean, retained for phase 7.
    let conditional_result = match &stmt.conditional {
        Some(cond) => {
            let rendered = eval_template(&cond.value, ctx, registry)?.join("");
            let candidates: Vec<&str> = rendered.split('|').collect();
            let mut matched = false;
            for value in &values {
                for candidate in &candidates {
                    if compare(cond.op, value, candidate)? {
                        matched = true;
                    }
                }
            }
            Some(if cond.negated { !matched } else { matched })
        }
        None => None,
    };

    // Phase 5: in-place expansion.
    if stmt.in_place {
        let delim = stmt.delim.clone().unwrap_or_default();
        values = vec![values.join(&delim)];
    }

    // Phase 6: combine.
    if let Some(combine_tpl) = &stmt.combine {
        let mut combined = eval_template(combine_tpl, ctx, registry)?;
        values.append(&mut combined);
    }

    // Phase 7: boolean substitution (`?`). Folds phase 8 (field-level
    // truthiness default) when no explicit conditional was present.
    let mut phase7_fired = false;
    if let Some(true_tpl) = &stmt.true_template {
        let truthy = match conditional_result {
            Some(b) => b,
            None => !values.is_empty(),
        };
        values = if truthy {
            eval_template(true_tpl, ctx, registry)?
        } else {
            match &stmt.default_template {
                Some(default_tpl) => eval_template(default_tpl, ctx, registry)?,
                None => Vec::new(),
            }
        };
        phase7_fired = true;
    }

    // Phase 9: default substitution, skipped if phase 7 already fired or
    // the field provider already consumed the default as its own payload.
    if !phase7_fired && !resolved.default_consumed && values.is_empty() {
        values = match &stmt.default_template {
            Some(default_tpl) => eval_template(default_tpl, ctx, registry)?,
            None => vec!["_".to_string()],
        };
    }

    Ok(values)
}

/// Phase 1. `today`/`now`/`var` need mutable access to the context
/// (sticky timestamp cache, variable bindings) that a generic `Provider`
/// cannot reach, so they are resolved here directly; everything else
/// dispatches through the registry, consulting the per-render provider
/// cache first when there is no default-template payload to worry about.
fn resolve_field(stmt: &Statement, ctx: &mut EvalContext, registry: &Registry) -> Result<ResolvedField, EvalError> {
    let (namespace, subfield) = namespace_and_subfield(stmt);

    if namespace.is_empty() && subfield == "today" {
        let dt = ctx.today();
        log::trace!("field resolved {}:{} -> sticky today", namespace, subfield);
        return builtins::file::render_date(dt, &stmt.attributes, stmt.default_template.as_ref(), &mut |t| {
            eval_template(t, &mut *ctx, registry)
        });
    }
    if namespace.is_empty() && subfield == "now" {
        let dt = Local::now();
        log::trace!("field resolved {}:{} -> fresh now", namespace, subfield);
        return builtins::file::render_date(dt, &stmt.attributes, stmt.default_template.as_ref(), &mut |t| {
            eval_template(t, &mut *ctx, registry)
        });
    }
    if namespace == "var" {
        let name = subfield.to_string();
        let value = match &stmt.default_template {
            Some(tpl) => eval_template(tpl, ctx, registry)?,
            None => Vec::new(),
        };
        log::trace!("{{var:{},...}} bound {} value(s)", name, value.len());
        ctx.bind_variable(name, value);
        return Ok(ResolvedField::consumed(Vec::new()));
    }

    if stmt.default_template.is_none() {
        if let Some(cached) = ctx.cache_get(namespace, subfield, &stmt.attributes) {
            log::trace!("field resolved {}:{} -> cached ({} value(s))", namespace, subfield, cached.len());
            return Ok(ResolvedField::values(cached.clone()));
        }
    }

    let file = ctx.file;
    let resolved = {
        let mut eval_cb = |t: &Template| eval_template(t, &mut *ctx, registry);
        registry.resolve(namespace, subfield, &stmt.attributes, stmt.default_template.as_ref(), file, &mut eval_cb)?
    };
    log::trace!(
        "field resolved {}:{} -> {} value(s)",
        namespace,
        subfield,
        resolved.values.len()
    );
    if stmt.default_template.is_none() {
        ctx.cache_put(namespace, subfield, &stmt.attributes, resolved.values.clone());
    }
    Ok(resolved)
}

/// `==`/`!=` always compare as strings; the ordering operators try a
/// numeric fast path first, falling back to string ordering if either
/// side fails to parse as `f64` (`spec.md` §9 open question 2).
fn compare(op: ConditionalOp, value: &str, candidate: &str) -> Result<bool, EvalError> {
    Ok(match op {
        ConditionalOp::Contains => value.contains(candidate),
        ConditionalOp::Matches => {
            // Whole-value match, unlike `contains`'s substring search
            // (`spec.md` §8 scenario 8: `"BeachDay" matches "Beach"` is
            // false, `"Beach"` is true).
            let anchored = format!("^(?:{})$", candidate);
            let re = Regex::new(&anchored).map_err(|e| EvalError::BadFilterArg {
                name: "matches".to_string(),
                reason: e.to_string(),
            })?;
            re.is_match(value)
        }
        ConditionalOp::StartsWith => value.starts_with(candidate),
        ConditionalOp::EndsWith => value.ends_with(candidate),
        ConditionalOp::Eq => value == candidate,
        ConditionalOp::Ne => value != candidate,
        ConditionalOp::Lt => numeric_or_string(value, candidate, |a, b| a < b, |a, b| a < b),
        ConditionalOp::Le => numeric_or_string(value, candidate, |a, b| a <= b, |a, b| a <= b),
        ConditionalOp::Gt => numeric_or_string(value, candidate, |a, b| a > b, |a, b| a > b),
        ConditionalOp::Ge => numeric_or_string(value, candidate, |a, b| a >= b, |a, b| a >= b),
    })
}

fn numeric_or_string(
    a: &str,
    b: &str,
    numeric: impl Fn(f64, f64) -> bool,
    stringwise: impl Fn(&str, &str) -> bool,
) -> bool {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => numeric(x, y),
        _ => stringwise(a, b),
    }
}
