//! The named filter set (`spec.md` §4.3). Every filter is `[String] ->
//! [String]`; there is no separate scalar path (`spec.md` §9,
//! "list-as-universal-value").

use itertools::Itertools;

use crate::error::EvalError;

/// Applies `name` (with optional string `arg`, already reduced from its
/// template form by the evaluator) to `input`.
pub fn apply(name: &str, arg: Option<&str>, input: Vec<String>) -> Result<Vec<String>, EvalError> {
    match name {
        "lower" => Ok(input.into_iter().map(|s| s.to_lowercase()).collect()),
        "upper" => Ok(input.into_iter().map(|s| s.to_uppercase()).collect()),
        "strip" => Ok(input.into_iter().map(|s| s.trim().to_string()).collect()),
        "titlecase" => Ok(input.into_iter().map(|s| titlecase(&s)).collect()),
        "capitalize" => Ok(input.into_iter().map(|s| capitalize(&s)).collect()),

        "braces" => Ok(input.into_iter().map(|s| format!("{{{}}}", s)).collect()),
        "parens" => Ok(input.into_iter().map(|s| format!("({})", s)).collect()),
        "brackets" => Ok(input.into_iter().map(|s| format!("[{}]", s)).collect()),

        "split" => {
            let delim = require_arg(name, arg)?;
            if delim.is_empty() {
                return Err(EvalError::BadFilterArg {
                    name: name.to_string(),
                    reason: "split delimiter must not be empty".to_string(),
                });
            }
            Ok(input
                .into_iter()
                .flat_map(|s| s.split(delim).map(|part| part.to_string()).collect::<Vec<_>>())
                .collect())
        }
        "autosplit" => Ok(input
            .into_iter()
            .flat_map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .map(|part| part.to_string())
                    .collect::<Vec<_>>()
            })
            .collect()),

        "chop" => {
            let n = require_usize_arg(name, arg)?;
            Ok(input.into_iter().map(|s| drop_last_chars(&s, n)).collect())
        }
        "chomp" => {
            let n = require_usize_arg(name, arg)?;
            Ok(input.into_iter().map(|s| drop_first_chars(&s, n)).collect())
        }

        "sort" => {
            let mut v = input;
            v.sort();
            Ok(v)
        }
        "rsort" => {
            let mut v = input;
            v.sort_by(|a, b| b.cmp(a));
            Ok(v)
        }
        "reverse" => {
            let mut v = input;
            v.reverse();
            Ok(v)
        }
        "uniq" => Ok(input.into_iter().unique().collect()),

        "join" => {
            let delim = require_arg(name, arg)?;
            Ok(vec![input.join(delim)])
        }
        "append" => {
            let mut v = input;
            v.push(require_arg(name, arg)?.to_string());
            Ok(v)
        }
        "prepend" => {
            let mut v = vec![require_arg(name, arg)?.to_string()];
            v.extend(input);
            Ok(v)
        }
        "appends" => {
            let suffix = require_arg(name, arg)?;
            Ok(input.into_iter().map(|s| format!("{}{}", s, suffix)).collect())
        }
        "prepends" => {
            let prefix = require_arg(name, arg)?;
            Ok(input.into_iter().map(|s| format!("{}{}", prefix, s)).collect())
        }
        "remove" => {
            let target = require_arg(name, arg)?;
            Ok(input.into_iter().filter(|s| s != target).collect())
        }

        "slice" => {
            let range = parse_range(name, require_arg(name, arg)?)?;
            Ok(python_slice(&input, range))
        }
        "sslice" => {
            let range = parse_range(name, require_arg(name, arg)?)?;
            Ok(input
                .into_iter()
                .map(|s| {
                    let chars: Vec<char> = s.chars().collect();
                    python_slice(&chars, range).into_iter().collect()
                })
                .collect())
        }

        _ => Err(EvalError::UnknownFilter(name.to_string())),
    }
}

fn require_arg<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str, EvalError> {
    arg.ok_or_else(|| EvalError::BadFilterArg {
        name: name.to_string(),
        reason: "missing required argument".to_string(),
    })
}

fn require_usize_arg(name: &str, arg: Option<&str>) -> Result<usize, EvalError> {
    let text = require_arg(name, arg)?;
    text.parse::<usize>().map_err(|_| EvalError::BadFilterArg {
        name: name.to_string(),
        reason: format!("expected a non-negative integer, got {:?}", text),
    })
}

fn drop_last_chars(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().take(len.saturating_sub(n)).collect()
}

fn drop_first_chars(s: &str, n: usize) -> String {
    s.chars().skip(n).collect()
}

fn titlecase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for c in s.chars() {
        if c.is_whitespace() {
            start_of_word = true;
            out.push(c);
        } else if start_of_word {
            out.extend(c.to_uppercase());
            start_of_word = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// A resolved `start:stop:step` slice, indices already signed and optional
/// as in Python's slice semantics.
type Range = (Option<i64>, Option<i64>, Option<i64>);

fn parse_range(filter_name: &str, text: &str) -> Result<Range, EvalError> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(EvalError::BadFilterArg {
            name: filter_name.to_string(),
            reason: format!("invalid slice spec {:?}", text),
        });
    }
    let parse_one = |p: &str| -> Result<Option<i64>, EvalError> {
        if p.is_empty() {
            Ok(None)
        } else {
            p.parse::<i64>().map(Some).map_err(|_| EvalError::BadFilterArg {
                name: filter_name.to_string(),
                reason: format!("invalid slice index {:?}", p),
            })
        }
    };
    let start = parse_one(parts.first().copied().unwrap_or(""))?;
    let stop = parse_one(parts.get(1).copied().unwrap_or(""))?;
    let step = parse_one(parts.get(2).copied().unwrap_or(""))?;
    if step == Some(0) {
        return Err(EvalError::BadFilterArg {
            name: filter_name.to_string(),
            reason: "slice step must not be zero".to_string(),
        });
    }
    Ok((start, stop, step))
}

/// Python-style slicing: negative indices count from the end, a negative
/// step walks backwards, omitted bounds default per-direction.
fn python_slice<T: Clone>(items: &[T], (start, stop, step): Range) -> Vec<T> {
    let len = items.len() as i64;
    let step = step.unwrap_or(1);

    let normalize = |i: i64| -> i64 {
        if i < 0 {
            (len + i).max(0)
        } else {
            i.min(len)
        }
    };

    if step > 0 {
        let start = start.map(normalize).unwrap_or(0);
        let stop = stop.map(normalize).unwrap_or(len);
        let mut out = Vec::new();
        let mut i = start;
        while i < stop {
            if let Some(item) = items.get(i as usize) {
                out.push(item.clone());
            }
            i += step;
        }
        out
    } else {
        let start = start.map(normalize).unwrap_or(len - 1);
        let stop_default = -1;
        let stop = stop.map(normalize).unwrap_or(stop_default);
        let mut out = Vec::new();
        let mut i = start.min(len - 1);
        while i > stop {
            if i >= 0 {
                if let Some(item) = items.get(i as usize) {
                    out.push(item.clone());
                }
            }
            i += step;
        }
        out
    }
}
