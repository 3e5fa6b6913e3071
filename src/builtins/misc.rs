//! `strip` and `format` no-namespace fields (`spec.md` §4.4). Both consume
//! `default_template` as their payload via the evaluator's `eval_cb` rather
//! than reading it as a phase-9 default.
//!
//! `var` is *not* here: binding a variable mutates
//! [`crate::context::EvalContext`], which this trait has no access to
//! (only an opaque `file: &dyn Any`), so `src/eval.rs` special-cases it
//! directly, the same way it special-cases `today`/`now`.

use std::any::Any;

use crate::ast::Template;
use crate::error::EvalError;
use crate::provider::{EvalCallback, Provider, ResolvedField};

/// `{strip,TEMPLATE}`: renders `TEMPLATE` and trims each resulting value.
pub struct MiscProvider;

impl Provider for MiscProvider {
    fn namespaces(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn resolve(
        &self,
        _namespace: &str,
        subfield: &str,
        _attributes: &[String],
        default_template: Option<&Template>,
        _file: &dyn Any,
        eval: &mut EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError> {
        if subfield != "strip" {
            return Ok(None);
        }
        let values = match default_template {
            Some(t) => eval(t)?,
            None => Vec::new(),
        };
        Ok(Some(ResolvedField::consumed(
            values.into_iter().map(|s| s.trim().to_string()).collect(),
        )))
    }
}

/// `{format:TYPE:FORMAT,TEMPLATE}`. `subfield` arrives as `"TYPE:FORMAT"`
/// because the subfield scanner deliberately leaves embedded colons alone
/// (`src/parser.rs`'s `SUBFIELD_STOP`), so the split happens here.
pub struct FormatProvider;

impl Provider for FormatProvider {
    fn namespaces(&self) -> Vec<String> {
        vec!["format".to_string()]
    }

    fn resolve(
        &self,
        namespace: &str,
        subfield: &str,
        _attributes: &[String],
        default_template: Option<&Template>,
        _file: &dyn Any,
        eval: &mut EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError> {
        let mut parts = subfield.splitn(2, ':');
        let ty = parts.next().unwrap_or("");
        let format_spec = parts.next().ok_or_else(|| EvalError::BadFilterArg {
            name: "format".to_string(),
            reason: format!("missing FORMAT in {:?}", subfield),
        })?;

        let template = default_template.ok_or_else(|| EvalError::BadFilterArg {
            name: "format".to_string(),
            reason: "missing TEMPLATE argument".to_string(),
        })?;
        let raw = eval(template)?.join("");

        let rendered = format_value(namespace, ty, &raw, format_spec)?;
        Ok(Some(ResolvedField::consumed(vec![rendered])))
    }
}

fn format_value(namespace: &str, ty: &str, raw: &str, format_spec: &str) -> Result<String, EvalError> {
    let spec = FormatSpec::parse(format_spec).map_err(|reason| EvalError::BadFilterArg {
        name: "format".to_string(),
        reason,
    })?;

    match ty {
        "int" => {
            let n: i64 = raw.trim().parse().map_err(|_| EvalError::Coercion {
                kind: "int".to_string(),
                value: raw.to_string(),
            })?;
            Ok(spec.render_int(n))
        }
        "float" => {
            let n: f64 = raw.trim().parse().map_err(|_| EvalError::Coercion {
                kind: "float".to_string(),
                value: raw.to_string(),
            })?;
            Ok(spec.render_float(n))
        }
        "str" => Ok(spec.render_str(raw)),
        other => Err(EvalError::Coercion {
            kind: format!("{}:{}", namespace, other),
            value: raw.to_string(),
        }),
    }
}

/// A printf-style spec of the shape `[flags][width][.precision]type`,
/// `flags` ∈ `{-, +, 0}`, `type` ∈ `{d, f, s, x, X, o, b}`.
#[derive(Debug, Clone, Copy)]
struct FormatSpec {
    left_align: bool,
    force_sign: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    kind: char,
}

impl FormatSpec {
    fn parse(text: &str) -> Result<FormatSpec, String> {
        let text = text.strip_prefix('%').unwrap_or(text);
        let mut chars = text.chars().peekable();

        let mut left_align = false;
        let mut force_sign = false;
        let mut zero_pad = false;
        while let Some(&c) = chars.peek() {
            match c {
                '-' => {
                    left_align = true;
                    chars.next();
                }
                '+' => {
                    force_sign = true;
                    chars.next();
                }
                '0' => {
                    zero_pad = true;
                    chars.next();
                }
                _ => break,
            }
        }

        let mut width_str = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                width_str.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let width = if width_str.is_empty() {
            0
        } else {
            width_str.parse().map_err(|_| format!("invalid width {:?}", width_str))?
        };

        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut prec_str = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    prec_str.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            precision = Some(
                prec_str
                    .parse()
                    .map_err(|_| format!("invalid precision {:?}", prec_str))?,
            );
        }

        let kind = chars.next().unwrap_or('s');
        if chars.next().is_some() {
            return Err(format!("trailing characters in format spec {:?}", text));
        }

        Ok(FormatSpec {
            left_align,
            force_sign,
            zero_pad,
            width,
            precision,
            kind,
        })
    }

    fn render_int(&self, n: i64) -> String {
        let body = match self.kind {
            'x' => format!("{:x}", n),
            'X' => format!("{:X}", n),
            'o' => format!("{:o}", n),
            'b' => format!("{:b}", n),
            _ => n.abs().to_string(),
        };
        let sign = if n < 0 {
            "-"
        } else if self.force_sign {
            "+"
        } else {
            ""
        };
        self.pad(&format!("{}{}", sign, body), !sign.is_empty())
    }

    fn render_float(&self, n: f64) -> String {
        let precision = self.precision.unwrap_or(6);
        let body = format!("{:.*}", precision, n.abs());
        let sign = if n.is_sign_negative() {
            "-"
        } else if self.force_sign {
            "+"
        } else {
            ""
        };
        self.pad(&format!("{}{}", sign, body), !sign.is_empty())
    }

    fn render_str(&self, s: &str) -> String {
        let truncated = match self.precision {
            Some(max) => s.chars().take(max).collect::<String>(),
            None => s.to_string(),
        };
        self.pad(&truncated, false)
    }

    fn pad(&self, body: &str, has_sign: bool) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body.to_string();
        }
        let fill_count = self.width - len;
        if self.left_align {
            format!("{}{}", body, " ".repeat(fill_count))
        } else if self.zero_pad && self.kind != 's' {
            if has_sign {
                let (sign, rest) = body.split_at(1);
                format!("{}{}{}", sign, "0".repeat(fill_count), rest)
            } else {
                format!("{}{}", "0".repeat(fill_count), body)
            }
        } else {
            format!("{}{}", " ".repeat(fill_count), body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_rendered_template() {
        let p = MiscProvider;
        let template: Template = vec![];
        let mut eval = |_: &Template| Ok(vec!["  hi  ".to_string()]);
        let result = p
            .resolve("", "strip", &[], Some(&template), &(), &mut eval)
            .unwrap()
            .unwrap();
        assert_eq!(result.values, vec!["hi".to_string()]);
        assert!(result.default_consumed);
    }

    #[test]
    fn declines_non_strip_subfields() {
        let p = MiscProvider;
        let mut eval = |_: &Template| Ok(vec![]);
        assert!(p.resolve("", "other", &[], None, &(), &mut eval).unwrap().is_none());
    }

    #[test]
    fn formats_int_zero_padded() {
        let spec = FormatSpec::parse("%05d").unwrap();
        assert_eq!(spec.render_int(42), "00042");
        assert_eq!(spec.render_int(-7), "-0007");
    }

    #[test]
    fn formats_float_precision() {
        let spec = FormatSpec::parse("%.2f").unwrap();
        assert_eq!(spec.render_float(3.14159), "3.14");
    }

    #[test]
    fn formats_left_aligned_str() {
        let spec = FormatSpec::parse("%-5s").unwrap();
        assert_eq!(spec.render_str("ab"), "ab   ");
    }

    #[test]
    fn format_provider_end_to_end() {
        let p = FormatProvider;
        let template: Template = vec![];
        let mut eval = |_: &Template| Ok(vec!["7".to_string()]);
        let result = p
            .resolve("format", "int:%3d", &[], Some(&template), &(), &mut eval)
            .unwrap()
            .unwrap();
        assert_eq!(result.values, vec!["  7".to_string()]);
    }

    #[test]
    fn coercion_failure_errors() {
        let p = FormatProvider;
        let template: Template = vec![];
        let mut eval = |_: &Template| Ok(vec!["not-a-number".to_string()]);
        assert!(p
            .resolve("format", "int:%d", &[], Some(&template), &(), &mut eval)
            .is_err());
    }
}
