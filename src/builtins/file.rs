//! General file metadata (`spec.md` §4.4, §6): `size, uid, gid, user,
//! group, filepath, created, modified, accessed` plus the chainable
//! filepath (`name, stem, suffix, parent`) and date (`date, year, yy,
//! month, mon, mm, dd, dow, doy, hour, min, sec, strftime`) attribute
//! sets.
//!
//! The engine does not perform I/O (`spec.md` §1 Non-goals): it never
//! stats a file itself. The host gathers that information up front into a
//! [`FileMeta`] and passes it as the opaque `file` handle; this provider
//! only formats what it is given.

use std::any::Any;
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::ast::{Node, Template};
use crate::error::EvalError;
use crate::provider::{EvalCallback, Provider, ResolvedField};

/// What a host supplies as the opaque `file` handle for the built-in
/// file-metadata fields to work. Any other concrete type downcast-fails
/// and the provider politely declines, leaving the field `UnknownField`
/// unless another provider in the chain claims it.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub path: PathBuf,
    pub size: u64,
    pub uid: u32,
    pub gid: u32,
    pub user: String,
    pub group: String,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
}

pub struct FileMetaProvider;

impl Provider for FileMetaProvider {
    fn namespaces(&self) -> Vec<String> {
        vec![String::new()]
    }

    fn resolve(
        &self,
        _namespace: &str,
        subfield: &str,
        attributes: &[String],
        default_template: Option<&Template>,
        file: &dyn Any,
        eval: &mut EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError> {
        let meta = match file.downcast_ref::<FileMeta>() {
            Some(meta) => meta,
            None => return Ok(None),
        };

        let values = match subfield {
            "size" => vec![meta.size.to_string()],
            "uid" => vec![meta.uid.to_string()],
            "gid" => vec![meta.gid.to_string()],
            "user" => vec![meta.user.clone()],
            "group" => vec![meta.group.clone()],
            "filepath" => vec![resolve_filepath_attrs(&meta.path, attributes)],
            "created" => return Ok(Some(resolve_date_field(meta.created, attributes, default_template, eval)?)),
            "modified" => return Ok(Some(resolve_date_field(meta.modified, attributes, default_template, eval)?)),
            "accessed" => return Ok(Some(resolve_date_field(meta.accessed, attributes, default_template, eval)?)),
            _ => return Ok(None),
        };
        Ok(Some(ResolvedField::values(values)))
    }
}

fn resolve_date_field(
    value: Option<DateTime<Local>>,
    attributes: &[String],
    default_template: Option<&Template>,
    eval: &mut EvalCallback,
) -> Result<ResolvedField, EvalError> {
    let dt = match value {
        Some(dt) => dt,
        None => return Ok(ResolvedField::values(vec![])),
    };
    render_date(dt, attributes, default_template, eval)
}

/// Shared by the file-metadata dates and the evaluator's `{today}`/`{now}`
/// special case (`spec.md` §9).
pub fn render_date(
    dt: DateTime<Local>,
    attributes: &[String],
    default_template: Option<&Template>,
    eval: &mut EvalCallback,
) -> Result<ResolvedField, EvalError> {
    if attributes.first().map(String::as_str) == Some("strftime") {
        let format = match default_template {
            // Taken as raw strftime syntax, not run through `%name`
            // variable substitution: `%Y`/`%m`/`%d` are format directives,
            // not variable reads, and would otherwise collide with it.
            Some(t) => flatten_raw(t, eval)?,
            None => {
                return Err(EvalError::BadFilterArg {
                    name: "strftime".to_string(),
                    reason: "missing format string".to_string(),
                })
            }
        };
        return Ok(ResolvedField::consumed(vec![dt.format(&format).to_string()]));
    }
    let text = match attributes.first().map(String::as_str) {
        None => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(attr) => date_attribute(dt, attr)?,
    };
    Ok(ResolvedField::values(vec![text]))
}

/// Concatenates a template's literal text verbatim, evaluating any
/// embedded statement normally but never re-running `%name` substitution
/// over literal runs. Used only for the `strftime` format string.
fn flatten_raw(tpl: &Template, eval: &mut EvalCallback) -> Result<String, EvalError> {
    let mut out = String::new();
    for node in tpl {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Statement(_) => out.push_str(&eval(&vec![node.clone()])?.join("")),
        }
    }
    Ok(out)
}

fn date_attribute(dt: DateTime<Local>, attr: &str) -> Result<String, EvalError> {
    Ok(match attr {
        "date" => dt.format("%Y-%m-%d").to_string(),
        "year" => dt.year().to_string(),
        "yy" => format!("{:02}", dt.year() % 100),
        "month" => dt.month().to_string(),
        "mon" => dt.format("%b").to_string(),
        "mm" => format!("{:02}", dt.month()),
        "dd" => format!("{:02}", dt.day()),
        "dow" => dt.format("%a").to_string(),
        "doy" => dt.ordinal().to_string(),
        "hour" => format!("{:02}", dt.hour()),
        "min" => format!("{:02}", dt.minute()),
        "sec" => format!("{:02}", dt.second()),
        other => {
            return Err(EvalError::BadFilterArg {
                name: "date attribute".to_string(),
                reason: format!("unknown date attribute {:?}", other),
            })
        }
    })
}

/// Folds the chainable filepath attribute set: `name, stem, suffix` are
/// terminal (produce a string), `parent` produces another path you can
/// keep chaining off of (`.parent.parent.name`).
fn resolve_filepath_attrs(path: &std::path::Path, attributes: &[String]) -> String {
    let mut current = path.to_path_buf();
    for (i, attr) in attributes.iter().enumerate() {
        let last = i + 1 == attributes.len();
        let component = match attr.as_str() {
            "parent" => {
                current = current
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| current.clone());
                continue;
            }
            "name" => current.file_name().map(|s| s.to_string_lossy().into_owned()),
            "stem" => current.file_stem().map(|s| s.to_string_lossy().into_owned()),
            "suffix" => current.extension().map(|s| s.to_string_lossy().into_owned()),
            _ => None,
        };
        let component = component.unwrap_or_default();
        if last {
            return component;
        }
        current = PathBuf::from(component);
    }
    current.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn meta() -> FileMeta {
        FileMeta {
            path: PathBuf::from("/music/albums/song.mp3"),
            size: 1024,
            uid: 501,
            gid: 20,
            user: "alice".to_string(),
            group: "staff".to_string(),
            created: None,
            modified: None,
            accessed: None,
        }
    }

    #[test]
    fn resolves_size() {
        let p = FileMetaProvider;
        let mut eval = |_: &Template| Ok(vec![]);
        let m = meta();
        let result = p.resolve("", "size", &[], None, &m, &mut eval).unwrap().unwrap();
        assert_eq!(result.values, vec!["1024".to_string()]);
    }

    #[test]
    fn strftime_format_string_is_not_variable_substituted() {
        use chrono::TimeZone;
        let dt = Local.ymd(2020, 2, 4).and_hms(19, 7, 38);
        let format: Template = vec![Node::Literal("%Y-%m-%d-%H%M%S".to_string())];
        let mut eval = |_: &Template| Ok(vec![]);
        let result = render_date(dt, &["strftime".to_string()], Some(&format), &mut eval).unwrap();
        assert_eq!(result.values, vec!["2020-02-04-190738".to_string()]);
    }

    #[test]
    fn declines_unrecognized_file_handle() {
        let p = FileMetaProvider;
        let mut eval = |_: &Template| Ok(vec![]);
        assert!(p.resolve("", "size", &[], None, &(), &mut eval).unwrap().is_none());
    }

    #[test]
    fn filepath_attribute_chain() {
        assert_eq!(
            resolve_filepath_attrs(
                std::path::Path::new("/music/albums/song.mp3"),
                &["stem".to_string()]
            ),
            "song"
        );
        assert_eq!(
            resolve_filepath_attrs(
                std::path::Path::new("/music/albums/song.mp3"),
                &["parent".to_string(), "name".to_string()]
            ),
            "albums"
        );
    }
}
