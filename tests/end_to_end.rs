//! End-to-end scenarios from `spec.md` §8, driven through the public
//! `render_string` API against a small in-memory provider standing in for
//! the out-of-scope real `audio`/`exiftool`/`pdf`/`docx` readers.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use mtl::{render_string, EvalError, Provider, Registry, ResolvedField, Template};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Returns whatever was seeded for `(namespace, subfield)`, declining
/// (`Ok(None)`) for anything else so the registry's real built-ins (or an
/// `UnknownField`) still get a chance.
struct MockProvider {
    namespaces: Vec<String>,
    fields: HashMap<(String, String), Vec<String>>,
}

impl MockProvider {
    fn new(namespaces: &[&str], fields: &[(&str, &str, &[&str])]) -> Self {
        let mut map = HashMap::new();
        for (ns, subfield, values) in fields {
            map.insert(
                (ns.to_string(), subfield.to_string()),
                values.iter().map(|v| v.to_string()).collect(),
            );
        }
        MockProvider {
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
            fields: map,
        }
    }
}

impl Provider for MockProvider {
    fn namespaces(&self) -> Vec<String> {
        self.namespaces.clone()
    }

    fn resolve(
        &self,
        namespace: &str,
        subfield: &str,
        _attributes: &[String],
        _default_template: Option<&Template>,
        _file: &dyn Any,
        _eval: &mut mtl::provider::EvalCallback,
    ) -> Result<Option<ResolvedField>, EvalError> {
        Ok(self
            .fields
            .get(&(namespace.to_string(), subfield.to_string()))
            .map(|v| ResolvedField::values(v.clone())))
    }
}

fn registry_with(fields: &[(&str, &str, &[&str])]) -> Registry {
    let mut registry = Registry::builtins();
    registry.register(Rc::new(MockProvider::new(&["audio", "exiftool", "pdf"], fields)));
    registry
}

#[test]
fn scenario_1_plain_field() {
    let reg = registry_with(&[("audio", "artist", &["The Piano Guys"])]);
    let out = render_string("{audio:artist}", &(), &reg).unwrap();
    assert_eq!(out, vec!["The Piano Guys".to_string()]);
}

#[test]
fn scenario_2_in_place_with_delim() {
    let reg = registry_with(&[("exiftool", "Keywords", &["foo", "bar"])]);
    let out = render_string("{,+exiftool:Keywords}", &(), &reg).unwrap();
    assert_eq!(out, vec!["foo,bar".to_string()]);
}

#[test]
fn scenario_3_filter_pipeline() {
    let reg = registry_with(&[("exiftool", "Keywords", &["FOO", "bar"])]);
    let out = render_string("{exiftool:Keywords|lower|parens}", &(), &reg).unwrap();
    assert_eq!(out, vec!["(foo)".to_string(), "(bar)".to_string()]);
}

#[test]
fn scenario_4_ternary_on_empty_field() {
    let reg = registry_with(&[("audio", "title", &[])]);
    let out = render_string(
        "{audio:title?I have a title,I do not have a title}",
        &(),
        &reg,
    )
    .unwrap();
    assert_eq!(out, vec!["I do not have a title".to_string()]);
}

#[test]
fn scenario_5_strftime() {
    use chrono::TimeZone;
    use mtl::builtins::file::FileMeta;
    use std::path::PathBuf;

    let meta = FileMeta {
        path: PathBuf::from("/x"),
        size: 0,
        uid: 0,
        gid: 0,
        user: String::new(),
        group: String::new(),
        created: Some(chrono::Local.ymd(2020, 2, 4).and_hms(19, 7, 38)),
        modified: None,
        accessed: None,
    };
    let reg = Registry::builtins();
    let out = render_string("{created.strftime,%Y-%m-%d-%H%M%S}", &meta, &reg).unwrap();
    assert_eq!(out, vec!["2020-02-04-190738".to_string()]);
}

#[test]
fn scenario_6_variable_escape_in_replacement() {
    let reg = registry_with(&[("audio", "title", &["a-b-c"])]);
    let out = render_string(
        "{var:pipe,{pipe}}{audio:title[-,%pipe]}",
        &(),
        &reg,
    )
    .unwrap();
    assert_eq!(out.join(""), "a|b|c".to_string());
}

#[test]
fn scenario_7_combine_with_suppressed_default() {
    use mtl::builtins::file::FileMeta;
    use chrono::TimeZone;
    use std::path::PathBuf;

    let meta = FileMeta {
        path: PathBuf::from("/x"),
        size: 0,
        uid: 0,
        gid: 0,
        user: String::new(),
        group: String::new(),
        created: Some(chrono::Local.ymd(1999, 6, 1).and_hms(0, 0, 0)),
        modified: None,
        accessed: None,
    };

    let reg = registry_with(&[("audio", "title", &["The Title"])]);
    let out = render_string("{created.year&{audio:title,}}", &meta, &reg).unwrap();
    assert_eq!(out, vec!["1999".to_string(), "The Title".to_string()]);

    let reg_missing = registry_with(&[("audio", "title", &[])]);
    let out_missing = render_string("{created.year&{audio:title,}}", &meta, &reg_missing).unwrap();
    assert_eq!(out_missing, vec!["1999".to_string()]);
}

#[test]
fn scenario_8_conditional_matches_is_a_disjunction() {
    let reg_false = registry_with(&[("exiftool", "Keywords", &["BeachDay"])]);
    let out_false = render_string(
        "{exiftool:Keywords matches Beach?yes,no}",
        &(),
        &reg_false,
    )
    .unwrap();
    assert_eq!(out_false, vec!["no".to_string()]);

    let reg_true = registry_with(&[("exiftool", "Keywords", &["Beach", "Sun"])]);
    let out_true = render_string(
        "{exiftool:Keywords matches Beach?yes,no}",
        &(),
        &reg_true,
    )
    .unwrap();
    assert_eq!(out_true, vec!["yes".to_string()]);
}

#[test]
fn empty_field_without_default_yields_underscore() {
    let reg = registry_with(&[("audio", "genre", &[])]);
    let out = render_string("{audio:genre}", &(), &reg).unwrap();
    assert_eq!(out, vec!["_".to_string()]);
}

#[test]
fn var_bind_emits_no_characters() {
    let reg = registry_with(&[]);
    let out = render_string("before{var:n,hidden}after", &(), &reg).unwrap();
    assert_eq!(out.join(""), "beforeafter".to_string());
}

#[test]
fn two_renders_do_not_share_variable_bindings() {
    let reg = registry_with(&[]);
    let first = render_string("{var:x,1}", &(), &reg).unwrap();
    assert_eq!(first, Vec::<String>::new());
    // A fresh render with the same registry must not see `x` bound.
    let second = render_string("%x", &(), &reg);
    assert!(second.is_err());
}

proptest! {
    #[test]
    fn rendering_is_deterministic_for_any_literal_text(s in "[a-zA-Z0-9 ,.]{0,40}") {
        let reg = Registry::builtins();
        let first = render_string(&s, &(), &reg).unwrap();
        let second = render_string(&s, &(), &reg).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn slice_and_sslice_agree_elementwise(items in prop::collection::vec("[a-z]", 1..6), start in -5i64..5, stop in -5i64..5) {
        // Single-character elements only: with multi-character elements,
        // list-slicing then joining is not the same operation as joining
        // then char-slicing (e.g. ["ab"] sliced [0:1] is still "ab", but
        // "ab" sliced [0:1] is "a").
        let joined = items.join("");
        let spec = format!("{}:{}", start, stop);
        let by_list = mtl::filters::apply("slice", Some(&spec), items).unwrap();
        let by_string = mtl::filters::apply("sslice", Some(&spec), vec![joined]).unwrap().join("");
        prop_assert_eq!(by_list.join(""), by_string);
    }
}
