//! The parsed form of an MTL template (`spec.md` §3).
//!
//! A template is an ordered sequence of [`Node`]s. Every sub-template
//! (filter arguments, conditional values, combine/true/default templates)
//! is itself a `Template`; the grammar is recursive, not flat.

/// A fully parsed MTL template: an ordered run of literal text and
/// statements.
pub type Template = Vec<Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text outside any `{...}` statement.
    Literal(String),
    Statement(Statement),
}

/// One `{...}` expression and its modifier chain, in the fixed syntactic
/// order from `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// The `delim` text of a `delim+` prefix. Only meaningful if
    /// `in_place` is set; `spec.md` §3 requires `delim` never appear
    /// without `+`.
    pub delim: Option<String>,
    /// The `+` in-place flag.
    pub in_place: bool,
    /// Identifier before `:`, or the whole field name if there is no `:`.
    /// Used together with `subfield` to form the registry dispatch key
    /// (`spec.md` §4.4): a bare field with no `:` dispatches under the
    /// empty namespace, with `field` itself as the subfield.
    pub field: String,
    /// Identifier (and anything else up to the next sigil) after `:`.
    pub subfield: Option<String>,
    /// Dot-chained attribute accessors, e.g. `.year`, `.parent.name`.
    pub attributes: Vec<String>,
    pub filters: Vec<FilterCall>,
    /// `[find,replace(|find,replace)*]`. Sides are literal text (not
    /// re-parsed as MTL) but may reference `%name` variables, substituted
    /// at apply time (`spec.md` §3 invariants, the `%pipe` escape).
    pub replacements: Vec<(String, String)>,
    pub conditional: Option<Conditional>,
    pub combine: Option<Template>,
    pub true_template: Option<Template>,
    pub default_template: Option<Template>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    /// Parenthesized argument, parsed as MTL (`spec.md` §4.1 step 4).
    pub arg: Option<Template>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub negated: bool,
    pub op: ConditionalOp,
    pub value: Template,
}

/// Longest-match-wins set from `spec.md` §4.1 step 6 (`<=` before `<`, etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalOp {
    Contains,
    Matches,
    StartsWith,
    EndsWith,
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,
}

impl ConditionalOp {
    /// Operators ordered so that a linear scan finds the longest match
    /// first (`<=`/`>=` before `<`/`>`).
    pub const ALL: &'static [(&'static str, ConditionalOp)] = &[
        ("contains", ConditionalOp::Contains),
        ("matches", ConditionalOp::Matches),
        ("startswith", ConditionalOp::StartsWith),
        ("endswith", ConditionalOp::EndsWith),
        ("<=", ConditionalOp::Le),
        (">=", ConditionalOp::Ge),
        ("==", ConditionalOp::Eq),
        ("!=", ConditionalOp::Ne),
        ("<", ConditionalOp::Lt),
        (">", ConditionalOp::Gt),
    ];
}
