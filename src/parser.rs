//! Recursive-descent parser for MTL (`spec.md` §4.1).
//!
//! There is no separate tokenizing pass. `{` always hands control to
//! [`Parser::parse_statement`], which consumes exactly its own statement
//! including the closing `}` before returning; that is what lets nested
//! `{...}` inside a modifier position "just work" without explicit brace
//! counting at this level: by the time a terminator character is checked
//! against the *current* clause's terminator set, any inner statement has
//! already been fully consumed by the recursive call.

use crate::ast::{ConditionalOp, Conditional, FilterCall, Node, Statement, Template};
use crate::error::SyntaxError;
use crate::lexer::Cursor;

/// Characters that end a field/subfield/attribute/filter-name scan.
const NAME_STOP: &[char] = &[':', '.', '|', '[', ' ', '&', '?', ',', '}'];
/// Same, without `:`; used once we're past the first colon, so later
/// colons (e.g. `format:TYPE:FORMAT`) stay embedded in the subfield text.
const SUBFIELD_STOP: &[char] = &['.', '|', '[', ' ', '&', '?', ',', '}'];

pub fn parse(input: &str) -> Result<Template, SyntaxError> {
    let mut parser = Parser {
        cursor: Cursor::new(input),
    };
    let template = parser.parse_template(&[])?;
    if !parser.cursor.is_eof() {
        return Err(parser.err(format!(
            "unexpected '{}'",
            parser.cursor.peek().unwrap_or('\0')
        )));
    }
    Ok(template)
}

struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    fn err(&self, reason: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.cursor.offset(), reason.into())
    }

    /// Parses literal text and statements until EOF or a character in
    /// `terminators` is seen outside of any nested statement. The
    /// terminator itself is left unconsumed.
    fn parse_template(&mut self, terminators: &[char]) -> Result<Template, SyntaxError> {
        let mut nodes = Vec::new();
        let mut literal = String::new();
        loop {
            match self.cursor.peek() {
                None => break,
                Some('{') => {
                    if !literal.is_empty() {
                        nodes.push(Node::Literal(std::mem::take(&mut literal)));
                    }
                    self.cursor.bump();
                    nodes.push(Node::Statement(self.parse_statement()?));
                }
                Some(c) if terminators.contains(&c) => break,
                Some(c) => {
                    literal.push(c);
                    self.cursor.bump();
                }
            }
        }
        if !literal.is_empty() {
            nodes.push(Node::Literal(literal));
        }
        Ok(nodes)
    }

    /// Called immediately after the opening `{` has been consumed; consumes
    /// through the matching `}`.
    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        let mut stmt = Statement::default();

        self.parse_field_prefix(&mut stmt)?;
        if stmt.field.is_empty() {
            return Err(self.err("statement has no field name"));
        }

        if self.cursor.peek() == Some(':') {
            self.cursor.bump();
            stmt.subfield = Some(self.scan_until(SUBFIELD_STOP));
        }

        while self.cursor.peek() == Some('.') {
            self.cursor.bump();
            let attr = self.scan_until(SUBFIELD_STOP);
            if attr.is_empty() {
                return Err(self.err("empty attribute name after '.'"));
            }
            stmt.attributes.push(attr);
        }

        while self.cursor.peek() == Some('|') {
            self.cursor.bump();
            stmt.filters.push(self.parse_filter_call()?);
        }

        if self.cursor.peek() == Some('[') {
            self.cursor.bump();
            stmt.replacements = self.parse_replacements()?;
        }

        if self.cursor.peek() == Some(' ') {
            stmt.conditional = Some(self.parse_conditional()?);
        }

        if self.cursor.peek() == Some('&') {
            self.cursor.bump();
            stmt.combine = Some(self.parse_template(&['&', '?', ',', '}'])?);
            if self.cursor.peek() == Some('&') {
                // spec.md §9 open question (3): reject, rather than guess
                // at precedence between stacked top-level `&` clauses.
                return Err(self.err("multiple top-level '&' combine clauses"));
            }
        }

        if self.cursor.peek() == Some('?') {
            self.cursor.bump();
            stmt.true_template = Some(self.parse_template(&[',', '}'])?);
        }

        if self.cursor.peek() == Some(',') {
            self.cursor.bump();
            stmt.default_template = Some(self.parse_template(&['}'])?);
        }

        if self.cursor.bump() != Some('}') {
            return Err(self.err("unterminated statement, expected '}'"));
        }

        Ok(stmt)
    }

    /// `delim+field` is ambiguous to scan left-to-right one character at a
    /// time: `delim` may itself contain characters that normally terminate
    /// a field name (e.g. the `,` in `{,+exiftool:Keywords}`). This looks
    /// ahead, without consuming, for a `+` before any of `(`, `{`, `[` or
    /// the statement's closing `}`: those can only start a later clause
    /// (filter arg, replacement block, combine/nested statement), never a
    /// delimiter, so reaching one first means there is no `+` prefix here.
    /// A literal `+` inside a conditional value or combine/default template
    /// that appears before any of those characters is a residual ambiguity
    /// this scan does not resolve (see `DESIGN.md`).
    fn parse_field_prefix(&mut self, stmt: &mut Statement) -> Result<(), SyntaxError> {
        const ABORT_LOOKAHEAD: &[char] = &['(', '{', '[', '}'];
        let mut ahead = 0;
        let has_delim = loop {
            match self.cursor.peek_at(ahead) {
                Some('+') => break true,
                Some(c) if ABORT_LOOKAHEAD.contains(&c) => break false,
                Some(_) => ahead += 1,
                None => break false,
            }
        };

        if has_delim {
            let mut delim = String::with_capacity(ahead);
            for _ in 0..ahead {
                delim.push(self.cursor.bump().unwrap());
            }
            self.cursor.bump(); // the '+'
            stmt.in_place = true;
            stmt.delim = Some(delim);
        }

        stmt.field = self.scan_until(NAME_STOP);
        if self.cursor.is_eof() && stmt.field.is_empty() {
            return Err(self.err("unterminated statement"));
        }
        Ok(())
    }

    fn parse_filter_call(&mut self) -> Result<FilterCall, SyntaxError> {
        let mut stop = SUBFIELD_STOP.to_vec();
        stop.push('(');
        let name = self.scan_until(&stop);
        if name.is_empty() {
            return Err(self.err("empty filter name after '|'"));
        }
        let arg = if self.cursor.peek() == Some('(') {
            self.cursor.bump();
            let arg = self.parse_template(&[')'])?;
            if self.cursor.bump() != Some(')') {
                return Err(self.err("unterminated filter argument, expected ')'"));
            }
            Some(arg)
        } else {
            None
        };
        Ok(FilterCall { name, arg })
    }

    /// `[find,replace(|find,replace)*]`, called right after `[` is consumed.
    /// Sides are raw literal text, never re-parsed as MTL (`spec.md` §3).
    fn parse_replacements(&mut self) -> Result<Vec<(String, String)>, SyntaxError> {
        let mut pairs = Vec::new();
        loop {
            let find = self.scan_raw_until(&[',']);
            if self.cursor.bump() != Some(',') {
                return Err(self.err("expected ',' between find and replace"));
            }
            let replace = self.scan_raw_until(&['|', ']']);
            pairs.push((find, replace));
            match self.cursor.bump() {
                Some('|') => continue,
                Some(']') => break,
                _ => return Err(self.err("unterminated replacement block, expected ']'")),
            }
        }
        Ok(pairs)
    }

    /// Called when the cursor is on the space that introduces a
    /// conditional clause (`spec.md` §4.1 step 6).
    fn parse_conditional(&mut self) -> Result<Conditional, SyntaxError> {
        self.cursor.bump(); // the marker space
        let negated = self.cursor.eat_str("not ");
        let op = self.scan_conditional_op()?;
        if self.cursor.peek() == Some(' ') {
            self.cursor.bump();
        }
        let value = self.parse_template(&['&', '?', ',', '}'])?;
        if value.is_empty() {
            return Err(self.err("conditional clause without a value"));
        }
        Ok(Conditional {
            negated,
            op,
            value,
        })
    }

    fn scan_conditional_op(&mut self) -> Result<ConditionalOp, SyntaxError> {
        for (text, op) in ConditionalOp::ALL {
            if self.cursor.eat_str(text) {
                return Ok(*op);
            }
        }
        Err(self.err("expected a conditional operator"))
    }

    fn scan_until(&mut self, stop: &[char]) -> String {
        let mut buf = String::new();
        while let Some(c) = self.cursor.peek() {
            if stop.contains(&c) {
                break;
            }
            buf.push(c);
            self.cursor.bump();
        }
        buf
    }

    /// Like [`Parser::scan_until`] but documents that the text is consumed
    /// verbatim, never interpreted as MTL (used for find/replace sides).
    fn scan_raw_until(&mut self, stop: &[char]) -> String {
        self.scan_until(stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(s: &Statement) -> (&str, Option<&str>) {
        (s.field.as_str(), s.subfield.as_deref())
    }

    #[test]
    fn parses_plain_field() {
        let t = parse("{audio:artist}").unwrap();
        assert_eq!(t.len(), 1);
        match &t[0] {
            Node::Statement(s) => assert_eq!(field(s), ("audio", Some("artist"))),
            _ => panic!("expected statement"),
        }
    }

    #[test]
    fn parses_literal_and_field_mix() {
        let t = parse("hello {audio:artist}!").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t[0], Node::Literal("hello ".into()));
        assert_eq!(t[2], Node::Literal("!".into()));
    }

    #[test]
    fn parses_in_place_with_delim() {
        let t = parse("{,+exiftool:Keywords}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert!(s.in_place);
                assert_eq!(s.delim.as_deref(), Some(","));
                assert_eq!(field(s), ("exiftool", Some("Keywords")));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_in_place_with_multi_char_delim() {
        let t = parse("{ - +audio:artist}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert!(s.in_place);
                assert_eq!(s.delim.as_deref(), Some(" - "));
                assert_eq!(field(s), ("audio", Some("artist")));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_in_place_without_delim() {
        let t = parse("{+audio:artist}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert!(s.in_place);
                assert_eq!(s.delim.as_deref(), Some(""));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_dot_chain_and_filters() {
        let t = parse("{exiftool:Keywords|lower|parens}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert_eq!(s.filters.len(), 2);
                assert_eq!(s.filters[0].name, "lower");
                assert_eq!(s.filters[1].name, "parens");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_filter_with_arg() {
        let t = parse("{audio:title|split(-)}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert_eq!(s.filters[0].name, "split");
                assert!(s.filters[0].arg.is_some());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_replacements_with_variable_escape() {
        let t = parse("{audio:title[-,%pipe]}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert_eq!(s.replacements, vec![("-".to_string(), "%pipe".to_string())]);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_conditional_ternary() {
        let t = parse("{audio:title?I have a title,I do not have a title}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert!(s.conditional.is_none());
                assert!(s.true_template.is_some());
                assert!(s.default_template.is_some());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_conditional_with_operator() {
        let t = parse("{exiftool:Keywords matches Beach}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                let cond = s.conditional.as_ref().unwrap();
                assert_eq!(cond.op, ConditionalOp::Matches);
                assert!(!cond.negated);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_combine() {
        let t = parse("{created.year&{audio:title,}}").unwrap();
        match &t[0] {
            Node::Statement(s) => {
                assert_eq!(field(s), ("created", None));
                assert_eq!(s.attributes, vec!["year".to_string()]);
                assert!(s.combine.is_some());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn rejects_stacked_combine() {
        let err = parse("{a&{b}&{c}}").unwrap_err();
        assert!(err.reason.contains("combine"));
    }

    #[test]
    fn rejects_unterminated_statement() {
        assert!(parse("{audio:artist").is_err());
    }

    #[test]
    fn rejects_conditional_without_value() {
        assert!(parse("{a ==}").is_err());
    }

    #[test]
    fn format_subfield_keeps_embedded_colon() {
        let t = parse("{format:int:%5d,{size}}").unwrap();
        match &t[0] {
            Node::Statement(s) => assert_eq!(field(s), ("format", Some("int:%5d"))),
            _ => panic!(),
        }
    }
}
