//! Recursive-descent parser for C++ id-expressions.
//!
//! Grounded on `original_source/src/lib/Support/NameParser.cpp`'s
//! `TokenStream` + recursive-descent design: leading `::`, nested-name-
//! specifier sequences, `operator` token handling (including multi-
//! character operators, `new[]`/`delete[]`, conversion-function-ids,
//! `co_await`), `decltype(...)` specifiers, balanced `<...>`
//! template-argument scanning, and a parenthesized parameter list.
//! Shared by the reference resolver (pass A, textual `@ref`/`@copydoc`
//! targets) and the symbol-lookup engine (qualified/unqualified name
//! queries).

/// One component of a parsed id-expression: `name<template-args>(params)
/// qualifiers noexcept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub template_args: Option<Vec<String>>,
    pub params: Option<Vec<String>>,
    pub is_const: bool,
    pub is_volatile: bool,
    pub ref_qualifier: RefQual,
    pub noexcept: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefQual {
    None,
    LValue,
    RValue,
}

impl Component {
    fn simple(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            template_args: None,
            params: None,
            is_const: false,
            is_volatile: false,
            ref_qualifier: RefQual::None,
            noexcept: None,
        }
    }
}

/// A parsed id-expression: whether it began with a leading `::`, plus
/// the sequence of nested-name-specifier components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdExpression {
    pub global_qualified: bool,
    pub components: Vec<Component>,
    /// Whether `*` wildcards were present anywhere in the identifiers.
    /// Wildcard matching itself is an optional, caller-enabled mode.
    pub has_wildcards: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

struct TokenStream<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn new(s: &'a str) -> Self {
        TokenStream {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.bytes[self.pos..].starts_with(s.as_bytes()) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn rest(&self) -> &str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'*'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'*'
}

const MULTI_CHAR_OPERATORS: &[&str] = &[
    "<=>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "++", "--", "->*", "->",
    "+=", "-=", "*=", "/=", "%=", "^=", "&=", "|=",
];

/// Parse a single C++ id-expression.
pub fn parse_id_expression(input: &str) -> Result<IdExpression, ParseError> {
    let mut ts = TokenStream::new(input.trim());
    let mut has_wildcards = false;
    ts.skip_ws();
    let global_qualified = ts.eat_str("::");
    let mut components = Vec::new();
    loop {
        ts.skip_ws();
        if ts.eof() {
            break;
        }
        let comp = parse_component(&mut ts, &mut has_wildcards)?;
        components.push(comp);
        ts.skip_ws();
        if ts.eat_str("::") {
            continue;
        }
        break;
    }
    if components.is_empty() {
        return Err(ParseError("empty id-expression".into()));
    }
    Ok(IdExpression {
        global_qualified,
        components,
        has_wildcards,
    })
}

fn parse_component(ts: &mut TokenStream, has_wildcards: &mut bool) -> Result<Component, ParseError> {
    ts.skip_ws();
    // `typename`/`template` disambiguation keywords are accepted and
    // discarded; they do not change lookup semantics here.
    for kw in ["typename ", "template "] {
        if ts.rest().starts_with(kw) {
            for _ in 0..kw.len() {
                ts.bump();
            }
            ts.skip_ws();
        }
    }

    if ts.rest().starts_with("decltype(") {
        for _ in 0.."decltype(".len() {
            ts.bump();
        }
        let expr = scan_balanced(ts, b'(', b')')?;
        return Ok(Component::simple(format!("decltype({expr})")));
    }

    if ts.rest().starts_with("operator") {
        return parse_operator_component(ts, has_wildcards);
    }

    let name = parse_identifier(ts, has_wildcards)?;
    let mut comp = Component::simple(name);

    ts.skip_ws();
    if ts.peek() == Some(b'<') {
        comp.template_args = Some(scan_template_args(ts)?);
    }

    parse_function_suffix(ts, &mut comp)?;
    Ok(comp)
}

fn parse_operator_component(ts: &mut TokenStream, has_wildcards: &mut bool) -> Result<Component, ParseError> {
    for _ in 0.."operator".len() {
        ts.bump();
    }
    ts.skip_ws();

    // co_await is treated as an operator-like token.
    if ts.rest().starts_with("co_await") {
        for _ in 0.."co_await".len() {
            ts.bump();
        }
        let mut comp = Component::simple("operator co_await");
        parse_function_suffix(ts, &mut comp)?;
        return Ok(comp);
    }

    // new[]/delete[] before plain new/delete.
    for (tok, rendered) in [("new[]", "operator new[]"), ("delete[]", "operator delete[]")] {
        if ts.rest().starts_with(tok) {
            for _ in 0..tok.len() {
                ts.bump();
            }
            let mut comp = Component::simple(rendered);
            parse_function_suffix(ts, &mut comp)?;
            return Ok(comp);
        }
    }
    for (tok, rendered) in [("new", "operator new"), ("delete", "operator delete")] {
        if ts.rest().starts_with(tok) && !ts.peek_at(tok.len()).map(is_ident_continue).unwrap_or(false) {
            for _ in 0..tok.len() {
                ts.bump();
            }
            let mut comp = Component::simple(rendered);
            parse_function_suffix(ts, &mut comp)?;
            return Ok(comp);
        }
    }

    // Multi-/single-character operator tokens, longest match first.
    for op in MULTI_CHAR_OPERATORS {
        if ts.rest().starts_with(op) {
            for _ in 0..op.len() {
                ts.bump();
            }
            let mut comp = Component::simple(format!("operator{op}"));
            parse_function_suffix(ts, &mut comp)?;
            return Ok(comp);
        }
    }
    if let Some(c) = ts.peek() {
        if b"+-*/%^&|~!=<>()[],".contains(&c) {
            // `operator()` and `operator[]` are themselves multi-char but
            // with no fixed-width table entry; handle the bracket pairs.
            if c == b'(' && ts.peek_at(1) == Some(b')') {
                ts.bump();
                ts.bump();
                let mut comp = Component::simple("operator()");
                parse_function_suffix(ts, &mut comp)?;
                return Ok(comp);
            }
            if c == b'[' && ts.peek_at(1) == Some(b']') {
                ts.bump();
                ts.bump();
                let mut comp = Component::simple("operator[]");
                parse_function_suffix(ts, &mut comp)?;
                return Ok(comp);
            }
            ts.bump();
            let mut comp = Component::simple(format!("operator{}", c as char));
            parse_function_suffix(ts, &mut comp)?;
            return Ok(comp);
        }
    }

    // Conversion-function-id: `operator SomeType`.
    ts.skip_ws();
    let ty_name = parse_identifier(ts, has_wildcards)?;
    let mut comp = Component::simple(format!("operator {ty_name}"));
    parse_function_suffix(ts, &mut comp)?;
    Ok(comp)
}

fn parse_identifier(ts: &mut TokenStream, has_wildcards: &mut bool) -> Result<String, ParseError> {
    ts.skip_ws();
    let start = ts.pos;
    match ts.peek() {
        Some(c) if is_ident_start(c) => {
            if c == b'*' {
                *has_wildcards = true;
            }
            ts.bump();
        }
        _ => return Err(ParseError(format!("expected identifier at '{}'", ts.rest()))),
    }
    while let Some(c) = ts.peek() {
        if is_ident_continue(c) {
            if c == b'*' {
                *has_wildcards = true;
            }
            ts.bump();
        } else {
            break;
        }
    }
    Ok(std::str::from_utf8(&ts.bytes[start..ts.pos]).unwrap().to_string())
}

/// Scan a balanced `open...close` region (used for `decltype(...)` and
/// parenthesized parameter lists), returning the inner text.
fn scan_balanced(ts: &mut TokenStream, open: u8, close: u8) -> Result<String, ParseError> {
    if ts.bump() != Some(open) {
        return Err(ParseError(format!("expected '{}'", open as char)));
    }
    let start = ts.pos;
    let mut depth = 1i32;
    while depth > 0 {
        match ts.bump() {
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => depth -= 1,
            Some(_) => {}
            None => return Err(ParseError("unbalanced parenthesization".into())),
        }
    }
    Ok(std::str::from_utf8(&ts.bytes[start..ts.pos - 1]).unwrap().to_string())
}

/// Scan `<...>` with balanced nesting (angle brackets can nest for
/// template-template arguments), splitting top-level arguments on `,`.
fn scan_template_args(ts: &mut TokenStream) -> Result<Vec<String>, ParseError> {
    ts.bump(); // '<'
    let mut depth = 1i32;
    let mut paren_depth = 0i32;
    let start = ts.pos;
    loop {
        match ts.peek() {
            Some(b'<') => {
                depth += 1;
                ts.bump();
            }
            Some(b'(') => {
                paren_depth += 1;
                ts.bump();
            }
            Some(b')') => {
                paren_depth -= 1;
                ts.bump();
            }
            Some(b'>') if paren_depth == 0 => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                ts.bump();
            }
            Some(_) => {
                ts.bump();
            }
            None => return Err(ParseError("unbalanced template-argument list".into())),
        }
    }
    let inner = std::str::from_utf8(&ts.bytes[start..ts.pos]).unwrap();
    ts.bump(); // '>'
    Ok(split_top_level(inner, ',', '<', '>'))
}

fn split_top_level(s: &str, sep: char, open: char, close: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut cur = String::new();
    for c in s.chars() {
        if c == open {
            depth += 1;
            cur.push(c);
        } else if c == close {
            depth -= 1;
            cur.push(c);
        } else if c == sep && depth == 0 {
            out.push(cur.trim().to_string());
            cur = String::new();
        } else {
            cur.push(c);
        }
    }
    let trimmed = cur.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    out
}

fn parse_function_suffix(ts: &mut TokenStream, comp: &mut Component) -> Result<(), ParseError> {
    ts.skip_ws();
    if ts.peek() == Some(b'(') {
        let inner = scan_balanced(ts, b'(', b')')?;
        comp.params = Some(if inner.trim().is_empty() {
            Vec::new()
        } else {
            split_top_level(&inner, ',', '<', '>')
        });
    }
    loop {
        ts.skip_ws();
        if ts.rest().starts_with("const") && !ts.peek_at(5).map(is_ident_continue).unwrap_or(false) {
            for _ in 0.."const".len() {
                ts.bump();
            }
            comp.is_const = true;
            continue;
        }
        if ts.rest().starts_with("volatile") && !ts.peek_at(8).map(is_ident_continue).unwrap_or(false) {
            for _ in 0.."volatile".len() {
                ts.bump();
            }
            comp.is_volatile = true;
            continue;
        }
        if ts.rest().starts_with("&&") {
            ts.bump();
            ts.bump();
            comp.ref_qualifier = RefQual::RValue;
            continue;
        }
        if ts.peek() == Some(b'&') {
            ts.bump();
            comp.ref_qualifier = RefQual::LValue;
            continue;
        }
        if ts.rest().starts_with("noexcept") {
            for _ in 0.."noexcept".len() {
                ts.bump();
            }
            ts.skip_ws();
            if ts.peek() == Some(b'(') {
                comp.noexcept = Some(scan_balanced(ts, b'(', b')')?);
            } else {
                comp.noexcept = Some(String::new());
            }
            continue;
        }
        break;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_qualified_name() {
        let e = parse_id_expression("A::B::C").unwrap();
        assert!(!e.global_qualified);
        assert_eq!(e.components.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["A", "B", "C"]);
    }

    #[test]
    fn parses_leading_global_qualifier() {
        let e = parse_id_expression("::std::vector").unwrap();
        assert!(e.global_qualified);
        assert_eq!(e.components[0].name, "std");
    }

    #[test]
    fn parses_function_with_params_and_cv_ref() {
        let e = parse_id_expression("S::f(int, double) const &").unwrap();
        let last = e.components.last().unwrap();
        assert_eq!(last.name, "f");
        assert_eq!(last.params.as_deref(), Some(&["int".to_string(), "double".to_string()][..]));
        assert!(last.is_const);
        assert_eq!(last.ref_qualifier, RefQual::LValue);
    }

    #[test]
    fn parses_template_args_with_nesting() {
        let e = parse_id_expression("std::enable_if_t<std::is_integral_v<T>, T>").unwrap();
        let last = e.components.last().unwrap();
        assert_eq!(last.name, "enable_if_t");
        let args = last.template_args.as_ref().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "std::is_integral_v<T>");
        assert_eq!(args[1], "T");
    }

    #[test]
    fn parses_operator_equal_equal() {
        let e = parse_id_expression("operator==(S,S)").unwrap();
        assert_eq!(e.components[0].name, "operator==");
        assert_eq!(e.components[0].params.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn parses_operator_new_array() {
        let e = parse_id_expression("operator new[]").unwrap();
        assert_eq!(e.components[0].name, "operator new[]");
    }

    #[test]
    fn parses_conversion_function_id() {
        let e = parse_id_expression("operator bool").unwrap();
        assert_eq!(e.components[0].name, "operator bool");
    }

    #[test]
    fn parses_coawait() {
        let e = parse_id_expression("operator co_await").unwrap();
        assert_eq!(e.components[0].name, "operator co_await");
    }

    #[test]
    fn parses_decltype_specifier() {
        let e = parse_id_expression("decltype(x + y)::type").unwrap();
        assert_eq!(e.components[0].name, "decltype(x + y)");
        assert_eq!(e.components[1].name, "type");
    }

    #[test]
    fn wildcards_are_flagged() {
        let e = parse_id_expression("std::vec*").unwrap();
        assert!(e.has_wildcards);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_id_expression("   ").is_err());
    }
}
