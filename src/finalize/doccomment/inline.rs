//! Inline markup parser — part of the doc-comment finalizer, pass D.
//!
//! Re-tokenizes every text leaf into a structured inline tree: CommonMark-
//! style emphasis/strong/strikethrough/highlight/sub/sup, code spans,
//! math barriers, `[text](dest)` links, `![alt](src)` images,
//! HTML-style phrasing tags (`<em>`, `<strong>`, `<a href>`, `<br>`,
//! `<img>`), and backslash escapes. Implemented as a single frame stack
//! with strict LIFO nesting (a closer only matches the frame currently
//! on top) rather than full CommonMark's priority-queue delimiter
//! matching — sufficient for doxygen-style comments, which rarely rely
//! on cross-nested emphasis, and it keeps "unmatched openers/closers are
//! literalized" trivial to guarantee: flushing the stack
//! at end of input always degrades an unmatched frame back to literal
//! text plus its already-resolved children.

use crate::doc::{Inline, StyledKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum FrameKind {
    Root,
    Star1,
    Star2,
    Underscore1,
    Underscore2,
    Tilde2,
    Tilde1,
    Equal2,
    Caret1,
    Bracket,
    ImageBracket,
    HtmlEm,
    HtmlStrong,
    HtmlLink(String),
}

struct Frame {
    kind: FrameKind,
    marker: String,
    children: Vec<Inline>,
}

impl Frame {
    fn flush_text(&mut self, buf: &mut String) {
        if !buf.is_empty() {
            self.children.push(Inline::Text(std::mem::take(buf)));
        }
    }
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    stack: Vec<Frame>,
    buf: String,
    _src: &'a str,
}

fn is_alnum(c: char) -> bool {
    c.is_alphanumeric()
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            chars: src.chars().collect(),
            pos: 0,
            stack: vec![Frame {
                kind: FrameKind::Root,
                marker: String::new(),
                children: Vec::new(),
            }],
            buf: String::new(),
            _src: src,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn prev_char(&self) -> Option<char> {
        if self.pos == 0 {
            None
        } else {
            self.chars.get(self.pos - 1).copied()
        }
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap()
    }

    fn push_node(&mut self, node: Inline) {
        let buf = std::mem::take(&mut self.buf);
        let top = self.top_mut();
        if !buf.is_empty() {
            top.children.push(Inline::Text(buf));
        }
        top.children.push(node);
    }

    fn run_length(&self, c: char) -> usize {
        let mut n = 0;
        while self.peek_at(n) == Some(c) {
            n += 1;
        }
        n
    }

    /// Try to close a run of `len` copies of `c` against the current top
    /// frame. Returns true if it matched and was consumed.
    fn try_close(&mut self, kind: FrameKind, styled: StyledKind, consume: usize) -> bool {
        if self.stack.len() > 1 && self.stack.last().unwrap().kind == kind {
            let mut frame = self.stack.pop().unwrap();
            self.flush_buf_into(&mut frame);
            self.pos += consume;
            self.push_node(Inline::Styled {
                kind: styled,
                content: frame.children,
            });
            true
        } else {
            false
        }
    }

    fn flush_buf_into(&mut self, frame: &mut Frame) {
        frame.flush_text(&mut self.buf);
    }

    fn parse(mut self) -> Vec<Inline> {
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    if let Some(next) = self.peek_at(1) {
                        if !next.is_alphanumeric() {
                            self.buf.push(next);
                            self.pos += 2;
                            continue;
                        }
                    }
                    self.buf.push('\\');
                    self.pos += 1;
                }
                '`' => self.handle_code_span(),
                '$' => self.handle_math(),
                '*' => self.handle_emphasis_run('*'),
                '_' => self.handle_emphasis_run('_'),
                '~' => self.handle_emphasis_run('~'),
                '=' => self.handle_equal_run(),
                '^' => self.handle_caret(),
                '!' if self.peek_at(1) == Some('[') => {
                    self.buf_flush_into_top();
                    self.stack.push(Frame {
                        kind: FrameKind::ImageBracket,
                        marker: "![".into(),
                        children: Vec::new(),
                    });
                    self.pos += 2;
                }
                '[' => {
                    self.buf_flush_into_top();
                    self.stack.push(Frame {
                        kind: FrameKind::Bracket,
                        marker: "[".into(),
                        children: Vec::new(),
                    });
                    self.pos += 1;
                }
                ']' => self.handle_bracket_close(),
                '<' => self.handle_html_tag(),
                '\n' => {
                    // Two-or-more trailing spaces before a newline is a
                    // hard line break; otherwise a soft break.
                    let trailing_spaces = self.buf.chars().rev().take_while(|c| *c == ' ').count();
                    if trailing_spaces >= 2 {
                        let trimmed_len = self.buf.len() - trailing_spaces;
                        self.buf.truncate(trimmed_len);
                        self.push_node(Inline::LineBreak);
                    } else {
                        self.push_node(Inline::SoftBreak);
                    }
                    self.pos += 1;
                }
                _ => {
                    self.buf.push(c);
                    self.pos += 1;
                }
            }
        }

        // Flush remaining text and unwind any unmatched (still-open)
        // frames: each becomes literal marker text followed by its
        // already-resolved children.
        while self.stack.len() > 1 {
            let mut frame = self.stack.pop().unwrap();
            frame.flush_text(&mut self.buf);
            let marker = frame.marker.clone();
            let children = frame.children;
            let parent = self.top_mut();
            parent.children.push(Inline::Text(marker));
            parent.children.extend(children);
        }
        let mut root = self.stack.pop().unwrap();
        root.flush_text(&mut self.buf);
        root.children
    }

    fn handle_code_span(&mut self) {
        let n = self.run_length('`');
        let search_start = self.pos + n;
        if let Some(close_at) = find_run(&self.chars, search_start, '`', n) {
            let content: String = self.chars[search_start..close_at].iter().collect();
            self.pos = close_at + n;
            self.push_node(Inline::Styled {
                kind: StyledKind::Mono,
                content: vec![Inline::Text(content.trim().to_string())],
            });
        } else {
            for _ in 0..n {
                self.buf.push('`');
            }
            self.pos += n;
        }
    }

    fn handle_math(&mut self) {
        if let Some(close_at) = find_single(&self.chars, self.pos + 1, '$') {
            let content: String = self.chars[self.pos + 1..close_at].iter().collect();
            self.pos = close_at + 1;
            self.push_node(Inline::Math(content));
        } else {
            self.buf.push('$');
            self.pos += 1;
        }
    }

    fn handle_equal_run(&mut self) {
        let n = self.run_length('=');
        if n >= 2 {
            if self.try_close(FrameKind::Equal2, StyledKind::Highlight, 2) {
                return;
            }
            let can_open = self.peek_at(2).map(|c| !c.is_whitespace()).unwrap_or(false);
            if can_open {
                self.buf_flush_into_top();
                self.stack.push(Frame {
                    kind: FrameKind::Equal2,
                    marker: "==".into(),
                    children: Vec::new(),
                });
                self.pos += 2;
                return;
            }
        }
        for _ in 0..n {
            self.buf.push('=');
        }
        self.pos += n;
    }

    fn handle_caret(&mut self) {
        let prev = self.prev_char();
        let next = self.peek_at(1);
        let can_close = self.stack.last().unwrap().kind == FrameKind::Caret1
            && !next.map(is_alnum).unwrap_or(false);
        if can_close {
            self.try_close(FrameKind::Caret1, StyledKind::Sup, 1);
            return;
        }
        let can_open = next.map(|c| !c.is_whitespace()).unwrap_or(false) && !prev.map(is_alnum).unwrap_or(false);
        if can_open {
            self.buf_flush_into_top();
            self.stack.push(Frame {
                kind: FrameKind::Caret1,
                marker: "^".into(),
                children: Vec::new(),
            });
            self.pos += 1;
        } else {
            self.buf.push('^');
            self.pos += 1;
        }
    }

    fn buf_flush_into_top(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        self.top_mut().flush_text(&mut buf);
    }

    fn handle_emphasis_run(&mut self, c: char) {
        let n = self.run_length(c);
        let prev = self.prev_char();
        let next = self.peek_at(n);
        let intraword_sensitive = c != '*';

        let right_flank_close = prev.map(|p| !p.is_whitespace()).unwrap_or(false)
            && (!intraword_sensitive || !next.map(is_alnum).unwrap_or(false));
        let left_flank_open = next.map(|n| !n.is_whitespace()).unwrap_or(false)
            && (!intraword_sensitive || !prev.map(is_alnum).unwrap_or(false));

        // '~' is ambiguous: run length >= 2 is strikethrough, exactly 1
        // is sub. Normalize the consumed width to exactly 2 or 1.
        let (kind2, kind1, styled2, styled1, width_double) = match c {
            '*' => (FrameKind::Star2, FrameKind::Star1, StyledKind::Bold, StyledKind::Italic, 2),
            '_' => (
                FrameKind::Underscore2,
                FrameKind::Underscore1,
                StyledKind::Bold,
                StyledKind::Italic,
                2,
            ),
            '~' => (FrameKind::Tilde2, FrameKind::Tilde1, StyledKind::Strike, StyledKind::Sub, 2),
            _ => unreachable!(),
        };

        if n >= width_double {
            if right_flank_close && self.try_close(kind2.clone(), styled2, width_double) {
                return;
            }
            if left_flank_open {
                self.buf_flush_into_top();
                self.stack.push(Frame {
                    kind: kind2,
                    marker: std::iter::repeat(c).take(width_double).collect(),
                    children: Vec::new(),
                });
                self.pos += width_double;
                return;
            }
        } else {
            if right_flank_close && self.try_close(kind1.clone(), styled1, 1) {
                return;
            }
            if left_flank_open {
                self.buf_flush_into_top();
                self.stack.push(Frame {
                    kind: kind1,
                    marker: c.to_string(),
                    children: Vec::new(),
                });
                self.pos += 1;
                return;
            }
        }
        for _ in 0..n {
            self.buf.push(c);
        }
        self.pos += n;
    }

    fn handle_bracket_close(&mut self) {
        let is_image = matches!(self.stack.last().map(|f| &f.kind), Some(FrameKind::ImageBracket));
        let is_link = matches!(self.stack.last().map(|f| &f.kind), Some(FrameKind::Bracket));
        if !is_image && !is_link {
            self.buf.push(']');
            self.pos += 1;
            return;
        }
        // look ahead for `(href)` immediately after `]`
        if self.peek_at(1) == Some('(') {
            if let Some(close_paren) = find_balanced(&self.chars, self.pos + 1, '(', ')') {
                let href: String = self.chars[self.pos + 2..close_paren].iter().collect();
                let mut frame = self.stack.pop().unwrap();
                frame.flush_text(&mut self.buf);
                self.pos = close_paren + 1;
                if is_image {
                    self.push_node(Inline::Image {
                        src: href.trim().to_string(),
                        alt: Inline::flatten_text(&frame.children),
                    });
                } else {
                    self.push_node(Inline::Link {
                        href: href.trim().to_string(),
                        text: frame.children,
                    });
                }
                return;
            }
        }
        // no matching `(href)`: literalize the bracket pair's opener now,
        // keep going (the `]` itself becomes literal text too).
        let mut frame = self.stack.pop().unwrap();
        frame.flush_text(&mut self.buf);
        let marker = frame.marker.clone();
        let children = frame.children;
        let top = self.top_mut();
        top.children.push(Inline::Text(marker));
        top.children.extend(children);
        self.buf.push(']');
        self.pos += 1;
    }

    fn handle_html_tag(&mut self) {
        if let Some(close_at) = find_single(&self.chars, self.pos + 1, '>') {
            let raw: String = self.chars[self.pos + 1..close_at].iter().collect();
            let is_close = raw.starts_with('/');
            let body = raw.trim_start_matches('/').trim();
            let tag_name: String = body
                .chars()
                .take_while(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            let consume_to = close_at + 1;

            match tag_name.as_str() {
                "br" => {
                    self.push_node(Inline::LineBreak);
                    self.pos = consume_to;
                }
                "img" => {
                    let src = extract_attr(body, "src").unwrap_or_default();
                    let alt = extract_attr(body, "alt").unwrap_or_default();
                    self.push_node(Inline::Image { src, alt });
                    self.pos = consume_to;
                }
                "em" if !is_close => {
                    self.buf_flush_into_top();
                    self.stack.push(Frame {
                        kind: FrameKind::HtmlEm,
                        marker: "<em>".into(),
                        children: Vec::new(),
                    });
                    self.pos = consume_to;
                }
                "em" if is_close => {
                    if !self.try_close(FrameKind::HtmlEm, StyledKind::Italic, 0) {
                        self.buf.push_str("</em>");
                    }
                    self.pos = consume_to;
                }
                "strong" if !is_close => {
                    self.buf_flush_into_top();
                    self.stack.push(Frame {
                        kind: FrameKind::HtmlStrong,
                        marker: "<strong>".into(),
                        children: Vec::new(),
                    });
                    self.pos = consume_to;
                }
                "strong" if is_close => {
                    if !self.try_close(FrameKind::HtmlStrong, StyledKind::Bold, 0) {
                        self.buf.push_str("</strong>");
                    }
                    self.pos = consume_to;
                }
                "a" if !is_close => {
                    let href = extract_attr(body, "href").unwrap_or_default();
                    self.buf_flush_into_top();
                    self.stack.push(Frame {
                        kind: FrameKind::HtmlLink(href),
                        marker: "<a href=\"...\">".to_string(),
                        children: Vec::new(),
                    });
                    self.pos = consume_to;
                }
                "a" if is_close => {
                    let matches = matches!(self.stack.last().map(|f| &f.kind), Some(FrameKind::HtmlLink(_)));
                    if matches {
                        let mut frame = self.stack.pop().unwrap();
                        frame.flush_text(&mut self.buf);
                        let href = match frame.kind {
                            FrameKind::HtmlLink(h) => h,
                            _ => unreachable!(),
                        };
                        self.push_node(Inline::Link {
                            href,
                            text: frame.children,
                        });
                    } else {
                        self.buf.push_str("</a>");
                    }
                    self.pos = consume_to;
                }
                _ => {
                    // Unrecognized tag: literalize verbatim.
                    self.buf.push('<');
                    self.buf.push_str(&raw);
                    self.buf.push('>');
                    self.pos = consume_to;
                }
            }
        } else {
            self.buf.push('<');
            self.pos += 1;
        }
    }
}

fn find_run(chars: &[char], from: usize, c: char, len: usize) -> Option<usize> {
    let mut i = from;
    while i + len <= chars.len() {
        if chars[i..i + len].iter().all(|&x| x == c) && chars.get(i + len) != Some(&c) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn find_single(chars: &[char], from: usize, c: char) -> Option<usize> {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == c {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn find_balanced(chars: &[char], from: usize, open: char, close: char) -> Option<usize> {
    if chars.get(from) != Some(&open) {
        return None;
    }
    let mut depth = 0i32;
    let mut i = from;
    while i < chars.len() {
        if chars[i] == open {
            depth += 1;
        } else if chars[i] == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn extract_attr(body: &str, attr: &str) -> Option<String> {
    let pattern = format!("{attr}=");
    let idx = body.find(&pattern)?;
    let rest = &body[idx + pattern.len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let end = rest[1..].find(quote)?;
    Some(rest[1..1 + end].to_string())
}

/// Parse doxygen/markdown-flavored inline markup into a structured tree.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    Parser::new(text).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_with_nested_emph_parses_and_flattens() {
        let tree = parse_inline("a **b _c_ b** a");
        assert_eq!(Inline::flatten_text(&tree), "a b c b a");
        match &tree[1] {
            Inline::Styled { kind: StyledKind::Bold, content } => {
                assert!(content.iter().any(|n| matches!(n, Inline::Styled { kind: StyledKind::Italic, .. })));
            }
            other => panic!("expected bold, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_opener_is_literalized() {
        let tree = parse_inline("a *b");
        assert_eq!(Inline::flatten_text(&tree), "a *b");
    }

    #[test]
    fn unmatched_closer_is_literalized() {
        let tree = parse_inline("a* b");
        assert_eq!(Inline::flatten_text(&tree), "a* b");
    }

    #[test]
    fn code_span_is_literal_barrier() {
        let tree = parse_inline("use `a*b` here");
        assert_eq!(Inline::flatten_text(&tree), "use a*b here");
        assert!(tree.iter().any(|n| matches!(n, Inline::Styled { kind: StyledKind::Mono, .. })));
    }

    #[test]
    fn link_is_parsed() {
        let tree = parse_inline("see [docs](https://example.com) now");
        let link = tree.iter().find_map(|n| match n {
            Inline::Link { href, text } => Some((href.clone(), Inline::flatten_text(text))),
            _ => None,
        });
        assert_eq!(link, Some(("https://example.com".to_string(), "docs".to_string())));
    }

    #[test]
    fn image_is_parsed() {
        let tree = parse_inline("![alt text](img.png)");
        assert!(tree.iter().any(|n| matches!(n, Inline::Image { src, alt } if src == "img.png" && alt == "alt text")));
    }

    #[test]
    fn html_em_and_strong_and_br() {
        let tree = parse_inline("<strong>bold</strong> and <em>it</em><br>next");
        assert_eq!(Inline::flatten_text(&tree), "bold and itnext");
        assert!(tree.iter().any(|n| matches!(n, Inline::LineBreak)));
    }

    #[test]
    fn html_anchor_with_href() {
        let tree = parse_inline(r#"<a href="http://x">click</a>"#);
        assert!(tree.iter().any(|n| matches!(n, Inline::Link { href, .. } if href == "http://x")));
    }

    #[test]
    fn math_barrier_is_literal() {
        let tree = parse_inline("energy $e = mc^2$ formula");
        assert!(tree.iter().any(|n| matches!(n, Inline::Math(m) if m == " e = mc^2 ")));
    }

    #[test]
    fn escape_suppresses_markup() {
        let tree = parse_inline(r"\*not bold\*");
        assert_eq!(Inline::flatten_text(&tree), "*not bold*");
        assert!(!tree.iter().any(|n| matches!(n, Inline::Styled { .. })));
    }

    proptest::proptest! {
        #[test]
        fn flatten_roundtrip_on_plain_text(s in "[a-zA-Z0-9 ]{0,40}") {
            // Strings drawn from a markup-free alphabet parse to pure
            // text, so flattening always recovers the original input
            //.
            let tree = parse_inline(&s);
            proptest::prop_assert_eq!(Inline::flatten_text(&tree), s);
        }
    }
}
