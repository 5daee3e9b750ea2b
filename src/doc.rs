//! Doc-comment model.
//!
//! A `Javadoc` is an ordered list of `Block`s; paragraph-like blocks own
//! an `Inline` container. The inline leaves are produced initially as
//! raw `Text` by extraction and re-tokenized into the full structured
//! tree by the doc-comment finalizer's inline parser.

use crate::id::SymbolId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmonitionKind {
    Note,
    Tip,
    Important,
    Caution,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyledKind {
    Bold,
    Italic,
    Mono,
    Strike,
    Highlight,
    Sub,
    Sup,
}

/// An inline leaf or nestable container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    Styled { kind: StyledKind, content: Vec<Inline> },
    Link { href: String, text: Vec<Inline> },
    Reference { symbol: Option<SymbolId>, text: String },
    CopyDetails { target: String, text: Vec<Inline> },
    Math(String),
    SoftBreak,
    LineBreak,
    Image { src: String, alt: String },
}

impl Inline {
    /// Flatten to plain text.
    pub fn flatten_text(nodes: &[Inline]) -> String {
        let mut out = String::new();
        for n in nodes {
            n.flatten_into(&mut out);
        }
        out
    }

    fn flatten_into(&self, out: &mut String) {
        match self {
            Inline::Text(s) => out.push_str(s),
            Inline::Styled { content, .. } => {
                for c in content {
                    c.flatten_into(out);
                }
            }
            Inline::Link { text, .. } => {
                for c in text {
                    c.flatten_into(out);
                }
            }
            Inline::Reference { text, .. } => out.push_str(text),
            Inline::CopyDetails { text, .. } => {
                for c in text {
                    c.flatten_into(out);
                }
            }
            Inline::Math(s) => out.push_str(s),
            Inline::SoftBreak => out.push(' '),
            Inline::LineBreak => out.push('\n'),
            Inline::Image { alt, .. } => out.push_str(alt),
        }
    }

    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        match self {
            Inline::Reference { symbol: Some(id), .. } => f(id),
            Inline::Styled { content, .. } | Inline::Link { text: content, .. } => {
                for c in content {
                    c.visit_symbol_ids_mut(f);
                }
            }
            Inline::CopyDetails { text, .. } => {
                for c in text {
                    c.visit_symbol_ids_mut(f);
                }
            }
            _ => {}
        }
    }
}

/// A paragraph-like block: an ordered inline container.
pub type Paragraph = Vec<Inline>;

/// One documentation block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Brief(Paragraph),
    Paragraph(Paragraph),
    Returns(Paragraph),
    Param {
        name: String,
        direction: ParamDirection,
        content: Paragraph,
    },
    TParam {
        name: String,
        content: Paragraph,
    },
    Throws {
        exception: Option<SymbolId>,
        exception_text: String,
        content: Paragraph,
    },
    Precondition(Paragraph),
    Postcondition(Paragraph),
    Admonition {
        kind: AdmonitionKind,
        content: Paragraph,
    },
    Heading {
        level: u8,
        content: Paragraph,
    },
    Code(String),
    List {
        kind: ListKind,
        items: Vec<Paragraph>,
    },
    See(Paragraph),
    Details(Paragraph),
}

impl Block {
    pub fn paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Brief(p)
            | Block::Paragraph(p)
            | Block::Returns(p)
            | Block::Param { content: p, .. }
            | Block::TParam { content: p, .. }
            | Block::Throws { content: p, .. }
            | Block::Precondition(p)
            | Block::Postcondition(p)
            | Block::Admonition { content: p, .. }
            | Block::Heading { content: p, .. }
            | Block::See(p)
            | Block::Details(p) => Some(p),
            Block::Code(_) | Block::List { .. } => None,
        }
    }

    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        match self {
            Block::Throws { exception: Some(id), .. } => f(id),
            Block::List { items, .. } => {
                for item in items {
                    for i in item {
                        i.visit_symbol_ids_mut(f);
                    }
                }
            }
            _ => {}
        }
        if let Some(p) = self.paragraph_mut() {
            for i in p {
                i.visit_symbol_ids_mut(f);
            }
        }
    }
}

/// The finalized doc-comment tree attached to a `Symbol`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Javadoc {
    pub blocks: Vec<Block>,
    /// Symbols that `@relates`/`@memberof` cross-linked onto this one
    /// without moving it into the related scope (DESIGN.md Open Question
    /// #1 resolution).
    pub related: Vec<SymbolId>,
}

impl Javadoc {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn brief(&self) -> Option<&Paragraph> {
        self.blocks.iter().find_map(|b| match b {
            Block::Brief(p) => Some(p),
            _ => None,
        })
    }

    pub fn brief_mut(&mut self) -> Option<&mut Paragraph> {
        self.blocks.iter_mut().find_map(|b| match b {
            Block::Brief(p) => Some(p),
            _ => None,
        })
    }

    pub fn returns(&self) -> Option<&Paragraph> {
        self.blocks.iter().find_map(|b| match b {
            Block::Returns(p) => Some(p),
            _ => None,
        })
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Paragraph)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Param { name, content, .. } => Some((name.as_str(), content)),
            _ => None,
        })
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params().any(|(n, _)| n == name)
    }

    pub fn set_brief(&mut self, text: impl Into<String>) {
        let para = vec![Inline::Text(text.into())];
        if let Some(existing) = self.brief_mut() {
            *existing = para;
        } else {
            self.blocks.insert(0, Block::Brief(para));
        }
    }

    pub fn set_returns(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Returns(vec![Inline::Text(text.into())]));
    }

    pub fn add_param(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.blocks.push(Block::Param {
            name: name.into(),
            direction: ParamDirection::Unspecified,
            content: vec![Inline::Text(text.into())],
        });
    }

    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        for id in &mut self.related {
            f(id);
        }
        for b in &mut self.blocks {
            b.visit_symbol_ids_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_strips_markup_but_keeps_text() {
        // a **b _c_ b** a
        let tree = vec![
            Inline::Text("a ".into()),
            Inline::Styled {
                kind: StyledKind::Bold,
                content: vec![
                    Inline::Text("b ".into()),
                    Inline::Styled {
                        kind: StyledKind::Italic,
                        content: vec![Inline::Text("c".into())],
                    },
                    Inline::Text(" b".into()),
                ],
            },
            Inline::Text(" a".into()),
        ];
        assert_eq!(Inline::flatten_text(&tree), "a b c b a");
    }

    #[test]
    fn set_brief_replaces_existing_brief_once() {
        let mut doc = Javadoc::default();
        doc.set_brief("first");
        doc.set_brief("second");
        assert_eq!(doc.blocks.iter().filter(|b| matches!(b, Block::Brief(_))).count(), 1);
        assert_eq!(Inline::flatten_text(doc.brief().unwrap()), "second");
    }
}
