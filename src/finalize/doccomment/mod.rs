//! Doc-comment finalizer — finalizer pass D.
//!
//! Runs, in order: inline markup parsing (re-tokenize every raw text
//! leaf), copy-directive resolution (`@copydoc`/`@copybrief`/
//! `@copydetails`), special-function autosynthesis, then structural
//! validation. Each stage assumes the previous has completed for every
//! symbol, same as the outer A→B→C→D→E ordering.

pub mod copydoc;
pub mod inline;
pub mod synth;

use crate::config::Config;
use crate::doc::{Block, Inline, Javadoc, Paragraph};
use crate::store::FinalizedStore;
use crate::symbol::SymbolKind;
use std::collections::HashSet;

fn reparse_node(node: Inline) -> Vec<Inline> {
    match node {
        Inline::Text(s) => inline::parse_inline(&s),
        Inline::Styled { kind, content } => vec![Inline::Styled {
            kind,
            content: reparse_list(content),
        }],
        Inline::Link { href, text } => vec![Inline::Link {
            href,
            text: reparse_list(text),
        }],
        Inline::CopyDetails { target, text } => vec![Inline::CopyDetails {
            target,
            text: reparse_list(text),
        }],
        other => vec![other],
    }
}

fn reparse_list(nodes: Vec<Inline>) -> Vec<Inline> {
    nodes.into_iter().flat_map(reparse_node).collect()
}

fn reparse_paragraph(p: &mut Paragraph) {
    let old = std::mem::take(p);
    *p = reparse_list(old);
}

fn reparse_javadoc(doc: &mut Javadoc) {
    for block in &mut doc.blocks {
        match block {
            Block::List { items, .. } => {
                for item in items {
                    reparse_paragraph(item);
                }
            }
            Block::Code(_) => {}
            _ => {
                if let Some(p) = block.paragraph_mut() {
                    reparse_paragraph(p);
                }
            }
        }
    }
}

/// Stage 2: re-tokenize every raw text leaf into structured inline
/// markup.
fn run_inline_parsing(store: &mut FinalizedStore) {
    let ids: Vec<_> = store.ids().collect();
    for id in ids {
        if let Some(symbol) = store.find_mut(id) {
            if let Some(doc) = symbol.doc.as_mut() {
                reparse_javadoc(doc);
            }
        }
    }
}

/// Stage 3: synthesize missing brief/returns/param docs for functions.
fn run_synthesis(store: &mut FinalizedStore) -> Vec<String> {
    let fn_ids: Vec<_> = store
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Function(_)))
        .map(|s| s.id)
        .collect();

    let mut updates = Vec::new();
    for id in &fn_ids {
        let Some(symbol) = store.find(*id) else { continue };
        let SymbolKind::Function(func) = &symbol.kind else { continue };
        let mut doc = symbol.doc.clone().unwrap_or_default();
        if synth::apply(func, *id, &mut doc, store) {
            updates.push((*id, doc));
        }
    }
    for (id, doc) in updates {
        if let Some(symbol) = store.find_mut(id) {
            symbol.doc = Some(doc);
        }
    }
    Vec::new()
}

/// Stage 4: warn on duplicate `@param`/`@tparam` and `@param` for an
/// unknown parameter name.
fn run_validation(store: &FinalizedStore, config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    for symbol in store.iter() {
        let Some(doc) = &symbol.doc else { continue };

        let mut seen_params = HashSet::new();
        let mut seen_tparams = HashSet::new();
        for block in &doc.blocks {
            match block {
                Block::Param { name, .. } => {
                    if !seen_params.insert(name.clone()) {
                        warnings.push(format!("duplicate @param '{name}' on {}", symbol.id.to_hex()));
                    }
                }
                Block::TParam { name, .. } => {
                    if !seen_tparams.insert(name.clone()) {
                        warnings.push(format!("duplicate @tparam '{name}' on {}", symbol.id.to_hex()));
                    }
                }
                _ => {}
            }
        }

        if let SymbolKind::Function(func) = &symbol.kind {
            let known_names: HashSet<&str> = func.params.iter().filter_map(|p| p.name.as_deref()).collect();
            for name in &seen_params {
                if !known_names.contains(name.as_str()) {
                    warnings.push(format!(
                        "@param '{name}' on {} does not name a parameter of the function",
                        symbol.id.to_hex()
                    ));
                }
            }
        }

        if config.warn_if_undocumented && doc.is_empty() {
            warnings.push(format!("symbol {} has an empty doc comment", symbol.id.to_hex()));
        }
    }
    warnings
}

/// Run pass D in full: inline parsing, copy-directive resolution,
/// autosynthesis, validation. Returns accumulated warnings.
pub fn run(store: &mut FinalizedStore, config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    run_inline_parsing(store);
    warnings.extend(copydoc::run(store));
    warnings.extend(run_synthesis(store));
    warnings.extend(run_validation(store, config));

    warnings
}
