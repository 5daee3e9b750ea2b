//! `@copydoc`/`@copybrief`/`@copydetails` resolution — part of the
//! doc-comment finalizer, pass D.
//!
//! Extraction represents each copy directive as a single `CopyDetails`
//! inline node occupying the entirety of a `Brief` block (for
//! `@copydoc`/`@copybrief`) and/or a `Details` block (for
//! `@copydoc`/`@copydetails`). Resolving one walks to the target symbol
//! first (recursively resolving its own copy directives so a chain of
//! copies fully flattens), memoizing per symbol and tracking a
//! "currently being resolved" set so a cycle breaks instead of looping
//! forever.

use crate::doc::{Block, Inline, Javadoc};
use crate::finalize::reference::resolve_textual;
use crate::id::SymbolId;
use crate::store::FinalizedStore;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy)]
enum CopyPart {
    Brief,
    Details,
}

fn directive(block: &Block) -> Option<(CopyPart, &str)> {
    match block {
        Block::Brief(p) if p.len() == 1 => match &p[0] {
            Inline::CopyDetails { target, .. } => Some((CopyPart::Brief, target.as_str())),
            _ => None,
        },
        Block::Details(p) if p.len() == 1 => match &p[0] {
            Inline::CopyDetails { target, .. } => Some((CopyPart::Details, target.as_str())),
            _ => None,
        },
        _ => None,
    }
}

struct Resolver<'a> {
    store: &'a FinalizedStore,
    cache: HashMap<SymbolId, Javadoc>,
    resolving: HashSet<SymbolId>,
    warnings: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, id: SymbolId) -> Javadoc {
        if let Some(doc) = self.cache.get(&id) {
            return doc.clone();
        }
        if self.resolving.contains(&id) {
            self.warnings.push(format!(
                "copydoc cycle detected and broken while resolving {}",
                id.to_hex()
            ));
            return Javadoc::default();
        }
        let Some(original) = self.store.find(id).and_then(|s| s.doc.clone()) else {
            return Javadoc::default();
        };

        self.resolving.insert(id);
        let mut new_blocks = Vec::with_capacity(original.blocks.len());
        for block in &original.blocks {
            match directive(block) {
                Some((part, target_text)) => {
                    let resolved_target = resolve_textual(self.store, id, target_text);
                    match resolved_target {
                        Some(target_id) if target_id != id => {
                            let target_doc = self.resolve(target_id);
                            match part {
                                CopyPart::Brief => {
                                    if let Some(brief) = target_doc.brief() {
                                        new_blocks.push(Block::Brief(brief.clone()));
                                    }
                                }
                                CopyPart::Details => {
                                    new_blocks.extend(
                                        target_doc
                                            .blocks
                                            .iter()
                                            .filter(|b| !matches!(b, Block::Brief(_)))
                                            .cloned(),
                                    );
                                }
                            }
                        }
                        Some(_) => {
                            self.warnings.push(format!(
                                "copydoc self-reference rejected on {}: '{}'",
                                id.to_hex(),
                                target_text
                            ));
                            new_blocks.push(block.clone());
                        }
                        None => {
                            self.warnings.push(format!(
                                "copydoc target not found for {}: '{}'",
                                id.to_hex(),
                                target_text
                            ));
                            new_blocks.push(block.clone());
                        }
                    }
                }
                None => new_blocks.push(block.clone()),
            }
        }
        self.resolving.remove(&id);

        let resolved = Javadoc {
            blocks: new_blocks,
            related: original.related,
        };
        self.cache.insert(id, resolved.clone());
        resolved
    }
}

/// Resolve all copy directives in the store; returns accumulated
/// warnings (self-references, dangling targets, broken cycles).
pub fn run(store: &mut FinalizedStore) -> Vec<String> {
    let ids: Vec<SymbolId> = store.ids().collect();
    let mut warnings = Vec::new();
    let resolved: Vec<(SymbolId, Option<Javadoc>)> = {
        let mut resolver = Resolver {
            store,
            cache: HashMap::new(),
            resolving: HashSet::new(),
            warnings: Vec::new(),
        };
        let out = ids
            .iter()
            .map(|id| {
                let has_doc = resolver.store.find(*id).map(|s| s.doc.is_some()).unwrap_or(false);
                if has_doc {
                    (*id, Some(resolver.resolve(*id)))
                } else {
                    (*id, None)
                }
            })
            .collect();
        warnings.extend(resolver.warnings);
        out
    };

    for (id, doc) in resolved {
        if let Some(doc) = doc {
            if let Some(symbol) = store.find_mut(id) {
                symbol.doc = Some(doc);
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::*;
    use crate::types::{FundamentalType, Type};

    fn make_fn(id: SymbolId, name: &str, parent: SymbolId) -> Symbol {
        Symbol::new(
            id,
            name,
            SymbolKind::Function(FunctionSymbol {
                ret: Type::named_fundamental("void", FundamentalType::Void),
                params: vec![],
                template: None,
                class: crate::operator::FunctionClass::Normal,
                operator: crate::operator::OperatorKind::None,
                is_const: false,
                is_volatile: false,
                ref_qualifier: RefQualifier::None,
                noexcept: NoexceptInfo::default(),
                explicit: ExplicitKind::None,
                storage: StorageClass::None,
                constexpr_kind: ConstexprKind::None,
                flags: FunctionFlags::default(),
                overload_set: None,
            }),
        )
        .with_parent(parent)
    }

    fn copydoc_brief(target: &str) -> Javadoc {
        Javadoc {
            blocks: vec![Block::Brief(vec![Inline::CopyDetails {
                target: target.to_string(),
                text: vec![],
            }])],
            related: vec![],
        }
    }

    #[test]
    fn copydoc_copies_brief_from_target() {
        let ns_id = SymbolId::from_usr("ns");
        let t_id = SymbolId::from_usr("ns::T");
        let s_id = SymbolId::from_usr("ns::S");
        let ns = Symbol::new(
            ns_id,
            "ns",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![t_id, s_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let mut t = make_fn(t_id, "T", ns_id);
        t.doc = Some(Javadoc {
            blocks: vec![Block::Brief(vec![Inline::Text("A thing".into())])],
            related: vec![],
        });
        let mut s = make_fn(s_id, "S", ns_id);
        s.doc = Some(copydoc_brief("T"));

        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(t).unwrap();
        store.ingest(s).unwrap();
        let mut finalized = store.finalize();

        let warnings = run(&mut finalized);
        assert!(warnings.is_empty());
        let s = finalized.find(s_id).unwrap();
        assert_eq!(Inline::flatten_text(s.doc.as_ref().unwrap().brief().unwrap()), "A thing");
    }

    #[test]
    fn mutual_reference_terminates() {
        let ns_id = SymbolId::from_usr("ns2");
        let a_id = SymbolId::from_usr("ns2::A");
        let b_id = SymbolId::from_usr("ns2::B");
        let ns = Symbol::new(
            ns_id,
            "ns2",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![a_id, b_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let mut a = make_fn(a_id, "A", ns_id);
        a.doc = Some(copydoc_brief("B"));
        let mut b = make_fn(b_id, "B", ns_id);
        b.doc = Some(copydoc_brief("A"));

        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(a).unwrap();
        store.ingest(b).unwrap();
        let mut finalized = store.finalize();

        // Must return promptly (no infinite loop) and report the cycle.
        let warnings = run(&mut finalized);
        assert!(warnings.iter().any(|w| w.contains("cycle")));
    }

    #[test]
    fn details_copy_splices_non_brief_blocks() {
        let ns_id = SymbolId::from_usr("ns3");
        let t_id = SymbolId::from_usr("ns3::T");
        let s_id = SymbolId::from_usr("ns3::S");
        let ns = Symbol::new(
            ns_id,
            "ns3",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![t_id, s_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let mut t = make_fn(t_id, "T", ns_id);
        t.doc = Some(Javadoc {
            blocks: vec![
                Block::Brief(vec![Inline::Text("brief".into())]),
                Block::Details(vec![Inline::Text("long description".into())]),
            ],
            related: vec![],
        });
        let mut s = make_fn(s_id, "S", ns_id);
        s.doc = Some(Javadoc {
            blocks: vec![Block::Details(vec![Inline::CopyDetails {
                target: "T".into(),
                text: vec![],
            }])],
            related: vec![],
        });

        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(t).unwrap();
        store.ingest(s).unwrap();
        let mut finalized = store.finalize();

        run(&mut finalized);
        let s = finalized.find(s_id).unwrap();
        let doc = s.doc.as_ref().unwrap();
        assert!(doc.blocks.iter().any(
            |b| matches!(b, Block::Details(p) if Inline::flatten_text(p) == "long description")
        ));
    }
}
