//! Sort finalizer — finalizer pass E.
//!
//! Orders members within each scope by kind (canonical priority), then
//! source location, then short name, with a stable tie-break on symbol
//! id. Enum constants preserve declaration order and are excluded.

use crate::store::FinalizedStore;
use crate::symbol::{Symbol, SymbolId, SymbolKind};

/// Canonical kind priority (lower sorts first). Mirrors the legible-name
/// allocator's reserved-placeholder ordering so the two
/// passes agree on "kind order" without duplicating a second table.
fn kind_priority(kind: &SymbolKind) -> u8 {
    match kind {
        SymbolKind::Namespace(_) => 0,
        SymbolKind::Record(_) => 1,
        SymbolKind::Function(_) => 2,
        SymbolKind::Overloads(_) => 3,
        SymbolKind::Enum(_) => 4,
        SymbolKind::EnumConstant(_) => 5,
        SymbolKind::Typedef(_) => 6,
        SymbolKind::Variable(_) => 7,
        SymbolKind::Field(_) => 8,
        SymbolKind::Friend(_) => 9,
        SymbolKind::Guide(_) => 10,
        SymbolKind::NamespaceAlias(_) => 11,
        SymbolKind::Using(_) => 12,
        SymbolKind::Concept(_) => 13,
        SymbolKind::Specialization(_) => 14,
    }
}

fn sort_key(symbol: &Symbol) -> (u8, Option<(String, u32)>, String, SymbolId) {
    let loc = symbol
        .definition
        .as_ref()
        .or_else(|| symbol.declarations.first())
        .map(|l| (l.file.clone(), l.line));
    (kind_priority(&symbol.kind), loc, symbol.name.clone(), symbol.id)
}

fn sort_ids(store: &FinalizedStore, ids: &mut Vec<SymbolId>) {
    ids.sort_by_cached_key(|id| {
        store
            .find(*id)
            .map(sort_key)
            .unwrap_or((u8::MAX, None, String::new(), *id))
    });
}

/// Run pass E over every scope-capable symbol. Enum
/// constants are left in declaration order and are explicitly excluded
/// from this sort.
pub fn run(store: &mut FinalizedStore) {
    let scope_ids: Vec<SymbolId> = store
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Namespace(_) | SymbolKind::Record(_)))
        .map(|s| s.id)
        .collect();

    for id in scope_ids {
        match store.find(id).map(|s| s.kind.clone()) {
            Some(SymbolKind::Namespace(ns)) => {
                let mut members = ns.members;
                sort_ids(store, &mut members);
                if let Some(s) = store.find_mut(id) {
                    if let SymbolKind::Namespace(n) = &mut s.kind {
                        n.members = members;
                    }
                }
            }
            Some(SymbolKind::Record(r)) => {
                let mut pub_m = r.public_members;
                let mut prot_m = r.protected_members;
                let mut priv_m = r.private_members;
                sort_ids(store, &mut pub_m);
                sort_ids(store, &mut prot_m);
                sort_ids(store, &mut priv_m);
                if let Some(s) = store.find_mut(id) {
                    if let SymbolKind::Record(rec) = &mut s.kind {
                        rec.public_members = pub_m;
                        rec.protected_members = prot_m;
                        rec.private_members = priv_m;
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::*;
    use crate::types::{FundamentalType, Type};

    fn make_var(id: SymbolId, name: &str, parent: SymbolId) -> Symbol {
        Symbol::new(
            id,
            name,
            SymbolKind::Variable(VariableSymbol {
                ty: Type::named_fundamental("int", FundamentalType::Int),
                template: None,
                storage: StorageClass::None,
            }),
        )
        .with_parent(parent)
    }

    #[test]
    fn members_sort_by_name_when_kind_and_location_tie() {
        let ns_id = SymbolId::from_usr("ns");
        let b_id = SymbolId::from_usr("ns::b");
        let a_id = SymbolId::from_usr("ns::a");
        let ns = Symbol::new(
            ns_id,
            "ns",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![b_id, a_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_var(b_id, "b", ns_id)).unwrap();
        store.ingest(make_var(a_id, "a", ns_id)).unwrap();
        let mut finalized = store.finalize();
        run(&mut finalized);
        let ns = finalized.find(ns_id).unwrap();
        match &ns.kind {
            SymbolKind::Namespace(n) => assert_eq!(n.members, vec![a_id, b_id]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn enum_constants_are_untouched_by_the_scope_sort() {
        // Enums are not namespaces/records so `run` skips them entirely;
        // their constants stay in declaration order by construction.
        let enum_id = SymbolId::from_usr("E");
        let c1 = SymbolId::from_usr("E::Z");
        let c2 = SymbolId::from_usr("E::A");
        let e = Symbol::new(
            enum_id,
            "E",
            SymbolKind::Enum(EnumSymbol {
                underlying: None,
                is_scoped: false,
                constants: vec![c1, c2],
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(e).unwrap();
        let mut finalized = store.finalize();
        run(&mut finalized);
        let e = finalized.find(enum_id).unwrap();
        match &e.kind {
            SymbolKind::Enum(en) => assert_eq!(en.constants, vec![c1, c2]),
            _ => unreachable!(),
        }
    }
}
