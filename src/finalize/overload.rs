//! Overload grouper — finalizer pass C.
//!
//! Partitions member functions of every scope by `(short name, operator
//! kind)`; groups of size ≥ 2 are replaced in the scope's member list by
//! a synthetic `Overloads` symbol. The synthetic id is derived
//! deterministically (`SymbolId::derive`) so re-running the pass is a
//! no-op.

use crate::id::SymbolId;
use crate::store::FinalizedStore;
use crate::symbol::{Access, FunctionSymbol, OverloadsSymbol, Symbol, SymbolKind};
use std::collections::BTreeMap;

fn group_key(name: &str, f: &FunctionSymbol) -> String {
    format!("{}\0{:?}", name, f.operator)
}

/// Functions already parented to an `Overloads` symbol are recognized
/// as already-grouped and left untouched on a second run, making the
/// pass idempotent.
fn run_on_member_list(store: &mut FinalizedStore, scope_id: SymbolId, access: Option<Access>) {
    let Some(symbol) = store.find(scope_id) else { return };
    let member_ids: Vec<SymbolId> = match (&symbol.kind, access) {
        (SymbolKind::Record(r), Some(a)) => r.members_of(a).to_vec(),
        (SymbolKind::Namespace(ns), None) => ns.members.clone(),
        _ => return,
    };

    // Group candidate function ids by (name, operator), preserving
    // first-occurrence order within each group.
    let mut groups: BTreeMap<String, Vec<SymbolId>> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut non_functions: Vec<SymbolId> = Vec::new();
    for id in &member_ids {
        let Some(member) = store.find(*id) else {
            non_functions.push(*id);
            continue;
        };
        match &member.kind {
            SymbolKind::Function(f) if f.overload_set.is_none() => {
                let key = group_key(&member.name, f);
                if !groups.contains_key(&key) {
                    order.push(key.clone());
                }
                groups.entry(key).or_default().push(*id);
            }
            _ => non_functions.push(*id),
        }
    }

    let mut new_member_list: Vec<SymbolId> = Vec::new();
    // Rebuild preserving original relative order: walk member_ids once
    // more, emitting each function group's overloads-id the first time
    // one of its members is seen, and skipping subsequent members of an
    // already-emitted group.
    let mut emitted: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut key_of: BTreeMap<SymbolId, String> = BTreeMap::new();
    for (key, ids) in &groups {
        for id in ids {
            key_of.insert(*id, key.clone());
        }
    }

    for id in &member_ids {
        if let Some(key) = key_of.get(id) {
            let group = &groups[key];
            if group.len() < 2 {
                new_member_list.push(*id);
                continue;
            }
            if emitted.contains(key) {
                continue;
            }
            emitted.insert(key.clone());
            let first = store.find(group[0]).unwrap();
            let (name, operator, class) = match &first.kind {
                SymbolKind::Function(f) => (first.name.clone(), f.operator, f.class),
                _ => unreachable!(),
            };
            let overloads_id = SymbolId::derive(scope_id, &format!("{name}\0{operator:?}"));
            for fid in group {
                if let Some(f) = store.find_mut(*fid) {
                    if let SymbolKind::Function(func) = &mut f.kind {
                        func.overload_set = Some(overloads_id);
                    }
                }
            }
            let overloads_symbol = Symbol::new(
                overloads_id,
                name,
                SymbolKind::Overloads(OverloadsSymbol {
                    functions: group.clone(),
                    operator,
                    class,
                }),
            )
            .with_parent(scope_id)
            .with_access(first.access);
            store.insert_synthetic(overloads_symbol);
            new_member_list.push(overloads_id);
        } else {
            new_member_list.push(*id);
        }
    }

    if let Some(symbol) = store.find_mut(scope_id) {
        match (&mut symbol.kind, access) {
            (SymbolKind::Record(r), Some(a)) => *r.members_of_mut(a) = new_member_list,
            (SymbolKind::Namespace(ns), None) => ns.members = new_member_list,
            _ => {}
        }
    }
}

/// Run pass C over every scope-capable symbol.
pub fn run(store: &mut FinalizedStore) {
    let scopes: Vec<(SymbolId, bool)> = store
        .iter()
        .filter_map(|s| match &s.kind {
            SymbolKind::Namespace(_) => Some((s.id, false)),
            SymbolKind::Record(_) => Some((s.id, true)),
            _ => None,
        })
        .collect();

    for (id, is_record) in scopes {
        if is_record {
            for access in [Access::Public, Access::Protected, Access::Private] {
                run_on_member_list(store, id, Some(access));
            }
        } else {
            run_on_member_list(store, id, None);
        }
    }
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

    fn scenario_store() -> (FinalizedStore, SymbolId) {
        let ns_id = SymbolId::from_usr("n");
        let f_int = SymbolId::from_usr("n::f(int)");
        let f_double = SymbolId::from_usr("n::f(double)");
        let ns = Symbol::new(
            ns_id,
            "n",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![f_int, f_double],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_fn(f_int, "f", ns_id)).unwrap();
        store.ingest(make_fn(f_double, "f", ns_id)).unwrap();
        (store.finalize(), ns_id)
    }

    #[test]
    fn two_functions_same_name_create_one_overloads_symbol() {
        let (mut store, ns_id) = scenario_store();
        run(&mut store);
        let ns = store.find(ns_id).unwrap();
        let members = match &ns.kind {
            SymbolKind::Namespace(n) => &n.members,
            _ => unreachable!(),
        };
        assert_eq!(members.len(), 1);
        let overloads = store.find(members[0]).unwrap();
        match &overloads.kind {
            SymbolKind::Overloads(o) => assert_eq!(o.functions.len(), 2),
            _ => panic!("expected Overloads"),
        }
    }

    #[test]
    fn pass_c_twice_is_noop() {
        let (mut store, ns_id) = scenario_store();
        run(&mut store);
        let after_first: Vec<SymbolId> = store.ids().collect();
        run(&mut store);
        let after_second: Vec<SymbolId> = store.ids().collect();
        assert_eq!(after_first, after_second);
        let ns = store.find(ns_id).unwrap();
        match &ns.kind {
            SymbolKind::Namespace(n) => assert_eq!(n.members.len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn single_function_is_not_grouped() {
        let ns_id = SymbolId::from_usr("n2");
        let f = SymbolId::from_usr("n2::f()");
        let ns = Symbol::new(
            ns_id,
            "n2",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![f],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_fn(f, "f", ns_id)).unwrap();
        let mut finalized = store.finalize();
        run(&mut finalized);
        let ns = finalized.find(ns_id).unwrap();
        match &ns.kind {
            SymbolKind::Namespace(n) => assert_eq!(n.members, vec![f]),
            _ => unreachable!(),
        }
    }
}
