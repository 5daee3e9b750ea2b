//! Inheritance finalizer — finalizer pass B.
//!
//! Injects inherited members from each `Record`'s base classes into
//! that record's member list, per the configured `InheritPolicy`.
//! Traverses the base-class DAG with three-color (white/grey/black)
//! cycle detection; a detected cycle is reported and broken by skipping the back-edge,
//! rather than aborting the whole pass.

use crate::config::{Diagnostics, InheritPolicy};
use crate::id::SymbolId;
use crate::store::FinalizedStore;
use crate::symbol::{Access, SymbolKind};
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Run pass B; returns the list of cycles detected (each a chain of
/// symbol ids), already broken in the store.
pub fn run(store: &mut FinalizedStore, policy: InheritPolicy, diagnostics: &dyn Diagnostics) -> Vec<Vec<SymbolId>> {
    if policy == InheritPolicy::Never {
        return Vec::new();
    }

    let record_ids: Vec<SymbolId> = store
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Record(_)))
        .map(|s| s.id)
        .collect();

    let mut colors: HashMap<SymbolId, Color> = record_ids.iter().map(|id| (*id, Color::White)).collect();
    let mut cycles = Vec::new();

    // Topological order via DFS postorder so a base is fully finalized
    // (its own inherited members already injected) before a derived
    // class processes it.
    let mut order = Vec::new();
    for id in &record_ids {
        dfs(store, *id, &mut colors, &mut order, &mut Vec::new(), &mut cycles, diagnostics);
    }

    for id in order {
        inject_inherited_members(store, id, policy);
    }

    cycles
}

fn dfs(
    store: &FinalizedStore,
    id: SymbolId,
    colors: &mut HashMap<SymbolId, Color>,
    order: &mut Vec<SymbolId>,
    path: &mut Vec<SymbolId>,
    cycles: &mut Vec<Vec<SymbolId>>,
    diagnostics: &dyn Diagnostics,
) {
    match colors.get(&id) {
        Some(Color::Black) | None => return,
        Some(Color::Grey) => {
            let start = path.iter().position(|x| *x == id).unwrap_or(0);
            let cycle: Vec<SymbolId> = path[start..].iter().copied().chain(std::iter::once(id)).collect();
            diagnostics.warn(&format!(
                "inheritance cycle detected and broken: {}",
                cycle.iter().map(|c| c.to_hex()).collect::<Vec<_>>().join(" -> ")
            ));
            cycles.push(cycle);
            return;
        }
        Some(Color::White) => {}
    }

    colors.insert(id, Color::Grey);
    path.push(id);

    let base_ids: Vec<SymbolId> = match store.find(id).map(|s| &s.kind) {
        Some(SymbolKind::Record(r)) => r
            .bases
            .iter()
            .filter_map(|b| b.ty.named_name().and_then(|n| n.resolved()))
            .collect(),
        _ => Vec::new(),
    };

    for base in base_ids {
        if colors.contains_key(&base) {
            dfs(store, base, colors, order, path, cycles, diagnostics);
        }
    }

    path.pop();
    colors.insert(id, Color::Black);
    order.push(id);
}

/// Inject members of each base of `id` into `id`'s member list, with
/// effective access `min(member_access, base_access)`.
/// Private members are not inherited; members shadowed by a same-name
/// declaration in the derived class are not re-inherited. Under
/// `InheritPolicy::NonEmpty`, a base flagged as an empty base (no
/// non-static data members of its own) is skipped entirely rather than
/// contributing its members, distinguishing it from `Always`.
fn inject_inherited_members(store: &mut FinalizedStore, id: SymbolId, policy: InheritPolicy) {
    let Some(symbol) = store.find(id) else { return };
    let SymbolKind::Record(record) = &symbol.kind else { return };
    let bases = record.bases.clone();
    let own_names: std::collections::HashSet<String> = record
        .all_members()
        .filter_map(|m| store.find(*m).map(|s| s.name.clone()))
        .collect();

    let mut to_add: Vec<(SymbolId, Access)> = Vec::new();
    for base in &bases {
        let Some(base_id) = base.ty.named_name().and_then(|n| n.resolved()) else { continue };
        let Some(base_symbol) = store.find(base_id) else { continue };
        let SymbolKind::Record(base_record) = &base_symbol.kind else { continue };

        // `NonEmpty` skips empty-base-optimization candidates entirely:
        // a base with no non-static data members (a tag/mixin/policy
        // base) contributes nothing worth duplicating into the derived
        // class's own member list. `Always` injects regardless.
        if policy == InheritPolicy::NonEmpty && base_record.flags.is_empty {
            continue;
        }

        for (member_access, members) in [
            (Access::Public, &base_record.public_members),
            (Access::Protected, &base_record.protected_members),
        ] {
            if member_access == Access::Private {
                continue;
            }
            let effective = member_access.combine(base.access);
            if effective == Access::Private {
                continue;
            }
            for member_id in members {
                let Some(member) = store.find(*member_id) else { continue };
                if own_names.contains(&member.name) {
                    continue; // shadowed by a derived declaration
                }
                to_add.push((*member_id, effective));
            }
        }
    }

    if to_add.is_empty() {
        return;
    }
    if let Some(symbol) = store.find_mut(id) {
        if let SymbolKind::Record(record) = &mut symbol.kind {
            for (member_id, access) in to_add {
                let list = record.members_of_mut(access);
                if !list.contains(&member_id) {
                    list.push(member_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TracingDiagnostics;
    use crate::names::Name;
    use crate::symbol::*;
    use crate::types::Type;

    fn make_base_and_derived() -> (FinalizedStore, SymbolId, SymbolId, SymbolId) {
        let base_id = SymbolId::from_usr("B");
        let derived_id = SymbolId::from_usr("D");
        let m_id = SymbolId::from_usr("B::m");

        let m = Symbol::new(
            m_id,
            "m",
            SymbolKind::Variable(VariableSymbol {
                ty: Type::named_fundamental("int", crate::types::FundamentalType::Int),
                template: None,
                storage: StorageClass::None,
            }),
        )
        .with_parent(base_id)
        .with_access(Access::Public);

        let base = Symbol::new(
            base_id,
            "B",
            SymbolKind::Record(RecordSymbol {
                key_kind: RecordKeyKind::Struct,
                is_type_def: false,
                bases: vec![],
                friends: vec![],
                public_members: vec![m_id],
                protected_members: vec![],
                private_members: vec![],
                specializations: vec![],
                template: None,
                flags: RecordFlags::default(),
            }),
        );

        let derived = Symbol::new(
            derived_id,
            "D",
            SymbolKind::Record(RecordSymbol {
                key_kind: RecordKeyKind::Struct,
                is_type_def: false,
                bases: vec![BaseInfo {
                    ty: Type::named(Name::simple("B").with_symbol(base_id)),
                    access: Access::Public,
                    is_virtual: false,
                }],
                friends: vec![],
                public_members: vec![],
                protected_members: vec![],
                private_members: vec![],
                specializations: vec![],
                template: None,
                flags: RecordFlags::default(),
            }),
        );

        let store = crate::store::SymbolStore::new();
        store.ingest(base).unwrap();
        store.ingest(derived).unwrap();
        store.ingest(m).unwrap();
        (store.finalize(), base_id, derived_id, m_id)
    }

    #[test]
    fn always_policy_inherits_public_member() {
        let (mut store, _base_id, derived_id, m_id) = make_base_and_derived();
        let diag = TracingDiagnostics;
        run(&mut store, InheritPolicy::Always, &diag);
        let d = store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => assert!(r.public_members.contains(&m_id)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn never_policy_injects_nothing() {
        let (mut store, _base_id, derived_id, m_id) = make_base_and_derived();
        let diag = TracingDiagnostics;
        run(&mut store, InheritPolicy::Never, &diag);
        let d = store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => assert!(!r.public_members.contains(&m_id)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn non_empty_policy_inherits_from_non_empty_base() {
        let (mut store, _base_id, derived_id, m_id) = make_base_and_derived();
        let diag = TracingDiagnostics;
        run(&mut store, InheritPolicy::NonEmpty, &diag);
        let d = store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => assert!(r.public_members.contains(&m_id)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn non_empty_policy_skips_empty_base_but_always_does_not() {
        let (mut store, base_id, derived_id, m_id) = make_base_and_derived();
        if let Some(b) = store.find_mut(base_id) {
            if let SymbolKind::Record(r) = &mut b.kind {
                r.flags.is_empty = true;
            }
        }
        let diag = TracingDiagnostics;

        let mut non_empty_store = store.clone();
        run(&mut non_empty_store, InheritPolicy::NonEmpty, &diag);
        let d = non_empty_store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => assert!(!r.public_members.contains(&m_id)),
            _ => unreachable!(),
        }

        run(&mut store, InheritPolicy::Always, &diag);
        let d = store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => assert!(r.public_members.contains(&m_id)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn shadowed_member_is_not_reinherited() {
        let (mut store, base_id, derived_id, m_id) = make_base_and_derived();
        let shadow_id = SymbolId::from_usr("D::m");
        let shadow = Symbol::new(
            shadow_id,
            "m",
            SymbolKind::Variable(VariableSymbol {
                ty: Type::named_fundamental("double", crate::types::FundamentalType::Double),
                template: None,
                storage: StorageClass::None,
            }),
        )
        .with_parent(derived_id)
        .with_access(Access::Public);
        store.insert_synthetic(shadow);
        if let Some(d) = store.find_mut(derived_id) {
            if let SymbolKind::Record(r) = &mut d.kind {
                r.public_members.push(shadow_id);
            }
        }
        let diag = TracingDiagnostics;
        run(&mut store, InheritPolicy::Always, &diag);
        let d = store.find(derived_id).unwrap();
        match &d.kind {
            SymbolKind::Record(r) => {
                assert!(!r.public_members.contains(&m_id));
                assert!(r.public_members.contains(&shadow_id));
            }
            _ => unreachable!(),
        }
        let _ = base_id;
    }

    #[test]
    fn cycle_is_detected_and_broken() {
        let a_id = SymbolId::from_usr("A");
        let b_id = SymbolId::from_usr("B2");
        let a = Symbol::new(
            a_id,
            "A",
            SymbolKind::Record(RecordSymbol {
                key_kind: RecordKeyKind::Struct,
                is_type_def: false,
                bases: vec![BaseInfo {
                    ty: Type::named(Name::simple("B2").with_symbol(b_id)),
                    access: Access::Public,
                    is_virtual: false,
                }],
                friends: vec![],
                public_members: vec![],
                protected_members: vec![],
                private_members: vec![],
                specializations: vec![],
                template: None,
                flags: RecordFlags::default(),
            }),
        );
        let b = Symbol::new(
            b_id,
            "B2",
            SymbolKind::Record(RecordSymbol {
                key_kind: RecordKeyKind::Struct,
                is_type_def: false,
                bases: vec![BaseInfo {
                    ty: Type::named(Name::simple("A").with_symbol(a_id)),
                    access: Access::Public,
                    is_virtual: false,
                }],
                friends: vec![],
                public_members: vec![],
                protected_members: vec![],
                private_members: vec![],
                specializations: vec![],
                template: None,
                flags: RecordFlags::default(),
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(a).unwrap();
        store.ingest(b).unwrap();
        let mut finalized = store.finalize();
        let diag = TracingDiagnostics;
        let cycles = run(&mut finalized, InheritPolicy::Always, &diag);
        assert_eq!(cycles.len(), 1);
    }
}
