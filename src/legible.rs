//! Legible-name allocator.
//!
//! Grounded verbatim on `original_source/src/lib/Support/LegibleNames.cpp`:
//! `getRawUnqualified`/`getUnnamedInfoName` choose a reserved placeholder
//! for unnamed or ambiguous-kind symbols, `buildLegibleMember` computes
//! the per-scope disambiguation-suffix length via the first mismatched
//! hex character between same-named sibling ids, and
//! `getLegibleQualified` joins ancestor legible names with a
//! configurable delimiter.

use crate::id::SymbolId;
use crate::operator::FunctionClass;
use crate::store::FinalizedStore;
use crate::symbol::{Symbol, SymbolKind};
use fnv::FnvHashMap;
use unicode_normalization::UnicodeNormalization;

/// Fold a symbol's raw (possibly non-ASCII) name to a filesystem-safe
/// token: NFKD-decompose, drop combining marks, and replace anything
/// outside `[A-Za-z0-9_-]` with `_`. Most C++ identifiers are already
/// plain ASCII and pass through unchanged; this only matters for the
/// handful of constructs that can carry arbitrary text, like a
/// `operator""` user-defined-literal suffix or a deduction-guide name.
fn sanitize_for_filesystem(raw: &str) -> String {
    raw.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Reserved placeholder used when a symbol has no name of its own,
/// indexed by `SymbolKind`.
fn reserved_name_for_kind(kind: &SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Namespace(_) => "00namespace",
        SymbolKind::Record(_) => "01record",
        SymbolKind::Function(_) => "02function",
        SymbolKind::Overloads(_) => "03overloads",
        SymbolKind::Enum(_) => "04enum",
        SymbolKind::EnumConstant(_) => "05enum-constant",
        SymbolKind::Typedef(_) => "06typedef",
        SymbolKind::Variable(_) => "07variable",
        SymbolKind::Field(_) => "08field",
        SymbolKind::Friend(_) => "09friend",
        SymbolKind::Guide(_) => "10guide",
        SymbolKind::NamespaceAlias(_) => "11namespace-alias",
        SymbolKind::Using(_) => "12using",
        SymbolKind::Concept(_) => "13concept",
        SymbolKind::Specialization(_) => "01record",
    }
}

/// Reserved placeholder for an unnamed/ambiguous function, by class,
/// unless it is a non-normal-class overloaded operator, in which case
/// its safe operator token is used instead (`getSafeOperatorName`).
fn reserved_function_name(class: FunctionClass, operator: crate::operator::OperatorKind) -> &'static str {
    use crate::operator::OperatorKind;
    if class == FunctionClass::Normal && operator != OperatorKind::None {
        return operator.safe_name();
    }
    match class {
        FunctionClass::Normal => "2function",
        FunctionClass::Constructor => "2constructor",
        FunctionClass::Conversion => "2conversion",
        FunctionClass::Destructor => "2destructor",
    }
}

/// The raw (pre-disambiguation) unqualified legible name for one symbol.
fn raw_unqualified(symbol: &Symbol) -> String {
    if symbol.name.is_empty() {
        return reserved_name_for_kind(&symbol.kind).to_string();
    }
    match &symbol.kind {
        SymbolKind::Function(f) if f.class != FunctionClass::Normal || f.operator != crate::operator::OperatorKind::None => {
            reserved_function_name(f.class, f.operator).to_string()
        }
        SymbolKind::Overloads(o) if o.class != FunctionClass::Normal || o.operator != crate::operator::OperatorKind::None => {
            reserved_function_name(o.class, o.operator).to_string()
        }
        SymbolKind::Friend(_) => reserved_name_for_kind(&symbol.kind).to_string(),
        _ if symbol.name.is_ascii() => symbol.name.clone(),
        _ => sanitize_for_filesystem(&symbol.name),
    }
}

#[derive(Debug, Clone)]
struct LegibleNameInfo {
    unqualified: String,
    disambig_chars: usize,
}

/// Precomputed legible names for every symbol in a finalized store.
pub struct LegibleNames {
    global_ns: String,
    delim: char,
    map: FnvHashMap<SymbolId, LegibleNameInfo>,
}

impl LegibleNames {
    /// Build legible names for every symbol reachable from the global
    /// namespace, using
    /// `global_ns` as the placeholder name for the root scope itself and
    /// `delim` to join qualified names.
    pub fn build(store: &FinalizedStore, global_ns: impl Into<String>, delim: char) -> Self {
        let mut names = LegibleNames {
            global_ns: global_ns.into(),
            delim,
            map: FnvHashMap::default(),
        };

        let roots: Vec<SymbolId> = store.iter().filter(|s| s.parent.is_none()).map(|s| s.id).collect();
        names.build_scope(store, &roots);
        for id in roots {
            names.visit(store, id);
        }

        // The global namespace itself needs zero disambiguation
        // characters.
        Self::zero_out_global(&mut names.map, store);
        names
    }

    fn zero_out_global(map: &mut FnvHashMap<SymbolId, LegibleNameInfo>, store: &FinalizedStore) {
        for s in store.iter().filter(|s| s.parent.is_none()) {
            if let SymbolKind::Namespace(_) = &s.kind {
                if let Some(info) = map.get_mut(&s.id) {
                    info.disambig_chars = 0;
                }
            }
        }
    }

    fn visit(&mut self, store: &FinalizedStore, scope_id: SymbolId) {
        let Some(scope) = store.find(scope_id) else { return };
        let members = scope.kind.member_ids();
        self.build_scope(store, &members);
        for member_id in &members {
            if let Some(member) = store.find(*member_id) {
                if let SymbolKind::Overloads(o) = &member.kind {
                    self.build_scope(store, &o.functions);
                }
            }
            self.visit(store, *member_id);
        }
    }

    /// Build legible names for one scope's direct members, tracking a
    /// same-raw-name disambiguation group local to this call.
    fn build_scope(&mut self, store: &FinalizedStore, member_ids: &[SymbolId]) {
        let mut groups: FnvHashMap<String, Vec<SymbolId>> = FnvHashMap::default();
        for id in member_ids {
            let Some(member) = store.find(*id) else { continue };
            let raw = raw_unqualified(member);
            groups.entry(raw.clone()).or_default().push(*id);
            self.map.insert(
                *id,
                LegibleNameInfo {
                    unqualified: raw,
                    disambig_chars: 0,
                },
            );
        }

        for ids in groups.values() {
            if ids.len() < 2 {
                continue;
            }
            for (i, a) in ids.iter().enumerate() {
                let mut max_required = 0usize;
                for (j, b) in ids.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    max_required = max_required.max(a.mismatch_hex_len(b));
                }
                if let Some(info) = self.map.get_mut(a) {
                    info.disambig_chars = info.disambig_chars.max(max_required);
                }
            }
        }
    }

    /// The scope-unique, filesystem-safe unqualified name.
    pub fn unqualified(&self, id: SymbolId) -> String {
        if id.is_global() {
            return self.global_ns.clone();
        }
        let Some(info) = self.map.get(&id) else {
            return self.global_ns.clone();
        };
        if info.disambig_chars == 0 {
            info.unqualified.clone()
        } else {
            let hex = id.to_hex();
            let suffix = &hex[..info.disambig_chars.min(hex.len())];
            format!("{}-0{}", info.unqualified, suffix)
        }
    }

    /// The full delimiter-joined qualified name.
    pub fn qualified(&self, store: &FinalizedStore, id: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c.is_global() {
                parts.push(self.global_ns.clone());
                break;
            }
            parts.push(self.unqualified(c));
            cur = store.find(c).and_then(|s| s.parent);
        }
        parts.reverse();
        parts.join(&self.delim.to_string())
    }
}
