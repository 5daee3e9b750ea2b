//! Symbol-lookup engine.
//!
//! Grounded on `original_source/src/lib/Lib/Lookup.{hpp,cpp}`:
//! `LookupTable` precomputes an unqualified-name multimap per
//! scope-capable symbol (recursing eagerly into transparent children so
//! their members also land in the enclosing scope's table);
//! `SymbolLookup::lookupUnqualifiedImpl`/`lookupQualifiedImpl` walk that
//! table, climbing to the parent scope on a total miss. We collapse the
//! two entry points into one recursive `resolve_components` walk and
//! build lookup tables lazily rather than eagerly for every symbol.

use crate::config::{Config, GlobPattern};
use crate::id::SymbolId;
use crate::nameparser::{parse_id_expression, Component, RefQual};
use crate::store::FinalizedStore;
use crate::symbol::{FunctionSymbol, RefQualifier, Symbol, SymbolKind};
use crate::template::TemplateArg;
use crate::types::{Type, TypeQualifiers};
use dashmap::DashMap;

/// Outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(SymbolId),
    NotFound,
}

impl LookupOutcome {
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            LookupOutcome::Found(id) => Some(*id),
            LookupOutcome::NotFound => None,
        }
    }
}

/// Descending match-level tuple; `Ord` compares
/// field-by-field in declaration order, which is exactly the candidate-
/// ranking priority order, so `Iterator::max_by_key` on this type
/// performs the ranking without a bespoke comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MatchLevel {
    template_arg_count: bool,
    template_args_match: bool,
    param_count: bool,
    param_count_and_documented: bool,
    param_types_match: bool,
    cv_ref: bool,
    noexcept: bool,
}

impl MatchLevel {
    /// Candidate kinds other than `Function` have nothing further to
    /// rank on beyond the name match already filtering them in.
    fn trivial() -> Self {
        MatchLevel {
            template_arg_count: true,
            template_args_match: true,
            param_count: true,
            param_count_and_documented: true,
            param_types_match: true,
            cv_ref: true,
            noexcept: true,
        }
    }

    fn for_function(func: &FunctionSymbol, has_doc: bool, comp: &Component, config: &Config) -> Self {
        let template_arg_count = match (&func.template, &comp.template_args) {
            (Some(t), Some(args)) => t.params.len() == args.len(),
            (_, None) => true,
            (None, Some(_)) => false,
        };
        let template_args_match = template_arg_count
            && match (&func.template, &comp.template_args) {
                (Some(t), Some(args)) => t
                    .args
                    .iter()
                    .map(render_template_arg)
                    .eq(args.iter().map(|s| s.trim().to_string())),
                _ => true,
            };

        let param_count = match &comp.params {
            Some(p) => p.len() == func.params.len(),
            None => true,
        };
        let param_count_and_documented = param_count && has_doc;

        let param_types_match = param_count
            && match &comp.params {
                Some(written) => written
                    .iter()
                    .zip(&func.params)
                    .all(|(text, p)| render_type_for_match(&p.ty, config) == text.trim()),
                None => true,
            };

        let cv_ref = func.is_const == comp.is_const
            && func.is_volatile == comp.is_volatile
            && ref_qual_eq(comp.ref_qualifier, func.ref_qualifier);

        let noexcept = match &comp.noexcept {
            None => true,
            Some(text) => {
                let declared = func.noexcept.operand.as_deref().unwrap_or("").trim();
                text.trim() == declared
            }
        };

        MatchLevel {
            template_arg_count,
            template_args_match,
            param_count,
            param_count_and_documented,
            param_types_match,
            cv_ref,
            noexcept,
        }
    }
}

fn ref_qual_eq(a: RefQual, b: RefQualifier) -> bool {
    matches!(
        (a, b),
        (RefQual::None, RefQualifier::None) | (RefQual::LValue, RefQualifier::LValue) | (RefQual::RValue, RefQualifier::RValue)
    )
}

fn render_template_arg(arg: &TemplateArg) -> String {
    match arg {
        TemplateArg::Type(t) => render_type_brief(t),
        TemplateArg::NonType { written, .. } => written.trim().to_string(),
        TemplateArg::Template(id) => id.to_hex(),
        TemplateArg::Pack(args) => args.iter().map(render_template_arg).collect::<Vec<_>>().join(", "),
    }
}

fn cv_prefix(q: &TypeQualifiers) -> &'static str {
    match (q.is_const, q.is_volatile) {
        (true, true) => "const volatile ",
        (true, false) => "const ",
        (false, true) => "volatile ",
        (false, false) => "",
    }
}

/// A rough textual rendering of a type, used only to compare against the
/// raw parameter text an id-expression carries (the name parser captures
/// parameter types as unparsed strings, not a `Type` tree).
fn render_type_brief(ty: &Type) -> String {
    match ty {
        Type::Named { name, .. } => name.identifier.clone(),
        Type::Decltype { expression, .. } => format!("decltype({expression})"),
        Type::Auto { keyword, .. } => keyword.clone(),
        Type::LValueReference { pointee, quals } => format!("{}{}&", cv_prefix(quals), render_type_brief(pointee)),
        Type::RValueReference { pointee, quals } => format!("{}{}&&", cv_prefix(quals), render_type_brief(pointee)),
        Type::Pointer { pointee, quals } => format!("{}{}*", cv_prefix(quals), render_type_brief(pointee)),
        Type::MemberPointer { pointee, .. } => render_type_brief(pointee),
        Type::Array { element, .. } => format!("{}[]", render_type_brief(element)),
        Type::Function { ret, .. } => render_type_brief(ret),
        Type::Pack { pattern, .. } => format!("{}...", render_type_brief(pattern)),
    }
}

/// SFINAE unwrap: when `ty` names one of
/// `config.sfinae_aliases` (`enable_if_t` and friends) and carries
/// template arguments, the last type argument is the real underlying
/// type and the remaining arguments are the condition, recorded into
/// `TypeQualifiers::constraints` so two overloads differing only in
/// their SFINAE condition still render distinctly.
fn sfinae_unwrap(ty: &Type, config: &Config) -> Type {
    if let Type::Named { name, .. } = ty {
        if config.sfinae_aliases.iter().any(|a| a == &name.identifier) {
            if let Some(args) = &name.template_args {
                if let Some(TemplateArg::Type(inner)) = args.last() {
                    let mut unwrapped = inner.clone();
                    let conditions: Vec<String> = args[..args.len().saturating_sub(1)].iter().map(render_template_arg).collect();
                    unwrapped.quals_mut().constraints = conditions;
                    return unwrapped;
                }
            }
        }
    }
    ty.clone()
}

fn render_type_for_match(ty: &Type, config: &Config) -> String {
    let unwrapped = sfinae_unwrap(ty, config);
    let mut rendered = render_type_brief(&unwrapped);
    if !unwrapped.quals().constraints.is_empty() {
        rendered.push_str(" where ");
        rendered.push_str(&unwrapped.quals().constraints.join(", "));
    }
    rendered
}

fn name_matches(pattern: &str, candidate: &str, has_wildcards: bool) -> bool {
    if has_wildcards && pattern.contains('*') {
        GlobPattern::new(pattern).matches(candidate)
    } else {
        pattern == candidate
    }
}

/// Symbols introduced transitively through `using` declarations, plus
/// direct members, expanded in declaration order.
fn direct_candidates(store: &FinalizedStore, scope: &Symbol) -> Vec<SymbolId> {
    let mut out = Vec::new();
    for id in scope.kind.member_ids() {
        match store.find(id).map(|s| &s.kind) {
            Some(SymbolKind::Using(u)) => out.extend(u.introduced.iter().copied()),
            _ => out.push(id),
        }
    }
    out
}

/// Redirect a typedef scope to its aliased type's resolved symbol, one
/// level only, grounded on `lookThroughTypedefs`.
fn typedef_redirect(store: &FinalizedStore, scope_id: SymbolId) -> SymbolId {
    match store.find(scope_id).map(|s| &s.kind) {
        Some(SymbolKind::Typedef(t)) => t.aliased.named_name().and_then(|n| n.resolved()).unwrap_or(scope_id),
        _ => scope_id,
    }
}

/// Symbol-lookup engine: resolves a textual name relative to a source
/// context. State is the finalized store plus a two-level cache keyed
/// `(context id) -> (name -> outcome)`.
pub struct SymbolLookup<'a> {
    store: &'a FinalizedStore,
    config: &'a Config,
    cache: DashMap<SymbolId, DashMap<String, LookupOutcome>>,
}

impl<'a> SymbolLookup<'a> {
    pub fn new(store: &'a FinalizedStore, config: &'a Config) -> Self {
        SymbolLookup {
            store,
            config,
            cache: DashMap::new(),
        }
    }

    fn cache_get(&self, scope: SymbolId, name: &str) -> Option<LookupOutcome> {
        self.cache.get(&scope)?.get(name).copied()
    }

    fn cache_put(&self, scope: SymbolId, name: &str, outcome: LookupOutcome) {
        self.cache.entry(scope).or_default().insert(name.to_string(), outcome);
    }

    /// Walk up from `context` until a scope-capable symbol is reached.
    fn nearest_scope(&self, context: SymbolId) -> SymbolId {
        let mut cur = context;
        loop {
            if cur.is_global() {
                return cur;
            }
            match self.store.find(cur) {
                Some(sym) if sym.kind.is_scope() => return cur,
                Some(sym) => match sym.parent {
                    Some(p) => cur = p,
                    None => return SymbolId::GLOBAL,
                },
                None => return SymbolId::GLOBAL,
            }
        }
    }

    fn parent_scope(&self, scope: SymbolId) -> Option<SymbolId> {
        if scope.is_global() {
            return None;
        }
        let sym = self.store.find(scope)?;
        let parent = sym.parent?;
        Some(self.nearest_scope(parent))
    }

    /// Public entry point: resolve `name` as it would be written at
    /// `context`.
    pub fn lookup(&self, context: SymbolId, name: &str) -> LookupOutcome {
        let name = name.trim();
        let mut scope = self.nearest_scope(context);
        loop {
            if let Some(cached) = self.cache_get(scope, name) {
                return cached;
            }
            let Ok(parsed) = parse_id_expression(name) else {
                self.cache_put(scope, name, LookupOutcome::NotFound);
                return LookupOutcome::NotFound;
            };
            let start = if parsed.global_qualified { SymbolId::GLOBAL } else { scope };
            if let Some(found) = self.resolve_components(start, &parsed.components, parsed.has_wildcards) {
                let outcome = LookupOutcome::Found(found);
                self.cache_put(scope, name, outcome);
                return outcome;
            }
            if parsed.global_qualified {
                self.cache_put(scope, name, LookupOutcome::NotFound);
                return LookupOutcome::NotFound;
            }
            match self.parent_scope(scope) {
                Some(p) => scope = p,
                None => {
                    self.cache_put(scope, name, LookupOutcome::NotFound);
                    return LookupOutcome::NotFound;
                }
            }
        }
    }

    /// Qualified lookup entry point: `A::B::C`, each non-terminal
    /// component must resolve to a scope.
    pub fn lookup_qualified(&self, context: SymbolId, path: &str) -> LookupOutcome {
        self.lookup(context, &format!("::{}", path.trim_start_matches("::")))
    }

    fn resolve_components(&self, mut scope: SymbolId, components: &[Component], has_wildcards: bool) -> Option<SymbolId> {
        let mut result = None;
        for (i, comp) in components.iter().enumerate() {
            let found = self.resolve_one_component(scope, comp, has_wildcards)?;
            result = Some(found);
            let is_last = i + 1 == components.len();
            if !is_last {
                let sym = self.store.find(found)?;
                if !sym.kind.is_scope() {
                    return None;
                }
                scope = found;
            }
        }
        result
    }

    fn resolve_one_component(&self, scope: SymbolId, comp: &Component, has_wildcards: bool) -> Option<SymbolId> {
        if let Some(found) = self.best_candidate_in_scope(scope, comp, has_wildcards) {
            return Some(found);
        }
        // Step 6: fall back into transparent children (inline
        // namespaces, unscoped enums).
        let redirected = typedef_redirect(self.store, scope);
        let sym = self.store.find(redirected)?;
        for child_id in sym.kind.member_ids() {
            if let Some(child) = self.store.find(child_id) {
                if child.kind.is_transparent() {
                    if let Some(found) = self.resolve_one_component(child_id, comp, has_wildcards) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    fn best_candidate_in_scope(&self, scope: SymbolId, comp: &Component, has_wildcards: bool) -> Option<SymbolId> {
        let redirected = typedef_redirect(self.store, scope);
        let sym = self.store.find(redirected)?;
        let candidates: Vec<SymbolId> = direct_candidates(self.store, sym)
            .into_iter()
            .filter(|id| {
                self.store
                    .find(*id)
                    .map(|s| name_matches(&comp.name, &s.name, has_wildcards))
                    .unwrap_or(false)
            })
            .collect();

        candidates
            .into_iter()
            .max_by_key(|id| {
                let s = self.store.find(*id).expect("candidate came from the store");
                match &s.kind {
                    SymbolKind::Function(f) => MatchLevel::for_function(f, s.doc.is_some(), comp, self.config),
                    SymbolKind::Overloads(_) => MatchLevel::trivial(),
                    _ => MatchLevel::trivial(),
                }
            })
            .map(|id| self.resolve_overload(id, comp))
    }

    /// An `Overloads` symbol stands for its group; pick the best-ranked
    /// member function rather than returning the synthetic id itself.
    fn resolve_overload(&self, id: SymbolId, comp: &Component) -> SymbolId {
        let Some(sym) = self.store.find(id) else { return id };
        let SymbolKind::Overloads(o) = &sym.kind else { return id };
        o.functions
            .iter()
            .copied()
            .max_by_key(|fid| {
                self.store
                    .find(*fid)
                    .and_then(|f| match &f.kind {
                        SymbolKind::Function(func) => Some(MatchLevel::for_function(func, f.doc.is_some(), comp, self.config)),
                        _ => None,
                    })
                    .unwrap_or_else(MatchLevel::trivial)
            })
            .unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::*;
    use crate::types::FundamentalType;

    fn make_fn(id: SymbolId, name: &str, parent: SymbolId, params: Vec<crate::types::FunctionParam>) -> Symbol {
        Symbol::new(
            id,
            name,
            SymbolKind::Function(FunctionSymbol {
                ret: Type::named_fundamental("void", FundamentalType::Void),
                params,
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

    #[test]
    fn unqualified_lookup_finds_sibling() {
        let ns_id = SymbolId::from_usr("ns");
        let f_id = SymbolId::from_usr("ns::f");
        let caller_id = SymbolId::from_usr("ns::caller");
        let ns = Symbol::new(
            ns_id,
            "ns",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![f_id, caller_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_fn(f_id, "f", ns_id, vec![])).unwrap();
        store.ingest(make_fn(caller_id, "caller", ns_id, vec![])).unwrap();
        let finalized = store.finalize();

        let config = Config::default();
        let lookup = SymbolLookup::new(&finalized, &config);
        assert_eq!(lookup.lookup(caller_id, "f"), LookupOutcome::Found(f_id));
    }

    #[test]
    fn climbs_to_parent_scope_on_miss() {
        let outer_id = SymbolId::from_usr("outer");
        let inner_id = SymbolId::from_usr("outer::inner");
        let target_id = SymbolId::from_usr("outer::target");
        let caller_id = SymbolId::from_usr("outer::inner::caller");
        let outer = Symbol::new(
            outer_id,
            "outer",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![inner_id, target_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let inner = Symbol::new(
            inner_id,
            "inner",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![caller_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        )
        .with_parent(outer_id);
        let store = crate::store::SymbolStore::new();
        store.ingest(outer).unwrap();
        store.ingest(inner).unwrap();
        store.ingest(make_fn(target_id, "target", outer_id, vec![])).unwrap();
        store.ingest(make_fn(caller_id, "caller", inner_id, vec![])).unwrap();
        let finalized = store.finalize();

        let config = Config::default();
        let lookup = SymbolLookup::new(&finalized, &config);
        assert_eq!(lookup.lookup(caller_id, "target"), LookupOutcome::Found(target_id));
    }

    #[test]
    fn transparent_inline_namespace_members_visible_from_enclosing_scope() {
        let ns_id = SymbolId::from_usr("ns2");
        let inline_id = SymbolId::from_usr("ns2::v1");
        let f_id = SymbolId::from_usr("ns2::v1::f");
        let caller_id = SymbolId::from_usr("ns2::caller");
        let ns = Symbol::new(
            ns_id,
            "ns2",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![inline_id, caller_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let inline_ns = Symbol::new(
            inline_id,
            "v1",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![f_id],
                using_directives: vec![],
                is_inline: true,
                is_anonymous: false,
            }),
        )
        .with_parent(ns_id);
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(inline_ns).unwrap();
        store.ingest(make_fn(f_id, "f", inline_id, vec![])).unwrap();
        store.ingest(make_fn(caller_id, "caller", ns_id, vec![])).unwrap();
        let finalized = store.finalize();

        let config = Config::default();
        let lookup = SymbolLookup::new(&finalized, &config);
        assert_eq!(lookup.lookup(caller_id, "f"), LookupOutcome::Found(f_id));
    }

    #[test]
    fn overload_ranking_picks_matching_param_count() {
        let ns_id = SymbolId::from_usr("ns3");
        let f0_id = SymbolId::from_usr("ns3::f()");
        let f1_id = SymbolId::from_usr("ns3::f(int)");
        let caller_id = SymbolId::from_usr("ns3::caller");
        let ns = Symbol::new(
            ns_id,
            "ns3",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![f0_id, f1_id, caller_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_fn(f0_id, "f", ns_id, vec![])).unwrap();
        store
            .ingest(make_fn(
                f1_id,
                "f",
                ns_id,
                vec![crate::types::FunctionParam {
                    name: Some("x".into()),
                    ty: Type::named_fundamental("int", FundamentalType::Int),
                    default: None,
                }],
            ))
            .unwrap();
        store.ingest(make_fn(caller_id, "caller", ns_id, vec![])).unwrap();
        let mut finalized = store.finalize();
        crate::finalize::overload::run(&mut finalized);

        let config = Config::default();
        let lookup = SymbolLookup::new(&finalized, &config);
        assert_eq!(lookup.lookup(caller_id, "f(int)"), LookupOutcome::Found(f1_id));
        assert_eq!(lookup.lookup(caller_id, "f()"), LookupOutcome::Found(f0_id));
    }

    #[test]
    fn global_qualified_name_unresolved_reports_not_found() {
        let ns_id = SymbolId::from_usr("ns4");
        let caller_id = SymbolId::from_usr("ns4::caller");
        let ns = Symbol::new(
            ns_id,
            "ns4",
            SymbolKind::Namespace(NamespaceSymbol {
                members: vec![caller_id],
                using_directives: vec![],
                is_inline: false,
                is_anonymous: false,
            }),
        );
        let store = crate::store::SymbolStore::new();
        store.ingest(ns).unwrap();
        store.ingest(make_fn(caller_id, "caller", ns_id, vec![])).unwrap();
        let finalized = store.finalize();
        let config = Config::default();
        let lookup = SymbolLookup::new(&finalized, &config);
        // No top-level "target" exists at global scope; unresolved
        // qualified lookups must report NotFound rather than panicking.
        assert_eq!(lookup.lookup(caller_id, "::target"), LookupOutcome::NotFound);
    }

    /// SFINAE awareness: two parameters both spelled `enable_if_t<C, T>`
    /// compare equal only when `C` agrees; a different condition must
    /// render distinctly so the two overloads are never confused for one
    /// another.
    #[test]
    fn sfinae_unwrap_distinguishes_conditions_with_same_underlying_type() {
        use crate::template::TemplateArg;

        let config = Config::default();
        let enable_if = |condition: &str| {
            Type::named(crate::names::Name::simple("enable_if_t").with_template_args(vec![
                TemplateArg::NonType {
                    written: condition.to_string(),
                    value: None,
                },
                TemplateArg::Type(Type::named_fundamental("T", crate::types::FundamentalType::Void)),
            ]))
        };

        let integral_a = enable_if("is_integral_v<T>");
        let integral_b = enable_if("is_integral_v<T>");
        let floating = enable_if("is_floating_point_v<T>");

        assert_eq!(render_type_for_match(&integral_a, &config), render_type_for_match(&integral_b, &config));
        assert_ne!(render_type_for_match(&integral_a, &config), render_type_for_match(&floating, &config));
    }

    /// A plain (non-SFINAE) alias is rendered unchanged, without picking
    /// up a spurious `where` clause.
    #[test]
    fn sfinae_unwrap_leaves_non_curated_aliases_untouched() {
        let config = Config::default();
        let ordinary = Type::named_fundamental("int", crate::types::FundamentalType::Int);
        assert_eq!(render_type_for_match(&ordinary, &config), "int");
    }
}
