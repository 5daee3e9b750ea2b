//! Autosynthesis of brief/returns/param docs for special functions —
//! part of the doc-comment finalizer, pass D.
//!
//! Grounded verbatim on
//! `original_source/src/lib/Metadata/Finalizers/DocComment/Function.hpp`'s
//! ordered rule chains: each rule is an `Option`-returning function tried
//! in turn, first success wins, mirroring the source's
//! `MRDOCS_CHECK_OR` short-circuit chain.

use crate::doc::{Block, Javadoc};
use crate::id::SymbolId;
use crate::operator::{FunctionClass, OperatorKind, SpecialMemberKind};
use crate::store::FinalizedStore;
use crate::symbol::FunctionSymbol;
use crate::types::Type;

fn classify_special_member(func: &FunctionSymbol, owner: SymbolId) -> SpecialMemberKind {
    if func.params.is_empty() {
        return SpecialMemberKind::Default;
    }
    if func.params.len() != 1 {
        return SpecialMemberKind::Plain;
    }
    match &func.params[0].ty {
        Type::LValueReference { pointee, .. } if refers_to(pointee, owner) => SpecialMemberKind::Copy,
        Type::RValueReference { pointee, .. } if refers_to(pointee, owner) => SpecialMemberKind::Move,
        _ => SpecialMemberKind::Plain,
    }
}

fn refers_to(ty: &Type, target: SymbolId) -> bool {
    ty.named_name().and_then(|n| n.resolved()) == Some(target)
}

/// Non-member, two parameters, `operator<<`, first param a mutable
/// lvalue reference to a named type, return type matching the first
/// parameter's type.
fn is_stream_insertion(func: &FunctionSymbol) -> bool {
    if func.operator != OperatorKind::LessLess || func.flags.is_record_method {
        return false;
    }
    if func.params.len() != 2 {
        return false;
    }
    let p0 = &func.params[0].ty;
    match p0 {
        Type::LValueReference { pointee, quals } if !quals.is_const => {
            matches!(pointee.as_ref(), Type::Named { .. }) && func.ret.decay_eq(p0)
        }
        _ => false,
    }
}

fn from_class(func: &FunctionSymbol, owner: SymbolId) -> Option<String> {
    match func.class {
        FunctionClass::Constructor => Some(
            match classify_special_member(func, owner) {
                SpecialMemberKind::Default => "Default constructor",
                SpecialMemberKind::Copy => "Copy constructor",
                SpecialMemberKind::Move => "Move constructor",
                SpecialMemberKind::Plain => "Constructor",
            }
            .to_string(),
        ),
        FunctionClass::Destructor => Some("Destructor".to_string()),
        FunctionClass::Conversion => {
            let target = conversion_target_name(func).unwrap_or_else(|| "the target type".to_string());
            Some(format!("Converts the object to `{target}`"))
        }
        FunctionClass::Normal => None,
    }
}

fn conversion_target_name(func: &FunctionSymbol) -> Option<String> {
    func.ret.innermost().named_name().map(|n| n.identifier.clone())
}

fn from_operator(func: &FunctionSymbol, owner: SymbolId) -> Option<String> {
    if func.operator == OperatorKind::None {
        return None;
    }
    if is_stream_insertion(func) {
        return Some("Stream insertion operator".to_string());
    }
    if func.operator == OperatorKind::Equal {
        let kind = classify_special_member(func, owner);
        return Some(
            match kind {
                SpecialMemberKind::Copy => "Copy assignment operator",
                SpecialMemberKind::Move => "Move assignment operator",
                _ => "Assignment operator",
            }
            .to_string(),
        );
    }
    func.operator.readable_name().map(|n| format!("{n} operator"))
}

/// Synthesize a brief for `func`.
pub fn synth_brief(func: &FunctionSymbol, owner: SymbolId) -> Option<String> {
    from_class(func, owner).or_else(|| from_operator(func, owner))
}

const RETURN_VERB_PREFIXES: &[&str] = &["Returns ", "Return ", "Get ", "Gets ", "Determine ", "Determines "];

fn returns_from_brief_prefix(brief: &str) -> Option<String> {
    for prefix in RETURN_VERB_PREFIXES {
        if let Some(rest) = brief.strip_prefix(prefix) {
            let mut out = rest.to_string();
            if let Some(first) = out.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            return Some(out);
        }
    }
    None
}

fn boolean_comparison_clause(op: OperatorKind) -> Option<&'static str> {
    Some(match op {
        OperatorKind::EqualEqual => "the objects are equal",
        OperatorKind::ExclaimEqual => "the objects are not equal",
        OperatorKind::Less => "the left operand is less than the right",
        OperatorKind::Greater => "the left operand is greater than the right",
        OperatorKind::LessEqual => "the left operand is less than or equal to the right",
        OperatorKind::GreaterEqual => "the left operand is greater than or equal to the right",
        _ => return None,
    })
}

fn returns_from_class_or_operator(func: &FunctionSymbol, owner: SymbolId) -> Option<String> {
    if func.class == FunctionClass::Conversion {
        let target = conversion_target_name(func).unwrap_or_else(|| "the target type".to_string());
        return Some(format!("The object converted to `{target}`"));
    }
    match &func.ret {
        Type::LValueReference { pointee, .. } if refers_to(pointee, owner) => {
            return Some("Reference to the current object".to_string());
        }
        Type::Pointer { pointee, .. } if refers_to(pointee, owner) => {
            return Some("Pointer to the current object".to_string());
        }
        _ => {}
    }
    if is_stream_insertion(func) {
        return Some("Reference to the current output stream".to_string());
    }
    if let Some(clause) = boolean_comparison_clause(func.operator) {
        return Some(format!("`true` if {clause}, `false` otherwise"));
    }
    if func.operator == OperatorKind::Spaceship {
        return Some("The relative order of the objects".to_string());
    }
    if func.flags.is_record_method && refers_to(&func.ret, owner) {
        return Some("Another instance of the object".to_string());
    }
    None
}

/// Synthesize a `@returns` block, trying brief-prefix stripping first,
/// then the class/operator rule chain, then falling back to the
/// referenced return type's own brief.
pub fn synth_returns(
    func: &FunctionSymbol,
    owner: SymbolId,
    own_brief: Option<&str>,
    store: &FinalizedStore,
) -> Option<String> {
    if let Some(brief) = own_brief {
        if let Some(r) = returns_from_brief_prefix(brief) {
            return Some(r);
        }
    }
    if let Some(r) = returns_from_class_or_operator(func, owner) {
        return Some(r);
    }
    let target_id = func.ret.innermost().named_name().and_then(|n| n.resolved())?;
    let target = store.find(target_id)?;
    let brief = target.doc.as_ref()?.brief()?;
    Some(crate::doc::Inline::flatten_text(brief))
}

/// Synthesize (name, description) pairs for `func`'s parameters, in
/// declaration order. Returns
/// `None` if no whole-function rule applies (caller falls back to
/// per-parameter referenced-type briefs).
fn synth_param_rule(func: &FunctionSymbol, owner: SymbolId) -> Option<Vec<(String, String)>> {
    if (func.class == FunctionClass::Constructor || func.operator == OperatorKind::Equal) && func.params.len() == 1 {
        let is_ctor = func.class == FunctionClass::Constructor;
        let verb = match (is_ctor, classify_special_member(func, owner)) {
            (true, SpecialMemberKind::Copy) => "copy construct",
            (true, SpecialMemberKind::Move) => "move construct",
            (false, SpecialMemberKind::Copy) => "copy assign",
            (false, SpecialMemberKind::Move) => "move assign",
            (true, _) => "construct",
            (false, _) => "assign",
        };
        return Some(vec![("other".to_string(), format!("The object to {verb} from"))]);
    }
    if is_stream_insertion(func) && func.params.len() == 2 {
        return Some(vec![
            ("os".to_string(), "An output stream".to_string()),
            ("value".to_string(), "The object to output".to_string()),
        ]);
    }
    if func.is_binary_operator() && func.params.len() == 2 {
        return Some(vec![
            ("lhs".to_string(), "The left operand".to_string()),
            ("rhs".to_string(), "The right operand".to_string()),
        ]);
    }
    if func.is_unary_operator() && func.params.len() == 1 {
        return Some(vec![("value".to_string(), "The operand".to_string())]);
    }
    None
}

/// Resolve the synthesized (name, description) pairs for every
/// parameter of `func` lacking an explicit `@param`, skipping those
/// already documented by the function's own declared name.
pub fn synth_params(func: &FunctionSymbol, owner: SymbolId, doc: &Javadoc, store: &FinalizedStore) -> Vec<(String, String)> {
    let whole_rule = synth_param_rule(func, owner);
    let mut out = Vec::new();
    for (i, param) in func.params.iter().enumerate() {
        if let Some(name) = &param.name {
            if doc.has_param(name) {
                continue;
            }
        }
        if let Some(rule) = &whole_rule {
            if let Some((default_name, desc)) = rule.get(i) {
                let name = param.name.clone().unwrap_or_else(|| default_name.clone());
                out.push((name, desc.clone()));
                continue;
            }
        }
        // Fallback: the parameter type's own documented brief.
        if let Some(target_id) = param.ty.innermost().named_name().and_then(|n| n.resolved()) {
            if let Some(brief) = store.find(target_id).and_then(|s| s.doc.as_ref()).and_then(|d| d.brief()) {
                let name = param.name.clone().unwrap_or_else(|| format!("arg{i}"));
                out.push((name, crate::doc::Inline::flatten_text(brief)));
            }
        }
    }
    out
}

/// Apply brief/returns/param synthesis to `doc` in place when the
/// corresponding pieces are missing. Returns whether anything changed.
pub fn apply(func: &FunctionSymbol, owner: SymbolId, doc: &mut Javadoc, store: &FinalizedStore) -> bool {
    let mut changed = false;
    if doc.brief().is_none() {
        if let Some(brief) = synth_brief(func, owner) {
            doc.set_brief(brief);
            changed = true;
        }
    }
    if doc.returns().is_none() {
        let own_brief = doc.brief().map(|p| crate::doc::Inline::flatten_text(p));
        if let Some(returns) = synth_returns(func, owner, own_brief.as_deref(), store) {
            doc.blocks.push(Block::Returns(vec![crate::doc::Inline::Text(returns)]));
            changed = true;
        }
    }
    for (name, desc) in synth_params(func, owner, doc, store) {
        doc.add_param(name, desc);
        changed = true;
    }
    changed
}
