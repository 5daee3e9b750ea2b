//! The recursive type model.
//!
//! Modeled as a tagged variant stored by value rather than a
//! polymorphic-value class hierarchy: each type layer is an enum
//! variant holding its own data, cloned structurally instead of through
//! virtual dispatch.

use crate::id::SymbolId;
use crate::names::Name;
use serde::{Deserialize, Serialize};

/// Recognized fundamental (built-in) types, used so lookup and doc
/// synthesis can recognize e.g. `bool`-returning operators without
/// string comparison on `Named` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundamentalType {
    Void,
    Bool,
    Char,
    Int,
    UInt,
    Float,
    Double,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: Option<String>,
    pub ty: Type,
    pub default: Option<String>,
}

/// cv-qualifiers and pack-expansion flag common to every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeQualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_pack_expansion: bool,
    /// Constraints recorded for an `auto`/concept-constrained type, or
    /// carried through by the SFINAE unwrap heuristic to keep
    /// the unwrapped condition visible to lookup.
    pub constraints: Vec<String>,
}

impl Default for TypeQualifiers {
    fn default() -> Self {
        TypeQualifiers {
            is_const: false,
            is_volatile: false,
            is_pack_expansion: false,
            constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefQualifier {
    None,
    LValue,
    RValue,
}

/// The recursive sum type for C++ types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Named {
        name: Name,
        fundamental: Option<FundamentalType>,
        quals: TypeQualifiers,
    },
    Decltype {
        expression: String,
        quals: TypeQualifiers,
    },
    Auto {
        keyword: String,
        constraint: Option<Box<Type>>,
        quals: TypeQualifiers,
    },
    LValueReference {
        pointee: Box<Type>,
        quals: TypeQualifiers,
    },
    RValueReference {
        pointee: Box<Type>,
        quals: TypeQualifiers,
    },
    Pointer {
        pointee: Box<Type>,
        quals: TypeQualifiers,
    },
    MemberPointer {
        parent: Box<Type>,
        pointee: Box<Type>,
        quals: TypeQualifiers,
    },
    Array {
        element: Box<Type>,
        bounds: Option<String>,
        bounds_value: Option<u64>,
        quals: TypeQualifiers,
    },
    Function {
        ret: Box<Type>,
        params: Vec<FunctionParam>,
        ref_qualifier: RefQualifier,
        is_noexcept: bool,
        is_variadic: bool,
        quals: TypeQualifiers,
    },
    Pack {
        pattern: Box<Type>,
        quals: TypeQualifiers,
    },
}

impl Type {
    pub fn named(name: Name) -> Self {
        Type::Named {
            name,
            fundamental: None,
            quals: TypeQualifiers::default(),
        }
    }

    pub fn named_fundamental(name: impl Into<String>, fundamental: FundamentalType) -> Self {
        Type::Named {
            name: Name::simple(name),
            fundamental: Some(fundamental),
            quals: TypeQualifiers::default(),
        }
    }

    pub fn with_const(mut self) -> Self {
        self.quals_mut().is_const = true;
        self
    }

    pub fn quals(&self) -> &TypeQualifiers {
        match self {
            Type::Named { quals, .. }
            | Type::Decltype { quals, .. }
            | Type::Auto { quals, .. }
            | Type::LValueReference { quals, .. }
            | Type::RValueReference { quals, .. }
            | Type::Pointer { quals, .. }
            | Type::MemberPointer { quals, .. }
            | Type::Array { quals, .. }
            | Type::Function { quals, .. }
            | Type::Pack { quals, .. } => quals,
        }
    }

    pub fn quals_mut(&mut self) -> &mut TypeQualifiers {
        match self {
            Type::Named { quals, .. }
            | Type::Decltype { quals, .. }
            | Type::Auto { quals, .. }
            | Type::LValueReference { quals, .. }
            | Type::RValueReference { quals, .. }
            | Type::Pointer { quals, .. }
            | Type::MemberPointer { quals, .. }
            | Type::Array { quals, .. }
            | Type::Function { quals, .. }
            | Type::Pack { quals, .. } => quals,
        }
    }

    /// Descend through one layer of reference/pointer/array wrapping, the
    /// way the C++ source's `innerType()` accessor does, used for decay
    /// comparisons.
    pub fn inner(&self) -> Option<&Type> {
        match self {
            Type::LValueReference { pointee, .. }
            | Type::RValueReference { pointee, .. }
            | Type::Pointer { pointee, .. }
            | Type::Array { element: pointee, .. }
            | Type::Pack { pattern: pointee, .. } => Some(pointee),
            Type::MemberPointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Descend through every wrapping layer to the innermost named/
    /// decltype/auto/function type.
    pub fn innermost(&self) -> &Type {
        let mut cur = self;
        while let Some(inner) = cur.inner() {
            cur = inner;
        }
        cur
    }

    pub fn named_name(&self) -> Option<&Name> {
        match self {
            Type::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Apply C++ function-parameter decay: arrays decay to pointers,
    /// top-level cv-qualifiers are dropped, references are compared
    /// structurally (i.e. decay does not strip a reference layer itself,
    /// only what sits beneath it). Used by the lookup engine's
    /// parameter-type ranking as the "decay-equal" comparison.
    pub fn decay(&self) -> Type {
        let mut decayed = match self {
            Type::Array { element, .. } => Type::Pointer {
                pointee: element.clone(),
                quals: TypeQualifiers::default(),
            },
            Type::Function { .. } => Type::Pointer {
                pointee: Box::new(self.clone()),
                quals: TypeQualifiers::default(),
            },
            other => other.clone(),
        };
        decayed.quals_mut().is_const = false;
        decayed.quals_mut().is_volatile = false;
        decayed
    }

    /// Structural equality after decaying both sides.
    pub fn decay_eq(&self, other: &Type) -> bool {
        structurally_eq(&self.decay(), &other.decay())
    }

    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        match self {
            Type::Named { name, .. } => name.visit_symbol_ids_mut(f),
            Type::Decltype { .. } => {}
            Type::Auto { constraint, .. } => {
                if let Some(c) = constraint {
                    c.visit_symbol_ids_mut(f);
                }
            }
            Type::LValueReference { pointee, .. }
            | Type::RValueReference { pointee, .. }
            | Type::Pointer { pointee, .. }
            | Type::Array { element: pointee, .. }
            | Type::Pack { pattern: pointee, .. } => pointee.visit_symbol_ids_mut(f),
            Type::MemberPointer { parent, pointee, .. } => {
                parent.visit_symbol_ids_mut(f);
                pointee.visit_symbol_ids_mut(f);
            }
            Type::Function { ret, params, .. } => {
                ret.visit_symbol_ids_mut(f);
                for p in params {
                    p.ty.visit_symbol_ids_mut(f);
                }
            }
        }
    }
}

/// Structural equality ignoring cv-qualifiers recorded per-layer beyond
/// the top (used by `decay_eq` after both sides are pre-decayed at the
/// top level).
fn structurally_eq(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (
            Type::Named { name: na, fundamental: fa, .. },
            Type::Named { name: nb, fundamental: fb, .. },
        ) => na.identifier == nb.identifier && na.resolved() == nb.resolved() && fa == fb,
        (Type::Decltype { expression: ea, .. }, Type::Decltype { expression: eb, .. }) => ea == eb,
        (Type::Auto { keyword: ka, .. }, Type::Auto { keyword: kb, .. }) => ka == kb,
        (Type::LValueReference { pointee: pa, .. }, Type::LValueReference { pointee: pb, .. }) => {
            pa.decay_eq(pb)
        }
        (Type::RValueReference { pointee: pa, .. }, Type::RValueReference { pointee: pb, .. }) => {
            pa.decay_eq(pb)
        }
        (Type::Pointer { pointee: pa, .. }, Type::Pointer { pointee: pb, .. }) => pa.decay_eq(pb),
        (
            Type::MemberPointer { parent: pra, pointee: poa, .. },
            Type::MemberPointer { parent: prb, pointee: pob, .. },
        ) => pra.decay_eq(prb) && poa.decay_eq(pob),
        (Type::Array { element: ea, .. }, Type::Array { element: eb, .. }) => ea.decay_eq(eb),
        (
            Type::Function { ret: ra, params: pa, is_variadic: va, .. },
            Type::Function { ret: rb, params: pb, is_variadic: vb, .. },
        ) => {
            ra.decay_eq(rb)
                && va == vb
                && pa.len() == pb.len()
                && pa.iter().zip(pb).all(|(x, y)| x.ty.decay_eq(&y.ty))
        }
        (Type::Pack { pattern: pa, .. }, Type::Pack { pattern: pb, .. }) => pa.decay_eq(pb),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_decays_to_pointer() {
        let arr = Type::Array {
            element: Box::new(Type::named_fundamental("int", FundamentalType::Int)),
            bounds: Some("4".into()),
            bounds_value: Some(4),
            quals: TypeQualifiers::default(),
        };
        let ptr = Type::Pointer {
            pointee: Box::new(Type::named_fundamental("int", FundamentalType::Int)),
            quals: TypeQualifiers::default(),
        };
        assert!(arr.decay_eq(&ptr));
    }

    #[test]
    fn top_level_cv_is_dropped_in_decay_comparison() {
        let a = Type::named_fundamental("int", FundamentalType::Int).with_const();
        let b = Type::named_fundamental("int", FundamentalType::Int);
        assert!(a.decay_eq(&b));
    }

    #[test]
    fn references_compare_structurally_not_decayed_away() {
        let lref = Type::LValueReference {
            pointee: Box::new(Type::named_fundamental("int", FundamentalType::Int)),
            quals: TypeQualifiers::default(),
        };
        let plain = Type::named_fundamental("int", FundamentalType::Int);
        assert!(!lref.decay_eq(&plain));
    }

    #[test]
    fn innermost_descends_through_pointer_and_reference() {
        let t = Type::Pointer {
            pointee: Box::new(Type::LValueReference {
                pointee: Box::new(Type::named_fundamental("int", FundamentalType::Int)),
                quals: TypeQualifiers::default(),
            }),
            quals: TypeQualifiers::default(),
        };
        assert!(matches!(t.innermost(), Type::Named { .. }));
    }
}
