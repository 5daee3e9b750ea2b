//! Template-argument and template-parameter model, embedded inside `Record`, `Function`, `Specialization`,
//! `Typedef`, `Variable`, `Concept`, and `Guide` symbols.

use crate::id::SymbolId;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// A template argument: either a type, a constant expression (written
/// form plus optional evaluated value), or a nested template-id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateArg {
    Type(Type),
    NonType {
        written: String,
        value: Option<i128>,
    },
    Template(SymbolId),
    /// A parameter pack expansion of further arguments.
    Pack(Vec<TemplateArg>),
}

impl TemplateArg {
    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        match self {
            TemplateArg::Type(t) => t.visit_symbol_ids_mut(f),
            TemplateArg::NonType { .. } => {}
            TemplateArg::Template(id) => f(id),
            TemplateArg::Pack(args) => {
                for a in args {
                    a.visit_symbol_ids_mut(f);
                }
            }
        }
    }

    /// Decay-equality used by lookup's template-argument-count/match
    /// ranking: types compare decay-equal, non-type values
    /// compare by evaluated value when both known else written form,
    /// templates compare by resolved id.
    pub fn decay_eq(&self, other: &TemplateArg) -> bool {
        match (self, other) {
            (TemplateArg::Type(a), TemplateArg::Type(b)) => a.decay_eq(b),
            (
                TemplateArg::NonType { written: wa, value: va },
                TemplateArg::NonType { written: wb, value: vb },
            ) => match (va, vb) {
                (Some(a), Some(b)) => a == b,
                _ => wa == wb,
            },
            (TemplateArg::Template(a), TemplateArg::Template(b)) => a == b,
            (TemplateArg::Pack(a), TemplateArg::Pack(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.decay_eq(y))
            }
            _ => false,
        }
    }
}

/// Which of the four kinds of template declaration this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    Primary,
    ExplicitSpecialization,
    PartialSpecialization,
    ImplicitSpecialization,
}

/// One template parameter: a sum of Type / NonType / Template variants,
/// each with an optional default and a pack flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateParam {
    Type {
        name: String,
        is_pack: bool,
        default: Option<Type>,
    },
    NonType {
        name: String,
        is_pack: bool,
        kind: Type,
        default: Option<String>,
    },
    Template {
        name: String,
        is_pack: bool,
        params: Vec<TemplateParam>,
        default: Option<SymbolId>,
    },
}

impl TemplateParam {
    pub fn name(&self) -> &str {
        match self {
            TemplateParam::Type { name, .. } => name,
            TemplateParam::NonType { name, .. } => name,
            TemplateParam::Template { name, .. } => name,
        }
    }

    pub fn is_pack(&self) -> bool {
        match self {
            TemplateParam::Type { is_pack, .. } => *is_pack,
            TemplateParam::NonType { is_pack, .. } => *is_pack,
            TemplateParam::Template { is_pack, .. } => *is_pack,
        }
    }

    /// Descend into every `SymbolId` reachable from this parameter: a
    /// `Type` default's embedded `Named` references, a `NonType`
    /// parameter's `kind` and any type-valued default, and (for a
    /// template-template parameter) its own nested parameter list plus
    /// default template id.
    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        match self {
            TemplateParam::Type { default, .. } => {
                if let Some(ty) = default {
                    ty.visit_symbol_ids_mut(f);
                }
            }
            TemplateParam::NonType { kind, .. } => {
                kind.visit_symbol_ids_mut(f);
            }
            TemplateParam::Template { params, default, .. } => {
                for p in params {
                    p.visit_symbol_ids_mut(f);
                }
                if let Some(id) = default {
                    f(id);
                }
            }
        }
    }
}

/// Template metadata attached to a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub kind: TemplateKind,
    pub primary: Option<SymbolId>,
    pub params: Vec<TemplateParam>,
    pub args: Vec<TemplateArg>,
}

impl TemplateInfo {
    pub fn primary_template(kind: TemplateKind, params: Vec<TemplateParam>) -> Self {
        TemplateInfo {
            kind,
            primary: None,
            params,
            args: Vec::new(),
        }
    }

    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        if let Some(id) = self.primary.as_mut() {
            f(id);
        }
        for arg in &mut self.args {
            arg.visit_symbol_ids_mut(f);
        }
        for param in &mut self.params {
            param.visit_symbol_ids_mut(f);
        }
    }
}
