//! The `Symbol` record: a common header plus a kind-specific body.

use crate::doc::Javadoc;
use crate::id::SymbolId;
use crate::names::Name;
use crate::operator::{FunctionClass, OperatorKind};
use crate::template::TemplateInfo;
use crate::types::Type;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Access {
    Public,
    Protected,
    Private,
    None,
}

impl Access {
    /// `min(A, B)`: the more restrictive of the two wins.
    /// Ordered `Public < Protected < Private < None` so `max` gives the
    /// more restrictive value.
    pub fn combine(self, other: Access) -> Access {
        self.max(other)
    }
}

/// How much of a symbol is retained and how it is rendered. Ordered so
/// `max` yields the strictest mode when merging two declarations of the
/// same symbol: `Regular > SeeBelow > ImplementationDefined > Dependency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExtractionMode {
    Dependency,
    ImplementationDefined,
    SeeBelow,
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub is_definition: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKeyKind {
    Class,
    Struct,
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Virtuality {
    None,
    Virtual,
    PureVirtual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseInfo {
    pub ty: Type,
    pub access: Access,
    pub is_virtual: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFlags {
    pub is_final: bool,
    pub is_union: bool,
    pub is_abstract: bool,
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSymbol {
    pub key_kind: RecordKeyKind,
    pub is_type_def: bool,
    pub bases: Vec<BaseInfo>,
    pub friends: Vec<SymbolId>,
    pub public_members: Vec<SymbolId>,
    pub protected_members: Vec<SymbolId>,
    pub private_members: Vec<SymbolId>,
    pub specializations: Vec<SymbolId>,
    pub template: Option<TemplateInfo>,
    pub flags: RecordFlags,
}

impl RecordSymbol {
    pub fn members_of(&self, access: Access) -> &[SymbolId] {
        match access {
            Access::Public | Access::None => &self.public_members,
            Access::Protected => &self.protected_members,
            Access::Private => &self.private_members,
        }
    }

    pub fn members_of_mut(&mut self, access: Access) -> &mut Vec<SymbolId> {
        match access {
            Access::Public | Access::None => &mut self.public_members,
            Access::Protected => &mut self.protected_members,
            Access::Private => &mut self.private_members,
        }
    }

    pub fn all_members(&self) -> impl Iterator<Item = &SymbolId> {
        self.public_members
            .iter()
            .chain(self.protected_members.iter())
            .chain(self.private_members.iter())
    }

    pub fn all_members_mut(&mut self) -> impl Iterator<Item = &mut SymbolId> {
        self.public_members
            .iter_mut()
            .chain(self.protected_members.iter_mut())
            .chain(self.private_members.iter_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecializationSymbol {
    pub primary: SymbolId,
    pub args: Vec<crate::template::TemplateArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    None,
    Static,
    Extern,
    ThreadLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstexprKind {
    None,
    Constexpr,
    Consteval,
    Constinit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplicitKind {
    None,
    Explicit,
    ConditionallyExplicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoexceptKind {
    False,
    True,
    Conditional,
    Unevaluated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoexceptInfo {
    pub kind: NoexceptKind,
    pub operand: Option<String>,
}

impl Default for NoexceptInfo {
    fn default() -> Self {
        NoexceptInfo {
            kind: NoexceptKind::False,
            operand: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefQualifier {
    None,
    LValue,
    RValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionFlags {
    pub is_record_method: bool,
    pub is_variadic: bool,
    pub is_explicit_object_member_function: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub is_deleted: bool,
    pub is_defaulted: bool,
    pub is_nodiscard: bool,
    pub is_inline: bool,
}

impl FunctionFlags {
    /// Merge two declarations' flag bit-sets by OR.
    pub fn merge(&mut self, other: &FunctionFlags) {
        self.is_record_method |= other.is_record_method;
        self.is_variadic |= other.is_variadic;
        self.is_explicit_object_member_function |= other.is_explicit_object_member_function;
        self.is_virtual |= other.is_virtual;
        self.is_pure_virtual |= other.is_pure_virtual;
        self.is_override |= other.is_override;
        self.is_final |= other.is_final;
        self.is_deleted |= other.is_deleted;
        self.is_defaulted |= other.is_defaulted;
        self.is_nodiscard |= other.is_nodiscard;
        self.is_inline |= other.is_inline;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSymbol {
    pub ret: Type,
    pub params: Vec<crate::types::FunctionParam>,
    pub template: Option<TemplateInfo>,
    pub class: FunctionClass,
    pub operator: OperatorKind,
    pub is_const: bool,
    pub is_volatile: bool,
    pub ref_qualifier: RefQualifier,
    pub noexcept: NoexceptInfo,
    pub explicit: ExplicitKind,
    pub storage: StorageClass,
    pub constexpr_kind: ConstexprKind,
    pub flags: FunctionFlags,
    /// Populated by the overload grouper (pass C): the synthetic
    /// `Overloads` symbol this function was grouped under, if any.
    pub overload_set: Option<SymbolId>,
}

impl FunctionSymbol {
    pub fn is_unary_operator(&self) -> bool {
        self.operator != OperatorKind::None && self.effective_operand_count() == 1
    }

    pub fn is_binary_operator(&self) -> bool {
        self.operator != OperatorKind::None && self.effective_operand_count() == 2
    }

    /// Number of operands including an implicit `this`/first operand for
    /// a member-function operator, matching the C++ overload-resolution
    /// convention the doc-synthesis rules rely on.
    fn effective_operand_count(&self) -> usize {
        let implicit = if self.flags.is_record_method && !self.flags.is_explicit_object_member_function {
            1
        } else {
            0
        };
        self.params.len() + implicit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadsSymbol {
    pub functions: Vec<SymbolId>,
    pub operator: OperatorKind,
    pub class: FunctionClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSymbol {
    pub underlying: Option<Type>,
    pub is_scoped: bool,
    pub constants: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumConstantSymbol {
    pub initializer_written: Option<String>,
    pub initializer_value: Option<i128>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefSymbol {
    pub aliased: Type,
    pub is_using: bool,
    pub template: Option<TemplateInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSymbol {
    pub ty: Type,
    pub template: Option<TemplateInfo>,
    pub storage: StorageClass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldFlags {
    pub is_mutable: bool,
    pub is_bitfield: bool,
    pub is_no_unique_address: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSymbol {
    pub ty: Type,
    pub default_initializer: Option<String>,
    pub bitfield_width: Option<u32>,
    pub flags: FieldFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FriendTarget {
    Type(Type),
    Symbol(SymbolId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendSymbol {
    pub target: FriendTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceAliasSymbol {
    pub aliased: SymbolId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsingSymbol {
    pub qualifier: Name,
    pub introduced: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSymbol {
    pub params: Vec<crate::template::TemplateParam>,
    pub constraint_expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSymbol {
    pub deduced: Type,
    pub params: Vec<crate::types::FunctionParam>,
    pub template: Option<TemplateInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceSymbol {
    pub members: Vec<SymbolId>,
    pub using_directives: Vec<SymbolId>,
    pub is_inline: bool,
    pub is_anonymous: bool,
}

/// The kind-specific body of a `Symbol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolKind {
    Namespace(NamespaceSymbol),
    Record(RecordSymbol),
    Specialization(SpecializationSymbol),
    Function(FunctionSymbol),
    Overloads(OverloadsSymbol),
    Enum(EnumSymbol),
    EnumConstant(EnumConstantSymbol),
    Typedef(TypedefSymbol),
    Variable(VariableSymbol),
    Field(FieldSymbol),
    Friend(FriendSymbol),
    NamespaceAlias(NamespaceAliasSymbol),
    Using(UsingSymbol),
    Concept(ConceptSymbol),
    Guide(GuideSymbol),
}

impl SymbolKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SymbolKind::Namespace(_) => "namespace",
            SymbolKind::Record(_) => "record",
            SymbolKind::Specialization(_) => "specialization",
            SymbolKind::Function(_) => "function",
            SymbolKind::Overloads(_) => "overloads",
            SymbolKind::Enum(_) => "enum",
            SymbolKind::EnumConstant(_) => "enum-constant",
            SymbolKind::Typedef(_) => "typedef",
            SymbolKind::Variable(_) => "variable",
            SymbolKind::Field(_) => "field",
            SymbolKind::Friend(_) => "friend",
            SymbolKind::NamespaceAlias(_) => "namespace-alias",
            SymbolKind::Using(_) => "using",
            SymbolKind::Concept(_) => "concept",
            SymbolKind::Guide(_) => "guide",
        }
    }

    /// Whether this kind can act as a lookup scope (namespace, record,
    /// enum, typedef-to-scope).
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            SymbolKind::Namespace(_) | SymbolKind::Record(_) | SymbolKind::Enum(_) | SymbolKind::Typedef(_)
        )
    }

    /// A "transparent context": an inline namespace or
    /// unscoped enum, whose members are visible to lookup as if declared
    /// in the enclosing scope.
    pub fn is_transparent(&self) -> bool {
        match self {
            SymbolKind::Namespace(ns) => ns.is_inline,
            SymbolKind::Enum(e) => !e.is_scoped,
            _ => false,
        }
    }

    /// Direct member ids owned by this symbol, in declaration order.
    pub fn member_ids(&self) -> Vec<SymbolId> {
        match self {
            SymbolKind::Namespace(ns) => ns.members.clone(),
            SymbolKind::Record(r) => r.all_members().copied().collect(),
            SymbolKind::Enum(e) => e.constants.clone(),
            SymbolKind::Overloads(o) => o.functions.clone(),
            _ => Vec::new(),
        }
    }
}

/// The full symbol record: common header plus kind-specific
/// body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub parent: Option<SymbolId>,
    pub access: Access,
    pub extraction_mode: ExtractionMode,
    pub definition: Option<SourceLocation>,
    pub declarations: Vec<SourceLocation>,
    pub doc: Option<Javadoc>,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: SymbolId, name: impl Into<String>, kind: SymbolKind) -> Self {
        Symbol {
            id,
            name: name.into(),
            parent: None,
            access: Access::None,
            extraction_mode: ExtractionMode::Regular,
            definition: None,
            declarations: Vec::new(),
            doc: None,
            kind,
        }
    }

    pub fn with_parent(mut self, parent: SymbolId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Visit every `SymbolId`-valued reference field reachable from this
    /// symbol: member/base/friend lists, embedded
    /// types/names/template info, and doc-comment references. Used by
    /// both the reference resolver (pass A) and serialization-adjacent
    /// invariant checks.
    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        if let Some(p) = self.parent.as_mut() {
            f(p);
        }
        if let Some(doc) = self.doc.as_mut() {
            doc.visit_symbol_ids_mut(f);
        }
        match &mut self.kind {
            SymbolKind::Namespace(ns) => {
                for m in &mut ns.members {
                    f(m);
                }
                for u in &mut ns.using_directives {
                    f(u);
                }
            }
            SymbolKind::Record(r) => {
                for base in &mut r.bases {
                    base.ty.visit_symbol_ids_mut(f);
                }
                for fr in &mut r.friends {
                    f(fr);
                }
                for m in r.all_members_mut() {
                    f(m);
                }
                for s in &mut r.specializations {
                    f(s);
                }
                if let Some(t) = r.template.as_mut() {
                    t.visit_symbol_ids_mut(f);
                }
            }
            SymbolKind::Specialization(s) => {
                f(&mut s.primary);
                for a in &mut s.args {
                    a.visit_symbol_ids_mut(f);
                }
            }
            SymbolKind::Function(fsym) => {
                fsym.ret.visit_symbol_ids_mut(f);
                for p in &mut fsym.params {
                    p.ty.visit_symbol_ids_mut(f);
                }
                if let Some(t) = fsym.template.as_mut() {
                    t.visit_symbol_ids_mut(f);
                }
                if let Some(o) = fsym.overload_set.as_mut() {
                    f(o);
                }
            }
            SymbolKind::Overloads(o) => {
                for fid in &mut o.functions {
                    f(fid);
                }
            }
            SymbolKind::Enum(e) => {
                if let Some(u) = e.underlying.as_mut() {
                    u.visit_symbol_ids_mut(f);
                }
                for c in &mut e.constants {
                    f(c);
                }
            }
            SymbolKind::EnumConstant(_) => {}
            SymbolKind::Typedef(t) => {
                t.aliased.visit_symbol_ids_mut(f);
                if let Some(ti) = t.template.as_mut() {
                    ti.visit_symbol_ids_mut(f);
                }
            }
            SymbolKind::Variable(v) => {
                v.ty.visit_symbol_ids_mut(f);
                if let Some(t) = v.template.as_mut() {
                    t.visit_symbol_ids_mut(f);
                }
            }
            SymbolKind::Field(field) => field.ty.visit_symbol_ids_mut(f),
            SymbolKind::Friend(fr) => match &mut fr.target {
                FriendTarget::Type(t) => t.visit_symbol_ids_mut(f),
                FriendTarget::Symbol(id) => f(id),
            },
            SymbolKind::NamespaceAlias(na) => f(&mut na.aliased),
            SymbolKind::Using(u) => {
                u.qualifier.visit_symbol_ids_mut(f);
                for id in &mut u.introduced {
                    f(id);
                }
            }
            SymbolKind::Concept(c) => {
                for p in &mut c.params {
                    p.visit_symbol_ids_mut(f);
                }
            }
            SymbolKind::Guide(g) => {
                g.deduced.visit_symbol_ids_mut(f);
                for p in &mut g.params {
                    p.ty.visit_symbol_ids_mut(f);
                }
                if let Some(t) = g.template.as_mut() {
                    t.visit_symbol_ids_mut(f);
                }
            }
        }
    }
}
