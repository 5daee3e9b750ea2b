//! Qualified-name model.
//!
//! A `Name` is a recursive structure representing `A::B<T>::C`: an
//! identifier, an optional resolved `SymbolId`, optional template
//! arguments, and an optional prefix (another `Name`). Owned by value
//! inside whichever `Type`/`Symbol` embeds it.

use crate::id::SymbolId;
use crate::template::TemplateArg;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub identifier: String,
    /// Resolved target, populated by the reference resolver (pass A).
    /// `None` (or `Some(SymbolId::INVALID)`) before resolution / when
    /// resolution failed.
    pub symbol: Option<SymbolId>,
    pub template_args: Option<Vec<TemplateArg>>,
    pub prefix: Option<Box<Name>>,
}

impl Name {
    pub fn simple(identifier: impl Into<String>) -> Self {
        Name {
            identifier: identifier.into(),
            symbol: None,
            template_args: None,
            prefix: None,
        }
    }

    pub fn qualified(prefix: Name, identifier: impl Into<String>) -> Self {
        Name {
            identifier: identifier.into(),
            symbol: None,
            template_args: None,
            prefix: Some(Box::new(prefix)),
        }
    }

    pub fn with_symbol(mut self, id: SymbolId) -> Self {
        self.symbol = Some(id);
        self
    }

    pub fn with_template_args(mut self, args: Vec<TemplateArg>) -> Self {
        self.template_args = Some(args);
        self
    }

    /// Resolved target symbol, if any, treating `INVALID` as unresolved.
    pub fn resolved(&self) -> Option<SymbolId> {
        self.symbol.filter(SymbolId::is_valid)
    }

    /// `::`-joined textual rendering, ignoring template arguments (used
    /// for diagnostics and as a fallback display form; rendering full
    /// template-argument lists is a back-end concern).
    pub fn to_qualified_string(&self, delim: &str) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(self);
        while let Some(n) = cur {
            parts.push(n.identifier.clone());
            cur = n.prefix.as_deref();
        }
        parts.reverse();
        parts.join(delim)
    }

    /// Iterate prefix-to-self, innermost last.
    pub fn components(&self) -> Vec<&Name> {
        let mut v = Vec::new();
        let mut cur = Some(self);
        while let Some(n) = cur {
            v.push(n);
            cur = n.prefix.as_deref();
        }
        v.reverse();
        v
    }

    /// Visit every `SymbolId`-valued slot reachable from this name (self
    /// reference plus prefix chain plus template-argument types),
    /// innermost-first is not required; order is unspecified. Used by the
    /// reference resolver's generic walk.
    pub fn visit_symbol_ids_mut(&mut self, f: &mut impl FnMut(&mut SymbolId)) {
        if let Some(id) = self.symbol.as_mut() {
            f(id);
        }
        if let Some(args) = self.template_args.as_mut() {
            for arg in args {
                arg.visit_symbol_ids_mut(f);
            }
        }
        if let Some(prefix) = self.prefix.as_mut() {
            prefix.visit_symbol_ids_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_string_joins_prefix_chain() {
        let a = Name::simple("A");
        let b = Name::qualified(a, "B");
        let c = Name::qualified(b, "C");
        assert_eq!(c.to_qualified_string("::"), "A::B::C");
    }

    #[test]
    fn resolved_treats_invalid_as_unresolved() {
        let mut n = Name::simple("x");
        n.symbol = Some(SymbolId::INVALID);
        assert_eq!(n.resolved(), None);
        n.symbol = Some(SymbolId::GLOBAL);
        assert_eq!(n.resolved(), Some(SymbolId::GLOBAL));
    }
}
