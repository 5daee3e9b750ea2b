//! 160-bit content-addressed symbol identifiers.
//!
//! Grounded on `original_source/src/lib/Lib/Lookup.cpp` and
//! `LegibleNames.cpp`, both of which key `std::unordered_map<SymbolID, ...>`
//! by a fixed-size hashable identifier with two reserved values (`global`,
//! `invalid`). We hash with SHA-1 rather than reproducing clang's USR
//! grammar, which is a front-end concern outside this crate.

use std::fmt;

/// A 160-bit SHA-1 digest of a compiler-produced Unified Symbol Resolution
/// (USR) string, or one of the two reserved values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SymbolId([u8; 20]);

impl SymbolId {
    /// The translation-unit-level global namespace.
    pub const GLOBAL: SymbolId = SymbolId([0xffu8; 20]);

    /// Sentinel for "no symbol" / "reference cleared".
    pub const INVALID: SymbolId = SymbolId([0u8; 20]);

    /// Hash a compiler-produced USR string into a `SymbolId`.
    pub fn from_usr(usr: &str) -> Self {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(usr.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        SymbolId(bytes)
    }

    /// Derive a synthetic id deterministically from a scope id plus a
    /// disambiguating key. Used by the overload grouper (pass C) so the
    /// synthetic `Overloads` id is stable across re-runs without remembering prior output.
    pub fn derive(scope: SymbolId, key: &str) -> Self {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(scope.0);
        hasher.update(b"\0");
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        SymbolId(bytes)
    }

    pub fn is_valid(&self) -> bool {
        *self != SymbolId::INVALID
    }

    pub fn is_global(&self) -> bool {
        *self == SymbolId::GLOBAL
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        SymbolId(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let decoded = hex::decode(s).ok()?;
        if decoded.len() != 20 {
            return None;
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Some(SymbolId(bytes))
    }

    /// Length of the shortest hex prefix (starting from the front) that
    /// distinguishes `self` from `other`. Used by the legible-name
    /// allocator's disambiguation-suffix computation.
    pub fn mismatch_hex_len(&self, other: &SymbolId) -> usize {
        let a = self.to_hex();
        let b = other.to_hex();
        a.bytes()
            .zip(b.bytes())
            .position(|(x, y)| x != y)
            .map(|pos| pos + 1)
            .unwrap_or(a.len())
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        SymbolId::INVALID
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == SymbolId::INVALID {
            write!(f, "SymbolId(invalid)")
        } else if *self == SymbolId::GLOBAL {
            write!(f, "SymbolId(global)")
        } else {
            write!(f, "SymbolId({})", &self.to_hex()[..8])
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_usr_collapses_to_same_id() {
        let a = SymbolId::from_usr("c:@F@foo#I#");
        let b = SymbolId::from_usr("c:@F@foo#I#");
        assert_eq!(a, b);
    }

    #[test]
    fn different_usr_differs() {
        let a = SymbolId::from_usr("c:@F@foo#I#");
        let b = SymbolId::from_usr("c:@F@bar#I#");
        assert_ne!(a, b);
    }

    #[test]
    fn reserved_values_distinct() {
        assert_ne!(SymbolId::GLOBAL, SymbolId::INVALID);
        assert!(!SymbolId::INVALID.is_valid());
        assert!(SymbolId::GLOBAL.is_valid());
    }

    #[test]
    fn hex_roundtrip() {
        let id = SymbolId::from_usr("c:@N@n@F@f#I#");
        let hex = id.to_hex();
        assert_eq!(SymbolId::from_hex(&hex), Some(id));
    }

    #[test]
    fn mismatch_len_is_first_differing_hex_char() {
        let a = SymbolId::from_bytes([0x12; 20]);
        let mut other = [0x12; 20];
        other[0] = 0x13;
        let b = SymbolId::from_bytes(other);
        // first hex char of byte 0 differs ('1' -> '1' same, second nibble differs)
        assert_eq!(a.mismatch_hex_len(&b), 2);
    }
}
