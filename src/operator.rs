//! Overloaded-operator kinds and function classes.
//!
//! Grounded on `original_source/src/lib/Support/LegibleNames.cpp`'s
//! `getOperatorReadableName`/`getSafeOperatorName`, which switch
//! exhaustively over the same operator set for brief synthesis and reserved legible-name tokens.

use serde::{Deserialize, Serialize};

/// Which, if any, overloaded operator a `Function` symbol implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    None,
    New,
    NewArray,
    Delete,
    DeleteArray,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Exclaim,
    Equal,
    Less,
    Greater,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    CaretEqual,
    AmpEqual,
    PipeEqual,
    LessLess,
    GreaterGreater,
    LessLessEqual,
    GreaterGreaterEqual,
    EqualEqual,
    ExclaimEqual,
    LessEqual,
    GreaterEqual,
    Spaceship,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Comma,
    ArrowStar,
    Arrow,
    Call,
    Subscript,
    Conditional,
    Coawait,
}

impl OperatorKind {
    /// Human-readable name used to synthesize the generic "`<Name>`
    /// operator" brief, mirroring `getOperatorReadableName`.
    pub fn readable_name(self) -> Option<&'static str> {
        use OperatorKind::*;
        Some(match self {
            None => return Option::None,
            New => "new",
            NewArray => "array new",
            Delete => "delete",
            DeleteArray => "array delete",
            Plus => "Addition",
            Minus => "Subtraction",
            Star => "Multiplication",
            Slash => "Division",
            Percent => "Modulo",
            Caret => "Bitwise XOR",
            Amp => "Bitwise AND",
            Pipe => "Bitwise OR",
            Tilde => "Bitwise NOT",
            Exclaim => "Negation",
            Equal => "Assignment",
            Less => "Less-than",
            Greater => "Greater-than",
            PlusEqual => "Addition assignment",
            MinusEqual => "Subtraction assignment",
            StarEqual => "Multiplication assignment",
            SlashEqual => "Division assignment",
            PercentEqual => "Modulo assignment",
            CaretEqual => "Bitwise XOR assignment",
            AmpEqual => "Bitwise AND assignment",
            PipeEqual => "Bitwise OR assignment",
            LessLess => "Stream insertion",
            GreaterGreater => "Stream extraction",
            LessLessEqual => "Left-shift assignment",
            GreaterGreaterEqual => "Right-shift assignment",
            EqualEqual => "Equality",
            ExclaimEqual => "Inequality",
            LessEqual => "Less-than-or-equal",
            GreaterEqual => "Greater-than-or-equal",
            Spaceship => "Three-way comparison",
            AmpAmp => "Logical AND",
            PipePipe => "Logical OR",
            PlusPlus => "Increment",
            MinusMinus => "Decrement",
            Comma => "Comma",
            ArrowStar => "Member-pointer dereference",
            Arrow => "Member access",
            Call => "Function call",
            Subscript => "Subscript",
            Conditional => "Conditional",
            Coawait => "co_await",
        })
    }

    /// Filesystem-safe token reserved by the legible-name allocator,
    /// mirroring `getSafeOperatorName`.
    pub fn safe_name(self) -> &'static str {
        use OperatorKind::*;
        match self {
            None => "operator",
            New => "operator-new",
            NewArray => "operator-new-array",
            Delete => "operator-delete",
            DeleteArray => "operator-delete-array",
            Plus => "operator-plus",
            Minus => "operator-minus",
            Star => "operator-star",
            Slash => "operator-slash",
            Percent => "operator-mod",
            Caret => "operator-xor",
            Amp => "operator-and",
            Pipe => "operator-or",
            Tilde => "operator-not",
            Exclaim => "operator-lnot",
            Equal => "operator-eq-assign",
            Less => "operator-lt",
            Greater => "operator-gt",
            PlusEqual => "operator-plus-eq",
            MinusEqual => "operator-minus-eq",
            StarEqual => "operator-star-eq",
            SlashEqual => "operator-slash-eq",
            PercentEqual => "operator-mod-eq",
            CaretEqual => "operator-xor-eq",
            AmpEqual => "operator-and-eq",
            PipeEqual => "operator-or-eq",
            LessLess => "operator-lshift",
            GreaterGreater => "operator-rshift",
            LessLessEqual => "operator-lshift-eq",
            GreaterGreaterEqual => "operator-rshift-eq",
            EqualEqual => "operator-eq",
            ExclaimEqual => "operator-ne",
            LessEqual => "operator-le",
            GreaterEqual => "operator-ge",
            Spaceship => "operator-spaceship",
            AmpAmp => "operator-land",
            PipePipe => "operator-lor",
            PlusPlus => "operator-inc",
            MinusMinus => "operator-dec",
            Comma => "operator-comma",
            ArrowStar => "operator-arrow-star",
            Arrow => "operator-arrow",
            Call => "operator-call",
            Subscript => "operator-subscript",
            Conditional => "operator-conditional",
            Coawait => "operator-coawait",
        }
    }

    pub fn is_boolean_comparison(self) -> bool {
        matches!(
            self,
            OperatorKind::EqualEqual
                | OperatorKind::ExclaimEqual
                | OperatorKind::Less
                | OperatorKind::Greater
                | OperatorKind::LessEqual
                | OperatorKind::GreaterEqual
        )
    }

    pub fn is_compound_assignment(self) -> bool {
        matches!(
            self,
            OperatorKind::PlusEqual
                | OperatorKind::MinusEqual
                | OperatorKind::StarEqual
                | OperatorKind::SlashEqual
                | OperatorKind::PercentEqual
                | OperatorKind::CaretEqual
                | OperatorKind::AmpEqual
                | OperatorKind::PipeEqual
                | OperatorKind::LessLessEqual
                | OperatorKind::GreaterGreaterEqual
        )
    }
}

/// What role a `Function` symbol plays, independent of its operator tag:
/// a normal function, constructor, conversion operator, or destructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionClass {
    Normal,
    Constructor,
    Conversion,
    Destructor,
}

/// Further classification of a constructor/assignment used by doc
/// autosynthesis: default, copy, move, or a plain
/// user-defined one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialMemberKind {
    Default,
    Copy,
    Move,
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_reads_as_equality() {
        assert_eq!(OperatorKind::EqualEqual.readable_name(), Some("Equality"));
    }

    #[test]
    fn boolean_comparison_set_covers_equality_operators() {
        assert!(OperatorKind::EqualEqual.is_boolean_comparison());
        assert!(!OperatorKind::Plus.is_boolean_comparison());
    }

    #[test]
    fn safe_names_are_unique_per_kind() {
        use std::collections::HashSet;
        let kinds = [
            OperatorKind::Plus,
            OperatorKind::EqualEqual,
            OperatorKind::LessLess,
            OperatorKind::Call,
            OperatorKind::Subscript,
        ];
        let names: HashSet<_> = kinds.iter().map(|k| k.safe_name()).collect();
        assert_eq!(names.len(), kinds.len());
    }
}
