//! Error domain for the core pipeline.
//!
//! Per the error-handling design: reference resolution and lookup never
//! raise, they return typed non-error results. `CoreError` only covers the
//! outcomes that really are errors (see `LookupOutcome` and
//! `ReferenceOutcome` in `lookup.rs` / `finalize/reference.rs` for the
//! value-based ones).

use crate::id::SymbolId;
use thiserror::Error;

/// The error domain for the core pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The front-end refused to parse a translation unit.
    #[error("parse error in {tu}: {message}")]
    Parse { tu: String, message: String },

    /// Two declarations for the same `SymbolId` could not be reconciled.
    #[error("merge error for symbol {id}: {message}")]
    Merge { id: SymbolId, message: String },

    /// A cycle was detected in the base-class DAG during inheritance
    /// finalization. The cycle is reported and then broken, so this is
    /// carried in `BuildReport::warnings`, not propagated as a hard error.
    #[error("inheritance cycle detected: {}", format_cycle(.0))]
    FinalizerCycle(Vec<SymbolId>),

    /// The persisted binary format could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An invariant of the symbol store was violated. Unlike the other
    /// variants this is not recoverable and should abort the pass.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

fn format_cycle(ids: &[SymbolId]) -> String {
    ids.iter()
        .map(|id| id.to_hex())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Aggregate result of a corpus build: one error per translation unit that
/// failed outright, plus the summary counts and warnings a caller reports
/// at `info`/`warn` level.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub tu_failures: Vec<(String, CoreError)>,
    pub warnings: Vec<String>,
    pub extraction_mode_counts: std::collections::BTreeMap<&'static str, usize>,
}

impl BuildReport {
    pub fn push_failure(&mut self, tu: impl Into<String>, err: CoreError) {
        self.tu_failures.push((tu.into(), err));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.tu_failures.is_empty()
    }

    /// Exit disposition a caller's CLI can map to a process exit code.
    /// `ignore_failures` downgrades a dirty build to `PartialSuccess`
    /// instead of `Failure`, per `Config::ignore_failures`.
    pub fn disposition(&self, ignore_failures: bool) -> ExitDisposition {
        if self.is_clean() {
            ExitDisposition::Success
        } else if ignore_failures {
            ExitDisposition::PartialSuccess
        } else {
            ExitDisposition::Failure
        }
    }
}

/// Stabilized exit-code intent. The core never
/// calls `std::process::exit` itself; a caller's CLI maps this to a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    Success,
    PartialSuccess,
    Failure,
}

pub type Result<T> = std::result::Result<T, CoreError>;
