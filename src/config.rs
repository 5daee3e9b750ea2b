//! Externally supplied configuration and diagnostics sink.
//!
//! CLI parsing and YAML loading are explicitly out of scope; callers build
//! a `Config` however they like (a CLI, a YAML loader, a test literal) and
//! hand it to the corpus builder. We still derive `serde`/`schemars` so a
//! caller's own loader has something to deserialize into and validate
//! against.

use once_cell::sync::OnceCell;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How aggressively referenced-but-not-directly-extracted declarations are
/// retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencedDecls {
    Never,
    Dependency,
    Always,
}

/// Inheritance-finalizer policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum InheritPolicy {
    Never,
    NonEmpty,
    Always,
}

/// A filesystem/symbol-name glob pattern (`*`, `?`), translated to an
/// anchored regex rather than pulling in a dedicated glob crate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GlobPattern {
    raw: String,
    #[serde(skip)]
    #[schemars(skip)]
    compiled: OnceCell<Regex>,
}

impl GlobPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        GlobPattern {
            raw: pattern.into(),
            compiled: OnceCell::new(),
        }
    }

    /// The anchored regex for this pattern, compiled once and cached for
    /// the lifetime of this `GlobPattern` — a pattern is checked against
    /// every candidate symbol name in a scope, so recompiling per call
    /// would be wasted work on anything but a one-shot match.
    fn regex(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            let mut anchored = String::from("^");
            for c in self.raw.chars() {
                match c {
                    '*' => anchored.push_str(".*"),
                    '?' => anchored.push('.'),
                    c if "\\.+()|[]{}^$".contains(c) => {
                        anchored.push('\\');
                        anchored.push(c);
                    }
                    c => anchored.push(c),
                }
            }
            anchored.push('$');
            Regex::new(&anchored).expect("glob-derived regex is always valid")
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex().is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl Eq for GlobPattern {}

/// The enumerated option set consumed from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub extract_all: bool,
    pub referenced_declarations: ReferencedDecls,
    pub inherit_base_members: InheritPolicy,
    pub overloads: bool,
    pub multi_page: bool,
    pub legible_names: bool,
    pub ignore_failures: bool,
    pub thread_count: usize,
    pub warn_if_undocumented: bool,
    pub symbol_patterns: Vec<GlobPattern>,
    pub file_patterns: Vec<GlobPattern>,
    /// Bound on shim-retry attempts per translation unit.
    pub retry_limit: usize,
    /// Curated list of SFINAE-unwrap alias names.
    pub sfinae_aliases: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extract_all: false,
            referenced_declarations: ReferencedDecls::Dependency,
            inherit_base_members: InheritPolicy::NonEmpty,
            overloads: true,
            multi_page: true,
            legible_names: true,
            ignore_failures: false,
            thread_count: 0,
            warn_if_undocumented: false,
            symbol_patterns: Vec::new(),
            file_patterns: Vec::new(),
            retry_limit: 1000,
            sfinae_aliases: vec![
                "enable_if".to_string(),
                "enable_if_t".to_string(),
                "void_t".to_string(),
            ],
        }
    }
}

impl Config {
    /// Resolved worker-pool size: `thread_count` when set, otherwise the
    /// platform's available parallelism.
    pub fn resolved_thread_count(&self) -> usize {
        if self.thread_count > 0 {
            self.thread_count
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// Diagnostics sink: `info`/`warn`/`error`/`debug`/`trace`.
/// Passed in explicitly rather than constructed by the core, so no
/// global logger singleton needs to exist for this crate to emit
/// diagnostics.
pub trait Diagnostics: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
    fn trace(&self, message: &str);
}

/// Default sink delegating to `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
    fn trace(&self, message: &str) {
        tracing::trace!("{}", message);
    }
}

/// Test double that records emitted messages instead of logging them.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    pub infos: std::sync::Mutex<Vec<String>>,
    pub warnings: std::sync::Mutex<Vec<String>>,
    pub errors: std::sync::Mutex<Vec<String>>,
}

impl Diagnostics for CollectingDiagnostics {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
    fn debug(&self, _message: &str) {}
    fn trace(&self, _message: &str) {}
}
