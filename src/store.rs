//! Symbol store and corpus builder.
//!
//! The store is content-addressed: `SymbolId -> Symbol`. During
//! extraction it is mutated under a single mutex; `SymbolStore::finalize` consumes the
//! builder and hands back a `FinalizedStore` whose `find` is wait-free.

use crate::config::{Config, Diagnostics};
use crate::error::{BuildReport, CoreError, Result};
use crate::id::SymbolId;
use crate::symbol::{ExtractionMode, Symbol, SymbolKind};
use fnv::FnvHashMap;
use std::sync::Mutex;

/// A textual or id-based reference the front-end could not resolve while
/// processing one translation unit.
#[derive(Debug, Clone)]
pub struct UnresolvedRef {
    pub usr_or_name: String,
}

/// Per-TU collection of unresolved references, owned exclusively by the
/// task processing that TU.
#[derive(Debug, Default)]
pub struct MissingSink {
    refs: Vec<UnresolvedRef>,
}

impl MissingSink {
    pub fn push(&mut self, usr_or_name: impl Into<String>) {
        self.refs.push(UnresolvedRef {
            usr_or_name: usr_or_name.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn drain(&mut self) -> Vec<UnresolvedRef> {
        std::mem::take(&mut self.refs)
    }
}

/// What one `extract` call for a translation unit produced.
#[derive(Debug, Default)]
pub struct ExtractionOutput {
    pub symbols: Vec<Symbol>,
}

/// A virtual file system the core hands to the front-end so shim headers
/// for missing symbols can be injected without touching real files. The
/// core only tracks which shims were written; the actual `-include`
/// wiring into the compiler invocation is a front-end concern.
#[derive(Debug, Default)]
pub struct VirtualFileSystem {
    shims: Vec<(String, String)>,
}

impl VirtualFileSystem {
    pub fn write_shim(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.shims.push((path.into(), contents.into()));
    }

    pub fn shims(&self) -> &[(String, String)] {
        &self.shims
    }
}

/// External collaborator producing partial `Symbol`s for one translation
/// unit. `tu_id` identifies the
/// translation unit for error reporting and retry bookkeeping.
pub trait FrontEnd: Send + Sync {
    fn extract(
        &self,
        tu_id: &str,
        vfs: &mut VirtualFileSystem,
        sink: &mut MissingSink,
    ) -> Result<ExtractionOutput>;
}

/// Test double backed by a fixed `Vec<Symbol>`, ignoring the shim-retry
/// machinery — exercises the builder without a real compiler.
pub struct StaticFrontEnd {
    pub symbols: Vec<Symbol>,
}

impl FrontEnd for StaticFrontEnd {
    fn extract(
        &self,
        _tu_id: &str,
        _vfs: &mut VirtualFileSystem,
        _sink: &mut MissingSink,
    ) -> Result<ExtractionOutput> {
        Ok(ExtractionOutput {
            symbols: self.symbols.clone(),
        })
    }
}

/// Merge two declarations of the same `SymbolId`:
/// union member lists, fold source locations, take the strictest
/// extraction mode, retain the first non-empty doc comment, OR flag
/// bit-sets.
fn merge_symbol(existing: &mut Symbol, incoming: Symbol) -> Result<()> {
    if existing.name != incoming.name && !existing.name.is_empty() && !incoming.name.is_empty() {
        return Err(CoreError::Merge {
            id: existing.id,
            message: format!(
                "conflicting names '{}' vs '{}' for the same id",
                existing.name, incoming.name
            ),
        });
    }
    if existing.parent.is_none() {
        existing.parent = incoming.parent;
    }
    existing.extraction_mode = existing.extraction_mode.max(incoming.extraction_mode);

    if let Some(def) = incoming.definition {
        existing.definition.get_or_insert(def);
    }
    for decl in incoming.declarations {
        if !existing.declarations.contains(&decl) {
            existing.declarations.push(decl);
        }
    }

    if existing.doc.as_ref().map(|d| d.is_empty()).unwrap_or(true) {
        if let Some(doc) = incoming.doc {
            if !doc.is_empty() {
                existing.doc = Some(doc);
            }
        }
    }

    merge_kind(&mut existing.kind, incoming.kind)
}

fn merge_kind(existing: &mut SymbolKind, incoming: SymbolKind) -> Result<()> {
    use SymbolKind::*;
    match (existing, incoming) {
        (Namespace(e), Namespace(i)) => {
            union_ids(&mut e.members, i.members);
            union_ids(&mut e.using_directives, i.using_directives);
            e.is_inline |= i.is_inline;
            e.is_anonymous |= i.is_anonymous;
            Ok(())
        }
        (Record(e), Record(i)) => {
            union_ids(&mut e.public_members, i.public_members);
            union_ids(&mut e.protected_members, i.protected_members);
            union_ids(&mut e.private_members, i.private_members);
            union_ids(&mut e.friends, i.friends);
            union_ids(&mut e.specializations, i.specializations);
            if e.bases.is_empty() {
                e.bases = i.bases;
            }
            if e.template.is_none() {
                e.template = i.template;
            }
            e.flags.is_final |= i.flags.is_final;
            e.flags.is_abstract |= i.flags.is_abstract;
            Ok(())
        }
        (Function(e), Function(i)) => {
            e.flags.merge(&i.flags);
            if e.template.is_none() {
                e.template = i.template;
            }
            Ok(())
        }
        (Enum(e), Enum(i)) => {
            union_ids(&mut e.constants, i.constants);
            if e.underlying.is_none() {
                e.underlying = i.underlying;
            }
            Ok(())
        }
        (a, b) => {
            if std::mem::discriminant(&*a) != std::mem::discriminant(&b) {
                // Different kinds for the same id is an internal invariant
                // violation, not a recoverable merge conflict: content
                // addressing guarantees one USR maps to one kind.
                return Err(CoreError::Internal(
                    "merge of symbols with differing kinds for the same id".into(),
                ));
            }
            *a = b;
            Ok(())
        }
    }
}

fn union_ids(existing: &mut Vec<SymbolId>, incoming: Vec<SymbolId>) {
    for id in incoming {
        if !existing.contains(&id) {
            existing.push(id);
        }
    }
}

/// The mutable store used during extraction.
pub struct SymbolStore {
    inner: Mutex<FnvHashMap<SymbolId, Symbol>>,
    insertion_order: Mutex<Vec<SymbolId>>,
}

impl Default for SymbolStore {
    fn default() -> Self {
        SymbolStore {
            inner: Mutex::new(FnvHashMap::default()),
            insertion_order: Mutex::new(Vec::new()),
        }
    }
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one symbol: insert if absent, else
    /// merge. Idempotent — ingesting the same symbol twice is a no-op
    /// beyond the first merge.
    pub fn ingest(&self, symbol: Symbol) -> Result<()> {
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(&symbol.id) {
            Some(existing) => merge_symbol(existing, symbol),
            None => {
                self.insertion_order.lock().unwrap().push(symbol.id);
                map.insert(symbol.id, symbol);
                Ok(())
            }
        }
    }

    pub fn find(&self, id: SymbolId) -> Option<Symbol> {
        self.inner.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Consume the builder, producing an immutable, wait-free-readable
    /// store.
    pub fn finalize(self) -> FinalizedStore {
        let map = self.inner.into_inner().unwrap();
        let order = self.insertion_order.into_inner().unwrap();
        FinalizedStore { map, order }
    }
}

/// The immutable, finalized symbol store the finalizer passes and
/// lookup engine operate on.
#[derive(Debug, Clone)]
pub struct FinalizedStore {
    map: FnvHashMap<SymbolId, Symbol>,
    order: Vec<SymbolId>,
}

impl FinalizedStore {
    /// Rebuild a finalized store from a flat symbol list, preserving the
    /// given order (used by the persisted-format reader in `serialize`,
    /// where the on-disk block sequence already carries the original
    /// insertion order).
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        let mut map = FnvHashMap::default();
        let mut order = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            order.push(symbol.id);
            map.insert(symbol.id, symbol);
        }
        FinalizedStore { map, order }
    }

    pub fn find(&self, id: SymbolId) -> Option<&Symbol> {
        self.map.get(&id)
    }

    pub fn find_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.map.get_mut(&id)
    }

    /// All symbols in stable insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().filter_map(move |id| self.map.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn insert_synthetic(&mut self, symbol: Symbol) {
        if !self.map.contains_key(&symbol.id) {
            self.order.push(symbol.id);
        }
        self.map.insert(symbol.id, symbol);
    }

    /// Invariant I1: every non-null parent id exists in the store.
    pub fn check_parents_exist(&self) -> Vec<SymbolId> {
        self.map
            .values()
            .filter_map(|s| s.parent)
            .filter(|p| p.is_valid() && !p.is_global() && !self.map.contains_key(p))
            .collect()
    }

    pub fn extraction_mode_counts(&self) -> std::collections::BTreeMap<&'static str, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for s in self.map.values() {
            let key = match s.extraction_mode {
                ExtractionMode::Regular => "regular",
                ExtractionMode::SeeBelow => "see-below",
                ExtractionMode::ImplementationDefined => "implementation-defined",
                ExtractionMode::Dependency => "dependency",
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}

/// Drives per-TU extraction with a bounded retry loop, merges the
/// results into a `SymbolStore`, and produces a `BuildReport`.
pub struct CorpusBuilder<'a> {
    config: &'a Config,
    diagnostics: &'a dyn Diagnostics,
    store: SymbolStore,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(config: &'a Config, diagnostics: &'a dyn Diagnostics) -> Self {
        CorpusBuilder {
            config,
            diagnostics,
            store: SymbolStore::new(),
        }
    }

    /// Process one translation unit, retrying up to `Config::retry_limit`
    /// times while the front-end's missing-symbol sink keeps growing.
    pub fn build_tu(&self, tu_id: &str, front_end: &dyn FrontEnd, report: &mut BuildReport) {
        let mut vfs = VirtualFileSystem::default();
        let mut sink = MissingSink::default();
        let mut previous_len = usize::MAX;

        for attempt in 0..self.config.retry_limit.max(1) {
            let output = match front_end.extract(tu_id, &mut vfs, &mut sink) {
                Ok(o) => o,
                Err(e) => {
                    self.diagnostics
                        .error(&format!("TU '{tu_id}' failed to run on attempt {attempt}: {e}"));
                    report.push_failure(tu_id, e);
                    return;
                }
            };

            for symbol in output.symbols {
                if let Err(e) = self.store.ingest(symbol) {
                    self.diagnostics.warn(&format!("merge error in TU '{tu_id}': {e}"));
                    report.warn(format!("{tu_id}: {e}"));
                }
            }

            if sink.is_empty() {
                return;
            }
            let current_len = sink.len();
            if current_len >= previous_len {
                // Sink stopped growing: stop retrying.
                return;
            }
            previous_len = current_len;

            let missing = sink.drain();
            for m in &missing {
                vfs.write_shim(
                    format!("__mrdocs_shim_{}.h", m.usr_or_name.len()),
                    format!("// shim declaration for {}\n", m.usr_or_name),
                );
            }
        }
    }

    pub fn into_store(self) -> SymbolStore {
        self.store
    }
}
