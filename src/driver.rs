//! Top-level corpus-build driver.
//!
//! Wires together the pieces the other modules only describe in
//! isolation: a bounded `rayon` worker pool processes translation units
//! concurrently — one [`store::CorpusBuilder::build_tu`] task per TU,
//! each owning its own [`store::VirtualFileSystem`] and
//! [`store::MissingSink`] — merging into the single
//! [`store::SymbolStore`] under its internal mutex, then runs the
//! finalizer passes A→E in strict sequence once every TU has completed.
//!
//! `rayon` rather than an async runtime: extraction is CPU-bound merge
//! work under a mutex, not I/O to await.

use crate::config::{Config, Diagnostics};
use crate::error::BuildReport;
use crate::finalize;
use crate::store::{CorpusBuilder, FinalizedStore, FrontEnd};
use std::sync::Mutex;

/// One translation unit to extract: an opaque id (used for diagnostics
/// and retry bookkeeping) plus the front-end that knows how to extract
/// it.
pub struct TranslationUnit<'a> {
    pub id: String,
    pub front_end: &'a (dyn FrontEnd + 'a),
}

/// Build a whole corpus: extract every translation unit in parallel,
/// merge into one symbol store, then run the finalizer pipeline.
///
/// Returns the finalized store plus the aggregated [`BuildReport`]. A
/// caller maps `report.disposition(config.ignore_failures)` to its own
/// process exit code.
pub fn build_corpus(config: &Config, diagnostics: &dyn Diagnostics, tus: &[TranslationUnit<'_>]) -> (FinalizedStore, BuildReport) {
    let builder = CorpusBuilder::new(config, diagnostics);
    let report = Mutex::new(BuildReport::default());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.resolved_thread_count())
        .build()
        .expect("thread pool with a positive thread count always builds");

    pool.install(|| {
        use rayon::prelude::*;
        tus.par_iter().for_each(|tu| {
            let mut local_report = BuildReport::default();
            builder.build_tu(&tu.id, tu.front_end, &mut local_report);
            let mut shared = report.lock().unwrap();
            shared.tu_failures.extend(local_report.tu_failures);
            shared.warnings.extend(local_report.warnings);
        });
    });

    let mut report = report.into_inner().unwrap();
    let mut store = builder.into_store().finalize();
    diagnostics.info(&format!("{} translation units merged into {} symbols", tus.len(), store.len()));
    finalize::run_all(&mut store, config, diagnostics, &mut report);

    let dangling = store.check_parents_exist();
    for id in dangling {
        report.warn(format!("symbol {} has a parent id not present in the store (invariant I1)", id.to_hex()));
    }

    (store, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectingDiagnostics;
    use crate::store::{ExtractionOutput, MissingSink, VirtualFileSystem};
    use crate::symbol::{NamespaceSymbol, Symbol, SymbolKind};
    use crate::id::SymbolId;

    struct OneNamespace(String);

    impl FrontEnd for OneNamespace {
        fn extract(&self, _tu_id: &str, _vfs: &mut VirtualFileSystem, _sink: &mut MissingSink) -> crate::error::Result<ExtractionOutput> {
            let id = SymbolId::from_usr(&self.0);
            Ok(ExtractionOutput {
                symbols: vec![Symbol::new(
                    id,
                    &self.0,
                    SymbolKind::Namespace(NamespaceSymbol {
                        members: vec![],
                        using_directives: vec![],
                        is_inline: false,
                        is_anonymous: false,
                    }),
                )],
            })
        }
    }

    #[test]
    fn parallel_build_merges_every_tu() {
        let config = Config {
            thread_count: 4,
            ..Config::default()
        };
        let diagnostics = CollectingDiagnostics::default();
        let fe_a = OneNamespace("a".into());
        let fe_b = OneNamespace("b".into());
        let fe_c = OneNamespace("c".into());
        let tus = vec![
            TranslationUnit { id: "tu_a".into(), front_end: &fe_a },
            TranslationUnit { id: "tu_b".into(), front_end: &fe_b },
            TranslationUnit { id: "tu_c".into(), front_end: &fe_c },
        ];
        let (store, report) = build_corpus(&config, &diagnostics, &tus);
        assert!(report.is_clean());
        assert_eq!(store.len(), 3);
    }
}
