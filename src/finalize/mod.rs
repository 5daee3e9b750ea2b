//! The post-extraction finalizer pipeline: passes run in
//! strict order A→B→C→D→E, each assuming the previous has completed for
//! every symbol.

pub mod doccomment;
pub mod inherit;
pub mod overload;
pub mod reference;
pub mod sort;

use crate::config::{Config, Diagnostics};
use crate::error::BuildReport;
use crate::store::FinalizedStore;

/// Run every finalizer pass in order, mutating `store` in place.
pub fn run_all(store: &mut FinalizedStore, config: &Config, diagnostics: &dyn Diagnostics, report: &mut BuildReport) {
    diagnostics.info("finalizer pass A (reference resolver) starting");
    reference::run(store, diagnostics);
    diagnostics.info("finalizer pass A complete");

    diagnostics.info("finalizer pass B (inheritance) starting");
    let cycles = inherit::run(store, config.inherit_base_members, diagnostics);
    for cycle in cycles {
        report.warn(format!(
            "inheritance cycle broken: {}",
            cycle.iter().map(|id| id.to_hex()).collect::<Vec<_>>().join(" -> ")
        ));
    }
    diagnostics.info("finalizer pass B complete");

    if config.overloads {
        diagnostics.info("finalizer pass C (overload grouper) starting");
        overload::run(store);
        diagnostics.info("finalizer pass C complete");
    }

    diagnostics.info("finalizer pass D (doc-comment finalizer) starting");
    let warnings = doccomment::run(store, config);
    for w in warnings {
        report.warn(w);
    }
    diagnostics.info("finalizer pass D complete");

    diagnostics.info("finalizer pass E (sort) starting");
    sort::run(store);
    diagnostics.info("finalizer pass E complete");

    for (tag, count) in store.extraction_mode_counts() {
        report.extraction_mode_counts.insert(tag, count);
        diagnostics.info(&format!("{count} symbols with extraction mode '{tag}'"));
    }
}
