//! `mrdocs-core`: the symbol graph, finalizer pipeline, and lookup
//! engine at the core of a C++ documentation generator.
//!
//! This crate sits between two external collaborators it never
//! constructs itself: a *front-end* that turns compiled translation
//! units into partial [`symbol::Symbol`] records (see [`store::FrontEnd`]),
//! and a *back-end* that renders a [`store::FinalizedStore`] plus a
//! [`lookup::SymbolLookup`] into documentation pages. Everything in
//! between — content-addressed storage, cross-reference resolution,
//! inheritance/overload/sort finalization, doc-comment synthesis, name
//! lookup, and legible-name allocation — lives here.
//!
//! The top-level entry point for driving a whole corpus build is
//! [`driver::build_corpus`].

pub mod config;
pub mod doc;
pub mod driver;
pub mod error;
pub mod finalize;
pub mod id;
pub mod legible;
pub mod lookup;
pub mod nameparser;
pub mod names;
pub mod operator;
pub mod serialize;
pub mod store;
pub mod symbol;
pub mod template;
pub mod types;

pub use config::{Config, Diagnostics, TracingDiagnostics};
pub use error::{BuildReport, CoreError, ExitDisposition, Result};
pub use id::SymbolId;
pub use lookup::{LookupOutcome, SymbolLookup};
pub use store::{FinalizedStore, FrontEnd};
pub use symbol::Symbol;
