//! Incremental bundle builds over an asset dependency graph.
//!
//! A [`BuildSession`] discovers and classifies the graph, decides per asset
//! whether its bundle must be rebuilt by comparing against the fingerprint
//! store of the previous build, compiles the bundles that need it through a
//! [`BundleCompiler`], and persists manifests, the dependency table and the
//! updated fingerprint store.

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod export;
pub mod planner;
pub mod report;
pub mod session;
pub mod settings;

pub use compiler::{BundleCompiler, CompileError, CompileJob, CompiledBundle};
pub use error::BuildError;
pub use planner::{hash_assets, plan, Plan, PlanEntry, PlanSummary};
pub use report::BuildReport;
pub use session::BuildSession;
pub use settings::BuildSettings;
