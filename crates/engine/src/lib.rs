//! # Reconcile Engine
//!
//! The reconciliation pipeline over a source dataset and a search index.
//!
//! ```text
//! Source records
//!     │
//!     ├──> Canonicalizer (dedup + sort per kind)
//!     │       └─> Batch Verifier (one lookup per batch)
//!     │               └─> Missing sets
//!     │                       │
//!     ├──> Error/Path Scanner ──> Cross-Checker
//!     │                               │
//!     └───────────────────────────────┴─> Corrective Dispatcher
//!                                           (reindex / purge, per instance)
//! ```
//!
//! Components talk to the index only through the
//! [`IndexQuery`](reconcile_index_client::IndexQuery) and
//! [`IndexAdmin`](reconcile_index_client::IndexAdmin) traits.

mod canonicalize;
mod crosscheck;
mod dispatch;
mod kinds;
mod pipeline;
mod scan;
mod summary;
mod verify;

#[cfg(test)]
mod testing;

pub use canonicalize::canonicalize;
pub use crosscheck::{merge_error_nodes, purge_candidates};
pub use dispatch::{DispatchCounts, Dispatcher};
pub use kinds::{descriptor, KindDescriptor};
pub use pipeline::Pipeline;
pub use scan::Scanner;
pub use summary::{KindSummary, RunSummary};
pub use verify::BatchVerifier;
