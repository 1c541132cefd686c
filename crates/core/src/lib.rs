//! # Reconcile Core
//!
//! Data model and working storage for the index reconciler.
//!
//! ## Pipeline
//!
//! ```text
//! Source dataset
//!     │
//!     ├──> Canonical sets (dedup + sort, per kind)
//!     │       └─> Batch verification against the index
//!     │               └─> Missing sets
//!     │
//!     └──> Working files (one artifact per set, per run)
//!             └─> Corrective dispatch (reindex / purge)
//! ```
//!
//! Everything here is synchronous and network-free; the engine and client
//! crates layer the index protocol on top.

mod canonical;
mod config;
mod error;
mod failure_log;
mod record;
pub mod setops;
mod workdir;

pub use canonical::{AclTuple, CanonicalSet, CanonicalSets, ItemKind};
pub use config::{BackingStore, Config, QueryStrategy, TlsOptions};
pub use error::{CorrectiveStatus, ReconcileError, Result};
pub use failure_log::FailureLog;
pub use record::{read_records, SourceRecord};
pub use workdir::WorkingStore;
