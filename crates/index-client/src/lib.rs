//! # Reconcile Index Client
//!
//! HTTP access to the search index: batched existence lookups against the
//! query endpoint and reindex/purge requests against the corrective
//! endpoint. The [`IndexQuery`] and [`IndexAdmin`] traits are the seam the
//! engine is written against; [`HttpIndex`] is the production
//! implementation, one per configured instance.

mod client;
mod envelope;
pub mod query;

pub use client::{HttpIndex, IndexAdmin, IndexQuery, LookupRequest, SECRET_HEADER};
pub use envelope::{parse_result_page, ResultPage};
