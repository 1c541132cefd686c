use crate::{ReconcileError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where the source dataset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingStore {
    /// A pre-extracted flat file of `node acl txn changeset` rows.
    File,
}

/// How index-side node discovery is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    /// Verify by id ranges only; no path scan.
    DbRange,
    /// Additionally walk documents under a starting ancestor node, which
    /// enables purge-candidate detection.
    Ancestor,
}

/// TLS client-certificate material for mutual-TLS index deployments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsOptions {
    /// PEM file holding the client certificate chain and private key.
    pub identity_pem: Option<PathBuf>,
    /// PEM file with an additional root CA to trust.
    pub ca_pem: Option<PathBuf>,
    /// Skip server certificate verification (test deployments only).
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Immutable run configuration. Constructed once at startup (TOML file plus
/// flag overrides) and passed by reference to every component.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Backing-store selector; only `file` is supported in-process.
    #[serde(default = "default_backing_store")]
    pub backing_store: String,

    /// Dataset file for the `file` backing store.
    pub dataset_file: Option<PathBuf>,

    /// Connection string kept for operators migrating from direct-extraction
    /// setups; selecting a database store fails with guidance.
    pub db_url: Option<String>,

    /// Base URL of the primary index instance.
    pub index_url: String,

    /// Shared secret attached to every index request as a header.
    pub shared_secret: Option<String>,

    #[serde(default = "default_verify_batch")]
    pub verify_batch_size: usize,

    #[serde(default = "default_scan_batch")]
    pub error_scan_batch_size: usize,

    #[serde(default = "default_scan_batch")]
    pub path_scan_batch_size: usize,

    /// Base directory for per-run working files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Default starting node id; the ancestor strategy walks documents
    /// under this node.
    #[serde(default)]
    pub range_start: u64,

    /// Query strategy selector: `db-range` or `ancestor`.
    #[serde(default = "default_query_strategy")]
    pub query_strategy: String,

    #[serde(default)]
    pub tls: TlsOptions,

    /// Nominated shard used as the query target.
    pub shard: Option<String>,

    /// All shards; when non-empty, lookups ask the index to consult every
    /// shard rather than only the routed one.
    #[serde(default)]
    pub shard_list: Vec<String>,

    /// Additional index instances (replicas) that must receive every
    /// corrective request.
    #[serde(default)]
    pub extra_instances: Vec<String>,

    /// Dispatch to all instances concurrently per item.
    #[serde(default)]
    pub parallel_dispatch: bool,

    /// Reindex missing transactions and change-sets. Off in multi-shard
    /// deployments where a transaction reindex fans out to every shard.
    #[serde(default = "default_true")]
    pub reindex_transactions: bool,

    /// Also reindex transactions related to corrected nodes.
    #[serde(default)]
    pub reindex_related_transactions: bool,
}

fn default_backing_store() -> String {
    "file".to_string()
}

fn default_query_strategy() -> String {
    "db-range".to_string()
}

fn default_verify_batch() -> usize {
    100
}

fn default_scan_batch() -> usize {
    1000
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".reconcile")
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw).map_err(|e| {
            ReconcileError::UnsupportedConfig(format!("invalid config file {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    /// Resolve the backing-store selector, failing with guidance for
    /// recognized-but-external kinds.
    pub fn backing_store(&self) -> Result<BackingStore> {
        match self.backing_store.as_str() {
            "file" => Ok(BackingStore::File),
            kind @ ("postgres" | "mysql" | "oracle") => Err(ReconcileError::UnsupportedConfig(
                format!(
                    "backing store '{kind}' requires a prior extraction step; \
                     extract the dataset to a file and set backing_store = \"file\""
                ),
            )),
            other => Err(ReconcileError::UnsupportedConfig(format!(
                "unknown backing store '{other}' (expected 'file')"
            ))),
        }
    }

    pub fn query_strategy(&self) -> Result<QueryStrategy> {
        match self.query_strategy.as_str() {
            "db-range" => Ok(QueryStrategy::DbRange),
            "ancestor" => Ok(QueryStrategy::Ancestor),
            other => Err(ReconcileError::UnsupportedConfig(format!(
                "unknown query strategy '{other}' (expected 'db-range' or 'ancestor')"
            ))),
        }
    }

    /// Every instance that must receive corrective requests, primary first.
    pub fn instances(&self) -> Vec<String> {
        let mut urls = vec![self.index_url.clone()];
        urls.extend(self.extra_instances.iter().cloned());
        urls
    }

    /// Fail fast on selector typos and missing dataset input, before any
    /// network or filesystem work.
    pub fn validate(&self) -> Result<()> {
        let store = self.backing_store()?;
        self.query_strategy()?;
        if store == BackingStore::File && self.dataset_file.is_none() {
            return Err(ReconcileError::UnsupportedConfig(
                "backing_store = \"file\" requires dataset_file".to_string(),
            ));
        }
        if self.verify_batch_size == 0 {
            return Err(ReconcileError::UnsupportedConfig(
                "verify_batch_size must be at least 1".to_string(),
            ));
        }
        if self.error_scan_batch_size == 0 || self.path_scan_batch_size == 0 {
            return Err(ReconcileError::UnsupportedConfig(
                "scan batch sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
