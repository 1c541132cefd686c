//! In-memory fakes for the index traits, shared by the engine tests.

use async_trait::async_trait;
use reconcile_core::{AclTuple, CorrectiveStatus, ReconcileError, Result};
use reconcile_index_client::{IndexAdmin, IndexQuery, LookupRequest, ResultPage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fake query endpoint backed by per-field id sets plus canned error-doc
/// and ancestor-doc lists.
#[derive(Default)]
pub struct FakeIndex {
    fields: HashMap<String, Vec<u64>>,
    error_docs: Vec<u64>,
    ancestor_docs: HashMap<u64, Vec<u64>>,
    lookups: AtomicUsize,
}

impl FakeIndex {
    pub fn with_nodes(ids: &[u64]) -> Self {
        Self::default().with_kind("node_id", ids)
    }

    pub fn with_kind(mut self, field: &str, ids: &[u64]) -> Self {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        self.fields.insert(field.to_string(), ids);
        self
    }

    pub fn with_error_docs(mut self, ids: &[u64]) -> Self {
        self.error_docs = ids.to_vec();
        self
    }

    pub fn with_ancestor_docs(mut self, ancestor: u64, ids: &[u64]) -> Self {
        self.ancestor_docs.insert(ancestor, ids.to_vec());
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn page(all: &[u64], request: &LookupRequest) -> ResultPage {
        let start = request.start.min(all.len());
        let end = (start + request.rows).min(all.len());
        ResultPage {
            total: all.len() as u64,
            ids: all[start..end].to_vec(),
        }
    }
}

#[async_trait]
impl IndexQuery for FakeIndex {
    async fn lookup(&self, request: &LookupRequest) -> Result<ResultPage> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let q = request.query.as_str();

        if q == "doc_type:error" {
            return Ok(Self::page(&self.error_docs, request));
        }
        if let Some(rest) = q.strip_prefix("ancestor:") {
            let ancestor: u64 = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| ReconcileError::MalformedResponse("bad fake query".into()))?;
            let docs = self.ancestor_docs.get(&ancestor).cloned().unwrap_or_default();
            return Ok(Self::page(&docs, request));
        }

        // Disjunction lookup: "(field:(1 OR 2)) AND doc_type:...".
        let inner = q
            .split(":(")
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .ok_or_else(|| ReconcileError::MalformedResponse("bad fake query".into()))?;
        let requested: Vec<u64> = inner
            .split(" OR ")
            .filter_map(|v| v.trim().parse().ok())
            .collect();
        let present = self
            .fields
            .get(&request.id_field)
            .cloned()
            .unwrap_or_default();
        let matched: Vec<u64> = requested
            .into_iter()
            .filter(|id| present.binary_search(id).is_ok())
            .collect();
        Ok(ResultPage {
            total: matched.len() as u64,
            ids: matched,
        })
    }
}

/// What a [`FakeAdmin`] instance received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    ReindexNode(u64),
    ReindexAcl(AclTuple),
    ReindexTxn(u64),
    ReindexChangeset(u64),
    PurgeNode(u64),
}

/// Fake corrective endpoint recording every call; selected node ids can be
/// made to fail with HTTP 500 or to fail transport entirely.
pub struct FakeAdmin {
    endpoint: String,
    pub calls: Mutex<Vec<AdminCall>>,
    reject_nodes: Vec<u64>,
    transport_fail: bool,
}

impl FakeAdmin {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            calls: Mutex::new(Vec::new()),
            reject_nodes: Vec::new(),
            transport_fail: false,
        }
    }

    pub fn rejecting_nodes(mut self, ids: &[u64]) -> Self {
        self.reject_nodes = ids.to_vec();
        self
    }

    pub fn failing_transport(mut self) -> Self {
        self.transport_fail = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: AdminCall) -> Result<CorrectiveStatus> {
        if self.transport_fail {
            return Err(ReconcileError::Transport(format!(
                "{} unreachable",
                self.endpoint
            )));
        }
        let rejected = matches!(
            call,
            AdminCall::ReindexNode(id) | AdminCall::PurgeNode(id)
                if self.reject_nodes.contains(&id)
        );
        self.calls.lock().unwrap().push(call);
        if rejected {
            Ok(CorrectiveStatus::Rejected {
                status: 500,
                body: "simulated failure".to_string(),
            })
        } else {
            Ok(CorrectiveStatus::Scheduled)
        }
    }
}

#[async_trait]
impl IndexAdmin for FakeAdmin {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn reindex_node(&self, node_id: u64) -> Result<CorrectiveStatus> {
        self.record(AdminCall::ReindexNode(node_id))
    }

    async fn reindex_acl(&self, tuple: AclTuple) -> Result<CorrectiveStatus> {
        self.record(AdminCall::ReindexAcl(tuple))
    }

    async fn reindex_txn(&self, txn_id: u64) -> Result<CorrectiveStatus> {
        self.record(AdminCall::ReindexTxn(txn_id))
    }

    async fn reindex_changeset(&self, changeset_id: u64) -> Result<CorrectiveStatus> {
        self.record(AdminCall::ReindexChangeset(changeset_id))
    }

    async fn purge_node(&self, node_id: u64) -> Result<CorrectiveStatus> {
        self.record(AdminCall::PurgeNode(node_id))
    }
}
