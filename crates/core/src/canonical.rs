use crate::record::SourceRecord;
use crate::setops::sort_dedup;
use serde::{Deserialize, Serialize};

/// The four identifier kinds tracked by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Nodes,
    Acls,
    Transactions,
    Changesets,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Nodes,
        ItemKind::Acls,
        ItemKind::Transactions,
        ItemKind::Changesets,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ItemKind::Nodes => "nodes",
            ItemKind::Acls => "acls",
            ItemKind::Transactions => "transactions",
            ItemKind::Changesets => "changesets",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated, ascending-sorted identifiers of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSet {
    pub kind: ItemKind,
    ids: Vec<u64>,
}

impl CanonicalSet {
    /// Build from raw ids; sorts and deduplicates before anything can read
    /// the set.
    pub fn new(kind: ItemKind, mut ids: Vec<u64>) -> Self {
        sort_dedup(&mut ids);
        Self { kind, ids }
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn max_id(&self) -> Option<u64> {
        self.ids.last().copied()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.binary_search(&id).is_ok()
    }
}

/// An ACL id together with the transaction/change-set context required to
/// reindex it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AclTuple {
    pub acl_id: u64,
    pub txn_id: u64,
    pub changeset_id: u64,
}

/// Everything the Canonicalizer derives from one dataset read.
#[derive(Debug, Clone)]
pub struct CanonicalSets {
    pub nodes: CanonicalSet,
    pub acls: CanonicalSet,
    pub transactions: CanonicalSet,
    pub changesets: CanonicalSet,
    /// Deduplicated `(acl, txn, changeset)` tuples, sorted by acl id.
    pub acl_tuples: Vec<AclTuple>,
}

impl CanonicalSets {
    pub fn from_records(records: &[SourceRecord]) -> Self {
        let nodes = records.iter().map(|r| r.node_id).collect();
        let acls = records.iter().map(|r| r.acl_id).collect();
        let transactions = records.iter().map(|r| r.txn_id).collect();
        let changesets = records.iter().map(|r| r.changeset_id).collect();

        let mut acl_tuples: Vec<AclTuple> = records
            .iter()
            .map(|r| AclTuple {
                acl_id: r.acl_id,
                txn_id: r.txn_id,
                changeset_id: r.changeset_id,
            })
            .collect();
        acl_tuples.sort_unstable();
        acl_tuples.dedup();

        Self {
            nodes: CanonicalSet::new(ItemKind::Nodes, nodes),
            acls: CanonicalSet::new(ItemKind::Acls, acls),
            transactions: CanonicalSet::new(ItemKind::Transactions, transactions),
            changesets: CanonicalSet::new(ItemKind::Changesets, changesets),
            acl_tuples,
        }
    }

    pub fn get(&self, kind: ItemKind) -> &CanonicalSet {
        match kind {
            ItemKind::Nodes => &self.nodes,
            ItemKind::Acls => &self.acls,
            ItemKind::Transactions => &self.transactions,
            ItemKind::Changesets => &self.changesets,
        }
    }

    /// Tuples whose acl id appears in `missing_acls` (sorted, deduplicated).
    pub fn tuples_for_missing_acls(&self, missing_acls: &[u64]) -> Vec<AclTuple> {
        self.acl_tuples
            .iter()
            .filter(|t| missing_acls.binary_search(&t.acl_id).is_ok())
            .copied()
            .collect()
    }
}
