use crate::canonicalize::canonicalize;
use crate::crosscheck::{merge_error_nodes, purge_candidates};
use crate::dispatch::Dispatcher;
use crate::kinds::descriptor;
use crate::scan::Scanner;
use crate::summary::RunSummary;
use crate::verify::BatchVerifier;
use reconcile_core::{
    CanonicalSet, CanonicalSets, Config, ItemKind, QueryStrategy, ReconcileError, Result,
    SourceRecord, WorkingStore,
};
use reconcile_index_client::IndexQuery;
use std::path::Path;

/// Phase orchestration over one working directory.
///
/// Phases communicate through working files only, so `verify`, `scan` and
/// `fix` can run in one invocation or as separate ones. A kind whose
/// missing-file is absent is simply skipped by the fix phase.
pub struct Pipeline<'a> {
    config: &'a Config,
    store: &'a WorkingStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, store: &'a WorkingStore) -> Self {
        Self { config, store }
    }

    /// Derive and persist the canonical sets from the dataset.
    pub fn canonicalize_phase(&self, records: &[SourceRecord]) -> Result<CanonicalSets> {
        canonicalize(records, self.store)
    }

    /// Verify every kind against the index and persist the missing sets.
    pub async fn verify_phase(
        &self,
        index: &dyn IndexQuery,
        sets: &CanonicalSets,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let verifier = BatchVerifier::new(index, self.config.verify_batch_size);
        summary.max_node_id = sets.nodes.max_id();

        for kind in ItemKind::ALL {
            let set = sets.get(kind);
            let missing = if kind == ItemKind::Acls {
                let (missing, tuples) = verifier
                    .missing_acl_tuples(&descriptor(kind), sets)
                    .await?;
                self.write_or_remove_tuples(&tuples)?;
                missing
            } else {
                verifier.missing_ids(&descriptor(kind), set).await?
            };

            let entry = summary.kind_mut(kind);
            entry.canonical = set.len();
            entry.missing = missing.len();
            self.write_or_remove_ids(&self.store.missing_path(kind), &missing)?;
            log::info!("verify {kind}: {} of {} missing", missing.len(), set.len());
        }
        Ok(())
    }

    /// Error scan (always) and path scan (ancestor strategy only); folds
    /// error documents into the missing-node file and stages purge
    /// candidates.
    pub async fn scan_phase(
        &self,
        index: &dyn IndexQuery,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let scanner = Scanner::new(index);

        let error_ids = scanner.error_scan(self.config.error_scan_batch_size).await?;
        self.store.write_ids(&self.store.error_ids_path(), &error_ids)?;

        let missing_nodes = self
            .store
            .read_ids(&self.store.missing_path(ItemKind::Nodes))?
            .unwrap_or_default();
        let merged = merge_error_nodes(&missing_nodes, &error_ids);
        self.write_or_remove_ids(&self.store.missing_path(ItemKind::Nodes), &merged)?;
        summary.nodes.missing = merged.len();
        log::info!(
            "error scan: {} error documents, missing nodes now {}",
            error_ids.len(),
            merged.len()
        );

        if self.config.query_strategy()? == QueryStrategy::Ancestor {
            let canonical_nodes = self.canonical_nodes_from_disk()?;
            let indexed = scanner
                .path_scan(self.config.range_start, self.config.path_scan_batch_size)
                .await?;
            let purge = purge_candidates(&indexed, &canonical_nodes);
            summary.purge_candidates = purge.len();
            self.write_or_remove_ids(&self.store.purge_ids_path(), &purge)?;
            log::info!(
                "path scan: {} indexed under node {}, {} purge candidates",
                indexed.len(),
                self.config.range_start,
                purge.len()
            );
        }
        Ok(())
    }

    /// Dispatch corrective requests for every staged missing/purge file.
    pub async fn fix_phase(
        &self,
        dispatcher: &Dispatcher,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if let Some(ids) = self.store.read_ids(&self.store.missing_path(ItemKind::Nodes))? {
            summary.nodes.missing = ids.len();
            let counts = dispatcher.reindex_nodes(&ids).await?;
            summary.record_dispatch(ItemKind::Nodes, counts);
        }

        if let Some(tuples) = self.store.read_tuples(&self.store.missing_acl_tuples_path())? {
            // The missing count reported for ACLs comes from the ACL file
            // itself, never from another kind's totals.
            summary.acls.missing = count_distinct_acls(&tuples);
            let counts = dispatcher.reindex_acls(&tuples).await?;
            summary.record_dispatch(ItemKind::Acls, counts);
        }

        if self.config.reindex_transactions {
            if let Some(ids) =
                self.store.read_ids(&self.store.missing_path(ItemKind::Transactions))?
            {
                summary.transactions.missing = ids.len();
                let counts = dispatcher.reindex_txns(&ids).await?;
                summary.record_dispatch(ItemKind::Transactions, counts);
            }
            if let Some(ids) =
                self.store.read_ids(&self.store.missing_path(ItemKind::Changesets))?
            {
                summary.changesets.missing = ids.len();
                let counts = dispatcher.reindex_changesets(&ids).await?;
                summary.record_dispatch(ItemKind::Changesets, counts);
            }
        } else {
            log::info!("transaction/change-set reindex disabled by configuration");
        }

        if let Some(ids) = self.store.read_ids(&self.store.purge_ids_path())? {
            summary.purge_candidates = ids.len();
            let counts = dispatcher.purge_nodes(&ids).await?;
            summary.purge_scheduled += counts.scheduled;
            summary.purge_failed += counts.failed;
        }
        Ok(())
    }

    /// The whole pipeline: canonicalize, verify, scan, cross-check, fix.
    pub async fn run(
        &self,
        records: &[SourceRecord],
        index: &dyn IndexQuery,
        dispatcher: &Dispatcher,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let sets = self.canonicalize_phase(records)?;
        self.verify_phase(index, &sets, &mut summary).await?;
        self.scan_phase(index, &mut summary).await?;
        self.fix_phase(dispatcher, &mut summary).await?;
        Ok(summary)
    }

    fn canonical_nodes_from_disk(&self) -> Result<CanonicalSet> {
        let path = self.store.canonical_path(ItemKind::Nodes);
        let ids = self.store.read_ids(&path)?.ok_or_else(|| {
            ReconcileError::WorkingFile {
                path: path.display().to_string(),
                detail: "canonical node set not found; run the verify phase first".to_string(),
            }
        })?;
        Ok(CanonicalSet::new(ItemKind::Nodes, ids))
    }

    fn write_or_remove_ids(&self, path: &Path, ids: &[u64]) -> Result<()> {
        if ids.is_empty() {
            remove_if_exists(path)
        } else {
            self.store.write_ids(path, ids)
        }
    }

    fn write_or_remove_tuples(&self, tuples: &[reconcile_core::AclTuple]) -> Result<()> {
        let path = self.store.missing_acl_tuples_path();
        if tuples.is_empty() {
            remove_if_exists(&path)
        } else {
            self.store.write_tuples(&path, tuples)
        }
    }
}

fn count_distinct_acls(tuples: &[reconcile_core::AclTuple]) -> usize {
    let mut ids: Vec<u64> = tuples.iter().map(|t| t.acl_id).collect();
    reconcile_core::setops::sort_dedup(&mut ids);
    ids.len()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
