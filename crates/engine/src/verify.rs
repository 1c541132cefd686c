use crate::kinds::KindDescriptor;
use reconcile_core::setops::{diff_sorted, sort_dedup};
use reconcile_core::{AclTuple, CanonicalSet, CanonicalSets, Result};
use reconcile_index_client::{query, IndexQuery, LookupRequest};

/// Batched existence verification of one canonical set against the index.
pub struct BatchVerifier<'a> {
    index: &'a dyn IndexQuery,
    batch_size: usize,
}

impl<'a> BatchVerifier<'a> {
    pub fn new(index: &'a dyn IndexQuery, batch_size: usize) -> Self {
        Self { index, batch_size }
    }

    /// Ids of `set` confirmed absent from the index, ascending.
    ///
    /// One lookup per batch, requesting exactly `batch_size` rows so a
    /// fully-present batch is confirmed by its match count alone. Only
    /// when the count falls short are the returned ids compared, by
    /// full-value equality against the batch.
    pub async fn missing_ids(
        &self,
        descriptor: &KindDescriptor,
        set: &CanonicalSet,
    ) -> Result<Vec<u64>> {
        let total = set.len();
        if total == 0 {
            log::info!("verify {}: canonical set is empty", descriptor.kind);
            return Ok(Vec::new());
        }

        let mut missing = Vec::new();
        let mut processed = 0usize;
        for batch in set.ids().chunks(self.batch_size) {
            let clause = query::id_disjunction(descriptor.query_field, batch);
            let request = LookupRequest {
                query: query::with_filters(&clause, descriptor.doc_type, descriptor.extra_filter),
                id_field: descriptor.query_field.to_string(),
                rows: self.batch_size,
                start: 0,
            };
            let page = self.index.lookup(&request).await?;

            if page.total as usize != batch.len() {
                let mut matched = page.ids;
                sort_dedup(&mut matched);
                missing.extend(diff_sorted(batch, &matched));
            }

            processed += batch.len();
            log::info!(
                "verify {}: {processed}/{total} ({}%), last id {}",
                descriptor.kind,
                processed * 100 / total,
                batch[batch.len() - 1]
            );
        }

        // Batches are disjoint slices of a sorted set, so the concatenation
        // is already sorted and deduplicated.
        Ok(missing)
    }

    /// ACL verification plus tuple expansion: each missing ACL id is
    /// rejoined with every `(txn, changeset)` context it appears under,
    /// since reindexing an ACL needs that context, not just the id.
    pub async fn missing_acl_tuples(
        &self,
        descriptor: &KindDescriptor,
        sets: &CanonicalSets,
    ) -> Result<(Vec<u64>, Vec<AclTuple>)> {
        let missing = self.missing_ids(descriptor, &sets.acls).await?;
        let tuples = sets.tuples_for_missing_acls(&missing);
        Ok((missing, tuples))
    }
}
