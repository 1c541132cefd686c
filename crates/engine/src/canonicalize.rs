use reconcile_core::{
    CanonicalSets, ItemKind, ReconcileError, Result, SourceRecord, WorkingStore,
};

/// Derive the canonical sets from the dataset and persist one artifact per
/// set.
///
/// The empty dataset is rejected up front: an empty extract would silently
/// turn every indexed document into a purge candidate.
pub fn canonicalize(records: &[SourceRecord], store: &WorkingStore) -> Result<CanonicalSets> {
    if records.is_empty() {
        return Err(ReconcileError::InputFormat(
            "dataset contains no records".to_string(),
        ));
    }

    let sets = CanonicalSets::from_records(records);

    for kind in ItemKind::ALL {
        let set = sets.get(kind);
        store.write_ids(&store.canonical_path(kind), set.ids())?;
        log::info!("canonical {kind}: {} distinct ids", set.len());
    }
    store.write_tuples(&store.acl_tuples_path(), &sets.acl_tuples)?;

    log::info!(
        "canonical acl tuples: {}; max node id {}",
        sets.acl_tuples.len(),
        sets.nodes.max_id().unwrap_or(0)
    );

    Ok(sets)
}
