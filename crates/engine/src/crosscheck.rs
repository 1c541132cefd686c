//! Exact-match set differences between scanner output and canonical or
//! missing sets. Both operands are normalized (sorted, deduplicated)
//! before the merge so comparisons are whole-value only.

use reconcile_core::setops::{diff_sorted, sort_dedup, union_sorted};
use reconcile_core::CanonicalSet;

/// Fold error-flagged documents into the missing-node list: any error id
/// not already missing is appended.
pub fn merge_error_nodes(missing_nodes: &[u64], error_ids: &[u64]) -> Vec<u64> {
    let mut missing = missing_nodes.to_vec();
    sort_dedup(&mut missing);
    let mut errors = error_ids.to_vec();
    sort_dedup(&mut errors);
    union_sorted(&missing, &errors)
}

/// Index-resident ids that do not exist in the canonical node set at all;
/// these are staged for removal from the index.
pub fn purge_candidates(path_scan_ids: &[u64], canonical_nodes: &CanonicalSet) -> Vec<u64> {
    let mut indexed = path_scan_ids.to_vec();
    sort_dedup(&mut indexed);
    diff_sorted(&indexed, canonical_nodes.ids())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reconcile_core::ItemKind;

    #[test]
    fn error_ids_extend_the_missing_list() {
        let merged = merge_error_nodes(&[11], &[10, 11, 12]);
        assert_eq!(merged, vec![10, 11, 12]);
    }

    #[test]
    fn merge_tolerates_unsorted_duplicated_input() {
        let merged = merge_error_nodes(&[5, 3, 5], &[4, 3, 4]);
        assert_eq!(merged, vec![3, 4, 5]);
    }

    #[test]
    fn merge_is_exact_match_not_containment() {
        // 1 missing, error doc 12: a "contains" check would treat 1 as
        // already covered by 12.
        let merged = merge_error_nodes(&[12], &[1]);
        assert_eq!(merged, vec![1, 12]);
    }

    #[test]
    fn purge_candidates_are_index_only_ids() {
        let canonical = CanonicalSet::new(ItemKind::Nodes, vec![100, 101]);
        let purge = purge_candidates(&[100, 101, 102], &canonical);
        assert_eq!(purge, vec![102]);
    }

    #[test]
    fn purge_and_missing_directions_do_not_overlap() {
        let canonical = CanonicalSet::new(ItemKind::Nodes, vec![1, 2, 3]);
        let indexed = vec![2, 3, 4];
        let purge = purge_candidates(&indexed, &canonical);
        let mut sorted_indexed = indexed.clone();
        sort_dedup(&mut sorted_indexed);
        let missing = diff_sorted(canonical.ids(), &sorted_indexed);
        assert_eq!(purge, vec![4]);
        assert_eq!(missing, vec![1]);
        assert!(purge.iter().all(|id| !missing.contains(id)));
    }
}
