//! Query-string construction for the index query endpoint.
//!
//! Queries are always full-value matches on a named identifier field,
//! conjoined with a document-type filter so e.g. a node id can never match
//! an ACL document that happens to carry the same number.

/// Disjunction over one field for every id in a batch:
/// `node_id:(3 OR 5 OR 8)`.
pub fn id_disjunction(field: &str, ids: &[u64]) -> String {
    let mut clause = String::with_capacity(field.len() + ids.len() * 8 + 3);
    clause.push_str(field);
    clause.push_str(":(");
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            clause.push_str(" OR ");
        }
        clause.push_str(&id.to_string());
    }
    clause.push(')');
    clause
}

/// Conjoin a clause with a document-type filter and an optional extra
/// filter clause.
pub fn with_filters(clause: &str, doc_type: &str, extra_filter: Option<&str>) -> String {
    let mut q = format!("({clause}) AND doc_type:{doc_type}");
    if let Some(extra) = extra_filter {
        q.push_str(" AND ");
        q.push_str(extra);
    }
    q
}

/// All documents the indexer marked as failed.
pub fn error_docs_query() -> String {
    "doc_type:error".to_string()
}

/// All node documents under the given ancestor.
pub fn ancestor_query(ancestor_node_id: u64) -> String {
    format!("ancestor:{ancestor_node_id} AND doc_type:node")
}
