use reconcile_core::ItemKind;

/// How one item kind maps onto the index schema: which field carries the
/// identifier, which document type to filter on, and an optional extra
/// filter clause.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub kind: ItemKind,
    pub query_field: &'static str,
    pub doc_type: &'static str,
    pub extra_filter: Option<&'static str>,
}

pub fn descriptor(kind: ItemKind) -> KindDescriptor {
    match kind {
        ItemKind::Nodes => KindDescriptor {
            kind,
            query_field: "node_id",
            doc_type: "node",
            extra_filter: None,
        },
        ItemKind::Acls => KindDescriptor {
            kind,
            query_field: "acl_id",
            doc_type: "acl",
            extra_filter: None,
        },
        ItemKind::Transactions => KindDescriptor {
            kind,
            query_field: "txn_id",
            doc_type: "txn",
            extra_filter: None,
        },
        ItemKind::Changesets => KindDescriptor {
            kind,
            query_field: "changeset_id",
            doc_type: "changeset",
            extra_filter: None,
        },
    }
}
