use reconcile_core::{ReconcileError, Result};
use reconcile_index_client::{query, IndexQuery, LookupRequest};

/// Paginated scans over index-native result sets, independent of the
/// source dataset.
pub struct Scanner<'a> {
    index: &'a dyn IndexQuery,
}

impl<'a> Scanner<'a> {
    pub fn new(index: &'a dyn IndexQuery) -> Self {
        Self { index }
    }

    /// Node ids of every document the indexer marked as an error document.
    pub async fn error_scan(&self, page_size: usize) -> Result<Vec<u64>> {
        self.scan(query::error_docs_query(), page_size, "error scan").await
    }

    /// Node ids of every document under the given ancestor node.
    pub async fn path_scan(&self, ancestor_node_id: u64, page_size: usize) -> Result<Vec<u64>> {
        self.scan(query::ancestor_query(ancestor_node_id), page_size, "path scan")
            .await
    }

    /// Page from offset 0 in `page_size` steps until the collected count
    /// reaches the server-reported total. Duplicates are tolerated here;
    /// the cross-checker normalizes before comparing.
    async fn scan(&self, q: String, page_size: usize, label: &str) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let mut start = 0usize;
        loop {
            let request = LookupRequest {
                query: q.clone(),
                id_field: "node_id".to_string(),
                rows: page_size,
                start,
            };
            let page = self.index.lookup(&request).await?;
            let total = page.total as usize;

            if !page.ids.is_empty() {
                ids.extend(page.ids);
            } else if ids.len() < total {
                // A short page below the reported total would loop forever.
                return Err(ReconcileError::MalformedResponse(format!(
                    "{label} returned no documents at offset {start} but reports {total} total"
                )));
            }

            log::info!("{label}: {}/{total}", ids.len().min(total));
            if ids.len() >= total {
                return Ok(ids);
            }
            start += page_size;
        }
    }
}
