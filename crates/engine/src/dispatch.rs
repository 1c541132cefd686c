use reconcile_core::{AclTuple, CorrectiveStatus, FailureLog, ReconcileError, Result};
use reconcile_index_client::IndexAdmin;
use std::sync::Arc;
use tokio::task::JoinSet;

/// One corrective action, independent of the instance it is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corrective {
    ReindexNode(u64),
    ReindexAcl(AclTuple),
    ReindexTxn(u64),
    ReindexChangeset(u64),
    PurgeNode(u64),
}

impl Corrective {
    fn describe(self) -> String {
        match self {
            Corrective::ReindexNode(id) => format!("reindex node {id}"),
            Corrective::ReindexAcl(t) => format!(
                "reindex acl {} txn {} changeset {}",
                t.acl_id, t.txn_id, t.changeset_id
            ),
            Corrective::ReindexTxn(id) => format!("reindex txn {id}"),
            Corrective::ReindexChangeset(id) => format!("reindex changeset {id}"),
            Corrective::PurgeNode(id) => format!("purge node {id}"),
        }
    }

    async fn send(self, admin: &dyn IndexAdmin) -> Result<CorrectiveStatus> {
        match self {
            Corrective::ReindexNode(id) => admin.reindex_node(id).await,
            Corrective::ReindexAcl(t) => admin.reindex_acl(t).await,
            Corrective::ReindexTxn(id) => admin.reindex_txn(id).await,
            Corrective::ReindexChangeset(id) => admin.reindex_changeset(id).await,
            Corrective::PurgeNode(id) => admin.purge_node(id).await,
        }
    }
}

/// Scheduled/failed totals for one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchCounts {
    pub scheduled: usize,
    pub failed: usize,
}

impl DispatchCounts {
    fn absorb(&mut self, other: DispatchCounts) {
        self.scheduled += other.scheduled;
        self.failed += other.failed;
    }
}

/// Issues corrective requests item by item, fanning each item out to every
/// configured instance.
///
/// Rejections are appended to the failure log and counted; transport
/// failures abort the run, since it cannot be established whether
/// corrective state changed.
pub struct Dispatcher {
    instances: Vec<Arc<dyn IndexAdmin>>,
    parallel: bool,
    failure_log: Arc<FailureLog>,
}

impl Dispatcher {
    pub fn new(
        instances: Vec<Arc<dyn IndexAdmin>>,
        parallel: bool,
        failure_log: Arc<FailureLog>,
    ) -> Self {
        Self {
            instances,
            parallel,
            failure_log,
        }
    }

    pub async fn reindex_nodes(&self, ids: &[u64]) -> Result<DispatchCounts> {
        self.dispatch_all(ids.iter().map(|&id| Corrective::ReindexNode(id)))
            .await
    }

    pub async fn reindex_acls(&self, tuples: &[AclTuple]) -> Result<DispatchCounts> {
        self.dispatch_all(tuples.iter().map(|&t| Corrective::ReindexAcl(t)))
            .await
    }

    pub async fn reindex_txns(&self, ids: &[u64]) -> Result<DispatchCounts> {
        self.dispatch_all(ids.iter().map(|&id| Corrective::ReindexTxn(id)))
            .await
    }

    pub async fn reindex_changesets(&self, ids: &[u64]) -> Result<DispatchCounts> {
        self.dispatch_all(ids.iter().map(|&id| Corrective::ReindexChangeset(id)))
            .await
    }

    pub async fn purge_nodes(&self, ids: &[u64]) -> Result<DispatchCounts> {
        self.dispatch_all(ids.iter().map(|&id| Corrective::PurgeNode(id)))
            .await
    }

    async fn dispatch_all(
        &self,
        items: impl Iterator<Item = Corrective>,
    ) -> Result<DispatchCounts> {
        let mut counts = DispatchCounts::default();
        for item in items {
            let item_counts = if self.parallel && self.instances.len() > 1 {
                self.dispatch_parallel(item).await?
            } else {
                self.dispatch_sequential(item).await?
            };
            counts.absorb(item_counts);
        }
        Ok(counts)
    }

    async fn dispatch_sequential(&self, item: Corrective) -> Result<DispatchCounts> {
        let mut counts = DispatchCounts::default();
        for admin in &self.instances {
            let status = item.send(admin.as_ref()).await?;
            self.record(admin.endpoint(), item, status, &mut counts)?;
        }
        Ok(counts)
    }

    /// All instances' requests for one item are issued at once; every
    /// response is awaited before the next item so per-item failures stay
    /// observable in order.
    async fn dispatch_parallel(&self, item: Corrective) -> Result<DispatchCounts> {
        let mut join = JoinSet::new();
        for admin in &self.instances {
            let admin = Arc::clone(admin);
            join.spawn(async move {
                let status = item.send(admin.as_ref()).await;
                (admin.endpoint().to_string(), status)
            });
        }

        let mut counts = DispatchCounts::default();
        while let Some(joined) = join.join_next().await {
            let (endpoint, status) = joined
                .map_err(|e| ReconcileError::Transport(format!("dispatch task failed: {e}")))?;
            self.record(&endpoint, item, status?, &mut counts)?;
        }
        Ok(counts)
    }

    fn record(
        &self,
        endpoint: &str,
        item: Corrective,
        status: CorrectiveStatus,
        counts: &mut DispatchCounts,
    ) -> Result<()> {
        match status {
            CorrectiveStatus::Scheduled => counts.scheduled += 1,
            CorrectiveStatus::Rejected { status, body } => {
                log::warn!("{endpoint}: {} rejected with HTTP {status}", item.describe());
                self.failure_log
                    .append(endpoint, &item.describe(), status, &body)?;
                counts.failed += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{AdminCall, FakeAdmin};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn failure_log(dir: &std::path::Path) -> Arc<FailureLog> {
        Arc::new(FailureLog::open(dir.join("failures.log")).unwrap())
    }

    #[tokio::test]
    async fn rejection_logs_and_continues() {
        let temp = tempdir().unwrap();
        let admin = Arc::new(FakeAdmin::new("http://a").rejecting_nodes(&[5]));
        let dispatcher = Dispatcher::new(
            vec![admin.clone() as Arc<dyn IndexAdmin>],
            false,
            failure_log(temp.path()),
        );

        let counts = dispatcher.reindex_nodes(&[5, 6]).await.unwrap();

        assert_eq!(counts, DispatchCounts { scheduled: 1, failed: 1 });
        assert_eq!(
            *admin.calls.lock().unwrap(),
            vec![AdminCall::ReindexNode(5), AdminCall::ReindexNode(6)]
        );
        let log = std::fs::read_to_string(temp.path().join("failures.log")).unwrap();
        assert!(log.contains("reindex node 5"));
        assert!(log.contains("500"));
        assert!(!log.contains("node 6"));
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_run() {
        let temp = tempdir().unwrap();
        let admin: Arc<dyn IndexAdmin> = Arc::new(FakeAdmin::new("http://a").failing_transport());
        let dispatcher = Dispatcher::new(vec![admin], false, failure_log(temp.path()));

        let err = dispatcher.reindex_nodes(&[1, 2]).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Transport(_)), "{err}");
    }

    #[tokio::test]
    async fn every_instance_receives_every_item() {
        let temp = tempdir().unwrap();
        let a = Arc::new(FakeAdmin::new("http://a"));
        let b = Arc::new(FakeAdmin::new("http://b"));
        let dispatcher = Dispatcher::new(
            vec![a.clone() as Arc<dyn IndexAdmin>, b.clone()],
            false,
            failure_log(temp.path()),
        );

        let counts = dispatcher.purge_nodes(&[7, 8]).await.unwrap();
        assert_eq!(counts.scheduled, 4);
        assert_eq!(a.call_count(), 2);
        assert_eq!(b.call_count(), 2);
    }

    #[tokio::test]
    async fn parallel_fan_out_observes_all_responses_per_item() {
        let temp = tempdir().unwrap();
        let a = Arc::new(FakeAdmin::new("http://a").rejecting_nodes(&[9]));
        let b = Arc::new(FakeAdmin::new("http://b"));
        let dispatcher = Dispatcher::new(
            vec![a.clone() as Arc<dyn IndexAdmin>, b.clone()],
            true,
            failure_log(temp.path()),
        );

        let counts = dispatcher.reindex_nodes(&[9, 10]).await.unwrap();

        assert_eq!(counts, DispatchCounts { scheduled: 3, failed: 1 });
        assert_eq!(a.call_count(), 2);
        assert_eq!(b.call_count(), 2);
    }

    #[tokio::test]
    async fn acl_dispatch_carries_full_tuples() {
        let temp = tempdir().unwrap();
        let admin = Arc::new(FakeAdmin::new("http://a"));
        let dispatcher = Dispatcher::new(
            vec![admin.clone() as Arc<dyn IndexAdmin>],
            false,
            failure_log(temp.path()),
        );

        let tuple = AclTuple { acl_id: 20, txn_id: 200, changeset_id: 2000 };
        let counts = dispatcher.reindex_acls(&[tuple]).await.unwrap();

        assert_eq!(counts.scheduled, 1);
        assert_eq!(*admin.calls.lock().unwrap(), vec![AdminCall::ReindexAcl(tuple)]);
    }
}
