use crate::dispatch::DispatchCounts;
use reconcile_core::ItemKind;
use serde::Serialize;

/// Per-kind totals for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct KindSummary {
    pub canonical: usize,
    pub missing: usize,
    pub scheduled: usize,
    pub failed: usize,
}

/// End-of-run report, rendered for the operator and serializable to JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub nodes: KindSummary,
    pub acls: KindSummary,
    pub transactions: KindSummary,
    pub changesets: KindSummary,
    pub purge_candidates: usize,
    pub purge_scheduled: usize,
    pub purge_failed: usize,
    pub max_node_id: Option<u64>,
}

impl RunSummary {
    pub fn kind_mut(&mut self, kind: ItemKind) -> &mut KindSummary {
        match kind {
            ItemKind::Nodes => &mut self.nodes,
            ItemKind::Acls => &mut self.acls,
            ItemKind::Transactions => &mut self.transactions,
            ItemKind::Changesets => &mut self.changesets,
        }
    }

    pub fn record_dispatch(&mut self, kind: ItemKind, counts: DispatchCounts) {
        let summary = self.kind_mut(kind);
        summary.scheduled += counts.scheduled;
        summary.failed += counts.failed;
    }

    pub fn total_failed(&self) -> usize {
        self.nodes.failed
            + self.acls.failed
            + self.transactions.failed
            + self.changesets.failed
            + self.purge_failed
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("kind          canonical   missing  scheduled    failed\n");
        for kind in ItemKind::ALL {
            let s = match kind {
                ItemKind::Nodes => &self.nodes,
                ItemKind::Acls => &self.acls,
                ItemKind::Transactions => &self.transactions,
                ItemKind::Changesets => &self.changesets,
            };
            out.push_str(&format!(
                "{:<12}{:>11}{:>10}{:>11}{:>10}\n",
                kind.as_str(),
                s.canonical,
                s.missing,
                s.scheduled,
                s.failed
            ));
        }
        out.push_str(&format!(
            "purge       {:>11}{:>10}{:>11}{:>10}\n",
            "-", self.purge_candidates, self.purge_scheduled, self.purge_failed
        ));
        if let Some(max) = self.max_node_id {
            out.push_str(&format!("max node id: {max}\n"));
        }
        out
    }
}
