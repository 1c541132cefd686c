use crate::envelope::{parse_result_page, ResultPage};
use async_trait::async_trait;
use reconcile_core::{AclTuple, Config, CorrectiveStatus, ReconcileError, Result};

/// Shared-secret header attached to every index request when configured.
pub const SECRET_HEADER: &str = "x-reconcile-secret";

/// One existence-verification lookup: a query plus paging and the name of
/// the identifier field to project out of matching documents.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub query: String,
    pub id_field: String,
    pub rows: usize,
    pub start: usize,
}

/// Read side of the index: batched lookups with a validated envelope.
#[async_trait]
pub trait IndexQuery: Send + Sync {
    async fn lookup(&self, request: &LookupRequest) -> Result<ResultPage>;
}

/// Corrective side of the index. Transport failures surface as `Err` and
/// abort the run; rejections come back as [`CorrectiveStatus::Rejected`]
/// so the dispatcher can log and continue.
#[async_trait]
pub trait IndexAdmin: Send + Sync {
    /// Instance base URL, for logging and the failure log.
    fn endpoint(&self) -> &str;

    async fn reindex_node(&self, node_id: u64) -> Result<CorrectiveStatus>;
    async fn reindex_acl(&self, tuple: AclTuple) -> Result<CorrectiveStatus>;
    async fn reindex_txn(&self, txn_id: u64) -> Result<CorrectiveStatus>;
    async fn reindex_changeset(&self, changeset_id: u64) -> Result<CorrectiveStatus>;
    async fn purge_node(&self, node_id: u64) -> Result<CorrectiveStatus>;
}

/// HTTP implementation of both index traits for one instance.
#[derive(Debug, Clone)]
pub struct HttpIndex {
    client: reqwest::Client,
    base_url: String,
    shard: Option<String>,
    /// Comma-joined shard list; when present, lookups consult all shards.
    all_shards: Option<String>,
    secret: Option<String>,
    reindex_related: bool,
}

impl HttpIndex {
    /// Client for the primary instance named in the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::for_instance(config, &config.index_url)
    }

    /// Client for one corrective fan-out instance. All derived values
    /// (TLS material, shard clause) come from the same immutable config.
    pub fn for_instance(config: &Config, base_url: &str) -> Result<Self> {
        let client = build_client(config)?;
        let all_shards = if config.shard_list.is_empty() {
            None
        } else {
            Some(config.shard_list.join(","))
        };
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            shard: config.shard.clone(),
            all_shards,
            secret: config.shared_secret.clone(),
            reindex_related: config.reindex_related_transactions,
        })
    }

    fn select_url(&self) -> String {
        match &self.shard {
            Some(shard) => format!("{}/{shard}/select", self.base_url),
            None => format!("{}/select", self.base_url),
        }
    }

    fn admin_url(&self) -> String {
        format!("{}/admin", self.base_url)
    }

    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<(u16, String)> {
        let mut request = self.client.get(url).query(params);
        if let Some(secret) = &self.secret {
            request = request.header(SECRET_HEADER, secret);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::Transport(format!("GET {url}: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ReconcileError::Transport(format!("reading body from {url}: {e}")))?;
        Ok((status, body))
    }

    async fn corrective(&self, params: &[(&str, String)]) -> Result<CorrectiveStatus> {
        let url = self.admin_url();
        let (status, body) = self.get(&url, params).await?;
        if status == 200 {
            Ok(CorrectiveStatus::Scheduled)
        } else {
            Ok(CorrectiveStatus::Rejected { status, body })
        }
    }
}

#[async_trait]
impl IndexQuery for HttpIndex {
    async fn lookup(&self, request: &LookupRequest) -> Result<ResultPage> {
        let url = self.select_url();
        let mut params = vec![
            ("q", request.query.clone()),
            ("fl", request.id_field.clone()),
            ("rows", request.rows.to_string()),
            ("start", request.start.to_string()),
            ("wt", "json".to_string()),
        ];
        if let Some(shards) = &self.all_shards {
            params.push(("shards", shards.clone()));
        }
        let (status, body) = self.get(&url, &params).await?;
        if status != 200 {
            return Err(ReconcileError::Transport(format!(
                "lookup against {url} returned HTTP {status}"
            )));
        }
        parse_result_page(&body, &request.id_field)
    }
}

#[async_trait]
impl IndexAdmin for HttpIndex {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn reindex_node(&self, node_id: u64) -> Result<CorrectiveStatus> {
        let mut params = vec![
            ("action", "reindex".to_string()),
            ("node_id", node_id.to_string()),
        ];
        if self.reindex_related {
            params.push(("related", "true".to_string()));
        }
        self.corrective(&params).await
    }

    async fn reindex_acl(&self, tuple: AclTuple) -> Result<CorrectiveStatus> {
        self.corrective(&[
            ("action", "reindex".to_string()),
            ("acl_id", tuple.acl_id.to_string()),
            ("txn_id", tuple.txn_id.to_string()),
            ("changeset_id", tuple.changeset_id.to_string()),
        ])
        .await
    }

    async fn reindex_txn(&self, txn_id: u64) -> Result<CorrectiveStatus> {
        self.corrective(&[
            ("action", "reindex".to_string()),
            ("txn_id", txn_id.to_string()),
        ])
        .await
    }

    async fn reindex_changeset(&self, changeset_id: u64) -> Result<CorrectiveStatus> {
        self.corrective(&[
            ("action", "reindex".to_string()),
            ("changeset_id", changeset_id.to_string()),
        ])
        .await
    }

    async fn purge_node(&self, node_id: u64) -> Result<CorrectiveStatus> {
        self.corrective(&[
            ("action", "purge".to_string()),
            ("node_id", node_id.to_string()),
        ])
        .await
    }
}

fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    let tls = &config.tls;
    if let Some(identity_pem) = &tls.identity_pem {
        let buf = std::fs::read(identity_pem)?;
        let identity = reqwest::Identity::from_pem(&buf).map_err(|e| {
            ReconcileError::UnsupportedConfig(format!(
                "invalid TLS identity {}: {e}",
                identity_pem.display()
            ))
        })?;
        builder = builder.identity(identity);
    }
    if let Some(ca_pem) = &tls.ca_pem {
        let buf = std::fs::read(ca_pem)?;
        let cert = reqwest::Certificate::from_pem(&buf).map_err(|e| {
            ReconcileError::UnsupportedConfig(format!(
                "invalid CA certificate {}: {e}",
                ca_pem.display()
            ))
        })?;
        builder = builder.add_root_certificate(cert);
    }
    if tls.accept_invalid_certs {
        log::warn!("TLS server certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }
    builder
        .build()
        .map_err(|e| ReconcileError::Transport(format!("building HTTP client: {e}")))
}
