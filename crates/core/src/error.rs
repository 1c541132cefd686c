use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Fatal error classes for a reconciliation run.
///
/// Per-item corrective failures are deliberately *not* represented here;
/// they are recoverable and flow through
/// [`CorrectiveStatus`](crate::CorrectiveStatus) instead.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed source record: {0}")]
    InputFormat(String),

    #[error("unsupported configuration: {0}")]
    UnsupportedConfig(String),

    #[error("index unreachable: {0}")]
    Transport(String),

    #[error("malformed index response: {0}")]
    MalformedResponse(String),

    #[error("invalid working file {path}: {detail}")]
    WorkingFile { path: String, detail: String },
}

/// Outcome of one corrective request that completed at the transport level.
///
/// A transport failure never produces a `CorrectiveStatus`; it surfaces as
/// [`ReconcileError::Transport`] and aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectiveStatus {
    /// The index accepted the request (HTTP 200).
    Scheduled,
    /// The index rejected the request; logged, run continues.
    Rejected { status: u16, body: String },
}

impl CorrectiveStatus {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, CorrectiveStatus::Scheduled)
    }
}
