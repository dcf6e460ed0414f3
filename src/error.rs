pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the filter, store, pipeline and worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The detector reported a failure for a frame. The frame is skipped.
    #[error("detector failure: {0}")]
    Detector(String),

    /// A bounding box with non-finite or inverted edges.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A frame is already in flight on the detection worker.
    #[error("detection worker is busy")]
    WorkerBusy,

    #[error("no frame is in flight")]
    NothingPending,

    #[error("detection worker has shut down")]
    WorkerDisconnected,
}
