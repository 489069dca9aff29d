use thiserror::Error;

/// Errors surfaced by the subscription core.
///
/// Per-node problems (a link that fails to decode, a node that fails
/// validation) are absorbed where they happen and never reach this enum;
/// only batch-level failures do.
#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid node: {0}")]
    Validation(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("probe failed: {0}")]
    Probe(String),
}

pub type Result<T> = std::result::Result<T, Error>;
