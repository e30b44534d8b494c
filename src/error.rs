//! Error taxonomy for the spike catalog.
//!
//! Every variant is scoped to the single call that produced it; nothing here
//! is fatal to the process and no path retries automatically.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpikeError {
    /// Malformed spike id. Recovered with a best-effort split wherever the
    /// grammar allows it; surfaced only when no fallback applies.
    #[error("malformed spike id {id:?}: {reason}")]
    Parse { id: String, reason: String },

    /// Lookup of an id that is neither stored nor synthesizable.
    #[error("spike {0:?} not found")]
    NotFound(String),

    /// Rejected payload: too large, unsafe path, or missing required input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A bulk-generation request exceeded the configured cap. Carries the cap
    /// so the caller can adjust the request.
    #[error("generation limit exceeded: requested {requested}, cap {cap}")]
    GenerationLimit { requested: usize, cap: usize },

    /// Flat-file store failure. Atomic writes guarantee no partial entry is
    /// left behind when this is returned.
    #[error("catalog io: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpikeError {
    pub fn parse(id: &str, reason: impl Into<String>) -> Self {
        SpikeError::Parse {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SpikeError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpikeError>;
