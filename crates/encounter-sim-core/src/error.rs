//! Crate-wide error taxonomy.
//!
//! Every failure is reported synchronously to the caller; nothing is retried
//! internally. Capacity and not-found errors are expected, recoverable
//! conditions; malformed catalog data is fatal at load time.

use thiserror::Error;

/// Errors surfaced by the encounter simulation core.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown session or case identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Registry is at its configured maximum session count.
    #[error("session capacity reached ({0} active sessions); close existing sessions first")]
    CapacityExceeded(usize),

    /// Operation attempted on a world model that has not been reset.
    #[error("world model is not initialized; call reset with a case id first")]
    InvalidState,

    /// Case or corpus data is missing required fields or fails to parse.
    #[error("malformed {context}: {message}")]
    MalformedInput { context: String, message: String },
}

impl Error {
    /// Shorthand for a [`Error::MalformedInput`] with a source context.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
