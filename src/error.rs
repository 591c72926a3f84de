//! Error taxonomy for package generation.
//!
//! Every failure is fatal and propagates straight to the caller; nothing is
//! retried internally. The only degradation point is repository metadata,
//! which the resolver handles before an error ever reaches this type.

use thiserror::Error;

/// Errors produced while resolving a package's upstream version and artifacts.
#[derive(Error, Debug)]
pub enum GenError {
    /// A required field is missing, or mutually exclusive fields are both set.
    #[error("invalid package metadata: {0}")]
    Config(String),

    /// Pagination was exhausted, or the upstream rejected a tag/release/commit
    /// lookup.
    #[error("{0}")]
    NotFound(String),

    /// A version transform could not be compiled or applied.
    #[error("invalid version transform: {0}")]
    Transform(String),

    /// An artifact or page download failed (non-2xx status or transport error).
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// No computed digest matched the supplied hash-lock set.
    #[error("checksums calculated for {url} do not match any locked checksums")]
    LockMismatch { url: String },
}

pub type Result<T> = std::result::Result<T, GenError>;
