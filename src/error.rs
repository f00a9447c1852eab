//! Error taxonomy for the pipeline.
//!
//! Failures are recovered at the narrowest scope that can still produce
//! a meaningful partial result: a backend failure becomes a null finding,
//! a host failure becomes a failure-list entry, a store failure is logged
//! and swallowed.

use thiserror::Error;

/// Failure of an analysis/research backend call.
///
/// Never propagated past the per-repository analyzer; converted to a
/// null finding there.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status.
    #[error("backend '{backend}' unavailable (HTTP {status})")]
    Unavailable { backend: String, status: u16 },

    /// The backend rejected our credentials.
    #[error("backend '{backend}' rejected credentials")]
    Auth { backend: String },

    /// Transport-level failure (connect, timeout).
    #[error("backend '{backend}' request failed: {detail}")]
    Transport { backend: String, detail: String },
}

/// Failure of a version-control host API call.
///
/// Fatal to the single repository or opportunity in progress; reported,
/// never retried automatically.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host answered with a non-2xx status (404 on file lookups is
    /// handled as control flow before this is raised).
    #[error("host API error (HTTP {status}): {detail}")]
    Unreachable { status: u16, detail: String },

    /// Transport-level failure (connect, timeout).
    #[error("host API request failed: {detail}")]
    Transport { detail: String },

    /// The host returned a body we could not decode.
    #[error("host API returned an unexpected body: {detail}")]
    Decode { detail: String },
}

impl HostError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        HostError::Transport {
            detail: err.to_string(),
        }
    }
}
