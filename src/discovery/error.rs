//! Errors from a single remote call made during discovery.
//!
//! These never escape the scope that produced them: the fan-out driver turns
//! each one into an aborted scope or a degraded value.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The remote client could not be started at all.
    #[error("cannot run `{step}`: {source}")]
    Spawn {
        step: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{step}` failed ({status}): {stderr}")]
    CommandFailed {
        step: &'static str,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{step}`: {source}")]
    Parse {
        step: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The call succeeded but the field we need was absent.
    #[error("`{step}` returned no {what}")]
    Missing {
        step: &'static str,
        what: &'static str,
    },
}
