//! Top-level error type for the authenticator event loop.

use thiserror::Error;

/// Errors that terminate the driver loop.
///
/// Both variants are fatal per `spec.md` §7: `main` propagates either one as
/// an `Err`, causing the process to exit non-zero with in-flight partial
/// frames dropped rather than flushed.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The dispatcher hit a fatal condition (counter persistence failure)
    /// and requested the event loop shut down.
    #[error("fatal condition: {0}")]
    Fatal(String),
    /// The device transport failed in a way the driver cannot recover from.
    #[error("device I/O error: {0}")]
    Device(#[from] std::io::Error),
}
