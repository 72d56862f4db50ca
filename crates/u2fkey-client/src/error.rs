//! Errors constructing or parsing `U2FHID` frames as a relying party.

use thiserror::Error;

/// Errors raised while driving an authenticator as a relying party.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A frame failed to decode as a valid 64-byte packet.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// A continuation frame arrived on a different channel than the
    /// in-progress response.
    #[error("continuation frame cid {got:#010x} does not match response cid {expected:#010x}")]
    ChannelMismatch {
        /// The cid the in-progress response was opened on.
        expected: u32,
        /// The cid carried by the unexpected frame.
        got: u32,
    },
    /// A continuation frame arrived with the wrong sequence number.
    #[error("expected continuation seq {expected}, got {got}")]
    SequenceMismatch {
        /// The sequence number expected next.
        expected: u8,
        /// The sequence number actually carried.
        got: u8,
    },
    /// A continuation frame arrived with no response in progress.
    #[error("continuation frame with no response in progress")]
    NoResponseInProgress,
    /// An init frame arrived while a different response was still assembling.
    #[error("init frame interrupted a response already in progress")]
    ResponseAlreadyInProgress,
    /// `build_ping`/`build_msg` were called before the INIT handshake
    /// allocated a channel.
    #[error("no channel allocated yet; send INIT first")]
    NotInitialized,
}
