//! Error types for the `U2FHID` dispatcher and its collaborators.
//!
//! Kept structurally separate from APDU status words (`SW_*` in
//! `u2fkey_proto::constants`): a [`HidError`] names a transport-layer fault
//! and is turned into a `CMD_ERROR` message by the dispatcher, while a
//! malformed or rejected APDU never produces a Rust `Err` at all — see
//! `crate::apdu::ApduOutcome`. The two taxonomies never cross.

use thiserror::Error;
use u2fkey_proto::constants::{
    ERR_CHANNEL_BUSY, ERR_INVALID_CID, ERR_INVALID_CMD, ERR_INVALID_LEN, ERR_INVALID_PAR,
    ERR_INVALID_SEQ, ERR_MSG_TIMEOUT,
};

/// `U2FHID` transport-layer errors, reported to the host as a `CMD_ERROR`
/// message carrying the corresponding one-byte code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidError {
    /// The frame named a `cmd` byte this authenticator does not implement.
    #[error("invalid command")]
    InvalidCmd,
    /// An `U2FHID_INIT` frame carried a malformed nonce payload.
    #[error("invalid init parameter")]
    InvalidPar,
    /// A frame's declared length overflowed `bcnt` or exceeded the
    /// authenticator's maximum message size.
    #[error("invalid length")]
    InvalidLen,
    /// A continuation packet arrived out of sequence or with no message
    /// open on its channel.
    #[error("invalid sequence number")]
    InvalidSeq,
    /// Reassembly did not complete within the 500 ms deadline.
    #[error("message reassembly timed out")]
    MsgTimeout,
    /// The frame targets a channel that is already processing a
    /// transaction.
    #[error("channel busy")]
    ChannelBusy,
    /// The frame targets a channel id that was never allocated by `INIT`
    /// (or is the reserved null/broadcast id outside of `INIT`).
    #[error("invalid channel id")]
    InvalidCid,
}

impl HidError {
    /// The single-byte `ERR_*` wire code this error is reported as.
    #[must_use]
    pub fn wire_code(self) -> u8 {
        match self {
            Self::InvalidCmd => ERR_INVALID_CMD,
            Self::InvalidPar => ERR_INVALID_PAR,
            Self::InvalidLen => ERR_INVALID_LEN,
            Self::InvalidSeq => ERR_INVALID_SEQ,
            Self::MsgTimeout => ERR_MSG_TIMEOUT,
            Self::ChannelBusy => ERR_CHANNEL_BUSY,
            Self::InvalidCid => ERR_INVALID_CID,
        }
    }
}

/// Errors from the counter and attestation providers injected into the
/// raw-message layer.
///
/// A [`ProviderError`] surfacing from [`crate::provider::CounterProvider`]
/// is a fatal condition per the spec's concurrency model: the driver must
/// terminate the event loop rather than return a forged or stale counter
/// value to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The counter's persistence medium failed to durably record the
    /// incremented value.
    #[error("counter persistence failed: {0}")]
    PersistenceFailed(String),
}
