//! A minimal relying-party test driver for exercising a `U2FHID`
//! authenticator end-to-end without a real browser or USB stack.
//!
//! [`RelyingPartyClient`] builds `U2FHID_INIT`/`U2FHID_PING`/`U2FHID_MSG`
//! request frames and reassembles an authenticator's response frames back
//! into `(cmd, payload)` pairs, tracking the channel id allocated by the
//! INIT handshake.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod response;

pub use client::{RelyingPartyClient, frame_cid};
pub use error::ClientError;
pub use response::ResponseReader;
