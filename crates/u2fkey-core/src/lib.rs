//! Transport-independent U2F HID authenticator logic: `U2FHID` channel
//! dispatch, frame reassembly, and the U2F raw-message (APDU) command set.
//!
//! This crate never touches a real device or the filesystem — see
//! [`env::Environment`] for the time/randomness seam and [`provider`] for
//! the storage/crypto-identity seam. `u2fkey-server` supplies production
//! implementations of both and drives the event loop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod apdu;
pub mod channel;
pub mod dispatcher;
pub mod env;
pub mod error;
pub mod provider;
pub mod raw_message;

pub use dispatcher::{ApduOutcome, Dispatcher, HidAction, RawMessageHandler};
pub use env::Environment;
pub use error::{HidError, ProviderError};
pub use raw_message::RawMessageLayer;
