//! HID packet framing and U2FHID message assembly.
//!
//! This crate has no knowledge of channel lifetime, U2F APDUs, or
//! cryptography. It only knows how to turn a stream of 64-byte HID frames
//! into `U2FHID` messages and back.
//!
//! # Components
//!
//! - [`packet`]: fixed 64-byte init/continuation packet encode and decode.
//! - [`message`]: outbound message-to-frames splitting and inbound
//!   frame-to-message reassembly.
//! - [`constants`]: wire constants shared by every layer above this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod message;
pub mod packet;

pub use constants::*;
pub use message::{Message, ReassembleOutcome, Reassembler};
pub use packet::{PacketView, ProtoError};
