//! Fixed 64-byte HID packet encode/decode.
//!
//! An init packet opens a message and carries its total length (`bcnt`); a
//! continuation packet carries the next slice of an already-opened message,
//! tagged with a sequence number. Nothing here knows what a "message" is —
//! see [`crate::message`] for reassembly.

use thiserror::Error;

use crate::constants::{
    CONT_HEADER_LEN, CONT_PAYLOAD_MAX, CONT_SEQ_MASK, FRAME_LEN, INIT_HEADER_LEN,
    INIT_PAYLOAD_MAX, TYPE_INIT_MASK,
};

/// Errors produced while decoding a raw 64-byte frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// The slice handed to [`decode`] was not exactly [`FRAME_LEN`] bytes.
    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidFrameLen {
        /// Required length.
        expected: usize,
        /// Length actually given.
        actual: usize,
    },

    /// A continuation packet's sequence number had its high bit set, which
    /// is reserved to distinguish init packets.
    #[error("continuation sequence number {0:#04x} out of range")]
    InvalidSeq(u8),
}

/// A borrowed, decoded view over one 64-byte frame.
///
/// Zero-copy: the payload slices borrow directly from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketView<'a> {
    /// The first packet of a message.
    Init {
        /// Destination channel.
        cid: u32,
        /// `U2FHID` command, top bit always set.
        cmd: u8,
        /// Declared total payload length of the message being opened.
        bcnt: u16,
        /// Up to [`INIT_PAYLOAD_MAX`] bytes of payload; may be
        /// zero-padded past `bcnt` bytes of real content.
        head: &'a [u8],
    },
    /// A continuation packet of an already-opened message.
    Cont {
        /// Destination channel; must match the init packet's.
        cid: u32,
        /// Sequence number, starting at 0 and incrementing by one.
        seq: u8,
        /// Up to [`CONT_PAYLOAD_MAX`] bytes of payload continuation.
        tail: &'a [u8],
    },
}

impl<'a> PacketView<'a> {
    /// Channel id carried by this packet, regardless of its kind.
    #[must_use]
    pub fn cid(&self) -> u32 {
        match *self {
            Self::Init { cid, .. } | Self::Cont { cid, .. } => cid,
        }
    }
}

/// Decode a raw 64-byte frame into its init or continuation view.
///
/// # Errors
///
/// Returns [`ProtoError::InvalidFrameLen`] if `frame` is not exactly
/// [`FRAME_LEN`] bytes. Never panics and never allocates.
pub fn decode(frame: &[u8]) -> Result<PacketView<'_>, ProtoError> {
    if frame.len() != FRAME_LEN {
        return Err(ProtoError::InvalidFrameLen { expected: FRAME_LEN, actual: frame.len() });
    }

    let cid = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    let tag = frame[4];

    if tag & TYPE_INIT_MASK != 0 {
        let bcnt = u16::from_be_bytes([frame[5], frame[6]]);
        Ok(PacketView::Init { cid, cmd: tag, bcnt, head: &frame[INIT_HEADER_LEN..] })
    } else {
        let seq = tag & CONT_SEQ_MASK;
        Ok(PacketView::Cont { cid, seq, tail: &frame[CONT_HEADER_LEN..] })
    }
}

/// Encode an init packet. `head.len()` must be at most [`INIT_PAYLOAD_MAX`];
/// the remainder of the frame is zero-padded.
///
/// # Panics
///
/// Panics if `head` is longer than [`INIT_PAYLOAD_MAX`] — callers are
/// expected to have already chunked the message, see
/// [`crate::message::Message::iter_frames`].
#[must_use]
pub fn encode_init(cid: u32, cmd: u8, bcnt: u16, head: &[u8]) -> [u8; FRAME_LEN] {
    assert!(head.len() <= INIT_PAYLOAD_MAX, "init payload chunk too large");

    let mut frame = [0u8; FRAME_LEN];
    frame[0..4].copy_from_slice(&cid.to_be_bytes());
    frame[4] = cmd | TYPE_INIT_MASK;
    frame[5..7].copy_from_slice(&bcnt.to_be_bytes());
    frame[INIT_HEADER_LEN..INIT_HEADER_LEN + head.len()].copy_from_slice(head);
    frame
}

/// Encode a continuation packet. `tail.len()` must be at most
/// [`CONT_PAYLOAD_MAX`] and `seq` must fit in the low 7 bits.
///
/// # Panics
///
/// Panics if `tail` is too long or `seq` has its high bit set.
#[must_use]
pub fn encode_cont(cid: u32, seq: u8, tail: &[u8]) -> [u8; FRAME_LEN] {
    assert!(tail.len() <= CONT_PAYLOAD_MAX, "continuation payload chunk too large");
    assert!(seq & !CONT_SEQ_MASK == 0, "sequence number out of range");

    let mut frame = [0u8; FRAME_LEN];
    frame[0..4].copy_from_slice(&cid.to_be_bytes());
    frame[4] = seq & CONT_SEQ_MASK;
    frame[CONT_HEADER_LEN..CONT_HEADER_LEN + tail.len()].copy_from_slice(tail);
    frame
}
