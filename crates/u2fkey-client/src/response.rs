//! Reassembles a relying party's view of the authenticator's response
//! frames, mirroring `u2fkey-proto::message::Reassembler`'s state table but
//! without a timeout: a test driver controls pacing directly, so there is
//! no idle channel to reap.

use u2fkey_proto::constants::CONT_SEQ_MAX;
use u2fkey_proto::packet::{self, PacketView};

use crate::error::ClientError;

struct Pending {
    cid: u32,
    cmd: u8,
    bcnt: u16,
    buffer: Vec<u8>,
    next_seq: u8,
}

/// Accumulates `U2FHID` response frames into complete `(cmd, payload)`
/// pairs.
#[derive(Default)]
pub struct ResponseReader {
    pending: Option<Pending>,
}

impl ResponseReader {
    /// Feed one frame, returning the completed response if this frame
    /// finished it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the frame is malformed, arrives on the
    /// wrong channel, or carries an out-of-order sequence number.
    pub fn feed(&mut self, frame: &[u8; 64]) -> Result<Option<(u8, Vec<u8>)>, ClientError> {
        match packet::decode(frame).map_err(|e| ClientError::MalformedFrame(e.to_string()))? {
            PacketView::Init { cid, cmd, bcnt, head } => self.on_init(cid, cmd, bcnt, head),
            PacketView::Cont { cid, seq, tail } => self.on_cont(cid, seq, tail),
        }
    }

    fn on_init(&mut self, cid: u32, cmd: u8, bcnt: u16, head: &[u8]) -> Result<Option<(u8, Vec<u8>)>, ClientError> {
        if self.pending.is_some() {
            return Err(ClientError::ResponseAlreadyInProgress);
        }
        let mut buffer = Vec::with_capacity(usize::from(bcnt));
        buffer.extend_from_slice(&head[..head.len().min(usize::from(bcnt))]);
        if buffer.len() >= usize::from(bcnt) {
            buffer.truncate(usize::from(bcnt));
            return Ok(Some((cmd, buffer)));
        }
        self.pending = Some(Pending { cid, cmd, bcnt, buffer, next_seq: 0 });
        Ok(None)
    }

    fn on_cont(&mut self, cid: u32, seq: u8, tail: &[u8]) -> Result<Option<(u8, Vec<u8>)>, ClientError> {
        let pending = self.pending.as_mut().ok_or(ClientError::NoResponseInProgress)?;
        if cid != pending.cid {
            return Err(ClientError::ChannelMismatch { expected: pending.cid, got: cid });
        }
        if seq != pending.next_seq {
            return Err(ClientError::SequenceMismatch { expected: pending.next_seq, got: seq });
        }
        let remaining = usize::from(pending.bcnt) - pending.buffer.len();
        pending.buffer.extend_from_slice(&tail[..tail.len().min(remaining)]);
        pending.next_seq = pending.next_seq.wrapping_add(1) & CONT_SEQ_MAX;

        if pending.buffer.len() >= usize::from(pending.bcnt) {
            let Pending { cmd, buffer, .. } = self.pending.take().expect("checked is_some above");
            return Ok(Some((cmd, buffer)));
        }
        Ok(None)
    }
}
