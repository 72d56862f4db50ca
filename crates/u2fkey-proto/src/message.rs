//! Outbound message splitting and inbound frame reassembly.
//!
//! Outbound: [`Message`] accumulates a payload and lazily yields the frames
//! that carry it — one init frame, then as many continuations as needed.
//!
//! Inbound: [`Reassembler`] drives exactly the per-channel state table a
//! `U2FHID` transceiver needs: `Idle` until an init packet opens a message,
//! `Receiving` while continuation packets fill it in, back to `Idle` on
//! completion, error, or timeout. Time is a type parameter rather than a
//! hard dependency on a wall clock, so tests can drive it with values that
//! never call into the OS.

use std::ops::Add;
use std::time::Duration;

use crate::constants::{
    CONT_PAYLOAD_MAX, CONT_SEQ_MAX, ERR_INVALID_LEN, ERR_INVALID_SEQ, ERR_MSG_TIMEOUT,
    INIT_PAYLOAD_MAX, MAX_MESSAGE_LEN, REASSEMBLY_TIMEOUT,
};
use crate::packet::{encode_cont, encode_init};

/// An outbound `U2FHID` message, built up by [`Message::append`] and
/// consumed one frame at a time by [`Message::iter_frames`].
#[derive(Debug, Clone)]
pub struct Message {
    cid: u32,
    cmd: u8,
    payload: Vec<u8>,
}

impl Message {
    /// Start a new, empty outbound message on `cid` with command `cmd`.
    #[must_use]
    pub fn new_outbound(cid: u32, cmd: u8) -> Self {
        Self { cid, cmd, payload: Vec::new() }
    }

    /// Append bytes to the message payload, growing `bcnt`.
    pub fn append(&mut self, bytes: &[u8]) {
        self.payload.extend_from_slice(bytes);
    }

    /// The channel this message will be sent on.
    #[must_use]
    pub fn cid(&self) -> u32 {
        self.cid
    }

    /// Total payload length (`bcnt`), saturated to `u16::MAX`.
    #[must_use]
    pub fn bcnt(&self) -> u16 {
        self.payload.len().min(usize::from(u16::MAX)) as u16
    }

    /// Lazily yield this message's frames: one init frame followed by
    /// zero or more continuation frames with seq `0, 1, 2, …`.
    pub fn iter_frames(&self) -> FrameIter<'_> {
        FrameIter { message: self, offset: 0, seq: 0, emitted_init: false }
    }
}

/// Iterator over the wire frames of an outbound [`Message`].
pub struct FrameIter<'a> {
    message: &'a Message,
    offset: usize,
    seq: u8,
    emitted_init: bool,
}

impl Iterator for FrameIter<'_> {
    type Item = [u8; 64];

    fn next(&mut self) -> Option<Self::Item> {
        if !self.emitted_init {
            self.emitted_init = true;
            let take = self.message.payload.len().min(INIT_PAYLOAD_MAX);
            let head = &self.message.payload[..take];
            self.offset = take;
            return Some(encode_init(self.message.cid, self.message.cmd, self.message.bcnt(), head));
        }

        if self.offset >= self.message.payload.len() {
            return None;
        }

        let take = (self.message.payload.len() - self.offset).min(CONT_PAYLOAD_MAX);
        let tail = &self.message.payload[self.offset..self.offset + take];
        let frame = encode_cont(self.message.cid, self.seq, tail);
        self.offset += take;
        self.seq += 1;
        Some(frame)
    }
}

/// Result of feeding one packet into a [`Reassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassembleOutcome {
    /// More continuation packets are still expected.
    Pending,
    /// The message is complete.
    Complete {
        /// The command the message was opened with.
        cmd: u8,
        /// The fully reassembled payload, exactly `bcnt` bytes.
        payload: Vec<u8>,
    },
    /// Reassembly failed; the channel returns to `Idle`. Carries one of the
    /// `ERR_*` constants from [`crate::constants`].
    Error(u8),
}

#[derive(Debug, Clone)]
enum State<I> {
    Idle,
    Receiving { cmd: u8, bcnt: usize, buf: Vec<u8>, next_seq: u8, deadline: I },
}

/// Per-channel inbound message reassembly state machine.
///
/// `I` is an opaque instant type satisfying `Copy + Ord + Add<Duration>` —
/// in production this is a monotonic clock reading, in tests a plain
/// integer tick count.
#[derive(Debug, Clone)]
pub struct Reassembler<I> {
    state: State<I>,
}

impl<I: Copy + Ord + Add<Duration, Output = I>> Default for Reassembler<I> {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl<I: Copy + Ord + Add<Duration, Output = I>> Reassembler<I> {
    /// A fresh reassembler, in the `Idle` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a message is currently being assembled.
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving { .. })
    }

    /// Feed an init packet. Always (re-)starts a new message, matching the
    /// transport rule that a fresh `U2FHID_INIT`-style packet on a channel
    /// discards any transaction that channel had in flight.
    pub fn on_init(&mut self, cmd: u8, bcnt: u16, head: &[u8], now: I) -> ReassembleOutcome {
        let bcnt = usize::from(bcnt);

        if bcnt > MAX_MESSAGE_LEN {
            self.state = State::Idle;
            return ReassembleOutcome::Error(ERR_INVALID_LEN);
        }

        // `head` is always a full, zero-padded packet slice; only the first
        // `bcnt` bytes (if any) are real content.
        let take = head.len().min(bcnt);
        let content = &head[..take];

        if take >= bcnt {
            self.state = State::Idle;
            return ReassembleOutcome::Complete { cmd, payload: content.to_vec() };
        }

        let mut buf = Vec::with_capacity(bcnt);
        buf.extend_from_slice(content);
        self.state =
            State::Receiving { cmd, bcnt, buf, next_seq: 0, deadline: now + REASSEMBLY_TIMEOUT };
        ReassembleOutcome::Pending
    }

    /// Feed a continuation packet.
    ///
    /// The reassembly deadline is an inactivity window, not an absolute
    /// budget: every accepted continuation pushes it `REASSEMBLY_TIMEOUT`
    /// further out, so a legitimate message whose frames keep arriving
    /// under the per-frame deadline is never aborted just for taking a
    /// while overall.
    pub fn on_cont(&mut self, seq: u8, tail: &[u8], now: I) -> ReassembleOutcome {
        let State::Receiving { cmd, bcnt, buf, next_seq, deadline } = &mut self.state else {
            // A continuation with no open message is simply ignored by the
            // channel it targets; the dispatcher is responsible for routing
            // it here only when a message is in flight.
            return ReassembleOutcome::Pending;
        };

        if now > *deadline {
            self.state = State::Idle;
            return ReassembleOutcome::Error(ERR_MSG_TIMEOUT);
        }

        if seq > CONT_SEQ_MAX || seq != *next_seq {
            self.state = State::Idle;
            return ReassembleOutcome::Error(ERR_INVALID_SEQ);
        }

        let remaining = *bcnt - buf.len();
        let take = remaining.min(tail.len());
        buf.extend_from_slice(&tail[..take]);

        if buf.len() >= *bcnt {
            let cmd = *cmd;
            let payload = std::mem::take(buf);
            self.state = State::Idle;
            return ReassembleOutcome::Complete { cmd, payload };
        }

        *next_seq = next_seq.wrapping_add(1);
        *deadline = now + REASSEMBLY_TIMEOUT;
        ReassembleOutcome::Pending
    }

    /// Check whether the in-flight message (if any) has exceeded its
    /// reassembly deadline as of `now`, aborting it if so. Call this on a
    /// periodic tick, not just when a frame arrives, so a channel that
    /// simply stops sending still gets reaped.
    pub fn check_timeout(&mut self, now: I) -> ReassembleOutcome {
        if let State::Receiving { deadline, .. } = &self.state {
            if now > *deadline {
                self.state = State::Idle;
                return ReassembleOutcome::Error(ERR_MSG_TIMEOUT);
            }
        }
        ReassembleOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::constants::BROADCAST_CID;

    /// A trivial monotonic instant for tests: a millisecond tick count. Real
    /// code uses a wall-clock reading (see `u2fkey-core::env::Environment`);
    /// this crate only needs `Copy + Ord + Add<Duration>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Tick(u64);

    impl Add<Duration> for Tick {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self {
            Self(self.0 + rhs.as_millis() as u64)
        }
    }

    fn frames_for(cid: u32, cmd: u8, payload: &[u8]) -> Vec<[u8; 64]> {
        let mut msg = Message::new_outbound(cid, cmd);
        msg.append(payload);
        msg.iter_frames().collect()
    }

    fn reassemble(frames: &[[u8; 64]]) -> ReassembleOutcome {
        let mut r: Reassembler<Tick> = Reassembler::new();
        let mut last = ReassembleOutcome::Pending;
        for (i, frame) in frames.iter().enumerate() {
            let now = Tick(i as u64);
            last = match crate::packet::decode(frame).expect("decode") {
                crate::packet::PacketView::Init { cmd, bcnt, head, .. } => {
                    r.on_init(cmd, bcnt, head, now)
                },
                crate::packet::PacketView::Cont { seq, tail, .. } => r.on_cont(seq, tail, now),
            };
        }
        last
    }

    #[test]
    fn single_frame_message_completes_immediately() {
        let frames = frames_for(0x42, 0x81, b"short");
        assert_eq!(frames.len(), 1);
        match reassemble(&frames) {
            ReassembleOutcome::Complete { cmd, payload } => {
                assert_eq!(cmd, 0x81);
                assert_eq!(payload, b"short");
            },
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn multi_frame_message_splits_and_reassembles() {
        let payload = vec![7u8; 200];
        let frames = frames_for(BROADCAST_CID, 0x83, &payload);
        assert!(frames.len() > 1);
        match reassemble(&frames) {
            ReassembleOutcome::Complete { cmd, payload: got } => {
                assert_eq!(cmd, 0x83);
                assert_eq!(got, payload);
            },
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn out_of_order_continuation_errors() {
        let payload = vec![1u8; 200];
        let frames = frames_for(1, 0x83, &payload);
        let mut r: Reassembler<Tick> = Reassembler::new();
        let crate::packet::PacketView::Init { cmd, bcnt, head, .. } =
            crate::packet::decode(&frames[0]).expect("decode")
        else {
            unreachable!()
        };
        assert_eq!(r.on_init(cmd, bcnt, head, Tick(0)), ReassembleOutcome::Pending);

        // Skip seq 0, go straight to seq 1.
        let crate::packet::PacketView::Cont { tail, .. } =
            crate::packet::decode(&frames[2]).expect("decode")
        else {
            unreachable!()
        };
        assert_eq!(r.on_cont(1, tail, Tick(1)), ReassembleOutcome::Error(ERR_INVALID_SEQ));
        assert!(!r.is_receiving());
    }

    #[test]
    fn reassembly_times_out() {
        let payload = vec![1u8; 200];
        let frames = frames_for(1, 0x83, &payload);
        let mut r: Reassembler<Tick> = Reassembler::new();
        let crate::packet::PacketView::Init { cmd, bcnt, head, .. } =
            crate::packet::decode(&frames[0]).expect("decode")
        else {
            unreachable!()
        };
        assert_eq!(r.on_init(cmd, bcnt, head, Tick(0)), ReassembleOutcome::Pending);

        let far_future = Tick(REASSEMBLY_TIMEOUT.as_millis() as u64 + 1);
        assert_eq!(r.check_timeout(far_future), ReassembleOutcome::Error(ERR_MSG_TIMEOUT));
        assert!(!r.is_receiving());
    }

    #[test]
    fn deadline_is_refreshed_by_each_continuation_not_fixed_at_init_time() {
        // Three frames, each arriving just under the timeout after the
        // last. The total span exceeds REASSEMBLY_TIMEOUT, but no single
        // gap does, so the message must still complete.
        let payload = vec![1u8; 120]; // init (57) + 2 continuations
        let frames = frames_for(1, 0x83, &payload);
        assert_eq!(frames.len(), 3);
        let step = REASSEMBLY_TIMEOUT.as_millis() as u64 - 1;

        let mut r: Reassembler<Tick> = Reassembler::new();
        let crate::packet::PacketView::Init { cmd, bcnt, head, .. } =
            crate::packet::decode(&frames[0]).expect("decode")
        else {
            unreachable!()
        };
        assert_eq!(r.on_init(cmd, bcnt, head, Tick(0)), ReassembleOutcome::Pending);

        let crate::packet::PacketView::Cont { seq, tail, .. } =
            crate::packet::decode(&frames[1]).expect("decode")
        else {
            unreachable!()
        };
        assert_eq!(r.on_cont(seq, tail, Tick(step)), ReassembleOutcome::Pending);

        let crate::packet::PacketView::Cont { seq, tail, .. } =
            crate::packet::decode(&frames[2]).expect("decode")
        else {
            unreachable!()
        };
        // Absolute time since on_init (2 * step) exceeds REASSEMBLY_TIMEOUT,
        // but the gap since the last continuation does not.
        assert!(2 * step > REASSEMBLY_TIMEOUT.as_millis() as u64);
        match r.on_cont(seq, tail, Tick(2 * step)) {
            ReassembleOutcome::Complete { cmd: got_cmd, payload: got_payload } => {
                assert_eq!(got_cmd, 0x83);
                assert_eq!(got_payload, payload);
            },
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn init_payload_past_bcnt_is_truncated_not_rejected() {
        // The init packet's head slice is always zero-padded to 57 bytes;
        // only the first `bcnt` bytes are real content.
        let mut r: Reassembler<Tick> = Reassembler::new();
        assert_eq!(
            r.on_init(0x81, 2, b"too many bytes", Tick(0)),
            ReassembleOutcome::Complete { cmd: 0x81, payload: b"to".to_vec() }
        );
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let mut r: Reassembler<Tick> = Reassembler::new();
        assert_eq!(
            r.on_init(0x83, u16::MAX, b"x", Tick(0)),
            ReassembleOutcome::Error(ERR_INVALID_LEN)
        );
    }

    proptest! {
        #[test]
        fn prop_split_then_reassemble_is_identity(
            cid in any::<u32>(),
            cmd in 0x80u8..=0xFFu8,
            payload in prop::collection::vec(any::<u8>(), 0..2000),
        ) {
            let frames = frames_for(cid, cmd, &payload);
            match reassemble(&frames) {
                ReassembleOutcome::Complete { cmd: got_cmd, payload: got_payload } => {
                    prop_assert_eq!(got_cmd, cmd);
                    prop_assert_eq!(got_payload, payload);
                },
                other => prop_assert!(false, "expected Complete, got {:?}", other),
            }
        }
    }
}
