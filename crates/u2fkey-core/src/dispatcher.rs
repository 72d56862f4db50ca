//! `U2FHID` message dispatch: reads frames, feeds the channel table's
//! reassemblers, and routes completed messages by `cmd`.
//!
//! Mirrors the teacher's `ServerDriver`/`ConnectionAction` pattern: the
//! dispatcher is a pure state machine over one frame at a time. It takes a
//! frame, returns the [`HidAction`]s the caller must execute (write frames
//! to the device, or shut down), and never performs I/O itself.

use rand_core::{CryptoRng, CryptoRngCore, RngCore};
use u2fkey_proto::constants::{
    BROADCAST_CID, CMD_ERROR, CMD_INIT, CMD_LOCK, CMD_MSG, CMD_PING, CMD_WINK, NULL_CID,
    PROTOCOL_VERSION,
};
use u2fkey_proto::message::{Message, ReassembleOutcome};
use u2fkey_proto::packet::{self, PacketView};

use crate::channel::ChannelTable;
use crate::env::Environment;
use crate::error::HidError;

/// Authenticator device version, reported in every `U2FHID_INIT` response.
/// Matches the spec's worked example (`maj=00 min=01 build=00`) exactly.
pub const DEVICE_VERSION: (u8, u8, u8) = (0, 1, 0);

/// No capability flags are advertised.
pub const CAPABILITY_FLAGS: u8 = 0x00;

/// An effect the dispatcher wants its caller to perform.
///
/// The dispatcher itself never writes to the device or terminates the
/// process; it only describes what should happen, keeping it pure and
/// trivially unit-testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidAction {
    /// Write this 64-byte frame to the device, in order.
    WriteFrame([u8; 64]),
    /// A fatal condition occurred; the caller should terminate the event
    /// loop after flushing any actions already returned.
    Shutdown {
        /// Human-readable reason, for logging.
        reason: String,
    },
}

/// The outcome of handing a complete `CMD_MSG` payload to the raw-message
/// layer.
///
/// Kept distinct from [`HidError`] precisely so the HID transport error
/// taxonomy and the APDU status-word taxonomy can never cross (`spec.md`
/// §7): every [`ApduOutcome::Response`] is itself a well-formed `CMD_MSG`
/// reply whose payload ends in a status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApduOutcome {
    /// A complete `CMD_MSG` response payload, ending in a two-byte status
    /// word.
    Response(Vec<u8>),
    /// The raw-message layer hit a fatal condition (e.g. counter
    /// persistence failure) and the event loop must terminate.
    Fatal(String),
}

/// The seam between the dispatcher and the U2F APDU state machine
/// (`crate::apdu`), kept as a trait so the dispatcher stays crypto- and
/// storage-agnostic (generalizes the spec's "pass the crypto capability set
/// explicitly" design note to the whole raw-message handler).
pub trait RawMessageHandler: Send + Sync {
    /// Handle one complete `CMD_MSG` payload (a raw U2F APDU) and produce
    /// its response.
    fn handle(&self, payload: &[u8], rng: &mut dyn CryptoRngCore) -> ApduOutcome;
}

/// Adapts an [`Environment`]'s randomness into an `rng` the crypto façade
/// can consume, so the raw-message layer never touches the OS RNG or the
/// environment directly.
struct EnvRng<'a, E: Environment>(&'a E);

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        self.0.random_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.random_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.0.random_bytes(dest);
        Ok(())
    }
}

impl<E: Environment> CryptoRng for EnvRng<'_, E> {}

/// Drives the `U2FHID` transport: one [`ChannelTable`] plus one injected
/// [`RawMessageHandler`] for the APDU layer.
pub struct Dispatcher<E: Environment, H: RawMessageHandler> {
    env: E,
    channels: ChannelTable<E::Instant>,
    handler: H,
}

impl<E: Environment, H: RawMessageHandler> Dispatcher<E, H> {
    /// Build a dispatcher over `env` and `handler`, with no channels yet
    /// allocated.
    pub fn new(env: E, handler: H) -> Self {
        Self { env, channels: ChannelTable::new(), handler }
    }

    /// Number of currently live channels, for diagnostics and tests.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Process one 64-byte frame read from the device, returning the
    /// actions the caller must perform in order.
    pub fn process_frame(&mut self, frame: [u8; 64]) -> Vec<HidAction> {
        match packet::decode(&frame) {
            Ok(PacketView::Init { cid, cmd, bcnt, head }) if cmd == CMD_INIT => {
                self.handle_init_command(cid, bcnt, head)
            },
            Ok(PacketView::Init { cid, cmd, bcnt, head }) => self.feed_init(cid, cmd, bcnt, head),
            Ok(PacketView::Cont { cid, seq, tail }) => self.feed_cont(cid, seq, tail),
            // `decode` only ever fails on a wrong-length slice, which cannot
            // happen given the `[u8; 64]` parameter type.
            Err(_) => Vec::new(),
        }
    }

    /// Sweep all live channels for expired reassembly deadlines and retire
    /// fully idle ones. Call this periodically (not just on frame arrival)
    /// so a channel that simply stops sending still times out per
    /// `spec.md` §4.2/§5.
    pub fn poll_timeouts(&mut self) -> Vec<HidAction> {
        let now = self.env.now();
        let mut actions = Vec::new();
        for cid in self.channels.live_cids().collect::<Vec<_>>() {
            if let Some(reassembler) = self.channels.reassembler_mut(cid) {
                if let ReassembleOutcome::Error(code) = reassembler.check_timeout(now) {
                    actions.extend(error_actions(cid, code));
                }
            }
        }
        self.channels.reap_idle(now);
        actions
    }

    fn handle_init_command(&mut self, cid: u32, bcnt: u16, head: &[u8]) -> Vec<HidAction> {
        if cid != BROADCAST_CID {
            return error_actions(cid, HidError::InvalidCid.wire_code());
        }
        if usize::from(bcnt) != 8 || head.len() < 8 {
            return error_actions(cid, HidError::InvalidPar.wire_code());
        }

        let nonce = &head[..8];
        let new_cid = self.channels.allocate(&self.env);

        let mut payload = Vec::with_capacity(17);
        payload.extend_from_slice(nonce);
        payload.extend_from_slice(&new_cid.to_be_bytes());
        payload.push(PROTOCOL_VERSION);
        payload.push(DEVICE_VERSION.0);
        payload.push(DEVICE_VERSION.1);
        payload.push(DEVICE_VERSION.2);
        payload.push(CAPABILITY_FLAGS);

        respond(BROADCAST_CID, CMD_INIT, &payload)
    }

    fn feed_init(&mut self, cid: u32, cmd: u8, bcnt: u16, head: &[u8]) -> Vec<HidAction> {
        if cid == NULL_CID || !self.channels.contains(cid) {
            return error_actions(cid, HidError::InvalidCid.wire_code());
        }
        let now = self.env.now();
        self.channels.touch(cid, now);
        let outcome = self
            .channels
            .reassembler_mut(cid)
            .expect("just checked contains()")
            .on_init(cmd, bcnt, head, now);
        self.route_outcome(cid, outcome)
    }

    fn feed_cont(&mut self, cid: u32, seq: u8, tail: &[u8]) -> Vec<HidAction> {
        if cid == NULL_CID || !self.channels.contains(cid) {
            return error_actions(cid, HidError::InvalidCid.wire_code());
        }
        let now = self.env.now();
        self.channels.touch(cid, now);
        let outcome = self
            .channels
            .reassembler_mut(cid)
            .expect("just checked contains()")
            .on_cont(seq, tail, now);
        self.route_outcome(cid, outcome)
    }

    fn route_outcome(&mut self, cid: u32, outcome: ReassembleOutcome) -> Vec<HidAction> {
        match outcome {
            ReassembleOutcome::Pending => Vec::new(),
            ReassembleOutcome::Error(code) => error_actions(cid, code),
            ReassembleOutcome::Complete { cmd, payload } => self.dispatch_complete(cid, cmd, payload),
        }
    }

    fn dispatch_complete(&mut self, cid: u32, cmd: u8, payload: Vec<u8>) -> Vec<HidAction> {
        match cmd {
            CMD_PING => respond(cid, CMD_PING, &payload),
            CMD_MSG => {
                let mut rng = EnvRng(&self.env);
                match self.handler.handle(&payload, &mut rng) {
                    ApduOutcome::Response(body) => respond(cid, CMD_MSG, &body),
                    ApduOutcome::Fatal(reason) => vec![HidAction::Shutdown { reason }],
                }
            },
            CMD_WINK => respond(cid, CMD_WINK, &[]),
            CMD_LOCK => error_actions(cid, HidError::InvalidCmd.wire_code()),
            _ => error_actions(cid, HidError::InvalidCmd.wire_code()),
        }
    }
}

fn respond(cid: u32, cmd: u8, payload: &[u8]) -> Vec<HidAction> {
    let mut msg = Message::new_outbound(cid, cmd);
    msg.append(payload);
    msg.iter_frames().map(HidAction::WriteFrame).collect()
}

fn error_actions(cid: u32, code: u8) -> Vec<HidAction> {
    respond(cid, CMD_ERROR, &[code])
}
