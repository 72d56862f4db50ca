//! A minimal relying-party driver: builds `U2FHID` request frames and
//! reassembles the authenticator's responses.
//!
//! Exists purely to exercise an authenticator end-to-end in tests without a
//! real browser or USB stack — the same role the teacher's `Client` plays
//! against a Lockframe server, narrowed from a whole MLS room/session state
//! machine down to one `U2FHID` channel's request/response pairing.

use u2fkey_proto::constants::{BROADCAST_CID, CMD_INIT, CMD_MSG, CMD_PING};
use u2fkey_proto::message::Message;
use u2fkey_proto::packet::{self, PacketView};

use crate::error::ClientError;
use crate::response::ResponseReader;

/// Drives one `U2FHID` channel as a relying party: sends INIT/PING/MSG
/// requests and reassembles the authenticator's replies.
#[derive(Default)]
pub struct RelyingPartyClient {
    cid: Option<u32>,
    responses: ResponseReader,
}

impl RelyingPartyClient {
    /// Create a client with no channel allocated yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel id allocated by the last successful INIT handshake, if
    /// any.
    #[must_use]
    pub fn cid(&self) -> Option<u32> {
        self.cid
    }

    /// Build the `U2FHID_INIT` request frame that allocates a channel,
    /// carrying `nonce` as the handshake's echoed payload.
    #[must_use]
    pub fn build_init(nonce: [u8; 8]) -> [u8; 64] {
        let mut msg = Message::new_outbound(BROADCAST_CID, CMD_INIT);
        msg.append(&nonce);
        msg.iter_frames().next().expect("an init message always yields at least one frame")
    }

    /// Build the `U2FHID_PING` request frames carrying `payload` on the
    /// allocated channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotInitialized`] if no channel has been
    /// allocated yet.
    pub fn build_ping(&self, payload: &[u8]) -> Result<Vec<[u8; 64]>, ClientError> {
        self.build_request(CMD_PING, payload)
    }

    /// Build the `U2FHID_MSG` request frames carrying a raw U2F APDU
    /// (`payload`) on the allocated channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotInitialized`] if no channel has been
    /// allocated yet.
    pub fn build_msg(&self, payload: &[u8]) -> Result<Vec<[u8; 64]>, ClientError> {
        self.build_request(CMD_MSG, payload)
    }

    fn build_request(&self, cmd: u8, payload: &[u8]) -> Result<Vec<[u8; 64]>, ClientError> {
        let cid = self.cid.ok_or(ClientError::NotInitialized)?;
        let mut msg = Message::new_outbound(cid, cmd);
        msg.append(payload);
        Ok(msg.iter_frames().collect())
    }

    /// Feed one response frame from the authenticator. Returns the complete
    /// `(cmd, payload)` once reassembly finishes; if the frame is an INIT
    /// reply, also records the allocated channel id for subsequent
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the frame is malformed or violates the
    /// channel/sequence invariants of an in-progress response.
    pub fn feed(&mut self, frame: &[u8; 64]) -> Result<Option<(u8, Vec<u8>)>, ClientError> {
        let outcome = self.responses.feed(frame)?;
        if let Some((CMD_INIT, payload)) = &outcome {
            if payload.len() >= 12 {
                self.cid = Some(u32::from_be_bytes(payload[8..12].try_into().expect("checked len")));
            }
        }
        Ok(outcome)
    }
}

/// Decode a frame purely to inspect its channel id, without feeding it into
/// a [`RelyingPartyClient`]. Useful in tests asserting on raw wire bytes.
///
/// # Errors
///
/// Returns [`ClientError::MalformedFrame`] if `frame` isn't a well-formed
/// 64-byte packet.
pub fn frame_cid(frame: &[u8; 64]) -> Result<u32, ClientError> {
    match packet::decode(frame).map_err(|e| ClientError::MalformedFrame(e.to_string()))? {
        PacketView::Init { cid, .. } | PacketView::Cont { cid, .. } => Ok(cid),
    }
}
