//! Wires the APDU command handlers into one [`RawMessageHandler`] the
//! dispatcher can drive, by composing the capability traits an
//! authenticator instance is configured with.

use rand_core::CryptoRngCore;
use u2fkey_proto::constants::{SW_CLA_NOT_SUPPORTED, SW_INS_NOT_SUPPORTED};

use crate::apdu::{self, AuthMode, Command};
use crate::dispatcher::{ApduOutcome, RawMessageHandler};
use crate::provider::{AttestationProvider, CounterProvider, PresenceCheck, WrappingKeyProvider};

/// The production [`RawMessageHandler`]: parses each `CMD_MSG` payload as a
/// U2F raw message and routes it to REGISTER, AUTHENTICATE, or VERSION.
///
/// Every dependency is a trait object so the authenticator binary can wire
/// in `redb`-backed storage and a loaded attestation identity while tests
/// substitute fixed or in-memory stand-ins, mirroring the crypto façade's
/// own injection pattern.
pub struct RawMessageLayer {
    crypto: Box<dyn u2fkey_crypto::CryptoProvider>,
    wrapping_key: Box<dyn WrappingKeyProvider>,
    attestation: Box<dyn AttestationProvider>,
    counter: Box<dyn CounterProvider>,
    presence: Box<dyn PresenceCheck>,
}

impl RawMessageLayer {
    /// Compose a raw-message layer from its capability providers.
    pub fn new(
        crypto: Box<dyn u2fkey_crypto::CryptoProvider>,
        wrapping_key: Box<dyn WrappingKeyProvider>,
        attestation: Box<dyn AttestationProvider>,
        counter: Box<dyn CounterProvider>,
        presence: Box<dyn PresenceCheck>,
    ) -> Self {
        Self { crypto, wrapping_key, attestation, counter, presence }
    }
}

impl RawMessageHandler for RawMessageLayer {
    fn handle(&self, payload: &[u8], rng: &mut dyn CryptoRngCore) -> ApduOutcome {
        let Some(req) = apdu::parse(payload) else {
            return ApduOutcome::Response(apdu::sw_only(
                u2fkey_proto::constants::SW_WRONG_DATA,
            ));
        };
        if req.cla != 0x00 {
            return ApduOutcome::Response(apdu::sw_only(SW_CLA_NOT_SUPPORTED));
        }
        match req.command() {
            Command::Register => {
                apdu::handle_register(&req, self.crypto.as_ref(), self.wrapping_key.as_ref(), self.attestation.as_ref(), rng)
            },
            Command::Authenticate(AuthMode::Unknown(_)) => {
                ApduOutcome::Response(apdu::sw_only(u2fkey_proto::constants::SW_WRONG_DATA))
            },
            Command::Authenticate(mode) => apdu::handle_authenticate(
                &req,
                mode,
                self.crypto.as_ref(),
                self.wrapping_key.as_ref(),
                self.counter.as_ref(),
                self.presence.as_ref(),
                rng,
            ),
            Command::Version => apdu::handle_version(&req),
            Command::Unknown(_) => {
                ApduOutcome::Response(apdu::sw_only(SW_INS_NOT_SUPPORTED))
            },
        }
    }
}
