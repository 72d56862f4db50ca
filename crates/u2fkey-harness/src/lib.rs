//! Scenario-test harness for the `U2FHID` authenticator.
//!
//! Runs a real [`u2fkey_server::driver::run`] event loop against an
//! in-memory [`u2fkey_server::device::DuplexMemoryDevice`], paired with a
//! manually-advanceable clock ([`env::TestEnv`]) so reassembly-timeout
//! scenarios don't need to race a real one. [`harness::AuthenticatorHarness`]
//! wires the two together; [`u2fkey_client::RelyingPartyClient`] builds and
//! parses the frames each scenario sends and receives.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod fixtures;
pub mod harness;

pub use env::TestEnv;
pub use fixtures::{ATTESTATION_CERT, FixedAttestation, FixedWrappingKey};
pub use harness::{AuthenticatorHarness, RECV_TIMEOUT};
