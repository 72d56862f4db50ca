//! Software U2F HID authenticator binary.
//!
//! # Usage
//!
//! ```bash
//! u2fkey-server \
//!     --device /dev/hidg0 \
//!     --attestation-key attestation.pem \
//!     --attestation-cert attestation.der \
//!     --wrapping-key wrapping.key \
//!     --counter-db counter.redb
//! ```

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use u2fkey_server::attestation::{FileAttestationProvider, FileWrappingKeyProvider};
use u2fkey_server::device::FileDevice;
use u2fkey_server::storage::RedbCounterStore;
use u2fkey_server::{AuthenticatorConfig, SystemEnv, run_authenticator};

/// Software U2F HID authenticator
#[derive(Parser, Debug)]
#[command(name = "u2fkey-server")]
#[command(about = "Software U2F HID authenticator")]
#[command(version)]
struct Args {
    /// Path to the HID character device to serve frames on
    #[arg(long)]
    device: String,

    /// Path to the attestation private key (PKCS#8 PEM)
    #[arg(long)]
    attestation_key: String,

    /// Path to the attestation certificate (DER)
    #[arg(long)]
    attestation_cert: String,

    /// Path to the 32-byte key-handle wrapping key
    #[arg(long)]
    wrapping_key: String,

    /// Path to the counter database (created if absent)
    #[arg(long)]
    counter_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("u2fkey-server starting");
    tracing::info!(device = %args.device, "opening authenticator device");

    let attestation = FileAttestationProvider::load(&args.attestation_key, &args.attestation_cert)?;
    let wrapping_key = FileWrappingKeyProvider::load(&args.wrapping_key)?;
    let counter = RedbCounterStore::open(&args.counter_db)?;
    let device = FileDevice::open(&args.device)?;

    let config = AuthenticatorConfig { attestation, wrapping_key, counter, device };

    run_authenticator(SystemEnv::new(), config)?;

    Ok(())
}
