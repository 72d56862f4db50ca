//! The event loop: reads frames off a [`HidDevice`], feeds them to a
//! [`Dispatcher`], and executes the [`HidAction`]s it returns.
//!
//! Deliberately thin. `u2fkey_core::Dispatcher` already is the state
//! machine (mirroring the teacher's `ServerDriver`/`ServerAction` split);
//! this module is only the I/O loop that drives it, the same division of
//! responsibility the teacher's `lib.rs` draws between `ServerDriver` and
//! `execute_actions`.

use std::io;

use tracing::{debug, info, warn};
use u2fkey_core::dispatcher::{Dispatcher, HidAction, RawMessageHandler};
use u2fkey_core::env::Environment;

use crate::device::HidDevice;
use crate::error::ServerError;

/// Run the authenticator event loop until the device fails or the
/// dispatcher requests a shutdown.
///
/// Blocks on `device.read_frame()`. A [`io::ErrorKind::TimedOut`] read is
/// not an error: it means the device had nothing to say within the
/// implementation's poll interval, and gives the dispatcher a chance to
/// expire any reassembly in progress via [`Dispatcher::poll_timeouts`].
///
/// # Errors
///
/// Returns [`ServerError::Fatal`] if the dispatcher reports a fatal
/// condition (for example, counter persistence failure), or
/// [`ServerError::Device`] if the device transport fails for any reason
/// other than a poll timeout.
pub fn run<E, H, D>(mut dispatcher: Dispatcher<E, H>, mut device: D) -> Result<(), ServerError>
where
    E: Environment,
    H: RawMessageHandler,
    D: HidDevice,
{
    loop {
        let actions = match device.read_frame() {
            Ok(frame) => dispatcher.process_frame(frame),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => dispatcher.poll_timeouts(),
            Err(e) => return Err(ServerError::Device(e)),
        };

        for action in actions {
            match action {
                HidAction::WriteFrame(frame) => {
                    device.write_frame(&frame)?;
                },
                HidAction::Shutdown { reason } => {
                    warn!(%reason, "dispatcher requested shutdown");
                    return Err(ServerError::Fatal(reason));
                },
            }
        }
        debug!(channels = dispatcher.channel_count(), "processed one read cycle");
    }
}

/// Log that the authenticator is about to start serving frames.
pub fn log_start(channel_count: usize) {
    info!(channel_count, "authenticator event loop starting");
}
