//! The character-device boundary: reading and writing raw 64-byte `U2FHID`
//! frames.
//!
//! Bringing up the actual uhid/usb-gadget character device is the caller's
//! concern (`spec.md` §1 non-goals) — this module only defines the seam and
//! a production file-backed implementation plus an in-process test double,
//! mirroring how `u2fkey-crypto::CryptoProvider` and `u2fkey-core`'s
//! provider traits keep production backends and test doubles behind one
//! trait.

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::time::Duration;

/// How long [`FileDevice::read_frame`] waits for a frame before returning
/// [`io::ErrorKind::TimedOut`], giving the driver a chance to poll
/// reassembly timeouts even while the device is otherwise silent.
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads and writes fixed 64-byte `U2FHID` frames on a transport.
///
/// `read_frame` blocks until a frame is available. Implementations backed by
/// a real device should return `Err` with [`io::ErrorKind::TimedOut`] after
/// a bounded wait rather than blocking forever, so the driver can still
/// service reassembly timeouts on otherwise-idle channels.
pub trait HidDevice: Send {
    /// Block until one complete 64-byte frame has been read.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on a genuine transport failure, or one tagged
    /// [`io::ErrorKind::TimedOut`] if no frame arrived within the
    /// implementation's internal poll interval.
    fn read_frame(&mut self) -> io::Result<[u8; 64]>;

    /// Write one complete 64-byte frame.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on a genuine transport failure.
    fn write_frame(&mut self, frame: &[u8; 64]) -> io::Result<()>;
}

/// A [`HidDevice`] backed by a character device (or any other file-like
/// object) opened by path.
///
/// Reads happen on a dedicated background thread so `read_frame` can honor
/// [`READ_POLL_INTERVAL`] without the underlying file needing to support
/// non-blocking reads itself.
pub struct FileDevice {
    frames: mpsc::Receiver<io::Result<[u8; 64]>>,
    write_handle: std::fs::File,
}

impl FileDevice {
    /// Open the device at `path` for both reading and writing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the path cannot be opened, or if the file
    /// handle cannot be duplicated for the background reader thread.
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let read_handle = std::fs::OpenOptions::new().read(true).write(true).open(path)?;
        let write_handle = read_handle.try_clone()?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut read_handle = read_handle;
            loop {
                let mut buf = [0u8; 64];
                let result = read_handle.read_exact(&mut buf).map(|()| buf);
                let should_stop = result.is_err();
                if tx.send(result).is_err() || should_stop {
                    break;
                }
            }
        });

        Ok(Self { frames: rx, write_handle })
    }
}

impl HidDevice for FileDevice {
    fn read_frame(&mut self) -> io::Result<[u8; 64]> {
        match self.frames.recv_timeout(READ_POLL_INTERVAL) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "no frame within poll interval"))
            },
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "device reader thread exited"))
            },
        }
    }

    fn write_frame(&mut self, frame: &[u8; 64]) -> io::Result<()> {
        self.write_handle.write_all(frame)
    }
}

/// An in-process byte-pipe pair standing in for a real device in tests.
///
/// Frames written by the "host" side (via [`DuplexMemoryDevice::host_send`])
/// are delivered to `read_frame`; frames the authenticator writes are
/// delivered to the host side via [`DuplexMemoryDevice::host_recv`].
pub struct DuplexMemoryDevice {
    inbound: mpsc::Receiver<[u8; 64]>,
    outbound: mpsc::Sender<[u8; 64]>,
}

/// The host-facing half of a [`DuplexMemoryDevice`] pair.
pub struct DuplexMemoryHost {
    inbound: mpsc::Sender<[u8; 64]>,
    outbound: mpsc::Receiver<[u8; 64]>,
}

impl DuplexMemoryDevice {
    /// Create a connected pair: the authenticator-facing [`HidDevice`] and
    /// the test's host-facing handle.
    #[must_use]
    pub fn pair() -> (Self, DuplexMemoryHost) {
        let (host_tx, device_rx) = mpsc::channel();
        let (device_tx, host_rx) = mpsc::channel();
        (
            Self { inbound: device_rx, outbound: device_tx },
            DuplexMemoryHost { inbound: host_tx, outbound: host_rx },
        )
    }
}

impl HidDevice for DuplexMemoryDevice {
    fn read_frame(&mut self) -> io::Result<[u8; 64]> {
        match self.inbound.recv_timeout(READ_POLL_INTERVAL) {
            Ok(frame) => Ok(frame),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "no frame within poll interval"))
            },
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "host side dropped"))
            },
        }
    }

    fn write_frame(&mut self, frame: &[u8; 64]) -> io::Result<()> {
        self.outbound.send(*frame).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "host side dropped")
        })
    }
}

impl DuplexMemoryHost {
    /// Send one frame to the authenticator.
    ///
    /// # Panics
    ///
    /// Panics if the authenticator side has been dropped.
    pub fn host_send(&self, frame: [u8; 64]) {
        self.inbound.send(frame).expect("authenticator side dropped");
    }

    /// Block for up to `timeout` for the authenticator's next frame.
    pub fn host_recv(&self, timeout: Duration) -> Option<[u8; 64]> {
        self.outbound.recv_timeout(timeout).ok()
    }
}
