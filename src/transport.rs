//! The byte-level transport contract consumed by the DDC/CI codec.

use crate::error::Error;

/// Raw byte access to one DDC/CI-capable device.
///
/// The codec layers framing, checksums, and timing on top of this contract;
/// a transport only moves bytes. The reference implementation streams over
/// a Linux i2c-dev node at the fixed DDC/CI slave address
/// ([`I2cDeviceTransport`]); an OS-mediated implementation that frames
/// commands itself must still honor the open/close and read/write
/// semantics here.
///
/// A transport is exclusively owned by one monitor session at a time; no
/// method is safe to call from two threads concurrently.
pub trait Transport {
    /// Opens the underlying device, waking it if the bus requires it.
    ///
    /// Fails with [`Error::Permission`] when the OS denies access and
    /// [`Error::Io`] for any other open failure.
    fn open(&mut self) -> Result<(), Error>;

    /// Closes the underlying device, releasing its handle.
    fn close(&mut self) -> Result<(), Error>;

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Writes `data` as a single bus transaction.
    fn write(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Reads exactly `buf.len()` bytes; a short read is an I/O error.
    ///
    /// Implementations are responsible for their own OS-level read timeout
    /// so a stuck device eventually fails instead of hanging.
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    /// Human-readable identity of the device, such as its device-node path.
    fn description(&self) -> String;
}

#[cfg(feature = "i2c-linux")]
mod i2c_device {
    use std::fmt;
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::path::{Path, PathBuf};

    use i2c_linux::I2c;
    use tracing::debug;

    use super::Transport;
    use crate::error::Error;
    use crate::I2C_ADDRESS_DDC_CI;

    /// DDC/CI transport over a Linux `/dev/i2c-*` device node.
    pub struct I2cDeviceTransport {
        path: PathBuf,
        device: Option<I2c<File>>,
    }

    impl fmt::Debug for I2cDeviceTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("I2cDeviceTransport")
                .field("path", &self.path)
                .field("open", &self.device.is_some())
                .finish()
        }
    }

    impl I2cDeviceTransport {
        /// Addresses a transport at an i2c-dev node path. The device is not
        /// touched until [`Transport::open`].
        pub fn new<P: AsRef<Path>>(path: P) -> Self {
            I2cDeviceTransport {
                path: path.as_ref().to_owned(),
                device: None,
            }
        }

        /// The device node path.
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn device_mut(&mut self) -> Result<&mut I2c<File>, Error> {
            self.device.as_mut().ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "transport is not open",
                ))
            })
        }
    }

    impl Transport for I2cDeviceTransport {
        fn open(&mut self) -> Result<(), Error> {
            let mut device =
                I2c::from_path(&self.path).map_err(|e| open_error(&self.path, e))?;
            device
                .smbus_set_slave_address(I2C_ADDRESS_DDC_CI, false)
                .map_err(|e| open_error(&self.path, e))?;

            // Wake-up read. Some monitors will not answer the first command
            // on a freshly opened bus, and a bus with no DDC/CI device at
            // the slave address rejects the read, which is what enumeration
            // probes for.
            let mut wake = [0u8; 1];
            device.read(&mut wake).map_err(Error::Io)?;

            debug!("opened {}", self.path.display());
            self.device = Some(device);
            Ok(())
        }

        fn close(&mut self) -> Result<(), Error> {
            self.device = None;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.device.is_some()
        }

        fn write(&mut self, data: &[u8]) -> Result<(), Error> {
            self.device_mut()?.write_all(data).map_err(Error::Io)
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            let read = self.device_mut()?.read(buf).map_err(Error::Io)?;
            if read != buf.len() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short read of {} bytes, expected {}", read, buf.len()),
                )));
            }
            Ok(())
        }

        fn description(&self) -> String {
            self.path.display().to_string()
        }
    }

    fn open_error(path: &Path, e: io::Error) -> Error {
        if e.kind() == io::ErrorKind::PermissionDenied {
            Error::Permission {
                device: path.display().to_string(),
                source: e,
            }
        } else {
            Error::Io(e)
        }
    }
}

#[cfg(feature = "i2c-linux")]
pub use i2c_device::I2cDeviceTransport;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::io;
    use std::time::Instant;

    use super::Transport;
    use crate::error::Error;
    use crate::PROTOCOL_FLAG;

    /// Scripted in-memory transport driving codec and facade tests without
    /// hardware.
    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        open: bool,
        reads: VecDeque<u8>,
        /// Every frame written, with its send instant.
        pub writes: Vec<(Instant, Vec<u8>)>,
        /// Number of `open` calls observed.
        pub opens: usize,
        /// Number of `close` calls observed.
        pub closes: usize,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Default::default()
        }

        /// Queues a monitor reply for `payload`, framed and checksummed the
        /// way a monitor on the bus would frame it.
        pub fn push_reply(&mut self, payload: &[u8]) {
            let mut frame = vec![0x6E, PROTOCOL_FLAG | payload.len() as u8];
            frame.extend_from_slice(payload);
            let checksum = frame.iter().fold(0u8, |sum, v| sum ^ v);
            frame.push(checksum);
            self.reads.extend(frame);
        }

        /// Queues raw reply bytes verbatim.
        pub fn push_raw(&mut self, bytes: &[u8]) {
            self.reads.extend(bytes);
        }
    }

    impl Transport for ScriptedTransport {
        fn open(&mut self) -> Result<(), Error> {
            self.open = true;
            self.opens += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<(), Error> {
            self.open = false;
            self.closes += 1;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn write(&mut self, data: &[u8]) -> Result<(), Error> {
            self.writes.push((Instant::now(), data.to_vec()));
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
            for slot in buf.iter_mut() {
                *slot = self.reads.pop_front().ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "reply script exhausted",
                    ))
                })?;
            }
            Ok(())
        }

        fn description(&self) -> String {
            "scripted test transport".into()
        }
    }
}
