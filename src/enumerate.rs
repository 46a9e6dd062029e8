use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use tracing::debug;

use crate::transport::{I2cDeviceTransport, Transport};

/// Enumerates candidate displays attached to the system's I2C buses.
///
/// Implements an `Iterator` yielding one closed [`I2cDeviceTransport`] per
/// bus that answered a DDC/CI probe. A failure of the udev scan itself is
/// an error from [`Enumerator::new`]; a single candidate bus failing its
/// probe is skipped, not fatal.
///
/// A passed probe only proves a device acknowledged the DDC/CI slave
/// address. Communication may still fail if the display does not implement
/// DDC/CI, or if the active input is controlled by another host device.
///
/// # udev dependency
///
/// Requires the `udev` feature enabled to use.
pub struct Enumerator {
    candidates: std::vec::IntoIter<PathBuf>,
}

impl Enumerator {
    /// Scans the system for candidate I2C buses.
    pub fn new() -> io::Result<Self> {
        let mut en = udev::Enumerator::new()?;
        en.match_subsystem("i2c-dev")?;

        let mut candidates = Vec::new();
        for dev in en.scan_devices()? {
            let (devnode, name) = match dev
                .devnode()
                .and_then(|devnode| dev.attribute_value("name").map(|name| (devnode, name)))
            {
                Some(v) => v,
                None => continue,
            };

            let skip_prefix = [
                // list stolen from ddcutil's ignorable_i2c_device_sysfs_name
                "SMBus",
                "soc:i2cdsi",
                "smu",
                "mac-io",
                "u4",
            ];

            if skip_prefix
                .iter()
                .any(|p| name.as_bytes().starts_with(p.as_bytes()))
            {
                continue;
            }

            candidates.push(devnode.to_owned());
        }

        Ok(Enumerator {
            candidates: candidates.into_iter(),
        })
    }
}

impl Iterator for Enumerator {
    type Item = I2cDeviceTransport;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.candidates.by_ref() {
            let mut transport = I2cDeviceTransport::new(&path);
            // A bus with no DDC/CI device rejects the wake-up read on open.
            match transport.open() {
                Ok(()) => {
                    let _ = transport.close();
                    return Some(transport);
                }
                Err(err) => debug!("skipping {}: {}", path.display(), err),
            }
        }

        None
    }
}
