#![deny(missing_docs)]

//! Control displays using the VESA Monitor Control Command Set (MCCS) over
//! the DDC/CI protocol.
//!
//! The control surface is [`Monitor`]: enumerate attached displays with
//! [`list_monitors`], enter a scoped session with [`Monitor::open`], then
//! get and set VCP features by their [`FeatureDefinition`]s. Framing,
//! checksums, and the mandatory inter-command delays are handled by the
//! codec underneath; callers never throttle.
//!
//! # Example
//!
//! ```rust,no_run
//! use mccs_control::features;
//!
//! # #[cfg(all(feature = "i2c-linux", feature = "udev"))]
//! # fn monitors() -> Result<(), mccs_control::Error> {
//! for mut monitor in mccs_control::list_monitors()? {
//!     let mut session = monitor.open()?;
//!     let backlight = session.backlight()?;
//!     let maximum = session.backlight_maximum()?;
//!     println!("backlight at {}/{}", backlight, maximum);
//!     session.set(&features::LUMINANCE, 80)?;
//! }
//! # Ok(())
//! # }
//! ```

/// DDC/CI command and control I2C address.
pub const I2C_ADDRESS_DDC_CI: u16 = 0x37;

/// DDC sub-address command prefix; the host's source address in every frame
/// it sends.
pub const SUB_ADDRESS_DDC_CI: u8 = 0x51;

/// Protocol flag ORed into the length byte of every DDC/CI frame.
pub const PROTOCOL_FLAG: u8 = 0x80;

pub mod commands;
pub use commands::{Command, VcpValue};

pub mod caps;
pub use caps::{parse_capabilities, Capabilities};

pub mod features;
pub use features::{Access, FeatureDefinition, FeatureKind};

mod ddc;
pub use ddc::{ChecksumPolicy, Ddc};

mod delay;

mod error;
pub use error::{Error, ProtocolError};

pub mod transport;
#[cfg(feature = "i2c-linux")]
pub use transport::I2cDeviceTransport;
pub use transport::Transport;

#[cfg(all(feature = "udev", feature = "i2c-linux"))]
mod enumerate;
#[cfg(all(feature = "udev", feature = "i2c-linux"))]
pub use enumerate::Enumerator;

mod monitor;
#[cfg(all(feature = "udev", feature = "i2c-linux"))]
pub use monitor::list_monitors;
pub use monitor::{Monitor, MonitorSession};
