use std::io;

use thiserror::Error;

/// An error that can occur while controlling a monitor.
#[derive(Debug, Error)]
pub enum Error {
    /// The operating system denied opening the transport device.
    ///
    /// Fatal to opening that one monitor, not to the process.
    #[error("permission denied opening {device}")]
    Permission {
        /// Identity of the transport device, such as an I2C device node path.
        device: String,
        /// OS-level cause.
        #[source]
        source: io::Error,
    },
    /// Underlying transport read/write/open failure.
    ///
    /// Fatal to the in-progress operation; the whole operation may be
    /// retried after a fresh open, never a partial frame.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// DDC/CI protocol error or transmission corruption.
    #[error("DDC/CI error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The monitor reported that it does not implement the requested VCP
    /// code.
    ///
    /// Expected for codes a given monitor leaves out; treat it as "feature
    /// absent" rather than a communication fault.
    #[error("VCP code {code:#04x} is not supported by the monitor")]
    UnsupportedFeature {
        /// The rejected VCP feature code.
        code: u8,
    },
    /// A set value exceeded the feature's reported maximum.
    ///
    /// Rejected before any bytes are sent. Query the maximum first to clamp
    /// instead of erroring.
    #[error("value {value} exceeds the maximum of {maximum} for VCP code {code:#04x}")]
    Range {
        /// The rejected value.
        value: u16,
        /// The feature's resolved maximum.
        maximum: u16,
        /// The continuous VCP feature code.
        code: u8,
    },
    /// Attempted to read a feature whose registry entry is not readable.
    ///
    /// A programming error, checked against the feature registry before any
    /// I/O is attempted.
    #[error("VCP feature \"{0}\" is not readable")]
    NotReadable(String),
    /// Attempted to write a feature whose registry entry is not writeable.
    ///
    /// A programming error, checked against the feature registry before any
    /// I/O is attempted.
    #[error("VCP feature \"{0}\" is not writeable")]
    NotWritable(String),
}

/// DDC/CI protocol errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The echoed offset in a capabilities reply did not match the request.
    #[error("invalid offset returned from DDC/CI")]
    InvalidOffset,
    /// Invalid DDC/CI packet length.
    #[error("invalid DDC/CI length")]
    InvalidLength,
    /// Checksum mismatch in a received frame, under the strict policy.
    #[error("DDC/CI checksum mismatch")]
    InvalidChecksum,
    /// A reply carried an unexpected opcode.
    #[error("DDC/CI opcode mismatch")]
    InvalidOpcode,
    /// Custom unspecified error.
    #[error("{0}")]
    Invalid(String),
}
