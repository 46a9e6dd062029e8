//! The public monitor control surface.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::caps::{parse_capabilities, Capabilities};
use crate::commands::{GetVcpFeature, SetVcpFeature};
use crate::ddc::{ChecksumPolicy, Ddc};
use crate::error::Error;
use crate::features::{self, FeatureDefinition, FeatureKind};
use crate::transport::Transport;

/// A physical monitor reachable over a DDC/CI transport.
///
/// A `Monitor` starts closed and holds no bus handle. Feature operations
/// live on [`MonitorSession`], entered with [`Monitor::open`]; outside a
/// session they are not merely invalid but unrepresentable. Value caches
/// (feature maximums, the capability report) belong to the `Monitor` and
/// survive re-opening it.
#[derive(Debug)]
pub struct Monitor<T> {
    ddc: Ddc<T>,
    max_values: HashMap<u8, u16>,
    capabilities: Option<Capabilities>,
}

impl<T: Transport> Monitor<T> {
    /// Wraps a transport in a closed monitor handle.
    pub fn new(transport: T) -> Self {
        Monitor {
            ddc: Ddc::new(transport),
            max_values: HashMap::new(),
            capabilities: None,
        }
    }

    /// As [`Monitor::new`], with an explicit checksum policy.
    pub fn with_checksum_policy(transport: T, policy: ChecksumPolicy) -> Self {
        Monitor {
            ddc: Ddc::with_checksum_policy(transport, policy),
            max_values: HashMap::new(),
            capabilities: None,
        }
    }

    /// Human-readable identity of the underlying transport.
    pub fn description(&self) -> String {
        self.ddc.inner_ref().description()
    }

    /// Opens the transport and enters a control session.
    ///
    /// The session closes the transport when dropped, on every exit path.
    pub fn open(&mut self) -> Result<MonitorSession<'_, T>, Error> {
        self.ddc.inner_mut().open()?;
        Ok(MonitorSession { monitor: self })
    }
}

/// An open control session on one monitor.
///
/// Exclusively borrows its [`Monitor`] for the duration of the session; the
/// transport handle and the command timing state belong to this session
/// alone until it drops.
#[derive(Debug)]
pub struct MonitorSession<'a, T: Transport> {
    monitor: &'a mut Monitor<T>,
}

impl<T: Transport> Drop for MonitorSession<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.monitor.ddc.inner_mut().close() {
            warn!("error closing monitor transport: {}", err);
        }
    }
}

impl<T: Transport> MonitorSession<'_, T> {
    /// Reads the current value of `feature`.
    ///
    /// Fails with [`Error::NotReadable`] before any I/O when the registry
    /// marks the feature unreadable. For a continuous feature the reply's
    /// maximum is recorded in the monitor's cache, saving the round-trip a
    /// later [`maximum`](Self::maximum) call or range check would need.
    pub fn get(&mut self, feature: &FeatureDefinition) -> Result<u16, Error> {
        if !feature.readable() {
            return Err(Error::NotReadable(feature.name.clone().into_owned()));
        }

        let value = self.monitor.ddc.execute(GetVcpFeature::new(feature.code))?;
        if feature.kind == FeatureKind::Continuous {
            self.monitor.max_values.insert(feature.code, value.maximum);
        }

        Ok(value.current)
    }

    /// Writes `value` to `feature`.
    ///
    /// A continuous feature is checked against its resolved maximum first
    /// and rejected with [`Error::Range`] before any bytes are sent. A
    /// non-continuous feature is written unchecked; the caller is
    /// responsible for using a value from the feature's enumeration.
    pub fn set(&mut self, feature: &FeatureDefinition, value: u16) -> Result<(), Error> {
        if !feature.writeable() {
            return Err(Error::NotWritable(feature.name.clone().into_owned()));
        }
        if feature.kind == FeatureKind::Continuous {
            let maximum = self.maximum(feature)?;
            if value > maximum {
                return Err(Error::Range {
                    value,
                    maximum,
                    code: feature.code,
                });
            }
        }

        self.monitor
            .ddc
            .execute(SetVcpFeature::new(feature.code, value))
    }

    /// The maximum legal value of `feature`.
    ///
    /// Resolved with one feature read and then cached on the owning
    /// [`Monitor`] for its lifetime.
    pub fn maximum(&mut self, feature: &FeatureDefinition) -> Result<u16, Error> {
        if !feature.readable() {
            return Err(Error::NotReadable(feature.name.clone().into_owned()));
        }
        if let Some(&maximum) = self.monitor.max_values.get(&feature.code) {
            return Ok(maximum);
        }

        let value = self.monitor.ddc.execute(GetVcpFeature::new(feature.code))?;
        self.monitor.max_values.insert(feature.code, value.maximum);
        Ok(value.maximum)
    }

    /// The monitor's parsed capability report.
    ///
    /// Resolved once over the bus, then cached on the owning [`Monitor`];
    /// only constructing a fresh `Monitor` produces a fresh report.
    pub fn capabilities(&mut self) -> Result<&Capabilities, Error> {
        let caps = match self.monitor.capabilities.take() {
            Some(caps) => caps,
            None => {
                let raw = self.monitor.ddc.capabilities_string()?;
                parse_capabilities(&raw)
            }
        };
        Ok(self.monitor.capabilities.insert(caps))
    }

    /// Whether the monitor reports support for `feature`.
    ///
    /// Failures resolving the capability report degrade to `false`, never
    /// propagate.
    pub fn supports(&mut self, feature: &FeatureDefinition) -> bool {
        match self.capabilities() {
            Ok(caps) => caps.supports_code(feature.code),
            Err(err) => {
                debug!("treating \"{}\" as unsupported: {}", feature.name, err);
                false
            }
        }
    }

    /// Current luminance value of the monitor.
    pub fn luminance(&mut self) -> Result<u16, Error> {
        self.get(&features::LUMINANCE)
    }

    /// Sets the luminance value of the monitor.
    pub fn set_luminance(&mut self, value: u16) -> Result<(), Error> {
        self.set(&features::LUMINANCE, value)
    }

    /// Maximum luminance value of the monitor.
    pub fn luminance_maximum(&mut self) -> Result<u16, Error> {
        self.maximum(&features::LUMINANCE)
    }

    /// Current contrast value of the monitor.
    pub fn contrast(&mut self) -> Result<u16, Error> {
        self.get(&features::CONTRAST)
    }

    /// Sets the contrast value of the monitor.
    pub fn set_contrast(&mut self, value: u16) -> Result<(), Error> {
        self.set(&features::CONTRAST, value)
    }

    /// Maximum contrast value of the monitor.
    pub fn contrast_maximum(&mut self) -> Result<u16, Error> {
        self.maximum(&features::CONTRAST)
    }

    /// Current backlight level (white) of the monitor.
    pub fn backlight(&mut self) -> Result<u16, Error> {
        self.get(&features::BACKLIGHT_WHITE)
    }

    /// Sets the backlight level (white) of the monitor.
    pub fn set_backlight(&mut self, value: u16) -> Result<(), Error> {
        self.set(&features::BACKLIGHT_WHITE, value)
    }

    /// Maximum backlight level (white) of the monitor.
    pub fn backlight_maximum(&mut self) -> Result<u16, Error> {
        self.maximum(&features::BACKLIGHT_WHITE)
    }
}

/// Discovers all DDC/CI-capable monitors on the system.
///
/// Monitors are returned in the closed state; enter a control session with
/// [`Monitor::open`]. Failure of the system probe itself is an error, while
/// an individual bus failing its DDC/CI probe is skipped.
#[cfg(all(feature = "udev", feature = "i2c-linux"))]
pub fn list_monitors() -> Result<Vec<Monitor<crate::transport::I2cDeviceTransport>>, Error> {
    Ok(crate::enumerate::Enumerator::new()?
        .map(Monitor::new)
        .collect())
}
