//! The static registry of known VCP feature codes.
//!
//! The registry is an immutable, process-wide table built into the binary.
//! It holds no resources, only data; definitions for codes it does not know
//! are synthesized on demand by the capability parser with
//! [`FeatureDefinition::unknown`].

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// Read/write permission of a VCP feature code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// Neither readable nor writeable. Assumed for unknown codes.
    None,
    /// Read only.
    Read,
    /// Write only.
    Write,
    /// Readable and writeable.
    ReadWrite,
}

impl Access {
    /// Whether read operations are permitted.
    pub fn readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    /// Whether write operations are permitted.
    pub fn writeable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

/// Value model of a VCP feature code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Legal values form the numeric range `[0, maximum]`.
    Continuous,
    /// Legal values are a discrete enumerated set.
    NonContinuous,
}

/// A VCP feature code definition.
///
/// The code is the identity: two definitions compare (and hash) equal iff
/// their codes match, regardless of name or value model. Application code
/// comparing features should compare on [`code`](FeatureDefinition::code)
/// alone.
#[derive(Clone, Debug)]
pub struct FeatureDefinition {
    /// Human-readable feature name.
    pub name: Cow<'static, str>,
    /// One-byte VCP feature code.
    pub code: u8,
    /// Read/write permission.
    pub access: Access,
    /// Continuous or non-continuous value model.
    pub kind: FeatureKind,
    /// Known legal values for a non-continuous feature, in reported order.
    /// Populated statically or discovered from the capability string; empty
    /// when unknown.
    pub enumerated_values: Vec<u16>,
}

impl FeatureDefinition {
    /// Whether the feature can be read.
    pub fn readable(&self) -> bool {
        self.access.readable()
    }

    /// Whether the feature can be written.
    pub fn writeable(&self) -> bool {
        self.access.writeable()
    }

    /// An ad-hoc definition for a code the registry does not know.
    ///
    /// Access and value model are unknowable without the standard, so the
    /// definition is conservatively unreadable, unwriteable, and
    /// non-continuous.
    pub fn unknown(code: u8) -> Self {
        FeatureDefinition {
            name: Cow::Owned(format!("VCP {:02X} (unknown)", code)),
            code,
            access: Access::None,
            kind: FeatureKind::NonContinuous,
            enumerated_values: Vec::new(),
        }
    }
}

impl PartialEq for FeatureDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for FeatureDefinition {}

impl Hash for FeatureDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state)
    }
}

const fn continuous(name: &'static str, code: u8) -> FeatureDefinition {
    FeatureDefinition {
        name: Cow::Borrowed(name),
        code,
        access: Access::ReadWrite,
        kind: FeatureKind::Continuous,
        enumerated_values: Vec::new(),
    }
}

const fn write_only(name: &'static str, code: u8) -> FeatureDefinition {
    FeatureDefinition {
        name: Cow::Borrowed(name),
        code,
        access: Access::Write,
        kind: FeatureKind::NonContinuous,
        enumerated_values: Vec::new(),
    }
}

/// Degauss (VCP 0x01).
pub static DEGAUSS: FeatureDefinition = write_only("Degauss", 0x01);

/// Restore factory defaults (VCP 0x04).
pub static RESTORE_FACTORY_DEFAULTS: FeatureDefinition =
    write_only("Restore factory defaults", 0x04);

/// Restore factory luminance / contrast values (VCP 0x05).
pub static RESTORE_FACTORY_LUMINANCE_CONTRAST: FeatureDefinition =
    write_only("Restore factory luminance / contrast values", 0x05);

/// Restore factory TV defaults (VCP 0x06).
pub static RESTORE_FACTORY_TV_DEFAULTS: FeatureDefinition =
    write_only("Restore factory TV defaults", 0x06);

/// Clock (VCP 0x0E).
pub static CLOCK: FeatureDefinition = continuous("Clock", 0x0E);

/// Luminance (VCP 0x10).
pub static LUMINANCE: FeatureDefinition = continuous("Luminance", 0x10);

/// Contrast (VCP 0x12).
pub static CONTRAST: FeatureDefinition = continuous("Contrast", 0x12);

/// Clock phase (VCP 0x3E).
pub static CLOCK_PHASE: FeatureDefinition = continuous("Clock phase", 0x3E);

/// Backlight level: white (VCP 0x6B).
pub static BACKLIGHT_WHITE: FeatureDefinition = continuous("Backlight level: White", 0x6B);

/// Backlight level: red (VCP 0x6D).
pub static BACKLIGHT_RED: FeatureDefinition = continuous("Backlight level: Red", 0x6D);

/// Backlight level: green (VCP 0x6F).
pub static BACKLIGHT_GREEN: FeatureDefinition = continuous("Backlight level: Green", 0x6F);

/// Backlight level: blue (VCP 0x71).
pub static BACKLIGHT_BLUE: FeatureDefinition = continuous("Backlight level: Blue", 0x71);

/// Auto setup on/off (VCP 0xA2).
pub static AUTO_SETUP: FeatureDefinition = write_only("Auto setup on/off", 0xA2);

static REGISTRY: [&FeatureDefinition; 13] = [
    &DEGAUSS,
    &RESTORE_FACTORY_DEFAULTS,
    &RESTORE_FACTORY_LUMINANCE_CONTRAST,
    &RESTORE_FACTORY_TV_DEFAULTS,
    &CLOCK,
    &LUMINANCE,
    &CONTRAST,
    &CLOCK_PHASE,
    &BACKLIGHT_WHITE,
    &BACKLIGHT_RED,
    &BACKLIGHT_GREEN,
    &BACKLIGHT_BLUE,
    &AUTO_SETUP,
];

/// Looks up a registry definition by its VCP code.
pub fn lookup_by_code(code: u8) -> Option<&'static FeatureDefinition> {
    REGISTRY.iter().copied().find(|def| def.code == code)
}

/// Looks up a registry definition by its exact name.
pub fn lookup_by_name(name: &str) -> Option<&'static FeatureDefinition> {
    REGISTRY.iter().copied().find(|def| def.name == name)
}

/// Color-temperature presets.
///
/// Value vocabulary for VCP 0x14 (Select color preset). These are feature
/// values, not feature codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorPreset {
    /// 4000 K.
    ColorTemp4000K = 0x03,
    /// 5000 K.
    ColorTemp5000K = 0x04,
    /// 6500 K.
    ColorTemp6500K = 0x05,
    /// 7500 K.
    ColorTemp7500K = 0x06,
    /// 8200 K.
    ColorTemp8200K = 0x07,
    /// 9300 K.
    ColorTemp9300K = 0x08,
    /// 10000 K.
    ColorTemp10000K = 0x09,
    /// 11500 K.
    ColorTemp11500K = 0x0A,
    /// User preset 1.
    User1 = 0x0B,
    /// User preset 2.
    User2 = 0x0C,
    /// User preset 3.
    User3 = 0x0D,
}

impl ColorPreset {
    /// The wire value of this preset.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// The preset for a wire value, if it is within the standard vocabulary.
    pub fn from_value(value: u16) -> Option<Self> {
        Some(match value {
            0x03 => ColorPreset::ColorTemp4000K,
            0x04 => ColorPreset::ColorTemp5000K,
            0x05 => ColorPreset::ColorTemp6500K,
            0x06 => ColorPreset::ColorTemp7500K,
            0x07 => ColorPreset::ColorTemp8200K,
            0x08 => ColorPreset::ColorTemp9300K,
            0x09 => ColorPreset::ColorTemp10000K,
            0x0A => ColorPreset::ColorTemp11500K,
            0x0B => ColorPreset::User1,
            0x0C => ColorPreset::User2,
            0x0D => ColorPreset::User3,
            _ => return None,
        })
    }
}

/// Monitor power modes.
///
/// Value vocabulary for VCP 0xD6 (Power mode).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PowerMode {
    /// On.
    On = 0x01,
    /// Standby.
    Standby = 0x02,
    /// Suspend.
    Suspend = 0x03,
    /// Software power off.
    SoftOff = 0x04,
    /// Hardware power off.
    HardOff = 0x05,
}

impl PowerMode {
    /// The wire value of this mode.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// The mode for a wire value, if it is within the standard vocabulary.
    pub fn from_value(value: u16) -> Option<Self> {
        Some(match value {
            0x01 => PowerMode::On,
            0x02 => PowerMode::Standby,
            0x03 => PowerMode::Suspend,
            0x04 => PowerMode::SoftOff,
            0x05 => PowerMode::HardOff,
            _ => return None,
        })
    }
}

/// Monitor input sources.
///
/// Value vocabulary for VCP 0x60 (Input source). Monitors in the field
/// report out-of-spec values for newer connectors (USB Type-C, for one), so
/// [`from_value`](InputSource::from_value) returning `None` is not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Off.
    Off = 0x00,
    /// Analog video 1.
    Analog1 = 0x01,
    /// Analog video 2.
    Analog2 = 0x02,
    /// DVI 1.
    Dvi1 = 0x03,
    /// DVI 2.
    Dvi2 = 0x04,
    /// Composite video 1.
    Composite1 = 0x05,
    /// Composite video 2.
    Composite2 = 0x06,
    /// S-Video 1.
    SVideo1 = 0x07,
    /// S-Video 2.
    SVideo2 = 0x08,
    /// Tuner 1.
    Tuner1 = 0x09,
    /// Tuner 2.
    Tuner2 = 0x0A,
    /// Tuner 3.
    Tuner3 = 0x0B,
    /// Component video 1.
    Component1 = 0x0C,
    /// Component video 2.
    Component2 = 0x0D,
    /// Component video 3.
    Component3 = 0x0E,
    /// DisplayPort 1.
    DisplayPort1 = 0x0F,
    /// DisplayPort 2.
    DisplayPort2 = 0x10,
    /// HDMI 1.
    Hdmi1 = 0x11,
    /// HDMI 2.
    Hdmi2 = 0x12,
}

impl InputSource {
    /// The wire value of this input source.
    pub fn value(self) -> u16 {
        self as u16
    }

    /// The input source for a wire value, if it is within the standard
    /// vocabulary.
    pub fn from_value(value: u16) -> Option<Self> {
        Some(match value {
            0x00 => InputSource::Off,
            0x01 => InputSource::Analog1,
            0x02 => InputSource::Analog2,
            0x03 => InputSource::Dvi1,
            0x04 => InputSource::Dvi2,
            0x05 => InputSource::Composite1,
            0x06 => InputSource::Composite2,
            0x07 => InputSource::SVideo1,
            0x08 => InputSource::SVideo2,
            0x09 => InputSource::Tuner1,
            0x0A => InputSource::Tuner2,
            0x0B => InputSource::Tuner3,
            0x0C => InputSource::Component1,
            0x0D => InputSource::Component2,
            0x0E => InputSource::Component3,
            0x0F => InputSource::DisplayPort1,
            0x10 => InputSource::DisplayPort2,
            0x11 => InputSource::Hdmi1,
            0x12 => InputSource::Hdmi2,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_code_finds_registry_entries() {
        let luminance = lookup_by_code(0x10).unwrap();
        assert_eq!(luminance.name, "Luminance");
        assert_eq!(luminance.access, Access::ReadWrite);
        assert_eq!(luminance.kind, FeatureKind::Continuous);

        let degauss = lookup_by_code(0x01).unwrap();
        assert_eq!(degauss.access, Access::Write);
        assert_eq!(degauss.kind, FeatureKind::NonContinuous);

        assert!(lookup_by_code(0xE0).is_none());
    }

    #[test]
    fn lookup_by_name_is_exact() {
        assert_eq!(lookup_by_name("Contrast").unwrap().code, 0x12);
        assert!(lookup_by_name("contrast ").is_none());
        assert!(lookup_by_name("no such feature").is_none());
    }

    #[test]
    fn definition_identity_is_the_code() {
        let a = LUMINANCE.clone();
        let b = FeatureDefinition {
            name: Cow::Borrowed("renamed"),
            enumerated_values: vec![1, 2, 3],
            ..LUMINANCE.clone()
        };
        assert_eq!(a, b);
        assert_ne!(a, CONTRAST.clone());
    }

    #[test]
    fn unknown_definitions_are_inert() {
        let def = FeatureDefinition::unknown(0x60);
        assert_eq!(def.name, "VCP 60 (unknown)");
        assert!(!def.readable());
        assert!(!def.writeable());
        assert_eq!(def.kind, FeatureKind::NonContinuous);
    }

    #[test]
    fn vocabulary_round_trips() {
        assert_eq!(
            ColorPreset::from_value(0x05),
            Some(ColorPreset::ColorTemp6500K)
        );
        assert_eq!(ColorPreset::from_value(0x0E), None);
        assert_eq!(PowerMode::from_value(0x04), Some(PowerMode::SoftOff));
        assert_eq!(PowerMode::from_value(0x00), None);
        assert_eq!(InputSource::from_value(0x11), Some(InputSource::Hdmi1));
        assert_eq!(InputSource::Hdmi1.value(), 0x11);
        assert_eq!(InputSource::from_value(0x1B), None);
    }
}
