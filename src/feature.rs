use std::convert::TryFrom;
use std::fmt;

use crate::error::Error;

/// Controllable camera attribute.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Brightness = 416,
    Exposure = 417,
    Sharpness = 418,
    WhiteBalance = 419,
    Hue = 420,
    Saturation = 421,
    Gamma = 422,
    Shutter = 423,
    Gain = 424,
    Iris = 425,
    Focus = 426,
    Temperature = 427,
    Trigger = 428,
    TriggerDelay = 429,
    WhiteShading = 430,
    FrameRate = 431,
    Zoom = 432,
    Pan = 433,
    Tilt = 434,
    OpticalFilter = 435,
    CaptureSize = 436,
    CaptureQuality = 437,
}

impl FeatureKind {
    /// All features in register order.
    pub const ALL: [FeatureKind; 22] = [
        FeatureKind::Brightness,
        FeatureKind::Exposure,
        FeatureKind::Sharpness,
        FeatureKind::WhiteBalance,
        FeatureKind::Hue,
        FeatureKind::Saturation,
        FeatureKind::Gamma,
        FeatureKind::Shutter,
        FeatureKind::Gain,
        FeatureKind::Iris,
        FeatureKind::Focus,
        FeatureKind::Temperature,
        FeatureKind::Trigger,
        FeatureKind::TriggerDelay,
        FeatureKind::WhiteShading,
        FeatureKind::FrameRate,
        FeatureKind::Zoom,
        FeatureKind::Pan,
        FeatureKind::Tilt,
        FeatureKind::OpticalFilter,
        FeatureKind::CaptureSize,
        FeatureKind::CaptureQuality,
    ];

    /// Index within the feature register banks.
    pub fn index(self) -> usize {
        (self as u32 - FeatureKind::Brightness as u32) as usize
    }

    /// Whether the feature carries more than one value channel.
    pub fn is_multi_value(self) -> bool {
        matches!(
            self,
            FeatureKind::WhiteBalance | FeatureKind::WhiteShading | FeatureKind::Temperature
        )
    }
}

impl TryFrom<u32> for FeatureKind {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            416..=437 => Ok(FeatureKind::ALL[(tag - 416) as usize]),
            _ => Err(Error::InvalidFeature),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags::bitflags! {
    /// Capabilities of a feature, decoded once from its inquiry register.
    #[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default)]
    pub struct Caps: u32 {
        const PRESENT   = 0x0001;
        const ABSOLUTE  = 0x0002;
        const READOUT   = 0x0004;
        const ON_OFF    = 0x0008;
        const AUTO      = 0x0010;
        const MANUAL    = 0x0020;
        const ONE_PUSH  = 0x0040;
        const POLARITY  = 0x0080;
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Control mode of a feature.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FeatureMode {
    Manual = 0,
    Auto = 1,
    /// The camera adjusts once, then falls back to manual.
    OnePushAuto = 2,
}

impl fmt::Display for FeatureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureMode::Manual => write!(f, "manual"),
            FeatureMode::Auto => write!(f, "auto"),
            FeatureMode::OnePushAuto => write!(f, "one-push auto"),
        }
    }
}

/// External trigger mode.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TriggerMode {
    Mode0 = 352,
    Mode1 = 353,
    Mode2 = 354,
    Mode3 = 355,
    Mode4 = 356,
    Mode5 = 357,
    Mode14 = 358,
    Mode15 = 359,
}

impl TriggerMode {
    pub const ALL: [TriggerMode; 8] = [
        TriggerMode::Mode0,
        TriggerMode::Mode1,
        TriggerMode::Mode2,
        TriggerMode::Mode3,
        TriggerMode::Mode4,
        TriggerMode::Mode5,
        TriggerMode::Mode14,
        TriggerMode::Mode15,
    ];

    /// IIDC trigger mode number as encoded in the trigger register.
    pub fn number(self) -> u32 {
        match self {
            TriggerMode::Mode14 => 14,
            TriggerMode::Mode15 => 15,
            mode => mode as u32 - TriggerMode::Mode0 as u32,
        }
    }

    /// Resolves a register mode number.
    pub fn from_number(number: u32) -> Option<TriggerMode> {
        match number {
            0..=5 => Some(TriggerMode::ALL[number as usize]),
            14 => Some(TriggerMode::Mode14),
            15 => Some(TriggerMode::Mode15),
            _ => None,
        }
    }
}

impl TryFrom<u32> for TriggerMode {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            352..=359 => Ok(TriggerMode::ALL[(tag - 352) as usize]),
            _ => Err(Error::InvalidTriggerMode),
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger mode {}", self.number())
    }
}

/// External trigger source pin.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    Source0 = 576,
    Source1 = 577,
    Source2 = 578,
    Source3 = 579,
}

impl TriggerSource {
    pub const ALL: [TriggerSource; 4] = [
        TriggerSource::Source0,
        TriggerSource::Source1,
        TriggerSource::Source2,
        TriggerSource::Source3,
    ];

    /// Source number as encoded in the trigger register.
    pub fn number(self) -> u32 {
        self as u32 - TriggerSource::Source0 as u32
    }

    pub fn from_number(number: u32) -> Option<TriggerSource> {
        match number {
            0..=3 => Some(TriggerSource::ALL[number as usize]),
            _ => None,
        }
    }
}

impl TryFrom<u32> for TriggerSource {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            576..=579 => Ok(TriggerSource::ALL[(tag - 576) as usize]),
            _ => Err(Error::InvalidTriggerSource),
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger source {}", self.number())
    }
}

/// Electrical polarity of the external trigger input.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TriggerPolarity {
    ActiveLow = 0,
    ActiveHigh = 1,
}

impl fmt::Display for TriggerPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPolarity::ActiveLow => write!(f, "active low"),
            TriggerPolarity::ActiveHigh => write!(f, "active high"),
        }
    }
}

/// Raw value payload of a feature.
///
/// Most features carry a single register value; white balance, white
/// shading and temperature are inherently multi-channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Value {
    Single(u32),
    WhiteBalance { bu: u32, rv: u32 },
    WhiteShading { r: u32, g: u32, b: u32 },
    Temperature { target: u32, current: u32 },
}

/// Absolute (physical unit) state of a feature.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Absolute {
    /// Whether absolute control is currently switched on.
    pub enabled: bool,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

/// Trigger sub-state, layered on the base descriptor of the Trigger feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInfo {
    pub mode: Option<TriggerMode>,
    pub source: Option<TriggerSource>,
    pub polarity: Option<TriggerPolarity>,
    pub supported_modes: Vec<TriggerMode>,
    pub supported_sources: Vec<TriggerSource>,
}

/// Full descriptor of one feature as decoded from the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfo {
    pub kind: FeatureKind,
    pub caps: Caps,
    /// Minimum raw value, inclusive.
    pub min: u32,
    /// Maximum raw value, inclusive.
    pub max: u32,
    pub mode: FeatureMode,
    /// Whether the feature is switched on (meaningful when ON_OFF capable).
    pub is_on: bool,
    pub value: Value,
    /// Absolute state, present when the feature is absolute-capable.
    pub absolute: Option<Absolute>,
    /// Trigger sub-state, present for the Trigger feature only.
    pub trigger: Option<TriggerInfo>,
}

impl FeatureInfo {
    pub fn is_present(&self) -> bool {
        self.caps.contains(Caps::PRESENT)
    }
}

impl fmt::Display for FeatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Feature    : {}", self.kind)?;
        writeln!(f, "Caps       : {}", self.caps)?;
        writeln!(f, "Minimum    : {}", self.min)?;
        writeln!(f, "Maximum    : {}", self.max)?;
        writeln!(f, "Mode       : {}", self.mode)?;
        writeln!(f, "Power      : {}", if self.is_on { "on" } else { "off" })?;
        match self.value {
            Value::Single(v) => writeln!(f, "Value      : {}", v)?,
            Value::WhiteBalance { bu, rv } => {
                writeln!(f, "Value      : B/U {} R/V {}", bu, rv)?
            }
            Value::WhiteShading { r, g, b } => {
                writeln!(f, "Value      : R {} G {} B {}", r, g, b)?
            }
            Value::Temperature { target, current } => {
                writeln!(f, "Value      : target {} current {}", target, current)?
            }
        }
        if let Some(abs) = &self.absolute {
            writeln!(
                f,
                "Absolute   : {} [{} .. {}] ({})",
                abs.value,
                abs.min,
                abs.max,
                if abs.enabled { "enabled" } else { "disabled" }
            )?;
        }
        if let Some(trigger) = &self.trigger {
            if let Some(mode) = trigger.mode {
                writeln!(f, "Trigger    : {}", mode)?;
            }
            if let Some(source) = trigger.source {
                writeln!(f, "Source     : {}", source)?;
            }
            if let Some(polarity) = trigger.polarity {
                writeln!(f, "Polarity   : {}", polarity)?;
            }
        }
        Ok(())
    }
}
