use std::convert::TryFrom;
use std::fmt;

use crate::error::Error;

/// Fixed framerate of a non-scalable video mode.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Framerate {
    Fps1_875 = 32,
    Fps3_75 = 33,
    Fps7_5 = 34,
    Fps15 = 35,
    Fps30 = 36,
    Fps60 = 37,
    Fps120 = 38,
    Fps240 = 39,
}

impl Framerate {
    /// All framerates in register order.
    pub const ALL: [Framerate; 8] = [
        Framerate::Fps1_875,
        Framerate::Fps3_75,
        Framerate::Fps7_5,
        Framerate::Fps15,
        Framerate::Fps30,
        Framerate::Fps60,
        Framerate::Fps120,
        Framerate::Fps240,
    ];

    /// Index within the rate inquiry register (MSB first).
    pub fn index(self) -> u32 {
        self as u32 - Framerate::Fps1_875 as u32
    }

    /// Frames per second.
    pub fn as_fps(self) -> f64 {
        1.875 * (1u32 << self.index()) as f64
    }
}

impl TryFrom<u32> for Framerate {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            32..=39 => Ok(Framerate::ALL[(tag - 32) as usize]),
            _ => Err(Error::InvalidFramerate),
        }
    }
}

impl From<Framerate> for u32 {
    fn from(rate: Framerate) -> Self {
        rate as u32
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.as_fps())
    }
}
