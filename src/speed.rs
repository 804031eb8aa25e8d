use std::convert::TryFrom;
use std::fmt;

use crate::error::Error;

/// Isochronous bus speed grade.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsoSpeed {
    S100 = 0,
    S200 = 1,
    S400 = 2,
    S800 = 3,
    S1600 = 4,
    S3200 = 5,
}

impl IsoSpeed {
    pub const ALL: [IsoSpeed; 6] = [
        IsoSpeed::S100,
        IsoSpeed::S200,
        IsoSpeed::S400,
        IsoSpeed::S800,
        IsoSpeed::S1600,
        IsoSpeed::S3200,
    ];

    /// Nominal speed in megabit/s.
    pub fn mbps(self) -> u32 {
        100 << (self as u32)
    }

    /// Whether this grade requires 1394b (extended) operation mode.
    pub fn requires_b_mode(self) -> bool {
        self > IsoSpeed::S400
    }
}

impl TryFrom<u32> for IsoSpeed {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            0..=5 => Ok(IsoSpeed::ALL[tag as usize]),
            _ => Err(Error::InvalidIsoSpeed),
        }
    }
}

impl From<IsoSpeed> for u32 {
    fn from(speed: IsoSpeed) -> Self {
        speed as u32
    }
}

impl fmt::Display for IsoSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.mbps())
    }
}

/// Bus addressing mode: legacy 1394a or extended 1394b.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OperationMode {
    Legacy = 480,
    B = 481,
}

impl TryFrom<u32> for OperationMode {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            480 => Ok(OperationMode::Legacy),
            481 => Ok(OperationMode::B),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Legacy => write!(f, "1394a (legacy)"),
            OperationMode::B => write!(f, "1394b"),
        }
    }
}
