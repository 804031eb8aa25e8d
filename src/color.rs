use std::convert::TryFrom;
use std::fmt;

use crate::error::Error;

/// Pixel color coding of a video stream.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ColorCoding {
    Mono8 = 320,
    Yuv411 = 321,
    Yuv422 = 322,
    Yuv444 = 323,
    Rgb8 = 324,
    Mono16 = 325,
    Rgb16 = 326,
    Mono16S = 327,
    Rgb16S = 328,
    Raw8 = 329,
    Raw16 = 330,
}

impl ColorCoding {
    pub const ALL: [ColorCoding; 11] = [
        ColorCoding::Mono8,
        ColorCoding::Yuv411,
        ColorCoding::Yuv422,
        ColorCoding::Yuv444,
        ColorCoding::Rgb8,
        ColorCoding::Mono16,
        ColorCoding::Rgb16,
        ColorCoding::Mono16S,
        ColorCoding::Rgb16S,
        ColorCoding::Raw8,
        ColorCoding::Raw16,
    ];

    /// Index within the color coding inquiry register (MSB first).
    pub fn index(self) -> u32 {
        self as u32 - ColorCoding::Mono8 as u32
    }

    /// Average bits occupied by one pixel on the wire.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            ColorCoding::Mono8 | ColorCoding::Raw8 => 8,
            ColorCoding::Yuv411 => 12,
            ColorCoding::Yuv422
            | ColorCoding::Mono16
            | ColorCoding::Mono16S
            | ColorCoding::Raw16 => 16,
            ColorCoding::Yuv444 | ColorCoding::Rgb8 => 24,
            ColorCoding::Rgb16 | ColorCoding::Rgb16S => 48,
        }
    }

    /// Bytes occupied by `pixels` pixels on the wire.
    pub fn bytes_for_pixels(self, pixels: u64) -> u64 {
        pixels * u64::from(self.bits_per_pixel()) / 8
    }

    /// Whether this coding transports raw sensor (Bayer) data.
    pub fn is_raw(self) -> bool {
        matches!(self, ColorCoding::Raw8 | ColorCoding::Raw16)
    }
}

impl TryFrom<u32> for ColorCoding {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            320..=330 => Ok(ColorCoding::ALL[(tag - 320) as usize]),
            _ => Err(Error::InvalidColorCoding),
        }
    }
}

impl From<ColorCoding> for u32 {
    fn from(coding: ColorCoding) -> Self {
        coding as u32
    }
}

impl fmt::Display for ColorCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorCoding::Mono8 => "MONO8",
            ColorCoding::Yuv411 => "YUV411",
            ColorCoding::Yuv422 => "YUV422",
            ColorCoding::Yuv444 => "YUV444",
            ColorCoding::Rgb8 => "RGB8",
            ColorCoding::Mono16 => "MONO16",
            ColorCoding::Rgb16 => "RGB16",
            ColorCoding::Mono16S => "MONO16S",
            ColorCoding::Rgb16S => "RGB16S",
            ColorCoding::Raw8 => "RAW8",
            ColorCoding::Raw16 => "RAW16",
        };
        write!(f, "{}", name)
    }
}

/// Sensor color filter (Bayer) layout, meaningful for raw codings only.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ColorFilter {
    Rggb = 512,
    Gbrg = 513,
    Grbg = 514,
    Bggr = 515,
}

impl ColorFilter {
    pub const ALL: [ColorFilter; 4] = [
        ColorFilter::Rggb,
        ColorFilter::Gbrg,
        ColorFilter::Grbg,
        ColorFilter::Bggr,
    ];

    /// Index within the color filter register.
    pub fn index(self) -> u32 {
        self as u32 - ColorFilter::Rggb as u32
    }
}

impl TryFrom<u32> for ColorFilter {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            512..=515 => Ok(ColorFilter::ALL[(tag - 512) as usize]),
            _ => Err(Error::InvalidColorFilter),
        }
    }
}

impl fmt::Display for ColorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorFilter::Rggb => "RGGB",
            ColorFilter::Gbrg => "GBRG",
            ColorFilter::Grbg => "GRBG",
            ColorFilter::Bggr => "BGGR",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_sizes() {
        assert_eq!(ColorCoding::Mono8.bytes_for_pixels(307_200), 307_200);
        assert_eq!(ColorCoding::Yuv411.bytes_for_pixels(640 * 480), 460_800);
        assert_eq!(ColorCoding::Rgb16.bytes_for_pixels(100), 600);
    }

    #[test]
    fn tag_roundtrip() {
        for coding in ColorCoding::ALL {
            assert_eq!(ColorCoding::try_from(coding as u32), Ok(coding));
        }
        assert_eq!(ColorCoding::try_from(331), Err(Error::InvalidColorCoding));
        for filter in ColorFilter::ALL {
            assert_eq!(ColorFilter::try_from(filter as u32), Ok(filter));
        }
        assert_eq!(ColorFilter::try_from(516), Err(Error::InvalidColorFilter));
    }
}
