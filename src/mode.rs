use std::convert::TryFrom;
use std::fmt;

use crate::color::ColorCoding;
use crate::error::Error;

/// Video mode of an IIDC camera.
///
/// Fixed modes pair a resolution with a color coding and stream at one of
/// the fixed [`crate::framerate::Framerate`] values. The `Format7` modes are
/// scalable: geometry and color coding are negotiated per mode slot instead.
#[allow(non_camel_case_types)]
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VideoMode {
    Mode160x120_YUV444      = 64,
    Mode320x240_YUV422      = 65,
    Mode640x480_YUV411      = 66,
    Mode640x480_YUV422      = 67,
    Mode640x480_RGB8        = 68,
    Mode640x480_MONO8       = 69,
    Mode640x480_MONO16      = 70,
    Mode800x600_YUV422      = 71,
    Mode800x600_RGB8        = 72,
    Mode800x600_MONO8       = 73,
    Mode1024x768_YUV422     = 74,
    Mode1024x768_RGB8       = 75,
    Mode1024x768_MONO8      = 76,
    Mode800x600_MONO16      = 77,
    Mode1024x768_MONO16     = 78,
    Mode1280x960_YUV422     = 79,
    Mode1280x960_RGB8       = 80,
    Mode1280x960_MONO8      = 81,
    Mode1600x1200_YUV422    = 82,
    Mode1600x1200_RGB8      = 83,
    Mode1600x1200_MONO8     = 84,
    Mode1280x960_MONO16     = 85,
    Mode1600x1200_MONO16    = 86,
    Exif                    = 87,
    Format7_0               = 88,
    Format7_1               = 89,
    Format7_2               = 90,
    Format7_3               = 91,
    Format7_4               = 92,
    Format7_5               = 93,
    Format7_6               = 94,
    Format7_7               = 95,
}

impl VideoMode {
    /// All modes in register order.
    #[rustfmt::skip]
    pub const ALL: [VideoMode; 32] = [
        VideoMode::Mode160x120_YUV444, VideoMode::Mode320x240_YUV422,
        VideoMode::Mode640x480_YUV411, VideoMode::Mode640x480_YUV422,
        VideoMode::Mode640x480_RGB8, VideoMode::Mode640x480_MONO8,
        VideoMode::Mode640x480_MONO16, VideoMode::Mode800x600_YUV422,
        VideoMode::Mode800x600_RGB8, VideoMode::Mode800x600_MONO8,
        VideoMode::Mode1024x768_YUV422, VideoMode::Mode1024x768_RGB8,
        VideoMode::Mode1024x768_MONO8, VideoMode::Mode800x600_MONO16,
        VideoMode::Mode1024x768_MONO16, VideoMode::Mode1280x960_YUV422,
        VideoMode::Mode1280x960_RGB8, VideoMode::Mode1280x960_MONO8,
        VideoMode::Mode1600x1200_YUV422, VideoMode::Mode1600x1200_RGB8,
        VideoMode::Mode1600x1200_MONO8, VideoMode::Mode1280x960_MONO16,
        VideoMode::Mode1600x1200_MONO16, VideoMode::Exif,
        VideoMode::Format7_0, VideoMode::Format7_1, VideoMode::Format7_2,
        VideoMode::Format7_3, VideoMode::Format7_4, VideoMode::Format7_5,
        VideoMode::Format7_6, VideoMode::Format7_7,
    ];

    /// Whether this is a scalable (Format7) mode.
    pub fn is_scalable(self) -> bool {
        (self as u32) >= VideoMode::Format7_0 as u32
    }

    /// Format7 slot index (0..8) of a scalable mode.
    pub fn format7_index(self) -> Option<usize> {
        if self.is_scalable() {
            Some((self as u32 - VideoMode::Format7_0 as u32) as usize)
        } else {
            None
        }
    }

    /// Register coordinates of this mode: the IIDC format number and the
    /// mode number within that format, as used by the mode/rate inquiry and
    /// current-state registers.
    pub fn coordinates(self) -> (u32, u32) {
        let tag = self as u32;
        match tag {
            64..=70 => (0, tag - 64),
            71..=78 => (1, tag - 71),
            79..=86 => (2, tag - 79),
            87 => (6, 0),
            _ => (7, tag - 88),
        }
    }

    /// Resolves register coordinates back into a mode.
    pub fn from_coordinates(format: u32, mode: u32) -> Option<VideoMode> {
        let tag = match (format, mode) {
            (0, 0..=6) => 64 + mode,
            (1, 0..=7) => 71 + mode,
            (2, 0..=7) => 79 + mode,
            (6, 0) => 87,
            (7, 0..=7) => 88 + mode,
            _ => return None,
        };
        VideoMode::try_from(tag).ok()
    }

    /// Fixed geometry of a non-scalable video mode.
    ///
    /// Returns `(width, height, color coding)`. `None` for `Exif` and the
    /// scalable modes, whose geometry is not encoded in the mode itself.
    #[rustfmt::skip]
    pub fn fixed_geometry(self) -> Option<(u32, u32, ColorCoding)> {
        use crate::color::ColorCoding::*;
        match self {
            VideoMode::Mode160x120_YUV444   => Some((160, 120, Yuv444)),
            VideoMode::Mode320x240_YUV422   => Some((320, 240, Yuv422)),
            VideoMode::Mode640x480_YUV411   => Some((640, 480, Yuv411)),
            VideoMode::Mode640x480_YUV422   => Some((640, 480, Yuv422)),
            VideoMode::Mode640x480_RGB8     => Some((640, 480, Rgb8)),
            VideoMode::Mode640x480_MONO8    => Some((640, 480, Mono8)),
            VideoMode::Mode640x480_MONO16   => Some((640, 480, Mono16)),
            VideoMode::Mode800x600_YUV422   => Some((800, 600, Yuv422)),
            VideoMode::Mode800x600_RGB8     => Some((800, 600, Rgb8)),
            VideoMode::Mode800x600_MONO8    => Some((800, 600, Mono8)),
            VideoMode::Mode1024x768_YUV422  => Some((1024, 768, Yuv422)),
            VideoMode::Mode1024x768_RGB8    => Some((1024, 768, Rgb8)),
            VideoMode::Mode1024x768_MONO8   => Some((1024, 768, Mono8)),
            VideoMode::Mode800x600_MONO16   => Some((800, 600, Mono16)),
            VideoMode::Mode1024x768_MONO16  => Some((1024, 768, Mono16)),
            VideoMode::Mode1280x960_YUV422  => Some((1280, 960, Yuv422)),
            VideoMode::Mode1280x960_RGB8    => Some((1280, 960, Rgb8)),
            VideoMode::Mode1280x960_MONO8   => Some((1280, 960, Mono8)),
            VideoMode::Mode1600x1200_YUV422 => Some((1600, 1200, Yuv422)),
            VideoMode::Mode1600x1200_RGB8   => Some((1600, 1200, Rgb8)),
            VideoMode::Mode1600x1200_MONO8  => Some((1600, 1200, Mono8)),
            VideoMode::Mode1280x960_MONO16  => Some((1280, 960, Mono16)),
            VideoMode::Mode1600x1200_MONO16 => Some((1600, 1200, Mono16)),
            _ => None,
        }
    }
}

impl TryFrom<u32> for VideoMode {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self, Error> {
        match tag {
            64..=95 => Ok(VideoMode::ALL[(tag - 64) as usize]),
            _ => Err(Error::InvalidMode),
        }
    }
}

impl From<VideoMode> for u32 {
    fn from(mode: VideoMode) -> Self {
        mode as u32
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((w, h, coding)) = self.fixed_geometry() {
            write!(f, "{}x{} {}", w, h, coding)
        } else if let Some(i) = self.format7_index() {
            write!(f, "Format7 mode {}", i)
        } else {
            write!(f, "EXIF")
        }
    }
}
