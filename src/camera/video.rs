use std::convert::TryFrom;

use crate::camera::Camera;
use crate::color::ColorCoding;
use crate::csr::{self, iso_data, one_shot};
use crate::error::{Error, Result};
use crate::framerate::Framerate;
use crate::iso::IsoDevice;
use crate::mode::VideoMode;
use crate::speed::{IsoSpeed, OperationMode};
use crate::transport::RegisterTransport;

impl<D: RegisterTransport + IsoDevice> Camera<D> {
    /// Enumerates the video modes the camera supports.
    pub fn supported_modes(&mut self) -> Result<Vec<VideoMode>> {
        let formats = self.read_reg(csr::V_FORMAT_INQ)?;
        let mut modes = Vec::new();
        for format in [0u32, 1, 2, 6, 7] {
            if formats & (1 << (31 - format)) == 0 {
                continue;
            }
            let mask = self.read_reg(csr::V_MODE_INQ_BASE + 4 * format)?;
            for index in 0..8 {
                if mask & (1 << (31 - index)) == 0 {
                    continue;
                }
                if let Some(mode) = VideoMode::from_coordinates(format, index) {
                    modes.push(mode);
                }
            }
        }
        Ok(modes)
    }

    /// Enumerates the framerates supported under a fixed video mode.
    ///
    /// Scalable modes have no framerate axis; asking for one is a format
    /// error, not an empty set.
    pub fn supported_framerates(&mut self, mode: VideoMode) -> Result<Vec<Framerate>> {
        if mode.is_scalable() {
            return Err(Error::InvalidFormat);
        }
        let (format, index) = mode.coordinates();
        let mask = self.read_reg(csr::V_RATE_INQ_BASE + 4 * (8 * format + index))?;
        let mut rates = Vec::new();
        for rate in Framerate::ALL {
            if mask & (1 << (31 - rate.index())) != 0 {
                rates.push(rate);
            }
        }
        Ok(rates)
    }

    /// Current video mode.
    pub fn video_mode(&mut self) -> Result<VideoMode> {
        let format = self.read_reg(csr::CUR_V_FORMAT)? >> 29;
        let index = self.read_reg(csr::CUR_V_MODE)? >> 29;
        VideoMode::from_coordinates(format, index).ok_or(Error::InvalidMode)
    }

    /// Selects a video mode.
    ///
    /// The mode must be in the camera-reported supported set; the current
    /// registers stay untouched otherwise.
    pub fn set_video_mode(&mut self, mode: VideoMode) -> Result<()> {
        if !self.supported_modes()?.contains(&mode) {
            return Err(Error::InvalidMode);
        }
        let (format, index) = mode.coordinates();
        self.write_reg(csr::CUR_V_FORMAT, format << 29)?;
        self.write_reg(csr::CUR_V_MODE, index << 29)
    }

    /// Current fixed framerate.
    pub fn framerate(&mut self) -> Result<Framerate> {
        let index = self.read_reg(csr::CUR_V_FRM_RATE)? >> 29;
        Framerate::try_from(Framerate::Fps1_875 as u32 + index)
    }

    /// Selects a fixed framerate.
    ///
    /// The legal set depends on the current video mode, so the rate is
    /// re-validated against it here; an unsupported rate is rejected, never
    /// clamped, and the framerate register keeps its previous value.
    pub fn set_framerate(&mut self, rate: Framerate) -> Result<()> {
        let mode = self.video_mode()?;
        if !self.supported_framerates(mode)?.contains(&rate) {
            return Err(Error::InvalidFramerate);
        }
        self.write_reg(csr::CUR_V_FRM_RATE, rate.index() << 29)
    }

    /// Current isochronous speed grade.
    pub fn iso_speed(&mut self) -> Result<IsoSpeed> {
        let quadlet = self.read_reg(csr::ISO_DATA)?;
        let tag = match self.operation_mode {
            OperationMode::Legacy => {
                (quadlet >> iso_data::LEGACY_SPEED_SHIFT) & iso_data::LEGACY_SPEED_MASK
            }
            OperationMode::B => quadlet & iso_data::B_SPEED_MASK,
        };
        IsoSpeed::try_from(tag)
    }

    /// Selects the isochronous speed grade.
    ///
    /// Grades above S400 only exist in 1394b addressing.
    pub fn set_iso_speed(&mut self, speed: IsoSpeed) -> Result<()> {
        if speed.requires_b_mode() && self.operation_mode == OperationMode::Legacy {
            return Err(Error::InvalidIsoSpeed);
        }
        let quadlet = self.read_reg(csr::ISO_DATA)?;
        let quadlet = match self.operation_mode {
            OperationMode::Legacy => {
                (quadlet & !(iso_data::LEGACY_SPEED_MASK << iso_data::LEGACY_SPEED_SHIFT))
                    | ((speed as u32) << iso_data::LEGACY_SPEED_SHIFT)
            }
            OperationMode::B => (quadlet & !iso_data::B_SPEED_MASK) | speed as u32,
        };
        self.write_reg(csr::ISO_DATA, quadlet)
    }

    /// Current bus addressing mode.
    pub fn operation_mode(&self) -> OperationMode {
        self.operation_mode
    }

    /// Switches between legacy and 1394b addressing.
    pub fn set_operation_mode(&mut self, mode: OperationMode) -> Result<()> {
        if mode == OperationMode::B && !self.is_bmode_capable() {
            return Err(Error::FunctionNotSupported);
        }
        let quadlet = self.read_reg(csr::ISO_DATA)?;
        let quadlet = match mode {
            OperationMode::B => quadlet | iso_data::B_MODE_ENABLE,
            OperationMode::Legacy => quadlet & !iso_data::B_MODE_ENABLE,
        };
        self.write_reg(csr::ISO_DATA, quadlet)?;
        self.operation_mode = mode;
        Ok(())
    }

    pub(crate) fn write_iso_channel(&mut self, channel: u8) -> Result<()> {
        let quadlet = self.read_reg(csr::ISO_DATA)?;
        let quadlet = match self.operation_mode {
            OperationMode::Legacy => {
                (quadlet & !(0xF << iso_data::LEGACY_CHANNEL_SHIFT))
                    | (u32::from(channel & 0xF) << iso_data::LEGACY_CHANNEL_SHIFT)
            }
            OperationMode::B => {
                (quadlet & !(iso_data::B_CHANNEL_MASK << iso_data::B_CHANNEL_SHIFT))
                    | (u32::from(channel) & iso_data::B_CHANNEL_MASK) << iso_data::B_CHANNEL_SHIFT
            }
        };
        self.write_reg(csr::ISO_DATA, quadlet)
    }

    /// Whether isochronous transmission is on.
    pub fn transmission(&mut self) -> Result<bool> {
        Ok(self.read_reg(csr::ISO_EN)? & csr::ON != 0)
    }

    /// Switches isochronous transmission on or off.
    pub fn set_transmission(&mut self, on: bool) -> Result<()> {
        self.write_reg(csr::ISO_EN, if on { csr::ON } else { 0 })?;
        if let Some(session) = &mut self.session {
            session.streaming = on;
        }
        Ok(())
    }

    /// Whether a one-shot capture is pending.
    pub fn one_shot(&mut self) -> Result<bool> {
        if !self.is_one_shot_capable() {
            return Err(Error::FunctionNotSupported);
        }
        Ok(self.read_reg(csr::ONE_SHOT)? & one_shot::ONE_SHOT != 0)
    }

    /// Arms or clears a single-frame capture.
    pub fn set_one_shot(&mut self, on: bool) -> Result<()> {
        if !self.is_one_shot_capable() {
            return Err(Error::FunctionNotSupported);
        }
        self.write_reg(csr::ONE_SHOT, if on { one_shot::ONE_SHOT } else { 0 })
    }

    /// Multi-shot state: whether it is armed and for how many frames.
    pub fn multi_shot(&mut self) -> Result<(bool, u32)> {
        if !self.is_multi_shot_capable() {
            return Err(Error::FunctionNotSupported);
        }
        let quadlet = self.read_reg(csr::ONE_SHOT)?;
        Ok((
            quadlet & one_shot::MULTI_SHOT != 0,
            quadlet & one_shot::COUNT_MASK,
        ))
    }

    /// Arms a capture of exactly `count` frames, or clears it.
    ///
    /// Count and enable bit go out in one register update; writing them
    /// separately would let the camera start before the count is
    /// programmed.
    pub fn set_multi_shot(&mut self, count: u32, on: bool) -> Result<()> {
        if !self.is_multi_shot_capable() {
            return Err(Error::FunctionNotSupported);
        }
        if !on {
            return self.write_reg(csr::ONE_SHOT, 0);
        }
        if count == 0 || count > one_shot::COUNT_MASK {
            return Err(Error::ValueOutsideRange);
        }
        self.write_reg(csr::ONE_SHOT, one_shot::MULTI_SHOT | count)
    }

    /// Bits per sample component under the current video mode.
    pub fn data_depth(&mut self) -> Result<u32> {
        let mode = self.video_mode()?;
        if mode.is_scalable() {
            return self.format7_data_depth(mode);
        }
        let (_, _, coding) = mode.fixed_geometry().ok_or(Error::InvalidFormat)?;
        Ok(match coding {
            ColorCoding::Mono16 | ColorCoding::Mono16S | ColorCoding::Raw16 | ColorCoding::Rgb16
            | ColorCoding::Rgb16S => 16,
            _ => 8,
        })
    }

    /// Payload bytes of one isochronous packet under the current
    /// mode/framerate (or Format7 packet size) selection.
    pub(crate) fn packet_bytes(&mut self) -> Result<u32> {
        let mode = self.video_mode()?;
        if mode.is_scalable() {
            return self.format7_byte_per_packet(mode);
        }
        let (width, height, coding) = mode.fixed_geometry().ok_or(Error::InvalidFormat)?;
        let frame_bytes = coding.bytes_for_pixels(u64::from(width) * u64::from(height));
        let fps = self.framerate()?.as_fps();
        // 8000 packet slots per second on the bus
        Ok(((frame_bytes as f64) * fps / 8000.0).ceil() as u32)
    }

    /// Bus bandwidth units the current configuration will consume.
    ///
    /// Units are scaled the way the bus arbiter counts them: one unit per
    /// quadlet at S1600, with slower grades consuming proportionally more
    /// of the cycle.
    pub fn bandwidth_usage(&mut self) -> Result<u32> {
        let payload = self.packet_bytes()?;
        let speed = self.iso_speed()?;
        // packet + isochronous header overhead, in quadlets
        let quadlets = payload / 4 + 3;
        let scale = IsoSpeed::S1600 as i32 - speed as i32;
        Ok(if scale >= 0 {
            quadlets << scale
        } else {
            quadlets >> -scale
        })
    }
}
