use std::convert::TryFrom;
use std::fmt;

use crate::camera::Camera;
use crate::color::{ColorCoding, ColorFilter};
use crate::csr::format7 as f7;
use crate::error::{Error, Result};
use crate::iso::IsoDevice;
use crate::mode::VideoMode;
use crate::transport::RegisterTransport;

/// Sentinel-or-value argument for [`Camera::set_format7_roi`].
///
/// `FromCamera` keeps whatever the camera currently has, `MaxAvail` asks
/// for the maximum the camera supports and `Recommended` for the
/// camera-suggested default (packet size only).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoiValue {
    FromCamera,
    MaxAvail,
    Recommended,
    Exact(u32),
}

/// Snapshot of one scalable mode slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format7Mode {
    pub mode: VideoMode,
    pub max_size: (u32, u32),
    pub size: (u32, u32),
    pub position: (u32, u32),
    pub unit_size: (u32, u32),
    pub unit_position: (u32, u32),
    pub color_codings: Vec<ColorCoding>,
    pub color_coding: ColorCoding,
    pub pixels: u32,
    pub byte_per_packet: u32,
    pub min_byte_per_packet: u32,
    pub max_byte_per_packet: u32,
    pub total_bytes: u64,
    /// Sensor layout, meaningful for raw codings only.
    pub color_filter: Option<ColorFilter>,
}

impl fmt::Display for Format7Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode       : {}", self.mode)?;
        writeln!(
            f,
            "Geometry   : {}x{} at ({}, {}), max {}x{}",
            self.size.0, self.size.1, self.position.0, self.position.1, self.max_size.0, self.max_size.1
        )?;
        writeln!(
            f,
            "Units      : size {}x{}, position {}x{}",
            self.unit_size.0, self.unit_size.1, self.unit_position.0, self.unit_position.1
        )?;
        writeln!(f, "Coding     : {}", self.color_coding)?;
        writeln!(
            f,
            "Packet     : {} [{} .. {}] bytes",
            self.byte_per_packet, self.min_byte_per_packet, self.max_byte_per_packet
        )?;
        writeln!(f, "Pixels     : {}", self.pixels)?;
        writeln!(f, "Total      : {} bytes", self.total_bytes)?;
        if let Some(filter) = self.color_filter {
            writeln!(f, "Filter     : {}", filter)?;
        }
        Ok(())
    }
}

impl<D: RegisterTransport + IsoDevice> Camera<D> {
    /// CSR base of a scalable mode, or the reason there is none.
    fn f7_base(&self, mode: VideoMode) -> Result<u32> {
        let slot = mode.format7_index().ok_or(Error::InvalidMode)?;
        self.format7_csr[slot].ok_or(Error::InvalidMode)
    }

    /// Latches pending geometry values and checks the camera-side error
    /// flags the setting register reports back.
    fn f7_commit(&mut self, base: u32) -> Result<()> {
        let setting = self.read_reg(base + f7::VALUE_SETTING)?;
        if setting & f7::SETTING_PRESENT == 0 {
            return Ok(());
        }
        self.write_reg(base + f7::VALUE_SETTING, f7::SETTING_1)?;
        let setting = self.read_reg(base + f7::VALUE_SETTING)?;
        if setting & f7::ERROR_FLAG_1 != 0 {
            return Err(Error::Format7ErrorFlag1);
        }
        if setting & f7::ERROR_FLAG_2 != 0 {
            return Err(Error::Format7ErrorFlag2);
        }
        Ok(())
    }

    /// Maximum image size of a scalable mode, fixed by the camera.
    pub fn format7_max_image_size(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::MAX_IMAGE_SIZE_INQ)?;
        Ok((quadlet >> 16, quadlet & 0xFFFF))
    }

    /// Size alignment units of a scalable mode.
    pub fn format7_unit_size(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::UNIT_SIZE_INQ)?;
        Ok((quadlet >> 16, quadlet & 0xFFFF))
    }

    /// Position alignment units of a scalable mode.
    ///
    /// Cameras predating the position inquiry report zero; the size units
    /// apply then.
    pub fn format7_unit_position(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::UNIT_POSITION_INQ)?;
        let (h, v) = (quadlet >> 16, quadlet & 0xFFFF);
        if h == 0 || v == 0 {
            return self.format7_unit_size(mode);
        }
        Ok((h, v))
    }

    pub fn format7_image_size(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::IMAGE_SIZE)?;
        Ok((quadlet >> 16, quadlet & 0xFFFF))
    }

    /// Sets the region-of-interest size.
    ///
    /// Both axes must be positive multiples of the unit size, and the
    /// current position plus the new size must stay within the maximum.
    pub fn set_format7_image_size(&mut self, mode: VideoMode, width: u32, height: u32) -> Result<()> {
        let base = self.f7_base(mode)?;
        let (unit_w, unit_h) = self.format7_unit_size(mode)?;
        let (max_w, max_h) = self.format7_max_image_size(mode)?;
        let (left, top) = self.format7_image_position(mode)?;
        if width == 0
            || height == 0
            || width % unit_w.max(1) != 0
            || height % unit_h.max(1) != 0
            || left + width > max_w
            || top + height > max_h
        {
            return Err(Error::Format7ErrorFlag1);
        }
        self.write_reg(base + f7::IMAGE_SIZE, (width << 16) | height)?;
        self.f7_commit(base)
    }

    pub fn format7_image_position(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::IMAGE_POSITION)?;
        Ok((quadlet >> 16, quadlet & 0xFFFF))
    }

    /// Sets the region-of-interest position.
    pub fn set_format7_image_position(&mut self, mode: VideoMode, left: u32, top: u32) -> Result<()> {
        let base = self.f7_base(mode)?;
        let (unit_h, unit_v) = self.format7_unit_position(mode)?;
        let (max_w, max_h) = self.format7_max_image_size(mode)?;
        let (width, height) = self.format7_image_size(mode)?;
        if left % unit_h.max(1) != 0
            || top % unit_v.max(1) != 0
            || left + width > max_w
            || top + height > max_h
        {
            return Err(Error::Format7ErrorFlag1);
        }
        self.write_reg(base + f7::IMAGE_POSITION, (left << 16) | top)?;
        self.f7_commit(base)
    }

    pub fn format7_color_coding(&mut self, mode: VideoMode) -> Result<ColorCoding> {
        let base = self.f7_base(mode)?;
        let index = self.read_reg(base + f7::COLOR_CODING_ID)? >> 24;
        ColorCoding::try_from(ColorCoding::Mono8 as u32 + index)
    }

    /// Enumerates the color codings this mode slot supports.
    pub fn format7_color_codings(&mut self, mode: VideoMode) -> Result<Vec<ColorCoding>> {
        let base = self.f7_base(mode)?;
        let mask = self.read_reg(base + f7::COLOR_CODING_INQ)?;
        let mut codings = Vec::new();
        for coding in ColorCoding::ALL {
            if mask & (1 << (31 - coding.index())) != 0 {
                codings.push(coding);
            }
        }
        Ok(codings)
    }

    pub fn set_format7_color_coding(&mut self, mode: VideoMode, coding: ColorCoding) -> Result<()> {
        let base = self.f7_base(mode)?;
        if !self.format7_color_codings(mode)?.contains(&coding) {
            return Err(Error::InvalidColorCoding);
        }
        self.write_reg(base + f7::COLOR_CODING_ID, coding.index() << 24)?;
        self.f7_commit(base)
    }

    pub fn format7_color_filter(&mut self, mode: VideoMode) -> Result<ColorFilter> {
        let base = self.f7_base(mode)?;
        let index = self.read_reg(base + f7::COLOR_FILTER_ID)? >> 24;
        ColorFilter::try_from(ColorFilter::Rggb as u32 + index)
    }

    pub fn set_format7_color_filter(&mut self, mode: VideoMode, filter: ColorFilter) -> Result<()> {
        let base = self.f7_base(mode)?;
        self.write_reg(base + f7::COLOR_FILTER_ID, filter.index() << 24)
    }

    /// Camera-reported packet size bounds `(min, max)` for the current
    /// geometry and coding. The minimum doubles as the packet granularity.
    pub fn format7_packet_para(&mut self, mode: VideoMode) -> Result<(u32, u32)> {
        let base = self.f7_base(mode)?;
        let quadlet = self.read_reg(base + f7::PACKET_PARA_INQ)?;
        Ok((quadlet >> 16, quadlet & 0xFFFF))
    }

    pub fn format7_byte_per_packet(&mut self, mode: VideoMode) -> Result<u32> {
        let base = self.f7_base(mode)?;
        Ok(self.read_reg(base + f7::BYTE_PER_PACKET)? >> 16)
    }

    /// Packet size the camera recommends for the current geometry.
    pub fn format7_recommended_byte_per_packet(&mut self, mode: VideoMode) -> Result<u32> {
        let base = self.f7_base(mode)?;
        Ok(self.read_reg(base + f7::BYTE_PER_PACKET)? & 0xFFFF)
    }

    /// Sets the packet size.
    ///
    /// The value must fall inside the camera-reported bounds and on the
    /// packet granularity; packet bounds depend on geometry and coding, so
    /// set those first.
    pub fn set_format7_byte_per_packet(&mut self, mode: VideoMode, bytes: u32) -> Result<()> {
        let base = self.f7_base(mode)?;
        let (min, max) = self.format7_packet_para(mode)?;
        if bytes < min || bytes > max || (min != 0 && bytes % min != 0) {
            return Err(Error::ValueOutsideRange);
        }
        // low half-word carries the camera's recommendation; keep it
        let quadlet = self.read_reg(base + f7::BYTE_PER_PACKET)?;
        self.write_reg(base + f7::BYTE_PER_PACKET, (bytes << 16) | (quadlet & 0xFFFF))
    }

    /// Packets transferred per frame.
    pub fn format7_packet_per_frame(&mut self, mode: VideoMode) -> Result<u32> {
        let base = self.f7_base(mode)?;
        let ppf = self.read_reg(base + f7::PACKET_PER_FRAME_INQ)?;
        if ppf != 0 {
            return Ok(ppf);
        }
        // older cameras leave the inquiry at zero; derive it
        let total = self.format7_total_bytes(mode)?;
        let bpp = self.format7_byte_per_packet(mode)?;
        if bpp == 0 {
            return Err(Error::Failure);
        }
        Ok(((total + u64::from(bpp) - 1) / u64::from(bpp)) as u32)
    }

    /// Pixels per frame, as derived by the camera.
    pub fn format7_pixel_number(&mut self, mode: VideoMode) -> Result<u32> {
        let base = self.f7_base(mode)?;
        self.read_reg(base + f7::PIXEL_NUMBER_INQ)
    }

    /// Bytes per frame, as derived by the camera.
    pub fn format7_total_bytes(&mut self, mode: VideoMode) -> Result<u64> {
        let base = self.f7_base(mode)?;
        let hi = self.read_reg(base + f7::TOTAL_BYTES_HI_INQ)?;
        let lo = self.read_reg(base + f7::TOTAL_BYTES_LO_INQ)?;
        Ok((u64::from(hi) << 32) | u64::from(lo))
    }

    /// Bits per sample component of this mode's current coding.
    pub fn format7_data_depth(&mut self, mode: VideoMode) -> Result<u32> {
        let base = self.f7_base(mode)?;
        Ok(self.read_reg(base + f7::DATA_DEPTH_INQ)? >> 24)
    }

    /// Frame interval in seconds, when the camera reports one.
    pub fn format7_frame_interval(&mut self, mode: VideoMode) -> Result<f32> {
        let base = self.f7_base(mode)?;
        Ok(f32::from_bits(self.read_reg(base + f7::FRAME_INTERVAL_INQ)?))
    }

    /// Snapshot of one scalable mode slot.
    pub fn format7_mode_info(&mut self, mode: VideoMode) -> Result<Format7Mode> {
        self.f7_base(mode)?;
        let coding = self.format7_color_coding(mode)?;
        let (min_bpp, max_bpp) = self.format7_packet_para(mode)?;
        Ok(Format7Mode {
            mode,
            max_size: self.format7_max_image_size(mode)?,
            size: self.format7_image_size(mode)?,
            position: self.format7_image_position(mode)?,
            unit_size: self.format7_unit_size(mode)?,
            unit_position: self.format7_unit_position(mode)?,
            color_codings: self.format7_color_codings(mode)?,
            color_coding: coding,
            pixels: self.format7_pixel_number(mode)?,
            byte_per_packet: self.format7_byte_per_packet(mode)?,
            min_byte_per_packet: min_bpp,
            max_byte_per_packet: max_bpp,
            total_bytes: self.format7_total_bytes(mode)?,
            color_filter: if coding.is_raw() {
                Some(self.format7_color_filter(mode)?)
            } else {
                None
            },
        })
    }

    /// Snapshots of every scalable mode slot the camera implements.
    pub fn format7_modeset(&mut self) -> Result<Vec<Format7Mode>> {
        let mut modes = Vec::new();
        for slot in 0..8 {
            if self.format7_csr[slot].is_none() {
                continue;
            }
            let mode = VideoMode::ALL[24 + slot];
            modes.push(self.format7_mode_info(mode)?);
        }
        Ok(modes)
    }

    /// Applies a full region-of-interest selection in one call.
    ///
    /// Validation happens in dependency order: the mode slot, then the
    /// color coding, then the geometry, and finally the packet size against
    /// bounds re-queried *after* the geometry landed, since the bounds are
    /// a function of coding and geometry. Each stage rejects with its own
    /// error and leaves the camera exactly as the previous stage set it up;
    /// there is no auto-correction beyond the explicit sentinels.
    ///
    /// This does not switch the camera's video mode; pair it with
    /// [`Camera::set_video_mode`].
    #[allow(clippy::too_many_arguments)]
    pub fn set_format7_roi(
        &mut self,
        mode: VideoMode,
        coding: Option<ColorCoding>,
        packet: RoiValue,
        left: RoiValue,
        top: RoiValue,
        width: RoiValue,
        height: RoiValue,
    ) -> Result<()> {
        let base = self.f7_base(mode)?;

        let coding = match coding {
            Some(c) => c,
            None => self.format7_color_coding(mode)?,
        };
        if !self.format7_color_codings(mode)?.contains(&coding) {
            return Err(Error::InvalidColorCoding);
        }

        let (max_w, max_h) = self.format7_max_image_size(mode)?;
        let (unit_w, unit_h) = self.format7_unit_size(mode)?;
        let (unit_x, unit_y) = self.format7_unit_position(mode)?;
        let (cur_w, cur_h) = self.format7_image_size(mode)?;
        let (cur_x, cur_y) = self.format7_image_position(mode)?;
        // a camera reporting no unit effectively has a one-pixel grid
        let (unit_w, unit_h) = (unit_w.max(1), unit_h.max(1));
        let (unit_x, unit_y) = (unit_x.max(1), unit_y.max(1));

        let left = resolve_dim(left, cur_x, 0)?;
        let top = resolve_dim(top, cur_y, 0)?;
        if left > max_w || top > max_h {
            return Err(Error::Format7ErrorFlag1);
        }
        let width = resolve_dim(width, cur_w, align_down(max_w - left, unit_w))?;
        let height = resolve_dim(height, cur_h, align_down(max_h - top, unit_h))?;

        if width == 0
            || height == 0
            || width % unit_w != 0
            || height % unit_h != 0
            || left % unit_x != 0
            || top % unit_y != 0
            || left + width > max_w
            || top + height > max_h
        {
            return Err(Error::Format7ErrorFlag1);
        }

        self.write_reg(base + f7::COLOR_CODING_ID, coding.index() << 24)?;
        // park the origin first so position + size never transiently
        // exceeds the maximum while the two registers are updated
        self.write_reg(base + f7::IMAGE_POSITION, 0)?;
        self.write_reg(base + f7::IMAGE_SIZE, (width << 16) | height)?;
        self.write_reg(base + f7::IMAGE_POSITION, (left << 16) | top)?;
        self.f7_commit(base)?;

        // bounds are only valid for the geometry that just landed
        let (min_bpp, max_bpp) = self.format7_packet_para(mode)?;
        let bytes = match packet {
            RoiValue::FromCamera => self.format7_byte_per_packet(mode)?,
            RoiValue::MaxAvail => max_bpp,
            RoiValue::Recommended => {
                let recommended = self.format7_recommended_byte_per_packet(mode)?;
                if recommended == 0 {
                    max_bpp
                } else {
                    recommended
                }
            }
            RoiValue::Exact(bytes) => bytes,
        };
        if bytes < min_bpp || bytes > max_bpp || (min_bpp != 0 && bytes % min_bpp != 0) {
            return Err(Error::Format7ErrorFlag2);
        }
        let quadlet = self.read_reg(base + f7::BYTE_PER_PACKET)?;
        self.write_reg(base + f7::BYTE_PER_PACKET, (bytes << 16) | (quadlet & 0xFFFF))?;
        self.f7_commit(base)
    }
}

fn align_down(value: u32, unit: u32) -> u32 {
    if unit == 0 {
        value
    } else {
        value - value % unit
    }
}

fn resolve_dim(value: RoiValue, current: u32, max_avail: u32) -> Result<u32> {
    match value {
        RoiValue::FromCamera => Ok(current),
        RoiValue::MaxAvail => Ok(max_avail),
        // only the packet size has a camera-recommended default
        RoiValue::Recommended => Err(Error::InvalidArgument),
        RoiValue::Exact(v) => Ok(v),
    }
}
