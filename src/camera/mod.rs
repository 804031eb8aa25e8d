use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

use crate::capture::Session;
use crate::csr;
use crate::error::{Error, Result};
use crate::feature::{Caps, FeatureKind, TriggerMode, TriggerSource};
use crate::iso::{IsoDevice, Reservation};
use crate::speed::OperationMode;
use crate::transport::RegisterTransport;

pub mod capture;
pub use capture::capture_set;

mod features;
mod format7;
pub use format7::{Format7Mode, RoiValue};

mod video;

/// IIDC protocol version implemented by a camera.
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IidcVersion {
    V1_04 = 544,
    V1_20 = 545,
    PointGrey = 546,
    V1_30 = 547,
    V1_31 = 548,
    V1_32 = 549,
    V1_33 = 550,
    V1_34 = 551,
    V1_35 = 552,
    V1_36 = 553,
    V1_37 = 554,
    V1_38 = 555,
    V1_39 = 556,
}

impl TryFrom<u32> for IidcVersion {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self> {
        match tag {
            544 => Ok(IidcVersion::V1_04),
            545 => Ok(IidcVersion::V1_20),
            546 => Ok(IidcVersion::PointGrey),
            547 => Ok(IidcVersion::V1_30),
            548 => Ok(IidcVersion::V1_31),
            549 => Ok(IidcVersion::V1_32),
            550 => Ok(IidcVersion::V1_33),
            551 => Ok(IidcVersion::V1_34),
            552 => Ok(IidcVersion::V1_35),
            553 => Ok(IidcVersion::V1_36),
            554 => Ok(IidcVersion::V1_37),
            555 => Ok(IidcVersion::V1_38),
            556 => Ok(IidcVersion::V1_39),
            _ => Err(Error::InvalidIidcVersion),
        }
    }
}

impl fmt::Display for IidcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IidcVersion::V1_04 => write!(f, "1.04"),
            IidcVersion::V1_20 => write!(f, "1.20"),
            IidcVersion::PointGrey => write!(f, "PtGrey"),
            other => write!(f, "1.{}", 30 + (*other as u32 - IidcVersion::V1_30 as u32)),
        }
    }
}

/// Identity of a camera as produced by discovery.
///
/// Discovery (bus enumeration, config ROM parsing) is outside this crate;
/// it yields an already-identified camera together with a transport bound
/// to the camera's command register base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Bus port the camera is attached to.
    pub port: u32,
    /// Node id on that port.
    pub node: u16,
    /// 64-bit unique device identity (EUI-64).
    pub guid: u64,
    pub vendor: String,
    pub model: String,
    pub vendor_id: u32,
    pub model_id: u32,
    pub iidc_version: IidcVersion,
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vendor     : {} (0x{:x})", self.vendor, self.vendor_id)?;
        writeln!(f, "Model      : {} (0x{:x})", self.model, self.model_id)?;
        writeln!(f, "GUID       : 0x{:016x}", self.guid)?;
        writeln!(f, "Location   : port {}, node {}", self.port, self.node)?;
        writeln!(f, "IIDC       : {}", self.iidc_version)?;
        Ok(())
    }
}

/// Per-feature state decoded once from the inquiry registers and cached.
#[derive(Debug, Clone, Default)]
pub(crate) struct CachedCaps {
    pub caps: Caps,
    pub min: u32,
    pub max: u32,
    /// Byte offset of the absolute-control CSR block, when advertised.
    pub abs_csr: Option<u32>,
    /// Trigger feature only.
    pub trigger_modes: Vec<TriggerMode>,
    pub trigger_sources: Vec<TriggerSource>,
}

/// One open camera session.
///
/// A camera owns its transport and streaming device exclusively; separate
/// cameras may be driven from separate threads without shared locking.
pub struct Camera<D: RegisterTransport + IsoDevice> {
    pub(crate) dev: D,
    info: Info,

    // capability flags from BASIC_FUNC_INQ
    bmode_capable: bool,
    one_shot_capable: bool,
    multi_shot_capable: bool,
    adv_features_capable: bool,
    can_switch_power: bool,
    mem_channels: u32,

    pub(crate) operation_mode: OperationMode,

    /// Resolved Format7 CSR block offsets, one per mode slot.
    pub(crate) format7_csr: [Option<u32>; 8],

    pub(crate) feature_caps: HashMap<FeatureKind, CachedCaps>,

    pub(crate) reservation: Option<Reservation>,
    pub(crate) pinned_channel: Option<u8>,
    pub(crate) session: Option<Session>,
}

impl<D: RegisterTransport + IsoDevice> Camera<D> {
    /// Opens a camera session on an identified device.
    ///
    /// Reads the basic function inquiry and resolves the Format7 CSR bases,
    /// so later calls can gate on capabilities without touching the bus.
    pub fn open(dev: D, info: Info) -> Result<Self> {
        let mut camera = Camera {
            dev,
            info,
            bmode_capable: false,
            one_shot_capable: false,
            multi_shot_capable: false,
            adv_features_capable: false,
            can_switch_power: false,
            mem_channels: 0,
            operation_mode: OperationMode::Legacy,
            format7_csr: [None; 8],
            feature_caps: HashMap::new(),
            reservation: None,
            pinned_channel: None,
            session: None,
        };

        let basic = camera.read_reg(csr::BASIC_FUNC_INQ)?;
        camera.bmode_capable = basic & csr::basic_func::B_MODE != 0;
        camera.one_shot_capable = basic & csr::basic_func::ONE_SHOT != 0;
        camera.multi_shot_capable = basic & csr::basic_func::MULTI_SHOT != 0;
        camera.adv_features_capable = basic & csr::basic_func::ADV_FEATURES != 0;
        camera.can_switch_power = basic & csr::basic_func::POWER_CNTL != 0;
        camera.mem_channels = basic & csr::basic_func::MEM_CH_MASK;

        camera.resolve_format7_bases()?;

        Ok(camera)
    }

    fn resolve_format7_bases(&mut self) -> Result<()> {
        let formats = self.read_reg(csr::V_FORMAT_INQ)?;
        // format 7 advertised as bit 24 (MSB = format 0)
        if formats & (1 << (31 - 7)) == 0 {
            return Ok(());
        }
        let modes = self.read_reg(csr::V_MODE_INQ_BASE + 4 * 7)?;
        for slot in 0..8 {
            if modes & (1 << (31 - slot)) == 0 {
                continue;
            }
            let quadlet_offset = self.read_reg(csr::V_CSR_INQ_7_BASE + 4 * slot)?;
            if quadlet_offset != 0 {
                self.format7_csr[slot as usize] = Some(quadlet_offset * 4);
            }
        }
        Ok(())
    }

    /// Identity of the camera as reported by discovery.
    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn guid(&self) -> u64 {
        self.info.guid
    }

    pub fn iidc_version(&self) -> IidcVersion {
        self.info.iidc_version
    }

    /// Whether the camera supports 1394b (extended) addressing.
    pub fn is_bmode_capable(&self) -> bool {
        self.bmode_capable
    }

    pub fn is_one_shot_capable(&self) -> bool {
        self.one_shot_capable
    }

    pub fn is_multi_shot_capable(&self) -> bool {
        self.multi_shot_capable
    }

    pub fn has_advanced_features(&self) -> bool {
        self.adv_features_capable
    }

    pub fn can_switch_power(&self) -> bool {
        self.can_switch_power
    }

    /// Number of user memory channels (0 = factory defaults only).
    pub fn memory_channels(&self) -> u32 {
        self.mem_channels
    }

    /// The underlying bus device.
    pub fn device(&self) -> &D {
        &self.dev
    }

    /// Mutable access to the underlying bus device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    pub(crate) fn read_reg(&mut self, offset: u32) -> Result<u32> {
        self.dev.read(offset)
    }

    pub(crate) fn write_reg(&mut self, offset: u32, value: u32) -> Result<()> {
        self.dev.write(offset, value)
    }

    /// Resets the camera to factory defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.write_reg(csr::INITIALIZE, csr::ON)
    }

    /// Switches the camera's main power, when the camera supports it.
    pub fn set_power(&mut self, on: bool) -> Result<()> {
        if !self.can_switch_power {
            return Err(Error::FunctionNotSupported);
        }
        self.write_reg(csr::CAMERA_POWER, if on { csr::ON } else { 0 })
    }

    /// Runs `f` with broadcast addressing enabled.
    ///
    /// Every register write inside the closure is executed by all identical
    /// devices on the same bus. Unicast addressing is restored on every
    /// exit path, including when `f` or the restore itself fails, so
    /// broadcast state cannot leak into later unrelated writes.
    pub fn broadcast<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.dev.set_broadcast(true)?;
        log::debug!("broadcast enabled for camera 0x{:016x}", self.info.guid);
        let out = f(self);
        let restored = self.dev.set_broadcast(false);
        log::debug!("broadcast disabled for camera 0x{:016x}", self.info.guid);
        let value = out?;
        restored?;
        Ok(value)
    }

    /// Channel the next memory save will write to.
    pub fn memory_save_channel(&mut self) -> Result<u32> {
        Ok(self.read_reg(csr::MEM_SAVE_CH)? >> 28)
    }

    /// Channel the camera last loaded its setup from.
    pub fn memory_load_channel(&mut self) -> Result<u32> {
        Ok(self.read_reg(csr::CUR_MEM_CH)? >> 28)
    }

    /// Whether a memory save is still in progress.
    pub fn memory_busy(&mut self) -> Result<bool> {
        Ok(self.read_reg(csr::MEMORY_SAVE)? & csr::ON != 0)
    }

    /// Saves the current camera setup into a memory channel.
    ///
    /// Channel 0 holds the factory defaults and is not writable.
    pub fn memory_save(&mut self, channel: u32) -> Result<()> {
        if channel == 0 || channel > self.mem_channels {
            return Err(Error::ValueOutsideRange);
        }
        self.write_reg(csr::MEM_SAVE_CH, channel << 28)?;
        self.write_reg(csr::MEMORY_SAVE, csr::ON)
    }

    /// Loads a previously saved camera setup.
    pub fn memory_load(&mut self, channel: u32) -> Result<()> {
        if channel > self.mem_channels {
            return Err(Error::ValueOutsideRange);
        }
        self.write_reg(csr::CUR_MEM_CH, channel << 28)
    }
}

impl<D: RegisterTransport + IsoDevice> Drop for Camera<D> {
    fn drop(&mut self) {
        // a handle must not go away while streaming or holding resources
        if let Err(e) = self.capture_stop() {
            log::warn!(
                "camera 0x{:016x}: capture stop on drop failed: {}",
                self.info.guid,
                e
            );
        }
    }
}

impl<D: RegisterTransport + IsoDevice> fmt::Debug for Camera<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("guid", &format_args!("0x{:016x}", self.info.guid))
            .field("vendor", &self.info.vendor)
            .field("model", &self.info.model)
            .finish()
    }
}
