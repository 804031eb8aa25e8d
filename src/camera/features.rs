use crate::camera::{CachedCaps, Camera};
use crate::csr::{self, feature_inq, feature_val};
use crate::error::{Error, Result};
use crate::feature::{
    Absolute, Caps, FeatureInfo, FeatureKind, FeatureMode, TriggerInfo, TriggerMode,
    TriggerPolarity, TriggerSource, Value,
};
use crate::iso::IsoDevice;
use crate::transport::RegisterTransport;

fn inq_offset(kind: FeatureKind) -> u32 {
    csr::feature_offset(kind.index(), csr::FEATURE_HI_BASE_INQ, csr::FEATURE_LO_BASE_INQ)
}

fn abs_offset(kind: FeatureKind) -> u32 {
    csr::feature_offset(kind.index(), csr::FEATURE_ABS_HI_BASE, csr::FEATURE_ABS_LO_BASE)
}

fn val_offset(kind: FeatureKind) -> u32 {
    csr::feature_offset(kind.index(), csr::FEATURE_HI_BASE, csr::FEATURE_LO_BASE)
}

impl<D: RegisterTransport + IsoDevice> Camera<D> {
    /// Decodes and caches a feature's capabilities and bounds.
    ///
    /// The inquiry registers describe what a feature *can* do, which never
    /// changes within a session, so one read per feature suffices. Values
    /// are deliberately not cached here: the camera mutates them on its own
    /// in auto mode.
    pub(crate) fn ensure_caps(&mut self, kind: FeatureKind) -> Result<CachedCaps> {
        if let Some(cached) = self.feature_caps.get(&kind) {
            return Ok(cached.clone());
        }

        let quadlet = self.read_reg(inq_offset(kind))?;
        let mut caps = Caps::empty();
        if quadlet & feature_inq::PRESENT != 0 {
            caps |= Caps::PRESENT;
        }
        if quadlet & feature_inq::ABSOLUTE != 0 {
            caps |= Caps::ABSOLUTE;
        }
        if quadlet & feature_inq::READOUT != 0 {
            caps |= Caps::READOUT;
        }
        if quadlet & feature_inq::ON_OFF != 0 {
            caps |= Caps::ON_OFF;
        }
        if kind == FeatureKind::Trigger {
            // the trigger register reuses the auto/manual positions
            if quadlet & feature_inq::POLARITY != 0 {
                caps |= Caps::POLARITY;
            }
        } else {
            if quadlet & feature_inq::AUTO != 0 {
                caps |= Caps::AUTO;
            }
            if quadlet & feature_inq::MANUAL != 0 {
                caps |= Caps::MANUAL;
            }
            if quadlet & feature_inq::ONE_PUSH != 0 {
                caps |= Caps::ONE_PUSH;
            }
        }

        let mut cached = CachedCaps {
            caps,
            min: (quadlet & feature_inq::MIN_MASK) >> feature_inq::MIN_SHIFT,
            max: quadlet & feature_inq::MAX_MASK,
            abs_csr: None,
            trigger_modes: Vec::new(),
            trigger_sources: Vec::new(),
        };

        if kind == FeatureKind::Trigger {
            for mode in TriggerMode::ALL {
                if quadlet & (1 << (feature_inq::TRIGGER_MODE_SHIFT - mode.number())) != 0 {
                    cached.trigger_modes.push(mode);
                }
            }
            for source in TriggerSource::ALL {
                if quadlet & (1 << (feature_inq::TRIGGER_SOURCE_SHIFT - source.number())) != 0 {
                    cached.trigger_sources.push(source);
                }
            }
        }

        if caps.contains(Caps::ABSOLUTE) {
            let quadlet_offset = self.read_reg(abs_offset(kind))?;
            if quadlet_offset == 0 {
                return Err(Error::TaggedRegisterNotFound);
            }
            cached.abs_csr = Some(quadlet_offset * 4);
        }

        self.feature_caps.insert(kind, cached.clone());
        Ok(cached)
    }

    fn present_caps(&mut self, kind: FeatureKind) -> Result<CachedCaps> {
        let caps = self.ensure_caps(kind)?;
        if !caps.caps.contains(Caps::PRESENT) {
            return Err(Error::InvalidFeature);
        }
        Ok(caps)
    }

    /// Collects descriptors for every feature the camera advertises.
    ///
    /// One decode pass over the full feature block: the two bank presence
    /// masks prune absent features without touching their registers.
    pub fn feature_set(&mut self) -> Result<Vec<FeatureInfo>> {
        let hi = self.read_reg(csr::FEATURE_HI_INQ)?;
        let lo = self.read_reg(csr::FEATURE_LO_INQ)?;

        let mut features = Vec::new();
        for kind in FeatureKind::ALL {
            let index = kind.index();
            let bank_bit = if index < 16 {
                hi & (1 << (31 - index))
            } else {
                lo & (1 << (31 - (index - 16)))
            };
            if bank_bit == 0 {
                continue;
            }
            match self.feature(kind) {
                Ok(info) if info.is_present() => features.push(info),
                Ok(_) => {}
                Err(Error::InvalidFeature) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(features)
    }

    /// Full descriptor of one feature.
    pub fn feature(&mut self, kind: FeatureKind) -> Result<FeatureInfo> {
        let cached = self.ensure_caps(kind)?;
        let quadlet = self.read_reg(val_offset(kind))?;

        let mode = if quadlet & feature_val::ONE_PUSH != 0 {
            FeatureMode::OnePushAuto
        } else if quadlet & feature_val::AUTO != 0 {
            FeatureMode::Auto
        } else {
            FeatureMode::Manual
        };

        let value = match kind {
            FeatureKind::WhiteBalance => Value::WhiteBalance {
                bu: (quadlet & feature_val::HI_VALUE_MASK) >> feature_val::HI_VALUE_SHIFT,
                rv: quadlet & feature_val::VALUE_MASK,
            },
            FeatureKind::WhiteShading => Value::WhiteShading {
                r: (quadlet >> 16) & 0xFF,
                g: (quadlet >> 8) & 0xFF,
                b: quadlet & 0xFF,
            },
            FeatureKind::Temperature => Value::Temperature {
                target: (quadlet & feature_val::HI_VALUE_MASK) >> feature_val::HI_VALUE_SHIFT,
                current: quadlet & feature_val::VALUE_MASK,
            },
            _ => Value::Single(quadlet & feature_val::VALUE_MASK),
        };

        let absolute = match cached.abs_csr {
            Some(base) => Some(Absolute {
                enabled: quadlet & feature_val::ABS_CONTROL != 0,
                min: f32::from_bits(self.read_reg(base)?),
                max: f32::from_bits(self.read_reg(base + 4)?),
                value: f32::from_bits(self.read_reg(base + 8)?),
            }),
            None => None,
        };

        let trigger = if kind == FeatureKind::Trigger {
            let mode_number =
                (quadlet & feature_val::TRIGGER_MODE_MASK) >> feature_val::TRIGGER_MODE_SHIFT;
            let source_number =
                (quadlet & feature_val::TRIGGER_SOURCE_MASK) >> feature_val::TRIGGER_SOURCE_SHIFT;
            Some(TriggerInfo {
                mode: TriggerMode::from_number(mode_number),
                source: TriggerSource::from_number(source_number),
                polarity: if cached.caps.contains(Caps::POLARITY) {
                    Some(if quadlet & feature_val::TRIGGER_POLARITY != 0 {
                        TriggerPolarity::ActiveHigh
                    } else {
                        TriggerPolarity::ActiveLow
                    })
                } else {
                    None
                },
                supported_modes: cached.trigger_modes.clone(),
                supported_sources: cached.trigger_sources.clone(),
            })
        } else {
            None
        };

        Ok(FeatureInfo {
            kind,
            caps: cached.caps,
            min: cached.min,
            max: cached.max,
            mode,
            is_on: quadlet & feature_val::ON_OFF != 0,
            value,
            absolute,
            trigger,
        })
    }

    pub fn feature_is_present(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::PRESENT))
    }

    pub fn feature_is_readable(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::READOUT))
    }

    pub fn feature_is_switchable(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::ON_OFF))
    }

    pub fn feature_has_auto(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::AUTO))
    }

    pub fn feature_has_manual(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::MANUAL))
    }

    pub fn feature_has_one_push(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::ONE_PUSH))
    }

    /// Raw value bounds of a feature, from the cached inquiry data.
    pub fn feature_boundaries(&mut self, kind: FeatureKind) -> Result<(u32, u32)> {
        let caps = self.present_caps(kind)?;
        Ok((caps.min, caps.max))
    }

    /// Live raw value of a single-channel feature.
    pub fn feature_value(&mut self, kind: FeatureKind) -> Result<u32> {
        let caps = self.present_caps(kind)?;
        if kind.is_multi_value() || !caps.caps.contains(Caps::READOUT) {
            return Err(Error::InvalidFeature);
        }
        Ok(self.read_reg(val_offset(kind))? & feature_val::VALUE_MASK)
    }

    /// Sets the raw value of a single-channel feature.
    ///
    /// The bounds are validated here even though callers are expected to
    /// query them first: the register field is 12 bits wide and would
    /// silently truncate anything larger.
    pub fn set_feature_value(&mut self, kind: FeatureKind, value: u32) -> Result<()> {
        let caps = self.present_caps(kind)?;
        if kind.is_multi_value() {
            return Err(Error::InvalidFeature);
        }
        if value < caps.min || value > caps.max {
            return Err(Error::ValueOutsideRange);
        }
        let offset = val_offset(kind);
        let quadlet = self.read_reg(offset)?;
        self.write_reg(offset, (quadlet & !feature_val::VALUE_MASK) | value)
    }

    pub fn feature_mode(&mut self, kind: FeatureKind) -> Result<FeatureMode> {
        self.present_caps(kind)?;
        let quadlet = self.read_reg(val_offset(kind))?;
        Ok(if quadlet & feature_val::ONE_PUSH != 0 {
            FeatureMode::OnePushAuto
        } else if quadlet & feature_val::AUTO != 0 {
            FeatureMode::Auto
        } else {
            FeatureMode::Manual
        })
    }

    pub fn set_feature_mode(&mut self, kind: FeatureKind, mode: FeatureMode) -> Result<()> {
        let caps = self.present_caps(kind)?;
        let supported = match mode {
            FeatureMode::Manual => caps.caps.contains(Caps::MANUAL),
            FeatureMode::Auto => caps.caps.contains(Caps::AUTO),
            FeatureMode::OnePushAuto => caps.caps.contains(Caps::ONE_PUSH),
        };
        if !supported {
            return Err(Error::InvalidFeature);
        }
        let offset = val_offset(kind);
        let quadlet = self.read_reg(offset)?;
        let quadlet = match mode {
            FeatureMode::Manual => quadlet & !(feature_val::AUTO | feature_val::ONE_PUSH),
            FeatureMode::Auto => (quadlet | feature_val::AUTO) & !feature_val::ONE_PUSH,
            // one-push is self-clearing on the camera side
            FeatureMode::OnePushAuto => (quadlet | feature_val::ONE_PUSH) & !feature_val::AUTO,
        };
        self.write_reg(offset, quadlet)
    }

    pub fn feature_power(&mut self, kind: FeatureKind) -> Result<bool> {
        self.present_caps(kind)?;
        Ok(self.read_reg(val_offset(kind))? & feature_val::ON_OFF != 0)
    }

    pub fn set_feature_power(&mut self, kind: FeatureKind, on: bool) -> Result<()> {
        let caps = self.present_caps(kind)?;
        if !caps.caps.contains(Caps::ON_OFF) {
            return Err(Error::InvalidFeature);
        }
        let offset = val_offset(kind);
        let quadlet = self.read_reg(offset)?;
        let quadlet = if on {
            quadlet | feature_val::ON_OFF
        } else {
            quadlet & !feature_val::ON_OFF
        };
        self.write_reg(offset, quadlet)
    }

    pub fn feature_has_absolute_control(&mut self, kind: FeatureKind) -> Result<bool> {
        Ok(self.ensure_caps(kind)?.caps.contains(Caps::ABSOLUTE))
    }

    fn absolute_base(&mut self, kind: FeatureKind) -> Result<u32> {
        let caps = self.present_caps(kind)?;
        caps.abs_csr.ok_or(Error::InvalidFeature)
    }

    /// Physical-unit value bounds of an absolute-capable feature.
    pub fn absolute_boundaries(&mut self, kind: FeatureKind) -> Result<(f32, f32)> {
        let base = self.absolute_base(kind)?;
        let min = f32::from_bits(self.read_reg(base)?);
        let max = f32::from_bits(self.read_reg(base + 4)?);
        Ok((min, max))
    }

    /// Whether absolute (physical unit) control is switched on.
    pub fn absolute_control(&mut self, kind: FeatureKind) -> Result<bool> {
        self.absolute_base(kind)?;
        Ok(self.read_reg(val_offset(kind))? & feature_val::ABS_CONTROL != 0)
    }

    pub fn set_absolute_control(&mut self, kind: FeatureKind, on: bool) -> Result<()> {
        self.absolute_base(kind)?;
        let offset = val_offset(kind);
        let quadlet = self.read_reg(offset)?;
        let quadlet = if on {
            quadlet | feature_val::ABS_CONTROL
        } else {
            quadlet & !feature_val::ABS_CONTROL
        };
        self.write_reg(offset, quadlet)
    }

    /// Live absolute value. Only valid while absolute control is enabled.
    pub fn absolute_value(&mut self, kind: FeatureKind) -> Result<f32> {
        let base = self.absolute_base(kind)?;
        if !self.absolute_control(kind)? {
            return Err(Error::InvalidFeature);
        }
        Ok(f32::from_bits(self.read_reg(base + 8)?))
    }

    pub fn set_absolute_value(&mut self, kind: FeatureKind, value: f32) -> Result<()> {
        let base = self.absolute_base(kind)?;
        if !self.absolute_control(kind)? {
            return Err(Error::InvalidFeature);
        }
        let min = f32::from_bits(self.read_reg(base)?);
        let max = f32::from_bits(self.read_reg(base + 4)?);
        if value < min || value > max {
            return Err(Error::ValueOutsideRange);
        }
        self.write_reg(base + 8, value.to_bits())
    }

    /// White balance blue/U and red/V channel values.
    pub fn whitebalance(&mut self) -> Result<(u32, u32)> {
        self.present_caps(FeatureKind::WhiteBalance)?;
        let quadlet = self.read_reg(val_offset(FeatureKind::WhiteBalance))?;
        Ok((
            (quadlet & feature_val::HI_VALUE_MASK) >> feature_val::HI_VALUE_SHIFT,
            quadlet & feature_val::VALUE_MASK,
        ))
    }

    pub fn set_whitebalance(&mut self, bu: u32, rv: u32) -> Result<()> {
        let caps = self.present_caps(FeatureKind::WhiteBalance)?;
        if bu < caps.min || bu > caps.max || rv < caps.min || rv > caps.max {
            return Err(Error::ValueOutsideRange);
        }
        let offset = val_offset(FeatureKind::WhiteBalance);
        let quadlet = self.read_reg(offset)?;
        let quadlet = (quadlet & !(feature_val::HI_VALUE_MASK | feature_val::VALUE_MASK))
            | (bu << feature_val::HI_VALUE_SHIFT)
            | rv;
        self.write_reg(offset, quadlet)
    }

    /// White shading red/green/blue channel values.
    pub fn whiteshading(&mut self) -> Result<(u32, u32, u32)> {
        self.present_caps(FeatureKind::WhiteShading)?;
        let quadlet = self.read_reg(val_offset(FeatureKind::WhiteShading))?;
        Ok(((quadlet >> 16) & 0xFF, (quadlet >> 8) & 0xFF, quadlet & 0xFF))
    }

    pub fn set_whiteshading(&mut self, r: u32, g: u32, b: u32) -> Result<()> {
        self.present_caps(FeatureKind::WhiteShading)?;
        if r > 0xFF || g > 0xFF || b > 0xFF {
            return Err(Error::ValueOutsideRange);
        }
        let offset = val_offset(FeatureKind::WhiteShading);
        let quadlet = self.read_reg(offset)?;
        self.write_reg(offset, (quadlet & 0xFF00_0000) | (r << 16) | (g << 8) | b)
    }

    /// Target and current temperature.
    pub fn temperature(&mut self) -> Result<(u32, u32)> {
        self.present_caps(FeatureKind::Temperature)?;
        let quadlet = self.read_reg(val_offset(FeatureKind::Temperature))?;
        Ok((
            (quadlet & feature_val::HI_VALUE_MASK) >> feature_val::HI_VALUE_SHIFT,
            quadlet & feature_val::VALUE_MASK,
        ))
    }

    pub fn set_temperature(&mut self, target: u32) -> Result<()> {
        let caps = self.present_caps(FeatureKind::Temperature)?;
        if target < caps.min || target > caps.max {
            return Err(Error::ValueOutsideRange);
        }
        let offset = val_offset(FeatureKind::Temperature);
        let quadlet = self.read_reg(offset)?;
        self.write_reg(
            offset,
            (quadlet & !feature_val::HI_VALUE_MASK) | (target << feature_val::HI_VALUE_SHIFT),
        )
    }

    // external trigger

    pub fn trigger_supported_modes(&mut self) -> Result<Vec<TriggerMode>> {
        Ok(self.present_caps(FeatureKind::Trigger)?.trigger_modes)
    }

    pub fn trigger_supported_sources(&mut self) -> Result<Vec<TriggerSource>> {
        Ok(self.present_caps(FeatureKind::Trigger)?.trigger_sources)
    }

    pub fn trigger_has_polarity(&mut self) -> Result<bool> {
        Ok(self.ensure_caps(FeatureKind::Trigger)?.caps.contains(Caps::POLARITY))
    }

    pub fn trigger_polarity(&mut self) -> Result<TriggerPolarity> {
        let caps = self.present_caps(FeatureKind::Trigger)?;
        if !caps.caps.contains(Caps::POLARITY) {
            return Err(Error::FunctionNotSupported);
        }
        let quadlet = self.read_reg(val_offset(FeatureKind::Trigger))?;
        Ok(if quadlet & feature_val::TRIGGER_POLARITY != 0 {
            TriggerPolarity::ActiveHigh
        } else {
            TriggerPolarity::ActiveLow
        })
    }

    pub fn set_trigger_polarity(&mut self, polarity: TriggerPolarity) -> Result<()> {
        let caps = self.present_caps(FeatureKind::Trigger)?;
        if !caps.caps.contains(Caps::POLARITY) {
            return Err(Error::FunctionNotSupported);
        }
        let offset = val_offset(FeatureKind::Trigger);
        let quadlet = self.read_reg(offset)?;
        let quadlet = match polarity {
            TriggerPolarity::ActiveHigh => quadlet | feature_val::TRIGGER_POLARITY,
            TriggerPolarity::ActiveLow => quadlet & !feature_val::TRIGGER_POLARITY,
        };
        self.write_reg(offset, quadlet)
    }

    pub fn trigger_power(&mut self) -> Result<bool> {
        self.feature_power(FeatureKind::Trigger)
    }

    pub fn set_trigger_power(&mut self, on: bool) -> Result<()> {
        self.set_feature_power(FeatureKind::Trigger, on)
    }

    pub fn trigger_mode(&mut self) -> Result<TriggerMode> {
        self.present_caps(FeatureKind::Trigger)?;
        let quadlet = self.read_reg(val_offset(FeatureKind::Trigger))?;
        let number = (quadlet & feature_val::TRIGGER_MODE_MASK) >> feature_val::TRIGGER_MODE_SHIFT;
        TriggerMode::from_number(number).ok_or(Error::InvalidTriggerMode)
    }

    /// Selects the external trigger mode.
    ///
    /// The requested mode must be a member of the camera-reported supported
    /// set; nothing is written otherwise.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<()> {
        let caps = self.present_caps(FeatureKind::Trigger)?;
        if !caps.trigger_modes.contains(&mode) {
            return Err(Error::InvalidTriggerMode);
        }
        let offset = val_offset(FeatureKind::Trigger);
        let quadlet = self.read_reg(offset)?;
        let quadlet = (quadlet & !feature_val::TRIGGER_MODE_MASK)
            | (mode.number() << feature_val::TRIGGER_MODE_SHIFT);
        self.write_reg(offset, quadlet)
    }

    pub fn trigger_source(&mut self) -> Result<TriggerSource> {
        self.present_caps(FeatureKind::Trigger)?;
        let quadlet = self.read_reg(val_offset(FeatureKind::Trigger))?;
        let number =
            (quadlet & feature_val::TRIGGER_SOURCE_MASK) >> feature_val::TRIGGER_SOURCE_SHIFT;
        TriggerSource::from_number(number).ok_or(Error::InvalidTriggerSource)
    }

    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<()> {
        let caps = self.present_caps(FeatureKind::Trigger)?;
        if !caps.trigger_sources.contains(&source) {
            return Err(Error::InvalidTriggerSource);
        }
        let offset = val_offset(FeatureKind::Trigger);
        let quadlet = self.read_reg(offset)?;
        let quadlet = (quadlet & !feature_val::TRIGGER_SOURCE_MASK)
            | (source.number() << feature_val::TRIGGER_SOURCE_SHIFT);
        self.write_reg(offset, quadlet)
    }

    /// Whether the software trigger is raised.
    pub fn software_trigger(&mut self) -> Result<bool> {
        Ok(self.read_reg(csr::SOFT_TRIGGER)? & csr::ON != 0)
    }

    pub fn set_software_trigger(&mut self, on: bool) -> Result<()> {
        self.write_reg(csr::SOFT_TRIGGER, if on { csr::ON } else { 0 })
    }
}
