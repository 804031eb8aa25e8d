//! In-memory camera simulation backing the integration tests.
//!
//! `SimBus` plays both external roles a [`iidc::Camera`] consumes: the
//! quadlet register transport and the isochronous streaming device. The
//! register file models the camera-side behavior the crate relies on
//! (inquiry layouts, Format7 derived values recomputed on commit), and the
//! streaming side hands out synthetic frames on demand.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use iidc::csr::{self, format7 as f7};
use iidc::{
    Camera, Error, FrameInfo, IidcVersion, Info, IsoDevice, RegisterTransport, Result, Timestamp,
};

pub const F7_BASE: u32 = 0x8000;

/// Resource accounting shared with the test after the camera consumed the
/// bus.
#[derive(Debug, Default)]
pub struct Stats {
    pub reserves: usize,
    pub releases: usize,
    pub active: i32,
}

struct Ring {
    frames: Vec<Vec<u8>>,
    fill_times: Vec<i64>,
    free: VecDeque<usize>,
    ready: VecDeque<usize>,
}

pub struct SimBus {
    regs: HashMap<u32, u32>,
    pub stats: Rc<RefCell<Stats>>,
    broadcast: bool,
    /// Every register write with the broadcast flag it was issued under.
    pub write_log: Vec<(u32, u32, bool)>,
    ring: Option<Ring>,
    fill_counter: i64,
    /// Make the next `arm` call fail, to exercise setup unwinding.
    pub fail_arm: bool,
}

fn coding_bits_per_pixel(index: u32) -> u32 {
    match index {
        0 | 9 => 8,        // MONO8, RAW8
        1 => 12,           // YUV411
        2 | 5 | 7 | 10 => 16, // YUV422, MONO16, MONO16S, RAW16
        3 | 4 => 24,       // YUV444, RGB8
        _ => 48,           // RGB16, RGB16S
    }
}

impl SimBus {
    pub fn new() -> Self {
        let mut bus = SimBus {
            regs: HashMap::new(),
            stats: Rc::new(RefCell::new(Stats::default())),
            broadcast: false,
            write_log: Vec::new(),
            ring: None,
            fill_counter: 0,
            fail_arm: false,
        };

        // one-shot, multi-shot, power switch, 1394b, 3 memory channels
        bus.set_reg(
            csr::BASIC_FUNC_INQ,
            csr::basic_func::ONE_SHOT
                | csr::basic_func::MULTI_SHOT
                | csr::basic_func::POWER_CNTL
                | csr::basic_func::B_MODE
                | 3,
        );

        // formats 0 and 7
        bus.set_reg(csr::V_FORMAT_INQ, (1 << 31) | (1 << 24));
        // format 0: modes 0..=6
        bus.set_reg(csr::V_MODE_INQ_BASE, 0xFE00_0000);
        // format 7: slot 0 only
        bus.set_reg(csr::V_MODE_INQ_BASE + 4 * 7, 1 << 31);
        bus.set_reg(csr::V_CSR_INQ_7_BASE, F7_BASE / 4);

        // framerates per format-0 mode: 7.5/15/30/60 for MONO8 (mode 5),
        // exactly 15/30 for MONO16 (mode 6), 15/30/60 elsewhere
        for mode in 0..7u32 {
            let mask = match mode {
                5 => rate_bits(&[2, 3, 4, 5]),
                6 => rate_bits(&[3, 4]),
                _ => rate_bits(&[3, 4, 5]),
            };
            bus.set_reg(csr::V_RATE_INQ_BASE + 4 * mode, mask);
        }

        // current selection: 640x480 MONO8 at 15 fps, S400
        bus.set_reg(csr::CUR_V_FORMAT, 0);
        bus.set_reg(csr::CUR_V_MODE, 5 << 29);
        bus.set_reg(csr::CUR_V_FRM_RATE, 3 << 29);
        bus.set_reg(csr::ISO_DATA, 2 << 24);

        // feature banks: brightness, white balance, shutter, trigger
        bus.set_reg(
            csr::FEATURE_HI_INQ,
            (1 << 31) | (1 << (31 - 3)) | (1 << (31 - 7)) | (1 << (31 - 12)),
        );
        bus.set_reg(csr::FEATURE_LO_INQ, 0);

        use iidc::csr::feature_inq as fi;
        // brightness: full manual/auto control, 0..=255
        bus.set_reg(
            0x500,
            fi::PRESENT | fi::READOUT | fi::ON_OFF | fi::AUTO | fi::MANUAL | fi::ONE_PUSH | 0xFF,
        );
        bus.set_reg(0x800, csr::feature_val::PRESENT | 128);

        // white balance: manual only, 0..=255
        bus.set_reg(0x50C, fi::PRESENT | fi::READOUT | fi::ON_OFF | fi::MANUAL | 0xFF);
        bus.set_reg(0x80C, csr::feature_val::PRESENT | (64 << 12) | 32);

        // shutter: manual with absolute control, 2..=1000
        bus.set_reg(
            0x51C,
            fi::PRESENT | fi::READOUT | fi::MANUAL | fi::ABSOLUTE | (2 << 12) | 1000,
        );
        bus.set_reg(0x81C, csr::feature_val::PRESENT | 500);
        // absolute CSR block for shutter at 0x9000
        bus.set_reg(csr::FEATURE_ABS_HI_BASE + 4 * 7, 0x9000 / 4);
        bus.set_reg(0x9000, (1.0e-4f32).to_bits());
        bus.set_reg(0x9004, (1.0f32).to_bits());
        bus.set_reg(0x9008, (0.01f32).to_bits());

        // trigger: on/off + polarity, modes {0, 1, 14}, sources {0, 2}
        bus.set_reg(
            0x530,
            fi::PRESENT
                | fi::READOUT
                | fi::ON_OFF
                | fi::POLARITY
                | (1 << 15)
                | (1 << 14)
                | (1 << 1)
                | (1 << 23)
                | (1 << 21),
        );
        bus.set_reg(0x830, csr::feature_val::PRESENT);

        // Format7 slot 0: 1024x768 max, units 8x2, position units 2x2
        bus.set_reg(F7_BASE + f7::MAX_IMAGE_SIZE_INQ, (1024 << 16) | 768);
        bus.set_reg(F7_BASE + f7::UNIT_SIZE_INQ, (8 << 16) | 2);
        bus.set_reg(F7_BASE + f7::UNIT_POSITION_INQ, (2 << 16) | 2);
        bus.set_reg(F7_BASE + f7::IMAGE_POSITION, 0);
        bus.set_reg(F7_BASE + f7::IMAGE_SIZE, (1024 << 16) | 768);
        // MONO8, MONO16, RAW8
        bus.set_reg(F7_BASE + f7::COLOR_CODING_ID, 0);
        bus.set_reg(
            F7_BASE + f7::COLOR_CODING_INQ,
            (1 << 31) | (1 << (31 - 5)) | (1 << (31 - 9)),
        );
        bus.set_reg(F7_BASE + f7::PACKET_PARA_INQ, (64 << 16) | 4096);
        bus.set_reg(F7_BASE + f7::BYTE_PER_PACKET, (4096 << 16) | 2048);
        bus.set_reg(F7_BASE + f7::COLOR_FILTER_ID, 0);
        bus.set_reg(F7_BASE + f7::DATA_DEPTH_INQ, 8 << 24);
        bus.set_reg(F7_BASE + f7::VALUE_SETTING, f7::SETTING_PRESENT);
        bus.recompute_format7();

        bus
    }

    pub fn set_reg(&mut self, offset: u32, value: u32) {
        self.regs.insert(offset, value);
    }

    pub fn reg(&self, offset: u32) -> u32 {
        *self.regs.get(&offset).unwrap_or(&0)
    }

    /// Recomputes the derived Format7 registers the way the camera would
    /// after a geometry or coding update.
    fn recompute_format7(&mut self) {
        let size = self.reg(F7_BASE + f7::IMAGE_SIZE);
        let (width, height) = (size >> 16, size & 0xFFFF);
        let coding = self.reg(F7_BASE + f7::COLOR_CODING_ID) >> 24;
        let pixels = width * height;
        let total = u64::from(pixels) * u64::from(coding_bits_per_pixel(coding)) / 8;
        self.set_reg(F7_BASE + f7::PIXEL_NUMBER_INQ, pixels);
        self.set_reg(F7_BASE + f7::TOTAL_BYTES_HI_INQ, (total >> 32) as u32);
        self.set_reg(F7_BASE + f7::TOTAL_BYTES_LO_INQ, total as u32);
    }

    /// Makes the hardware side deposit one filled frame into the ring.
    /// Returns the slot used, or `None` when every slot is busy.
    pub fn produce_frame(&mut self) -> Option<usize> {
        self.fill_counter += 1;
        let fill = self.fill_counter;
        let ring = self.ring.as_mut()?;
        let slot = ring.free.pop_front()?;
        for byte in ring.frames[slot].iter_mut() {
            *byte = fill as u8;
        }
        ring.fill_times[slot] = fill;
        ring.ready.push_back(slot);
        Some(slot)
    }

    fn take_ready(&mut self) -> Option<FrameInfo> {
        let ring = self.ring.as_mut()?;
        let slot = ring.ready.pop_front()?;
        Some(FrameInfo {
            slot,
            fill_time: Timestamp::new(ring.fill_times[slot], 0),
        })
    }
}

impl RegisterTransport for SimBus {
    fn read(&mut self, offset: u32) -> Result<u32> {
        Ok(self.reg(offset))
    }

    fn write(&mut self, offset: u32, value: u32) -> Result<()> {
        self.write_log.push((offset, value, self.broadcast));
        if offset == F7_BASE + f7::VALUE_SETTING {
            if value & f7::SETTING_1 != 0 {
                // latch: recompute derived values, report no errors
                self.recompute_format7();
                self.set_reg(F7_BASE + f7::VALUE_SETTING, f7::SETTING_PRESENT);
            }
            return Ok(());
        }
        self.regs.insert(offset, value);
        Ok(())
    }

    fn set_broadcast(&mut self, on: bool) -> Result<()> {
        self.broadcast = on;
        Ok(())
    }
}

impl IsoDevice for SimBus {
    fn reserve(&mut self, channel: Option<u8>, _bandwidth: u32) -> Result<u8> {
        let mut stats = self.stats.borrow_mut();
        stats.reserves += 1;
        stats.active += 1;
        Ok(channel.unwrap_or(1))
    }

    fn release(&mut self, _channel: u8) -> Result<()> {
        let mut stats = self.stats.borrow_mut();
        stats.releases += 1;
        stats.active -= 1;
        Ok(())
    }

    fn arm(&mut self, count: usize, frame_size: usize) -> Result<()> {
        if self.fail_arm {
            return Err(Error::InvalidCaptureDevice);
        }
        self.ring = Some(Ring {
            frames: vec![vec![0u8; frame_size]; count],
            fill_times: vec![0; count],
            free: (0..count).collect(),
            ready: VecDeque::new(),
        });
        Ok(())
    }

    fn disarm(&mut self) -> Result<()> {
        self.ring = None;
        Ok(())
    }

    fn poll_ready(&mut self) -> Result<Option<FrameInfo>> {
        Ok(self.take_ready())
    }

    fn wait_ready(&mut self) -> Result<FrameInfo> {
        // hardware always produces eventually; synthesize when idle
        if let Some(frame) = self.take_ready() {
            return Ok(frame);
        }
        self.produce_frame().ok_or(Error::NoFrame)?;
        self.take_ready().ok_or(Error::NoFrame)
    }

    fn frame_data(&self, slot: usize) -> &[u8] {
        &self.ring.as_ref().expect("ring not armed").frames[slot]
    }

    fn requeue(&mut self, slot: usize) -> Result<()> {
        let ring = self.ring.as_mut().ok_or(Error::InvalidCaptureDevice)?;
        ring.free.push_back(slot);
        Ok(())
    }
}

fn rate_bits(indices: &[u32]) -> u32 {
    indices.iter().fold(0, |mask, i| mask | (1 << (31 - i)))
}

pub fn sim_info() -> Info {
    Info {
        port: 0,
        node: 1,
        guid: 0x0814_4370_0000_0042,
        vendor: "ACME Vision".into(),
        model: "AV-1394".into(),
        vendor_id: 0x081443,
        model_id: 0x70,
        iidc_version: IidcVersion::V1_31,
    }
}

pub fn open_sim() -> Camera<SimBus> {
    Camera::open(SimBus::new(), sim_info()).expect("open simulated camera")
}
