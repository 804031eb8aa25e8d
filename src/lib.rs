//! Safe IIDC/DCAM camera control and capture.
//!
//! This crate talks the IIDC register protocol to machine-vision cameras on
//! a serial bus: typed feature control (exposure, gain, white balance, ..),
//! video mode and framerate negotiation, scalable Format7 region-of-interest
//! setup and isochronous frame capture through a ring of DMA buffers.
//!
//! Bus enumeration and the raw quadlet transport are not part of this
//! crate; discovery yields an identified camera plus an implementation of
//! [`RegisterTransport`] and [`IsoDevice`], and [`Camera::open`] takes it
//! from there.

pub mod camera;
pub use camera::{capture_set, Camera, Format7Mode, IidcVersion, Info, RoiValue};

pub mod capture;
pub use capture::{CaptureState, DropPolicy, Policy};

pub mod color;
pub use color::{ColorCoding, ColorFilter};

pub mod csr;

pub mod error;
pub use error::{Error, Result};

pub mod feature;
pub use feature::{
    Absolute, Caps, FeatureInfo, FeatureKind, FeatureMode, TriggerInfo, TriggerMode,
    TriggerPolarity, TriggerSource, Value,
};

pub mod framerate;
pub use framerate::Framerate;

pub mod iso;
pub use iso::{FrameInfo, IsoDevice, Reservation};

pub mod mode;
pub use mode::VideoMode;

pub mod speed;
pub use speed::{IsoSpeed, OperationMode};

pub mod timestamp;
pub use timestamp::Timestamp;

pub mod transport;
pub use transport::RegisterTransport;
