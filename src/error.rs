/// Outcome of a fallible camera operation.
///
/// The set is closed: every failure a camera, transport or capture path can
/// produce maps to exactly one variant. Transport adapters are expected to
/// normalize bus faults into this type before they reach the core, so
/// callers never observe raw bus error values.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("general failure")]
    Failure,
    #[error("no frame available")]
    NoFrame,
    #[error("no camera")]
    NoCamera,
    #[error("node is not a camera")]
    NotACamera,
    #[error("function not supported by this camera")]
    FunctionNotSupported,
    #[error("camera not initialized")]
    CameraNotInitialized,
    #[error("invalid feature")]
    InvalidFeature,
    #[error("invalid video format")]
    InvalidFormat,
    #[error("invalid video mode")]
    InvalidMode,
    #[error("invalid framerate")]
    InvalidFramerate,
    #[error("invalid trigger mode")]
    InvalidTriggerMode,
    #[error("invalid trigger source")]
    InvalidTriggerSource,
    #[error("invalid ISO speed")]
    InvalidIsoSpeed,
    #[error("invalid IIDC version")]
    InvalidIidcVersion,
    #[error("invalid color coding")]
    InvalidColorCoding,
    #[error("invalid color filter")]
    InvalidColorFilter,
    #[error("requested value is out of range")]
    ValueOutsideRange,
    #[error("invalid error code")]
    InvalidErrorCode,
    #[error("memory allocation failure")]
    MemoryAllocationFailure,
    #[error("tagged register not found")]
    TaggedRegisterNotFound,
    #[error("format7 error flag 1 set")]
    Format7ErrorFlag1,
    #[error("format7 error flag 2 set")]
    Format7ErrorFlag2,
    #[error("invalid bayer method")]
    InvalidBayerMethod,
    #[error("handle creation failure")]
    HandleCreationFailure,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid capture device")]
    InvalidCaptureDevice,
    #[error("no ISO channel available")]
    NoIsoChannel,
    #[error("no bandwidth available")]
    NoBandwidth,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this outcome is informational rather than a real failure.
    ///
    /// Currently only [`Error::NoFrame`], reported by polling capture when no
    /// buffer is ready yet.
    pub fn is_informational(&self) -> bool {
        matches!(self, Error::NoFrame)
    }

    /// Legacy numeric code of this outcome.
    ///
    /// Informational codes are negative, failures positive, zero is success
    /// and therefore never produced by an `Error`.
    pub fn code(&self) -> i32 {
        match self {
            Error::Failure => 1,
            Error::NoFrame => -2,
            Error::NoCamera => 3,
            Error::NotACamera => 4,
            Error::FunctionNotSupported => 5,
            Error::CameraNotInitialized => 6,
            Error::InvalidFeature => 7,
            Error::InvalidFormat => 8,
            Error::InvalidMode => 9,
            Error::InvalidFramerate => 10,
            Error::InvalidTriggerMode => 11,
            Error::InvalidTriggerSource => 12,
            Error::InvalidIsoSpeed => 13,
            Error::InvalidIidcVersion => 14,
            Error::InvalidColorCoding => 15,
            Error::InvalidColorFilter => 16,
            Error::ValueOutsideRange => 17,
            Error::InvalidErrorCode => 18,
            Error::MemoryAllocationFailure => 19,
            Error::TaggedRegisterNotFound => 20,
            Error::Format7ErrorFlag1 => 21,
            Error::Format7ErrorFlag2 => 22,
            Error::InvalidBayerMethod => 23,
            Error::HandleCreationFailure => 24,
            Error::InvalidArgument => 25,
            Error::InvalidCaptureDevice => 26,
            Error::NoIsoChannel => 27,
            Error::NoBandwidth => 28,
        }
    }

    /// Decodes a legacy numeric code.
    ///
    /// Zero decodes to success. Codes outside the known set are normalized
    /// to [`Error::InvalidErrorCode`] so a caller can always index a
    /// description table safely.
    pub fn from_code(code: i32) -> Result<()> {
        match code {
            0 => Ok(()),
            1 => Err(Error::Failure),
            -2 => Err(Error::NoFrame),
            3 => Err(Error::NoCamera),
            4 => Err(Error::NotACamera),
            5 => Err(Error::FunctionNotSupported),
            6 => Err(Error::CameraNotInitialized),
            7 => Err(Error::InvalidFeature),
            8 => Err(Error::InvalidFormat),
            9 => Err(Error::InvalidMode),
            10 => Err(Error::InvalidFramerate),
            11 => Err(Error::InvalidTriggerMode),
            12 => Err(Error::InvalidTriggerSource),
            13 => Err(Error::InvalidIsoSpeed),
            14 => Err(Error::InvalidIidcVersion),
            15 => Err(Error::InvalidColorCoding),
            16 => Err(Error::InvalidColorFilter),
            17 => Err(Error::ValueOutsideRange),
            18 => Err(Error::InvalidErrorCode),
            19 => Err(Error::MemoryAllocationFailure),
            20 => Err(Error::TaggedRegisterNotFound),
            21 => Err(Error::Format7ErrorFlag1),
            22 => Err(Error::Format7ErrorFlag2),
            23 => Err(Error::InvalidBayerMethod),
            24 => Err(Error::HandleCreationFailure),
            25 => Err(Error::InvalidArgument),
            26 => Err(Error::InvalidCaptureDevice),
            27 => Err(Error::NoIsoChannel),
            28 => Err(Error::NoBandwidth),
            _ => Err(Error::InvalidErrorCode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        let all = [
            Error::Failure,
            Error::NoFrame,
            Error::NoCamera,
            Error::NotACamera,
            Error::FunctionNotSupported,
            Error::CameraNotInitialized,
            Error::InvalidFeature,
            Error::InvalidFormat,
            Error::InvalidMode,
            Error::InvalidFramerate,
            Error::InvalidTriggerMode,
            Error::InvalidTriggerSource,
            Error::InvalidIsoSpeed,
            Error::InvalidIidcVersion,
            Error::InvalidColorCoding,
            Error::InvalidColorFilter,
            Error::ValueOutsideRange,
            Error::InvalidErrorCode,
            Error::MemoryAllocationFailure,
            Error::TaggedRegisterNotFound,
            Error::Format7ErrorFlag1,
            Error::Format7ErrorFlag2,
            Error::InvalidBayerMethod,
            Error::HandleCreationFailure,
            Error::InvalidArgument,
            Error::InvalidCaptureDevice,
            Error::NoIsoChannel,
            Error::NoBandwidth,
        ];
        for e in all {
            assert_eq!(Error::from_code(e.code()), Err(e));
        }
    }

    #[test]
    fn unknown_codes_normalize() {
        assert_eq!(Error::from_code(2), Err(Error::InvalidErrorCode));
        assert_eq!(Error::from_code(-1), Err(Error::InvalidErrorCode));
        assert_eq!(Error::from_code(29), Err(Error::InvalidErrorCode));
        assert_eq!(Error::from_code(1234), Err(Error::InvalidErrorCode));
        assert_eq!(Error::from_code(0), Ok(()));
    }

    #[test]
    fn no_frame_is_informational() {
        assert!(Error::NoFrame.is_informational());
        assert!(!Error::Failure.is_informational());
        assert!(Error::NoFrame.code() < 0);
    }
}
