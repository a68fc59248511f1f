pub mod checksum;
mod packet;
pub mod payload;
mod sensor;
mod unit;

pub use codec::Direction;
pub use packet::Packet;
pub use payload::{
    I2cSettings,
    Message,
    MotorCommand,
    MotorCommands,
    SensorTypes,
    Tag,
    Values,
};
pub use sensor::{
    ParseSensorTypeError,
    SensorTable,
    SensorType,
};
pub use unit::UnitAddress;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("bit width {0} outside 0..=32")]
    InvalidWidth(u32),

    #[error("sensor type {0} has no value encoding")]
    UnsupportedSensorType(SensorType),

    #[error("unknown sensor type code {0}")]
    UnknownSensorCode(u8),

    #[error("field at bit {offset} (width {width}) overruns {len}-byte payload")]
    MalformedHeader {
        offset: usize,
        width:  u32,
        len:    usize,
    },

    #[error("frame too short to hold its header")]
    TruncatedHeader,

    #[error("declared byte count {declared} but {actual} bytes followed")]
    LengthMismatch {
        declared: u8,
        actual:   usize,
    },

    #[error("unknown acknowledgement type {0}")]
    UnknownAckType(u8),

    #[error("unknown command type {0}")]
    UnknownCommandType(u8),

    #[error("checksum mismatch (received {received:#04x}, computed {computed:#04x})")]
    ChecksumMismatch {
        received: u8,
        computed: u8,
    },

    #[error("{len}-byte payload is invalid for message type {tag}")]
    PayloadLength {
        tag: u8,
        len: usize,
    },

    #[error("{what} {value} out of range")]
    OutOfRange {
        what:  &'static str,
        value: i64,
    },
}

impl Error {
    /// Errors caused by a corrupted or unintelligible frame. The transport discards such frames
    /// and retries; everything else indicates a bug on the host side.
    pub fn is_frame_invalid(&self) -> bool {
        matches!(
            self,
            Error::TruncatedHeader
                | Error::LengthMismatch { .. }
                | Error::UnknownAckType(_)
                | Error::UnknownCommandType(_)
                | Error::ChecksumMismatch { .. }
                | Error::PayloadLength { .. }
                | Error::UnknownSensorCode(_)
        )
    }
}

impl From<codec::bits::Error> for Error {
    fn from(e: codec::bits::Error) -> Self {
        match e {
            codec::bits::Error::InvalidWidth(width) => Error::InvalidWidth(width),
            codec::bits::Error::OutOfBounds {
                offset,
                width,
                len,
            } => Error::MalformedHeader {
                offset,
                width,
                len,
            },
        }
    }
}
