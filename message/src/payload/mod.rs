use std::fmt::{
    Display,
    Formatter,
};

use bytes::Bytes;

use crate::{
    checksum,
    Error,
    SensorTable,
    UnitAddress,
};

mod motor;
mod sensors;
mod values;

pub use motor::{
    MotorCommand,
    MotorCommands,
    MAX_POWER,
};
pub use sensors::{
    I2cSettings,
    SensorTypes,
};
pub use values::Values;

/// Message type tags. Bare acknowledgements echo the tag of the command they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tag {
    AddressChange = 1,
    SensorTypes   = 2,
    Values        = 3,
    EmergencyStop = 4,
    Timeout       = 5,
}

impl Tag {
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Tag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let tag = match value {
            1 => Tag::AddressChange,
            2 => Tag::SensorTypes,
            3 => Tag::Values,
            4 => Tag::EmergencyStop,
            5 => Tag::Timeout,
            other => return Err(Error::UnknownCommandType(other)),
        };

        Ok(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Message {
    /// Reassign the receiving unit's address.
    AddressChange { address: UnitAddress },

    EmergencyStop,

    SensorTypes(SensorTypes),

    /// Push motor commands; answered by [`Message::AckValues`].
    Values(MotorCommands),

    /// Command accepted.
    Ack { tag: u8, origin: UnitAddress },

    /// Fresh encoder and sensor readings. The payload can only be interpreted against the sensor
    /// types last declared to `origin`; see [`Message::values`].
    AckValues { origin: UnitAddress, payload: Bytes },

    /// Stop the motors if no command arrives for this long.
    Timeout { millis: u32 },
}

impl Message {
    #[inline]
    pub fn tag(&self) -> u8 {
        match self {
            Message::AddressChange {
                ..
            } => Tag::AddressChange.byte(),
            Message::EmergencyStop => Tag::EmergencyStop.byte(),
            Message::SensorTypes(_) => Tag::SensorTypes.byte(),
            Message::Values(_) | Message::AckValues {
                ..
            } => Tag::Values.byte(),
            Message::Ack {
                tag, ..
            } => *tag,
            Message::Timeout {
                ..
            } => Tag::Timeout.byte(),
        }
    }

    /// Payload bytes, not including the type tag.
    pub fn payload(&self) -> Result<Vec<u8>, Error> {
        let payload = match self {
            Message::AddressChange {
                address,
            } => vec![address.get()],
            Message::EmergencyStop
            | Message::Ack {
                ..
            } => vec![],
            Message::SensorTypes(types) => types.encode()?,
            Message::Values(motors) => motors.encode()?.to_vec(),
            Message::AckValues {
                payload, ..
            } => payload.to_vec(),
            Message::Timeout {
                millis,
            } => millis.to_le_bytes().to_vec(),
        };

        Ok(payload)
    }

    /// Type tag plus payload.
    #[inline]
    pub fn byte_count(&self) -> Result<usize, Error> {
        Ok(self.payload()?.len() + 1)
    }

    #[inline]
    pub fn byte_sum(&self) -> Result<u8, Error> {
        Ok(checksum::message_sum(self.tag(), &self.payload()?))
    }

    /// Decode a host-originated message.
    pub fn decode_command(tag: u8, payload: &[u8]) -> Result<Self, Error> {
        let invalid = || Error::PayloadLength {
            tag,
            len: payload.len(),
        };

        let message = match Tag::try_from(tag)? {
            Tag::AddressChange => match payload {
                [address] => Message::AddressChange {
                    address: UnitAddress(*address),
                },
                _ => return Err(invalid()),
            },
            Tag::EmergencyStop if payload.is_empty() => Message::EmergencyStop,
            Tag::EmergencyStop => return Err(invalid()),
            Tag::SensorTypes => Message::SensorTypes(SensorTypes::decode(payload)?),
            Tag::Values => Message::Values(MotorCommands::decode(payload)?),
            Tag::Timeout => {
                let bytes: [u8; 4] = payload.try_into().map_err(|_| invalid())?;

                Message::Timeout {
                    millis: u32::from_le_bytes(bytes),
                }
            },
        };

        Ok(message)
    }

    /// Decode a board-originated message. Replies carry no address, so `origin` is
    /// [`UnitAddress::BROADCAST`] until the caller stamps it with [`Message::with_origin`].
    pub fn decode_reply(tag: u8, payload: &[u8]) -> Result<Self, Error> {
        if payload.is_empty() {
            return Ok(Message::Ack {
                tag,
                origin: UnitAddress::BROADCAST,
            });
        }

        if tag != Tag::Values.byte() {
            return Err(Error::UnknownAckType(tag));
        }

        Ok(Message::AckValues {
            origin:  UnitAddress::BROADCAST,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        matches!(self, Message::Ack { .. } | Message::AckValues { .. })
    }

    #[inline]
    pub fn origin(&self) -> Option<UnitAddress> {
        match self {
            Message::Ack {
                origin, ..
            }
            | Message::AckValues {
                origin, ..
            } => Some(*origin),
            _ => None,
        }
    }

    /// Attribute a reply to the unit it came from. Commands are returned unchanged.
    pub fn with_origin(mut self, unit: UnitAddress) -> Self {
        if let Message::Ack {
            origin, ..
        }
        | Message::AckValues {
            origin, ..
        } = &mut self
        {
            *origin = unit;
        }

        self
    }

    /// Interpret an ack-with-values payload against the sensor types declared to its origin.
    /// `None` for every other message.
    pub fn values(&self, sensors: &SensorTable) -> Result<Option<Values>, Error> {
        match self {
            Message::AckValues {
                origin,
                payload,
            } => Values::decode(payload, sensors.get(*origin)).map(Some),
            _ => Ok(None),
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::AddressChange {
                address,
            } => write!(f, "address change -> {address}"),
            Message::EmergencyStop => write!(f, "emergency stop"),
            Message::SensorTypes(SensorTypes([s0, s1])) => write!(f, "sensor types [{s0}, {s1}]"),
            Message::Values(MotorCommands([m0, m1])) => {
                let fmt_motor = |m: &Option<MotorCommand>| match m {
                    Some(cmd) => cmd.power().to_string(),
                    None => "off".to_owned(),
                };

                write!(f, "values [{}, {}]", fmt_motor(m0), fmt_motor(m1))
            },
            Message::Ack {
                tag,
                origin,
            } => write!(f, "ack {tag} from {origin}"),
            Message::AckValues {
                origin,
                payload,
            } => write!(f, "ack values from {origin}: 0x{}", hex::encode(payload)),
            Message::Timeout {
                millis,
            } => write!(f, "timeout {millis}ms"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::SensorType;

    #[test]
    fn timeout_fixture() -> Result<(), Error> {
        let message = Message::Timeout {
            millis: 871487468,
        };

        assert_eq!(message.payload()?, vec![236, 215, 241, 51]);
        assert_eq!(message.byte_count()?, 5);
        assert_eq!(Message::decode_command(5, &[236, 215, 241, 51])?, message);

        Ok(())
    }

    #[test]
    fn byte_sum_includes_tag() -> Result<(), Error> {
        let message = Message::AddressChange {
            address: UnitAddress(0xfe),
        };

        assert_eq!(message.byte_count()?, 2);
        assert_eq!(message.byte_sum()?, 0xff);

        assert_eq!(Message::EmergencyStop.byte_count()?, 1);
        assert_eq!(Message::EmergencyStop.byte_sum()?, 4);

        Ok(())
    }

    #[test]
    fn bare_ack_echoes_tag() -> Result<(), Error> {
        let ack = Message::decode_reply(2, &[])?;

        assert_eq!(ack, Message::Ack {
            tag:    2,
            origin: UnitAddress::BROADCAST,
        });
        assert_eq!(ack.tag(), 2);
        assert!(ack.payload()?.is_empty());

        Ok(())
    }

    #[test]
    fn unknown_reply_type() {
        assert_eq!(Message::decode_reply(2, &[1, 2]), Err(Error::UnknownAckType(2)));
    }

    #[test]
    fn unknown_command_type() {
        assert_eq!(Message::decode_command(9, &[]), Err(Error::UnknownCommandType(9)));
        assert_eq!(
            Message::decode_command(4, &[0]),
            Err(Error::PayloadLength {
                tag: 4,
                len: 1,
            })
        );
    }

    #[test]
    fn values_use_origin_sensor_types() -> Result<(), Error> {
        let unit = UnitAddress(2);
        let mut table = SensorTable::new();
        table.record(unit, SensorTypes([SensorType::Touch, SensorType::UltrasonicContinuous]));

        let reply = Message::decode_reply(3, &[0x03, 0x34, 0x0a])?.with_origin(unit);

        assert_eq!(reply.origin(), Some(unit));
        assert_eq!(
            reply.values(&table)?,
            Some(Values {
                encoders: [5, 0],
                sensors:  [1, 20],
            })
        );

        // undeclared units read raw/raw: 22 bits of sensor data don't fit
        let stranger = reply.clone().with_origin(UnitAddress(1));
        assert!(matches!(stranger.values(&table), Err(Error::MalformedHeader { .. })));

        assert_eq!(Message::EmergencyStop.values(&table)?, None);

        Ok(())
    }

    #[test]
    fn display() {
        let message = Message::Values(MotorCommands::new(Some(MotorCommand(-12)), None));
        assert_eq!(message.to_string(), "values [-12, off]");
    }
}
