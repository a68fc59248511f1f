use codec::bits::{
    BitReader,
    BitWriter,
};

use crate::{
    Error,
    Tag,
};

pub const PAYLOAD_LEN: usize = 3;

const RESERVED_BITS: u32 = 2;

/// Largest magnitude representable on the wire.
pub const MAX_POWER: u16 = u8::MAX as u16;

/// Signed motor power. Negative values run the motor in reverse.
///
/// The wire carries eight bits of magnitude; larger magnitudes are truncated to their low byte
/// when encoded. Use [`MotorCommand::checked`] to reject them instead.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct MotorCommand(pub i16);

impl MotorCommand {
    pub fn checked(power: i32) -> Result<Self, Error> {
        if power.unsigned_abs() > MAX_POWER as u32 {
            return Err(Error::OutOfRange {
                what:  "motor power",
                value: power as i64,
            });
        }

        Ok(Self(power as i16))
    }

    #[inline]
    pub const fn power(self) -> i16 {
        self.0
    }

    #[inline]
    pub const fn is_reverse(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn magnitude(self) -> u8 {
        (self.0.unsigned_abs() & 0xff) as u8
    }
}

/// Commands for both motor ports of a unit. `None` disables the port.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct MotorCommands(pub [Option<MotorCommand>; 2]);

impl MotorCommands {
    #[inline]
    pub const fn new(motor0: Option<MotorCommand>, motor1: Option<MotorCommand>) -> Self {
        Self([motor0, motor1])
    }

    /// Two reserved bits, then per motor: enable, reverse, eight bits of magnitude.
    pub fn encode(&self) -> Result<[u8; PAYLOAD_LEN], Error> {
        let mut buf = [0u8; PAYLOAD_LEN];
        let mut w = BitWriter::new(&mut buf);

        w.put(0, RESERVED_BITS)?;

        for slot in self.0 {
            let (enabled, reverse, magnitude) = match slot {
                Some(cmd) => (1, cmd.is_reverse() as u32, cmd.magnitude() as u32),
                None => (0, 0, 0),
            };

            w.put(enabled, 1)?.put(reverse, 1)?.put(magnitude, 8)?;
        }

        Ok(buf)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() != PAYLOAD_LEN {
            return Err(Error::PayloadLength {
                tag: Tag::Values.byte(),
                len: payload.len(),
            });
        }

        let mut r = BitReader::at(payload, RESERVED_BITS as usize);
        let mut motors = [None; 2];

        for slot in motors.iter_mut() {
            let enabled = r.take(1)? == 1;
            let reverse = r.take(1)? == 1;
            let magnitude = r.take(8)? as i16;

            if enabled {
                *slot = Some(MotorCommand(if reverse { -magnitude } else { magnitude }));
            }
        }

        Ok(Self(motors))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forward_fixture() -> Result<(), Error> {
        let motors = MotorCommands::new(Some(MotorCommand(231)), Some(MotorCommand(174)));
        let encoded = motors.encode()?;

        assert_eq!(encoded.map(|b| b as i8), [116, -98, 43]);
        assert_eq!(MotorCommands::decode(&encoded)?, motors);

        Ok(())
    }

    #[test]
    fn full_power_both_directions() -> Result<(), Error> {
        let motors = MotorCommands::new(Some(MotorCommand(-255)), Some(MotorCommand(255)));

        assert_eq!(motors.encode()?, [0xfc, 0xdf, 0x3f]);

        Ok(())
    }

    #[test]
    fn disabled_slot_is_zero() -> Result<(), Error> {
        assert_eq!(MotorCommands::default().encode()?, [0, 0, 0]);

        let motors = MotorCommands::new(None, Some(MotorCommand(0)));
        assert_eq!(motors.encode()?, [0, 0x10, 0]);
        assert_eq!(MotorCommands::decode(&[0, 0x10, 0])?, motors);

        Ok(())
    }

    #[test]
    fn magnitude_truncates_to_byte() -> Result<(), Error> {
        let wide = MotorCommands::new(Some(MotorCommand(300)), None);
        let narrow = MotorCommands::new(Some(MotorCommand(300 - 256)), None);

        assert_eq!(wide.encode()?, narrow.encode()?);

        Ok(())
    }

    #[test]
    fn checked_rejects_wide_power() {
        assert_eq!(MotorCommand::checked(-255), Ok(MotorCommand(-255)));
        assert_eq!(
            MotorCommand::checked(256),
            Err(Error::OutOfRange {
                what:  "motor power",
                value: 256,
            })
        );
    }

    #[test]
    fn wrong_length() {
        assert_eq!(
            MotorCommands::decode(&[0, 0]),
            Err(Error::PayloadLength {
                tag: 3,
                len: 2,
            })
        );
    }
}
