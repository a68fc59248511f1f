use codec::bits::{
    bytes_for_bits,
    BitReader,
    BitWriter,
};

use crate::{
    Error,
    SensorType,
    Tag,
};

const CODES_LEN: usize = 2;

/// I2C bus parameters for one port, appended to a sensor declaration after the type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct I2cSettings {
    pub speed:     u8,
    pub bus_index: u8,
    pub address:   u8,
    pub flags:     u8,
    pub write_len: u8,
    pub read_len:  u8,
    pub register:  u8,
}

impl I2cSettings {
    /// Field widths, in wire order.
    const WIDTHS: [u32; 7] = [8, 3, 7, 2, 4, 4, 8];

    pub const BITS: usize = 36;

    /// Continuous-read configuration for the ultrasonic rangefinder.
    pub const ULTRASONIC: Self = Self {
        speed:     10,
        bus_index: 0,
        address:   1,
        flags:     3,
        write_len: 1,
        read_len:  1,
        register:  0x42,
    };

    #[inline]
    fn fields(&self) -> [u8; 7] {
        [
            self.speed,
            self.bus_index,
            self.address,
            self.flags,
            self.write_len,
            self.read_len,
            self.register,
        ]
    }

    fn write(&self, w: &mut BitWriter<'_>) -> Result<(), Error> {
        for (value, width) in self.fields().into_iter().zip(Self::WIDTHS) {
            w.put(value as u32, width)?;
        }

        Ok(())
    }

    fn read(r: &mut BitReader<'_>) -> Result<Self, Error> {
        let mut fields = [0u8; 7];

        for (field, width) in fields.iter_mut().zip(Self::WIDTHS) {
            *field = r.take(width)? as u8;
        }

        let [speed, bus_index, address, flags, write_len, read_len, register] = fields;

        Ok(Self {
            speed,
            bus_index,
            address,
            flags,
            write_len,
            read_len,
            register,
        })
    }
}

/// Declared sensor types for both sensor ports of a unit. An empty port is declared `Raw`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SensorTypes(pub [SensorType; 2]);

impl SensorTypes {
    #[inline]
    pub fn new(sensor0: Option<SensorType>, sensor1: Option<SensorType>) -> Self {
        Self([sensor0.unwrap_or_default(), sensor1.unwrap_or_default()])
    }

    #[inline]
    fn ultrasonic_count(&self) -> usize {
        self.0.iter().filter(|ty| ty.is_ultrasonic()).count()
    }

    /// Two wire codes, then one [`I2cSettings`] record per ultrasonic port, packed back to back.
    ///
    /// The buffer is sized from the record count so trailing zero bits still take up their bytes.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let records = self.ultrasonic_count();
        let mut buf = vec![0u8; CODES_LEN + bytes_for_bits(I2cSettings::BITS * records)];

        buf[0] = self.0[0].wire_code();
        buf[1] = self.0[1].wire_code();

        let mut w = BitWriter::new(&mut buf[CODES_LEN..]);
        for _ in 0..records {
            I2cSettings::ULTRASONIC.write(&mut w)?;
        }

        Ok(buf)
    }

    /// I2C-coded ports are read back as ultrasonic when the payload carries a settings record for
    /// each of them, and as bare I2C when it carries none.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let invalid = || Error::PayloadLength {
            tag: Tag::SensorTypes.byte(),
            len: payload.len(),
        };

        if payload.len() < CODES_LEN {
            return Err(invalid());
        }

        let (codes, records) = payload.split_at(CODES_LEN);
        let i2c_code = SensorType::I2c.code();
        let i2c_ports = codes.iter().filter(|&&code| code == i2c_code).count();

        let with_records = i2c_ports > 0 && records.len() == bytes_for_bits(I2cSettings::BITS * i2c_ports);

        if !with_records && !records.is_empty() {
            return Err(invalid());
        }

        let mut types = [SensorType::Raw; 2];
        for (ty, &code) in types.iter_mut().zip(codes) {
            *ty = match code {
                code if code == i2c_code && with_records => SensorType::UltrasonicContinuous,
                code => SensorType::from_code(code)?,
            };
        }

        if with_records {
            let mut r = BitReader::new(records);

            for _ in 0..i2c_ports {
                let settings = I2cSettings::read(&mut r)?;
                tracing::trace!(?settings, "decoded i2c settings record");
            }
        }

        Ok(Self(types))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn signed(bytes: Vec<u8>) -> Vec<i8> {
        bytes.into_iter().map(|b| b as i8).collect()
    }

    #[test]
    fn one_ultrasonic_fixture() -> Result<(), Error> {
        let types = SensorTypes::new(None, Some(SensorType::UltrasonicContinuous));
        let encoded = types.encode()?;

        assert_eq!(encoded, vec![0, 41, 10, 8, 28, 33, 4]);
        assert_eq!(SensorTypes::decode(&encoded)?, types);

        Ok(())
    }

    #[test]
    fn two_ultrasonic_fixture() -> Result<(), Error> {
        let types = SensorTypes([SensorType::UltrasonicContinuous; 2]);
        let encoded = types.encode()?;

        assert_eq!(signed(encoded.clone()), vec![41, 41, 10, 8, 28, 33, -92, -128, -64, 17, 66]);
        assert_eq!(encoded, vec![41, 41, 10, 8, 28, 33, 164, 128, 192, 17, 66]);
        assert_eq!(SensorTypes::decode(&encoded)?, types);

        Ok(())
    }

    #[test]
    fn plain_types() -> Result<(), Error> {
        let types = SensorTypes([SensorType::Touch, SensorType::ColorRed]);

        assert_eq!(types.encode()?, vec![32, 37]);
        assert_eq!(SensorTypes::decode(&[32, 37])?, types);

        Ok(())
    }

    #[test]
    fn bare_i2c_without_records() -> Result<(), Error> {
        assert_eq!(SensorTypes::decode(&[41, 0])?, SensorTypes([SensorType::I2c, SensorType::Raw]));

        Ok(())
    }

    #[test]
    fn settings_record_layout() -> Result<(), Error> {
        let mut buf = [0u8; 5];
        I2cSettings::ULTRASONIC.write(&mut BitWriter::new(&mut buf))?;

        assert_eq!(buf, [10, 8, 28, 33, 4]);
        assert_eq!(I2cSettings::read(&mut BitReader::new(&buf))?, I2cSettings::ULTRASONIC);

        Ok(())
    }

    #[test]
    fn malformed() {
        assert_eq!(
            SensorTypes::decode(&[0]),
            Err(Error::PayloadLength {
                tag: 2,
                len: 1,
            })
        );

        assert_eq!(
            SensorTypes::decode(&[0, 41, 10, 8]),
            Err(Error::PayloadLength {
                tag: 2,
                len: 4,
            })
        );

        assert_eq!(SensorTypes::decode(&[0, 99]), Err(Error::UnknownSensorCode(99)));
    }
}
