use codec::bits::{
    bytes_for_bits,
    BitReader,
    BitWriter,
};

use crate::{
    Error,
    SensorType,
    SensorTypes,
};

/// Width of each encoder-width prefix.
const WIDTH_BITS: u32 = 5;

/// Encoder deltas and sensor readings carried by an ack-with-values payload.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Values {
    pub encoders: [u32; 2],
    pub sensors:  [u32; 2],
}

impl Values {
    /// Layout: two 5-bit encoder widths, both encoder values at those widths, then each sensor
    /// reading at the width its declared type dictates.
    pub fn decode(payload: &[u8], types: SensorTypes) -> Result<Self, Error> {
        let mut r = BitReader::new(payload);

        let widths = [r.take(WIDTH_BITS)?, r.take(WIDTH_BITS)?];
        let encoders = [r.take(widths[0])?, r.take(widths[1])?];

        let mut sensors = [0u32; 2];
        for (value, ty) in sensors.iter_mut().zip(types.0) {
            let raw = r.take(ty.value_width()?)?;

            // half-centimetre units on the wire
            *value = if ty.is_ultrasonic() { raw / 2 } else { raw };
        }

        Ok(Self {
            encoders,
            sensors,
        })
    }

    /// Inverse of [`Values::decode`], using the narrowest width for each encoder value.
    pub fn encode(&self, types: SensorTypes) -> Result<Vec<u8>, Error> {
        let mut widths = [0u32; 2];
        for (width, &encoder) in widths.iter_mut().zip(&self.encoders) {
            *width = u32::BITS - encoder.leading_zeros();

            if *width >= 1 << WIDTH_BITS {
                return Err(Error::OutOfRange {
                    what:  "encoder value",
                    value: encoder as i64,
                });
            }
        }

        let mut sensors = [(0u32, 0u32); 2];
        for ((field, &value), ty) in sensors.iter_mut().zip(&self.sensors).zip(types.0) {
            let width = ty.value_width()?;
            let raw = if ty.is_ultrasonic() { value.checked_mul(2) } else { Some(value) };

            *field = match raw {
                Some(raw) if raw >> width == 0 => (raw, width),
                _ => {
                    return Err(Error::OutOfRange {
                        what:  sensor_name(ty),
                        value: value as i64,
                    })
                },
            };
        }

        let bits = 2 * WIDTH_BITS + widths.iter().sum::<u32>() + sensors.iter().map(|(_, w)| w).sum::<u32>();
        let mut buf = vec![0u8; bytes_for_bits(bits as usize)];
        let mut w = BitWriter::new(&mut buf);

        w.put(widths[0], WIDTH_BITS)?.put(widths[1], WIDTH_BITS)?;
        w.put(self.encoders[0], widths[0])?.put(self.encoders[1], widths[1])?;

        for (raw, width) in sensors {
            w.put(raw, width)?;
        }

        Ok(buf)
    }
}

#[inline]
fn sensor_name(ty: SensorType) -> &'static str {
    match ty {
        SensorType::Touch => "touch reading",
        SensorType::UltrasonicContinuous => "ultrasonic reading",
        _ => "sensor reading",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOUCH_ULTRASONIC: SensorTypes =
        SensorTypes([SensorType::Touch, SensorType::UltrasonicContinuous]);

    #[test]
    fn touch_and_ultrasonic() -> Result<(), Error> {
        let payload = [0x03, 0x34, 0x0a];
        let expected = Values {
            encoders: [5, 0],
            sensors:  [1, 20],
        };

        assert_eq!(Values::decode(&payload, TOUCH_ULTRASONIC)?, expected);
        assert_eq!(expected.encode(TOUCH_ULTRASONIC)?, payload.to_vec());

        Ok(())
    }

    #[test]
    fn ultrasonic_halves_odd_readings() -> Result<(), Error> {
        // raw ultrasonic reading of 41
        let payload = [0x03, 0x74, 0x0a];

        assert_eq!(Values::decode(&payload, TOUCH_ULTRASONIC)?.sensors, [1, 20]);

        Ok(())
    }

    #[test]
    fn raw_sensors_are_ten_bits() -> Result<(), Error> {
        let values = Values {
            encoders: [0x1234, 1],
            sensors:  [1023, 512],
        };
        let types = SensorTypes([SensorType::Raw, SensorType::ColorBlue]);
        let encoded = values.encode(types)?;

        // 10 + 13 + 1 + 20 bits
        assert_eq!(encoded.len(), 6);
        assert_eq!(Values::decode(&encoded, types)?, values);

        Ok(())
    }

    #[test]
    fn unsupported_sensor_type() {
        let types = SensorTypes([SensorType::ColorFull, SensorType::Raw]);

        assert_eq!(
            Values::decode(&[0; 8], types),
            Err(Error::UnsupportedSensorType(SensorType::ColorFull))
        );
        assert_eq!(
            Values::default().encode(types),
            Err(Error::UnsupportedSensorType(SensorType::ColorFull))
        );
    }

    #[test]
    fn truncated_payload() {
        // widths claim 31 + 31 bits of encoder data in a 2-byte payload
        let result = Values::decode(&[0xff, 0xff], SensorTypes::default());

        assert!(matches!(result, Err(Error::MalformedHeader { .. })));
    }

    #[test]
    fn out_of_range_readings() {
        let touch = Values {
            encoders: [0, 0],
            sensors:  [2, 0],
        };
        assert!(matches!(touch.encode(TOUCH_ULTRASONIC), Err(Error::OutOfRange { .. })));

        let far = Values {
            encoders: [0, 0],
            sensors:  [0, 128],
        };
        assert!(matches!(far.encode(TOUCH_ULTRASONIC), Err(Error::OutOfRange { .. })));

        let wide = Values {
            encoders: [u32::MAX, 0],
            sensors:  [0, 0],
        };
        assert!(matches!(wide.encode(TOUCH_ULTRASONIC), Err(Error::OutOfRange { .. })));
    }
}
