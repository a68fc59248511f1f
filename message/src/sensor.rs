use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use fnv::FnvHashMap;

use crate::{
    Error,
    SensorTypes,
    UnitAddress,
};

/// Sensor kinds a unit can be told to read.
///
/// `Raw` and `LightOff` share wire code 0; decoding code 0 always yields `Raw`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SensorType {
    #[default]
    Raw,
    LightOff,
    LightOn,
    Touch,
    UltrasonicContinuous,
    RcxLight,
    ColorFull,
    ColorRed,
    ColorGreen,
    ColorBlue,
    ColorNone,
    I2c,
}

impl SensorType {
    pub const ALL: [SensorType; 12] = [
        SensorType::Raw,
        SensorType::LightOff,
        SensorType::LightOn,
        SensorType::Touch,
        SensorType::UltrasonicContinuous,
        SensorType::RcxLight,
        SensorType::ColorFull,
        SensorType::ColorRed,
        SensorType::ColorGreen,
        SensorType::ColorBlue,
        SensorType::ColorNone,
        SensorType::I2c,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            SensorType::Raw | SensorType::LightOff => 0,
            SensorType::LightOn => 9,
            SensorType::Touch => 32,
            SensorType::UltrasonicContinuous => 33,
            SensorType::RcxLight => 35,
            SensorType::ColorFull => 36,
            SensorType::ColorRed => 37,
            SensorType::ColorGreen => 38,
            SensorType::ColorBlue => 39,
            SensorType::ColorNone => 40,
            SensorType::I2c => 41,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, Error> {
        let ty = match code {
            0 => SensorType::Raw,
            9 => SensorType::LightOn,
            32 => SensorType::Touch,
            33 => SensorType::UltrasonicContinuous,
            35 => SensorType::RcxLight,
            36 => SensorType::ColorFull,
            37 => SensorType::ColorRed,
            38 => SensorType::ColorGreen,
            39 => SensorType::ColorBlue,
            40 => SensorType::ColorNone,
            41 => SensorType::I2c,
            other => return Err(Error::UnknownSensorCode(other)),
        };

        Ok(ty)
    }

    /// Code sent in a sensor-type declaration. Continuous ultrasonic sensors are driven as generic
    /// I2C devices, configured by a trailing settings record.
    #[inline]
    pub const fn wire_code(self) -> u8 {
        match self {
            SensorType::UltrasonicContinuous => SensorType::I2c.code(),
            other => other.code(),
        }
    }

    #[inline]
    pub const fn is_ultrasonic(self) -> bool {
        matches!(self, SensorType::UltrasonicContinuous)
    }

    /// Width of this sensor's reading in an ack-with-values payload.
    pub fn value_width(self) -> Result<u32, Error> {
        match self {
            SensorType::Touch => Ok(1),
            SensorType::UltrasonicContinuous => Ok(8),
            SensorType::Raw
            | SensorType::LightOff
            | SensorType::LightOn
            | SensorType::RcxLight
            | SensorType::ColorRed
            | SensorType::ColorGreen
            | SensorType::ColorBlue
            | SensorType::ColorNone => Ok(10),
            SensorType::ColorFull | SensorType::I2c => Err(Error::UnsupportedSensorType(self)),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SensorType::Raw => "raw",
            SensorType::LightOff => "light-off",
            SensorType::LightOn => "light-on",
            SensorType::Touch => "touch",
            SensorType::UltrasonicContinuous => "ultrasonic-continuous",
            SensorType::RcxLight => "rcx-light",
            SensorType::ColorFull => "color-full",
            SensorType::ColorRed => "color-red",
            SensorType::ColorGreen => "color-green",
            SensorType::ColorBlue => "color-blue",
            SensorType::ColorNone => "color-none",
            SensorType::I2c => "i2c",
        }
    }
}

impl Display for SensorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sensor type {0:?}")]
pub struct ParseSensorTypeError(String);

impl FromStr for SensorType {
    type Err = ParseSensorTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(SensorType::Raw);
        }

        SensorType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| ParseSensorTypeError(s.to_owned()))
    }
}

/// Most recent sensor declaration per unit, needed to interpret ack-with-values payloads.
///
/// Units that were never declared read as raw on both ports, which is what the board powers up
/// with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorTable(FnvHashMap<UnitAddress, SensorTypes>);

impl SensorTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, unit: UnitAddress, types: SensorTypes) -> Option<SensorTypes> {
        self.0.insert(unit, types)
    }

    #[inline]
    pub fn get(&self, unit: UnitAddress) -> SensorTypes {
        self.0.get(&unit).copied().unwrap_or_default()
    }

    /// Follow a unit to its new address after an address change.
    pub fn readdress(&mut self, from: UnitAddress, to: UnitAddress) {
        if let Some(types) = self.0.remove(&from) {
            self.0.insert(to, types);
        }
    }

    #[inline]
    pub fn forget(&mut self, unit: UnitAddress) -> Option<SensorTypes> {
        self.0.remove(&unit)
    }
}
