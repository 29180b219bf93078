use core::fmt;
use serde::{Deserialize, Serialize};

/// Format version written into the preamble of every log.
pub const SERIALISER_VERSION_MAJOR: u16 = 1;
pub const SERIALISER_VERSION_MINOR: u16 = 3;

/// Packet payload identifiers. Each implies a fixed payload layout; `TD` below
/// is the 14-byte time datum (`u16` days since 1970-01-01, `f64` seconds of
/// day, `u32` elapsed ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum PayloadId {
    /// Format and producer versions. Reserved; first packet of every log.
    SerialiserVersion = 0,
    /// `u16` date, `f64` seconds, `u32` elapsed ms, `u8` time source.
    SystemTime = 1,
    /// TD, `f64` yaw, pitch, roll (radians).
    Attitude = 2,
    /// TD, `f64` depth, offset, range (metres).
    Depth = 3,
    /// TD, `f64` course over ground (radians), speed over ground (m/s).
    Cog = 4,
    /// TD, in-message date/time, position, fix quality and reference station.
    Gnss = 5,
    /// TD, `u8` + `f64` temperature, `u8` + `f64` humidity, `f64` pressure.
    Environment = 6,
    /// TD, `u8` source, `f64` temperature (K).
    Temperature = 7,
    /// TD, `u8` source, `f64` relative humidity (%).
    Humidity = 8,
    /// TD, `u8` source, `f64` pressure (Pa).
    Pressure = 9,
    /// `u32` elapsed ms followed by the raw NMEA0183 sentence.
    NmeaString = 10,
    /// `u32` elapsed ms, seven `f32` (acceleration, rotation rate, temperature).
    LocalImu = 11,
    /// Counted logger name, counted logger identifier.
    Metadata = 12,
    /// Counted algorithm name, counted parameter string.
    AlgorithmRequest = 13,
    /// Counted JSON document.
    JsonMetadata = 14,
    /// Counted NMEA0183 sentence identifier accepted for recording.
    Nmea0183Filter = 15,
    /// Four `f32`: acceleration, rotation, temperature scales and temperature offset.
    SensorScales = 16,
    /// `u32` elapsed ms, seven `i16` raw IMU counts.
    RawImu = 17,
    /// Counted JSON document describing the logger setup.
    Setup = 18,
}

impl PayloadId {
    pub const ALL: [PayloadId; 19] = [
        PayloadId::SerialiserVersion,
        PayloadId::SystemTime,
        PayloadId::Attitude,
        PayloadId::Depth,
        PayloadId::Cog,
        PayloadId::Gnss,
        PayloadId::Environment,
        PayloadId::Temperature,
        PayloadId::Humidity,
        PayloadId::Pressure,
        PayloadId::NmeaString,
        PayloadId::LocalImu,
        PayloadId::Metadata,
        PayloadId::AlgorithmRequest,
        PayloadId::JsonMetadata,
        PayloadId::Nmea0183Filter,
        PayloadId::SensorScales,
        PayloadId::RawImu,
        PayloadId::Setup,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Only the serialiser itself may emit the version packet.
    pub fn is_reserved(self) -> bool {
        matches!(self, PayloadId::SerialiserVersion)
    }

    pub fn name(self) -> &'static str {
        match self {
            PayloadId::SerialiserVersion => "SerialiserVersion",
            PayloadId::SystemTime => "SystemTime",
            PayloadId::Attitude => "Attitude",
            PayloadId::Depth => "Depth",
            PayloadId::Cog => "COG",
            PayloadId::Gnss => "GNSS",
            PayloadId::Environment => "Environment",
            PayloadId::Temperature => "Temperature",
            PayloadId::Humidity => "Humidity",
            PayloadId::Pressure => "Pressure",
            PayloadId::NmeaString => "NMEAString",
            PayloadId::LocalImu => "LocalIMU",
            PayloadId::Metadata => "Metadata",
            PayloadId::AlgorithmRequest => "AlgorithmRequest",
            PayloadId::JsonMetadata => "JSONMetadata",
            PayloadId::Nmea0183Filter => "NMEA0183Filter",
            PayloadId::SensorScales => "SensorScales",
            PayloadId::RawImu => "RawIMU",
            PayloadId::Setup => "Setup",
        }
    }
}

impl TryFrom<u32> for PayloadId {
    type Error = crate::buffer::DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_u32(value).ok_or(crate::buffer::DecodeError::UnknownPayload(value))
    }
}

impl From<PayloadId> for u32 {
    fn from(id: PayloadId) -> Self {
        id.as_u32()
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_ordered() {
        for (index, id) in PayloadId::ALL.iter().enumerate() {
            assert_eq!(id.as_u32() as usize, index);
            assert_eq!(PayloadId::from_u32(index as u32), Some(*id));
        }
        assert_eq!(PayloadId::from_u32(19), None);
    }

    #[test]
    fn test_only_version_is_reserved() {
        let reserved: Vec<_> = PayloadId::ALL.iter().filter(|id| id.is_reserved()).collect();
        assert_eq!(reserved, vec![&PayloadId::SerialiserVersion]);
    }
}
