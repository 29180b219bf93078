use crate::buffer::{ByteBuffer, ByteCursor, DecodeError};
use serde::{Deserialize, Serialize};

pub const PGN_SYSTEM_TIME: u32 = 126_992;
pub const PGN_ATTITUDE: u32 = 127_257;
pub const PGN_WATER_DEPTH: u32 = 128_267;
pub const PGN_COG_SOG_RAPID: u32 = 129_026;
pub const PGN_GNSS_POSITION: u32 = 129_029;
pub const PGN_ENVIRONMENTAL_PARAMETERS: u32 = 130_311;
pub const PGN_TEMPERATURE: u32 = 130_312;
pub const PGN_HUMIDITY: u32 = 130_313;
pub const PGN_ACTUAL_PRESSURE: u32 = 130_314;
pub const PGN_TEMPERATURE_EXTENDED_RANGE: u32 = 130_316;

/// Value recorded in place of a field the sender marked "not available".
pub const N2K_DOUBLE_NA: f64 = -1e9;

const DEFAULT_PRIORITY: u8 = 6;

const U8_NA: u8 = 0xFF;
const U16_NA: u16 = 0xFFFF;
const I16_NA: i16 = 0x7FFF;
const U24_NA: u32 = 0x00FF_FFFF;
const U32_NA: u32 = 0xFFFF_FFFF;
const I32_NA: i32 = 0x7FFF_FFFF;
const I64_NA: i64 = 0x7FFF_FFFF_FFFF_FFFF;
const RESERVED: u8 = 0xFF;

/// One received (or simulated) parameter group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct N2kMessage {
    pub pgn: u32,
    pub priority: u8,
    pub source: u8,
    /// Receiver's millisecond counter when the message arrived.
    pub elapsed_ms: u32,
    pub data: Vec<u8>,
}

impl N2kMessage {
    pub fn new(pgn: u32, source: u8, elapsed_ms: u32, data: Vec<u8>) -> Self {
        Self {
            pgn,
            priority: DEFAULT_PRIORITY,
            source,
            elapsed_ms,
            data,
        }
    }

    /// Encode a typed parameter group into a message.
    pub fn from_pgn<P: N2kPgn>(value: &P, source: u8, elapsed_ms: u32) -> Self {
        let mut buffer = ByteBuffer::with_capacity(8);
        value.encode(&mut buffer);
        Self::new(P::PGN, source, elapsed_ms, buffer.as_bytes().to_vec())
    }

    pub fn kind(&self) -> Option<N2kKind> {
        N2kKind::from_pgn(self.pgn)
    }

    pub fn decode<P: N2kPgn>(&self) -> Result<P, DecodeError> {
        P::decode(&self.data)
    }
}

/// The closed set of parameter groups the logger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum N2kKind {
    SystemTime,
    Attitude,
    WaterDepth,
    CogSogRapid,
    GnssPosition,
    EnvironmentalParameters,
    Temperature,
    Humidity,
    ActualPressure,
    TemperatureExtendedRange,
}

impl N2kKind {
    pub const ALL: [N2kKind; 10] = [
        N2kKind::SystemTime,
        N2kKind::Attitude,
        N2kKind::WaterDepth,
        N2kKind::CogSogRapid,
        N2kKind::GnssPosition,
        N2kKind::EnvironmentalParameters,
        N2kKind::Temperature,
        N2kKind::Humidity,
        N2kKind::ActualPressure,
        N2kKind::TemperatureExtendedRange,
    ];

    pub fn from_pgn(pgn: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.pgn() == pgn)
    }

    pub fn pgn(self) -> u32 {
        match self {
            N2kKind::SystemTime => PGN_SYSTEM_TIME,
            N2kKind::Attitude => PGN_ATTITUDE,
            N2kKind::WaterDepth => PGN_WATER_DEPTH,
            N2kKind::CogSogRapid => PGN_COG_SOG_RAPID,
            N2kKind::GnssPosition => PGN_GNSS_POSITION,
            N2kKind::EnvironmentalParameters => PGN_ENVIRONMENTAL_PARAMETERS,
            N2kKind::Temperature => PGN_TEMPERATURE,
            N2kKind::Humidity => PGN_HUMIDITY,
            N2kKind::ActualPressure => PGN_ACTUAL_PRESSURE,
            N2kKind::TemperatureExtendedRange => PGN_TEMPERATURE_EXTENDED_RANGE,
        }
    }
}

/// A parameter group with a fixed PGN and a byte-level codec.
pub trait N2kPgn: Sized {
    const PGN: u32;

    fn encode(&self, out: &mut ByteBuffer);

    fn decode(data: &[u8]) -> Result<Self, DecodeError>;
}

macro_rules! lookup {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
            Unknown(u8),
        }

        impl $name {
            pub fn from_raw(raw: u8) -> Self {
                match raw {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn raw(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(raw) => raw,
                }
            }
        }
    };
}

lookup!(
    /// Origin of a system time broadcast.
    TimeSource {
        Gps = 0,
        Glonass = 1,
        RadioStation = 2,
        LocalCesiumClock = 3,
        LocalRubidiumClock = 4,
        LocalCrystalClock = 5,
    }
);

lookup!(HeadingReference {
    True = 0,
    Magnetic = 1,
    Error = 2,
    Unavailable = 3,
});

lookup!(TemperatureSource {
    Sea = 0,
    Outside = 1,
    Inside = 2,
    EngineRoom = 3,
    MainCabin = 4,
    LiveWell = 5,
    BaitWell = 6,
    Refrigeration = 7,
    HeatingSystem = 8,
    DewPoint = 9,
});

lookup!(HumiditySource {
    Inside = 0,
    Outside = 1,
});

lookup!(PressureSource {
    Atmospheric = 0,
    Water = 1,
    Steam = 2,
    CompressedAir = 3,
    Hydraulic = 4,
});

lookup!(
    /// Receiver or reference-station constellation.
    GnssType {
        Gps = 0,
        Glonass = 1,
        GpsGlonass = 2,
        GpsSbasWaas = 3,
        GpsSbasWaasGlonass = 4,
        Chayka = 5,
        Integrated = 6,
        Surveyed = 7,
        Galileo = 8,
    }
);

lookup!(GnssMethod {
    NoFix = 0,
    GnssFix = 1,
    Dgnss = 2,
    PreciseGnss = 3,
    RtkFixed = 4,
    RtkFloat = 5,
    Estimated = 6,
    Manual = 7,
    Simulated = 8,
});

macro_rules! scaled_field {
    ($put:ident, $get:ident, $ty:ty, $push:ident, $pull:ident, $na:expr) => {
        fn $put(out: &mut ByteBuffer, value: Option<f64>, resolution: f64) {
            let raw = match value {
                Some(v) => (v / resolution).round() as $ty,
                None => $na,
            };
            out.$push(raw);
        }

        fn $get(cursor: &mut ByteCursor<'_>, resolution: f64) -> Result<Option<f64>, DecodeError> {
            let raw = cursor.$pull()?;
            Ok((raw != $na).then(|| raw as f64 * resolution))
        }
    };
}

scaled_field!(put_u8_scaled, get_u8_scaled, u8, push_u8, get_u8, U8_NA);
scaled_field!(put_u16_scaled, get_u16_scaled, u16, push_u16, get_u16, U16_NA);
scaled_field!(put_i16_scaled, get_i16_scaled, i16, push_i16, get_i16, I16_NA);
scaled_field!(put_u32_scaled, get_u32_scaled, u32, push_u32, get_u32, U32_NA);
scaled_field!(put_i32_scaled, get_i32_scaled, i32, push_i32, get_i32, I32_NA);
scaled_field!(put_i64_scaled, get_i64_scaled, i64, push_i64, get_i64, I64_NA);

fn put_u24_scaled(out: &mut ByteBuffer, value: Option<f64>, resolution: f64) {
    let raw = match value {
        Some(v) => ((v / resolution).round() as u32).min(U24_NA),
        None => U24_NA,
    };
    out.push_bytes(&raw.to_le_bytes()[..3]);
}

fn get_u24_scaled(cursor: &mut ByteCursor<'_>, resolution: f64) -> Result<Option<f64>, DecodeError> {
    let bytes = cursor.get_bytes(3)?;
    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
    Ok((raw != U24_NA).then(|| f64::from(raw) * resolution))
}

fn get_u16_optional(cursor: &mut ByteCursor<'_>) -> Result<Option<u16>, DecodeError> {
    let raw = cursor.get_u16()?;
    Ok((raw != U16_NA).then_some(raw))
}

fn get_u8_optional(cursor: &mut ByteCursor<'_>) -> Result<Option<u8>, DecodeError> {
    let raw = cursor.get_u8()?;
    Ok((raw != U8_NA).then_some(raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemTime {
    pub sid: u8,
    pub source: TimeSource,
    /// Days since 1970-01-01.
    pub date: Option<u16>,
    /// Seconds since midnight.
    pub seconds: Option<f64>,
}

impl N2kPgn for SystemTime {
    const PGN: u32 = PGN_SYSTEM_TIME;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8((self.source.raw() & 0x0F) | 0xF0);
        out.push_u16(self.date.unwrap_or(U16_NA));
        put_u32_scaled(out, self.seconds, 0.0001);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            source: TimeSource::from_raw(cursor.get_u8()? & 0x0F),
            date: get_u16_optional(&mut cursor)?,
            seconds: get_u32_scaled(&mut cursor, 0.0001)?,
        })
    }
}

/// Vessel attitude, all angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub sid: u8,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
}

impl N2kPgn for Attitude {
    const PGN: u32 = PGN_ATTITUDE;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        put_i16_scaled(out, self.yaw, 0.0001);
        put_i16_scaled(out, self.pitch, 0.0001);
        put_i16_scaled(out, self.roll, 0.0001);
        out.push_u8(RESERVED);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            yaw: get_i16_scaled(&mut cursor, 0.0001)?,
            pitch: get_i16_scaled(&mut cursor, 0.0001)?,
            roll: get_i16_scaled(&mut cursor, 0.0001)?,
        })
    }
}

/// Depth below transducer, transducer offset and sounder range, all metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterDepth {
    pub sid: u8,
    pub depth: Option<f64>,
    pub offset: Option<f64>,
    pub range: Option<f64>,
}

impl N2kPgn for WaterDepth {
    const PGN: u32 = PGN_WATER_DEPTH;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        put_u32_scaled(out, self.depth, 0.01);
        put_i16_scaled(out, self.offset, 0.001);
        put_u8_scaled(out, self.range, 10.0);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            depth: get_u32_scaled(&mut cursor, 0.01)?,
            offset: get_i16_scaled(&mut cursor, 0.001)?,
            range: get_u8_scaled(&mut cursor, 10.0)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CogSogRapid {
    pub sid: u8,
    pub reference: HeadingReference,
    /// Radians.
    pub cog: Option<f64>,
    /// Metres per second.
    pub sog: Option<f64>,
}

impl N2kPgn for CogSogRapid {
    const PGN: u32 = PGN_COG_SOG_RAPID;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8((self.reference.raw() & 0x03) | 0xFC);
        put_u16_scaled(out, self.cog, 0.0001);
        put_u16_scaled(out, self.sog, 0.01);
        out.push_u8(RESERVED);
        out.push_u8(RESERVED);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            reference: HeadingReference::from_raw(cursor.get_u8()? & 0x03),
            cog: get_u16_scaled(&mut cursor, 0.0001)?,
            sog: get_u16_scaled(&mut cursor, 0.01)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStation {
    pub station_type: GnssType,
    pub station_id: u16,
    /// Seconds.
    pub correction_age: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GnssPosition {
    pub sid: u8,
    pub date: Option<u16>,
    pub seconds: Option<f64>,
    /// Degrees, positive north.
    pub latitude: Option<f64>,
    /// Degrees, positive east.
    pub longitude: Option<f64>,
    /// Metres relative to the ellipsoid.
    pub altitude: Option<f64>,
    pub gnss_type: GnssType,
    pub method: GnssMethod,
    pub integrity: u8,
    pub satellites: Option<u8>,
    pub hdop: Option<f64>,
    pub pdop: Option<f64>,
    pub geoidal_separation: Option<f64>,
    pub reference_stations: Vec<ReferenceStation>,
}

impl N2kPgn for GnssPosition {
    const PGN: u32 = PGN_GNSS_POSITION;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u16(self.date.unwrap_or(U16_NA));
        put_u32_scaled(out, self.seconds, 0.0001);
        put_i64_scaled(out, self.latitude, 1e-16);
        put_i64_scaled(out, self.longitude, 1e-16);
        put_i64_scaled(out, self.altitude, 1e-6);
        out.push_u8((self.gnss_type.raw() & 0x0F) | (self.method.raw() << 4));
        out.push_u8((self.integrity & 0x03) | 0xFC);
        out.push_u8(self.satellites.unwrap_or(U8_NA));
        put_i16_scaled(out, self.hdop, 0.01);
        put_i16_scaled(out, self.pdop, 0.01);
        put_i32_scaled(out, self.geoidal_separation, 0.01);
        out.push_u8(self.reference_stations.len() as u8);
        for station in &self.reference_stations {
            out.push_u16(u16::from(station.station_type.raw() & 0x0F) | (station.station_id << 4));
            put_u16_scaled(out, station.correction_age, 0.01);
        }
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        let sid = cursor.get_u8()?;
        let date = get_u16_optional(&mut cursor)?;
        let seconds = get_u32_scaled(&mut cursor, 0.0001)?;
        let latitude = get_i64_scaled(&mut cursor, 1e-16)?;
        let longitude = get_i64_scaled(&mut cursor, 1e-16)?;
        let altitude = get_i64_scaled(&mut cursor, 1e-6)?;
        let type_method = cursor.get_u8()?;
        let integrity = cursor.get_u8()? & 0x03;
        let satellites = get_u8_optional(&mut cursor)?;
        let hdop = get_i16_scaled(&mut cursor, 0.01)?;
        let pdop = get_i16_scaled(&mut cursor, 0.01)?;
        let geoidal_separation = get_i32_scaled(&mut cursor, 0.01)?;

        // Older senders stop before the reference station count.
        let count = if cursor.remaining() > 0 { cursor.get_u8()? } else { 0 };
        let count = if count == U8_NA { 0 } else { count };
        let mut reference_stations = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let packed = cursor.get_u16()?;
            reference_stations.push(ReferenceStation {
                station_type: GnssType::from_raw((packed & 0x0F) as u8),
                station_id: packed >> 4,
                correction_age: get_u16_scaled(&mut cursor, 0.01)?,
            });
        }

        Ok(Self {
            sid,
            date,
            seconds,
            latitude,
            longitude,
            altitude,
            gnss_type: GnssType::from_raw(type_method & 0x0F),
            method: GnssMethod::from_raw(type_method >> 4),
            integrity,
            satellites,
            hdop,
            pdop,
            geoidal_separation,
            reference_stations,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalParameters {
    pub sid: u8,
    pub temperature_source: TemperatureSource,
    /// Kelvin.
    pub temperature: Option<f64>,
    pub humidity_source: HumiditySource,
    /// Percent.
    pub humidity: Option<f64>,
    /// Pascal.
    pub pressure: Option<f64>,
}

impl N2kPgn for EnvironmentalParameters {
    const PGN: u32 = PGN_ENVIRONMENTAL_PARAMETERS;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8((self.temperature_source.raw() & 0x3F) | ((self.humidity_source.raw() & 0x03) << 6));
        put_u16_scaled(out, self.temperature, 0.01);
        put_i16_scaled(out, self.humidity, 0.004);
        put_u16_scaled(out, self.pressure, 100.0);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        let sid = cursor.get_u8()?;
        let sources = cursor.get_u8()?;
        Ok(Self {
            sid,
            temperature_source: TemperatureSource::from_raw(sources & 0x3F),
            humidity_source: HumiditySource::from_raw(sources >> 6),
            temperature: get_u16_scaled(&mut cursor, 0.01)?,
            humidity: get_i16_scaled(&mut cursor, 0.004)?,
            pressure: get_u16_scaled(&mut cursor, 100.0)?,
        })
    }
}

/// Temperature in Kelvin, at 0.01 K resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub sid: u8,
    pub instance: u8,
    pub source: TemperatureSource,
    pub actual: Option<f64>,
    pub set: Option<f64>,
}

impl N2kPgn for Temperature {
    const PGN: u32 = PGN_TEMPERATURE;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8(self.instance);
        out.push_u8(self.source.raw());
        put_u16_scaled(out, self.actual, 0.01);
        put_u16_scaled(out, self.set, 0.01);
        out.push_u8(RESERVED);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            instance: cursor.get_u8()?,
            source: TemperatureSource::from_raw(cursor.get_u8()?),
            actual: get_u16_scaled(&mut cursor, 0.01)?,
            set: get_u16_scaled(&mut cursor, 0.01)?,
        })
    }
}

/// Relative humidity in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Humidity {
    pub sid: u8,
    pub instance: u8,
    pub source: HumiditySource,
    pub actual: Option<f64>,
    pub set: Option<f64>,
}

impl N2kPgn for Humidity {
    const PGN: u32 = PGN_HUMIDITY;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8(self.instance);
        out.push_u8(self.source.raw());
        put_i16_scaled(out, self.actual, 0.004);
        put_i16_scaled(out, self.set, 0.004);
        out.push_u8(RESERVED);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            instance: cursor.get_u8()?,
            source: HumiditySource::from_raw(cursor.get_u8()?),
            actual: get_i16_scaled(&mut cursor, 0.004)?,
            set: get_i16_scaled(&mut cursor, 0.004)?,
        })
    }
}

/// Pressure in Pascal, at 0.1 Pa resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActualPressure {
    pub sid: u8,
    pub instance: u8,
    pub source: PressureSource,
    pub pressure: Option<f64>,
}

impl N2kPgn for ActualPressure {
    const PGN: u32 = PGN_ACTUAL_PRESSURE;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8(self.instance);
        out.push_u8(self.source.raw());
        put_i32_scaled(out, self.pressure, 0.1);
        out.push_u8(RESERVED);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            instance: cursor.get_u8()?,
            source: PressureSource::from_raw(cursor.get_u8()?),
            pressure: get_i32_scaled(&mut cursor, 0.1)?,
        })
    }
}

/// Temperature in Kelvin at 0.001 K resolution; set point at 0.1 K.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureExtendedRange {
    pub sid: u8,
    pub instance: u8,
    pub source: TemperatureSource,
    pub actual: Option<f64>,
    pub set: Option<f64>,
}

impl N2kPgn for TemperatureExtendedRange {
    const PGN: u32 = PGN_TEMPERATURE_EXTENDED_RANGE;

    fn encode(&self, out: &mut ByteBuffer) {
        out.push_u8(self.sid);
        out.push_u8(self.instance);
        out.push_u8(self.source.raw());
        put_u24_scaled(out, self.actual, 0.001);
        put_u16_scaled(out, self.set, 0.1);
    }

    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(data);
        Ok(Self {
            sid: cursor.get_u8()?,
            instance: cursor.get_u8()?,
            source: TemperatureSource::from_raw(cursor.get_u8()?),
            actual: get_u24_scaled(&mut cursor, 0.001)?,
            set: get_u16_scaled(&mut cursor, 0.1)?,
        })
    }
}
