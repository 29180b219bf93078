use crate::buffer::{ByteBuffer, DecodeError};
use crate::n2k::{
    self, ActualPressure, Attitude, CogSogRapid, EnvironmentalParameters, GnssPosition,
    HeadingReference, Humidity, HumiditySource, N2kKind, N2kMessage, PressureSource, SystemTime,
    TemperatureExtendedRange, TemperatureSource, TimeSource, WaterDepth, N2K_DOUBLE_NA,
};
use crate::registry::PayloadId;
use crate::time::{
    TickClock, TimeDatum, TimeReference, MILLISECOND_TICK_FREQUENCY, TIME_DATUM_SIZE,
};
use crate::writer::{PacketError, PacketSink};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const U8_NA: u8 = 0xFF;
const U16_NA: u16 = 0xFFFF;

/// Outcome of converting one inbound message.
#[derive(Debug, Clone)]
pub enum Conversion {
    Packet {
        payload_id: PayloadId,
        buffer: ByteBuffer,
        /// Set when a primary measurement was "not available" and recorded
        /// as [`N2K_DOUBLE_NA`].
        no_data: bool,
    },
    NoPacket,
}

impl Conversion {
    fn packet(payload_id: PayloadId, buffer: ByteBuffer) -> Self {
        Conversion::Packet {
            payload_id,
            buffer,
            no_data: false,
        }
    }

    pub fn is_packet(&self) -> bool {
        matches!(self, Conversion::Packet { .. })
    }

    pub fn payload_id(&self) -> Option<PayloadId> {
        match self {
            Conversion::Packet { payload_id, .. } => Some(*payload_id),
            Conversion::NoPacket => None,
        }
    }

    /// Hand the payload to a sink. Returns whether anything was written.
    pub fn write_to<S: PacketSink + ?Sized>(&self, sink: &mut S) -> Result<bool, PacketError> {
        match self {
            Conversion::Packet { payload_id, buffer, .. } => {
                sink.record(*payload_id, buffer)?;
                Ok(true)
            }
            Conversion::NoPacket => Ok(false),
        }
    }
}

/// Calibrated IMU sample: acceleration (m/s²), angular rate (rad/s), die
/// temperature (°C).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub acceleration: [f32; 3],
    pub rotation: [f32; 3],
    pub temperature: f32,
}

/// Uncalibrated IMU counts, as read from the sensor registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImuSample {
    pub acceleration: [i16; 3],
    pub rotation: [i16; 3],
    pub temperature: i16,
}

/// Factors converting [`RawImuSample`] counts into engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorScales {
    pub acceleration: f32,
    pub rotation: f32,
    pub temperature: f32,
    pub temperature_offset: f32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FactoryStats {
    pub converted: u32,
    pub filtered: u32,
    pub parse_failures: u32,
    pub unknown_pgn: u32,
    pub no_data: u32,
}

/// Tracks which primary fields were missing while a payload is built.
struct Fields<'a> {
    buffer: &'a mut ByteBuffer,
    missing: bool,
}

impl<'a> Fields<'a> {
    fn new(buffer: &'a mut ByteBuffer) -> Self {
        Self { buffer, missing: false }
    }

    fn required(&mut self, value: Option<f64>) -> &mut Self {
        self.missing |= value.is_none();
        self.buffer.push_f64(value.unwrap_or(N2K_DOUBLE_NA));
        self
    }

    fn optional(&mut self, value: Option<f64>) -> &mut Self {
        self.buffer.push_f64(value.unwrap_or(N2K_DOUBLE_NA));
        self
    }

    fn byte(&mut self, value: u8) -> &mut Self {
        self.buffer.push_u8(value);
        self
    }

    fn missing(&self) -> bool {
        self.missing
    }
}

/// Turns each recognised parameter group into one payload. Everything except
/// SystemTime is prefixed with a [`TimeDatum`] taken from the factory's own
/// [`TimeReference`].
pub struct MessageFactory<C: TickClock> {
    time: TimeReference<C>,
    /// Bus millisecond counter of the message that last set the reference.
    reference_ms: Option<u32>,
    stats: FactoryStats,
}

impl<C: TickClock> MessageFactory<C> {
    pub fn new(clock: C) -> Self {
        Self {
            time: TimeReference::new(clock),
            reference_ms: None,
            stats: FactoryStats::default(),
        }
    }

    pub fn time_reference(&self) -> &TimeReference<C> {
        &self.time
    }

    pub fn get_stats(&self) -> &FactoryStats {
        &self.stats
    }

    pub fn convert(&mut self, message: &N2kMessage) -> Conversion {
        let Some(kind) = message.kind() else {
            self.stats.unknown_pgn += 1;
            trace!("Ignoring PGN {}", message.pgn);
            return Conversion::NoPacket;
        };

        let result = match kind {
            N2kKind::SystemTime => self.system_time(message),
            N2kKind::Attitude => self.attitude(message),
            N2kKind::WaterDepth => self.depth(message),
            N2kKind::CogSogRapid => self.cog(message),
            N2kKind::GnssPosition => self.gnss(message),
            N2kKind::EnvironmentalParameters => self.environment(message),
            N2kKind::Temperature => self.temperature(message),
            N2kKind::Humidity => self.humidity(message),
            N2kKind::ActualPressure => self.pressure(message),
            N2kKind::TemperatureExtendedRange => self.extended_temperature(message),
        };

        match result {
            Ok(Conversion::Packet { payload_id, buffer, no_data }) => {
                self.stats.converted += 1;
                if no_data {
                    self.stats.no_data += 1;
                }
                Conversion::Packet { payload_id, buffer, no_data }
            }
            Ok(Conversion::NoPacket) => {
                self.stats.filtered += 1;
                Conversion::NoPacket
            }
            Err(e) => {
                self.stats.parse_failures += 1;
                debug!("Failed to parse PGN {}: {}", message.pgn, e);
                Conversion::NoPacket
            }
        }
    }

    /// Tick on the reference clock matching a message's arrival time.
    fn arrival_tick(&self, message: &N2kMessage) -> u64 {
        u64::from(message.elapsed_ms) * self.time.clock().frequency() / 1000
    }

    /// Stamp measured on the bus's own wrapping millisecond counter. A message
    /// up to half the counter range behind the reference is stamped earlier
    /// than it, not one counter period later.
    fn timestamp(&self, message: &N2kMessage) -> TimeDatum {
        let offset = self.reference_ms.and_then(|reference_ms| {
            let delta = message.elapsed_ms.wrapping_sub(reference_ms) as i32;
            self.time.offset_by(f64::from(delta) / 1000.0)
        });
        match offset {
            Some((date, seconds)) => TimeDatum {
                date,
                seconds,
                elapsed_ticks: u64::from(message.elapsed_ms),
                tick_frequency: MILLISECOND_TICK_FREQUENCY,
            },
            None => TimeDatum::invalid(message.elapsed_ms),
        }
    }

    fn stamped(&self, message: &N2kMessage, body_size: usize) -> ByteBuffer {
        let mut buffer = ByteBuffer::with_capacity(TIME_DATUM_SIZE + body_size);
        self.timestamp(message).serialise(&mut buffer);
        buffer
    }

    fn system_time(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let time: SystemTime = message.decode()?;
        if time.source == TimeSource::LocalCrystalClock {
            return Ok(Conversion::NoPacket);
        }

        let mut buffer = ByteBuffer::with_capacity(TIME_DATUM_SIZE + 1);
        buffer.push_u16(time.date.unwrap_or(U16_NA));
        let no_data = {
            let mut fields = Fields::new(&mut buffer);
            fields.required(time.seconds);
            fields.missing() || time.date.is_none()
        };
        buffer.push_u32(message.elapsed_ms);
        buffer.push_u8(time.source.raw());

        if let (Some(date), Some(seconds)) = (time.date, time.seconds) {
            let anchor = self.arrival_tick(message);
            self.time.update_with_anchor(date, seconds, anchor);
            self.reference_ms = Some(message.elapsed_ms);
        }

        Ok(Conversion::Packet {
            payload_id: PayloadId::SystemTime,
            buffer,
            no_data,
        })
    }

    fn attitude(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let attitude: Attitude = message.decode()?;
        let mut buffer = self.stamped(message, 3 * 8);
        let mut fields = Fields::new(&mut buffer);
        fields
            .required(attitude.yaw)
            .required(attitude.pitch)
            .required(attitude.roll);
        let no_data = fields.missing();
        Ok(Conversion::Packet {
            payload_id: PayloadId::Attitude,
            buffer,
            no_data,
        })
    }

    fn depth(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let depth: WaterDepth = message.decode()?;
        let mut buffer = self.stamped(message, 3 * 8);
        let mut fields = Fields::new(&mut buffer);
        fields
            .required(depth.depth)
            .optional(depth.offset)
            .optional(depth.range);
        let no_data = fields.missing();
        Ok(Conversion::Packet {
            payload_id: PayloadId::Depth,
            buffer,
            no_data,
        })
    }

    fn cog(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let cog: CogSogRapid = message.decode()?;
        if cog.reference != HeadingReference::True {
            return Ok(Conversion::NoPacket);
        }
        let mut buffer = self.stamped(message, 2 * 8);
        let mut fields = Fields::new(&mut buffer);
        fields.required(cog.cog).required(cog.sog);
        let no_data = fields.missing();
        Ok(Conversion::Packet {
            payload_id: PayloadId::Cog,
            buffer,
            no_data,
        })
    }

    fn gnss(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let position: GnssPosition = message.decode()?;
        let mut buffer = self.stamped(message, 2 * 2 + 8 * 8 + 5);
        buffer.push_u16(position.date.unwrap_or(U16_NA));

        let station = position.reference_stations.first();
        let mut fields = Fields::new(&mut buffer);
        fields
            .optional(position.seconds)
            .required(position.latitude)
            .required(position.longitude)
            .optional(position.altitude)
            .byte(position.gnss_type.raw())
            .byte(position.method.raw())
            .byte(position.satellites.unwrap_or(U8_NA))
            .optional(position.hdop)
            .optional(position.pdop)
            .optional(position.geoidal_separation)
            .byte(position.reference_stations.len() as u8)
            .byte(station.map_or(U8_NA, |s| s.station_type.raw()));
        let no_data = fields.missing();

        buffer.push_u16(station.map_or(U16_NA, |s| s.station_id));
        buffer.push_f64(station.and_then(|s| s.correction_age).unwrap_or(N2K_DOUBLE_NA));

        Ok(Conversion::Packet {
            payload_id: PayloadId::Gnss,
            buffer,
            no_data,
        })
    }

    fn environment(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let environment: EnvironmentalParameters = message.decode()?;
        let mut buffer = self.stamped(message, 3 * 8 + 2);
        let mut fields = Fields::new(&mut buffer);
        fields
            .byte(environment.temperature_source.raw())
            .required(environment.temperature)
            .byte(environment.humidity_source.raw())
            .required(environment.humidity)
            .required(environment.pressure);
        let no_data = fields.missing();
        Ok(Conversion::Packet {
            payload_id: PayloadId::Environment,
            buffer,
            no_data,
        })
    }

    fn temperature(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let temperature: n2k::Temperature = message.decode()?;
        Ok(self.temperature_packet(message, temperature.source, temperature.actual))
    }

    fn extended_temperature(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let temperature: TemperatureExtendedRange = message.decode()?;
        Ok(self.temperature_packet(message, temperature.source, temperature.actual))
    }

    fn temperature_packet(
        &self,
        message: &N2kMessage,
        source: TemperatureSource,
        actual: Option<f64>,
    ) -> Conversion {
        if !matches!(source, TemperatureSource::Sea | TemperatureSource::Outside) {
            return Conversion::NoPacket;
        }
        self.sourced_packet(message, PayloadId::Temperature, source.raw(), actual)
    }

    fn humidity(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let humidity: Humidity = message.decode()?;
        if humidity.source != HumiditySource::Outside {
            return Ok(Conversion::NoPacket);
        }
        Ok(self.sourced_packet(message, PayloadId::Humidity, humidity.source.raw(), humidity.actual))
    }

    fn pressure(&mut self, message: &N2kMessage) -> Result<Conversion, DecodeError> {
        let pressure: ActualPressure = message.decode()?;
        if pressure.source != PressureSource::Atmospheric {
            return Ok(Conversion::NoPacket);
        }
        Ok(self.sourced_packet(message, PayloadId::Pressure, pressure.source.raw(), pressure.pressure))
    }

    /// Timestamp, one source byte, one measurement.
    fn sourced_packet(
        &self,
        message: &N2kMessage,
        payload_id: PayloadId,
        source: u8,
        value: Option<f64>,
    ) -> Conversion {
        let mut buffer = self.stamped(message, 1 + 8);
        let mut fields = Fields::new(&mut buffer);
        fields.byte(source).required(value);
        let no_data = fields.missing();
        Conversion::Packet {
            payload_id,
            buffer,
            no_data,
        }
    }

    /// NMEA0183 sentence received at `elapsed_ms`.
    pub fn convert_sentence(&self, elapsed_ms: u32, sentence: &str) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(sentence.len() + 4);
        buffer.push_u32(elapsed_ms);
        buffer.push_str(sentence);
        Conversion::packet(PayloadId::NmeaString, buffer)
    }

    pub fn local_imu(&self, elapsed_ms: u32, sample: &ImuSample) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(4 + 7 * 4);
        buffer.push_u32(elapsed_ms);
        for value in sample.acceleration.iter().chain(&sample.rotation) {
            buffer.push_f32(*value);
        }
        buffer.push_f32(sample.temperature);
        Conversion::packet(PayloadId::LocalImu, buffer)
    }

    pub fn raw_imu(&self, elapsed_ms: u32, sample: &RawImuSample) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(4 + 7 * 2);
        buffer.push_u32(elapsed_ms);
        for value in sample.acceleration.iter().chain(&sample.rotation) {
            buffer.push_i16(*value);
        }
        buffer.push_i16(sample.temperature);
        Conversion::packet(PayloadId::RawImu, buffer)
    }

    pub fn sensor_scales(&self, scales: &SensorScales) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(4 * 4);
        buffer.push_f32(scales.acceleration);
        buffer.push_f32(scales.rotation);
        buffer.push_f32(scales.temperature);
        buffer.push_f32(scales.temperature_offset);
        Conversion::packet(PayloadId::SensorScales, buffer)
    }

    /// Request for a named post-processing algorithm with free-form parameters.
    pub fn algorithm_request(&self, name: &str, parameters: &str) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(8 + name.len() + parameters.len());
        buffer.push_counted_str(name);
        buffer.push_counted_str(parameters);
        Conversion::packet(PayloadId::AlgorithmRequest, buffer)
    }

    pub fn json_metadata(&self, metadata: &serde_json::Value) -> Conversion {
        let text = metadata.to_string();
        let mut buffer = ByteBuffer::with_capacity(4 + text.len());
        buffer.push_counted_str(&text);
        Conversion::packet(PayloadId::JsonMetadata, buffer)
    }

    /// Sentence type (e.g. `GGA`) the logger was configured to record.
    pub fn nmea0183_filter(&self, sentence_type: &str) -> Conversion {
        let mut buffer = ByteBuffer::with_capacity(4 + sentence_type.len());
        buffer.push_counted_str(sentence_type);
        Conversion::packet(PayloadId::Nmea0183Filter, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteCursor;
    use crate::time::{ManualClock, DEFAULT_TICK_FREQUENCY, MILLISECOND_TICK_FREQUENCY};

    fn factory(clock: &ManualClock) -> MessageFactory<&ManualClock> {
        MessageFactory::new(clock)
    }

    fn unwrap_packet(conversion: Conversion) -> (PayloadId, ByteBuffer, bool) {
        match conversion {
            Conversion::Packet { payload_id, buffer, no_data } => (payload_id, buffer, no_data),
            Conversion::NoPacket => panic!("expected a packet"),
        }
    }

    #[test]
    fn test_depth_without_time_reference() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        let message = N2kMessage::from_pgn(
            &WaterDepth {
                sid: 0,
                depth: Some(25.5),
                offset: Some(-0.3),
                range: Some(100.0),
            },
            35,
            12_345,
        );

        let (payload_id, buffer, no_data) = unwrap_packet(factory.convert(&message));
        assert_eq!(payload_id, PayloadId::Depth);
        assert!(!no_data);

        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u16().unwrap(), 0);
        assert_eq!(cursor.get_f64().unwrap(), -1.0);
        assert_eq!(cursor.get_u32().unwrap(), 12_345);
        assert!((cursor.get_f64().unwrap() - 25.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_depth_sets_no_data() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        let message = N2kMessage::from_pgn(
            &WaterDepth {
                sid: 0,
                depth: None,
                offset: None,
                range: None,
            },
            35,
            0,
        );

        let (_, buffer, no_data) = unwrap_packet(factory.convert(&message));
        assert!(no_data);
        let mut cursor = ByteCursor::new(&buffer.as_bytes()[TIME_DATUM_SIZE..]);
        assert_eq!(cursor.get_f64().unwrap(), N2K_DOUBLE_NA);
        assert_eq!(factory.get_stats().no_data, 1);
    }

    #[test]
    fn test_system_time_sets_reference() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        let time = N2kMessage::from_pgn(
            &SystemTime {
                sid: 0,
                source: TimeSource::Gps,
                date: Some(18_500),
                seconds: Some(1_000.0),
            },
            1,
            2_000,
        );
        assert!(factory.convert(&time).is_packet());
        assert!(factory.time_reference().is_valid());

        let attitude = N2kMessage::from_pgn(
            &Attitude {
                sid: 0,
                yaw: Some(0.1),
                pitch: Some(0.0),
                roll: Some(0.0),
            },
            1,
            4_500,
        );
        let (_, buffer, _) = unwrap_packet(factory.convert(&attitude));
        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u16().unwrap(), 18_500);
        assert!((cursor.get_f64().unwrap() - 1_002.5).abs() < 1e-9);
        assert_eq!(cursor.get_u32().unwrap(), 4_500);
    }

    fn time_at(seconds: f64, elapsed_ms: u32) -> N2kMessage {
        N2kMessage::from_pgn(
            &SystemTime {
                sid: 0,
                source: TimeSource::Gps,
                date: Some(18_500),
                seconds: Some(seconds),
            },
            1,
            elapsed_ms,
        )
    }

    fn depth_at(elapsed_ms: u32) -> N2kMessage {
        N2kMessage::from_pgn(
            &WaterDepth {
                sid: 0,
                depth: Some(10.0),
                offset: None,
                range: None,
            },
            35,
            elapsed_ms,
        )
    }

    #[test]
    fn test_message_older_than_reference_on_microsecond_clock() {
        let clock = ManualClock::new(DEFAULT_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        assert!(factory.convert(&time_at(10_000.0, 5_000_000)).is_packet());

        let (_, buffer, _) = unwrap_packet(factory.convert(&depth_at(1_000)));
        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u16().unwrap(), 18_500);
        assert!((cursor.get_f64().unwrap() - 5_001.0).abs() < 1e-9);
        assert_eq!(cursor.get_u32().unwrap(), 1_000);
    }

    #[test]
    fn test_timestamp_across_bus_counter_wrap() {
        let clock = ManualClock::new(DEFAULT_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        assert!(factory.convert(&time_at(86_399.5, u32::MAX - 499)).is_packet());

        let (_, buffer, _) = unwrap_packet(factory.convert(&depth_at(500)));
        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u16().unwrap(), 18_501);
        assert!((cursor.get_f64().unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(cursor.get_u32().unwrap(), 500);
    }

    #[test]
    fn test_message_before_midnight_reference_keeps_previous_day() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);
        assert!(factory.convert(&time_at(0.25, 10_000)).is_packet());

        let (_, buffer, _) = unwrap_packet(factory.convert(&depth_at(9_500)));
        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u16().unwrap(), 18_499);
        assert!((cursor.get_f64().unwrap() - 86_399.75).abs() < 1e-9);
    }

    #[test]
    fn test_filtered_sources_produce_nothing() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);

        let crystal = N2kMessage::from_pgn(
            &SystemTime {
                sid: 0,
                source: TimeSource::LocalCrystalClock,
                date: Some(1),
                seconds: Some(1.0),
            },
            1,
            0,
        );
        let magnetic = N2kMessage::from_pgn(
            &CogSogRapid {
                sid: 0,
                reference: HeadingReference::Magnetic,
                cog: Some(1.0),
                sog: Some(2.0),
            },
            1,
            0,
        );
        let cabin = N2kMessage::from_pgn(
            &n2k::Temperature {
                sid: 0,
                instance: 0,
                source: TemperatureSource::MainCabin,
                actual: Some(293.0),
                set: None,
            },
            1,
            0,
        );

        for message in [crystal, magnetic, cabin] {
            assert!(!factory.convert(&message).is_packet());
        }
        assert!(!factory.time_reference().is_valid());
        assert_eq!(factory.get_stats().filtered, 3);
    }

    #[test]
    fn test_unknown_and_malformed_messages() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let mut factory = factory(&clock);

        let unknown = N2kMessage::new(59_904, 0, 0, vec![0; 3]);
        let truncated = N2kMessage::new(n2k::PGN_GNSS_POSITION, 0, 0, vec![0; 10]);

        assert!(!factory.convert(&unknown).is_packet());
        assert!(!factory.convert(&truncated).is_packet());
        assert_eq!(factory.get_stats().unknown_pgn, 1);
        assert_eq!(factory.get_stats().parse_failures, 1);
    }

    #[test]
    fn test_sentence_payload() {
        let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
        let factory = factory(&clock);
        let (payload_id, buffer, _) = unwrap_packet(factory.convert_sentence(77, "$GPZDA,1*00\r\n"));

        assert_eq!(payload_id, PayloadId::NmeaString);
        assert_eq!(&buffer.as_bytes()[..4], &77u32.to_le_bytes());
        assert_eq!(&buffer.as_bytes()[4..], b"$GPZDA,1*00\r\n");
    }
}
