use crate::buffer::{ByteCursor, DecodeError};
use crate::factory::{ImuSample, RawImuSample, SensorScales};
use crate::registry::PayloadId;
use crate::writer::SoftwareVersion;
use serde::Serialize;
use std::io::{self, Read};
use thiserror::Error;

const FRAME_HEADER_SIZE: usize = 8;
// Largest payload accepted before the length field is assumed corrupt
const MAX_PAYLOAD_SIZE: u32 = 1 << 20;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("log read failed: {0}")]
    Io(#[from] io::Error),
    #[error("log ends part-way through packet {packet}")]
    Truncated { packet: u64 },
    #[error("packet {packet} claims {length} payload bytes")]
    Oversized { packet: u64, length: u32 },
    #[error("packet {packet} ({payload_id}) is malformed: {source}")]
    Payload {
        packet: u64,
        payload_id: u32,
        #[source]
        source: DecodeError,
    },
}

/// Time datum as stored at the front of most payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoggedTime {
    pub date: u16,
    pub seconds: f64,
    pub elapsed_ms: u32,
}

impl LoggedTime {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            date: cursor.get_u16()?,
            seconds: cursor.get_f64()?,
            elapsed_ms: cursor.get_u32()?,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.seconds >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PacketBody {
    SerialiserVersion {
        major: u16,
        minor: u16,
        nmea2000: SoftwareVersion,
        nmea0183: SoftwareVersion,
        imu: SoftwareVersion,
    },
    SystemTime {
        date: u16,
        seconds: f64,
        elapsed_ms: u32,
        source: u8,
    },
    Attitude {
        time: LoggedTime,
        yaw: f64,
        pitch: f64,
        roll: f64,
    },
    Depth {
        time: LoggedTime,
        depth: f64,
        offset: f64,
        range: f64,
    },
    Cog {
        time: LoggedTime,
        course: f64,
        speed: f64,
    },
    Gnss {
        time: LoggedTime,
        date: u16,
        seconds: f64,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        receiver_type: u8,
        receiver_method: u8,
        satellites: u8,
        hdop: f64,
        pdop: f64,
        geoid_separation: f64,
        reference_stations: u8,
        reference_type: u8,
        reference_id: u16,
        correction_age: f64,
    },
    Environment {
        time: LoggedTime,
        temperature_source: u8,
        temperature: f64,
        humidity_source: u8,
        humidity: f64,
        pressure: f64,
    },
    Temperature {
        time: LoggedTime,
        source: u8,
        temperature: f64,
    },
    Humidity {
        time: LoggedTime,
        source: u8,
        humidity: f64,
    },
    Pressure {
        time: LoggedTime,
        source: u8,
        pressure: f64,
    },
    NmeaString {
        elapsed_ms: u32,
        sentence: String,
    },
    LocalImu {
        elapsed_ms: u32,
        sample: ImuSample,
    },
    Metadata {
        name: String,
        identifier: String,
    },
    AlgorithmRequest {
        name: String,
        parameters: String,
    },
    JsonMetadata {
        json: String,
    },
    Nmea0183Filter {
        sentence_type: String,
    },
    SensorScales {
        scales: SensorScales,
    },
    RawImu {
        elapsed_ms: u32,
        sample: RawImuSample,
    },
    Setup {
        json: String,
    },
    /// Payload id this reader does not know.
    Unknown {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    pub payload_id: u32,
    pub name: &'static str,
    pub length: u32,
    pub body: PacketBody,
}

/// Streams packets out of a log.
pub struct LogReader<R: Read> {
    source: R,
    packets_read: u64,
}

impl<R: Read> LogReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            packets_read: 0,
        }
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Next packet, or `None` at a clean end of log.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, ReadError> {
        let mut header = [0u8; FRAME_HEADER_SIZE];
        match read_full(&mut self.source, &mut header)? {
            0 => return Ok(None),
            FRAME_HEADER_SIZE => {}
            _ => {
                return Err(ReadError::Truncated {
                    packet: self.packets_read,
                })
            }
        }

        let payload_id = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length > MAX_PAYLOAD_SIZE {
            return Err(ReadError::Oversized {
                packet: self.packets_read,
                length,
            });
        }

        let mut payload = vec![0u8; length as usize];
        if read_full(&mut self.source, &mut payload)? != payload.len() {
            return Err(ReadError::Truncated {
                packet: self.packets_read,
            });
        }

        let body = decode_body(payload_id, &payload).map_err(|source| ReadError::Payload {
            packet: self.packets_read,
            payload_id,
            source,
        })?;
        self.packets_read += 1;

        Ok(Some(Packet {
            payload_id,
            name: PayloadId::from_u32(payload_id).map_or("Unknown", PayloadId::name),
            length,
            body,
        }))
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<Packet, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

/// Like `read_exact`, but reports how much was read before end of stream.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_version(cursor: &mut ByteCursor<'_>) -> Result<SoftwareVersion, DecodeError> {
    Ok(SoftwareVersion::new(cursor.get_u16()?, cursor.get_u16()?, cursor.get_u16()?))
}

fn read_triple<T>(
    cursor: &mut ByteCursor<'_>,
    mut get: impl FnMut(&mut ByteCursor<'_>) -> Result<T, DecodeError>,
) -> Result<[T; 3], DecodeError> {
    Ok([get(cursor)?, get(cursor)?, get(cursor)?])
}

/// Decode one payload according to its registry layout.
pub fn decode_body(payload_id: u32, payload: &[u8]) -> Result<PacketBody, DecodeError> {
    let Some(id) = PayloadId::from_u32(payload_id) else {
        return Ok(PacketBody::Unknown {
            data: payload.to_vec(),
        });
    };

    let mut c = ByteCursor::new(payload);
    let body = match id {
        PayloadId::SerialiserVersion => PacketBody::SerialiserVersion {
            major: c.get_u16()?,
            minor: c.get_u16()?,
            nmea2000: read_version(&mut c)?,
            nmea0183: read_version(&mut c)?,
            imu: read_version(&mut c)?,
        },
        PayloadId::SystemTime => PacketBody::SystemTime {
            date: c.get_u16()?,
            seconds: c.get_f64()?,
            elapsed_ms: c.get_u32()?,
            source: c.get_u8()?,
        },
        PayloadId::Attitude => PacketBody::Attitude {
            time: LoggedTime::read(&mut c)?,
            yaw: c.get_f64()?,
            pitch: c.get_f64()?,
            roll: c.get_f64()?,
        },
        PayloadId::Depth => PacketBody::Depth {
            time: LoggedTime::read(&mut c)?,
            depth: c.get_f64()?,
            offset: c.get_f64()?,
            range: c.get_f64()?,
        },
        PayloadId::Cog => PacketBody::Cog {
            time: LoggedTime::read(&mut c)?,
            course: c.get_f64()?,
            speed: c.get_f64()?,
        },
        PayloadId::Gnss => PacketBody::Gnss {
            time: LoggedTime::read(&mut c)?,
            date: c.get_u16()?,
            seconds: c.get_f64()?,
            latitude: c.get_f64()?,
            longitude: c.get_f64()?,
            altitude: c.get_f64()?,
            receiver_type: c.get_u8()?,
            receiver_method: c.get_u8()?,
            satellites: c.get_u8()?,
            hdop: c.get_f64()?,
            pdop: c.get_f64()?,
            geoid_separation: c.get_f64()?,
            reference_stations: c.get_u8()?,
            reference_type: c.get_u8()?,
            reference_id: c.get_u16()?,
            correction_age: c.get_f64()?,
        },
        PayloadId::Environment => PacketBody::Environment {
            time: LoggedTime::read(&mut c)?,
            temperature_source: c.get_u8()?,
            temperature: c.get_f64()?,
            humidity_source: c.get_u8()?,
            humidity: c.get_f64()?,
            pressure: c.get_f64()?,
        },
        PayloadId::Temperature => PacketBody::Temperature {
            time: LoggedTime::read(&mut c)?,
            source: c.get_u8()?,
            temperature: c.get_f64()?,
        },
        PayloadId::Humidity => PacketBody::Humidity {
            time: LoggedTime::read(&mut c)?,
            source: c.get_u8()?,
            humidity: c.get_f64()?,
        },
        PayloadId::Pressure => PacketBody::Pressure {
            time: LoggedTime::read(&mut c)?,
            source: c.get_u8()?,
            pressure: c.get_f64()?,
        },
        PayloadId::NmeaString => PacketBody::NmeaString {
            elapsed_ms: c.get_u32()?,
            sentence: c.get_rest_str()?,
        },
        PayloadId::LocalImu => PacketBody::LocalImu {
            elapsed_ms: c.get_u32()?,
            sample: ImuSample {
                acceleration: read_triple(&mut c, |c| c.get_f32())?,
                rotation: read_triple(&mut c, |c| c.get_f32())?,
                temperature: c.get_f32()?,
            },
        },
        PayloadId::Metadata => PacketBody::Metadata {
            name: c.get_counted_str()?,
            identifier: c.get_counted_str()?,
        },
        PayloadId::AlgorithmRequest => PacketBody::AlgorithmRequest {
            name: c.get_counted_str()?,
            parameters: c.get_counted_str()?,
        },
        PayloadId::JsonMetadata => PacketBody::JsonMetadata {
            json: c.get_counted_str()?,
        },
        PayloadId::Nmea0183Filter => PacketBody::Nmea0183Filter {
            sentence_type: c.get_counted_str()?,
        },
        PayloadId::SensorScales => PacketBody::SensorScales {
            scales: SensorScales {
                acceleration: c.get_f32()?,
                rotation: c.get_f32()?,
                temperature: c.get_f32()?,
                temperature_offset: c.get_f32()?,
            },
        },
        PayloadId::RawImu => PacketBody::RawImu {
            elapsed_ms: c.get_u32()?,
            sample: RawImuSample {
                acceleration: read_triple(&mut c, |c| c.get_i16())?,
                rotation: read_triple(&mut c, |c| c.get_i16())?,
                temperature: c.get_i16()?,
            },
        },
        PayloadId::Setup => PacketBody::Setup {
            json: c.get_counted_str()?,
        },
    };

    c.finish()?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteBuffer;
    use crate::writer::{PacketSink, PacketWriter, WriterConfig};

    #[test]
    fn test_reads_preamble() {
        let writer = PacketWriter::new(Vec::new(), &WriterConfig::default()).unwrap();
        let bytes = writer.into_inner();

        let packets: Vec<Packet> = LogReader::new(bytes.as_slice())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(packets.len(), 2);
        assert!(matches!(
            packets[0].body,
            PacketBody::SerialiserVersion { major: 1, minor: 3, .. }
        ));
        match &packets[1].body {
            PacketBody::Metadata { name, identifier } => {
                assert_eq!(name, "UNKNOWN");
                assert_eq!(identifier, "wibl-logger");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncated_packet() {
        let mut writer = PacketWriter::new(Vec::new(), &WriterConfig::default()).unwrap();
        let mut payload = ByteBuffer::new();
        payload.push_u32(10);
        payload.push_str("$GPZDA");
        writer.record(PayloadId::NmeaString, &payload).unwrap();

        let mut bytes = writer.into_inner();
        bytes.truncate(bytes.len() - 2);

        let mut reader = LogReader::new(bytes.as_slice());
        assert!(reader.next_packet().unwrap().is_some());
        assert!(reader.next_packet().unwrap().is_some());
        assert!(matches!(reader.next_packet(), Err(ReadError::Truncated { packet: 2 })));
    }

    #[test]
    fn test_unknown_payload_kept_raw() {
        let body = decode_body(99, &[1, 2, 3]).unwrap();
        assert_eq!(body, PacketBody::Unknown { data: vec![1, 2, 3] });
    }

    #[test]
    fn test_short_payload_is_error() {
        let result = decode_body(PayloadId::Depth.as_u32(), &[0; 20]);
        assert!(matches!(result, Err(DecodeError::UnexpectedEnd { .. })));
    }
}
