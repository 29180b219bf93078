use crate::buffer::ByteBuffer;
use crate::config::LoggerIdentity;
use crate::registry::{PayloadId, SERIALISER_VERSION_MAJOR, SERIALISER_VERSION_MINOR};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, trace};

const VERSION_PAYLOAD_SIZE: usize = 22;
const FRAME_HEADER_SIZE: u64 = 8;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("payload id 0 is reserved for the serialiser version packet")]
    ReservedPayloadId,
    #[error("packet write failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl SoftwareVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl core::fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Versions of the three logical producers recorded in the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerVersions {
    pub nmea2000: SoftwareVersion,
    pub nmea0183: SoftwareVersion,
    pub imu: SoftwareVersion,
}

impl Default for ProducerVersions {
    fn default() -> Self {
        Self {
            nmea2000: SoftwareVersion::new(1, 0, 2),
            nmea0183: SoftwareVersion::new(1, 0, 2),
            imu: SoftwareVersion::new(1, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriterConfig {
    pub identity: LoggerIdentity,
    pub versions: ProducerVersions,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WriterStats {
    pub packets_written: u32,
    pub bytes_written: u64,
    pub packets_rejected: u32,
}

/// Anything that accepts finished payloads.
pub trait PacketSink {
    fn record(&mut self, payload_id: PayloadId, payload: &ByteBuffer) -> Result<(), PacketError>;
}

/// Frames packets as `[u32 payload id][u32 payload length][payload]`. A new
/// writer emits the version packet, the logger metadata and then the optional
/// setup document.
#[derive(Debug)]
pub struct PacketWriter<W: Write> {
    sink: W,
    stats: WriterStats,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(sink: W, config: &WriterConfig) -> Result<Self, PacketError> {
        let mut writer = Self {
            sink,
            stats: WriterStats::default(),
        };

        let version = version_payload(&config.versions);
        writer.raw_process(PayloadId::SerialiserVersion.as_u32(), &version)?;

        let identity = &config.identity;
        let mut metadata = ByteBuffer::with_capacity(8 + identity.name.len() + identity.identifier.len());
        metadata.push_counted_str(&identity.name);
        metadata.push_counted_str(&identity.identifier);
        writer.raw_process(PayloadId::Metadata.as_u32(), &metadata)?;

        if let Some(setup) = &identity.setup {
            let text = setup.to_string();
            let mut payload = ByteBuffer::with_capacity(text.len() + 4);
            payload.push_counted_str(&text);
            writer.raw_process(PayloadId::Setup.as_u32(), &payload)?;
        }

        debug!(
            "Log preamble written for logger '{}' ({})",
            identity.name, identity.identifier
        );
        Ok(writer)
    }

    /// Frame and write a caller-supplied packet. Id 0 is refused without
    /// touching the sink.
    pub fn process(&mut self, payload_id: u32, payload: &ByteBuffer) -> Result<(), PacketError> {
        if payload_id == PayloadId::SerialiserVersion.as_u32() {
            self.stats.packets_rejected += 1;
            return Err(PacketError::ReservedPayloadId);
        }
        self.raw_process(payload_id, payload)
    }

    fn raw_process(&mut self, payload_id: u32, payload: &ByteBuffer) -> Result<(), PacketError> {
        let length = payload.len() as u32;

        // A failure part-way leaves the stream where it stopped; readers must
        // treat the tail as suspect.
        self.sink.write_all(&payload_id.to_le_bytes())?;
        self.sink.write_all(&length.to_le_bytes())?;
        self.sink.write_all(payload.as_bytes())?;
        self.sink.flush()?;

        self.stats.packets_written += 1;
        self.stats.bytes_written += FRAME_HEADER_SIZE + u64::from(length);
        trace!("Wrote packet id {} with {} payload bytes", payload_id, length);
        Ok(())
    }

    pub fn get_stats(&self) -> &WriterStats {
        &self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> PacketSink for PacketWriter<W> {
    fn record(&mut self, payload_id: PayloadId, payload: &ByteBuffer) -> Result<(), PacketError> {
        self.process(payload_id.as_u32(), payload)
    }
}

fn version_payload(versions: &ProducerVersions) -> ByteBuffer {
    let mut payload = ByteBuffer::with_capacity(VERSION_PAYLOAD_SIZE);
    payload.push_u16(SERIALISER_VERSION_MAJOR);
    payload.push_u16(SERIALISER_VERSION_MINOR);
    for version in [versions.nmea2000, versions.nmea0183, versions.imu] {
        payload.push_u16(version.major);
        payload.push_u16(version.minor);
        payload.push_u16(version.patch);
    }
    payload
}

/// Serialiser format version as printed in status reports.
pub fn serialiser_version() -> String {
    format!("{}.{}", SERIALISER_VERSION_MAJOR, SERIALISER_VERSION_MINOR)
}
