//! # WIBL Logger
//!
//! Binary log format, packet codec and data simulator for low-cost
//! crowd-sourced bathymetry loggers.
//!
//! ## Features
//!
//! - **Self-describing log format**: versioned preamble followed by framed, typed packets
//! - **NMEA2000 conversion**: ten parameter groups turned into log payloads, with
//!   "not available" detection
//! - **NMEA0183 sentences**: construction, checksums, validation and filtering
//! - **Time reference**: real time projected from a wrapping tick counter
//! - **Simulator**: reproducible time, position and depth feed in either protocol
//!
//! ## Quick Start
//!
//! ```rust
//! use wibl_logger::{LogReader, PacketWriter, SimulationEngine, SimulatorConfig, WriterConfig};
//!
//! let mut writer = PacketWriter::new(Vec::new(), &WriterConfig::default())?;
//! let mut engine = SimulationEngine::new(&SimulatorConfig::default());
//! for _ in 0..10 {
//!     engine.step(&mut writer);
//! }
//!
//! let log = writer.into_inner();
//! let packets = LogReader::new(log.as_slice()).collect::<Result<Vec<_>, _>>()?;
//! assert!(packets.len() > 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`buffer`] - Growable little-endian payload buffer and matching cursor
//! - [`registry`] - Payload identifiers
//! - [`writer`] - Packet framing and log preamble
//! - [`time`] - Tick clocks, time reference and calendar time
//! - [`n2k`] - NMEA2000 parameter group codecs
//! - [`nmea0183`] - Sentence construction and recognition
//! - [`factory`] - Bus message to payload conversion
//! - [`simulator`] - Simulated data engine
//! - [`reader`] - Log parsing

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]

pub mod buffer;
pub mod config;
pub mod factory;
pub mod n2k;
pub mod nmea0183;
pub mod reader;
pub mod registry;
pub mod rng;
pub mod simulator;
pub mod time;
pub mod writer;

// Re-export main public types for convenience
pub use buffer::{ByteBuffer, ByteCursor, DecodeError};
pub use config::{LoggerConfig, LoggerIdentity, OutputProtocols, SimulatorConfig};
pub use factory::{Conversion, MessageFactory};
pub use n2k::{N2kKind, N2kMessage};
pub use reader::{LogReader, Packet, PacketBody};
pub use registry::PayloadId;
pub use simulator::{SimulationEngine, StepReport};
pub use time::{ComponentDateTime, TickClock, TimeDatum, TimeReference};
pub use writer::{PacketError, PacketSink, PacketWriter, WriterConfig};
