use crate::buffer::ByteBuffer;
use crate::config::{OutputProtocols, SimulatorConfig};
use crate::nmea0183::{
    clamp_seconds, format_angle, within_standard_length, SentenceBuilder, SentenceError,
    SentenceText,
};
use crate::registry::PayloadId;
use crate::rng::Noise;
use crate::time::{ticks_to_milliseconds, ComponentDateTime, TIME_DATUM_SIZE};
use crate::writer::PacketSink;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

const SECONDS_PER_HOUR: u64 = 3600;
const FEET_PER_METRE: f64 = 3.2808;
const FATHOMS_PER_METRE: f64 = 0.5468;

// Fixed GNSS solution reported with every simulated position
const GNSS_ALTITUDE_M: f64 = -19.323;
const GNSS_RECEIVER_TYPE: u8 = 0; // GPS
const GNSS_RECEIVER_METHOD: u8 = 2; // DGNSS
const GNSS_SATELLITES: u8 = 12;
const GNSS_HDOP: f64 = 1.5;
const GNSS_PDOP: f64 = 2.2;
const GNSS_GEOID_SEPARATION_M: f64 = 22.3453;
const GNSS_REFERENCE_STATIONS: u8 = 1;
const GNSS_REFERENCE_TYPE: u8 = 4; // All constellations
const GNSS_REFERENCE_ID: u16 = 12312;
const GNSS_CORRECTION_AGE_S: f64 = 2.32;
const GGA_SOLUTION_FIELDS: &str = "3,12,1.0,-19.5,M,22.5,M,0.0,0000";

const DEPTH_OFFSET_M: f64 = 0.0;
const DEPTH_RANGE_M: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Time,
    Position,
    Depth,
}

/// Which channels produced output on a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredChannels {
    pub time: bool,
    pub position: bool,
    pub depth: bool,
}

impl FiredChannels {
    pub fn any(&self) -> bool {
        self.time || self.position || self.depth
    }

    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Time => self.time,
            Channel::Position => self.position,
            Channel::Depth => self.depth,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        [Channel::Time, Channel::Position, Channel::Depth]
            .into_iter()
            .filter(|channel| self.contains(*channel))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Tick that was simulated by this step.
    pub next_event: u64,
    /// Earliest tick at which any channel is due again.
    pub following_event: u64,
    pub fired: FiredChannels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub current_depth: f64,
    pub current_latitude: f64,
    pub current_longitude: f64,

    pub target_depth_time: u64,
    pub target_position_time: u64,
    pub target_reference_time: u64,

    pub depth_random_walk: f64,
    pub measurement_uncertainty: f64,
    pub position_step: f64,
    /// +1.0 or -1.0: direction of latitude travel.
    pub latitude_scale: f64,
    pub last_latitude_reversal: u64,

    /// Calendar at the last simulated tick.
    pub sim_time: ComponentDateTime,
    /// Calendar at the last time-channel update.
    pub ref_time: ComponentDateTime,
}

impl SimulationState {
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            current_depth: config.initial_depth_m,
            current_latitude: config.initial_latitude_deg,
            current_longitude: config.initial_longitude_deg,
            target_depth_time: 0,
            target_position_time: 0,
            target_reference_time: 0,
            depth_random_walk: config.depth_random_walk_m,
            measurement_uncertainty: config.measurement_uncertainty_m,
            position_step: config.position_step_deg,
            latitude_scale: 1.0,
            last_latitude_reversal: 0,
            sim_time: ComponentDateTime::new(config.initial_year, config.tick_frequency),
            ref_time: ComponentDateTime::new(config.initial_year, config.tick_frequency),
        }
    }

    pub fn tick_frequency(&self) -> u64 {
        self.sim_time.tick_frequency()
    }

    pub fn next_event(&self) -> u64 {
        self.target_depth_time
            .min(self.target_position_time)
            .min(self.target_reference_time)
    }

    fn elapsed_ms(&self) -> u32 {
        ticks_to_milliseconds(self.sim_time.tick_count, self.tick_frequency()) as u32
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub packets_recorded: u32,
    pub sentences_recorded: u32,
    pub write_failures: u32,
}

/// Renders simulation state as log packets.
#[derive(Debug, Clone)]
pub struct Generator {
    nmea0183: bool,
    nmea2000: bool,
    stats: GeneratorStats,
}

impl Generator {
    pub fn new(protocols: OutputProtocols) -> Self {
        let mut nmea2000 = protocols.nmea2000;
        if !protocols.nmea0183 && !protocols.nmea2000 {
            warn!("Neither NMEA0183 nor NMEA2000 output requested; defaulting to NMEA2000");
            nmea2000 = true;
        }
        Self {
            nmea0183: protocols.nmea0183,
            nmea2000,
            stats: GeneratorStats::default(),
        }
    }

    pub fn protocols(&self) -> OutputProtocols {
        OutputProtocols {
            nmea0183: self.nmea0183,
            nmea2000: self.nmea2000,
        }
    }

    pub fn get_stats(&self) -> &GeneratorStats {
        &self.stats
    }

    pub fn emit_time<S: PacketSink + ?Sized>(&mut self, state: &SimulationState, sink: &mut S) {
        if self.nmea2000 {
            self.record(sink, PayloadId::SystemTime, &system_time_payload(state));
        }
        if self.nmea0183 {
            self.record_sentence(sink, state, zda_sentence(state));
        }
    }

    pub fn emit_position<S: PacketSink + ?Sized>(&mut self, state: &SimulationState, sink: &mut S) {
        if self.nmea2000 {
            self.record(sink, PayloadId::Gnss, &gnss_payload(state));
        }
        if self.nmea0183 {
            self.record_sentence(sink, state, gga_sentence(state));
        }
    }

    /// Depth packets carry the true depth; the sounder sentence adds
    /// measurement noise drawn from `noise`.
    pub fn emit_depth<S: PacketSink + ?Sized>(
        &mut self,
        state: &SimulationState,
        noise: &mut Noise,
        sink: &mut S,
    ) {
        if self.nmea2000 {
            self.record(sink, PayloadId::Depth, &depth_payload(state));
        }
        if self.nmea0183 {
            let measured = state.current_depth + noise.normal(state.measurement_uncertainty);
            self.record_sentence(sink, state, dbt_sentence(measured));
        }
    }

    fn record<S: PacketSink + ?Sized>(&mut self, sink: &mut S, payload_id: PayloadId, payload: &ByteBuffer) {
        match sink.record(payload_id, payload) {
            Ok(()) => self.stats.packets_recorded += 1,
            Err(e) => {
                self.stats.write_failures += 1;
                warn!("Failed to record {} packet: {}", payload_id, e);
            }
        }
    }

    fn record_sentence<S: PacketSink + ?Sized>(
        &mut self,
        sink: &mut S,
        state: &SimulationState,
        sentence: Result<SentenceText, SentenceError>,
    ) {
        let text = match sentence {
            Ok(text) => text,
            Err(e) => {
                warn!("Dropping simulated sentence: {}", e);
                return;
            }
        };
        if !within_standard_length(&text) {
            debug!("Sentence exceeds NMEA0183 length limit ({} bytes)", text.len());
        }
        trace!("Sentence: {}", text.trim_end());

        self.record(sink, PayloadId::NmeaString, &nmea_string_payload(state.elapsed_ms(), &text));
        self.stats.sentences_recorded += 1;
    }
}

pub fn system_time_payload(state: &SimulationState) -> ByteBuffer {
    let reference = &state.ref_time;
    let mut payload = ByteBuffer::with_capacity(TIME_DATUM_SIZE + 1);
    payload.push_u16(reference.days_since_epoch());
    payload.push_f64(reference.seconds_in_day());
    payload.push_u32(ticks_to_milliseconds(reference.tick_count, reference.tick_frequency()) as u32);
    payload.push_u8(0);
    payload
}

pub fn gnss_payload(state: &SimulationState) -> ByteBuffer {
    let time = &state.sim_time;
    let mut payload = ByteBuffer::with_capacity(TIME_DATUM_SIZE + 2 * 2 + 8 * 8 + 5);
    time.time_datum().serialise(&mut payload);
    payload.push_u16(time.days_since_epoch());
    payload.push_f64(time.seconds_in_day());
    payload.push_f64(state.current_latitude);
    payload.push_f64(state.current_longitude);
    payload.push_f64(GNSS_ALTITUDE_M);
    payload.push_u8(GNSS_RECEIVER_TYPE);
    payload.push_u8(GNSS_RECEIVER_METHOD);
    payload.push_u8(GNSS_SATELLITES);
    payload.push_f64(GNSS_HDOP);
    payload.push_f64(GNSS_PDOP);
    payload.push_f64(GNSS_GEOID_SEPARATION_M);
    payload.push_u8(GNSS_REFERENCE_STATIONS);
    payload.push_u8(GNSS_REFERENCE_TYPE);
    payload.push_u16(GNSS_REFERENCE_ID);
    payload.push_f64(GNSS_CORRECTION_AGE_S);
    payload
}

pub fn depth_payload(state: &SimulationState) -> ByteBuffer {
    let mut payload = ByteBuffer::with_capacity(TIME_DATUM_SIZE + 3 * 8);
    state.sim_time.time_datum().serialise(&mut payload);
    payload.push_f64(state.current_depth);
    payload.push_f64(DEPTH_OFFSET_M);
    payload.push_f64(DEPTH_RANGE_M);
    payload
}

/// NMEAString payload: receive time in milliseconds, then the sentence text.
pub fn nmea_string_payload(elapsed_ms: u32, text: &str) -> ByteBuffer {
    let mut payload = ByteBuffer::with_capacity(text.len() + 4);
    payload.push_u32(elapsed_ms);
    payload.push_str(text);
    payload
}

pub fn zda_sentence(state: &SimulationState) -> Result<SentenceText, SentenceError> {
    let time = &state.sim_time;
    let (month, day) = time.month_day();

    let mut sentence = SentenceBuilder::new("GP", "ZDA")?;
    sentence
        .push_field(format_args!("{:02}{:02}{:06.3}", time.hour, time.minute, clamp_seconds(time.second)))?
        .push_field(format_args!("{:02}", day))?
        .push_field(format_args!("{:02}", month))?
        .push_field(format_args!("{:04}", time.year))?
        .push_field("00")?
        .push_field("00")?;
    sentence.finish()
}

pub fn gga_sentence(state: &SimulationState) -> Result<SentenceText, SentenceError> {
    let time = &state.sim_time;
    let latitude = format_angle(state.current_latitude);
    let longitude = format_angle(state.current_longitude);

    let mut sentence = SentenceBuilder::new("GP", "GGA")?;
    sentence
        .push_field(format_args!("{:02}{:02}{:06.3}", time.hour, time.minute, clamp_seconds(time.second)))?
        .push_field(format_args!("{:02}{:09.6}", latitude.degrees, latitude.minutes))?
        .push_field(latitude.hemisphere('N', 'S'))?
        .push_field(format_args!("{:03}{:09.6}", longitude.degrees, longitude.minutes))?
        .push_field(longitude.hemisphere('E', 'W'))?
        .push_field(GGA_SOLUTION_FIELDS)?;
    sentence.finish()
}

/// Depth-below-transducer sentence for a depth in metres.
pub fn dbt_sentence(depth_m: f64) -> Result<SentenceText, SentenceError> {
    let mut sentence = SentenceBuilder::new("SD", "DBT")?;
    sentence
        .push_field(format_args!("{:.1}", depth_m * FEET_PER_METRE))?
        .push_field("f")?
        .push_field(format_args!("{:.1}", depth_m))?
        .push_field("M")?
        .push_field(format_args!("{:.1}", depth_m * FATHOMS_PER_METRE))?
        .push_field("F")?;
    sentence.finish()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineStats {
    pub steps: u64,
    pub time_events: u64,
    pub position_events: u64,
    pub depth_events: u64,
    pub latitude_reversals: u32,
}

/// Pull-driven simulator: each step advances to the next due event.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    state: SimulationState,
    generator: Generator,
    noise: Noise,
    stats: EngineStats,
}

impl SimulationEngine {
    pub fn new(config: &SimulatorConfig) -> Self {
        info!(
            "Simulator starting at ({:.4}, {:.4}), depth {:.1} m, seed {:#x}",
            config.initial_latitude_deg, config.initial_longitude_deg, config.initial_depth_m, config.seed
        );
        Self {
            state: SimulationState::new(config),
            generator: Generator::new(config.protocols),
            noise: Noise::seeded(config.seed),
            stats: EngineStats::default(),
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn get_stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn next_event(&self) -> u64 {
        self.state.next_event()
    }

    /// Jump to the earliest due event and emit whatever fired there.
    pub fn step<S: PacketSink + ?Sized>(&mut self, sink: &mut S) -> StepReport {
        let next = self.state.next_event();
        self.step_at(next, sink)
    }

    /// Simulate the tick `now` supplied by an external clock. Every channel
    /// due at or before `now` fires once.
    pub fn step_at<S: PacketSink + ?Sized>(&mut self, now: u64, sink: &mut S) -> StepReport {
        self.state.sim_time.update(now);

        let fired = FiredChannels {
            time: self.step_time(now),
            position: self.step_position(now),
            depth: self.step_depth(now),
        };

        if fired.time {
            self.generator.emit_time(&self.state, sink);
        }
        if fired.position {
            self.generator.emit_position(&self.state, sink);
        }
        if fired.depth {
            self.generator.emit_depth(&self.state, &mut self.noise, sink);
        }

        self.stats.steps += 1;
        StepReport {
            next_event: now,
            following_event: self.state.next_event(),
            fired,
        }
    }

    fn step_time(&mut self, now: u64) -> bool {
        if now < self.state.target_reference_time {
            return false;
        }
        self.state.ref_time.update(now);
        self.state.target_reference_time = self.state.ref_time.tick_count + self.state.tick_frequency();
        self.stats.time_events += 1;
        true
    }

    fn step_position(&mut self, now: u64) -> bool {
        if now < self.state.target_position_time {
            return false;
        }
        let state = &mut self.state;
        state.current_latitude += state.latitude_scale * state.position_step;
        state.current_longitude += state.position_step;

        let frequency = state.tick_frequency();
        if now.saturating_sub(state.last_latitude_reversal) > SECONDS_PER_HOUR * frequency {
            state.latitude_scale = -state.latitude_scale;
            state.last_latitude_reversal = now;
            self.stats.latitude_reversals += 1;
            debug!("Latitude direction reversed at tick {}", now);
        }

        state.target_position_time = now + frequency;
        self.stats.position_events += 1;
        true
    }

    fn step_depth(&mut self, now: u64) -> bool {
        if now < self.state.target_depth_time {
            return false;
        }
        self.state.current_depth += self.noise.normal(self.state.depth_random_walk);

        let frequency = self.state.tick_frequency();
        let jitter = (frequency as f64 * self.noise.uniform()) as u64;
        self.state.target_depth_time = now + frequency + jitter;
        self.stats.depth_events += 1;
        true
    }
}
