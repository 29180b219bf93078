use std::collections::HashMap;
use wibl_logger::nmea0183;
use wibl_logger::*;

const HOUR_MS: u64 = 3_600_000;

fn millisecond_config(nmea0183: bool, nmea2000: bool) -> SimulatorConfig {
    SimulatorConfig {
        protocols: OutputProtocols { nmea0183, nmea2000 },
        ..SimulatorConfig::millisecond_ticks()
    }
}

/// Run the engine for `duration` ticks past its first event, logging into memory.
fn simulate(config: &SimulatorConfig, duration: u64) -> (SimulationEngine, Vec<u8>) {
    let mut writer = PacketWriter::new(Vec::new(), &WriterConfig::default()).unwrap();
    let mut engine = SimulationEngine::new(config);

    let first = engine.step(&mut writer).next_event;
    let mut current = first;
    while current - first < duration {
        current = engine.step(&mut writer).next_event;
    }
    (engine, writer.into_inner())
}

fn packets(log: &[u8]) -> Vec<Packet> {
    LogReader::new(log).collect::<Result<Vec<_>, _>>().unwrap()
}

#[test]
fn test_generated_log_parses_completely() {
    let config = millisecond_config(true, true);
    let (engine, log) = simulate(&config, 120_000);
    let packets = packets(&log);

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for packet in &packets {
        *counts.entry(packet.name).or_insert(0) += 1;
    }

    let stats = engine.get_stats();
    assert_eq!(counts["SerialiserVersion"], 1);
    assert_eq!(counts["Metadata"], 1);
    assert_eq!(counts["SystemTime"], stats.time_events);
    assert_eq!(counts["GNSS"], stats.position_events);
    assert_eq!(counts["Depth"], stats.depth_events);
    assert_eq!(
        counts["NMEAString"],
        stats.time_events + stats.position_events + stats.depth_events
    );

    // Two minutes: one time and one position event per second
    assert!(stats.time_events >= 120);
    assert!(stats.depth_events >= 60 && stats.depth_events <= 121);
}

#[test]
fn test_generated_sentences_carry_valid_checksums() {
    let (_, log) = simulate(&millisecond_config(true, false), 30_000);

    let mut kinds: HashMap<String, u32> = HashMap::new();
    for packet in packets(&log) {
        if let PacketBody::NmeaString { sentence, .. } = packet.body {
            let parsed = nmea0183::parse(&sentence).unwrap();
            *kinds.entry(parsed.kind.to_string()).or_insert(0) += 1;
        }
    }

    assert!(kinds["ZDA"] >= 30);
    assert!(kinds["GGA"] >= 30);
    assert!(kinds["DBT"] >= 15);
}

#[test]
fn test_serial_only_log_has_no_binary_packets() {
    let (_, log) = simulate(&millisecond_config(true, false), 10_000);
    for packet in packets(&log).iter().skip(2) {
        assert_eq!(packet.payload_id, PayloadId::NmeaString.as_u32());
    }
}

#[test]
fn test_binary_timestamps_follow_simulated_clock() {
    let (_, log) = simulate(&millisecond_config(false, true), 10_000);

    let mut last_elapsed = 0;
    for packet in packets(&log) {
        if let PacketBody::Depth { time, depth, .. } | PacketBody::Gnss { time, altitude: depth, .. } =
            packet.body
        {
            assert!(time.is_valid());
            assert!(time.elapsed_ms >= last_elapsed);
            assert!(depth.is_finite());
            last_elapsed = time.elapsed_ms;
        }
    }
    assert!(last_elapsed >= 10_000);
}

#[test]
fn test_same_seed_gives_identical_logs() {
    let config = SimulatorConfig {
        seed: 0x5EED,
        ..millisecond_config(true, true)
    };
    let (_, first) = simulate(&config, 60_000);
    let (_, second) = simulate(&config, 60_000);
    assert_eq!(first, second);

    let other = SimulatorConfig { seed: 0xD1FF, ..config };
    let (_, third) = simulate(&other, 60_000);
    assert_ne!(first, third);
}

#[test]
fn test_latitude_direction_reverses_hourly() {
    let config = millisecond_config(false, true);
    let (engine, _) = simulate(&config, 2 * HOUR_MS + 5_000);

    let state = engine.state();
    assert_eq!(engine.get_stats().latitude_reversals, 2);
    // Two flips bring the direction back to north-going
    assert!(state.latitude_scale > 0.0);
    assert!(state.last_latitude_reversal > HOUR_MS);
}

#[test]
fn test_position_advances_each_second() {
    let config = millisecond_config(false, true);
    let mut writer = PacketWriter::new(Vec::new(), &WriterConfig::default()).unwrap();
    let mut engine = SimulationEngine::new(&config);

    engine.step(&mut writer);
    let start = engine.state().current_longitude;
    let start_events = engine.get_stats().position_events;

    while engine.get_stats().position_events < start_events + 10 {
        engine.step(&mut writer);
    }
    let moved = engine.state().current_longitude - start;
    assert!((moved - 10.0 * config.position_step_deg).abs() < 1e-9);
}
