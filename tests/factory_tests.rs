use wibl_logger::n2k::*;
use wibl_logger::reader::decode_body;
use wibl_logger::time::{ManualClock, DEFAULT_TICK_FREQUENCY, MILLISECOND_TICK_FREQUENCY};
use wibl_logger::{Conversion, MessageFactory, PacketBody, PayloadId};

const DATE: u16 = 19_500;

fn expect_packet(conversion: Conversion) -> (PayloadId, PacketBody, bool) {
    match conversion {
        Conversion::Packet { payload_id, buffer, no_data } => {
            let body = decode_body(payload_id.as_u32(), buffer.as_bytes()).unwrap();
            (payload_id, body, no_data)
        }
        Conversion::NoPacket => panic!("expected a packet"),
    }
}

fn system_time(source: TimeSource, seconds: f64, elapsed_ms: u32) -> N2kMessage {
    let time = SystemTime {
        sid: 0,
        source,
        date: Some(DATE),
        seconds: Some(seconds),
    };
    N2kMessage::from_pgn(&time, 1, elapsed_ms)
}

fn temperature(source: TemperatureSource) -> N2kMessage {
    let value = Temperature {
        sid: 0,
        instance: 0,
        source,
        actual: Some(288.15),
        set: None,
    };
    N2kMessage::from_pgn(&value, 2, 100)
}

#[test]
fn test_system_time_anchors_later_timestamps() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let (id, body, no_data) = expect_packet(factory.convert(&system_time(TimeSource::Gps, 7200.0, 1000)));
    assert_eq!(id, PayloadId::SystemTime);
    assert!(!no_data);
    match body {
        PacketBody::SystemTime { date, seconds, elapsed_ms, source } => {
            assert_eq!(date, DATE);
            assert!((seconds - 7200.0).abs() < 1e-3);
            assert_eq!(elapsed_ms, 1000);
            assert_eq!(source, TimeSource::Gps.raw());
        }
        other => panic!("unexpected body {:?}", other),
    }
    assert!(factory.time_reference().is_valid());

    let depth = WaterDepth {
        sid: 0,
        depth: Some(25.0),
        offset: Some(0.0),
        range: Some(100.0),
    };
    let (_, body, _) = expect_packet(factory.convert(&N2kMessage::from_pgn(&depth, 3, 3500)));
    match body {
        PacketBody::Depth { time, depth, .. } => {
            assert_eq!(time.date, DATE);
            assert!((time.seconds - 7202.5).abs() < 1e-3);
            assert_eq!(time.elapsed_ms, 3500);
            assert!((depth - 25.0).abs() < 1e-9);
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_local_crystal_time_is_ignored() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let conversion = factory.convert(&system_time(TimeSource::LocalCrystalClock, 10.0, 10));
    assert!(!conversion.is_packet());
    assert!(!factory.time_reference().is_valid());
    assert_eq!(factory.get_stats().filtered, 1);
}

#[test]
fn test_missing_primary_measurement_sets_no_data() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let missing = Attitude {
        sid: 0,
        yaw: Some(0.5),
        pitch: None,
        roll: Some(-0.1),
    };
    let (_, body, no_data) = expect_packet(factory.convert(&N2kMessage::from_pgn(&missing, 4, 50)));
    assert!(no_data);
    match body {
        PacketBody::Attitude { pitch, .. } => assert_eq!(pitch, N2K_DOUBLE_NA),
        other => panic!("unexpected body {:?}", other),
    }

    // Offset and range are secondary; only depth itself counts
    let depth = WaterDepth {
        sid: 0,
        depth: Some(4.2),
        offset: None,
        range: None,
    };
    let (_, _, no_data) = expect_packet(factory.convert(&N2kMessage::from_pgn(&depth, 4, 60)));
    assert!(!no_data);
    assert_eq!(factory.get_stats().no_data, 1);
    assert_eq!(factory.get_stats().converted, 2);
}

#[test]
fn test_course_needs_true_reference() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let mut cog = CogSogRapid {
        sid: 0,
        reference: HeadingReference::Magnetic,
        cog: Some(1.0),
        sog: Some(3.0),
    };
    assert!(!factory.convert(&N2kMessage::from_pgn(&cog, 5, 10)).is_packet());

    cog.reference = HeadingReference::True;
    let (id, _, _) = expect_packet(factory.convert(&N2kMessage::from_pgn(&cog, 5, 20)));
    assert_eq!(id, PayloadId::Cog);
}

#[test]
fn test_environment_sources_are_filtered() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    assert!(factory.convert(&temperature(TemperatureSource::Sea)).is_packet());
    assert!(factory.convert(&temperature(TemperatureSource::Outside)).is_packet());
    assert!(!factory.convert(&temperature(TemperatureSource::EngineRoom)).is_packet());

    let inside = Humidity {
        sid: 0,
        instance: 0,
        source: HumiditySource::Inside,
        actual: Some(40.0),
        set: None,
    };
    assert!(!factory.convert(&N2kMessage::from_pgn(&inside, 2, 10)).is_packet());

    let outside = Humidity {
        source: HumiditySource::Outside,
        ..inside
    };
    let (id, body, _) = expect_packet(factory.convert(&N2kMessage::from_pgn(&outside, 2, 20)));
    assert_eq!(id, PayloadId::Humidity);
    match body {
        PacketBody::Humidity { humidity, source, .. } => {
            assert!((humidity - 40.0).abs() < 0.01);
            assert_eq!(source, HumiditySource::Outside.raw());
        }
        other => panic!("unexpected body {:?}", other),
    }

    let pressure = ActualPressure {
        sid: 0,
        instance: 0,
        source: PressureSource::Atmospheric,
        pressure: Some(101_325.0),
    };
    assert!(factory.convert(&N2kMessage::from_pgn(&pressure, 2, 30)).is_packet());

    assert_eq!(factory.get_stats().filtered, 2);
}

#[test]
fn test_gnss_position_records_first_reference_station() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let position = GnssPosition {
        sid: 0,
        date: Some(DATE),
        seconds: Some(3600.0),
        latitude: Some(43.0),
        longitude: Some(-75.0),
        altitude: Some(-12.0),
        gnss_type: GnssType::Gps,
        method: GnssMethod::Dgnss,
        integrity: 0,
        satellites: Some(12),
        hdop: Some(1.0),
        pdop: Some(1.5),
        geoidal_separation: Some(-32.5),
        reference_stations: vec![
            ReferenceStation {
                station_type: GnssType::Gps,
                station_id: 402,
                correction_age: Some(2.0),
            },
            ReferenceStation {
                station_type: GnssType::Glonass,
                station_id: 9,
                correction_age: None,
            },
        ],
    };

    let (_, body, no_data) = expect_packet(factory.convert(&N2kMessage::from_pgn(&position, 6, 400)));
    assert!(!no_data);
    match body {
        PacketBody::Gnss {
            latitude,
            longitude,
            satellites,
            reference_stations,
            reference_id,
            correction_age,
            receiver_method,
            ..
        } => {
            assert!((latitude - 43.0).abs() < 1e-9);
            assert!((longitude + 75.0).abs() < 1e-9);
            assert_eq!(satellites, 12);
            assert_eq!(reference_stations, 2);
            assert_eq!(reference_id, 402);
            assert!((correction_age - 2.0).abs() < 0.01);
            assert_eq!(receiver_method, GnssMethod::Dgnss.raw());
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_unknown_pgn_produces_nothing() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let message = N2kMessage::new(59_904, 7, 10, vec![0x00, 0xEE, 0x00]);
    assert!(!factory.convert(&message).is_packet());
    assert_eq!(factory.get_stats().unknown_pgn, 1);
}

#[test]
fn test_short_frame_counts_as_parse_failure() {
    let clock = ManualClock::new(MILLISECOND_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);

    let message = N2kMessage::new(PGN_WATER_DEPTH, 7, 10, vec![0x01, 0x02]);
    assert!(!factory.convert(&message).is_packet());
    assert_eq!(factory.get_stats().parse_failures, 1);
}

#[test]
fn test_timestamps_use_bus_counter_on_fast_clock() {
    let clock = ManualClock::new(DEFAULT_TICK_FREQUENCY);
    let mut factory = MessageFactory::new(&clock);
    assert!(factory.convert(&system_time(TimeSource::Gps, 10_000.0, 5_000_000)).is_packet());

    let attitude = Attitude {
        sid: 0,
        yaw: Some(0.1),
        pitch: Some(0.0),
        roll: Some(0.0),
    };
    let (_, body, _) = expect_packet(factory.convert(&N2kMessage::from_pgn(&attitude, 4, 1_000)));
    match body {
        PacketBody::Attitude { time, .. } => {
            assert_eq!(time.date, DATE);
            assert!((time.seconds - 5_001.0).abs() < 1e-3);
            assert_eq!(time.elapsed_ms, 1_000);
        }
        other => panic!("unexpected body {:?}", other),
    }

    // Bus counter wraps between the reference and the next message
    assert!(factory.convert(&system_time(TimeSource::Gps, 20_000.0, u32::MAX - 999)).is_packet());
    let (_, body, _) = expect_packet(factory.convert(&N2kMessage::from_pgn(&attitude, 4, 1_000)));
    match body {
        PacketBody::Attitude { time, .. } => {
            assert_eq!(time.date, DATE);
            assert!((time.seconds - 20_002.0).abs() < 1e-3);
        }
        other => panic!("unexpected body {:?}", other),
    }
}
