use clap::{App, Arg};
use colored::*;
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;
use tracing::{debug, info, Level};
use wibl_logger::{
    LoggerConfig, OutputProtocols, PacketWriter, SimulationEngine, SimulatorConfig, WriterConfig,
};

const DEFAULT_DURATION_S: &str = "3600";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("wibl-simulate")
        .version("0.1.0")
        .author("Ocean Mapping Data Logger Team")
        .about("Generate a simulated data logger file of NMEA0183 and/or NMEA2000 data")
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .value_name("FILE")
                .help("Output log file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("duration")
                .short("d")
                .long("duration")
                .value_name("SECONDS")
                .help("Simulated time to generate")
                .takes_value(true)
                .default_value(DEFAULT_DURATION_S)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Duration must be a whole number of seconds".into()),
                }),
        )
        .arg(
            Arg::with_name("serial")
                .short("s")
                .long("serial")
                .help("Emit NMEA0183 sentences"),
        )
        .arg(
            Arg::with_name("binary")
                .short("b")
                .long("binary")
                .help("Emit NMEA2000 binary packets"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("JSON")
                .help("Logger and simulator configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Random seed for the simulated noise")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Seed must be an unsigned integer".into()),
                }),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Report every simulation step"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let serial = matches.is_present("serial");
    let binary = matches.is_present("binary");
    let mut config = match matches.value_of("config") {
        Some(path) => LoggerConfig::from_json_file(path)?,
        None => LoggerConfig {
            simulator: SimulatorConfig {
                protocols: OutputProtocols {
                    nmea0183: false,
                    nmea2000: false,
                },
                ..Default::default()
            },
            ..Default::default()
        },
    };
    if serial || binary || matches.value_of("config").is_none() {
        config.simulator.protocols = OutputProtocols {
            nmea0183: serial,
            nmea2000: binary,
        };
    }
    if let Some(seed) = matches.value_of("seed") {
        config.simulator.seed = seed.parse()?;
    }

    let filename = matches.value_of("file").unwrap_or_default();
    let duration_s: u64 = matches.value_of("duration").unwrap_or(DEFAULT_DURATION_S).parse()?;
    let duration = duration_s * config.simulator.tick_frequency;

    println!("{}", "WIBL data simulator".bright_blue().bold());
    println!("{} {}", "Writing to".dimmed(), filename.bright_white());

    let output = BufWriter::new(File::create(filename)?);
    let writer_config = WriterConfig {
        identity: config.identity.clone(),
        ..Default::default()
    };
    let mut writer = PacketWriter::new(output, &writer_config)?;
    let mut engine = SimulationEngine::new(&config.simulator);

    let started = Instant::now();
    let first_time = engine.step(&mut writer).next_event;
    let mut current_time = first_time;
    info!("First generation time step: {}", first_time);
    while current_time - first_time < duration {
        current_time = engine.step(&mut writer).next_event;
        debug!("Step to time: {}", current_time);
    }

    let stats = *writer.get_stats();
    let engine_stats = *engine.get_stats();
    let failures = engine.generator().get_stats().write_failures;

    println!(
        "{} {} packets, {} bytes, {} simulated seconds in {:.2?}",
        "✅".green(),
        stats.packets_written.to_string().bright_cyan(),
        stats.bytes_written.to_string().bright_cyan(),
        duration_s,
        started.elapsed()
    );
    println!(
        "   time {}, position {}, depth {}, latitude reversals {}",
        engine_stats.time_events, engine_stats.position_events, engine_stats.depth_events, engine_stats.latitude_reversals
    );
    if failures > 0 {
        println!("{} {} packets could not be written", "⚠️".yellow(), failures.to_string().bright_red());
    }

    Ok(())
}
