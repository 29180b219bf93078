use clap::{App, Arg};
use colored::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, warn, Level};
use wibl_logger::reader::LoggedTime;
use wibl_logger::{LogReader, Packet, PacketBody};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("wibl-dump")
        .version("0.1.0")
        .author("Ocean Mapping Data Logger Team")
        .about("Print the packets recorded in a data logger file")
        .arg(
            Arg::with_name("file")
                .value_name("FILE")
                .help("Log file to read")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("type")
                .short("t")
                .long("type")
                .value_name("NAME")
                .help("Only show packets with this payload name (e.g. Depth)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).init();

    let path = matches.value_of("file").unwrap_or_default();
    let format = matches.value_of("format").unwrap_or("table");
    let wanted = matches.value_of("type");

    let mut reader = LogReader::new(BufReader::new(File::open(path)?));
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped reading {}: {}", path, e);
                break;
            }
        };
        debug!("Packet {} id {} ({} bytes)", reader.packets_read(), packet.payload_id, packet.length);

        *counts.entry(packet.name).or_insert(0) += 1;
        if wanted.is_some_and(|name| !name.eq_ignore_ascii_case(packet.name)) {
            continue;
        }

        match format {
            "json" => println!("{}", serde_json::to_string(&packet)?),
            "compact" => println!("{:>3} {:<18} {:>6}", packet.payload_id, packet.name, packet.length),
            _ => print_packet(&packet),
        }
    }

    if format != "json" {
        println!();
        println!("{}", "Packet Summary".bright_blue().bold());
        for (name, count) in &counts {
            println!("  {:<18} {}", name, count.to_string().bright_cyan());
        }
        println!("  {:<18} {}", "Total".bold(), reader.packets_read().to_string().bright_white());
    }

    Ok(())
}

fn stamp(time: &LoggedTime) -> String {
    if time.is_valid() {
        format!("day {} {:>9.3}s", time.date, time.seconds)
    } else {
        format!("{} {:>7}ms", "no time".dimmed(), time.elapsed_ms)
    }
}

fn print_packet(packet: &Packet) {
    let name = format!("{:<18}", packet.name).bright_green();
    let detail = match &packet.body {
        PacketBody::SerialiserVersion { major, minor, nmea2000, nmea0183, imu } => format!(
            "format {}.{}, nmea2000 {}.{}.{}, nmea0183 {}.{}.{}, imu {}.{}.{}",
            major,
            minor,
            nmea2000.major,
            nmea2000.minor,
            nmea2000.patch,
            nmea0183.major,
            nmea0183.minor,
            nmea0183.patch,
            imu.major,
            imu.minor,
            imu.patch
        ),
        PacketBody::SystemTime { date, seconds, elapsed_ms, source } => {
            format!("day {} {:.3}s at {}ms (source {})", date, seconds, elapsed_ms, source)
        }
        PacketBody::Attitude { time, yaw, pitch, roll } => {
            format!("{} yaw {:.4} pitch {:.4} roll {:.4}", stamp(time), yaw, pitch, roll)
        }
        PacketBody::Depth { time, depth, offset, range } => {
            format!("{} depth {:.2}m offset {:.2}m range {:.1}m", stamp(time), depth, offset, range)
        }
        PacketBody::Cog { time, course, speed } => {
            format!("{} course {:.4} speed {:.2}", stamp(time), course, speed)
        }
        PacketBody::Gnss { time, latitude, longitude, altitude, satellites, .. } => format!(
            "{} {:.6}, {:.6} alt {:.1}m, {} satellites",
            stamp(time),
            latitude,
            longitude,
            altitude,
            satellites
        ),
        PacketBody::Environment { time, temperature, humidity, pressure, .. } => format!(
            "{} {:.2}K {:.1}% {:.0}Pa",
            stamp(time),
            temperature,
            humidity,
            pressure
        ),
        PacketBody::Temperature { time, source, temperature } => {
            format!("{} {:.2}K (source {})", stamp(time), temperature, source)
        }
        PacketBody::Humidity { time, source, humidity } => {
            format!("{} {:.1}% (source {})", stamp(time), humidity, source)
        }
        PacketBody::Pressure { time, source, pressure } => {
            format!("{} {:.0}Pa (source {})", stamp(time), pressure, source)
        }
        PacketBody::NmeaString { elapsed_ms, sentence } => {
            format!("{:>7}ms {}", elapsed_ms, sentence.trim_end())
        }
        PacketBody::LocalImu { elapsed_ms, sample } => format!(
            "{:>7}ms acc {:?} rot {:?} temp {:.1}",
            elapsed_ms, sample.acceleration, sample.rotation, sample.temperature
        ),
        PacketBody::RawImu { elapsed_ms, sample } => {
            format!("{:>7}ms {:?}", elapsed_ms, sample)
        }
        PacketBody::Metadata { name, identifier } => format!("{} ({})", name, identifier),
        PacketBody::AlgorithmRequest { name, parameters } => format!("{} [{}]", name, parameters),
        PacketBody::JsonMetadata { json } | PacketBody::Setup { json } => json.clone(),
        PacketBody::Nmea0183Filter { sentence_type } => sentence_type.clone(),
        PacketBody::SensorScales { scales } => format!("{:?}", scales),
        PacketBody::Unknown { data } => format!("{} bytes", data.len()).yellow().to_string(),
    };
    println!("{:>3} {} {}", packet.payload_id.to_string().dimmed(), name, detail);
}
