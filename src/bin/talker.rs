use clap::{App, Arg};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn, Level};
use wibl_logger::buffer::ByteCursor;
use wibl_logger::config::OutputProtocols;
use wibl_logger::nmea0183::SentenceFilter;
use wibl_logger::simulator::EngineStats;
use wibl_logger::{
    ByteBuffer, LoggerConfig, PacketError, PacketSink, PacketWriter, PayloadId, SimulationEngine,
    SimulatorConfig, WriterConfig,
};

const DEFAULT_PORT: &str = "10110";
const SENTENCE_BUFFER_SIZE: usize = 256;

/// Requests a client may send, one JSON object per line.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum ClientCommand {
    Status,
    /// Restrict this connection to the listed sentence types; empty clears.
    Filter { sentences: Vec<String> },
}

#[derive(Debug, Serialize)]
struct StatusReport {
    latitude: f64,
    longitude: f64,
    depth: f64,
    engine: EngineStats,
}

#[derive(Debug, Serialize)]
struct Reply {
    ok: bool,
    message: String,
}

/// Collects the sentences emitted during a step, optionally recording them.
struct TalkerSink {
    sentences: Vec<String>,
    log: Option<PacketWriter<BufWriter<File>>>,
}

impl PacketSink for TalkerSink {
    fn record(&mut self, payload_id: PayloadId, payload: &ByteBuffer) -> Result<(), PacketError> {
        if payload_id == PayloadId::NmeaString {
            let mut cursor = ByteCursor::new(payload.as_bytes());
            match cursor.get_u32().and_then(|_| cursor.get_rest_str()) {
                Ok(text) => self.sentences.push(text),
                Err(e) => warn!("Skipping undecodable sentence payload: {}", e),
            }
        }
        match self.log.as_mut() {
            Some(log) => log.record(payload_id, payload),
            None => Ok(()),
        }
    }
}

fn ticks_to_duration(ticks: u64, frequency: u64) -> Duration {
    Duration::from_micros(ticks.saturating_mul(1_000_000) / frequency.max(1))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("wibl-talker")
        .version("0.1.0")
        .author("Ocean Mapping Data Logger Team")
        .about("Serve simulated NMEA0183 sentences over TCP in real time")
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("TCP port to listen on")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .validator(|v| match v.parse::<u16>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Port must be a number between 0 and 65535".into()),
                }),
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
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log")
                .short("l")
                .long("log")
                .value_name("FILE")
                .help("Also record the sentences to a log file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging"),
        )
        .get_matches();

    let level = if matches.is_present("verbose") { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match matches.value_of("config") {
        Some(path) => LoggerConfig::from_json_file(path)?,
        None => LoggerConfig {
            simulator: SimulatorConfig::millisecond_ticks(),
            ..Default::default()
        },
    };
    let mut simulator = config.simulator.clone();
    simulator.protocols = OutputProtocols {
        nmea0183: true,
        nmea2000: false,
    };
    if let Some(seed) = matches.value_of("seed") {
        simulator.seed = seed.parse()?;
    }

    let log = match matches.value_of("log") {
        Some(path) => {
            let writer_config = WriterConfig {
                identity: config.identity.clone(),
                ..Default::default()
            };
            info!("Recording sentences to {}", path);
            Some(PacketWriter::new(BufWriter::new(File::create(path)?), &writer_config)?)
        }
        None => None,
    };

    let port: u16 = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse()?;
    let frequency = simulator.tick_frequency;
    let engine = Arc::new(Mutex::new(SimulationEngine::new(&simulator)));
    let (sentence_tx, _) = broadcast::channel::<String>(SENTENCE_BUFFER_SIZE);

    let server_engine = Arc::clone(&engine);
    let server_tx = sentence_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_tcp_server(port, server_engine, server_tx).await {
            error!("TCP server error: {}", e);
        }
    });

    info!("NMEA0183 talker running on port {}", port);

    let mut sink = TalkerSink {
        sentences: Vec::new(),
        log,
    };
    loop {
        let report = {
            let mut engine_guard = engine.lock().await;
            engine_guard.step(&mut sink)
        };
        for sentence in sink.sentences.drain(..) {
            debug!("{}", sentence.trim_end());
            // No subscribers is not an error for a talker
            let _ = sentence_tx.send(sentence);
        }

        let wait = report.following_event.saturating_sub(report.next_event);
        tokio::select! {
            _ = tokio::time::sleep(ticks_to_duration(wait, frequency)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down talker");
                break;
            }
        }
    }

    if let Some(log) = sink.log.take() {
        let stats = *log.get_stats();
        info!("Recorded {} packets ({} bytes)", stats.packets_written, stats.bytes_written);
    }

    Ok(())
}

async fn start_tcp_server(
    port: u16,
    engine: Arc<Mutex<SimulationEngine>>,
    sentence_tx: broadcast::Sender<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("TCP server listening on port {}", port);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New client connected: {}", addr);
                let client_engine = Arc::clone(&engine);
                let sentence_rx = sentence_tx.subscribe();

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, client_engine, sentence_rx).await {
                        error!("Client handler error: {}", e);
                    }
                    info!("Client disconnected: {}", addr);
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    engine: Arc<Mutex<SimulationEngine>>,
    mut sentence_rx: broadcast::Receiver<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (reader, writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let writer = Arc::new(Mutex::new(writer));
    let filter = Arc::new(Mutex::new(SentenceFilter::new()));

    let stream_writer = Arc::clone(&writer);
    let stream_filter = Arc::clone(&filter);
    let stream_task = tokio::spawn(async move {
        loop {
            let sentence = match sentence_rx.recv().await {
                Ok(sentence) => sentence,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Client fell behind, {} sentences dropped", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if !stream_filter.lock().await.accepts(&sentence) {
                continue;
            }
            let mut writer_guard = stream_writer.lock().await;
            if let Err(e) = writer_guard.write_all(sentence.as_bytes()).await {
                warn!("Failed to send sentence: {}", e);
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let response = match serde_json::from_str::<ClientCommand>(trimmed) {
                    Ok(ClientCommand::Status) => {
                        let engine_guard = engine.lock().await;
                        let state = engine_guard.state();
                        serde_json::to_string(&StatusReport {
                            latitude: state.current_latitude,
                            longitude: state.current_longitude,
                            depth: state.current_depth,
                            engine: *engine_guard.get_stats(),
                        })?
                    }
                    Ok(ClientCommand::Filter { sentences }) => {
                        let mut updated = SentenceFilter::new();
                        let mut reply = Reply {
                            ok: true,
                            message: format!("filter set to {} sentence types", sentences.len()),
                        };
                        for kind in &sentences {
                            if let Err(e) = updated.add(kind) {
                                reply = Reply {
                                    ok: false,
                                    message: format!("{}: {}", kind, e),
                                };
                                break;
                            }
                        }
                        if reply.ok {
                            *filter.lock().await = updated;
                        }
                        serde_json::to_string(&reply)?
                    }
                    Err(e) => {
                        warn!("Invalid client command: {}", e);
                        serde_json::to_string(&Reply {
                            ok: false,
                            message: format!("invalid command: {}", e),
                        })?
                    }
                };

                let mut writer_guard = writer.lock().await;
                writer_guard.write_all(response.as_bytes()).await?;
                writer_guard.write_all(b"\r\n").await?;
            }
            Err(e) => {
                warn!("Error reading from client: {}", e);
                break;
            }
        }
    }

    stream_task.abort();
    Ok(())
}
