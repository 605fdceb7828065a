//! Replay recorded GPS fixes through the motion-state engine
//!
//! Reads newline-delimited JSON fixes (one `Fix` object per line) from a file
//! or stdin and prints one JSON line per fix with the motion snapshot, the
//! rendered speed, any sampling-profile change and whether a place-name lookup
//! is due. Handy for tuning thresholds against real recordings.
//!
//! Usage:
//!   fix-replay drive.jsonl --query "powersave=true&unit=mph"
//!   cat drive.jsonl | fix-replay --config overlay.toml --ack-refresh

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info};
use serde::Serialize;

use motion_core::{
    ConfigError, Fix, FixProcessor, LocationRefreshGate, MotionSnapshot, OverlayConfig,
    ProfileSwitcher, SamplingOptions, SpeedReading, SpeedReadout,
};

#[derive(Parser, Debug)]
#[command(name = "fix-replay", about = "Replay JSON-lines GPS fixes through the motion engine")]
struct Cli {
    /// Input file with one JSON fix per line (stdin when omitted).
    input: Option<PathBuf>,

    /// Overlay config TOML file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// URL-style overlay switches, e.g. "powersave=true&unit=mph".
    #[arg(long, short)]
    query: Option<String>,

    /// Acknowledge stationary-info refreshes as soon as they fire.
    #[arg(long)]
    ack_refresh: bool,

    /// Reset motion state when fixes are further apart than this (ms),
    /// as a host does when returning from the background.
    #[arg(long)]
    reset_gap_ms: Option<u64>,

    /// Print the effective config as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid fix on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// One output line
#[derive(Debug, Serialize)]
struct ReplayRecord<'a> {
    line: usize,
    snapshot: &'a MotionSnapshot,
    speed: SpeedReading,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampling: Option<SamplingOptions>,
    place_lookup_due: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ReplayOptions {
    ack_refresh: bool,
    reset_gap_ms: Option<u64>,
}

/// Host-side state for one replay
struct Replay {
    processor: FixProcessor,
    readout: SpeedReadout,
    profile: ProfileSwitcher,
    gate: LocationRefreshGate,
    options: ReplayOptions,
    last_timestamp_ms: Option<u64>,
}

impl Replay {
    fn new(config: &OverlayConfig, options: ReplayOptions) -> Self {
        Self {
            processor: FixProcessor::new(config.motion),
            readout: SpeedReadout::new(config.display.unit),
            profile: ProfileSwitcher::new(config.power_save),
            gate: LocationRefreshGate::from_config(config),
            options,
            last_timestamp_ms: None,
        }
    }

    fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> Result<usize, ReplayError> {
        let mut count = 0;

        for (idx, line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fix: Fix = serde_json::from_str(&line).map_err(|source| ReplayError::Json {
                line: line_no,
                source,
            })?;

            self.reset_after_gap(fix.timestamp_ms);
            let snapshot = self.processor.ingest(fix);
            if snapshot.should_refresh_stationary_info && self.options.ack_refresh {
                self.processor.acknowledge_refresh(fix.timestamp_ms);
            }

            // Lookups are assumed to succeed
            let place_lookup_due = self.gate.should_refresh(fix.position(), fix.timestamp_ms);
            if place_lookup_due {
                self.gate.record_success(fix.position(), fix.timestamp_ms);
            }

            let record = ReplayRecord {
                line: line_no,
                snapshot: &snapshot,
                speed: self.readout.update(snapshot.smoothed_speed_mps),
                sampling: self.profile.observe(&snapshot),
                place_lookup_due,
            };
            serde_json::to_writer(&mut out, &record).map_err(io::Error::from)?;
            out.write_all(b"\n")?;
            count += 1;
        }

        out.flush()?;
        Ok(count)
    }

    fn reset_after_gap(&mut self, timestamp_ms: u64) {
        if let (Some(gap), Some(last)) = (self.options.reset_gap_ms, self.last_timestamp_ms) {
            if timestamp_ms.saturating_sub(last) > gap {
                info!("{} ms gap before t={}, resetting", timestamp_ms - last, timestamp_ms);
                self.processor.reset();
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);
    }
}

fn load_config(cli: &Cli) -> Result<OverlayConfig, ReplayError> {
    let mut config = match &cli.config {
        Some(path) => OverlayConfig::load_from_file(path)?,
        None => OverlayConfig::default(),
    };
    if let Some(query) = &cli.query {
        config.apply_query(query);
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), ReplayError> {
    let config = load_config(cli)?;

    let stdout = io::stdout();
    if cli.print_config {
        let mut out = stdout.lock();
        out.write_all(config.to_toml_string()?.as_bytes())?;
        return Ok(());
    }

    let options = ReplayOptions {
        ack_refresh: cli.ack_refresh,
        reset_gap_ms: cli.reset_gap_ms,
    };
    let mut replay = Replay::new(&config, options);
    let out = BufWriter::new(stdout.lock());

    let count = match &cli.input {
        Some(path) => replay.run(BufReader::new(File::open(path)?), out)?,
        None => replay.run(io::stdin().lock(), out)?,
    };

    let stats = replay.processor.stats();
    info!(
        "Replayed {} fixes: {} accepted, {} rejected, {} held, {} glitches",
        count, stats.accepted, stats.rejected, stats.held, stats.glitches
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}
