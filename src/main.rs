use anyhow::{Context, Result};
use blockwipe::crypto::{EntropySource, FileEntropy, RingEntropy};
use blockwipe::logging::init_tracing;
use blockwipe::ui::progress::ProgressConfig;
use blockwipe::*;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "blockwipe")]
#[command(about = "Securely erase block devices with standard overwrite methods")]
#[command(version)]
struct Cli {
    /// Devices to wipe (e.g., /dev/sdb /dev/sdc)
    #[arg(required = true)]
    devices: Vec<PathBuf>,

    /// Wipe method (zero, one, dodshort, dod522022m, ops2, gutmann, random, is5enh, verify_zero, verify_one)
    #[arg(short, long, env = "WIPE_METHOD", default_value = "dodshort")]
    method: Method,

    /// Number of times to run the method
    #[arg(short, long, env = "WIPE_ROUNDS", default_value_t = 1)]
    rounds: u32,

    /// Which passes to read back (off, last, all)
    #[arg(long, env = "WIPE_VERIFY", default_value = "last")]
    verify: VerifyLevel,

    /// Do not blank the device with zeros after the last round
    #[arg(long)]
    noblank: bool,

    /// PRNG for random passes (twister, isaac, isaac64, lagged_fibonacci, aes_ctr, chacha20,
    /// ascon_prf, rc4, xoroshiro256, sha_drbg)
    #[arg(short, long, env = "WIPE_PRNG", default_value = "isaac64")]
    prng: PrngKind,

    /// Transfer size in bytes; defaults to the size the device reports
    #[arg(long)]
    block_size: Option<usize>,

    /// Entropy source: a device path, or "ring" for the OS generator
    #[arg(long, env = "WIPE_ENTROPY", default_value = FileEntropy::DEFAULT_PATH)]
    entropy: String,

    /// How often progress is sampled (e.g. 250ms, 2s)
    #[arg(long, default_value = "250ms", value_parser = humantime::parse_duration)]
    poll_interval: Duration,

    /// How often a progress line is logged
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    status_every: Duration,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Write log lines to this file instead of stderr
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Do not install SIGINT/SIGTERM/SIGHUP handlers
    #[arg(long)]
    nosignals: bool,
}

impl Cli {
    fn options(&self) -> WipeOptions {
        WipeOptions {
            method: self.method,
            rounds: self.rounds,
            verify: self.verify,
            noblank: self.noblank,
            prng: self.prng,
            block_size: self.block_size,
        }
    }

    fn entropy(&self) -> Result<Arc<dyn EntropySource>> {
        if self.entropy.eq_ignore_ascii_case("ring") {
            return Ok(Arc::new(RingEntropy::new()));
        }
        let source = FileEntropy::open(&self.entropy)
            .with_context(|| format!("Failed to open entropy source {}", self.entropy))?;
        Ok(Arc::new(source))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = init_tracing(cli.debug, cli.logfile.as_deref())?;

    let options = cli.options().validate().context("Invalid wipe options")?;
    let cancel = CancelToken::new();
    if !cli.nosignals {
        setup_signal_handlers(cancel.clone())?;
    }

    let (log, log_writer) = EventLog::spawn().context("Failed to start event log")?;
    let entropy = cli.entropy()?;

    let mut session = WipeSession::new(options, cancel, log.clone())?.with_progress_config(
        ProgressConfig {
            poll_interval: cli.poll_interval,
            ..Default::default()
        },
    );
    for path in &cli.devices {
        session
            .open_device(path, Arc::clone(&entropy))
            .with_context(|| format!("Failed to prepare {}", path.display()))?;
    }

    tracing::info!(
        devices = session.len(),
        method = %session.options().method,
        rounds = session.options().rounds,
        verify = %session.options().verify,
        prng = %session.options().prng,
        "Starting wipe"
    );

    let mut status_rx = session.subscribe();
    let status_every = cli.status_every;
    let reporter = tokio::spawn(async move {
        let mut last = Instant::now();
        while status_rx.changed().await.is_ok() {
            if last.elapsed() >= status_every {
                last = Instant::now();
                tracing::info!("{}", status_rx.borrow().summary_line());
            }
        }
    });

    let report = session.run().await;
    if let Err(e) = reporter.await {
        tracing::warn!("Status reporter ended abnormally: {}", e);
    }

    drop(log);
    if log_writer.join().is_err() {
        tracing::warn!("Event log writer panicked");
    }

    println!();
    for device in &report.devices {
        println!("{}", device.summary_line());
    }

    let code = exit_code(report.worst_result());
    drop(guard);
    std::process::exit(code);
}

fn exit_code(result: ResultCode) -> i32 {
    match result {
        ResultCode::Clean => 0,
        ResultCode::CompletedWithErrors => 1,
        ResultCode::Cancelled => 130,
        ResultCode::Fatal | ResultCode::Pending => 2,
    }
}

// Signal handler for graceful shutdown
fn setup_signal_handlers(cancel: CancelToken) -> Result<()> {
    use signal_hook::{
        consts::{SIGHUP, SIGINT, SIGTERM},
        iterator::Signals,
    };

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                eprintln!("\nSignal {} received, stopping after the current block...", sig);
                tracing::warn!(signal = sig, "Cancelling all wipes");
                cancel.cancel_with_signal(sig);
            }
        })?;

    Ok(())
}
