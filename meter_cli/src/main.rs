//! Metering node binary: logging setup, config loading, and command dispatch.

mod cli;
mod error_fmt;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use meter_config::{Config, Logging};
use meter_core::{DisplayPresenter, MeterSession, runner};
use meter_hardware::{SimulatedAdc, SimulatedCanvas, SimulatedRadio};
use meter_traits::clock::MonotonicClock;
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

fn main() {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    if let Err(report) = run(args) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", error_fmt::to_json(&report));
        } else {
            eprintln!("{}", error_fmt::humanize(&report));
        }
        std::process::exit(1);
    }
}

fn run(args: Cli) -> eyre::Result<()> {
    if !args.json {
        color_eyre::install()?;
    }
    let cfg = load_config(&args)?;
    init_logging(&args, &cfg.logging)?;

    match args.cmd {
        Commands::Run {
            cycles,
            uplink_interval_ms,
            lag,
        } => run_node(&cfg, cycles, uplink_interval_ms, lag, args.json),
        Commands::Measure { lag } => measure_once(&cfg, lag, args.json),
        Commands::SelfCheck => self_check(&cfg),
    }
}

fn load_config(args: &Cli) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("failed to read config {}", args.config.display()))?;
    let cfg = meter_config::load_toml(&text).wrap_err("failed to parse config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console layer filtered by `--log-level` (RUST_LOG wins), plus an optional
/// JSON-lines file layer per `[logging]`. Logs go to stderr so JSON data on
/// stdout stays clean.
fn init_logging(args: &Cli, log_cfg: &Logging) -> eyre::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .wrap_err("invalid --log-level")?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let console: Box<dyn Layer<Registry> + Send + Sync> = if args.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    layers.push(console);

    if let Some(path) = &log_cfg.file {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
        let appender = match log_cfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let filter = EnvFilter::try_new(log_cfg.level.as_deref().unwrap_or("info"))
            .wrap_err("invalid logging.level")?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
    Ok(())
}

fn make_adc(lag: Option<f64>) -> SimulatedAdc {
    match lag {
        Some(radians) => SimulatedAdc::inductive(radians),
        None => SimulatedAdc::resistive(),
    }
}

fn run_node(
    cfg: &Config,
    cycles: Option<u64>,
    interval_override: Option<u64>,
    lag: Option<f64>,
    json: bool,
) -> eyre::Result<()> {
    let session = MeterSession::new(make_adc(lag), &cfg.adc, &cfg.calibration, &cfg.sampling)?;
    let mut radio = SimulatedRadio::init(&cfg.device.device_eui, &cfg.device.app_eui)?;
    let mut canvas = SimulatedCanvas::default();

    let mut uplink = cfg.uplink;
    if let Some(ms) = interval_override {
        uplink.interval_ms = ms;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("failed to install Ctrl-C handler")?;
    }
    let ticks = Cell::new(0u64);
    let stop: Box<dyn Fn() -> bool> = Box::new(move || {
        if shutdown.load(Ordering::SeqCst) {
            return true;
        }
        match cycles {
            Some(limit) => {
                let t = ticks.get();
                ticks.set(t + 1);
                t >= limit
            }
            None => false,
        }
    });

    let done = runner::run(
        session,
        &mut radio,
        &mut canvas,
        Arc::new(MonotonicClock::new()),
        &cfg.device.name,
        &uplink,
        &cfg.join,
        &cfg.runner,
        &cfg.display,
        Some(stop),
    )?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "event": "run_complete", "cycles": done })
        );
    } else {
        println!("completed {done} measurement cycles");
    }
    Ok(())
}

fn measure_once(cfg: &Config, lag: Option<f64>, json: bool) -> eyre::Result<()> {
    let mut session =
        MeterSession::new(make_adc(lag), &cfg.adc, &cfg.calibration, &cfg.sampling)?;
    let report = session.run_cycle()?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "event": "measurement",
                "current_rms": report.current_rms,
                "voltage_rms": report.voltage_rms,
                "active_power": report.active_power,
                "apparent_power": report.apparent_power,
                "reactive_power": report.reactive_power,
                "power_factor": report.power_factor,
            })
        );
    } else {
        for line in DisplayPresenter::lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

fn self_check(cfg: &Config) -> eyre::Result<()> {
    let _radio = SimulatedRadio::init(&cfg.device.device_eui, &cfg.device.app_eui)?;
    let mut session = MeterSession::new(
        SimulatedAdc::resistive(),
        &cfg.adc,
        &cfg.calibration,
        &cfg.sampling,
    )?;
    let report = session.run_cycle()?;
    let fields = [
        report.current_rms,
        report.voltage_rms,
        report.active_power,
        report.apparent_power,
        report.reactive_power,
        report.power_factor,
    ];
    if fields.iter().any(|v| !v.is_finite()) {
        eyre::bail!("self-check produced a non-finite report");
    }
    println!("self-check ok");
    Ok(())
}
