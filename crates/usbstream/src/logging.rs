use clap::ValueEnum;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;

/// Target of the detector's per-step `trace!` events.
const DETECTOR_TARGET: &str = "usbstream_frame::detector";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Per-target filter. The detector logs every clock step at `trace`, so it is
/// capped at `debug` unless step tracing is asked for explicitly.
fn targets(level: LogLevel, trace_steps: bool) -> Targets {
    let detector = match (trace_steps, level) {
        (true, _) => LevelFilter::TRACE,
        (false, LogLevel::Trace) => LevelFilter::DEBUG,
        (false, other) => other.as_filter(),
    };
    Targets::new()
        .with_default(level.as_filter())
        .with_target(DETECTOR_TARGET, detector)
}

/// Install the stderr subscriber.
pub fn init_logging(format: LogFormat, level: LogLevel, trace_steps: bool) {
    let filter = targets(level, trace_steps);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(layer.json())
                .with(filter)
                .try_init();
        }
    }
}
