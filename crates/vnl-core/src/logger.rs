//! Stderr logging for tools built on the loss crates.
//!
//! Lines look like `[  0.012s DEBUG vnl_loss::plane] message`. The level comes
//! from a `-v` count when one is given, otherwise from `VNL_LOG`, otherwise
//! `warn`. Records from crates outside this workspace are capped at `warn`.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable naming the log level when no verbosity is given.
pub const LOG_ENV: &str = "VNL_LOG";

const OWN_TARGET_PREFIX: &str = "vnl";

/// Level for a `-v` count, falling back to the `VNL_LOG` value, then `warn`.
///
/// Unparseable env values are ignored.
pub fn resolve_level(verbose: u8, env_value: Option<&str>) -> LevelFilter {
    match verbose {
        0 => env_value
            .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn admits(&self, level: Level, target: &str) -> bool {
        if target.starts_with(OWN_TARGET_PREFIX) {
            level <= self.level
        } else {
            level <= self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.admits(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger at `level`. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the stderr logger at [`resolve_level`]`(verbose, $VNL_LOG)`.
pub fn init_from_env(verbose: u8) -> Result<(), log::SetLoggerError> {
    let env_value = std::env::var(LOG_ENV).ok();
    init_with_level(resolve_level(verbose, env_value.as_deref()))
}

/// Install a `tracing` subscriber at `level`; `log` records are forwarded.
///
/// `RUST_LOG` directives, when set, replace `level` entirely.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let directive = level.as_str().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_env() {
        assert_eq!(resolve_level(1, Some("trace")), LevelFilter::Info);
        assert_eq!(resolve_level(2, None), LevelFilter::Debug);
        assert_eq!(resolve_level(5, None), LevelFilter::Trace);
    }

    #[test]
    fn env_applies_without_verbosity() {
        assert_eq!(resolve_level(0, Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(0, Some(" ERROR ")), LevelFilter::Error);
        assert_eq!(resolve_level(0, Some("off")), LevelFilter::Off);
    }

    #[test]
    fn missing_or_garbage_env_means_warn() {
        assert_eq!(resolve_level(0, None), LevelFilter::Warn);
        assert_eq!(resolve_level(0, Some("loud")), LevelFilter::Warn);
    }

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        let logger = StderrLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        assert!(logger.admits(Level::Debug, "vnl_loss::plane"));
        assert!(!logger.admits(Level::Trace, "vnl_core::filter"));
        assert!(!logger.admits(Level::Info, "image::codecs::png"));
        assert!(logger.admits(Level::Warn, "image::codecs::png"));
    }
}
