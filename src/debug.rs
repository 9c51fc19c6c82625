use parking_lot::Mutex;
/// Logging backend for termprof
///
/// Routes every `log::info!()` etc. to stderr, so stdout stays clean for the
/// printed profiles document and diff reports.
///
/// Level precedence:
/// - `--log-level` on the command line
/// - `RUST_LOG` (a plain level name such as `debug`)
/// - `warn`
///
/// When `TERMPROF_DEBUG_LOG` names a file, every record is also appended there.
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable naming a file that mirrors the log output
pub const DEBUG_LOG_ENV: &str = "TERMPROF_DEBUG_LOG";

struct DebugLogger {
    file: Mutex<Option<std::fs::File>>,
}

impl DebugLogger {
    fn new() -> Self {
        let file = std::env::var_os(DEBUG_LOG_ENV).and_then(|path| {
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .map_err(|e| eprintln!("termprof: cannot open {:?} for logging: {}", path, e))
                .ok()
        });

        let logger = DebugLogger {
            file: Mutex::new(file),
        };
        logger.write_file(&format!(
            "\n{}\ntermprof debug session started at {}\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            "=".repeat(80)
        ));
        logger
    }

    fn write_file(&self, msg: &str) {
        if let Some(ref mut file) = *self.file.lock() {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }
}

impl Log for DebugLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&get_timestamp(), record.level(), record.target(), record.args());
        eprint!("{line}");
        self.write_file(&line);
    }

    fn flush(&self) {
        if let Some(ref mut file) = *self.file.lock() {
            let _ = file.flush();
        }
    }
}

static LOGGER: OnceLock<DebugLogger> = OnceLock::new();

fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

fn format_line(timestamp: &str, level: log::Level, target: &str, args: &fmt::Arguments) -> String {
    format!("[{}] [{:<5}] [{}] {}\n", timestamp, level, target, args)
}

/// Pick the effective level from the CLI flag and `RUST_LOG`.
pub fn resolve_level(cli_level: Option<LevelFilter>, rust_log: Option<&str>) -> LevelFilter {
    if let Some(level) = cli_level {
        return level;
    }
    rust_log
        .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the logger. Safe to call more than once; later calls only adjust the level.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = resolve_level(cli_level, rust_log.as_deref());

    let logger = LOGGER.get_or_init(DebugLogger::new);
    // Err means another logger is already installed (e.g. in tests)
    let _ = log::set_logger(logger);
    log::set_max_level(level);
}

// Category macros: the category becomes the log target
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        ::log::log!(target: $category, ::log::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        ::log::log!(target: $category, ::log::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        ::log::log!(target: $category, ::log::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        ::log::log!(target: $category, ::log::Level::Trace, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        assert_eq!(
            resolve_level(Some(LevelFilter::Trace), Some("error")),
            LevelFilter::Trace
        );
    }

    #[test]
    fn test_rust_log_then_default() {
        assert_eq!(resolve_level(None, Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(None, Some(" INFO ")), LevelFilter::Info);
        assert_eq!(resolve_level(None, Some("termprof=debug")), LevelFilter::Warn);
        assert_eq!(resolve_level(None, None), LevelFilter::Warn);
    }

    #[test]
    fn test_format_line() {
        let line = format_line("T", log::Level::Info, "DISCOVERY", &format_args!("{} scopes", 3));
        assert_eq!(line, "[T] [INFO ] [DISCOVERY] 3 scopes\n");
    }
}
