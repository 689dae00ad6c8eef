//! # Logging Bootstrap (`logger`)
//!
//! Installs the process-wide `tracing` subscriber exactly once. Records at
//! `debug` and above go to two sinks that share one line format:
//!
//! * a size-rotated file `<log-dir>/<YYYY_MM_DD_HH_MM_SS>.log` (5 MiB, 3 backups),
//! * the console (stderr unless configured otherwise).
//!
//! Call [`init`] (or [`init_with`]) at the top of `main` and propagate its
//! error: a log directory or file that cannot be created is a startup fault.
//!
//! ```rust,no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let logging = pipeline_utils::logger::init()?;
//!     tracing::info!(log_file = %logging.log_file().display(), "pipeline starting");
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Local};
use once_cell::sync::OnceCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;

pub mod config;
pub mod format;
pub mod rotation;

pub use config::{ConsoleStream, LogConfig};
pub use format::LineFormat;
pub use rotation::RotatingFileAppender;

// --- Error Type ---
#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("could not resolve the log directory: {0}")]
    LogDir(#[source] io::Error),
    #[error("could not create log directory '{}': {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not open log file '{}': {source}", .path.display())]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("invalid log filter '{directives}': {source}")]
    Filter {
        directives: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

// --- Logging Context ---

/// What the bootstrap set up. There is one per process.
#[derive(Debug)]
pub struct LoggingContext {
    started_at: DateTime<Local>,
    log_dir: PathBuf,
    log_file: PathBuf,
    config: LogConfig,
}

impl LoggingContext {
    /// Time the bootstrap ran; also the stamp in the log file name.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The active (unrotated) log file.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

static CONTEXT: OnceCell<LoggingContext> = OnceCell::new();

/// Bootstraps logging with [`LogConfig::from_env`].
pub fn init() -> Result<&'static LoggingContext, LoggingError> {
    init_with(LogConfig::from_env())
}

/// Bootstraps logging with `config`.
///
/// Only the first successful call installs anything; later calls ignore
/// their argument and return the existing context.
pub fn init_with(config: LogConfig) -> Result<&'static LoggingContext, LoggingError> {
    CONTEXT.get_or_try_init(|| install(config))
}

/// The context installed by [`init`]/[`init_with`], if any.
pub fn context() -> Option<&'static LoggingContext> {
    CONTEXT.get()
}

/// `<YYYY_MM_DD_HH_MM_SS>.log` for the given start time.
pub fn log_file_name(started_at: &DateTime<Local>) -> String {
    format!("{}.log", started_at.format(config::LOG_FILE_STAMP))
}

fn install(config: LogConfig) -> Result<LoggingContext, LoggingError> {
    let started_at = Local::now();
    let log_dir = config.resolve_log_dir().map_err(LoggingError::LogDir)?;
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.clone(),
        source,
    })?;

    let log_file = log_dir.join(log_file_name(&started_at));
    let appender = RotatingFileAppender::new(&log_file, config.max_bytes, config.backup_count)
        .map_err(|source| LoggingError::OpenFile {
            path: log_file.clone(),
            source,
        })?;

    let console = match config.console {
        ConsoleStream::Stderr => BoxMakeWriter::new(io::stderr),
        ConsoleStream::Stdout => BoxMakeWriter::new(io::stdout),
    };
    tracing::subscriber::set_global_default(build_subscriber(&config, appender, console)?)?;

    tracing::debug!(
        log_file = %log_file.display(),
        max_bytes = config.max_bytes,
        backup_count = config.backup_count,
        "logging initialised"
    );

    Ok(LoggingContext {
        started_at,
        log_dir,
        log_file,
        config,
    })
}

/// Registry with the level filter, the file layer and the console layer.
pub(crate) fn build_subscriber<C>(
    config: &LogConfig,
    file: RotatingFileAppender,
    console: C,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggingError>
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = config.env_filter()?;
    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(file),
        )
        .with(
            fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(console),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` under a subscriber built from the default config, returning
    /// what reached the console and the file.
    fn capture_logs(f: impl FnOnce()) -> (String, String) {
        let tmp = tempfile::tempdir().unwrap();
        let log_file = tmp.path().join("run.log");
        let appender = RotatingFileAppender::new(&log_file, config::MAX_LOG_SIZE, config::BACKUP_COUNT).unwrap();
        let console = Capture::default();
        let sink = console.clone();

        let subscriber = build_subscriber(&LogConfig::default(), appender, move || sink.clone()).unwrap();
        tracing::subscriber::with_default(subscriber, f);

        (console.contents(), fs::read_to_string(&log_file).unwrap())
    }

    /// Drops the per-sink timestamp so console and file lines can be compared.
    fn without_stamps(output: &str) -> Vec<&str> {
        output
            .lines()
            .map(|line| line.split_once(" ] ").map_or(line, |(_, rest)| rest))
            .collect()
    }

    #[test]
    fn debug_record_reaches_both_sinks_in_line_format() {
        let (console, file) = capture_logs(|| {
            tracing::debug!(target: "pipeline::ingest", "loaded 42 rows");
        });

        assert_eq!(without_stamps(&console), without_stamps(&file));
        let line = console.lines().next().expect("one line");
        assert!(line.starts_with("[ "), "{line}");
        assert!(line.ends_with(" ] pipeline::ingest -DEBUG - loaded 42 rows"), "{line}");

        // [ YYYY-MM-DD HH:MM:SS,mmm ]
        let stamp = &line[2..line.find(" ]").unwrap()];
        assert_eq!(stamp.len(), 23, "{stamp}");
        assert_eq!(&stamp[19..20], ",");
    }

    #[test]
    fn fields_follow_the_message() {
        let (console, _) = capture_logs(|| {
            tracing::info!(target: "pipeline::train", epoch = 3, "epoch finished");
        });
        assert!(console.trim_end().ends_with("-INFO - epoch finished epoch=3"), "{console}");
    }

    #[test]
    fn noisy_targets_are_held_back() {
        let (console, file) = capture_logs(|| {
            tracing::info!(target: "mongodb::connection", "pool checkout");
            tracing::error!(target: "mongodb::connection", "pool closed");
        });
        assert!(!console.contains("pool checkout"));
        assert_eq!(without_stamps(&file), vec!["mongodb::connection -ERROR - pool closed"]);
        assert_eq!(without_stamps(&console), without_stamps(&file));
    }

    #[test]
    fn trace_is_below_root_level() {
        let (console, _) = capture_logs(|| {
            tracing::trace!(target: "pipeline", "very chatty");
            tracing::debug!(target: "pipeline", "chatty");
        });
        assert!(!console.contains("very chatty"));
        assert!(console.contains("chatty"));
    }

    #[test]
    fn file_name_uses_second_granularity_stamp() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 12).unwrap();
        assert_eq!(log_file_name(&at), "2024_05_01_13_45_12.log");
    }
}
