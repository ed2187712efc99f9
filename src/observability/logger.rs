//! Diagnostic Logger
//!
//! Append-only, human-readable log of every question: the question text,
//! the SQL the model produced, and either the row count or the engine
//! error. One line per event:
//!
//! ```text
//! 2026-10-16 09:41:07,512 - INFO - QUESTION: Who won the orange cap in 2015?
//! ```
//!
//! A second layer mirrors events to stderr when `RUST_LOG` asks for it.
//! Without `RUST_LOG` the console stays quiet: failures already reach the
//! user as rendered answers and are recorded in the file.

use crate::error::Result;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Targets whose events reach the diagnostic log.
pub const LOG_TARGETS: &[&str] = &["ipl_stats_chat", "ipl_chat"];

/// Console filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_CONSOLE_FILTER: &str = "off";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// `<timestamp> - <LEVEL> - <message>`, local time, no span context.
pub struct DiagnosticFormat;

impl<S, N> FormatEvent<S, N> for DiagnosticFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(
            writer,
            "{} - {} - ",
            now.format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The diagnostic layer over any writer; INFO and above from this crate only.
pub fn diagnostic_layer<S, W>(make_writer: W) -> impl Layer<S> + Send + Sync + 'static
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let targets = LOG_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| targets.with_target(*target, Level::INFO));

    fmt::layer()
        .event_format(DiagnosticFormat)
        .with_ansi(false)
        .with_writer(make_writer)
        .with_filter(targets)
}

/// Installs the global subscriber: diagnostic file plus stderr console.
/// The file is created if absent and always appended to.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(diagnostic_layer(Mutex::new(file)))
        .with(console)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tracing::{debug, error, info};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_lines_carry_timestamp_level_and_message() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(diagnostic_layer(captured.clone()));

        tracing::subscriber::with_default(subscriber, || {
            info!("QUESTION: {}", "Most sixes in 2016?");
            error!("SQL ERROR: {}", "no such column: sixes");
            debug!("not written");
            info!(target: "hyper::client", "not ours");
        });

        let contents = captured.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "{}", contents);

        let stamp = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}$").unwrap();
        let (prefix, rest) = lines[0].split_at(23);
        assert!(stamp.is_match(prefix), "{}", prefix);
        assert_eq!(rest, " - INFO - QUESTION: Most sixes in 2016?");
        assert!(lines[1].ends_with(" - ERROR - SQL ERROR: no such column: sixes"));
    }

    #[test]
    fn test_console_is_silent_by_default() {
        let filter = EnvFilter::new(DEFAULT_CONSOLE_FILTER);
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing_subscriber::filter::LevelFilter::OFF)
        );
    }

    #[test]
    fn test_init_logging_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        init_logging(&path).unwrap();
        assert!(path.exists());
    }
}
