//! # Logging & Tracing Infrastructure
//!
//! Installs the global `tracing` subscriber for the bridge: an `EnvFilter`
//! scoped to the workspace crates, one formatting layer (pretty, compact or
//! JSON) and, when the host supplies one, a layer mirroring every event into
//! its [`LoggerSink`].
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::logger::{ConsoleLogger, LogLevel};
//! use std::sync::Arc;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_logger_sink(Arc::new(ConsoleLogger::default())),
//! )?;
//! tracing::info!("Bridge started");
//! ```
//!
//! Fields forwarded to the sink pass through [`redact_if_sensitive`] unless
//! redaction is switched off, so developer and user tokens stay out of host
//! logs.

use crate::error::{Error, Result};

use bridge_traits::logger::{LogEntry, LogLevel, LoggerSink};

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Workspace crates covered by the default filter.
const WORKSPACE_TARGETS: &[&str] = &[
    "core_runtime",
    "core_auth",
    "core_library",
    "core_playback",
    "core_service",
    "provider_apple_music",
    "bridge_desktop",
];

/// Third-party targets kept quiet unless a custom filter says otherwise.
const NOISY_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

/// Field names whose values never leave the process.
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "secret",
    "authorization",
    "bearer",
    "music-user-token",
];

const REDACTED: &str = "[REDACTED]";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line per event
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to every workspace crate
    pub level: LogLevel,
    /// Redact token-like fields before they reach the logger sink
    pub redact_tokens: bool,
    /// Replaces the generated filter, e.g. `core_playback=debug,core_library=trace`
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Report span activity
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            redact_tokens: true,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("redact_tokens", &self.redact_tokens)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("enable_spans", &self.enable_spans)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_token_redaction(mut self, redact: bool) -> Self {
        self.redact_tokens = redact;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Mirror events into a host logger.
    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_spans {
            FmtSpan::ACTIVE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install the global subscriber.
///
/// Fails on an invalid filter and on any call after the first successful one.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let sink = config
        .logger_sink
        .clone()
        .map(|sink| LoggerSinkLayer::new(sink, config.redact_tokens));

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer(&config))
        .with(sink)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Formatting layer for the configured [`LogFormat`], boxed so every format
/// stacks onto the same subscriber type.
fn format_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => base
            .pretty()
            .with_span_events(config.span_events())
            .boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => base
            .compact()
            .with_span_events(config.span_events())
            .boxed(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{}={}", target, level))
                .chain(NOISY_TARGETS.iter().map(|target| format!("{}=warn", target)))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(directives).map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Forwards events to a host [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Arc<dyn LoggerSink>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Arc<dyn LoggerSink>, redact: bool) -> Self {
        Self { sink, redact }
    }

    fn deliver(&self, entry: LogEntry) {
        let sink = Arc::clone(&self.sink);

        // Never block a runtime worker on host I/O.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = sink.log(entry).await {
                        eprintln!("LoggerSink error: {}", err);
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("LoggerSink error: {}", err);
                }
            }
        }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = log_level(*metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut entry = LogEntry::new(level, metadata.target(), metadata.name());
        event.record(&mut EntryVisitor {
            entry: &mut entry,
            redact: self.redact,
        });
        if let Some(span) = ctx.lookup_current() {
            entry.span_id = Some(span.name().to_string());
        }

        self.deliver(entry);
    }
}

/// Writes event fields straight into a [`LogEntry`].
struct EntryVisitor<'a> {
    entry: &'a mut LogEntry,
    redact: bool,
}

impl EntryVisitor<'_> {
    fn put(&mut self, field: &Field, value: String) {
        let name = field.name();
        if name == "message" {
            self.entry.message = value;
            return;
        }
        let value = if self.redact {
            redact_if_sensitive(name, &value)
        } else {
            value
        };
        self.entry.fields.insert(name.to_string(), value);
    }
}

impl Visit for EntryVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}

fn log_level(level: Level) -> LogLevel {
    match level {
        Level::TRACE => LogLevel::Trace,
        Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warn,
        Level::ERROR => LogLevel::Error,
    }
}

/// Mask the value of a token-like field.
///
/// Matching is by field name, case-insensitive. Any value that looks like a
/// bearer header is masked regardless of its name.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("developer_token", "eyJhbGci"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("song_id", "1440857781"), "1440857781");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let name = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|sensitive| name.contains(sensitive)) {
        REDACTED.to_string()
    } else if value.starts_with("Bearer ") {
        format!("Bearer {}", REDACTED)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for RecordingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn with_sink<F: FnOnce()>(redact: bool, body: F) -> Vec<LogEntry> {
        let sink = Arc::new(RecordingSink::default());
        let layer = LoggerSinkLayer::new(sink.clone(), redact);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, body);
        let entries = sink.entries.lock().clone();
        entries
    }

    #[test]
    fn every_format_stacks_with_the_sink_layer() {
        for format in [LogFormat::Pretty, LogFormat::Json, LogFormat::Compact] {
            let config = LoggingConfig::default().with_format(format);
            let sink = Arc::new(RecordingSink::default());
            let subscriber = tracing_subscriber::registry()
                .with(build_filter(&config).unwrap())
                .with(format_layer(&config))
                .with(Some(LoggerSinkLayer::new(sink.clone(), true)));

            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(target: "core_service", "formatted");
            });
            assert_eq!(sink.entries.lock().len(), 1, "{:?}", format);
        }
    }

    #[test]
    fn default_filter_covers_workspace_crates() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap().to_string();

        assert!(filter.contains("core_playback=debug"));
        assert!(filter.contains("provider_apple_music=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn custom_filter_replaces_generated_one() {
        let config = LoggingConfig::default()
            .with_level(LogLevel::Error)
            .with_filter("core_auth=trace");
        let filter = build_filter(&config).unwrap().to_string();

        assert!(filter.contains("core_auth=trace"));
        assert!(!filter.contains("core_playback"));
    }

    #[test]
    fn sink_receives_message_and_fields() {
        let entries = with_sink(false, || {
            tracing::info!(target: "core_playback", song_id = "42", page = 3, "resolved");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "core_playback");
        assert_eq!(entries[0].message, "resolved");
        assert_eq!(entries[0].fields.get("song_id"), Some(&"42".to_string()));
        assert_eq!(entries[0].fields.get("page"), Some(&"3".to_string()));
    }

    #[test]
    fn sink_drops_levels_below_its_minimum() {
        let entries = with_sink(false, || {
            tracing::trace!("too chatty");
            tracing::debug!("kept");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn sink_fields_are_redacted() {
        let entries = with_sink(true, || {
            tracing::warn!(developer_token = "secret", header = "Bearer abc", "configure failed");
        });

        assert_eq!(
            entries[0].fields.get("developer_token"),
            Some(&REDACTED.to_string())
        );
        assert_eq!(
            entries[0].fields.get("header"),
            Some(&"Bearer [REDACTED]".to_string())
        );
    }

    #[test]
    fn redaction_matches_names_case_insensitively() {
        assert_eq!(redact_if_sensitive("Music-User-Token", "abc"), REDACTED);
        assert_eq!(redact_if_sensitive("title", "Song Name"), "Song Name");
    }
}
