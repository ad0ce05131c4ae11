//! Log records, sinks, and the counting reporter
//!
//! Every finding the validator makes is a [`LogRecord`] handed to a
//! [`LogSink`]. Sinks decide where records go; the [`Reporter`] in front of
//! them keeps the error and warning counts that decide the outcome.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

/// Severity of a log record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only, never counted
    Info,
    /// Issue that does not make the file invalid
    #[default]
    Warning,
    /// Validation failed
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Severity level
    pub level: Severity,

    /// Data path the finding refers to
    pub path: String,

    /// Human-readable message
    pub message: String,

    /// Machine-readable finding code, e.g. `MISSING_REQUIRED`
    pub code: String,

    /// Additional key/value context (`nxdl`, `expected`, `found`, ...)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl LogRecord {
    pub fn new(
        level: Severity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
            code: code.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn error(code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, path, message)
    }

    pub fn warning(
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, path, message)
    }

    pub fn info(code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, path, message)
    }

    /// Attach a context entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Look a key up as if the record were a flat map
    ///
    /// `level`, `path`, `message` and `code` are answered from the record
    /// itself; any other key comes from the context.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "level" => Some(self.level.as_str()),
            "path" => Some(&self.path),
            "message" => Some(&self.message),
            "code" => Some(&self.code),
            other => self.context.get(other).map(String::as_str),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == Severity::Warning
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {} [{}]", self.level, self.path, self.message, self.code)?;
        let details: Vec<String> = ["expected", "found"]
            .iter()
            .filter_map(|key| self.context.get(*key).map(|v| format!("{key}={v}")))
            .collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

/// Destination for log records
pub trait LogSink {
    /// Receive one record
    fn emit(&mut self, record: &LogRecord);
}

impl<F> LogSink for F
where
    F: FnMut(&LogRecord),
{
    fn emit(&mut self, record: &LogRecord) {
        self(record);
    }
}

/// Writes one line per record to a stream
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl StreamSink<io::Stderr> {
    /// Sink used when no other logger is configured
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> LogSink for StreamSink<W> {
    fn emit(&mut self, record: &LogRecord) {
        // A failing log stream must not abort validation
        if let Err(e) = writeln!(self.writer, "{record}") {
            tracing::warn!("Failed to write log record: {}", e);
        }
    }
}

/// Forwards records to `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, record: &LogRecord) {
        match record.level {
            Severity::Error => {
                tracing::error!(path = %record.path, code = %record.code, "{}", record.message);
            }
            Severity::Warning => {
                tracing::warn!(path = %record.path, code = %record.code, "{}", record.message);
            }
            Severity::Info => {
                tracing::info!(path = %record.path, code = %record.code, "{}", record.message);
            }
        }
    }
}

/// Keeps every record in memory
///
/// Clones share the same buffer, so a handle can be given to a
/// validation context while another is kept for reading the results.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    records: Rc<RefCell<Vec<LogRecord>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records received so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Number of records at the given level
    pub fn count(&self, level: Severity) -> usize {
        self.records.borrow().iter().filter(|r| r.level == level).count()
    }

    /// Records carrying the given code
    pub fn with_code(&self, code: &str) -> Vec<LogRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.code == code)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl LogSink for CollectingSink {
    fn emit(&mut self, record: &LogRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}

/// Error and warning totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counters {
    pub errors: usize,
    pub warnings: usize,
}

impl Counters {
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Totals accumulated since `earlier`
    #[must_use]
    pub fn since(&self, earlier: Counters) -> Counters {
        Counters {
            errors: self.errors.saturating_sub(earlier.errors),
            warnings: self.warnings.saturating_sub(earlier.warnings),
        }
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Errors: {}, Warnings: {}", self.errors, self.warnings)
    }
}

/// Counts records by severity before handing them to a sink
pub struct Reporter<'s> {
    sink: &'s mut dyn LogSink,
    counters: Counters,
}

impl<'s> Reporter<'s> {
    pub fn new(sink: &'s mut dyn LogSink) -> Self {
        Self {
            sink,
            counters: Counters::default(),
        }
    }

    /// Count and forward a record
    pub fn emit(&mut self, record: LogRecord) {
        match record.level {
            Severity::Error => self.counters.errors += 1,
            Severity::Warning => self.counters.warnings += 1,
            Severity::Info => {}
        }
        self.sink.emit(&record);
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_get() {
        let record = LogRecord::error("TYPE_MISMATCH", "/entry/x", "bad type")
            .with("expected", "NX_INT")
            .with("found", "float64");
        assert_eq!(record.get("level"), Some("ERROR"));
        assert_eq!(record.get("path"), Some("/entry/x"));
        assert_eq!(record.get("code"), Some("TYPE_MISMATCH"));
        assert_eq!(record.get("expected"), Some("NX_INT"));
        assert_eq!(record.get("nxdl"), None);
    }

    #[test]
    fn test_record_display() {
        let record = LogRecord::warning("UNDOCUMENTED", "/entry/extra", "undocumented field extra");
        assert_eq!(
            record.to_string(),
            "WARNING /entry/extra: undocumented field extra [UNDOCUMENTED]"
        );

        let record = LogRecord::error("UNITS_MISMATCH", "/entry/x", "wrong units")
            .with("expected", "NX_LENGTH")
            .with("found", "s");
        assert!(record.to_string().ends_with("(expected=NX_LENGTH, found=s)"));
    }

    #[test]
    fn test_record_serializes_level_lowercase() {
        let record = LogRecord::info("SUMMARY", "/entry", "done");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["level"], "info");
        assert!(json.get("context").is_none());
    }

    #[test]
    fn test_reporter_counts() {
        let sink = CollectingSink::new();
        let mut handle = sink.clone();
        let mut reporter = Reporter::new(&mut handle);
        reporter.emit(LogRecord::error("A", "/", "a"));
        reporter.emit(LogRecord::warning("B", "/", "b"));
        reporter.emit(LogRecord::warning("B", "/", "b"));
        reporter.emit(LogRecord::info("C", "/", "c"));

        let counters = reporter.counters();
        assert_eq!(counters.errors, 1);
        assert_eq!(counters.warnings, 2);
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.count(Severity::Error), counters.errors);
        assert_eq!(sink.count(Severity::Warning), counters.warnings);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |r: &LogRecord| seen.push(r.code.clone());
            let mut reporter = Reporter::new(&mut sink);
            reporter.emit(LogRecord::error("X", "/", "x"));
        }
        assert_eq!(seen, vec!["X"]);
    }

    #[test]
    fn test_stream_sink() {
        let mut sink = StreamSink::new(Vec::new());
        sink.emit(&LogRecord::error("MISSING_REQUIRED", "/entry/title", "required field title is missing"));
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "ERROR /entry/title: required field title is missing [MISSING_REQUIRED]\n"
        );
    }

    #[test]
    fn test_counters_since() {
        let before = Counters { errors: 1, warnings: 2 };
        let after = Counters { errors: 4, warnings: 2 };
        assert_eq!(after.since(before), Counters { errors: 3, warnings: 0 });
        assert_eq!(after.to_string(), "Errors: 4, Warnings: 2");
    }
}
