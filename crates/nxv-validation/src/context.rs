//! Validation context: configuration, schema sources, and the
//! validate-a-file entry point

use crate::engine::ValidationEngine;
use crate::policy::ValidationPolicy;
use crate::reporter::{Counters, LogRecord, LogSink, Reporter, StreamSink};
use crate::{Error, Result};
use nxv_schema::{DirectorySource, SchemaLoader, SchemaSource};
use nxv_tree::{DataFile, FileBackend, JsonBackend, Node, NodeKind, join_path};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Group classes that count as entries when no start path is given
const ENTRY_CLASSES: &[&str] = &["NXentry", "NXsubentry"];

/// Result of validating one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No ERROR records were emitted
    Valid,
    /// At least one ERROR record was emitted, or the run stopped on a fatal error
    Invalid,
}

impl Outcome {
    /// Numeric return code: 0 for valid, 1 for invalid
    pub fn code(self) -> i32 {
        match self {
            Outcome::Valid => 0,
            Outcome::Invalid => 1,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Outcome::Valid
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Valid => f.write_str("valid"),
            Outcome::Invalid => f.write_str("invalid"),
        }
    }
}

/// What to validate within a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target<'t> {
    /// Definition name; taken from each entry's `definition` when absent
    pub definition: Option<&'t str>,

    /// Path of the group to validate; every entry is validated when absent
    pub start_path: Option<&'t str>,

    /// Require the entry to declare the definition it is validated against
    pub check_root: bool,
}

/// Holds everything one or more validation runs share
pub struct ValidationContext {
    directory: DirectorySource,
    retriever: Option<Box<dyn SchemaSource>>,
    logger: Box<dyn LogSink>,
    backend: Box<dyn FileBackend>,
    engine: ValidationEngine,
    counters: Counters,
}

impl ValidationContext {
    /// Create a context that looks definitions up under `nxdl_dir`
    ///
    /// Records go to stderr until another logger is set.
    pub fn new(nxdl_dir: impl Into<PathBuf>) -> Self {
        Self {
            directory: DirectorySource::new(nxdl_dir),
            retriever: None,
            logger: Box::new(StreamSink::stderr()),
            backend: Box::new(JsonBackend::new()),
            engine: ValidationEngine::new(),
            counters: Counters::default(),
        }
    }

    pub fn nxdl_dir(&self) -> &Path {
        self.directory.root()
    }

    /// Replace the log sink
    pub fn set_logger(&mut self, logger: impl LogSink + 'static) {
        self.logger = Box::new(logger);
    }

    /// Install a source consulted before the definition directory
    pub fn set_retriever(&mut self, retriever: impl SchemaSource + 'static) {
        self.retriever = Some(Box::new(retriever));
    }

    pub fn clear_retriever(&mut self) {
        self.retriever = None;
    }

    /// Replace the backend used to open data files
    pub fn set_backend(&mut self, backend: impl FileBackend + 'static) {
        self.backend = Box::new(backend);
    }

    pub fn set_policy(&mut self, policy: ValidationPolicy) {
        self.engine = ValidationEngine::with_policy(policy);
    }

    pub fn policy(&self) -> &ValidationPolicy {
        self.engine.policy()
    }

    /// Counters from the most recent run
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Open `data_file` and validate it
    ///
    /// A file that cannot be opened is reported as a fatal error.
    pub fn validate(&mut self, data_file: impl AsRef<Path>, target: &Target<'_>) -> Outcome {
        let data_file = data_file.as_ref();
        info!("Validating {}", data_file.display());
        match self.backend.open(data_file) {
            Ok(file) => self.validate_file(&file, target),
            Err(e) => {
                let fatal = Error::Open(e);
                let mut reporter = Reporter::new(&mut *self.logger);
                report_fatal(&mut reporter, "/", &fatal);
                self.counters = reporter.counters();
                Outcome::Invalid
            }
        }
    }

    /// Validate an already opened file
    ///
    /// Counters are reset first. Fatal conditions stop the run after one
    /// ERROR record describing them.
    pub fn validate_file(&mut self, file: &DataFile, target: &Target<'_>) -> Outcome {
        let mut sources: Vec<&dyn SchemaSource> = Vec::new();
        if let Some(retriever) = &self.retriever {
            sources.push(&**retriever);
        }
        sources.push(&self.directory);
        let loader = SchemaLoader::new(sources);

        let mut reporter = Reporter::new(&mut *self.logger);
        let session = Session {
            engine: &self.engine,
            loader: &loader,
            file,
            target,
        };
        if let Err(fatal) = session.run(&mut reporter) {
            warn!("Validation stopped: {}", fatal);
            report_fatal(&mut reporter, target.start_path.unwrap_or("/"), &fatal);
        }

        self.counters = reporter.counters();
        info!("{}", self.counters);
        if self.counters.is_valid() {
            Outcome::Valid
        } else {
            Outcome::Invalid
        }
    }
}

fn report_fatal(reporter: &mut Reporter<'_>, path: &str, fatal: &Error) {
    reporter.emit(LogRecord::error(fatal.code(), path, fatal.to_string()).with("fatal", "true"));
}

/// One validation run over one file
struct Session<'r> {
    engine: &'r ValidationEngine,
    loader: &'r SchemaLoader<'r>,
    file: &'r DataFile,
    target: &'r Target<'r>,
}

impl Session<'_> {
    fn run(&self, reporter: &mut Reporter<'_>) -> Result<()> {
        let entries = match self.target.start_path {
            Some(path) => {
                self.file
                    .resolve(path)
                    .map_err(|_| Error::PathNotFound(path.to_string()))?;
                vec![path.to_string()]
            }
            None => self.discover_entries(),
        };

        if entries.is_empty() {
            reporter.emit(LogRecord::error("NO_ENTRY", "/", "no NXentry group found"));
            return Ok(());
        }

        for entry_path in entries {
            self.validate_entry(&entry_path, reporter)?;
        }
        Ok(())
    }

    /// Top-level entry groups, in file order
    fn discover_entries(&self) -> Vec<String> {
        self.file
            .children(self.file.root())
            .filter(|child| {
                child.kind == NodeKind::Group
                    && child.nx_class().is_some_and(|class| ENTRY_CLASSES.contains(&class))
            })
            .map(|child| join_path("/", &child.name))
            .collect()
    }

    fn validate_entry(&self, entry_path: &str, reporter: &mut Reporter<'_>) -> Result<()> {
        let node = self
            .file
            .resolve(entry_path)
            .map_err(|_| Error::PathNotFound(entry_path.to_string()))?;
        let declared = declared_definition(node);

        let name = match (self.target.definition, declared) {
            (Some(name), _) | (None, Some(name)) => name,
            (None, None) => return Err(Error::NoDefinition(entry_path.to_string())),
        };
        let mut schema = self.loader.load_with_inheritance(name)?;
        debug!(
            "Loaded {} with chain {}",
            schema.name,
            schema.inheritance_chain.join(" -> ")
        );

        if self.target.check_root {
            match declared {
                Some(declared) if declared == schema.name => {}
                Some(declared) => reporter.emit(
                    LogRecord::error(
                        "DEFINITION_MISMATCH",
                        entry_path,
                        format!("entry declares {declared} but is validated against {}", schema.name),
                    )
                    .with("expected", schema.name.as_str())
                    .with("found", declared),
                ),
                None => reporter.emit(
                    LogRecord::error(
                        "DEFINITION_MISSING",
                        entry_path,
                        "entry does not declare an application definition",
                    )
                    .with("expected", schema.name.as_str()),
                ),
            }
        }

        let counts = self
            .engine
            .validate_entry(self.file, entry_path, &mut schema, reporter)?;
        reporter.emit(
            LogRecord::info(
                "SUMMARY",
                entry_path,
                format!("validated against {}: {counts}", schema.name),
            )
            .with("definition", schema.name.as_str()),
        );
        Ok(())
    }
}

/// Definition an entry names, from its `definition` field or attribute
fn declared_definition(entry: &Node) -> Option<&str> {
    entry
        .find_child("definition")
        .and_then(|field| field.value.as_ref())
        .and_then(nxv_tree::Value::as_text)
        .or_else(|| entry.attribute_text("definition"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CollectingSink, Severity};
    use nxv_schema::InMemorySource;

    const APP: &str = r#"<definition name="NXminimal" category="application">
  <group type="NXentry">
    <field name="definition"><enumeration><item value="NXminimal"/></enumeration></field>
    <field name="title"/>
  </group>
</definition>"#;

    fn context() -> (ValidationContext, CollectingSink) {
        let sink = CollectingSink::new();
        let mut ctx = ValidationContext::new("/nonexistent");
        ctx.set_logger(sink.clone());
        ctx.set_retriever(InMemorySource::new().with("NXminimal", APP));
        (ctx, sink)
    }

    fn entry(name: &str) -> Node {
        Node::group(name, "NXentry")
            .with_child(Node::field("definition", "NXminimal"))
            .with_child(Node::field("title", "run"))
    }

    fn file(entries: Vec<Node>) -> DataFile {
        let mut root = Node::group("", "");
        for entry in entries {
            root.add_child(entry);
        }
        DataFile::in_memory(root)
    }

    #[test]
    fn test_valid_file() {
        let (mut ctx, sink) = context();
        let outcome = ctx.validate_file(&file(vec![entry("entry")]), &Target::default());
        assert_eq!(outcome, Outcome::Valid, "{:?}", sink.records());
        assert_eq!(outcome.code(), 0);
        assert_eq!(ctx.counters(), Counters::default());
        assert_eq!(sink.with_code("SUMMARY").len(), 1);
    }

    #[test]
    fn test_every_entry_is_validated() {
        let (mut ctx, sink) = context();
        let broken = Node::group("entry2", "NXentry").with_child(Node::field("definition", "NXminimal"));
        let outcome = ctx.validate_file(&file(vec![entry("entry1"), broken]), &Target::default());
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(ctx.counters().errors, 1);
        assert_eq!(sink.with_code("MISSING_REQUIRED")[0].path, "/entry2/title");
        assert_eq!(sink.with_code("SUMMARY").len(), 2);
    }

    #[test]
    fn test_no_entry() {
        let (mut ctx, sink) = context();
        let outcome = ctx.validate_file(&file(vec![]), &Target::default());
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(sink.with_code("NO_ENTRY")[0].message, "no NXentry group found");
    }

    #[test]
    fn test_unknown_schema_is_fatal() {
        let (mut ctx, sink) = context();
        let target = Target {
            definition: Some("NXunknown"),
            ..Target::default()
        };
        let outcome = ctx.validate_file(&file(vec![entry("entry")]), &target);
        assert_eq!(outcome, Outcome::Invalid);
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "SCHEMA_NOT_FOUND");
        assert_eq!(records[0].get("fatal"), Some("true"));
    }

    #[test]
    fn test_missing_start_path_is_fatal() {
        let (mut ctx, sink) = context();
        let target = Target {
            start_path: Some("/nowhere"),
            ..Target::default()
        };
        assert_eq!(ctx.validate_file(&file(vec![entry("entry")]), &target), Outcome::Invalid);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].code, "PATH_NOT_FOUND");
        assert_eq!(ctx.counters().errors, 1);
    }

    #[test]
    fn test_no_definition_is_fatal() {
        let (mut ctx, sink) = context();
        let bare = Node::group("entry", "NXentry").with_child(Node::field("title", "run"));
        assert_eq!(ctx.validate_file(&file(vec![bare]), &Target::default()), Outcome::Invalid);
        assert_eq!(sink.records()[0].code, "NO_DEFINITION");
    }

    #[test]
    fn test_check_root() {
        let (mut ctx, sink) = context();
        ctx.set_retriever(
            InMemorySource::new()
                .with("NXminimal", APP)
                .with("NXother", r#"<definition name="NXother"><group type="NXentry"/></definition>"#),
        );
        let target = Target {
            definition: Some("NXother"),
            check_root: true,
            ..Target::default()
        };
        let outcome = ctx.validate_file(&file(vec![entry("entry")]), &target);
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(sink.with_code("DEFINITION_MISMATCH").len(), 1);

        sink.clear();
        let relaxed = Target {
            check_root: false,
            ..target
        };
        ctx.validate_file(&file(vec![entry("entry")]), &relaxed);
        assert!(sink.with_code("DEFINITION_MISMATCH").is_empty());
    }

    #[test]
    fn test_counters_reset_between_runs() {
        let (mut ctx, _sink) = context();
        ctx.validate_file(&file(vec![]), &Target::default());
        assert_eq!(ctx.counters().errors, 1);
        ctx.validate_file(&file(vec![entry("entry")]), &Target::default());
        assert_eq!(ctx.counters().errors, 0);
    }

    #[test]
    fn test_unopenable_file() {
        let (mut ctx, sink) = context();
        let outcome = ctx.validate("/definitely/not/here.json", &Target::default());
        assert_eq!(outcome, Outcome::Invalid);
        assert_eq!(sink.records()[0].code, "FILE_UNREADABLE");
        assert_eq!(sink.count(Severity::Error), 1);
    }

    #[test]
    fn test_declared_definition_attribute() {
        let node = Node::group("entry", "NXentry").with_attribute("definition", "NXfoo");
        assert_eq!(declared_definition(&node), Some("NXfoo"));
        let node = Node::group("entry", "NXentry").with_child(Node::field("definition", " "));
        assert_eq!(declared_definition(&node), None);
    }
}
