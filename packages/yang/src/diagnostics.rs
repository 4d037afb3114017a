//! Diagnostics
//!
//! Structured compiler diagnostics: source spans, the error-kind taxonomy
//! of §7, and severities. The source-location types mirror the familiar
//! `ParseSourceFile`/`ParseLocation`/`ParseSourceSpan` shape from compiler
//! front ends that track byte offsets back to line/column, but the error
//! payload itself is built around the YANG error taxonomy instead of a
//! single free-form message.

use std::fmt;
use std::sync::Arc;

/// A source buffer the front end handed us. The front end owns tokenizing;
/// we only need enough of the buffer to report context around a span.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub content: Arc<str>,
    pub path: String,
}

impl SourceFile {
    pub fn new(content: impl Into<Arc<str>>, path: impl Into<String>) -> Self {
        SourceFile { content: content.into(), path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub file: SourceFile,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl SourceLocation {
    pub fn new(file: SourceFile, offset: usize, line: usize, col: usize) -> Self {
        SourceLocation { file, offset, line, col }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.file.path, self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        SourceSpan { start, end }
    }

    pub fn text(&self) -> &str {
        &self.start.file.content[self.start.offset..self.end.offset]
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.start, self.end.line, self.end.col)
    }
}

/// The taxonomy of §7: every diagnostic carries exactly one of these.
/// `Serialize` renders variants in the same `kebab-case` spelling §6 uses
/// ("too-many", "duplicate-id", ...) for whatever embedder wants diagnostics
/// as JSON rather than the in-process `Diagnostic` value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    // Lexical/syntactic — raised by the front end; the core never emits these
    // itself but the type exists so front-end diagnostics share one channel.
    Syntax,
    // Structural
    TooMany,
    TooFew,
    MisplacedStatement,
    InvalidSubstatement,
    // Identifier
    DuplicateId,
    ReservedId,
    InvalidChar,
    PrefixNotFound,
    // Reference
    UnresolvedReference,
    // Semantic
    InvalidArgument,
    IncompatibleFacet,
    IncompatibleDeviation,
    CycleDetected,
    // Resource
    Memory,
    // Internal invariant violation — treated as a bug, logged with a stable tag
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Verbose,
    Warning,
    Error,
}

/// A path to the schema or data node a diagnostic is about, rendered
/// lazily from whatever string handles the caller had on hand.
pub type DiagnosticPath = Option<String>;

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    /// Message template with arguments already substituted. Kept as a single
    /// owned string rather than template + args: callers format once at the
    /// call site where they have full context, the taxonomy tag is what
    /// downstream code actually branches on.
    pub message: String,
    pub path: DiagnosticPath,
    pub span: Option<SourceSpan>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic { kind, severity, message: message.into(), path: None, span: None }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(p) => write!(f, "{:?}: {} ({})", self.kind, self.message, p),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Hand-rolled rather than derived: `SourceSpan`/`SourceFile` carry the whole
/// source buffer behind an `Arc<str>` (so spans stay cheap to pass around
/// in-process), and serializing that buffer back out on every diagnostic
/// would be a surprising cost for a JSON-export consumer. The wire shape is
/// the span rendered as `file@line:col-line:col`, matching `SourceSpan`'s own
/// `Display`.
impl serde::Serialize for Diagnostic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Diagnostic", 5)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("span", &self.span.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

/// Accumulates diagnostics across a compilation. The resolver in particular
/// needs to report every residual obligation at once rather than stopping
/// at the first failure (§4.3, §7 "Propagation").
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.items.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_fatal)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        self.items.extend(other.items);
    }

    pub fn from_vec(items: Vec<Diagnostic>) -> Self {
        DiagnosticBag { items }
    }
}

/// Result alias used throughout the builder for operations that fail
/// immediately (local checks) rather than being deferred to the resolver.
pub type BuildResult<T> = Result<T, Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_serializes_to_kebab_case_kind() {
        let diag = Diagnostic::error(ErrorKind::DuplicateId, "duplicate typedef 'foo'")
            .with_path("/m:x/m:foo");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "duplicate-id");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["path"], "/m:x/m:foo");
        assert!(json["span"].is_null());
    }

    #[test]
    fn bag_serializes_as_an_array() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning(ErrorKind::TooMany, "too many 'unique'"));
        let json = serde_json::to_string(&bag).unwrap();
        assert!(json.contains("\"too-many\""));
        assert!(json.contains("\"warning\""));
    }
}
