//! Purpose: Structured error model shared by the loader, proxies, factory and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`, `PLUGIN_DOMAIN`.
//! Role: Single error currency; plugin status codes and host-local load failures both land here.
//! Invariants: Errors are values; nothing in the plugin layer panics across the boundary.
//! Invariants: Exit-code mapping is stable and covered by a test.
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Domain tag carried by every plugin-originated error.
pub const PLUGIN_DOMAIN: &str = "Plugin";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    Io,
    LibraryOpen,
    MissingSymbol,
    AbiMismatch,
    Lifecycle,
    NullObject,
    UnknownOption,
    ReferReason,
    UnknownStatus,
    Protocol,
    Timeout,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    suggestion: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    status: Option<i32>,
    symbols: Vec<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            suggestion: None,
            hint: None,
            path: None,
            status: None,
            symbols: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn domain(&self) -> &'static str {
        PLUGIN_DOMAIN
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Recovery suggestion supplied by the plugin, if it gave one.
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw status code reported by the plugin.
    pub fn status(&self) -> Option<i32> {
        self.status
    }

    pub fn missing_symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        let suggestion = suggestion.into();
        if !suggestion.is_empty() {
            self.suggestion = Some(suggestion);
        }
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {suggestion})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if !self.symbols.is_empty() {
            write!(f, " (missing: {})", self.symbols.join(", "))?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Io => 4,
        ErrorKind::LibraryOpen => 5,
        ErrorKind::MissingSymbol => 6,
        ErrorKind::AbiMismatch => 7,
        ErrorKind::Lifecycle => 8,
        ErrorKind::NullObject => 9,
        ErrorKind::UnknownOption => 10,
        ErrorKind::ReferReason => 11,
        ErrorKind::UnknownStatus => 12,
        ErrorKind::Protocol => 13,
        ErrorKind::Timeout => 14,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::Io, 4),
            (ErrorKind::LibraryOpen, 5),
            (ErrorKind::MissingSymbol, 6),
            (ErrorKind::AbiMismatch, 7),
            (ErrorKind::Lifecycle, 8),
            (ErrorKind::NullObject, 9),
            (ErrorKind::UnknownOption, 10),
            (ErrorKind::ReferReason, 11),
            (ErrorKind::UnknownStatus, 12),
            (ErrorKind::Protocol, 13),
            (ErrorKind::Timeout, 14),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_lists_every_missing_symbol() {
        let err = Error::new(ErrorKind::MissingSymbol)
            .with_message("required symbols missing")
            .with_symbols(vec!["a".to_string(), "b".to_string()]);
        let text = err.to_string();
        assert!(text.starts_with("MissingSymbol: required symbols missing"));
        assert!(text.ends_with("(missing: a, b)"));
    }

    #[test]
    fn empty_suggestion_is_dropped() {
        let err = Error::new(ErrorKind::ReferReason).with_suggestion("");
        assert!(err.suggestion().is_none());
        assert_eq!(err.domain(), "Plugin");
    }
}
