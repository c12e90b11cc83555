//! Error types for the `service` layer.
//!
//! The relay core never fails a caller; everything here is a host-level
//! failure that stops the process from starting or serving.
use std::error::Error as StdError;
use std::fmt;

/// Top-level service error type.
/// Holds the kind of failure and the underlying error that caused it.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Enum representing the kinds of startup and serving failures.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// A global logger was already installed.
    Logger,
    /// The HTML chat client could not be read.
    StaticDocument,
    /// The listening socket could not be bound.
    Listener,
    /// The HTTP server loop terminated with an I/O error.
    Server,
}

impl Error {
    pub fn new<E>(error_kind: ErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error {
            source: Some(source.into()),
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let context = match self.error_kind {
            ErrorKind::Logger => "Failed to start logger",
            ErrorKind::StaticDocument => "Failed to load static document",
            ErrorKind::Listener => "Failed to bind listener",
            ErrorKind::Server => "Server error",
        };

        match &self.source {
            Some(source) => write!(f, "{context}: {source}"),
            None => write!(f, "{context}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_display_includes_context_and_source() {
        let err = Error::new(
            ErrorKind::Listener,
            io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(err.to_string(), "Failed to bind listener: address in use");
    }

    #[test]
    fn test_source_is_preserved() {
        let err = Error::new(
            ErrorKind::StaticDocument,
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.error_kind, ErrorKind::StaticDocument);
        let source = err.source().expect("source should be set");
        assert_eq!(source.to_string(), "no such file");
    }
}
