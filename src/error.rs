//! Error types for the employee import pipeline.
//!
//! Only fatal conditions live here. A record whose company or job cannot be
//! resolved is not an error: see [`crate::normalize::Resolution`].

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal error raised while reading input, loading mappings or writing output
#[derive(Debug)]
pub enum ImportError {
    FileNotFound {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    MissingHeaders {
        missing: Vec<String>,
    },
    Csv {
        line: Option<u64>,
        message: String,
    },
    NumericFormat {
        value: String,
    },
    MappingConfig {
        path: Option<PathBuf>,
        message: String,
    },
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            ImportError::FileNotFound { path }
        } else {
            ImportError::Io { path, source }
        }
    }

    pub(crate) fn mapping(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        ImportError::MappingConfig {
            path,
            message: message.into(),
        }
    }

    /// True for the input-side failures that abort a run before any output
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound { .. }
                | ImportError::MissingHeaders { .. }
                | ImportError::Csv { .. }
        )
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::FileNotFound { path } => {
                write!(f, "File not found: {}", path.display())
            }
            ImportError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            ImportError::MissingHeaders { missing } => {
                write!(f, "Input is missing required columns: {}", missing.join(", "))
            }
            ImportError::Csv { line: Some(line), message } => {
                write!(f, "Malformed input at line {}: {}", line, message)
            }
            ImportError::Csv { line: None, message } => {
                write!(f, "Malformed input: {}", message)
            }
            ImportError::NumericFormat { value } => {
                write!(f, "Invalid employee number '{}'", value)
            }
            ImportError::MappingConfig { path: Some(path), message } => {
                write!(f, "Invalid mapping file {}: {}", path.display(), message)
            }
            ImportError::MappingConfig { path: None, message } => {
                write!(f, "Invalid mappings: {}", message)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        match err.into_kind() {
            csv::ErrorKind::Io(source) => ImportError::Io {
                path: PathBuf::new(),
                source,
            },
            kind => ImportError::Csv {
                line,
                message: csv_kind_message(&kind),
            },
        }
    }
}

fn csv_kind_message(kind: &csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {}", err),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("expected {} fields, found {}", expected_len, len)
        }
        other => format!("{:?}", other),
    }
}
