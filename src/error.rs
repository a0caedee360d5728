use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the structured line editor.
#[derive(Debug, Error)]
pub enum EditError {
    /// The target cannot be opened for read+write, or cannot be read.
    #[error("unusable file {}: {reason}", .path.display())]
    UnusableFile {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    /// A line could not be parsed into the layout's fields.
    #[error("malformed line{}: {reason}: \"{line}\"", describe_location(.path, .line_number))]
    MalformedLine {
        path: Option<PathBuf>,
        line_number: Option<usize>,
        line: String,
        reason: String,
    },

    /// A caller supplied a value a typed field cannot hold.
    #[error("invalid value \"{value}\" for field \"{field}\": {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Backup or commit I/O failed after the session was opened.
    #[error("{action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EditError {
    pub(crate) fn unusable(path: &Path, reason: impl Into<String>, source: io::Error) -> Self {
        EditError::UnusableFile {
            path: path.to_path_buf(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        EditError::MalformedLine {
            path: None,
            line_number: None,
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        EditError::InvalidFieldValue {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        EditError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach the file and 1-based line number to a `MalformedLine`.
    pub fn located(self, file: &Path, number: usize) -> Self {
        match self {
            EditError::MalformedLine { line, reason, .. } => EditError::MalformedLine {
                path: Some(file.to_path_buf()),
                line_number: Some(number),
                line,
                reason,
            },
            other => other,
        }
    }
}

fn describe_location(path: &Option<PathBuf>, line_number: &Option<usize>) -> String {
    match (path, line_number) {
        (Some(path), Some(number)) => format!(" at {}:{number}", path.display()),
        (Some(path), None) => format!(" in {}", path.display()),
        (None, Some(number)) => format!(" at line {number}"),
        (None, None) => String::new(),
    }
}
