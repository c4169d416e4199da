//! Error types for confbind
//!
//! Errors are structured: a kind, the configuration path they concern, the
//! underlying cause and an actionable help message. Binding failures carry
//! every offending field at once rather than the first one only.

use std::fmt;

use crate::path::PathKey;
use crate::shape::ScalarKind;

/// Result type alias for confbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for confbind operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Configuration path the error concerns (e.g., "Settings:Server")
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A delimited key could not be parsed into a [`PathKey`]
    PathParse,
    /// A single value could not be converted to the requested scalar kind
    TypeCoercion(CoercionError),
    /// One or more values could not be bound onto an options type
    Binding(BindingError),
    /// A section that was required does not exist
    SectionNotFound,
    /// An options type was requested without a configured section
    NotRegistered { type_name: String },
    /// A source could not be read (missing required file, etc.)
    Io,
    /// A source was read but its contents are malformed
    Source,
    /// Internal error (bug in confbind)
    Internal,
}

/// A present value that could not be converted to the field's scalar kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: expected {expected}, got \"{value}\"")]
pub struct CoercionError {
    /// Fully-qualified path of the offending value
    pub path: PathKey,
    /// The scalar kind the field required
    pub expected: ScalarKind,
    /// The raw value found in the store
    pub value: String,
}

/// Every problem found while binding one options type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to bind {type_name} from '{section}': {}", describe(.errors, .unknown_keys))]
pub struct BindingError {
    /// Name of the options type being bound
    pub type_name: &'static str,
    /// Section the bind started from
    pub section: PathKey,
    /// Coercion failures, in field declaration order
    pub errors: Vec<CoercionError>,
    /// Keys with no matching field (only with `error_on_unknown_keys`)
    pub unknown_keys: Vec<PathKey>,
}

impl BindingError {
    /// Total number of problems recorded
    pub fn len(&self) -> usize {
        self.errors.len() + self.unknown_keys.len()
    }

    /// True when nothing went wrong
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.unknown_keys.is_empty()
    }
}

fn describe(errors: &[CoercionError], unknown_keys: &[PathKey]) -> String {
    let mut parts: Vec<String> = errors.iter().map(ToString::to_string).collect();
    parts.extend(unknown_keys.iter().map(|k| format!("{}: no matching field", k)));
    parts.join("; ")
}

impl Error {
    /// Create a path parse error
    pub fn path_parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::PathParse,
            path: Some(input.into()),
            help: Some("Segments are separated by a single ':' and must not be empty".into()),
            cause: Some(message.into()),
        }
    }

    /// Create a type coercion error for a single value
    pub fn type_coercion(error: CoercionError) -> Self {
        Self {
            path: Some(error.path.to_string()),
            help: Some(format!("Ensure the value can be converted to {}", error.expected)),
            cause: Some(format!("Got: \"{}\"", error.value)),
            kind: ErrorKind::TypeCoercion(error),
        }
    }

    /// Create a binding error from the problems collected during a bind
    pub fn binding(error: BindingError) -> Self {
        Self {
            path: Some(error.section.to_string()),
            help: Some("Fix the listed values so they match the declared field types".into()),
            cause: None,
            kind: ErrorKind::Binding(error),
        }
    }

    /// Create a section not found error
    pub fn section_not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            kind: ErrorKind::SectionNotFound,
            help: Some(format!(
                "Check that a source defines '{}' or one of its children",
                path_str
            )),
            path: Some(path_str),
            cause: None,
        }
    }

    /// Create an error for an options type that was never configured
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        let name = type_name.into();
        Self {
            help: Some(format!(
                "Call configure::<{}>(section) before requesting it",
                name
            )),
            kind: ErrorKind::NotRegistered { type_name: name },
            path: None,
            cause: None,
        }
    }

    /// Create an I/O error for a source
    pub fn io(location: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Io,
            path: Some(location.into()),
            help: None,
            cause: Some(cause.into()),
        }
    }

    /// Create an error for a source whose contents are malformed
    pub fn source(name: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Source,
            path: Some(name.into()),
            help: None,
            cause: Some(cause.into()),
        }
    }

    /// Create an internal error (bug in confbind)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            path: None,
            help: Some("This is likely a bug in confbind. Please report it.".into()),
            cause: Some(message.into()),
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The aggregated binding problems, if this is a binding error
    pub fn binding_error(&self) -> Option<&BindingError> {
        match &self.kind {
            ErrorKind::Binding(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::PathParse => write!(f, "Invalid configuration key")?,
            ErrorKind::TypeCoercion(_) => write!(f, "Type coercion failed")?,
            ErrorKind::Binding(b) => write!(f, "Binding failed for {}", b.type_name)?,
            ErrorKind::SectionNotFound => write!(f, "Section not found")?,
            ErrorKind::NotRegistered { type_name } => {
                write!(f, "Options type not configured: {}", type_name)?
            }
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::Source => write!(f, "Invalid source contents")?,
            ErrorKind::Internal => write!(f, "Internal error")?,
        }

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let ErrorKind::Binding(b) = &self.kind {
            for err in &b.errors {
                write!(f, "\n  - {}", err)?;
            }
            for key in &b.unknown_keys {
                write!(f, "\n  - {}: no matching field", key)?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
