use std::fmt::Display;
use thiserror::Error;

/// position of a node in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn at(location: &Option<Location>) -> String {
    location
        .map(|location| format!(" at {}", location))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Reference,
    Bind,
    Type,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Reference error: identifier \"{name}\" is not defined{}", at(.location))]
    Undefined {
        name: String,
        location: Option<Location>,
    },
    #[error("Reference error: identifier \"{name}\" used within its own definition{}", at(.location))]
    OwnDefinition {
        name: String,
        location: Option<Location>,
    },
    #[error("Bind error: {excess} argument(s) in excess of original arity {arity}{}", at(.location))]
    Bind {
        excess: usize,
        arity: usize,
        location: Option<Location>,
    },
    #[error("Type error: {message}{}", at(.location))]
    Type {
        message: String,
        location: Option<Location>,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn type_error(message: impl Into<String>, location: Option<Location>) -> Self {
        Error::Type {
            message: message.into(),
            location,
        }
    }

    /// fills in `location` if the error has none yet
    pub fn or_at(self, location: Option<Location>) -> Self {
        match self {
            Error::Type {
                message,
                location: None,
            } => Error::Type { message, location },
            Error::Undefined {
                name,
                location: None,
            } => Error::Undefined { name, location },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Undefined { .. } | Error::OwnDefinition { .. } => ErrorKind::Reference,
            Error::Bind { .. } => ErrorKind::Bind,
            Error::Type { .. } => ErrorKind::Type,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
