use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpigridError` and maps other errors to it
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpigridError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A parameter record failed validation.
    ConfigError(String),
    /// A statistics report could not be set up.
    ReportError(String),
    EpigridError(String),
}

impl From<io::Error> for EpigridError {
    fn from(error: io::Error) -> Self {
        EpigridError::IoError(error)
    }
}

impl From<serde_json::Error> for EpigridError {
    fn from(error: serde_json::Error) -> Self {
        EpigridError::JsonError(error)
    }
}

impl From<csv::Error> for EpigridError {
    fn from(error: csv::Error) -> Self {
        EpigridError::CsvError(error)
    }
}

impl From<String> for EpigridError {
    fn from(error: String) -> Self {
        EpigridError::EpigridError(error)
    }
}

impl From<&str> for EpigridError {
    fn from(error: &str) -> Self {
        EpigridError::EpigridError(error.to_string())
    }
}

impl std::error::Error for EpigridError {}

impl Display for EpigridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpigridError::ConfigError(message) => write!(f, "Invalid configuration: {message}"),
            EpigridError::ReportError(message) => write!(f, "Report error: {message}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
