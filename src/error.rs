use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `LatticeError` and maps other errors to
/// convert to a `LatticeError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum LatticeError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A configuration field is out of its allowed range.
    InvalidParameter(String),
    /// More initial infections were requested than there are individuals.
    InsufficientPopulation {
        requested: usize,
        available: usize,
    },
    /// A coordinate is outside the lattice or does not hold an individual.
    InvalidCell {
        row: usize,
        col: usize,
    },
    UnknownParameter(String),
    ReportError(String),
    LatticeError(String),
}

impl From<io::Error> for LatticeError {
    fn from(error: io::Error) -> Self {
        LatticeError::IoError(error)
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(error: serde_json::Error) -> Self {
        LatticeError::JsonError(error)
    }
}

impl From<csv::Error> for LatticeError {
    fn from(error: csv::Error) -> Self {
        LatticeError::CSVError(error)
    }
}

impl From<String> for LatticeError {
    fn from(error: String) -> Self {
        LatticeError::LatticeError(error)
    }
}

impl From<&str> for LatticeError {
    fn from(error: &str) -> Self {
        LatticeError::LatticeError(error.to_string())
    }
}

impl std::error::Error for LatticeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LatticeError::IoError(e) => Some(e),
            LatticeError::JsonError(e) => Some(e),
            LatticeError::CSVError(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LatticeError::IoError(e) => write!(f, "I/O error: {e}"),
            LatticeError::JsonError(e) => write!(f, "JSON error: {e}"),
            LatticeError::CSVError(e) => write!(f, "CSV error: {e}"),
            LatticeError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            LatticeError::InsufficientPopulation {
                requested,
                available,
            } => write!(
                f,
                "Cannot infect {requested} individuals: the lattice only holds {available}"
            ),
            LatticeError::InvalidCell { row, col } => {
                write!(f, "Cell ({row}, {col}) is outside the lattice or empty")
            }
            LatticeError::UnknownParameter(name) => write!(f, "Unknown parameter `{name}`"),
            LatticeError::ReportError(msg) => write!(f, "Report error: {msg}"),
            LatticeError::LatticeError(msg) => write!(f, "Error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_population_shortfall() {
        let error = LatticeError::InsufficientPopulation {
            requested: 10,
            available: 4,
        };
        assert_eq!(
            error.to_string(),
            "Cannot infect 10 individuals: the lattice only holds 4"
        );
    }

    #[test]
    fn converts_from_str() {
        let error: LatticeError = "boom".into();
        assert!(matches!(error, LatticeError::LatticeError(ref msg) if msg == "boom"));
    }
}
