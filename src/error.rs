// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for property extraction.

use std::fmt;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Index, pattern or matching error
    Index(IndexError),
    /// Property extraction contract violation
    Extraction(ExtractionError),
    /// Device pool error
    Device(DeviceError),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Index(e) => write!(f, "Index error: {}", e),
            Error::Extraction(e) => write!(f, "Extraction error: {}", e),
            Error::Device(e) => write!(f, "Device error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Index(e) => Some(e),
            Error::Extraction(e) => Some(e),
            Error::Device(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<IndexError> for Error {
    fn from(e: IndexError) -> Self {
        Error::Index(e)
    }
}

impl From<ExtractionError> for Error {
    fn from(e: ExtractionError) -> Self {
        Error::Extraction(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Errors raised while building, parsing or matching indices.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// No index in the space has the rank of the pattern
    RankMismatch {
        pattern: String,
        available: Vec<usize>,
    },
    /// Compound index or pattern has the wrong number of components
    ArityMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    /// A compound index component has the wrong number of subindices
    ComponentArity {
        component: usize,
        expected: usize,
        actual: usize,
    },
    /// Index is not part of the index space
    UnknownIndex(String),
    /// Wildcard not allowed for the requested property
    UnsupportedWildcard { wildcard: String, context: String },
    /// Two different match groups resolved to the same output key
    AmbiguousKey(String),
    /// Index inserted twice into an index space
    Duplicate(String),
    /// Textual index could not be parsed
    Parse(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::RankMismatch { pattern, available } => write!(
                f,
                "Pattern {} has no matching rank in the index space (ranks present: {:?})",
                pattern, available
            ),
            IndexError::ArityMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "{}: expected {} components, got {}",
                context, expected, actual
            ),
            IndexError::ComponentArity {
                component,
                expected,
                actual,
            } => write!(
                f,
                "Component {} must have {} subindices, got {}",
                component, expected, actual
            ),
            IndexError::UnknownIndex(idx) => write!(f, "Unknown index: {}", idx),
            IndexError::UnsupportedWildcard { wildcard, context } => {
                write!(f, "Wildcard '{}' not supported for {}", wildcard, context)
            }
            IndexError::AmbiguousKey(key) => write!(
                f,
                "Key {} is produced by different index sets in one request",
                key
            ),
            IndexError::Duplicate(idx) => write!(f, "Duplicate index: {}", idx),
            IndexError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IndexError {}

/// Contract violations raised by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Eigenstate number outside `[0, count)`
    StateOutOfRange { state: usize, count: usize },
    /// Energy type not usable for the requested calculation
    EnergyType { context: String, message: String },
    /// Energy window parameters are invalid
    InvalidWindow(String),
    /// Eigensolution data is inconsistent
    InvalidEigensolution(String),
    /// Occupation parameters are invalid
    InvalidOccupation(String),
    /// Property data does not match its key and block layout
    Layout(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::StateOutOfRange { state, count } => write!(
                f,
                "State {} out of range, eigensolution has {} states",
                state, count
            ),
            ExtractionError::EnergyType { context, message } => {
                write!(f, "{}: {}", context, message)
            }
            ExtractionError::InvalidWindow(msg) => write!(f, "Invalid energy window: {}", msg),
            ExtractionError::InvalidEigensolution(msg) => {
                write!(f, "Invalid eigensolution: {}", msg)
            }
            ExtractionError::InvalidOccupation(msg) => write!(f, "Invalid occupation: {}", msg),
            ExtractionError::Layout(msg) => write!(f, "Invalid property layout: {}", msg),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Device pool errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The pool has no devices
    NoDevices,
    /// Device id outside the pool
    UnknownDevice { id: usize, size: usize },
    /// Device freed while not leased
    NotLeased(usize),
    /// Lease outlived its device, which was freed and leased again
    StaleLease(usize),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoDevices => write!(f, "No compute devices available"),
            DeviceError::UnknownDevice { id, size } => {
                write!(f, "Unknown device {} (pool size {})", id, size)
            }
            DeviceError::NotLeased(id) => write!(f, "Device {} is not leased", id),
            DeviceError::StaleLease(id) => {
                write!(f, "Lease on device {} is stale, the device was re-leased", id)
            }
        }
    }
}

impl std::error::Error for DeviceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    // =========================================================================
    // Display
    // =========================================================================

    #[test]
    fn test_error_display_config() {
        let e = Error::Config("bad window".into());
        assert_eq!(e.to_string(), "Configuration error: bad window");
    }

    #[test]
    fn test_error_display_state_out_of_range() {
        let e = Error::Extraction(ExtractionError::StateOutOfRange { state: 4, count: 2 });
        assert_eq!(
            e.to_string(),
            "Extraction error: State 4 out of range, eigensolution has 2 states"
        );
    }

    #[test]
    fn test_index_error_display_arity() {
        let e = IndexError::ArityMismatch {
            context: "self-energy vertex".into(),
            expected: 5,
            actual: 3,
        };
        assert_eq!(
            e.to_string(),
            "self-energy vertex: expected 5 components, got 3"
        );
    }

    #[test]
    fn test_index_error_display_component_arity() {
        let e = IndexError::ComponentArity {
            component: 2,
            expected: 1,
            actual: 3,
        };
        assert_eq!(e.to_string(), "Component 2 must have 1 subindices, got 3");
    }

    #[test]
    fn test_device_error_display() {
        assert_eq!(
            DeviceError::NoDevices.to_string(),
            "No compute devices available"
        );
        assert_eq!(
            DeviceError::UnknownDevice { id: 3, size: 2 }.to_string(),
            "Unknown device 3 (pool size 2)"
        );
        assert_eq!(DeviceError::NotLeased(1).to_string(), "Device 1 is not leased");
        assert_eq!(
            DeviceError::StaleLease(0).to_string(),
            "Lease on device 0 is stale, the device was re-leased"
        );
    }

    // =========================================================================
    // source() and From
    // =========================================================================

    #[test]
    fn test_error_source() {
        assert!(Error::Device(DeviceError::NoDevices).source().is_some());
        assert!(Error::Index(IndexError::Parse("x".into())).source().is_some());
        assert!(Error::Config("x".into()).source().is_none());
        assert!(Error::Serialization("x".into()).source().is_none());
    }

    #[test]
    fn test_from_conversions() {
        let e: Error = IndexError::UnknownIndex("{9}".into()).into();
        assert!(matches!(e, Error::Index(IndexError::UnknownIndex(_))));

        let e: Error = DeviceError::NoDevices.into();
        assert!(matches!(e, Error::Device(DeviceError::NoDevices)));

        let e: Error = std::io::Error::other("disk").into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("{{{{").unwrap_err();
        let e: Error = yaml_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }
}
