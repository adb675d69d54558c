//! SAI error types and status handling.
//!
//! Raw `sai_status_t` values are mapped onto [`SaiStatus`] and surfaced to
//! callers as [`SaiError`].

use std::fmt;
use thiserror::Error;

/// SAI status codes returned by counter and attribute queries.
///
/// Values match `sai_status_t` in the SAI headers.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success = 0,
    Failure = -1,
    NotSupported = -2,
    NoMemory = -3,
    InvalidParameter = -5,
    ItemNotFound = -7,
    BufferOverflow = -8,
    Uninitialized = -12,
    NotImplemented = -15,
    InvalidObjectType = -18,
    InvalidObjectId = -19,
}

/// Raw value and header name of every known status.
const STATUS_NAMES: &[(SaiStatus, &str)] = &[
    (SaiStatus::Success, "SAI_STATUS_SUCCESS"),
    (SaiStatus::Failure, "SAI_STATUS_FAILURE"),
    (SaiStatus::NotSupported, "SAI_STATUS_NOT_SUPPORTED"),
    (SaiStatus::NoMemory, "SAI_STATUS_NO_MEMORY"),
    (SaiStatus::InvalidParameter, "SAI_STATUS_INVALID_PARAMETER"),
    (SaiStatus::ItemNotFound, "SAI_STATUS_ITEM_NOT_FOUND"),
    (SaiStatus::BufferOverflow, "SAI_STATUS_BUFFER_OVERFLOW"),
    (SaiStatus::Uninitialized, "SAI_STATUS_UNINITIALIZED"),
    (SaiStatus::NotImplemented, "SAI_STATUS_NOT_IMPLEMENTED"),
    (SaiStatus::InvalidObjectType, "SAI_STATUS_INVALID_OBJECT_TYPE"),
    (SaiStatus::InvalidObjectId, "SAI_STATUS_INVALID_OBJECT_ID"),
];

impl SaiStatus {
    /// Maps a raw status value; unknown codes collapse to `Failure`.
    pub fn from_raw(status: i32) -> Self {
        STATUS_NAMES
            .iter()
            .map(|(s, _)| *s)
            .find(|s| s.as_raw() == status)
            .unwrap_or(SaiStatus::Failure)
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Header name, e.g. `SAI_STATUS_ITEM_NOT_FOUND`.
    pub fn name(self) -> &'static str {
        STATUS_NAMES
            .iter()
            .find(|(s, _)| *s == self)
            .map_or("SAI_STATUS_FAILURE", |(_, name)| name)
    }

    pub fn is_success(self) -> bool {
        self == SaiStatus::Success
    }

    pub fn into_result(self) -> SaiResult<()> {
        match self {
            SaiStatus::Success => Ok(()),
            other => Err(SaiError::from_status(other)),
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for SAI operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// SAI API returned an error status.
    #[error("SAI operation failed: {status}")]
    Status { status: SaiStatus },

    /// The requested feature or counter is not supported.
    #[error("Feature not supported: {feature}")]
    NotSupported { feature: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Item not found: {item}")]
    NotFound { item: String },

    /// SAI context is not initialized.
    #[error("SAI not initialized")]
    Uninitialized,
}

impl SaiError {
    /// Creates an error from a SAI status code.
    pub fn from_status(status: SaiStatus) -> Self {
        match status {
            SaiStatus::NotSupported | SaiStatus::NotImplemented => SaiError::NotSupported {
                feature: status.to_string(),
            },
            SaiStatus::InvalidParameter
            | SaiStatus::InvalidObjectType
            | SaiStatus::InvalidObjectId => SaiError::InvalidParameter {
                message: format!("SAI returned {}", status),
            },
            SaiStatus::ItemNotFound => SaiError::NotFound {
                item: status.to_string(),
            },
            SaiStatus::Uninitialized => SaiError::Uninitialized,
            _ => SaiError::Status { status },
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        SaiError::NotSupported {
            feature: feature.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        SaiError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn not_found(item: impl Into<String>) -> Self {
        SaiError::NotFound { item: item.into() }
    }

    /// Best-effort status code for log lines.
    pub fn status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status } => *status,
            SaiError::NotSupported { .. } => SaiStatus::NotSupported,
            SaiError::InvalidParameter { .. } => SaiStatus::InvalidParameter,
            SaiError::NotFound { .. } => SaiStatus::ItemNotFound,
            SaiError::Uninitialized => SaiStatus::Uninitialized,
        }
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;
