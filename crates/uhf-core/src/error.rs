//! Caller-facing error taxonomy.
//!
//! Every failure surfaced by the bridge falls into one of five kinds:
//! not-initialized, configuration-invalid, operation-failed (tagged with the
//! operation), no-tag-found, and validation-failed. Each error carries a
//! machine-readable [`code`](Error::code) and a human-readable message.

use std::fmt;

use thiserror::Error;

/// Reader operations exposed by the device adapter.
///
/// Used to tag [`Error::OperationFailed`] so the caller can tell which
/// hardware call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Free,
    GetVersion,
    SetPower,
    GetPower,
    SetFrequencyMode,
    GetFrequencyMode,
    StartInventory,
    StopInventory,
    InventorySingleTag,
    ReadData,
    WriteData,
    WriteEpc,
    SetFilter,
    LockTag,
    KillTag,
    IsInventorying,
    SetInventoryMode,
    GetInventoryMode,
}

impl Operation {
    /// Machine-readable failure code for this operation.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Init => "INIT_ERROR",
            Self::Free => "FREE_ERROR",
            Self::GetVersion => "VERSION_ERROR",
            Self::SetPower | Self::GetPower => "POWER_ERROR",
            Self::SetFrequencyMode | Self::GetFrequencyMode => "FREQUENCY_ERROR",
            Self::StartInventory => "START_ERROR",
            Self::StopInventory => "STOP_ERROR",
            Self::InventorySingleTag | Self::ReadData => "READ_ERROR",
            Self::WriteData | Self::WriteEpc => "WRITE_ERROR",
            Self::SetFilter => "FILTER_ERROR",
            Self::LockTag => "LOCK_ERROR",
            Self::KillTag => "KILL_ERROR",
            Self::IsInventorying => "STATUS_ERROR",
            Self::SetInventoryMode | Self::GetInventoryMode => "MODE_ERROR",
        }
    }

    /// Method name as seen by the application layer.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Free => "free",
            Self::GetVersion => "getVersion",
            Self::SetPower => "setPower",
            Self::GetPower => "getPower",
            Self::SetFrequencyMode => "setFrequencyMode",
            Self::GetFrequencyMode => "getFrequencyMode",
            Self::StartInventory => "startInventory",
            Self::StopInventory => "stopInventory",
            Self::InventorySingleTag => "inventorySingleTag",
            Self::ReadData => "readData",
            Self::WriteData => "writeData",
            Self::WriteEpc => "writeEPC",
            Self::SetFilter => "setFilter",
            Self::LockTag => "lockTag",
            Self::KillTag => "killTag",
            Self::IsInventorying => "isInventorying",
            Self::SetInventoryMode => "setInventoryMode",
            Self::GetInventoryMode => "getInventoryMode",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Errors returned by every bridge call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("RFID reader not initialized")]
    NotInitialized,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{operation} failed: {message}")]
    OperationFailed {
        operation: Operation,
        message: String,
    },

    #[error("No tag found")]
    NoTag,

    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an operation failure tagged with `operation`.
    pub fn operation(operation: Operation, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::OperationFailed { operation, .. } => operation.error_code(),
            Self::NoTag => "NO_TAG",
            Self::Validation { .. } => "VALIDATION_ERROR",
        }
    }

    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotInitialized.code(), "NOT_INITIALIZED");
        assert_eq!(Error::config("bad uart").code(), "CONFIG_ERROR");
        assert_eq!(Error::NoTag.code(), "NO_TAG");
        assert_eq!(Error::validation("power").code(), "VALIDATION_ERROR");
        assert_eq!(
            Error::operation(Operation::StartInventory, "busy").code(),
            "START_ERROR"
        );
    }

    #[test]
    fn test_shared_operation_codes() {
        assert_eq!(Operation::SetPower.error_code(), Operation::GetPower.error_code());
        assert_eq!(Operation::ReadData.error_code(), "READ_ERROR");
        assert_eq!(Operation::InventorySingleTag.error_code(), "READ_ERROR");
        assert_eq!(Operation::WriteEpc.error_code(), "WRITE_ERROR");
    }

    #[test]
    fn test_error_display() {
        let error = Error::operation(Operation::KillTag, "tag did not respond");
        assert_eq!(error.to_string(), "killTag failed: tag did not respond");
        assert_eq!(Error::NotInitialized.to_string(), "RFID reader not initialized");
    }
}
