//! Error types for reader driver calls.
//!
//! These model what a vendor SDK call can throw. They are translated into
//! the caller-facing [`uhf_core::Error`] taxonomy at the adapter boundary;
//! they never reach the application layer as-is.

/// Result type alias for driver calls.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Faults raised by a reader driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The SDK rejected its configuration (serial port, module type, ...).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The SDK call threw.
    #[error("Driver fault: {message}")]
    Fault { message: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Invalid data received from the module.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new driver fault.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether the SDK reported a configuration-level fault.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
