//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware.

pub mod keys;
pub mod uhf;

// Re-export commonly used types
pub use keys::{MockKeyHandle, MockKeySource};
pub use uhf::{MockCall, MockFault, MockUhfHandle, MockUhfReader, SimulatedTag};
