//! Mock key source for testing and development.
//!
//! This module provides a simulated platform key hook that can be driven
//! programmatically to press and release the handheld's trigger buttons.

use crate::{Result, traits::KeySource, types::KeyAction};
use tokio::sync::mpsc;

/// Mock key source for testing and development.
///
/// # Examples
///
/// ```
/// use uhf_hardware::mock::MockKeySource;
/// use uhf_hardware::traits::KeySource;
/// use uhf_hardware::types::KeyAction;
///
/// #[tokio::main]
/// async fn main() -> uhf_hardware::Result<()> {
///     let (mut keys, handle) = MockKeySource::new();
///
///     handle.click(293).await?;
///
///     assert_eq!(keys.next_key().await?, KeyAction::press(293));
///     assert_eq!(keys.next_key().await?, KeyAction::release(293));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeySource {
    /// Channel receiver for simulated key transitions
    key_rx: mpsc::Receiver<KeyAction>,
}

impl MockKeySource {
    /// Create a new mock key source.
    ///
    /// Returns a tuple of (MockKeySource, MockKeyHandle) where the handle
    /// can be used to simulate key presses.
    pub fn new() -> (Self, MockKeyHandle) {
        let (key_tx, key_rx) = mpsc::channel(32);
        (Self { key_rx }, MockKeyHandle { key_tx })
    }
}

impl Default for MockKeySource {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeySource for MockKeySource {
    async fn next_key(&mut self) -> Result<KeyAction> {
        self.key_rx
            .recv()
            .await
            .ok_or_else(|| crate::DriverError::disconnected("Key hook channel closed"))
    }
}

/// Handle for driving a mock key source. It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeyHandle {
    /// Channel sender for simulated key transitions
    key_tx: mpsc::Sender<KeyAction>,
}

impl MockKeyHandle {
    /// Send a key transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the key source has been dropped.
    pub async fn send(&self, action: KeyAction) -> Result<()> {
        self.key_tx
            .send(action)
            .await
            .map_err(|_| crate::DriverError::disconnected("Key hook channel closed"))
    }

    /// Press a key (first press, no auto-repeat).
    pub async fn press(&self, code: u32) -> Result<()> {
        self.send(KeyAction::press(code)).await
    }

    pub async fn release(&self, code: u32) -> Result<()> {
        self.send(KeyAction::release(code)).await
    }

    /// Press and release a key.
    pub async fn click(&self, code: u32) -> Result<()> {
        self.press(code).await?;
        self.release(code).await
    }
}
