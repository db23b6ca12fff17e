//! Physical trigger keys.
//!
//! The handheld's trigger buttons are reported by the platform key hook, not
//! by the RFID SDK. [`TriggerKeyHook`] maps key transitions on the configured
//! codes to `trigger-press` / `trigger-release` emissions; [`spawn_key_task`]
//! pumps a [`KeySource`] through a hook in the background.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uhf_core::BridgeEvent;
use uhf_hardware::{AnyKeySource, DriverError, KeyAction, KeySource};

use crate::config::BridgeConfig;
use crate::relay::EventSink;

/// Maps trigger key transitions to relay emissions.
#[derive(Debug, Clone)]
pub struct TriggerKeyHook {
    config: Arc<BridgeConfig>,
    sink: EventSink,
}

impl TriggerKeyHook {
    pub fn new(config: Arc<BridgeConfig>, sink: EventSink) -> Self {
        Self { config, sink }
    }

    /// Handle one key transition.
    ///
    /// Returns `true` if the key was a trigger transition and has been
    /// forwarded; auto-repeats and other keys are left to the platform.
    pub fn handle(&self, action: KeyAction) -> bool {
        let event = match action {
            KeyAction::Down { code, repeat: 0 } if self.config.is_trigger_key(code) => {
                BridgeEvent::TriggerPress
            }
            KeyAction::Up { code } if self.config.is_trigger_key(code) => BridgeEvent::TriggerRelease,
            _ => {
                trace!("Key {:?} not consumed", action);
                return false;
            }
        };

        trace!("Trigger key {} -> {}", action.code(), event.kind());
        self.sink.emit(event);
        true
    }
}

/// Spawn a task forwarding every key from `source` through `hook`.
///
/// The task ends cleanly when the key hook disconnects, and with an error
/// on any other source fault.
pub fn spawn_key_task(
    mut source: AnyKeySource,
    hook: TriggerKeyHook,
) -> JoinHandle<uhf_hardware::Result<()>> {
    tokio::spawn(async move {
        debug!("Trigger key task started");
        loop {
            match source.next_key().await {
                Ok(action) => {
                    hook.handle(action);
                }
                Err(DriverError::Disconnected { device }) => {
                    debug!("Key source closed: {}", device);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Key source failed: {}", e);
                    return Err(e);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::EventRelay;
    use std::sync::Mutex;
    use uhf_core::EventKind;
    use uhf_hardware::mock::MockKeySource;

    fn recording_relay() -> (EventRelay, Arc<Mutex<Vec<EventKind>>>) {
        let relay = EventRelay::new(16).unwrap();
        relay.sink().arm();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::TriggerPress, EventKind::TriggerRelease] {
            let seen = Arc::clone(&seen);
            relay.subscribe(kind, move |event: &BridgeEvent| {
                seen.lock().unwrap().push(event.kind());
            });
        }
        (relay, seen)
    }

    fn hook(codes: &[u32], relay: &EventRelay) -> TriggerKeyHook {
        let config = BridgeConfig {
            trigger_key_codes: codes.to_vec(),
            ..BridgeConfig::default()
        };
        TriggerKeyHook::new(Arc::new(config), relay.sink())
    }

    #[tokio::test]
    async fn test_hook_maps_trigger_keys() {
        let (relay, seen) = recording_relay();
        let hook = hook(&[139, 280, 293], &relay);

        assert!(hook.handle(KeyAction::press(280)));
        assert!(!hook.handle(KeyAction::Down { code: 280, repeat: 3 }));
        assert!(hook.handle(KeyAction::release(280)));
        assert!(!hook.handle(KeyAction::press(24)));
        assert!(!hook.handle(KeyAction::release(24)));
        relay.flush().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::TriggerPress, EventKind::TriggerRelease]
        );
    }

    #[tokio::test]
    async fn test_key_task_forwards_until_disconnect() {
        let (relay, seen) = recording_relay();
        let hook = hook(&[293], &relay);
        let (keys, handle) = MockKeySource::new();

        let task = spawn_key_task(AnyKeySource::Mock(keys), hook);
        handle.click(293).await.unwrap();
        handle.click(100).await.unwrap();
        drop(handle);

        assert!(task.await.unwrap().is_ok());
        relay.flush().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::TriggerPress, EventKind::TriggerRelease]
        );
    }
}
