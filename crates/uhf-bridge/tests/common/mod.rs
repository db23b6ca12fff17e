//! Common test utilities for bridge integration tests.
//!
//! A [`Session`] pairs a [`UhfClient`] with the handle of the simulated
//! module it drives, and an [`EventLog`] records every emission.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use uhf_bridge::{BridgeConfig, UhfClient};
use uhf_core::{BridgeEvent, EventKind, TagRecord};
use uhf_hardware::mock::{MockUhfHandle, MockUhfReader, SimulatedTag};

/// Tags used across tests.
pub mod tags {
    pub const EPC_1: &str = "E20034120000000000000001";
    pub const EPC_2: &str = "E20034120000000000000002";

    /// A tag from another vendor prefix, for filter tests.
    pub const EPC_OTHER: &str = "300833B2DDD9014000000000";

    pub const ACCESS_PWD: &str = "12345678";
    pub const KILL_PWD: &str = "DEADBEEF";
    pub const ZERO_PWD: &str = "00000000";
}

pub struct Session {
    pub client: UhfClient<MockUhfReader>,
    pub field: MockUhfHandle,
}

/// Client over a module with `epcs` in its field, not yet initialized.
pub fn session_with(epcs: &[&str], config: BridgeConfig) -> Session {
    let (reader, field) = MockUhfReader::new();
    for epc in epcs {
        field.add_tag(SimulatedTag::new(epc).expect("valid test EPC"));
    }
    let client = UhfClient::new(reader, config).expect("valid test config");
    Session { client, field }
}

pub fn session(epcs: &[&str]) -> Session {
    session_with(epcs, BridgeConfig::default())
}

/// Initialized client over a module with `epcs` in its field.
pub async fn open_session(epcs: &[&str]) -> Session {
    let session = session(epcs);
    assert!(session.client.init().await.expect("init"));
    session
}

/// Records every emission on every channel, in dispatch order.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<BridgeEvent>>>);

impl EventLog {
    pub fn attach(client: &UhfClient<MockUhfReader>) -> Self {
        let log = Self::default();
        for kind in EventKind::ALL {
            let events = Arc::clone(&log.0);
            client.subscribe(kind, move |event: &BridgeEvent| {
                events.lock().unwrap().push(event.clone());
            });
        }
        log
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(BridgeEvent::kind).collect()
    }

    pub fn tags(&self) -> Vec<TagRecord> {
        self.events()
            .iter()
            .filter_map(|event| event.tag().cloned())
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().iter().filter(|k| **k == kind).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Counter incremented by a listener.
#[derive(Clone, Default)]
pub struct Counter(Arc<Mutex<usize>>);

impl Counter {
    pub fn bump(&self) {
        *self.0.lock().unwrap() += 1;
    }

    pub fn get(&self) -> usize {
        *self.0.lock().unwrap()
    }
}
