//! UHF RFID reader bridge.
//!
//! Exposes a vendor UHF reader SDK to an application layer through an
//! async call surface and a named event stream.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐  request/response  ┌────────────────┐
//!  Application ──►│  UhfClient   │───────────────────►│ DeviceAdapter  │──► UhfReader
//!                 │  (facade)    │                    │                │
//!                 └──────▲───────┘                    └───────┬────────┘
//!                        │ listeners                          │ callbacks
//!                 ┌──────┴───────┐                            │
//!                 │ EventRelay   │◄───────────────────────────┘
//!                 │              │◄──── TriggerKeyHook ◄── KeySource
//!                 └──────────────┘
//! ```
//!
//! - [`DeviceAdapter`] owns the reader and translates its results into the
//!   [`uhf_core::Error`] taxonomy.
//! - [`EventRelay`] queues hardware callbacks and fans them out to listeners
//!   on a single dispatcher task.
//! - [`UhfClient`] validates input, publishes constants and registers
//!   typed listeners.

pub mod adapter;
pub mod client;
pub mod config;
pub mod relay;
pub mod trigger;

pub use adapter::{DeviceAdapter, ReaderHandle};
pub use client::UhfClient;
pub use config::BridgeConfig;
pub use relay::{EventRelay, EventSink, Listener, Subscription};
pub use trigger::{TriggerKeyHook, spawn_key_task};
