//! # irrihub-app
//!
//! Application layer: the irrigation control core and its **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Transport`: publish commands, report connectivity
//!   - `Broadcaster`: best-effort live fan-out
//!   - `ConfigStore`: load/save runtime configuration documents
//!   - `HistoryLog`: append and query sensor/valve history
//!   - `Clock`: current time
//! - Own the mutable core state inside a single **controller task**
//!   ([`controller::Controller`]) reached through a cloneable
//!   [`controller::ControllerHandle`]
//! - Track commands until acknowledged and schedule auto-close timers
//! - Decide automatic valve actions on every sensor reading
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `irrihub-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod controller;
pub mod dispatcher;
pub mod event_bus;
pub mod ingest;
pub mod ports;
pub mod services;
pub mod state;
pub mod store;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;
