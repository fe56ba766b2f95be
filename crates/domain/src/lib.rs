//! # irrihub-domain
//!
//! Pure domain model for the irrihub irrigation controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Sensor readings** (latest humidity snapshot per soil sensor)
//! - Define **Valve statuses** (actuator state, merged by shallow overlay)
//! - Define the **Strategy** (automation mode, method and thresholds)
//! - Define **Policies** (ordered sensor → valve rules)
//! - Define the **Manual override** registry (global and per-valve gating)
//! - Define **Commands** sent to valves and the open-duration fallback chain
//! - Define **Broadcast events** and the **device registry**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod event;
pub mod manual_override;
pub mod policy;
pub mod sensor;
pub mod strategy;
pub mod topic;
pub mod valve;
