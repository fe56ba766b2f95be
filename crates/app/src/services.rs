//! Application services: use-case implementations.
//!
//! Services operate on the controller-owned [`ControlState`](crate::state::ControlState)
//! and receive port implementations via generic parameters, keeping this
//! layer decoupled from concrete adapters.

pub mod configuration_service;
pub mod override_service;
