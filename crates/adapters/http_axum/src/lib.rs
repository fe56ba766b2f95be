//! # irrihub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** used by the irrigation dashboard
//!   (`/api/strategy`, `/api/policies`, `/api/override`, `/api/valves/{id}/…`, …)
//! - Serve the **live event stream** (`/api/events/stream`, Server-Sent Events)
//! - Map HTTP requests into controller calls (driving adapter)
//! - Map controller results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `irrihub-app` (for the controller handle and ports) and
//! `irrihub-domain` (for types used in request/response mapping). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
