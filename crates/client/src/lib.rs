//! HTTP client for the crewboard scheduling backend.
//!
//! [`api::BackendApi`] wraps the REST endpoints with typed requests and
//! responses; [`backend::SchedulingBackend`] is the trait the console depends
//! on, so panels can be driven by any implementation.

pub mod api;
pub mod backend;
