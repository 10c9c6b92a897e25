//! Crewboard console state.
//!
//! Everything between the backend client and a renderer: shared context,
//! loading and toast coordination, list panels, debounced search, the team
//! allocation board and device-local preferences. Exposed as a library so
//! integration tests and the binary share it.

pub mod config;
pub mod context;
pub mod error;
pub mod listing;
pub mod loading;
pub mod preferences;
pub mod search;
pub mod team_board;
pub mod toast;
pub mod view;
