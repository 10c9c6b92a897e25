//! Domain logic for the crewboard scheduling console.
//!
//! Pure functions and plain data: the hhmm time codec, swimlane date ranges,
//! grid layout and gesture handling, allocation rules and list filters. No
//! I/O and no async, so the client, the console and any future tooling can
//! share it.

pub mod allocation;
pub mod error;
pub mod filter;
pub mod hhmm;
pub mod layout;
pub mod swimlane;
pub mod team;
pub mod types;
