//! Lead qualification and nurture automation for recruitment outreach.
//!
//! The crate narrows a raw export of vacancy leads through deterministic
//! filter and scoring phases, enriches the shortlist through a rate-limited
//! provider waterfall, writes qualified leads to a contact store, and later
//! advances stored contacts through a fixed nurture message sequence.

pub mod api;
pub mod config;
pub mod error;
pub mod remote;
pub mod telemetry;
pub mod workflows;
