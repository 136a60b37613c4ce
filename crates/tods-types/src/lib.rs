//! Shared type definitions for the Tods hex-grid simulation.
//!
//! This crate is the vocabulary both sides of the protocol agree on: the
//! authoritative server produces [`Event`]s, observers consume them, and
//! clients issue commands as [`Phase::Command`] events. Types are
//! exported to `TypeScript` via `ts-rs` for browser observers.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for ships, players, and events
//! - [`enums`] -- Ship lifecycle, event kinds, and progress phases
//! - [`structs`] -- [`Tile`], [`Ship`], and [`Event`] records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventKind, Phase, ShipState};
pub use ids::{EventId, PlayerId, ShipId};
pub use structs::{Event, Ship, Tile};
