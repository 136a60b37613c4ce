//! Authoritative world for the Tods hex-grid simulation.
//!
//! The server owns the canonical ship table. Players post commands into
//! per-player inbound queues; a logic entry per player drains them through
//! the shared [`Scheduler`], turning each command into a timed action whose
//! Begin/End events are broadcast to every online player's outbound queue.
//!
//! # Modules
//!
//! - [`actions`] -- Spawn, Move, and Attack state machines.
//! - [`drain`] -- Join and command-drain entries, one per player.
//! - [`session`] -- Player sessions, event queues, and the registry.
//! - [`sim`] -- [`ServerSim`] and the transport-facing [`ServerHandle`].
//! - [`world`] -- [`ServerWorld`], the ship table and broadcast fan-out.
//!
//! [`Scheduler`]: tods_core::Scheduler

pub mod actions;
pub mod drain;
pub mod session;
pub mod sim;
pub mod world;

pub use actions::Action;
pub use session::{EventQueue, PlayerSession, SessionRegistry, SessionStatus};
pub use sim::{ServerHandle, ServerSim};
pub use world::ServerWorld;
