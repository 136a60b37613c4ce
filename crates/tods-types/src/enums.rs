//! Enumeration types shared by the server and its observers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state of a ship in the authoritative world.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum ShipState {
    /// Idle; may accept a new action.
    #[default]
    Stopped,
    /// Travelling to an adjacent tile.
    Moving,
    /// Striking an adjacent target.
    Attacking,
    /// Destroyed or absorbed; no longer part of the live table.
    Removed,
}

/// What an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// A ship moves to an adjacent tile.
    Move,
    /// A ship strikes an adjacent ship.
    Attack,
    /// A ship enters the world.
    Spawn,
    /// A ship leaves the world (destroyed or merged away).
    Despawn,
    /// A ship survived a strike; carries its reduced health.
    Attacked,
    /// A ship absorbed same-owner ships; carries its combined health.
    Merged,
}

/// Where in an action's timeline an event sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Intent issued by a client; never broadcast.
    Command,
    /// The action started; `duration_ms` says how long it will take.
    Begin,
    /// Intermediate progress of a running action.
    Progress,
    /// The action finished; the source snapshot is authoritative.
    End,
}
