//! Core records exchanged between the authoritative world and its observers.
//!
//! An [`Event`] is the only channel of information between server and
//! client. It embeds a copy of the [`Ship`] it is about, never a live
//! reference, so the receiver can apply it without consulting anyone.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventKind, Phase, ShipState};
use crate::ids::{EventId, PlayerId, ShipId};

/// A tile on the hex grid in offset coordinates.
///
/// Odd rows are shifted right by half a tile width.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Tile {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Tile {
    /// Create a tile from column and row.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Tile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A ship on the grid.
///
/// The authoritative world owns the canonical instance; everything else
/// (event payloads, client mirrors) holds copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ship {
    /// Unique ship identifier.
    pub id: ShipId,
    /// The player that owns the ship.
    pub owner: PlayerId,
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub y: i32,
    /// Remaining health. Positive while the ship is live.
    pub health: i32,
    /// True while an action is sequenced for this ship.
    #[serde(default)]
    pub busy: bool,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ShipState,
}

impl Ship {
    /// Create a stopped, idle ship with a fresh id.
    pub fn new(owner: PlayerId, tile: Tile, health: i32) -> Self {
        Self {
            id: ShipId::new(),
            owner,
            x: tile.x,
            y: tile.y,
            health,
            busy: false,
            state: ShipState::Stopped,
        }
    }

    /// The tile the ship occupies.
    pub const fn tile(&self) -> Tile {
        Tile::new(self.x, self.y)
    }

    /// Place the ship on a tile.
    pub const fn set_tile(&mut self, tile: Tile) {
        self.x = tile.x;
        self.y = tile.y;
    }

    /// Whether the ship still takes part in the simulation.
    pub fn is_live(&self) -> bool {
        self.state != ShipState::Removed && self.health > 0
    }
}

impl core::fmt::Display for Ship {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Ship {} owner={} at ({}, {}) hp={} busy={} {:?}]",
            self.id, self.owner, self.x, self.y, self.health, self.busy, self.state
        )
    }
}

/// An immutable record of something that happened (or was requested).
///
/// Kind-specific fields are always present on the wire and default to
/// zero / `None` when they do not apply:
///
/// - `duration_ms` is meaningful on [`Phase::Begin`] of timed actions.
/// - `dest_x`/`dest_y` carry the move destination or the attack target's
///   tile.
/// - `target_ship_id` names the ship being attacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Event number (assigned by the world on broadcast).
    #[serde(default)]
    pub id: EventId,
    /// Snapshot of the ship the event is about.
    pub source: Ship,
    /// What happened.
    pub kind: EventKind,
    /// Where in the action's timeline this event sits.
    pub phase: Phase,
    /// Action duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// Destination column.
    #[serde(default)]
    pub dest_x: i32,
    /// Destination row.
    #[serde(default)]
    pub dest_y: i32,
    /// The ship being attacked, if any.
    #[serde(default)]
    pub target_ship_id: Option<ShipId>,
}

impl Event {
    /// Create an event with empty kind-specific fields.
    pub const fn new(kind: EventKind, phase: Phase, source: Ship) -> Self {
        Self {
            id: EventId::UNASSIGNED,
            source,
            kind,
            phase,
            duration_ms: 0,
            dest_x: 0,
            dest_y: 0,
            target_ship_id: None,
        }
    }

    /// Create a client command.
    pub const fn command(kind: EventKind, source: Ship) -> Self {
        Self::new(kind, Phase::Command, source)
    }

    /// Ask the server to place `ship` on the grid.
    pub const fn spawn_command(ship: Ship) -> Self {
        Self::command(EventKind::Spawn, ship)
    }

    /// Ask the server to move `ship` to the adjacent tile `dest`.
    pub fn move_command(ship: Ship, dest: Tile) -> Self {
        Self::command(EventKind::Move, ship).with_destination(dest)
    }

    /// Ask the server to attack `target` with `ship` until one of them
    /// can no longer continue.
    pub fn attack_command(ship: Ship, target: ShipId) -> Self {
        Self::command(EventKind::Attack, ship).with_target(target)
    }

    /// Set the event id.
    #[must_use]
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Set the action duration.
    #[must_use]
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the destination tile.
    #[must_use]
    pub fn with_destination(mut self, dest: Tile) -> Self {
        self.dest_x = dest.x;
        self.dest_y = dest.y;
        self
    }

    /// Set the attack target.
    #[must_use]
    pub fn with_target(mut self, target: ShipId) -> Self {
        self.target_ship_id = Some(target);
        self
    }

    /// The destination tile carried by the event.
    pub const fn destination(&self) -> Tile {
        Tile::new(self.dest_x, self.dest_y)
    }

    /// The id of the ship the event is about.
    pub const fn ship_id(&self) -> ShipId {
        self.source.id
    }

    /// The player owning the source ship.
    pub const fn owner(&self) -> &PlayerId {
        &self.source.owner
    }
}

impl core::fmt::Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[Event #{} {:?}/{:?} source={} duration={}ms dest=({}, {}) target={:?}]",
            self.id,
            self.kind,
            self.phase,
            self.source,
            self.duration_ms,
            self.dest_x,
            self.dest_y,
            self.target_ship_id
        )
    }
}
