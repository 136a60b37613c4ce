//! Timed, multi-phase ship actions.
//!
//! Every action is a small state machine advanced by the scheduler. It
//! holds only ids and captured parameters, and re-resolves its ships from
//! the [`ServerWorld`] on every resumption, so a ship that disappears
//! mid-sequence simply ends the action.
//!
//! Illegal commands are dropped without any event; the issuing client
//! learns about it only through the absence of a Begin.

use tods_core::{Logic, LogicError, Step};
use tods_grid::are_adjacent;
use tods_types::{Event, EventKind, Phase, Ship, ShipId, ShipState, Tile};
use tracing::debug;

use crate::world::ServerWorld;

/// An action started by a player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Place a ship on the grid.
    Spawn(SpawnAction),
    /// Move a ship to an adjacent tile, merging with friends there.
    Move(MoveAction),
    /// Strike an adjacent ship until it dies or the attack becomes illegal.
    Attack(AttackAction),
}

impl Action {
    /// Build the action for a command event. Kinds that clients cannot
    /// command (and attacks without a target) yield `None`.
    pub fn from_command(command: &Event) -> Option<Self> {
        match command.kind {
            EventKind::Spawn => Some(Self::Spawn(SpawnAction::new(command.source.clone()))),
            EventKind::Move => Some(Self::Move(MoveAction::new(
                command.ship_id(),
                command.destination(),
            ))),
            EventKind::Attack => command
                .target_ship_id
                .map(|target| Self::Attack(AttackAction::new(command.ship_id(), target))),
            EventKind::Despawn | EventKind::Attacked | EventKind::Merged => None,
        }
    }

    /// Advance the action by one phase.
    pub fn step(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        match self {
            Self::Spawn(action) => action.step(world),
            Self::Move(action) => action.step(world),
            Self::Attack(action) => action.step(world),
        }
    }
}

impl Logic<ServerWorld> for Action {
    fn resume(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        self.step(world)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Spawn(_) => "spawn",
            Self::Move(_) => "move",
            Self::Attack(_) => "attack",
        }
    }
}

/// Update a live ship in place and return its snapshot.
fn update_ship(
    world: &mut ServerWorld,
    id: ShipId,
    f: impl FnOnce(&mut Ship),
) -> Option<Ship> {
    world.live_ship_mut(id).map(|ship| {
        f(ship);
        ship.clone()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnPhase {
    Insert,
    Finish,
}

/// Spawn: insert, broadcast Begin, wait, broadcast End.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnAction {
    ship: Ship,
    phase: SpawnPhase,
}

impl SpawnAction {
    /// Spawn a copy of `ship`.
    pub const fn new(ship: Ship) -> Self {
        Self {
            ship,
            phase: SpawnPhase::Insert,
        }
    }

    fn step(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        let id = self.ship.id;
        match self.phase {
            SpawnPhase::Insert => {
                if self.ship.health <= 0 {
                    debug!(ship = %id, health = self.ship.health, "Spawn dropped: no health");
                    return Ok(Step::Done);
                }

                let mut ship = self.ship.clone();
                ship.state = ShipState::Stopped;
                ship.busy = true;
                if !world.insert_ship(ship.clone()) {
                    debug!(ship = %id, "Spawn dropped: id already in use");
                    return Ok(Step::Done);
                }

                let duration = world.action_config().spawn_ms;
                world.broadcast(
                    Event::new(EventKind::Spawn, Phase::Begin, ship).with_duration(duration),
                );
                self.phase = SpawnPhase::Finish;
                Ok(Step::Sleep(duration))
            }
            SpawnPhase::Finish => {
                if let Some(ship) = update_ship(world, id, |ship| ship.busy = false) {
                    world.broadcast(Event::new(EventKind::Spawn, Phase::End, ship));
                }
                Ok(Step::Done)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MovePhase {
    Validate,
    Arrive,
}

/// Move to an adjacent tile, then merge with same-owner ships there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    ship: ShipId,
    dest: Tile,
    phase: MovePhase,
}

impl MoveAction {
    /// Move `ship` to `dest`.
    pub const fn new(ship: ShipId, dest: Tile) -> Self {
        Self {
            ship,
            dest,
            phase: MovePhase::Validate,
        }
    }

    fn step(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        match self.phase {
            MovePhase::Validate => self.begin(world),
            MovePhase::Arrive => {
                self.arrive(world);
                Ok(Step::Done)
            }
        }
    }

    fn begin(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        let Some(ship) = world.live_ship(self.ship) else {
            debug!(ship = %self.ship, "Move dropped: unknown ship");
            return Ok(Step::Done);
        };
        if !are_adjacent(ship.tile(), self.dest) {
            debug!(ship = %self.ship, dest = %self.dest, "Move dropped: not adjacent");
            return Ok(Step::Done);
        }
        if world.foe_at(self.dest, &ship.owner) {
            debug!(ship = %self.ship, dest = %self.dest, "Move dropped: occupied by a foe");
            return Ok(Step::Done);
        }

        let Some(ship) = update_ship(world, self.ship, |ship| {
            ship.state = ShipState::Moving;
            ship.busy = true;
        }) else {
            return Ok(Step::Done);
        };

        let duration = world.action_config().move_ms;
        world.broadcast(
            Event::new(EventKind::Move, Phase::Begin, ship)
                .with_duration(duration)
                .with_destination(self.dest),
        );
        self.phase = MovePhase::Arrive;
        Ok(Step::Sleep(duration))
    }

    /// Land on the destination. The Move End snapshot still reads as
    /// moving; the ship stops only after any merge has been announced.
    fn arrive(&self, world: &mut ServerWorld) {
        let dest = self.dest;
        let Some(ship) = update_ship(world, self.ship, |ship| ship.set_tile(dest)) else {
            return;
        };
        world.broadcast(Event::new(EventKind::Move, Phase::End, ship).with_destination(dest));

        let absorbed = world.merge_into(self.ship);
        for other in &absorbed {
            world.broadcast(Event::new(EventKind::Despawn, Phase::End, other.clone()));
        }
        let merged = if absorbed.is_empty() {
            None
        } else {
            world.live_ship(self.ship).cloned()
        };
        if let Some(merged) = merged {
            debug!(ship = %merged.id, health = merged.health, "Ships merged");
            world.broadcast(Event::new(EventKind::Merged, Phase::End, merged));
        }

        update_ship(world, self.ship, |ship| {
            ship.state = ShipState::Stopped;
            ship.busy = false;
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackPhase {
    Engage,
    Strike,
    Despawn,
}

/// Repeatedly strike an adjacent ship until it dies or the attack becomes
/// illegal. Legality is re-checked before every strike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackAction {
    attacker: ShipId,
    target: ShipId,
    phase: AttackPhase,
    engaged: bool,
}

impl AttackAction {
    /// `attacker` attacks `target`.
    pub const fn new(attacker: ShipId, target: ShipId) -> Self {
        Self {
            attacker,
            target,
            phase: AttackPhase::Engage,
            engaged: false,
        }
    }

    fn step(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        match self.phase {
            AttackPhase::Engage => Ok(self.engage(world)),
            AttackPhase::Strike => Ok(self.strike(world)),
            AttackPhase::Despawn => {
                if let Some(target) = world.remove_ship(self.target) {
                    world.broadcast(Event::new(EventKind::Despawn, Phase::End, target));
                }
                Ok(self.finish(world))
            }
        }
    }

    fn engage(&mut self, world: &mut ServerWorld) -> Step {
        let Some(attacker) = world.live_ship(self.attacker) else {
            debug!(ship = %self.attacker, "Attack ended: attacker gone");
            return self.finish(world);
        };
        if attacker.state != ShipState::Stopped {
            debug!(ship = %self.attacker, state = ?attacker.state, "Attack ended: attacker not idle");
            return self.finish(world);
        }
        let Some(target_tile) = world
            .live_ship(self.target)
            .filter(|target| target.id != attacker.id)
            .map(Ship::tile)
        else {
            debug!(ship = %self.attacker, target = %self.target, "Attack ended: target gone");
            return self.finish(world);
        };
        if !are_adjacent(attacker.tile(), target_tile) {
            debug!(ship = %self.attacker, target = %self.target, "Attack ended: target out of range");
            return self.finish(world);
        }

        let Some(attacker) = update_ship(world, self.attacker, |ship| {
            ship.state = ShipState::Attacking;
            ship.busy = true;
        }) else {
            return self.finish(world);
        };
        self.engaged = true;

        let duration = world.action_config().attack_ms;
        world.broadcast(
            Event::new(EventKind::Attack, Phase::Begin, attacker)
                .with_duration(duration)
                .with_target(self.target)
                .with_destination(target_tile),
        );
        self.phase = AttackPhase::Strike;
        Step::Sleep(duration)
    }

    fn strike(&mut self, world: &mut ServerWorld) -> Step {
        let Some(attacker) = world.live_ship(self.attacker).cloned() else {
            return self.finish(world);
        };
        world.broadcast(Event::new(EventKind::Attack, Phase::End, attacker.clone()));

        let divisor = world.action_config().damage_divisor;
        let damage = attacker
            .health
            .checked_div(divisor)
            .unwrap_or(attacker.health)
            .max(1);

        let Some(target) = update_ship(world, self.target, |target| {
            target.health = target.health.saturating_sub(damage);
            if target.health <= 0 {
                target.state = ShipState::Removed;
            }
        }) else {
            return self.finish(world);
        };

        if target.state == ShipState::Removed {
            debug!(ship = %self.attacker, target = %self.target, "Target destroyed");
            let duration = world.action_config().despawn_ms;
            world.broadcast(
                Event::new(EventKind::Despawn, Phase::Begin, target).with_duration(duration),
            );
            self.phase = AttackPhase::Despawn;
            return Step::Sleep(duration);
        }

        world.broadcast(Event::new(EventKind::Attacked, Phase::End, target));
        update_ship(world, self.attacker, |ship| ship.state = ShipState::Stopped);
        self.phase = AttackPhase::Engage;
        Step::Sleep(world.action_config().attack_cooldown_ms)
    }

    fn finish(&self, world: &mut ServerWorld) -> Step {
        if self.engaged {
            update_ship(world, self.attacker, |ship| {
                ship.state = ShipState::Stopped;
                ship.busy = false;
            });
        }
        Step::Done
    }
}
