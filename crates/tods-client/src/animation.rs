//! Per-ship animation replay.
//!
//! Every ship an observer can see owns an [`Animation`] in the
//! [`AnimationTable`] and an [`AnimationDriver`] entry in the observer's
//! scheduler. The driver drains the animation's private inbox one event
//! per resumption:
//!
//! - a Move or Attack `Begin` starts a linear glide from the ship's tile
//!   towards the destination, one render tick's worth of velocity per
//!   resumption for `max(1, duration / tick)` resumptions;
//! - any other `End` snaps the position back onto the authoritative tile;
//! - a Despawn `End` removes the animation and ends the driver.
//!
//! Events that arrive while a glide is running wait in the inbox until the
//! glide has finished.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tods_core::{Logic, LogicError, Step};
use tods_grid::{Pixel, tile_to_pixel};
use tods_types::{Event, EventKind, Phase, Ship, ShipId, Tile};
use tracing::trace;

use crate::color::Color;

/// What an animation is currently showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AnimationState {
    /// Resting on its tile.
    #[default]
    Stopped,
    /// Gliding to an adjacent tile.
    Moving,
    /// Lunging towards a target.
    Attacking,
}

/// A glide in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Motion {
    velocity: Pixel,
    steps_left: u64,
}

/// Client-only drawing state of one ship.
#[derive(Debug, Clone)]
pub struct Animation {
    ship: Ship,
    position: Pixel,
    state: AnimationState,
    color: Color,
    motion: Option<Motion>,
    inbox: VecDeque<Event>,
}

impl Animation {
    /// Create a resting animation for `ship`.
    ///
    /// `backlog` holds events that were addressed to the ship before its
    /// animation existed; they are replayed first.
    pub fn new(ship: Ship, color: Color, backlog: VecDeque<Event>) -> Self {
        Self {
            position: tile_to_pixel(ship.tile()),
            ship,
            state: AnimationState::Stopped,
            color,
            motion: None,
            inbox: backlog,
        }
    }

    /// The last authoritative snapshot the animation has applied.
    pub const fn ship(&self) -> &Ship {
        &self.ship
    }

    /// Current on-screen position.
    pub const fn position(&self) -> Pixel {
        self.position
    }

    /// Current animation state.
    pub const fn state(&self) -> AnimationState {
        self.state
    }

    /// The owner's colour.
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Whether a glide is still running.
    pub const fn is_gliding(&self) -> bool {
        self.motion.is_some()
    }

    /// Number of events waiting to be replayed.
    pub fn pending_events(&self) -> usize {
        self.inbox.len()
    }

    /// Queue an event for the driver.
    pub fn push(&mut self, event: Event) {
        self.inbox.push_back(event);
    }

    /// Start gliding towards `dest` over `duration_ms`, one step per
    /// `tick_ms`.
    #[allow(clippy::cast_precision_loss)]
    fn begin_glide(&mut self, dest: Tile, duration_ms: u64, tick_ms: u64) {
        let start = tile_to_pixel(self.ship.tile());
        let end = tile_to_pixel(dest);
        let steps = duration_ms.checked_div(tick_ms).unwrap_or(0).max(1);
        self.motion = Some(Motion {
            velocity: (end - start) / steps as f32,
            steps_left: steps,
        });
    }

    /// Advance a running glide by one step. Returns false when there is
    /// nothing left to advance.
    fn advance(&mut self) -> bool {
        match &mut self.motion {
            Some(motion) if motion.steps_left > 0 => {
                self.position += motion.velocity;
                motion.steps_left = motion.steps_left.saturating_sub(1);
                true
            }
            Some(_) => {
                self.motion = None;
                false
            }
            None => false,
        }
    }

    /// Adopt an authoritative snapshot and rest on its tile.
    fn settle(&mut self, snapshot: Ship) {
        self.ship = snapshot;
        self.position = tile_to_pixel(self.ship.tile());
        self.state = AnimationState::Stopped;
        self.motion = None;
    }
}

/// Every live animation, keyed by ship. The context of the observer's
/// scheduler.
#[derive(Debug, Default)]
pub struct AnimationTable {
    animations: BTreeMap<ShipId, Animation>,
}

impl AnimationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The animation of `id`.
    pub fn get(&self, id: ShipId) -> Option<&Animation> {
        self.animations.get(&id)
    }

    /// Mutable access to the animation of `id`.
    pub fn get_mut(&mut self, id: ShipId) -> Option<&mut Animation> {
        self.animations.get_mut(&id)
    }

    /// Whether `id` has an animation.
    pub fn contains(&self, id: ShipId) -> bool {
        self.animations.contains_key(&id)
    }

    /// Add an animation. Returns false if `id` already has one.
    pub fn insert(&mut self, animation: Animation) -> bool {
        let id = animation.ship.id;
        if self.animations.contains_key(&id) {
            return false;
        }
        self.animations.insert(id, animation);
        true
    }

    /// Remove the animation of `id`.
    pub fn remove(&mut self, id: ShipId) -> Option<Animation> {
        self.animations.remove(&id)
    }

    /// Iterate over every animation in ship id order.
    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.animations.values()
    }

    /// Number of animations.
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// Whether there are no animations.
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

/// Scheduler entry replaying one ship's events.
#[derive(Debug, Clone, Copy)]
pub struct AnimationDriver {
    ship: ShipId,
    tick_ms: u64,
}

impl AnimationDriver {
    /// Drive the animation of `ship` on a `tick_ms` render cadence.
    pub const fn new(ship: ShipId, tick_ms: u64) -> Self {
        Self { ship, tick_ms }
    }
}

impl Logic<AnimationTable> for AnimationDriver {
    fn resume(&mut self, table: &mut AnimationTable) -> Result<Step, LogicError> {
        let Some(animation) = table.get_mut(self.ship) else {
            return Ok(Step::Done);
        };

        if animation.advance() {
            return Ok(Step::NEXT_TICK);
        }

        let Some(event) = animation.inbox.pop_front() else {
            return Ok(Step::NEXT_TICK);
        };
        trace!(ship = %self.ship, kind = ?event.kind, phase = ?event.phase, "Replaying event");

        match (event.phase, event.kind) {
            (Phase::Begin, EventKind::Move | EventKind::Attack) => {
                animation.state = if event.kind == EventKind::Move {
                    AnimationState::Moving
                } else {
                    AnimationState::Attacking
                };
                animation.begin_glide(event.destination(), event.duration_ms, self.tick_ms);
                animation.advance();
            }
            (Phase::End, EventKind::Despawn) => {
                table.remove(self.ship);
                return Ok(Step::Done);
            }
            (Phase::End, _) => animation.settle(event.source),
            _ => {}
        }
        Ok(Step::NEXT_TICK)
    }

    fn label(&self) -> &'static str {
        "animation"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use tods_core::Scheduler;
    use tods_grid::TILE_WIDTH;
    use tods_types::PlayerId;

    use super::*;

    const TICK: u64 = 16;

    fn setup(tile: Tile) -> (Scheduler<AnimationTable>, AnimationTable, Ship) {
        let ship = Ship::new(PlayerId::from("p1"), tile, 100);
        let mut table = AnimationTable::new();
        table.insert(Animation::new(ship.clone(), Color::RED, VecDeque::new()));
        let scheduler = Scheduler::new();
        scheduler.register(AnimationDriver::new(ship.id, TICK));
        (scheduler, table, ship)
    }

    fn run(scheduler: &mut Scheduler<AnimationTable>, table: &mut AnimationTable, ticks: usize) {
        for _ in 0..ticks {
            scheduler.tick(table, TICK);
        }
    }

    #[test]
    fn move_glides_then_snaps() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(2, 2));
        let dest = Tile::new(3, 2);
        table.get_mut(ship.id).unwrap().push(
            Event::new(EventKind::Move, Phase::Begin, ship.clone())
                .with_duration(160)
                .with_destination(dest),
        );

        // Tick 1 starts the entry and takes the first of ten steps.
        run(&mut scheduler, &mut table, 1);
        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Moving);
        let start = tile_to_pixel(ship.tile());
        assert!((anim.position().x - (start.x + TILE_WIDTH / 10.0)).abs() < 1e-3);

        run(&mut scheduler, &mut table, 9);
        let anim = table.get(ship.id).unwrap();
        assert!(anim.position().distance(tile_to_pixel(dest)) < 1e-3);
        assert!(anim.is_gliding());

        let mut arrived = ship.clone();
        arrived.set_tile(dest);
        table
            .get_mut(ship.id)
            .unwrap()
            .push(Event::new(EventKind::Move, Phase::End, arrived).with_destination(dest));
        run(&mut scheduler, &mut table, 2);

        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Stopped);
        assert_eq!(anim.ship().tile(), dest);
        assert_eq!(anim.position(), tile_to_pixel(dest));
        assert!(!anim.is_gliding());
    }

    #[test]
    fn events_wait_for_the_running_glide() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(2, 2));
        let dest = Tile::new(3, 2);
        let anim = table.get_mut(ship.id).unwrap();
        anim.push(
            Event::new(EventKind::Move, Phase::Begin, ship.clone())
                .with_duration(160)
                .with_destination(dest),
        );
        let mut arrived = ship.clone();
        arrived.set_tile(dest);
        anim.push(Event::new(EventKind::Move, Phase::End, arrived));

        run(&mut scheduler, &mut table, 5);
        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Moving);
        assert_eq!(anim.pending_events(), 1);

        // Five more steps, then the End on the tick after the last one.
        run(&mut scheduler, &mut table, 7);
        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Stopped);
        assert_eq!(anim.pending_events(), 0);
        assert_eq!(anim.position(), tile_to_pixel(dest));
    }

    #[test]
    fn short_duration_takes_one_step() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(0, 0));
        let target = Tile::new(1, 0);
        table.get_mut(ship.id).unwrap().push(
            Event::new(EventKind::Attack, Phase::Begin, ship.clone())
                .with_duration(5)
                .with_destination(target),
        );
        run(&mut scheduler, &mut table, 1);
        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Attacking);
        assert!(anim.position().distance(tile_to_pixel(target)) < 1e-3);
    }

    #[test]
    fn attack_end_returns_to_own_tile() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(4, 3));
        let anim = table.get_mut(ship.id).unwrap();
        anim.push(
            Event::new(EventKind::Attack, Phase::Begin, ship.clone())
                .with_duration(200)
                .with_destination(Tile::new(5, 3)),
        );
        anim.push(Event::new(EventKind::Attack, Phase::End, ship.clone()));
        run(&mut scheduler, &mut table, 20);

        let anim = table.get(ship.id).unwrap();
        assert_eq!(anim.state(), AnimationState::Stopped);
        assert_eq!(anim.position(), tile_to_pixel(ship.tile()));
    }

    #[test]
    fn end_snapshot_updates_health() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(1, 1));
        let mut hurt = ship.clone();
        hurt.health = 40;
        table
            .get_mut(ship.id)
            .unwrap()
            .push(Event::new(EventKind::Attacked, Phase::End, hurt));
        run(&mut scheduler, &mut table, 1);
        assert_eq!(table.get(ship.id).unwrap().ship().health, 40);
    }

    #[test]
    fn despawn_end_tears_down() {
        let (mut scheduler, mut table, ship) = setup(Tile::new(1, 1));
        table
            .get_mut(ship.id)
            .unwrap()
            .push(Event::new(EventKind::Despawn, Phase::End, ship.clone()));
        run(&mut scheduler, &mut table, 1);
        assert!(!table.contains(ship.id));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn driver_without_animation_finishes() {
        let mut table = AnimationTable::new();
        let mut scheduler = Scheduler::new();
        scheduler.register(AnimationDriver::new(ShipId::new(), TICK));
        let report = scheduler.tick(&mut table, TICK);
        assert_eq!(report.finished, 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn table_rejects_duplicates() {
        let ship = Ship::new(PlayerId::from("p1"), Tile::new(0, 0), 1);
        let mut table = AnimationTable::new();
        assert!(table.insert(Animation::new(ship.clone(), Color::RED, VecDeque::new())));
        assert!(!table.insert(Animation::new(ship, Color::SALMON, VecDeque::new())));
        assert_eq!(table.len(), 1);
    }
}
