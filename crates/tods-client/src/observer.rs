//! The client-side mirror of the authoritative world.
//!
//! [`ObserverWorld::apply`] folds one received event into the read-mirror
//! and routes it to the ship's animation. Animation creation and teardown
//! are queued and carried out by [`ObserverWorld::render_tick`], right
//! before the animation scheduler runs, so a new animation always starts
//! on a render tick.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tods_core::{Scheduler, TickReport};
use tods_grid::Pixel;
use tods_types::{Event, EventKind, Phase, Ship, ShipId, Tile};
use tracing::debug;

use crate::animation::{Animation, AnimationDriver, AnimationState, AnimationTable};
use crate::color::{Color, ColorTable};

/// Default render cadence in milliseconds.
pub const RENDER_TICK_MS: u64 = 16;

/// A queued change to the animation table.
#[derive(Debug)]
enum PendingChange {
    /// Start animating a ship. `backlog` collects events addressed to it
    /// before the animation exists.
    Create { ship: Ship, backlog: VecDeque<Event> },
    /// Hand a Despawn End to the ship's animation so it can finish.
    Teardown(Event),
}

/// Everything a renderer needs to draw one ship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sprite {
    /// The ship being drawn.
    pub ship: ShipId,
    /// Interpolated position.
    pub position: Pixel,
    /// Animation state (drawn thicker while attacking).
    pub state: AnimationState,
    /// Health label.
    pub health: i32,
    /// Owner colour.
    pub color: Color,
}

/// Read-mirror plus animation replay for one player.
#[derive(Debug)]
pub struct ObserverWorld {
    ships: BTreeMap<ShipId, Ship>,
    animations: AnimationTable,
    pending: VecDeque<PendingChange>,
    scheduler: Scheduler<AnimationTable>,
    colors: ColorTable,
    tick_ms: u64,
}

impl Default for ObserverWorld {
    fn default() -> Self {
        Self::new(RENDER_TICK_MS)
    }
}

impl ObserverWorld {
    /// Create an empty observer rendering every `tick_ms` milliseconds.
    pub fn new(tick_ms: u64) -> Self {
        Self {
            ships: BTreeMap::new(),
            animations: AnimationTable::new(),
            pending: VecDeque::new(),
            scheduler: Scheduler::new(),
            colors: ColorTable::new(),
            tick_ms,
        }
    }

    /// Render cadence in milliseconds.
    pub const fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    /// Fold one received event into the mirror.
    pub fn apply(&mut self, event: Event) {
        match event.phase {
            Phase::Begin => self.apply_begin(event),
            Phase::Progress => {
                if matches!(event.kind, EventKind::Move | EventKind::Attack) {
                    self.forward(event);
                }
            }
            Phase::End => self.apply_end(event),
            Phase::Command => debug!(%event, "Ignoring command in the event feed"),
        }
    }

    fn apply_begin(&mut self, event: Event) {
        self.set_busy(event.ship_id(), true);
        match event.kind {
            EventKind::Spawn => self.queue_create(event.source),
            EventKind::Despawn | EventKind::Move | EventKind::Attack => self.forward(event),
            EventKind::Attacked | EventKind::Merged => {}
        }
    }

    fn apply_end(&mut self, event: Event) {
        let id = event.ship_id();
        match event.kind {
            EventKind::Spawn => {
                self.ships.insert(id, event.source.clone());
                self.queue_create(event.source);
            }
            EventKind::Despawn => {
                self.ships.remove(&id);
                self.pending.push_back(PendingChange::Teardown(event));
            }
            EventKind::Move => {
                if let Some(ship) = self.ships.get_mut(&id) {
                    ship.set_tile(event.source.tile());
                }
                self.forward(event);
            }
            EventKind::Attacked | EventKind::Merged => {
                if let Some(ship) = self.ships.get_mut(&id) {
                    ship.health = event.source.health;
                }
                self.forward(event);
            }
            EventKind::Attack => self.forward(event),
        }
        self.set_busy(id, false);
    }

    fn set_busy(&mut self, id: ShipId, busy: bool) {
        if let Some(ship) = self.ships.get_mut(&id) {
            ship.busy = busy;
        }
    }

    fn queue_create(&mut self, ship: Ship) {
        if self.animations.contains(ship.id) || self.pending_create(ship.id).is_some() {
            return;
        }
        self.pending.push_back(PendingChange::Create {
            ship,
            backlog: VecDeque::new(),
        });
    }

    fn pending_create(&mut self, id: ShipId) -> Option<&mut VecDeque<Event>> {
        self.pending.iter_mut().find_map(|change| match change {
            PendingChange::Create { ship, backlog } if ship.id == id => Some(backlog),
            _ => None,
        })
    }

    /// Hand an event to the ship's animation, or to its pending creation.
    /// Events for ships without either are dropped.
    fn forward(&mut self, event: Event) {
        let id = event.ship_id();
        if let Some(animation) = self.animations.get_mut(id) {
            animation.push(event);
        } else if let Some(backlog) = self.pending_create(id) {
            backlog.push_back(event);
        }
    }

    /// Carry out queued animation changes, then advance every animation by
    /// one render tick.
    pub fn render_tick(&mut self) -> TickReport {
        while let Some(change) = self.pending.pop_front() {
            match change {
                PendingChange::Create { ship, backlog } => {
                    let id = ship.id;
                    let color = self.colors.color_for(&ship.owner);
                    if self.animations.insert(Animation::new(ship, color, backlog)) {
                        self.scheduler.register(AnimationDriver::new(id, self.tick_ms));
                        debug!(ship = %id, "Animation created");
                    }
                }
                PendingChange::Teardown(event) => {
                    let id = event.ship_id();
                    if let Some(animation) = self.animations.get_mut(id) {
                        animation.push(event);
                        debug!(ship = %id, "Animation teardown queued");
                    }
                }
            }
        }
        self.scheduler.tick(&mut self.animations, self.tick_ms)
    }

    /// A mirrored ship.
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Every mirrored ship.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Number of mirrored ships.
    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// The first mirrored ship on `tile`.
    pub fn ship_at(&self, tile: Tile) -> Option<&Ship> {
        self.ships_at(tile).next()
    }

    /// Every mirrored ship on `tile`.
    pub fn ships_at(&self, tile: Tile) -> impl Iterator<Item = &Ship> {
        self.ships.values().filter(move |ship| ship.tile() == tile)
    }

    /// Whether the mirror believes `id` is in the middle of an action.
    pub fn is_busy(&self, id: ShipId) -> bool {
        self.ships.get(&id).is_some_and(|ship| ship.busy)
    }

    /// The animation of `id`.
    pub fn animation(&self, id: ShipId) -> Option<&Animation> {
        self.animations.get(id)
    }

    /// Number of live animations.
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Drawing data for every animated ship.
    pub fn sprites(&self) -> Vec<Sprite> {
        self.animations
            .iter()
            .map(|animation| Sprite {
                ship: animation.ship().id,
                position: animation.position(),
                state: animation.state(),
                health: self
                    .ships
                    .get(&animation.ship().id)
                    .map_or(animation.ship().health, |ship| ship.health),
                color: animation.color(),
            })
            .collect()
    }

    /// The colour assigned to each player seen so far.
    pub const fn colors(&self) -> &ColorTable {
        &self.colors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tods_grid::tile_to_pixel;
    use tods_types::PlayerId;

    use super::*;

    fn ship(owner: &str, tile: Tile) -> Ship {
        Ship::new(PlayerId::from(owner), tile, 1_000)
    }

    fn spawn(world: &mut ObserverWorld, ship: &Ship) {
        world.apply(Event::new(EventKind::Spawn, Phase::Begin, ship.clone()));
        world.apply(Event::new(EventKind::Spawn, Phase::End, ship.clone()));
    }

    #[test]
    fn spawn_begin_alone_defers_mirror_insert() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(1, 1));
        world.apply(Event::new(EventKind::Spawn, Phase::Begin, s.clone()));

        assert_eq!(world.ship_count(), 0);
        assert!(world.animation(s.id).is_none());

        world.render_tick();
        assert!(world.animation(s.id).is_some());
        assert_eq!(world.ship_count(), 0);
    }

    #[test]
    fn spawn_end_mirrors_and_animates_once() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(1, 1));
        spawn(&mut world, &s);

        assert_eq!(world.ship(s.id).map(Ship::tile), Some(Tile::new(1, 1)));
        assert!(!world.is_busy(s.id));

        world.render_tick();
        assert_eq!(world.animation_count(), 1);
        assert_eq!(
            world.animation(s.id).unwrap().position(),
            tile_to_pixel(Tile::new(1, 1))
        );
    }

    #[test]
    fn spawn_end_without_begin_still_animates() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(0, 3));
        world.apply(Event::new(EventKind::Spawn, Phase::End, s.clone()));
        world.render_tick();
        assert!(world.ship(s.id).is_some());
        assert!(world.animation(s.id).is_some());
    }

    #[test]
    fn begin_marks_busy_and_end_clears_it() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(2, 2));
        spawn(&mut world, &s);
        world.render_tick();

        world.apply(
            Event::new(EventKind::Move, Phase::Begin, s.clone())
                .with_duration(500)
                .with_destination(Tile::new(3, 2)),
        );
        assert!(world.is_busy(s.id));

        let mut moved = s.clone();
        moved.set_tile(Tile::new(3, 2));
        world.apply(Event::new(EventKind::Move, Phase::End, moved));
        assert!(!world.is_busy(s.id));
        assert_eq!(world.ship(s.id).unwrap().tile(), Tile::new(3, 2));
    }

    #[test]
    fn end_applies_only_the_kind_specific_fields() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(2, 2));
        spawn(&mut world, &s);

        let mut hurt = s.clone();
        hurt.health = 300;
        hurt.set_tile(Tile::new(9, 9));
        world.apply(Event::new(EventKind::Attacked, Phase::End, hurt));

        let mirrored = world.ship(s.id).unwrap();
        assert_eq!(mirrored.health, 300);
        assert_eq!(mirrored.tile(), Tile::new(2, 2));

        let mut merged = s.clone();
        merged.health = 2_000;
        world.apply(Event::new(EventKind::Merged, Phase::End, merged));
        assert_eq!(world.ship(s.id).unwrap().health, 2_000);
    }

    #[test]
    fn despawn_end_removes_mirror_then_animation() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(2, 2));
        spawn(&mut world, &s);
        world.render_tick();

        world.apply(Event::new(EventKind::Despawn, Phase::Begin, s.clone()));
        world.apply(Event::new(EventKind::Despawn, Phase::End, s.clone()));
        assert!(world.ship(s.id).is_none());
        assert!(world.animation(s.id).is_some());

        for _ in 0..3 {
            world.render_tick();
        }
        assert!(world.animation(s.id).is_none());
        assert!(world.sprites().is_empty());
    }

    #[test]
    fn early_events_reach_the_new_animation() {
        let mut world = ObserverWorld::default();
        let s = ship("p1", Tile::new(2, 2));
        let dest = Tile::new(3, 2);
        spawn(&mut world, &s);
        world.apply(
            Event::new(EventKind::Move, Phase::Begin, s.clone())
                .with_duration(160)
                .with_destination(dest),
        );

        world.render_tick();
        let animation = world.animation(s.id).unwrap();
        assert_eq!(animation.state(), AnimationState::Moving);
        assert_ne!(animation.position(), tile_to_pixel(s.tile()));
    }

    #[test]
    fn events_for_unknown_ships_are_ignored() {
        let mut world = ObserverWorld::default();
        let stranger = ship("p9", Tile::new(0, 0));
        world.apply(Event::new(EventKind::Move, Phase::Begin, stranger.clone()));
        world.apply(Event::new(EventKind::Attacked, Phase::End, stranger));
        let report = world.render_tick();
        assert_eq!(report.active, 0);
        assert_eq!(world.ship_count(), 0);
    }

    #[test]
    fn tile_queries_and_sprites() {
        let mut world = ObserverWorld::default();
        let a = ship("p1", Tile::new(1, 1));
        let b = ship("p1", Tile::new(1, 1));
        let c = ship("p2", Tile::new(4, 0));
        for s in [&a, &b, &c] {
            spawn(&mut world, s);
        }
        world.render_tick();

        assert_eq!(world.ships_at(Tile::new(1, 1)).count(), 2);
        assert_eq!(world.ship_at(Tile::new(4, 0)).map(|s| s.id), Some(c.id));
        assert!(world.ship_at(Tile::new(7, 7)).is_none());

        let sprites = world.sprites();
        assert_eq!(sprites.len(), 3);
        let c_sprite = sprites.iter().find(|s| s.ship == c.id).unwrap();
        assert_eq!(c_sprite.color, Color::POWDER_BLUE);
        assert_eq!(c_sprite.health, 1_000);
        assert_eq!(world.colors().get(&PlayerId::from("p1")), Some(Color::RED));
    }
}
