//! The authoritative ship table and event fan-out.
//!
//! [`ServerWorld`] is the context every server-side logic entry runs
//! against. It is only ever touched from the scheduler's thread; sessions
//! are the one part shared with transport handlers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tods_core::Registrar;
use tods_core::config::{ActionConfig, TodsConfig, WorldConfig};
use tods_types::{Event, EventId, PlayerId, Ship, ShipId, ShipState, Tile};
use tracing::debug;

use crate::session::{PlayerSession, SessionRegistry};

/// Canonical entity table plus everything actions need to run.
pub struct ServerWorld {
    ships: BTreeMap<ShipId, Ship>,
    sessions: Arc<SessionRegistry>,
    registrar: Registrar<Self>,
    world: WorldConfig,
    actions: ActionConfig,
    rng: StdRng,
    next_event_id: u64,
}

impl core::fmt::Debug for ServerWorld {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServerWorld")
            .field("ships", &self.ships.len())
            .field("next_event_id", &self.next_event_id)
            .finish_non_exhaustive()
    }
}

impl ServerWorld {
    /// Create an empty world.
    ///
    /// `registrar` must belong to the scheduler that will drive this world;
    /// entries started by the world (player drains) are queued through it.
    pub fn new(
        config: &TodsConfig,
        sessions: Arc<SessionRegistry>,
        registrar: Registrar<Self>,
    ) -> Self {
        let rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            ships: BTreeMap::new(),
            sessions,
            registrar,
            world: config.world.clone(),
            actions: config.actions.clone(),
            rng,
            next_event_id: 1,
        }
    }

    /// World settings.
    pub const fn world_config(&self) -> &WorldConfig {
        &self.world
    }

    /// Action timings and damage rules.
    pub const fn action_config(&self) -> &ActionConfig {
        &self.actions
    }

    /// The session registry shared with the transport.
    pub const fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Handle for starting new logic entries on this world's scheduler.
    pub const fn registrar(&self) -> &Registrar<Self> {
        &self.registrar
    }

    /// A ship by id, whatever its state.
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// A ship by id, if it still takes part in the simulation.
    pub fn live_ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id).filter(|ship| ship.is_live())
    }

    /// Mutable access to a live ship.
    pub fn live_ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(&id).filter(|ship| ship.is_live())
    }

    /// Every ship in the table, ordered by id.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Number of ships in the table (including ones being despawned).
    pub fn ship_count(&self) -> usize {
        self.ships.len()
    }

    /// Live ships standing on `tile`.
    pub fn live_ships_at(&self, tile: Tile) -> impl Iterator<Item = &Ship> {
        self.ships
            .values()
            .filter(move |ship| ship.is_live() && ship.tile() == tile)
    }

    /// Whether a live ship not owned by `owner` stands on `tile`.
    pub fn foe_at(&self, tile: Tile, owner: &PlayerId) -> bool {
        self.live_ships_at(tile).any(|ship| &ship.owner != owner)
    }

    /// Insert a ship. Returns `false` (and leaves the table unchanged) when
    /// the id is already taken.
    pub fn insert_ship(&mut self, ship: Ship) -> bool {
        if self.ships.contains_key(&ship.id) {
            return false;
        }
        self.ships.insert(ship.id, ship);
        true
    }

    /// Remove a ship from the table, returning its final snapshot.
    pub fn remove_ship(&mut self, id: ShipId) -> Option<Ship> {
        self.ships.remove(&id).map(|mut ship| {
            ship.state = ShipState::Removed;
            ship
        })
    }

    /// Absorb every other live ship of the same owner standing on the
    /// survivor's tile. The absorbed ships leave the table and their health
    /// is added to the survivor.
    ///
    /// Returns the removed snapshots; empty when nothing merged or the
    /// survivor is not live.
    pub fn merge_into(&mut self, survivor: ShipId) -> Vec<Ship> {
        let Some((owner, tile)) = self
            .live_ship(survivor)
            .map(|ship| (ship.owner.clone(), ship.tile()))
        else {
            return Vec::new();
        };

        let absorbed_ids: Vec<ShipId> = self
            .live_ships_at(tile)
            .filter(|ship| ship.id != survivor && ship.owner == owner)
            .map(|ship| ship.id)
            .collect();

        let absorbed: Vec<Ship> = absorbed_ids
            .into_iter()
            .filter_map(|id| self.remove_ship(id))
            .collect();

        let gained = absorbed
            .iter()
            .fold(0_i32, |sum, ship| sum.saturating_add(ship.health));
        if let Some(ship) = self.live_ship_mut(survivor) {
            ship.health = ship.health.saturating_add(gained);
        }
        absorbed
    }

    /// Up to `count` distinct random tiles inside the map with no ship on
    /// them. Fewer are returned when the map is that full.
    pub fn empty_locations(&mut self, count: usize) -> Vec<Tile> {
        let occupied: BTreeSet<Tile> = self.ships.values().map(Ship::tile).collect();
        let mut free: Vec<Tile> = (0..self.world.map_height)
            .flat_map(|y| (0..self.world.map_width).map(move |x| Tile::new(x, y)))
            .filter(|tile| !occupied.contains(tile))
            .collect();
        free.shuffle(&mut self.rng);
        free.truncate(count);
        free
    }

    fn assign_id(&mut self, event: Event) -> Event {
        let id = EventId(self.next_event_id);
        self.next_event_id = self.next_event_id.saturating_add(1);
        event.with_id(id)
    }

    /// Number `event` and push a copy to every online session.
    pub fn broadcast(&mut self, event: Event) -> EventId {
        let event = self.assign_id(event);
        debug!(%event, "Broadcast");
        for session in self.sessions.online() {
            session.outbound.push(event.clone());
        }
        event.id
    }

    /// Number `event` and push it to a single session.
    pub fn send_to(&mut self, session: &PlayerSession, event: Event) -> EventId {
        let event = self.assign_id(event);
        let id = event.id;
        session.outbound.push(event);
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tods_core::Scheduler;
    use tods_types::{EventKind, Phase};

    use super::*;

    fn world_with(config: &TodsConfig) -> (ServerWorld, Arc<SessionRegistry>) {
        let sessions = Arc::new(SessionRegistry::new());
        let scheduler: Scheduler<ServerWorld> = Scheduler::new();
        let world = ServerWorld::new(config, Arc::clone(&sessions), scheduler.registrar());
        (world, sessions)
    }

    fn seeded() -> TodsConfig {
        let mut config = TodsConfig::default();
        config.world.seed = Some(7);
        config
    }

    fn ship(owner: &str, x: i32, y: i32, health: i32) -> Ship {
        Ship::new(PlayerId::from(owner), Tile::new(x, y), health)
    }

    #[test]
    fn broadcast_numbers_events_and_reaches_online_sessions_only() {
        let (mut world, sessions) = world_with(&seeded());
        let online = sessions.activate(&PlayerId::from("on"));
        let offline = sessions.activate(&PlayerId::from("off"));
        sessions.deactivate(&PlayerId::from("off"));

        let first = world.broadcast(Event::new(EventKind::Spawn, Phase::Begin, ship("on", 0, 0, 5)));
        let second = world.broadcast(Event::new(EventKind::Spawn, Phase::End, ship("on", 0, 0, 5)));
        assert!(second > first);
        assert_ne!(first, EventId::UNASSIGNED);

        let received = online.outbound.drain_all();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].id, first);
        assert!(offline.outbound.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (mut world, _) = world_with(&seeded());
        let original = ship("a", 1, 1, 10);
        let mut copy = original.clone();
        copy.health = 99;

        assert!(world.insert_ship(original));
        assert!(!world.insert_ship(copy.clone()));
        assert_eq!(world.ship(copy.id).unwrap().health, 10);
    }

    #[test]
    fn removed_ships_are_hidden_from_live_lookups() {
        let (mut world, _) = world_with(&seeded());
        let mut dying = ship("a", 2, 2, 10);
        dying.state = ShipState::Removed;
        let id = dying.id;
        world.insert_ship(dying);

        assert!(world.ship(id).is_some());
        assert!(world.live_ship(id).is_none());
        assert!(!world.foe_at(Tile::new(2, 2), &PlayerId::from("b")));
    }

    #[test]
    fn merge_sums_health_of_same_owner_ships_only() {
        let (mut world, _) = world_with(&seeded());
        let survivor = ship("a", 3, 3, 100);
        let friend = ship("a", 3, 3, 40);
        let foe = ship("b", 3, 3, 70);
        let elsewhere = ship("a", 4, 3, 10);
        let survivor_id = survivor.id;
        let friend_id = friend.id;
        for s in [survivor, friend, foe, elsewhere] {
            world.insert_ship(s);
        }

        let absorbed = world.merge_into(survivor_id);
        assert_eq!(absorbed.len(), 1);
        assert_eq!(absorbed[0].id, friend_id);
        assert_eq!(absorbed[0].state, ShipState::Removed);
        assert_eq!(world.ship(survivor_id).unwrap().health, 140);
        assert!(world.ship(friend_id).is_none());
        assert_eq!(world.ship_count(), 3);
    }

    #[test]
    fn empty_locations_are_distinct_free_and_in_bounds() {
        let (mut world, _) = world_with(&seeded());
        world.insert_ship(ship("a", 0, 0, 10));

        let tiles = world.empty_locations(5);
        let unique: BTreeSet<Tile> = tiles.iter().copied().collect();
        assert_eq!(tiles.len(), 5);
        assert_eq!(unique.len(), 5);
        for tile in tiles {
            assert_ne!(tile, Tile::new(0, 0));
            assert!((0..20).contains(&tile.x));
            assert!((0..12).contains(&tile.y));
        }
    }

    #[test]
    fn empty_locations_are_capped_by_free_space() {
        let mut config = seeded();
        config.world.map_width = 2;
        config.world.map_height = 2;
        let (mut world, _) = world_with(&config);
        world.insert_ship(ship("a", 1, 1, 10));

        assert_eq!(world.empty_locations(5).len(), 3);
    }

    #[test]
    fn send_to_targets_one_session() {
        let (mut world, sessions) = world_with(&seeded());
        let a = sessions.activate(&PlayerId::from("a"));
        let b = sessions.activate(&PlayerId::from("b"));

        world.send_to(&a, Event::new(EventKind::Spawn, Phase::End, ship("a", 0, 0, 5)));
        assert_eq!(a.outbound.len(), 1);
        assert!(b.outbound.is_empty());
    }
}
