//! The server simulation and its transport-facing handle.

use std::sync::Arc;

use tods_core::{Registrar, Scheduler, Tick, TickReport, TodsConfig};
use tods_types::{Event, Phase, PlayerId, Ship, ShipId};
use tracing::{debug, info};

use crate::drain::JoinGame;
use crate::session::{SessionRegistry, SessionStatus};
use crate::world::ServerWorld;

/// The authoritative world together with the scheduler that drives it.
///
/// Owned by whichever task ticks it; everything else talks to it through a
/// [`ServerHandle`].
#[derive(Debug)]
pub struct ServerSim {
    scheduler: Scheduler<ServerWorld>,
    world: ServerWorld,
}

impl ServerSim {
    /// Create an empty world with no players.
    pub fn new(config: &TodsConfig) -> Self {
        let scheduler = Scheduler::new();
        let world = ServerWorld::new(
            config,
            Arc::new(SessionRegistry::new()),
            scheduler.registrar(),
        );
        Self { scheduler, world }
    }

    /// A cloneable handle for transport handlers.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            sessions: Arc::clone(self.world.sessions()),
            registrar: self.scheduler.registrar(),
        }
    }

    /// Advance the world by `elapsed_ms` milliseconds.
    pub fn tick(&mut self, elapsed_ms: u64) -> TickReport {
        self.scheduler.tick(&mut self.world, elapsed_ms)
    }

    /// Read access to the world.
    pub const fn world(&self) -> &ServerWorld {
        &self.world
    }

    /// A ship by id, whatever its state.
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.world.ship(id)
    }

    /// Every ship in the table.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.world.ships()
    }

    /// Number of ships in the table.
    pub fn ship_count(&self) -> usize {
        self.world.ship_count()
    }

    /// Number of logic entries currently scheduled.
    pub fn active_entries(&self) -> usize {
        self.scheduler.len()
    }
}

impl Tick for ServerSim {
    fn tick(&mut self, elapsed_ms: u64) {
        let report = Self::tick(self, elapsed_ms);
        if report.failed > 0 {
            debug!(failed = report.failed, active = report.active, "Entries dropped this tick");
        }
    }
}

/// The four transport operations, callable from any thread.
///
/// None of them touches the ship table directly: registration schedules a
/// join entry, posts and polls only touch the player's queues.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sessions: Arc<SessionRegistry>,
    registrar: Registrar<ServerWorld>,
}

impl ServerHandle {
    /// Create or reactivate a player's session and schedule its join.
    pub fn register(&self, player: &PlayerId) -> bool {
        let session = self.sessions.activate(player);
        self.registrar.register(JoinGame::new(session));
        info!(%player, "Player registered");
        true
    }

    /// Mark a player offline. Its queues are kept.
    pub fn unregister(&self, player: &PlayerId) -> bool {
        if self.sessions.deactivate(player) {
            info!(%player, "Player unregistered");
        } else {
            debug!(%player, "Unregister for unknown player");
        }
        true
    }

    /// Queue a command on the inbound queue of its source ship's owner.
    /// Silently ignored when that player is not online or the event is not
    /// a command.
    pub fn post(&self, command: Event) -> bool {
        if command.phase != Phase::Command {
            debug!(%command, "Ignoring post that is not a command");
            return true;
        }
        match self.sessions.get(command.owner()) {
            Some(session) if session.is_online() => session.inbound.push(command),
            _ => debug!(player = %command.owner(), "Post for offline or unknown player"),
        }
        true
    }

    /// Take every event waiting for `player`.
    pub fn poll(&self, player: &PlayerId) -> Vec<Event> {
        self.sessions
            .get(player)
            .map(|session| session.outbound.drain_all())
            .unwrap_or_default()
    }

    /// Player counts.
    pub fn status(&self) -> SessionStatus {
        self.sessions.status()
    }
}
