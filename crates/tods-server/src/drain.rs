//! Per-player logic entries: joining the game and draining commands.

use std::sync::Arc;

use tods_core::{Logic, LogicError, Step};
use tods_types::{Event, EventKind, Phase, Ship};
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::session::PlayerSession;
use crate::world::ServerWorld;

/// Runs once when a player registers: replays the current ship table to
/// the player, queues spawn commands for its starting fleet, and makes
/// sure a [`CommandDrain`] is running for it.
#[derive(Debug)]
pub struct JoinGame {
    session: Arc<PlayerSession>,
}

impl JoinGame {
    /// Join `session` to the world.
    pub const fn new(session: Arc<PlayerSession>) -> Self {
        Self { session }
    }
}

impl Logic<ServerWorld> for JoinGame {
    fn resume(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        let snapshot: Vec<Ship> = world.ships().cloned().collect();
        for ship in &snapshot {
            world.send_to(
                &self.session,
                Event::new(EventKind::Spawn, Phase::Begin, ship.clone()),
            );
            world.send_to(
                &self.session,
                Event::new(EventKind::Spawn, Phase::End, ship.clone()),
            );
        }

        let count = world.world_config().ships_per_player;
        let health = world.world_config().initial_health;
        let tiles = world.empty_locations(count);
        for tile in &tiles {
            let ship = Ship::new(self.session.id().clone(), *tile, health);
            self.session.inbound.push(Event::spawn_command(ship));
        }

        if self.session.claim_drain() {
            world
                .registrar()
                .register(CommandDrain::new(Arc::clone(&self.session)));
        }

        info!(
            player = %self.session.id(),
            replayed = snapshot.len(),
            spawned = tiles.len(),
            "Player joined"
        );
        Ok(Step::Done)
    }

    fn label(&self) -> &'static str {
        "join"
    }
}

/// Drains one player's inbound commands, running each command's action to
/// completion before taking the next.
///
/// The entry ends once the player is offline and its queue is empty; the
/// next registration starts a fresh one. Dropping the entry, however it
/// ends, gives up the session's drain claim.
#[derive(Debug)]
pub struct CommandDrain {
    session: Arc<PlayerSession>,
    current: Option<Action>,
}

impl CommandDrain {
    /// Drain `session`'s inbound queue. The caller must hold the session's
    /// drain claim.
    pub const fn new(session: Arc<PlayerSession>) -> Self {
        Self {
            session,
            current: None,
        }
    }

    fn run_current(&mut self, world: &mut ServerWorld) -> Option<Step> {
        let action = self.current.as_mut()?;
        let idle = world.world_config().command_poll_interval_ms;
        match action.step(world) {
            Ok(Step::Done) => {
                self.current = None;
                Some(Step::Sleep(idle))
            }
            Ok(step) => Some(step),
            Err(err) => {
                warn!(player = %self.session.id(), %err, "Action failed, dropping it");
                self.current = None;
                Some(Step::Sleep(idle))
            }
        }
    }
}

impl Logic<ServerWorld> for CommandDrain {
    fn resume(&mut self, world: &mut ServerWorld) -> Result<Step, LogicError> {
        if let Some(step) = self.run_current(world) {
            return Ok(step);
        }

        while let Some(command) = self.session.inbound.pop() {
            debug!(player = %self.session.id(), %command, "Processing command");
            match Action::from_command(&command) {
                Some(action) => {
                    self.current = Some(action);
                    if let Some(step) = self.run_current(world) {
                        return Ok(step);
                    }
                }
                None => debug!(player = %self.session.id(), kind = ?command.kind, "Command ignored"),
            }
        }

        if self.session.is_online() {
            return Ok(Step::Sleep(world.world_config().command_poll_interval_ms));
        }
        debug!(player = %self.session.id(), "Player offline, command drain finished");
        Ok(Step::Done)
    }

    fn label(&self) -> &'static str {
        "command-drain"
    }
}

impl Drop for CommandDrain {
    fn drop(&mut self) {
        self.session.release_drain();
    }
}

#[cfg(test)]
mod tests {
    use tods_types::PlayerId;

    use super::*;
    use crate::session::SessionRegistry;

    #[test]
    fn dropping_a_drain_releases_the_claim() {
        let registry = SessionRegistry::new();
        let session = registry.activate(&PlayerId::from("a"));
        assert!(session.claim_drain());

        let drain = CommandDrain::new(Arc::clone(&session));
        assert!(session.is_draining());
        drop(drain);

        assert!(!session.is_draining());
        assert!(session.claim_drain());
    }
}
