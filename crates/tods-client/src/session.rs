//! A player's connection loop: poll, apply, render.

use std::time::Duration;

use tods_core::{TickReport, TickerControl};
use tods_grid::are_adjacent;
use tods_types::{Event, PlayerId, Ship, ShipId, Tile};
use tracing::{debug, info, warn};

use crate::connector::Connector;
use crate::error::ClientError;
use crate::observer::ObserverWorld;

/// Outcome of one [`ClientSession::frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Events received by this frame's poll.
    pub events: usize,
    /// Mirrored ships after applying them.
    pub ships: usize,
    /// What the animation scheduler did.
    pub animations: TickReport,
}

/// One player's view of the game.
#[derive(Debug)]
pub struct ClientSession {
    player: PlayerId,
    connector: Connector,
    world: ObserverWorld,
}

impl ClientSession {
    /// Create a session that renders every `render_tick_ms` milliseconds.
    pub fn new(player: PlayerId, connector: Connector, render_tick_ms: u64) -> Self {
        Self {
            player,
            connector,
            world: ObserverWorld::new(render_tick_ms),
        }
    }

    /// The player this session plays as.
    pub const fn player(&self) -> &PlayerId {
        &self.player
    }

    /// The observer mirror.
    pub const fn world(&self) -> &ObserverWorld {
        &self.world
    }

    /// Register with the server.
    pub async fn register(&self) -> Result<(), ClientError> {
        self.connector.register(&self.player).await?;
        info!(player = %self.player, connector = self.connector.name(), "Registered");
        Ok(())
    }

    /// Unregister from the server.
    pub async fn leave(&self) -> Result<(), ClientError> {
        self.connector.unregister(&self.player).await?;
        info!(player = %self.player, "Left the game");
        Ok(())
    }

    /// Poll once, fold every event into the mirror, and advance the
    /// animations by one render tick.
    pub async fn frame(&mut self) -> Result<FrameReport, ClientError> {
        let events = self.connector.poll(&self.player).await?;
        let received = events.len();
        for event in events {
            debug!(player = %self.player, %event, "Event received");
            self.world.apply(event);
        }
        let animations = self.world.render_tick();
        Ok(FrameReport {
            events: received,
            ships: self.world.ship_count(),
            animations,
        })
    }

    /// Send a command as-is.
    pub async fn issue(&self, command: &Event) -> Result<(), ClientError> {
        self.connector.post(command).await?;
        Ok(())
    }

    /// Ask for a new ship of ours on `tile`.
    pub async fn spawn_at(&self, tile: Tile, health: i32) -> Result<ShipId, ClientError> {
        let ship = Ship::new(self.player.clone(), tile, health);
        let id = ship.id;
        self.issue(&Event::spawn_command(ship)).await?;
        Ok(id)
    }

    /// Ask to move one of our ships to the adjacent tile `dest`.
    ///
    /// Returns false without contacting the server when the mirror already
    /// knows the move cannot start: unknown or foreign ship, busy ship, or
    /// a destination that is not adjacent.
    pub async fn move_ship(&self, id: ShipId, dest: Tile) -> Result<bool, ClientError> {
        let Some(ship) = self.own_idle_ship(id) else {
            return Ok(false);
        };
        if !are_adjacent(ship.tile(), dest) {
            return Ok(false);
        }
        self.issue(&Event::move_command(ship.clone(), dest)).await?;
        Ok(true)
    }

    /// Ask one of our ships to attack an adjacent foreign ship.
    pub async fn attack(&self, id: ShipId, target: ShipId) -> Result<bool, ClientError> {
        let Some(ship) = self.own_idle_ship(id) else {
            return Ok(false);
        };
        let Some(foe) = self.world.ship(target) else {
            return Ok(false);
        };
        if foe.owner == self.player || !are_adjacent(ship.tile(), foe.tile()) {
            return Ok(false);
        }
        self.issue(&Event::attack_command(ship.clone(), target)).await?;
        Ok(true)
    }

    fn own_idle_ship(&self, id: ShipId) -> Option<&Ship> {
        self.world
            .ship(id)
            .filter(|ship| ship.owner == self.player && !ship.busy)
    }

    /// Run frames at the render cadence until `control` asks to stop or the
    /// transport fails. Returns the number of frames rendered.
    pub async fn run(&mut self, control: &TickerControl) -> Result<u64, ClientError> {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.world.tick_ms().max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut frames: u64 = 0;
        let mut known = self.world.ship_count();

        while !control.is_stop_requested() {
            interval.tick().await;
            let report = match self.frame().await {
                Ok(report) => report,
                Err(e) => {
                    warn!(player = %self.player, error = %e, "Transport failed, stopping");
                    return Err(e);
                }
            };
            frames = frames.saturating_add(1);
            if report.ships != known {
                info!(player = %self.player, ships = report.ships, "Mirror changed");
                known = report.ships;
            }
        }
        Ok(frames)
    }
}
