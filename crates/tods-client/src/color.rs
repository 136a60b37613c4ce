//! Per-player colours for drawing ships.

use std::collections::HashMap;

use serde::Serialize;
use tods_types::PlayerId;

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Powder blue.
    pub const POWDER_BLUE: Self = Self::rgb(176, 224, 230);
    /// Salmon.
    pub const SALMON: Self = Self::rgb(250, 128, 114);
    /// Silver.
    pub const SILVER: Self = Self::rgb(192, 192, 192);

    /// Build a colour from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Palette handed out to players in first-sighting order.
pub const PALETTE: [Color; 4] = [Color::RED, Color::POWDER_BLUE, Color::SALMON, Color::SILVER];

/// Assigns each player a stable colour from [`PALETTE`].
///
/// Assignment wraps around once the palette is exhausted, so a fifth
/// player shares the first player's colour.
#[derive(Debug, Default)]
pub struct ColorTable {
    assigned: HashMap<PlayerId, Color>,
    next: usize,
}

impl ColorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The colour of `player`, assigning the next palette entry on first
    /// sight.
    pub fn color_for(&mut self, player: &PlayerId) -> Color {
        if let Some(color) = self.assigned.get(player) {
            return *color;
        }
        let color = self
            .next
            .checked_rem(PALETTE.len())
            .and_then(|i| PALETTE.get(i))
            .copied()
            .unwrap_or(Color::SILVER);
        self.next = self.next.wrapping_add(1);
        self.assigned.insert(player.clone(), color);
        color
    }

    /// The colour of `player` if one has been assigned.
    pub fn get(&self, player: &PlayerId) -> Option<Color> {
        self.assigned.get(player).copied()
    }

    /// Number of players seen so far.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether no player has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_follow_first_sighting_order() {
        let mut table = ColorTable::new();
        assert_eq!(table.color_for(&PlayerId::from("b")), Color::RED);
        assert_eq!(table.color_for(&PlayerId::from("a")), Color::POWDER_BLUE);
        assert_eq!(table.color_for(&PlayerId::from("b")), Color::RED);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn palette_wraps_around() {
        let mut table = ColorTable::new();
        let colors: Vec<Color> = ["p1", "p2", "p3", "p4", "p5", "p6"]
            .iter()
            .map(|p| table.color_for(&PlayerId::from(*p)))
            .collect();
        assert_eq!(
            colors,
            vec![
                Color::RED,
                Color::POWDER_BLUE,
                Color::SALMON,
                Color::SILVER,
                Color::RED,
                Color::POWDER_BLUE,
            ]
        );
    }

    #[test]
    fn unseen_player_has_no_colour() {
        let table = ColorTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get(&PlayerId::from("ghost")), None);
    }
}
