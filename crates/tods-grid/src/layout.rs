//! Conversion between tile coordinates and pixel positions.
//!
//! Tiles are pointy-top hexagons in an offset layout: rows are spaced by
//! `1.5 * RADIUS` and odd rows are shifted right by half a tile width. The
//! pixel position of a tile is the centre of its hexagon.

use serde::{Deserialize, Serialize};
use tods_types::Tile;

/// Square root of three.
#[allow(clippy::lossy_float_literal)]
pub const SQRT_3: f32 = 1.732_050_8;

/// Distance from a hexagon's centre to any of its corners.
pub const RADIUS: f32 = 32.0;

/// Horizontal distance between the centres of two tiles in the same row.
pub const TILE_WIDTH: f32 = RADIUS * SQRT_3;

/// Vertical distance between the centres of two consecutive rows.
pub const ROW_HEIGHT: f32 = RADIUS * 1.5;

/// Width of the lookup boxes used by [`pixel_to_tile`].
const BOX_WIDTH: f32 = TILE_WIDTH / 2.0;

/// Height of the lookup boxes used by [`pixel_to_tile`].
const BOX_HEIGHT: f32 = RADIUS / 2.0;

/// A position in screen space (y grows downwards).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Pixel {
    /// Create a pixel position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl core::ops::Add for Pixel {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl core::ops::AddAssign for Pixel {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl core::ops::Sub for Pixel {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl core::ops::Div<f32> for Pixel {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// Whether a row (or box column) index is even, for negative values too.
pub(crate) const fn is_even(n: i32) -> bool {
    n.rem_euclid(2) == 0
}

/// Pixel position of a tile's centre.
#[allow(clippy::cast_precision_loss)]
pub fn tile_to_pixel(tile: Tile) -> Pixel {
    let x = if is_even(tile.y) {
        tile.x as f32 * TILE_WIDTH
    } else {
        (tile.x as f32 + 0.5) * TILE_WIDTH
    };
    Pixel::new(x, tile.y as f32 * ROW_HEIGHT)
}

/// The tile whose hexagon contains `pixel`.
///
/// The plane is cut into boxes half a tile wide and half a radius high.
/// Every third box row lies in the band where two hex rows overlap; a
/// point there belongs to the upper row when it lies above the diagonal
/// edge separating the two candidate hexagons.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn pixel_to_tile(pixel: Pixel) -> Tile {
    let box_x = (pixel.x / BOX_WIDTH).floor() as i32;
    let box_y = (pixel.y / BOX_HEIGHT).floor() as i32;

    let mut tile_y = box_y.saturating_add(2).div_euclid(3);
    let mut tile_x = if is_even(tile_y) {
        box_x.saturating_add(1).div_euclid(2)
    } else {
        box_x.div_euclid(2)
    };

    if box_y.saturating_add(2).rem_euclid(3) == 0 {
        let tx = pixel.x - box_x as f32 * BOX_WIDTH;
        let ty = pixel.y - box_y as f32 * BOX_HEIGHT;
        // Edge rising from the box's lower-left corner to its upper-right.
        let above_rising = BOX_HEIGHT - tx / SQRT_3 > ty;
        // Edge falling from the box's upper-left corner to its lower-right.
        let above_falling = tx / SQRT_3 > ty;

        match (is_even(tile_y), is_even(box_x)) {
            (false, true) => {
                if above_rising {
                    tile_y = tile_y.saturating_sub(1);
                }
            }
            (false, false) => {
                if above_falling {
                    tile_y = tile_y.saturating_sub(1);
                    tile_x = tile_x.saturating_add(1);
                }
            }
            (true, true) => {
                if above_falling {
                    tile_y = tile_y.saturating_sub(1);
                }
            }
            (true, false) => {
                if above_rising {
                    tile_x = tile_x.saturating_sub(1);
                    tile_y = tile_y.saturating_sub(1);
                }
            }
        }
    }

    Tile::new(tile_x, tile_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: Pixel, b: Pixel) -> bool {
        a.distance(b) < EPS
    }

    #[test]
    fn origin_tile_is_at_origin() {
        assert!(close(tile_to_pixel(Tile::new(0, 0)), Pixel::new(0.0, 0.0)));
    }

    #[test]
    fn odd_rows_shift_half_a_tile() {
        let even = tile_to_pixel(Tile::new(2, 2));
        let odd = tile_to_pixel(Tile::new(2, 3));
        assert!((odd.x - even.x - TILE_WIDTH / 2.0).abs() < EPS);
        assert!((odd.y - even.y - ROW_HEIGHT).abs() < EPS);
    }

    #[test]
    fn tile_centres_round_trip() {
        for y in -6..=18 {
            for x in -6..=26 {
                let tile = Tile::new(x, y);
                assert_eq!(pixel_to_tile(tile_to_pixel(tile)), tile, "tile {tile}");
            }
        }
    }

    #[test]
    fn points_near_the_centre_stay_in_the_tile() {
        let offsets = [
            Pixel::new(10.0, 0.0),
            Pixel::new(-10.0, 0.0),
            Pixel::new(0.0, 20.0),
            Pixel::new(0.0, -20.0),
            Pixel::new(15.0, 12.0),
            Pixel::new(-15.0, -12.0),
        ];
        for y in 0..12 {
            for x in 0..20 {
                let tile = Tile::new(x, y);
                let centre = tile_to_pixel(tile);
                for offset in offsets {
                    assert_eq!(pixel_to_tile(centre + offset), tile, "tile {tile} offset {offset:?}");
                }
            }
        }
    }

    #[test]
    fn overlap_band_follows_the_diagonal_edge() {
        // Between row 1 (odd) and row 2 (even), left half of tile (0, 2).
        // The edge runs from (0, 64) down to (27.7, 80).
        assert_eq!(pixel_to_tile(Pixel::new(5.0, 70.0)), Tile::new(0, 2));
        assert_eq!(pixel_to_tile(Pixel::new(20.0, 66.0)), Tile::new(0, 1));

        // Right half of tile (0, 2): edge runs from (27.7, 80) up to (55.4, 64).
        assert_eq!(pixel_to_tile(Pixel::new(50.0, 70.0)), Tile::new(1, 2));
        assert_eq!(pixel_to_tile(Pixel::new(35.0, 66.0)), Tile::new(0, 1));

        // Between row 0 (even) and row 1 (odd).
        assert_eq!(pixel_to_tile(Pixel::new(5.0, 18.0)), Tile::new(0, 0));
        assert_eq!(pixel_to_tile(Pixel::new(20.0, 30.0)), Tile::new(0, 1));
        assert_eq!(pixel_to_tile(Pixel::new(50.0, 18.0)), Tile::new(1, 0));
        assert_eq!(pixel_to_tile(Pixel::new(35.0, 30.0)), Tile::new(0, 1));
    }
}
