//! Hex-grid geometry for the Tods simulation.
//!
//! Pure functions over the offset hex layout shared by the authoritative
//! world (adjacency and move legality) and observers (animation
//! interpolation, picking, outlines).
//!
//! # Modules
//!
//! - [`layout`] -- Tile/pixel conversion and geometry constants.
//! - [`direction`] -- The six neighbour directions and adjacency checks.
//! - [`polygon`] -- Regular polygon vertices for drawing tile outlines.
//! - [`error`] -- Error types for geometry calculations.

pub mod direction;
pub mod error;
pub mod layout;
pub mod polygon;

pub use direction::{Direction, adjacent_tile, are_adjacent, find_direction, neighbors};
pub use error::GridError;
pub use layout::{Pixel, RADIUS, ROW_HEIGHT, TILE_WIDTH, pixel_to_tile, tile_to_pixel};
pub use polygon::{hex_vertices, tile_polygon};
