//! Regular polygon outlines for renderers.

use tods_types::Tile;

use crate::error::GridError;
use crate::layout::{Pixel, RADIUS, tile_to_pixel};

/// Vertices of a regular polygon with `sides` corners at `radius` from
/// `center`, starting at `start_angle_deg` (0 points right, angles grow
/// counter-clockwise on screen).
pub fn hex_vertices(
    sides: u32,
    radius: f32,
    start_angle_deg: f32,
    center: Pixel,
) -> Result<Vec<Pixel>, GridError> {
    if sides < 3 {
        return Err(GridError::TooFewSides { sides });
    }
    Ok(vertices(sides, radius, start_angle_deg, center))
}

/// The six corners of a tile's hexagon, starting at the upper-right one.
pub fn tile_polygon(tile: Tile) -> Vec<Pixel> {
    vertices(6, RADIUS, 30.0, tile_to_pixel(tile))
}

#[allow(clippy::cast_possible_truncation)]
fn vertices(sides: u32, radius: f32, start_angle_deg: f32, center: Pixel) -> Vec<Pixel> {
    let step = 360.0 / f64::from(sides);
    (0..sides)
        .map(|i| {
            let radians = step.mul_add(f64::from(i), f64::from(start_angle_deg)).to_radians();
            Pixel::new(
                (radians.cos() as f32).mul_add(radius, center.x),
                ((-radians).sin() as f32).mul_add(radius, center.y),
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn close(a: Pixel, b: Pixel) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn fewer_than_three_sides_is_rejected() {
        let err = hex_vertices(2, 10.0, 0.0, Pixel::default());
        assert_eq!(err, Err(GridError::TooFewSides { sides: 2 }));
    }

    #[test]
    fn square_vertices_start_at_angle() {
        let square = hex_vertices(4, 10.0, 0.0, Pixel::new(100.0, 100.0)).unwrap_or_default();
        assert_eq!(square.len(), 4);
        assert!(close(square[0], Pixel::new(110.0, 100.0)));
        // 90 degrees is up on screen.
        assert!(close(square[1], Pixel::new(100.0, 90.0)));
        assert!(close(square[2], Pixel::new(90.0, 100.0)));
        assert!(close(square[3], Pixel::new(100.0, 110.0)));
    }

    #[test]
    fn tile_polygon_is_pointy_top() {
        let centre = tile_to_pixel(Tile::new(2, 3));
        let corners = tile_polygon(Tile::new(2, 3));
        assert_eq!(corners.len(), 6);
        for corner in &corners {
            assert!((corner.distance(centre) - RADIUS).abs() < 1e-3);
        }
        assert!(close(corners[1], Pixel::new(centre.x, centre.y - RADIUS)));
        assert!(close(corners[4], Pixel::new(centre.x, centre.y + RADIUS)));
    }
}
