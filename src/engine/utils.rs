use crate::rng::Rng;
use crate::types::{Direction, Tile, Vec2};

pub(super) fn manhattan(a: Tile, b: Tile) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub(super) fn euclidean(a: Vec2, b: Vec2) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

pub(super) fn clamp_tile(tile: Tile, width: i32, height: i32) -> Tile {
    Tile {
        x: tile.x.clamp(0, width - 1),
        y: tile.y.clamp(0, height - 1),
    }
}

// Candidate order is shuffled before evaluation so equally good moves are
// broken unpredictably; first-found keeps ties.
pub(super) fn shuffled_directions(rng: &mut Rng) -> [Direction; 4] {
    let mut dirs = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];
    rng.shuffle(&mut dirs);
    dirs
}

pub(super) fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    euclidean(a, b) < a_radius + b_radius
}
