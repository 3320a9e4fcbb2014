use crate::types::{Archetype, Difficulty};

pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAZE_WIDTH: i32 = 25;
pub const MAZE_HEIGHT: i32 = 15;
pub const TILE_SIZE: f32 = 60.0;

pub const PLAYER_SPEED: f32 = 6.0;
pub const ADVERSARY_SPEED: f32 = 4.0;
pub const AGENT_RADIUS: f32 = TILE_SIZE * 0.4;

// Fraction of the radius projected ahead of a candidate position when
// probing for walls. The bounding circle may overlap a wall edge slightly
// before a move is rejected, so motion does not stop hard at tile seams.
pub const WALL_PROBE_FRACTION: f32 = 0.8;
pub const CENTER_TOLERANCE: f32 = 2.0;

pub const PICKUP_SCORE: i32 = 10;
pub const PLAYER_ANIMATION_FRAMES: u32 = 8;

pub const AMBUSH_LOOKAHEAD_TILES: i32 = 4;
pub const FLANK_LOOKAHEAD_TILES: i32 = 2;
pub const OPPORTUNIST_RANGE_TILES: f32 = 8.0;

pub const WIN_SCREEN_DURATION_MS: u64 = 2_500;

pub const LEDGER_CAPACITY: usize = 3;
pub const MAX_NAME_LENGTH: usize = 12;

pub fn active_adversary_count(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy => 2,
        Difficulty::Normal => 3,
        Difficulty::Hard => 4,
    }
}

pub fn player_spawn_tile() -> (f32, f32) {
    (1.5, 1.5)
}

pub fn adversary_spawn_tile(archetype: Archetype) -> (f32, f32) {
    match archetype {
        Archetype::Direct => (12.5, 8.5),
        Archetype::Ambusher => (12.5, 8.5),
        Archetype::Flanker => (11.5, 8.5),
        Archetype::Opportunist => (13.5, 8.5),
    }
}
