use crate::constants::{
    AMBUSH_LOOKAHEAD_TILES, FLANK_LOOKAHEAD_TILES, OPPORTUNIST_RANGE_TILES, TILE_SIZE,
};
use crate::types::{Direction, Tile, Vec2};

use super::utils::{clamp_tile, euclidean};

pub fn direct_target(player_tile: Tile) -> Tile {
    player_tile
}

// Targets four tiles ahead of the player. When the player faces up the
// horizontal offset is forced to -4 instead of 0, reproducing the classic
// overflow quirk; keep it as-is.
pub fn ambusher_target(player_tile: Tile, player_facing: Direction, width: i32, height: i32) -> Tile {
    let (dx, dy) = player_facing.tile_offset();
    let mut offset_x = dx * AMBUSH_LOOKAHEAD_TILES;
    let offset_y = dy * AMBUSH_LOOKAHEAD_TILES;
    if dy < 0 && dx == 0 {
        offset_x = -AMBUSH_LOOKAHEAD_TILES;
    }
    clamp_tile(
        Tile {
            x: player_tile.x + offset_x,
            y: player_tile.y + offset_y,
        },
        width,
        height,
    )
}

// Doubles the vector from the leader to the point two tiles ahead of the
// player, pivoting the flank around the leader's position.
pub fn flanker_target(
    player_tile: Tile,
    player_facing: Direction,
    leader_tile: Tile,
    width: i32,
    height: i32,
) -> Tile {
    let (dx, dy) = player_facing.tile_offset();
    let ahead = Tile {
        x: player_tile.x + dx * FLANK_LOOKAHEAD_TILES,
        y: player_tile.y + dy * FLANK_LOOKAHEAD_TILES,
    };
    clamp_tile(
        Tile {
            x: leader_tile.x + 2 * (ahead.x - leader_tile.x),
            y: leader_tile.y + 2 * (ahead.y - leader_tile.y),
        },
        width,
        height,
    )
}

// Chases while far from the player, retreats to the bottom-left corner once
// within range.
pub fn opportunist_target(
    own_position: Vec2,
    player_position: Vec2,
    player_tile: Tile,
    height: i32,
) -> Tile {
    if euclidean(own_position, player_position) > TILE_SIZE * OPPORTUNIST_RANGE_TILES {
        player_tile
    } else {
        Tile { x: 1, y: height - 2 }
    }
}
