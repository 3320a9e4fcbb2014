use crate::constants::{CENTER_TOLERANCE, TILE_SIZE, WALL_PROBE_FRACTION};
use crate::maze::Maze;
use crate::types::{Direction, Tile, Vec2};

pub fn tile_of(position: Vec2) -> Tile {
    Tile {
        x: (position.x / TILE_SIZE).floor() as i32,
        y: (position.y / TILE_SIZE).floor() as i32,
    }
}

pub fn advance(position: Vec2, direction: Direction, speed: f32) -> Vec2 {
    let (dx, dy) = direction.vector();
    Vec2 {
        x: position.x + dx * speed,
        y: position.y + dy * speed,
    }
}

// Probe a short distance ahead of the candidate position along the movement
// direction and reject the move when the probed tile is a wall.
pub fn probe_hits_wall(maze: &Maze, position: Vec2, direction: Direction, radius: f32) -> bool {
    let (dx, dy) = direction.vector();
    let probe = Vec2 {
        x: position.x + dx * radius * WALL_PROBE_FRACTION,
        y: position.y + dy * radius * WALL_PROBE_FRACTION,
    };
    let tile = tile_of(probe);
    maze.is_wall(tile.x, tile.y)
}

pub fn is_centered_in_tile(position: Vec2) -> bool {
    let center_x = (position.x / TILE_SIZE).floor() * TILE_SIZE + TILE_SIZE / 2.0;
    let center_y = (position.y / TILE_SIZE).floor() * TILE_SIZE + TILE_SIZE / 2.0;
    (position.x - center_x).abs() < CENTER_TOLERANCE && (position.y - center_y).abs() < CENTER_TOLERANCE
}

#[derive(Clone, Copy, Debug)]
pub struct ResolvedMove {
    pub position: Vec2,
    pub facing: Direction,
}

// Player resolution order, which must not be swapped: the intended turn is
// taken only when its corridor is open, otherwise the current facing keeps
// the agent moving, otherwise it stops.
pub fn resolve_player_move(
    maze: &Maze,
    position: Vec2,
    facing: Direction,
    intended: Direction,
    speed: f32,
    radius: f32,
) -> ResolvedMove {
    let turned = advance(position, intended, speed);
    if !probe_hits_wall(maze, turned, intended, radius) {
        return ResolvedMove {
            position: turned,
            facing: intended,
        };
    }

    let straight = advance(position, facing, speed);
    if !probe_hits_wall(maze, straight, facing, radius) {
        return ResolvedMove {
            position: straight,
            facing,
        };
    }

    ResolvedMove {
        position,
        facing: Direction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AGENT_RADIUS, PLAYER_SPEED};
    use crate::rng::Rng;

    fn tile_center(x: i32, y: i32) -> Vec2 {
        Vec2 {
            x: x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            y: y as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        }
    }

    #[test]
    fn tile_of_floors_into_the_containing_cell() {
        assert_eq!(tile_of(Vec2 { x: 0.0, y: 0.0 }), Tile { x: 0, y: 0 });
        assert_eq!(tile_of(Vec2 { x: 59.9, y: 59.9 }), Tile { x: 0, y: 0 });
        assert_eq!(tile_of(Vec2 { x: 60.0, y: 120.0 }), Tile { x: 1, y: 2 });
    }

    #[test]
    fn centering_respects_the_tolerance_band() {
        assert!(is_centered_in_tile(tile_center(3, 3)));
        let near = Vec2 {
            x: 3.0 * TILE_SIZE + TILE_SIZE / 2.0 + 1.5,
            y: 3.0 * TILE_SIZE + TILE_SIZE / 2.0 - 1.5,
        };
        assert!(is_centered_in_tile(near));
        let off = Vec2 {
            x: 3.0 * TILE_SIZE + TILE_SIZE / 2.0 + 2.5,
            y: 3.0 * TILE_SIZE + TILE_SIZE / 2.0,
        };
        assert!(!is_centered_in_tile(off));
    }

    #[test]
    fn blocked_turn_keeps_current_facing_moving() {
        let maze = Maze::standard();
        // Corridor along row 1 with the agent already nudged toward the top
        // wall, so the upward probe lands in row 0 and the turn is rejected
        // while moving right keeps going.
        let position = Vec2 {
            x: 150.0,
            y: 84.0,
        };
        let resolved = resolve_player_move(
            &maze,
            position,
            Direction::Right,
            Direction::Up,
            PLAYER_SPEED,
            AGENT_RADIUS,
        );
        assert_eq!(resolved.facing, Direction::Right);
        assert!(resolved.position.x > position.x);
        assert_eq!(resolved.position.y, position.y);
    }

    #[test]
    fn probe_allows_slight_overlap_before_blocking() {
        let maze = Maze::standard();
        // One step up from a tile center in row 1 still probes inside the
        // corridor; only the tick after that crosses into the border wall.
        let position = tile_center(2, 1);
        let first = resolve_player_move(
            &maze,
            position,
            Direction::Right,
            Direction::Up,
            PLAYER_SPEED,
            AGENT_RADIUS,
        );
        assert_eq!(first.facing, Direction::Up);
        let second = resolve_player_move(
            &maze,
            first.position,
            first.facing,
            Direction::Up,
            PLAYER_SPEED,
            AGENT_RADIUS,
        );
        assert_eq!(second.facing, Direction::None);
        assert_eq!(second.position.y, first.position.y);
    }

    #[test]
    fn open_turn_adopts_the_intended_facing() {
        let maze = Maze::standard();
        let position = tile_center(1, 1);
        let resolved = resolve_player_move(
            &maze,
            position,
            Direction::Right,
            Direction::Down,
            PLAYER_SPEED,
            AGENT_RADIUS,
        );
        assert_eq!(resolved.facing, Direction::Down);
        assert!(resolved.position.y > position.y);
    }

    #[test]
    fn fully_blocked_agent_stops_in_place() {
        let maze = Maze::from_rows(&["#####", "#.#.#", "#####"]);
        // Pressed against the wall to the right of cell (1, 1).
        let position = Vec2 { x: 96.0, y: 90.0 };
        let resolved = resolve_player_move(
            &maze,
            position,
            Direction::Right,
            Direction::Right,
            PLAYER_SPEED,
            AGENT_RADIUS,
        );
        assert_eq!(resolved.facing, Direction::None);
        assert_eq!(resolved.position.x, position.x);
        assert_eq!(resolved.position.y, position.y);
    }

    #[test]
    fn committed_positions_never_land_on_a_wall_tile() {
        let maze = Maze::standard();
        let mut rng = Rng::new(4_242);
        let dirs = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ];
        let mut position = tile_center(1, 1);
        let mut facing = Direction::Right;
        for _ in 0..5_000 {
            let intended = dirs[rng.pick_index(dirs.len())];
            let resolved =
                resolve_player_move(&maze, position, facing, intended, PLAYER_SPEED, AGENT_RADIUS);
            position = resolved.position;
            facing = resolved.facing;
            let tile = tile_of(position);
            assert!(
                !maze.is_wall(tile.x, tile.y),
                "agent center entered a wall at ({}, {})",
                tile.x,
                tile.y
            );
        }
    }
}
