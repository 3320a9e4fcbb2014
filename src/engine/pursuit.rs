use crate::constants::TILE_SIZE;
use crate::maze::Maze;
use crate::movement::{is_centered_in_tile, tile_of};
use crate::rng::Rng;
use crate::types::{Archetype, Direction, Tile, Vec2};

use super::targeting;
use super::utils::{manhattan, shuffled_directions};
use super::GameSession;

// One decision, taken only at tile centers: evaluate the shuffled cardinal
// candidates against the target tile and commit to the closest legal one.
// Reversing while moving is a last resort, stopping the very last.
pub fn choose_direction(
    maze: &Maze,
    rng: &mut Rng,
    position: Vec2,
    current: Direction,
    target: Tile,
) -> Direction {
    let mut best = current;
    let mut best_distance = i32::MAX;
    let mut found = false;

    for candidate in shuffled_directions(rng) {
        if candidate == current.reverse() && current != Direction::None {
            continue;
        }
        let entered = entered_tile(position, candidate);
        if maze.is_wall(entered.x, entered.y) {
            continue;
        }
        let distance = manhattan(entered, target);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
            found = true;
        }
    }

    if found {
        return best;
    }

    let reverse = current.reverse();
    if reverse != Direction::None {
        let entered = entered_tile(position, reverse);
        if !maze.is_wall(entered.x, entered.y) {
            return reverse;
        }
    }
    Direction::None
}

fn entered_tile(position: Vec2, direction: Direction) -> Tile {
    let (dx, dy) = direction.vector();
    tile_of(Vec2 {
        x: position.x + dx * TILE_SIZE,
        y: position.y + dy * TILE_SIZE,
    })
}

impl GameSession {
    pub(super) fn update_adversaries(&mut self) {
        let player_tile = tile_of(self.player.position);
        let player_facing = self.player.dir;
        let leader_tile = self.adversaries[..self.active_adversaries]
            .iter()
            .find(|adversary| adversary.archetype == Archetype::Direct)
            .map(|adversary| tile_of(adversary.position));

        for idx in 0..self.active_adversaries {
            if is_centered_in_tile(self.adversaries[idx].position) {
                let target = self.adversary_target(idx, player_tile, player_facing, leader_tile);
                let chosen = choose_direction(
                    &self.maze,
                    &mut self.rng,
                    self.adversaries[idx].position,
                    self.adversaries[idx].dir,
                    target,
                );
                self.adversaries[idx].dir = chosen;
            }

            // Mid-corridor the committed direction is followed without a
            // wall re-check; legality was established at the last center.
            let adversary = &mut self.adversaries[idx];
            let (dx, dy) = adversary.dir.vector();
            adversary.position.x += dx * adversary.speed;
            adversary.position.y += dy * adversary.speed;
        }
    }

    fn adversary_target(
        &self,
        idx: usize,
        player_tile: Tile,
        player_facing: Direction,
        leader_tile: Option<Tile>,
    ) -> Tile {
        let adversary = &self.adversaries[idx];
        let width = self.maze.width();
        let height = self.maze.height();
        match adversary.archetype {
            Archetype::Direct => targeting::direct_target(player_tile),
            Archetype::Ambusher => {
                targeting::ambusher_target(player_tile, player_facing, width, height)
            }
            // Without an active leader the flank collapses to direct pursuit.
            Archetype::Flanker => match leader_tile {
                Some(leader) => {
                    targeting::flanker_target(player_tile, player_facing, leader, width, height)
                }
                None => targeting::direct_target(player_tile),
            },
            Archetype::Opportunist => targeting::opportunist_target(
                adversary.position,
                self.player.position,
                player_tile,
                height,
            ),
        }
    }
}
