use crate::constants::{
    active_adversary_count, adversary_spawn_tile, player_spawn_tile, ADVERSARY_SPEED, AGENT_RADIUS,
    MAX_NAME_LENGTH, PICKUP_SCORE, PLAYER_ANIMATION_FRAMES, PLAYER_SPEED, TICK_RATE, TILE_SIZE,
    WIN_SCREEN_DURATION_MS,
};
use crate::maze::Maze;
use crate::movement::{resolve_player_move, tile_of};
use crate::rng::Rng;
use crate::score_ledger::ScoreLedgers;
use crate::types::{
    AdversaryView, Archetype, Difficulty, Direction, Phase, PlayerView, RuntimeEvent,
    SessionCommand, Snapshot, TickInput, Vec2, WorldInit,
};

pub mod pursuit;
pub mod targeting;
mod utils;

use self::utils::circles_overlap;

#[derive(Clone, Debug)]
pub struct PlayerAgent {
    pub position: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub radius: f32,
    frame_counter: u32,
    mouth_open: bool,
}

#[derive(Clone, Debug)]
pub struct AdversaryAgent {
    pub position: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub radius: f32,
    pub archetype: Archetype,
    spawn: Vec2,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    maze: Maze,
    rng: Rng,
    phase: Phase,
    score: i32,
    selected_difficulty: Difficulty,
    browse_difficulty: Difficulty,
    active_adversaries: usize,
    player: PlayerAgent,
    adversaries: Vec<AdversaryAgent>,
    ledgers: ScoreLedgers,
    name_buffer: String,
    win_timer_ms: u64,
    events: Vec<RuntimeEvent>,
    tick_counter: u64,
}

impl GameSession {
    pub fn new(seed: u32, ledgers: ScoreLedgers) -> Self {
        let (spawn_x, spawn_y) = player_spawn_tile();
        let player = PlayerAgent {
            position: Vec2 {
                x: spawn_x * TILE_SIZE,
                y: spawn_y * TILE_SIZE,
            },
            dir: Direction::Right,
            speed: PLAYER_SPEED,
            radius: AGENT_RADIUS,
            frame_counter: 0,
            mouth_open: true,
        };
        let adversaries = Archetype::ROSTER
            .iter()
            .map(|archetype| {
                let (tile_x, tile_y) = adversary_spawn_tile(*archetype);
                let spawn = Vec2 {
                    x: tile_x * TILE_SIZE,
                    y: tile_y * TILE_SIZE,
                };
                AdversaryAgent {
                    position: spawn,
                    dir: Direction::None,
                    speed: ADVERSARY_SPEED,
                    radius: AGENT_RADIUS,
                    archetype: *archetype,
                    spawn,
                }
            })
            .collect();

        Self {
            maze: Maze::standard(),
            rng: Rng::new(seed),
            phase: Phase::Menu,
            score: 0,
            selected_difficulty: Difficulty::Easy,
            browse_difficulty: Difficulty::Easy,
            active_adversaries: active_adversary_count(Difficulty::Easy),
            player,
            adversaries,
            ledgers,
            name_buffer: String::new(),
            win_timer_ms: 0,
            events: Vec::new(),
            tick_counter: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn selected_difficulty(&self) -> Difficulty {
        self.selected_difficulty
    }

    pub fn browse_difficulty(&self) -> Difficulty {
        self.browse_difficulty
    }

    pub fn active_adversary_count(&self) -> usize {
        self.active_adversaries
    }

    pub fn name_buffer(&self) -> &str {
        &self.name_buffer
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &PlayerAgent {
        &self.player
    }

    pub fn adversaries(&self) -> &[AdversaryAgent] {
        &self.adversaries[..self.active_adversaries]
    }

    pub fn ledgers(&self) -> &ScoreLedgers {
        &self.ledgers
    }

    pub fn step(&mut self, input: TickInput) {
        self.tick_counter += 1;
        match self.phase {
            Phase::Menu => self.update_menu(&input),
            Phase::HighScoreBrowse => self.update_browse(&input),
            Phase::Playing => self.update_playing(&input),
            Phase::Lost => self.update_lost(&input),
            Phase::AwaitingNameEntry => self.update_name_entry(&input),
            Phase::Won => self.update_won(&input),
        }
    }

    pub fn world_init(&self) -> WorldInit {
        WorldInit {
            width: self.maze.width(),
            height: self.maze.height(),
            tile_size: TILE_SIZE,
            tiles: self.maze.rows(),
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            score: self.score,
            difficulty: self.selected_difficulty,
            active_adversaries: self.active_adversaries,
            player: PlayerView {
                x: self.player.position.x,
                y: self.player.position.y,
                dir: self.player.dir,
                mouth_open: self.player.mouth_open,
            },
            adversaries: self
                .adversaries()
                .iter()
                .map(|adversary| AdversaryView {
                    x: adversary.position.x,
                    y: adversary.position.y,
                    dir: adversary.dir,
                    archetype: adversary.archetype,
                })
                .collect(),
            name_buffer: self.name_buffer.clone(),
            win_time_left_ms: if self.phase == Phase::Won {
                Some(WIN_SCREEN_DURATION_MS.saturating_sub(self.win_timer_ms))
            } else {
                None
            },
            browsed_tier: self.browse_difficulty,
            high_scores: self.ledgers.entries(self.browse_difficulty).to_vec(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn update_menu(&mut self, input: &TickInput) {
        for command in &input.commands {
            match command {
                SessionCommand::SelectDifficulty(difficulty) => {
                    self.selected_difficulty = *difficulty;
                }
                SessionCommand::Start => {
                    self.active_adversaries = active_adversary_count(self.selected_difficulty);
                    self.reset_run();
                    self.enter_phase(Phase::Playing);
                }
                SessionCommand::BrowseHighScores => {
                    self.browse_difficulty = Difficulty::Easy;
                    self.enter_phase(Phase::HighScoreBrowse);
                }
                _ => {}
            }
        }
    }

    fn update_browse(&mut self, input: &TickInput) {
        for command in &input.commands {
            match command {
                SessionCommand::SelectDifficulty(difficulty) => {
                    self.browse_difficulty = *difficulty;
                }
                SessionCommand::ReturnToMenu => self.enter_phase(Phase::Menu),
                _ => {}
            }
        }
    }

    fn update_playing(&mut self, input: &TickInput) {
        let intended = if input.dir == Direction::None {
            self.player.dir
        } else {
            input.dir
        };
        let resolved = resolve_player_move(
            &self.maze,
            self.player.position,
            self.player.dir,
            intended,
            self.player.speed,
            self.player.radius,
        );
        self.player.position = resolved.position;
        self.player.dir = resolved.facing;

        self.player.frame_counter += 1;
        if self.player.frame_counter >= TICK_RATE / PLAYER_ANIMATION_FRAMES {
            self.player.frame_counter = 0;
            self.player.mouth_open = !self.player.mouth_open;
        }

        let tile = tile_of(self.player.position);
        if self.maze.consume_pickup(tile.x, tile.y) {
            self.score += PICKUP_SCORE;
            self.events.push(RuntimeEvent::PickupEaten {
                x: tile.x,
                y: tile.y,
            });
        }

        if self.maze.all_pickups_consumed() {
            self.win_timer_ms = 0;
            self.enter_phase(Phase::Won);
            return;
        }

        self.update_adversaries();

        let player_position = self.player.position;
        let player_radius = self.player.radius;
        let caught = self.adversaries().iter().any(|adversary| {
            circles_overlap(
                player_position,
                player_radius,
                adversary.position,
                adversary.radius,
            )
        });
        if caught {
            self.enter_phase(Phase::Lost);
        }
    }

    fn update_lost(&mut self, input: &TickInput) {
        if self
            .ledgers
            .is_high_score(self.score, self.selected_difficulty)
        {
            self.name_buffer.clear();
            self.enter_phase(Phase::AwaitingNameEntry);
            return;
        }
        for command in &input.commands {
            match command {
                SessionCommand::Restart => {
                    self.reset_run();
                    self.enter_phase(Phase::Playing);
                }
                SessionCommand::ReturnToMenu => self.enter_phase(Phase::Menu),
                _ => {}
            }
        }
    }

    fn update_name_entry(&mut self, input: &TickInput) {
        for command in &input.commands {
            match command {
                SessionCommand::AppendChar(entered) => {
                    let code = *entered as u32;
                    if (32..=125).contains(&code) && self.name_buffer.len() < MAX_NAME_LENGTH {
                        self.name_buffer.push(*entered);
                    }
                }
                SessionCommand::Backspace => {
                    self.name_buffer.pop();
                }
                SessionCommand::ConfirmName => {
                    if !self.name_buffer.is_empty() {
                        self.commit_score();
                        self.enter_phase(Phase::Menu);
                    }
                }
                _ => {}
            }
        }
    }

    fn update_won(&mut self, input: &TickInput) {
        // The win screen runs on wall-clock time so its duration does not
        // depend on the frame rate.
        self.win_timer_ms = self.win_timer_ms.saturating_add(input.dt_ms);
        if self.win_timer_ms >= WIN_SCREEN_DURATION_MS {
            self.reset_run();
            self.enter_phase(Phase::Menu);
        }
    }

    fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.events.push(RuntimeEvent::PhaseChanged { phase });
    }

    fn commit_score(&mut self) {
        let tier = self.selected_difficulty;
        let name: String = self.name_buffer.chars().take(MAX_NAME_LENGTH).collect();
        self.ledgers.insert(&name, self.score, tier);
        self.events.push(RuntimeEvent::ScoreCommitted {
            name,
            score: self.score,
            tier,
        });
    }

    fn reset_run(&mut self) {
        self.maze.reset_to_initial();
        self.score = 0;
        let (spawn_x, spawn_y) = player_spawn_tile();
        self.player.position = Vec2 {
            x: spawn_x * TILE_SIZE,
            y: spawn_y * TILE_SIZE,
        };
        self.player.dir = Direction::Right;
        self.player.frame_counter = 0;
        self.player.mouth_open = true;
        for idx in 0..self.active_adversaries {
            let adversary = &mut self.adversaries[idx];
            adversary.position = adversary.spawn;
            adversary.dir = Direction::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_MS;

    fn start_commands(difficulty: Difficulty) -> TickInput {
        TickInput {
            dir: Direction::None,
            commands: vec![
                SessionCommand::SelectDifficulty(difficulty),
                SessionCommand::Start,
            ],
            dt_ms: TICK_MS,
        }
    }

    fn held(dir: Direction) -> TickInput {
        TickInput {
            dir,
            commands: Vec::new(),
            dt_ms: TICK_MS,
        }
    }

    fn commands(commands: Vec<SessionCommand>) -> TickInput {
        TickInput {
            dir: Direction::None,
            commands,
            dt_ms: TICK_MS,
        }
    }

    fn new_session(seed: u32) -> GameSession {
        GameSession::new(seed, ScoreLedgers::new())
    }

    #[test]
    fn start_resets_the_run_and_enters_playing() {
        let mut session = new_session(1);
        session.step(start_commands(Difficulty::Hard));

        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.active_adversary_count(), 4);
        assert_eq!(session.score(), 0);
        assert_eq!(session.player().dir, Direction::Right);
        assert_eq!(session.player().position.x, 1.5 * TILE_SIZE);
        assert_eq!(session.player().position.y, 1.5 * TILE_SIZE);
        for adversary in session.adversaries() {
            assert_eq!(adversary.dir, Direction::None);
            assert_eq!(adversary.position.x, adversary.spawn.x);
            assert_eq!(adversary.position.y, adversary.spawn.y);
        }
    }

    #[test]
    fn difficulty_maps_to_adversary_count() {
        for (difficulty, expected) in [
            (Difficulty::Easy, 2),
            (Difficulty::Normal, 3),
            (Difficulty::Hard, 4),
        ] {
            let mut session = new_session(1);
            session.step(start_commands(difficulty));
            assert_eq!(session.active_adversary_count(), expected);
            assert_eq!(session.adversaries().len(), expected);
        }
    }

    #[test]
    fn eating_a_pickup_scores_ten_and_empties_the_cell() {
        let mut session = new_session(2);
        session.step(start_commands(Difficulty::Easy));
        // The spawn tile (1, 1) holds a pickup; the first playing tick eats
        // it.
        session.step(held(Direction::None));

        assert_eq!(session.score(), 10);
        assert_eq!(
            session.maze().cell_at(1, 1),
            crate::types::CellState::Empty
        );
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::PickupEaten { x: 1, y: 1 })));
    }

    #[test]
    fn consuming_the_last_pickup_wins_on_that_evaluation() {
        let mut session = new_session(3);
        session.step(start_commands(Difficulty::Easy));
        for tile in session.maze.pickup_tiles() {
            if tile.x == 1 && tile.y == 1 {
                continue;
            }
            assert!(session.maze.consume_pickup(tile.x, tile.y));
        }
        assert_eq!(session.phase(), Phase::Playing);

        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Won);
        let snapshot = session.build_snapshot(false);
        assert!(snapshot.win_time_left_ms.is_some());
    }

    #[test]
    fn win_screen_returns_to_menu_after_its_duration() {
        let mut session = new_session(4);
        session.step(start_commands(Difficulty::Easy));
        for tile in session.maze.pickup_tiles() {
            session.maze.consume_pickup(tile.x, tile.y);
        }
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Won);
        let pickups_before_reset = Maze::standard().pickup_count();

        session.step(TickInput {
            dir: Direction::None,
            commands: Vec::new(),
            dt_ms: WIN_SCREEN_DURATION_MS + 100,
        });
        assert_eq!(session.phase(), Phase::Menu);
        assert_eq!(session.score(), 0);
        assert_eq!(session.maze().pickup_count(), pickups_before_reset);
    }

    #[test]
    fn adversary_contact_loses_the_run() {
        let mut session = new_session(5);
        session.step(start_commands(Difficulty::Easy));
        session.adversaries[0].position = session.player.position;

        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Lost);
    }

    #[test]
    fn qualifying_score_flows_through_name_entry_into_the_ledger() {
        let mut session = new_session(6);
        session.step(start_commands(Difficulty::Normal));
        session.step(held(Direction::None));
        assert_eq!(session.score(), 10);

        session.adversaries[0].position = session.player.position;
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Lost);

        // Blank ledger slots score zero, so 10 qualifies on the next
        // evaluation.
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::AwaitingNameEntry);

        session.step(commands(vec![
            SessionCommand::AppendChar('A'),
            SessionCommand::AppendChar('C'),
            SessionCommand::Backspace,
            SessionCommand::AppendChar('B'),
            SessionCommand::ConfirmName,
        ]));
        assert_eq!(session.phase(), Phase::Menu);
        let entries = session.ledgers().entries(Difficulty::Normal);
        assert_eq!(entries[0].name, "AB");
        assert_eq!(entries[0].score, 10);
    }

    #[test]
    fn non_qualifying_loss_offers_restart_and_menu() {
        let mut session = new_session(7);
        for score in [50, 40, 30] {
            session.ledgers.insert("seed", score, Difficulty::Easy);
        }
        session.step(start_commands(Difficulty::Easy));
        session.adversaries[0].position = session.player.position;
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Lost);

        // Score 10 does not beat the lowest ledger entry of 30.
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::Lost);

        session.step(commands(vec![SessionCommand::Restart]));
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.score(), 0);

        session.adversaries[0].position = session.player.position;
        session.step(held(Direction::None));
        session.step(commands(vec![SessionCommand::ReturnToMenu]));
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn name_entry_filters_input_and_caps_length() {
        let mut session = new_session(8);
        session.step(start_commands(Difficulty::Easy));
        session.step(held(Direction::None));
        session.adversaries[0].position = session.player.position;
        session.step(held(Direction::None));
        session.step(held(Direction::None));
        assert_eq!(session.phase(), Phase::AwaitingNameEntry);

        // Confirming an empty buffer does nothing.
        session.step(commands(vec![SessionCommand::ConfirmName]));
        assert_eq!(session.phase(), Phase::AwaitingNameEntry);

        // Control characters are rejected, printable ASCII accepted, and
        // the buffer caps at twelve characters.
        let mut entry = vec![SessionCommand::AppendChar('\n')];
        for _ in 0..20 {
            entry.push(SessionCommand::AppendChar('x'));
        }
        session.step(commands(entry));
        assert_eq!(session.name_buffer(), "xxxxxxxxxxxx");

        session.step(commands(vec![SessionCommand::ConfirmName]));
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn browse_toggles_views_without_mutating_the_run() {
        let mut session = new_session(9);
        session.step(commands(vec![SessionCommand::BrowseHighScores]));
        assert_eq!(session.phase(), Phase::HighScoreBrowse);
        assert_eq!(session.browse_difficulty(), Difficulty::Easy);

        session.step(commands(vec![SessionCommand::SelectDifficulty(
            Difficulty::Hard,
        )]));
        assert_eq!(session.browse_difficulty(), Difficulty::Hard);
        assert_eq!(session.selected_difficulty(), Difficulty::Easy);

        session.step(commands(vec![SessionCommand::ReturnToMenu]));
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn same_seed_produces_the_same_progression() {
        let mut a = new_session(424_242);
        let mut b = new_session(424_242);
        a.step(start_commands(Difficulty::Hard));
        b.step(start_commands(Difficulty::Hard));

        let dirs = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ];
        for tick in 0..400 {
            let dir = dirs[(tick / 40) % dirs.len()];
            a.step(held(dir));
            b.step(held(dir));
            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);

            assert_eq!(sa.phase, sb.phase);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.y.to_bits(), sb.player.y.to_bits());
            for (ga, gb) in sa.adversaries.iter().zip(sb.adversaries.iter()) {
                assert_eq!(ga.x.to_bits(), gb.x.to_bits());
                assert_eq!(ga.y.to_bits(), gb.y.to_bits());
                assert_eq!(ga.dir, gb.dir);
            }
        }
    }

    #[test]
    fn adversaries_stay_on_open_tiles_through_long_runs() {
        let mut session = new_session(31_337);
        session.step(start_commands(Difficulty::Hard));
        for _ in 0..2_000 {
            session.step(held(Direction::Right));
            if session.phase() != Phase::Playing {
                break;
            }
            for adversary in session.adversaries() {
                let tile = tile_of(adversary.position);
                assert!(
                    !session.maze().is_wall(tile.x, tile.y),
                    "adversary on wall tile ({}, {})",
                    tile.x,
                    tile.y
                );
            }
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut session = new_session(10);
        session.step(start_commands(Difficulty::Easy));

        let first = session.build_snapshot(true);
        assert!(!first.events.is_empty());
        let second = session.build_snapshot(true);
        assert!(second.events.is_empty());
    }
}
