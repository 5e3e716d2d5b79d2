use crate::board::Board;
use crate::config::GameOptions;
use crate::constants::{
    DOT_SCORE, GHOST_SCORES, MAX_GHOST_MULTIPLIER, POWER_DOT_SCORE, STARTING_LIVES,
};
use crate::entities::{Fruit, Ghost, Player, PowerUp};
use crate::error::ConfigError;
use crate::maze::{generate, GeneratedMaze, GhostBase};
use crate::rng::Rng;
use crate::types::{Cell, Direction, GamePhase, GameSummary, RuntimeEvent, Snapshot, Vec2};

mod collision;
mod fruit_system;
mod ghost_system;
mod power_up_system;
mod utils;

use self::utils::{now_ms, remaining_ms};

/// Score, lives and the timed windows of one game. Times are simulated
/// milliseconds unless noted.
#[derive(Clone, Debug)]
pub struct Session {
    pub score: i32,
    pub lives: i32,
    pub level: i32,
    pub running: bool,
    /// Wall clock, informational only.
    pub started_at_ms: u64,
    pub elapsed_ms: u64,
    pub scare_until_ms: Option<u64>,
    pub invincible_until_ms: Option<u64>,
    pub ghost_multiplier: usize,
    pub fruit_cursor: usize,
    pub remaining_dots: i32,
    pub stats: SessionStats,
}

#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub dots_eaten: i32,
    pub ghosts_eaten: i32,
    pub fruits_eaten: i32,
    pub power_ups_collected: i32,
    pub deaths: i32,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub options: GameOptions,

    rng: Rng,
    board: Board,
    base: GhostBase,
    player_spawn: Vec2,
    ghost_spawns: Vec<Vec2>,
    player: Player,
    ghosts: Vec<Ghost>,
    power_ups: Vec<PowerUp>,
    fruit: Option<Fruit>,
    session: Session,
    events: Vec<RuntimeEvent>,
    phase: GamePhase,
    death_at: Option<Vec2>,
    tick_counter: u64,
    next_power_up_id: u64,
}

impl GameEngine {
    pub fn new(options: GameOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let mut rng = Rng::new(options.seed);
        let maze = generate(options.rows, options.cols, options.maze_type, &mut rng);

        let mut engine = Self {
            options,
            rng,
            board: maze.board,
            base: maze.base,
            player_spawn: maze.player_spawn,
            ghost_spawns: maze.ghost_spawns,
            player: Player::new(maze.player_spawn),
            ghosts: Vec::new(),
            power_ups: Vec::new(),
            fruit: None,
            session: Session {
                score: 0,
                lives: STARTING_LIVES,
                level: 1,
                running: true,
                started_at_ms: now_ms(),
                elapsed_ms: 0,
                scare_until_ms: None,
                invincible_until_ms: None,
                ghost_multiplier: 1,
                fruit_cursor: 0,
                remaining_dots: maze.dot_count,
                stats: SessionStats::default(),
            },
            events: Vec::new(),
            phase: GamePhase::Playing,
            death_at: None,
            tick_counter: 0,
            next_power_up_id: 1,
        };
        engine.spawn_ghosts();
        tracing::debug!(
            seed = options.seed,
            rows = options.rows,
            cols = options.cols,
            dots = maze.dot_count,
            ghosts = engine.ghosts.len(),
            "game created"
        );
        Ok(engine)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn base(&self) -> GhostBase {
        self.base
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_spawn(&self) -> Vec2 {
        self.player_spawn
    }

    pub fn ghost_spawns(&self) -> &[Vec2] {
        &self.ghost_spawns
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    pub fn fruit(&self) -> Option<&Fruit> {
        self.fruit.as_ref()
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn death_position(&self) -> Option<Vec2> {
        self.death_at
    }

    pub fn is_invincible(&self) -> bool {
        self.session.invincible_until_ms.is_some()
    }

    pub fn is_scare_running(&self) -> bool {
        self.session.scare_until_ms.is_some()
    }

    /// Buffers the player's next turn. Applied on the next movement sub-step
    /// where it is possible.
    pub fn set_direction(&mut self, dir: Direction) {
        self.player.desired_dir = dir;
    }

    pub fn step(&mut self, dt_ms: u64) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.tick_counter += 1;
        self.session.elapsed_ms = self.session.elapsed_ms.saturating_add(dt_ms);
        let now_ms = self.session.elapsed_ms;

        let player_before_move = self.player.pos;
        let ghosts_before_move: Vec<Vec2> = self.ghosts.iter().map(|ghost| ghost.pos).collect();

        self.move_player();
        self.update_ghosts();
        self.update_ghost_targets();
        self.update_power_ups(dt_ms, now_ms);
        self.update_timed_effects(now_ms);
        self.update_fruit(now_ms);
        self.resolve_collisions(player_before_move, &ghosts_before_move, now_ms);

        if self.phase == GamePhase::Playing && self.session.remaining_dots <= 0 {
            self.advance_level(now_ms);
        }
    }

    /// Finishes the two-phase death transition. Returns false when no death
    /// is pending.
    pub fn complete_death_animation(&mut self) -> bool {
        if self.phase != GamePhase::PlayerDied {
            return false;
        }
        let pos = self.board.random_reachable_position(&mut self.rng);
        self.player.pos = pos;
        self.player.alive = true;
        self.respawn_ghosts_at_spawns();
        self.phase = GamePhase::Playing;
        self.session.running = true;
        self.death_at = None;
        self.events.push(RuntimeEvent::PlayerRespawned { x: pos.x, y: pos.y });
        tracing::debug!(x = pos.x, y = pos.y, lives = self.session.lives, "player respawned");
        true
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.session.elapsed_ms;
        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: now_ms,
            rows: self.board.rows(),
            cols: self.board.cols(),
            tiles: self.board.to_tiles(),
            score: self.session.score,
            lives: self.session.lives,
            level: self.session.level,
            running: self.session.running,
            phase: self.phase,
            ghost_multiplier: self.session.ghost_multiplier,
            scare_remaining_ms: remaining_ms(self.session.scare_until_ms, now_ms),
            remaining_dots: self.session.remaining_dots,
            player: self.player.view(self.is_invincible()),
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            power_ups: self.power_ups.iter().map(PowerUp::view).collect(),
            fruit: self.fruit.as_ref().map(Fruit::view),
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

    pub fn build_summary(&self) -> GameSummary {
        let stats = &self.session.stats;
        GameSummary {
            seed: self.options.seed,
            rows: self.board.rows(),
            cols: self.board.cols(),
            score: self.session.score,
            level: self.session.level,
            lives: self.session.lives,
            ticks: self.tick_counter,
            duration_ms: self.session.elapsed_ms,
            dots_eaten: stats.dots_eaten,
            ghosts_eaten: stats.ghosts_eaten,
            fruits_eaten: stats.fruits_eaten,
            power_ups_collected: stats.power_ups_collected,
            deaths: stats.deaths,
            game_over: self.is_over(),
        }
    }

    fn move_player(&mut self) {
        for _ in 0..self.player.steps_per_tick() {
            let pos = self.player.pos;
            let desired = self.player.desired_dir;
            if self.board.is_valid_move(pos.x, pos.y, desired) {
                self.player.dir = desired;
            }
            if !self.board.is_valid_move(pos.x, pos.y, self.player.dir) {
                break;
            }
            self.player.pos = pos.step(self.player.dir);
        }
    }

    fn add_score(&mut self, points: i32) {
        self.session.score = self.session.score.saturating_add(points).max(0);
    }

    fn collect_dot(&mut self, now_ms: u64) {
        let pos = self.player.pos;
        match self.board.cell_at(pos) {
            Cell::Dot => {
                self.add_score(DOT_SCORE);
                self.clear_dot(pos);
                self.events.push(RuntimeEvent::DotEaten { x: pos.x, y: pos.y });
            }
            Cell::PowerDot => {
                self.add_score(POWER_DOT_SCORE);
                self.clear_dot(pos);
                self.start_scare(now_ms);
                self.session.ghost_multiplier = 1;
                self.events.push(RuntimeEvent::PowerDotEaten { x: pos.x, y: pos.y });
            }
            _ => {}
        }
    }

    fn clear_dot(&mut self, pos: Vec2) {
        self.board.set_cell(pos.x, pos.y, Cell::Empty);
        self.session.remaining_dots -= 1;
        self.session.stats.dots_eaten += 1;
    }

    fn ghost_points(&self) -> i32 {
        let slot = self.session.ghost_multiplier.clamp(1, MAX_GHOST_MULTIPLIER);
        GHOST_SCORES[slot - 1]
    }

    fn advance_level(&mut self, now_ms: u64) {
        let completed = self.session.level;
        self.events.push(RuntimeEvent::LevelCompleted { level: completed });
        self.session.level += 1;

        let maze = generate(
            self.board.rows(),
            self.board.cols(),
            self.options.maze_type,
            &mut self.rng,
        );
        self.install_maze(maze);

        self.power_ups.clear();
        self.fruit = None;
        self.session.fruit_cursor = 0;
        self.session.scare_until_ms = None;
        self.session.invincible_until_ms = None;
        self.session.ghost_multiplier = 1;
        self.player.pos = self.player_spawn;
        self.respawn_ghosts_at_spawns();
        for ghost in &mut self.ghosts {
            ghost.last_drop_ms = now_ms;
        }

        tracing::info!(
            level = self.session.level,
            score = self.session.score,
            dots = self.session.remaining_dots,
            "level completed"
        );
    }

    fn install_maze(&mut self, maze: GeneratedMaze) {
        self.board = maze.board;
        self.base = maze.base;
        self.player_spawn = maze.player_spawn;
        self.ghost_spawns = maze.ghost_spawns;
        self.session.remaining_dots = maze.dot_count;
    }
}


#[cfg(test)]
mod tests {
    use crate::autopilot::Autopilot;
    use crate::config::GameOptions;
    use crate::constants::{STARTING_LIVES, TICK_MS};
    use crate::engine::test_support::engine_on_board;
    use crate::engine::GameEngine;
    use crate::types::{Cell, Direction, GamePhase, GhostState, GhostType, RuntimeEvent, Vec2};

    #[test]
    fn invalid_dimensions_are_rejected_before_generation() {
        assert!(GameEngine::new(GameOptions::new(9, 20, 1)).is_err());
        assert!(GameEngine::new(GameOptions::new(20, 101, 1)).is_err());
    }

    #[test]
    fn new_game_starts_with_spawns_and_counts() {
        let engine = GameEngine::new(GameOptions::new(20, 20, 5)).expect("valid options");
        assert_eq!(engine.session().lives, STARTING_LIVES);
        assert_eq!(engine.session().level, 1);
        assert_eq!(engine.session().score, 0);
        assert_eq!(engine.player().pos, engine.player_spawn());
        assert_eq!(engine.player().dir, Direction::Right);
        assert_eq!(engine.ghosts().len(), 2);
        assert_eq!(engine.ghosts()[0].ghost_type, GhostType::Red);
        assert_eq!(engine.ghosts()[1].ghost_type, GhostType::Pink);
        let board = engine.board();
        let dots = (board.count(Cell::Dot) + board.count(Cell::PowerDot)) as i32;
        assert_eq!(engine.session().remaining_dots, dots);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = GameEngine::new(GameOptions::new(25, 25, 424_242)).expect("valid options");
        let mut b = GameEngine::new(GameOptions::new(25, 25, 424_242)).expect("valid options");
        let dirs = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];

        for tick in 0..600 {
            if tick % 17 == 0 {
                let dir = dirs[(tick / 17) % dirs.len()];
                a.set_direction(dir);
                b.set_direction(dir);
            }
            a.step(TICK_MS);
            b.step(TICK_MS);
            if a.phase() == GamePhase::PlayerDied {
                a.complete_death_animation();
                b.complete_death_animation();
            }
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);

            assert_eq!(sa.tiles, sb.tiles);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lives, sb.lives);
            assert_eq!((sa.player.x, sa.player.y), (sb.player.x, sb.player.y));
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!((ga.x, ga.y), (gb.x, gb.y));
                assert_eq!(ga.state, gb.state);
                assert_eq!((ga.target_x, ga.target_y), (gb.target_x, gb.target_y));
            }
            assert_eq!(sa.power_ups.len(), sb.power_ups.len());
            assert_eq!(sa.events.len(), sb.events.len());

            if a.is_over() || b.is_over() {
                assert_eq!(a.is_over(), b.is_over());
                break;
            }
        }
    }

    #[test]
    fn player_prefers_buffered_turn_and_stops_at_walls() {
        let mut engine = engine_on_board(
            &[
                "######", //
                "#P...#", //
                "#.####", //
                "######",
            ],
            &[],
        );
        engine.set_direction(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.player().pos, Vec2::new(2, 1));

        engine.set_direction(Direction::Down);
        engine.step(TICK_MS);
        assert_eq!(engine.player().pos, Vec2::new(3, 1), "down is blocked, keep going");
        engine.step(TICK_MS);
        engine.step(TICK_MS);
        assert_eq!(engine.player().pos, Vec2::new(4, 1));
        assert_eq!(engine.player().dir, Direction::Right);
    }

    #[test]
    fn dots_and_power_dots_score_and_clear() {
        let mut engine = engine_on_board(
            &[
                "#######", //
                "#P.o..#", //
                "#######",
            ],
            &[],
        );
        engine.set_direction(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.session().score, 10);
        assert_eq!(engine.board().cell(2, 1), Cell::Empty);
        engine.session.ghost_multiplier = 3;
        engine.step(TICK_MS);
        assert_eq!(engine.session().score, 60);
        assert!(engine.is_scare_running());
        assert_eq!(engine.session().ghost_multiplier, 1);
        assert_eq!(engine.session().remaining_dots, 2);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = GameEngine::new(GameOptions::new(20, 20, 333)).expect("valid options");
        engine.events.push(RuntimeEvent::DotEaten { x: 1, y: 1 });

        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert_eq!(second.events.len(), 0);
    }

    #[test]
    fn clearing_every_dot_advances_to_a_fresh_level() {
        let mut engine = GameEngine::new(GameOptions::new(20, 20, 2024)).expect("valid options");
        let initial_dots = engine.session().remaining_dots;
        let rows = engine.board().rows();
        let cols = engine.board().cols();
        engine.session.invincible_until_ms = Some(u64::MAX);
        let mut pilot = Autopilot::new();

        let mut advanced = false;
        for _ in 0..20_000 {
            let dir = pilot.choose(&engine);
            engine.set_direction(dir);
            engine.step(TICK_MS);
            if engine.session().level == 2 {
                advanced = true;
                break;
            }
        }

        assert!(advanced, "player never cleared the first level");
        assert_eq!(engine.session().stats.dots_eaten, initial_dots);
        assert_eq!(engine.board().rows(), rows);
        assert_eq!(engine.board().cols(), cols);
        assert_eq!(engine.player().pos, engine.player_spawn());
        assert_eq!(engine.board().cell_at(engine.player_spawn()), Cell::PlayerSpawn);
        for (idx, ghost) in engine.ghosts().iter().enumerate() {
            assert_eq!(ghost.pos, engine.ghost_spawns()[idx % engine.ghost_spawns().len()]);
            assert_eq!(ghost.state, GhostState::Normal);
        }
        assert!(engine.power_ups().is_empty());
        assert!(engine.fruit().is_none());
        assert!(!engine.is_invincible());
        assert_eq!(engine.session().fruit_cursor, 0);
        assert!(engine.session().remaining_dots > 0);
    }

    #[test]
    fn ghost_contact_costs_a_life_and_waits_for_the_animation() {
        let mut engine = engine_on_board(
            &[
                "########", //
                "#P.....#", //
                "#.####.#", //
                "#......#", //
                "########",
            ],
            &[(GhostType::Red, Vec2::new(2, 1))],
        );
        engine.ghosts[0].dir = Direction::Left;
        engine.set_direction(Direction::Right);
        engine.step(TICK_MS);

        assert_eq!(engine.session().lives, STARTING_LIVES - 1);
        assert_eq!(engine.phase(), GamePhase::PlayerDied);
        assert!(!engine.session().running);
        assert!(engine.ghosts().iter().all(|ghost| !ghost.visible));
        let death_at = engine.death_position().expect("death position is published");

        let frozen_tick = engine.tick();
        engine.step(TICK_MS);
        assert_eq!(engine.tick(), frozen_tick, "no updates until the animation ends");

        assert!(engine.complete_death_animation());
        assert!(!engine.complete_death_animation());
        assert_eq!(engine.phase(), GamePhase::Playing);
        let pos = engine.player().pos;
        assert!(!engine.board().valid_moves(pos.x, pos.y).is_empty());
        assert_ne!(engine.board().cell_at(pos), Cell::Wall);
        assert_eq!(engine.ghosts()[0].pos, Vec2::new(2, 1));
        assert!(engine.ghosts()[0].visible);
        assert_eq!(death_at, Vec2::new(2, 1));
    }

    #[test]
    fn losing_the_last_life_ends_the_game() {
        let mut engine = engine_on_board(
            &[
                "######", //
                "#P...#", //
                "######",
            ],
            &[(GhostType::Red, Vec2::new(1, 1))],
        );
        engine.session.lives = 1;
        engine.ghosts[0].frozen = true;
        engine.step(TICK_MS);

        assert_eq!(engine.phase(), GamePhase::GameOver);
        assert!(engine.is_over());
        assert_eq!(engine.session().lives, 0);
        assert!(!engine.session().running);
        assert!(!engine.complete_death_animation());
        let summary = engine.build_summary();
        assert!(summary.game_over);
        assert_eq!(summary.deaths, 1);
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::GameOver { .. })));
    }
}
