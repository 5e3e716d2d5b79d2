//! Scripted player used by the simulator and by long-running tests.

use std::collections::HashSet;

use crate::engine::GameEngine;
use crate::pathfinding::{nearest_matching, nearest_matching_avoiding};
use crate::types::{Cell, Direction, GhostState, Vec2};

/// Heads for the nearest dot while steering clear of ghosts that can hurt.
#[derive(Clone, Debug)]
pub struct Autopilot {
    last_choice: Direction,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Autopilot {
    pub fn new() -> Self {
        Self {
            last_choice: Direction::Right,
        }
    }

    pub fn choose(&mut self, engine: &GameEngine) -> Direction {
        let board = engine.board();
        let pos = engine.player().pos;
        let danger = danger_zone(engine);
        let is_dot = |cell: Cell| matches!(cell, Cell::Dot | Cell::PowerDot);

        let path = nearest_matching_avoiding(board, pos, &danger, is_dot)
            .or_else(|| nearest_matching(board, pos, is_dot));
        let choice = match path.as_ref().and_then(|path| path.first()) {
            Some(next) => Direction::between(pos, *next),
            None => self.escape_direction(engine, &danger),
        };
        if choice != Direction::None {
            self.last_choice = choice;
        }
        self.last_choice
    }

    /// With no dot in reach, step to any neighbour outside the danger zone,
    /// keeping the current heading when it is still safe.
    fn escape_direction(&self, engine: &GameEngine, danger: &HashSet<Vec2>) -> Direction {
        let pos = engine.player().pos;
        let options = engine.board().valid_directions(pos.x, pos.y);
        let safe: Vec<Direction> = options
            .iter()
            .copied()
            .filter(|dir| !danger.contains(&pos.step(*dir)))
            .collect();
        if safe.contains(&self.last_choice) {
            return self.last_choice;
        }
        safe.first()
            .or(options.first())
            .copied()
            .unwrap_or(Direction::None)
    }
}

/// Cells occupied by, or adjacent to, a ghost that would kill on contact.
fn danger_zone(engine: &GameEngine) -> HashSet<Vec2> {
    let mut danger = HashSet::new();
    if engine.is_invincible() {
        return danger;
    }
    for ghost in engine.ghosts() {
        if !ghost.visible || ghost.state != GhostState::Normal {
            continue;
        }
        danger.insert(ghost.pos);
        danger.extend(engine.board().valid_moves(ghost.pos.x, ghost.pos.y));
    }
    danger
}
