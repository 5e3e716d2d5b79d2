use super::*;

use crate::constants::get_ghost_count;
use crate::pathfinding::shortest_path;
use crate::types::GhostState;

use self::utils::{ghost_type_for_slot, pick_direction};

impl GameEngine {
    pub(super) fn spawn_ghosts(&mut self) {
        let count = get_ghost_count(self.board.rows(), self.board.cols())
            .min(self.ghost_spawns.len());
        self.ghosts = (0..count)
            .map(|slot| Ghost::new(slot, ghost_type_for_slot(slot), self.ghost_spawns[slot]))
            .collect();
    }

    pub(super) fn ghost_spawn_for(&self, slot: usize) -> Vec2 {
        if self.ghost_spawns.is_empty() {
            return self.base.door;
        }
        self.ghost_spawns[slot % self.ghost_spawns.len()]
    }

    pub(super) fn respawn_ghosts_at_spawns(&mut self) {
        for slot in 0..self.ghosts.len() {
            let spawn = self.ghost_spawn_for(slot);
            self.ghosts[slot].respawn(spawn);
        }
    }

    pub(super) fn hide_ghosts(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.visible = false;
        }
    }

    /// Scares every ghost, including one already on its way home.
    pub(super) fn scare_ghosts(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.become_scared();
        }
    }

    pub(super) fn calm_scared_ghosts(&mut self) {
        for ghost in &mut self.ghosts {
            if ghost.state == GhostState::Scared {
                ghost.become_normal();
            }
        }
    }

    pub(super) fn set_ghosts_frozen(&mut self, frozen: bool) {
        for ghost in &mut self.ghosts {
            ghost.frozen = frozen;
        }
    }

    pub(super) fn update_ghosts(&mut self) {
        for idx in 0..self.ghosts.len() {
            let steps = self.ghosts[idx].take_steps();
            for _ in 0..steps {
                if self.ghosts[idx].is_returning() {
                    if self.step_returning_ghost(idx) {
                        break;
                    }
                } else {
                    self.step_wandering_ghost(idx);
                }
            }
        }
    }

    pub(super) fn update_ghost_targets(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.update_target(self.player.pos, &mut self.rng);
        }
    }

    /// Walks one cell along the shortest path to the door. Returns true once
    /// the ghost is home and back to Normal.
    fn step_returning_ghost(&mut self, idx: usize) -> bool {
        let door = self.base.door;
        let pos = self.ghosts[idx].pos;
        if let Some(next) = shortest_path(&self.board, pos, door).first().copied() {
            self.ghosts[idx].dir = Direction::between(pos, next);
            self.ghosts[idx].pos = next;
        }
        if self.ghosts[idx].pos != door {
            return false;
        }
        self.ghosts[idx].respawn(door);
        self.events.push(RuntimeEvent::GhostRespawned {
            ghost_id: self.ghosts[idx].id,
        });
        true
    }

    fn step_wandering_ghost(&mut self, idx: usize) {
        let pos = self.ghosts[idx].pos;
        if self.base.is_interior(pos) && self.board.is_valid_move(pos.x, pos.y, Direction::Down) {
            self.ghosts[idx].dir = Direction::Down;
            self.ghosts[idx].pos = pos.step(Direction::Down);
            return;
        }

        let dir = self.ghosts[idx].dir;
        if self.board.is_valid_move(pos.x, pos.y, dir) {
            self.ghosts[idx].pos = pos.step(dir);
            return;
        }

        // A blocked ghost spends the step turning.
        let options = self.board.valid_directions(pos.x, pos.y);
        if let Some(turn) = pick_direction(&options, &mut self.rng) {
            self.ghosts[idx].dir = turn;
        }
    }
}
