use super::*;

use crate::types::GhostState;

impl GameEngine {
    /// Pickups and ghost contact for the player's cell after everyone moved.
    /// Contact counts when both stand on the same cell, or when they passed
    /// through each other by swapping cells this tick.
    pub(super) fn resolve_collisions(
        &mut self,
        player_before_move: Vec2,
        ghosts_before_move: &[Vec2],
        now_ms: u64,
    ) {
        self.collect_dot(now_ms);
        self.collect_power_up_at(self.player.pos, now_ms);

        let mut handled = vec![false; self.ghosts.len()];
        for idx in 0..self.ghosts.len() {
            let ghost = &self.ghosts[idx];
            if !ghost.visible || ghost.is_returning() || ghost.pos != self.player.pos {
                continue;
            }
            handled[idx] = true;
            if !self.touch_ghost(idx) {
                return;
            }
        }

        for idx in 0..self.ghosts.len() {
            if handled[idx] {
                continue;
            }
            let ghost = &self.ghosts[idx];
            if !ghost.visible || ghost.is_returning() {
                continue;
            }
            let Some(ghost_before) = ghosts_before_move.get(idx).copied() else {
                continue;
            };
            let swapped = self.player.pos == ghost_before && player_before_move == ghost.pos;
            if swapped && !self.touch_ghost(idx) {
                return;
            }
        }

        self.collect_fruit_at(self.player.pos);
    }

    /// Returns false when the contact killed the player.
    fn touch_ghost(&mut self, idx: usize) -> bool {
        if self.is_invincible() {
            return true;
        }
        if self.ghosts[idx].state == GhostState::Scared {
            self.eat_ghost(idx);
            return true;
        }
        self.kill_player();
        false
    }

    fn eat_ghost(&mut self, idx: usize) {
        let points = self.ghost_points();
        self.add_score(points);
        self.session.ghost_multiplier =
            (self.session.ghost_multiplier + 1).min(MAX_GHOST_MULTIPLIER);
        self.session.stats.ghosts_eaten += 1;
        self.ghosts[idx].become_returning();
        self.events.push(RuntimeEvent::GhostEaten {
            ghost_id: self.ghosts[idx].id,
            points,
        });
    }

    fn kill_player(&mut self) {
        let pos = self.player.pos;
        self.session.lives -= 1;
        self.session.stats.deaths += 1;
        self.session.running = false;
        self.player.alive = false;
        self.hide_ghosts();
        self.events.push(RuntimeEvent::PlayerDied { x: pos.x, y: pos.y });

        if self.session.lives <= 0 {
            self.session.lives = 0;
            self.phase = GamePhase::GameOver;
            self.events.push(RuntimeEvent::GameOver {
                score: self.session.score,
            });
            tracing::info!(
                score = self.session.score,
                level = self.session.level,
                ticks = self.tick_counter,
                "game over"
            );
        } else {
            self.phase = GamePhase::PlayerDied;
            self.death_at = Some(pos);
            tracing::info!(x = pos.x, y = pos.y, lives = self.session.lives, "player died");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::TICK_MS;
    use crate::engine::test_support::engine_on_board;
    use crate::types::{Direction, GamePhase, GhostState, GhostType, RuntimeEvent, Vec2};

    const LANE: [&str; 3] = [
        "##########", //
        "#P       #", //
        "##########",
    ];

    const LANE_WITH_DOT: [&str; 3] = [
        "##########", //
        "#P      .#", //
        "##########",
    ];

    #[test]
    fn swapping_with_a_scared_ghost_eats_it() {
        let mut engine = engine_on_board(&LANE, &[(GhostType::Red, Vec2::new(6, 1))]);
        engine.player.pos = Vec2::new(5, 1);
        engine.ghosts[0].become_scared();
        engine.resolve_collisions(Vec2::new(5, 1), &[Vec2::new(6, 1)], 0);
        assert_eq!(engine.session().score, 0, "no contact without a move");

        engine.player.pos = Vec2::new(6, 1);
        engine.ghosts[0].pos = Vec2::new(5, 1);
        engine.resolve_collisions(Vec2::new(5, 1), &[Vec2::new(6, 1)], 0);

        assert_eq!(engine.session().score, 200);
        assert_eq!(engine.ghosts()[0].state, GhostState::Returning);
        assert_eq!(engine.session().ghost_multiplier, 2);
        assert_eq!(engine.phase(), GamePhase::Playing);
        let events = engine.build_snapshot(true).events;
        assert!(events.iter().any(|event| matches!(
            event,
            RuntimeEvent::GhostEaten {
                ghost_id: 0,
                points: 200
            }
        )));
    }

    #[test]
    fn swapping_with_a_normal_ghost_kills_the_player() {
        let mut engine = engine_on_board(&LANE, &[(GhostType::Red, Vec2::new(5, 1))]);
        engine.player.pos = Vec2::new(6, 1);
        engine.resolve_collisions(Vec2::new(5, 1), &[Vec2::new(6, 1)], 0);

        assert_eq!(engine.phase(), GamePhase::PlayerDied);
        assert_eq!(engine.death_position(), Some(Vec2::new(6, 1)));
        assert_eq!(engine.session().stats.deaths, 1);
        assert!(!engine.player().alive);
    }

    #[test]
    fn ghost_points_double_per_eat_and_cap() {
        let ghosts: Vec<(GhostType, Vec2)> = (0..5)
            .map(|_| (GhostType::Red, Vec2::new(3, 1)))
            .collect();
        let mut engine = engine_on_board(&LANE, &ghosts);
        engine.player.pos = Vec2::new(3, 1);
        engine.scare_ghosts();
        let before: Vec<Vec2> = engine.ghosts().iter().map(|ghost| ghost.pos).collect();
        engine.resolve_collisions(Vec2::new(2, 1), &before, 0);

        let points: Vec<i32> = engine
            .build_snapshot(true)
            .events
            .into_iter()
            .filter_map(|event| match event {
                RuntimeEvent::GhostEaten { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(points, vec![200, 400, 800, 1600, 1600]);
        assert_eq!(engine.session().score, 4_600);
        assert_eq!(engine.session().ghost_multiplier, 4);
        assert_eq!(engine.session().stats.ghosts_eaten, 5);
    }

    #[test]
    fn invincible_player_ignores_ghosts() {
        let mut engine = engine_on_board(&LANE_WITH_DOT, &[(GhostType::Red, Vec2::new(2, 1))]);
        engine.session.invincible_until_ms = Some(u64::MAX);
        engine.ghosts[0].frozen = true;
        engine.set_direction(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.player().pos, Vec2::new(2, 1));
        assert_eq!(engine.player().pos, engine.ghosts()[0].pos);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.session().lives, 3);
        assert_eq!(engine.ghosts()[0].state, GhostState::Normal);
    }

    #[test]
    fn frozen_scared_ghost_is_still_eaten() {
        let mut engine = engine_on_board(&LANE_WITH_DOT, &[(GhostType::Red, Vec2::new(2, 1))]);
        engine.scare_ghosts();
        engine.set_ghosts_frozen(true);
        engine.set_direction(Direction::Right);
        engine.step(TICK_MS);
        assert_eq!(engine.ghosts()[0].state, GhostState::Returning);
        assert!(engine.ghosts()[0].frozen);
        assert_eq!(engine.session().score, 200);
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn returning_ghosts_pass_through_the_player() {
        let mut engine = engine_on_board(&LANE, &[(GhostType::Red, Vec2::new(1, 1))]);
        engine.ghosts[0].become_returning();
        let before = [engine.ghosts()[0].pos];
        engine.resolve_collisions(engine.player().pos, &before, 0);
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert_eq!(engine.session().lives, 3);
    }

    #[test]
    fn hidden_ghosts_do_not_collide() {
        let mut engine = engine_on_board(&LANE, &[(GhostType::Red, Vec2::new(1, 1))]);
        engine.hide_ghosts();
        let before = [engine.ghosts()[0].pos];
        engine.resolve_collisions(engine.player().pos, &before, 0);
        assert_eq!(engine.phase(), GamePhase::Playing);
    }
}
