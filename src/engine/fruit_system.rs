use super::*;

use crate::constants::FRUIT_RULES;

impl GameEngine {
    /// Spawns the next fruit in the cycle once the score reaches its
    /// threshold, and drops a fruit that has been left too long.
    pub(super) fn update_fruit(&mut self, now_ms: u64) {
        let rule = FRUIT_RULES[self.session.fruit_cursor % FRUIT_RULES.len()];
        if self.fruit.is_none() && self.session.score >= rule.score_threshold {
            let pos = self.board.random_reachable_position(&mut self.rng);
            let fruit = Fruit {
                pos,
                fruit_type: rule.fruit_type,
                points: rule.points,
                spawned_at_ms: now_ms,
            };
            self.events.push(RuntimeEvent::FruitSpawned { fruit: fruit.view() });
            self.fruit = Some(fruit);
            self.session.fruit_cursor = (self.session.fruit_cursor + 1) % FRUIT_RULES.len();
        }

        if let Some(fruit) = self.fruit.take() {
            if fruit.should_despawn(now_ms) {
                self.events.push(RuntimeEvent::FruitExpired {
                    fruit_type: fruit.fruit_type,
                });
            } else {
                self.fruit = Some(fruit);
            }
        }
    }

    pub(super) fn collect_fruit_at(&mut self, pos: Vec2) {
        if self.fruit.as_ref().map(|fruit| fruit.pos) != Some(pos) {
            return;
        }
        let Some(fruit) = self.fruit.take() else {
            return;
        };
        self.add_score(fruit.points);
        self.session.stats.fruits_eaten += 1;
        self.events.push(RuntimeEvent::FruitCollected {
            fruit_type: fruit.fruit_type,
            points: fruit.points,
        });
    }
}
