use super::*;

use crate::constants::{
    GHOST_POWER_UP_CHANCE, GHOST_POWER_UP_INTERVAL_MS, INVINCIBILITY_DURATION_MS,
    SCARE_DURATION_MS,
};
use crate::types::{GhostState, PowerUpType};

impl GameEngine {
    pub(super) fn update_power_ups(&mut self, dt_ms: u64, now_ms: u64) {
        self.roll_ghost_drops(now_ms);

        let mut idx = 0;
        while idx < self.power_ups.len() {
            if self.power_ups[idx].should_despawn(now_ms) {
                let power_up = self.power_ups.remove(idx);
                self.events.push(RuntimeEvent::PowerUpExpired {
                    id: power_up.id,
                    power_up_type: power_up.power_up_type,
                });
                continue;
            }
            if self.power_ups[idx].tick(dt_ms) {
                let power_up = self.power_ups.remove(idx);
                self.expire_power_up(power_up.power_up_type);
                self.events.push(RuntimeEvent::PowerUpExpired {
                    id: power_up.id,
                    power_up_type: power_up.power_up_type,
                });
                continue;
            }
            idx += 1;
        }
    }

    /// Every drop interval each calm, unfrozen ghost may leave a random
    /// power-up on its cell. The timer restarts whether or not it drops.
    fn roll_ghost_drops(&mut self, now_ms: u64) {
        for idx in 0..self.ghosts.len() {
            let ghost = &self.ghosts[idx];
            if ghost.state != GhostState::Normal || ghost.frozen || !ghost.visible {
                continue;
            }
            if now_ms.saturating_sub(ghost.last_drop_ms) < GHOST_POWER_UP_INTERVAL_MS {
                continue;
            }
            if self.rng.bool(GHOST_POWER_UP_CHANCE) {
                let power_up_type = PowerUpType::ALL[self.rng.pick_index(PowerUpType::ALL.len())];
                let id = self.next_power_up_id;
                self.next_power_up_id += 1;
                let power_up = PowerUp::new(id, self.ghosts[idx].pos, power_up_type, now_ms);
                tracing::debug!(
                    id,
                    ?power_up_type,
                    x = power_up.pos.x,
                    y = power_up.pos.y,
                    "power-up dropped"
                );
                self.events.push(RuntimeEvent::PowerUpSpawned {
                    power_up: power_up.view(),
                });
                self.power_ups.push(power_up);
            }
            self.ghosts[idx].last_drop_ms = now_ms;
        }
    }

    pub(super) fn collect_power_up_at(&mut self, pos: Vec2, now_ms: u64) {
        let Some(idx) = self
            .power_ups
            .iter()
            .position(|power_up| !power_up.active && power_up.pos == pos)
        else {
            return;
        };
        self.power_ups[idx].activate();
        let power_up_type = self.power_ups[idx].power_up_type;
        self.session.stats.power_ups_collected += 1;
        self.events.push(RuntimeEvent::PowerUpCollected {
            id: self.power_ups[idx].id,
            power_up_type,
        });
        self.apply_power_up(power_up_type, now_ms);
    }

    fn apply_power_up(&mut self, power_up_type: PowerUpType, now_ms: u64) {
        match power_up_type {
            PowerUpType::SpeedBoost => {}
            PowerUpType::GhostScare => self.start_scare(now_ms),
            PowerUpType::ExtraLife => self.session.lives += 1,
            PowerUpType::ScoreMultiplier => self.session.ghost_multiplier = 2,
            PowerUpType::GhostFreeze => self.set_ghosts_frozen(true),
            PowerUpType::Invincibility => {
                let until = now_ms + INVINCIBILITY_DURATION_MS;
                let current = self.session.invincible_until_ms.unwrap_or(0);
                self.session.invincible_until_ms = Some(current.max(until));
            }
        }
    }

    fn expire_power_up(&mut self, power_up_type: PowerUpType) {
        match power_up_type {
            PowerUpType::GhostFreeze => self.set_ghosts_frozen(false),
            PowerUpType::ScoreMultiplier if !self.is_scare_running() => {
                self.session.ghost_multiplier = 1;
            }
            _ => {}
        }
    }

    pub(super) fn start_scare(&mut self, now_ms: u64) {
        self.scare_ghosts();
        self.session.scare_until_ms = Some(now_ms + SCARE_DURATION_MS);
    }

    pub(super) fn update_timed_effects(&mut self, now_ms: u64) {
        if self
            .session
            .scare_until_ms
            .is_some_and(|until| now_ms >= until)
        {
            self.calm_scared_ghosts();
            self.session.scare_until_ms = None;
            self.session.ghost_multiplier = 1;
        }
        if self
            .session
            .invincible_until_ms
            .is_some_and(|until| now_ms >= until)
        {
            self.session.invincible_until_ms = None;
        }
    }
}
