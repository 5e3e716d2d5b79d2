use crate::constants::{
    BLUE_LOOKAHEAD, FRUIT_DESPAWN_MS, GHOST_BASE_SPEED, GHOST_FREEZE_DURATION_MS,
    GHOST_SCARED_SPEED, INVINCIBILITY_DURATION_MS, ORANGE_CHASE_DISTANCE, ORANGE_SCATTER_RANGE,
    PINK_LOOKAHEAD,
    PLAYER_BASE_SPEED, POWER_UP_DESPAWN_MS, SCARE_DURATION_MS, SCORE_MULTIPLIER_DURATION_MS,
    SPEED_BOOST_DURATION_MS,
};
use crate::rng::Rng;
use crate::types::{
    Direction, FruitType, FruitView, GhostState, GhostType, GhostView, PlayerView, PowerUpType,
    PowerUpView, Vec2,
};

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub dir: Direction,
    pub desired_dir: Direction,
    pub speed: f32,
    pub alive: bool,
}

impl Player {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            dir: Direction::Right,
            desired_dir: Direction::Right,
            speed: PLAYER_BASE_SPEED,
            alive: true,
        }
    }

    pub fn steps_per_tick(&self) -> i32 {
        self.speed.round() as i32
    }

    pub fn view(&self, invincible: bool) -> PlayerView {
        PlayerView {
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            desired_dir: self.desired_dir,
            alive: self.alive,
            invincible,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: usize,
    pub pos: Vec2,
    pub spawn: Vec2,
    pub dir: Direction,
    pub speed: f32,
    pub ghost_type: GhostType,
    pub state: GhostState,
    pub frozen: bool,
    pub visible: bool,
    pub target: Vec2,
    pub move_buffer: f32,
    pub last_drop_ms: u64,
}

impl Ghost {
    pub fn new(id: usize, ghost_type: GhostType, spawn: Vec2) -> Self {
        Self {
            id,
            pos: spawn,
            spawn,
            dir: Direction::Right,
            speed: GHOST_BASE_SPEED,
            ghost_type,
            state: GhostState::Normal,
            frozen: false,
            visible: true,
            target: spawn,
            move_buffer: 0.0,
            last_drop_ms: 0,
        }
    }

    pub fn is_returning(&self) -> bool {
        self.state == GhostState::Returning
    }

    pub fn become_scared(&mut self) {
        self.state = GhostState::Scared;
        self.speed = GHOST_SCARED_SPEED;
    }

    pub fn become_normal(&mut self) {
        self.state = GhostState::Normal;
        self.speed = GHOST_BASE_SPEED;
    }

    pub fn become_returning(&mut self) {
        self.state = GhostState::Returning;
        self.speed = GHOST_BASE_SPEED;
        self.move_buffer = 0.0;
    }

    /// Puts the ghost back at `pos` as a fresh Normal ghost. `pos` also
    /// becomes its respawn anchor.
    pub fn respawn(&mut self, pos: Vec2) {
        self.pos = pos;
        self.spawn = pos;
        self.dir = Direction::Right;
        self.become_normal();
        self.frozen = false;
        self.visible = true;
        self.move_buffer = 0.0;
    }

    /// Whole steps earned this tick. Frozen and dead ghosts earn nothing and
    /// keep their partial progress.
    pub fn take_steps(&mut self) -> u32 {
        if self.frozen || self.state == GhostState::Dead {
            return 0;
        }
        self.move_buffer += self.speed;
        let steps = self.move_buffer.floor().max(0.0);
        self.move_buffer -= steps;
        steps as u32
    }

    /// Pink and Blue aim a fixed distance to the right of the player, whatever
    /// way the player faces. A close Orange picks a random cell in the 20x20
    /// corner of the board.
    pub fn update_target(&mut self, player_pos: Vec2, rng: &mut Rng) {
        self.target = match self.ghost_type {
            GhostType::Red => player_pos,
            GhostType::Pink => Vec2::new(player_pos.x + PINK_LOOKAHEAD, player_pos.y),
            GhostType::Blue => Vec2::new(player_pos.x + BLUE_LOOKAHEAD, player_pos.y),
            GhostType::Orange => {
                if self.pos.manhattan(player_pos) > ORANGE_CHASE_DISTANCE {
                    player_pos
                } else {
                    Vec2::new(
                        rng.int(0, ORANGE_SCATTER_RANGE - 1),
                        rng.int(0, ORANGE_SCATTER_RANGE - 1),
                    )
                }
            }
        };
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            ghost_type: self.ghost_type,
            state: self.state,
            frozen: self.frozen,
            visible: self.visible,
            target_x: self.target.x,
            target_y: self.target.y,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub id: u64,
    pub pos: Vec2,
    pub power_up_type: PowerUpType,
    pub active: bool,
    pub remaining_ms: i64,
    pub spawned_at_ms: u64,
}

impl PowerUp {
    pub fn new(id: u64, pos: Vec2, power_up_type: PowerUpType, now_ms: u64) -> Self {
        Self {
            id,
            pos,
            power_up_type,
            active: false,
            remaining_ms: 0,
            spawned_at_ms: now_ms,
        }
    }

    pub fn duration_ms(power_up_type: PowerUpType) -> i64 {
        match power_up_type {
            PowerUpType::SpeedBoost => SPEED_BOOST_DURATION_MS,
            PowerUpType::GhostScare => SCARE_DURATION_MS as i64,
            PowerUpType::ExtraLife => 0,
            PowerUpType::ScoreMultiplier => SCORE_MULTIPLIER_DURATION_MS,
            PowerUpType::GhostFreeze => GHOST_FREEZE_DURATION_MS,
            PowerUpType::Invincibility => INVINCIBILITY_DURATION_MS as i64,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.remaining_ms = Self::duration_ms(self.power_up_type);
    }

    /// Counts an active effect down. Returns true once it has run out.
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_ms -= dt_ms as i64;
        if self.remaining_ms <= 0 {
            self.active = false;
            self.remaining_ms = 0;
            return true;
        }
        false
    }

    pub fn should_despawn(&self, now_ms: u64) -> bool {
        !self.active && now_ms.saturating_sub(self.spawned_at_ms) > POWER_UP_DESPAWN_MS
    }

    pub fn view(&self) -> PowerUpView {
        PowerUpView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            power_up_type: self.power_up_type,
            active: self.active,
            remaining_ms: self.remaining_ms,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fruit {
    pub pos: Vec2,
    pub fruit_type: FruitType,
    pub points: i32,
    pub spawned_at_ms: u64,
}

impl Fruit {
    pub fn should_despawn(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.spawned_at_ms) > FRUIT_DESPAWN_MS
    }

    pub fn view(&self) -> FruitView {
        FruitView {
            x: self.pos.x,
            y: self.pos.y,
            fruit_type: self.fruit_type,
            points: self.points,
            spawned_at: self.spawned_at_ms,
        }
    }
}
