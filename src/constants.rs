use crate::types::FruitType;

pub const TICK_MS: u64 = 100;

pub const MIN_BOARD_SIDE: i32 = 10;
pub const MAX_BOARD_SIDE: i32 = 100;
pub const DEFAULT_BOARD_SIDE: i32 = 20;

pub const STARTING_LIVES: i32 = 3;

pub const DOT_SCORE: i32 = 10;
pub const POWER_DOT_SCORE: i32 = 50;
pub const GHOST_SCORES: [i32; 4] = [200, 400, 800, 1600];
pub const MAX_GHOST_MULTIPLIER: usize = GHOST_SCORES.len();

pub const PLAYER_BASE_SPEED: f32 = 1.0;
pub const GHOST_BASE_SPEED: f32 = 1.0;
pub const GHOST_SCARED_SPEED: f32 = 0.5;

pub const SCARE_DURATION_MS: u64 = 7_000;
pub const INVINCIBILITY_DURATION_MS: u64 = 7_000;
pub const SPEED_BOOST_DURATION_MS: i64 = 5_000;
pub const SCORE_MULTIPLIER_DURATION_MS: i64 = 10_000;
pub const GHOST_FREEZE_DURATION_MS: i64 = 3_000;

pub const GHOST_POWER_UP_INTERVAL_MS: u64 = 5_000;
pub const GHOST_POWER_UP_CHANCE: f32 = 0.25;
pub const POWER_UP_DESPAWN_MS: u64 = 10_000;

pub const FRUIT_DESPAWN_MS: u64 = 10_000;

pub const PINK_LOOKAHEAD: i32 = 4;
pub const BLUE_LOOKAHEAD: i32 = 2;
pub const ORANGE_CHASE_DISTANCE: i32 = 8;
pub const ORANGE_SCATTER_RANGE: i32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FruitRule {
    pub score_threshold: i32,
    pub fruit_type: FruitType,
    pub points: i32,
}

pub const FRUIT_RULES: [FruitRule; 4] = [
    FruitRule {
        score_threshold: 1_000,
        fruit_type: FruitType::Cherry,
        points: 100,
    },
    FruitRule {
        score_threshold: 3_000,
        fruit_type: FruitType::Strawberry,
        points: 300,
    },
    FruitRule {
        score_threshold: 5_000,
        fruit_type: FruitType::Apple,
        points: 500,
    },
    FruitRule {
        score_threshold: 7_000,
        fruit_type: FruitType::Peach,
        points: 700,
    },
];

pub fn get_ghost_count(rows: i32, cols: i32) -> usize {
    if rows <= 10 || cols <= 10 {
        return 1;
    }
    if rows <= 20 || cols <= 20 {
        return 2;
    }
    if rows <= 30 || cols <= 30 {
        return 3;
    }
    4
}

/// Ghost house footprint as `(height, width)`.
pub fn get_ghost_base_size(rows: i32, cols: i32) -> (i32, i32) {
    if rows <= 20 && cols <= 20 {
        (3, 3)
    } else {
        (3, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_count_grows_with_the_smaller_side() {
        assert_eq!(get_ghost_count(10, 50), 1);
        assert_eq!(get_ghost_count(20, 20), 2);
        assert_eq!(get_ghost_count(50, 25), 3);
        assert_eq!(get_ghost_count(31, 100), 4);
    }

    #[test]
    fn base_widens_past_twenty_cells() {
        assert_eq!(get_ghost_base_size(20, 20), (3, 3));
        assert_eq!(get_ghost_base_size(20, 21), (3, 5));
        assert_eq!(get_ghost_base_size(60, 60), (3, 5));
    }

    #[test]
    fn fruit_rules_are_ordered_by_threshold() {
        assert!(FRUIT_RULES
            .windows(2)
            .all(|pair| pair[0].score_threshold < pair[1].score_threshold));
    }
}
