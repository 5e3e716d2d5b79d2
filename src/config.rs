use crate::constants::{DEFAULT_BOARD_SIDE, MAX_BOARD_SIDE, MIN_BOARD_SIDE};
use crate::error::ConfigError;
use crate::types::MazeType;

/// Parameters for one game. Validated before any board is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameOptions {
    pub rows: i32,
    pub cols: i32,
    pub seed: u64,
    pub maze_type: MazeType,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_BOARD_SIDE,
            cols: DEFAULT_BOARD_SIDE,
            seed: 0,
            maze_type: MazeType::Hybrid,
        }
    }
}

impl GameOptions {
    pub fn new(rows: i32, cols: i32, seed: u64) -> Self {
        Self {
            rows,
            cols,
            seed,
            ..Self::default()
        }
    }

    pub fn with_maze_type(mut self, maze_type: MazeType) -> Self {
        self.maze_type = maze_type;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < MIN_BOARD_SIDE || self.cols < MIN_BOARD_SIDE {
            return Err(ConfigError::BoardTooSmall {
                rows: self.rows,
                cols: self.cols,
                min: MIN_BOARD_SIDE,
            });
        }
        if self.rows > MAX_BOARD_SIDE || self.cols > MAX_BOARD_SIDE {
            return Err(ConfigError::BoardTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: MAX_BOARD_SIDE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_inclusive_side_range() {
        assert!(GameOptions::new(10, 10, 1).validate().is_ok());
        assert!(GameOptions::new(100, 100, 1).validate().is_ok());
        assert!(GameOptions::new(10, 100, 1).validate().is_ok());
    }

    #[test]
    fn rejects_sides_outside_the_range() {
        assert_eq!(
            GameOptions::new(9, 20, 1).validate(),
            Err(ConfigError::BoardTooSmall {
                rows: 9,
                cols: 20,
                min: MIN_BOARD_SIDE
            })
        );
        assert!(matches!(
            GameOptions::new(20, 101, 1).validate(),
            Err(ConfigError::BoardTooLarge { .. })
        ));
    }

    #[test]
    fn default_is_a_valid_hybrid_board() {
        let options = GameOptions::default();
        assert_eq!(options.maze_type, MazeType::Hybrid);
        assert!(options.validate().is_ok());
    }
}
