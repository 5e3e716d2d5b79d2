use std::fmt;
use std::io;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    BoardTooSmall { rows: i32, cols: i32, min: i32 },
    BoardTooLarge { rows: i32, cols: i32, max: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoardTooSmall { rows, cols, min } => {
                write!(f, "board {rows}x{cols} is too small (each side must be at least {min})")
            }
            Self::BoardTooLarge { rows, cols, max } => {
                write!(f, "board {rows}x{cols} is too large (each side must be at most {max})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum HighScoreError {
    EmptyName,
    NameTaken { name: String },
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for HighScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "player name is empty"),
            Self::NameTaken { name } => write!(f, "name already on the board: {name}"),
            Self::Io(err) => write!(f, "high score file error: {err}"),
            Self::Serialize(err) => write!(f, "high score encoding error: {err}"),
        }
    }
}

impl std::error::Error for HighScoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HighScoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for HighScoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err)
    }
}
