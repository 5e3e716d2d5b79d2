use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const MOVES: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    /// Direction of a single orthogonal step, `None` for anything else.
    pub fn between(from: Vec2, to: Vec2) -> Self {
        match (to.x - from.x, to.y - from.y) {
            (1, 0) => Self::Right,
            (-1, 0) => Self::Left,
            (0, 1) => Self::Down,
            (0, -1) => Self::Up,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Wall,
    Dot,
    PowerDot,
    GhostSpawn,
    PlayerSpawn,
}

impl Cell {
    pub fn tile_char(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Dot => '.',
            Self::PowerDot => 'o',
            Self::GhostSpawn => 'G',
            Self::PlayerSpawn => 'P',
        }
    }

    pub fn from_tile_char(value: char) -> Option<Self> {
        match value {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            '.' => Some(Self::Dot),
            'o' => Some(Self::PowerDot),
            'G' => Some(Self::GhostSpawn),
            'P' => Some(Self::PlayerSpawn),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MazeType {
    Classic,
    Hybrid,
    Blocky,
    RecursiveDivision,
}

impl MazeType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "classic" => Some(Self::Classic),
            "hybrid" => Some(Self::Hybrid),
            "blocky" => Some(Self::Blocky),
            "recursive_division" => Some(Self::RecursiveDivision),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostType {
    Red,
    Pink,
    Blue,
    Orange,
}

impl GhostType {
    pub const ROTATION: [GhostType; 4] = [
        GhostType::Red,
        GhostType::Pink,
        GhostType::Blue,
        GhostType::Orange,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Normal,
    Scared,
    Dead,
    Returning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpType {
    SpeedBoost,
    GhostScare,
    ExtraLife,
    ScoreMultiplier,
    GhostFreeze,
    Invincibility,
}

impl PowerUpType {
    pub const ALL: [PowerUpType; 6] = [
        PowerUpType::SpeedBoost,
        PowerUpType::GhostScare,
        PowerUpType::ExtraLife,
        PowerUpType::ScoreMultiplier,
        PowerUpType::GhostFreeze,
        PowerUpType::Invincibility,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitType {
    Cherry,
    Strawberry,
    Apple,
    Peach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Playing,
    PlayerDied,
    GameOver,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "desiredDir")]
    pub desired_dir: Direction,
    pub alive: bool,
    pub invincible: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    #[serde(rename = "type")]
    pub ghost_type: GhostType,
    pub state: GhostState,
    pub frozen: bool,
    pub visible: bool,
    #[serde(rename = "targetX")]
    pub target_x: i32,
    #[serde(rename = "targetY")]
    pub target_y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PowerUpView {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub power_up_type: PowerUpType,
    pub active: bool,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FruitView {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub fruit_type: FruitType,
    pub points: i32,
    #[serde(rename = "spawnedAt")]
    pub spawned_at: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        x: i32,
        y: i32,
    },
    PowerDotEaten {
        x: i32,
        y: i32,
    },
    PowerUpSpawned {
        power_up: PowerUpView,
    },
    PowerUpCollected {
        id: u64,
        #[serde(rename = "powerUpType")]
        power_up_type: PowerUpType,
    },
    PowerUpExpired {
        id: u64,
        #[serde(rename = "powerUpType")]
        power_up_type: PowerUpType,
    },
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
        points: i32,
    },
    GhostRespawned {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    PlayerDied {
        x: i32,
        y: i32,
    },
    PlayerRespawned {
        x: i32,
        y: i32,
    },
    FruitSpawned {
        fruit: FruitView,
    },
    FruitCollected {
        #[serde(rename = "fruitType")]
        fruit_type: FruitType,
        points: i32,
    },
    FruitExpired {
        #[serde(rename = "fruitType")]
        fruit_type: FruitType,
    },
    LevelCompleted {
        level: i32,
    },
    GameOver {
        score: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub rows: i32,
    pub cols: i32,
    pub tiles: Vec<String>,
    pub score: i32,
    pub lives: i32,
    pub level: i32,
    pub running: bool,
    pub phase: GamePhase,
    #[serde(rename = "ghostMultiplier")]
    pub ghost_multiplier: usize,
    #[serde(rename = "scareRemainingMs")]
    pub scare_remaining_ms: u64,
    #[serde(rename = "remainingDots")]
    pub remaining_dots: i32,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    #[serde(rename = "powerUps")]
    pub power_ups: Vec<PowerUpView>,
    pub fruit: Option<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    pub rows: i32,
    pub cols: i32,
    pub score: i32,
    pub level: i32,
    pub lives: i32,
    pub ticks: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "dotsEaten")]
    pub dots_eaten: i32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: i32,
    #[serde(rename = "fruitsEaten")]
    pub fruits_eaten: i32,
    #[serde(rename = "powerUpsCollected")]
    pub power_ups_collected: i32,
    pub deaths: i32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HighScoreEntry {
    pub rank: usize,
    pub name: String,
    pub score: i32,
    pub level: i32,
    pub date: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HighScoreResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<HighScoreEntry>,
}
