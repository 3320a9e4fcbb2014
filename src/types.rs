use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
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

    pub fn vector(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::None => (0.0, 0.0),
        }
    }

    pub fn tile_offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    // Sprite rotation for a facing: right=0, down=90, left=180, up=270.
    pub fn rotation_degrees(self) -> f32 {
        match self {
            Self::Right | Self::None => 0.0,
            Self::Down => 90.0,
            Self::Left => 180.0,
            Self::Up => 270.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Wall,
    Empty,
    Pickup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Direct,
    Ambusher,
    Flanker,
    Opportunist,
}

impl Archetype {
    pub const ROSTER: [Archetype; 4] = [
        Archetype::Direct,
        Archetype::Ambusher,
        Archetype::Flanker,
        Archetype::Opportunist,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const TIERS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menu,
    Playing,
    Lost,
    AwaitingNameEntry,
    Won,
    HighScoreBrowse,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionCommand {
    Start,
    SelectDifficulty(Difficulty),
    Restart,
    ReturnToMenu,
    BrowseHighScores,
    ConfirmName,
    AppendChar(char),
    Backspace,
}

// Per-tick input resolved by the presentation layer: the held movement
// direction (None when no key is active), edge-event commands, and the
// wall-clock time elapsed since the previous tick.
#[derive(Clone, Debug)]
pub struct TickInput {
    pub dir: Direction,
    pub commands: Vec<SessionCommand>,
    pub dt_ms: u64,
}

impl TickInput {
    pub fn idle(dt_ms: u64) -> Self {
        Self {
            dir: Direction::None,
            commands: Vec::new(),
            dt_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "mouthOpen")]
    pub mouth_open: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdversaryView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "type")]
    pub archetype: Archetype,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PickupEaten {
        x: i32,
        y: i32,
    },
    PhaseChanged {
        phase: Phase,
    },
    ScoreCommitted {
        name: String,
        score: i32,
        tier: Difficulty,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub score: i32,
    pub difficulty: Difficulty,
    #[serde(rename = "activeAdversaries")]
    pub active_adversaries: usize,
    pub player: PlayerView,
    pub adversaries: Vec<AdversaryView>,
    #[serde(rename = "nameBuffer")]
    pub name_buffer: String,
    #[serde(rename = "winTimeLeftMs")]
    pub win_time_left_ms: Option<u64>,
    #[serde(rename = "browsedTier")]
    pub browsed_tier: Difficulty,
    #[serde(rename = "highScores")]
    pub high_scores: Vec<ScoreEntry>,
    pub events: Vec<RuntimeEvent>,
}
