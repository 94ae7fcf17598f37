//! Game Hub arcade - canvas mini-games behind a token-gated play bridge
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state) for each game
//! - `renderer`: Canvas 2D render step
//! - `bridge`: Token-gate message protocol (game side and host side)
//! - `cabinet`: Per-mount host that drives one game instance
//! - `platform`: Browser bindings (storage, canvas, postMessage, fetch)
//! - `persistence`: Key-value storage abstraction
//! - `config`: Data-driven game balance

pub mod bridge;
pub mod cabinet;
pub mod config;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use cabinet::{Cabinet, ScoreReport, ScoreSink};
pub use config::HubConfig;
pub use error::{HubError, LedgerError};
pub use highscores::HighScore;

/// Game configuration constants
pub mod consts {
    /// Simulation tick rate. Bubble and flappy constants are per tick at this rate.
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame gap fed to the accumulator (tab switches, debugger stops)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Convert a millisecond delay to whole ticks (rounded to nearest)
    #[inline]
    pub fn ms_to_ticks(ms: u32) -> u32 {
        ((ms as u64 * TICK_RATE as u64 + 500) / 1000) as u32
    }
}

/// Identifies one of the hosted games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    BubbleTrouble,
    FlappyBird,
    Impossible,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::BubbleTrouble => "bubble-trouble",
            GameKind::FlappyBird => "flappy-bird",
            GameKind::Impossible => "impossible",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bubble-trouble" | "bubble" => Some(GameKind::BubbleTrouble),
            "flappy-bird" | "flappy" => Some(GameKind::FlappyBird),
            "impossible" | "runner" => Some(GameKind::Impossible),
            _ => None,
        }
    }

    /// Backend game id used for score submission
    pub fn backend_id(&self) -> u32 {
        match self {
            GameKind::BubbleTrouble => 1,
            GameKind::FlappyBird => 2,
            GameKind::Impossible => 3,
        }
    }

    /// LocalStorage key holding this game's best score
    pub fn high_score_key(&self) -> &'static str {
        match self {
            GameKind::BubbleTrouble => "bubbleTroubleHighScore",
            GameKind::FlappyBird => "flappyBirdHighScore",
            GameKind::Impossible => "impossibleHighScore",
        }
    }
}
