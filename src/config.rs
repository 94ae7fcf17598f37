//! Game tuning and bridge configuration
//!
//! One struct per game, mirroring the constants each game shipped with.
//! Every field has a default so a partial JSON document only overrides what
//! it names. Persisted in LocalStorage on the web build.

use serde::{Deserialize, Serialize};

use crate::consts::ms_to_ticks;
use crate::error::HubError;

/// Bubble Trouble tuning (per-tick units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub gravity: f32,
    pub harpoon_speed: f32,
    pub initial_lives: u8,
    pub max_level: u32,
    pub player_width: f32,
    pub player_height: f32,
    pub player_speed: f32,
    pub min_bubble_radius: f32,
    pub initial_bubble_radius: f32,
    /// Floor rebound speed; slower bounces are bumped up to this
    pub min_rebound_speed: f32,
    pub spawn_y: f32,
    pub spawn_x_offset: f32,
    pub spawn_x_spacing: f32,
    pub respawn_delay_ms: u32,
    pub level_clear_delay_ms: u32,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            gravity: 0.2,
            harpoon_speed: 6.0,
            initial_lives: 3,
            max_level: 10,
            player_width: 40.0,
            player_height: 40.0,
            player_speed: 5.0,
            min_bubble_radius: 10.0,
            initial_bubble_radius: 40.0,
            min_rebound_speed: 4.0,
            spawn_y: 200.0,
            spawn_x_offset: 100.0,
            spawn_x_spacing: 150.0,
            respawn_delay_ms: 1000,
            level_clear_delay_ms: 1000,
        }
    }
}

impl BubbleConfig {
    pub fn respawn_delay_ticks(&self) -> u32 {
        ms_to_ticks(self.respawn_delay_ms)
    }

    pub fn level_clear_delay_ticks(&self) -> u32 {
        ms_to_ticks(self.level_clear_delay_ms)
    }
}

/// How new pipes are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PipeSpawn {
    /// Spawn at the right edge once the newest pipe has moved this far in
    Spacing { distance: f32 },
    /// Spawn every N frames, starting on frame 0
    Interval { frames: u32 },
}

/// Flappy Bird tuning (per-tick units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub bird_width: f32,
    pub bird_height: f32,
    pub bird_x: f32,
    pub bird_start_y: f32,
    pub gravity: f32,
    pub jump_strength: f32,
    pub max_velocity: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    pub pipe_speed: f32,
    pub min_pipe_height: f32,
    pub ground_height: f32,
    pub scroll_speed: f32,
    pub spawn: PipeSpawn,
}

impl Default for FlappyConfig {
    fn default() -> Self {
        Self {
            canvas_width: 400.0,
            canvas_height: 600.0,
            bird_width: 34.0,
            bird_height: 24.0,
            bird_x: 50.0,
            bird_start_y: 250.0,
            gravity: 0.5,
            jump_strength: -8.0,
            max_velocity: 10.0,
            pipe_width: 52.0,
            pipe_gap: 150.0,
            pipe_speed: 2.0,
            min_pipe_height: 50.0,
            ground_height: 100.0,
            scroll_speed: 2.0,
            spawn: PipeSpawn::Spacing { distance: 200.0 },
        }
    }
}

impl FlappyConfig {
    /// Top edge of the ground strip
    pub fn ground_y(&self) -> f32 {
        self.canvas_height - self.ground_height
    }

    /// Tallest top pipe that still leaves the whole gap above the ground
    pub fn max_pipe_height(&self) -> f32 {
        self.canvas_height - self.ground_height - self.pipe_gap - self.min_pipe_height
    }
}

/// Impossible runner tuning (per-second units, integrated with `SIM_DT`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Distance from the bottom edge to the ground line
    pub ground_offset: f32,
    pub player_x: f32,
    pub player_size: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub base_speed: f32,
    pub speed_ramp: f32,
    pub spawn_lead: f32,
    pub despawn_margin: f32,
    pub first_spawn_delay: f32,
    /// Elapsed seconds at which each level is reached (index = level)
    pub level_thresholds: Vec<f32>,
    pub score_rate: f32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            ground_offset: 80.0,
            player_x: 80.0,
            player_size: 28.0,
            gravity: 1400.0,
            jump_velocity: -520.0,
            base_speed: 360.0,
            speed_ramp: 8.0,
            spawn_lead: 40.0,
            despawn_margin: 50.0,
            first_spawn_delay: 0.8,
            level_thresholds: vec![0.0, 10.0, 25.0, 45.0, 70.0, 100.0],
            score_rate: 10.0,
        }
    }
}

impl RunnerConfig {
    pub fn ground_y(&self) -> f32 {
        self.canvas_height - self.ground_offset
    }

    pub fn max_level(&self) -> u32 {
        self.level_thresholds.len().saturating_sub(1) as u32
    }
}

/// Token-gate bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// When false, play starts without asking the host (demo variant)
    pub enabled: bool,
    /// Origins whose messages are accepted
    pub allowed_origins: Vec<String>,
    /// Origin passed to postMessage when talking to the host
    pub target_origin: String,
    /// Give up on an unanswered play request after this long
    pub approval_timeout_ms: u32,
    /// Tokens debited per play
    pub play_cost: i64,
    /// Tokens credited per level passed
    pub level_reward: i64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["http://localhost:9000".to_string()],
            target_origin: "http://localhost:9000".to_string(),
            approval_timeout_ms: 10_000,
            play_cost: 10,
            level_reward: 5,
        }
    }
}

impl GateConfig {
    pub fn approval_timeout_ticks(&self) -> u32 {
        ms_to_ticks(self.approval_timeout_ms)
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

/// Complete hub configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub bubble: BubbleConfig,
    pub flappy: FlappyConfig,
    pub runner: RunnerConfig,
    pub gate: GateConfig,
}

impl HubConfig {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "gamehub_config";

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, HubError> {
        let config: Self = serde_json::from_str(json).map_err(|e| HubError::Parse {
            what: "config",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the games cannot run with
    pub fn validate(&self) -> Result<(), HubError> {
        let b = &self.bubble;
        if b.min_bubble_radius <= 0.0 {
            return Err(invalid("bubble.min_bubble_radius", "must be positive"));
        }
        if b.initial_bubble_radius < b.min_bubble_radius {
            return Err(invalid(
                "bubble.initial_bubble_radius",
                "must not be below min_bubble_radius",
            ));
        }
        if b.max_level == 0 {
            return Err(invalid("bubble.max_level", "must be at least 1"));
        }
        if b.initial_lives == 0 {
            return Err(invalid("bubble.initial_lives", "must be at least 1"));
        }

        let f = &self.flappy;
        if f.max_pipe_height() <= f.min_pipe_height {
            return Err(invalid(
                "flappy.pipe_gap",
                "gap and ground leave no room for pipes",
            ));
        }
        if f.pipe_speed <= 0.0 {
            return Err(invalid("flappy.pipe_speed", "must be positive"));
        }
        match f.spawn {
            PipeSpawn::Spacing { distance } if distance <= 0.0 => {
                return Err(invalid("flappy.spawn.distance", "must be positive"));
            }
            PipeSpawn::Interval { frames: 0 } => {
                return Err(invalid("flappy.spawn.frames", "must be at least 1"));
            }
            _ => {}
        }

        let r = &self.runner;
        if r.level_thresholds.is_empty() {
            return Err(invalid("runner.level_thresholds", "must not be empty"));
        }
        if r.level_thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("runner.level_thresholds", "must be increasing"));
        }
        if r.base_speed <= 0.0 {
            return Err(invalid("runner.base_speed", "must be positive"));
        }

        if self.gate.play_cost < 0 || self.gate.level_reward < 0 {
            return Err(invalid("gate", "cost and reward must not be negative"));
        }
        Ok(())
    }

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

fn invalid(field: &'static str, reason: &str) -> HubError {
    HubError::Config {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(HubConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HubConfig::from_json(r#"{ "bubble": { "max_level": 3 } }"#).unwrap();
        assert_eq!(config.bubble.max_level, 3);
        assert_eq!(config.bubble.initial_bubble_radius, 40.0);
        assert_eq!(config.flappy, FlappyConfig::default());
    }

    #[test]
    fn test_spawn_policy_json() {
        let config = HubConfig::from_json(
            r#"{ "flappy": { "spawn": { "mode": "interval", "frames": 150 } } }"#,
        )
        .unwrap();
        assert_eq!(config.flappy.spawn, PipeSpawn::Interval { frames: 150 });
    }

    #[test]
    fn test_max_pipe_height_leaves_gap() {
        let f = FlappyConfig::default();
        // 600 - 100 - 150 - 50
        assert_eq!(f.max_pipe_height(), 300.0);
        assert!(f.max_pipe_height() + f.pipe_gap <= f.ground_y());
    }

    #[test]
    fn test_rejects_impossible_pipes() {
        let mut config = HubConfig::default();
        config.flappy.pipe_gap = 500.0;
        assert!(matches!(
            config.validate(),
            Err(HubError::Config { field: "flappy.pipe_gap", .. })
        ));
    }

    #[test]
    fn test_rejects_unsorted_thresholds() {
        let mut config = HubConfig::default();
        config.runner.level_thresholds = vec![0.0, 10.0, 5.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            HubConfig::from_json("{ nope"),
            Err(HubError::Parse { what: "config", .. })
        ));
    }

    #[test]
    fn test_delays_convert_to_ticks() {
        let b = BubbleConfig::default();
        assert_eq!(b.respawn_delay_ticks(), 60);
        assert_eq!(b.level_clear_delay_ticks(), 60);
        assert_eq!(GateConfig::default().approval_timeout_ticks(), 600);
    }

    #[test]
    fn test_origin_allow_list() {
        let gate = GateConfig::default();
        assert!(gate.origin_allowed("http://localhost:9000"));
        assert!(!gate.origin_allowed("https://evil.example"));
    }
}
