//! Run bookkeeping and the game-phase state machine
//!
//! `Start -> Playing -> {Respawning, LevelCleared} -> Playing | GameOver`.
//! Delayed transitions are held in the phase itself as a tick countdown, so
//! a pending respawn or level clear doubles as the guard against starting a
//! second one.

use serde::{Deserialize, Serialize};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a run to begin
    Start,
    /// Active gameplay
    Playing,
    /// Player was hit; the level re-initialises when the countdown ends
    Respawning { ticks_left: u32 },
    /// Obstacle set emptied; advances when the countdown ends
    LevelCleared { ticks_left: u32 },
    /// Run ended. `victory` is set when the final level was cleared.
    GameOver { victory: bool },
}

impl GamePhase {
    /// A run is in progress (including its timed intermissions)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            GamePhase::Playing | GamePhase::Respawning { .. } | GamePhase::LevelCleared { .. }
        )
    }

    pub fn is_over(&self) -> bool {
        matches!(self, GamePhase::GameOver { .. })
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Points were added to the run score
    Scored { points: u64, total: u64 },
    /// Player lost a life
    PlayerHit { lives_left: u8 },
    /// A level was completed
    LevelPassed { level: u32 },
    /// Run ended (emitted exactly once per run)
    GameOver { score: u64, level: u32, victory: bool },
}

/// What a finished countdown asks the game to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    /// Re-initialise the current level after a death
    Respawn { level: u32 },
    /// Set up the next level
    NextLevel { level: u32 },
    /// The final level was cleared; the run is over
    Victory,
}

/// Score, level and lives for one run plus the phase controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    phase: GamePhase,
    pub score: u64,
    pub level: u32,
    pub lives: u8,
    initial_lives: u8,
    min_level: u32,
    max_level: u32,
    start_level: u32,
}

impl RunState {
    pub fn new(initial_lives: u8, min_level: u32, max_level: u32) -> Self {
        Self {
            phase: GamePhase::Start,
            score: 0,
            level: min_level,
            lives: initial_lives,
            initial_lives,
            min_level,
            max_level: max_level.max(min_level),
            start_level: min_level,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    pub fn is_respawning(&self) -> bool {
        matches!(self.phase, GamePhase::Respawning { .. })
    }

    pub fn level_cleared(&self) -> bool {
        matches!(self.phase, GamePhase::LevelCleared { .. })
    }

    /// Choose the level the next run starts on. Ignored mid-run.
    pub fn select_level(&mut self, level: u32) -> u32 {
        if self.phase.is_active() {
            log::debug!("Level select ignored during a run");
            return self.start_level;
        }
        self.start_level = level.clamp(self.min_level, self.max_level);
        self.level = self.start_level;
        self.start_level
    }

    /// Fresh run: score cleared, lives restored, phase `Playing`
    pub fn begin_run(&mut self) {
        self.score = 0;
        self.level = self.start_level;
        self.lives = self.initial_lives;
        self.phase = GamePhase::Playing;
    }

    /// Back to the idle `Start` phase
    pub fn reset(&mut self) {
        self.score = 0;
        self.level = self.start_level;
        self.lives = self.initial_lives;
        self.phase = GamePhase::Start;
    }

    pub fn add_score(&mut self, points: u64, events: &mut Vec<GameEvent>) {
        if points == 0 {
            return;
        }
        self.score += points;
        events.push(GameEvent::Scored {
            points,
            total: self.score,
        });
    }

    /// Player collided with an obstacle. Only honoured while `Playing`.
    ///
    /// Returns true if the hit was taken (the caller should clear the field).
    pub fn player_hit(&mut self, respawn_ticks: u32, events: &mut Vec<GameEvent>) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        events.push(GameEvent::PlayerHit {
            lives_left: self.lives,
        });
        if self.lives > 0 {
            log::info!("Player hit on level {}, {} lives left", self.level, self.lives);
            self.phase = GamePhase::Respawning {
                ticks_left: respawn_ticks,
            };
        } else {
            self.finish(false, events);
        }
        true
    }

    /// Obstacle set emptied. Only honoured while `Playing`.
    pub fn level_complete(&mut self, clear_ticks: u32) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        log::info!("Level {} cleared", self.level);
        self.phase = GamePhase::LevelCleared {
            ticks_left: clear_ticks,
        };
        true
    }

    /// End the run now
    pub fn finish(&mut self, victory: bool, events: &mut Vec<GameEvent>) {
        if self.phase.is_over() {
            return;
        }
        log::info!(
            "Game over (score {}, level {}, victory {})",
            self.score,
            self.level,
            victory
        );
        self.phase = GamePhase::GameOver { victory };
        events.push(GameEvent::GameOver {
            score: self.score,
            level: self.level,
            victory,
        });
    }

    /// Count down a pending delay by one tick
    pub fn advance(&mut self, events: &mut Vec<GameEvent>) -> Option<Due> {
        match self.phase {
            GamePhase::Respawning { ticks_left } if ticks_left > 1 => {
                self.phase = GamePhase::Respawning {
                    ticks_left: ticks_left - 1,
                };
                None
            }
            GamePhase::Respawning { .. } => {
                self.phase = GamePhase::Playing;
                Some(Due::Respawn { level: self.level })
            }
            GamePhase::LevelCleared { ticks_left } if ticks_left > 1 => {
                self.phase = GamePhase::LevelCleared {
                    ticks_left: ticks_left - 1,
                };
                None
            }
            GamePhase::LevelCleared { .. } => {
                let cleared = self.level;
                events.push(GameEvent::LevelPassed { level: cleared });
                if cleared >= self.max_level {
                    self.finish(true, events);
                    Some(Due::Victory)
                } else {
                    self.level = cleared + 1;
                    self.phase = GamePhase::Playing;
                    Some(Due::NextLevel { level: self.level })
                }
            }
            _ => None,
        }
    }

    /// Jump straight to a level mid-run (threshold-driven games)
    pub fn reach_level(&mut self, level: u32, events: &mut Vec<GameEvent>) {
        if level <= self.level {
            return;
        }
        self.level = level;
        events.push(GameEvent::LevelPassed { level });
    }
}
