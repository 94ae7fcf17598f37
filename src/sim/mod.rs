//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (`consts::SIM_DT` per tick)
//! - Seeded RNG only
//! - Reverse-index iteration wherever entities are removed mid-loop
//! - No rendering or platform dependencies beyond the `Canvas` seam

pub mod bubble;
pub mod collision;
pub mod flappy;
pub mod runner;
pub mod state;

pub use bubble::{Bubble, BubbleGame, Harpoon};
pub use collision::{Aabb, bird_hits_pipe, circle_hits_player, harpoon_hits_bubble, rects_touch};
pub use flappy::{Bird, FlappyGame, Pipe};
pub use runner::{RunnerGame, Spike};
pub use state::{Due, GameEvent, GamePhase, RunState};

use crate::GameKind;
use crate::config::HubConfig;
use crate::renderer::Canvas;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Move left held (bubble)
    pub left: bool,
    /// Move right held (bubble)
    pub right: bool,
    /// One-shot action: shoot (bubble), flap (flappy), jump (runner)
    pub action: bool,
}

/// A hosted mini-game. One instance per mount; nothing is shared between
/// instances.
pub trait Arcade {
    fn kind(&self) -> GameKind;

    /// Score, level, lives and phase of the current run
    fn run(&self) -> &RunState;

    fn phase(&self) -> GamePhase {
        self.run().phase()
    }

    /// Begin a fresh run
    fn start_run(&mut self);

    /// Return to the idle start screen
    fn reset(&mut self);

    /// Pick the starting level for the next run. Returns the level applied.
    fn select_level(&mut self, level: u32) -> u32;

    /// Advance by one fixed timestep
    fn tick(&mut self, input: &TickInput, events: &mut Vec<GameEvent>);

    /// Draw the current state. Reads state only.
    fn draw(&self, canvas: &mut dyn Canvas);
}

/// Build a game instance from configuration
pub fn new_game(kind: GameKind, config: &HubConfig, seed: u64) -> Box<dyn Arcade> {
    match kind {
        GameKind::BubbleTrouble => Box::new(BubbleGame::new(config.bubble.clone(), seed)),
        GameKind::FlappyBird => Box::new(FlappyGame::new(config.flappy.clone(), seed)),
        GameKind::Impossible => Box::new(RunnerGame::new(config.runner.clone(), seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_kinds() {
        let config = HubConfig::default();
        for kind in [
            GameKind::BubbleTrouble,
            GameKind::FlappyBird,
            GameKind::Impossible,
        ] {
            let game = new_game(kind, &config, 7);
            assert_eq!(game.kind(), kind);
            assert_eq!(game.phase(), GamePhase::Start);
        }
    }

    #[test]
    fn test_idle_games_do_not_tick() {
        let config = HubConfig::default();
        let mut events = Vec::new();
        for kind in [
            GameKind::BubbleTrouble,
            GameKind::FlappyBird,
            GameKind::Impossible,
        ] {
            let mut game = new_game(kind, &config, 7);
            for _ in 0..120 {
                game.tick(
                    &TickInput {
                        action: true,
                        ..Default::default()
                    },
                    &mut events,
                );
            }
            assert_eq!(game.phase(), GamePhase::Start);
        }
        assert!(events.is_empty());
    }
}
