//! Flappy Bird
//!
//! One life, one level. The bird falls under gravity and flaps on action;
//! each pipe pair the bird clears is worth one point.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, bird_hits_pipe};
use super::state::{GameEvent, RunState};
use super::{Arcade, TickInput};
use crate::GameKind;
use crate::config::{FlappyConfig, PipeSpawn};
use crate::renderer::{self, Canvas};

/// Ground stripes repeat every 30px
const GROUND_WRAP: f32 = -30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    pub pos: Vec2,
    pub size: Vec2,
    pub velocity: f32,
    /// Degrees, nose-down positive
    pub rotation: f32,
}

impl Bird {
    fn spawn(config: &FlappyConfig) -> Self {
        Self {
            pos: Vec2::new(config.bird_x, config.bird_start_y),
            size: Vec2::new(config.bird_width, config.bird_height),
            velocity: 0.0,
            rotation: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb {
            pos: self.pos,
            size: self.size,
        }
    }
}

/// A top/bottom pipe pair sharing one gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub x: f32,
    pub width: f32,
    /// Bottom edge of the top pipe
    pub top_height: f32,
    /// Top edge of the bottom pipe
    pub bottom_y: f32,
    /// Already scored
    pub passed: bool,
}

#[derive(Debug, Clone)]
pub struct FlappyGame {
    config: FlappyConfig,
    run: RunState,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub ground_x: f32,
    frames: u64,
    rng: Pcg32,
}

impl FlappyGame {
    pub fn new(config: FlappyConfig, seed: u64) -> Self {
        let bird = Bird::spawn(&config);
        Self {
            config,
            run: RunState::new(1, 1, 1),
            bird,
            pipes: Vec::new(),
            ground_x: 0.0,
            frames: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &FlappyConfig {
        &self.config
    }

    /// Put the bird and pipes back to their opening positions
    fn lay_out(&mut self) {
        self.bird = Bird::spawn(&self.config);
        self.pipes.clear();
        self.ground_x = 0.0;
        self.frames = 0;
        if let PipeSpawn::Spacing { distance } = self.config.spawn {
            let w = self.config.canvas_width;
            self.spawn_pipe(w);
            self.spawn_pipe(w + distance);
        }
    }

    /// Add a pipe pair at `x` with a random gap position
    pub fn spawn_pipe(&mut self, x: f32) {
        let min = self.config.min_pipe_height;
        let max = self.config.max_pipe_height();
        let u: f32 = self.rng.random();
        let top_height = (u * (max - min) + min).floor();
        self.pipes.push(Pipe {
            x,
            width: self.config.pipe_width,
            top_height,
            bottom_y: top_height + self.config.pipe_gap,
            passed: false,
        });
    }

    /// Flap. Only while a run is in progress.
    pub fn flap(&mut self) {
        if self.run.phase().is_active() {
            self.bird.velocity = self.config.jump_strength;
        }
    }

    fn update_bird(&mut self, events: &mut Vec<GameEvent>) {
        let c = &self.config;
        let bird = &mut self.bird;
        bird.velocity = (bird.velocity + c.gravity).min(c.max_velocity);
        bird.pos.y += bird.velocity;
        bird.rotation = (bird.velocity * 3.0).clamp(-30.0, 90.0);

        let ground_y = c.ground_y();
        if bird.pos.y + bird.size.y >= ground_y {
            bird.pos.y = ground_y - bird.size.y;
            self.run.finish(false, events);
            return;
        }
        if bird.pos.y <= 0.0 {
            bird.pos.y = 0.0;
            bird.velocity = 0.0;
        }
    }

    fn update_pipes(&mut self, events: &mut Vec<GameEvent>) {
        let bird = self.bird.bounds();
        let mut i = self.pipes.len();
        while i > 0 {
            i -= 1;
            let pipe = &mut self.pipes[i];
            pipe.x -= self.config.pipe_speed;

            let mut scored = false;
            if !pipe.passed && pipe.x + pipe.width < bird.left() {
                pipe.passed = true;
                scored = true;
            }
            let hit = bird_hits_pipe(&bird, pipe.x, pipe.width, pipe.top_height, pipe.bottom_y);
            if pipe.x + pipe.width < 0.0 {
                self.pipes.remove(i);
            }

            if scored {
                self.run.add_score(1, events);
            }
            if hit {
                self.run.finish(false, events);
                return;
            }
        }

        match self.config.spawn {
            PipeSpawn::Spacing { distance } => {
                // Spacing wider than the screen can empty the field entirely
                let threshold = self.config.canvas_width - distance;
                if self.pipes.last().is_none_or(|p| p.x < threshold) {
                    self.spawn_pipe(self.config.canvas_width);
                }
            }
            PipeSpawn::Interval { frames } => {
                if self.frames % frames.max(1) as u64 == 0 {
                    self.spawn_pipe(self.config.canvas_width);
                }
            }
        }
    }

    fn update_ground(&mut self) {
        self.ground_x -= self.config.scroll_speed;
        if self.ground_x <= GROUND_WRAP {
            self.ground_x = 0.0;
        }
    }
}

impl Arcade for FlappyGame {
    fn kind(&self) -> GameKind {
        GameKind::FlappyBird
    }

    fn run(&self) -> &RunState {
        &self.run
    }

    fn start_run(&mut self) {
        self.run.begin_run();
        self.lay_out();
        log::info!("Flappy Bird run started");
    }

    fn reset(&mut self) {
        self.run.reset();
        self.lay_out();
    }

    fn select_level(&mut self, level: u32) -> u32 {
        self.run.select_level(level)
    }

    fn tick(&mut self, input: &TickInput, events: &mut Vec<GameEvent>) {
        if !self.run.phase().is_active() {
            return;
        }
        if input.action {
            self.flap();
        }

        self.update_bird(events);
        if self.run.phase().is_over() {
            return;
        }
        self.update_pipes(events);
        if self.run.phase().is_over() {
            return;
        }
        self.update_ground();
        self.frames += 1;
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        renderer::scenes::draw_flappy(self, canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GamePhase;

    fn game() -> FlappyGame {
        let mut game = FlappyGame::new(FlappyConfig::default(), 11);
        game.start_run();
        game
    }

    #[test]
    fn test_run_starts_with_two_pipes() {
        let game = game();
        assert_eq!(game.pipes.len(), 2);
        assert_eq!(game.pipes[0].x, 400.0);
        assert_eq!(game.pipes[1].x, 600.0);
    }

    #[test]
    fn test_interval_policy_starts_empty_and_spawns_on_frame_zero() {
        let config = FlappyConfig {
            spawn: PipeSpawn::Interval { frames: 150 },
            ..Default::default()
        };
        let mut game = FlappyGame::new(config, 1);
        game.start_run();
        assert!(game.pipes.is_empty());
        game.tick(&TickInput::default(), &mut Vec::new());
        assert_eq!(game.pipes.len(), 1);
        game.tick(&TickInput::default(), &mut Vec::new());
        assert_eq!(game.pipes.len(), 1);
    }

    #[test]
    fn test_wide_spacing_keeps_spawning() {
        let config = FlappyConfig {
            spawn: PipeSpawn::Spacing { distance: 500.0 },
            ..Default::default()
        };
        let mut game = FlappyGame::new(config, 4);
        game.start_run();
        let mut events = Vec::new();
        let mut spawned_after_empty = 0;
        for _ in 0..2000 {
            let bird_x = game.bird.pos.x;
            if let Some(next) = game.pipes.iter().find(|p| p.x + p.width > bird_x) {
                game.bird.pos.y = next.top_height + game.config().pipe_gap / 2.0 - game.bird.size.y / 2.0;
            }
            game.bird.velocity = 0.0;
            let had_one = game.pipes.len() == 1;
            game.tick(&TickInput::default(), &mut events);
            assert_eq!(game.phase(), GamePhase::Playing);
            assert!(!game.pipes.is_empty());
            if had_one && game.pipes.len() == 1 && game.pipes[0].x == game.config().canvas_width {
                spawned_after_empty += 1;
            }
        }
        assert!(spawned_after_empty >= 3);
    }

    #[test]
    fn test_gap_always_fits() {
        let mut game = game();
        let c = game.config().clone();
        for _ in 0..500 {
            game.spawn_pipe(0.0);
        }
        for p in &game.pipes {
            assert!(p.top_height >= c.min_pipe_height);
            assert!(p.top_height <= c.max_pipe_height());
            assert_eq!(p.bottom_y - p.top_height, c.pipe_gap);
            assert!(p.bottom_y <= c.ground_y());
        }
    }

    #[test]
    fn test_gravity_caps_velocity_and_rotation() {
        let mut game = game();
        game.pipes.clear();
        game.bird.velocity = 9.8;
        game.bird.pos.y = 100.0;
        game.tick(&TickInput::default(), &mut Vec::new());
        assert_eq!(game.bird.velocity, 10.0);
        assert_eq!(game.bird.pos.y, 110.0);
        assert_eq!(game.bird.rotation, 30.0);

        game.tick(
            &TickInput {
                action: true,
                ..Default::default()
            },
            &mut Vec::new(),
        );
        // Flap then gravity: -8 + 0.5
        assert_eq!(game.bird.velocity, -7.5);
        assert_eq!(game.bird.rotation, -22.5);
    }

    #[test]
    fn test_ceiling_clamps() {
        let mut game = game();
        game.bird.pos.y = 2.0;
        game.bird.velocity = -8.0;
        game.tick(&TickInput::default(), &mut Vec::new());
        assert_eq!(game.bird.pos.y, 0.0);
        assert_eq!(game.bird.velocity, 0.0);
        assert!(game.phase().is_active());
    }

    #[test]
    fn test_ground_ends_run() {
        let mut game = game();
        game.bird.pos.y = 472.0;
        game.bird.velocity = 5.0;
        let mut events = Vec::new();
        game.tick(&TickInput::default(), &mut events);
        assert_eq!(game.bird.pos.y, 476.0);
        assert_eq!(game.phase(), GamePhase::GameOver { victory: false });
        assert_eq!(
            events,
            vec![GameEvent::GameOver {
                score: 0,
                level: 1,
                victory: false
            }]
        );

        // Further ticks are inert
        game.tick(&TickInput::default(), &mut events);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_pipe_scores_once() {
        let mut game = game();
        game.pipes.clear();
        game.pipes.push(Pipe {
            x: -2.5,
            width: 52.0,
            top_height: 100.0,
            bottom_y: 250.0,
            passed: false,
        });
        game.bird.pos.y = 150.0;
        let mut events = Vec::new();
        game.tick(&TickInput::default(), &mut events);
        game.bird.pos.y = 150.0;
        game.bird.velocity = 0.0;
        game.tick(&TickInput::default(), &mut events);
        assert_eq!(game.run().score, 1);
        assert!(game.pipes[0].passed);
    }

    #[test]
    fn test_pipe_collision_ends_run() {
        let mut game = game();
        game.pipes.clear();
        game.pipes.push(Pipe {
            x: 60.0,
            width: 52.0,
            top_height: 300.0,
            bottom_y: 450.0,
            passed: false,
        });
        game.bird.pos.y = 100.0;
        game.tick(&TickInput::default(), &mut Vec::new());
        assert!(game.phase().is_over());
    }

    #[test]
    fn test_offscreen_pipes_removed_and_replaced() {
        let mut game = game();
        for _ in 0..400 {
            // Keep the bird airborne and inside every gap
            game.bird.pos.y = 0.0;
            game.bird.velocity = 0.0;
            for p in &mut game.pipes {
                p.top_height = 0.0;
                p.bottom_y = 150.0;
            }
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        assert!(game.phase().is_active());
        assert!(game.pipes.iter().all(|p| p.x + p.width >= 0.0));
        assert!(!game.pipes.is_empty());
        assert_eq!(game.run().score, 2);
    }

    #[test]
    fn test_ground_scroll_wraps() {
        let mut game = game();
        game.pipes.clear();
        for _ in 0..15 {
            game.bird.pos.y = 100.0;
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        assert_eq!(game.ground_x, 0.0);
    }

    #[test]
    fn test_flap_ignored_when_idle() {
        let mut game = FlappyGame::new(FlappyConfig::default(), 2);
        game.flap();
        assert_eq!(game.bird.velocity, 0.0);
    }
}
