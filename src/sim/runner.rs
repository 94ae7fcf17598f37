//! "Impossible" spike runner
//!
//! Endless runner integrated in seconds: the player jumps over triangular
//! spikes that scroll in from the right while speed creeps up. Levels are
//! reached by surviving past time thresholds.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, rects_touch};
use super::state::{GameEvent, RunState};
use super::{Arcade, TickInput};
use crate::GameKind;
use crate::config::RunnerConfig;
use crate::consts::SIM_DT;
use crate::renderer::{self, Canvas};

/// A square-bounded spike standing on the ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Spike {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.size, self.size)
    }
}

#[derive(Debug, Clone)]
pub struct RunnerGame {
    config: RunnerConfig,
    run: RunState,
    pub player: Aabb,
    pub velocity_y: f32,
    pub on_ground: bool,
    pub spikes: Vec<Spike>,
    pub speed: f32,
    /// Seconds survived this run
    pub elapsed: f32,
    spawn_timer: f32,
    noise_phase: f32,
    /// Fractional score; the run score is its floor
    distance_score: f32,
    rng: Pcg32,
}

impl RunnerGame {
    pub fn new(config: RunnerConfig, seed: u64) -> Self {
        let run = RunState::new(1, 0, config.max_level());
        let size = config.player_size;
        let player = Aabb::new(config.player_x, config.ground_y() - size, size, size);
        let mut game = Self {
            speed: config.base_speed,
            spawn_timer: config.first_spawn_delay,
            config,
            run,
            player,
            velocity_y: 0.0,
            on_ground: true,
            spikes: Vec::new(),
            elapsed: 0.0,
            noise_phase: 0.0,
            distance_score: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.lay_out();
        game
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn lay_out(&mut self) {
        self.player.pos.y = self.config.ground_y() - self.player.size.y;
        self.velocity_y = 0.0;
        self.on_ground = true;
        self.spikes.clear();
        self.spawn_timer = self.config.first_spawn_delay;
        self.speed = self.config.base_speed;
        self.elapsed = 0.0;
        self.distance_score = 0.0;
        self.noise_phase = self.rng.random::<f32>() * 1000.0;
    }

    /// Jump if standing on the ground
    pub fn jump(&mut self) {
        if self.run.phase().is_active() && self.on_ground {
            self.velocity_y = self.config.jump_velocity;
            self.on_ground = false;
        }
    }

    /// Seconds until the next spike after one has just spawned
    fn next_spawn_gap(&mut self) -> f32 {
        let level = self.run.level as f32;
        let base = (0.9 - level * 0.08).max(0.5);
        let jitter = ((self.elapsed * 1.4 + self.noise_phase).sin() + 1.0) * 0.25;
        let noise = self.rng.random::<f32>() * 0.18 * (1.0 - (level * 0.12).min(1.0));
        base + jitter + noise
    }

    fn spawn_spike(&mut self) {
        let size = 36.0 + (self.elapsed * 1.3 + self.noise_phase).sin().abs() * 48.0;
        self.spikes.push(Spike {
            x: self.config.canvas_width + self.config.spawn_lead,
            y: self.config.ground_y() - size,
            size,
        });
    }

    fn update_player(&mut self, dt: f32) {
        self.velocity_y += self.config.gravity * dt;
        self.player.pos.y += self.velocity_y * dt;
        let floor = self.config.ground_y() - self.player.size.y;
        if self.player.pos.y >= floor {
            self.player.pos.y = floor;
            self.velocity_y = 0.0;
            self.on_ground = true;
        } else {
            self.on_ground = false;
        }
    }

    /// Highest level whose threshold has been survived
    fn level_for(&self, elapsed: f32) -> u32 {
        self.config
            .level_thresholds
            .iter()
            .rposition(|&t| elapsed >= t)
            .unwrap_or(0) as u32
    }
}

impl Arcade for RunnerGame {
    fn kind(&self) -> GameKind {
        GameKind::Impossible
    }

    fn run(&self) -> &RunState {
        &self.run
    }

    fn start_run(&mut self) {
        self.run.begin_run();
        self.lay_out();
        log::info!("Runner started at difficulty {}", self.run.level);
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
            self.jump();
        }

        let dt = SIM_DT;
        self.elapsed += dt;
        self.update_player(dt);

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0.0 {
            self.spawn_spike();
            self.spawn_timer = self.next_spawn_gap();
        }

        let margin = self.config.despawn_margin;
        let mut i = self.spikes.len();
        while i > 0 {
            i -= 1;
            self.spikes[i].x -= self.speed * dt;
            let spike = self.spikes[i];
            if spike.x + spike.size < -margin {
                self.spikes.remove(i);
                continue;
            }
            if rects_touch(&self.player, &spike.bounds()) {
                self.run.finish(false, events);
                return;
            }
        }

        self.distance_score += dt * self.config.score_rate;
        let whole = self.distance_score.floor() as u64;
        if whole > self.run.score {
            self.run.add_score(whole - self.run.score, events);
        }
        self.speed += dt * self.config.speed_ramp;

        let reached = self.level_for(self.elapsed);
        self.run.reach_level(reached, events);
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        renderer::scenes::draw_runner(self, canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GamePhase;

    fn game() -> RunnerGame {
        let mut game = RunnerGame::new(RunnerConfig::default(), 5);
        game.start_run();
        game
    }

    fn jump() -> TickInput {
        TickInput {
            action: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_player_starts_on_ground() {
        let game = game();
        assert_eq!(game.player.bottom(), 320.0);
        assert!(game.on_ground);
        assert_eq!(game.run().level, 0);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut game = game();
        game.tick(&jump(), &mut Vec::new());
        assert!(!game.on_ground);
        let vy = game.velocity_y;
        assert!(vy < 0.0);

        // Mid-air jump is ignored
        game.tick(&jump(), &mut Vec::new());
        assert!(game.velocity_y > vy);
    }

    #[test]
    fn test_jump_lands_again() {
        let mut game = game();
        game.tick(&jump(), &mut Vec::new());
        for _ in 0..60 {
            game.spikes.clear();
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        assert!(game.on_ground);
        assert_eq!(game.player.bottom(), 320.0);
    }

    #[test]
    fn test_first_spike_after_delay() {
        let mut game = game();
        // 0.8s is 48 ticks
        for _ in 0..47 {
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        assert!(game.spikes.is_empty());
        for _ in 0..2 {
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        assert_eq!(game.spikes.len(), 1);
        let spike = game.spikes[0];
        assert!(spike.size >= 36.0 && spike.size <= 84.0);
        assert!((spike.y + spike.size - 320.0).abs() < 1e-3);
    }

    #[test]
    fn test_spawn_gap_bounds() {
        let mut game = game();
        for level in 0..=5 {
            game.run.level = level;
            for step in 0..50 {
                game.elapsed = step as f32 * 0.37;
                let gap = game.next_spawn_gap();
                let base = (0.9 - level as f32 * 0.08).max(0.5);
                assert!(gap >= base);
                assert!(gap <= base + 0.5 + 0.18 + 1e-4);
            }
        }
    }

    #[test]
    fn test_spike_collision_ends_run() {
        let mut game = game();
        game.spikes.push(Spike {
            x: game.player.right() + 1.0,
            y: 320.0 - 40.0,
            size: 40.0,
        });
        let mut events = Vec::new();
        game.tick(&TickInput::default(), &mut events);
        assert_eq!(game.phase(), GamePhase::GameOver { victory: false });
        assert!(matches!(events.last(), Some(GameEvent::GameOver { victory: false, .. })));
    }

    #[test]
    fn test_spikes_despawn_past_margin() {
        let mut game = game();
        game.spikes.push(Spike {
            x: -85.0,
            y: 280.0,
            size: 40.0,
        });
        game.tick(&TickInput::default(), &mut Vec::new());
        assert!(game.spikes.is_empty());
    }

    #[test]
    fn test_score_and_speed_ramp() {
        let mut game = game();
        for _ in 0..60 {
            game.spikes.clear();
            game.tick(&TickInput::default(), &mut Vec::new());
        }
        // One second at 10 points per second (float accumulation may land just short)
        assert!(game.run().score == 9 || game.run().score == 10);
        assert!((game.speed - 368.0).abs() < 0.01);
    }

    #[test]
    fn test_thresholds_raise_level() {
        let mut game = game();
        let mut events = Vec::new();
        game.elapsed = 24.99;
        game.tick(&TickInput::default(), &mut events);
        assert_eq!(game.run().level, 2);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::LevelPassed { .. }))
                .collect::<Vec<_>>(),
            vec![&GameEvent::LevelPassed { level: 2 }]
        );
    }

    #[test]
    fn test_selected_difficulty() {
        let mut game = RunnerGame::new(RunnerConfig::default(), 5);
        assert_eq!(game.select_level(9), 5);
        game.start_run();
        assert_eq!(game.run().level, 5);
        game.tick(&TickInput::default(), &mut Vec::new());
        assert_eq!(game.run().level, 5);
    }
}
