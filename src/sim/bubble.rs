//! Bubble Trouble
//!
//! Level N opens with N large bubbles bouncing under gravity. Harpoons split
//! a bubble into two halves until they fall below the minimum radius. Touching
//! a bubble costs a life and restarts the level after the respawn delay.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, circle_hits_player, harpoon_hits_bubble};
use super::state::{Due, GameEvent, RunState};
use super::{Arcade, TickInput};
use crate::GameKind;
use crate::config::BubbleConfig;
use crate::renderer::{self, Canvas};

/// A bouncing bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// HSL hue in degrees, inherited by split children
    pub hue: f32,
}

impl Bubble {
    /// Points for popping a bubble of this size (smaller is worth more)
    pub fn pop_score(&self) -> u64 {
        (50.0 / self.radius).floor() as u64
    }

    /// The two halves a pop produces, or `None` when they would be too small
    pub fn split(&self, min_radius: f32) -> Option<[Bubble; 2]> {
        let radius = self.radius / 2.0;
        if radius < min_radius {
            return None;
        }
        let speed = self.vel.x.abs() + 1.0;
        Some([
            Bubble {
                pos: Vec2::new(self.pos.x - 10.0, self.pos.y),
                vel: Vec2::new(-speed, -5.0),
                radius,
                hue: self.hue,
            },
            Bubble {
                pos: Vec2::new(self.pos.x + 10.0, self.pos.y),
                vel: Vec2::new(speed, -5.0),
                radius,
                hue: self.hue,
            },
        ])
    }

    /// One tick of gravity, floor rebound and wall bounce
    pub fn step(&mut self, config: &BubbleConfig) {
        self.vel.y += config.gravity;
        self.pos.y += self.vel.y;
        self.pos.x += self.vel.x;

        if self.pos.y + self.radius >= config.canvas_height {
            self.pos.y = config.canvas_height - self.radius;
            self.vel.y = -self.vel.y.abs();
            // Keep bounces from decaying to rest
            if self.vel.y.abs() < config.min_rebound_speed {
                self.vel.y = -config.min_rebound_speed;
            }
        }

        let hits_left = self.pos.x - self.radius <= 0.0;
        if hits_left || self.pos.x + self.radius >= config.canvas_width {
            self.vel.x = -self.vel.x;
            self.pos.x = if hits_left {
                self.radius
            } else {
                config.canvas_width - self.radius
            };
        }
    }
}

/// Harpoon tip; the rope trails down to the floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harpoon {
    pub pos: Vec2,
}

/// A Bubble Trouble game instance
#[derive(Debug, Clone)]
pub struct BubbleGame {
    config: BubbleConfig,
    run: RunState,
    pub player: Aabb,
    pub bubbles: Vec<Bubble>,
    pub harpoons: Vec<Harpoon>,
    rng: Pcg32,
}

impl BubbleGame {
    pub fn new(config: BubbleConfig, seed: u64) -> Self {
        let run = RunState::new(config.initial_lives, 1, config.max_level);
        let player = Self::home_position(&config);
        Self {
            config,
            run,
            player,
            bubbles: Vec::new(),
            harpoons: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &BubbleConfig {
        &self.config
    }

    fn home_position(config: &BubbleConfig) -> Aabb {
        Aabb::new(
            config.canvas_width / 2.0,
            config.canvas_height - 50.0,
            config.player_width,
            config.player_height,
        )
    }

    /// Lay out level `level`: exactly `level` bubbles at fixed x offsets
    pub fn init_level(&mut self, level: u32) {
        let c = &self.config;
        let mut bubbles = Vec::with_capacity(level as usize);
        for i in 0..level {
            bubbles.push(Bubble {
                pos: Vec2::new(c.spawn_x_offset + i as f32 * c.spawn_x_spacing, c.spawn_y),
                vel: Vec2::new(self.rng.random_range(1.5..3.0), 0.0),
                radius: c.initial_bubble_radius,
                hue: self.rng.random_range(0.0..360.0),
            });
        }
        self.bubbles = bubbles;
        self.player.pos.x = self.config.canvas_width / 2.0;
        self.harpoons.clear();
        log::debug!("Bubble level {} laid out", level);
    }

    /// Fire a harpoon from the player's centre. Only during a run.
    pub fn shoot(&mut self) {
        if !self.run.phase().is_active() {
            return;
        }
        self.harpoons.push(Harpoon {
            pos: Vec2::new(self.player.center().x, self.player.top()),
        });
    }

    fn update_player(&mut self, input: &TickInput) {
        let speed = self.config.player_speed;
        if input.left && self.player.pos.x > 0.0 {
            self.player.pos.x -= speed;
        }
        if input.right && self.player.pos.x < self.config.canvas_width - self.player.size.x {
            self.player.pos.x += speed;
        }
    }

    fn update_harpoons(&mut self) {
        let speed = self.config.harpoon_speed;
        for harpoon in &mut self.harpoons {
            harpoon.pos.y -= speed;
        }
        self.harpoons.retain(|h| h.pos.y >= 0.0);
    }

    /// Remove the bubble at `index` and append its children
    fn pop(&mut self, index: usize, events: &mut Vec<GameEvent>) {
        let bubble = self.bubbles.remove(index);
        if let Some(children) = bubble.split(self.config.min_bubble_radius) {
            self.bubbles.extend(children);
        }
        self.run.add_score(bubble.pop_score(), events);
    }
}

impl Arcade for BubbleGame {
    fn kind(&self) -> GameKind {
        GameKind::BubbleTrouble
    }

    fn run(&self) -> &RunState {
        &self.run
    }

    fn start_run(&mut self) {
        self.run.begin_run();
        self.init_level(self.run.level);
        log::info!("Bubble Trouble run started on level {}", self.run.level);
    }

    fn reset(&mut self) {
        self.run.reset();
        self.bubbles.clear();
        self.harpoons.clear();
        self.player = Self::home_position(&self.config);
    }

    fn select_level(&mut self, level: u32) -> u32 {
        self.run.select_level(level)
    }

    fn tick(&mut self, input: &TickInput, events: &mut Vec<GameEvent>) {
        if !self.run.phase().is_active() {
            return;
        }

        match self.run.advance(events) {
            Some(Due::Respawn { level }) | Some(Due::NextLevel { level }) => self.init_level(level),
            Some(Due::Victory) => return,
            None => {}
        }

        if input.action {
            self.shoot();
        }

        // Reverse order: popping removes index i and appends children past
        // the cursor, so nothing is skipped or visited twice.
        let floor_y = self.config.canvas_height;
        let mut i = self.bubbles.len();
        while i > 0 {
            i -= 1;
            self.bubbles[i].step(&self.config);
            let bubble = self.bubbles[i];

            if !self.run.is_respawning()
                && circle_hits_player(bubble.pos, bubble.radius, &self.player)
                && self.run.player_hit(self.config.respawn_delay_ticks(), events)
            {
                self.bubbles.clear();
                self.harpoons.clear();
                break;
            }

            let hit = (0..self.harpoons.len())
                .rev()
                .find(|&h| harpoon_hits_bubble(bubble.pos, bubble.radius, self.harpoons[h].pos, floor_y));
            if let Some(h) = hit {
                self.harpoons.remove(h);
                self.pop(i, events);
            }
        }

        if self.run.phase().is_over() {
            return;
        }

        self.update_player(input);
        self.update_harpoons();

        if self.bubbles.is_empty() {
            self.run.level_complete(self.config.level_clear_delay_ticks());
        }
    }

    fn draw(&self, canvas: &mut dyn Canvas) {
        renderer::scenes::draw_bubble(self, canvas);
    }
}
