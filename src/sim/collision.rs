//! Collision tests shared by the games
//!
//! Each game uses a different shape pairing: circles against the bubble
//! player's centre, a permissive column test for harpoons, an x-span breach
//! test for pipes and inclusive rectangle overlap for spikes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }
}

/// Bubble against player. Uses the player's centre and half-width as the
/// hit radius; exactly touching is not a hit.
pub fn circle_hits_player(center: Vec2, radius: f32, player: &Aabb) -> bool {
    center.distance(player.center()) < radius + player.size.x / 2.0
}

/// Harpoon against bubble.
///
/// The harpoon is a rope from its tip down to the floor, so the vertical
/// test only asks whether the bubble reaches down to the tip. The horizontal
/// tolerance is two pixels wider than the bubble.
pub fn harpoon_hits_bubble(bubble: Vec2, radius: f32, tip: Vec2, floor_y: f32) -> bool {
    let horizontal = (bubble.x - tip.x).abs() < radius + 2.0;
    let vertical = bubble.y + radius >= tip.y && bubble.y - radius <= floor_y;
    horizontal && vertical
}

/// Bird against a pipe pair. Inside the pipe column, touching neither pipe
/// means the bird is in the gap.
pub fn bird_hits_pipe(bird: &Aabb, pipe_x: f32, pipe_width: f32, top_height: f32, bottom_y: f32) -> bool {
    let in_column = bird.right() > pipe_x && bird.left() < pipe_x + pipe_width;
    in_column && (bird.top() < top_height || bird.bottom() > bottom_y)
}

/// Inclusive rectangle overlap (shared edges collide)
pub fn rects_touch(a: &Aabb, b: &Aabb) -> bool {
    !(a.right() < b.left() || a.left() > b.right() || a.bottom() < b.top() || a.top() > b.bottom())
}
