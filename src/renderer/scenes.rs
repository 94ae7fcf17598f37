//! Per-game scene drawing. Reads game state only.

use glam::Vec2;

use super::{Align, Canvas, Color};
use crate::highscores::Medal;
use crate::sim::{Arcade, BubbleGame, FlappyGame, GamePhase, RunnerGame};

mod bubble_palette {
    use super::Color;
    pub const BACKGROUND: Color = Color::hex(0x1a1a2e);
    pub const GROUND: Color = Color::hex(0x16213e);
    pub const PLAYER: Color = Color::hex(0xe94560);
    pub const PLAYER_EYE: Color = Color::WHITE;
    pub const HARPOON: Color = Color::hex(0x00ff00);
    pub const BUBBLE_STROKE: Color = Color::Rgba(255, 255, 255, 0.3);
}

mod flappy_palette {
    use super::Color;
    pub const SKY: Color = Color::hex(0x4ec0ca);
    pub const GROUND: Color = Color::hex(0xded895);
    pub const GROUND_STRIPE: Color = Color::hex(0xc9bd6f);
    pub const PIPE_BODY: Color = Color::hex(0x5cb85c);
    pub const PIPE_BORDER: Color = Color::hex(0x4a9a4a);
    pub const PIPE_CAP: Color = Color::hex(0x6cc66c);
    pub const BIRD_BODY: Color = Color::hex(0xffd700);
    pub const BIRD_WING: Color = Color::hex(0xffa500);
    pub const BIRD_BEAK: Color = Color::hex(0xff6347);
    pub const MEDAL_BRONZE: Color = Color::hex(0xcd7f32);
    pub const MEDAL_SILVER: Color = Color::hex(0xc0c0c0);
    pub const MEDAL_GOLD: Color = Color::hex(0xffd700);
}

mod runner_palette {
    use super::Color;
    pub const BACKGROUND: Color = Color::hex(0x111111);
    pub const GROUND: Color = Color::hex(0x222222);
    pub const PLAYER: Color = Color::hex(0x4ade80);
    pub const SPIKE: Color = Color::hex(0xef4444);
    pub const SHADOW: Color = Color::Rgba(0, 0, 0, 0.25);
}

const PIPE_CAP_HEIGHT: f32 = 25.0;
const PIPE_CAP_OVERHANG: f32 = 3.0;

/// Centred banner for phases without live play
fn phase_banner(canvas: &mut dyn Canvas, phase: GamePhase, level: u32, prompt: &str) {
    let center = Vec2::new(canvas.width() / 2.0, canvas.height() / 2.0);
    let (title, sub) = match phase {
        GamePhase::Start => ("Ready?".to_string(), prompt.to_string()),
        GamePhase::Playing | GamePhase::Respawning { .. } => return,
        GamePhase::LevelCleared { .. } => (format!("Level {} Complete!", level), String::new()),
        GamePhase::GameOver { victory: true } => ("You Win!".to_string(), prompt.to_string()),
        GamePhase::GameOver { victory: false } => ("Game Over".to_string(), prompt.to_string()),
    };
    canvas.fill_text(&title, center, 40.0, Align::Center, Color::WHITE);
    if !sub.is_empty() {
        canvas.fill_text(&sub, center + Vec2::new(0.0, 36.0), 18.0, Align::Center, Color::WHITE);
    }
}

pub fn draw_bubble(game: &BubbleGame, canvas: &mut dyn Canvas) {
    use bubble_palette::*;
    let c = game.config();
    let run = game.run();

    canvas.clear(BACKGROUND);
    canvas.fill_rect(
        Vec2::new(0.0, c.canvas_height - 10.0),
        Vec2::new(c.canvas_width, 10.0),
        GROUND,
    );

    for bubble in &game.bubbles {
        canvas.fill_circle(bubble.pos, bubble.radius, Color::Hsl(bubble.hue, 70.0, 60.0));
        canvas.stroke_circle(bubble.pos, bubble.radius, BUBBLE_STROKE, 2.0);
    }

    let p = &game.player;
    canvas.fill_rect(p.pos, p.size, PLAYER);
    canvas.fill_rect(p.pos + Vec2::new(15.0, 0.0), Vec2::new(10.0, 10.0), PLAYER_EYE);

    for harpoon in &game.harpoons {
        canvas.fill_rect(
            Vec2::new(harpoon.pos.x - 2.0, harpoon.pos.y),
            Vec2::new(4.0, c.canvas_height - harpoon.pos.y),
            HARPOON,
        );
    }

    canvas.fill_text(
        &format!("Score: {}", run.score),
        Vec2::new(10.0, 24.0),
        18.0,
        Align::Left,
        Color::WHITE,
    );
    canvas.fill_text(
        &format!("Level: {}", run.level),
        Vec2::new(c.canvas_width / 2.0, 24.0),
        18.0,
        Align::Center,
        Color::WHITE,
    );
    canvas.fill_text(
        &"\u{2665}".repeat(run.lives as usize),
        Vec2::new(c.canvas_width - 10.0, 24.0),
        18.0,
        Align::Right,
        PLAYER,
    );

    phase_banner(canvas, run.phase(), run.level, "Press Space to play");
}

pub fn draw_flappy(game: &FlappyGame, canvas: &mut dyn Canvas) {
    use flappy_palette::*;
    let c = game.config();
    let run = game.run();
    let ground_y = c.ground_y();

    canvas.clear(SKY);

    for pipe in &game.pipes {
        let cap_w = pipe.width + PIPE_CAP_OVERHANG * 2.0;
        let top_body = Vec2::new(pipe.width, (pipe.top_height - PIPE_CAP_HEIGHT).max(0.0));
        let top_cap = Vec2::new(pipe.x - PIPE_CAP_OVERHANG, pipe.top_height - PIPE_CAP_HEIGHT);
        canvas.fill_rect(Vec2::new(pipe.x, 0.0), top_body, PIPE_BODY);
        canvas.stroke_rect(Vec2::new(pipe.x, 0.0), top_body, PIPE_BORDER, 2.0);
        canvas.fill_rect(top_cap, Vec2::new(cap_w, PIPE_CAP_HEIGHT), PIPE_CAP);
        canvas.stroke_rect(top_cap, Vec2::new(cap_w, PIPE_CAP_HEIGHT), PIPE_BORDER, 2.0);

        let bottom_body_y = pipe.bottom_y + PIPE_CAP_HEIGHT;
        let bottom_body = Vec2::new(pipe.width, (ground_y - bottom_body_y).max(0.0));
        let bottom_cap = Vec2::new(pipe.x - PIPE_CAP_OVERHANG, pipe.bottom_y);
        canvas.fill_rect(Vec2::new(pipe.x, bottom_body_y), bottom_body, PIPE_BODY);
        canvas.stroke_rect(Vec2::new(pipe.x, bottom_body_y), bottom_body, PIPE_BORDER, 2.0);
        canvas.fill_rect(bottom_cap, Vec2::new(cap_w, PIPE_CAP_HEIGHT), PIPE_CAP);
        canvas.stroke_rect(bottom_cap, Vec2::new(cap_w, PIPE_CAP_HEIGHT), PIPE_BORDER, 2.0);
    }

    canvas.fill_rect(
        Vec2::new(0.0, ground_y),
        Vec2::new(c.canvas_width, c.ground_height),
        GROUND,
    );
    let mut x = game.ground_x;
    while x < c.canvas_width {
        canvas.fill_rect(Vec2::new(x, ground_y), Vec2::new(20.0, c.ground_height), GROUND_STRIPE);
        x += 30.0;
    }
    canvas.fill_rect(Vec2::new(0.0, ground_y), Vec2::new(c.canvas_width, 3.0), PIPE_BORDER);

    let bird = &game.bird;
    let half = bird.size / 2.0;
    canvas.save();
    canvas.translate(bird.pos + half);
    canvas.rotate(bird.rotation.to_radians());
    canvas.fill_ellipse(Vec2::ZERO, half, BIRD_BODY);
    canvas.fill_ellipse(
        Vec2::new(-bird.size.x / 6.0, 0.0),
        Vec2::new(bird.size.x / 3.0, bird.size.y / 3.0),
        BIRD_WING,
    );
    let eye = Vec2::new(bird.size.x / 4.0, -bird.size.y / 6.0);
    canvas.fill_circle(eye, 5.0, Color::WHITE);
    canvas.fill_circle(eye + Vec2::new(1.0, 0.0), 2.0, Color::BLACK);
    canvas.fill_triangle(
        Vec2::new(half.x, 0.0),
        Vec2::new(half.x + 8.0, -3.0),
        Vec2::new(half.x + 8.0, 3.0),
        BIRD_BEAK,
    );
    canvas.restore();

    if run.phase().is_active() {
        canvas.fill_text(
            &run.score.to_string(),
            Vec2::new(c.canvas_width / 2.0, 80.0),
            48.0,
            Align::Center,
            Color::WHITE,
        );
    }

    if run.phase().is_over() {
        if let Some(medal) = Medal::for_score(run.score) {
            let color = match medal {
                Medal::Bronze => MEDAL_BRONZE,
                Medal::Silver => MEDAL_SILVER,
                Medal::Gold => MEDAL_GOLD,
            };
            canvas.fill_circle(Vec2::new(c.canvas_width / 2.0, 180.0), 30.0, color);
        }
        canvas.fill_text(
            &format!("Score: {}", run.score),
            Vec2::new(c.canvas_width / 2.0, 240.0),
            24.0,
            Align::Center,
            Color::WHITE,
        );
    }

    phase_banner(canvas, run.phase(), run.level, "Click or press Space to play");
}

pub fn draw_runner(game: &RunnerGame, canvas: &mut dyn Canvas) {
    use runner_palette::*;
    let c = game.config();
    let run = game.run();
    let ground_y = c.ground_y();

    canvas.clear(BACKGROUND);
    canvas.fill_rect(
        Vec2::new(0.0, ground_y),
        Vec2::new(c.canvas_width, c.canvas_height - ground_y),
        GROUND,
    );
    canvas.fill_rect(game.player.pos, game.player.size, PLAYER);

    for spike in &game.spikes {
        let base = spike.y + spike.size;
        canvas.fill_triangle(
            Vec2::new(spike.x, base),
            Vec2::new(spike.x + spike.size / 2.0, spike.y),
            Vec2::new(spike.x + spike.size, base),
            SPIKE,
        );
    }

    canvas.fill_rect(
        Vec2::new(game.player.left() + 2.0, ground_y - 6.0),
        Vec2::new(game.player.size.x, 6.0),
        SHADOW,
    );

    canvas.fill_text(
        &run.score.to_string(),
        Vec2::new(c.canvas_width - 16.0, 32.0),
        24.0,
        Align::Right,
        Color::WHITE,
    );
    canvas.fill_text(
        &format!("Level {}", run.level),
        Vec2::new(16.0, 32.0),
        18.0,
        Align::Left,
        Color::WHITE,
    );

    phase_banner(canvas, run.phase(), run.level, "Click or press Space to start");
}
