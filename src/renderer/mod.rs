//! 2D canvas rendering
//!
//! Games draw through the `Canvas` trait once per displayed frame. Every
//! frame is a full redraw; nothing is retained between frames. The browser
//! implementation wraps `CanvasRenderingContext2d` (see `platform::web`),
//! tests and the native demo use `RecordingCanvas`.

pub mod recorder;
pub mod scenes;

pub use recorder::{DrawCommand, RecordingCanvas};

use std::fmt;

use glam::Vec2;

/// A fill or stroke colour. `Display` yields a CSS colour string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f32),
    /// Hue in degrees, saturation and lightness in percent
    Hsl(f32, f32, f32),
}

impl Color {
    pub const WHITE: Color = Color::hex(0xffffff);
    pub const BLACK: Color = Color::hex(0x000000);

    /// From a packed `0xRRGGBB` value
    pub const fn hex(rgb: u32) -> Self {
        Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Rgb(r, g, b) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::Rgba(r, g, b, a) => write!(f, "rgba({},{},{},{})", r, g, b, a),
            Color::Hsl(h, s, l) => write!(f, "hsl({}, {}%, {}%)", h, s, l),
        }
    }
}

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_css(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// Immediate-mode drawing surface
pub trait Canvas {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color);
    fn stroke_rect(&mut self, pos: Vec2, size: Vec2, color: Color, line_width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, line_width: f32);
    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color);
    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color);
    fn fill_text(&mut self, text: &str, pos: Vec2, size_px: f32, align: Align, color: Color);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    /// Radians, clockwise in canvas space
    fn rotate(&mut self, angle: f32);

    /// Paint the whole surface
    fn clear(&mut self, color: Color) {
        let size = Vec2::new(self.width(), self.height());
        self.fill_rect(Vec2::ZERO, size, color);
    }
}
