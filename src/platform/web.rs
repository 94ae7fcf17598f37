//! Browser bindings: LocalStorage, Canvas 2D, postMessage and fetch

use std::f64::consts::TAU;

use glam::Vec2;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Headers, Request, RequestInit, Response, Storage};

use crate::bridge::BridgeMessage;
use crate::cabinet::{ScoreReport, ScoreSink};
use crate::error::HubError;
use crate::persistence::{KeyValueStore, session_user_id};
use crate::renderer::{Align, Canvas, Color};

/// Score service endpoint
pub const SCORE_ENDPOINT: &str = "http://localhost:8080/api/game-scores";

fn js_reason(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

/// `KeyValueStore` over `window.localStorage`
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, high scores will not persist");
        }
        Self { storage }
    }

    fn storage(&self, key: &str) -> Result<&Storage, HubError> {
        self.storage.as_ref().ok_or_else(|| HubError::Storage {
            key: key.to_string(),
            reason: "localStorage unavailable".to_string(),
        })
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, HubError> {
        self.storage(key)?.get_item(key).map_err(|e| HubError::Storage {
            key: key.to_string(),
            reason: js_reason(e),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HubError> {
        self.storage(key)?
            .set_item(key, value)
            .map_err(|e| HubError::Storage {
                key: key.to_string(),
                reason: js_reason(e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), HubError> {
        self.storage(key)?
            .remove_item(key)
            .map_err(|e| HubError::Storage {
                key: key.to_string(),
                reason: js_reason(e),
            })
    }
}

/// `Canvas` over a 2D rendering context
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f32,
    height: f32,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d, width: f32, height: f32) -> Self {
        Self { ctx, width, height }
    }

    fn fill_path(&self, color: Color) {
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx.fill();
    }
}

impl Canvas for CanvasSurface {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        self.ctx.set_fill_style_str(&color.to_string());
        self.ctx
            .fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
    }

    fn stroke_rect(&mut self, pos: Vec2, size: Vec2, color: Color, line_width: f32) {
        self.ctx.set_stroke_style_str(&color.to_string());
        self.ctx.set_line_width(line_width as f64);
        self.ctx
            .stroke_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ctx.begin_path();
        if self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_ok()
        {
            self.fill_path(color);
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, line_width: f32) {
        self.ctx.begin_path();
        if self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_ok()
        {
            self.ctx.set_stroke_style_str(&color.to_string());
            self.ctx.set_line_width(line_width as f64);
            self.ctx.stroke();
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radii: Vec2, color: Color) {
        self.ctx.begin_path();
        if self
            .ctx
            .ellipse(
                center.x as f64,
                center.y as f64,
                radii.x as f64,
                radii.y as f64,
                0.0,
                0.0,
                TAU,
            )
            .is_ok()
        {
            self.fill_path(color);
        }
    }

    fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        self.ctx.begin_path();
        self.ctx.move_to(a.x as f64, a.y as f64);
        self.ctx.line_to(b.x as f64, b.y as f64);
        self.ctx.line_to(c.x as f64, c.y as f64);
        self.ctx.close_path();
        self.fill_path(color);
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, size_px: f32, align: Align, color: Color) {
        self.ctx.set_font(&format!("bold {}px Arial", size_px));
        self.ctx.set_text_align(align.as_css());
        self.ctx.set_fill_style_str(&color.to_string());
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, offset: Vec2) {
        let _ = self.ctx.translate(offset.x as f64, offset.y as f64);
    }

    fn rotate(&mut self, angle: f32) {
        let _ = self.ctx.rotate(angle as f64);
    }
}

/// Post a bridge message to the embedding page
pub fn post_to_parent(msg: &BridgeMessage, target_origin: &str) -> Result<(), HubError> {
    let json = msg.to_json()?;
    let value = js_sys::JSON::parse(&json).map_err(|e| HubError::Parse {
        what: "bridge message",
        reason: js_reason(e),
    })?;
    let parent = web_sys::window()
        .and_then(|w| w.parent().ok().flatten())
        .ok_or_else(|| HubError::Parse {
            what: "parent window",
            reason: "not embedded".to_string(),
        })?;
    parent
        .post_message(&value, target_origin)
        .map_err(|e| HubError::Parse {
            what: "postMessage",
            reason: js_reason(e),
        })
}

/// Serialize an incoming `MessageEvent` payload back to JSON text
pub fn message_json(data: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(data).ok().map(String::from)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreBody {
    user_id: serde_json::Value,
    game_id: u32,
    score: u64,
    level: u32,
    timestamp: String,
}

/// POSTs each report to the score service. Failures are logged only.
pub struct FetchScoreSink {
    endpoint: String,
}

impl FetchScoreSink {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }
}

impl ScoreSink for FetchScoreSink {
    fn submit(&mut self, report: ScoreReport) {
        let Some(user_id) = session_user_id(&LocalStore::new()) else {
            log::info!("Not signed in, score {} not submitted", report.score);
            return;
        };
        let body = ScoreBody {
            user_id,
            game_id: report.game_id,
            score: report.score,
            level: report.level,
            timestamp: String::from(js_sys::Date::new_0().to_iso_string()),
        };
        let body = match serde_json::to_string(&body) {
            Ok(body) => body,
            Err(e) => {
                log::error!("Could not encode score: {}", e);
                return;
            }
        };
        let endpoint = self.endpoint.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match post_json(&endpoint, &body).await {
                Ok(()) => log::info!("Score saved"),
                Err(e) => log::error!("Failed to save score: {}", js_reason(e)),
            }
        });
    }
}

async fn post_json(url: &str, body: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_headers(&headers);
    opts.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(url, &opts)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if response.ok() {
        Ok(())
    } else {
        Err(JsValue::from_str(&format!("HTTP {}", response.status())))
    }
}
