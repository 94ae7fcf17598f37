//! One mounted game and everything around it
//!
//! A cabinet owns a single game instance plus its token gate, high score,
//! fixed-timestep accumulator and the outgoing bridge messages. Mounting the
//! same game twice gives two independent cabinets.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bridge::{BridgeMessage, GateAction, PlayRequest, TokenGate};
use crate::config::HubConfig;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::renderer::{Align, Canvas, Color};
use crate::sim::{self, Arcade, GameEvent, GamePhase, TickInput};
use crate::GameKind;

/// Final result of a run, as handed to the score service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub game_id: u32,
    pub score: u64,
    pub level: u32,
    pub victory: bool,
}

/// Receives one report per finished run
pub trait ScoreSink {
    fn submit(&mut self, report: ScoreReport);
}

/// Shared in-memory list of submitted reports
#[derive(Debug, Clone, Default)]
pub struct ScoreLog(Rc<RefCell<Vec<ScoreReport>>>);

impl ScoreLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ScoreReport> {
        self.0.borrow().clone()
    }
}

impl ScoreSink for ScoreLog {
    fn submit(&mut self, report: ScoreReport) {
        log::info!(
            "Score report: game {} scored {} (level {})",
            report.game_id,
            report.score,
            report.level
        );
        self.0.borrow_mut().push(report);
    }
}

pub struct Cabinet {
    game: Box<dyn Arcade>,
    gate: TokenGate,
    high_score: HighScore,
    store: Box<dyn KeyValueStore>,
    sink: Box<dyn ScoreSink>,
    accumulator: f32,
    input: TickInput,
    ticks: u64,
    events: Vec<GameEvent>,
    outbox: Vec<BridgeMessage>,
    status: Option<String>,
    /// Set once this run's result has been submitted
    reported: bool,
}

impl Cabinet {
    pub fn new(
        kind: GameKind,
        config: &HubConfig,
        seed: u64,
        store: Box<dyn KeyValueStore>,
        sink: Box<dyn ScoreSink>,
    ) -> Self {
        let high_score = HighScore::load(store.as_ref(), kind.high_score_key());
        Self {
            game: sim::new_game(kind, config, seed),
            gate: TokenGate::new(config.gate.clone()),
            high_score,
            store,
            sink,
            accumulator: 0.0,
            input: TickInput::default(),
            ticks: 0,
            events: Vec::new(),
            outbox: Vec::new(),
            status: None,
            reported: false,
        }
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn game(&self) -> &dyn Arcade {
        self.game.as_ref()
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    pub fn gate(&self) -> &TokenGate {
        &self.gate
    }

    pub fn high_score(&self) -> &HighScore {
        &self.high_score
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Space, click or tap. Starts (or asks to start) a run when idle,
    /// otherwise the game's one-shot action.
    pub fn press_action(&mut self) {
        if self.game.phase().is_active() {
            self.input.action = true;
            return;
        }
        match self.gate.request_play() {
            PlayRequest::Send(msg) => {
                self.status = Some("Requesting play...".to_string());
                self.outbox.push(msg);
            }
            PlayRequest::AlreadyWaiting => {}
            PlayRequest::StartNow => self.start_run(),
        }
    }

    pub fn set_left(&mut self, held: bool) {
        self.input.left = held;
    }

    pub fn set_right(&mut self, held: bool) {
        self.input.right = held;
    }

    fn start_run(&mut self) {
        self.game.start_run();
        self.reported = false;
        self.status = None;
        self.accumulator = 0.0;
    }

    /// Advance by a frame's worth of fixed ticks
    pub fn update(&mut self, frame_dt: f32) {
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    /// Exactly one fixed tick
    pub fn step(&mut self) {
        if self.gate.tick() {
            self.status = Some("No answer from host, try again".to_string());
        }

        let input = self.input.clone();
        self.game.tick(&input, &mut self.events);
        self.ticks += 1;
        // One-shot inputs are consumed by the tick that saw them
        self.input.action = false;

        for event in std::mem::take(&mut self.events) {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: GameEvent) {
        match event {
            GameEvent::LevelPassed { level } => {
                if self.gate.config().enabled {
                    self.outbox.push(self.gate.level_passed(level));
                }
            }
            GameEvent::GameOver {
                score,
                level,
                victory,
            } => {
                if self.reported {
                    return;
                }
                self.reported = true;
                let kind = self.kind();
                if self.high_score.observe(score, self.store.as_mut()) {
                    log::info!("New best for {}: {}", kind.as_str(), score);
                }
                self.sink.submit(ScoreReport {
                    game_id: kind.backend_id(),
                    score,
                    level,
                    victory,
                });
            }
            GameEvent::Scored { .. } | GameEvent::PlayerHit { .. } => {}
        }
    }

    /// A raw message from the host page
    pub fn receive(&mut self, origin: &str, json: &str) {
        let msg = match BridgeMessage::from_json(json) {
            Ok(msg) => msg,
            Err(e) => {
                log::debug!("Ignoring message from '{}': {}", origin, e);
                return;
            }
        };
        let active = self.game.phase().is_active();
        match self.gate.handle(origin, &msg, active) {
            GateAction::StartRun => self.start_run(),
            GateAction::Denied(reason) => self.status = Some(reason),
            GateAction::SetLevel(level) => {
                let applied = self.game.select_level(level);
                log::info!("Starting level set to {}", applied);
            }
            GateAction::Ignore => {}
        }
    }

    /// Messages for the host, oldest first
    pub fn drain_outbox(&mut self) -> Vec<BridgeMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        self.game.draw(canvas);

        let bottom = canvas.height() - 16.0;
        canvas.fill_text(
            &format!("Best: {}", self.high_score.best()),
            Vec2::new(canvas.width() - 10.0, bottom),
            14.0,
            Align::Right,
            Color::WHITE,
        );
        if let Some(status) = &self.status {
            canvas.fill_text(
                status,
                Vec2::new(canvas.width() / 2.0, canvas.height() / 2.0 + 70.0),
                16.0,
                Align::Center,
                Color::hex(0xffd166),
            );
        }
    }

    /// Whether the frame loop should keep running
    pub fn wants_frames(&self) -> bool {
        !self.game.phase().is_over() || self.gate.is_awaiting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;
    use crate::persistence::MemoryStore;
    use crate::renderer::RecordingCanvas;

    const HOST: &str = "http://localhost:9000";

    fn cabinet(kind: GameKind, gate: GateConfig) -> (Cabinet, ScoreLog) {
        let config = HubConfig {
            gate,
            ..Default::default()
        };
        let log = ScoreLog::new();
        let cabinet = Cabinet::new(
            kind,
            &config,
            3,
            Box::new(MemoryStore::new()),
            Box::new(log.clone()),
        );
        (cabinet, log)
    }

    fn ungated() -> GateConfig {
        GateConfig {
            enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_press_requests_play_once() {
        let (mut cab, _) = cabinet(GameKind::FlappyBird, GateConfig::default());
        cab.press_action();
        cab.press_action();
        let out = cab.drain_outbox();
        assert_eq!(out, vec![BridgeMessage::RequestPlay { request_id: 1 }]);
        assert_eq!(cab.phase(), GamePhase::Start);
        assert_eq!(cab.status(), Some("Requesting play..."));
    }

    #[test]
    fn test_grant_starts_run() {
        let (mut cab, _) = cabinet(GameKind::BubbleTrouble, GateConfig::default());
        cab.press_action();
        cab.receive(HOST, r#"{"type":"game:playAllowed","requestId":1}"#);
        assert_eq!(cab.phase(), GamePhase::Playing);
        assert_eq!(cab.status(), None);
    }

    #[test]
    fn test_refusal_shows_status() {
        let (mut cab, _) = cabinet(GameKind::Impossible, GateConfig::default());
        cab.press_action();
        cab.receive(HOST, r#"{"type":"game:insufficientTokens","requestId":1}"#);
        assert_eq!(cab.phase(), GamePhase::Start);
        assert!(cab.status().unwrap().contains("Insufficient tokens"));
        assert!(!cab.gate().is_awaiting());
    }

    #[test]
    fn test_garbage_messages_ignored() {
        let (mut cab, _) = cabinet(GameKind::Impossible, GateConfig::default());
        cab.receive(HOST, "{}");
        cab.receive(HOST, r#"{"type":"game:unknown"}"#);
        cab.receive(HOST, "[1,2,3]");
        assert_eq!(cab.phase(), GamePhase::Start);
    }

    #[test]
    fn test_set_level_before_start() {
        let (mut cab, _) = cabinet(GameKind::BubbleTrouble, GateConfig::default());
        cab.receive(HOST, r#"{"type":"game:setLevel","level":3}"#);
        cab.receive(HOST, r#"{"type":"game:start"}"#);
        assert_eq!(cab.game().run().level, 3);
    }

    #[test]
    fn test_update_runs_fixed_ticks() {
        let (mut cab, _) = cabinet(GameKind::Impossible, ungated());
        cab.press_action();
        cab.update(SIM_DT * 2.5);
        assert_eq!(cab.ticks(), 2);
        // Long stalls are clamped and substeps capped
        cab.update(5.0);
        assert_eq!(cab.ticks(), 2 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_action_is_one_shot() {
        let (mut cab, _) = cabinet(GameKind::FlappyBird, ungated());
        cab.press_action();
        cab.press_action();
        cab.step();
        let v = cab.game().run().score;
        assert_eq!(v, 0);
        assert!(!cab.input.action);
    }

    #[test]
    fn test_level_passed_goes_to_outbox_with_run_id() {
        let (mut cab, _) = cabinet(GameKind::Impossible, GateConfig::default());
        cab.press_action();
        cab.drain_outbox();
        cab.receive(HOST, r#"{"type":"game:playAllowed","requestId":1,"runId":31}"#);
        cab.apply(GameEvent::LevelPassed { level: 1 });
        assert_eq!(
            cab.drain_outbox(),
            vec![BridgeMessage::LevelPassed {
                run_id: Some(31),
                level: 1
            }]
        );
    }

    #[test]
    fn test_game_over_reported_once() {
        let (mut cab, log) = cabinet(GameKind::Impossible, ungated());
        cab.press_action();
        let over = GameEvent::GameOver {
            score: 12,
            level: 1,
            victory: false,
        };
        cab.apply(over);
        cab.apply(over);
        assert_eq!(
            log.reports(),
            vec![ScoreReport {
                game_id: 3,
                score: 12,
                level: 1,
                victory: false
            }]
        );
        assert_eq!(cab.high_score().best(), 12);
        assert_eq!(
            cab.store().get("impossibleHighScore").unwrap().as_deref(),
            Some("12")
        );
    }

    #[test]
    fn test_timeout_allows_retry() {
        let (mut cab, _) = cabinet(GameKind::FlappyBird, GateConfig::default());
        cab.press_action();
        cab.drain_outbox();
        let timeout = cab.gate().config().approval_timeout_ticks();
        for _ in 0..timeout {
            cab.step();
        }
        assert!(!cab.gate().is_awaiting());
        assert_eq!(cab.phase(), GamePhase::Start);
        cab.press_action();
        assert_eq!(
            cab.drain_outbox(),
            vec![BridgeMessage::RequestPlay { request_id: 2 }]
        );
    }

    #[test]
    fn test_render_shows_best_and_status() {
        let (mut cab, _) = cabinet(GameKind::FlappyBird, GateConfig::default());
        cab.press_action();
        let mut canvas = RecordingCanvas::new(400.0, 600.0);
        cab.render(&mut canvas);
        let texts = canvas.texts();
        assert!(texts.contains(&"Best: 0"));
        assert!(texts.contains(&"Requesting play..."));
    }

    #[test]
    fn test_frames_stop_after_game_over() {
        let (mut cab, _) = cabinet(GameKind::FlappyBird, ungated());
        assert!(cab.wants_frames());
        cab.press_action();
        for _ in 0..600 {
            cab.step();
        }
        assert!(cab.phase().is_over());
        assert!(!cab.wants_frames());
    }

    #[test]
    fn test_paused_run_resumes_where_it_left_off() {
        let (mut cab, _) = cabinet(GameKind::Impossible, ungated());
        cab.press_action();
        cab.update(SIM_DT);
        let ticks = cab.ticks();
        let score = cab.game().run().score;

        // Hidden page: no frames at all, then the first frame after return
        assert!(cab.wants_frames());
        cab.update(SIM_DT);
        assert_eq!(cab.phase(), GamePhase::Playing);
        assert_eq!(cab.ticks(), ticks + 1);
        assert!(cab.game().run().score >= score);
    }
}
