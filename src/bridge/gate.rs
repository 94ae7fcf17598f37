//! Game side of the token gate
//!
//! A run may only begin after the host approves a play request. Each request
//! carries a fresh id; a grant is honoured only if it echoes the id of the
//! single outstanding request, so late, duplicated or forged grants cannot
//! start a second run. Request ids are only unique within one mount; the
//! run id that tags level rewards is issued by the host in the grant.

use super::protocol::BridgeMessage;
use crate::config::GateConfig;

/// Result of asking to play
#[derive(Debug, Clone, PartialEq)]
pub enum PlayRequest {
    /// Post this to the host and wait for an answer
    Send(BridgeMessage),
    /// A request is already outstanding; nothing sent
    AlreadyWaiting,
    /// Gate disabled: start right away
    StartNow,
}

/// What the game should do with an incoming host message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Begin a run
    StartRun,
    /// Request refused; show the reason
    Denied(String),
    /// Select the starting level
    SetLevel(u32),
    /// Nothing to do
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    request_id: u64,
    ticks_left: u32,
}

#[derive(Debug, Clone)]
pub struct TokenGate {
    config: GateConfig,
    next_request_id: u64,
    pending: Option<Pending>,
    /// Host-issued id of the current run, used to tag level rewards
    run_id: Option<u64>,
}

impl TokenGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            next_request_id: 1,
            pending: None,
            run_id: None,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn run_id(&self) -> Option<u64> {
        self.run_id
    }

    /// Ask the host for permission to start a run
    pub fn request_play(&mut self) -> PlayRequest {
        if !self.config.enabled {
            self.run_id = None;
            return PlayRequest::StartNow;
        }
        if self.pending.is_some() {
            return PlayRequest::AlreadyWaiting;
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some(Pending {
            request_id,
            ticks_left: self.config.approval_timeout_ticks(),
        });
        log::info!("Requesting play approval (request {})", request_id);
        PlayRequest::Send(BridgeMessage::RequestPlay { request_id })
    }

    /// Count down the outstanding request. Returns true when it times out.
    pub fn tick(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        if pending.ticks_left > 1 {
            pending.ticks_left -= 1;
            return false;
        }
        log::warn!(
            "Play request {} got no answer, giving up",
            pending.request_id
        );
        self.pending = None;
        true
    }

    /// Handle a message from `origin`. `run_active` is whether the game is
    /// mid-run right now.
    pub fn handle(&mut self, origin: &str, msg: &BridgeMessage, run_active: bool) -> GateAction {
        if !self.config.origin_allowed(origin) {
            log::warn!("Rejected {} from untrusted origin '{}'", msg.kind(), origin);
            return GateAction::Ignore;
        }

        match msg {
            BridgeMessage::PlayAllowed {
                request_id, run_id, ..
            } => {
                if !self.take_pending(*request_id) {
                    log::warn!("Discarding stale play grant {:?}", request_id);
                    return GateAction::Ignore;
                }
                if run_active {
                    log::warn!("Play grant arrived mid-run, discarding");
                    return GateAction::Ignore;
                }
                self.run_id = *run_id;
                GateAction::StartRun
            }
            BridgeMessage::InsufficientTokens { request_id, .. } => {
                if !self.take_pending(*request_id) {
                    log::debug!("Discarding stale refusal {:?}", request_id);
                    return GateAction::Ignore;
                }
                GateAction::Denied("Insufficient tokens, please buy more".to_string())
            }
            BridgeMessage::SetLevel { level } => GateAction::SetLevel(*level),
            BridgeMessage::Start => {
                if run_active {
                    return GateAction::Ignore;
                }
                // The host started us itself; an outstanding request is moot
                if let Some(pending) = self.pending.take() {
                    log::info!("Host start supersedes play request {}", pending.request_id);
                }
                self.run_id = None;
                GateAction::StartRun
            }
            BridgeMessage::RequestPlay { .. } | BridgeMessage::LevelPassed { .. } => {
                log::debug!("Ignoring game-bound {} echo", msg.kind());
                GateAction::Ignore
            }
        }
    }

    /// Clears the outstanding request if `id` answers it
    fn take_pending(&mut self, id: Option<u64>) -> bool {
        match (self.pending, id) {
            (Some(pending), Some(id)) if pending.request_id == id => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Message reporting a cleared level for the current run
    pub fn level_passed(&self, level: u32) -> BridgeMessage {
        BridgeMessage::LevelPassed {
            run_id: self.run_id,
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "http://localhost:9000";

    fn gate() -> TokenGate {
        TokenGate::new(GateConfig::default())
    }

    fn allowed(id: u64) -> BridgeMessage {
        BridgeMessage::PlayAllowed {
            request_id: Some(id),
            run_id: Some(100 + id),
            payload: None,
        }
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut gate = gate();
        assert_eq!(
            gate.request_play(),
            PlayRequest::Send(BridgeMessage::RequestPlay { request_id: 1 })
        );
        assert_eq!(gate.request_play(), PlayRequest::AlreadyWaiting);
        assert_eq!(gate.request_play(), PlayRequest::AlreadyWaiting);
        assert!(gate.is_awaiting());
    }

    #[test]
    fn test_matching_grant_starts() {
        let mut gate = gate();
        gate.request_play();
        assert_eq!(gate.handle(HOST, &allowed(1), false), GateAction::StartRun);
        assert!(!gate.is_awaiting());
        assert_eq!(gate.run_id(), Some(101));
        assert_eq!(
            gate.level_passed(3),
            BridgeMessage::LevelPassed {
                run_id: Some(101),
                level: 3
            }
        );
    }

    #[test]
    fn test_duplicate_grant_discarded() {
        let mut gate = gate();
        gate.request_play();
        assert_eq!(gate.handle(HOST, &allowed(1), false), GateAction::StartRun);
        assert_eq!(gate.handle(HOST, &allowed(1), true), GateAction::Ignore);
        assert_eq!(gate.handle(HOST, &allowed(1), false), GateAction::Ignore);
    }

    #[test]
    fn test_uncorrelated_grant_discarded() {
        let mut gate = gate();
        gate.request_play();
        let bare = BridgeMessage::PlayAllowed {
            request_id: None,
            run_id: Some(5),
            payload: None,
        };
        assert_eq!(gate.handle(HOST, &bare, false), GateAction::Ignore);
        assert_eq!(gate.handle(HOST, &allowed(9), false), GateAction::Ignore);
        assert!(gate.is_awaiting());
    }

    #[test]
    fn test_refusal_clears_and_allows_retry() {
        let mut gate = gate();
        gate.request_play();
        let refusal = BridgeMessage::InsufficientTokens {
            request_id: Some(1),
            payload: None,
        };
        assert!(matches!(gate.handle(HOST, &refusal, false), GateAction::Denied(_)));
        assert!(!gate.is_awaiting());
        assert_eq!(
            gate.request_play(),
            PlayRequest::Send(BridgeMessage::RequestPlay { request_id: 2 })
        );
    }

    #[test]
    fn test_untrusted_origin_rejected() {
        let mut gate = gate();
        gate.request_play();
        assert_eq!(
            gate.handle("https://evil.example", &allowed(1), false),
            GateAction::Ignore
        );
        assert!(gate.is_awaiting());
        assert_eq!(
            gate.handle("https://evil.example", &BridgeMessage::Start, false),
            GateAction::Ignore
        );
    }

    #[test]
    fn test_timeout_clears_pending() {
        let mut gate = gate();
        gate.request_play();
        let ticks = gate.config().approval_timeout_ticks();
        for _ in 1..ticks {
            assert!(!gate.tick());
        }
        assert!(gate.tick());
        assert!(!gate.is_awaiting());
        assert!(!gate.tick());
        // The answer arriving after the timeout is stale
        assert_eq!(gate.handle(HOST, &allowed(1), false), GateAction::Ignore);
    }

    #[test]
    fn test_disabled_gate_starts_immediately() {
        let mut gate = TokenGate::new(GateConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(gate.request_play(), PlayRequest::StartNow);
        assert!(!gate.is_awaiting());
    }

    #[test]
    fn test_host_commands() {
        let mut gate = gate();
        assert_eq!(
            gate.handle(HOST, &BridgeMessage::SetLevel { level: 3 }, false),
            GateAction::SetLevel(3)
        );
        assert_eq!(gate.handle(HOST, &BridgeMessage::Start, false), GateAction::StartRun);
        assert_eq!(gate.handle(HOST, &BridgeMessage::Start, true), GateAction::Ignore);
        assert_eq!(gate.run_id(), None);
    }

    #[test]
    fn test_grant_without_run_id_starts_untagged() {
        let mut gate = gate();
        gate.request_play();
        let grant = BridgeMessage::PlayAllowed {
            request_id: Some(1),
            run_id: None,
            payload: None,
        };
        assert_eq!(gate.handle(HOST, &grant, false), GateAction::StartRun);
        assert_eq!(gate.run_id(), None);
    }

    #[test]
    fn test_host_start_supersedes_pending_request() {
        let mut gate = gate();
        gate.request_play();
        assert_eq!(gate.handle(HOST, &BridgeMessage::Start, false), GateAction::StartRun);
        assert!(!gate.is_awaiting());
        assert!(!gate.tick());
        // The answer to the superseded request no longer applies
        assert_eq!(gate.handle(HOST, &allowed(1), true), GateAction::Ignore);
        assert_eq!(gate.handle(HOST, &allowed(1), false), GateAction::Ignore);
        assert_eq!(
            gate.request_play(),
            PlayRequest::Send(BridgeMessage::RequestPlay { request_id: 2 })
        );
    }
}
