//! Host side of the token gate
//!
//! Answers every play request exactly once and fails closed: any problem
//! resolving the user or talking to the ledger is reported to the game as
//! insufficient tokens. Every grant carries a run id issued here, so runs
//! stay distinct across game reloads that restart request ids. Level rewards
//! are paid at most once per granted run and level.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::protocol::BridgeMessage;
use crate::config::GateConfig;
use crate::error::LedgerError;

pub const PLAY_DEDUCT: &str = "PLAY_DEDUCT";

pub fn level_reward_reason(level: u32) -> String {
    format!("LEVEL_REWARD:{}", level)
}

/// The external balance authority
pub trait TokenLedger {
    fn balance(&self, user: &str) -> Result<i64, LedgerError>;

    /// Apply a signed amount. Returns the new balance.
    fn create_transaction(&mut self, user: &str, amount: i64, reason: &str) -> Result<i64, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub user: String,
    pub amount: i64,
    pub reason: String,
}

/// In-process ledger. Debits below zero are refused.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<String, i64>,
    pub transactions: Vec<Transaction>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: &str, balance: i64) -> Self {
        self.balances.insert(user.to_string(), balance);
        self
    }
}

impl TokenLedger for MemoryLedger {
    fn balance(&self, user: &str) -> Result<i64, LedgerError> {
        self.balances
            .get(user)
            .copied()
            .ok_or(LedgerError::UnknownUser)
    }

    fn create_transaction(&mut self, user: &str, amount: i64, reason: &str) -> Result<i64, LedgerError> {
        let balance = self
            .balances
            .get_mut(user)
            .ok_or(LedgerError::UnknownUser)?;
        if *balance + amount < 0 {
            return Err(LedgerError::InsufficientBalance {
                balance: *balance,
                needed: -amount,
            });
        }
        *balance += amount;
        self.transactions.push(Transaction {
            user: user.to_string(),
            amount,
            reason: reason.to_string(),
        });
        Ok(*balance)
    }
}

/// Mediates one embedded game's requests against the ledger
#[derive(Debug)]
pub struct TokenHost<L: TokenLedger> {
    ledger: L,
    user: Option<String>,
    game_origin: String,
    play_cost: i64,
    level_reward: i64,
    next_run_id: u64,
    granted_runs: HashSet<u64>,
    rewarded: HashSet<(u64, u32)>,
}

impl<L: TokenLedger> TokenHost<L> {
    pub fn new(ledger: L, config: &GateConfig, game_origin: &str) -> Self {
        Self {
            ledger,
            user: None,
            game_origin: game_origin.to_string(),
            play_cost: config.play_cost,
            level_reward: config.level_reward,
            next_run_id: 1,
            granted_runs: HashSet::new(),
            rewarded: HashSet::new(),
        }
    }

    /// Set or clear the signed-in user
    pub fn sign_in(&mut self, user: Option<&str>) {
        self.user = user.map(str::to_string);
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Handle a message from the embedded game; returns the reply to post
    /// back, if any.
    pub fn handle(&mut self, origin: &str, msg: &BridgeMessage) -> Option<BridgeMessage> {
        if origin != self.game_origin {
            log::warn!("Host rejected {} from '{}'", msg.kind(), origin);
            return None;
        }
        match msg {
            BridgeMessage::RequestPlay { request_id } => Some(self.request_play(*request_id)),
            BridgeMessage::LevelPassed { run_id, level } => {
                self.level_passed(*run_id, *level);
                None
            }
            other => {
                log::debug!("Host ignoring {}", other.kind());
                None
            }
        }
    }

    fn request_play(&mut self, request_id: u64) -> BridgeMessage {
        match self.debit_play() {
            Ok(balance) => {
                let run_id = self.next_run_id;
                self.next_run_id += 1;
                log::info!(
                    "Play {} granted as run {}, balance now {}",
                    request_id,
                    run_id,
                    balance
                );
                self.granted_runs.insert(run_id);
                BridgeMessage::PlayAllowed {
                    request_id: Some(request_id),
                    run_id: Some(run_id),
                    payload: Some(json!({ "balance": balance })),
                }
            }
            Err(e) => {
                log::warn!("Play {} refused: {}", request_id, e);
                BridgeMessage::InsufficientTokens {
                    request_id: Some(request_id),
                    payload: Some(json!({ "reason": e.to_string() })),
                }
            }
        }
    }

    fn debit_play(&mut self) -> Result<i64, LedgerError> {
        let user = self.user.as_deref().ok_or(LedgerError::UnknownUser)?;
        let balance = self.ledger.balance(user)?;
        if balance < self.play_cost {
            return Err(LedgerError::InsufficientBalance {
                balance,
                needed: self.play_cost,
            });
        }
        self.ledger
            .create_transaction(user, -self.play_cost, PLAY_DEDUCT)
    }

    fn level_passed(&mut self, run_id: Option<u64>, level: u32) {
        let Some(run_id) = run_id.filter(|id| self.granted_runs.contains(id)) else {
            log::debug!("No reward for level {} outside a granted run", level);
            return;
        };
        let Some(user) = self.user.as_deref() else {
            return;
        };
        if !self.rewarded.insert((run_id, level)) {
            log::debug!("Level {} of run {} already rewarded", level, run_id);
            return;
        }
        if let Err(e) = self
            .ledger
            .create_transaction(user, self.level_reward, &level_reward_reason(level))
        {
            log::error!("Failed to award level {}: {}", level, e);
        }
    }
}
