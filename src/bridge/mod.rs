//! Token-gate bridge between an embedded game and its host page
//!
//! The game asks before every run (`game:requestPlay`), the host debits the
//! player's token balance and answers with `game:playAllowed` or
//! `game:insufficientTokens`. Cleared levels are reported back for rewards.

pub mod gate;
pub mod host;
pub mod protocol;

pub use gate::{GateAction, PlayRequest, TokenGate};
pub use host::{MemoryLedger, TokenHost, TokenLedger, Transaction};
pub use protocol::BridgeMessage;
