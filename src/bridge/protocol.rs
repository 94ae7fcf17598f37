//! Wire format shared by games and their host page
//!
//! Every message is a flat JSON object tagged by `type`:
//! `{ "type": "game:playAllowed", "requestId": 3 }`. Unknown types fail to
//! decode and are dropped by the receiver.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HubError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Game asks the host to debit a play
    #[serde(rename = "game:requestPlay", rename_all = "camelCase")]
    RequestPlay { request_id: u64 },

    /// Host granted the play request with this id. `run_id` is issued by
    /// the host and tags the run's `levelPassed` reports.
    #[serde(rename = "game:playAllowed", rename_all = "camelCase")]
    PlayAllowed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// Host refused the play request with this id
    #[serde(rename = "game:insufficientTokens", rename_all = "camelCase")]
    InsufficientTokens {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// Game cleared a level during a granted run
    #[serde(rename = "game:levelPassed", rename_all = "camelCase")]
    LevelPassed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<u64>,
        level: u32,
    },

    /// Host picks the starting level
    #[serde(rename = "game:setLevel")]
    SetLevel { level: u32 },

    /// Host starts a run without a token check
    #[serde(rename = "game:start")]
    Start,
}

impl BridgeMessage {
    pub fn from_json(json: &str) -> Result<Self, HubError> {
        serde_json::from_str(json).map_err(|e| HubError::Parse {
            what: "bridge message",
            reason: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, HubError> {
        serde_json::to_string(self).map_err(|e| HubError::Parse {
            what: "bridge message",
            reason: e.to_string(),
        })
    }

    /// The `type` tag as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::RequestPlay { .. } => "game:requestPlay",
            BridgeMessage::PlayAllowed { .. } => "game:playAllowed",
            BridgeMessage::InsufficientTokens { .. } => "game:insufficientTokens",
            BridgeMessage::LevelPassed { .. } => "game:levelPassed",
            BridgeMessage::SetLevel { .. } => "game:setLevel",
            BridgeMessage::Start => "game:start",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let msg = BridgeMessage::RequestPlay { request_id: 7 };
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "game:requestPlay", "requestId": 7 }));

        let msg = BridgeMessage::LevelPassed {
            run_id: Some(7),
            level: 2,
        };
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "type": "game:levelPassed", "runId": 7, "level": 2 })
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let msg = BridgeMessage::InsufficientTokens {
            request_id: None,
            payload: None,
        };
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"game:insufficientTokens"}"#);
        assert_eq!(BridgeMessage::Start.to_json().unwrap(), r#"{"type":"game:start"}"#);
    }

    #[test]
    fn test_decode_host_messages() {
        assert_eq!(
            BridgeMessage::from_json(
                r#"{"type":"game:playAllowed","requestId":3,"runId":12,"payload":{"balance":40}}"#
            )
            .unwrap(),
            BridgeMessage::PlayAllowed {
                request_id: Some(3),
                run_id: Some(12),
                payload: Some(json!({ "balance": 40 })),
            }
        );
        assert_eq!(
            BridgeMessage::from_json(r#"{"type":"game:playAllowed"}"#).unwrap(),
            BridgeMessage::PlayAllowed {
                request_id: None,
                run_id: None,
                payload: None,
            }
        );
        assert_eq!(
            BridgeMessage::from_json(r#"{"type":"game:setLevel","level":4}"#).unwrap(),
            BridgeMessage::SetLevel { level: 4 }
        );
        assert_eq!(
            BridgeMessage::from_json(r#"{"type":"game:start"}"#).unwrap(),
            BridgeMessage::Start
        );
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(matches!(
            BridgeMessage::from_json(r#"{"type":"game:teleport"}"#),
            Err(HubError::Parse { .. })
        ));
        assert!(BridgeMessage::from_json(r#"{"level":1}"#).is_err());
        assert!(BridgeMessage::from_json("not json").is_err());
    }
}
