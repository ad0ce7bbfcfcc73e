use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::room::ConnId;

// Frames are `{"event": ..., "data": {...}}`, one named event per websocket text frame.

/// Frames sent by browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Enter a room. Missing fields read as empty and are rejected by the hub.
    #[serde(rename = "userconnect")]
    Join {
        #[serde(default, rename = "displayName")]
        display_name: String,
        #[serde(default, rename = "roomID")]
        room_id: String,
    },
    /// Offer, answer or candidate for another connection. `message` is never inspected.
    #[serde(rename = "SDP_Process")]
    Signal {
        #[serde(default)]
        message: Value,
        #[serde(rename = "to_connId")]
        to_conn_id: ConnId,
    },
}

/// Peer announcement sent during the join sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberNotice {
    pub other_user_id: String,
    pub conn_id: ConnId,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// First frame on every socket: the id peers use to address this connection.
    #[serde(rename = "connected")]
    Connected { conn_id: ConnId },
    /// To a joiner, once per member already in the room. The joiner opens the
    /// peer link and sends the offer.
    #[serde(rename = "newuser_joined")]
    ExistingMember(MemberNotice),
    /// To each member already in the room, once per later joiner. The member
    /// waits for the joiner's offer.
    #[serde(rename = "member_joined")]
    NewMember(MemberNotice),
    #[serde(rename = "SDP_Process")]
    Signal {
        message: Value,
        #[serde(rename = "from_connId")]
        from_conn_id: ConnId,
    },
}
