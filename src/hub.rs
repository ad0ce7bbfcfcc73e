//! Room membership, join choreography and signaling relay.
//!
//! [`Hub`] is plain synchronous state. It is owned by exactly one task (see
//! [`crate::actor`]), which is what serializes registry mutations.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::room::{ConnId, Participant, Registry, RegistryError};
use crate::signal::{MemberNotice, ServerMessage};

/// Outbound queue of one connection, drained by its websocket writer task.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    /// Empty connection id, display name or room id.
    InvalidJoinRequest,
    /// The connection already joined a room.
    DuplicateConnection,
    /// The hub task has stopped; nothing was registered.
    HubUnavailable,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::InvalidJoinRequest => write!(f, "display name and room id are required"),
            JoinError::DuplicateConnection => write!(f, "connection already joined a room"),
            JoinError::HubUnavailable => write!(f, "signaling hub is not running"),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<RegistryError> for JoinError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateConnection => JoinError::DuplicateConnection,
        }
    }
}

#[derive(Debug, Default)]
pub struct Hub {
    registry: Registry,
    outboxes: HashMap<ConnId, Outbox>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Make a freshly accepted connection reachable. It is not a room member yet.
    pub fn attach(&mut self, conn_id: &str, outbox: Outbox) {
        self.outboxes.insert(conn_id.to_string(), outbox);
        tracing::debug!(conn_id = %conn_id, connections = self.outboxes.len(), "connection attached");
    }

    /// Put `conn_id` into `room_id` and introduce it to the current members.
    ///
    /// The joiner hears about every member first, then the members hear about
    /// the joiner. Both loops walk the snapshot taken before the insert, so the
    /// joiner never gets a notice about itself and the later joiner of every
    /// pair is the one expected to send the offer.
    ///
    /// Returns how many members were already in the room.
    pub fn join(
        &mut self,
        conn_id: &str,
        display_name: &str,
        room_id: &str,
    ) -> Result<usize, JoinError> {
        if [conn_id, display_name, room_id]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(JoinError::InvalidJoinRequest);
        }
        if self.registry.contains(conn_id) {
            return Err(JoinError::DuplicateConnection);
        }

        let others = self.registry.members_of(room_id);

        for member in &others {
            self.send(
                conn_id,
                ServerMessage::ExistingMember(MemberNotice {
                    other_user_id: member.display_name.clone(),
                    conn_id: member.conn_id.clone(),
                }),
            );
        }

        self.registry.register(conn_id, display_name, room_id)?;

        for member in &others {
            self.send(
                &member.conn_id,
                ServerMessage::NewMember(MemberNotice {
                    other_user_id: display_name.to_string(),
                    conn_id: conn_id.to_string(),
                }),
            );
        }

        tracing::info!(
            conn_id = %conn_id,
            display_name = %display_name,
            room_id = %room_id,
            existing = others.len(),
            "participant joined"
        );

        Ok(others.len())
    }

    /// Forward `message` to `to` if it is a room member. Best effort: a missing
    /// recipient is dropped without telling the sender.
    pub fn relay(&self, from: &str, to: &str, message: Value) -> bool {
        if !self.registry.contains(to) {
            tracing::debug!(from = %from, to = %to, "relay target not registered, dropping");
            return false;
        }

        self.send(
            to,
            ServerMessage::Signal {
                message,
                from_conn_id: from.to_string(),
            },
        );
        true
    }

    /// Forget everything about `conn_id`. Other members are not notified.
    pub fn disconnect(&mut self, conn_id: &str) -> Option<Participant> {
        self.outboxes.remove(conn_id);
        let removed = self.registry.remove(conn_id);

        match &removed {
            Some(participant) => tracing::info!(
                conn_id = %conn_id,
                room_id = %participant.room_id,
                "participant left"
            ),
            None => tracing::debug!(conn_id = %conn_id, "connection closed before joining"),
        }

        removed
    }

    // Fire and forget: a closed outbox means the writer is already gone.
    fn send(&self, conn_id: &str, msg: ServerMessage) {
        if let Some(outbox) = self.outboxes.get(conn_id) {
            let _ = outbox.send(msg);
        }
    }
}
