use std::collections::HashMap;
use std::fmt;

/// Transport-assigned identifier of a live websocket connection.
pub type ConnId = String;

/// A connection bound to a display name inside one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub conn_id: ConnId,
    pub display_name: String,
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateConnection,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateConnection => write!(f, "connection already joined a room"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Connection registry with a secondary room index.
///
/// Rooms are never created explicitly: an index entry appears with the first
/// member and is dropped together with the last one.
#[derive(Debug, Default)]
pub struct Registry {
    participants: HashMap<ConnId, Participant>,
    // room_id -> conn ids in join order
    rooms: HashMap<String, Vec<ConnId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `conn_id` to a room. A connection can join only once per lifetime.
    pub fn register(
        &mut self,
        conn_id: &str,
        display_name: &str,
        room_id: &str,
    ) -> Result<(), RegistryError> {
        if self.participants.contains_key(conn_id) {
            return Err(RegistryError::DuplicateConnection);
        }

        self.participants.insert(
            conn_id.to_string(),
            Participant {
                conn_id: conn_id.to_string(),
                display_name: display_name.to_string(),
                room_id: room_id.to_string(),
            },
        );
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .push(conn_id.to_string());

        Ok(())
    }

    /// Remove the participant for `conn_id`, if any.
    pub fn remove(&mut self, conn_id: &str) -> Option<Participant> {
        let participant = self.participants.remove(conn_id)?;

        if let Some(members) = self.rooms.get_mut(&participant.room_id) {
            members.retain(|id| id != conn_id);
            if members.is_empty() {
                self.rooms.remove(&participant.room_id);
            }
        }

        Some(participant)
    }

    /// Participants of `room_id` ordered by join time.
    pub fn members_of(&self, room_id: &str) -> Vec<Participant> {
        self.rooms
            .get(room_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.participants.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, conn_id: &str) -> Option<&Participant> {
        self.participants.get(conn_id)
    }

    pub fn contains(&self, conn_id: &str) -> bool {
        self.participants.contains_key(conn_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
