use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::hub::{Hub, JoinError, Outbox};
use crate::room::{ConnId, Participant};

/// Events sent to the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// A websocket was accepted.
    Attach { conn_id: ConnId, outbox: Outbox },
    Join {
        conn_id: ConnId,
        display_name: String,
        room_id: String,
        reply: oneshot::Sender<Result<usize, JoinError>>,
    },
    Relay {
        from: ConnId,
        to: ConnId,
        message: Value,
    },
    /// The websocket closed or errored.
    Detach { conn_id: ConnId },
    MembersOf {
        room_id: String,
        reply: oneshot::Sender<Vec<Participant>>,
    },
}

/// Cloneable front door to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

/// Start the task that owns the [`Hub`]. It runs until every handle is dropped.
pub fn spawn_hub() -> HubHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_hub(Hub::new(), rx));
    HubHandle { tx }
}

async fn run_hub(mut hub: Hub, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    tracing::debug!("hub task started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            HubCommand::Attach { conn_id, outbox } => hub.attach(&conn_id, outbox),
            HubCommand::Join {
                conn_id,
                display_name,
                room_id,
                reply,
            } => {
                let _ = reply.send(hub.join(&conn_id, &display_name, &room_id));
            }
            HubCommand::Relay { from, to, message } => {
                hub.relay(&from, &to, message);
            }
            HubCommand::Detach { conn_id } => {
                hub.disconnect(&conn_id);
            }
            HubCommand::MembersOf { room_id, reply } => {
                let _ = reply.send(hub.registry().members_of(&room_id));
            }
        }
    }

    tracing::debug!("hub task stopped");
}

impl HubHandle {
    pub fn attach(&self, conn_id: &str, outbox: Outbox) {
        self.command(HubCommand::Attach {
            conn_id: conn_id.to_string(),
            outbox,
        });
    }

    /// Join a room; resolves once the hub has sent every notice for this join.
    pub async fn join(
        &self,
        conn_id: &str,
        display_name: &str,
        room_id: &str,
    ) -> Result<usize, JoinError> {
        let (reply, rx) = oneshot::channel();
        self.command(HubCommand::Join {
            conn_id: conn_id.to_string(),
            display_name: display_name.to_string(),
            room_id: room_id.to_string(),
            reply,
        });
        rx.await.unwrap_or_else(|_| {
            tracing::error!(conn_id = %conn_id, "hub task is gone, join not processed");
            Err(JoinError::HubUnavailable)
        })
    }

    pub fn relay(&self, from: &str, to: &str, message: Value) {
        self.command(HubCommand::Relay {
            from: from.to_string(),
            to: to.to_string(),
            message,
        });
    }

    pub fn detach(&self, conn_id: &str) {
        self.command(HubCommand::Detach {
            conn_id: conn_id.to_string(),
        });
    }

    pub async fn members_of(&self, room_id: &str) -> Vec<Participant> {
        let (reply, rx) = oneshot::channel();
        self.command(HubCommand::MembersOf {
            room_id: room_id.to_string(),
            reply,
        });
        rx.await.unwrap_or_default()
    }

    fn command(&self, cmd: HubCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("hub task is gone, dropping command");
        }
    }
}
