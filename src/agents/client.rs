// Agent-side handle for driving one robot over its channel.

use crate::domain::{CallbackId, CommandStatus, RobotId};
use crate::interface_adapters::protocol::AgentMessage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};

type OutcomeSlots = HashMap<CallbackId, oneshot::Sender<Option<CommandStatus>>>;

/// Commands awaiting the authority's CALLBACK, keyed by callback id.
pub(crate) type PendingMap = Arc<Mutex<OutcomeSlots>>;

pub(crate) fn lock_pending(pending: &PendingMap) -> MutexGuard<'_, OutcomeSlots> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The authority closed the channel or retired the robot.
    Disconnected,
    /// The authority did not open with INFO and RUN.
    Handshake(&'static str),
}

/// Arena size reported in the INFO handshake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaInfo {
    pub width: f32,
    pub height: f32,
}

/// A command the authority has accepted for delivery; resolves when its CALLBACK arrives.
#[derive(Debug)]
pub struct PendingCommand {
    callback_id: CallbackId,
    outcome_rx: oneshot::Receiver<Option<CommandStatus>>,
}

impl PendingCommand {
    pub fn callback_id(&self) -> &CallbackId {
        &self.callback_id
    }

    /// Waits for completion. Turret rotations resolve to `None`.
    pub async fn outcome(self) -> Result<Option<CommandStatus>, AgentError> {
        self.outcome_rx.await.map_err(|_| AgentError::Disconnected)
    }

    /// Non-blocking check; `None` while the command is still running.
    pub fn try_outcome(&mut self) -> Option<Result<Option<CommandStatus>, AgentError>> {
        match self.outcome_rx.try_recv() {
            Ok(status) => Some(Ok(status)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(AgentError::Disconnected)),
        }
    }
}

pub struct RobotClient {
    robot_id: RobotId,
    arena: ArenaInfo,
    outbox: mpsc::Sender<String>,
    pending: PendingMap,
    position_rx: watch::Receiver<Option<(f32, f32)>>,
    next_callback: AtomicU64,
}

impl RobotClient {
    pub(crate) fn new(
        robot_id: RobotId,
        arena: ArenaInfo,
        outbox: mpsc::Sender<String>,
        pending: PendingMap,
        position_rx: watch::Receiver<Option<(f32, f32)>>,
    ) -> Self {
        Self {
            robot_id,
            arena,
            outbox,
            pending,
            position_rx,
            next_callback: AtomicU64::new(1),
        }
    }

    pub fn id(&self) -> &str {
        &self.robot_id
    }

    pub fn arena(&self) -> ArenaInfo {
        self.arena
    }

    /// Last position the authority reported, if any.
    pub fn position(&self) -> Option<(f32, f32)> {
        *self.position_rx.borrow()
    }

    pub async fn move_forward(&self, distance: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::Move {
            distance: distance.abs(),
            callback_id,
        })
        .await
    }

    pub async fn move_backward(&self, distance: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::Move {
            distance: -distance.abs(),
            callback_id,
        })
        .await
    }

    pub async fn turn_right(&self, angle: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::Rotate {
            angle: angle.abs(),
            callback_id,
        })
        .await
    }

    pub async fn turn_left(&self, angle: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::Rotate {
            angle: -angle.abs(),
            callback_id,
        })
        .await
    }

    pub async fn turn_turret_right(&self, angle: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::RotateTurret {
            angle: angle.abs(),
            callback_id,
        })
        .await
    }

    pub async fn turn_turret_left(&self, angle: f32) -> Result<PendingCommand, AgentError> {
        self.command(|callback_id| AgentMessage::RotateTurret {
            angle: -angle.abs(),
            callback_id,
        })
        .await
    }

    /// Fires along the turret; whether a bullet actually leaves depends on the fire policy.
    pub async fn shoot(&self) -> Result<(), AgentError> {
        self.send(&AgentMessage::Shoot).await
    }

    async fn command(
        &self,
        build: impl FnOnce(Option<CallbackId>) -> AgentMessage,
    ) -> Result<PendingCommand, AgentError> {
        let callback_id = CallbackId::Number(self.next_callback.fetch_add(1, Ordering::Relaxed));
        let (outcome_tx, outcome_rx) = oneshot::channel();
        lock_pending(&self.pending).insert(callback_id.clone(), outcome_tx);

        if let Err(e) = self.send(&build(Some(callback_id.clone()))).await {
            lock_pending(&self.pending).remove(&callback_id);
            return Err(e);
        }
        Ok(PendingCommand {
            callback_id,
            outcome_rx,
        })
    }

    async fn send(&self, message: &AgentMessage) -> Result<(), AgentError> {
        let text = serde_json::to_string(message).map_err(|_| AgentError::Disconnected)?;
        self.outbox
            .send(text)
            .await
            .map_err(|_| AgentError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (RobotClient, mpsc::Receiver<String>, PendingMap) {
        let (outbox, inbox) = mpsc::channel(8);
        let pending = PendingMap::default();
        let (_position_tx, position_rx) = watch::channel(None);
        let client = RobotClient::new(
            "alpha".to_string(),
            ArenaInfo {
                width: 800.0,
                height: 400.0,
            },
            outbox,
            pending.clone(),
            position_rx,
        );
        (client, inbox, pending)
    }

    #[tokio::test]
    async fn when_turning_left_then_angle_is_sent_negative_with_a_fresh_callback() {
        let (client, mut inbox, pending) = client();

        let first = client.turn_left(90.0).await.unwrap();
        let second = client.move_backward(-10.0).await.unwrap();

        let sent: AgentMessage = serde_json::from_str(&inbox.recv().await.unwrap()).unwrap();
        assert_eq!(
            sent,
            AgentMessage::Rotate {
                angle: -90.0,
                callback_id: Some(first.callback_id().clone()),
            }
        );
        let sent: AgentMessage = serde_json::from_str(&inbox.recv().await.unwrap()).unwrap();
        assert_eq!(
            sent,
            AgentMessage::Move {
                distance: -10.0,
                callback_id: Some(second.callback_id().clone()),
            }
        );
        assert_ne!(first.callback_id(), second.callback_id());
        assert_eq!(lock_pending(&pending).len(), 2);
    }

    #[tokio::test]
    async fn when_callback_resolves_then_outcome_reports_status() {
        let (client, _inbox, pending) = client();
        let mut command = client.move_forward(5.0).await.unwrap();
        assert!(command.try_outcome().is_none());

        let tx = lock_pending(&pending).remove(command.callback_id()).unwrap();
        tx.send(Some(CommandStatus::WallCollide)).unwrap();

        assert_eq!(command.outcome().await, Ok(Some(CommandStatus::WallCollide)));
    }

    #[tokio::test]
    async fn when_authority_is_gone_then_commands_fail_and_leave_nothing_pending() {
        let (client, inbox, pending) = client();
        drop(inbox);

        let result = client.turn_turret_right(45.0).await;

        assert!(matches!(result, Err(AgentError::Disconnected)));
        assert!(lock_pending(&pending).is_empty());
        assert_eq!(client.shoot().await, Err(AgentError::Disconnected));
    }
}
