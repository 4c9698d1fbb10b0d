use crate::interface_adapters::protocol::{ServerMessage, StatusResponse, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::log_throttle::{should_log, throttle_start};
use crate::use_cases::{BattleHandle, BattleStatus, WorldUpdate};

use axum::{
    Json,
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    WorldUpdatesClosed,
}

enum LoopControl {
    Continue,
    Disconnect,
}

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

// Tags one spectator connection in logs.
fn conn_id() -> u64 {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Tick counter and survivor count of the most recent world update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattleSummary {
    pub tick: u64,
    pub robots_alive: usize,
}

impl From<&WorldUpdate> for BattleSummary {
    fn from(update: &WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            robots_alive: update.robots.iter().filter(|r| r.health > 0).count(),
        }
    }
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
    summary_tx: watch::Sender<BattleSummary>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let _ = summary_tx.send(BattleSummary::from(&update));
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Latest bytes back lag recovery and late joiners.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

/// Spawns the serializer for a battle and returns the summary it keeps current.
pub fn spawn_battle_serializer(battle: &BattleHandle) -> watch::Receiver<BattleSummary> {
    let (summary_tx, summary_rx) = watch::channel(BattleSummary::default());
    tokio::spawn(world_update_serializer(
        battle.world_tx.subscribe(),
        battle.world_bytes_tx.clone(),
        battle.world_latest_tx.clone(),
        summary_tx,
    ));
    summary_rx
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = *state.summary_rx.borrow();
    let phase = state.battle.status_tx.borrow().clone();
    Json(StatusResponse {
        tick: summary.tick,
        phase: phase.into(),
        robots_alive: summary.robots_alive,
    })
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let battle = state.battle.clone();
    ws.on_upgrade(move |socket| {
        let span = info_span!("spectator", conn_id = conn_id());
        handle_socket(socket, battle).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, battle: BattleHandle) {
    // Subscribe before the first await so no update slips between snapshot and stream.
    let mut world_bytes_rx = battle.world_bytes_tx.subscribe();
    let world_latest_rx = battle.world_latest_tx.subscribe();
    let mut status_rx = battle.status_tx.subscribe();

    info!("spectator connected");
    if let Err(e) = run_spectator_loop(
        &mut socket,
        &mut world_bytes_rx,
        &world_latest_rx,
        &mut status_rx,
    )
    .await
    {
        warn!(error = ?e, "spectator loop exited with error");
    }
    let _ = socket.close().await;
    info!("spectator disconnected");
}

async fn run_spectator_loop(
    socket: &mut WebSocket,
    world_bytes_rx: &mut broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: &watch::Receiver<Utf8Bytes>,
    status_rx: &mut watch::Receiver<BattleStatus>,
) -> Result<(), NetError> {
    let initial_status = status_rx.borrow_and_update().clone();
    send_message(socket, &ServerMessage::BattleState(initial_status.into())).await?;
    let latest = world_latest_rx.borrow().clone();
    if !latest.as_str().is_empty() {
        send_bytes(socket, latest).await?;
    }

    let mut last_lag_log = throttle_start();
    let mut lag_recoveries = 0u64;

    loop {
        let control = tokio::select! {
            incoming = socket.recv() => handle_incoming(incoming),

            world_msg = world_bytes_rx.recv() => match world_msg {
                Ok(bytes) => {
                    send_bytes(socket, bytes).await?;
                    LoopControl::Continue
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    lag_recoveries += 1;
                    if should_log(&mut last_lag_log) {
                        warn!(missed, lag_recoveries, "spectator lagged; resyncing to latest update");
                    }
                    let latest = world_latest_rx.borrow().clone();
                    send_bytes(socket, latest).await?;
                    LoopControl::Continue
                }
                Err(broadcast::error::RecvError::Closed) => return Err(NetError::WorldUpdatesClosed),
            },

            changed = status_rx.changed() => match changed {
                Ok(()) => {
                    let status = status_rx.borrow_and_update().clone();
                    send_message(socket, &ServerMessage::BattleState(status.into())).await?;
                    LoopControl::Continue
                }
                // The battle is gone; nothing more will be published.
                Err(_) => LoopControl::Disconnect,
            },
        };

        if let LoopControl::Disconnect = control {
            return Ok(());
        }
    }
}

// Spectators only watch; text they send is ignored.
fn handle_incoming(incoming: Option<Result<Message, axum::Error>>) -> LoopControl {
    match incoming {
        None | Some(Err(_)) | Some(Ok(Message::Close(_))) => LoopControl::Disconnect,
        Some(Ok(_)) => LoopControl::Continue,
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)
}

async fn send_bytes(socket: &mut WebSocket, bytes: Utf8Bytes) -> Result<(), NetError> {
    socket
        .send(Message::Text(bytes))
        .await
        .map_err(NetError::Ws)
}
