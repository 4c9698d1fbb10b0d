// Framework bootstrap for the arena server runtime.

use crate::agents::{brain_by_name, run_agent};
use crate::domain::{Arena, Tuning};
use crate::frameworks::config;
use crate::interface_adapters::agent_channel::{agent_channel, run_agent_bridge};
use crate::interface_adapters::net::{spawn_battle_serializer, status_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{BattleSettings, launch_battle};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tracing::Instrument;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state()?;
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Result<Arc<AppState>> {
    let contestants = config::contestants();
    let seed = config::battle_seed();
    let mut tuning = Tuning::default();
    tuning.bullet.fire_policy = config::fire_policy();
    let settings = BattleSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        arena: Arena::default(),
        tuning,
        seed,
    };

    // All brains resolve before anything is spawned.
    let mut brains = Vec::with_capacity(contestants.len());
    for (index, name) in contestants.iter().enumerate() {
        let brain_seed = seed.wrapping_add(index as u64 + 1);
        let brain = brain_by_name(name, brain_seed)
            .ok_or_else(|| std::io::Error::other(format!("unknown contestant brain: {name}")))?;
        brains.push((format!("{name}{index}"), brain));
    }
    let roster = brains.iter().map(|(robot_id, _)| robot_id.clone()).collect();

    let (battle, ports) = launch_battle(&settings, roster)
        .map_err(|e| std::io::Error::other(format!("failed to launch battle: {e:?}")))?;
    tracing::info!(
        seed,
        fire_policy = ?settings.tuning.bullet.fire_policy,
        tick_ms = settings.tick_interval.as_millis() as u64,
        contestants = brains.len(),
        "battle launched"
    );
    let summary_rx = spawn_battle_serializer(&battle);

    for (port, (robot_id, brain)) in ports.into_iter().zip(brains) {
        let (link, endpoint) = agent_channel(config::AGENT_CHANNEL_CAPACITY);
        tokio::spawn(run_agent_bridge(port, link, battle.input_tx.clone()));

        let span = tracing::info_span!("agent", robot_id = %robot_id);
        tokio::spawn(
            async move {
                if let Err(e) = run_agent(robot_id, endpoint, brain).await {
                    tracing::warn!(error = ?e, "agent stopped");
                }
            }
            .instrument(span),
        );
    }

    Ok(Arc::new(AppState { battle, summary_rx }))
}
