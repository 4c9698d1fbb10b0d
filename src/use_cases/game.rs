use super::types::{BattleStatus, GameEvent, WorldUpdate};
use crate::domain::{Battle, Outbound, RobotEvent, RobotId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Authoritative battle loop. Sole owner of the battle state; agents only reach it through
/// `input_rx` and hear back through their per-robot event senders.
pub async fn world_task(
    mut battle: Battle,
    mut input_rx: mpsc::Receiver<GameEvent>,
    mut agents: HashMap<RobotId, mpsc::UnboundedSender<RobotEvent>>,
    world_tx: broadcast::Sender<WorldUpdate>,
    status_tx: watch::Sender<BattleStatus>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    // INFO goes out before RUN so agents know the arena before they act.
    deliver(&agents, battle.drain_outbox());
    battle.start();
    deliver(&agents, battle.drain_outbox());
    let _ = status_tx.send(battle.phase().clone());
    publish(&battle, &world_tx);

    // Drive the fixed-step loop. Late ticks are burst-run so no step is ever skipped.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut finished = false;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!(tick = battle.tick_count(), "battle shutdown requested");
                break;
            }
            _ = interval.tick() => {}
        }

        // Ingest whatever arrived since the last tick without waiting for slow agents.
        while let Ok(ev) = input_rx.try_recv() {
            match ev {
                GameEvent::Command { robot_id, command } => battle.submit(&robot_id, command),
                GameEvent::Detached { robot_id } => {
                    info!(%robot_id, "agent detached; robot idles");
                }
            }
        }

        let report = battle.tick();
        deliver(&agents, battle.drain_outbox());
        for robot_id in &report.retired {
            // Dropping the sender closes this robot's agent link.
            agents.remove(robot_id);
        }
        publish(&battle, &world_tx);

        if report.finished {
            let _ = status_tx.send(battle.phase().clone());
            finished = true;
        }
        if finished && battle.is_settled() {
            info!(tick = report.tick, "battle settled; world task exiting");
            break;
        }
    }
}

fn deliver(agents: &HashMap<RobotId, mpsc::UnboundedSender<RobotEvent>>, outbox: Vec<Outbound>) {
    for Outbound { robot_id, event } in outbox {
        let Some(tx) = agents.get(&robot_id) else {
            continue;
        };
        if tx.send(event).is_err() {
            debug!(%robot_id, "agent link closed; event dropped");
        }
    }
}

fn publish(battle: &Battle, world_tx: &broadcast::Sender<WorldUpdate>) {
    // No subscribers is fine; spectators come and go.
    let _ = world_tx.send(WorldUpdate {
        tick: battle.tick_count(),
        robots: battle.robot_snapshots(),
        bullets: battle.bullet_snapshots(),
        explosions: battle.explosion_snapshots(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::RobotTuning;
    use crate::domain::{AgentCommand, Arena, CallbackId, CommandStatus, Tuning};

    const TICK: Duration = Duration::from_millis(5);

    struct Harness {
        input_tx: mpsc::Sender<GameEvent>,
        events_rx: mpsc::UnboundedReceiver<RobotEvent>,
        status_rx: watch::Receiver<BattleStatus>,
        world_rx: broadcast::Receiver<WorldUpdate>,
        shutdown: Arc<Notify>,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn_solo(robot: RobotTuning, x: f32, y: f32) -> Harness {
        let tuning = Tuning {
            robot,
            ..Tuning::default()
        };
        let mut battle = Battle::new(Arena::default(), tuning, TICK);
        battle.add_robot("solo", x, y).unwrap();

        let (input_tx, input_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (world_tx, world_rx) = broadcast::channel(1024);
        let (status_tx, status_rx) = watch::channel(BattleStatus::Preparing);
        let shutdown = Arc::new(Notify::new());
        let agents = HashMap::from([("solo".to_string(), events_tx)]);

        let task = tokio::spawn(world_task(
            battle,
            input_rx,
            agents,
            world_tx,
            status_tx,
            TICK,
            shutdown.clone(),
        ));

        Harness {
            input_tx,
            events_rx,
            status_rx,
            world_rx,
            shutdown,
            task,
        }
    }

    async fn next_callback(events_rx: &mut mpsc::UnboundedReceiver<RobotEvent>) -> RobotEvent {
        loop {
            let event = events_rx.recv().await.expect("agent link closed early");
            if matches!(event, RobotEvent::Callback { .. }) {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn when_world_task_starts_then_agent_gets_info_then_run() {
        let mut h = spawn_solo(RobotTuning::default(), 100.0, 100.0);

        assert_eq!(
            h.events_rx.recv().await,
            Some(RobotEvent::Info {
                arena_width: 800.0,
                arena_height: 400.0
            })
        );
        assert_eq!(h.events_rx.recv().await, Some(RobotEvent::Run));
        h.status_rx.changed().await.unwrap();
        assert_eq!(*h.status_rx.borrow(), BattleStatus::Running);

        h.shutdown.notify_one();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn when_agent_sends_a_move_then_callback_comes_back_after_the_steps() {
        let robot = RobotTuning {
            spawn_direction: 0.0,
            ..RobotTuning::default()
        };
        let mut h = spawn_solo(robot, 100.0, 100.0);

        h.input_tx
            .send(GameEvent::Command {
                robot_id: "solo".into(),
                command: AgentCommand::Move {
                    distance: 3.0,
                    callback_id: Some(CallbackId::Text("m1".into())),
                },
            })
            .await
            .unwrap();

        let mut positions = Vec::new();
        let callback = loop {
            match h.events_rx.recv().await.expect("link closed") {
                RobotEvent::Position { x, .. } => positions.push(x),
                event @ RobotEvent::Callback { .. } => break event,
                _ => {}
            }
        };

        assert_eq!(
            callback,
            RobotEvent::Callback {
                callback_id: Some(CallbackId::Text("m1".into())),
                status: Some(CommandStatus::Done),
            }
        );
        assert_eq!(positions, vec![101.0, 102.0, 103.0]);

        h.shutdown.notify_one();
        h.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn when_solo_robot_dies_then_link_closes_and_task_exits_once_settled() {
        let robot = RobotTuning {
            spawn_direction: 180.0,
            max_health: 1,
            ..RobotTuning::default()
        };
        let mut h = spawn_solo(robot, 2.5, 100.0);

        h.input_tx
            .send(GameEvent::Command {
                robot_id: "solo".into(),
                command: AgentCommand::Move {
                    distance: 5.0,
                    callback_id: Some(CallbackId::Number(1)),
                },
            })
            .await
            .unwrap();

        assert_eq!(
            next_callback(&mut h.events_rx).await,
            RobotEvent::Callback {
                callback_id: Some(CallbackId::Number(1)),
                status: Some(CommandStatus::WallCollide),
            }
        );

        // Link is closed once the robot is retired.
        while h.events_rx.recv().await.is_some() {}

        h.task.await.unwrap();
        assert_eq!(*h.status_rx.borrow(), BattleStatus::Finished { winner: None });

        let mut last = None;
        while let Ok(update) = h.world_rx.try_recv() {
            last = Some(update);
        }
        let last = last.expect("world updates were published");
        assert!(last.robots.is_empty());
        assert!(last.explosions.is_empty());
    }
}
