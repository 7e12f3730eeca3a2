//! Wraps a [`Session`] in its own task, the way `runtime::map_server`
//! wraps per-map player state: only the task that owns the command
//! channel's receiver ever touches the session, so the session itself
//! needs no internal locking. This is the crate's "API strand" — one
//! instance per map rather than one process-wide queue, which is sound
//! because sessions never interact with each other.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};

use crate::model::loot::Loot;
use crate::model::map::Map;
use crate::model::player::{Direction, Player};
use crate::model::token::PlayerToken;
use crate::model::LootGeneratorConfig;
use crate::session::{JoinError, RetiredRecord, Session, SessionSnapshot};

enum Command {
    Join {
        name: String,
        reply: oneshot::Sender<Result<(PlayerToken, u64), JoinError>>,
    },
    Player {
        token: PlayerToken,
        reply: oneshot::Sender<Option<Player>>,
    },
    Players {
        reply: oneshot::Sender<Vec<Player>>,
    },
    Loot {
        reply: oneshot::Sender<Vec<Loot>>,
    },
    Action {
        token: PlayerToken,
        direction: Direction,
        reply: oneshot::Sender<bool>,
    },
    Tick {
        dt: f64,
        reply: oneshot::Sender<Vec<RetiredRecord>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    pub map: Arc<Map>,
}

impl SessionHandle {
    pub async fn join(&self, name: String) -> Result<(PlayerToken, u64), JoinError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Join { name, reply }).await;
        rx.await.unwrap_or(Err(JoinError::InvalidName))
    }

    pub async fn player(&self, token: PlayerToken) -> Option<Player> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Player { token, reply }).await;
        rx.await.ok().flatten()
    }

    pub async fn players(&self) -> Vec<Player> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Players { reply }).await;
        rx.await.unwrap_or_default()
    }

    pub async fn loot(&self) -> Vec<Loot> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Loot { reply }).await;
        rx.await.unwrap_or_default()
    }

    pub async fn apply_action(&self, token: PlayerToken, direction: Direction) -> bool {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .tx
            .send(Command::Action {
                token,
                direction,
                reply,
            })
            .await;
        rx.await.unwrap_or(false)
    }

    /// Runs one tick and returns the players it retired. Posted through
    /// the same queue as every other mutation, so it can never interleave
    /// with a concurrent join/action/snapshot on this session.
    pub async fn tick(&self, dt: f64) -> Vec<RetiredRecord> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Tick { dt, reply }).await;
        rx.await.unwrap_or_default()
    }

    /// Requests a snapshot through the command queue, guaranteeing it is
    /// observed either strictly before or strictly after any in-flight
    /// tick, never mid-tick.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Snapshot { reply }).await;
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

pub fn start_session(
    map: Arc<Map>,
    random_spawn: bool,
    retirement_threshold: f64,
    loot_config: LootGeneratorConfig,
    restore_from: Option<SessionSnapshot>,
) -> SessionHandle {
    let (tx, mut rx) = mpsc::channel::<Command>(4096);
    let map_for_actor = map.clone();

    tokio::spawn(async move {
        let mut session = match restore_from {
            Some(snapshot) => Session::restore(map_for_actor, random_spawn, retirement_threshold, snapshot),
            None => Session::new(map_for_actor, random_spawn, retirement_threshold),
        };
        let mut rng = StdRng::from_entropy();

        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Join { name, reply } => {
                    let _ = reply.send(session.join(name, &mut rng));
                }
                Command::Player { token, reply } => {
                    let _ = reply.send(session.player(&token).cloned());
                }
                Command::Players { reply } => {
                    let _ = reply.send(session.players.values().cloned().collect());
                }
                Command::Loot { reply } => {
                    let _ = reply.send(session.loot.values().cloned().collect());
                }
                Command::Action {
                    token,
                    direction,
                    reply,
                } => {
                    let _ = reply.send(session.apply_action(&token, direction));
                }
                Command::Tick { dt, reply } => {
                    let retired = session.tick(dt, &loot_config, &mut rng);
                    let _ = reply.send(retired);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(session.snapshot());
                }
                Command::Shutdown => break,
            }
        }
    });

    SessionHandle { tx, map }
}
