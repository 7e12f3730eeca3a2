//! Per-map session container and the §4.3 tick algorithm: the one place
//! avatars move, loot spawns, and gather/deposit events resolve.

use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::loot_generator;
use crate::model::loot::Loot;
use crate::model::map::{Map, Point};
use crate::model::player::{Direction, Player};
use crate::model::token::PlayerToken;
use crate::model::LootGeneratorConfig;
use crate::motion;

/// Half the avatar's own width, used as the gather-collision radius.
const GATHER_RADIUS: f64 = 0.3;
/// Half avatar width plus office half-width.
const DEPOSIT_RADIUS: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct RetiredRecord {
    /// Carried so the registry can evict the same player from its
    /// global token index atomically with this session's own removal
    /// (invariant 7); the persistence sink ignores this field.
    pub token: PlayerToken,
    pub name: String,
    pub score: i64,
    pub play_time: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("user name must not be empty")]
    InvalidName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    // Gather sorts before Deposit for equal (t, player_id).
    Gather,
    Deposit,
}

struct InteractionEvent {
    t: f64,
    player_id: u64,
    kind: EventKind,
    loot_id: Option<u64>,
}

/// Owns one map's live players and loot; the sole place their state is
/// mutated. Callers (the session actor) are responsible for ensuring only
/// one `tick`/`join`/`apply_action`/`snapshot` call is in flight at a time.
pub struct Session {
    pub map: Arc<Map>,
    pub players: HashMap<PlayerToken, Player>,
    pub loot: HashMap<u64, Loot>,
    next_loot_id: u64,
    next_player_id: u64,
    random_spawn: bool,
    retirement_threshold: f64,
}

impl Session {
    pub fn new(map: Arc<Map>, random_spawn: bool, retirement_threshold: f64) -> Self {
        Self {
            map,
            players: HashMap::new(),
            loot: HashMap::new(),
            next_loot_id: 0,
            next_player_id: 0,
            random_spawn,
            retirement_threshold,
        }
    }

    pub fn join(&mut self, name: String, rng: &mut dyn RngCore) -> Result<(PlayerToken, u64), JoinError> {
        if name.is_empty() {
            return Err(JoinError::InvalidName);
        }

        let token = loop {
            let candidate = PlayerToken::generate();
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
        };

        let id = self.next_player_id;
        self.next_player_id += 1;

        let position = self.map.spawn_point(self.random_spawn, rng);
        let player = Player::new(id, token, name, position);
        self.players.insert(token, player);

        Ok((token, id))
    }

    pub fn player(&self, token: &PlayerToken) -> Option<&Player> {
        self.players.get(token)
    }

    pub fn apply_action(&mut self, token: &PlayerToken, direction: Direction) -> bool {
        match self.players.get_mut(token) {
            Some(player) => {
                player.set_direction(direction, self.map.dog_speed);
                true
            }
            None => false,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Runs one tick: spawns loot, moves players, resolves gather/deposit
    /// interactions in strict order, then sweeps idle players. Returns the
    /// players retired by this call.
    pub fn tick(&mut self, dt: f64, loot_config: &LootGeneratorConfig, rng: &mut dyn RngCore) -> Vec<RetiredRecord> {
        self.spawn_loot(dt, loot_config, rng);

        let mut segments: Vec<(u64, Point, Point)> = Vec::new();
        for player in self.players.values_mut() {
            let (p0, p1) = motion::advance_player(player, &self.map, dt);
            player.play_time += dt;
            if p0 == p1 {
                player.idle_time += dt;
            } else {
                player.idle_time = 0.0;
                segments.push((player.id, p0, p1));
            }
        }

        let events = self.collect_events(&segments);
        self.apply_events(events);
        self.sweep_retirements()
    }

    fn spawn_loot(&mut self, dt: f64, loot_config: &LootGeneratorConfig, rng: &mut dyn RngCore) {
        let looters = self.players.len();
        let count = loot_generator::spawn_count(loot_config, dt, self.loot.len(), looters, rng);
        for _ in 0..count {
            if let Some(spawned) = loot_generator::spawn_one(&self.map, rng) {
                let id = self.next_loot_id;
                self.next_loot_id += 1;
                self.loot.insert(
                    id,
                    Loot {
                        id,
                        type_index: spawned.type_index,
                        position: spawned.position,
                    },
                );
            }
        }
    }

    fn collect_events(&self, segments: &[(u64, Point, Point)]) -> Vec<InteractionEvent> {
        let mut events = Vec::new();

        for &(player_id, p0, p1) in segments {
            for loot in self.loot.values() {
                if let Some(t) = distance_to_segment(loot.position, p0, p1).filter(|&(d, _)| d <= GATHER_RADIUS).map(|(_, t)| t) {
                    events.push(InteractionEvent {
                        t,
                        player_id,
                        kind: EventKind::Gather,
                        loot_id: Some(loot.id),
                    });
                }
            }
            for office in &self.map.offices {
                if let Some(t) = distance_to_segment(office.position(), p0, p1).filter(|&(d, _)| d <= DEPOSIT_RADIUS).map(|(_, t)| t) {
                    events.push(InteractionEvent {
                        t,
                        player_id,
                        kind: EventKind::Deposit,
                        loot_id: None,
                    });
                }
            }
        }

        events.sort_by(|a, b| {
            a.t.partial_cmp(&b.t)
                .unwrap()
                .then(a.player_id.cmp(&b.player_id))
                .then(a.kind.cmp(&b.kind))
        });

        events
    }

    fn apply_events(&mut self, events: Vec<InteractionEvent>) {
        for event in events {
            let Some(player) = self.players.values_mut().find(|p| p.id == event.player_id) else {
                continue;
            };

            match event.kind {
                EventKind::Gather => {
                    let Some(loot_id) = event.loot_id else { continue };
                    if !player.bag_has_room(self.map.bag_capacity) {
                        continue;
                    }
                    if let Some(loot) = self.loot.remove(&loot_id) {
                        player.bag.push(loot);
                    }
                }
                EventKind::Deposit => {
                    for item in player.bag.drain(..) {
                        let value = self
                            .map
                            .loot_types
                            .get(item.type_index)
                            .map(|lt| lt.value)
                            .unwrap_or(0);
                        player.score += value;
                    }
                }
            }
        }
    }

    fn sweep_retirements(&mut self) -> Vec<RetiredRecord> {
        let retired_tokens: Vec<PlayerToken> = self
            .players
            .iter()
            .filter(|(_, p)| p.idle_time >= self.retirement_threshold)
            .map(|(token, _)| *token)
            .collect();

        let mut records = Vec::with_capacity(retired_tokens.len());
        for token in retired_tokens {
            if let Some(player) = self.players.remove(&token) {
                records.push(RetiredRecord {
                    token,
                    name: player.name,
                    score: player.score,
                    play_time: player.play_time,
                });
            }
        }
        records
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            map_id: self.map.id.clone(),
            next_loot_id: self.next_loot_id,
            next_player_id: self.next_player_id,
            players: self.players.values().cloned().collect(),
            loot: self.loot.values().cloned().collect(),
        }
    }

    pub fn restore(map: Arc<Map>, random_spawn: bool, retirement_threshold: f64, snapshot: SessionSnapshot) -> Self {
        let mut players = HashMap::new();
        for player in snapshot.players {
            players.insert(player.token, player);
        }
        let mut loot = HashMap::new();
        for item in snapshot.loot {
            loot.insert(item.id, item);
        }
        Self {
            map,
            players,
            loot,
            next_loot_id: snapshot.next_loot_id,
            next_player_id: snapshot.next_player_id,
            random_spawn,
            retirement_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub map_id: String,
    pub next_loot_id: u64,
    pub next_player_id: u64,
    pub players: Vec<Player>,
    pub loot: Vec<Loot>,
}

/// Minimal distance from `point` to the segment `p0->p1`, plus the
/// parametric `t` in `[0,1]` of the closest point. `None` for a
/// zero-length segment (no motion, so no events can have been collected
/// for it anyway).
fn distance_to_segment(point: Point, p0: Point, p1: Point) -> Option<(f64, f64)> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return None;
    }

    let t = (((point.x - p0.x) * dx + (point.y - p0.y) * dy) / len_sq).clamp(0.0, 1.0);
    let closest_x = p0.x + t * dx;
    let closest_y = p0.y + t * dy;
    let distance = ((point.x - closest_x).powi(2) + (point.y - closest_y).powi(2)).sqrt();
    Some((distance, t))
}
