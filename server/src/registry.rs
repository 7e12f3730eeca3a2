//! Fans requests out to per-map session actors, the way the teacher's
//! core runtime fans connections out to per-route map servers via a
//! `DashMap<RouteKey, MapServerHandle>`. One `GameRegistry` per process;
//! sessions are created lazily, the first time a player joins a map.

use std::sync::Arc;

use dashmap::DashMap;

use crate::model::catalog::MapCatalog;
use crate::model::loot::Loot;
use crate::model::player::{Direction, Player};
use crate::model::token::PlayerToken;
use crate::session::{JoinError, RetiredRecord, SessionSnapshot};
use crate::session_actor::{start_session, SessionHandle};

pub struct RegistrySnapshot {
    pub sessions: Vec<SessionSnapshot>,
}

pub struct GameRegistry {
    catalog: Arc<MapCatalog>,
    sessions: DashMap<String, SessionHandle>,
    /// Routes an already-issued token back to its map without scanning
    /// every session, mirroring the directory lookup the teacher keeps
    /// alongside its map server table.
    owners: DashMap<PlayerToken, String>,
    random_spawn: bool,
    retirement_threshold: f64,
}

impl GameRegistry {
    pub fn new(catalog: Arc<MapCatalog>, random_spawn: bool, retirement_threshold: f64) -> Self {
        Self {
            catalog,
            sessions: DashMap::new(),
            owners: DashMap::new(),
            random_spawn,
            retirement_threshold,
        }
    }

    /// Rehydrates a registry from a previously saved [`RegistrySnapshot`],
    /// starting one actor per session it contains.
    pub fn restore(
        catalog: Arc<MapCatalog>,
        random_spawn: bool,
        retirement_threshold: f64,
        snapshot: RegistrySnapshot,
    ) -> Self {
        let registry = Self::new(catalog, random_spawn, retirement_threshold);
        for session_snapshot in snapshot.sessions {
            let Some(map) = registry.catalog.find(&session_snapshot.map_id) else {
                log::warn!(
                    "skipping saved session for unknown map '{}'",
                    session_snapshot.map_id
                );
                continue;
            };
            for player in &session_snapshot.players {
                registry.owners.insert(player.token, session_snapshot.map_id.clone());
            }
            let handle = start_session(
                Arc::new(map.clone()),
                registry.random_spawn,
                registry.retirement_threshold,
                registry.catalog.loot_generator,
                Some(session_snapshot),
            );
            registry.sessions.insert(handle.map.id.clone(), handle);
        }
        registry
    }

    pub fn maps(&self) -> &[crate::model::map::Map] {
        &self.catalog.maps
    }

    fn session_for(&self, map_id: &str) -> Option<SessionHandle> {
        if let Some(existing) = self.sessions.get(map_id) {
            return Some(existing.clone());
        }
        let map = self.catalog.find(map_id)?;
        let handle = start_session(
            Arc::new(map.clone()),
            self.random_spawn,
            self.retirement_threshold,
            self.catalog.loot_generator,
            None,
        );
        self.sessions.insert(map_id.to_string(), handle.clone());
        Some(handle)
    }

    pub async fn join(&self, map_id: &str, name: String) -> Option<Result<(PlayerToken, u64), JoinError>> {
        let handle = self.session_for(map_id)?;
        let result = handle.join(name).await;
        if let Ok((token, _)) = &result {
            self.owners.insert(*token, map_id.to_string());
        }
        Some(result)
    }

    pub async fn player(&self, token: PlayerToken) -> Option<Player> {
        let map_id = self.owners.get(&token)?.clone();
        let handle = self.sessions.get(&map_id)?.clone();
        handle.player(token).await
    }

    pub fn map_id_for(&self, token: PlayerToken) -> Option<String> {
        self.owners.get(&token).map(|e| e.clone())
    }

    pub async fn players_on(&self, map_id: &str) -> Option<Vec<Player>> {
        let handle = self.sessions.get(map_id)?.clone();
        Some(handle.players().await)
    }

    pub async fn loot_on(&self, map_id: &str) -> Option<Vec<Loot>> {
        let handle = self.sessions.get(map_id)?.clone();
        Some(handle.loot().await)
    }

    pub async fn apply_action(&self, token: PlayerToken, direction: Direction) -> bool {
        let Some(map_id) = self.owners.get(&token).map(|e| e.clone()) else {
            return false;
        };
        let Some(handle) = self.sessions.get(&map_id).map(|e| e.clone()) else {
            return false;
        };
        handle.apply_action(token, direction).await
    }

    /// Advances every live session by `dt` and returns all players any of
    /// them retired, ready for the caller to forward to score persistence.
    /// Each retired player's token is dropped from `owners` here, in the
    /// same pass that collects the record, so a retired token can never
    /// be observed still routing to its old session (invariant 7).
    pub async fn tick(&self, dt: f64) -> Vec<RetiredRecord> {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|e| e.value().clone()).collect();
        let mut retired = Vec::new();
        for handle in handles {
            let records = handle.tick(dt).await;
            for record in &records {
                self.owners.remove(&record.token);
            }
            retired.extend(records);
        }
        retired
    }

    /// Snapshots every live session, one command at a time so each is
    /// taken either strictly before or strictly after that session's own
    /// in-flight tick, never mid-tick.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|e| e.value().clone()).collect();
        let mut sessions = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Some(snapshot) = handle.snapshot().await {
                sessions.push(snapshot);
            }
        }
        RegistrySnapshot { sessions }
    }

    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|e| e.value().clone()).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<MapCatalog> {
        Arc::new(
            MapCatalog::load_from_str(
                r#"{
                    "defaultDogSpeed": 3.0,
                    "defaultBagCapacity": 3,
                    "lootGeneratorConfig": { "period": 5.0, "probability": 0.0 },
                    "maps": [
                        { "id": "map1", "name": "Town", "roads": [ { "x0": 0, "y0": 0, "x1": 10 } ] }
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn joining_an_unknown_map_returns_none() {
        let registry = GameRegistry::new(catalog(), false, 60.0);
        assert!(registry.join("no-such-map", "a".into()).await.is_none());
    }

    #[tokio::test]
    async fn join_then_route_actions_back_to_the_owning_session() {
        let registry = GameRegistry::new(catalog(), false, 60.0);
        let (token, _id) = registry.join("map1", "eve".into()).await.unwrap().unwrap();

        assert!(registry.apply_action(token, Direction::East).await);
        let retired = registry.tick(1.0).await;
        assert!(retired.is_empty());

        let player = registry.player(token).await.unwrap();
        assert!(player.position.x > 0.0);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn snapshot_then_restore_preserves_players() {
        let registry = GameRegistry::new(catalog(), false, 60.0);
        let (token, _id) = registry.join("map1", "finn".into()).await.unwrap().unwrap();
        registry.tick(1.0).await;

        let snapshot = registry.snapshot().await;
        registry.shutdown().await;

        let restored = GameRegistry::restore(catalog(), false, 60.0, snapshot);
        assert_eq!(restored.player(token).await.unwrap().name, "finn");
        restored.shutdown().await;
    }

    #[tokio::test]
    async fn retired_players_are_evicted_from_the_owner_index() {
        let registry = GameRegistry::new(catalog(), false, 0.0);
        let (token, _id) = registry.join("map1", "gil".into()).await.unwrap().unwrap();

        let retired = registry.tick(1.0).await;
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].token, token);

        assert!(registry.map_id_for(token).is_none());
        assert!(registry.player(token).await.is_none());
        assert!(!registry.apply_action(token, Direction::East).await);

        registry.shutdown().await;
    }
}
