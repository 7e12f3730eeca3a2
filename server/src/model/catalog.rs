use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GameError, Result};

use super::map::{Building, LootType, Map, Office, Road};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LootGeneratorConfig {
    /// Spawn-check period, in seconds.
    pub period: f64,
    pub probability: f64,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "defaultDogSpeed")]
    default_dog_speed: f64,
    #[serde(rename = "defaultBagCapacity")]
    default_bag_capacity: usize,
    #[serde(rename = "lootGeneratorConfig")]
    loot_generator_config: LootGeneratorConfig,
    maps: Vec<MapFile>,
}

#[derive(Debug, Deserialize)]
struct MapFile {
    id: String,
    name: String,
    #[serde(rename = "dogSpeed")]
    dog_speed: Option<f64>,
    #[serde(rename = "bagCapacity")]
    bag_capacity: Option<usize>,
    #[serde(default)]
    roads: Vec<RoadFile>,
    #[serde(default)]
    buildings: Vec<Building>,
    #[serde(default)]
    offices: Vec<Office>,
    #[serde(rename = "lootTypes", default)]
    loot_types: Vec<LootType>,
}

#[derive(Debug, Deserialize)]
struct RoadFile {
    x0: i64,
    y0: i64,
    x1: Option<i64>,
    y1: Option<i64>,
}

/// Loaded map catalog: the full ordered map list plus the generator
/// configuration and random-spawn flag that apply to every session.
pub struct MapCatalog {
    pub maps: Vec<Map>,
    pub loot_generator: LootGeneratorConfig,
}

impl MapCatalog {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            GameError::Config(format!(
                "failed to read map catalog {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| GameError::Config(format!("failed to parse map catalog: {e}")))?;

        let maps = file
            .maps
            .into_iter()
            .map(|m| {
                let roads = m
                    .roads
                    .iter()
                    .map(|r| match (r.x1, r.y1) {
                        (Some(x1), _) => Road::horizontal(r.x0, r.y0, x1),
                        (None, Some(y1)) => Road::vertical(r.x0, r.y0, y1),
                        (None, None) => Road::horizontal(r.x0, r.y0, r.x0),
                    })
                    .collect();

                Map::new(
                    m.id,
                    m.name,
                    roads,
                    m.buildings,
                    m.offices,
                    m.loot_types,
                    m.dog_speed.unwrap_or(file.default_dog_speed),
                    m.bag_capacity.unwrap_or(file.default_bag_capacity),
                )
            })
            .collect();

        Ok(Self {
            maps,
            loot_generator: file.loot_generator_config,
        })
    }

    pub fn find(&self, map_id: &str) -> Option<&Map> {
        self.maps.iter().find(|m| m.id == map_id)
    }
}
