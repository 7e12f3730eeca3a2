//! Period-based loot spawner (§4.2): how many new items appear this tick,
//! and where.

use rand::RngCore;

use crate::model::map::{Map, Point};
use crate::model::LootGeneratorConfig;

/// Number of items to spawn this tick, given the elapsed time, the
/// current loot count and the number of active looters.
pub fn spawn_count(config: &LootGeneratorConfig, dt: f64, loot_count: usize, looter_count: usize, rng: &mut dyn RngCore) -> usize {
    let needed = looter_count.saturating_sub(loot_count) as f64;
    if needed <= 0.0 || config.period <= 0.0 {
        return 0;
    }

    let p_step = 1.0 - (1.0 - config.probability).powf(dt / config.period);
    let random_fraction = (rng.next_u32() as f64) / (u32::MAX as f64 + 1.0);
    let spawned = (needed * p_step + random_fraction).floor();
    spawned.max(0.0) as usize
}

pub struct SpawnedLoot {
    pub type_index: usize,
    pub position: Point,
}

/// Samples a random position on a uniformly chosen road's interior and a
/// uniformly chosen loot type index.
pub fn spawn_one(map: &Map, rng: &mut dyn RngCore) -> Option<SpawnedLoot> {
    if map.roads.is_empty() || map.loot_types.is_empty() {
        return None;
    }
    let road = &map.roads[rng.next_u32() as usize % map.roads.len()];
    let t = (rng.next_u32() as f64) / (u32::MAX as f64);
    let type_index = rng.next_u32() as usize % map.loot_types.len();
    Some(SpawnedLoot {
        type_index,
        position: road.sample_interior(t),
    })
}
