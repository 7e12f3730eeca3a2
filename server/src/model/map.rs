use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Half the width of a road slab. An avatar on a road may stray this far
/// from the road's centerline / either endpoint.
pub const ROAD_HALF_WIDTH: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadAxis {
    Horizontal,
    Vertical,
}

/// A single road segment. Horizontal roads run along x at a fixed y;
/// vertical roads run along y at a fixed x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Road {
    pub axis: RoadAxis,
    pub x0: i64,
    pub y0: i64,
    /// The far endpoint: x1 for horizontal roads, y1 for vertical roads.
    pub far: i64,
}

impl Road {
    pub fn horizontal(x0: i64, y0: i64, x1: i64) -> Self {
        Self {
            axis: RoadAxis::Horizontal,
            x0,
            y0,
            far: x1,
        }
    }

    pub fn vertical(x0: i64, y0: i64, y1: i64) -> Self {
        Self {
            axis: RoadAxis::Vertical,
            x0,
            y0,
            far: y1,
        }
    }

    /// Inclusive along-axis bounds, road half-width already applied.
    pub fn along_axis_bounds(&self) -> (f64, f64) {
        let (start, end) = match self.axis {
            RoadAxis::Horizontal => (self.x0 as f64, self.far as f64),
            RoadAxis::Vertical => (self.y0 as f64, self.far as f64),
        };
        let lo = start.min(end) - ROAD_HALF_WIDTH;
        let hi = start.max(end) + ROAD_HALF_WIDTH;
        (lo, hi)
    }

    /// The fixed cross-axis coordinate (y for horizontal, x for vertical).
    pub fn cross_axis_value(&self) -> f64 {
        match self.axis {
            RoadAxis::Horizontal => self.y0 as f64,
            RoadAxis::Vertical => self.x0 as f64,
        }
    }

    /// A uniformly random point on the road's interior, used both for
    /// loot spawn placement and randomized player spawn points.
    pub fn sample_interior(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        match self.axis {
            RoadAxis::Horizontal => {
                let x0 = self.x0 as f64;
                let x1 = self.far as f64;
                Point::new(x0 + (x1 - x0) * t, self.y0 as f64)
            }
            RoadAxis::Vertical => {
                let y0 = self.y0 as f64;
                let y1 = self.far as f64;
                Point::new(self.x0 as f64, y0 + (y1 - y0) * t)
            }
        }
    }

    pub fn start_point(&self) -> Point {
        match self.axis {
            RoadAxis::Horizontal => Point::new(self.x0 as f64, self.y0 as f64),
            RoadAxis::Vertical => Point::new(self.x0 as f64, self.y0 as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub id: String,
    pub x: i64,
    pub y: i64,
    #[serde(rename = "offsetX")]
    pub offset_x: i64,
    #[serde(rename = "offsetY")]
    pub offset_y: i64,
}

impl Office {
    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootType {
    pub value: i64,
    /// Other client-rendering fields (name, file, scale, rotation, color...)
    /// are opaque to the simulation; preserved verbatim for re-serving.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Static, immutable-after-load description of one map.
#[derive(Debug, Clone)]
pub struct Map {
    pub id: String,
    pub name: String,
    pub roads: Vec<Road>,
    pub buildings: Vec<Building>,
    pub offices: Vec<Office>,
    pub loot_types: Vec<LootType>,
    pub dog_speed: f64,
    pub bag_capacity: usize,
    pub by_y: HashMap<i64, usize>,
    pub by_x: HashMap<i64, usize>,
}

impl Map {
    pub fn new(
        id: String,
        name: String,
        roads: Vec<Road>,
        buildings: Vec<Building>,
        offices: Vec<Office>,
        loot_types: Vec<LootType>,
        dog_speed: f64,
        bag_capacity: usize,
    ) -> Self {
        let mut by_y = HashMap::new();
        let mut by_x = HashMap::new();
        for (index, road) in roads.iter().enumerate() {
            match road.axis {
                RoadAxis::Horizontal => {
                    by_y.entry(road.y0).or_insert(index);
                }
                RoadAxis::Vertical => {
                    by_x.entry(road.x0).or_insert(index);
                }
            }
        }
        Self {
            id,
            name,
            roads,
            buildings,
            offices,
            loot_types,
            dog_speed,
            bag_capacity,
            by_y,
            by_x,
        }
    }

    pub fn horizontal_road_at(&self, y: i64) -> Option<&Road> {
        self.by_y.get(&y).map(|&idx| &self.roads[idx])
    }

    pub fn vertical_road_at(&self, x: i64) -> Option<&Road> {
        self.by_x.get(&x).map(|&idx| &self.roads[idx])
    }

    /// Canonical join position: the first road's start point, or a
    /// uniformly random road-interior point when random spawn is enabled.
    pub fn spawn_point(&self, random: bool, rng: &mut dyn rand::RngCore) -> Point {
        if self.roads.is_empty() {
            return Point::new(0.0, 0.0);
        }
        if random {
            let road = &self.roads[rng.next_u32() as usize % self.roads.len()];
            let t = (rng.next_u32() as f64) / (u32::MAX as f64);
            road.sample_interior(t)
        } else {
            self.roads[0].start_point()
        }
    }
}
