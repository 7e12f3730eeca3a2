use serde::{Deserialize, Serialize};

use super::map::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    pub id: u64,
    pub type_index: usize,
    pub position: Point,
}
