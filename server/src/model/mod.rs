pub mod catalog;
pub mod loot;
pub mod map;
pub mod player;
pub mod token;

pub use catalog::{LootGeneratorConfig, MapCatalog};
pub use loot::Loot;
pub use map::{Building, LootType, Map, Office, Point, Road, RoadAxis};
pub use player::{Direction, Player};
pub use token::PlayerToken;
