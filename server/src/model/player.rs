use serde::{Deserialize, Serialize};

use super::loot::Loot;
use super::map::Point;
use super::token::PlayerToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    None,
}

impl Direction {
    /// Decodes the one-letter move codes the action endpoint accepts.
    /// Unknown letters fall through to `None`, matching the reference
    /// handler's unhandled-default behavior rather than erroring.
    pub fn from_move_code(code: &str) -> Direction {
        match code {
            "U" => Direction::North,
            "D" => Direction::South,
            "L" => Direction::West,
            "R" => Direction::East,
            _ => Direction::None,
        }
    }

    pub fn to_move_code(self) -> &'static str {
        match self {
            Direction::North => "U",
            Direction::South => "D",
            Direction::West => "L",
            Direction::East => "R",
            Direction::None => "",
        }
    }

    /// The (vx, vy) unit vector for this direction, to be scaled by speed.
    pub fn unit_vector(self) -> (f64, f64) {
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::West => (-1.0, 0.0),
            Direction::East => (1.0, 0.0),
            Direction::None => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u64,
    pub token: PlayerToken,
    pub name: String,
    pub position: Point,
    pub speed: (f64, f64),
    pub direction: Direction,
    pub bag: Vec<Loot>,
    pub score: i64,
    pub play_time: f64,
    pub idle_time: f64,
}

impl Player {
    pub fn new(id: u64, token: PlayerToken, name: String, position: Point) -> Self {
        Self {
            id,
            token,
            name,
            position,
            speed: (0.0, 0.0),
            direction: Direction::None,
            bag: Vec::new(),
            score: 0,
            play_time: 0.0,
            idle_time: 0.0,
        }
    }

    pub fn set_direction(&mut self, direction: Direction, map_speed: f64) {
        self.direction = direction;
        let (ux, uy) = direction.unit_vector();
        self.speed = (ux * map_speed, uy * map_speed);
    }

    pub fn bag_has_room(&self, capacity: usize) -> bool {
        self.bag.len() < capacity
    }
}
