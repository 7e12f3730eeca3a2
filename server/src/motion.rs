//! Road-constrained motion: clamps an avatar's proposed displacement to
//! the road graph, zeroing its speed on contact with a wall.

use crate::model::map::{Map, Point};
use crate::model::player::{Direction, Player};

/// Result of advancing one player for one tick's worth of time.
pub struct Advanced {
    pub position: Point,
    /// Speed after the move; zeroed if the avatar hit a wall.
    pub speed: (f64, f64),
}

/// Clamps `current + speed * dt` to the road graph and returns the
/// resulting position/speed. Pure function of its arguments.
pub fn advance(position: Point, speed: (f64, f64), direction: Direction, map: &Map, dt: f64) -> Advanced {
    if speed == (0.0, 0.0) || direction == Direction::None {
        return Advanced { position, speed };
    }

    match direction {
        Direction::East | Direction::West => advance_horizontal(position, speed, map, dt),
        Direction::North | Direction::South => advance_vertical(position, speed, map, dt),
        Direction::None => Advanced { position, speed },
    }
}

fn advance_horizontal(position: Point, speed: (f64, f64), map: &Map, dt: f64) -> Advanced {
    let rounded_y = position.y.round() as i64;
    if let Some(road) = map.horizontal_road_at(rounded_y) {
        // On the road proper: snap y to its centerline, bound x to its full span.
        let (lo, hi) = road.along_axis_bounds();
        clamp_axis(position, speed, dt, lo, hi, Some(road.cross_axis_value()), true)
    } else if let Some(road) = map.vertical_road_at(position.x.round() as i64) {
        // Exiting a junction onto a vertical road's column: x is bounded
        // to the road's half-width, y is left exactly as it is.
        let x = road.cross_axis_value();
        let lo = x - crate::model::map::ROAD_HALF_WIDTH;
        let hi = x + crate::model::map::ROAD_HALF_WIDTH;
        clamp_axis(position, speed, dt, lo, hi, None, true)
    } else {
        Advanced {
            position,
            speed: (0.0, 0.0),
        }
    }
}

fn advance_vertical(position: Point, speed: (f64, f64), map: &Map, dt: f64) -> Advanced {
    let rounded_x = position.x.round() as i64;
    if let Some(road) = map.vertical_road_at(rounded_x) {
        let (lo, hi) = road.along_axis_bounds();
        clamp_axis(position, speed, dt, lo, hi, Some(road.cross_axis_value()), false)
    } else if let Some(road) = map.horizontal_road_at(position.y.round() as i64) {
        let y = road.cross_axis_value();
        let lo = y - crate::model::map::ROAD_HALF_WIDTH;
        let hi = y + crate::model::map::ROAD_HALF_WIDTH;
        clamp_axis(position, speed, dt, lo, hi, None, false)
    } else {
        Advanced {
            position,
            speed: (0.0, 0.0),
        }
    }
}

/// Moves along one axis (x for horizontal movement, y for vertical) and
/// clamps the along-axis coordinate to `[lo, hi]`. `snap_cross` optionally
/// overwrites the cross axis (e.g. snapping y to a horizontal road's
/// centerline); `None` leaves it untouched. `horizontal` selects which
/// field of the position/speed tuple is the along-axis one.
fn clamp_axis(
    position: Point,
    speed: (f64, f64),
    dt: f64,
    lo: f64,
    hi: f64,
    snap_cross: Option<f64>,
    horizontal: bool,
) -> Advanced {
    let (along_current, v) = if horizontal {
        (position.x, speed.0)
    } else {
        (position.y, speed.1)
    };

    let proposed = along_current + v * dt;
    let (clamped, hit_wall) = if proposed < lo {
        (lo, true)
    } else if proposed > hi {
        (hi, true)
    } else {
        (proposed, false)
    };

    let cross_current = if horizontal { position.y } else { position.x };
    let cross_value = snap_cross.unwrap_or(cross_current);

    let new_position = if horizontal {
        Point::new(clamped, cross_value)
    } else {
        Point::new(cross_value, clamped)
    };

    let new_speed = if hit_wall { (0.0, 0.0) } else { speed };

    Advanced {
        position: new_position,
        speed: new_speed,
    }
}

/// Advances a player in place, returning `(p0, p1)` for the caller's
/// interaction-event collection pass.
pub fn advance_player(player: &mut Player, map: &Map, dt: f64) -> (Point, Point) {
    let p0 = player.position;
    let result = advance(player.position, player.speed, player.direction, map, dt);
    player.position = result.position;
    player.speed = result.speed;
    (p0, result.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::Road;

    fn single_horizontal_road_map() -> Map {
        Map::new(
            "m".into(),
            "m".into(),
            vec![Road::horizontal(0, 0, 10)],
            vec![],
            vec![],
            vec![],
            3.0,
            3,
        )
    }

    #[test]
    fn clamps_to_road_end_and_zeroes_speed() {
        let map = single_horizontal_road_map();
        let result = advance(Point::new(9.0, 0.0), (3.0, 0.0), Direction::East, &map, 1.0);
        assert_eq!(result.position, Point::new(10.4, 0.0));
        assert_eq!(result.speed, (0.0, 0.0));
    }

    #[test]
    fn free_movement_within_bounds_does_not_clamp() {
        let map = single_horizontal_road_map();
        let result = advance(Point::new(1.0, 0.0), (3.0, 0.0), Direction::East, &map, 1.0);
        assert_eq!(result.position, Point::new(4.0, 0.0));
        assert_eq!(result.speed, (3.0, 0.0));
    }

    #[test]
    fn stationary_direction_none_does_not_move() {
        let map = single_horizontal_road_map();
        let result = advance(Point::new(5.0, 0.0), (0.0, 0.0), Direction::None, &map, 1.0);
        assert_eq!(result.position, Point::new(5.0, 0.0));
    }

    #[test]
    fn junction_fallback_clamps_to_half_width_and_zeroes_speed() {
        let map = single_horizontal_road_map();
        // No vertical road at x=5; falls back to the horizontal road's
        // half-width window, immediately exceeded by speed 3 over 1s.
        let result = advance(Point::new(5.0, 0.0), (0.0, 3.0), Direction::South, &map, 1.0);
        assert_eq!(result.position, Point::new(5.0, 0.4));
        assert_eq!(result.speed, (0.0, 0.0));
    }
}
