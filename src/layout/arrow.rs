//! Arrow routing
//!
//! Connectors are orthogonal polylines. The router picks the simplest shape that
//! does not cut back through its source:
//!
//! - `Straight`: source and target on one row (target to the right) or one column
//! - `Elbow`: out to a vertical corridor, along it, then into the target
//! - `Detour`: the target lies behind the source; go out, over the top, and come
//!   back in from the target's left
//! - `Loop`: an array cell pointing at its own array
//!
//! Arrows leaving from the same x share a corridor and take successive lanes in
//! it, so parallel arrows stay apart.

use super::{Bounds, Point};
use crate::config::Config;
use rustc_hash::FxHashMap;

const EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Straight,
    Elbow,
    Detour,
    Loop,
}

/// Polyline from source to target; the arrowhead sits on the last point
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub kind: RouteKind,
    pub points: Vec<Point>,
}

impl Route {
    fn straight(from: Point, to: Point) -> Self {
        Route {
            kind: RouteKind::Straight,
            points: vec![from, to],
        }
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Sum of segment lengths
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }
}

/// Routes connectors for one draw cycle
#[derive(Debug, Clone)]
pub struct ArrowRouter {
    lane_gap: f64,
    lanes: usize,
    loop_height: f64,
    frame_padding_y: f64,
    corridors: FxHashMap<i64, usize>,
}

impl ArrowRouter {
    pub fn new(config: &Config) -> Self {
        let lanes = config.arrow_num_lanes.max(1);
        ArrowRouter {
            lane_gap: config.frame_margin_x / 2.0 / lanes as f64,
            lanes,
            loop_height: config.arrow_min_height / 4.0,
            frame_padding_y: config.frame_padding_y,
            corridors: FxHashMap::default(),
        }
    }

    /// Forget lane assignments
    pub fn reset(&mut self) {
        self.corridors.clear();
    }

    /// Offset of the next free lane in the corridor leaving `x`
    fn take_lane(&mut self, x: f64) -> f64 {
        let taken = self.corridors.entry(x.round() as i64).or_insert(0);
        let lane = *taken % self.lanes;
        *taken += 1;
        (lane + 1) as f64 * self.lane_gap
    }

    /// Width of a full corridor
    fn corridor_width(&self) -> f64 {
        self.lane_gap * self.lanes as f64
    }

    pub fn route(&mut self, from: Point, to: Point) -> Route {
        let same_row = (from.y - to.y).abs() < EPSILON;
        if (same_row && to.x > from.x) || (from.x - to.x).abs() < EPSILON {
            return Route::straight(from, to);
        }

        let offset = self.take_lane(from.x);
        let cx = from.x + offset;
        if to.x - from.x > self.corridor_width() {
            return Route {
                kind: RouteKind::Elbow,
                points: vec![from, Point { x: cx, y: from.y }, Point { x: cx, y: to.y }, to],
            };
        }

        let top = from.y.min(to.y) - self.loop_height;
        let ex = to.x - offset;
        Route {
            kind: RouteKind::Detour,
            points: vec![
                from,
                Point { x: cx, y: from.y },
                Point { x: cx, y: top },
                Point { x: ex, y: top },
                Point { x: ex, y: to.y },
                to,
            ],
        }
    }

    /// Route into a box. A source directly above or below it drops straight in;
    /// otherwise the arrow lands on the left edge at `entry_y`.
    pub fn route_to_bounds(&mut self, from: Point, target: Bounds, entry_y: f64) -> Route {
        if from.x >= target.x && from.x <= target.right() {
            let y = if from.y < target.y { target.y } else { target.bottom() };
            return Route::straight(from, Point { x: from.x, y });
        }
        self.route(from, Point { x: target.x, y: entry_y })
    }

    /// Loop from a cell back into its own array: up, left, and in from the left
    pub fn route_loop(&mut self, from: Point, array: Bounds) -> Route {
        let top = array.y - self.loop_height;
        let left = array.x - 2.0 * self.lane_gap;
        let mid = array.y + array.height / 2.0;
        Route {
            kind: RouteKind::Loop,
            points: vec![
                from,
                Point { x: from.x, y: top },
                Point { x: left, y: top },
                Point { x: left, y: mid },
                Point { x: array.x, y: mid },
            ],
        }
    }

    /// Route from a function glyph to the right edge of the frame it closes over
    pub fn route_to_frame(&mut self, from: Point, frame: Bounds) -> Route {
        let to = Point {
            x: frame.right(),
            y: frame.y + (frame.height / 2.0).min(self.frame_padding_y),
        };
        if from.x > frame.right() {
            if (from.y - to.y).abs() < EPSILON {
                return Route::straight(from, to);
            }
            return Route {
                kind: RouteKind::Elbow,
                points: vec![from, Point { x: from.x, y: to.y }, to],
            };
        }
        self.route(from, to)
    }
}
