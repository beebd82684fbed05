//! Message routing.
//!
//! A message connects its two lifelines on the pixel row of its `time`.
//! Each end is pushed half an activation bar towards the other end when an
//! activation covers that instant, so arrows meet the bar edge instead of
//! the dashed line. Self-messages are drawn as a small rectangular loop.

use crate::id::PartKey;
use crate::model::{Message, Part, Point, SequenceGraph};
use crate::timeline::TimeAxis;
use serde::Serialize;
use smallvec::{SmallVec, smallvec};

/// Horizontal reach of a self-message loop.
pub const SELF_LOOP_WIDTH: f64 = 50.0;
/// Vertical drop of a self-message loop.
pub const SELF_LOOP_HEIGHT: f64 = 5.0;

/// One end of a route: a diagram part, or a free point (the pointer while a
/// message is being drawn).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    Part(PartKey),
    Free(Point),
}

/// Which way the arrowhead points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Right,
    Left,
}

/// A computed polyline for a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub points: SmallVec<[Point; 4]>,
    pub direction: ArrowDirection,
}

impl Route {
    /// Shortest distance from `p` to any segment of the route.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.points
            .windows(2)
            .map(|seg| segment_distance(p, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min)
    }
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Hooks a host calls to lay out message links.
pub trait LinkRouter {
    /// Connection point of `endpoint` for a link at `time` whose other end
    /// sits at horizontal position `other_x`.
    fn route_point(&self, graph: &SequenceGraph, endpoint: Endpoint, other_x: f64, time: f64) -> Option<Point>;

    /// Full route between two endpoints at `time`.
    fn compute_route(&self, graph: &SequenceGraph, from: Endpoint, to: Endpoint, time: f64) -> Option<Route>;

    /// Route of a stored message.
    fn route_message(&self, graph: &SequenceGraph, message: &Message) -> Option<Route> {
        self.compute_route(
            graph,
            Endpoint::Part(message.from),
            Endpoint::Part(message.to),
            message.time,
        )
    }
}

/// The sequence-diagram router, driven by the shared time axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRouter {
    pub axis: TimeAxis,
}

impl MessageRouter {
    pub fn new(axis: TimeAxis) -> Self {
        Self { axis }
    }

    /// Center of the endpoint's port. Activations report their owner's line.
    fn port_center(&self, graph: &SequenceGraph, endpoint: Endpoint) -> Option<Point> {
        match endpoint {
            Endpoint::Free(p) => Some(p),
            Endpoint::Part(key) => match graph.part(key)? {
                Part::Lifeline(l) => Some(l.loc),
                Part::Activation(a) => Some(self.axis.activation_location(graph, a)),
            },
        }
    }

    /// Width of the bar the link must clear at `time`. Lifelines only count
    /// when one of their activations covers `time`; a link attached
    /// directly to an activation always clears the bar.
    pub fn activation_width(&self, graph: &SequenceGraph, endpoint: Endpoint, time: f64) -> f64 {
        match endpoint {
            Endpoint::Free(_) => 0.0,
            Endpoint::Part(key) => match graph.part(key) {
                Some(Part::Lifeline(l)) => {
                    if graph.activations_of(l.key).any(|a| a.covers(time)) {
                        self.axis.activation_width
                    } else {
                        0.0
                    }
                }
                Some(Part::Activation(_)) => self.axis.activation_width,
                None => 0.0,
            },
        }
    }

    fn self_loop(&self, graph: &SequenceGraph, endpoint: Endpoint, time: f64) -> Option<Route> {
        let p = self.port_center(graph, endpoint)?;
        let aw = self.activation_width(graph, endpoint, time);
        let x = p.x + aw / 2.0;
        let y = self.axis.time_to_y(time);
        Some(Route {
            points: smallvec![
                Point::new(x, y),
                Point::new(x + SELF_LOOP_WIDTH, y),
                Point::new(x + SELF_LOOP_WIDTH, y + SELF_LOOP_HEIGHT),
                Point::new(x, y + SELF_LOOP_HEIGHT),
            ],
            direction: ArrowDirection::Left,
        })
    }
}

impl LinkRouter for MessageRouter {
    fn route_point(&self, graph: &SequenceGraph, endpoint: Endpoint, other_x: f64, time: f64) -> Option<Point> {
        let p = self.port_center(graph, endpoint)?;
        let aw = self.activation_width(graph, endpoint, time);
        let x = if other_x > p.x { p.x + aw / 2.0 } else { p.x - aw / 2.0 };
        Some(Point::new(x, self.axis.time_to_y(time)))
    }

    fn compute_route(&self, graph: &SequenceGraph, from: Endpoint, to: Endpoint, time: f64) -> Option<Route> {
        if let (Endpoint::Part(a), Endpoint::Part(b)) = (from, to)
            && a == b
        {
            return self.self_loop(graph, from, time);
        }

        let from_center = self.port_center(graph, from)?;
        let to_center = self.port_center(graph, to)?;
        let start = self.route_point(graph, from, to_center.x, time)?;
        let end = self.route_point(graph, to, from_center.x, time)?;
        let direction = if to_center.x > from_center.x {
            ArrowDirection::Right
        } else {
            ArrowDirection::Left
        };
        Some(Route {
            points: smallvec![start, end],
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Activation, Lifeline};

    fn key(s: &str) -> PartKey {
        PartKey::intern(s)
    }

    fn diagram() -> SequenceGraph {
        let mut g = SequenceGraph::new();
        g.add_lifeline(Lifeline::new(key("rt_A"), Point::new(0.0, 0.0), 12.0));
        g.add_lifeline(Lifeline::new(key("rt_B"), Point::new(100.0, 0.0), 12.0));
        g.add_activation(Activation::new(key("rt_b1"), key("rt_B"), 3.0, 2.0));
        g
    }

    #[test]
    fn offset_only_when_activation_covers_time() {
        let g = diagram();
        let router = MessageRouter::default();
        let b = Endpoint::Part(key("rt_B"));

        assert_eq!(router.activation_width(&g, b, 4.0), 10.0);
        assert_eq!(router.activation_width(&g, b, 3.0), 10.0);
        assert_eq!(router.activation_width(&g, b, 5.0), 10.0);
        assert_eq!(router.activation_width(&g, b, 10.0), 0.0);

        let p = router.route_point(&g, b, 0.0, 4.0).unwrap();
        assert_eq!(p, Point::new(95.0, 100.0));
        let p = router.route_point(&g, b, 0.0, 10.0).unwrap();
        assert_eq!(p, Point::new(100.0, 220.0));
    }

    #[test]
    fn direction_follows_horizontal_order() {
        let g = diagram();
        let router = MessageRouter::default();

        let right = router
            .compute_route(&g, Endpoint::Part(key("rt_A")), Endpoint::Part(key("rt_B")), 4.0)
            .unwrap();
        assert_eq!(right.direction, ArrowDirection::Right);
        assert_eq!(right.points.as_slice(), &[Point::new(0.0, 100.0), Point::new(95.0, 100.0)]);

        let left = router
            .compute_route(&g, Endpoint::Part(key("rt_B")), Endpoint::Part(key("rt_A")), 4.0)
            .unwrap();
        assert_eq!(left.direction, ArrowDirection::Left);
        assert_eq!(left.points[0], Point::new(95.0, 100.0));
    }

    #[test]
    fn self_message_is_a_four_point_loop() {
        let g = diagram();
        let router = MessageRouter::default();
        let axis = TimeAxis::default();

        for (lane, time) in [("rt_A", 2.0), ("rt_B", 4.0), ("rt_B", 9.0)] {
            let route = router
                .compute_route(&g, Endpoint::Part(key(lane)), Endpoint::Part(key(lane)), time)
                .unwrap();
            assert_eq!(route.points.len(), 4);
            let y = axis.time_to_y(time);
            assert_eq!(route.points[0].y, y);
            assert_eq!(route.points[1].y, y);
            assert_eq!(route.points[2].y, y + SELF_LOOP_HEIGHT);
            assert_eq!(route.points[1].x - route.points[0].x, SELF_LOOP_WIDTH);
        }

        // Covered by an activation: the loop starts at the bar edge.
        let covered = router
            .compute_route(&g, Endpoint::Part(key("rt_B")), Endpoint::Part(key("rt_B")), 4.0)
            .unwrap();
        assert_eq!(covered.points[0].x, 105.0);
    }

    #[test]
    fn preview_route_to_free_point() {
        let g = diagram();
        let router = MessageRouter::default();
        let route = router
            .compute_route(
                &g,
                Endpoint::Part(key("rt_A")),
                Endpoint::Free(Point::new(60.0, 300.0)),
                2.0,
            )
            .unwrap();
        assert_eq!(route.points[0], Point::new(0.0, 60.0));
        assert_eq!(route.points[1], Point::new(60.0, 60.0));
    }

    #[test]
    fn unknown_endpoint_has_no_route() {
        let g = diagram();
        let router = MessageRouter::default();
        assert!(
            router
                .compute_route(&g, Endpoint::Part(key("rt_A")), Endpoint::Part(key("rt_nope")), 1.0)
                .is_none()
        );
    }

    #[test]
    fn distance_to_route() {
        let route = Route {
            points: smallvec![Point::new(0.0, 10.0), Point::new(100.0, 10.0)],
            direction: ArrowDirection::Right,
        };
        assert_eq!(route.distance_to(Point::new(50.0, 13.0)), 3.0);
        assert_eq!(route.distance_to(Point::new(-4.0, 7.0)), 5.0);
    }
}
