//! Hit testing: point → diagram part lookup.
//!
//! Checks the kinds of parts front-to-back: resize handles, activation
//! bars, messages, lifeline headers, then the dashed lifeline lines (the
//! ports messages are drawn from). Within a kind the last inserted part is
//! topmost.

use crate::sync::SyncEngine;
use seqd_core::id::PartKey;
use seqd_core::model::{Point, SequenceGraph};

/// Pointer slack for thin targets (lines, messages), in pixels.
pub const HIT_TOLERANCE: f64 = 4.0;
/// Height of the band at the bottom of an activation that grabs the resize handle.
pub const HANDLE_BAND: f64 = 3.0;
/// Nominal lifeline header box.
pub const HEADER_WIDTH: f64 = 80.0;
pub const HEADER_HEIGHT: f64 = 26.0;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    LifelineHeader(PartKey),
    LifelineLine(PartKey),
    Activation(PartKey),
    ActivationHandle(PartKey),
    Message(PartKey),
}

impl Hit {
    /// Lifeline a message may attach to through this hit, if any. Dropping
    /// onto an activation attaches to the activation's lifeline.
    pub fn port(&self, graph: &SequenceGraph) -> Option<PartKey> {
        match *self {
            Hit::LifelineLine(key) => Some(key),
            Hit::Activation(key) | Hit::ActivationHandle(key) => {
                graph.owning_lifeline(key).map(|l| l.key)
            }
            Hit::LifelineHeader(_) | Hit::Message(_) => None,
        }
    }
}

/// Find the topmost part at `p`. Returns `None` for background.
pub fn hit_test(engine: &SyncEngine, p: Point) -> Option<Hit> {
    let graph = &engine.graph;
    let axis = &engine.axis;
    let half = axis.activation_width / 2.0;

    let activations: Vec<_> = graph.activations().collect();
    for act in activations.iter().rev() {
        if graph.lifeline(act.group).is_none() {
            continue;
        }
        let loc = axis.activation_location(graph, act);
        let bottom = loc.y + axis.activation_height(act.duration);
        let in_x = (p.x - loc.x).abs() <= half + HIT_TOLERANCE;
        if in_x && (p.y - bottom).abs() <= HANDLE_BAND {
            return Some(Hit::ActivationHandle(act.key));
        }
    }
    for act in activations.iter().rev() {
        if graph.lifeline(act.group).is_none() {
            continue;
        }
        let loc = axis.activation_location(graph, act);
        let bottom = loc.y + axis.activation_height(act.duration);
        if (p.x - loc.x).abs() <= half && p.y >= loc.y && p.y <= bottom {
            return Some(Hit::Activation(act.key));
        }
    }

    let messages: Vec<_> = graph.messages().collect();
    for msg in messages.iter().rev() {
        if let Some(route) = engine.route(msg.key)
            && route.distance_to(p) <= HIT_TOLERANCE
        {
            return Some(Hit::Message(msg.key));
        }
    }

    let lifelines: Vec<_> = graph.lifelines().collect();
    for lifeline in lifelines.iter().rev() {
        let loc = lifeline.loc;
        if (p.x - loc.x).abs() <= HEADER_WIDTH / 2.0 && p.y >= loc.y - HEADER_HEIGHT && p.y <= loc.y {
            return Some(Hit::LifelineHeader(lifeline.key));
        }
    }
    for lifeline in lifelines.iter().rev() {
        let loc = lifeline.loc;
        let bottom = loc.y + axis.lifeline_height(lifeline.duration);
        if (p.x - loc.x).abs() <= HIT_TOLERANCE && p.y > loc.y && p.y <= bottom {
            return Some(Hit::LifelineLine(lifeline.key));
        }
    }

    None
}
