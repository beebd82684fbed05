//! Drawable geometry for a host renderer.
//!
//! The scene is derived data only. It is rebuilt from the graph whenever the
//! host asks and is never written back.

use crate::id::PartKey;
use crate::model::{Point, SequenceGraph};
use crate::route::{LinkRouter, Route};
use crate::timeline::TimeAxis;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifelineShape {
    pub key: PartKey,
    pub label: String,
    /// Bottom-center of the header; the dashed line hangs from here.
    pub header: Point,
    pub line_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationShape {
    pub key: PartKey,
    pub lifeline: PartKey,
    /// Top-center of the bar.
    pub location: Point,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageShape {
    pub key: PartKey,
    pub text: String,
    #[serde(flatten)]
    pub route: Route,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub lifelines: Vec<LifelineShape>,
    pub activations: Vec<ActivationShape>,
    pub messages: Vec<MessageShape>,
}

impl Scene {
    pub fn message(&self, key: PartKey) -> Option<&MessageShape> {
        self.messages.iter().find(|m| m.key == key)
    }
}

/// Lay out every part of `graph`.
pub fn build_scene(graph: &SequenceGraph, axis: &TimeAxis, router: &dyn LinkRouter) -> Scene {
    let lifelines = graph
        .lifelines()
        .map(|l| LifelineShape {
            key: l.key,
            label: l.label().to_string(),
            header: l.loc,
            line_height: axis.lifeline_height(l.duration),
        })
        .collect();

    let activations = graph
        .activations()
        .map(|a| ActivationShape {
            key: a.key,
            lifeline: a.group,
            location: axis.activation_location(graph, a),
            width: axis.activation_width,
            height: axis.activation_height(a.duration),
        })
        .collect();

    let messages = graph
        .messages()
        .filter_map(|m| match router.route_message(graph, m) {
            Some(route) => Some(MessageShape {
                key: m.key,
                text: m.text.clone(),
                route,
            }),
            None => {
                log::warn!("message {} has no route", m.key);
                None
            }
        })
        .collect();

    Scene {
        lifelines,
        activations,
        messages,
    }
}
