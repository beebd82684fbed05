//! Sync engine: model ↔ derived geometry.
//!
//! The engine owns the authoritative [`SequenceGraph`] and keeps the
//! geometry derived from it current:
//!
//! - **Model → geometry**: every applied mutation invalidates the routes of
//!   the messages it can affect, and stale routes are recomputed before the
//!   mutation returns. Hosts read geometry; they never store it.
//!
//! - **Geometry → model**: tools turn pixel gestures into absolute model
//!   values through the inverse functions of [`TimeAxis`], then hand them
//!   to [`SyncEngine::apply_mutation`] as [`DiagramMutation`]s.

use seqd_core::document::ModelData;
use seqd_core::error::DocumentError;
use seqd_core::id::PartKey;
use seqd_core::model::*;
use seqd_core::reconcile::{HeightPolicy, plan_lifeline_heights};
use seqd_core::route::{LinkRouter, MessageRouter, Route};
use seqd_core::scene::{Scene, build_scene};
use seqd_core::timeline::TimeAxis;
use std::collections::{HashMap, HashSet};

/// A single change to the diagram model. All values are absolute so a
/// mutation can be re-applied any number of times with the same result.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramMutation {
    AddMessage { message: Box<Message> },
    RemoveMessage { key: PartKey },
    AddActivation { activation: Box<Activation> },
    RemoveActivation { key: PartKey },
    SetMessageTime { key: PartKey, time: f64 },
    SetMessageText { key: PartKey, text: String },
    /// Move an activation along the time axis.
    MoveActivation { key: PartKey, start: f64 },
    ResizeActivation { key: PartKey, duration: f64 },
    /// Move a lifeline horizontally.
    MoveLifeline { key: PartKey, x: f64 },
    SetLifelineDuration { key: PartKey, duration: f64 },
}

/// The sync engine holds the authoritative model and its derived routes.
pub struct SyncEngine {
    /// The current diagram (single source of truth).
    pub graph: SequenceGraph,

    /// The time ↔ pixel mapping shared by all geometry.
    pub axis: TimeAxis,

    router: MessageRouter,

    /// Cached message routes.
    routes: HashMap<PartKey, Route>,

    /// Messages whose cached route is out of date.
    stale: HashSet<PartKey>,
}

impl SyncEngine {
    /// Create an engine over an existing graph.
    pub fn new(graph: SequenceGraph, axis: TimeAxis) -> Self {
        let mut engine = Self {
            graph,
            axis,
            router: MessageRouter::new(axis),
            routes: HashMap::new(),
            stale: HashSet::new(),
        };
        engine.invalidate_all_routes();
        engine.refresh_routes();
        engine
    }

    /// Create an empty engine.
    pub fn empty(axis: TimeAxis) -> Self {
        Self::new(SequenceGraph::new(), axis)
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Replace the whole model (document load, variant switch).
    pub fn replace_graph(&mut self, graph: SequenceGraph) {
        self.graph = graph;
        self.routes.clear();
        self.invalidate_all_routes();
        self.refresh_routes();
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Current route of a message.
    pub fn route(&self, key: PartKey) -> Option<&Route> {
        self.routes.get(&key)
    }

    /// Mark a message's route as needing recomputation.
    pub fn invalidate_route(&mut self, key: PartKey) {
        self.stale.insert(key);
    }

    fn invalidate_all_routes(&mut self) {
        self.stale.extend(self.graph.messages().map(|m| m.key));
    }

    /// Invalidate every message attached to a lifeline.
    fn invalidate_lifeline(&mut self, lifeline: PartKey) {
        let touching: Vec<PartKey> = self
            .graph
            .messages()
            .filter(|m| {
                [m.from, m.to].into_iter().any(|end| {
                    self.graph
                        .owning_lifeline(end)
                        .is_some_and(|l| l.key == lifeline)
                })
            })
            .map(|m| m.key)
            .collect();
        self.stale.extend(touching);
    }

    /// Recompute all stale routes.
    pub fn refresh_routes(&mut self) {
        for key in std::mem::take(&mut self.stale) {
            let route = self
                .graph
                .message(key)
                .and_then(|m| self.router.route_message(&self.graph, m));
            match route {
                Some(route) => {
                    self.routes.insert(key, route);
                }
                None => {
                    self.routes.remove(&key);
                }
            }
        }
    }

    /// Full drawable scene.
    pub fn scene(&self) -> Scene {
        build_scene(&self.graph, &self.axis, &self.router)
    }

    // ─── Model → model ───────────────────────────────────────────────────

    /// Apply a mutation, then bring derived routes up to date. Mutations
    /// naming parts that no longer exist are ignored.
    pub fn apply_mutation(&mut self, mutation: DiagramMutation) {
        if !self.apply_inner(&mutation) {
            log::warn!("ignored stale mutation {mutation:?}");
        }
        self.refresh_routes();
    }

    fn apply_inner(&mut self, mutation: &DiagramMutation) -> bool {
        match mutation {
            DiagramMutation::AddMessage { message } => {
                let key = message.key;
                let added = self.graph.add_message((**message).clone()).is_some();
                self.invalidate_route(key);
                added
            }
            DiagramMutation::RemoveMessage { key } => {
                self.routes.remove(key);
                self.graph.remove_message(*key).is_some()
            }
            DiagramMutation::AddActivation { activation } => {
                let group = activation.group;
                let added = self
                    .graph
                    .add_activation((**activation).clone())
                    .is_some();
                self.invalidate_lifeline(group);
                added
            }
            DiagramMutation::RemoveActivation { key } => {
                let Some(group) = self.graph.activation(*key).map(|a| a.group) else {
                    return false;
                };
                self.graph.remove_part(*key);
                self.routes.retain(|k, _| self.graph.message_index.contains_key(k));
                self.invalidate_lifeline(group);
                true
            }
            DiagramMutation::SetMessageTime { key, time } => {
                let Some(message) = self.graph.message_mut(*key) else {
                    return false;
                };
                message.time = *time;
                self.invalidate_route(*key);
                true
            }
            DiagramMutation::SetMessageText { key, text } => {
                let Some(message) = self.graph.message_mut(*key) else {
                    return false;
                };
                message.text = text.clone();
                true
            }
            DiagramMutation::MoveActivation { key, start } => {
                let Some(act) = self.graph.activation_mut(*key) else {
                    return false;
                };
                act.start = *start;
                let group = act.group;
                self.invalidate_lifeline(group);
                true
            }
            DiagramMutation::ResizeActivation { key, duration } => {
                let Some(act) = self.graph.activation_mut(*key) else {
                    return false;
                };
                act.duration = duration.max(MIN_ACTIVATION_DURATION);
                let group = act.group;
                self.invalidate_lifeline(group);
                true
            }
            DiagramMutation::MoveLifeline { key, x } => {
                let Some(lifeline) = self.graph.lifeline_mut(*key) else {
                    return false;
                };
                lifeline.loc.x = *x;
                self.invalidate_lifeline(*key);
                true
            }
            DiagramMutation::SetLifelineDuration { key, duration } => {
                let Some(lifeline) = self.graph.lifeline_mut(*key) else {
                    return false;
                };
                lifeline.duration = *duration;
                true
            }
        }
    }

    /// The mutation that undoes `mutation` against the current state.
    /// Returns `None` if `mutation` refers to nothing that exists.
    pub fn inverse_of(&self, mutation: &DiagramMutation) -> Option<DiagramMutation> {
        let g = &self.graph;
        Some(match mutation {
            DiagramMutation::AddMessage { message } => DiagramMutation::RemoveMessage { key: message.key },
            DiagramMutation::RemoveMessage { key } => DiagramMutation::AddMessage {
                message: Box::new(g.message(*key)?.clone()),
            },
            DiagramMutation::AddActivation { activation } => {
                DiagramMutation::RemoveActivation { key: activation.key }
            }
            DiagramMutation::RemoveActivation { key } => DiagramMutation::AddActivation {
                activation: Box::new(g.activation(*key)?.clone()),
            },
            DiagramMutation::SetMessageTime { key, .. } => DiagramMutation::SetMessageTime {
                key: *key,
                time: g.message(*key)?.time,
            },
            DiagramMutation::SetMessageText { key, .. } => DiagramMutation::SetMessageText {
                key: *key,
                text: g.message(*key)?.text.clone(),
            },
            DiagramMutation::MoveActivation { key, .. } => DiagramMutation::MoveActivation {
                key: *key,
                start: g.activation(*key)?.start,
            },
            DiagramMutation::ResizeActivation { key, .. } => DiagramMutation::ResizeActivation {
                key: *key,
                duration: g.activation(*key)?.duration,
            },
            DiagramMutation::MoveLifeline { key, .. } => DiagramMutation::MoveLifeline {
                key: *key,
                x: g.lifeline(*key)?.loc.x,
            },
            DiagramMutation::SetLifelineDuration { key, .. } => DiagramMutation::SetLifelineDuration {
                key: *key,
                duration: g.lifeline(*key)?.duration,
            },
        })
    }

    /// Lifeline extensions needed to cover all activations, as mutations.
    pub fn lifeline_height_mutations(&self, policy: HeightPolicy) -> Vec<DiagramMutation> {
        plan_lifeline_heights(&self.graph, policy)
            .into_iter()
            .map(|change| DiagramMutation::SetLifelineDuration {
                key: change.lifeline,
                duration: change.to,
            })
            .collect()
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    /// Serialise the full model.
    pub fn snapshot(&self) -> String {
        match self.graph.to_model_data().to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("snapshot failed: {e}");
                String::new()
            }
        }
    }

    /// Replace the model with a previous [`Self::snapshot`].
    pub fn restore(&mut self, snapshot: &str) -> Result<(), DocumentError> {
        let data = ModelData::from_json(snapshot)?;
        let graph = SequenceGraph::from_model_data(&data)?;
        self.replace_graph(graph);
        Ok(())
    }
}
