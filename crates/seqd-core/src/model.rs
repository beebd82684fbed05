//! Core data model for sequence diagrams.
//!
//! The diagram is a directed multigraph: nodes are lifelines and the
//! activations that live on them, edges are messages. A self-message is a
//! self-loop edge. Activation ownership is carried by the activation's
//! `group` key rather than by graph edges, so an activation whose owner is
//! missing can still be represented (geometry then degrades to a sentinel).
//!
//! Only abstract quantities are stored here (`start`, `duration`, `time`).
//! Pixel geometry is always derived through [`crate::timeline::TimeAxis`].

use crate::id::PartKey;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Smallest duration an activation may be resized to, in time units.
pub const MIN_ACTIVATION_DURATION: f64 = 0.25;

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A document-space point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The degenerate location returned when geometry cannot be resolved.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse the whitespace-separated `"x y"` form used by `loc` fields.
    /// Missing or unparsable components yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let x = parts.next()?.parse::<f64>().ok()?;
        let y = parts.next()?.parse::<f64>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

// ─── Parts ───────────────────────────────────────────────────────────────

/// Fields carried through load/save without interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartMeta {
    /// Display label.
    pub text: Option<String>,
    /// Variant group this part belongs to (see [`crate::document::ModelData::relabel_param_group`]).
    pub param_group: Option<String>,
    /// Unknown JSON fields, preserved verbatim.
    pub extra: Map<String, Value>,
}

/// A participant's vertical track.
#[derive(Debug, Clone, PartialEq)]
pub struct Lifeline {
    pub key: PartKey,
    /// Header position. Only `x` is editable; headers sit on `y = 0`.
    pub loc: Point,
    /// Extent of the lifeline in time units. Only ever grows automatically.
    pub duration: f64,
    pub meta: PartMeta,
}

impl Lifeline {
    pub fn new(key: PartKey, loc: Point, duration: f64) -> Self {
        Self {
            key,
            loc,
            duration,
            meta: PartMeta::default(),
        }
    }

    /// Header label, falling back to the key.
    pub fn label(&self) -> &str {
        self.meta.text.as_deref().unwrap_or(self.key.as_str())
    }
}

/// An interval during which a participant is active.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub key: PartKey,
    /// Owning lifeline.
    pub group: PartKey,
    pub start: f64,
    pub duration: f64,
    pub meta: PartMeta,
}

impl Activation {
    pub fn new(key: PartKey, group: PartKey, start: f64, duration: f64) -> Self {
        Self {
            key,
            group,
            start,
            duration,
            meta: PartMeta::default(),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Inclusive on both ends.
    pub fn covers(&self, time: f64) -> bool {
        self.start <= time && time <= self.end()
    }
}

/// A directed event between two lifelines at an abstract instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub key: PartKey,
    pub from: PartKey,
    pub to: PartKey,
    pub time: f64,
    pub text: String,
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(key: PartKey, from: PartKey, to: PartKey, time: f64, text: impl Into<String>) -> Self {
        Self {
            key,
            from,
            to,
            time,
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn is_self_message(&self) -> bool {
        self.from == self.to
    }
}

/// A node in the sequence graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Lifeline(Lifeline),
    Activation(Activation),
}

impl Part {
    pub fn key(&self) -> PartKey {
        match self {
            Part::Lifeline(l) => l.key,
            Part::Activation(a) => a.key,
        }
    }

    pub fn as_lifeline(&self) -> Option<&Lifeline> {
        match self {
            Part::Lifeline(l) => Some(l),
            Part::Activation(_) => None,
        }
    }

    pub fn as_activation(&self) -> Option<&Activation> {
        match self {
            Part::Activation(a) => Some(a),
            Part::Lifeline(_) => None,
        }
    }
}

// ─── Sequence Graph ──────────────────────────────────────────────────────

/// The in-memory document: parts, messages, and key indexes.
#[derive(Debug, Clone, Default)]
pub struct SequenceGraph {
    /// Nodes are lifelines and activations; edges are messages.
    pub graph: StableDiGraph<Part, Message>,

    /// Index from part key → node index.
    pub part_index: HashMap<PartKey, NodeIndex>,

    /// Index from message key → edge index.
    pub message_index: HashMap<PartKey, EdgeIndex>,
}

impl SequenceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a part. Returns `None` (and leaves the graph untouched) if the
    /// key is already taken.
    pub fn add_part(&mut self, part: Part) -> Option<NodeIndex> {
        let key = part.key();
        if self.part_index.contains_key(&key) {
            return None;
        }
        let idx = self.graph.add_node(part);
        self.part_index.insert(key, idx);
        Some(idx)
    }

    pub fn add_lifeline(&mut self, lifeline: Lifeline) -> Option<NodeIndex> {
        self.add_part(Part::Lifeline(lifeline))
    }

    pub fn add_activation(&mut self, activation: Activation) -> Option<NodeIndex> {
        self.add_part(Part::Activation(activation))
    }

    /// Insert a message between two existing parts. Returns `None` if an
    /// endpoint is unknown or the message key is already taken.
    pub fn add_message(&mut self, message: Message) -> Option<EdgeIndex> {
        if self.message_index.contains_key(&message.key) {
            return None;
        }
        let from = self.index_of(message.from)?;
        let to = self.index_of(message.to)?;
        let key = message.key;
        let edge = self.graph.add_edge(from, to, message);
        self.message_index.insert(key, edge);
        Some(edge)
    }

    /// Remove a part. Messages attached to it are removed as well.
    pub fn remove_part(&mut self, key: PartKey) -> Option<Part> {
        let idx = self.part_index.remove(&key)?;
        let attached: Vec<PartKey> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, petgraph::Direction::Incoming))
            .map(|e| e.weight().key)
            .collect();
        for msg in attached {
            self.message_index.remove(&msg);
        }
        self.graph.remove_node(idx)
    }

    pub fn remove_message(&mut self, key: PartKey) -> Option<Message> {
        let edge = self.message_index.remove(&key)?;
        self.graph.remove_edge(edge)
    }

    pub fn index_of(&self, key: PartKey) -> Option<NodeIndex> {
        self.part_index.get(&key).copied()
    }

    pub fn part(&self, key: PartKey) -> Option<&Part> {
        self.index_of(key).map(|idx| &self.graph[idx])
    }

    pub fn lifeline(&self, key: PartKey) -> Option<&Lifeline> {
        self.part(key).and_then(Part::as_lifeline)
    }

    pub fn lifeline_mut(&mut self, key: PartKey) -> Option<&mut Lifeline> {
        let idx = self.index_of(key)?;
        match &mut self.graph[idx] {
            Part::Lifeline(l) => Some(l),
            Part::Activation(_) => None,
        }
    }

    pub fn activation(&self, key: PartKey) -> Option<&Activation> {
        self.part(key).and_then(Part::as_activation)
    }

    pub fn activation_mut(&mut self, key: PartKey) -> Option<&mut Activation> {
        let idx = self.index_of(key)?;
        match &mut self.graph[idx] {
            Part::Activation(a) => Some(a),
            Part::Lifeline(_) => None,
        }
    }

    pub fn message(&self, key: PartKey) -> Option<&Message> {
        self.message_index
            .get(&key)
            .and_then(|e| self.graph.edge_weight(*e))
    }

    pub fn message_mut(&mut self, key: PartKey) -> Option<&mut Message> {
        let edge = *self.message_index.get(&key)?;
        self.graph.edge_weight_mut(edge)
    }

    /// All lifelines in insertion order.
    pub fn lifelines(&self) -> impl Iterator<Item = &Lifeline> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].as_lifeline())
    }

    /// All activations in insertion order.
    pub fn activations(&self) -> impl Iterator<Item = &Activation> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].as_activation())
    }

    /// All messages in insertion order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.graph.edge_indices().map(|e| &self.graph[e])
    }

    /// Activations owned by the given lifeline.
    pub fn activations_of(&self, lifeline: PartKey) -> impl Iterator<Item = &Activation> {
        self.activations().filter(move |a| a.group == lifeline)
    }

    /// The lifeline a part sits on: itself for a lifeline, its owner for an
    /// activation. `None` when the owner is missing.
    pub fn owning_lifeline(&self, key: PartKey) -> Option<&Lifeline> {
        match self.part(key)? {
            Part::Lifeline(l) => Some(l),
            Part::Activation(a) => self.lifeline(a.group),
        }
    }

    /// A generated key not used by any part or message in this graph.
    pub fn fresh_key(&self, prefix: &str) -> PartKey {
        loop {
            let key = PartKey::with_prefix(prefix);
            if !self.part_index.contains_key(&key) && !self.message_index.contains_key(&key) {
                return key;
            }
        }
    }
}
