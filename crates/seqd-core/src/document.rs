//! JSON document format.
//!
//! A sequence document carries the diagram in `nodeDataArray` /
//! `linkDataArray` plus up to three time-shifted sections (`setUp`,
//! `testBody`, `tearDown`). Loading merges the sections into the main
//! arrays, then builds a [`SequenceGraph`]. Saving goes the other way via
//! [`SequenceGraph::to_model_data`]; unknown fields survive the trip.

use crate::error::DocumentError;
use crate::id::PartKey;
use crate::model::{Activation, Lifeline, Message, PartMeta, Point, SequenceGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The parameter key whose variants relabel nodes.
pub const PRIME_TABLE_KEY: &str = "PrimeTable";

/// Variants offered when the document's `param` does not list any.
pub const DEFAULT_PRIME_TABLE: [&str; 2] = ["OnTheFlyPrimeTable", "PreCalculatedPrimeTable"];

/// Raw node entry: a lifeline when `isGroup` is set, an activation otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PartKey>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_group: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<PartKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_group: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw link entry (a message).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PartKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PartKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PartKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The diagram content: node and link arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelData {
    #[serde(default)]
    pub node_data_array: Vec<NodeData>,
    #[serde(default)]
    pub link_data_array: Vec<LinkData>,
}

impl ModelData {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Set `text` on every node whose `paramGroup` equals `group`.
    /// Returns how many nodes were relabelled.
    pub fn relabel_param_group(&mut self, group: &str, text: &str) -> usize {
        let mut count = 0;
        for node in &mut self.node_data_array {
            if node.param_group.as_deref() == Some(group) {
                node.text = Some(text.to_string());
                count += 1;
            }
        }
        count
    }
}

/// A time-shifted block of nodes and links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default)]
    pub start: f64,
    #[serde(flatten)]
    pub model: ModelData,
}

/// A complete sequence document as fetched by the browser page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_up: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_body: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tear_down: Option<Section>,
    #[serde(flatten)]
    pub model: ModelData,
}

impl SequenceDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse and merge sections in one step.
    pub fn load(json: &str) -> Result<Self, DocumentError> {
        let mut doc = Self::from_json(json)?;
        doc.merge_sections();
        Ok(doc)
    }

    /// Fold `setUp`, `testBody`, then `tearDown` into the main arrays,
    /// shifting each entry's `start` (nodes) or `time` (links) by the
    /// section's `start`. Entries without the field are copied unchanged.
    /// Sections are consumed, so merging twice is a no-op.
    pub fn merge_sections(&mut self) {
        let sections = [
            ("setUp", self.set_up.take()),
            ("testBody", self.test_body.take()),
            ("tearDown", self.tear_down.take()),
        ];
        for (name, section) in sections {
            let Some(section) = section else { continue };
            let offset = section.start;
            log::debug!(
                "merge section {name}: {} nodes, {} links at +{offset}",
                section.model.node_data_array.len(),
                section.model.link_data_array.len()
            );
            for mut node in section.model.node_data_array {
                node.start = node.start.map(|s| shift(name, s, offset));
                self.model.node_data_array.push(node);
            }
            for mut link in section.model.link_data_array {
                link.time = link.time.map(|t| shift(name, t, offset));
                self.model.link_data_array.push(link);
            }
        }
    }

    /// Labels for the variant buttons under `key`: the document's own list
    /// when `param[key]` is an array of strings, else the default set.
    pub fn variant_labels(&self, key: &str) -> Vec<String> {
        self.param
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .filter(|labels| !labels.is_empty())
            .unwrap_or_else(|| DEFAULT_PRIME_TABLE.iter().map(|s| s.to_string()).collect())
    }

    /// Build the diagram from the (merged) main arrays.
    pub fn to_graph(&self) -> Result<SequenceGraph, DocumentError> {
        SequenceGraph::from_model_data(&self.model)
    }
}

fn shift(section: &str, value: f64, offset: f64) -> f64 {
    let shifted = value + offset;
    if shifted < 0.0 {
        log::warn!("section {section}: shifted value {value} + {offset} is negative");
    }
    shifted
}

// ─── Model ↔ graph ───────────────────────────────────────────────────────

fn meta_of(node: &NodeData) -> PartMeta {
    PartMeta {
        text: node.text.clone(),
        param_group: node.param_group.clone(),
        extra: node.extra.clone(),
    }
}

impl SequenceGraph {
    /// Build a graph from node/link arrays. Parts come first so messages can
    /// reference any of them regardless of array order.
    pub fn from_model_data(data: &ModelData) -> Result<Self, DocumentError> {
        let mut graph = SequenceGraph::new();

        for node in &data.node_data_array {
            let key = node.key.unwrap_or_else(|| graph.fresh_key("node"));
            let inserted = if node.is_group {
                let loc = match node.loc.as_deref() {
                    Some(s) => Point::parse(s).unwrap_or_else(|| {
                        log::warn!("lifeline {key}: unparsable loc {s:?}, using origin");
                        Point::ZERO
                    }),
                    None => Point::ZERO,
                };
                graph.add_lifeline(Lifeline {
                    key,
                    loc,
                    duration: node.duration.unwrap_or(0.0),
                    meta: meta_of(node),
                })
            } else {
                let missing = |field| DocumentError::MissingField {
                    entity: "activation",
                    key: key.to_string(),
                    field,
                };
                graph.add_activation(Activation {
                    key,
                    group: node.group.ok_or_else(|| missing("group"))?,
                    start: node.start.ok_or_else(|| missing("start"))?,
                    duration: node.duration.ok_or_else(|| missing("duration"))?,
                    meta: meta_of(node),
                })
            };
            if inserted.is_none() {
                return Err(DocumentError::DuplicateKey(key.to_string()));
            }
        }

        for link in &data.link_data_array {
            let key = link.key.unwrap_or_else(|| graph.fresh_key("msg"));
            let missing = |field| DocumentError::MissingField {
                entity: "message",
                key: key.to_string(),
                field,
            };
            let from = link.from.ok_or_else(|| missing("from"))?;
            let to = link.to.ok_or_else(|| missing("to"))?;
            for endpoint in [from, to] {
                if graph.index_of(endpoint).is_none() {
                    return Err(DocumentError::UnknownEndpoint {
                        message: key.to_string(),
                        endpoint: endpoint.to_string(),
                    });
                }
            }
            let message = Message {
                key,
                from,
                to,
                time: link.time.unwrap_or(0.0),
                text: link.text.clone().unwrap_or_default(),
                extra: link.extra.clone(),
            };
            if graph.add_message(message).is_none() {
                return Err(DocumentError::DuplicateKey(key.to_string()));
            }
        }

        Ok(graph)
    }

    /// Serialise back to node/link arrays.
    pub fn to_model_data(&self) -> ModelData {
        let node_data_array = self
            .lifelines()
            .map(|l| NodeData {
                key: Some(l.key),
                is_group: true,
                group: None,
                text: l.meta.text.clone(),
                loc: Some(l.loc.to_string()),
                start: None,
                duration: Some(l.duration),
                param_group: l.meta.param_group.clone(),
                extra: l.meta.extra.clone(),
            })
            .chain(self.activations().map(|a| NodeData {
                key: Some(a.key),
                is_group: false,
                group: Some(a.group),
                text: a.meta.text.clone(),
                loc: None,
                start: Some(a.start),
                duration: Some(a.duration),
                param_group: a.meta.param_group.clone(),
                extra: a.meta.extra.clone(),
            }))
            .collect();

        let link_data_array = self
            .messages()
            .map(|m| LinkData {
                key: Some(m.key),
                from: Some(m.from),
                to: Some(m.to),
                time: Some(m.time),
                text: Some(m.text.clone()),
                extra: m.extra.clone(),
            })
            .collect();

        ModelData {
            node_data_array,
            link_data_array,
        }
    }
}
