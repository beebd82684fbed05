//! The generic graph view: a plain node/link document colour-coded by
//! label, with optional per-node navigation targets.
//!
//! Only the document side lives here. Positions come from whatever layout
//! the host runs.

use crate::error::DocumentError;
use crate::id::PartKey;
use serde::{Deserialize, Serialize};

/// Fill used for labels with no palette entry.
pub const DEFAULT_FILL: &str = "#E0E0E0";

/// Fill for every label starting with `sample`.
const SAMPLE_FILL: &str = "#B3E5FC";

const PALETTE: &[(&str, &str)] = &[
    ("Test Runner", "#FFCDD2"),
    ("Test", "#F8BBD0"),
];

/// Fill colour for a label.
pub fn fill_for_text(text: &str) -> &'static str {
    if text.starts_with("sample") {
        return SAMPLE_FILL;
    }
    PALETTE
        .iter()
        .find(|(label, _)| *label == text)
        .map(|(_, fill)| *fill)
        .unwrap_or(DEFAULT_FILL)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PartKey>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl GraphNode {
    /// Explicit colour wins over the label palette.
    pub fn fill(&self) -> &str {
        self.color.as_deref().unwrap_or_else(|| fill_for_text(&self.text))
    }

    /// Where a click on this node navigates, if anywhere.
    pub fn navigation_target(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub from: PartKey,
    pub to: PartKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    #[serde(default)]
    pub node_data_array: Vec<GraphNode>,
    #[serde(default)]
    pub link_data_array: Vec<GraphLink>,
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Node a link endpoint refers to: by key, else by label.
    pub fn resolve(&self, endpoint: PartKey) -> Option<&GraphNode> {
        let nodes = &self.node_data_array;
        nodes
            .iter()
            .find(|n| n.key == Some(endpoint))
            .or_else(|| nodes.iter().find(|n| n.text == endpoint.as_str()))
    }

    /// Links whose endpoints do not resolve to any node.
    pub fn dangling_links(&self) -> Vec<&GraphLink> {
        self.link_data_array
            .iter()
            .filter(|l| self.resolve(l.from).is_none() || self.resolve(l.to).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_lookup() {
        assert_eq!(fill_for_text("Test Runner"), "#FFCDD2");
        assert_eq!(fill_for_text("sample42"), "#B3E5FC");
        assert_eq!(fill_for_text("sample2"), "#B3E5FC");
        assert_eq!(fill_for_text("Unknown"), DEFAULT_FILL);
    }

    #[test]
    fn explicit_color_overrides_palette() {
        let node = GraphNode {
            text: "Test".into(),
            color: Some("#123456".into()),
            ..Default::default()
        };
        assert_eq!(node.fill(), "#123456");
    }

    #[test]
    fn links_resolve_by_key_or_text() {
        let doc = GraphDocument::from_json(
            r#"{ "nodeDataArray": [ { "key": 1, "text": "Test Runner", "url": "seq.html?data=a.json" },
                                    { "text": "Test" } ],
                 "linkDataArray": [ { "from": 1, "to": "Test", "text": "runs" },
                                    { "from": 1, "to": "Nobody" } ] }"#,
        )
        .unwrap();
        let link = &doc.link_data_array[0];
        assert_eq!(doc.resolve(link.from).unwrap().text, "Test Runner");
        assert_eq!(doc.resolve(link.to).unwrap().text, "Test");
        assert_eq!(doc.dangling_links().len(), 1);
        assert_eq!(
            doc.node_data_array[0].navigation_target(),
            Some("seq.html?data=a.json")
        );
        assert_eq!(doc.node_data_array[1].navigation_target(), None);
    }
}
