pub mod document;
pub mod error;
pub mod graph_view;
pub mod id;
pub mod model;
pub mod reconcile;
pub mod route;
pub mod scene;
pub mod source;
pub mod timeline;

pub use document::{ModelData, SequenceDocument};
pub use error::DocumentError;
pub use id::PartKey;
pub use model::*;
pub use reconcile::{HeightChange, HeightPolicy, ensure_lifeline_heights, plan_lifeline_heights};
pub use route::{ArrowDirection, Endpoint, LinkRouter, MessageRouter, Route};
pub use scene::{Scene, build_scene};
pub use timeline::TimeAxis;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
