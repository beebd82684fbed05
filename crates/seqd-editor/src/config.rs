//! Editor configuration.

use seqd_core::reconcile::HeightPolicy;
use seqd_core::timeline::TimeAxis;

/// Snapping grid for drags, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub width: f64,
    pub height: f64,
}

impl GridCell {
    /// Quarter-time-unit rows, single-pixel columns.
    pub fn for_axis(axis: &TimeAxis) -> Self {
        Self {
            width: 1.0,
            height: axis.message_spacing / 4.0,
        }
    }
}

/// Knobs controlling interaction behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Reject every model-changing gesture.
    pub read_only: bool,
    /// Allow the dragging tool to move parts.
    pub allow_move: bool,
    /// Grid used when dragging parts and messages.
    pub grid_cell: GridCell,
    /// Row height activation resizing snaps to.
    pub resize_cell_height: f64,
    /// Label given to messages drawn with the messaging tool.
    pub default_message_text: String,
    /// Duration of the activation created on the receiver of a new message.
    pub default_activation_duration: f64,
    /// Whether the messaging tool may connect a lifeline to itself.
    pub allow_self_messages: bool,
    /// Maximum undo depth.
    pub undo_depth: usize,
    pub height_policy: HeightPolicy,
}

impl EditorConfig {
    pub fn for_axis(axis: &TimeAxis) -> Self {
        Self {
            read_only: false,
            allow_move: true,
            grid_cell: GridCell::for_axis(axis),
            resize_cell_height: axis.message_spacing / 4.0,
            default_message_text: "msg".to_string(),
            default_activation_duration: 1.0,
            allow_self_messages: false,
            undo_depth: 200,
            height_policy: HeightPolicy::default(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::for_axis(&TimeAxis::default())
    }
}
