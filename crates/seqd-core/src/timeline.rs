//! The time axis: a single linear mapping between abstract time and
//! vertical pixel position, plus the part geometry derived from it.
//!
//! Every forward function here has an inverse so that a pixel edit made by
//! the user (drag, resize) can be written back to the model, and the model
//! regenerates the same pixels:
//!
//! | forward                    | inverse                         |
//! |----------------------------|---------------------------------|
//! | [`TimeAxis::time_to_y`]    | [`TimeAxis::y_to_time`]         |
//! | [`TimeAxis::activation_location`] | [`TimeAxis::location_to_start`] |
//! | [`TimeAxis::activation_height`]   | [`TimeAxis::height_to_duration`] |

use crate::model::{Activation, MIN_ACTIVATION_DURATION, Point, SequenceGraph};

/// Vertical starting point in the document for all messages and activations.
pub const LINE_PREFIX: f64 = 20.0;
/// Vertical length of a lifeline beyond its last time unit.
pub const LINE_SUFFIX: f64 = 30.0;
/// Vertical distance between consecutive time units.
pub const MESSAGE_SPACING: f64 = 20.0;
/// Width of an activation bar.
pub const ACTIVATION_WIDTH: f64 = 10.0;
/// Height of an activation bar above its start time.
pub const ACTIVATION_LEAD: f64 = 5.0;
/// Height of an activation bar below its end time.
pub const ACTIVATION_TRAIL: f64 = 5.0;

/// Constants of the time ↔ pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    pub line_prefix: f64,
    pub line_suffix: f64,
    pub message_spacing: f64,
    pub activation_width: f64,
    pub activation_lead: f64,
    pub activation_trail: f64,
}

impl Default for TimeAxis {
    fn default() -> Self {
        Self {
            line_prefix: LINE_PREFIX,
            line_suffix: LINE_SUFFIX,
            message_spacing: MESSAGE_SPACING,
            activation_width: ACTIVATION_WIDTH,
            activation_lead: ACTIVATION_LEAD,
            activation_trail: ACTIVATION_TRAIL,
        }
    }
}

impl TimeAxis {
    pub fn time_to_y(&self, t: f64) -> f64 {
        t * self.message_spacing + self.line_prefix
    }

    pub fn y_to_time(&self, y: f64) -> f64 {
        (y - self.line_prefix) / self.message_spacing
    }

    /// Pixel length of a lifeline's dashed line.
    pub fn lifeline_height(&self, duration: f64) -> f64 {
        self.line_prefix + duration * self.message_spacing + self.line_suffix
    }

    /// Top-center of an activation bar. Returns [`Point::ZERO`] when the
    /// owning lifeline cannot be resolved.
    pub fn activation_location(&self, graph: &SequenceGraph, act: &Activation) -> Point {
        match graph.lifeline(act.group) {
            Some(lifeline) => Point::new(
                lifeline.loc.x,
                self.time_to_y(act.start) - self.activation_lead,
            ),
            None => Point::ZERO,
        }
    }

    /// Start time of an activation whose bar top sits at `y`.
    pub fn location_to_start(&self, y: f64) -> f64 {
        self.y_to_time(y + self.activation_lead)
    }

    /// Smallest y an activation bar top may be dragged to (start = 0).
    pub fn min_activation_y(&self) -> f64 {
        self.line_prefix - self.activation_lead
    }

    pub fn activation_height(&self, duration: f64) -> f64 {
        self.activation_lead + duration * self.message_spacing + self.activation_trail
    }

    pub fn height_to_duration(&self, height: f64) -> f64 {
        (height - self.activation_lead - self.activation_trail) / self.message_spacing
    }

    /// Bar height of the shortest activation allowed.
    pub fn min_activation_height(&self) -> f64 {
        self.activation_height(MIN_ACTIVATION_DURATION)
    }
}
