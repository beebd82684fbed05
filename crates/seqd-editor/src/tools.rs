//! Tool system for diagram interactions.
//!
//! Each tool translates user input events into `DiagramMutation`s that are
//! applied via the `SyncEngine`. Tools only ever emit absolute values so a
//! gesture can be replayed from its starting baselines on every move.
//!
//! | Tool          | Starts on               | Produces                                  |
//! |---------------|-------------------------|-------------------------------------------|
//! | Dragging      | part, message, or empty | lifeline x, activation start, message time |
//! | Messaging     | lifeline line           | new message + activation on release       |
//! | Resizing      | activation bottom edge  | activation duration                       |
//!
//! **Shift** toggles a part in or out of the selection when dragging.

use crate::config::{EditorConfig, GridCell};
use crate::hit::Hit;
use crate::input::InputEvent;
use crate::sync::{DiagramMutation, SyncEngine};
use seqd_core::id::PartKey;
use seqd_core::model::{Activation, Message, Part, Point};
use smallvec::SmallVec;

/// Which tool handles the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Dragging,
    Messaging,
    Resizing,
}

/// Read-only state a tool may consult.
pub struct ToolContext<'a> {
    pub engine: &'a SyncEngine,
    pub config: &'a EditorConfig,
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>, ctx: &ToolContext<'_>) -> Vec<DiagramMutation>;

    /// Drop any in-progress gesture state.
    fn cancel(&mut self);
}

/// Round `value` to the nearest multiple of `cell`. Non-positive cells
/// disable snapping.
pub fn snap(value: f64, cell: f64) -> f64 {
    if cell > 0.0 {
        (value / cell).round() * cell
    } else {
        value
    }
}

// ─── Dragging Tool ───────────────────────────────────────────────────────

/// A selectable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selected {
    Part(PartKey),
    Message(PartKey),
}

impl Selected {
    pub fn from_hit(hit: Hit) -> Self {
        match hit {
            Hit::LifelineHeader(k) | Hit::LifelineLine(k) => Selected::Part(k),
            Hit::Activation(k) | Hit::ActivationHandle(k) => Selected::Part(k),
            Hit::Message(k) => Selected::Message(k),
        }
    }
}

/// One participant of a drag and where it was when the drag began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragInfo {
    pub target: Selected,
    pub baseline: Point,
}

struct DragState {
    origin: Point,
    parts: Vec<DragInfo>,
}

/// Selection plus dragging of lifelines, activations, and messages.
///
/// Messages are dragged on their own: a selection made only of messages
/// still moves, and each message snaps independently from its own
/// baseline.
pub struct DraggingTool {
    /// Currently selected items, in selection order.
    pub selected: Vec<Selected>,
    drag: Option<DragState>,
}

impl Default for DraggingTool {
    fn default() -> Self {
        Self::new()
    }
}

impl DraggingTool {
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Dragging is allowed whenever the diagram is editable and moving is
    /// enabled, whatever the selection holds.
    pub fn may_move(config: &EditorConfig) -> bool {
        !config.read_only && config.allow_move
    }

    /// Every selected item that still exists, with its drag baseline.
    /// Selected messages are always included, whether or not their
    /// lifelines are selected too.
    pub fn compute_effective_selection(&self, engine: &SyncEngine) -> Vec<DragInfo> {
        let graph = &engine.graph;
        self.selected
            .iter()
            .filter_map(|&target| {
                let baseline = match target {
                    Selected::Part(key) => match graph.part(key)? {
                        Part::Lifeline(l) => l.loc,
                        Part::Activation(a) => engine.axis.activation_location(graph, a),
                    },
                    Selected::Message(key) => *engine.route(key)?.points.first()?,
                };
                Some(DragInfo { target, baseline })
            })
            .collect()
    }

    /// Mutations that place every dragged item at its baseline plus
    /// `offset`, snapped to `grid`.
    pub fn on_move(
        engine: &SyncEngine,
        parts: &[DragInfo],
        offset: (f64, f64),
        grid: GridCell,
    ) -> Vec<DiagramMutation> {
        let graph = &engine.graph;
        let axis = &engine.axis;
        let (dx, dy) = offset;

        parts
            .iter()
            .filter_map(|info| match info.target {
                Selected::Part(key) => match graph.part(key)? {
                    Part::Lifeline(_) => Some(DiagramMutation::MoveLifeline {
                        key,
                        x: snap(info.baseline.x + dx, grid.width),
                    }),
                    Part::Activation(_) => {
                        let y = snap(info.baseline.y + dy, grid.height).max(axis.min_activation_y());
                        Some(DiagramMutation::MoveActivation {
                            key,
                            start: axis.location_to_start(y),
                        })
                    }
                },
                Selected::Message(key) => {
                    let y = snap(info.baseline.y + dy, grid.height);
                    let time = axis.y_to_time(y).max(0.0);
                    log::trace!("message {key}: y {} -> time {time}", info.baseline.y + dy);
                    Some(DiagramMutation::SetMessageTime { key, time })
                }
            })
            .collect()
    }

    fn update_selection(&mut self, hit: Option<Hit>, shift: bool) {
        match hit.map(Selected::from_hit) {
            Some(item) if shift => {
                if let Some(pos) = self.selected.iter().position(|s| *s == item) {
                    self.selected.remove(pos);
                } else {
                    self.selected.push(item);
                }
            }
            // Click on an unselected item replaces the selection; clicking a
            // selected one keeps it for the drag.
            Some(item) if !self.selected.contains(&item) => self.selected = vec![item],
            Some(_) => {}
            None if !shift => self.selected.clear(),
            None => {}
        }
    }
}

impl Tool for DraggingTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Dragging
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>, ctx: &ToolContext<'_>) -> Vec<DiagramMutation> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.update_selection(hit, modifiers.shift);
                self.drag = None;
                let grabbed = hit.map(Selected::from_hit).is_some_and(|item| self.selected.contains(&item));
                if grabbed && Self::may_move(ctx.config) {
                    let parts = self.compute_effective_selection(ctx.engine);
                    if !parts.is_empty() {
                        self.drag = Some(DragState {
                            origin: Point::new(*x, *y),
                            parts,
                        });
                    }
                }
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => match &self.drag {
                Some(drag) => Self::on_move(
                    ctx.engine,
                    &drag.parts,
                    (x - drag.origin.x, y - drag.origin.y),
                    ctx.config.grid_cell,
                ),
                None => vec![],
            },
            InputEvent::PointerUp { .. } => {
                self.drag = None;
                vec![]
            }
        }
    }

    fn cancel(&mut self) {
        self.drag = None;
    }
}

// ─── Messaging Tool ──────────────────────────────────────────────────────

/// A message being drawn: its source, its fixed time, and where the
/// pointer currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMessage {
    pub from: PartKey,
    pub time: f64,
    pub pointer: Point,
}

/// Draws a new message from one lifeline to another.
///
/// The message time is taken once, when the gesture starts, rounded up to
/// the next whole time unit; moving the pointer only moves the preview's
/// free end. Releasing over a valid port commits the message together with
/// an activation on the receiving lifeline; releasing anywhere else commits
/// nothing.
pub struct MessagingTool {
    pending: Option<PendingMessage>,
}

impl Default for MessagingTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingTool {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// The preview state, while a message is being drawn.
    pub fn pending(&self) -> Option<&PendingMessage> {
        self.pending.as_ref()
    }

    fn commit(pending: PendingMessage, to: PartKey, ctx: &ToolContext<'_>) -> SmallVec<[DiagramMutation; 2]> {
        let graph = &ctx.engine.graph;
        let config = ctx.config;
        let message = Message::new(
            graph.fresh_key("msg"),
            pending.from,
            to,
            pending.time,
            config.default_message_text.clone(),
        );
        let activation = Activation::new(
            graph.fresh_key("act"),
            to,
            pending.time,
            config.default_activation_duration,
        );
        log::debug!(
            "commit message {} {} -> {} at t={}",
            message.key,
            pending.from,
            to,
            pending.time
        );
        SmallVec::from_buf([
            DiagramMutation::AddMessage {
                message: Box::new(message),
            },
            DiagramMutation::AddActivation {
                activation: Box::new(activation),
            },
        ])
    }
}

impl Tool for MessagingTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Messaging
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>, ctx: &ToolContext<'_>) -> Vec<DiagramMutation> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.pending = None;
                if ctx.config.read_only {
                    return vec![];
                }
                if let Some(from) = hit.and_then(|h| h.port(&ctx.engine.graph)) {
                    let time = ctx.engine.axis.y_to_time(*y).ceil();
                    self.pending = Some(PendingMessage {
                        from,
                        time: if time > 0.0 { time } else { 0.0 },
                        pointer: Point::new(*x, *y),
                    });
                }
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => {
                if let Some(pending) = &mut self.pending {
                    pending.pointer = Point::new(*x, *y);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                let Some(pending) = self.pending.take() else {
                    return vec![];
                };
                let target = hit
                    .and_then(|h| h.port(&ctx.engine.graph))
                    .filter(|to| *to != pending.from || ctx.config.allow_self_messages);
                match target {
                    Some(to) => Self::commit(pending, to, ctx).into_vec(),
                    None => {
                        log::debug!("message from {} abandoned: no valid target", pending.from);
                        vec![]
                    }
                }
            }
        }
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

// ─── Resizing Tool ───────────────────────────────────────────────────────

struct ResizeState {
    key: PartKey,
    origin_y: f64,
    base_height: f64,
}

/// Stretches an activation from its bottom handle.
pub struct ResizingTool {
    active: Option<ResizeState>,
}

impl Default for ResizingTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizingTool {
    pub fn new() -> Self {
        Self { active: None }
    }
}

impl Tool for ResizingTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Resizing
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<Hit>, ctx: &ToolContext<'_>) -> Vec<DiagramMutation> {
        let axis = &ctx.engine.axis;
        match event {
            InputEvent::PointerDown { y, .. } => {
                self.active = None;
                if ctx.config.read_only {
                    return vec![];
                }
                if let Some(Hit::ActivationHandle(key)) = hit
                    && let Some(act) = ctx.engine.graph.activation(key)
                {
                    self.active = Some(ResizeState {
                        key,
                        origin_y: *y,
                        base_height: axis.activation_height(act.duration),
                    });
                }
                vec![]
            }
            InputEvent::PointerMove { y, .. } => match &self.active {
                Some(state) => {
                    let height = snap(state.base_height + (y - state.origin_y), ctx.config.resize_cell_height)
                        .max(axis.min_activation_height());
                    vec![DiagramMutation::ResizeActivation {
                        key: state.key,
                        duration: axis.height_to_duration(height),
                    }]
                }
                None => vec![],
            },
            InputEvent::PointerUp { .. } => {
                self.active = None;
                vec![]
            }
        }
    }

    fn cancel(&mut self) {
        self.active = None;
    }
}
