//! The editor controller.
//!
//! Owns the sync engine, the undo stack, and the tools, and turns raw
//! pointer/keyboard input into gesture transactions:
//!
//! 1. pointer down hit-tests, picks a tool, and opens a batch;
//! 2. pointer moves apply the tool's absolute mutations live;
//! 3. pointer up applies the final mutations, extends lifelines so they
//!    cover every activation, and closes the batch as one undo step.
//!
//! A gesture that is cancelled, or a message dropped on nothing, restores
//! the model captured at pointer down.

use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::hit::{Hit, hit_test};
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::{DiagramMutation, SyncEngine};
use crate::tools::{
    DraggingTool, MessagingTool, PendingMessage, ResizingTool, Selected, Tool, ToolContext, ToolKind,
};
use seqd_core::document::{ModelData, PRIME_TABLE_KEY, SequenceDocument};
use seqd_core::error::DocumentError;
use seqd_core::id::PartKey;
use seqd_core::model::{Point, SequenceGraph};
use seqd_core::reconcile::{HeightPolicy, ensure_lifeline_heights};
use seqd_core::route::{Endpoint, LinkRouter, Route};
use seqd_core::scene::Scene;
use seqd_core::timeline::TimeAxis;

/// Interactive sequence-diagram editor.
pub struct Editor {
    engine: SyncEngine,
    commands: CommandStack,
    config: EditorConfig,
    dragging: DraggingTool,
    messaging: MessagingTool,
    resizing: ResizingTool,
    /// Tool forced by the user; `None` picks by what is under the pointer.
    preferred: Option<ToolKind>,
    /// Tool driving the open gesture.
    active: Option<ToolKind>,
    /// Whether the open gesture has applied any mutation.
    gesture_dirty: bool,
    title: String,
    variant_key: String,
    variant_labels: Vec<String>,
}

impl Editor {
    /// An editor over an empty diagram.
    pub fn new(config: EditorConfig, axis: TimeAxis) -> Self {
        Self {
            engine: SyncEngine::empty(axis),
            commands: CommandStack::new(config.undo_depth),
            config,
            dragging: DraggingTool::new(),
            messaging: MessagingTool::new(),
            resizing: ResizingTool::new(),
            preferred: None,
            active: None,
            gesture_dirty: false,
            title: String::new(),
            variant_key: PRIME_TABLE_KEY.to_string(),
            variant_labels: Vec::new(),
        }
    }

    /// Parse a sequence document and open it.
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, DocumentError> {
        let axis = TimeAxis::default();
        let mut editor = Self::new(config, axis);
        editor.load(json)?;
        Ok(editor)
    }

    /// Replace the diagram with a parsed, merged document. On error the
    /// current diagram is left untouched.
    pub fn load(&mut self, json: &str) -> Result<(), DocumentError> {
        let doc = SequenceDocument::load(json)?;
        let mut graph = doc.to_graph()?;
        let raised = ensure_lifeline_heights(&mut graph, self.config.height_policy);
        log::debug!(
            "loaded {:?}: {} messages, {} lifelines raised",
            doc.title,
            graph.messages().count(),
            raised.len()
        );

        self.abandon_gesture();
        self.variant_labels = doc.variant_labels(&self.variant_key);
        self.title = doc.title;
        self.engine.replace_graph(graph);
        self.commands.clear();
        self.dragging.selected.clear();
        Ok(())
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn graph(&self) -> &SequenceGraph {
        &self.engine.graph
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn selection(&self) -> &[Selected] {
        &self.dragging.selected
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.active
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Toggle read-only mode. Any open gesture is cancelled.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.cancel_gesture();
        self.config.read_only = read_only;
    }

    /// Switch the lifeline height rule. Lifelines too short under the new
    /// rule are extended as one undo step.
    pub fn set_height_policy(&mut self, policy: HeightPolicy) {
        self.cancel_gesture();
        self.config.height_policy = policy;
        if self.config.read_only {
            return;
        }
        let raise = self.engine.lifeline_height_mutations(policy);
        if raise.is_empty() {
            return;
        }
        self.commands.begin_batch(&self.engine, "Extend lifelines");
        for mutation in raise {
            self.commands.execute(&mut self.engine, mutation, "");
        }
        self.commands.end_batch(&self.engine);
    }

    /// Force a tool for subsequent gestures, or `None` to pick by hit.
    pub fn set_preferred_tool(&mut self, tool: Option<ToolKind>) {
        self.preferred = tool;
    }

    /// Drawable geometry of the whole diagram.
    pub fn scene(&self) -> Scene {
        self.engine.scene()
    }

    /// Serialised node/link arrays of the current diagram.
    pub fn model_json(&self) -> Result<String, DocumentError> {
        self.engine.graph.to_model_data().to_json()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    fn choose_tool(&self, hit: Option<Hit>) -> ToolKind {
        let graph = &self.engine.graph;
        match (self.preferred, hit) {
            (Some(ToolKind::Messaging), Some(h)) if h.port(graph).is_some() => ToolKind::Messaging,
            (Some(ToolKind::Messaging), _) => ToolKind::Dragging,
            (_, Some(Hit::ActivationHandle(_))) => ToolKind::Resizing,
            (Some(ToolKind::Dragging), _) => ToolKind::Dragging,
            (_, Some(Hit::LifelineLine(_))) => ToolKind::Messaging,
            _ => ToolKind::Dragging,
        }
    }

    fn dispatch(&mut self, kind: ToolKind, event: &InputEvent, hit: Option<Hit>) -> Vec<DiagramMutation> {
        let ctx = ToolContext {
            engine: &self.engine,
            config: &self.config,
        };
        match kind {
            ToolKind::Dragging => self.dragging.handle(event, hit, &ctx),
            ToolKind::Messaging => self.messaging.handle(event, hit, &ctx),
            ToolKind::Resizing => self.resizing.handle(event, hit, &ctx),
        }
    }

    fn apply_all(&mut self, mutations: Vec<DiagramMutation>) -> bool {
        let changed = !mutations.is_empty();
        for mutation in mutations {
            self.commands.execute(&mut self.engine, mutation, "");
        }
        self.gesture_dirty |= changed;
        changed
    }

    /// Start a gesture. Returns `true` if the model changed.
    pub fn pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        if self.active.is_some() {
            self.cancel_gesture();
        }
        let hit = hit_test(&self.engine, Point::new(x, y));
        let kind = self.choose_tool(hit);
        log::debug!("gesture start: {kind:?} on {hit:?}");

        self.commands.begin_batch(&self.engine, gesture_description(kind));
        self.active = Some(kind);
        self.gesture_dirty = false;

        let mutations = self.dispatch(kind, &InputEvent::pointer_down(x, y, modifiers), hit);
        self.apply_all(mutations)
    }

    /// Continue the open gesture. Returns `true` if the model changed.
    pub fn pointer_move(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        let Some(kind) = self.active else {
            return false;
        };
        let hit = hit_test(&self.engine, Point::new(x, y));
        let mutations = self.dispatch(kind, &InputEvent::pointer_move(x, y, modifiers), hit);
        self.apply_all(mutations)
    }

    /// Finish the open gesture. Returns `true` if an undo step was recorded.
    pub fn pointer_up(&mut self, x: f64, y: f64, modifiers: Modifiers) -> bool {
        let Some(kind) = self.active.take() else {
            return false;
        };
        let hit = hit_test(&self.engine, Point::new(x, y));
        let mutations = self.dispatch(kind, &InputEvent::pointer_up(x, y, modifiers), hit);

        if kind == ToolKind::Messaging && mutations.is_empty() {
            self.commands.abort_batch(&mut self.engine);
            self.gesture_dirty = false;
            return false;
        }
        self.apply_all(mutations);

        if self.gesture_dirty {
            let raise = self.engine.lifeline_height_mutations(self.config.height_policy);
            self.apply_all(raise);
        }
        self.gesture_dirty = false;
        let recorded = self.commands.end_batch(&self.engine);
        log::debug!("gesture end: {kind:?}, recorded = {recorded}");
        recorded
    }

    /// Abort the open gesture, restoring the model from pointer down.
    /// Returns `true` if a gesture was open.
    pub fn cancel_gesture(&mut self) -> bool {
        let Some(kind) = self.active else {
            return false;
        };
        log::debug!("gesture cancelled: {kind:?}");
        self.commands.abort_batch(&mut self.engine);
        self.abandon_gesture();
        true
    }

    fn abandon_gesture(&mut self) {
        self.dragging.cancel();
        self.messaging.cancel();
        self.resizing.cancel();
        self.active = None;
        self.gesture_dirty = false;
    }

    /// The message being drawn, if any.
    pub fn pending_message(&self) -> Option<&PendingMessage> {
        match self.active {
            Some(ToolKind::Messaging) => self.messaging.pending(),
            _ => None,
        }
    }

    /// Route from the pending message's source to the pointer.
    pub fn preview_route(&self) -> Option<Route> {
        let pending = self.pending_message()?;
        let graph = &self.engine.graph;
        let y = self.engine.axis.time_to_y(pending.time);
        self.engine.router().compute_route(
            graph,
            Endpoint::Part(pending.from),
            Endpoint::Free(Point::new(pending.pointer.x, y)),
            pending.time,
        )
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        if self.config.read_only {
            return None;
        }
        self.cancel_gesture();
        let desc = self.commands.undo(&mut self.engine)?;
        self.prune_selection();
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        if self.config.read_only {
            return None;
        }
        self.cancel_gesture();
        let desc = self.commands.redo(&mut self.engine)?;
        self.prune_selection();
        Some(desc)
    }

    /// Select every lifeline, activation, and message.
    pub fn select_all(&mut self) {
        let graph = &self.engine.graph;
        let parts = graph
            .lifelines()
            .map(|l| Selected::Part(l.key))
            .chain(graph.activations().map(|a| Selected::Part(a.key)));
        let messages = graph.messages().map(|m| Selected::Message(m.key));
        self.dragging.selected = parts.chain(messages).collect();
    }

    pub fn clear_selection(&mut self) {
        self.dragging.selected.clear();
    }

    fn prune_selection(&mut self) {
        let graph = &self.engine.graph;
        self.dragging.selected.retain(|s| match *s {
            Selected::Part(key) => graph.part(key).is_some(),
            Selected::Message(key) => graph.message(key).is_some(),
        });
    }

    /// Rename a message as its own undo step. Returns `false` if the
    /// message does not exist or the editor is read-only.
    pub fn set_message_text(&mut self, key: PartKey, text: &str) -> bool {
        if self.config.read_only || self.engine.graph.message(key).is_none() {
            return false;
        }
        self.cancel_gesture();
        self.commands.execute(
            &mut self.engine,
            DiagramMutation::SetMessageText {
                key,
                text: text.to_string(),
            },
            "Edit message text",
        );
        true
    }

    // ─── Variants ────────────────────────────────────────────────────────

    /// Labels offered for switching the parameterised parts.
    pub fn variant_labels(&self) -> &[String] {
        &self.variant_labels
    }

    /// Relabel every part in the variant's parameter group and replace the
    /// model wholesale. History is cleared. Returns the number of parts
    /// relabelled.
    pub fn select_variant(&mut self, label: &str) -> Result<usize, DocumentError> {
        self.cancel_gesture();
        let mut data: ModelData = self.engine.graph.to_model_data();
        let count = data.relabel_param_group(&self.variant_key, label);
        let graph = SequenceGraph::from_model_data(&data)?;
        log::info!("variant {label:?}: relabelled {count} parts");

        self.engine.replace_graph(graph);
        self.commands.clear();
        self.prune_selection();
        Ok(count)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and perform a shortcut. Returns the action taken, if any.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        match action {
            ShortcutAction::ToolSelect => self.preferred = Some(ToolKind::Dragging),
            ShortcutAction::ToolMessage => self.preferred = Some(ToolKind::Messaging),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::SelectAll => self.select_all(),
            ShortcutAction::Cancel => {
                if !self.cancel_gesture() {
                    self.clear_selection();
                }
            }
        }
        Some(action)
    }
}

fn gesture_description(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::Dragging => "Move",
        ToolKind::Messaging => "Add message",
        ToolKind::Resizing => "Resize activation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "nodeDataArray": [
            {"key": "ed_A", "isGroup": true, "loc": "0 0", "duration": 4},
            {"key": "ed_B", "isGroup": true, "loc": "100 0", "duration": 4},
            {"key": "ed_b", "group": "ed_B", "start": 1, "duration": 1}
        ],
        "linkDataArray": [
            {"key": "ed_m", "from": "ed_A", "to": "ed_B", "time": 1, "text": "hi"}
        ]
    }"#;

    fn editor() -> Editor {
        Editor::from_json(DOC, EditorConfig::default()).unwrap()
    }

    #[test]
    fn tool_is_chosen_by_hit() {
        let e = editor();
        assert_eq!(
            e.choose_tool(Some(Hit::LifelineLine(PartKey::intern("ed_A")))),
            ToolKind::Messaging
        );
        assert_eq!(
            e.choose_tool(Some(Hit::ActivationHandle(PartKey::intern("ed_b")))),
            ToolKind::Resizing
        );
        assert_eq!(
            e.choose_tool(Some(Hit::Message(PartKey::intern("ed_m")))),
            ToolKind::Dragging
        );
        assert_eq!(e.choose_tool(None), ToolKind::Dragging);
    }

    #[test]
    fn preferred_tool_overrides_hit() {
        let mut e = editor();
        e.handle_key("v", Modifiers::NONE);
        assert_eq!(
            e.choose_tool(Some(Hit::LifelineLine(PartKey::intern("ed_A")))),
            ToolKind::Dragging
        );
        e.handle_key("m", Modifiers::NONE);
        assert_eq!(
            e.choose_tool(Some(Hit::Activation(PartKey::intern("ed_b")))),
            ToolKind::Messaging
        );
        assert_eq!(
            e.choose_tool(Some(Hit::LifelineHeader(PartKey::intern("ed_A")))),
            ToolKind::Dragging
        );
    }

    #[test]
    fn escape_cancels_then_clears() {
        let mut e = editor();
        // Message m sits at y = 40; drag it down.
        e.pointer_down(50.0, 40.0, Modifiers::NONE);
        assert_eq!(e.active_tool(), Some(ToolKind::Dragging));
        assert!(e.pointer_move(50.0, 80.0, Modifiers::NONE));
        assert_eq!(e.graph().message(PartKey::intern("ed_m")).unwrap().time, 3.0);

        assert_eq!(e.handle_key("Escape", Modifiers::NONE), Some(ShortcutAction::Cancel));
        assert_eq!(e.graph().message(PartKey::intern("ed_m")).unwrap().time, 1.0);
        assert_eq!(e.selection().len(), 1);
        assert!(!e.can_undo());

        e.handle_key("Escape", Modifiers::NONE);
        assert!(e.selection().is_empty());
    }

    #[test]
    fn uniform_policy_is_one_undo_step() {
        let mut e = editor();
        let line = |e: &Editor, k: &str| e.graph().lifeline(PartKey::intern(k)).unwrap().duration;

        // Stretch ed_b from its bottom handle (y = 65) to end at t = 5.
        e.pointer_down(100.0, 65.0, Modifiers::NONE);
        assert_eq!(e.active_tool(), Some(ToolKind::Resizing));
        e.pointer_move(100.0, 125.0, Modifiers::NONE);
        e.pointer_up(100.0, 125.0, Modifiers::NONE);
        assert_eq!(e.graph().activation(PartKey::intern("ed_b")).unwrap().duration, 4.0);
        assert_eq!(line(&e, "ed_B"), 5.0);
        assert_eq!(line(&e, "ed_A"), 4.0);

        e.set_height_policy(HeightPolicy::Uniform);
        assert_eq!(line(&e, "ed_A"), 5.0);
        assert_eq!(e.undo().as_deref(), Some("Extend lifelines"));
        assert_eq!(line(&e, "ed_A"), 4.0);
        assert_eq!(e.graph().activation(PartKey::intern("ed_b")).unwrap().duration, 4.0);
        assert!(e.redo().is_some());
        assert_eq!(line(&e, "ed_A"), 5.0);

        // Body drag moves ed_b to start 3, ending at 7: every lifeline follows.
        e.pointer_down(100.0, 45.0, Modifiers::NONE);
        e.pointer_move(100.0, 85.0, Modifiers::NONE);
        e.pointer_up(100.0, 85.0, Modifiers::NONE);
        assert_eq!(line(&e, "ed_A"), 7.0);
        assert_eq!(line(&e, "ed_B"), 7.0);
    }

    #[test]
    fn load_extends_short_lifelines_without_history() {
        let doc = r#"{
            "nodeDataArray": [
                {"key": "ld_A", "isGroup": true, "loc": "0 0", "duration": 1},
                {"key": "ld_a", "group": "ld_A", "start": 2, "duration": 2}
            ],
            "linkDataArray": []
        }"#;
        let e = Editor::from_json(doc, EditorConfig::default()).unwrap();
        assert_eq!(e.graph().lifeline(PartKey::intern("ld_A")).unwrap().duration, 4.0);
        assert!(!e.can_undo());
    }

    #[test]
    fn select_all_covers_parts_and_messages() {
        let mut e = editor();
        e.select_all();
        assert_eq!(e.selection().len(), 4);
    }
}
