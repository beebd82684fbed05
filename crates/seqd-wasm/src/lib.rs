//! WASM bridge for seqd: exposes the sequence-diagram editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host page fetches the
//! document, feeds pointer/keyboard events in, and draws the scene JSON
//! that comes back.

use seqd_core::graph_view::GraphDocument;
use seqd_core::id::PartKey;
use seqd_core::reconcile::HeightPolicy;
use seqd_core::source::{GRAPH_DEFAULT_PATH, SEQUENCE_DEFAULT_PATH, data_path_from_query};
use seqd_core::timeline::TimeAxis;
use seqd_editor::config::EditorConfig;
use seqd_editor::editor::Editor;
use seqd_editor::input::Modifiers;
use seqd_editor::tools::ToolKind;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Result of a finished gesture, returned to the host as JSON.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GestureOutcome {
    /// An undo step was recorded.
    recorded: bool,
    can_undo: bool,
    can_redo: bool,
}

/// The main WASM-facing canvas controller.
///
/// Holds the editor; all interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct SeqCanvas {
    editor: Editor,
}

impl Default for SeqCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl SeqCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self {
            editor: Editor::new(EditorConfig::default(), TimeAxis::default()),
        }
    }

    /// Load a sequence document. Returns `false` on failure, leaving the
    /// current diagram untouched.
    pub fn load_json(&mut self, json: &str) -> bool {
        match self.editor.load(json) {
            Ok(()) => true,
            Err(e) => {
                console_error(&format!("seqd: failed to load document: {e}"));
                false
            }
        }
    }

    /// Document title, for the page heading.
    pub fn title(&self) -> String {
        self.editor.title().to_string()
    }

    /// Use the global-maximum lifeline height rule instead of per-lifeline.
    pub fn set_uniform_heights(&mut self, uniform: bool) {
        let policy = if uniform {
            HeightPolicy::Uniform
        } else {
            HeightPolicy::PerLifeline
        };
        self.editor.set_height_policy(policy);
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.editor.set_read_only(read_only);
    }

    /// Handle pointer down event. Returns true if the model changed.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.editor.pointer_down(x, y, mods)
    }

    /// Handle pointer move event. Returns true if the model changed.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.editor.pointer_move(x, y, mods)
    }

    /// Handle pointer up event. Returns JSON:
    /// `{"recorded":bool, "canUndo":bool, "canRedo":bool}`
    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let recorded = self.editor.pointer_up(x, y, mods);
        let outcome = GestureOutcome {
            recorded,
            can_undo: self.editor.can_undo(),
            can_redo: self.editor.can_redo(),
        };
        serde_json::to_string(&outcome).unwrap_or_default()
    }

    /// Handle a key press. Returns the action name, or an empty string
    /// when the key is unbound.
    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let mods = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.editor
            .handle_key(key, mods)
            .map(|action| format!("{action:?}"))
            .unwrap_or_default()
    }

    /// Pin the tool used for lifeline gestures: `"select"`, `"message"`,
    /// or anything else to pick by what is under the pointer.
    pub fn set_tool(&mut self, name: &str) {
        let tool = match name {
            "select" => Some(ToolKind::Dragging),
            "message" => Some(ToolKind::Messaging),
            _ => None,
        };
        self.editor.set_preferred_tool(tool);
    }

    pub fn undo(&mut self) -> bool {
        self.editor.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo().is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn cancel_gesture(&mut self) -> bool {
        self.editor.cancel_gesture()
    }

    /// Rename a message. Returns false if it does not exist.
    pub fn set_message_text(&mut self, key: &str, text: &str) -> bool {
        self.editor.set_message_text(PartKey::intern(key), text)
    }

    /// Full drawable scene as JSON.
    pub fn scene_json(&self) -> String {
        serde_json::to_string(&self.editor.scene()).unwrap_or_default()
    }

    /// Route of the message being drawn, as JSON, or `"null"`.
    pub fn preview_json(&self) -> String {
        serde_json::to_string(&self.editor.preview_route()).unwrap_or_default()
    }

    /// Current `nodeDataArray`/`linkDataArray` as JSON.
    pub fn model_json(&self) -> String {
        self.editor.model_json().unwrap_or_else(|e| {
            console_error(&format!("seqd: failed to serialise model: {e}"));
            String::new()
        })
    }

    /// Keys of the selected parts and messages, as a JSON array.
    pub fn selection_json(&self) -> String {
        use seqd_editor::tools::Selected;
        let keys: Vec<PartKey> = self
            .editor
            .selection()
            .iter()
            .map(|s| match *s {
                Selected::Part(k) | Selected::Message(k) => k,
            })
            .collect();
        serde_json::to_string(&keys).unwrap_or_default()
    }

    /// Variant button labels as a JSON array of strings.
    pub fn variant_labels_json(&self) -> String {
        serde_json::to_string(self.editor.variant_labels()).unwrap_or_default()
    }

    /// Switch the parameterised parts to `label`. Clears undo history.
    pub fn select_variant(&mut self, label: &str) -> bool {
        match self.editor.select_variant(label) {
            Ok(_) => true,
            Err(e) => {
                console_error(&format!("seqd: variant switch failed: {e}"));
                false
            }
        }
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Path of the sequence document for a page query string.
#[wasm_bindgen]
pub fn sequence_data_path(search: &str) -> String {
    data_path_from_query(search, SEQUENCE_DEFAULT_PATH)
}

/// Path of the graph-view document for a page query string.
#[wasm_bindgen]
pub fn graph_data_path(search: &str) -> String {
    data_path_from_query(search, GRAPH_DEFAULT_PATH)
}

/// Decorate a graph-view document with resolved fills and navigation
/// targets. Returns JSON `{"ok":true,"nodes":[...],"links":[...]}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn graph_view_json(source: &str) -> String {
    match GraphDocument::from_json(source) {
        Ok(doc) => {
            let nodes: Vec<serde_json::Value> = doc
                .node_data_array
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "key": n.key,
                        "text": n.text,
                        "fill": n.fill(),
                        "url": n.navigation_target(),
                    })
                })
                .collect();
            let links: Vec<serde_json::Value> = doc
                .link_data_array
                .iter()
                .map(|l| {
                    serde_json::json!({
                        "from": l.from,
                        "to": l.to,
                        "text": l.text,
                        "resolved": doc.resolve(l.from).is_some() && doc.resolve(l.to).is_some(),
                    })
                })
                .collect();
            serde_json::json!({ "ok": true, "nodes": nodes, "links": links }).to_string()
        }
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

fn console_error(msg: &str) {
    log::error!("{msg}");
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&msg.into());
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("seqd WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
