//! Integration tests: pointer gestures through the `Editor` controller.
//!
//! Each gesture runs down → move → up on the login fixture and checks the
//! model, the reconciled lifelines, and the undo history.

use pretty_assertions::assert_eq;
use seqd_core::id::PartKey;
use seqd_core::model::{Message, Point};
use seqd_core::route::ArrowDirection;
use seqd_editor::config::EditorConfig;
use seqd_editor::editor::Editor;
use seqd_editor::input::Modifiers;
use seqd_editor::tools::{Selected, ToolKind};

const NONE: Modifiers = Modifiers::NONE;

fn make_editor() -> Editor {
    let input = include_str!("fixtures/login.json");
    Editor::from_json(input, EditorConfig::default()).unwrap()
}

fn key(s: &str) -> PartKey {
    PartKey::intern(s)
}

fn messages_between<'a>(editor: &'a Editor, from: &str, to: &str) -> Vec<&'a Message> {
    editor
        .graph()
        .messages()
        .filter(|m| m.from == key(from) && m.to == key(to))
        .collect()
}

// ─── Message creation ───────────────────────────────────────────────────

#[test]
fn new_message_adds_activation_and_extends_lifeline() {
    let mut editor = make_editor();

    // y = 105 → t = 4.25 → rounded up to 5.
    editor.pointer_down(0.0, 105.0, NONE);
    assert_eq!(editor.active_tool(), Some(ToolKind::Messaging));
    editor.pointer_move(200.0, 110.0, NONE);
    assert!(editor.pointer_up(300.0, 105.0, NONE));

    let created = messages_between(&editor, "User", "Table");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].time, 5.0);
    assert_eq!(created[0].text, "msg");

    let acts: Vec<_> = editor.graph().activations_of(key("Table")).collect();
    assert_eq!(acts.len(), 1);
    assert_eq!((acts[0].start, acts[0].duration), (5.0, 1.0));
    assert!(editor.graph().lifeline(key("Table")).unwrap().duration >= 6.0);
    // Only the receiving lifeline grows.
    assert_eq!(editor.graph().lifeline(key("User")).unwrap().duration, 3.0);

    // The new message meets the new activation's edge.
    let scene = editor.scene();
    let shape = scene.message(created[0].key).unwrap();
    assert_eq!(shape.route.points[1], Point::new(295.0, 120.0));
    assert_eq!(shape.route.direction, ArrowDirection::Right);
}

#[test]
fn new_message_is_one_undo_step() {
    let mut editor = make_editor();
    editor.pointer_down(0.0, 105.0, NONE);
    editor.pointer_up(300.0, 105.0, NONE);

    assert_eq!(editor.undo().as_deref(), Some("Add message"));
    assert!(messages_between(&editor, "User", "Table").is_empty());
    assert_eq!(editor.graph().activations().count(), 1);
    assert_eq!(editor.graph().lifeline(key("Table")).unwrap().duration, 3.0);
    assert!(!editor.can_undo());

    editor.redo();
    assert_eq!(messages_between(&editor, "User", "Table").len(), 1);
    assert_eq!(editor.graph().lifeline(key("Table")).unwrap().duration, 6.0);
}

#[test]
fn dropping_on_background_records_nothing() {
    let mut editor = make_editor();
    let before = editor.model_json().unwrap();

    editor.pointer_down(0.0, 105.0, NONE);
    assert!(!editor.pointer_up(500.0, 500.0, NONE));

    assert_eq!(editor.model_json().unwrap(), before);
    assert!(!editor.can_undo());
    assert_eq!(editor.active_tool(), None);
}

#[test]
fn self_message_is_rejected_by_default() {
    let mut editor = make_editor();
    editor.pointer_down(0.0, 105.0, NONE);
    assert!(!editor.pointer_up(0.0, 90.0, NONE));
    assert!(messages_between(&editor, "User", "User").is_empty());
    assert!(!editor.can_undo());
}

#[test]
fn self_message_when_allowed_is_a_loop() {
    let input = include_str!("fixtures/login.json");
    let config = EditorConfig {
        allow_self_messages: true,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_json(input, config).unwrap();
    editor.pointer_down(0.0, 105.0, NONE);
    assert!(editor.pointer_up(0.0, 90.0, NONE));

    let created = messages_between(&editor, "User", "User");
    assert_eq!(created.len(), 1);
    let route = editor.engine().route(created[0].key).unwrap();
    assert_eq!(route.points.len(), 4);
    assert_eq!(route.direction, ArrowDirection::Left);
}

#[test]
fn preview_follows_pointer_at_fixed_time() {
    let mut editor = make_editor();
    assert!(editor.preview_route().is_none());

    editor.pointer_down(0.0, 105.0, NONE);
    editor.pointer_move(200.0, 130.0, NONE);
    let preview = editor.preview_route().unwrap();
    assert_eq!(
        preview.points.to_vec(),
        vec![Point::new(0.0, 120.0), Point::new(200.0, 120.0)]
    );

    editor.cancel_gesture();
    assert!(editor.preview_route().is_none());
}

// ─── Dragging ───────────────────────────────────────────────────────────

#[test]
fn dragging_selected_messages_only() {
    let mut editor = make_editor();

    editor.pointer_down(60.0, 40.0, NONE);
    assert!(!editor.pointer_up(60.0, 40.0, NONE));
    assert_eq!(editor.selection(), &[Selected::Message(key("login"))]);

    editor.pointer_down(200.0, 60.0, Modifiers::SHIFT);
    assert_eq!(
        editor.selection(),
        &[Selected::Message(key("login")), Selected::Message(key("lookup"))]
    );
    editor.pointer_move(200.0, 71.0, NONE);
    editor.pointer_move(200.0, 80.0, NONE);
    assert!(editor.pointer_up(200.0, 80.0, NONE));

    let graph = editor.graph();
    assert_eq!(graph.message(key("login")).unwrap().time, 2.0);
    assert_eq!(graph.message(key("lookup")).unwrap().time, 3.0);
    assert_eq!(graph.lifeline(key("Server")).unwrap().loc, Point::new(150.0, 0.0));
    assert_eq!(graph.activation(key("srv1")).unwrap().start, 1.0);

    assert_eq!(editor.undo().as_deref(), Some("Move"));
    assert_eq!(editor.graph().message(key("login")).unwrap().time, 1.0);
    assert_eq!(editor.graph().message(key("lookup")).unwrap().time, 2.0);
    assert!(!editor.can_undo());
}

#[test]
fn dragging_activation_reroutes_and_extends() {
    let mut editor = make_editor();

    editor.pointer_down(150.0, 45.0, NONE);
    assert_eq!(editor.selection(), &[Selected::Part(key("srv1"))]);
    editor.pointer_move(150.0, 85.0, NONE);
    editor.pointer_up(150.0, 85.0, NONE);

    let graph = editor.graph();
    assert_eq!(graph.activation(key("srv1")).unwrap().start, 3.0);
    assert_eq!(graph.lifeline(key("Server")).unwrap().duration, 4.0);
    // login at t = 1 is no longer covered: it now reaches the dashed line.
    let login = editor.engine().route(key("login")).unwrap();
    assert_eq!(login.points[1], Point::new(150.0, 40.0));
}

#[test]
fn dragging_lifeline_header_is_horizontal() {
    let mut editor = make_editor();

    editor.pointer_down(300.0, -10.0, NONE);
    editor.pointer_move(337.4, 40.0, NONE);
    editor.pointer_up(337.4, 40.0, NONE);

    let table = editor.graph().lifeline(key("Table")).unwrap();
    assert_eq!(table.loc, Point::new(337.0, 0.0));
    let lookup = editor.engine().route(key("lookup")).unwrap();
    assert_eq!(lookup.points[1], Point::new(337.0, 60.0));
}

#[test]
fn cancelled_drag_restores_model() {
    let mut editor = make_editor();
    let before = editor.model_json().unwrap();

    editor.pointer_down(60.0, 40.0, NONE);
    editor.pointer_move(60.0, 140.0, NONE);
    assert_eq!(editor.graph().message(key("login")).unwrap().time, 6.0);
    assert!(editor.cancel_gesture());

    assert_eq!(editor.model_json().unwrap(), before);
    assert!(!editor.can_undo());
    // Releasing after a cancel is a no-op.
    assert!(!editor.pointer_up(60.0, 140.0, NONE));
}

// ─── Resizing ───────────────────────────────────────────────────────────

#[test]
fn resizing_activation_from_handle() {
    let mut editor = make_editor();

    // srv1 bar ends at y = 65.
    editor.pointer_down(150.0, 65.0, NONE);
    assert_eq!(editor.active_tool(), Some(ToolKind::Resizing));
    editor.pointer_move(150.0, 105.0, NONE);
    assert!(editor.pointer_up(150.0, 105.0, NONE));

    assert_eq!(editor.graph().activation(key("srv1")).unwrap().duration, 3.0);
    assert_eq!(editor.graph().lifeline(key("Server")).unwrap().duration, 4.0);

    assert_eq!(editor.undo().as_deref(), Some("Resize activation"));
    assert_eq!(editor.graph().activation(key("srv1")).unwrap().duration, 1.0);
    assert_eq!(editor.graph().lifeline(key("Server")).unwrap().duration, 3.0);
}

// ─── Modes and document-level edits ─────────────────────────────────────

#[test]
fn read_only_blocks_every_edit() {
    let mut editor = make_editor();
    editor.set_read_only(true);
    let before = editor.model_json().unwrap();

    editor.pointer_down(0.0, 105.0, NONE);
    editor.pointer_up(300.0, 105.0, NONE);
    editor.pointer_down(60.0, 40.0, NONE);
    editor.pointer_move(60.0, 100.0, NONE);
    editor.pointer_up(60.0, 100.0, NONE);
    editor.pointer_down(150.0, 65.0, NONE);
    editor.pointer_move(150.0, 105.0, NONE);
    editor.pointer_up(150.0, 105.0, NONE);
    assert!(!editor.set_message_text(key("login"), "logout"));

    assert_eq!(editor.model_json().unwrap(), before);
    assert!(!editor.can_undo());
}

#[test]
fn message_text_edit_is_undoable() {
    let mut editor = make_editor();
    assert!(editor.set_message_text(key("login"), "sign in"));
    assert_eq!(editor.graph().message(key("login")).unwrap().text, "sign in");

    let cmd_z = Modifiers {
        ctrl: true,
        ..NONE
    };
    editor.handle_key("z", cmd_z);
    assert_eq!(editor.graph().message(key("login")).unwrap().text, "login");
    assert!(editor.can_redo());
}

#[test]
fn variant_switch_relabels_and_clears_history() {
    let mut editor = make_editor();
    assert_eq!(
        editor.variant_labels(),
        &["OnTheFlyPrimeTable".to_string(), "PreCalculatedPrimeTable".to_string()]
    );

    editor.set_message_text(key("login"), "sign in");
    assert!(editor.can_undo());

    assert_eq!(editor.select_variant("PreCalculatedPrimeTable").unwrap(), 1);
    let table = editor.graph().lifeline(key("Table")).unwrap();
    assert_eq!(table.label(), "PreCalculatedPrimeTable");
    // Edits made before the switch survive it.
    assert_eq!(editor.graph().message(key("login")).unwrap().text, "sign in");
    assert!(!editor.can_undo());
    assert_eq!(editor.title(), "login");
}

#[test]
fn failed_load_keeps_current_diagram() {
    let mut editor = make_editor();
    let before = editor.model_json().unwrap();
    assert!(editor.load("{ not json").is_err());
    assert!(
        editor
            .load(r#"{"linkDataArray":[{"from":"x","to":"y"}]}"#)
            .is_err()
    );
    assert_eq!(editor.model_json().unwrap(), before);
}
