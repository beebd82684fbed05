pub mod commands;
pub mod config;
pub mod editor;
pub mod hit;
pub mod input;
pub mod shortcuts;
pub mod sync;
pub mod tools;

pub use config::{EditorConfig, GridCell};
pub use editor::Editor;
pub use input::{InputEvent, Modifiers};
pub use sync::{DiagramMutation, SyncEngine};
