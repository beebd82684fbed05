//! Undo/Redo command stack.
//!
//! Every mutation is wrapped in a reversible `Command` that can be undone.
//! Commands are pushed to a stack; undo pops and applies the inverse.
//!
//! Gestures use **snapshot batching**: the full model is captured at the
//! start and end of the gesture, so undo/redo replaces the whole model in
//! a single step (no per-mutation inverse chain). A gesture that is
//! aborted restores its start snapshot and leaves no trace.

use crate::sync::{DiagramMutation, SyncEngine};

/// A command that captures both a forward change and its inverse.
#[derive(Debug, Clone)]
pub enum Command {
    /// Single mutation with its inverse (for non-batch operations).
    Single {
        forward: Box<DiagramMutation>,
        inverse: Box<DiagramMutation>,
        description: String,
    },
    /// Snapshot-based batch: captures the full model before and after a gesture.
    Snapshot {
        before: String,
        after: String,
        description: String,
    },
}

/// Manages undo/redo stacks with batch grouping for gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Model snapshot captured at the start of a batch.
    batch_snapshot: Option<String>,
    batch_description: String,
    /// Whether any mutations occurred during the current batch.
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
            batch_dirty: false,
        }
    }

    /// Start a batch group. All mutations until `end_batch()` are applied
    /// live but tracked as one atomic undo step.
    pub fn begin_batch(&mut self, engine: &SyncEngine, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(engine.snapshot());
            self.batch_description = description.to_string();
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes, if the model
    /// actually changed, push one snapshot command to the undo stack.
    /// Returns `true` if a command was recorded.
    pub fn end_batch(&mut self, engine: &SyncEngine) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }

        let mut recorded = false;
        if self.batch_dirty {
            let after = engine.snapshot();
            let before = self.batch_snapshot.take().unwrap_or_default();
            if before != after {
                let description = std::mem::take(&mut self.batch_description);
                self.push(Command::Snapshot {
                    before,
                    after,
                    description,
                });
                recorded = true;
            }
        }
        self.batch_snapshot = None;
        self.batch_dirty = false;
        recorded
    }

    /// Abandon the open batch, restoring the model to its start snapshot.
    pub fn abort_batch(&mut self, engine: &mut SyncEngine) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth = 0;
        if let Some(before) = self.batch_snapshot.take()
            && self.batch_dirty
            && let Err(e) = engine.restore(&before)
        {
            log::error!("failed to roll back aborted gesture: {e}");
        }
        self.batch_dirty = false;
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Execute a mutation via the sync engine and push to undo stack.
    pub fn execute(&mut self, engine: &mut SyncEngine, mutation: DiagramMutation, description: &str) {
        if self.batch_depth > 0 {
            // Inside a batch: apply the mutation live but don't track it.
            // The snapshot at end_batch() will capture the cumulative effect.
            engine.apply_mutation(mutation);
            self.batch_dirty = true;
            return;
        }

        let Some(inverse) = engine.inverse_of(&mutation) else {
            engine.apply_mutation(mutation);
            return;
        };
        engine.apply_mutation(mutation.clone());

        self.push(Command::Single {
            forward: Box::new(mutation),
            inverse: Box::new(inverse),
            description: description.to_string(),
        });
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the last command (or batch snapshot).
    pub fn undo(&mut self, engine: &mut SyncEngine) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        let desc = match &cmd {
            Command::Single {
                inverse,
                description,
                ..
            } => {
                engine.apply_mutation(*inverse.clone());
                description.clone()
            }
            Command::Snapshot {
                before,
                description,
                ..
            } => {
                if let Err(e) = engine.restore(before) {
                    log::error!("undo of {description:?} failed: {e}");
                }
                description.clone()
            }
        };
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command (or batch snapshot).
    pub fn redo(&mut self, engine: &mut SyncEngine) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        let desc = match &cmd {
            Command::Single {
                forward,
                description,
                ..
            } => {
                engine.apply_mutation(*forward.clone());
                description.clone()
            }
            Command::Snapshot {
                after, description, ..
            } => {
                if let Err(e) = engine.restore(after) {
                    log::error!("redo of {description:?} failed: {e}");
                }
                description.clone()
            }
        };
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget all history (the model was replaced wholesale).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }
}
