// Undoable action log
//
// Generic undo/redo engine for documents edited through reversible actions.
//
// Architecture:
// - UndoableAction trait: execute(), undo(), expand() for coalescing
// - UndoableActionStack: actions recorded during one transaction, itself an action
// - UndoableActionLog: open transactions plus undo/redo history and checkpoints
// - ObjectRegistry: remaps ids of objects destroyed and recreated between replays
//
// The log is single-threaded and synchronous: mutations of the document produce
// actions which are pushed while the edit runs, and undo/redo replay them in place.

pub mod action_log;
pub mod config;
pub mod objects;
pub mod observer;
pub mod scenario;
pub mod stack;
pub mod trait_def;
pub mod transaction;

pub use action_log::{BeginOptions, LogState, UndoError, UndoResult, UndoableActionLog};
pub use config::{ConfigError, UndoLogConfig};
pub use objects::{ObjectId, ObjectRegistry};
pub use observer::{EventConsumer, EventSender, LogEvent, LogObserver, MoveDirection, event_channel};
pub use scenario::{ScenarioAction, ScenarioRecorder};
pub use stack::{StackId, UndoableActionStack};
pub use trait_def::{ActionError, ActionResult, FinalizingAction, UndoableAction};
pub use transaction::Transaction;
