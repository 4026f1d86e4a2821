// Timeline Undo - Library exports for tests, benchmarks and the demo

pub mod timeline;
pub mod undo;

// Re-export commonly used types for convenience
pub use timeline::{CommitTimeline, Timeline, TimelineChange, TimelineObserver};
pub use undo::{
    ActionError, ActionResult, BeginOptions, FinalizingAction, LogEvent, ObjectId,
    UndoError, UndoLogConfig, UndoResult, UndoableAction, UndoableActionLog,
    UndoableActionStack,
};
