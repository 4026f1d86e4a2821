// Timeline editing domain
//
// A video editing timeline (layers, clips, effects, keyframes, markers, project
// metadata) whose every mutation is undoable through the action log.

pub mod actions;
pub mod control;
pub mod markers;
pub mod observer;
pub mod project;
pub mod state;

pub use observer::{TimelineObserver, action_for_change};
pub use project::CommitTimeline;
pub use state::{
    Clip, ClipSnapshot, ControlSource, Effect, Keyframe, Layer, Marker, PropertyValue, Properties,
    Timeline, TimelineChange,
};
