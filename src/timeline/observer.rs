// TimelineObserver - Records timeline changes into the action log

use crate::timeline::actions::{
    ClipAddedAction, ClipRemovedAction, EffectAddedAction, EffectRemovedAction, LayerAddedAction,
    LayerRemovedAction, PropertyChangedAction,
};
use crate::timeline::control::{KeyframeAddedAction, KeyframeChangedAction, KeyframeRemovedAction};
use crate::timeline::markers::{MarkerAddedAction, MarkerMovedAction, MarkerRemovedAction};
use crate::timeline::project::MetadataChangedAction;
use crate::timeline::state::{Timeline, TimelineChange};
use crate::undo::action_log::UndoableActionLog;
use crate::undo::trait_def::UndoableAction;
use std::rc::{Rc, Weak};

/// Build the action reverting/reapplying a change
pub fn action_for_change(change: &TimelineChange) -> Box<dyn UndoableAction<Timeline>> {
    match change {
        TimelineChange::PropertyChanged {
            object,
            property,
            old,
            new,
        } => Box::new(PropertyChangedAction::new(
            *object,
            property,
            old.clone(),
            new.clone(),
        )),
        TimelineChange::LayerAdded(layer) => Box::new(LayerAddedAction::new(layer.clone())),
        TimelineChange::LayerRemoved(layer) => Box::new(LayerRemovedAction::new(layer.clone())),
        TimelineChange::ClipAdded(snapshot) => Box::new(ClipAddedAction::new(snapshot.clone())),
        TimelineChange::ClipRemoved(snapshot) => {
            Box::new(ClipRemovedAction::new(snapshot.clone()))
        }
        TimelineChange::EffectAdded { effect, index } => {
            Box::new(EffectAddedAction::new(effect.clone(), *index))
        }
        TimelineChange::EffectRemoved { effect, index } => {
            Box::new(EffectRemovedAction::new(effect.clone(), *index))
        }
        TimelineChange::KeyframeAdded {
            effect,
            property,
            keyframe,
        } => Box::new(KeyframeAddedAction::new(*effect, property, *keyframe)),
        TimelineChange::KeyframeRemoved {
            effect,
            property,
            keyframe,
        } => Box::new(KeyframeRemovedAction::new(*effect, property, *keyframe)),
        TimelineChange::KeyframeChanged {
            effect,
            property,
            old,
            new,
        } => Box::new(KeyframeChangedAction::new(*effect, property, *old, *new)),
        TimelineChange::MarkerAdded(marker) => Box::new(MarkerAddedAction::new(marker.clone())),
        TimelineChange::MarkerRemoved(marker) => {
            Box::new(MarkerRemovedAction::new(marker.clone()))
        }
        TimelineChange::MarkerMoved {
            marker,
            old_position,
            new_position,
        } => Box::new(MarkerMovedAction::new(*marker, *old_position, *new_position)),
        TimelineChange::MetadataChanged { key, old, new } => {
            Box::new(MetadataChangedAction::new(key, old.clone(), new.clone()))
        }
    }
}

/// Glue between a timeline and its action log
///
/// Every change the timeline reports becomes an action pushed into the log. The log
/// ignores them outside transactions and while it replays history itself.
pub struct TimelineObserver;

impl TimelineObserver {
    /// Start recording the changes of `timeline` into `log`
    ///
    /// Only a weak reference to the log is kept; once the log is dropped the
    /// timeline stops recording.
    pub fn attach(log: &Rc<UndoableActionLog<Timeline>>, timeline: &mut Timeline) {
        let log: Weak<UndoableActionLog<Timeline>> = Rc::downgrade(log);
        timeline.subscribe(move |change: &TimelineChange| {
            if let Some(log) = log.upgrade() {
                log.push(action_for_change(change));
            }
        });
    }
}
