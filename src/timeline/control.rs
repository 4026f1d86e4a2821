// Control source keyframe actions

use crate::timeline::state::{Keyframe, Timeline};
use crate::undo::objects::ObjectId;
use crate::undo::scenario::ScenarioAction;
use crate::undo::trait_def::{ActionResult, UndoableAction};
use std::any::Any;

#[derive(Debug, Clone)]
pub struct KeyframeAddedAction {
    effect: ObjectId,
    property: String,
    keyframe: Keyframe,
}

impl KeyframeAddedAction {
    pub fn new(effect: ObjectId, property: &str, keyframe: Keyframe) -> Self {
        Self {
            effect,
            property: property.to_string(),
            keyframe,
        }
    }
}

impl UndoableAction<Timeline> for KeyframeAddedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        timeline.set_keyframe(
            effect,
            &self.property,
            self.keyframe.timestamp,
            self.keyframe.value,
        )
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        timeline.remove_keyframe(effect, &self.property, self.keyframe.timestamp)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "Add {} keyframe at {}",
            self.property, self.keyframe.timestamp
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("add-keyframe")
                .with("element", self.effect)
                .with("property-name", &self.property)
                .with("timestamp", self.keyframe.timestamp)
                .with("value", self.keyframe.value),
        )
    }
}

#[derive(Debug, Clone)]
pub struct KeyframeRemovedAction {
    effect: ObjectId,
    property: String,
    keyframe: Keyframe,
}

impl KeyframeRemovedAction {
    pub fn new(effect: ObjectId, property: &str, keyframe: Keyframe) -> Self {
        Self {
            effect,
            property: property.to_string(),
            keyframe,
        }
    }
}

impl UndoableAction<Timeline> for KeyframeRemovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        timeline.remove_keyframe(effect, &self.property, self.keyframe.timestamp)?;
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        timeline.set_keyframe(
            effect,
            &self.property,
            self.keyframe.timestamp,
            self.keyframe.value,
        )
    }

    fn description(&self) -> String {
        format!(
            "Remove {} keyframe at {}",
            self.property, self.keyframe.timestamp
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("remove-keyframe")
                .with("element", self.effect)
                .with("property-name", &self.property)
                .with("timestamp", self.keyframe.timestamp),
        )
    }
}

/// Value change or move of a keyframe
///
/// A drag produces one change per motion event; they merge as long as each one
/// starts where the previous ended.
#[derive(Debug, Clone)]
pub struct KeyframeChangedAction {
    effect: ObjectId,
    property: String,
    old: Keyframe,
    new: Keyframe,
}

impl KeyframeChangedAction {
    pub fn new(effect: ObjectId, property: &str, old: Keyframe, new: Keyframe) -> Self {
        Self {
            effect,
            property: property.to_string(),
            old,
            new,
        }
    }

    pub fn old_keyframe(&self) -> Keyframe {
        self.old
    }

    pub fn new_keyframe(&self) -> Keyframe {
        self.new
    }
}

impl UndoableAction<Timeline> for KeyframeChangedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        if timeline
            .keyframes(effect, &self.property)
            .contains(&self.new)
        {
            return Ok(());
        }
        timeline.move_keyframe(effect, &self.property, self.old.timestamp, self.new)
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let effect = timeline.resolve(self.effect);
        timeline.move_keyframe(effect, &self.property, self.new.timestamp, self.old)
    }

    fn description(&self) -> String {
        format!(
            "Move {} keyframe {} -> {}",
            self.property, self.old.timestamp, self.new.timestamp
        )
    }

    fn expand(&mut self, other: &dyn UndoableAction<Timeline>) -> bool {
        let Some(other) = other.as_any().downcast_ref::<KeyframeChangedAction>() else {
            return false;
        };
        if other.effect != self.effect || other.property != self.property || other.old != self.new
        {
            return false;
        }
        self.new = other.new;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("move-keyframe")
                .with("element", self.effect)
                .with("property-name", &self.property)
                .with("old", self.old)
                .with("new", self.new),
        )
    }
}
