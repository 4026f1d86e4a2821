// Marker actions

use crate::timeline::state::{Marker, Timeline};
use crate::undo::objects::ObjectId;
use crate::undo::scenario::ScenarioAction;
use crate::undo::trait_def::{ActionResult, UndoableAction};
use std::any::Any;

#[derive(Debug, Clone)]
pub struct MarkerAddedAction {
    marker: Marker,
}

impl MarkerAddedAction {
    pub fn new(marker: Marker) -> Self {
        Self { marker }
    }
}

impl UndoableAction<Timeline> for MarkerAddedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.marker(self.marker.id).is_some() {
            return Ok(());
        }
        timeline.insert_marker(self.marker.clone())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.marker.id);
        self.marker = timeline.remove_marker(id)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add marker at {}", self.marker.position)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("add-marker")
                .with("position", self.marker.position)
                .with("comment", &self.marker.comment),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MarkerRemovedAction {
    marker: Marker,
}

impl MarkerRemovedAction {
    pub fn new(marker: Marker) -> Self {
        Self { marker }
    }
}

impl UndoableAction<Timeline> for MarkerRemovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.marker.id);
        self.marker = timeline.remove_marker(id)?;
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.marker(self.marker.id).is_some() {
            return Ok(());
        }
        timeline.insert_marker(self.marker.clone())
    }

    fn description(&self) -> String {
        format!("Remove marker at {}", self.marker.position)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(ScenarioAction::new("remove-marker").with("position", self.marker.position))
    }
}

/// Merges with later moves of the same marker
#[derive(Debug, Clone)]
pub struct MarkerMovedAction {
    marker: ObjectId,
    old_position: u64,
    new_position: u64,
}

impl MarkerMovedAction {
    pub fn new(marker: ObjectId, old_position: u64, new_position: u64) -> Self {
        Self {
            marker,
            old_position,
            new_position,
        }
    }
}

impl UndoableAction<Timeline> for MarkerMovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.marker);
        timeline.move_marker(id, self.new_position)
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.marker);
        timeline.move_marker(id, self.old_position)
    }

    fn description(&self) -> String {
        format!(
            "Move marker {} -> {}",
            self.old_position, self.new_position
        )
    }

    fn expand(&mut self, other: &dyn UndoableAction<Timeline>) -> bool {
        match other.as_any().downcast_ref::<MarkerMovedAction>() {
            Some(other) if other.marker == self.marker => {
                self.new_position = other.new_position;
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("move-marker")
                .with("old-position", self.old_position)
                .with("new-position", self.new_position),
        )
    }
}
