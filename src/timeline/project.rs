// Project-level actions: metadata and pipeline commits

use crate::timeline::state::{PropertyValue, Timeline};
use crate::undo::scenario::ScenarioAction;
use crate::undo::trait_def::{ActionResult, FinalizingAction, UndoableAction};
use std::any::Any;

/// Change of a project metadata entry (author, title, ...)
#[derive(Debug, Clone)]
pub struct MetadataChangedAction {
    key: String,
    old: Option<PropertyValue>,
    new: Option<PropertyValue>,
}

impl MetadataChangedAction {
    pub fn new(key: &str, old: Option<PropertyValue>, new: Option<PropertyValue>) -> Self {
        Self {
            key: key.to_string(),
            old,
            new,
        }
    }
}

impl UndoableAction<Timeline> for MetadataChangedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        timeline.set_metadata(&self.key, self.new.clone());
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        timeline.set_metadata(&self.key, self.old.clone());
        Ok(())
    }

    fn description(&self) -> String {
        format!("Change {} metadata", self.key)
    }

    fn expand(&mut self, other: &dyn UndoableAction<Timeline>) -> bool {
        match other.as_any().downcast_ref::<MetadataChangedAction>() {
            Some(other) if other.key == self.key => {
                self.new = other.new.clone();
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
            ScenarioAction::new("set-meta")
                .with("key", &self.key)
                .with("value", &self.new),
        )
    }
}

/// Finalizing action flushing the timeline to the pipeline once per replay
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitTimeline;

impl FinalizingAction<Timeline> for CommitTimeline {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        timeline.commit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_undo_restores_absence() {
        let mut timeline = Timeline::new();
        let old = timeline.set_metadata("title", Some("Draft".into()));
        let mut action = MetadataChangedAction::new("title", old, Some("Draft".into()));

        action.undo(&mut timeline).unwrap();
        assert_eq!(timeline.metadata("title"), None);

        action.execute(&mut timeline).unwrap();
        assert_eq!(
            timeline.metadata("title"),
            Some(&PropertyValue::Text("Draft".into()))
        );
    }

    #[test]
    fn test_metadata_merge_same_key_only() {
        let mut action = MetadataChangedAction::new("title", None, Some("A".into()));
        assert!(action.expand(&MetadataChangedAction::new(
            "title",
            Some("A".into()),
            Some("AB".into())
        )));
        assert!(!action.expand(&MetadataChangedAction::new("author", None, Some("me".into()))));
        assert_eq!(action.new, Some(PropertyValue::Text("AB".into())));
    }

    #[test]
    fn test_commit_timeline_counts() {
        let mut timeline = Timeline::new();
        let mut finalizer = CommitTimeline;
        finalizer.execute(&mut timeline).unwrap();
        finalizer.execute(&mut timeline).unwrap();
        assert_eq!(timeline.commit_count(), 2);
    }
}
