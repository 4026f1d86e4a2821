// Concrete timeline actions: properties, layers, clips and effects

use crate::timeline::state::{ClipSnapshot, Effect, Layer, PropertyValue, Timeline};
use crate::undo::objects::ObjectId;
use crate::undo::scenario::ScenarioAction;
use crate::undo::trait_def::{ActionResult, UndoableAction};
use std::any::Any;

/// Change of one property of a layer, clip or effect
///
/// Consecutive changes of the same property of the same object merge, so dragging
/// a slider produces a single undo step going from the first old value to the
/// last new value.
#[derive(Debug, Clone)]
pub struct PropertyChangedAction {
    object: ObjectId,
    property: String,
    old: Option<PropertyValue>,
    new: Option<PropertyValue>,
}

impl PropertyChangedAction {
    pub fn new(
        object: ObjectId,
        property: &str,
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    ) -> Self {
        Self {
            object,
            property: property.to_string(),
            old,
            new,
        }
    }

    pub fn old_value(&self) -> Option<&PropertyValue> {
        self.old.as_ref()
    }

    pub fn new_value(&self) -> Option<&PropertyValue> {
        self.new.as_ref()
    }
}

impl UndoableAction<Timeline> for PropertyChangedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let object = timeline.resolve(self.object);
        timeline.apply_property(object, &self.property, self.new.clone())?;
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let object = timeline.resolve(self.object);
        timeline.apply_property(object, &self.property, self.old.clone())?;
        Ok(())
    }

    fn description(&self) -> String {
        match &self.new {
            Some(value) => format!("Set {} of {} to {}", self.property, self.object, value),
            None => format!("Clear {} of {}", self.property, self.object),
        }
    }

    fn expand(&mut self, other: &dyn UndoableAction<Timeline>) -> bool {
        let Some(other) = other.as_any().downcast_ref::<PropertyChangedAction>() else {
            return false;
        };
        if other.object != self.object || other.property != self.property {
            return false;
        }
        self.new = other.new.clone();
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("set-property")
                .with("object", self.object)
                .with("property", &self.property)
                .with("value", &self.new),
        )
    }
}

// ── Layers ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LayerAddedAction {
    layer: Layer,
}

impl LayerAddedAction {
    pub fn new(layer: Layer) -> Self {
        Self { layer }
    }
}

impl UndoableAction<Timeline> for LayerAddedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.layer(self.layer.id).is_some() {
            return Ok(());
        }
        timeline.insert_layer(self.layer.clone())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.layer.id);
        self.layer = timeline.remove_layer(id)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add layer {}", self.layer.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("add-layer")
                .with("layer", self.layer.id)
                .with("priority", self.layer.priority),
        )
    }
}

#[derive(Debug, Clone)]
pub struct LayerRemovedAction {
    layer: Layer,
}

impl LayerRemovedAction {
    pub fn new(layer: Layer) -> Self {
        Self { layer }
    }
}

impl UndoableAction<Timeline> for LayerRemovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        let id = timeline.resolve(self.layer.id);
        self.layer = timeline.remove_layer(id)?;
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.layer(self.layer.id).is_some() {
            return Ok(());
        }
        timeline.insert_layer(self.layer.clone())
    }

    fn description(&self) -> String {
        format!("Remove layer {}", self.layer.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(ScenarioAction::new("remove-layer").with("layer", self.layer.id))
    }
}

// ── Clips ──────────────────────────────────────────────────────────────────

fn reinsert_clip(timeline: &mut Timeline, snapshot: &mut ClipSnapshot) -> ActionResult<()> {
    if timeline.clip(snapshot.clip.id).is_some() {
        return Ok(());
    }
    snapshot.clip.layer = timeline.resolve(snapshot.clip.layer);
    timeline.insert_clip(snapshot.clone())
}

fn take_clip(timeline: &mut Timeline, snapshot: &mut ClipSnapshot) -> ActionResult<()> {
    let id = timeline.resolve(snapshot.clip.id);
    // Keep what the clip looks like now, effects added since included
    *snapshot = timeline.remove_clip(id)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ClipAddedAction {
    snapshot: ClipSnapshot,
}

impl ClipAddedAction {
    pub fn new(snapshot: ClipSnapshot) -> Self {
        Self { snapshot }
    }
}

impl UndoableAction<Timeline> for ClipAddedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        reinsert_clip(timeline, &mut self.snapshot)
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        take_clip(timeline, &mut self.snapshot)
    }

    fn description(&self) -> String {
        format!("Add clip {}", self.snapshot.clip.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("add-clip")
                .with("clip", self.snapshot.clip.id)
                .with("layer", self.snapshot.clip.layer)
                .with("properties", &self.snapshot.clip.properties),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClipRemovedAction {
    snapshot: ClipSnapshot,
}

impl ClipRemovedAction {
    pub fn new(snapshot: ClipSnapshot) -> Self {
        Self { snapshot }
    }
}

impl UndoableAction<Timeline> for ClipRemovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        take_clip(timeline, &mut self.snapshot)
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        reinsert_clip(timeline, &mut self.snapshot)
    }

    fn description(&self) -> String {
        format!("Remove clip {}", self.snapshot.clip.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(ScenarioAction::new("remove-clip").with("clip", self.snapshot.clip.id))
    }
}

// ── Effects ────────────────────────────────────────────────────────────────
//
// Removing an effect destroys it; putting it back instantiates a new element
// from the saved configuration. The new id supersedes the old one in the
// registry so actions recorded against the old effect keep working.

fn recreate_effect(timeline: &mut Timeline, effect: &mut Effect, index: usize) -> ActionResult<()> {
    let new_id = ObjectId::new();
    let mut recreated = effect.clone();
    recreated.id = new_id;
    recreated.clip = timeline.resolve(effect.clip);
    timeline.insert_effect(recreated, Some(index))?;

    timeline.objects_mut().supersede(effect.id, new_id);
    effect.id = new_id;
    Ok(())
}

fn destroy_effect(timeline: &mut Timeline, effect: &mut Effect) -> ActionResult<usize> {
    let id = timeline.resolve(effect.id);
    let (removed, index) = timeline.remove_effect(id)?;
    // Properties and keyframes changed since the effect was added are kept
    *effect = removed;
    Ok(index)
}

#[derive(Debug, Clone)]
pub struct EffectAddedAction {
    effect: Effect,
    index: usize,
}

impl EffectAddedAction {
    pub fn new(effect: Effect, index: usize) -> Self {
        Self { effect, index }
    }

    /// Id of the most recent incarnation of the effect
    pub fn effect_id(&self) -> ObjectId {
        self.effect.id
    }
}

impl UndoableAction<Timeline> for EffectAddedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.effect(timeline.resolve(self.effect.id)).is_some() {
            return Ok(());
        }
        recreate_effect(timeline, &mut self.effect, self.index)
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        self.index = destroy_effect(timeline, &mut self.effect)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add effect {}", self.effect.bin_description)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("add-effect")
                .with("clip", self.effect.clip)
                .with("bin-description", &self.effect.bin_description)
                .with("index", self.index),
        )
    }
}

#[derive(Debug, Clone)]
pub struct EffectRemovedAction {
    effect: Effect,
    index: usize,
}

impl EffectRemovedAction {
    pub fn new(effect: Effect, index: usize) -> Self {
        Self { effect, index }
    }

    pub fn effect_id(&self) -> ObjectId {
        self.effect.id
    }
}

impl UndoableAction<Timeline> for EffectRemovedAction {
    fn execute(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        self.index = destroy_effect(timeline, &mut self.effect)?;
        Ok(())
    }

    fn undo(&mut self, timeline: &mut Timeline) -> ActionResult<()> {
        if timeline.effect(timeline.resolve(self.effect.id)).is_some() {
            return Ok(());
        }
        recreate_effect(timeline, &mut self.effect, self.index)
    }

    fn description(&self) -> String {
        format!("Remove effect {}", self.effect.bin_description)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        Some(
            ScenarioAction::new("remove-effect")
                .with("clip", self.effect.clip)
                .with("bin-description", &self.effect.bin_description),
        )
    }
}
