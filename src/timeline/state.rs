// Timeline - Document state edited through undoable actions
//
// Layers hold clips, clips hold effects, effects hold keyframed control sources.
// Markers and project metadata live beside them. Every successful mutation is
// reported to the listeners as a TimelineChange, which is how undo actions get
// recorded (see timeline::observer).

use crate::undo::objects::{ObjectId, ObjectRegistry};
use crate::undo::trait_def::{ActionError, ActionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value of an object property or metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{:.3}", v),
            PropertyValue::Text(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: ObjectId,
    pub priority: u32,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: ObjectId,
    pub layer: ObjectId,
    pub properties: Properties,
    /// Effects applied to the clip, in processing order
    pub effects: Vec<ObjectId>,
}

/// A timed value of a control source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Position in nanoseconds
    pub timestamp: u64,
    pub value: f64,
}

impl Keyframe {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Keyframes animating one property of an effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlSource {
    keyframes: BTreeMap<u64, f64>,
}

impl ControlSource {
    pub fn value_at(&self, timestamp: u64) -> Option<f64> {
        self.keyframes.get(&timestamp).copied()
    }

    /// Keyframes sorted by timestamp
    pub fn keyframes(&self) -> Vec<Keyframe> {
        self.keyframes
            .iter()
            .map(|(&timestamp, &value)| Keyframe::new(timestamp, value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub id: ObjectId,
    pub clip: ObjectId,
    /// Description of the element to instantiate, e.g. "agingtv"
    pub bin_description: String,
    pub properties: Properties,
    pub control_sources: BTreeMap<String, ControlSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: ObjectId,
    pub position: u64,
    pub comment: String,
}

/// Everything needed to put a removed clip back
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSnapshot {
    pub clip: Clip,
    /// Effects in the clip's order
    pub effects: Vec<Effect>,
}

/// Mutation reported to timeline listeners
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineChange {
    PropertyChanged {
        object: ObjectId,
        property: String,
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    },
    LayerAdded(Layer),
    LayerRemoved(Layer),
    ClipAdded(ClipSnapshot),
    ClipRemoved(ClipSnapshot),
    EffectAdded {
        effect: Effect,
        index: usize,
    },
    EffectRemoved {
        effect: Effect,
        index: usize,
    },
    KeyframeAdded {
        effect: ObjectId,
        property: String,
        keyframe: Keyframe,
    },
    KeyframeRemoved {
        effect: ObjectId,
        property: String,
        keyframe: Keyframe,
    },
    KeyframeChanged {
        effect: ObjectId,
        property: String,
        old: Keyframe,
        new: Keyframe,
    },
    MarkerAdded(Marker),
    MarkerRemoved(Marker),
    MarkerMoved {
        marker: ObjectId,
        old_position: u64,
        new_position: u64,
    },
    MetadataChanged {
        key: String,
        old: Option<PropertyValue>,
        new: Option<PropertyValue>,
    },
}

pub type TimelineListener = Box<dyn FnMut(&TimelineChange)>;

/// The edited document
///
/// Lookups take exact ids; callers holding ids that may have been superseded
/// resolve them first with `resolve`.
pub struct Timeline {
    objects: ObjectRegistry,
    layers: BTreeMap<ObjectId, Layer>,
    clips: BTreeMap<ObjectId, Clip>,
    effects: BTreeMap<ObjectId, Effect>,
    markers: BTreeMap<ObjectId, Marker>,
    metadata: BTreeMap<String, PropertyValue>,
    /// Number of times the timeline was committed to the pipeline
    commit_count: u64,
    listeners: Vec<TimelineListener>,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            objects: ObjectRegistry::new(),
            layers: BTreeMap::new(),
            clips: BTreeMap::new(),
            effects: BTreeMap::new(),
            markers: BTreeMap::new(),
            metadata: BTreeMap::new(),
            commit_count: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener called synchronously after every mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&TimelineChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, change: TimelineChange) {
        for listener in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    /// Live id of a possibly superseded object
    pub fn resolve(&self, id: ObjectId) -> ObjectId {
        self.objects.resolve(id)
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn layer(&self, id: ObjectId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn clip(&self, id: ObjectId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    pub fn effect(&self, id: ObjectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    pub fn marker(&self, id: ObjectId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    /// Layers sorted by priority
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.layers.values().collect();
        layers.sort_by_key(|layer| layer.priority);
        layers
    }

    pub fn clips_in_layer(&self, layer: ObjectId) -> Vec<&Clip> {
        self.clips
            .values()
            .filter(|clip| clip.layer == layer)
            .collect()
    }

    /// Markers sorted by position
    pub fn markers(&self) -> Vec<&Marker> {
        let mut markers: Vec<&Marker> = self.markers.values().collect();
        markers.sort_by_key(|marker| marker.position);
        markers
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn property(&self, id: ObjectId, name: &str) -> Option<&PropertyValue> {
        if let Some(layer) = self.layers.get(&id) {
            return layer.properties.get(name);
        }
        if let Some(clip) = self.clips.get(&id) {
            return clip.properties.get(name);
        }
        self.effects
            .get(&id)
            .and_then(|effect| effect.properties.get(name))
    }

    pub fn keyframes(&self, effect: ObjectId, property: &str) -> Vec<Keyframe> {
        self.effects
            .get(&effect)
            .and_then(|effect| effect.control_sources.get(property))
            .map(|source| source.keyframes())
            .unwrap_or_default()
    }

    pub fn metadata(&self, key: &str) -> Option<&PropertyValue> {
        self.metadata.get(key)
    }

    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    /// Flush pending changes to the playback pipeline
    pub fn commit(&mut self) {
        self.commit_count += 1;
        log::debug!("Timeline committed ({})", self.commit_count);
    }

    // ── Properties ─────────────────────────────────────────────────────────

    /// Set a property of a layer, clip or effect, returning the previous value
    pub fn set_property(
        &mut self,
        id: ObjectId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> ActionResult<Option<PropertyValue>> {
        self.apply_property(id, name, Some(value.into()))
    }

    /// Set (`Some`) or clear (`None`) a property
    ///
    /// Listeners are only notified when the value actually changes.
    pub fn apply_property(
        &mut self,
        id: ObjectId,
        name: &str,
        value: Option<PropertyValue>,
    ) -> ActionResult<Option<PropertyValue>> {
        let properties = if let Some(layer) = self.layers.get_mut(&id) {
            &mut layer.properties
        } else if let Some(clip) = self.clips.get_mut(&id) {
            &mut clip.properties
        } else if let Some(effect) = self.effects.get_mut(&id) {
            &mut effect.properties
        } else {
            return Err(ActionError::ObjectNotFound(id));
        };

        let old = match &value {
            Some(value) => properties.insert(name.to_string(), value.clone()),
            None => properties.remove(name),
        };
        if old != value {
            self.emit(TimelineChange::PropertyChanged {
                object: id,
                property: name.to_string(),
                old: old.clone(),
                new: value,
            });
        }
        Ok(old)
    }

    // ── Layers ─────────────────────────────────────────────────────────────

    pub fn add_layer(&mut self, priority: u32) -> ObjectId {
        let layer = Layer {
            id: ObjectId::new(),
            priority,
            properties: Properties::new(),
        };
        let id = layer.id;
        self.layers.insert(id, layer.clone());
        self.emit(TimelineChange::LayerAdded(layer));
        id
    }

    /// Put back a previously removed layer
    pub fn insert_layer(&mut self, layer: Layer) -> ActionResult<()> {
        if self.layers.contains_key(&layer.id) {
            return Err(ActionError::InvalidOperation(format!(
                "layer {} already exists",
                layer.id
            )));
        }
        self.layers.insert(layer.id, layer.clone());
        self.emit(TimelineChange::LayerAdded(layer));
        Ok(())
    }

    /// Remove an empty layer
    pub fn remove_layer(&mut self, id: ObjectId) -> ActionResult<Layer> {
        if !self.layers.contains_key(&id) {
            return Err(ActionError::ObjectNotFound(id));
        }
        if self.clips.values().any(|clip| clip.layer == id) {
            return Err(ActionError::InvalidOperation(format!(
                "layer {} still contains clips",
                id
            )));
        }
        let layer = self
            .layers
            .remove(&id)
            .ok_or(ActionError::ObjectNotFound(id))?;
        self.emit(TimelineChange::LayerRemoved(layer.clone()));
        Ok(layer)
    }

    // ── Clips ──────────────────────────────────────────────────────────────

    pub fn add_clip(&mut self, layer: ObjectId, properties: Properties) -> ActionResult<ObjectId> {
        let clip = Clip {
            id: ObjectId::new(),
            layer,
            properties,
            effects: Vec::new(),
        };
        let id = clip.id;
        self.insert_clip(ClipSnapshot {
            clip,
            effects: Vec::new(),
        })?;
        Ok(id)
    }

    /// Put back a clip together with its effects
    pub fn insert_clip(&mut self, snapshot: ClipSnapshot) -> ActionResult<()> {
        let clip_id = snapshot.clip.id;
        if !self.layers.contains_key(&snapshot.clip.layer) {
            return Err(ActionError::ObjectNotFound(snapshot.clip.layer));
        }
        if self.clips.contains_key(&clip_id) {
            return Err(ActionError::InvalidOperation(format!(
                "clip {} already exists",
                clip_id
            )));
        }

        let mut clip = snapshot.clip.clone();
        clip.effects = snapshot.effects.iter().map(|effect| effect.id).collect();
        for effect in &snapshot.effects {
            let mut effect = effect.clone();
            effect.clip = clip_id;
            self.effects.insert(effect.id, effect);
        }
        self.clips.insert(clip_id, clip);

        self.emit(TimelineChange::ClipAdded(snapshot));
        Ok(())
    }

    /// Remove a clip and its effects
    pub fn remove_clip(&mut self, id: ObjectId) -> ActionResult<ClipSnapshot> {
        let clip = self.clips.remove(&id).ok_or(ActionError::ObjectNotFound(id))?;
        let effects = clip
            .effects
            .iter()
            .filter_map(|effect_id| self.effects.remove(effect_id))
            .collect();

        let snapshot = ClipSnapshot { clip, effects };
        self.emit(TimelineChange::ClipRemoved(snapshot.clone()));
        Ok(snapshot)
    }

    // ── Effects ────────────────────────────────────────────────────────────

    /// Instantiate a new effect at the end of the clip's effect list
    pub fn add_effect(&mut self, clip: ObjectId, bin_description: &str) -> ActionResult<ObjectId> {
        let effect = Effect {
            id: ObjectId::new(),
            clip,
            bin_description: bin_description.to_string(),
            properties: Properties::new(),
            control_sources: BTreeMap::new(),
        };
        let id = effect.id;
        self.insert_effect(effect, None)?;
        Ok(id)
    }

    /// Attach an effect to its clip at `index` (clamped; `None` appends)
    pub fn insert_effect(&mut self, effect: Effect, index: Option<usize>) -> ActionResult<usize> {
        if self.effects.contains_key(&effect.id) {
            return Err(ActionError::InvalidOperation(format!(
                "effect {} already exists",
                effect.id
            )));
        }
        let clip = self
            .clips
            .get_mut(&effect.clip)
            .ok_or(ActionError::ObjectNotFound(effect.clip))?;

        let index = index.unwrap_or(clip.effects.len()).min(clip.effects.len());
        clip.effects.insert(index, effect.id);
        self.effects.insert(effect.id, effect.clone());

        self.emit(TimelineChange::EffectAdded { effect, index });
        Ok(index)
    }

    /// Detach and destroy an effect, returning it with its former index
    pub fn remove_effect(&mut self, id: ObjectId) -> ActionResult<(Effect, usize)> {
        let effect = self.effects.remove(&id).ok_or(ActionError::ObjectNotFound(id))?;
        let index = match self.clips.get_mut(&effect.clip) {
            Some(clip) => {
                let index = clip.effects.iter().position(|e| *e == id).unwrap_or(0);
                clip.effects.retain(|e| *e != id);
                index
            }
            None => 0,
        };

        self.emit(TimelineChange::EffectRemoved {
            effect: effect.clone(),
            index,
        });
        Ok((effect, index))
    }

    // ── Keyframes ──────────────────────────────────────────────────────────

    fn control_source_mut(&mut self, effect: ObjectId, property: &str) -> ActionResult<&mut ControlSource> {
        let effect = self
            .effects
            .get_mut(&effect)
            .ok_or(ActionError::ObjectNotFound(effect))?;
        Ok(effect
            .control_sources
            .entry(property.to_string())
            .or_default())
    }

    /// Add a keyframe or change the value of the one at `timestamp`
    pub fn set_keyframe(
        &mut self,
        effect: ObjectId,
        property: &str,
        timestamp: u64,
        value: f64,
    ) -> ActionResult<()> {
        let source = self.control_source_mut(effect, property)?;
        let keyframe = Keyframe::new(timestamp, value);
        let change = match source.keyframes.insert(timestamp, value) {
            None => TimelineChange::KeyframeAdded {
                effect,
                property: property.to_string(),
                keyframe,
            },
            Some(old) if old != value => TimelineChange::KeyframeChanged {
                effect,
                property: property.to_string(),
                old: Keyframe::new(timestamp, old),
                new: keyframe,
            },
            Some(_) => return Ok(()),
        };
        self.emit(change);
        Ok(())
    }

    /// Move the keyframe at `from` to the position and value of `to`
    pub fn move_keyframe(
        &mut self,
        effect: ObjectId,
        property: &str,
        from: u64,
        to: Keyframe,
    ) -> ActionResult<()> {
        let source = self.control_source_mut(effect, property)?;
        let old_value = source.value_at(from).ok_or_else(|| {
            ActionError::InvalidOperation(format!("no keyframe of {} at {}", property, from))
        })?;
        if from != to.timestamp && source.keyframes.contains_key(&to.timestamp) {
            return Err(ActionError::InvalidOperation(format!(
                "a keyframe of {} already exists at {}",
                property, to.timestamp
            )));
        }

        let old = Keyframe::new(from, old_value);
        if old == to {
            return Ok(());
        }
        source.keyframes.remove(&from);
        source.keyframes.insert(to.timestamp, to.value);

        self.emit(TimelineChange::KeyframeChanged {
            effect,
            property: property.to_string(),
            old,
            new: to,
        });
        Ok(())
    }

    pub fn remove_keyframe(
        &mut self,
        effect: ObjectId,
        property: &str,
        timestamp: u64,
    ) -> ActionResult<Keyframe> {
        let source = self.control_source_mut(effect, property)?;
        let value = source.keyframes.remove(&timestamp).ok_or_else(|| {
            ActionError::InvalidOperation(format!("no keyframe of {} at {}", property, timestamp))
        })?;

        let keyframe = Keyframe::new(timestamp, value);
        self.emit(TimelineChange::KeyframeRemoved {
            effect,
            property: property.to_string(),
            keyframe,
        });
        Ok(keyframe)
    }

    // ── Markers ────────────────────────────────────────────────────────────

    pub fn add_marker(&mut self, position: u64, comment: &str) -> ObjectId {
        let marker = Marker {
            id: ObjectId::new(),
            position,
            comment: comment.to_string(),
        };
        let id = marker.id;
        self.markers.insert(id, marker.clone());
        self.emit(TimelineChange::MarkerAdded(marker));
        id
    }

    pub fn insert_marker(&mut self, marker: Marker) -> ActionResult<()> {
        if self.markers.contains_key(&marker.id) {
            return Err(ActionError::InvalidOperation(format!(
                "marker {} already exists",
                marker.id
            )));
        }
        self.markers.insert(marker.id, marker.clone());
        self.emit(TimelineChange::MarkerAdded(marker));
        Ok(())
    }

    pub fn remove_marker(&mut self, id: ObjectId) -> ActionResult<Marker> {
        let marker = self
            .markers
            .remove(&id)
            .ok_or(ActionError::ObjectNotFound(id))?;
        self.emit(TimelineChange::MarkerRemoved(marker.clone()));
        Ok(marker)
    }

    pub fn move_marker(&mut self, id: ObjectId, position: u64) -> ActionResult<()> {
        let marker = self
            .markers
            .get_mut(&id)
            .ok_or(ActionError::ObjectNotFound(id))?;
        let old_position = marker.position;
        if old_position == position {
            return Ok(());
        }
        marker.position = position;

        self.emit(TimelineChange::MarkerMoved {
            marker: id,
            old_position,
            new_position: position,
        });
        Ok(())
    }

    // ── Metadata ───────────────────────────────────────────────────────────

    /// Set (`Some`) or clear (`None`) a project metadata entry
    pub fn set_metadata(&mut self, key: &str, value: Option<PropertyValue>) -> Option<PropertyValue> {
        let old = match &value {
            Some(value) => self.metadata.insert(key.to_string(), value.clone()),
            None => self.metadata.remove(key),
        };
        if old != value {
            self.emit(TimelineChange::MetadataChanged {
                key: key.to_string(),
                old: old.clone(),
                new: value,
            });
        }
        old
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("layers", &self.layers.len())
            .field("clips", &self.clips.len())
            .field("effects", &self.effects.len())
            .field("markers", &self.markers.len())
            .field("metadata", &self.metadata)
            .field("commit_count", &self.commit_count)
            .finish()
    }
}
