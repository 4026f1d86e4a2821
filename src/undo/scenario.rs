// Scenario records for debug/replay tooling

use crate::undo::observer::{LogEvent, LogObserver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// External representation of a single action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    /// Action kind, e.g. "set-child-property"
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ScenarioAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter
    ///
    /// Values that cannot be represented as JSON are stored as null.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.properties.insert(key.into(), value);
        self
    }
}

/// Observer writing every recorded action as one JSON line
///
/// Actions that do not expose a scenario record are skipped. Write failures are
/// logged and counted, never propagated into the log.
pub struct ScenarioRecorder<W: Write> {
    writer: W,
    recorded: usize,
    failures: usize,
}

impl<W: Write> ScenarioRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            recorded: 0,
            failures: 0,
        }
    }

    /// Number of records written so far
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn record(&mut self, action: &ScenarioAction) {
        let result = serde_json::to_writer(&mut self.writer, action)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));

        match result {
            Ok(()) => self.recorded += 1,
            Err(e) => {
                self.failures += 1;
                log::warn!("Failed to record scenario action {}: {}", action.name, e);
            }
        }
    }
}

impl<W: Write> LogObserver for ScenarioRecorder<W> {
    fn on_event(&mut self, event: &LogEvent) {
        if let LogEvent::Push {
            scenario: Some(action),
            ..
        } = event
        {
            self.record(action);
        }
    }
}
