// UndoableActionStack - Actions recorded during one transaction

use crate::undo::trait_def::{ActionResult, FinalizingAction, UndoableAction};
use std::any::Any;
use std::fmt;
use uuid::Uuid;

/// Identity of a stack, used by checkpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackId(Uuid);

impl StackId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Ordered group of actions recorded during one named transaction
///
/// A stack is itself an action: `execute` replays its entries front to back and
/// `undo` back to front, so a committed nested transaction sits in its parent as a
/// single entry. Replay stops at the first failing action and the error is returned
/// as is; the finalizing action only runs after a complete replay.
pub struct UndoableActionStack<S> {
    id: StackId,
    name: String,
    actions: Vec<Box<dyn UndoableAction<S>>>,
    finalizing_action: Option<Box<dyn FinalizingAction<S>>>,
    mergeable: bool,
}

impl<S: 'static> UndoableActionStack<S> {
    pub fn new(
        name: impl Into<String>,
        finalizing_action: Option<Box<dyn FinalizingAction<S>>>,
        mergeable: bool,
    ) -> Self {
        Self {
            id: StackId::new(),
            name: name.into(),
            actions: Vec::new(),
            finalizing_action,
            mergeable,
        }
    }

    /// Append an action, merging it into the last entry when possible
    ///
    /// Returns true when the action was folded into the previous one.
    pub fn push(&mut self, action: Box<dyn UndoableAction<S>>) -> bool {
        if self.mergeable {
            if let Some(last) = self.actions.last_mut() {
                if last.expand(action.as_ref()) {
                    return true;
                }
            }
        }

        self.actions.push(action);
        false
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_mergeable(&self) -> bool {
        self.mergeable
    }

    /// Descriptions of the recorded actions, in push order
    pub fn descriptions(&self) -> Vec<String> {
        self.actions.iter().map(|action| action.description()).collect()
    }

    fn finish_operation(&mut self, target: &mut S) -> ActionResult<()> {
        if let Some(finalizer) = self.finalizing_action.as_mut() {
            finalizer.execute(target)?;
        }
        Ok(())
    }
}

impl<S: 'static> UndoableAction<S> for UndoableActionStack<S> {
    fn execute(&mut self, target: &mut S) -> ActionResult<()> {
        for action in self.actions.iter_mut() {
            action.execute(target)?;
        }
        self.finish_operation(target)
    }

    fn undo(&mut self, target: &mut S) -> ActionResult<()> {
        for action in self.actions.iter_mut().rev() {
            action.undo(target)?;
        }
        self.finish_operation(target)
    }

    fn description(&self) -> String {
        self.name.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<S> fmt::Debug for UndoableActionStack<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoableActionStack")
            .field("name", &self.name)
            .field("actions", &self.actions.len())
            .field("finalizing", &self.finalizing_action.is_some())
            .field("mergeable", &self.mergeable)
            .finish()
    }
}
