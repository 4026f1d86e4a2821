// UndoableAction trait definition

use crate::undo::objects::ObjectId;
use crate::undo::scenario::ScenarioAction;
use std::any::Any;

/// Result type for action operations
pub type ActionResult<T> = Result<T, ActionError>;

/// Errors raised by an action while it is applied or reverted
///
/// The log never translates these; they reach the caller of commit/undo/redo/rollback
/// untouched so the failing action and object stay visible.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Object {0} no longer exists")]
    ObjectNotFound(ObjectId),

    #[error("Cannot apply {action}: {reason}")]
    CannotApply { action: String, reason: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Finalizing action failed: {0}")]
    Finalize(String),
}

impl ActionError {
    pub fn cannot_apply(action: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::CannotApply {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Trait for reversible mutations of a target state `S`
///
/// Actions carry plain data (ids, old and new values), never live references into
/// `S`. Ids are resolved when the action runs.
///
/// # Example
/// ```
/// use std::any::Any;
/// use timeline_undo::undo::{ActionResult, UndoableAction};
///
/// struct SetCounter {
///     old: i32,
///     new: i32,
/// }
///
/// impl UndoableAction<i32> for SetCounter {
///     fn execute(&mut self, counter: &mut i32) -> ActionResult<()> {
///         *counter = self.new;
///         Ok(())
///     }
///
///     fn undo(&mut self, counter: &mut i32) -> ActionResult<()> {
///         *counter = self.old;
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         format!("Set counter to {}", self.new)
///     }
///
///     fn expand(&mut self, other: &dyn UndoableAction<i32>) -> bool {
///         match other.as_any().downcast_ref::<SetCounter>() {
///             Some(next) => {
///                 self.new = next.new;
///                 true
///             }
///             None => false,
///         }
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait UndoableAction<S> {
    /// Apply (or reapply) the mutation
    ///
    /// Running it when the target already holds the new state is not an error.
    fn execute(&mut self, target: &mut S) -> ActionResult<()>;

    /// Revert the mutation, restoring the old state
    fn undo(&mut self, target: &mut S) -> ActionResult<()>;

    /// Human-readable description, e.g. "Set start of clip 1a2b3c4d"
    fn description(&self) -> String;

    /// Try to fold `other` into this action
    ///
    /// Called by mergeable stacks on their last entry before `other` is appended.
    /// Returning true means `other` has been absorbed and will be dropped.
    fn expand(&mut self, _other: &dyn UndoableAction<S>) -> bool {
        false
    }

    /// Downcasting hook used by `expand` implementations
    fn as_any(&self) -> &dyn Any;

    /// Optional structured record of the action for scenario/debug logs
    fn as_scenario_action(&self) -> Option<ScenarioAction> {
        None
    }
}

/// Side effect run once after a whole stack has been replayed
///
/// Used to defer global work (flushing a pipeline) until a transaction's net effect
/// is known.
pub trait FinalizingAction<S> {
    fn execute(&mut self, target: &mut S) -> ActionResult<()>;
}

impl<S, F> FinalizingAction<S> for F
where
    F: FnMut(&mut S) -> ActionResult<()>,
{
    fn execute(&mut self, target: &mut S) -> ActionResult<()> {
        self(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Increment;

    impl UndoableAction<i32> for Increment {
        fn execute(&mut self, target: &mut i32) -> ActionResult<()> {
            *target += 1;
            Ok(())
        }

        fn undo(&mut self, target: &mut i32) -> ActionResult<()> {
            *target -= 1;
            Ok(())
        }

        fn description(&self) -> String {
            "Increment".to_string()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_default_expand_refuses() {
        let mut first = Increment;
        let second = Increment;
        assert!(!first.expand(&second));
        assert!(first.as_scenario_action().is_none());
    }

    #[test]
    fn test_closure_is_finalizing_action() {
        let mut calls = 0;
        {
            let mut finalizer = |target: &mut i32| -> ActionResult<()> {
                *target *= 2;
                calls += 1;
                Ok(())
            };
            let mut value = 3;
            FinalizingAction::execute(&mut finalizer, &mut value).unwrap();
            assert_eq!(value, 6);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_error_messages() {
        let err = ActionError::cannot_apply("Remove effect", "clip is gone");
        assert_eq!(err.to_string(), "Cannot apply Remove effect: clip is gone");

        let err = ActionError::InvalidOperation("layer not empty".into());
        assert_eq!(err.to_string(), "Invalid operation: layer not empty");
    }
}
