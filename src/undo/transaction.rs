// Scoped transaction guard

use crate::undo::action_log::{UndoResult, UndoableActionLog};
use crate::undo::trait_def::UndoableAction;

/// An open transaction bound to the document it edits
///
/// `commit()` closes it successfully. Calling `rollback()`, dropping the guard
/// without committing (early return, `?`, panic unwinding) or a failed `commit()`
/// rolls the transaction back and undoes what it recorded, together with any nested
/// transaction still open inside it.
pub struct Transaction<'a, S: 'static> {
    log: &'a UndoableActionLog<S>,
    target: &'a mut S,
    name: String,
    /// Depth of this transaction in the log's open stacks
    depth: usize,
    finished: bool,
}

impl<'a, S: 'static> Transaction<'a, S> {
    pub(crate) fn new(log: &'a UndoableActionLog<S>, name: &str, target: &'a mut S) -> Self {
        // While running, the log ignored our begin: nothing to close
        let finished = log.is_running();
        Self {
            log,
            target,
            name: name.to_string(),
            depth: log.depth(),
            finished,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document being edited
    pub fn target(&mut self) -> &mut S {
        &mut *self.target
    }

    pub fn log(&self) -> &UndoableActionLog<S> {
        self.log
    }

    /// Record an action into the innermost open transaction
    pub fn push(&self, action: Box<dyn UndoableAction<S>>) {
        self.log.push(action);
    }

    pub fn commit(mut self) -> UndoResult<()> {
        let result = self.log.commit(&self.name);
        if let Err(e) = &result {
            log::warn!("Commit of {} failed, rolling back: {}", self.name, e);
            if let Err(rollback_err) = self.unwind() {
                log::warn!("Rollback of {} failed: {}", self.name, rollback_err);
            }
        }
        self.finished = true;
        result
    }

    pub fn rollback(mut self) -> UndoResult<()> {
        self.finished = true;
        self.unwind()
    }

    fn unwind(&mut self) -> UndoResult<()> {
        self.log.unwind_to(self.depth, &mut *self.target)
    }
}

impl<S: 'static> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if std::thread::panicking() {
            log::warn!("Rolling back {} after a panic", self.name);
        } else {
            log::debug!("Rolling back {} on drop", self.name);
        }
        if let Err(e) = self.unwind() {
            log::warn!("Rollback of {} failed: {}", self.name, e);
        }
    }
}
