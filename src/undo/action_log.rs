// UndoableActionLog - Transactions, undo/redo history and checkpoints

use crate::undo::config::UndoLogConfig;
use crate::undo::observer::{EventConsumer, LogEvent, LogObserver, MoveDirection, event_channel};
use crate::undo::stack::{StackId, UndoableActionStack};
use crate::undo::trait_def::{ActionError, ActionResult, FinalizingAction, UndoableAction};
use crate::undo::transaction::Transaction;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Result type for log operations
pub type UndoResult<T> = Result<T, UndoError>;

/// Errors returned by the log
///
/// Everything but `Action` is a usage error: the call sequence itself was wrong and
/// the log state is left untouched. `Action` carries the failure of an action during
/// replay, unmodified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UndoError {
    #[error("Cannot commit {name}: no transaction is open")]
    NothingToCommit { name: String },

    #[error("Cannot roll back: no transaction is open")]
    NothingToRollback,

    #[error("Transaction mismatch: innermost transaction is {expected}, got {found}")]
    NameMismatch { expected: String, found: String },

    #[error("Cannot {operation} while recording {open:?}")]
    TransactionOpen {
        operation: &'static str,
        open: Vec<String>,
    },

    #[error("Toplevel transaction {name} started while recording {open:?}")]
    NestedToplevel { name: String, open: Vec<String> },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl UndoError {
    /// Whether the error comes from a wrong call sequence rather than an action
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, UndoError::Action(_))
    }

    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            UndoError::Action(e) => Some(e),
            _ => None,
        }
    }
}

/// Current phase of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    /// No open transaction
    Idle,
    /// One or more nested transactions are open
    Recording,
    /// An undo/redo/rollback replay is in progress; entry points are ignored
    Running,
}

/// Options of `UndoableActionLog::begin_with`
pub struct BeginOptions<S> {
    pub finalizing_action: Option<Box<dyn FinalizingAction<S>>>,
    /// Fail if another transaction is already open
    pub toplevel: bool,
    /// Merge consecutive actions; `None` uses the log configuration
    pub mergeable: Option<bool>,
}

impl<S> Default for BeginOptions<S> {
    fn default() -> Self {
        Self {
            finalizing_action: None,
            toplevel: false,
            mergeable: None,
        }
    }
}

impl<S> BeginOptions<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toplevel(mut self) -> Self {
        self.toplevel = true;
        self
    }

    pub fn mergeable(mut self, mergeable: bool) -> Self {
        self.mergeable = Some(mergeable);
        self
    }

    pub fn finalizing(mut self, action: impl FinalizingAction<S> + 'static) -> Self {
        self.finalizing_action = Some(Box::new(action));
        self
    }
}

struct History<S> {
    /// Committed transactions, oldest first
    undo_stacks: VecDeque<UndoableActionStack<S>>,
    /// Undone transactions, most recently undone at the back
    redo_stacks: Vec<UndoableActionStack<S>>,
    /// Open transactions, innermost last
    stacks: Vec<UndoableActionStack<S>>,
    checkpoint: Vec<StackId>,
}

impl<S: 'static> History<S> {
    fn snapshot(&self) -> Vec<StackId> {
        self.undo_stacks.iter().map(|stack| stack.id()).collect()
    }

    fn open_names(&self) -> Vec<String> {
        self.stacks.iter().map(|stack| stack.name().to_string()).collect()
    }

    fn ensure_idle(&self, operation: &'static str) -> UndoResult<()> {
        if self.stacks.is_empty() {
            Ok(())
        } else {
            Err(UndoError::TransactionOpen {
                operation,
                open: self.open_names(),
            })
        }
    }
}

/// Clears the running flag when a replay ends, including on panic
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Undo/redo history of a document of type `S`
///
/// Call sites open a transaction with `begin`, let their mutations `push` actions,
/// then `commit` or `rollback`. Nested commits fold the inner transaction into its
/// parent as a single action; a top-level commit appends to the undo history and
/// invalidates the redo history.
///
/// Entry points take `&self` so that observers of the document can hold the log
/// (typically in an `Rc`) and push while an edit is running. During a replay the log
/// is `Running` and every entry point is a no-op, so mutations made by actions
/// being undone or redone are not recorded again. Pushing outside a transaction is
/// a no-op as well.
///
/// The log is meant to be driven from a single thread.
pub struct UndoableActionLog<S> {
    config: UndoLogConfig,
    history: RefCell<History<S>>,
    running: Cell<bool>,
    observers: RefCell<Vec<Box<dyn LogObserver>>>,
    /// Observers subscribed while events were being delivered
    pending_observers: RefCell<Vec<Box<dyn LogObserver>>>,
}

impl<S: 'static> UndoableActionLog<S> {
    pub fn new() -> Self {
        Self::with_config(UndoLogConfig::default())
    }

    pub fn with_config(config: UndoLogConfig) -> Self {
        Self {
            config,
            history: RefCell::new(History {
                undo_stacks: VecDeque::new(),
                redo_stacks: Vec::new(),
                stacks: Vec::new(),
                checkpoint: Vec::new(),
            }),
            running: Cell::new(false),
            observers: RefCell::new(Vec::new()),
            pending_observers: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &UndoLogConfig {
        &self.config
    }

    /// Register an observer notified of every transition
    ///
    /// An observer subscribed from within an event callback starts receiving events
    /// after the current one has been delivered.
    pub fn subscribe(&self, observer: Box<dyn LogObserver>) {
        match self.observers.try_borrow_mut() {
            Ok(mut observers) => observers.push(observer),
            Err(_) => self.pending_observers.borrow_mut().push(observer),
        }
    }

    /// Subscribe a lock-free channel sized from the configuration
    pub fn event_channel(&self) -> EventConsumer {
        let (sender, consumer) = event_channel(self.config.event_channel_capacity);
        self.subscribe(Box::new(sender));
        consumer
    }

    /// Open a transaction with default options
    pub fn begin(&self, name: &str) -> UndoResult<()> {
        self.begin_with(name, BeginOptions::default())
    }

    /// Open a (possibly nested) transaction
    ///
    /// # Errors
    /// `NestedToplevel` if `options.toplevel` is set and a transaction is already open.
    pub fn begin_with(&self, name: &str, options: BeginOptions<S>) -> UndoResult<()> {
        if self.running.get() {
            log::debug!("Ignoring begin of {} while running", name);
            return Ok(());
        }

        let depth = {
            let mut history = self.history.borrow_mut();
            if options.toplevel && !history.stacks.is_empty() {
                return Err(UndoError::NestedToplevel {
                    name: name.to_string(),
                    open: history.open_names(),
                });
            }

            let mergeable = options
                .mergeable
                .unwrap_or(self.config.mergeable_by_default);
            history.stacks.push(UndoableActionStack::new(
                name,
                options.finalizing_action,
                mergeable,
            ));
            history.stacks.len()
        };

        log::debug!("Beginning {} (depth {})", name, depth);
        self.emit(LogEvent::Begin {
            name: name.to_string(),
            depth,
        });
        Ok(())
    }

    /// Record an action into the innermost open transaction
    ///
    /// Ignored when no transaction is open or while running.
    pub fn push(&self, action: Box<dyn UndoableAction<S>>) {
        if self.running.get() {
            log::debug!("Ignoring {} pushed while running", action.description());
            return;
        }

        let event = {
            let mut history = self.history.borrow_mut();
            let Some(stack) = history.stacks.last_mut() else {
                log::debug!(
                    "Ignoring {} pushed outside of a transaction",
                    action.description()
                );
                return;
            };

            let description = action.description();
            let scenario = action.as_scenario_action();
            let merged = stack.push(action);
            LogEvent::Push {
                stack: stack.name().to_string(),
                action: description,
                merged,
                scenario,
            }
        };

        self.emit(event);
    }

    /// Close the innermost transaction, which must be named `name`
    ///
    /// # Errors
    /// `NothingToCommit` without an open transaction, `NameMismatch` if the innermost
    /// transaction has another name. The log is unchanged on error.
    pub fn commit(&self, name: &str) -> UndoResult<()> {
        if self.running.get() {
            log::debug!("Ignoring commit of {} while running", name);
            return Ok(());
        }

        let toplevel = {
            let mut history = self.history.borrow_mut();
            let stack = match history.stacks.pop() {
                Some(stack) => stack,
                None => {
                    return Err(UndoError::NothingToCommit {
                        name: name.to_string(),
                    });
                }
            };
            if stack.name() != name {
                let expected = stack.name().to_string();
                history.stacks.push(stack);
                return Err(UndoError::NameMismatch {
                    expected,
                    found: name.to_string(),
                });
            }

            match history.stacks.last_mut() {
                Some(parent) => {
                    parent.push(Box::new(stack));
                    false
                }
                None => {
                    history.undo_stacks.push_back(stack);
                    history.redo_stacks.clear();
                    if let Some(limit) = self.config.history_limit {
                        while history.undo_stacks.len() > limit {
                            history.undo_stacks.pop_front();
                        }
                    }
                    true
                }
            }
        };

        log::debug!("Committed {} (toplevel: {})", name, toplevel);
        self.emit(LogEvent::Commit {
            name: name.to_string(),
            toplevel,
        });
        Ok(())
    }

    /// Abort the innermost transaction, undoing everything it recorded
    ///
    /// Nothing is added to the parent transaction or to the history.
    pub fn rollback(&self, target: &mut S) -> UndoResult<()> {
        self.rollback_inner(None, Some(target))
    }

    /// Like `rollback`, checking that the innermost transaction is `name`
    pub fn rollback_named(&self, name: &str, target: &mut S) -> UndoResult<()> {
        self.rollback_inner(Some(name), Some(target))
    }

    /// Drop the innermost transaction without reverting its actions
    pub fn discard(&self) -> UndoResult<()> {
        self.rollback_inner(None, None)
    }

    fn rollback_inner(&self, name: Option<&str>, target: Option<&mut S>) -> UndoResult<()> {
        if self.running.get() {
            log::debug!("Ignoring rollback while running");
            return Ok(());
        }

        let mut stack = {
            let mut history = self.history.borrow_mut();
            let stack = history.stacks.pop().ok_or(UndoError::NothingToRollback)?;
            if let Some(name) = name {
                if stack.name() != name {
                    let expected = stack.name().to_string();
                    history.stacks.push(stack);
                    return Err(UndoError::NameMismatch {
                        expected,
                        found: name.to_string(),
                    });
                }
            }
            stack
        };

        let undone = target.is_some();
        log::debug!("Rolling back {} (undo: {})", stack.name(), undone);
        self.emit(LogEvent::Rollback {
            name: stack.name().to_string(),
            undone,
        });

        if let Some(target) = target {
            self.run(|| stack.undo(target))?;
        }
        Ok(())
    }

    /// Undo the most recent committed transaction
    ///
    /// If an action fails, the transaction is dropped from the history, the actions
    /// already reverted stay reverted and the action error is returned.
    pub fn undo(&self, target: &mut S) -> UndoResult<()> {
        if self.running.get() {
            log::debug!("Ignoring undo while running");
            return Ok(());
        }

        let mut stack = {
            let mut history = self.history.borrow_mut();
            history.ensure_idle("undo")?;
            history
                .undo_stacks
                .pop_back()
                .ok_or(UndoError::NothingToUndo)?
        };

        let name = stack.name().to_string();
        if let Err(e) = self.run(|| stack.undo(target)) {
            log::warn!("Undo of {} failed, dropping it from history: {}", name, e);
            return Err(e);
        }

        self.history.borrow_mut().redo_stacks.push(stack);
        log::debug!("Undid {}", name);
        self.emit(LogEvent::Move {
            direction: MoveDirection::Undo,
            name,
        });
        Ok(())
    }

    /// Redo the most recently undone transaction
    pub fn redo(&self, target: &mut S) -> UndoResult<()> {
        if self.running.get() {
            log::debug!("Ignoring redo while running");
            return Ok(());
        }

        let mut stack = {
            let mut history = self.history.borrow_mut();
            history.ensure_idle("redo")?;
            history.redo_stacks.pop().ok_or(UndoError::NothingToRedo)?
        };

        let name = stack.name().to_string();
        if let Err(e) = self.run(|| stack.execute(target)) {
            log::warn!("Redo of {} failed, dropping it from history: {}", name, e);
            return Err(e);
        }

        self.history.borrow_mut().undo_stacks.push_back(stack);
        log::debug!("Redid {}", name);
        self.emit(LogEvent::Move {
            direction: MoveDirection::Redo,
            name,
        });
        Ok(())
    }

    /// Remember the current history as the saved state
    pub fn checkpoint(&self) -> UndoResult<()> {
        if self.running.get() {
            return Ok(());
        }

        let mut history = self.history.borrow_mut();
        history.ensure_idle("checkpoint")?;
        history.checkpoint = history.snapshot();
        Ok(())
    }

    /// Whether the undo history differs from the last checkpoint
    pub fn dirty(&self) -> bool {
        let history = self.history.borrow();
        history.checkpoint != history.snapshot()
    }

    /// Run `body` inside a transaction
    ///
    /// Commits when `body` returns `Ok`, rolls back (undoing everything recorded
    /// so far) and returns the original error when it returns `Err`. If the commit
    /// itself fails, e.g. because `body` left a nested transaction open, everything
    /// opened since `begin` is rolled back and the commit error is returned. The
    /// transaction is never left open.
    pub fn started<T, E, F>(
        &self,
        name: &str,
        options: BeginOptions<S>,
        target: &mut S,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut S) -> Result<T, E>,
        E: From<UndoError>,
    {
        self.begin_with(name, options)?;
        let depth = self.depth();
        match body(target) {
            Ok(value) => match self.commit(name) {
                Ok(()) => Ok(value),
                Err(err) => {
                    if let Err(rollback_err) = self.unwind_to(depth, target) {
                        log::warn!("Rollback of {} failed: {}", name, rollback_err);
                    }
                    Err(err.into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = self.unwind_to(depth, target) {
                    log::warn!("Rollback of {} failed: {}", name, rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Open a transaction guarded by a `Transaction`
    ///
    /// The guard commits on `commit()` and rolls back when dropped uncommitted.
    pub fn transaction<'a>(
        &'a self,
        name: &str,
        options: BeginOptions<S>,
        target: &'a mut S,
    ) -> UndoResult<Transaction<'a, S>> {
        self.begin_with(name, options)?;
        Ok(Transaction::new(self, name, target))
    }

    /// Roll back open transactions, innermost first, until fewer than `depth` remain
    ///
    /// Keeps going when an action fails, returning the first error.
    pub(crate) fn unwind_to(&self, depth: usize, target: &mut S) -> UndoResult<()> {
        let mut result = Ok(());
        loop {
            let open = self.depth();
            if open < depth || open == 0 {
                break;
            }
            if let Err(e) = self.rollback(target) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
            if self.depth() >= open {
                // Running: rollback is ignored
                break;
            }
        }
        result
    }

    pub fn state(&self) -> LogState {
        if self.running.get() {
            LogState::Running
        } else if self.history.borrow().stacks.is_empty() {
            LogState::Idle
        } else {
            LogState::Recording
        }
    }

    pub fn is_in_transaction(&self) -> bool {
        !self.history.borrow().stacks.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Number of open transactions
    pub fn depth(&self) -> usize {
        self.history.borrow().stacks.len()
    }

    /// Names of the open transactions, outermost first
    pub fn open_transactions(&self) -> Vec<String> {
        self.history.borrow().open_names()
    }

    /// Number of entries in the innermost open transaction
    pub fn current_len(&self) -> Option<usize> {
        self.history.borrow().stacks.last().map(|stack| stack.len())
    }

    pub fn can_undo(&self) -> bool {
        !self.history.borrow().undo_stacks.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.borrow().redo_stacks.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.history.borrow().undo_stacks.len()
    }

    pub fn redo_count(&self) -> usize {
        self.history.borrow().redo_stacks.len()
    }

    /// Name of the transaction `undo` would revert
    pub fn undo_description(&self) -> Option<String> {
        let history = self.history.borrow();
        history.undo_stacks.back().map(|stack| stack.name().to_string())
    }

    /// Name of the transaction `redo` would reapply
    pub fn redo_description(&self) -> Option<String> {
        let history = self.history.borrow();
        history.redo_stacks.last().map(|stack| stack.name().to_string())
    }

    /// Descriptions of the actions of the most recent committed transaction
    pub fn last_committed_actions(&self) -> Option<Vec<String>> {
        let history = self.history.borrow();
        history.undo_stacks.back().map(|stack| stack.descriptions())
    }

    fn run<T>(&self, operation: impl FnOnce() -> ActionResult<T>) -> UndoResult<T> {
        self.running.set(true);
        let _guard = RunningGuard(&self.running);
        Ok(operation()?)
    }

    fn emit(&self, event: LogEvent) {
        match self.observers.try_borrow_mut() {
            Ok(mut observers) => {
                for observer in observers.iter_mut() {
                    observer.on_event(&event);
                }
                observers.append(&mut self.pending_observers.borrow_mut());
            }
            Err(_) => log::warn!("Dropping {:?} emitted from within an observer", event),
        }
    }
}

impl<S: 'static> Default for UndoableActionLog<S> {
    fn default() -> Self {
        Self::new()
    }
}
