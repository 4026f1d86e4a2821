// Integration test: Undo log ordering, history and checkpoint properties
//
// Uses a journal document where every action records its calls, so the exact
// replay order can be asserted.

use std::any::Any;
use timeline_undo::undo::{
    ActionError, ActionResult, BeginOptions, LogState, UndoError, UndoableAction,
    UndoableActionLog,
};

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<String>,
    value: i64,
}

/// Adds `delta` to the journal value
struct AddAction {
    name: &'static str,
    delta: i64,
}

impl AddAction {
    fn boxed(name: &'static str, delta: i64) -> Box<dyn UndoableAction<Journal>> {
        Box::new(Self { name, delta })
    }
}

impl UndoableAction<Journal> for AddAction {
    fn execute(&mut self, journal: &mut Journal) -> ActionResult<()> {
        journal.calls.push(format!("do({})", self.name));
        journal.value += self.delta;
        Ok(())
    }

    fn undo(&mut self, journal: &mut Journal) -> ActionResult<()> {
        journal.calls.push(format!("undo({})", self.name));
        journal.value -= self.delta;
        Ok(())
    }

    fn description(&self) -> String {
        self.name.to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Field assignment that merges with later assignments of the same field
struct SetField {
    field: &'static str,
    old: i64,
    new: i64,
}

impl UndoableAction<Journal> for SetField {
    fn execute(&mut self, journal: &mut Journal) -> ActionResult<()> {
        journal.value = self.new;
        Ok(())
    }

    fn undo(&mut self, journal: &mut Journal) -> ActionResult<()> {
        journal.value = self.old;
        Ok(())
    }

    fn description(&self) -> String {
        format!("{}: {} -> {}", self.field, self.old, self.new)
    }

    fn expand(&mut self, other: &dyn UndoableAction<Journal>) -> bool {
        match other.as_any().downcast_ref::<SetField>() {
            Some(other) if other.field == self.field => {
                self.new = other.new;
                true
            }
            _ => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Action whose execute or undo fails on demand
struct FailingAction {
    fail_execute: bool,
    fail_undo: bool,
}

impl FailingAction {
    fn on_undo() -> Box<dyn UndoableAction<Journal>> {
        Box::new(Self {
            fail_execute: false,
            fail_undo: true,
        })
    }

    fn on_redo() -> Box<dyn UndoableAction<Journal>> {
        Box::new(Self {
            fail_execute: true,
            fail_undo: false,
        })
    }
}

impl UndoableAction<Journal> for FailingAction {
    fn execute(&mut self, journal: &mut Journal) -> ActionResult<()> {
        if self.fail_execute {
            return Err(ActionError::InvalidOperation("boom".into()));
        }
        journal.calls.push("do(failing)".into());
        Ok(())
    }

    fn undo(&mut self, journal: &mut Journal) -> ActionResult<()> {
        if self.fail_undo {
            return Err(ActionError::InvalidOperation("boom".into()));
        }
        journal.calls.push("undo(failing)".into());
        Ok(())
    }

    fn description(&self) -> String {
        "failing".to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Record `actions` in a committed transaction, applying them to `journal` first
fn record(
    log: &UndoableActionLog<Journal>,
    journal: &mut Journal,
    name: &str,
    actions: &[(&'static str, i64)],
) {
    log.begin(name).unwrap();
    for (action, delta) in actions {
        journal.value += delta;
        log.push(AddAction::boxed(action, *delta));
    }
    log.commit(name).unwrap();
}

#[test]
fn test_undo_calls_reverse_order_exactly_once() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "edit", &[("a1", 1), ("a2", 10), ("a3", 100)]);

    log.undo(&mut journal).unwrap();
    assert_eq!(journal.calls, vec!["undo(a3)", "undo(a2)", "undo(a1)"]);
    assert_eq!(journal.value, 0);
}

#[test]
fn test_redo_calls_push_order_and_restores_state() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "edit", &[("a1", 1), ("a2", 10), ("a3", 100)]);
    let committed_value = journal.value;

    log.undo(&mut journal).unwrap();
    journal.calls.clear();
    log.redo(&mut journal).unwrap();

    assert_eq!(journal.calls, vec!["do(a1)", "do(a2)", "do(a3)"]);
    assert_eq!(journal.value, committed_value);
    assert_eq!(log.undo_count(), 1);
    assert_eq!(log.redo_count(), 0);
}

#[test]
fn test_nested_transaction_order() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();

    log.begin("outer").unwrap();
    log.push(AddAction::boxed("a1", 1));
    log.begin("inner").unwrap();
    log.push(AddAction::boxed("a2", 1));
    log.commit("inner").unwrap();
    log.push(AddAction::boxed("a3", 1));
    log.commit("outer").unwrap();

    assert_eq!(log.undo_count(), 1);
    assert_eq!(
        log.last_committed_actions().unwrap(),
        vec!["a1", "inner", "a3"]
    );

    log.undo(&mut journal).unwrap();
    assert_eq!(journal.calls, vec!["undo(a3)", "undo(a2)", "undo(a1)"]);

    journal.calls.clear();
    log.redo(&mut journal).unwrap();
    assert_eq!(journal.calls, vec!["do(a1)", "do(a2)", "do(a3)"]);
}

#[test]
fn test_toplevel_commit_clears_redo() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "first", &[("a1", 1)]);

    log.undo(&mut journal).unwrap();
    assert!(log.can_redo());

    // Even an empty transaction invalidates the redo history
    log.begin("second").unwrap();
    log.commit("second").unwrap();

    assert!(!log.can_redo());
    assert_eq!(log.undo_count(), 1);
    assert_eq!(log.undo_description().as_deref(), Some("second"));
}

#[test]
fn test_nested_commit_keeps_redo() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "first", &[("a1", 1)]);
    log.undo(&mut journal).unwrap();

    log.begin("outer").unwrap();
    log.begin("inner").unwrap();
    log.commit("inner").unwrap();
    assert!(log.can_redo());
    log.commit("outer").unwrap();
    assert!(!log.can_redo());
}

#[test]
fn test_dirty_follows_checkpoint() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "base", &[("a1", 1)]);

    log.checkpoint().unwrap();
    assert!(!log.dirty());

    record(&log, &mut journal, "second", &[("a2", 1)]);
    record(&log, &mut journal, "third", &[("a3", 1)]);
    assert!(log.dirty());

    log.undo(&mut journal).unwrap();
    assert!(log.dirty());
    log.undo(&mut journal).unwrap();
    assert!(!log.dirty());

    // Going below the checkpoint is dirty again
    log.undo(&mut journal).unwrap();
    assert!(log.dirty());
    log.redo(&mut journal).unwrap();
    assert!(!log.dirty());
}

#[test]
fn test_checkpoint_refused_inside_transaction() {
    let log: UndoableActionLog<Journal> = UndoableActionLog::new();
    log.begin("edit").unwrap();
    assert!(matches!(
        log.checkpoint(),
        Err(UndoError::TransactionOpen { .. })
    ));
}

#[test]
fn test_merge_same_field_only() {
    let log: UndoableActionLog<Journal> = UndoableActionLog::new();
    let mut journal = Journal::default();

    log.begin("drag").unwrap();
    log.push(Box::new(SetField { field: "x", old: 0, new: 5 }));
    log.push(Box::new(SetField { field: "x", old: 5, new: 9 }));
    assert_eq!(log.current_len(), Some(1));
    log.push(Box::new(SetField { field: "y", old: 0, new: 1 }));
    assert_eq!(log.current_len(), Some(2));
    log.commit("drag").unwrap();

    assert_eq!(
        log.last_committed_actions().unwrap(),
        vec!["x: 0 -> 9", "y: 0 -> 1"]
    );

    journal.value = 1;
    log.undo(&mut journal).unwrap();
    assert_eq!(journal.value, 0);
}

#[test]
fn test_non_mergeable_transaction_keeps_entries() {
    let log: UndoableActionLog<Journal> = UndoableActionLog::new();
    log.begin_with("typing", BeginOptions::new().mergeable(false))
        .unwrap();
    log.push(Box::new(SetField { field: "x", old: 0, new: 5 }));
    log.push(Box::new(SetField { field: "x", old: 5, new: 9 }));
    assert_eq!(log.current_len(), Some(2));
}

#[test]
fn test_nested_rollback_leaves_parent_untouched() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();

    log.begin("outer").unwrap();
    journal.value += 1;
    log.push(AddAction::boxed("a1", 1));
    let before = log.current_len();

    log.begin("inner").unwrap();
    journal.value += 10;
    log.push(AddAction::boxed("a2", 10));
    log.rollback(&mut journal).unwrap();

    assert_eq!(journal.calls, vec!["undo(a2)"]);
    assert_eq!(journal.value, 1);
    assert_eq!(log.current_len(), before);
    assert_eq!(log.open_transactions(), vec!["outer"]);
    assert_eq!(log.undo_count(), 0);
    assert_eq!(log.redo_count(), 0);

    log.commit("outer").unwrap();
    assert_eq!(log.last_committed_actions().unwrap(), vec!["a1"]);
}

#[test]
fn test_started_failure_undoes_everything() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();

    let result: Result<(), UndoError> =
        log.started("import", BeginOptions::new(), &mut journal, |journal| {
            journal.value += 1;
            log.push(AddAction::boxed("a1", 1));
            journal.value += 2;
            log.push(AddAction::boxed("a2", 2));
            Err(ActionError::InvalidOperation("unsupported file".into()).into())
        });

    assert!(result.is_err());
    assert_eq!(journal.calls, vec!["undo(a2)", "undo(a1)"]);
    assert_eq!(journal.value, 0);
    assert_eq!(log.undo_count(), 0);
    assert!(!log.is_in_transaction());
}

#[test]
fn test_usage_errors_leave_log_unchanged() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "edit", &[("a1", 1)]);
    log.undo(&mut journal).unwrap();
    log.redo(&mut journal).unwrap();

    assert_eq!(log.commit("edit"), Err(UndoError::NothingToCommit { name: "edit".into() }));
    assert_eq!(log.rollback(&mut journal), Err(UndoError::NothingToRollback));
    assert_eq!(log.redo(&mut journal), Err(UndoError::NothingToRedo));
    assert_eq!(log.undo_count(), 1);
    assert_eq!(log.redo_count(), 0);

    let empty: UndoableActionLog<Journal> = UndoableActionLog::new();
    assert_eq!(empty.undo(&mut journal), Err(UndoError::NothingToUndo));
    assert_eq!(empty.undo_count(), 0);
}

#[test]
fn test_undo_refused_while_recording() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "edit", &[("a1", 1)]);

    log.begin("pending").unwrap();
    let err = log.undo(&mut journal).unwrap_err();
    assert!(err.is_usage_error());
    assert_eq!(log.undo_count(), 1);
    assert!(journal.calls.is_empty());
}

#[test]
fn test_toplevel_begin_refused_when_nested() {
    let log: UndoableActionLog<Journal> = UndoableActionLog::new();
    log.begin("outer").unwrap();
    let err = log
        .begin_with("project", BeginOptions::new().toplevel())
        .unwrap_err();
    assert_eq!(
        err,
        UndoError::NestedToplevel {
            name: "project".into(),
            open: vec!["outer".into()],
        }
    );
    assert_eq!(log.open_transactions(), vec!["outer"]);
}

#[test]
fn test_failed_undo_drops_transaction() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();

    log.begin("edit").unwrap();
    log.push(AddAction::boxed("a1", 1));
    log.push(FailingAction::on_undo());
    log.push(AddAction::boxed("a2", 10));
    log.commit("edit").unwrap();
    journal.value = 11;

    let err = log.undo(&mut journal).unwrap_err();
    assert_eq!(
        err,
        UndoError::Action(ActionError::InvalidOperation("boom".into()))
    );
    assert!(!err.is_usage_error());

    // Actions after the failing one were already reverted, the rest were not
    assert_eq!(journal.calls, vec!["undo(a2)"]);
    assert_eq!(journal.value, 1);
    assert_eq!(log.undo_count(), 0);
    assert_eq!(log.redo_count(), 0);
    assert_eq!(log.state(), LogState::Idle);
    assert!(!log.is_running());
}

#[test]
fn test_failed_redo_drops_transaction() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();
    record(&log, &mut journal, "kept", &[("a0", 100)]);

    log.begin("edit").unwrap();
    log.push(AddAction::boxed("a1", 1));
    log.push(FailingAction::on_redo());
    log.push(AddAction::boxed("a2", 10));
    log.commit("edit").unwrap();
    journal.value += 11;

    log.undo(&mut journal).unwrap();
    journal.calls.clear();

    let err = log.redo(&mut journal).unwrap_err();
    assert_eq!(
        err.action_error(),
        Some(&ActionError::InvalidOperation("boom".into()))
    );
    assert_eq!(journal.calls, vec!["do(a1)"]);
    assert_eq!(log.undo_count(), 1);
    assert_eq!(log.undo_description().as_deref(), Some("kept"));
    assert_eq!(log.redo_count(), 0);
    assert_eq!(log.state(), LogState::Idle);

    // The log stays usable
    record(&log, &mut journal, "next", &[("a3", 1)]);
    assert_eq!(log.undo_count(), 2);
}

#[test]
fn test_failed_rollback_closes_transaction() {
    let log = UndoableActionLog::new();
    let mut journal = Journal::default();

    log.begin("outer").unwrap();
    log.push(AddAction::boxed("a1", 1));
    log.begin("inner").unwrap();
    log.push(FailingAction::on_undo());
    log.push(AddAction::boxed("a2", 10));

    let err = log.rollback(&mut journal).unwrap_err();
    assert_eq!(
        err,
        UndoError::Action(ActionError::InvalidOperation("boom".into()))
    );
    assert_eq!(journal.calls, vec!["undo(a2)"]);
    assert_eq!(log.open_transactions(), vec!["outer"]);
    assert_eq!(log.current_len(), Some(1));
    assert_eq!(log.state(), LogState::Recording);

    log.rollback(&mut journal).unwrap();
    assert_eq!(journal.calls, vec!["undo(a2)", "undo(a1)"]);
    assert_eq!(log.state(), LogState::Idle);
    assert_eq!(log.undo_count(), 0);
    assert_eq!(log.redo_count(), 0);
}
