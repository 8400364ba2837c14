// End-to-end tests for saving, the close confirmation and quitting

use crate::common::harness::TabsTestHarness;
use crossterm::event::{KeyCode, KeyModifiers};
use graphpad::app::{
    CloseOutcome, ConfirmationOutcome, ControllerError, QuitOutcome, TabState, UiEvent,
};
use graphpad::view::save_dialog::SaveChoice;

#[test]
fn test_close_dirty_then_cancel_keeps_everything() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    let tab = harness.open("a.ttl");
    harness.type_text("b");

    assert!(harness.ctrl('w'));
    harness.assert_state(tab, TabState::ClosePending);
    assert!(harness
        .take_events()
        .iter()
        .any(|e| matches!(e, UiEvent::ConfirmationRequested { .. })));

    assert!(harness.send_key(KeyCode::Esc, KeyModifiers::NONE));
    harness.assert_state(tab, TabState::Dirty);
    harness.assert_tab_count(1);
    assert_eq!(harness.selected_tab(), Some(tab));
    assert_eq!(harness.content(tab), "ab");
    assert_eq!(harness.read_file("a.ttl").unwrap(), "a");
}

#[test]
fn test_close_dirty_enter_saves_and_removes() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    let tab = harness.open("a.ttl");
    harness.type_text("b");

    assert!(harness.ctrl('w'));
    assert!(harness.send_key(KeyCode::Enter, KeyModifiers::NONE));
    harness.assert_tab_count(0);
    assert_eq!(harness.read_file("a.ttl").unwrap(), "ab");
    assert!(harness.take_events().contains(&UiEvent::TabRemoved(tab)));
}

#[test]
fn test_close_dirty_save_failure_keeps_tab() {
    let mut harness = TabsTestHarness::new().unwrap();
    // Bound to a file inside a directory that does not exist
    let path = harness_missing_dir_path(&harness);
    let tab = harness.controller_mut().open_file(&path).unwrap();
    harness.pump();
    harness.type_text("unsaved");

    harness.controller_mut().request_close(tab).unwrap();
    let err = harness
        .controller_mut()
        .resolve_confirmation(SaveChoice::Save)
        .unwrap_err();
    assert!(matches!(err, ControllerError::IoFailure(_)));

    harness.assert_tab_count(1);
    harness.assert_state(tab, TabState::Dirty);
    assert_eq!(harness.content(tab), "unsaved");
    assert!(harness
        .take_events()
        .iter()
        .any(|e| matches!(e, UiEvent::Notification(msg) if msg.starts_with("Could not save"))));
}

fn harness_missing_dir_path(harness: &TabsTestHarness) -> std::path::PathBuf {
    harness.path("no-such-dir").join("a.ttl")
}

#[test]
fn test_untitled_save_picks_target_and_renames() {
    let mut harness = TabsTestHarness::new().unwrap();
    let tab = harness.new_tab();
    harness.type_text("ex:a ex:b ex:c .");

    // Cancelled chooser: reported, nothing written
    harness.chooser().push_cancel();
    assert!(harness.ctrl('s'));
    harness.assert_state(tab, TabState::Dirty);
    assert!(harness.take_events().iter().any(
        |e| matches!(e, UiEvent::Notification(msg) if msg.contains("no file to save to"))
    ));

    harness.chooser().push_answer("graph.ttl");
    assert!(harness.ctrl('s'));
    harness.assert_state(tab, TabState::Clean);
    assert_eq!(harness.controller().title(tab), Some("graph.ttl"));
    assert_eq!(harness.read_file("graph.ttl").unwrap(), "ex:a ex:b ex:c .");

    let events = harness.take_events();
    assert!(events.contains(&UiEvent::TitleChanged {
        tab,
        title: "graph.ttl".to_string()
    }));
    assert!(events.contains(&UiEvent::ModifiedChanged {
        tab,
        modified: false
    }));
}

#[test]
fn test_close_untitled_and_save_through_confirmation() {
    let mut harness = TabsTestHarness::new().unwrap();
    let tab = harness.new_tab();
    harness.type_text("text");
    harness.chooser().push_answer("kept.ttl");

    harness.controller_mut().request_close(tab).unwrap();
    let outcome = harness
        .controller_mut()
        .resolve_confirmation(SaveChoice::Save)
        .unwrap();
    assert_eq!(outcome, ConfirmationOutcome::Close(CloseOutcome::Removed));
    assert_eq!(harness.read_file("kept.ttl").unwrap(), "text");
}

#[test]
fn test_second_close_while_confirmation_open_is_rejected() {
    let mut harness = TabsTestHarness::new().unwrap();
    let a = harness.new_tab();
    harness.type_text("a");
    let b = harness.new_tab();

    harness.controller_mut().request_close(a).unwrap();
    assert!(matches!(
        harness.controller_mut().request_close(b),
        Err(ControllerError::ConfirmationPending)
    ));
    harness.assert_tab_count(2);
}

#[test]
fn test_quit_discard_does_not_write() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    harness.open("a.ttl");
    harness.type_text("b");

    assert!(harness.ctrl('q'));
    assert!(!harness.controller().is_quit_requested());
    let confirmation = harness.controller().pending_confirmation().unwrap();
    assert_eq!(
        confirmation.message(),
        "a.ttl has unsaved changes. (s)ave, (d)iscard, (c)ancel?"
    );

    assert!(harness.send_key(KeyCode::Char('d'), KeyModifiers::NONE));
    assert!(harness.controller().is_quit_requested());
    assert_eq!(harness.read_file("a.ttl").unwrap(), "a");
    assert!(harness.take_events().contains(&UiEvent::QuitRequested));
}

#[test]
fn test_quit_save_failure_aborts_quit() {
    let mut harness = TabsTestHarness::new().unwrap();
    let path = harness_missing_dir_path(&harness);
    harness.controller_mut().open_file(&path).unwrap();
    harness.pump();
    harness.type_text("x");

    assert!(matches!(
        harness.controller_mut().request_quit().unwrap(),
        QuitOutcome::AwaitingConfirmation(_)
    ));
    assert!(harness
        .controller_mut()
        .resolve_confirmation(SaveChoice::Save)
        .is_err());
    assert!(!harness.controller().is_quit_requested());
    harness.assert_tab_count(1);
}
