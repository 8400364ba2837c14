// End-to-end tests for opening, selecting and closing tabs

use crate::common::harness::TabsTestHarness;
use crossterm::event::{KeyCode, KeyModifiers};
use graphpad::app::{TabSlot, TabState, UiEvent};
use graphpad::config::Config;

#[test]
fn test_opening_same_file_twice_selects_existing_tab() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    harness.write_file("b.ttl", "b");

    let a = harness.open("a.ttl");
    let b = harness.open("b.ttl");
    harness.assert_selected(TabSlot::Document(b));

    let again = harness.open("a.ttl");
    assert_eq!(again, a);
    harness.assert_tab_count(2);
    harness.assert_selected(TabSlot::Document(a));
}

#[test]
fn test_marker_survives_every_removal() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.assert_marker_last();

    let only = harness.new_tab();
    harness.assert_marker_last();
    harness.controller_mut().request_close(only).unwrap();
    harness.assert_tab_count(0);
    harness.assert_marker_last();
    assert_eq!(harness.strip(), "[+]");
}

#[test]
fn test_plus_marker_creates_untitled_tabs() {
    let mut harness = TabsTestHarness::new().unwrap();
    let first = harness.controller_mut().select(TabSlot::AddTab).unwrap();
    let second = harness.controller_mut().select(TabSlot::AddTab).unwrap();
    harness.pump();

    assert_eq!(harness.controller().title(first), Some("Untitled-1"));
    assert_eq!(harness.controller().title(second), Some("Untitled-2"));
    assert_eq!(harness.strip(), "Untitled-1 | [Untitled-2] | +");
}

#[test]
fn test_closing_selected_tab_selects_left_neighbour() {
    let mut harness = TabsTestHarness::new().unwrap();
    let a = harness.new_tab();
    let b = harness.new_tab();
    let c = harness.new_tab();

    harness
        .controller_mut()
        .select(TabSlot::Document(b))
        .unwrap();
    assert!(harness.ctrl('w'));
    harness.assert_selected(TabSlot::Document(a));

    // Closing the first tab falls back to its right neighbour
    assert!(harness.ctrl('w'));
    harness.assert_selected(TabSlot::Document(c));
}

#[test]
fn test_tab_navigation_shortcuts_wrap() {
    let mut harness = TabsTestHarness::new().unwrap();
    let a = harness.new_tab();
    let b = harness.new_tab();

    assert!(harness.send_key(KeyCode::PageDown, KeyModifiers::CONTROL));
    harness.assert_selected(TabSlot::Document(a));
    assert!(harness.send_key(KeyCode::PageUp, KeyModifiers::CONTROL));
    harness.assert_selected(TabSlot::Document(b));
}

#[test]
fn test_shortcuts_on_marker_are_noops() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    let tab = harness.open("a.ttl");
    harness.controller_mut().request_close(tab).unwrap();
    harness.assert_selected(TabSlot::AddTab);
    harness.take_events();

    assert!(harness.ctrl('s'));
    assert!(harness.ctrl('w'));
    assert!(harness.send_key(KeyCode::F(5), KeyModifiers::NONE));
    harness.assert_tab_count(0);
    harness.assert_selected(TabSlot::AddTab);
    assert!(harness.take_events().is_empty());
}

#[test]
fn test_new_tab_shortcut_and_custom_prefix() {
    let mut config = Config::default();
    config.editor.untitled_prefix = "Draft".to_string();
    let mut harness = TabsTestHarness::with_config(config).unwrap();

    assert!(harness.ctrl('t'));
    let tab = harness.selected_tab().unwrap();
    assert_eq!(harness.controller().title(tab), Some("Draft-1"));
    harness.assert_state(tab, TabState::Clean);
}

#[test]
fn test_open_via_chooser_shortcut() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("picked.ttl", "ex:a ex:b ex:c .");
    harness.chooser().push_answer("picked.ttl");

    assert!(harness.ctrl('o'));
    let tab = harness.selected_tab().unwrap();
    assert_eq!(harness.content(tab), "ex:a ex:b ex:c .");
    assert_eq!(
        harness.controller().state().recent_files(),
        &[harness.path("picked.ttl").canonicalize().unwrap()]
    );

    // Cancelled chooser: nothing happens
    harness.chooser().push_cancel();
    assert!(harness.ctrl('o'));
    harness.assert_tab_count(1);
}

#[test]
fn test_opening_into_empty_untitled_tab_reuses_it() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");

    let untitled = harness.new_tab();
    let tab = harness.open("a.ttl");
    assert_eq!(tab, untitled);
    harness.assert_tab_count(1);
    assert!(harness.take_events().contains(&UiEvent::TitleChanged {
        tab,
        title: "a.ttl".to_string()
    }));
    assert_eq!(harness.content(tab), "a");
    harness.assert_state(tab, TabState::Clean);
}

#[test]
fn test_opening_missing_file_binds_path() {
    let mut harness = TabsTestHarness::new().unwrap();
    let tab = harness.open("fresh.ttl");
    assert_eq!(harness.content(tab), "");
    harness.assert_state(tab, TabState::Clean);

    harness.type_text("ex:a ex:b ex:c .");
    assert!(harness.ctrl('s'));
    assert_eq!(harness.read_file("fresh.ttl").unwrap(), "ex:a ex:b ex:c .");
}
