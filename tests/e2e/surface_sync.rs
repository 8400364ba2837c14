// End-to-end tests for content flow between documents and their surfaces

use crate::common::harness::{HarnessOptions, TabsTestHarness};
use graphpad::app::{ControllerError, TabState, UiEvent};
use graphpad::model::TabId;

#[test]
fn test_open_before_surface_ready_is_flushed_on_ready() {
    let mut harness = TabsTestHarness::with_options(HarnessOptions {
        deferred_surfaces: true,
        ..HarnessOptions::default()
    })
    .unwrap();
    harness.write_file("a.ttl", "@prefix ex: <http://ex.org/>.");

    let tab = harness.open("a.ttl");
    let surface = harness.surface(tab);
    assert!(!surface.is_ready());
    assert_eq!(surface.content(), "");
    // Before ready, the bridge answers with the queued host value
    assert_eq!(
        harness.controller().session(tab).unwrap().bridge().pull_content(),
        "@prefix ex: <http://ex.org/>."
    );

    surface.finish_initialization();
    harness.pump();
    assert_eq!(surface.content(), "@prefix ex: <http://ex.org/>.");
    harness.assert_state(tab, TabState::Clean);
}

#[test]
fn test_untagged_echo_does_not_dirty() {
    let mut harness = TabsTestHarness::with_options(HarnessOptions {
        untagged_echoes: true,
        ..HarnessOptions::default()
    })
    .unwrap();
    harness.write_file("a.ttl", "a");
    let tab = harness.open("a.ttl");
    harness.assert_state(tab, TabState::Clean);

    harness.type_text("b");
    harness.assert_state(tab, TabState::Dirty);
}

#[test]
fn test_control_characters_reach_disk_unchanged() {
    let text = "ex:a ex:label \"tab\\there\"@en ;\r\n\tex:note \"\u{1}\" .\n";
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", text);
    let tab = harness.open("a.ttl");

    assert_eq!(harness.surface(tab).content(), text);
    harness.type_text("\\");
    assert!(harness.ctrl('s'));
    assert_eq!(harness.read_file("a.ttl").unwrap(), format!("{text}\\"));
}

#[test]
fn test_modified_stream_reports_each_flip_once() {
    let mut harness = TabsTestHarness::new().unwrap();
    harness.write_file("a.ttl", "a");
    let tab = harness.open("a.ttl");
    harness.take_events();

    harness.type_text("b");
    harness.type_text("c");
    // Typing back to the saved text makes the document clean again
    harness.surface(tab).replace_text("a");
    harness.pump();

    let flips: Vec<bool> = harness
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            UiEvent::ModifiedChanged { tab: t, modified } if t == tab => Some(modified),
            _ => None,
        })
        .collect();
    assert_eq!(flips, vec![true, false]);
}

#[test]
fn test_closed_tab_ignores_late_surface_messages() {
    let mut harness = TabsTestHarness::new().unwrap();
    let tab = harness.new_tab();
    let surface = harness.surface(tab);
    harness.controller_mut().request_close(tab).unwrap();

    // A disposed surface posts nothing, and nothing routes to the closed tab
    surface.type_text("late");
    harness.pump();
    harness.assert_tab_count(0);
    assert!(surface.is_disposed());
}

fn modified_flips(events: Vec<UiEvent>, tab: TabId) -> Vec<bool> {
    events
        .into_iter()
        .filter_map(|e| match e {
            UiEvent::ModifiedChanged { tab: t, modified } if t == tab => Some(modified),
            _ => None,
        })
        .collect()
}

#[test]
fn test_host_replacement_reaches_surface_without_echo_edit() {
    for untagged_echoes in [false, true] {
        let mut harness = TabsTestHarness::with_options(HarnessOptions {
            untagged_echoes,
            ..HarnessOptions::default()
        })
        .unwrap();
        harness.write_file("a.ttl", "ex:a ex:b ex:c .");
        let tab = harness.open("a.ttl");
        harness.take_events();

        // Outside-the-surface reset to other text
        let modified = harness
            .controller_mut()
            .replace_content(tab, "ex:a ex:b ex:d .")
            .unwrap();
        assert!(modified);
        assert_eq!(harness.surface(tab).content(), "ex:a ex:b ex:d .");
        harness.assert_state(tab, TabState::Dirty);

        // Undo back to the saved text: clean again, and the echoes add nothing
        harness
            .controller_mut()
            .replace_content(tab, "ex:a ex:b ex:c .")
            .unwrap();
        harness.pump();
        assert_eq!(harness.surface(tab).content(), "ex:a ex:b ex:c .");
        assert_eq!(harness.content(tab), "ex:a ex:b ex:c .");
        harness.assert_state(tab, TabState::Clean);
        assert_eq!(modified_flips(harness.take_events(), tab), vec![true, false]);

        // The user keeps editing on top of the replaced text
        harness.type_text("\n");
        harness.assert_state(tab, TabState::Dirty);
    }
}

#[test]
fn test_replace_content_of_closed_tab_is_rejected() {
    let mut harness = TabsTestHarness::new().unwrap();
    let tab = harness.new_tab();
    harness.controller_mut().request_close(tab).unwrap();
    assert!(matches!(
        harness.controller_mut().replace_content(tab, "x"),
        Err(ControllerError::UnknownTab(_))
    ));
}
