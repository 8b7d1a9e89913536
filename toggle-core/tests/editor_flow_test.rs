//! Editor flow tests
//!
//! Exercises the full declare-then-enforce protocol through the public
//! surface: load a flagged request, verify the table, round-trip the
//! bytes, and filter the same bytes at send time.

use std::sync::Arc;

use message_engine::HttpHelpers;
use toggle_core::{MessageEditorTab, MessageListener, ToggleConfig, ToggleExtension};

fn extension() -> ToggleExtension {
    ToggleExtension::new(ToggleConfig::default(), Arc::new(HttpHelpers))
}

#[test]
fn test_flagged_request_editor_and_filter_agree() {
    let raw = b"GET /x?p=1&q=2 HTTP/1.1\r\nHost: example.com\r\nX-Toggle-Parameters: p\r\n\r\n";
    let ext = extension();

    // the editor shows two rows with p unchecked
    let mut tab = ext.create_editor_tab(true);
    tab.set_message(raw, true);
    let rows = tab.rows();
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].enabled);
    assert_eq!(rows[0].name, "p");
    assert!(rows[1].enabled);
    assert_eq!(rows[1].name, "q");

    // an untouched session reproduces the bytes
    assert_eq!(tab.message().unwrap(), raw.to_vec());
    assert!(!MessageEditorTab::is_modified(&tab));

    // the filter enforces what the header declares
    let mut outgoing = raw.to_vec();
    ext.listener().process_message(4, true, &mut outgoing);
    assert_eq!(
        outgoing,
        b"GET /x?q=2 HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec()
    );
}

#[test]
fn test_toggle_edit_survives_reanalysis() {
    let raw = b"GET /a?one=1&two=2&three=3 HTTP/1.1\r\nHost: h\r\n\r\n";
    let ext = extension();

    // operator unchecks two parameters
    let mut tab = ext.create_editor_tab(true);
    tab.set_message(raw, true);
    tab.set_enabled(0, false).unwrap();
    tab.set_enabled(2, false).unwrap();
    assert!(MessageEditorTab::is_modified(&tab));
    let flagged = tab.message().unwrap();

    // a second session, loaded later from the flagged bytes, sees the
    // same disabled set: state round-trips through the message alone
    let mut reloaded = ext.create_editor_tab(true);
    reloaded.set_message(&flagged, true);
    let names: Vec<(&str, bool)> = reloaded
        .rows()
        .iter()
        .map(|r| (r.name.as_str(), r.enabled))
        .collect();
    assert_eq!(
        names,
        vec![("one", false), ("two", true), ("three", false)]
    );

    // and the filter transmits only what stayed enabled
    let mut outgoing = flagged;
    ext.listener().process_message(4, true, &mut outgoing);
    assert_eq!(outgoing, b"GET /a?two=2 HTTP/1.1\r\nHost: h\r\n\r\n".to_vec());
}

#[test]
fn test_reenabling_restores_the_original_request() {
    let raw = b"GET /a?one=1&two=2 HTTP/1.1\r\nHost: h\r\n\r\n";
    let ext = extension();

    let mut tab = ext.create_editor_tab(true);
    tab.set_message(raw, true);
    tab.set_enabled(1, false).unwrap();
    let flagged = tab.message().unwrap();
    assert_ne!(flagged, raw.to_vec());

    let mut again = ext.create_editor_tab(true);
    again.set_message(&flagged, true);
    again.set_enabled(1, true).unwrap();
    assert_eq!(again.message().unwrap(), raw.to_vec());
}
