//! End-to-end toggle flow across the workspace crates
//!
//! Drives the whole protocol the way an embedding host would: analyze,
//! edit, serialize, and filter one message through the public surfaces
//! of message-engine and toggle-core.

use std::sync::Arc;

use message_engine::{analyze_request, HttpHelpers, MessageHelpers, ParamKind};
use toggle_core::{MessageEditorTab, MessageListener, ToggleConfig, ToggleExtension};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn extension() -> ToggleExtension {
    ToggleExtension::new(ToggleConfig::default(), Arc::new(HttpHelpers))
}

#[test]
fn test_mixed_kind_request_full_cycle() {
    init_tracing();
    let raw = b"POST /checkout?promo=SAVE10 HTTP/1.1\r\nHost: shop.example\r\nCookie: sid=abc; ab=variant7\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 24\r\n\r\nitem=widget&qty=2&gift=1";
    let ext = extension();

    // the operator sees one row per parameter across all kinds
    let mut tab = ext.create_editor_tab(true);
    tab.set_message(raw, true);
    let kinds: Vec<ParamKind> = tab.rows().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ParamKind::Url,
            ParamKind::Cookie,
            ParamKind::Cookie,
            ParamKind::Body,
            ParamKind::Body,
            ParamKind::Body,
        ]
    );

    // disable the promo code, the A/B cookie, and the gift flag
    for (index, row) in tab.rows().to_vec().iter().enumerate() {
        if ["promo", "ab", "gift"].contains(&row.name.as_str()) {
            tab.set_enabled(index, false).unwrap();
        }
    }
    let flagged = tab.message().unwrap();
    let flagged_text = String::from_utf8(flagged.clone()).unwrap();
    assert!(flagged_text.contains("X-Toggle-Parameters: promo,ab,gift\r\n"));
    assert!(
        flagged_text.ends_with("item=widget&qty=2&gift=1"),
        "declaring intent must not touch the body"
    );

    // at send time the disabled parameters disappear for real
    let mut outgoing = flagged;
    ext.listener().process_message(4, true, &mut outgoing);
    let info = analyze_request(&outgoing).unwrap();
    let names: Vec<&str> = info.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["sid", "item", "qty"]);
    assert!(info.header_value("X-Toggle-Parameters").is_none());
    assert_eq!(&outgoing[info.body_offset..], b"item=widget&qty=2");
    assert_eq!(info.header_value("Content-Length"), Some("17"));
}

#[test]
fn test_flag_survives_independent_reanalysis() {
    init_tracing();
    let raw = b"GET /x?p=1&q=2 HTTP/1.1\r\nHost: h\r\n\r\n";
    let ext = extension();

    let mut tab = ext.create_editor_tab(true);
    tab.set_message(raw, true);
    tab.set_enabled(0, false).unwrap();
    let flagged = tab.message().unwrap();

    // the flagged message is an ordinary request to everyone else
    let helpers = HttpHelpers;
    let info = helpers.analyze(&flagged).unwrap();
    assert_eq!(info.parameters.len(), 2, "parameters stay in the message");

    // a completely fresh extension instance decodes the same intent
    let other = extension();
    let mut second_tab = other.create_editor_tab(true);
    second_tab.set_message(&flagged, true);
    assert!(!second_tab.rows()[0].enabled);

    let mut outgoing = flagged;
    other.listener().process_message(8, true, &mut outgoing);
    assert_eq!(outgoing, b"GET /x?q=2 HTTP/1.1\r\nHost: h\r\n\r\n".to_vec());
}

#[test]
fn test_json_request_end_to_end() -> anyhow::Result<()> {
    init_tracing();
    let body = br#"{"user":"bob","debug":true,"items":[1,2]}"#;
    let raw = [
        format!(
            "POST /api HTTP/1.1\r\nHost: h\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .as_bytes(),
        body.as_slice(),
    ]
    .concat();
    let ext = extension();

    let mut tab = ext.create_editor_tab(true);
    tab.set_message(&raw, true);
    let debug_row = tab
        .rows()
        .iter()
        .position(|r| r.name == "debug")
        .expect("debug key must be reported");
    tab.set_enabled(debug_row, false)?;

    let mut outgoing = tab.message()?;
    ext.listener().process_message(4, true, &mut outgoing);

    let info = analyze_request(&outgoing)?;
    let json: serde_json::Value = serde_json::from_slice(&outgoing[info.body_offset..])?;
    assert_eq!(json["user"], "bob");
    assert!(json.get("debug").is_none());
    assert_eq!(json["items"], serde_json::json!([1, 2]));
    Ok(())
}
