mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use calypso_config::NumberColumn;
use calypso_console::{Console, ConsoleError, ScriptedConsole};
use calypso_core::debug::setup_logging_verbose;
use calypso_core::{Extension, SubscriberId};
use calypso_hlr::fixtures::insert_subscriber;
use calypso_hlr::{HlrError, HlrResult, HlrStore};
use calypso_ops::{MsisdnChanger, MutationPath, MutationResult};
use common::FakeNitb;

fn id(n: u64) -> SubscriberId {
    SubscriberId::new(n).unwrap()
}

fn ext(s: &str) -> Extension {
    Extension::parse(s).unwrap()
}

fn store_with_subscriber_5() -> HlrResult<HlrStore> {
    let store = HlrStore::open_in_memory(NumberColumn::Extension)?;
    insert_subscriber(store.connection(), 5, "606011234567890", Some("1000"))?;
    Ok(store)
}

fn unreachable_store() -> HlrResult<HlrStore> {
    panic!("store path must not run")
}

#[test]
fn test_console_path_updates_and_syncs() {
    setup_logging_verbose();
    let nitb = FakeNitb::new().with_subscriber(5, "606011234567890", Some("1000"));
    let mut console = nitb.console();

    let changer = MsisdnChanger::default();
    let result = changer.run(Some(&mut console), unreachable_store, id(5), &ext("0912345"));

    assert_eq!(result, MutationResult::Updated);
    assert_eq!(result.status_line(id(5)), "Successfully updated MSISDN for Subscriber ID 5");
    assert_eq!(result.exit_code(), 0);
    assert_eq!(nitb.extension_of(5).as_deref(), Some("0912345"));
    assert_eq!(nitb.sent(), vec!["enable", "subscriber id 5 extension 0912345", "subscriber sync"]);
}

#[test]
fn test_console_not_found_short_circuits() {
    let nitb = FakeNitb::new();
    let mut console = nitb.console();

    let result = MsisdnChanger::default().run(Some(&mut console), unreachable_store, id(999), &ext("5555"));

    assert_eq!(result, MutationResult::NotFound);
    assert_eq!(result.status_line(id(999)), "No Subscriber found for id 999");
    assert_eq!(result.exit_code(), 0);
    // No sync after a miss
    assert_eq!(nitb.transcript().count_prefix("subscriber sync"), 0);
}

#[test]
fn test_store_path_when_console_unreachable() {
    let mut opened = None;
    let result = MsisdnChanger::default().run(
        None,
        || {
            let store = store_with_subscriber_5()?;
            opened = Some(());
            Ok(store)
        },
        id(5),
        &ext("0912345"),
    );
    assert_eq!(result, MutationResult::Updated);
    assert!(opened.is_some());
}

#[test]
fn test_store_path_read_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("hlr.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        calypso_hlr::fixtures::create_nitb_schema(&conn).unwrap();
        insert_subscriber(&conn, 5, "606011234567890", Some("1000")).unwrap();
    }

    let changer = MsisdnChanger::new(vec![MutationPath::Store]);
    let result = changer.run(None, || HlrStore::open(&path, NumberColumn::Extension), id(5), &ext("0912345"));
    assert_eq!(result, MutationResult::Updated);

    let store = HlrStore::open(&path, NumberColumn::Extension).unwrap();
    assert_eq!(store.subscriber(id(5)).unwrap().unwrap().number.as_deref(), Some("0912345"));

    let before = store.list_subscribers().unwrap();
    let result = changer.run(None, || HlrStore::open(&path, NumberColumn::Extension), id(999), &ext("5555"));
    assert_eq!(result, MutationResult::NotFound);
    assert_eq!(store.list_subscribers().unwrap(), before);
}

#[test]
fn test_silent_console_accepts_assignment() {
    let mut console = ScriptedConsole::silent();
    let result = MsisdnChanger::new(vec![MutationPath::Console]).run(Some(&mut console), unreachable_store, id(5), &ext("0912345"));

    assert_eq!(result, MutationResult::Updated);
    assert_eq!(console.sent(), vec!["enable", "subscriber id 5 extension 0912345", "subscriber sync"]);
}

#[test]
fn test_silent_console_skips_store_in_default_strategy() {
    let mut console = ScriptedConsole::silent();
    let result = MsisdnChanger::default().run(Some(&mut console), unreachable_store, id(5), &ext("0912345"));

    assert_eq!(result, MutationResult::Updated);
    assert_eq!(console.sent().last().map(String::as_str), Some("subscriber sync"));
}

#[test]
fn test_rejected_console_falls_back_to_store() {
    let mut console = ScriptedConsole::new(|line| {
        Ok(if line.starts_with("subscriber id") { "% Command incomplete.\n".to_string() } else { String::new() })
    });
    let result = MsisdnChanger::default().run(Some(&mut console), store_with_subscriber_5, id(5), &ext("0912345"));

    assert_eq!(result, MutationResult::Updated);
    // Sync still goes to the live console after a store update
    assert_eq!(console.sent().last().map(String::as_str), Some("subscriber sync"));
}

#[test]
fn test_console_only_reports_failure() {
    let mut console = ScriptedConsole::new(|_| Err(ConsoleError::Timeout {
        expected: "OpenBSC# ".to_string(),
        partial: String::new(),
    }));
    let changer = MsisdnChanger::new(vec![MutationPath::Console]);
    let result = changer.run(Some(&mut console), unreachable_store, id(5), &ext("0912345"));

    assert!(matches!(result, MutationResult::Failed(_)));
    assert_eq!(result.status_line(id(5)), "Failed to update MSISDN for Subscriber ID 5");
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn test_interrupt_stops_before_next_path() {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    // The operator interrupts while the console path is being rejected
    let mut console = ScriptedConsole::new(move |line| {
        if line.starts_with("subscriber id") {
            flag.store(true, Ordering::SeqCst);
            return Ok("% Command incomplete.\n".to_string());
        }
        Ok(String::new())
    });
    let changer = MsisdnChanger::default().with_stop_flag(stop);
    let result = changer.run(Some(&mut console), unreachable_store, id(5), &ext("0912345"));

    assert_eq!(result, MutationResult::Interrupted);
    assert_eq!(result.status_line(id(5)), "Operation cancelled by user");
    assert_eq!(result.exit_code(), 130);
    assert_eq!(console.transcript().count_prefix("subscriber sync"), 0);
}

#[test]
fn test_store_open_failure_is_failed() {
    let changer = MsisdnChanger::new(vec![MutationPath::Store]);
    let result = changer.run(
        None::<&mut dyn Console>,
        || Err(HlrError::Missing("/nonexistent/hlr.sqlite3".into())),
        id(5),
        &ext("0912345"),
    );
    assert!(matches!(result, MutationResult::Failed(reason) if reason.contains("not found")));
}
