mod common;

use std::net::TcpListener;
use std::time::{Duration, Instant};

use calypso_config::CfgConsole;
use calypso_console::{Console, ConsoleError, ConsoleMode, TelnetConsole};
use calypso_core::debug::setup_logging_verbose;
use common::{Behaviour, FakeVty};

fn console_cfg(port: u16, read_timeout: Duration) -> CfgConsole {
    CfgConsole {
        host: "127.0.0.1".to_string(),
        port,
        read_timeout,
        ..CfgConsole::default()
    }
}

#[test]
fn test_exchange_and_round_trip() {
    setup_logging_verbose();
    let vty = FakeVty::start(Behaviour::Normal);
    let mut console = TelnetConsole::open(&console_cfg(vty.addr.port(), Duration::from_secs(5))).expect("connect");

    let reply = console.send("show subscriber id 5").unwrap();
    assert!(reply.contains("Extension: 1000"), "{reply:?}");
    // Echo is stripped, line endings normalized
    assert!(!reply.contains("show subscriber"));
    assert!(!reply.contains('\r'));

    let reply = console.send("subscriber id 5 extension 0912345").unwrap();
    assert_eq!(reply, "");
    let reply = console.send("show subscriber id 5").unwrap();
    assert!(reply.contains("Extension: 0912345"), "{reply:?}");

    let reply = console.send("show subscriber id 999").unwrap();
    assert!(reply.contains("No subscriber found for id 999"));

    console.close();
    let received = vty.finish();
    assert_eq!(received.last().map(String::as_str), Some("exit"));
    assert!(received.contains(&"subscriber id 5 extension 0912345".to_string()));
}

#[test]
fn test_privilege_switch() {
    let vty = FakeVty::start(Behaviour::Normal);
    let mut console = TelnetConsole::open(&console_cfg(vty.addr.port(), Duration::from_secs(5))).unwrap();
    assert_eq!(console.mode(), ConsoleMode::User);

    console.enable().unwrap();
    assert_eq!(console.mode(), ConsoleMode::Privileged);
    // Reply must end at the privileged prompt
    let reply = console.send("show subscriber id 5").unwrap();
    assert!(reply.contains("Extension: 1000"));

    console.disable().unwrap();
    assert_eq!(console.mode(), ConsoleMode::User);
    drop(console);

    let received = vty.finish();
    assert_eq!(received, vec!["enable", "show subscriber id 5", "disable", "exit"]);
}

#[test]
fn test_missing_prompt_times_out_with_partial_reply() {
    let vty = FakeVty::start(Behaviour::Mute);
    let mut console = TelnetConsole::open(&console_cfg(vty.addr.port(), Duration::from_millis(300))).unwrap();

    let start = Instant::now();
    let err = console.send("show subscriber id 5").unwrap_err();
    assert!(start.elapsed() < Duration::from_secs(5));
    match err {
        ConsoleError::Timeout { expected, partial } => {
            assert_eq!(expected, "OpenBSC> ");
            assert!(partial.contains("working..."), "{partial:?}");
        }
        other => panic!("unexpected error: {other}"),
    }
    console.close();
    vty.finish();
}

#[test]
fn test_output_after_prompt_is_kept_for_next_reply() {
    let vty = FakeVty::start(Behaviour::Notice);
    let mut console = TelnetConsole::open(&console_cfg(vty.addr.port(), Duration::from_secs(5))).expect("connect");

    let reply = console.send("show subscriber id 5").unwrap();
    assert!(reply.contains("OML link up"), "{reply:?}");
    assert!(reply.contains("Extension: 1000"), "{reply:?}");
    assert!(!reply.contains("show subscriber"), "{reply:?}");

    // Nothing left over once the notice was consumed
    let reply = console.send("show subscriber id 999").unwrap();
    assert!(!reply.contains("OML link up"), "{reply:?}");
    assert!(reply.contains("No subscriber found for id 999"));

    console.close();
    vty.finish();
}

#[test]
fn test_connect_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = TelnetConsole::open(&console_cfg(port, Duration::from_millis(300))).err().expect("must fail");
    assert!(matches!(err, ConsoleError::Connect { .. }), "{err}");
}

#[test]
fn test_multi_line_command_rejected() {
    let vty = FakeVty::start(Behaviour::Normal);
    let mut console = TelnetConsole::open(&console_cfg(vty.addr.port(), Duration::from_secs(5))).unwrap();
    assert!(matches!(console.send("show subscriber id 5\nenable"), Err(ConsoleError::MultiLine(_))));
    console.close();
    assert_eq!(vty.finish(), vec!["exit"]);
}
