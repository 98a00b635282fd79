//! Connection lifecycle: connect / disconnect side effects and the
//! outbound path's behaviour when no controller is attached.

use super::mock_hw::{HwCall, LinkCall, Rig};

use dflux::app::events::{AppEvent, LinkEvent};
use dflux::app::session::ConnectionState;
use dflux::config::{ConnParams, DeviceConfig};

#[test]
fn connect_requests_preferred_conn_params() {
    let mut rig = Rig::new();
    rig.connect(3);

    assert_eq!(
        rig.service.connection_state(),
        ConnectionState::Connected { handle: 3 }
    );
    assert_eq!(
        rig.link.calls,
        vec![LinkCall::UpdateConnParams(3, ConnParams::default())]
    );
    assert!(rig.sink.events.contains(&AppEvent::LinkConnected { handle: 3 }));
}

#[test]
fn connect_uses_configured_conn_params() {
    let params = ConnParams {
        min_interval: 40,
        max_interval: 80,
        latency: 2,
        supervision_timeout: 600,
    };
    let config = DeviceConfig {
        conn_params: params,
        ..Default::default()
    };
    let mut rig = Rig::with_config(&config);
    rig.connect(1);
    assert_eq!(rig.link.calls, vec![LinkCall::UpdateConnParams(1, params)]);
}

#[test]
fn connect_turns_status_led_off() {
    let mut rig = Rig::new();
    // Blink the LED on first.
    rig.tick(600);
    assert_eq!(rig.hw.led_writes(), vec![true]);

    rig.connect(1);
    assert_eq!(rig.hw.led_writes(), vec![true, false]);
}

#[test]
fn disconnect_restarts_advertising() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.link.clear();

    rig.disconnect(0x13);

    assert_eq!(rig.service.connection_state(), ConnectionState::Disconnected);
    assert_eq!(rig.link.calls, vec![LinkCall::StartAdvertising]);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::LinkDisconnected { reason: 0x13 })
    );
}

#[test]
fn disconnect_request_waits_for_link_report() {
    let mut rig = Rig::new();
    rig.connect(9);
    rig.line("DISCONNECT");
    assert_eq!(
        rig.service.connection_state(),
        ConnectionState::Connected { handle: 9 }
    );

    rig.disconnect(0x16);
    assert_eq!(rig.service.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn disconnect_command_without_connection_does_nothing() {
    let mut rig = Rig::new();
    rig.line("DISCONNECT");
    assert!(rig.link.calls.is_empty());
}

#[test]
fn replies_are_never_sent_while_disconnected() {
    let mut rig = Rig::new();
    for line in [
        "WHOIS",
        "GET_ACQUISITION_STATE",
        "GET_SETTINGS",
        "SET_SETTINGS offset=1;",
        "GET_HW_CALIBRATION_REF",
    ] {
        rig.line(line);
    }
    assert!(rig.link.sent().is_empty());
    // The write itself still happens.
    assert_eq!(rig.nvs.float("d-flux", "offset"), Some(1.0));
}

#[test]
fn notify_failure_is_not_retried() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.link.clear();
    rig.link.fail_notify = true;

    rig.line("WHOIS");
    rig.link.fail_notify = false;
    rig.line("GET_ACQUISITION_STATE");

    assert_eq!(rig.link.sent(), vec!["ACQUISITION_STATE 0\n"]);
}

#[test]
fn oversize_rx_write_is_rejected_before_dispatch() {
    let long = vec![b'A'; 513];
    assert!(LinkEvent::received(&long).is_none());
}

#[test]
fn reconnect_on_new_handle_replaces_old() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.connect(2);
    assert_eq!(
        rig.service.connection_state(),
        ConnectionState::Connected { handle: 2 }
    );
    rig.line("DISCONNECT");
    assert!(rig.link.calls.contains(&LinkCall::Disconnect(2)));
    assert!(!rig.link.calls.contains(&LinkCall::Disconnect(1)));
    // Connect alone never touches the sensor.
    assert!(rig.hw.sensor_calls().is_empty());
    assert_eq!(rig.hw.count(&HwCall::StartSpin), 0);
}
