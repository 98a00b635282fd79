//! Main-loop behaviour: telemetry gating, sensor failures, the waiting
//! blink and draining link events from the queue.

use std::sync::{Mutex, MutexGuard};

use super::mock_hw::{HwCall, LinkCall, Rig};

use dflux::app::acquisition::AcquisitionState;
use dflux::app::events::{AppEvent, LinkEvent};
use dflux::app::session::ConnectionState;
use dflux::error::SensorError;
use dflux::events::{self, Event};

const TICK_MS: u32 = 20;

// Tests that go through the process-wide event queue take this first.
static QUEUE_LOCK: Mutex<()> = Mutex::new(());

fn queue_guard() -> MutexGuard<'static, ()> {
    let guard = QUEUE_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    events::drain_events(|_| {});
    guard
}

#[test]
fn acquiring_and_connected_forwards_samples() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.line("START_ACQUISITION");
    rig.hw.push_sample(415.123, 21.5, 40.0);

    rig.tick(TICK_MS);

    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("DATA CO2=415.12;TMP=21.50;HUM=40.00\n")
    );
}

#[test]
fn no_sample_means_no_read() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.line("START_ACQUISITION");

    rig.tick(TICK_MS);

    assert_eq!(rig.hw.sensor_calls(), vec![HwCall::DataReady]);
    assert!(rig.link.sent().is_empty());
}

#[test]
fn idle_never_polls_sensor() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.hw.push_sample(500.0, 20.0, 50.0);

    for _ in 0..10 {
        rig.tick(TICK_MS);
    }
    assert!(rig.hw.sensor_calls().is_empty());
    assert_eq!(rig.service.tick_count(), 10);
}

#[test]
fn disconnect_while_acquiring_suppresses_data_until_reconnect() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.line("START_ACQUISITION");
    rig.disconnect(0x13);
    rig.hw.push_sample(600.0, 22.0, 45.0);

    rig.tick(TICK_MS);
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Acquiring);
    assert!(rig.link.sent().is_empty());
    assert!(rig.hw.sensor_calls().is_empty());

    rig.connect(2);
    rig.tick(TICK_MS);
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("DATA CO2=600.00;TMP=22.00;HUM=45.00\n")
    );
}

#[test]
fn sensor_failure_is_a_local_diagnostic_only() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.line("START_ACQUISITION");
    rig.hw.samples.push_back(Err(SensorError::CrcMismatch));

    rig.tick(TICK_MS);

    assert!(rig.link.sent().is_empty());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SensorReadFailed(SensorError::CrcMismatch))
    );
    // One read attempt per tick.
    assert_eq!(rig.hw.count(&HwCall::ReadMeasurement), 1);
}

#[test]
fn led_blinks_while_waiting_for_controller() {
    let mut rig = Rig::new();
    for _ in 0..50 {
        rig.tick(TICK_MS);
    }
    // 1 s of ticks: off at 260 ms, on at 520 ms, off at 780 ms.
    assert_eq!(rig.hw.led_writes(), vec![false, true, false]);
}

#[test]
fn led_stays_off_while_connected() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.hw.calls.clear();
    for _ in 0..100 {
        rig.tick(TICK_MS);
    }
    assert!(rig.hw.led_writes().is_empty());
}

#[test]
fn blink_resumes_after_disconnect() {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.disconnect(0x08);
    rig.hw.calls.clear();
    for _ in 0..50 {
        rig.tick(TICK_MS);
    }
    assert!(rig.hw.led_writes().contains(&true));
}

#[test]
fn queued_link_events_are_handled_in_order() {
    let _guard = queue_guard();
    let mut rig = Rig::new();

    for ev in [
        LinkEvent::Connected { handle: 4 },
        LinkEvent::received(b"START_ACQUISITION").unwrap(),
        LinkEvent::received(b"GET_ACQUISITION_STATE").unwrap(),
    ] {
        assert!(events::push_event(Event::Link(ev)));
    }

    events::drain_events(|event| match event {
        Event::Link(ev) => rig.event(ev),
    });

    assert_eq!(rig.link.sent(), vec!["ACQUISITION_STATE 1\n"]);
    assert_eq!(events::queue_len(), 0);
}

#[test]
fn disconnect_survives_a_burst_of_rx_lines() {
    let _guard = queue_guard();
    let mut rig = Rig::new();

    assert!(events::push_event(Event::Link(LinkEvent::Connected { handle: 1 })));
    for _ in 0..16 {
        events::push_event(Event::Link(
            LinkEvent::received(b"GET_SETTINGS").unwrap(),
        ));
    }
    assert!(events::push_event(Event::Link(LinkEvent::Disconnected {
        reason: 0x13
    })));

    let mut last = None;
    events::drain_events(|event| match event {
        Event::Link(ev) => {
            last = Some(ev.clone());
            rig.event(ev);
        }
    });

    assert_eq!(last, Some(LinkEvent::Disconnected { reason: 0x13 }));
    assert_eq!(rig.service.connection_state(), ConnectionState::Disconnected);
    assert_eq!(rig.link.calls.last(), Some(&LinkCall::StartAdvertising));
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::LinkDisconnected { reason: 0x13 })
    );
    assert_eq!(events::queue_len(), 0);
}
