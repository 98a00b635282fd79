//! Command dispatch against mock adapters: every command in the table,
//! plus the silent-ignore paths.

use super::mock_hw::{HwCall, LinkCall, Rig};

use dflux::app::acquisition::AcquisitionState;
use dflux::app::events::AppEvent;
use dflux::config::DeviceConfig;

fn connected_rig() -> Rig {
    let mut rig = Rig::new();
    rig.connect(1);
    rig.link.clear();
    rig.hw.calls.clear();
    rig
}

// ── Acquisition ───────────────────────────────────────────────

#[test]
fn start_then_query_reports_acquiring() {
    let mut rig = connected_rig();

    rig.line("START_ACQUISITION");
    rig.line("GET_ACQUISITION_STATE");

    assert_eq!(rig.link.sent(), vec!["ACQUISITION_STATE 1\n"]);
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Acquiring);
    assert_eq!(rig.hw.count(&HwCall::StartSpin), 1);
}

#[test]
fn idle_state_is_reported_as_zero() {
    let mut rig = connected_rig();
    rig.line("GET_ACQUISITION_STATE");
    assert_eq!(rig.link.last_sent().as_deref(), Some("ACQUISITION_STATE 0\n"));
}

#[test]
fn repeated_start_spins_once() {
    let mut rig = connected_rig();
    rig.line("START_ACQUISITION");
    rig.line("START_ACQUISITION");
    assert_eq!(rig.hw.count(&HwCall::StartSpin), 1);
    let changes = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::AcquisitionChanged(_)))
        .count();
    assert_eq!(changes, 1);
}

#[test]
fn start_refused_by_actuator_stays_idle() {
    let mut rig = connected_rig();
    rig.hw.fail_spin = true;
    rig.line("START_ACQUISITION");
    rig.line("GET_ACQUISITION_STATE");

    assert_eq!(rig.hw.count(&HwCall::StartSpin), 1);
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Idle);
    assert_eq!(rig.link.sent(), vec!["ACQUISITION_STATE 0\n"]);
    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::AcquisitionChanged(_)))
    );

    // Nothing is spinning, so STOP does not touch the actuator.
    rig.line("STOP_ACQUISITION");
    assert_eq!(rig.hw.count(&HwCall::StopSpin), 0);

    rig.hw.fail_spin = false;
    rig.line("START_ACQUISITION");
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Acquiring);
}

#[test]
fn stop_while_idle_has_no_side_effect() {
    let mut rig = connected_rig();
    rig.line("STOP_ACQUISITION");
    assert_eq!(rig.hw.count(&HwCall::StopSpin), 0);
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Idle);
    assert!(rig.link.sent().is_empty());
}

#[test]
fn stop_after_start_stops_actuator() {
    let mut rig = connected_rig();
    rig.line("START_ACQUISITION");
    rig.line("STOP_ACQUISITION");
    assert_eq!(rig.hw.count(&HwCall::StopSpin), 1);
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Idle);
}

// ── Identity / link control ───────────────────────────────────

#[test]
fn whois_replies_with_manufacturer_text() {
    let mut rig = connected_rig();
    rig.line("WHOIS");
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("WHOIS ID=ESP32_01;ORG=INGV;FW=1.0\n")
    );
}

#[test]
fn disconnect_command_closes_current_handle() {
    let mut rig = Rig::new();
    rig.connect(7);
    rig.line("DISCONNECT");
    assert!(rig.link.calls.contains(&LinkCall::Disconnect(7)));
    assert!(rig.link.sent().is_empty());
}

// ── Settings ──────────────────────────────────────────────────

#[test]
fn get_settings_reports_defaults() {
    let mut rig = connected_rig();
    rig.line("GET_SETTINGS");
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("SETTINGS offset=0.00;multiplier=1.00;\n")
    );
}

#[test]
fn set_settings_persists_and_echoes() {
    let mut rig = connected_rig();
    rig.line("SET_SETTINGS offset=2.5;multiplier=1.1;");

    assert_eq!(rig.nvs.float("d-flux", "offset"), Some(2.5));
    assert_eq!(rig.nvs.float("d-flux", "multiplier"), Some(1.1));
    assert_eq!(
        rig.link.sent(),
        vec!["SETTINGS offset=2.50;multiplier=1.10;\n"]
    );
}

#[test]
fn set_settings_subset_leaves_other_keys() {
    let mut rig = connected_rig();
    rig.line("SET_SETTINGS multiplier=3");
    assert_eq!(rig.nvs.float("d-flux", "offset"), None);
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("SETTINGS offset=0.00;multiplier=3.00;\n")
    );
}

#[test]
fn set_settings_with_no_known_key_is_silent() {
    let mut rig = connected_rig();
    rig.line("SET_SETTINGS gain=4;");
    assert_eq!(rig.nvs.writes, 0);
    assert!(rig.link.sent().is_empty());
}

#[test]
fn set_settings_garbage_value_becomes_zero() {
    let mut rig = connected_rig();
    rig.line("SET_SETTINGS multiplier=abc;");
    assert_eq!(rig.nvs.float("d-flux", "multiplier"), Some(0.0));
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("SETTINGS offset=0.00;multiplier=0.00;\n")
    );
}

#[test]
fn failed_store_write_sends_nothing() {
    let mut rig = connected_rig();
    rig.nvs.fail_writes = true;
    rig.line("SET_SETTINGS offset=1;");
    assert!(rig.link.sent().is_empty());
}

#[test]
fn stored_values_survive_a_reconnect() {
    let mut rig = connected_rig();
    rig.line("SET_SETTINGS offset=-0.75;");
    rig.disconnect(0x13);
    rig.connect(2);
    rig.link.clear();
    rig.line("GET_SETTINGS");
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("SETTINGS offset=-0.75;multiplier=1.00;\n")
    );
}

#[test]
fn settings_live_in_the_configured_namespace() {
    let mut config = DeviceConfig::default();
    config.settings_namespace.clear();
    config.settings_namespace.push_str("dflux-lab").unwrap();
    config.identity.company_id = 0x02E5;

    let mut rig = Rig::with_config(&config);
    assert_eq!(rig.service.settings().namespace(), "dflux-lab");
    assert_eq!(rig.service.manufacturer_record().company_id(), 0x02E5);
    assert_eq!(&rig.service.manufacturer_record().bytes()[..2], &[0xE5, 0x02]);

    rig.connect(1);
    rig.line("SET_SETTINGS multiplier=3;");
    assert_eq!(rig.nvs.float("dflux-lab", "multiplier"), Some(3.0));
    assert_eq!(rig.nvs.float("d-flux", "multiplier"), None);
}

// ── Calibration ───────────────────────────────────────────────

#[test]
fn calibration_in_range_is_applied_and_reported() {
    let mut rig = connected_rig();
    rig.line("SET_HW_CALIBRATION_REF 800");

    assert_eq!(
        rig.hw.sensor_calls(),
        vec![HwCall::ForceRecalibration(800), HwCall::CalibrationReference]
    );
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("HW_CALIBRATION_REF 800\n")
    );
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::CalibrationApplied { reference_ppm: 800 })
    );
}

#[test]
fn calibration_out_of_range_is_ignored() {
    let mut rig = connected_rig();
    rig.line("SET_HW_CALIBRATION_REF 300");
    rig.line("SET_HW_CALIBRATION_REF 2001");
    rig.line("SET_HW_CALIBRATION_REF");
    rig.line("SET_HW_CALIBRATION_REF ppm");

    assert!(rig.hw.sensor_calls().is_empty());
    assert!(rig.link.sent().is_empty());
}

#[test]
fn calibration_bounds_are_inclusive() {
    let mut rig = connected_rig();
    rig.line("SET_HW_CALIBRATION_REF 400");
    rig.line("SET_HW_CALIBRATION_REF 2000");
    assert_eq!(
        rig.link.sent(),
        vec!["HW_CALIBRATION_REF 400\n", "HW_CALIBRATION_REF 2000\n"]
    );
}

#[test]
fn failed_recalibration_still_reports_reference() {
    let mut rig = connected_rig();
    rig.hw.calibration_ppm = 450;
    rig.hw.fail_recalibration = true;
    rig.line("SET_HW_CALIBRATION_REF 900");
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("HW_CALIBRATION_REF 450\n")
    );
}

#[test]
fn get_calibration_reads_sensor() {
    let mut rig = connected_rig();
    rig.hw.calibration_ppm = 612;
    rig.line("GET_HW_CALIBRATION_REF");
    assert_eq!(
        rig.link.last_sent().as_deref(),
        Some("HW_CALIBRATION_REF 612\n")
    );
}

// ── Framing ───────────────────────────────────────────────────

#[test]
fn unknown_and_empty_lines_are_ignored() {
    let mut rig = connected_rig();
    rig.line("");
    rig.line("   ");
    rig.line("whois");
    rig.line("REBOOT now");
    assert!(rig.link.sent().is_empty());
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn surrounding_whitespace_and_nul_are_stripped() {
    let mut rig = connected_rig();
    rig.line(" \tWHOIS\r\n");
    rig.line("GET_ACQUISITION_STATE\0junk");
    assert_eq!(
        rig.link.sent(),
        vec![
            "WHOIS ID=ESP32_01;ORG=INGV;FW=1.0\n".to_string(),
            "ACQUISITION_STATE 0\n".to_string(),
        ]
    );
}

#[test]
fn commands_while_disconnected_act_but_do_not_reply() {
    let mut rig = Rig::new();
    rig.line("START_ACQUISITION");
    rig.line("WHOIS");
    assert_eq!(rig.service.acquisition_state(), AcquisitionState::Acquiring);
    assert!(rig.link.sent().is_empty());
}
