//! BLE link adapter.
//!
//! Implements [`LinkPort`], the outbound half of the controller link,
//! on top of a Bluedroid GATT server.  Inbound traffic (connect,
//! disconnect, RX writes) never touches the adapter: the GATTS callback
//! turns it into [`LinkEvent`]s on the main-loop event queue.  Long
//! writes are reassembled in a [`PreparedWrite`] and queued as one line
//! when the central executes them.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation backend for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                    | Props                 |
//! |----------------|-----------------------------------------|-----------------------|
//! | RX (commands)  | `7B6B12CD-CA54-46A6-B3F4-3A848A3ED00B`  | Write, Write w/o rsp  |
//! | TX (replies)   | `907BAC5D-92ED-4D90-905E-A3A7B9899F21`  | Read, Notify          |
//!
//! No pairing, no encryption.

use log::info;

use crate::app::events::{LinkEvent, RxLine};
use crate::app::identity::ManufacturerRecord;
use crate::app::ports::{LinkError, LinkPort};
use crate::config::ConnParams;
use crate::error::Error;

#[cfg(target_os = "espidf")]
use log::{error, warn};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0xDB594551_159C_4DA8_B59E_1C98587348E1;
pub const CHAR_RX_UUID: u128 = 0x7B6B12CD_CA54_46A6_B3F4_3A848A3ED00B;
pub const CHAR_TX_UUID: u128 = 0x907BAC5D_92ED_4D90_905E_A3A7B9899F21;

/// Legacy advertising and scan response payload limit.
pub const MAX_ADV_LEN: usize = 31;

const AD_TYPE_COMPLETE_UUID128: u8 = 0x07;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
const AD_TYPE_MANUFACTURER: u8 = 0xFF;

pub type AdvPayload = heapless::Vec<u8, MAX_ADV_LEN>;

// ───────────────────────────────────────────────────────────────
// Advertising payloads
// ───────────────────────────────────────────────────────────────

fn push_ad(out: &mut AdvPayload, ad_type: u8, data: &[u8]) -> Result<(), Error> {
    let too_long = Error::Config("advertising payload exceeds 31 bytes");
    let len = u8::try_from(data.len() + 1).map_err(|_| too_long)?;
    out.push(len).map_err(|_| too_long)?;
    out.push(ad_type).map_err(|_| too_long)?;
    out.extend_from_slice(data).map_err(|_| too_long)
}

/// Advertising packet: the manufacturer record and nothing else.
pub fn build_adv_data(record: &ManufacturerRecord) -> Result<AdvPayload, Error> {
    let mut out = AdvPayload::new();
    push_ad(&mut out, AD_TYPE_MANUFACTURER, &record.bytes())?;
    Ok(out)
}

/// Scan response: the service UUID and the complete device name.
pub fn build_scan_response(service_uuid: u128, device_name: &str) -> Result<AdvPayload, Error> {
    let mut out = AdvPayload::new();
    push_ad(&mut out, AD_TYPE_COMPLETE_UUID128, &service_uuid.to_le_bytes())?;
    push_ad(&mut out, AD_TYPE_COMPLETE_NAME, device_name.as_bytes())?;
    Ok(out)
}

// ───────────────────────────────────────────────────────────────
// Prepared (long) writes
// ───────────────────────────────────────────────────────────────

/// Reassembly buffer for a queued long write to the RX characteristic.
///
/// Fragments arrive as prepare-write requests and become one command line
/// when the central executes the queue.  A fragment at the wrong offset,
/// or one that would overflow the line, discards the whole write.
#[derive(Debug, Default)]
pub struct PreparedWrite {
    buf: RxLine,
    broken: bool,
}

impl PreparedWrite {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            broken: false,
        }
    }

    /// Queue one fragment.  Returns `false` once the write is discarded.
    pub fn append(&mut self, offset: usize, data: &[u8]) -> bool {
        if self.broken {
            return false;
        }
        if offset != self.buf.len() || self.buf.extend_from_slice(data).is_err() {
            self.buf.clear();
            self.broken = true;
            return false;
        }
        true
    }

    /// Execute the queued write.  `None` if nothing valid was queued.
    pub fn commit(&mut self) -> Option<LinkEvent> {
        let broken = core::mem::take(&mut self.broken);
        let line = core::mem::take(&mut self.buf);
        if broken || line.is_empty() {
            return None;
        }
        Some(LinkEvent::Received(line))
    }

    pub fn cancel(&mut self) {
        self.buf.clear();
        self.broken = false;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Failed,
}

// ── ESP-IDF BLE static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_RX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_TX_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);
/// Bit 0: advertising data set, bit 1: scan response set.
#[cfg(target_os = "espidf")]
static BLE_ADV_CONFIG: AtomicU32 = AtomicU32::new(0);

// GATTS callbacks run in the Bluedroid task (not ISR), so std Mutex is safe.
#[cfg(target_os = "espidf")]
static BLE_REMOTE_BDA: std::sync::Mutex<[u8; 6]> = std::sync::Mutex::new([0; 6]);
#[cfg(target_os = "espidf")]
static BLE_ADV_DATA: std::sync::Mutex<AdvPayload> = std::sync::Mutex::new(heapless::Vec::new());
#[cfg(target_os = "espidf")]
static BLE_SCAN_RSP: std::sync::Mutex<AdvPayload> = std::sync::Mutex::new(heapless::Vec::new());
#[cfg(target_os = "espidf")]
static BLE_DEVICE_NAME: std::sync::Mutex<heapless::String<24>> =
    std::sync::Mutex::new(heapless::String::new());
#[cfg(target_os = "espidf")]
static BLE_PREP_WRITE: std::sync::Mutex<PreparedWrite> =
    std::sync::Mutex::new(PreparedWrite::new());

#[cfg(target_os = "espidf")]
const ADV_CONFIG_DONE: u32 = 0b11;

/// Largest TX attribute value.
#[cfg(target_os = "espidf")]
const TX_MAX_LEN: u16 = 512;

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        // SAFETY: remaining fields are plain integers / byte arrays.
        ..unsafe { core::mem::zeroed() }
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = uuid128_to_esp(uuid);
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            &mut control,
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_RAW_SET_COMPLETE_EVT => {
            if BLE_ADV_CONFIG.fetch_or(0b01, AtomicOrdering::AcqRel) | 0b01 == ADV_CONFIG_DONE {
                let mut params = adv_params();
                unsafe { esp_ble_gap_start_advertising(&mut params) };
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_RAW_SET_COMPLETE_EVT => {
            if BLE_ADV_CONFIG.fetch_or(0b10, AtomicOrdering::AcqRel) | 0b10 == ADV_CONFIG_DONE {
                let mut params = adv_params();
                unsafe { esp_ble_gap_start_advertising(&mut params) };
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE GAP: advertising started, waiting for controller");
            } else {
                log::error!("BLE GAP: advertising failed to start ({})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_UPDATE_CONN_PARAMS_EVT => {
            let p = unsafe { &(*param).update_conn_params };
            log::debug!(
                "BLE GAP: conn params int={} latency={} timeout={}",
                p.conn_int,
                p.latency,
                p.timeout
            );
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::{Event, push_event};
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            configure_advertising();
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            // service + RX (decl, value) + TX (decl, value, CCCD)
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            BLE_CHAR_STEP.store(1, AtomicOrdering::Relaxed);
            unsafe {
                add_gatt_char(
                    svc_handle,
                    CHAR_RX_UUID,
                    ESP_GATT_PERM_WRITE,
                    ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            match BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) {
                1 => {
                    BLE_RX_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: RX char (handle={})", handle);
                    BLE_CHAR_STEP.store(2, AtomicOrdering::Relaxed);
                    unsafe {
                        add_gatt_char(
                            svc_handle,
                            CHAR_TX_UUID,
                            ESP_GATT_PERM_READ,
                            ESP_GATT_CHAR_PROP_BIT_READ | ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                        );
                    }
                }
                2 => {
                    BLE_TX_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: TX char (handle={})", handle);
                    BLE_CHAR_STEP.store(3, AtomicOrdering::Relaxed);
                    let mut cccd_uuid = uuid16_to_esp(ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16);
                    let mut control = esp_attr_control_t {
                        auto_rsp: ESP_GATT_AUTO_RSP as u8,
                    };
                    unsafe {
                        esp_ble_gatts_add_char_descr(
                            svc_handle,
                            &mut cccd_uuid,
                            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                            core::ptr::null_mut(),
                            &mut control,
                        );
                    }
                }
                _ => {}
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            BLE_CHAR_STEP.store(4, AtomicOrdering::Relaxed);
            unsafe { esp_ble_gatts_start_service(svc_handle) };
            log::info!("BLE GATTS: service started");
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONN_ID.store(p.conn_id as u32, AtomicOrdering::Relaxed);
            BLE_CONNECTED.store(true, AtomicOrdering::Release);
            if let Ok(mut bda) = BLE_REMOTE_BDA.lock() {
                *bda = p.remote_bda;
            }
            push_event(Event::Link(LinkEvent::Connected { handle: p.conn_id }));
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            let p = unsafe { &(*param).disconnect };
            BLE_CONNECTED.store(false, AtomicOrdering::Release);
            push_event(Event::Link(LinkEvent::Disconnected {
                reason: p.reason as u16,
            }));
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.handle as u32 != BLE_RX_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                return;
            }
            let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
            if p.is_prep {
                let mut prep = BLE_PREP_WRITE.lock().unwrap_or_else(|e| e.into_inner());
                if !prep.append(p.offset as usize, data) {
                    log::warn!("BLE GATTS: discarding prepared RX write at offset {}", p.offset);
                }
                return;
            }
            match LinkEvent::received(data) {
                Some(ev) => {
                    push_event(Event::Link(ev));
                }
                None => log::warn!("BLE GATTS: dropping {}-byte RX write", data.len()),
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_EXEC_WRITE_EVT => {
            let flag = unsafe { (*param).exec_write.exec_write_flag } as u32;
            let mut prep = BLE_PREP_WRITE.lock().unwrap_or_else(|e| e.into_inner());
            if flag == ESP_GATT_PREP_WRITE_EXEC {
                match prep.commit() {
                    Some(ev) => {
                        push_event(Event::Link(ev));
                    }
                    None => log::warn!("BLE GATTS: executed write had no valid fragments"),
                }
            } else {
                prep.cancel();
            }
        }
        _ => {}
    }
}

/// Hand the prepared payloads to the stack.  Advertising starts from the
/// GAP callback once both are accepted.
#[cfg(target_os = "espidf")]
fn configure_advertising() {
    use esp_idf_svc::sys::*;
    BLE_ADV_CONFIG.store(0, AtomicOrdering::Release);
    if let Ok(name) = BLE_DEVICE_NAME.lock() {
        if let Ok(c_name) = std::ffi::CString::new(name.as_str()) {
            unsafe { esp_ble_gap_set_device_name(c_name.as_ptr()) };
        }
    }
    if let Ok(mut adv) = BLE_ADV_DATA.lock() {
        unsafe { esp_ble_gap_config_adv_data_raw(adv.as_mut_ptr(), adv.len() as u32) };
    }
    if let Ok(mut rsp) = BLE_SCAN_RSP.lock() {
        unsafe { esp_ble_gap_config_scan_rsp_data_raw(rsp.as_mut_ptr(), rsp.len() as u32) };
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    adv_data: AdvPayload,
    scan_rsp: AdvPayload,
    #[cfg(not(target_os = "espidf"))]
    sim_sent: Vec<Vec<u8>>,
    #[cfg(not(target_os = "espidf"))]
    sim_adv_starts: u32,
}

impl BleAdapter {
    /// Build the adapter and its advertising payloads.  Fails if either
    /// payload does not fit a legacy advertising packet.
    pub fn new(device_name: &str, record: &ManufacturerRecord) -> Result<Self, Error> {
        let mut name = heapless::String::<24>::new();
        name.push_str(device_name)
            .map_err(|_| Error::Config("device name longer than 24 bytes"))?;
        Ok(Self {
            state: BleState::Idle,
            adv_data: build_adv_data(record)?,
            scan_rsp: build_scan_response(SERVICE_UUID, device_name)?,
            device_name: name,
            #[cfg(not(target_os = "espidf"))]
            sim_sent: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_adv_starts: 0,
        })
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    /// Bring up the stack, register the GATT server and start advertising.
    pub fn start(&mut self) -> Result<(), LinkError> {
        info!("BLE: starting as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;

        if let Ok(mut adv) = BLE_ADV_DATA.lock() {
            *adv = self.adv_data.clone();
        }
        if let Ok(mut rsp) = BLE_SCAN_RSP.lock() {
            *rsp = self.scan_rsp.clone();
        }
        if let Ok(mut name) = BLE_DEVICE_NAME.lock() {
            *name = self.device_name.clone();
        }

        // SAFETY: one-shot stack bring-up from the main task before the
        // event loop starts.
        unsafe {
            // Release classic BT memory (BLE-only mode).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_init failed ({})", ret);
                return Err(LinkError::StackInitFailed);
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_enable failed ({})", ret);
                return Err(LinkError::StackInitFailed);
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_init failed ({})", ret);
                return Err(LinkError::StackInitFailed);
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_enable failed ({})", ret);
                return Err(LinkError::StackInitFailed);
            }

            // No pairing: the controller app connects without bonding.
            let auth_req = esp_ble_auth_req_t_ESP_LE_AUTH_NO_BOND;
            let iocap = esp_ble_io_cap_t_ESP_IO_CAP_NONE;
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_AUTHEN_REQ_MODE,
                &auth_req as *const _ as *mut _,
                core::mem::size_of_val(&auth_req) as u8,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_IOCAP_MODE,
                &iocap as *const _ as *mut _,
                core::mem::size_of_val(&iocap) as u8,
            );

            let ret = esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            if ret != ESP_OK as i32 {
                return Err(LinkError::StackInitFailed);
            }
            let ret = esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            if ret != ESP_OK as i32 {
                return Err(LinkError::StackInitFailed);
            }
            let ret = esp_ble_gatts_app_register(0);
            if ret != ESP_OK as i32 {
                return Err(LinkError::StackInitFailed);
            }
        }

        info!("BLE(espidf): Bluedroid stack initialized");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), LinkError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        self.sim_adv_starts += 1;
        Ok(())
    }

    /// Simulation: every payload notified so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[Vec<u8>] {
        &self.sim_sent
    }

    /// Simulation: number of times advertising was (re)started.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_adv_starts(&self) -> u32 {
        self.sim_adv_starts
    }

    pub fn adv_data(&self) -> &[u8] {
        &self.adv_data
    }

    pub fn scan_response(&self) -> &[u8] {
        &self.scan_rsp
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl LinkPort for BleAdapter {
    fn notify(&mut self, data: &[u8]) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;
        if data.len() > TX_MAX_LEN as usize {
            return Err(LinkError::MessageTooLong);
        }
        if !BLE_CONNECTED.load(AtomicOrdering::Acquire) {
            return Err(LinkError::NotifyFailed);
        }
        let handle = BLE_TX_CHAR_HANDLE.load(AtomicOrdering::Relaxed) as u16;
        let conn = BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16;
        let gatts_if = BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t;
        // SAFETY: `data` outlives both calls; the stack copies the value.
        let ret = unsafe {
            esp_ble_gatts_set_attr_value(handle, data.len() as u16, data.as_ptr());
            esp_ble_gatts_send_indicate(
                gatts_if,
                conn,
                handle,
                data.len() as u16,
                data.as_ptr() as *mut u8,
                false,
            )
        };
        if ret != ESP_OK as i32 {
            warn!("BLE: notify failed ({})", ret);
            return Err(LinkError::NotifyFailed);
        }
        Ok(())
    }

    fn update_conn_params(&mut self, _handle: u16, params: &ConnParams) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;
        let bda = match BLE_REMOTE_BDA.lock() {
            Ok(bda) => *bda,
            Err(_) => return Err(LinkError::ConnParamsRejected),
        };
        let mut req = esp_ble_conn_update_params_t {
            bda,
            min_int: params.min_interval,
            max_int: params.max_interval,
            latency: params.latency,
            timeout: params.supervision_timeout,
        };
        // SAFETY: `req` is a plain struct that outlives the call.
        let ret = unsafe { esp_ble_gap_update_conn_params(&mut req) };
        if ret != ESP_OK as i32 {
            return Err(LinkError::ConnParamsRejected);
        }
        Ok(())
    }

    fn disconnect(&mut self, handle: u16) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;
        let gatts_if = BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t;
        // SAFETY: closing a connection id reported by the stack.
        let ret = unsafe { esp_ble_gatts_close(gatts_if, handle) };
        if ret != ESP_OK as i32 {
            return Err(LinkError::DisconnectFailed);
        }
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::sys::*;
        let mut params = adv_params();
        // SAFETY: payloads were configured at registration time.
        let ret = unsafe { esp_ble_gap_start_advertising(&mut params) };
        if ret != ESP_OK as i32 {
            self.state = BleState::Failed;
            return Err(LinkError::AdvertisingFailed);
        }
        self.state = BleState::Advertising;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl LinkPort for BleAdapter {
    fn notify(&mut self, data: &[u8]) -> Result<(), LinkError> {
        info!("BLE(sim): notify {:?}", String::from_utf8_lossy(data));
        self.sim_sent.push(data.to_vec());
        Ok(())
    }

    fn update_conn_params(&mut self, handle: u16, params: &ConnParams) -> Result<(), LinkError> {
        info!("BLE(sim): conn params for {} -> {:?}", handle, params);
        Ok(())
    }

    fn disconnect(&mut self, handle: u16) -> Result<(), LinkError> {
        info!("BLE(sim): closing {}", handle);
        Ok(())
    }

    fn start_advertising(&mut self) -> Result<(), LinkError> {
        self.sim_adv_starts += 1;
        self.state = BleState::Advertising;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
