//! Bluetooth address derived from the ESP32 factory MAC.
//!
//! The BLE public address is the base MAC with 2 added to its last byte.
//! It is only logged at boot, for matching the device in a scanner.

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// `AA:BB:CC:DD:EE:FF`
pub type AddressString = heapless::String<17>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// BLE public address for a base MAC.
pub fn ble_address(mac: &MacAddress) -> MacAddress {
    let mut addr = *mac;
    addr[5] = addr[5].wrapping_add(2);
    addr
}

pub fn format_address(addr: &MacAddress) -> AddressString {
    use core::fmt::Write;
    let mut s = AddressString::new();
    let _ = write!(
        s,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        addr[0], addr[1], addr[2], addr[3], addr[4], addr[5]
    );
    s
}
