//! Manufacturer record: the identity block broadcast in advertising and
//! returned by `WHOIS`.

use crate::config::DeviceIdentity;

/// `<company id, LE> ID=<id>;ORG=<org>;FW=<fw>`, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerRecord {
    company_id: u16,
    text: String,
}

impl ManufacturerRecord {
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self {
            company_id: identity.company_id,
            text: format!(
                "ID={};ORG={};FW={}",
                identity.device_id, identity.org, identity.firmware
            ),
        }
    }

    pub fn company_id(&self) -> u16 {
        self.company_id
    }

    /// The identity text alone, as sent in the `WHOIS` reply.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Company id (little-endian) followed by the text, as carried in the
    /// manufacturer-specific advertising field.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 + self.text.len());
        out.extend_from_slice(&self.company_id.to_le_bytes());
        out.extend_from_slice(self.text.as_bytes());
        out
    }
}
