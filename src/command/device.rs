//! Device information queries, one field per request.

use super::ResponsePrefix;
use num_enum::{FromPrimitive, IntoPrimitive};

/// Selector for which piece of device information to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum InfoField {
    ProductModel = 0x01,
    HardwareRevision = 0x02,
    FirmwareRevision = 0x03,
    ManufactureDate = 0x04,
    MacAddress = 0x05,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl Default for InfoField {
    fn default() -> Self {
        InfoField::ProductModel
    }
}

/// Read one device-information field. The response payload is the raw
/// field value; text fields are ASCII, the MAC address is six raw bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceInfoCommand {
    pub field: InfoField,
    /// Printable rendering of the response value.
    pub value: Option<String>,
    pub raw: Vec<u8>,
    pub(crate) prefix: Option<ResponsePrefix>,
}

impl DeviceInfoCommand {
    pub fn build(&self) -> Vec<u8> {
        vec![self.field.into()]
    }

    pub fn decode(&mut self, data: &[u8]) {
        let Some((prefix, rest)) = ResponsePrefix::split(data) else {
            return;
        };
        self.prefix = Some(prefix);
        self.raw = rest.to_vec();
        if rest.is_empty() {
            return;
        }
        self.value = Some(match self.field {
            InfoField::MacAddress => rest
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
            _ => String::from_utf8_lossy(rest).into_owned(),
        });
    }
}
