use std::collections::HashMap;

/// A discovered device, as shown in the device list.
///
/// Two records are the same device when their platform handles are equal,
/// whatever their name or address say.
#[derive(Debug, Clone)]
pub struct DeviceRecord<Id> {
    pub(crate) id: Id,
    pub(crate) name: Option<String>,
    pub(crate) address: String,
}

impl<Id> DeviceRecord<Id> {
    pub fn new(id: Id, name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name,
            address: address.into(),
        }
    }

    /// Platform handle of the device
    #[inline]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Advertised local name, if any
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Hardware address
    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The advertised name, unless it is missing or empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name().filter(|name| !name.is_empty())
    }
}

impl<Id: PartialEq> PartialEq for DeviceRecord<Id> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Id: Eq> Eq for DeviceRecord<Id> {}

/// A single discovery callback from the platform.
#[derive(Debug, Clone)]
pub struct Discovery<Id> {
    pub record: DeviceRecord<Id>,
    /// Signal strength
    pub rssi: Option<i16>,
    /// Manufacturer specific advertisement data, keyed by company id
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

impl<Id> From<DeviceRecord<Id>> for Discovery<Id> {
    fn from(record: DeviceRecord<Id>) -> Self {
        Self {
            record,
            rssi: None,
            manufacturer_data: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_name_and_address() {
        let a = DeviceRecord::new(1, Some("Thermometer".into()), "AA:BB:CC:DD:EE:01");
        let b = DeviceRecord::new(1, None, "00:00:00:00:00:00");
        let c = DeviceRecord::new(2, Some("Thermometer".into()), "AA:BB:CC:DD:EE:01");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_name_has_no_display_name() {
        assert_eq!(DeviceRecord::new(1, Some(String::new()), "x").display_name(), None);
        assert_eq!(DeviceRecord::new(1, None, "x").display_name(), None);
        assert_eq!(
            DeviceRecord::new(1, Some("Lamp".into()), "x").display_name(),
            Some("Lamp")
        );
    }
}
