use std::borrow::Cow;

use crate::config::UNKNOWN_DEVICE;
use crate::DeviceRecord;

/// The two text fields of a device row.
///
/// Rows are meant to be handed back to [`DeviceList::render_row`] when they
/// scroll out of view, so their buffers are reused instead of reallocated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowView {
    pub name: String,
    pub address: String,
}

/// Devices found during a scan, in discovery order and without duplicates.
#[derive(Debug, Clone)]
pub struct DeviceList<Id> {
    devices: Vec<DeviceRecord<Id>>,
    unknown_device_label: Cow<'static, str>,
}

impl<Id> Default for DeviceList<Id> {
    fn default() -> Self {
        Self::new(Cow::Borrowed(UNKNOWN_DEVICE))
    }
}

impl<Id> DeviceList<Id> {
    pub fn new(unknown_device_label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            devices: Vec::new(),
            unknown_device_label: unknown_device_label.into(),
        }
    }

    #[inline]
    pub fn get_device(&self, index: usize) -> Option<&DeviceRecord<Id>> {
        self.devices.get(index)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.devices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Row ids are positional.
    #[inline]
    pub fn item_id(&self, index: usize) -> Option<u64> {
        (index < self.devices.len()).then_some(index as u64)
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord<Id>> {
        self.devices.iter()
    }

    /// Produce the row for the device at `index`.
    ///
    /// A `recycled` row is overwritten in place; otherwise a new one is built.
    /// Returns `None` if `index` is out of bounds.
    pub fn render_row(&self, index: usize, recycled: Option<RowView>) -> Option<RowView> {
        let device = self.devices.get(index)?;
        let mut row = recycled.unwrap_or_default();

        row.name.clear();
        row.name
            .push_str(device.display_name().unwrap_or(&self.unknown_device_label));

        row.address.clear();
        row.address.push_str(device.address());

        Some(row)
    }
}

impl<Id: PartialEq> DeviceList<Id> {
    /// Append the device unless one with the same identity is already listed.
    ///
    /// Returns the index of the new row, or `None` if the device was a duplicate.
    pub fn add_device(&mut self, device: DeviceRecord<Id>) -> Option<usize> {
        if self.devices.contains(&device) {
            return None;
        }

        self.devices.push(device);
        Some(self.devices.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, name: Option<&str>, address: &str) -> DeviceRecord<u32> {
        DeviceRecord::new(id, name.map(str::to_owned), address)
    }

    #[test]
    fn keeps_first_seen_order_without_duplicates() {
        let mut list = DeviceList::default();
        let a = record(1, Some("A"), "00:00:00:00:00:0A");
        let b = record(2, Some("B"), "00:00:00:00:00:0B");

        assert_eq!(list.add_device(a.clone()), Some(0));
        assert_eq!(list.add_device(b.clone()), Some(1));
        assert_eq!(list.add_device(a.clone()), None);

        assert_eq!(list.count(), 2);
        assert_eq!(list.get_device(0), Some(&a));
        assert_eq!(list.get_device(1), Some(&b));
    }

    #[test]
    fn duplicate_with_different_payload_is_ignored() {
        let mut list = DeviceList::default();

        list.add_device(record(7, None, "11:11:11:11:11:11"));
        list.add_device(record(7, Some("Renamed"), "22:22:22:22:22:22"));

        assert_eq!(list.count(), 1);
        let kept = list.get_device(0).unwrap();
        assert_eq!(kept.name(), None);
        assert_eq!(kept.address(), "11:11:11:11:11:11");
    }

    #[test]
    fn many_insertions_keep_distinct_ids_in_order() {
        let mut list = DeviceList::default();
        let ids = [5, 3, 5, 9, 3, 1, 9, 5, 2];

        for id in ids {
            list.add_device(record(id, None, "addr"));
        }

        let listed: Vec<u32> = list.iter().map(|d| *d.id()).collect();
        assert_eq!(listed, vec![5, 3, 9, 1, 2]);
    }

    #[test]
    fn clear_empties_the_list() {
        let mut list = DeviceList::default();
        list.add_device(record(1, None, "a"));
        list.add_device(record(2, None, "b"));

        list.clear();

        assert_eq!(list.count(), 0);
        assert!(list.is_empty());
        assert_eq!(list.get_device(0), None);
    }

    #[test]
    fn out_of_bounds_lookups_are_empty() {
        let mut list = DeviceList::default();
        list.add_device(record(1, None, "a"));

        assert!(list.get_device(1).is_none());
        assert!(list.render_row(1, None).is_none());
        assert_eq!(list.item_id(0), Some(0));
        assert_eq!(list.item_id(1), None);
    }

    #[test]
    fn rows_fall_back_to_unknown_label() {
        let mut list = DeviceList::default();
        list.add_device(record(1, None, "AA:AA:AA:AA:AA:AA"));
        list.add_device(record(2, Some(""), "BB:BB:BB:BB:BB:BB"));
        list.add_device(record(3, Some("Heart Rate"), "CC:CC:CC:CC:CC:CC"));

        let row = list.render_row(0, None).unwrap();
        assert_eq!(row.name, UNKNOWN_DEVICE);
        assert_eq!(row.address, "AA:AA:AA:AA:AA:AA");

        let row = list.render_row(1, None).unwrap();
        assert_eq!(row.name, UNKNOWN_DEVICE);
        assert_eq!(row.address, "BB:BB:BB:BB:BB:BB");

        let row = list.render_row(2, None).unwrap();
        assert_eq!(row.name, "Heart Rate");
        assert_eq!(row.address, "CC:CC:CC:CC:CC:CC");
    }

    #[test]
    fn custom_unknown_label() {
        let mut list = DeviceList::new("(no name)");
        list.add_device(record(1, None, "a"));

        assert_eq!(list.render_row(0, None).unwrap().name, "(no name)");
    }

    #[test]
    fn recycled_row_is_overwritten_in_place() {
        let mut list = DeviceList::default();
        list.add_device(record(1, Some("Short"), "AA"));

        let recycled = RowView {
            name: String::with_capacity(64),
            address: String::from("stale address that is long"),
        };
        let capacity = recycled.name.capacity();

        let row = list.render_row(0, Some(recycled)).unwrap();

        assert_eq!(row.name, "Short");
        assert_eq!(row.address, "AA");
        assert_eq!(row.name.capacity(), capacity);
    }
}
