use std::borrow::Cow;
use std::time::Duration;

use uuid::Uuid;

/// How long a scan runs before it is stopped automatically.
pub const SCAN_PERIOD: Duration = Duration::from_secs(10);

/// Text shown for devices that do not advertise a name.
pub const UNKNOWN_DEVICE: &str = "Unknown device";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Index of the Bluetooth adapter to use. The first found adapter is used by default.
    pub(crate) adapter_index: usize,
    /// The scan is stopped when this much time has passed since it was started.
    pub(crate) scan_period: Duration,
    /// Only devices advertising one of these services are reported. Empty means all.
    pub(crate) services: Vec<Uuid>,
    /// Row text for devices without a name.
    pub(crate) unknown_device_label: Cow<'static, str>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            scan_period: SCAN_PERIOD,
            services: Vec::new(),
            unknown_device_label: Cow::Borrowed(UNKNOWN_DEVICE),
        }
    }
}

impl ScanConfig {
    /// Index of bluetooth adapter to use
    pub fn adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Stop the scan after given duration
    pub fn stop_after_timeout(mut self, timeout: Duration) -> Self {
        self.scan_period = timeout;
        self
    }

    /// Only report devices that advertise at least one of the given services
    pub fn filter_by_services(mut self, services: Vec<Uuid>) -> Self {
        self.services = services;
        self
    }

    /// Text displayed in place of a missing device name
    pub fn unknown_device_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.unknown_device_label = label.into();
        self
    }
}
