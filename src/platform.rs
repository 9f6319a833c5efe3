use std::fmt::Debug;
use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::controller::Message;
use crate::{Discovery, Result};

/// Availability of the Bluetooth adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// There is no adapter to scan with.
    Absent,
    /// The adapter exists but is switched off.
    Disabled,
    Enabled,
}

/// The platform Bluetooth stack the controller scans with.
///
/// Discoveries are delivered through the [`DiscoverySink`] handed to
/// [`start_scan`](BlePlatform::start_scan), from whatever thread the platform uses.
pub trait BlePlatform {
    /// Handle that identifies a device. Records with equal handles are the same device.
    type DeviceId: Clone + PartialEq + Debug + Send + 'static;

    /// Whether the host has Bluetooth LE at all.
    fn supports_le(&self) -> bool;

    fn adapter_state(&self) -> impl Future<Output = Result<AdapterState>> + Send;

    /// Begin delivering discoveries to `sink`.
    fn start_scan(
        &mut self,
        services: Vec<Uuid>,
        sink: DiscoverySink<Self::DeviceId>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stop delivering discoveries. Calling this while not scanning is allowed.
    fn stop_scan(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Posts discoveries to the controller's inbox. Can be used from any thread.
#[derive(Debug)]
pub struct DiscoverySink<Id> {
    sender: UnboundedSender<Message<Id>>,
}

impl<Id> Clone for DiscoverySink<Id> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<Id> DiscoverySink<Id> {
    pub(crate) fn new(sender: UnboundedSender<Message<Id>>) -> Self {
        Self { sender }
    }

    /// Returns `false` once the controller is gone and nothing will receive discoveries.
    pub fn discovered(&self, discovery: impl Into<Discovery<Id>>) -> bool {
        self.sender
            .send(Message::Discovered(discovery.into()))
            .is_ok()
    }
}
