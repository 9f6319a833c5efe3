use tokio::sync::mpsc::UnboundedSender;

use crate::controller::Message;
use crate::{DeviceList, Error, ScanState};

/// The user-facing side of a scan: device list, menu, notices and navigation.
///
/// All methods are called from the task that runs the controller.
pub trait Screen<Id> {
    /// Show a short notice to the user.
    fn notify(&mut self, error: &Error);

    /// Close the screen. Nothing else is called afterwards, except list and menu refreshes
    /// while the scan is being torn down.
    fn finish(&mut self);

    fn refresh_menu(&mut self, menu: Menu);

    /// The device list changed. Rows are rendered with [`DeviceList::render_row`].
    fn refresh_list(&mut self, devices: &DeviceList<Id>);

    /// Ask the user to switch Bluetooth on. The answer is given through `reply`,
    /// at any later point. Dropping `reply` without answering counts as a refusal.
    fn request_enable(&mut self, reply: EnableReply<Id>);

    /// Hand the selected device over to the next screen.
    fn open_device(&mut self, name: Option<&str>, address: &str);
}

/// Visibility of the action menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    pub scan_visible: bool,
    pub stop_visible: bool,
    /// Indeterminate progress indicator
    pub progress_visible: bool,
}

impl Menu {
    pub fn for_state(state: ScanState) -> Self {
        let scanning = state == ScanState::Scanning;

        Self {
            scan_visible: !scanning,
            stop_visible: scanning,
            progress_visible: scanning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Scan,
    Stop,
}

/// Answer to [`Screen::request_enable`].
#[derive(Debug)]
pub struct EnableReply<Id> {
    sender: Option<UnboundedSender<Message<Id>>>,
}

impl<Id> EnableReply<Id> {
    pub(crate) fn new(sender: UnboundedSender<Message<Id>>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Bluetooth was switched on.
    pub fn accept(mut self) {
        self.send(true);
    }

    /// The user chose not to enable Bluetooth.
    pub fn decline(mut self) {
        self.send(false);
    }

    fn send(&mut self, enabled: bool) {
        if let Some(sender) = self.sender.take() {
            sender.send(Message::EnableOutcome(enabled)).ok();
        }
    }
}

impl<Id> Drop for EnableReply<Id> {
    fn drop(&mut self) {
        self.send(false);
    }
}
