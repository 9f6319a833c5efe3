use std::pin::Pin;

use futures::{Stream, StreamExt};
use stream_cancel::{StreamExt as _, Trigger, Tripwire};
use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::BroadcastStream;

use crate::platform::{AdapterState, BlePlatform, DiscoverySink};
use crate::screen::{EnableReply, Menu, MenuAction, Screen};
use crate::{DeviceList, Discovery, Error, ScanConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

/// Why a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stopped from the menu
    Manual,
    /// The scan window elapsed
    WindowElapsed,
    /// The screen was hidden
    Hidden,
    /// A device was selected from the list
    Selected,
    /// The screen was closed
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started,
    Stopped(StopReason),
    /// A new device was appended to the list at the given row.
    DeviceAdded(usize),
}

/// Everything that can happen to the controller, in the order it is handled.
#[derive(Debug)]
pub enum Message<Id> {
    Shown,
    Hidden,
    Menu(MenuAction),
    RowSelected(usize),
    EnableOutcome(bool),
    Discovered(Discovery<Id>),
    /// The scan window of the given session has elapsed.
    ScanWindowElapsed(u64),
    Destroy,
}

/// Posts user and lifecycle input to a [`ScanController`].
///
/// Every method returns `false` if the controller is gone.
#[derive(Debug)]
pub struct ControllerHandle<Id> {
    sender: UnboundedSender<Message<Id>>,
}

impl<Id> Clone for ControllerHandle<Id> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<Id> ControllerHandle<Id> {
    pub fn send(&self, message: Message<Id>) -> bool {
        self.sender.send(message).is_ok()
    }

    pub fn show(&self) -> bool {
        self.send(Message::Shown)
    }

    pub fn hide(&self) -> bool {
        self.send(Message::Hidden)
    }

    pub fn menu(&self, action: MenuAction) -> bool {
        self.send(Message::Menu(action))
    }

    pub fn select_row(&self, index: usize) -> bool {
        self.send(Message::RowSelected(index))
    }

    pub fn destroy(&self) -> bool {
        self.send(Message::Destroy)
    }
}

/// Drives a scan screen: starts and stops platform scans, keeps the device
/// list and tells the [`Screen`] what to show.
///
/// All state lives in the task that calls [`run`](ScanController::run) (or
/// the individual operations). Platform callbacks and timers only post
/// messages into the controller's inbox.
pub struct ScanController<P: BlePlatform, S> {
    platform: P,
    screen: S,
    config: ScanConfig,
    state: ScanState,
    devices: DeviceList<P::DeviceId>,
    /// Incremented on each started scan, so stale window timers can be told apart
    generation: u64,
    /// Dropping this cancels the pending scan window timer
    stop_timer: Option<Trigger>,
    visible: bool,
    enable_pending: bool,
    finished: bool,
    sender: UnboundedSender<Message<P::DeviceId>>,
    inbox: UnboundedReceiver<Message<P::DeviceId>>,
    event_sender: broadcast::Sender<ScanEvent>,
    /// Dropping this ends every event stream
    event_streams_closer: Option<Trigger>,
    event_streams_closed: Tripwire,
}

impl<P, S> ScanController<P, S>
where
    P: BlePlatform,
    S: Screen<P::DeviceId>,
{
    pub fn new(platform: P, screen: S, config: ScanConfig) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        let (event_sender, _) = broadcast::channel(16);
        let (event_streams_closer, event_streams_closed) = Tripwire::new();

        Self {
            platform,
            screen,
            devices: DeviceList::new(config.unknown_device_label.clone()),
            config,
            state: ScanState::Idle,
            generation: 0,
            stop_timer: None,
            visible: false,
            enable_pending: false,
            finished: false,
            sender,
            inbox,
            event_sender,
            event_streams_closer: Some(event_streams_closer),
            event_streams_closed,
        }
    }

    pub fn handle(&self) -> ControllerHandle<P::DeviceId> {
        ControllerHandle {
            sender: self.sender.clone(),
        }
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[inline]
    pub fn menu(&self) -> Menu {
        Menu::for_state(self.state)
    }

    #[inline]
    pub fn devices(&self) -> &DeviceList<P::DeviceId> {
        &self.devices
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Create a new stream that receives scan events.
    ///
    /// The stream ends when the controller is destroyed or the screen finishes.
    /// Dropping it early releases everything it holds.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = ScanEvent> + Send>> {
        let receiver = self.event_sender.subscribe();

        Box::pin(
            BroadcastStream::new(receiver)
                .filter_map(|x| async move { x.ok() })
                .take_until_if(self.event_streams_closed.clone()),
        )
    }

    /// Check that scanning is possible at all. Closes the screen if it is not.
    pub async fn create(&mut self) {
        if !self.platform.supports_le() {
            self.fail(Error::LeNotSupported).await;
            return;
        }

        match self.platform.adapter_state().await {
            Ok(AdapterState::Absent) => self.fail(Error::AdapterNotFound).await,
            Ok(_) => log::trace!("Bluetooth LE is available"),
            Err(e) => self.fail(e).await,
        }
    }

    /// Handle messages until the screen is finished or destroyed.
    pub async fn run(&mut self) {
        self.create().await;

        while !self.finished {
            match self.inbox.recv().await {
                Some(message) => self.dispatch(message).await,
                None => break,
            }
        }

        log::info!("Scan controller was stopped.");
    }

    /// Handle every message that is already queued, without waiting for more.
    ///
    /// Returns the number of handled messages.
    pub async fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(message) = self.inbox.try_recv() {
            self.dispatch(message).await;
            handled += 1;
        }

        handled
    }

    pub async fn dispatch(&mut self, message: Message<P::DeviceId>) {
        if self.finished {
            log::trace!("Screen is finished, ignoring {:?}", message);
            return;
        }

        match message {
            Message::Shown => self.show().await,
            Message::Hidden => self.hide().await,
            Message::Menu(action) => self.menu_selected(action).await,
            Message::RowSelected(index) => self.select_row(index).await,
            Message::EnableOutcome(enabled) => self.enable_outcome(enabled).await,
            Message::Discovered(discovery) => self.on_device_discovered(discovery),
            Message::ScanWindowElapsed(generation) => self.scan_window_elapsed(generation).await,
            Message::Destroy => self.destroy().await,
        }
    }

    /// The screen became visible: start over with an empty list and scan.
    pub async fn show(&mut self) {
        self.visible = true;
        self.resume().await;
    }

    /// The screen was hidden: stop scanning and forget the devices.
    pub async fn hide(&mut self) {
        self.visible = false;
        self.stop(StopReason::Hidden).await;
        self.devices.clear();
        self.screen.refresh_list(&self.devices);
    }

    pub async fn menu_selected(&mut self, action: MenuAction) {
        match action {
            MenuAction::Scan => {
                self.devices.clear();
                self.screen.refresh_list(&self.devices);
                self.start_scan().await;
            }
            MenuAction::Stop => self.stop_scan().await,
        }
    }

    /// Open the device at `index`, stopping any running scan first.
    pub async fn select_row(&mut self, index: usize) {
        let Some(device) = self.devices.get_device(index).cloned() else {
            log::debug!("No device at row {}", index);
            return;
        };

        if self.state == ScanState::Scanning {
            self.stop(StopReason::Selected).await;
        }

        self.screen.open_device(device.name(), device.address());
    }

    pub async fn enable_outcome(&mut self, enabled: bool) {
        self.enable_pending = false;

        if !enabled {
            self.fail(Error::EnableDeclined).await;
        } else if self.visible {
            self.resume().await;
        }
    }

    /// Start a scan that stops by itself once the scan window elapses.
    pub async fn start_scan(&mut self) {
        if self.finished {
            return;
        }

        if self.state == ScanState::Scanning {
            log::info!("Scan is already running.");
            return;
        }

        self.generation = self.generation.wrapping_add(1);
        self.schedule_stop(self.generation);
        self.state = ScanState::Scanning;

        let sink = DiscoverySink::new(self.sender.clone());
        match self
            .platform
            .start_scan(self.config.services.clone(), sink)
            .await
        {
            Ok(()) => {
                log::info!("Scan started for {:?}", self.config.scan_period);
                self.event_sender.send(ScanEvent::Started).ok();
            }
            Err(e) => {
                log::warn!("Could not start the scan: {}", e);
                self.stop_timer.take();
                self.state = ScanState::Idle;
                self.screen.notify(&e);
            }
        }

        let menu = self.menu();
        self.screen.refresh_menu(menu);
    }

    pub async fn stop_scan(&mut self) {
        self.stop(StopReason::Manual).await;
    }

    /// Add a discovered device to the list. Discoveries that arrive while no
    /// scan is running are dropped.
    pub fn on_device_discovered(&mut self, discovery: Discovery<P::DeviceId>) {
        if self.state != ScanState::Scanning {
            log::trace!("Discovery after the scan ended: {:?}", discovery.record);
            return;
        }

        log::trace!(
            "Device discovered: {:?} (rssi {:?})",
            discovery.record,
            discovery.rssi
        );

        if let Some(index) = self.devices.add_device(discovery.record) {
            log::debug!("Found device at row {}", index);
            self.event_sender.send(ScanEvent::DeviceAdded(index)).ok();
        }

        self.screen.refresh_list(&self.devices);
    }

    async fn resume(&mut self) {
        if self.finished || self.enable_pending {
            return;
        }

        match self.platform.adapter_state().await {
            Ok(AdapterState::Enabled) => {}
            Ok(AdapterState::Disabled) => {
                log::info!("Bluetooth is disabled, asking to enable it");
                self.enable_pending = true;
                self.screen
                    .request_enable(EnableReply::new(self.sender.clone()));
                return;
            }
            Ok(AdapterState::Absent) => {
                self.fail(Error::AdapterNotFound).await;
                return;
            }
            Err(e) => {
                self.fail(e).await;
                return;
            }
        }

        self.devices = DeviceList::new(self.config.unknown_device_label.clone());
        self.screen.refresh_list(&self.devices);
        self.start_scan().await;
    }

    async fn scan_window_elapsed(&mut self, generation: u64) {
        if generation != self.generation || self.state != ScanState::Scanning {
            log::debug!("Ignoring scan window timer of an earlier scan");
            return;
        }

        self.stop(StopReason::WindowElapsed).await;
    }

    async fn stop(&mut self, reason: StopReason) {
        self.stop_timer.take();

        let was_scanning = self.state == ScanState::Scanning;
        self.state = ScanState::Idle;

        if let Err(e) = self.platform.stop_scan().await {
            log::warn!("Could not stop the scan: {}", e);
        }

        if was_scanning {
            log::info!("Scan stopped ({:?})", reason);
            self.event_sender.send(ScanEvent::Stopped(reason)).ok();
        }

        let menu = self.menu();
        self.screen.refresh_menu(menu);
    }

    fn schedule_stop(&mut self, generation: u64) {
        let (trigger, tripwire) = Tripwire::new();
        let sender = self.sender.clone();
        let period = self.config.scan_period;

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    sender.send(Message::ScanWindowElapsed(generation)).ok();
                }
                _ = tripwire => {
                    log::trace!("Scan window timer {} cancelled", generation);
                }
            }
        });

        // Replacing the trigger cancels the timer of any earlier scan.
        self.stop_timer = Some(trigger);
    }

    async fn fail(&mut self, error: Error) {
        log::warn!("Closing the scan screen: {}", error);
        self.screen.notify(&error);
        self.finish(StopReason::Finished).await;
        self.screen.finish();
    }

    async fn destroy(&mut self) {
        log::info!("Destroying the scan screen");
        self.finish(StopReason::Finished).await;
    }

    async fn finish(&mut self, reason: StopReason) {
        if self.state == ScanState::Scanning {
            self.stop(reason).await;
        }

        self.stop_timer.take();
        self.finished = true;
        self.event_streams_closer.take();
    }
}
