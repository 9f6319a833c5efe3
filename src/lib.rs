//! BLE device discovery for a device picker screen.
//!
//! A [`ScanController`] runs a platform scan for a fixed window (ten seconds
//! by default), collects every discovered device once into a [`DeviceList`]
//! and keeps a [`Screen`] informed: list and menu refreshes, user notices,
//! the enable-Bluetooth prompt and the hand-off of a selected device.
//!
//! ## Usage
//!
//! Here is an example that scans with the host Bluetooth stack and prints
//! every new row:
//!
//! ```rust,no_run
//! use lescan::{
//!     BtleplugPlatform, DeviceList, EnableReply, Error, Menu, ScanConfig, ScanController,
//!     Screen,
//! };
//! use btleplug::platform::PeripheralId;
//!
//! struct Printer;
//!
//! impl Screen<PeripheralId> for Printer {
//!     fn notify(&mut self, error: &Error) {
//!         eprintln!("{}", error);
//!     }
//!
//!     fn finish(&mut self) {}
//!
//!     fn refresh_menu(&mut self, _menu: Menu) {}
//!
//!     fn refresh_list(&mut self, devices: &DeviceList<PeripheralId>) {
//!         let last = devices.count().checked_sub(1);
//!         if let Some(row) = last.and_then(|index| devices.render_row(index, None)) {
//!             println!("{} {}", row.address, row.name);
//!         }
//!     }
//!
//!     fn request_enable(&mut self, reply: EnableReply<PeripheralId>) {
//!         reply.decline();
//!     }
//!
//!     fn open_device(&mut self, _name: Option<&str>, _address: &str) {}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     pretty_env_logger::init();
//!
//!     let config = ScanConfig::default();
//!     let platform = BtleplugPlatform::new(&config).await;
//!
//!     let mut controller = ScanController::new(platform, Printer, config);
//!     controller.handle().show();
//!     controller.run().await;
//! }
//!```

#![warn(clippy::all, future_incompatible, nonstandard_style, rust_2018_idioms)]

pub use btle::BtleplugPlatform;
pub use config::{ScanConfig, SCAN_PERIOD, UNKNOWN_DEVICE};
pub use controller::{
    ControllerHandle, Message, ScanController, ScanEvent, ScanState, StopReason,
};
pub use device::{DeviceRecord, Discovery};
pub use device_list::{DeviceList, RowView};
pub use error::{Error, Result};
pub use platform::{AdapterState, BlePlatform, DiscoverySink};
pub use screen::{EnableReply, Menu, MenuAction, Screen};

mod btle;
mod config;
mod controller;
mod device;
mod device_list;
mod error;
mod platform;
mod screen;
