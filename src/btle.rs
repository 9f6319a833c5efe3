use std::collections::HashMap;
use std::pin::Pin;

use btleplug::api::{
    Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures::{Stream, StreamExt};
use stream_cancel::{Trigger, Valved};
use uuid::Uuid;

use crate::platform::{AdapterState, BlePlatform, DiscoverySink};
use crate::{DeviceRecord, Discovery, Error, Result, ScanConfig};

/// [`BlePlatform`] backed by the host Bluetooth stack through btleplug.
pub struct BtleplugPlatform {
    manager: Option<Manager>,
    adapter: Option<Adapter>,
    scan_stopper: Option<Trigger>,
}

impl BtleplugPlatform {
    /// Connect to the Bluetooth stack and pick the configured adapter.
    ///
    /// Never fails: a missing stack or adapter is reported later through
    /// [`supports_le`](BlePlatform::supports_le) and
    /// [`adapter_state`](BlePlatform::adapter_state).
    pub async fn new(config: &ScanConfig) -> Self {
        let manager = match Manager::new().await {
            Ok(manager) => manager,
            Err(e) => {
                log::warn!("Bluetooth LE is unavailable: {:?}", e);
                return Self {
                    manager: None,
                    adapter: None,
                    scan_stopper: None,
                };
            }
        };

        let adapter = match manager.adapters().await {
            Ok(mut adapters) if config.adapter_index < adapters.len() => {
                Some(adapters.swap_remove(config.adapter_index))
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not list Bluetooth adapters: {:?}", e);
                None
            }
        };

        log::trace!("Using adapter: {:?}", adapter);

        Self {
            manager: Some(manager),
            adapter,
            scan_stopper: None,
        }
    }
}

impl BlePlatform for BtleplugPlatform {
    type DeviceId = PeripheralId;

    fn supports_le(&self) -> bool {
        self.manager.is_some()
    }

    async fn adapter_state(&self) -> Result<AdapterState> {
        let Some(adapter) = self.adapter.as_ref() else {
            return Ok(AdapterState::Absent);
        };

        Ok(match adapter.adapter_state().await? {
            CentralState::PoweredOff => AdapterState::Disabled,
            // Some backends cannot tell; let the scan itself fail if the adapter is off.
            _ => AdapterState::Enabled,
        })
    }

    async fn start_scan(
        &mut self,
        services: Vec<Uuid>,
        sink: DiscoverySink<PeripheralId>,
    ) -> Result<()> {
        let adapter = self.adapter.clone().ok_or(Error::AdapterNotFound)?;

        let (stopper, events) = Valved::new(adapter.events().await?);
        adapter.start_scan(ScanFilter { services }).await?;

        // Replacing the stopper ends the listener of a previous scan.
        self.scan_stopper = Some(stopper);

        tokio::spawn(listen(adapter, events, sink));

        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        self.scan_stopper.take();

        if let Some(adapter) = self.adapter.as_ref() {
            adapter.stop_scan().await?;
        }

        Ok(())
    }
}

async fn listen(
    adapter: Adapter,
    mut events: Valved<Pin<Box<dyn Stream<Item = CentralEvent> + Send>>>,
    sink: DiscoverySink<PeripheralId>,
) {
    while let Some(event) = events.next().await {
        let Some(peripheral_id) = reported_peripheral(event) else {
            continue;
        };

        match discovery(&adapter, peripheral_id).await {
            Ok(discovery) => {
                if !sink.discovered(discovery) {
                    break;
                }
            }
            Err(e) => log::debug!("Could not read discovered device: {}", e),
        }
    }

    log::trace!("Discovery listener was stopped.");
}

/// The peripheral an event reports as seen.
///
/// A peripheral the adapter already knows from an earlier scan only produces
/// `DeviceUpdated`, so both events count as a sighting.
fn reported_peripheral(event: CentralEvent) -> Option<PeripheralId> {
    match event {
        CentralEvent::DeviceDiscovered(peripheral_id)
        | CentralEvent::DeviceUpdated(peripheral_id) => Some(peripheral_id),
        _ => None,
    }
}

async fn discovery(
    adapter: &Adapter,
    peripheral_id: PeripheralId,
) -> Result<Discovery<PeripheralId>> {
    let peripheral = adapter.peripheral(&peripheral_id).await?;
    let address = peripheral.address().to_string();

    let (name, rssi, manufacturer_data) = match peripheral.properties().await? {
        Some(props) => (props.local_name, props.rssi, props.manufacturer_data),
        None => (None, None, HashMap::new()),
    };

    Ok(Discovery {
        record: DeviceRecord::new(peripheral_id, name, address),
        rssi,
        manufacturer_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_state_changes_are_not_sightings() {
        assert!(reported_peripheral(CentralEvent::StateUpdate(CentralState::PoweredOn)).is_none());
        assert!(reported_peripheral(CentralEvent::StateUpdate(CentralState::PoweredOff)).is_none());
    }
}
