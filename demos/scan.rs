//! Terminal device picker.
//!
//! Commands: `s` scans again, `x` stops the scan, a row number opens that
//! device, `y`/`n` answers the enable-Bluetooth prompt and `q` quits.

use std::sync::{Arc, Mutex};

use btleplug::platform::PeripheralId;
use lescan::{
    BtleplugPlatform, ControllerHandle, DeviceList, EnableReply, Error, Menu, MenuAction,
    RowView, ScanConfig, ScanController, Screen,
};
use tokio::io::{AsyncBufReadExt, BufReader};

type PendingReply = Arc<Mutex<Option<EnableReply<PeripheralId>>>>;

struct Terminal {
    pending_reply: PendingReply,
    rows: Vec<RowView>,
}

impl Screen<PeripheralId> for Terminal {
    fn notify(&mut self, error: &Error) {
        eprintln!("! {}", error);
    }

    fn finish(&mut self) {
        println!("Bye.");
    }

    fn refresh_menu(&mut self, menu: Menu) {
        if menu.progress_visible {
            println!("[scanning... x to stop]");
        } else {
            println!("[idle, s to scan]");
        }
    }

    fn refresh_list(&mut self, devices: &DeviceList<PeripheralId>) {
        // Reuse the rows rendered last time.
        let printed = self.rows.len();
        let mut recycled = std::mem::take(&mut self.rows).into_iter();
        self.rows = (0..devices.count())
            .filter_map(|index| devices.render_row(index, recycled.next()))
            .collect();

        for (index, row) in new_rows(printed, &self.rows) {
            println!("{:>3}  {}  {}", index, row.address, row.name);
        }
    }

    fn request_enable(&mut self, reply: EnableReply<PeripheralId>) {
        println!("Bluetooth is off. Switch it on and answer y, or n to quit.");
        *self.pending_reply.lock().unwrap() = Some(reply);
    }

    fn open_device(&mut self, name: Option<&str>, address: &str) {
        println!("Selected {} ({})", name.unwrap_or("unnamed"), address);
    }
}

/// Rows past the ones already on the terminal. A shrunk list starts over.
fn new_rows(printed: usize, rows: &[RowView]) -> impl Iterator<Item = (usize, &RowView)> {
    let skip = if rows.len() < printed { 0 } else { printed };
    rows.iter().enumerate().skip(skip)
}

async fn read_commands(handle: ControllerHandle<PeripheralId>, pending_reply: PendingReply) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let sent = match line.trim() {
            "s" => handle.menu(MenuAction::Scan),
            "x" => handle.menu(MenuAction::Stop),
            "q" => handle.destroy(),
            answer @ ("y" | "n") => {
                if let Some(reply) = pending_reply.lock().unwrap().take() {
                    if answer == "y" {
                        reply.accept();
                    } else {
                        reply.decline();
                    }
                }
                true
            }
            other => match other.parse() {
                Ok(index) => handle.select_row(index),
                Err(_) => {
                    eprintln!("Unknown command: {}", other);
                    true
                }
            },
        };

        if !sent {
            break;
        }
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let config = ScanConfig::default();
    let platform = BtleplugPlatform::new(&config).await;

    let pending_reply = PendingReply::default();
    let screen = Terminal {
        pending_reply: pending_reply.clone(),
        rows: Vec::new(),
    };

    let mut controller = ScanController::new(platform, screen, config);
    let handle = controller.handle();

    tokio::spawn(read_commands(handle.clone(), pending_reply));

    handle.show();
    controller.run().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(count: usize) -> Vec<RowView> {
        (0..count)
            .map(|i| RowView {
                name: format!("device {}", i),
                address: format!("00:00:00:00:00:{:02X}", i),
            })
            .collect()
    }

    #[test]
    fn unchanged_list_prints_nothing() {
        assert_eq!(new_rows(2, &rows(2)).count(), 0);
    }

    #[test]
    fn grown_list_prints_only_the_new_rows() {
        let rows = rows(3);
        let indices: Vec<usize> = new_rows(1, &rows).map(|(index, _)| index).collect();

        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn cleared_list_prints_from_the_start() {
        let rows = rows(1);
        let indices: Vec<usize> = new_rows(4, &rows).map(|(index, _)| index).collect();

        assert_eq!(indices, vec![0]);
    }
}
