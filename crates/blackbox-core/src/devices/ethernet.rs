//! Ethernet MAC model.
//!
//! Transmission stages the payload on start and completes after a
//! configurable per-byte latency, like the other devices. At completion the
//! frame is appended to the local cloud-backup file and, when a remote
//! endpoint is configured, posted there as a binary blob. Delivery failures
//! are reported once and never retried.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, warn};

use crate::soc::{Completion, Soc};

/// Ethernet MAC register block, counters, and staged frame.
#[derive(Debug, Default)]
pub struct EthernetMac {
    pub ctrl: u32,
    pub status: u32,
    pub tx_buf_addr: u32,
    pub tx_buf_len: u32,
    pub bytes_transmitted: u64,
    pub packets_transmitted: u32,
    busy: bool,
    pending: Option<Vec<u8>>,
}

impl EthernetMac {
    pub const CTRL: u32 = 0x00;
    pub const STATUS: u32 = 0x04;
    pub const TX_BUF_ADDR: u32 = 0x08;
    pub const TX_BUF_LEN: u32 = 0x0C;

    pub const CTRL_TX: u32 = 1 << 0;
    pub const STATUS_BUSY: u32 = 1 << 0;
    pub const STATUS_DONE: u32 = 1 << 1;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn read_register(&self, offset: u32) -> u32 {
        match offset {
            Self::CTRL => self.ctrl,
            Self::STATUS => self.status,
            Self::TX_BUF_ADDR => self.tx_buf_addr,
            Self::TX_BUF_LEN => self.tx_buf_len,
            _ => 0,
        }
    }

    /// Record a register write. Returns `true` when the write requests a
    /// transmission.
    pub fn write_register(&mut self, offset: u32, value: u32) -> bool {
        match offset {
            Self::CTRL => {
                self.ctrl = value;
                return value & Self::CTRL_TX != 0;
            }
            Self::TX_BUF_ADDR => self.tx_buf_addr = value,
            Self::TX_BUF_LEN => self.tx_buf_len = value,
            _ => {}
        }
        false
    }

    fn begin(&mut self, payload: Vec<u8>) {
        self.pending = Some(payload);
        self.busy = true;
        self.status = (self.status & !Self::STATUS_DONE) | Self::STATUS_BUSY;
    }

    fn take_pending(&mut self) -> Option<Vec<u8>> {
        self.pending.take()
    }

    fn complete(&mut self) {
        self.busy = false;
        self.status = (self.status & !Self::STATUS_BUSY) | Self::STATUS_DONE;
    }
}

fn append_backup(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(data)
}

impl Soc {
    /// Stage a transmission from the programmed registers.
    pub(crate) fn start_ethernet_tx(&mut self) {
        if self.ethernet.is_busy() {
            debug!("[{} ns] ethernet: tx ignored while busy", self.now());
            return;
        }

        let addr = self.ethernet.tx_buf_addr;
        let len = self.ethernet.tx_buf_len as usize;
        let Some(payload) = self.memory.read_bytes(addr, len) else {
            debug!(
                "[{} ns] ethernet: tx buffer 0x{addr:08X} unresolved, dropped",
                self.now()
            );
            return;
        };

        let delay = payload.len() as u64 * self.config.eth_ns_per_byte;
        self.ethernet.begin(payload);
        self.queue.schedule(delay, Completion::Ethernet);
        debug!("[{} ns] ethernet: tx staged ({len} bytes)", self.now());
    }

    /// Deliver the staged frame: local cloud backup plus optional remote
    /// post. Counters advance only on successful delivery.
    pub(crate) fn finish_ethernet_tx(&mut self) {
        let Some(payload) = self.ethernet.take_pending() else {
            self.ethernet.complete();
            return;
        };

        let backup_ok = match append_backup(&self.config.cloud_backup_path, &payload) {
            Ok(()) => true,
            Err(err) => {
                warn!("[{} ns] ethernet: cloud backup append failed: {err}", self.now());
                false
            }
        };

        // With no remote endpoint the local backup is the delivery.
        let delivered = match &self.net {
            Some(client) => match client.send_data(&payload) {
                Ok(()) => true,
                Err(err) => {
                    warn!("[{} ns] ethernet: remote delivery failed: {err}", self.now());
                    false
                }
            },
            None => backup_ok,
        };

        if delivered {
            self.ethernet.bytes_transmitted += payload.len() as u64;
            self.ethernet.packets_transmitted += 1;
            self.noc.ethernet_path_bytes += payload.len() as u64;
            debug!(
                "[{} ns] ethernet: transmitted {} bytes (total {})",
                self.now(),
                payload.len(),
                self.ethernet.bytes_transmitted
            );
        }
        self.ethernet.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_round_trip() {
        let mut eth = EthernetMac::new();
        eth.write_register(EthernetMac::TX_BUF_ADDR, 0x0430_0000);
        eth.write_register(EthernetMac::TX_BUF_LEN, 64);
        assert_eq!(eth.read_register(EthernetMac::TX_BUF_ADDR), 0x0430_0000);
        assert_eq!(eth.read_register(EthernetMac::TX_BUF_LEN), 64);
        assert!(eth.write_register(EthernetMac::CTRL, EthernetMac::CTRL_TX));
        assert!(!eth.write_register(EthernetMac::CTRL, 0));
    }

    #[test]
    fn test_begin_and_complete_track_busy_done() {
        let mut eth = EthernetMac::new();
        eth.begin(vec![1, 2, 3]);
        assert!(eth.is_busy());
        assert_eq!(eth.status, EthernetMac::STATUS_BUSY);
        assert_eq!(eth.take_pending(), Some(vec![1, 2, 3]));
        eth.complete();
        assert!(!eth.is_busy());
        assert_eq!(eth.status, EthernetMac::STATUS_DONE);
    }

    #[test]
    fn test_append_backup_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud_log.bin");
        append_backup(&path, &[1, 2]).unwrap();
        append_backup(&path, &[3]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}
