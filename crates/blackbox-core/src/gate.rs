//! Query-based transfer gate.
//!
//! Four checks guard Ethernet transmission from persisted logs: the marker
//! key must exist, it must match, the controller must grant permission, and
//! the queried timestamp must hit an index entry. Any failure returns its
//! class immediately; a success reads the record back from the NVMe backing
//! file, stages it in SBM, and drives the Ethernet MAC to completion.

use std::fs;
use std::io;

use log::{info, warn};
use serde::Serialize;

use crate::devices::EthernetMac;
use crate::map::{ETH_REGS_BASE, SBM_BASE};
use crate::pipeline::ETH_STAGE_OFFSET;
use crate::soc::Soc;

/// Transfer-gate failure classes, surfaced to the caller.
#[derive(Debug)]
pub enum TransferError {
    /// The marker-key file is absent.
    KeyMissing,
    /// The presented key does not match the expected key.
    BadKey,
    /// The controller denied permission.
    Denied,
    /// No log entry covers the requested timestamp.
    NotFound,
    /// The persisted record could not be read back.
    Storage(io::Error),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyMissing => write!(f, "marker key file not found"),
            Self::BadKey => write!(f, "invalid marker key"),
            Self::Denied => write!(f, "controller denied permission"),
            Self::NotFound => write!(f, "no data log found for the given timestamp"),
            Self::Storage(err) => write!(f, "persisted record unreadable: {err}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

/// Controller-permission oracle consulted before any transfer.
///
/// An external collaborator in the real system; the default mock grants
/// every request.
pub trait PermissionOracle {
    fn request_transfer(&mut self, timestamp: u64) -> bool;
}

/// The default oracle: permission is always granted.
pub struct AlwaysGrant;

impl PermissionOracle for AlwaysGrant {
    fn request_transfer(&mut self, _timestamp: u64) -> bool {
        info!("controller: transfer permission granted");
        true
    }
}

/// Summary of one successful gated transfer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TransferReceipt {
    /// The queried timestamp.
    pub timestamp: u64,
    /// Where the transmitted record lives in the backing file.
    pub file_offset: u64,
    /// Transmitted payload size in bytes.
    pub transmitted_bytes: u32,
    /// Virtual time at which the transmission completed.
    pub transmitted_at: u64,
}

impl Soc {
    /// Expected key: the first line of the marker-key file, trimmed.
    fn read_marker_key(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.config.marker_key_path).ok()?;
        Some(raw.lines().next().unwrap_or("").trim().to_string())
    }

    /// Run the gated query-to-transmit flow for `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns the failing check's [`TransferError`] class. A failed
    /// transfer leaves every counter and the index untouched.
    pub fn handle_transfer(
        &mut self,
        timestamp: u64,
        key: &str,
    ) -> Result<TransferReceipt, TransferError> {
        info!("[{} ns] transfer request for timestamp {timestamp}", self.now());
        self.apu.pending_queries += 1;
        let result = self.run_transfer(timestamp, key);
        self.apu.pending_queries -= 1;
        result
    }

    fn run_transfer(
        &mut self,
        timestamp: u64,
        key: &str,
    ) -> Result<TransferReceipt, TransferError> {
        let expected = self.read_marker_key().ok_or(TransferError::KeyMissing)?;
        if key != expected {
            warn!("transfer rejected: marker key mismatch");
            return Err(TransferError::BadKey);
        }

        if !self.permission.request_transfer(timestamp) {
            warn!("transfer rejected: controller denied permission");
            return Err(TransferError::Denied);
        }

        let entry = *self.index.lookup(timestamp).ok_or(TransferError::NotFound)?;
        info!(
            "transfer: record found at offset {} ({} bytes)",
            entry.file_offset, entry.compressed_size
        );

        let payload = self
            .nvme
            .read_at(entry.file_offset, entry.compressed_size as usize)
            .map_err(TransferError::Storage)?;

        // Stage in the dedicated SBM window and transmit.
        let stage_addr = SBM_BASE + ETH_STAGE_OFFSET;
        self.memory.write_bytes(stage_addr, &payload);
        self.bus_write(ETH_REGS_BASE + EthernetMac::TX_BUF_ADDR, stage_addr);
        self.bus_write(ETH_REGS_BASE + EthernetMac::TX_BUF_LEN, entry.compressed_size);
        self.bus_write(ETH_REGS_BASE + EthernetMac::CTRL, EthernetMac::CTRL_TX);

        while self.ethernet.is_busy() {
            if !self.process_next() {
                break;
            }
        }

        self.cloud_sync.update_watermark(self.now());
        let receipt = TransferReceipt {
            timestamp,
            file_offset: entry.file_offset,
            transmitted_bytes: entry.compressed_size,
            transmitted_at: self.now(),
        };
        self.add_marker(
            "Transfer",
            serde_json::json!({ "timestamp": timestamp, "bytes": entry.compressed_size }),
        );
        info!("[{} ns] transfer completed", self.now());
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soc::SocConfig;

    fn test_soc(dir: &tempfile::TempDir) -> Soc {
        let config = SocConfig {
            storage_path: dir.path().join("nvme_storage.bin"),
            cloud_backup_path: dir.path().join("cloud_log.bin"),
            marker_key_path: dir.path().join("marker.key"),
            ..Default::default()
        };
        Soc::new(config).unwrap()
    }

    fn write_key(dir: &tempfile::TempDir, key: &str) {
        std::fs::write(dir.path().join("marker.key"), format!("{key}\n")).unwrap();
    }

    struct DenyAll;

    impl PermissionOracle for DenyAll {
        fn request_transfer(&mut self, _timestamp: u64) -> bool {
            false
        }
    }

    #[test]
    fn test_missing_key_file_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        assert!(matches!(
            soc.handle_transfer(0, "SECRET_KEY_123"),
            Err(TransferError::KeyMissing)
        ));
    }

    #[test]
    fn test_wrong_key_is_rejected_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        write_key(&dir, "SECRET_KEY_123");

        soc.process_block(&[0xAAu8; 512]).unwrap();
        let err = soc.handle_transfer(0, "WRONG_KEY").unwrap_err();
        assert!(matches!(err, TransferError::BadKey));
        assert_eq!(soc.ethernet.packets_transmitted, 0);
    }

    #[test]
    fn test_denied_permission_stops_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        write_key(&dir, "SECRET_KEY_123");
        soc.set_permission_oracle(Box::new(DenyAll));

        soc.process_block(&[0xAAu8; 512]).unwrap();
        assert!(matches!(
            soc.handle_transfer(0, "SECRET_KEY_123"),
            Err(TransferError::Denied)
        ));
        assert_eq!(soc.ethernet.packets_transmitted, 0);
    }

    #[test]
    fn test_timestamp_outside_every_window_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        write_key(&dir, "SECRET_KEY_123");

        let receipt = soc.process_block(&[0xAAu8; 512]).unwrap();
        let err = soc
            .handle_transfer(receipt.completed_at + 1_000_000, "SECRET_KEY_123")
            .unwrap_err();
        assert!(matches!(err, TransferError::NotFound));
    }

    #[test]
    fn test_key_comparison_uses_first_line_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        std::fs::write(
            dir.path().join("marker.key"),
            "SECRET_KEY_123\r\nsecond line ignored\n",
        )
        .unwrap();

        soc.process_block(&[0xAAu8; 512]).unwrap();
        assert!(soc.handle_transfer(0, "SECRET_KEY_123").is_ok());
    }

    #[test]
    fn test_truncated_backing_file_reports_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        write_key(&dir, "SECRET_KEY_123");

        soc.process_block(&[0xAAu8; 512]).unwrap();
        // Truncate the backing file behind the controller's back.
        std::fs::write(dir.path().join("nvme_storage.bin"), b"").unwrap();

        let err = soc.handle_transfer(0, "SECRET_KEY_123").unwrap_err();
        assert!(matches!(err, TransferError::Storage(_)));
    }
}
