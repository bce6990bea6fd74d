//! NVMe storage controller model.
//!
//! Persistent storage is an append-only byte stream in a backing file; the
//! orchestrator's log index provides random-access lookup by timestamp. The
//! controller is the only writer of the file; the transfer gate reads it
//! back at recorded offsets.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, warn};

use crate::soc::Soc;

/// NVMe controller register block, counters, and backing file handle.
#[derive(Debug)]
pub struct NvmeController {
    pub ctrl: u32,
    pub status: u32,
    pub write_buf_addr: u32,
    pub write_buf_len: u32,
    pub bytes_written: u64,
    pub writes_completed: u32,
    storage: Option<File>,
}

impl NvmeController {
    pub const CTRL: u32 = 0x00;
    pub const STATUS: u32 = 0x04;
    pub const WRITE_BUF_ADDR: u32 = 0x08;
    pub const WRITE_BUF_LEN: u32 = 0x0C;

    pub const CTRL_WRITE: u32 = 1 << 0;

    /// Controller with an open backing file, or without one (writes drop).
    #[must_use]
    pub fn new(storage: Option<File>) -> Self {
        Self {
            ctrl: 0,
            status: 0,
            write_buf_addr: 0,
            write_buf_len: 0,
            bytes_written: 0,
            writes_completed: 0,
            storage,
        }
    }

    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    #[must_use]
    pub fn read_register(&self, offset: u32) -> u32 {
        match offset {
            Self::CTRL => self.ctrl,
            Self::STATUS => self.status,
            Self::WRITE_BUF_ADDR => self.write_buf_addr,
            Self::WRITE_BUF_LEN => self.write_buf_len,
            _ => 0,
        }
    }

    /// Record a register write. Returns `true` when the write requests a
    /// write command.
    pub fn write_register(&mut self, offset: u32, value: u32) -> bool {
        match offset {
            Self::CTRL => {
                self.ctrl = value;
                return value & Self::CTRL_WRITE != 0;
            }
            Self::WRITE_BUF_ADDR => self.write_buf_addr = value,
            Self::WRITE_BUF_LEN => self.write_buf_len = value,
            _ => {}
        }
        false
    }

    /// Append `data` to the backing file and flush.
    ///
    /// # Errors
    ///
    /// Returns an error when no backing file is open or the write fails.
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self
            .storage
            .as_mut()
            .ok_or_else(|| io::Error::other("no backing file"))?;
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        file.flush()?;
        self.bytes_written += data.len() as u64;
        self.writes_completed += 1;
        Ok(())
    }

    /// Read `len` bytes back from the backing file at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error when no backing file is open, the offset is past the
    /// end, or the read comes up short.
    pub fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let file = self
            .storage
            .as_mut()
            .ok_or_else(|| io::Error::other("no backing file"))?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

impl Soc {
    /// Execute a write command from the programmed registers.
    pub(crate) fn nvme_write_data(&mut self) {
        let addr = self.nvme.write_buf_addr;
        let len = self.nvme.write_buf_len as usize;

        let Some(data) = self.memory.read_bytes(addr, len) else {
            debug!(
                "[{} ns] nvme: write buffer 0x{addr:08X} unresolved, dropped",
                self.now()
            );
            return;
        };
        if !self.nvme.has_storage() {
            debug!("[{} ns] nvme: no backing file, write dropped", self.now());
            return;
        }

        let written = data.len();
        if let Err(err) = self.nvme.append(&data) {
            warn!("[{} ns] nvme: backing file write failed: {err}", self.now());
            return;
        }
        self.noc.nvme_path_bytes += written as u64;

        debug!(
            "[{} ns] nvme: wrote {written} bytes (total {})",
            self.now(),
            self.nvme.bytes_written
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp_storage(dir: &tempfile::TempDir) -> File {
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(dir.path().join("nvme_storage.bin"))
            .unwrap()
    }

    #[test]
    fn test_register_round_trip() {
        let mut nvme = NvmeController::new(None);
        nvme.write_register(NvmeController::WRITE_BUF_ADDR, 0x0400_0000);
        nvme.write_register(NvmeController::WRITE_BUF_LEN, 128);
        assert_eq!(
            nvme.read_register(NvmeController::WRITE_BUF_ADDR),
            0x0400_0000
        );
        assert_eq!(nvme.read_register(NvmeController::WRITE_BUF_LEN), 128);
        assert!(nvme.write_register(NvmeController::CTRL, NvmeController::CTRL_WRITE));
    }

    #[test]
    fn test_append_grows_file_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let mut nvme = NvmeController::new(Some(open_temp_storage(&dir)));

        nvme.append(&[1, 2, 3, 4]).unwrap();
        nvme.append(&[5, 6]).unwrap();

        assert_eq!(nvme.bytes_written, 6);
        assert_eq!(nvme.writes_completed, 2);
        let on_disk = std::fs::read(dir.path().join("nvme_storage.bin")).unwrap();
        assert_eq!(on_disk, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_read_at_returns_recorded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut nvme = NvmeController::new(Some(open_temp_storage(&dir)));

        nvme.append(b"first-record").unwrap();
        nvme.append(b"second").unwrap();

        assert_eq!(nvme.read_at(0, 12).unwrap(), b"first-record");
        assert_eq!(nvme.read_at(12, 6).unwrap(), b"second");
    }

    #[test]
    fn test_append_without_storage_fails() {
        let mut nvme = NvmeController::new(None);
        assert!(nvme.append(&[1]).is_err());
        assert_eq!(nvme.bytes_written, 0);
        assert_eq!(nvme.writes_completed, 0);
    }

    #[test]
    fn test_read_past_end_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut nvme = NvmeController::new(Some(open_temp_storage(&dir)));
        nvme.append(&[1, 2, 3]).unwrap();
        assert!(nvme.read_at(0, 8).is_err());
    }
}
