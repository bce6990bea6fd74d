//! Compression accelerator model.
//!
//! On start the accelerator runs the run-length transform synchronously and
//! then models its latency by scheduling a completion `length · 100 · level`
//! nanoseconds later. `BUSY` and `DONE` are mutually exclusive; `ERROR`
//! reports an unresolvable source or destination.

use log::{debug, warn};

use crate::rle;
use crate::soc::{Completion, Soc};

/// Compression accelerator register block and internal state.
#[derive(Debug, Default)]
pub struct Compressor {
    pub ctrl: u32,
    pub status: u32,
    pub src: u32,
    pub dst: u32,
    pub length: u32,
    pub compressed_size: u32,
    pub level: u32,
    busy: bool,
}

impl Compressor {
    pub const CTRL: u32 = 0x00;
    pub const STATUS: u32 = 0x04;
    pub const SRC: u32 = 0x08;
    pub const DST: u32 = 0x0C;
    pub const LENGTH: u32 = 0x10;
    pub const COMP_SIZE: u32 = 0x14;
    pub const LEVEL: u32 = 0x18;

    pub const CTRL_START: u32 = 1 << 0;
    pub const STATUS_BUSY: u32 = 1 << 0;
    pub const STATUS_DONE: u32 = 1 << 1;
    pub const STATUS_ERROR: u32 = 1 << 2;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Live register value at `offset`; undefined offsets read as zero.
    #[must_use]
    pub fn read_register(&self, offset: u32) -> u32 {
        match offset {
            Self::CTRL => self.ctrl,
            Self::STATUS => self.status,
            Self::SRC => self.src,
            Self::DST => self.dst,
            Self::LENGTH => self.length,
            Self::COMP_SIZE => self.compressed_size,
            Self::LEVEL => self.level,
            _ => 0,
        }
    }

    /// Record a register write. Returns `true` when the write requests a
    /// start action.
    pub fn write_register(&mut self, offset: u32, value: u32) -> bool {
        match offset {
            Self::CTRL => {
                self.ctrl = value;
                return value & Self::CTRL_START != 0;
            }
            Self::SRC => self.src = value,
            Self::DST => self.dst = value,
            Self::LENGTH => self.length = value,
            Self::LEVEL => self.level = value,
            _ => {}
        }
        false
    }

    /// Completion latency for the programmed job.
    #[must_use]
    pub fn completion_delay(&self) -> u64 {
        self.length as u64 * 100 * self.level as u64
    }

    fn begin(&mut self) {
        self.busy = true;
        self.status = Self::STATUS_BUSY;
    }

    fn fault(&mut self) {
        self.busy = false;
        self.status = (self.status & !Self::STATUS_BUSY) | Self::STATUS_ERROR;
    }

    pub(crate) fn complete(&mut self) {
        self.busy = false;
        self.status = (self.status & !Self::STATUS_BUSY) | Self::STATUS_DONE;
    }
}

impl Soc {
    /// Start a compression job from the programmed registers.
    pub(crate) fn start_compression(&mut self) {
        if self.compressor.is_busy() {
            return;
        }

        let length = self.compressor.length as usize;
        let (src, dst) = (self.compressor.src, self.compressor.dst);

        let Some(input) = self.memory.read_bytes(src, length) else {
            warn!("[{} ns] compressor: source 0x{src:08X} unresolved", self.now());
            self.compressor.fault();
            return;
        };
        let encoded = rle::encode(&input);

        let dst_remaining = self.memory.remaining(dst) as usize;
        if self.memory.translate(dst).is_none() {
            warn!("[{} ns] compressor: destination 0x{dst:08X} unresolved", self.now());
            self.compressor.fault();
            return;
        }
        if encoded.len() > dst_remaining {
            warn!(
                "[{} ns] compressor: encoded stream ({} bytes) exceeds destination region",
                self.now(),
                encoded.len()
            );
            self.compressor.fault();
            return;
        }
        self.memory.write_bytes(dst, &encoded);

        self.compressor.compressed_size = encoded.len() as u32;
        self.compressor.begin();
        let delay = self.compressor.completion_delay();
        self.queue.schedule(delay, Completion::Compressor);

        debug!(
            "[{} ns] compressor: started (src=0x{:08X} dst=0x{:08X} len={} level={})",
            self.now(),
            self.compressor.src,
            self.compressor.dst,
            self.compressor.length,
            self.compressor.level
        );
    }

    pub(crate) fn finish_compression(&mut self) {
        self.compressor.complete();
        debug!(
            "[{} ns] compressor: done, {} -> {} bytes",
            self.now(),
            self.compressor.length,
            self.compressor.compressed_size
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_round_trip() {
        let mut comp = Compressor::new();
        comp.write_register(Compressor::SRC, 0x0400_0000);
        comp.write_register(Compressor::DST, 0x0410_0000);
        comp.write_register(Compressor::LENGTH, 512);
        comp.write_register(Compressor::LEVEL, 3);
        assert_eq!(comp.read_register(Compressor::SRC), 0x0400_0000);
        assert_eq!(comp.read_register(Compressor::DST), 0x0410_0000);
        assert_eq!(comp.read_register(Compressor::LENGTH), 512);
        assert_eq!(comp.read_register(Compressor::LEVEL), 3);
        assert_eq!(comp.read_register(0x40), 0);
    }

    #[test]
    fn test_ctrl_write_requests_start() {
        let mut comp = Compressor::new();
        assert!(comp.write_register(Compressor::CTRL, Compressor::CTRL_START));
        assert!(!comp.write_register(Compressor::CTRL, 0));
        assert!(!comp.write_register(Compressor::LENGTH, 64));
    }

    #[test]
    fn test_completion_delay_scales_with_length_and_level() {
        let mut comp = Compressor::new();
        comp.write_register(Compressor::LENGTH, 4096);
        comp.write_register(Compressor::LEVEL, 3);
        assert_eq!(comp.completion_delay(), 4096 * 100 * 3);
    }

    #[test]
    fn test_busy_and_done_are_mutually_exclusive() {
        let mut comp = Compressor::new();
        comp.begin();
        assert_eq!(comp.status & Compressor::STATUS_BUSY, Compressor::STATUS_BUSY);
        assert_eq!(comp.status & Compressor::STATUS_DONE, 0);
        comp.complete();
        assert_eq!(comp.status & Compressor::STATUS_BUSY, 0);
        assert_eq!(comp.status & Compressor::STATUS_DONE, Compressor::STATUS_DONE);
        assert!(!comp.is_busy());
    }

    #[test]
    fn test_fault_clears_busy_and_sets_error() {
        let mut comp = Compressor::new();
        comp.begin();
        comp.fault();
        assert!(!comp.is_busy());
        assert_eq!(comp.status & Compressor::STATUS_BUSY, 0);
        assert_eq!(
            comp.status & Compressor::STATUS_ERROR,
            Compressor::STATUS_ERROR
        );
    }
}
