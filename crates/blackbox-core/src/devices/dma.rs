//! Multi-channel DMA engine with an optional fan-out tee.
//!
//! Four identical channels. A transfer clamps its length to what remains in
//! both the source and destination regions, copies synchronously, and models
//! latency by scheduling a completion ten nanoseconds per copied byte later.
//! The fan-out tee duplicates the copy to a second destination for the
//! dual-path pattern; a tee that fails to resolve is skipped, never fatal.

use log::{debug, warn};

use crate::soc::{Completion, Soc};

/// One DMA channel: register block plus busy/done state.
#[derive(Debug, Default)]
pub struct DmaChannel {
    pub ctrl: u32,
    pub status: u32,
    pub src: u32,
    pub dst: u32,
    pub length: u32,
    pub fanout_dst: u32,
    busy: bool,
    fanout_enabled: bool,
}

impl DmaChannel {
    pub const CTRL: u32 = 0x00;
    pub const STATUS: u32 = 0x04;
    pub const SRC: u32 = 0x08;
    pub const DST: u32 = 0x0C;
    pub const LENGTH: u32 = 0x10;
    pub const FANOUT_DST: u32 = 0x14;

    pub const CTRL_START: u32 = 1 << 0;
    pub const CTRL_FANOUT_EN: u32 = 1 << 4;
    pub const STATUS_BUSY: u32 = 1 << 0;
    pub const STATUS_DONE: u32 = 1 << 1;

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn fanout_enabled(&self) -> bool {
        self.fanout_enabled
    }

    #[must_use]
    pub fn read_register(&self, offset: u32) -> u32 {
        match offset {
            Self::CTRL => self.ctrl,
            Self::STATUS => self.status,
            Self::SRC => self.src,
            Self::DST => self.dst,
            Self::LENGTH => self.length,
            Self::FANOUT_DST => self.fanout_dst,
            _ => 0,
        }
    }

    /// Record a register write. Returns `true` when the write requests a
    /// start action.
    pub fn write_register(&mut self, offset: u32, value: u32) -> bool {
        match offset {
            Self::CTRL => {
                self.ctrl = value;
                self.fanout_enabled = value & Self::CTRL_FANOUT_EN != 0;
                return value & Self::CTRL_START != 0;
            }
            Self::SRC => self.src = value,
            Self::DST => self.dst = value,
            Self::LENGTH => self.length = value,
            Self::FANOUT_DST => self.fanout_dst = value,
            _ => {}
        }
        false
    }

    fn begin(&mut self) {
        self.busy = true;
        self.status = (self.status & !Self::STATUS_DONE) | Self::STATUS_BUSY;
    }

    pub(crate) fn complete(&mut self) {
        self.busy = false;
        self.status = (self.status & !Self::STATUS_BUSY) | Self::STATUS_DONE;
    }
}

/// Latency model: nanoseconds per copied byte.
const NS_PER_BYTE: u64 = 10;

/// The four-channel DMA engine.
#[derive(Debug, Default)]
pub struct DmaEngine {
    pub channels: [DmaChannel; 4],
}

impl DmaEngine {
    /// Byte stride between channel register blocks.
    pub const CHANNEL_STRIDE: u32 = 0x20;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Soc {
    /// Start a transfer on `channel` from its programmed registers.
    pub(crate) fn start_dma_transfer(&mut self, channel: usize) {
        let ch = &self.dma.channels[channel];
        if ch.is_busy() {
            debug!("[{} ns] dma ch{channel}: start ignored while busy", self.now());
            return;
        }

        let (src, dst, length) = (ch.src, ch.dst, ch.length);
        let src_rem = self.memory.remaining(src);
        let dst_rem = self.memory.remaining(dst);
        if self.memory.translate(src).is_none() || self.memory.translate(dst).is_none() {
            warn!(
                "[{} ns] dma ch{channel}: unresolved address (src=0x{src:08X} dst=0x{dst:08X})",
                self.now()
            );
            return;
        }

        let allowed = length.min(src_rem).min(dst_rem);
        if allowed == 0 {
            warn!("[{} ns] dma ch{channel}: nothing to transfer (allowed=0)", self.now());
            return;
        }
        if allowed < length {
            warn!(
                "[{} ns] dma ch{channel}: transfer truncated from {length} to {allowed} bytes",
                self.now()
            );
        }

        let data = self
            .memory
            .read_bytes(src, allowed as usize)
            .unwrap_or_default();
        self.memory.write_bytes(dst, &data);

        let ch = &self.dma.channels[channel];
        if ch.fanout_enabled() && ch.fanout_dst != 0 {
            let fanout_dst = ch.fanout_dst;
            let fanout_rem = self.memory.remaining(fanout_dst);
            let fanout_copy = allowed.min(fanout_rem) as usize;
            if fanout_copy > 0 {
                self.memory.write_bytes(fanout_dst, &data[..fanout_copy]);
                debug!(
                    "[{} ns] dma ch{channel}: fan-out copy to 0x{fanout_dst:08X} ({fanout_copy} bytes)",
                    self.now()
                );
            } else {
                debug!(
                    "[{} ns] dma ch{channel}: fan-out skipped (0x{fanout_dst:08X} unusable)",
                    self.now()
                );
            }
        }

        self.dma.channels[channel].begin();
        self.queue
            .schedule(allowed as u64 * NS_PER_BYTE, Completion::Dma { channel });

        self.noc.total_transactions += 1;
        self.noc.memory_accesses += allowed as u64;

        debug!(
            "[{} ns] dma ch{channel}: started (src=0x{src:08X} dst=0x{dst:08X} len={allowed})",
            self.now()
        );
    }

    pub(crate) fn finish_dma_transfer(&mut self, channel: usize) {
        self.dma.channels[channel].complete();
        debug!("[{} ns] dma ch{channel}: transfer complete", self.now());
    }
}
