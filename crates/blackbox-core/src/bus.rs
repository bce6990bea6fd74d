//! Bus/interconnect: address decode with device side effects.
//!
//! A single `read`/`write` pair decodes every bus address into either a live
//! device register access or a word access into the memory fabric. Control
//! register writes fire their device's start action on the same tick.
//! Unmapped reads return zero and unmapped writes are dropped. The NoC
//! counters account all bus traffic.

use serde::Serialize;

use crate::devices::dma::DmaEngine;
use crate::map::{
    COMP_REGS_BASE, COMP_REGS_SPAN, DMA_REGS_BASE, DMA_REGS_SPAN, ETH_REGS_BASE, ETH_REGS_SPAN,
    NVME_REGS_BASE, NVME_REGS_SPAN,
};
use crate::soc::Soc;

const COMP_REGS_END: u32 = COMP_REGS_BASE + COMP_REGS_SPAN - 1;
const DMA_REGS_END: u32 = DMA_REGS_BASE + DMA_REGS_SPAN - 1;
const NVME_REGS_END: u32 = NVME_REGS_BASE + NVME_REGS_SPAN - 1;
const ETH_REGS_END: u32 = ETH_REGS_BASE + ETH_REGS_SPAN - 1;

/// Network-on-chip traffic counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct NocStats {
    /// Bus transactions issued by bus masters (DMA transfers).
    pub total_transactions: u64,
    /// Bytes that travelled the NVMe persistence path.
    pub nvme_path_bytes: u64,
    /// Bytes that travelled the Ethernet delivery path.
    pub ethernet_path_bytes: u64,
    /// Bytes moved through the memory fabric.
    pub memory_accesses: u64,
}

impl Soc {
    /// Read a 32-bit word from the bus. MMIO reads return the live register
    /// value; memory reads are little-endian words; unmapped reads return
    /// zero.
    pub fn bus_read(&mut self, addr: u32) -> u32 {
        match addr {
            COMP_REGS_BASE..=COMP_REGS_END => {
                self.compressor.read_register(addr - COMP_REGS_BASE)
            }
            DMA_REGS_BASE..=DMA_REGS_END => {
                let offset = addr - DMA_REGS_BASE;
                let channel = (offset / DmaEngine::CHANNEL_STRIDE) as usize;
                match self.dma.channels.get(channel) {
                    Some(ch) => ch.read_register(offset % DmaEngine::CHANNEL_STRIDE),
                    None => 0,
                }
            }
            ETH_REGS_BASE..=ETH_REGS_END => self.ethernet.read_register(addr - ETH_REGS_BASE),
            NVME_REGS_BASE..=NVME_REGS_END => self.nvme.read_register(addr - NVME_REGS_BASE),
            _ => match self.memory.read_word(addr) {
                Some(word) => {
                    self.noc.memory_accesses += 4;
                    word
                }
                None => 0,
            },
        }
    }

    /// Write a 32-bit word to the bus. Control-register writes fire the
    /// device's start action on the same tick; unmapped writes are dropped.
    pub fn bus_write(&mut self, addr: u32, value: u32) {
        match addr {
            COMP_REGS_BASE..=COMP_REGS_END => {
                if self.compressor.write_register(addr - COMP_REGS_BASE, value) {
                    self.start_compression();
                }
            }
            DMA_REGS_BASE..=DMA_REGS_END => {
                let offset = addr - DMA_REGS_BASE;
                let channel = (offset / DmaEngine::CHANNEL_STRIDE) as usize;
                if channel < self.dma.channels.len()
                    && self.dma.channels[channel]
                        .write_register(offset % DmaEngine::CHANNEL_STRIDE, value)
                {
                    self.start_dma_transfer(channel);
                }
            }
            ETH_REGS_BASE..=ETH_REGS_END => {
                if self.ethernet.write_register(addr - ETH_REGS_BASE, value) {
                    self.start_ethernet_tx();
                }
            }
            NVME_REGS_BASE..=NVME_REGS_END => {
                if self.nvme.write_register(addr - NVME_REGS_BASE, value) {
                    self.nvme_write_data();
                }
            }
            _ => {
                if self.memory.write_word(addr, value) {
                    self.noc.memory_accesses += 4;
                }
            }
        }
    }
}
