//! Dual-path logging pipeline orchestration.
//!
//! One input block flows ingest → compress → DMA → persist → index. The
//! orchestrator drives every device through the bus and drains the event
//! kernel until the device it started goes idle; draining is the only wait
//! primitive. The log-index entry is appended only after the DMA stage
//! succeeds, so a failed block never leaves a dangling index row.

use log::info;
use serde::Serialize;

use crate::devices::dma::DmaEngine;
use crate::devices::{Compressor, DmaChannel, NvmeController};
use crate::index::LogIndexEntry;
use crate::map::{COMP_REGS_BASE, DMA_REGS_BASE, NVME_REGS_BASE, SBM_BASE};
use crate::soc::Soc;

/// SBM offset where the compressor writes its output.
pub const COMP_OUTPUT_OFFSET: u32 = 1024 * 1024;
/// SBM offset of the NVMe staging buffer.
pub const NVME_STAGE_OFFSET: u32 = 2 * 1024 * 1024;
/// SBM offset of the Ethernet staging buffer used by the transfer gate.
pub const ETH_STAGE_OFFSET: u32 = 3 * 1024 * 1024;

/// DMA channel reserved for staging compressed records toward NVMe.
const LOG_DMA_CHANNEL: usize = 2;
/// Compression level the pipeline programs.
const PIPELINE_LEVEL: u32 = 3;

/// A failed pipeline run. Statistics stay consistent: nothing is indexed or
/// persisted for a block that fails.
#[derive(Debug)]
pub enum PipelineError {
    /// The input block was empty.
    EmptyInput,
    /// The input block does not fit the SBM staging window.
    InputTooLarge { size: usize, limit: usize },
    /// The accelerator reported an error on start.
    CompressorFault,
    /// The DMA channel declined to start.
    DmaRejected,
    /// A device stayed busy with no pending completion.
    Stalled(&'static str),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input block is empty"),
            Self::InputTooLarge { size, limit } => {
                write!(f, "input block of {size} bytes exceeds the {limit}-byte staging window")
            }
            Self::CompressorFault => write!(f, "compression accelerator reported an error"),
            Self::DmaRejected => write!(f, "DMA channel declined the transfer"),
            Self::Stalled(device) => write!(f, "{device} busy with no pending completion"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Summary of one successfully logged block.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PipelineReceipt {
    pub started_at: u64,
    pub completed_at: u64,
    pub file_offset: u64,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl Soc {
    /// Run one input block through the dual-path logging pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] when any stage declines; no index entry
    /// or NVMe record is produced for a failed block.
    pub fn process_block(&mut self, input: &[u8]) -> Result<PipelineReceipt, PipelineError> {
        if input.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let limit = COMP_OUTPUT_OFFSET as usize;
        if input.len() > limit {
            return Err(PipelineError::InputTooLarge {
                size: input.len(),
                limit,
            });
        }

        let started_at = self.now();
        info!("[{started_at} ns] pipeline: logging {} bytes", input.len());

        // Stage the input at the bottom of SBM.
        self.memory.write_bytes(SBM_BASE, input);

        // Compress into the SBM output window.
        self.bus_write(COMP_REGS_BASE + Compressor::SRC, SBM_BASE);
        self.bus_write(COMP_REGS_BASE + Compressor::DST, SBM_BASE + COMP_OUTPUT_OFFSET);
        self.bus_write(COMP_REGS_BASE + Compressor::LENGTH, input.len() as u32);
        self.bus_write(COMP_REGS_BASE + Compressor::LEVEL, PIPELINE_LEVEL);
        self.bus_write(COMP_REGS_BASE + Compressor::CTRL, Compressor::CTRL_START);

        if self.compressor.status & Compressor::STATUS_ERROR != 0 {
            return Err(PipelineError::CompressorFault);
        }
        self.drain_while(|soc| soc.compressor.is_busy(), "compressor")?;

        let compressed_size = self.bus_read(COMP_REGS_BASE + Compressor::COMP_SIZE);

        // DMA the compressed record into the NVMe staging buffer.
        let ch_base = DMA_REGS_BASE + LOG_DMA_CHANNEL as u32 * DmaEngine::CHANNEL_STRIDE;
        self.bus_write(ch_base + DmaChannel::SRC, SBM_BASE + COMP_OUTPUT_OFFSET);
        self.bus_write(ch_base + DmaChannel::DST, SBM_BASE + NVME_STAGE_OFFSET);
        self.bus_write(ch_base + DmaChannel::LENGTH, compressed_size);
        self.bus_write(ch_base + DmaChannel::CTRL, DmaChannel::CTRL_START);

        if !self.dma.channels[LOG_DMA_CHANNEL].is_busy() {
            return Err(PipelineError::DmaRejected);
        }
        self.drain_while(|soc| soc.dma.channels[LOG_DMA_CHANNEL].is_busy(), "dma")?;

        // Index first, then persist: the entry records where the record will
        // begin in the backing file.
        let file_offset = self.nvme.bytes_written;
        self.index.append(LogIndexEntry {
            timestamp_start: started_at,
            timestamp_end: self.now(),
            file_offset,
            compressed_size,
            uncompressed_size: input.len() as u32,
        });

        self.bus_write(
            NVME_REGS_BASE + NvmeController::WRITE_BUF_ADDR,
            SBM_BASE + NVME_STAGE_OFFSET,
        );
        self.bus_write(NVME_REGS_BASE + NvmeController::WRITE_BUF_LEN, compressed_size);
        self.bus_write(NVME_REGS_BASE + NvmeController::CTRL, NvmeController::CTRL_WRITE);

        let completed_at = self.now();
        info!("[{completed_at} ns] pipeline: local logging complete ({compressed_size} bytes persisted)");

        Ok(PipelineReceipt {
            started_at,
            completed_at,
            file_offset,
            compressed_size,
            uncompressed_size: input.len() as u32,
        })
    }

    /// Drain completions while `still_busy` holds.
    pub(crate) fn drain_while<F>(
        &mut self,
        still_busy: F,
        device: &'static str,
    ) -> Result<(), PipelineError>
    where
        F: Fn(&Soc) -> bool,
    {
        while still_busy(self) {
            if !self.process_next() {
                return Err(PipelineError::Stalled(device));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rle;
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

    #[test]
    fn test_single_block_yields_one_index_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);

        let input = vec![0xAAu8; 4096];
        let receipt = soc.process_block(&input).unwrap();

        assert_eq!(receipt.uncompressed_size, 4096);
        assert_eq!(receipt.compressed_size, 51);
        assert_eq!(receipt.file_offset, 0);
        assert!(receipt.started_at <= receipt.completed_at);

        assert_eq!(soc.index.len(), 1);
        let entry = soc.index.entries()[0];
        assert_eq!(entry.uncompressed_size, 4096);
        assert_eq!(entry.compressed_size, 51);
    }

    #[test]
    fn test_persisted_record_is_the_encoded_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);

        let input: Vec<u8> = (0..2048u32).map(|i| (i % 7) as u8).collect();
        let receipt = soc.process_block(&input).unwrap();

        let on_disk = std::fs::read(dir.path().join("nvme_storage.bin")).unwrap();
        assert_eq!(on_disk.len() as u32, receipt.compressed_size);
        assert_eq!(on_disk, rle::encode(&input));
    }

    #[test]
    fn test_blocks_append_at_increasing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);

        let first = soc.process_block(&[0x11u8; 1024]).unwrap();
        let second = soc.process_block(&[0x22u8; 1024]).unwrap();

        assert_eq!(first.file_offset, 0);
        assert_eq!(second.file_offset, u64::from(first.compressed_size));
        assert_eq!(soc.index.len(), 2);
        assert!(first.completed_at <= second.started_at);
    }

    #[test]
    fn test_pipeline_advances_virtual_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);

        let receipt = soc.process_block(&[0xAAu8; 4096]).unwrap();
        // Compression alone costs length * 100 * level.
        let comp_latency = 4096 * 100 * 3;
        let dma_latency = u64::from(receipt.compressed_size) * 10;
        assert_eq!(receipt.completed_at, comp_latency + dma_latency);
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        assert!(matches!(soc.process_block(&[]), Err(PipelineError::EmptyInput)));
        assert!(soc.index.is_empty());
        assert_eq!(soc.nvme.writes_completed, 0);
    }

    #[test]
    fn test_oversized_block_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        let input = vec![0u8; COMP_OUTPUT_OFFSET as usize + 1];
        assert!(matches!(
            soc.process_block(&input),
            Err(PipelineError::InputTooLarge { .. })
        ));
        assert!(soc.index.is_empty());
    }
}
