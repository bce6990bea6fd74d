//! Fixed 32-bit address map of the platform.
//!
//! Five memory regions and four MMIO register blocks partition the bus
//! address space. Regions never overlap; every legal address resolves to
//! exactly one region or one register block. Per-block register offsets and
//! control/status bits live with the device that owns them (see
//! [`crate::devices`]).

/// Boot ROM base address.
pub const BOOT_ROM_BASE: u32 = 0x0000_0000;
/// Boot ROM size (128 KiB).
pub const BOOT_ROM_SIZE: u32 = 128 * 1024;

/// Shared Buffer Memory base address. The orchestrator stages all pipeline
/// buffers here.
pub const SBM_BASE: u32 = 0x0400_0000;
/// Shared Buffer Memory size (4 MiB).
pub const SBM_SIZE: u32 = 4 * 1024 * 1024;

/// APU L2 cache base address.
pub const APU_L2_BASE: u32 = 0x0800_0000;
/// APU L2 cache size (1 MiB).
pub const APU_L2_SIZE: u32 = 1024 * 1024;

/// RPU tightly-coupled memory base address.
pub const RPU_TCM_BASE: u32 = 0x0810_0000;
/// RPU TCM size (64 KiB).
pub const RPU_TCM_SIZE: u32 = 64 * 1024;

/// DRAM base address.
pub const DRAM_BASE: u32 = 0x8000_0000;
/// DRAM size (512 MiB).
pub const DRAM_SIZE: u32 = 512 * 1024 * 1024;

/// Compression accelerator register block.
pub const COMP_REGS_BASE: u32 = 0xFF80_0000;
/// Compression accelerator register block span.
pub const COMP_REGS_SPAN: u32 = 0x1000;

/// DMA engine register block (four channels, stride 0x20).
pub const DMA_REGS_BASE: u32 = 0xFF81_0000;
/// DMA engine register block span.
pub const DMA_REGS_SPAN: u32 = 0x1000;

/// PCIe/NVMe controller register block.
pub const NVME_REGS_BASE: u32 = 0xFF90_0000;
/// NVMe register block span.
pub const NVME_REGS_SPAN: u32 = 0x10_0000;

/// Ethernet MAC register block.
pub const ETH_REGS_BASE: u32 = 0xFFA0_0000;
/// Ethernet MAC register block span.
pub const ETH_REGS_SPAN: u32 = 0x1_0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_do_not_overlap() {
        let regions = [
            (BOOT_ROM_BASE, BOOT_ROM_SIZE),
            (SBM_BASE, SBM_SIZE),
            (APU_L2_BASE, APU_L2_SIZE),
            (RPU_TCM_BASE, RPU_TCM_SIZE),
            (DRAM_BASE, DRAM_SIZE),
        ];
        for (i, &(base_a, size_a)) in regions.iter().enumerate() {
            for &(base_b, size_b) in regions.iter().skip(i + 1) {
                let a_end = base_a as u64 + size_a as u64;
                let b_end = base_b as u64 + size_b as u64;
                assert!(
                    a_end <= base_b as u64 || b_end <= base_a as u64,
                    "regions 0x{base_a:08X} and 0x{base_b:08X} overlap"
                );
            }
        }
    }

    #[test]
    fn test_mmio_blocks_outside_memory_regions() {
        for base in [COMP_REGS_BASE, DMA_REGS_BASE, NVME_REGS_BASE, ETH_REGS_BASE] {
            assert!(base as u64 >= DRAM_BASE as u64 + DRAM_SIZE as u64);
        }
    }
}
