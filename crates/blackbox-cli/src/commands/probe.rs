//! Address-map validation probes.

use std::error::Error;

use blackbox_core::map::{DMA_REGS_BASE, DRAM_BASE, SBM_BASE};
use blackbox_core::{DmaChannel, Soc, SocConfig};

pub fn run() -> Result<(), Box<dyn Error>> {
    let mut soc = Soc::new(SocConfig::default())?;
    let mut failures = 0u32;

    let mut check = |label: &str, ok: bool| {
        println!("  {label:<44} {}", if ok { "PASS" } else { "FAIL" });
        if !ok {
            failures += 1;
        }
    };

    println!("Address map probes:");

    soc.bus_write(SBM_BASE, 0xDEAD_BEEF);
    check("SBM write/read (0xDEADBEEF)", soc.bus_read(SBM_BASE) == 0xDEAD_BEEF);

    soc.bus_write(DRAM_BASE, 0xCAFE_BABE);
    check("DRAM write/read (0xCAFEBABE)", soc.bus_read(DRAM_BASE) == 0xCAFE_BABE);

    let hole = 0x0300_0000;
    soc.bus_write(hole, 0x1234_5678);
    check("unmapped hole reads zero", soc.bus_read(hole) == 0);

    let ch0_status = DMA_REGS_BASE + DmaChannel::STATUS;
    check("DMA channel 0 status reads idle", soc.bus_read(ch0_status) == 0);

    check("NVMe backing file open", soc.nvme.has_storage());

    if failures > 0 {
        return Err(format!("{failures} probe(s) failed").into());
    }
    println!("All probes passed");
    Ok(())
}
