//! Single-block pipeline run.

use std::error::Error;

use blackbox_core::{Soc, SocConfig};

pub fn run(size: usize, pattern: &str, report: bool) -> Result<(), Box<dyn Error>> {
    let mut soc = Soc::new(SocConfig::default())?;
    let data = super::test_data(pattern, size);

    println!("Logging one {size}-byte block ({pattern} pattern)");
    let receipt = soc.process_block(&data)?;

    println!(
        "  compressed {} -> {} bytes ({:.1}%)",
        receipt.uncompressed_size,
        receipt.compressed_size,
        100.0 * f64::from(receipt.compressed_size) / f64::from(receipt.uncompressed_size)
    );
    println!(
        "  persisted at offset {} ({} ns simulated)",
        receipt.file_offset, receipt.completed_at
    );
    println!(
        "  index window: [{} ns, {} ns]",
        receipt.started_at, receipt.completed_at
    );

    if report {
        soc.print_report();
    }
    Ok(())
}
