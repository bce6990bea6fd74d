//! Gated transfer request.
//!
//! The platform's index lives in memory, so the command first logs a warm-up
//! workload and then queries it.

use std::error::Error;

use blackbox_core::{Soc, SocConfig};

pub fn run(timestamp: u64, key: &str, blocks: u32) -> Result<(), Box<dyn Error>> {
    let mut soc = Soc::new(SocConfig::default())?;

    for block in 0..blocks {
        let data = super::test_data("sensor", 32 * 1024);
        let receipt = soc.process_block(&data)?;
        println!(
            "  block {:>2}: window [{} ns, {} ns], offset {}",
            block + 1,
            receipt.started_at,
            receipt.completed_at,
            receipt.file_offset
        );
    }

    println!("\nRequesting transfer for timestamp {timestamp} ns");
    match soc.handle_transfer(timestamp, key) {
        Ok(receipt) => {
            println!(
                "Transfer complete: {} bytes from offset {} at {} ns",
                receipt.transmitted_bytes, receipt.file_offset, receipt.transmitted_at
            );
            Ok(())
        }
        Err(err) => Err(format!("transfer failed: {err}").into()),
    }
}
