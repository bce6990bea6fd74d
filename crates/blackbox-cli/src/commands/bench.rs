//! Pipeline benchmark across block sizes.

use std::error::Error;

use blackbox_core::{Soc, SocConfig};

const DEFAULT_SIZES: [usize; 4] = [4 * 1024, 16 * 1024, 64 * 1024, 256 * 1024];

pub fn run(sizes: Option<Vec<usize>>) -> Result<(), Box<dyn Error>> {
    let sizes = sizes.unwrap_or_else(|| DEFAULT_SIZES.to_vec());
    let mut soc = Soc::new(SocConfig::default())?;

    println!(
        "{:<12} {:>12} {:>12} {:>9} {:>12}",
        "Size", "Raw (bytes)", "Compressed", "Ratio", "Time (us)"
    );
    println!("{}", "-".repeat(62));

    for size in sizes {
        let data = super::test_data("sensor", size);
        let before = soc.now();
        let receipt = soc.process_block(&data)?;
        let elapsed_ns = soc.now() - before;

        println!(
            "{:<12} {:>12} {:>12} {:>8.2}% {:>12.2}",
            format_size(size),
            receipt.uncompressed_size,
            receipt.compressed_size,
            100.0 * f64::from(receipt.compressed_size) / f64::from(receipt.uncompressed_size),
            elapsed_ns as f64 / 1000.0
        );
    }
    Ok(())
}

fn format_size(bytes: usize) -> String {
    if bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{bytes} B")
    }
}
