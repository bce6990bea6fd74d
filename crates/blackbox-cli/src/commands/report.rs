//! Canned workload with a JSON statistics report.

use std::error::Error;

use blackbox_core::{Soc, SocConfig};

pub fn run(blocks: u32) -> Result<(), Box<dyn Error>> {
    let mut soc = Soc::new(SocConfig::default())?;

    for block in 0..blocks {
        let size = 8 * 1024 << (block % 3);
        let data = super::test_data("sensor", size);
        soc.process_block(&data)?;
    }

    println!("{}", serde_json::to_string_pretty(&soc.report())?);
    Ok(())
}
