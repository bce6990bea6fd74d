//! Cloud endpoint development server.

use std::error::Error;

pub fn run(port: u16) -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(blackbox_server::serve(port))?;
    Ok(())
}
