//! Device models behind the MMIO blocks.
//!
//! Each device is a state object owning its register block, counters, and
//! busy/done state machine. Register access is pure: `write_register`
//! records the value and reports whether the write requested a start action,
//! which the platform executes on the same tick (it needs the memory fabric
//! and the event kernel, which the devices do not own). Completions arrive
//! as typed messages dispatched by [`crate::soc::Soc::process_next`].

pub mod compressor;
pub mod dma;
pub mod ethernet;
pub mod nvme;

pub use compressor::Compressor;
pub use dma::{DmaChannel, DmaEngine};
pub use ethernet::EthernetMac;
pub use nvme::NvmeController;
