//! # blackbox-core
//!
//! **A data-processing-unit you can hold in a unit test.**
//!
//! `blackbox-core` models a small flight-recorder SoC as a discrete-event
//! simulation: a memory-mapped address space, a compression accelerator, a
//! four-channel DMA engine, an NVMe-style storage controller, and an
//! Ethernet MAC, all driven over a single bus by a dual-path logging
//! orchestrator.
//!
//! ## Quick start
//!
//! ```no_run
//! use blackbox_core::{Soc, SocConfig};
//!
//! let mut soc = Soc::new(SocConfig::default()).unwrap();
//!
//! // Run one sensor block through compress -> DMA -> persist -> index.
//! let receipt = soc.process_block(&vec![0xAA; 4096]).unwrap();
//! assert_eq!(receipt.uncompressed_size, 4096);
//!
//! // Later, an authorized query replays the record over Ethernet.
//! let sent = soc.handle_transfer(receipt.started_at, "SECRET_KEY_123");
//! println!("transfer: {sent:?}");
//! ```
//!
//! ## Architecture
//!
//! Devices never run in parallel: apparent concurrency is modeled solely by
//! completion messages scheduled on a min-ordered event queue. A device
//! marks itself busy synchronously when started and goes idle only when the
//! orchestrator drains its completion. One [`Soc`] value owns all mutable
//! state, so the whole platform serializes through a single `&mut` path.

pub mod bus;
pub mod channels;
pub mod cores;
pub mod devices;
pub mod event;
pub mod gate;
pub mod index;
pub mod map;
pub mod memory;
pub mod net;
pub mod pipeline;
pub mod rle;
pub mod scenario;
pub mod soc;
pub mod telemetry;

pub use bus::NocStats;
pub use channels::{ChannelState, ChannelTable, SensorChannel};
pub use cores::{ApuCore, CloudSyncState, RpuCore};
pub use devices::{Compressor, DmaChannel, DmaEngine, EthernetMac, NvmeController};
pub use event::EventQueue;
pub use gate::{AlwaysGrant, PermissionOracle, TransferError, TransferReceipt};
pub use index::{EventMarker, LogIndex, LogIndexEntry};
pub use memory::MemoryFabric;
pub use net::{NetError, NetworkClient};
pub use pipeline::{PipelineError, PipelineReceipt};
pub use scenario::{DriveMode, DriveScenario};
pub use soc::{Completion, Soc, SocConfig, SocReport};
pub use telemetry::TelemetryPacket;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
