//! The platform: memory, devices, event kernel, and orchestrator state.
//!
//! A single [`Soc`] value owns everything the simulation mutates, so all
//! state changes serialize through one `&mut` path with no locks and no
//! globals. Device completions travel through the event queue
//! as [`Completion`] messages; [`Soc::process_next`] pops the earliest one,
//! advances the virtual clock, and dispatches it to the owning device.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::bus::NocStats;
use crate::channels::{ChannelTable, SensorChannel};
use crate::cores::{ApuCore, CloudSyncState, RpuCore};
use crate::devices::{Compressor, DmaEngine, EthernetMac, NvmeController};
use crate::event::EventQueue;
use crate::gate::{AlwaysGrant, PermissionOracle};
use crate::index::{EventMarker, LogIndex};
use crate::net::NetworkClient;

/// Platform construction parameters.
#[derive(Debug, Clone)]
pub struct SocConfig {
    /// NVMe backing file; created (truncated) at init.
    pub storage_path: PathBuf,
    /// Local cloud-backup file the Ethernet MAC appends to.
    pub cloud_backup_path: PathBuf,
    /// Side-channel marker-key file; its first line is the expected
    /// transfer key.
    pub marker_key_path: PathBuf,
    /// Cloud backend base URL. `None` runs fully offline.
    pub remote_endpoint: Option<String>,
    /// Ethernet latency model, nanoseconds per transmitted byte.
    pub eth_ns_per_byte: u64,
    /// Placeholder sensor channels present at init.
    pub baseline_channels: u32,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("nvme_storage.bin"),
            cloud_backup_path: PathBuf::from("cloud_log.bin"),
            marker_key_path: PathBuf::from("marker.key"),
            remote_endpoint: None,
            eth_ns_per_byte: 8,
            baseline_channels: 4,
        }
    }
}

/// Typed completion message dispatched by the event kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Compressor,
    Dma { channel: usize },
    Ethernet,
}

/// The complete platform.
pub struct Soc {
    pub memory: crate::memory::MemoryFabric,
    pub compressor: Compressor,
    pub dma: DmaEngine,
    pub nvme: NvmeController,
    pub ethernet: EthernetMac,
    pub noc: NocStats,
    pub index: LogIndex,
    pub markers: Vec<EventMarker>,
    pub channels: ChannelTable,
    pub apu: ApuCore,
    pub rpu: RpuCore,
    pub cloud_sync: CloudSyncState,
    pub(crate) queue: EventQueue<Completion>,
    pub(crate) net: Option<NetworkClient>,
    pub(crate) permission: Box<dyn PermissionOracle>,
    pub(crate) config: SocConfig,
}

impl Soc {
    /// Bring up the platform: allocate the fabric, open the NVMe backing
    /// file, and seed the baseline sensor channels.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing file cannot be created.
    pub fn new(config: SocConfig) -> io::Result<Self> {
        let storage = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&config.storage_path)?;
        let net = config.remote_endpoint.as_deref().map(NetworkClient::new);

        info!("platform initialized (storage: {})", config.storage_path.display());
        if let Some(client) = &net {
            info!("cloud backend: {}", client.base_url());
        }

        Ok(Self {
            memory: crate::memory::MemoryFabric::new(),
            compressor: Compressor::new(),
            dma: DmaEngine::new(),
            nvme: NvmeController::new(Some(storage)),
            ethernet: EthernetMac::new(),
            noc: NocStats::default(),
            index: LogIndex::new(),
            markers: Vec::new(),
            channels: ChannelTable::with_baseline(config.baseline_channels),
            apu: ApuCore::new(),
            rpu: RpuCore::new(),
            cloud_sync: CloudSyncState::new(),
            queue: EventQueue::new(),
            net,
            permission: Box::new(AlwaysGrant),
            config,
        })
    }

    /// Current virtual time in nanoseconds.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.queue.clock()
    }

    #[must_use]
    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    /// Replace the controller-permission oracle consulted by the transfer
    /// gate. The default grants every request.
    pub fn set_permission_oracle(&mut self, oracle: Box<dyn PermissionOracle>) {
        self.permission = oracle;
    }

    /// Pop and dispatch the earliest completion. Returns `false` when the
    /// queue is empty.
    pub fn process_next(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        match event {
            Completion::Compressor => self.finish_compression(),
            Completion::Dma { channel } => self.finish_dma_transfer(channel),
            Completion::Ethernet => self.finish_ethernet_tx(),
        }
        true
    }

    /// Drain every pending completion. Returns how many events ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while self.process_next() {
            processed += 1;
        }
        processed
    }

    /// Number of completions still pending.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Append a time-stamped annotation to the marker list.
    pub fn add_marker(&mut self, label: &str, metadata: serde_json::Value) {
        info!("[{} ns] marker: {label} - {metadata}", self.now());
        self.markers.push(EventMarker {
            timestamp: self.now(),
            label: label.to_string(),
            metadata,
        });
    }

    /// Mark the cloud link up and start backlog redemption.
    pub fn cloud_reconnect(&mut self) {
        if self.cloud_sync.connected {
            return;
        }
        info!("[{} ns] cloud reconnected, starting backlog redemption", self.now());
        self.cloud_sync.connected = true;
        self.cloud_sync.redemption_in_progress = true;
        self.add_marker("Backlog-Start", serde_json::json!({ "event": "cloud_reconnect" }));
    }

    /// Structured statistics snapshot.
    #[must_use]
    pub fn report(&self) -> SocReport {
        let input = self.compressor.length;
        let output = self.compressor.compressed_size;
        SocReport {
            clock_ns: self.now(),
            compression: CompressionReport {
                last_input_bytes: input,
                last_output_bytes: output,
                ratio_pct: if input == 0 {
                    0.0
                } else {
                    100.0 * f64::from(output) / f64::from(input)
                },
            },
            storage: StorageReport {
                writes_completed: self.nvme.writes_completed,
                bytes_written: self.nvme.bytes_written,
            },
            cloud: CloudReport {
                connected: self.cloud_sync.connected,
                packets_transmitted: self.ethernet.packets_transmitted,
                bytes_transmitted: self.ethernet.bytes_transmitted,
                backlog_bytes: self.cloud_sync.backlog_bytes,
                last_sync_watermark_ns: self.cloud_sync.last_sync_timestamp,
            },
            noc: self.noc.clone(),
            index_entries: self.index.len(),
            markers: self.markers.len(),
            channels: self.channels.snapshot(),
        }
    }

    /// Pretty-print the statistics report.
    pub fn print_report(&self) {
        let r = self.report();
        println!("\n{}", "=".repeat(60));
        println!("              PLATFORM STATISTICS REPORT");
        println!("{}", "=".repeat(60));
        println!("Simulated time: {} ns ({:.2} us)", r.clock_ns, r.clock_ns as f64 / 1000.0);
        println!("\nCompression:");
        println!("  Last input:           {} bytes", r.compression.last_input_bytes);
        println!("  Last output:          {} bytes", r.compression.last_output_bytes);
        println!("  Ratio:                {:.2}%", r.compression.ratio_pct);
        println!("\nStorage path (NVMe):");
        println!("  Writes completed:     {}", r.storage.writes_completed);
        println!("  Bytes written:        {}", r.storage.bytes_written);
        println!("\nCloud path (Ethernet):");
        println!("  Connection:           {}", if r.cloud.connected { "connected" } else { "disconnected" });
        println!("  Packets transmitted:  {}", r.cloud.packets_transmitted);
        println!("  Bytes transmitted:    {}", r.cloud.bytes_transmitted);
        println!("  Backlog:              {} bytes", r.cloud.backlog_bytes);
        println!("  Sync watermark:       {} ns", r.cloud.last_sync_watermark_ns);
        println!("\nNetwork-on-chip:");
        println!("  Transactions:         {}", r.noc.total_transactions);
        println!("  Memory accesses:      {} bytes", r.noc.memory_accesses);
        println!("  NVMe path traffic:    {} bytes", r.noc.nvme_path_bytes);
        println!("  Ethernet path:        {} bytes", r.noc.ethernet_path_bytes);
        println!("\nLog index entries:      {}", r.index_entries);
        println!("Event markers:          {}", r.markers);
        println!("\nSensor channels:");
        for ch in &r.channels {
            println!(
                "  CH{} [{:<16}]: {:>6}  (health {:>5.1}%)",
                ch.id,
                ch.name,
                ch.state.to_string(),
                ch.health_score * 100.0
            );
        }
        println!("{}\n", "=".repeat(60));
    }
}

/// Compression accelerator summary.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    pub last_input_bytes: u32,
    pub last_output_bytes: u32,
    pub ratio_pct: f64,
}

/// NVMe path summary.
#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub writes_completed: u32,
    pub bytes_written: u64,
}

/// Ethernet/cloud path summary.
#[derive(Debug, Clone, Serialize)]
pub struct CloudReport {
    pub connected: bool,
    pub packets_transmitted: u32,
    pub bytes_transmitted: u64,
    pub backlog_bytes: u64,
    pub last_sync_watermark_ns: u64,
}

/// Full statistics snapshot, serializable for the CLI's JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct SocReport {
    pub clock_ns: u64,
    pub compression: CompressionReport,
    pub storage: StorageReport,
    pub cloud: CloudReport,
    pub noc: NocStats,
    pub index_entries: usize,
    pub markers: usize,
    pub channels: Vec<SensorChannel>,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_platform_comes_up_idle() {
        let dir = tempfile::tempdir().unwrap();
        let soc = test_soc(&dir);
        assert_eq!(soc.now(), 0);
        assert_eq!(soc.pending_events(), 0);
        assert!(soc.nvme.has_storage());
        assert_eq!(soc.channels.len(), 4);
        assert!(soc.index.is_empty());
    }

    #[test]
    fn test_process_next_on_idle_platform_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        assert!(!soc.process_next());
        assert_eq!(soc.now(), 0);
    }

    #[test]
    fn test_markers_record_virtual_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        soc.add_marker("CMD", serde_json::json!("add imu_x"));
        assert_eq!(soc.markers.len(), 1);
        assert_eq!(soc.markers[0].timestamp, 0);
        assert_eq!(soc.markers[0].label, "CMD");
    }

    #[test]
    fn test_cloud_reconnect_starts_redemption_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut soc = test_soc(&dir);
        soc.cloud_reconnect();
        assert!(soc.cloud_sync.connected);
        assert!(soc.cloud_sync.redemption_in_progress);
        assert_eq!(soc.markers.len(), 1);

        // Already connected: no second marker.
        soc.cloud_reconnect();
        assert_eq!(soc.markers.len(), 1);
    }

    #[test]
    fn test_report_snapshot_is_serializable() {
        let dir = tempfile::tempdir().unwrap();
        let soc = test_soc(&dir);
        let json = serde_json::to_value(soc.report()).unwrap();
        assert_eq!(json["clock_ns"], 0);
        assert_eq!(json["index_entries"], 0);
        assert_eq!(json["channels"].as_array().unwrap().len(), 4);
    }
}
