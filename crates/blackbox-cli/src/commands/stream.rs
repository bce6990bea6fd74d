//! Continuous streaming run with drive telemetry.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use blackbox_core::{DriveScenario, NetworkClient, Soc, SocConfig};

/// Simulated wall-clock seconds between logged blocks.
const BLOCK_INTERVAL_S: f64 = 1.0;

pub fn run(
    blocks: u32,
    block_size: usize,
    backend: Option<&str>,
    vehicle: &str,
    seed: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let mut soc = Soc::new(SocConfig {
        remote_endpoint: backend.map(str::to_string),
        ..Default::default()
    })?;
    let mut scenario = match seed {
        Some(seed) => DriveScenario::seeded(seed),
        None => DriveScenario::new(),
    };
    let client = backend.map(NetworkClient::new);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    // The speed signal doubles as a monitored sensor channel.
    let speed_channel = soc.channels.add("speed_kph").unwrap_or(0);

    println!("Streaming {block_size}-byte blocks (ctrl-c to stop)");
    let mut block = 0u32;
    let mut telemetry_failures = 0u32;
    while running.load(Ordering::SeqCst) && (blocks == 0 || block < blocks) {
        let data: Vec<u8> = (0..block_size)
            .map(|i| (block as usize * 100 + i) as u8)
            .collect();
        let receipt = soc.process_block(&data)?;

        let packet = scenario.advance(BLOCK_INTERVAL_S, vehicle);
        println!(
            "  block {:>3}: {:>6} -> {:>5} bytes | {:>5.1} km/h gear {} rpm {:>4.0} fuel {:>5.1}%",
            block + 1,
            receipt.uncompressed_size,
            receipt.compressed_size,
            packet.telemetry.speed_kph,
            packet.telemetry.gear,
            packet.telemetry.rpm,
            packet.telemetry.fuel_level_pct
        );

        soc.add_marker(
            "telemetry",
            serde_json::json!({
                "block": block,
                "speed_kph": packet.telemetry.speed_kph,
                "mode_gear": packet.telemetry.gear,
            }),
        );

        if let Some(channel) = soc.channels.get_mut(speed_channel) {
            soc.rpu
                .monitor_sensor_health(channel, packet.telemetry.speed_kph as f32);
            channel.samples_recorded += 1;
        }

        if let Some(client) = &client {
            // Report the first few failures, then go quiet.
            if let Err(err) = client.send_telemetry(&packet) {
                telemetry_failures += 1;
                if telemetry_failures <= 3 {
                    eprintln!("  telemetry post failed: {err}");
                }
                if telemetry_failures == 3 {
                    eprintln!("  further telemetry errors suppressed");
                }
            }
        }

        block += 1;
    }

    println!("\nLogged {block} blocks");
    soc.print_report();
    Ok(())
}
