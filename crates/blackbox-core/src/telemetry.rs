//! Telemetry packet model.
//!
//! The JSON shape matches the cloud backend's `TelemetryData` model: a
//! vehicle identity, an ISO-8601 timestamp, drive metrics, host system
//! metrics, and status flags. Producers are the driving-scenario mock and
//! the CLI streaming command; the network client posts packets to the
//! backend's per-vehicle update endpoint.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// GPS position fix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
}

/// Per-wheel speed readings in km/h.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

/// Drive-level metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveMetrics {
    pub speed_kph: f64,
    pub rpm: f64,
    pub throttle_pct: f64,
    pub brake_pct: f64,
    pub gear: i32,
    pub battery_voltage: f64,
    pub engine_temp_c: f64,
    pub fuel_level_pct: f64,
    pub gps: GpsFix,
    pub ambient_temp_c: f64,
    pub humidity_pct: f64,
    pub wheel_speed: WheelSpeeds,
}

/// Host system metrics attached to each packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_usage_pct: f64,
    pub ram_usage_pct: f64,
    pub network_latency_ms: f64,
    pub last_sync: String,
}

/// Vehicle status flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFlags {
    #[serde(rename = "ABS_active")]
    pub abs_active: bool,
    pub traction_control: bool,
    /// Diagnostic trouble codes.
    #[serde(rename = "DTC")]
    pub dtc: Vec<String>,
}

/// One telemetry snapshot for a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub vehicle_id: String,
    pub timestamp: String,
    pub telemetry: DriveMetrics,
    pub system: SystemMetrics,
    pub status: StatusFlags,
}

/// Current wall-clock time as an ISO-8601 UTC timestamp.
#[must_use]
pub fn iso8601_now() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    iso8601_utc(secs)
}

/// Format seconds since the Unix epoch as `YYYY-MM-DDThh:mm:ssZ`.
#[must_use]
pub fn iso8601_utc(secs: u64) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(secs);
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Convert seconds since the Unix epoch to UTC fields. No leap seconds.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;

    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let months_days: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 0u64;
    for (i, &md) in months_days.iter().enumerate() {
        if days < md {
            month = i as u64 + 1;
            break;
        }
        days -= md;
    }
    let day = days + 1;

    (year, month, day, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601_epoch() {
        assert_eq!(iso8601_utc(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_iso8601_known_date() {
        // 2000-01-01 00:00:00 UTC
        assert_eq!(iso8601_utc(946_684_800), "2000-01-01T00:00:00Z");
    }

    #[test]
    fn test_is_leap() {
        assert!(is_leap(2000));
        assert!(is_leap(2024));
        assert!(!is_leap(1900));
        assert!(!is_leap(2023));
    }

    #[test]
    fn test_packet_serializes_with_backend_field_names() {
        let packet = TelemetryPacket {
            vehicle_id: "BB-001".to_string(),
            timestamp: iso8601_utc(0),
            telemetry: DriveMetrics {
                speed_kph: 42.0,
                rpm: 2100.0,
                throttle_pct: 30.0,
                brake_pct: 0.0,
                gear: 3,
                battery_voltage: 13.2,
                engine_temp_c: 85.0,
                fuel_level_pct: 70.0,
                gps: GpsFix {
                    lat: 37.7749,
                    lon: -122.4194,
                },
                ambient_temp_c: 22.0,
                humidity_pct: 55.0,
                wheel_speed: WheelSpeeds {
                    front_left: 42.0,
                    front_right: 42.1,
                    rear_left: 41.9,
                    rear_right: 42.0,
                },
            },
            system: SystemMetrics {
                cpu_usage_pct: 12.0,
                ram_usage_pct: 30.0,
                network_latency_ms: 4.0,
                last_sync: iso8601_utc(0),
            },
            status: StatusFlags {
                abs_active: false,
                traction_control: true,
                dtc: Vec::new(),
            },
        };

        let json = serde_json::to_value(&packet).unwrap();
        // Renamed keys must match the backend model exactly.
        assert!(json["status"].get("ABS_active").is_some());
        assert!(json["status"].get("DTC").is_some());
        assert_eq!(json["telemetry"]["gps"]["lat"], 37.7749);

        let back: TelemetryPacket = serde_json::from_value(json).unwrap();
        assert_eq!(back.vehicle_id, "BB-001");
        assert_eq!(back.telemetry.gear, 3);
    }
}
