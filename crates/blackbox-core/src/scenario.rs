//! Realistic driving-scenario mock.
//!
//! Produces telemetry packets for a cyclic ten-hour drive profile: city
//! stop-and-go, a long highway stretch, a rest stop, and the city drive
//! back. Targets jitter randomly inside each mode and the observable state
//! approaches them smoothly, so consecutive packets look like a real
//! vehicle rather than white noise. Seedable for reproducible streams.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::telemetry::{
    DriveMetrics, GpsFix, StatusFlags, SystemMetrics, TelemetryPacket, WheelSpeeds, iso8601_now,
};

/// Driving mode, selected by elapsed time within the ten-hour cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    City,
    Highway,
    Idle,
}

/// Fuel tank capacity assumed by the consumption model, in liters.
const TANK_CAPACITY_L: f64 = 50.0;

/// Evolving drive state.
pub struct DriveScenario {
    elapsed_hours: f64,
    speed_kph: f64,
    fuel_level_pct: f64,
    engine_temp_c: f64,
    battery_voltage: f64,
    throttle_pct: f64,
    brake_pct: f64,
    gear: i32,
    rpm: f64,
    ambient_temp_c: f64,
    mode: DriveMode,
    rng: StdRng,
}

impl DriveScenario {
    /// Scenario with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    /// Scenario with a fixed seed for reproducible streams.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            elapsed_hours: 0.0,
            speed_kph: 0.0,
            fuel_level_pct: 100.0,
            engine_temp_c: 25.0,
            battery_voltage: 12.6,
            throttle_pct: 0.0,
            brake_pct: 0.0,
            gear: 0,
            rpm: 800.0,
            ambient_temp_c: 25.0,
            mode: DriveMode::City,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn elapsed_hours(&self) -> f64 {
        self.elapsed_hours
    }

    #[must_use]
    pub fn fuel_level_pct(&self) -> f64 {
        self.fuel_level_pct
    }

    #[must_use]
    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    fn random_range(&mut self, min: f64, max: f64) -> f64 {
        self.rng.random_range(min..=max)
    }

    /// Advance the drive by `delta_seconds` and emit a telemetry packet.
    pub fn advance(&mut self, delta_seconds: f64, vehicle_id: &str) -> TelemetryPacket {
        self.elapsed_hours += delta_seconds / 3600.0;

        // Ten-hour cycle: city, highway, rest stop, city back.
        let hour = self.elapsed_hours % 10.0;
        self.mode = if hour < 2.0 {
            DriveMode::City
        } else if hour < 7.0 {
            DriveMode::Highway
        } else if hour < 7.5 {
            DriveMode::Idle
        } else {
            DriveMode::City
        };

        let (target_speed, target_throttle, target_brake) = match self.mode {
            DriveMode::City => {
                if self.rng.random_bool(0.3) {
                    // Stopped or slowing in traffic.
                    (self.random_range(0.0, 30.0), 0.0, self.random_range(20.0, 60.0))
                } else {
                    (self.random_range(30.0, 60.0), self.random_range(20.0, 50.0), 0.0)
                }
            }
            DriveMode::Highway => {
                if self.rng.random_bool(0.1) {
                    // Traffic slowdown.
                    (self.random_range(70.0, 90.0), self.random_range(10.0, 20.0), 0.0)
                } else {
                    (self.random_range(100.0, 120.0), self.random_range(30.0, 45.0), 0.0)
                }
            }
            DriveMode::Idle => (0.0, 0.0, 100.0),
        };

        self.speed_kph = smooth_approach(self.speed_kph, target_speed, delta_seconds * 2.0);
        self.throttle_pct = smooth_approach(self.throttle_pct, target_throttle, delta_seconds * 10.0);
        self.brake_pct = smooth_approach(self.brake_pct, target_brake, delta_seconds * 15.0);

        self.gear = gear_for_speed(self.speed_kph);
        self.rpm = if self.gear == 0 {
            800.0 + self.throttle_pct * 20.0
        } else {
            1000.0 + (self.speed_kph / f64::from(self.gear)) * 40.0 + self.throttle_pct * 10.0
        }
        .clamp(600.0, 7000.0);

        // Engine temperature tracks load; cools off at idle.
        let target_temp = match self.mode {
            DriveMode::Idle => 75.0,
            _ if self.rpm > 3000.0 => 85.0 + (self.rpm - 3000.0) * 0.01,
            _ => 85.0,
        };
        self.engine_temp_c = smooth_approach(self.engine_temp_c, target_temp, delta_seconds * 0.5);

        // Consumption: city ~10 L/100km, highway ~6 L/100km, idle 0.8 L/h.
        let burn_l_per_s = match self.mode {
            DriveMode::City => (self.speed_kph * 10.0 / 100.0) / 3600.0,
            DriveMode::Highway => (self.speed_kph * 6.0 / 100.0) / 3600.0,
            DriveMode::Idle => 0.8 / 3600.0,
        };
        self.fuel_level_pct =
            (self.fuel_level_pct - burn_l_per_s * delta_seconds / TANK_CAPACITY_L * 100.0).max(0.0);

        let target_battery = match self.mode {
            DriveMode::Idle => 12.2,
            _ => 12.4 + (self.rpm / 7000.0) * 1.8,
        };
        self.battery_voltage =
            smooth_approach(self.battery_voltage, target_battery, delta_seconds * 0.1);

        // Day/night ambient cycle.
        let time_of_day = self.elapsed_hours % 24.0;
        self.ambient_temp_c =
            20.0 + 10.0 * ((time_of_day / 24.0) * std::f64::consts::TAU - std::f64::consts::FRAC_PI_2).sin();

        let humidity = (50.0 + (self.ambient_temp_c - 20.0) * 1.5 + self.random_range(-5.0, 5.0))
            .clamp(20.0, 90.0);
        let wheel_variation = self.random_range(-0.5, 0.5);

        TelemetryPacket {
            vehicle_id: vehicle_id.to_string(),
            timestamp: iso8601_now(),
            telemetry: DriveMetrics {
                speed_kph: (self.speed_kph + self.random_range(-0.5, 0.5)).max(0.0),
                rpm: self.rpm,
                throttle_pct: self.throttle_pct,
                brake_pct: self.brake_pct,
                gear: self.gear,
                battery_voltage: self.battery_voltage + self.random_range(-0.05, 0.05),
                engine_temp_c: self.engine_temp_c + self.random_range(-0.3, 0.3),
                fuel_level_pct: self.fuel_level_pct,
                gps: GpsFix {
                    lat: 37.7749 + self.elapsed_hours * 0.01,
                    lon: -122.4194 + self.elapsed_hours * 0.01,
                },
                ambient_temp_c: self.ambient_temp_c,
                humidity_pct: humidity,
                wheel_speed: WheelSpeeds {
                    front_left: self.speed_kph + wheel_variation,
                    front_right: self.speed_kph + wheel_variation,
                    rear_left: self.speed_kph + wheel_variation,
                    rear_right: self.speed_kph + wheel_variation,
                },
            },
            system: SystemMetrics {
                cpu_usage_pct: 0.0,
                ram_usage_pct: 0.0,
                network_latency_ms: 0.0,
                last_sync: iso8601_now(),
            },
            status: StatusFlags {
                abs_active: false,
                traction_control: true,
                dtc: Vec::new(),
            },
        }
    }
}

impl Default for DriveScenario {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `current` toward `target` by at most `rate`.
fn smooth_approach(current: f64, target: f64, rate: f64) -> f64 {
    let diff = target - current;
    if diff.abs() < rate {
        target
    } else if diff > 0.0 {
        current + rate
    } else {
        current - rate
    }
}

/// Gear selection by road speed.
fn gear_for_speed(speed_kph: f64) -> i32 {
    match speed_kph {
        s if s < 5.0 => 0,
        s if s < 20.0 => 1,
        s if s < 40.0 => 2,
        s if s < 60.0 => 3,
        s if s < 80.0 => 4,
        s if s < 100.0 => 5,
        _ => 6,
    }
}
