//! Heterogeneous processing cores and cloud-sync state.
//!
//! The APU handles application-level concerns: local-first configuration
//! policy and query processing. The RPU monitors sensor health in real time
//! and freezes channels that fall below its threshold. Cloud sync tracks the
//! delivery watermark and backlog redemption.

use log::debug;

use crate::channels::{ChannelState, SensorChannel};

/// Application Processing Unit.
#[derive(Debug)]
pub struct ApuCore {
    pub initialized: bool,
    pub local_auth_token_valid: bool,
    pub auth_token_expiry: u64,
    /// Local-first security: remote configuration is off by default.
    pub allow_remote_config: bool,
    pub device_record_enable: bool,
    pub pending_queries: u32,
}

impl ApuCore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: true,
            local_auth_token_valid: false,
            auth_token_expiry: 0,
            allow_remote_config: false,
            device_record_enable: true,
            pending_queries: 0,
        }
    }

    /// Local requests are always allowed; remote requests need the remote
    /// config switch and a valid auth token.
    #[must_use]
    pub fn validate_config_request(&self, is_local: bool) -> bool {
        if is_local {
            return true;
        }
        self.allow_remote_config && self.local_auth_token_valid
    }
}

impl Default for ApuCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Real-time Processing Unit.
#[derive(Debug)]
pub struct RpuCore {
    pub initialized: bool,
    pub running: bool,
    pub filter_enabled: bool,
    pub normalize_enabled: bool,
    pub compress_dynamics: bool,
    pub monitored_channels: u32,
    /// Channels scoring below this are frozen.
    pub health_threshold: f32,
}

impl RpuCore {
    const STAGNATION_LIMIT: u32 = 100;
    const VALUE_BOUND: f32 = 1000.0;

    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: true,
            running: true,
            filter_enabled: false,
            normalize_enabled: false,
            compress_dynamics: false,
            monitored_channels: 0,
            health_threshold: 0.3,
        }
    }

    /// Fold one observed sample into a channel's health score. A stagnant or
    /// out-of-bounds signal lowers the score; below the threshold the
    /// channel freezes.
    pub fn monitor_sensor_health(&self, channel: &mut SensorChannel, value: f32) {
        let stagnant = value == channel.last_value;
        let out_of_bounds = !(-Self::VALUE_BOUND..=Self::VALUE_BOUND).contains(&value);

        if stagnant {
            channel.stagnation_counter += 1;
        } else {
            channel.stagnation_counter = 0;
        }

        let mut score = 1.0;
        if channel.stagnation_counter > Self::STAGNATION_LIMIT {
            score -= 0.4;
        }
        if out_of_bounds {
            score -= 0.5;
        }

        channel.health_score = score;
        channel.last_value = value;

        if score < self.health_threshold {
            channel.state = ChannelState::Frozen;
            debug!("rpu: channel {} frozen (score {score:.2})", channel.id);
        }
    }
}

impl Default for RpuCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloud synchronization state.
#[derive(Debug, Default)]
pub struct CloudSyncState {
    pub connected: bool,
    /// Virtual time of the last successful delivery.
    pub last_sync_timestamp: u64,
    pub backlog_bytes: u64,
    pub redemption_in_progress: bool,
}

impl CloudSyncState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_watermark(&mut self, timestamp: u64) {
        self.last_sync_timestamp = timestamp;
    }
}
