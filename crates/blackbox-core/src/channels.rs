//! Sensor channel management.
//!
//! Channels follow the DAW-track analogy of the recorder: each has a state,
//! a health score maintained by the RPU's monitor, and recording
//! configuration. The table starts with a baseline of placeholder channels
//! and grows dynamically; a failed reservation leaves the table unchanged.

use serde::Serialize;

/// Channel lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Off,
    On,
    Recording,
    Frozen,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::On => write!(f, "on"),
            Self::Recording => write!(f, "rec"),
            Self::Frozen => write!(f, "frozen"),
        }
    }
}

/// One sensor channel descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct SensorChannel {
    pub id: u32,
    pub name: String,
    pub state: ChannelState,
    /// 0.0 (unreliable) to 1.0 (healthy).
    pub health_score: f32,
    pub stagnation_counter: u32,
    #[serde(skip)]
    pub last_value: f32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sample width in bits.
    pub bit_depth: u8,
    pub adaptive_precision: bool,
    pub samples_recorded: u64,
    pub freeze_start_time: u64,
}

impl SensorChannel {
    #[must_use]
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: ChannelState::On,
            health_score: 1.0,
            stagnation_counter: 0,
            last_value: 0.0,
            sample_rate: 1000,
            bit_depth: 32,
            adaptive_precision: false,
            samples_recorded: 0,
            freeze_start_time: 0,
        }
    }

    /// Change state, recording the freeze time when entering `Frozen`.
    pub fn set_state(&mut self, state: ChannelState, timestamp: u64) {
        if state == ChannelState::Frozen {
            self.freeze_start_time = timestamp;
        }
        self.state = state;
    }
}

/// The channel table owned by the platform.
#[derive(Debug, Default)]
pub struct ChannelTable {
    channels: Vec<SensorChannel>,
}

impl ChannelTable {
    /// Table with `count` placeholder channels, all off.
    #[must_use]
    pub fn with_baseline(count: u32) -> Self {
        let mut table = Self::default();
        table.ensure_minimum(count);
        table
    }

    /// Append a channel. Returns its id, or `None` when the reservation
    /// fails, in which case existing state is unchanged.
    pub fn add(&mut self, name: &str) -> Option<u32> {
        if self.channels.try_reserve(1).is_err() {
            return None;
        }
        let id = self.channels.len() as u32;
        self.channels.push(SensorChannel::new(id, name));
        Some(id)
    }

    /// Grow the table to at least `count` channels with off placeholders.
    pub fn ensure_minimum(&mut self, count: u32) {
        let need = (count as usize).saturating_sub(self.channels.len());
        if need == 0 || self.channels.try_reserve(need).is_err() {
            return;
        }
        while self.channels.len() < count as usize {
            let id = self.channels.len() as u32;
            let mut channel = SensorChannel::new(id, &format!("Unused_{id}"));
            channel.set_state(ChannelState::Off, 0);
            self.channels.push(channel);
        }
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&SensorChannel> {
        self.channels.get(id as usize)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut SensorChannel> {
        self.channels.get_mut(id as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SensorChannel> {
        self.channels.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Snapshot for reports.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SensorChannel> {
        self.channels.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_channels_start_off() {
        let table = ChannelTable::with_baseline(4);
        assert_eq!(table.len(), 4);
        assert!(table.iter().all(|ch| ch.state == ChannelState::Off));
        assert_eq!(table.get(0).unwrap().name, "Unused_0");
    }

    #[test]
    fn test_add_appends_after_baseline() {
        let mut table = ChannelTable::with_baseline(4);
        let id = table.add("imu_x").unwrap();
        assert_eq!(id, 4);
        let ch = table.get(4).unwrap();
        assert_eq!(ch.name, "imu_x");
        assert_eq!(ch.state, ChannelState::On);
        assert!((ch.health_score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_ensure_minimum_is_idempotent() {
        let mut table = ChannelTable::with_baseline(4);
        table.ensure_minimum(2);
        assert_eq!(table.len(), 4);
        table.ensure_minimum(6);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_freeze_records_timestamp() {
        let mut channel = SensorChannel::new(0, "pitot");
        channel.set_state(ChannelState::Frozen, 1234);
        assert_eq!(channel.state, ChannelState::Frozen);
        assert_eq!(channel.freeze_start_time, 1234);
    }
}
