//! System configuration parameters
//!
//! All tunable parameters for the pump controller. Network literals
//! (credentials, broker address) are injected at build time through
//! `PUMPCTL_*` environment variables and default to empty placeholders.

use crate::app::ports::ConfigError;
use crate::storage::records::ThresholdPair;

/// Upper bound on the denoise window (stack buffer size).
pub const MAX_SAMPLES: usize = 8;

/// Messaging topic names.
#[derive(Debug, Clone)]
pub struct Topics {
    /// Free-text status (`working`, `Error pressure!`).
    pub info: &'static str,
    /// `"<pressure> bar"`.
    pub data: &'static str,
    /// Uptime minutes and `m|h|d` pump runtime.
    pub working_time: &'static str,
    /// Inbound `"<low>|<high>"`.
    pub settings: &'static str,
    /// Inbound `"1"` / `"0"`.
    pub control: &'static str,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            info: "smarty/garage/sensor/pressure/info",
            data: "smarty/garage/sensor/pressure/data",
            working_time: "smarty/garage/sensor/pressure/time",
            settings: "smarty/garage/sensor/pressure/settings",
            control: "smarty/garage/sensor/pressure/control",
        }
    }
}

/// Link and broker literals.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    /// e.g. `mqtt://192.168.1.10:1883`
    pub broker_url: &'static str,
    pub client_id: &'static str,
    pub username: &'static str,
    pub password: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("PUMPCTL_WIFI_SSID").unwrap_or(""),
            wifi_password: option_env!("PUMPCTL_WIFI_PASSWORD").unwrap_or(""),
            broker_url: option_env!("PUMPCTL_MQTT_URL").unwrap_or("mqtt://127.0.0.1:1883"),
            client_id: option_env!("PUMPCTL_MQTT_CLIENT_ID").unwrap_or("pressure_sensor"),
            username: option_env!("PUMPCTL_MQTT_USER").unwrap_or(""),
            password: option_env!("PUMPCTL_MQTT_PASSWORD").unwrap_or(""),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone)]
pub struct SystemConfig {
    // --- Pressure sensor ---
    /// Volts per ADC count (5 V / 1023).
    pub volts_per_count: f32,
    /// Sensor output at zero pressure (volts).
    pub zero_offset_volts: f32,
    /// Transducer gain (bar per volt above offset).
    pub bar_per_volt: f32,
    /// Raw values at or below this are treated as a disconnected sensor.
    pub min_plausible_raw: u16,
    /// Readings per denoise window.
    pub samples_per_reading: usize,
    /// Delay between readings inside a window (milliseconds).
    pub sample_interval_ms: u32,

    // --- Thresholds ---
    /// Used when no valid thresholds record exists.
    pub default_thresholds: ThresholdPair,

    // --- Timing ---
    pub runtime_persist_interval_ms: u32,
    pub connectivity_check_interval_ms: u32,
    pub data_publish_interval_ms: u32,
    pub sampling_interval_ms: u32,
    /// Pause between an escalated fault and the restart.
    pub restart_delay_ms: u32,

    // --- Messaging ---
    pub topics: Topics,
    pub network: NetworkConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensor
            volts_per_count: 0.004887,
            zero_offset_volts: 0.5,
            bar_per_volt: 3.0,
            min_plausible_raw: 100,
            samples_per_reading: 4,
            sample_interval_ms: 50,

            // Thresholds
            default_thresholds: ThresholdPair::DEFAULT,

            // Timing
            runtime_persist_interval_ms: 60_000,
            connectivity_check_interval_ms: 5_000,
            data_publish_interval_ms: 2_000,
            sampling_interval_ms: 200,
            restart_delay_ms: 1_000,

            topics: Topics::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field the control loop depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.volts_per_count > 0.0) {
            return Err(ConfigError::ValidationFailed("volts_per_count must be > 0"));
        }
        if !(self.bar_per_volt > 0.0) {
            return Err(ConfigError::ValidationFailed("bar_per_volt must be > 0"));
        }
        if !(1..=MAX_SAMPLES).contains(&self.samples_per_reading) {
            return Err(ConfigError::ValidationFailed(
                "samples_per_reading must be 1–8",
            ));
        }
        if !self.default_thresholds.is_valid() {
            return Err(ConfigError::ValidationFailed(
                "default thresholds must both be positive",
            ));
        }
        let intervals = [
            self.runtime_persist_interval_ms,
            self.connectivity_check_interval_ms,
            self.data_publish_interval_ms,
            self.sampling_interval_ms,
        ];
        if intervals.iter().any(|&ms| ms == 0) {
            return Err(ConfigError::ValidationFailed(
                "task intervals must be non-zero",
            ));
        }
        // A window longer than the sampling period would starve every other task.
        let window_ms = self.sample_interval_ms * self.samples_per_reading as u32;
        if window_ms >= self.connectivity_check_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "sampling window must be shorter than the connectivity check",
            ));
        }
        Ok(())
    }
}
