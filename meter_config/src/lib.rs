#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the power-metering node.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! All values are static for the process lifetime: the metering loop never
//! re-reads or re-derives configuration after startup.
use serde::Deserialize;

/// Device and network identity. Opaque to the core; the radio session
/// consumes these at init time.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Device {
    pub name: String,
    pub device_eui: String,
    pub app_eui: String,
}

/// Analog converter parameters.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct AdcCfg {
    /// Converter bit depth; full scale is `2^bits` counts.
    pub bits: u8,
    /// Multiplexer input carrying the current transducer.
    pub current_channel: u8,
    /// Multiplexer input carrying the voltage transducer.
    pub voltage_channel: u8,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            bits: 12,
            current_channel: 1,
            voltage_channel: 0,
        }
    }
}

impl AdcCfg {
    /// Full-scale count for the configured bit depth.
    pub fn counts(&self) -> u32 {
        1u32 << u32::from(self.bits.min(31))
    }
}

/// Per-channel calibration: a dimensionless transducer scale plus the
/// supply reference feeding that transducer, in millivolts.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ChannelCfg {
    pub scale: f64,
    pub supply_mv: u32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CalibrationCfg {
    pub current: ChannelCfg,
    pub voltage: ChannelCfg,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        // Reference transducer constants for the deployed sensor board.
        Self {
            current: ChannelCfg {
                scale: 51.61,
                supply_mv: 3283,
            },
            voltage: ChannelCfg {
                scale: 897.6,
                supply_mv: 5056,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SamplingCfg {
    /// Samples drawn per channel per metering cycle. The RMS window matches
    /// this exactly; there are no partial windows.
    pub window: usize,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self { window: 10_000 }
    }
}

/// Uplink payload encoding.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// 48-byte fixed layout: six little-endian f64 fields.
    #[default]
    Binary,
    /// ASCII, comma-separated, two decimals per field.
    Text,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct UplinkCfg {
    /// Minimum spacing between transmission attempts (strict inequality).
    pub interval_ms: u64,
    /// Transmission priority class handed to the radio session.
    pub priority: u8,
    pub payload: PayloadMode,
}

impl Default for UplinkCfg {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            priority: 2,
            payload: PayloadMode::Binary,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct JoinCfg {
    /// Event-pump rounds to wait for the join to complete; 0 retries forever.
    pub max_attempts: u32,
    /// Pump timeout per join round (ms).
    pub pump_timeout_ms: u64,
}

impl Default for JoinCfg {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            pump_timeout_ms: 1_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RunnerCfg {
    /// Blocking budget of the per-tick event pump; doubles as the effective
    /// scheduler tick length.
    pub pump_timeout_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            pump_timeout_ms: 1_480,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DisplayCfg {
    pub enabled: bool,
    /// Refresh the canvas every N ticks. 1 = every tick (reference behavior).
    pub refresh_divider: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_divider: 1,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: Device,
    pub adc: AdcCfg,
    pub calibration: CalibrationCfg,
    pub sampling: SamplingCfg,
    pub uplink: UplinkCfg,
    pub join: JoinCfg,
    pub runner: RunnerCfg,
    pub display: DisplayCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.adc.bits == 0 || self.adc.bits > 31 {
            eyre::bail!("adc.bits must be in 1..=31");
        }
        if self.adc.current_channel == self.adc.voltage_channel {
            eyre::bail!("adc channels must be distinct");
        }
        if self.sampling.window == 0 {
            eyre::bail!("sampling.window must be > 0");
        }
        for (name, ch) in [
            ("current", self.calibration.current),
            ("voltage", self.calibration.voltage),
        ] {
            if !ch.scale.is_finite() || ch.scale <= 0.0 {
                eyre::bail!("calibration.{name}.scale must be finite and > 0");
            }
            if ch.supply_mv == 0 {
                eyre::bail!("calibration.{name}.supply_mv must be > 0");
            }
        }
        if self.uplink.interval_ms == 0 {
            eyre::bail!("uplink.interval_ms must be > 0");
        }
        if self.join.pump_timeout_ms == 0 {
            eyre::bail!("join.pump_timeout_ms must be > 0");
        }
        if self.runner.pump_timeout_ms == 0 {
            eyre::bail!("runner.pump_timeout_ms must be > 0");
        }
        if self.display.refresh_divider == 0 {
            eyre::bail!("display.refresh_divider must be > 0");
        }
        Ok(())
    }
}
