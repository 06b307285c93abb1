//! Simulated hardware for running the metering node off-target.
//!
//! The real node talks to a SAR ADC, a LoRaWAN modem and an SSD1306 panel;
//! this crate stands in for all three behind the `meter_traits` seams so the
//! pipeline can run and be demonstrated on a workstation.

pub mod error;

use error::HwError;
use meter_traits::{Adc, BoxError, Canvas, PumpEvent, Radio};
use std::collections::VecDeque;
use std::time::Duration;

const MID_SCALE_12BIT: f64 = 2048.0;
const MAX_COUNT_12BIT: f64 = 4095.0;

/// Per-channel waveform of the simulated converter.
#[derive(Debug, Clone, Copy)]
pub struct SimChannel {
    /// Peak amplitude in converter counts.
    pub amplitude: f64,
    /// Phase offset in radians against the shared waveform clock.
    pub phase: f64,
    /// Samples per waveform period.
    pub period: u32,
}

impl Default for SimChannel {
    fn default() -> Self {
        Self {
            amplitude: 1000.0,
            phase: 0.0,
            period: 500,
        }
    }
}

/// Simulated 12-bit converter producing mains-like sines around mid-scale.
pub struct SimulatedAdc {
    channels: [SimChannel; 2],
    selected: u8,
    sample_index: u64,
}

impl SimulatedAdc {
    /// A converter with an in-phase current/voltage pair (resistive load).
    pub fn resistive() -> Self {
        Self::new([SimChannel::default(), SimChannel::default()])
    }

    /// A converter with the current lagging the voltage (inductive load).
    pub fn inductive(lag_radians: f64) -> Self {
        Self::new([
            SimChannel {
                phase: -lag_radians,
                ..SimChannel::default()
            },
            SimChannel::default(),
        ])
    }

    pub fn new(channels: [SimChannel; 2]) -> Self {
        Self {
            channels,
            selected: 0,
            sample_index: 0,
        }
    }
}

impl Adc for SimulatedAdc {
    fn select_channel(&mut self, channel: u8) -> Result<(), BoxError> {
        if usize::from(channel) >= self.channels.len() {
            return Err(Box::new(HwError::Adc(format!(
                "no such input: {channel}"
            ))));
        }
        self.selected = channel;
        Ok(())
    }

    fn read(&mut self) -> Result<u16, BoxError> {
        let ch = self.channels[usize::from(self.selected)];
        let angle = 2.0 * std::f64::consts::PI * (self.sample_index % u64::from(ch.period)) as f64
            / f64::from(ch.period)
            + ch.phase;
        self.sample_index += 1;
        let value = MID_SCALE_12BIT + ch.amplitude * angle.sin();
        Ok(value.clamp(0.0, MAX_COUNT_12BIT).round() as u16)
    }
}

/// Simulated wide-area radio session. Joins after a fixed number of pump
/// rounds and logs every frame instead of transmitting.
pub struct SimulatedRadio {
    device_eui: String,
    joined: bool,
    pumps_until_join: u32,
    downlinks: VecDeque<(Vec<u8>, u8)>,
}

impl SimulatedRadio {
    /// Initialize the session. Mirrors the modem init handshake: empty
    /// identity is the one thing the stub can reject, and init failure is
    /// fatal to the node.
    pub fn init(device_eui: &str, app_eui: &str) -> error::Result<Self> {
        if device_eui.is_empty() || app_eui.is_empty() {
            return Err(HwError::InitFailed(
                "device_eui and app_eui must be set".into(),
            ));
        }
        tracing::info!(device_eui, app_eui, "radio session initialized (simulated)");
        Ok(Self {
            device_eui: device_eui.to_string(),
            joined: false,
            pumps_until_join: 2,
            downlinks: VecDeque::new(),
        })
    }

    /// Queue a frame to surface through `receive` on a later tick.
    pub fn inject_downlink(&mut self, bytes: &[u8], port: u8) {
        self.downlinks.push_back((bytes.to_vec(), port));
    }
}

impl Radio for SimulatedRadio {
    fn join(&mut self) -> Result<(), BoxError> {
        tracing::info!(device_eui = %self.device_eui, "join requested (simulated)");
        Ok(())
    }

    fn is_joined(&self) -> bool {
        self.joined
    }

    fn process(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn process_with_timeout(&mut self, timeout: Duration) -> Result<PumpEvent, BoxError> {
        if !self.joined {
            self.pumps_until_join = self.pumps_until_join.saturating_sub(1);
            if self.pumps_until_join == 0 {
                self.joined = true;
            }
            return Ok(PumpEvent::Idle);
        }
        // Stand in for radio airtime: the real pump blocks up to its budget.
        std::thread::sleep(timeout.min(Duration::from_millis(5)));
        if self.downlinks.is_empty() {
            Ok(PumpEvent::Idle)
        } else {
            Ok(PumpEvent::Activity)
        }
    }

    fn send_unconfirmed(&mut self, payload: &[u8], priority: u8) -> Result<(), BoxError> {
        if !self.joined {
            return Err(Box::new(HwError::NotJoined));
        }
        let hex: String = payload.iter().map(|b| format!("{b:02x}")).collect();
        tracing::info!(bytes = payload.len(), priority, payload = %hex, "uplink (simulated)");
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<(usize, u8)>, BoxError> {
        match self.downlinks.pop_front() {
            Some((bytes, port)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(Some((n, port)))
            }
            None => Ok(None),
        }
    }
}

/// Simulated display: renders each flushed frame into the log.
#[derive(Default)]
pub struct SimulatedCanvas {
    pending: Vec<String>,
}

impl Canvas for SimulatedCanvas {
    fn clear(&mut self) {
        self.pending.clear();
    }

    fn draw_text(&mut self, text: &str, _x: u8, _y: u8) {
        self.pending.push(text.to_string());
    }

    fn flush(&mut self) -> Result<(), BoxError> {
        tracing::debug!(frame = %self.pending.join(" | "), "display frame (simulated)");
        Ok(())
    }
}
