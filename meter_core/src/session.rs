//! Metering cycle driver: one full acquisition-to-metrics pass per tick.

use crate::error::{BuildError, Result, map_hw_error};
use crate::filter::OffsetTracker;
use crate::power;
use crate::report::MeteringReport;
use crate::rms;
use eyre::WrapErr;
use meter_config::{AdcCfg, CalibrationCfg, SamplingCfg};
use meter_traits::Adc;

/// Cycle driver state. A tick always runs the full
/// `Sampling -> Computing -> Published` sequence synchronously; the state is
/// observable between ticks and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Sampling,
    Computing,
    Published,
}

/// Owns the fixed-size sample buffers, the per-channel offset trackers and
/// the converter, and drives one metering cycle per call to [`run_cycle`].
///
/// Buffers are allocated once at construction and overwritten every cycle;
/// offset trackers persist across cycles and are never reset. The converter
/// services one input at a time, so the two channels are acquired strictly
/// sequentially within a cycle, current first.
///
/// [`run_cycle`]: MeterSession::run_cycle
pub struct MeterSession<A: Adc> {
    adc: A,
    window: usize,
    current_channel: u8,
    voltage_channel: u8,
    current_offset: OffsetTracker,
    voltage_offset: OffsetTracker,
    current_ratio: f64,
    voltage_ratio: f64,
    current_samples: Vec<f64>,
    voltage_samples: Vec<f64>,
    state: CycleState,
    cycles: u64,
}

impl<A: Adc> core::fmt::Debug for MeterSession<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MeterSession")
            .field("window", &self.window)
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("current_offset", &self.current_offset.offset())
            .field("voltage_offset", &self.voltage_offset.offset())
            .finish()
    }
}

impl<A: Adc> MeterSession<A> {
    /// Build a session over a converter, validating the static configuration.
    /// Offsets start at the converter's mid-scale value.
    pub fn new(
        adc: A,
        adc_cfg: &AdcCfg,
        calibration: &CalibrationCfg,
        sampling: &SamplingCfg,
    ) -> Result<Self> {
        if sampling.window == 0 {
            return Err(eyre::Report::new(BuildError::EmptyWindow));
        }
        if adc_cfg.bits == 0 || adc_cfg.bits > 31 {
            return Err(eyre::Report::new(BuildError::BitDepth));
        }
        if adc_cfg.current_channel == adc_cfg.voltage_channel {
            return Err(eyre::Report::new(BuildError::ChannelClash));
        }
        for ch in [&calibration.current, &calibration.voltage] {
            if !ch.scale.is_finite() || ch.scale <= 0.0 {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "calibration scale must be finite and > 0",
                )));
            }
            if ch.supply_mv == 0 {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "supply reference must be > 0",
                )));
            }
        }

        let counts = adc_cfg.counts();
        Ok(Self {
            adc,
            window: sampling.window,
            current_channel: adc_cfg.current_channel,
            voltage_channel: adc_cfg.voltage_channel,
            current_offset: OffsetTracker::mid_scale(counts),
            voltage_offset: OffsetTracker::mid_scale(counts),
            current_ratio: rms::calibration_ratio(
                calibration.current.scale,
                calibration.current.supply_mv,
                counts,
            ),
            voltage_ratio: rms::calibration_ratio(
                calibration.voltage.scale,
                calibration.voltage.supply_mv,
                counts,
            ),
            current_samples: vec![0.0; sampling.window],
            voltage_samples: vec![0.0; sampling.window],
            state: CycleState::Sampling,
            cycles: 0,
        })
    }

    /// Current cycle-driver state.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Current DC-offset estimates `(current, voltage)` in raw counts.
    pub fn offsets(&self) -> (f64, f64) {
        (self.current_offset.offset(), self.voltage_offset.offset())
    }

    /// Run one full metering cycle: acquire both channels, compute the RMS
    /// and power metrics, and publish a report.
    ///
    /// Samples are drawn back-to-back as fast as the converter allows; the
    /// effective sample rate is whatever the converter sustains, and RMS
    /// accuracy depends on drawing exactly `window` consecutive conversions
    /// per channel.
    pub fn run_cycle(&mut self) -> Result<MeteringReport> {
        self.state = CycleState::Sampling;
        let current_sum_sq = acquire(
            &mut self.adc,
            self.current_channel,
            &mut self.current_offset,
            &mut self.current_samples,
        )
        .wrap_err("acquiring current channel")?;
        let voltage_sum_sq = acquire(
            &mut self.adc,
            self.voltage_channel,
            &mut self.voltage_offset,
            &mut self.voltage_samples,
        )
        .wrap_err("acquiring voltage channel")?;

        self.state = CycleState::Computing;
        let current_rms = rms::rms_from_sum_squares(current_sum_sq, self.window, self.current_ratio);
        let voltage_rms = rms::rms_from_sum_squares(voltage_sum_sq, self.window, self.voltage_ratio);
        let active = power::active_power(
            &self.voltage_samples,
            &self.current_samples,
            self.voltage_ratio,
            self.current_ratio,
        );
        let apparent = power::apparent_power(voltage_rms, current_rms);
        let reactive = power::reactive_power(apparent, active);
        let pf = power::power_factor(active, apparent);

        let report = MeteringReport {
            current_rms,
            voltage_rms,
            active_power: active,
            apparent_power: apparent,
            reactive_power: reactive,
            power_factor: pf,
        };

        self.state = CycleState::Published;
        self.cycles += 1;
        tracing::debug!(
            cycle = self.cycles,
            current_rms,
            voltage_rms,
            active,
            apparent,
            "metering cycle published"
        );
        Ok(report)
    }
}

/// Draw `buf.len()` consecutive conversions from one channel, folding each
/// raw sample into the offset tracker and storing the filtered value.
/// Returns the running sum of squared filtered samples for the RMS stage.
fn acquire<A: Adc>(
    adc: &mut A,
    channel: u8,
    tracker: &mut OffsetTracker,
    buf: &mut [f64],
) -> Result<f64> {
    adc.select_channel(channel)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("select channel")?;
    let mut sum_sq = 0.0;
    for slot in buf.iter_mut() {
        let raw = adc
            .read()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("adc read")?;
        let filtered = tracker.filter(f64::from(raw));
        *slot = filtered;
        sum_sq += filtered * filtered;
    }
    Ok(sum_sq)
}
