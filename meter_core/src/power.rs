//! Power math over the two filtered-sample windows and their RMS values.
//!
//! All functions are total over finite floating-point inputs: the reactive
//! radicand is clamped at zero and the power-factor division is guarded, so
//! no NaN or Inf ever reaches a report.

/// Active (real) power: mean of the per-sample products of calibrated
/// instantaneous voltage and current. Averaging instantaneous products
/// accounts for any phase difference between the two channels.
///
/// Each filtered sample is scaled by its channel's calibration ratio before
/// multiplying. This is the per-sample-calibration variant, which keeps
/// active power on the same physical scale as apparent power.
pub fn active_power(
    voltage_samples: &[f64],
    current_samples: &[f64],
    voltage_ratio: f64,
    current_ratio: f64,
) -> f64 {
    let n = voltage_samples.len().min(current_samples.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = voltage_samples
        .iter()
        .zip(current_samples)
        .map(|(v, i)| (v * voltage_ratio) * (i * current_ratio))
        .sum();
    sum / n as f64
}

/// Apparent power: product of the two RMS values, ignoring phase.
pub fn apparent_power(voltage_rms: f64, current_rms: f64) -> f64 {
    voltage_rms * current_rms
}

/// Reactive power: `sqrt(S^2 - P^2)` with the radicand clamped at zero.
///
/// Sensor noise can make measured active power slightly exceed apparent
/// power; without the clamp the naive formula goes NaN there.
pub fn reactive_power(apparent: f64, active: f64) -> f64 {
    (apparent * apparent - active * active).max(0.0).sqrt()
}

/// Power factor: `P / S`. Returns 0.0 when apparent power is zero; callers
/// treat that as a degenerate (no-load) reading, not an error.
pub fn power_factor(active: f64, apparent: f64) -> f64 {
    if apparent == 0.0 {
        return 0.0;
    }
    active / apparent
}
