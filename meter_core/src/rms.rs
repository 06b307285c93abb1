//! Windowed RMS estimation with physical calibration.

/// Conversion ratio from dimensionless filtered counts to physical units.
///
/// `scale` is the transducer calibration constant, `supply_mv` the supply
/// reference in millivolts, and `adc_counts` the converter full scale.
pub fn calibration_ratio(scale: f64, supply_mv: u32, adc_counts: u32) -> f64 {
    scale * ((f64::from(supply_mv) / 1000.0) / f64::from(adc_counts))
}

/// RMS from a pre-accumulated sum of squared filtered samples over exactly
/// `n` samples, scaled by `ratio`.
///
/// A zero signal yields exactly 0; the computation is well-defined there and
/// needs no special case.
pub fn rms_from_sum_squares(sum_squares: f64, n: usize, ratio: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    ratio * (sum_squares / n as f64).sqrt()
}

/// RMS of a filtered-sample window. The window length must equal the
/// configured sample count; partial windows are not resampled.
pub fn compute_rms(samples: &[f64], ratio: f64) -> f64 {
    let sum_squares: f64 = samples.iter().map(|s| s * s).sum();
    rms_from_sum_squares(sum_squares, samples.len(), ratio)
}
