//! DC-offset tracking for raw converter samples.
//!
//! A bipolar transducer signal rides on a unipolar ADC output, so every
//! channel carries a slowly drifting DC bias near mid-scale. The tracker is
//! a first-order IIR estimate of that bias; subtracting it turns the raw
//! stream into a zero-centered signal suitable for RMS and power math.

/// Smoothing divisor of the offset update. One time constant is roughly this
/// many samples.
pub const OFFSET_SMOOTHING: f64 = 4096.0;

/// Running DC-offset estimate for one analog channel.
///
/// State persists across metering cycles; it is initialized once at session
/// construction and never reset, so the estimate keeps converging over the
/// whole process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct OffsetTracker {
    offset: f64,
}

impl OffsetTracker {
    /// Start tracking from an explicit offset estimate.
    pub fn new(initial: f64) -> Self {
        Self { offset: initial }
    }

    /// Start from the converter's mid-scale value, the best prior for a
    /// bipolar signal on a unipolar converter.
    pub fn mid_scale(adc_counts: u32) -> Self {
        Self::new(f64::from(adc_counts) / 2.0)
    }

    /// Fold one raw sample into the offset estimate and return the filtered
    /// (offset-removed) sample.
    ///
    /// The subtraction uses the *updated* offset, not the prior one. That
    /// ordering is load-bearing: it makes the filter a first-order high-pass
    /// with a time constant of about `OFFSET_SMOOTHING` samples.
    pub fn filter(&mut self, raw: f64) -> f64 {
        self.offset += (raw - self.offset) / OFFSET_SMOOTHING;
        raw - self.offset
    }

    /// Current offset estimate.
    pub fn offset(&self) -> f64 {
        self.offset
    }
}
