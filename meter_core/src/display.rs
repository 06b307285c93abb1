//! Metric formatting for the external display canvas.

use crate::report::MeteringReport;
use meter_config::DisplayCfg;
use meter_traits::Canvas;

/// Vertical pitch of the 8px text rows on the reference canvas.
const LINE_HEIGHT: u8 = 8;

/// Formats reports into short fixed-width lines and pushes them through the
/// canvas once per tick (or every N ticks when rate-limited).
#[derive(Debug)]
pub struct DisplayPresenter {
    enabled: bool,
    refresh_divider: u32,
    ticks: u32,
}

impl DisplayPresenter {
    pub fn new(cfg: &DisplayCfg) -> Self {
        Self {
            enabled: cfg.enabled,
            refresh_divider: cfg.refresh_divider.max(1),
            ticks: 0,
        }
    }

    /// The six display lines in fixed order and two-decimal precision.
    pub fn lines(report: &MeteringReport) -> [String; 6] {
        [
            format!("I: {:.2} A", report.current_rms),
            format!("V: {:.2} V", report.voltage_rms),
            format!("P: {:.2} W", report.active_power),
            format!("S: {:.2} VA", report.apparent_power),
            format!("Q: {:.2} VAR", report.reactive_power),
            format!("PF: {:.2}", report.power_factor),
        ]
    }

    /// Draw a single status banner (startup / join progress).
    pub fn banner<C: Canvas>(canvas: &mut C, text: &str) {
        canvas.clear();
        canvas.draw_text(text, 0, 0);
        if let Err(e) = canvas.flush() {
            tracing::warn!(error = %e, "display flush failed");
        }
    }

    /// Present one report. Display problems are logged, never fatal; the
    /// metering pipeline does not depend on the canvas.
    pub fn present<C: Canvas>(&mut self, canvas: &mut C, report: &MeteringReport) {
        let tick = self.ticks;
        self.ticks = self.ticks.wrapping_add(1);
        if !self.enabled || tick % self.refresh_divider != 0 {
            return;
        }
        canvas.clear();
        for (i, line) in Self::lines(report).iter().enumerate() {
            canvas.draw_text(line, 0, i as u8 * LINE_HEIGHT);
        }
        if let Err(e) = canvas.flush() {
            tracing::warn!(error = %e, "display flush failed");
        }
    }
}
