//! Join-phase and main-loop orchestration.
//!
//! Single-threaded and cooperative: one tick at a time, every tick running to
//! completion. The radio event pump is the only call that may block, bounded
//! by the configured pump timeout, which thereby sets the tick length.

use crate::display::DisplayPresenter;
use crate::error::{MeterError, Result, map_hw_error};
use crate::session::MeterSession;
use crate::uplink::UplinkScheduler;
use eyre::WrapErr;
use meter_config::{DisplayCfg, JoinCfg, RunnerCfg, UplinkCfg};
use meter_traits::{Adc, Canvas, Clock, PumpEvent, Radio};
use std::sync::Arc;
use std::time::Duration;

/// Largest downlink frame the drain buffer accepts.
pub const DOWNLINK_BUFFER_LEN: usize = 242;

/// Observable radio-link state of the scheduler's join phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Joining,
    Joined,
}

/// Drive the join handshake until the session reports joined.
///
/// Each round blocks on the event pump for the configured timeout. With
/// `max_attempts == 0` the phase retries forever (reference behavior);
/// otherwise it aborts with [`MeterError::JoinTimeout`] once the bound is
/// exhausted.
pub fn join_network<R: Radio>(radio: &mut R, policy: &JoinCfg) -> Result<LinkState> {
    radio
        .join()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("starting join handshake")?;

    let timeout = Duration::from_millis(policy.pump_timeout_ms);
    let mut rounds: u32 = 0;
    while !radio.is_joined() {
        if policy.max_attempts > 0 && rounds >= policy.max_attempts {
            return Err(eyre::Report::new(MeterError::JoinTimeout(
                policy.max_attempts,
            )));
        }
        rounds += 1;
        tracing::debug!(rounds, "waiting for network join");
        radio
            .process_with_timeout(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("join event pump")?;
    }
    tracing::info!(rounds, "network joined");
    Ok(LinkState::Joined)
}

/// Drain and hex-dump pending downlink frames. No command interpretation;
/// frames are logged at the byte level only.
fn drain_downlinks<R: Radio>(radio: &mut R) {
    let mut buf = [0u8; DOWNLINK_BUFFER_LEN];
    loop {
        match radio.receive(&mut buf) {
            Ok(Some((len, port))) => {
                let hex: String = buf[..len].iter().map(|b| format!("{b:02x}")).collect();
                tracing::info!(port, len, payload = %hex, "downlink received");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "downlink receive failed");
                break;
            }
        }
    }
}

/// Run the metering node: startup banner, join phase, then the cooperative
/// tick loop (sample both channels, compute metrics, rate-limited uplink,
/// display refresh, bounded event pump).
///
/// `stop_check` is polled once per tick; returning true ends the loop
/// cleanly and yields the number of completed cycles. Without it the loop
/// runs for the process lifetime.
#[allow(clippy::too_many_arguments)]
pub fn run<A, R, C>(
    mut session: MeterSession<A>,
    radio: &mut R,
    canvas: &mut C,
    clock: Arc<dyn Clock + Send + Sync>,
    device_name: &str,
    uplink_cfg: &UplinkCfg,
    join_cfg: &JoinCfg,
    runner_cfg: &RunnerCfg,
    display_cfg: &DisplayCfg,
    stop_check: Option<Box<dyn Fn() -> bool>>,
) -> Result<u64>
where
    A: Adc,
    R: Radio,
    C: Canvas,
{
    let banner = if device_name.is_empty() {
        "POWER METER"
    } else {
        device_name
    };
    DisplayPresenter::banner(canvas, banner);

    tracing::info!(state = ?LinkState::Joining, "joining network");
    DisplayPresenter::banner(canvas, "CONNECTING");
    let state = join_network(radio, join_cfg)?;
    tracing::info!(state = ?state, "link up");
    DisplayPresenter::banner(canvas, "CONNECTED");

    let mut scheduler = UplinkScheduler::new(uplink_cfg);
    let mut presenter = DisplayPresenter::new(display_cfg);
    let pump_timeout = Duration::from_millis(runner_cfg.pump_timeout_ms);
    let epoch = clock.now();

    loop {
        if let Some(check) = &stop_check
            && check()
        {
            tracing::info!(cycles = session.cycles(), "stop requested");
            return Ok(session.cycles());
        }

        // Service pending radio events before the long acquisition phase.
        if let Err(e) = radio.process() {
            tracing::warn!(error = %e, "event pump failed");
        }

        let report = session.run_cycle()?;
        tracing::info!(
            current_a = format_args!("{:.2}", report.current_rms),
            voltage_v = format_args!("{:.2}", report.voltage_rms),
            active_w = format_args!("{:.2}", report.active_power),
            apparent_va = format_args!("{:.2}", report.apparent_power),
            reactive_var = format_args!("{:.2}", report.reactive_power),
            power_factor = format_args!("{:.2}", report.power_factor),
            "metering report"
        );

        let now_ms = clock.ms_since(epoch);
        scheduler.maybe_send(radio, &report, now_ms);
        presenter.present(canvas, &report);

        match radio.process_with_timeout(pump_timeout) {
            Ok(PumpEvent::Activity) => drain_downlinks(radio),
            Ok(PumpEvent::Idle) => {}
            Err(e) => tracing::warn!(error = %e, "event pump failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingRadio;

    #[test]
    fn join_retries_until_joined() {
        let mut radio = RecordingRadio::joining_after(3);
        let policy = JoinCfg {
            max_attempts: 0,
            pump_timeout_ms: 10,
        };
        let state = join_network(&mut radio, &policy).unwrap();
        assert_eq!(state, LinkState::Joined);
    }

    #[test]
    fn bounded_join_aborts_with_typed_error() {
        let mut radio = RecordingRadio::joining_after(100);
        let policy = JoinCfg {
            max_attempts: 5,
            pump_timeout_ms: 10,
        };
        let err = join_network(&mut radio, &policy).unwrap_err();
        match err.downcast_ref::<MeterError>() {
            Some(MeterError::JoinTimeout(attempts)) => assert_eq!(*attempts, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn drain_consumes_all_pending_downlinks() {
        let mut radio = RecordingRadio::joined();
        radio.queue_downlink(&[0xde, 0xad], 1);
        radio.queue_downlink(&[0xbe, 0xef], 2);
        drain_downlinks(&mut radio);
        assert!(radio.downlinks.is_empty());
    }
}
