//! Cooperative-loop tests over mock hardware and a manual clock.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use meter_config::{AdcCfg, CalibrationCfg, DisplayCfg, JoinCfg, RunnerCfg, UplinkCfg};
use meter_core::mocks::{RecordingCanvas, RecordingRadio, ScriptedAdc};
use meter_core::{BINARY_PAYLOAD_LEN, MeterSession, MeterError, runner};
use meter_traits::clock::ManualClock;

fn session(window: usize) -> MeterSession<ScriptedAdc> {
    MeterSession::new(
        ScriptedAdc::constant(2048),
        &AdcCfg::default(),
        &CalibrationCfg::default(),
        &meter_config::SamplingCfg { window },
    )
    .unwrap()
}

/// Stop after `ticks` loop iterations, advancing the manual clock by
/// `advance_ms` per tick so the uplink gate sees time passing.
fn ticking_stop(clock: ManualClock, ticks: u32, advance_ms: u64) -> Box<dyn Fn() -> bool> {
    let count = Rc::new(Cell::new(0u32));
    Box::new(move || {
        let n = count.get() + 1;
        count.set(n);
        if n > 1 {
            clock.advance(Duration::from_millis(advance_ms));
        }
        n > ticks
    })
}

#[test]
fn loop_runs_cycles_and_rate_limits_uplink() {
    let clock = ManualClock::new();
    let mut radio = RecordingRadio::joined();
    let mut canvas = RecordingCanvas::default();

    let uplink = UplinkCfg {
        interval_ms: 3_000,
        priority: 2,
        payload: meter_config::PayloadMode::Binary,
    };
    let cycles = runner::run(
        session(16),
        &mut radio,
        &mut canvas,
        Arc::new(clock.clone()),
        "freedm-meter",
        &uplink,
        &JoinCfg::default(),
        &RunnerCfg {
            pump_timeout_ms: 10,
        },
        &DisplayCfg::default(),
        Some(ticking_stop(clock, 5, 2_000)),
    )
    .unwrap();

    assert_eq!(cycles, 5);
    // Clock advances 2 s per tick and the gate needs strictly more than 3 s:
    // sends land at 4 s and 8 s only.
    assert_eq!(radio.sent.len(), 2);
    let (payload, priority) = &radio.sent[0];
    assert_eq!(payload.len(), BINARY_PAYLOAD_LEN);
    assert_eq!(*priority, 2);
    // Non-blocking pump runs once per tick regardless of sends.
    assert_eq!(radio.process_calls, 5);
}

#[test]
fn startup_banners_then_metric_frames() {
    let clock = ManualClock::new();
    let mut radio = RecordingRadio::joining_after(2);
    let mut canvas = RecordingCanvas::default();

    runner::run(
        session(4),
        &mut radio,
        &mut canvas,
        Arc::new(clock.clone()),
        "freedm-meter",
        &UplinkCfg::default(),
        &JoinCfg {
            max_attempts: 0,
            pump_timeout_ms: 5,
        },
        &RunnerCfg {
            pump_timeout_ms: 5,
        },
        &DisplayCfg::default(),
        Some(ticking_stop(clock, 2, 100)),
    )
    .unwrap();

    assert_eq!(canvas.frames[0], vec!["freedm-meter".to_string()]);
    assert_eq!(canvas.frames[1], vec!["CONNECTING".to_string()]);
    assert_eq!(canvas.frames[2], vec!["CONNECTED".to_string()]);
    // Subsequent frames are the six metric lines.
    assert_eq!(canvas.frames[3].len(), 6);
    assert!(canvas.frames[3][0].starts_with("I: "));
    assert!(canvas.frames[3][5].starts_with("PF: "));
}

#[test]
fn downlinks_are_drained_during_the_tick() {
    let clock = ManualClock::new();
    let mut radio = RecordingRadio::joined();
    radio.queue_downlink(&[0x01, 0x02, 0x03], 7);
    let mut canvas = RecordingCanvas::default();

    runner::run(
        session(4),
        &mut radio,
        &mut canvas,
        Arc::new(clock.clone()),
        "",
        &UplinkCfg::default(),
        &JoinCfg::default(),
        &RunnerCfg::default(),
        &DisplayCfg::default(),
        Some(ticking_stop(clock, 2, 100)),
    )
    .unwrap();

    assert!(radio.downlinks.is_empty(), "pending downlink must be drained");
}

#[test]
fn bounded_join_policy_aborts_the_run() {
    let clock = ManualClock::new();
    let mut radio = RecordingRadio::joining_after(50);
    let mut canvas = RecordingCanvas::default();

    let err = runner::run(
        session(4),
        &mut radio,
        &mut canvas,
        Arc::new(clock.clone()),
        "",
        &UplinkCfg::default(),
        &JoinCfg {
            max_attempts: 3,
            pump_timeout_ms: 5,
        },
        &RunnerCfg::default(),
        &DisplayCfg::default(),
        Some(ticking_stop(clock, 1, 100)),
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MeterError>(),
        Some(MeterError::JoinTimeout(3))
    ));
}
