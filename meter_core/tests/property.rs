use meter_config::{PayloadMode, UplinkCfg};
use meter_core::mocks::RecordingRadio;
use meter_core::{MeteringReport, OffsetTracker, UplinkScheduler, power};
use proptest::prelude::*;

proptest! {
    #[test]
    fn reactive_power_is_nonnegative_and_finite(
        active in -1e6f64..1e6,
        apparent in -1e6f64..1e6,
    ) {
        let q = power::reactive_power(apparent, active);
        prop_assert!(q >= 0.0, "reactive {q} must be >= 0");
        prop_assert!(!q.is_nan(), "reactive must never be NaN");
        prop_assert!(q.is_finite());
    }

    #[test]
    fn reactive_power_clamps_when_active_exceeds_apparent(
        apparent in 0.0f64..1e3,
        excess in 0.0f64..10.0,
    ) {
        // Noise can push measured active power past apparent power.
        let q = power::reactive_power(apparent, apparent + excess);
        prop_assert_eq!(q, 0.0);
    }

    #[test]
    fn power_factor_is_always_defined(
        active in -1e6f64..1e6,
        apparent in 0.0f64..1e6,
    ) {
        let pf = power::power_factor(active, apparent);
        prop_assert!(!pf.is_nan());
    }

    #[test]
    fn offset_tracker_converges_toward_constant_input(
        start in 0.0f64..4096.0,
        target_counts in 0u16..4096,
    ) {
        let target = f64::from(target_counts);
        let mut tracker = OffsetTracker::new(start);
        let mut prev_gap = (tracker.offset() - target).abs();
        let mut filtered = 0.0;
        for _ in 0..20_000 {
            filtered = tracker.filter(target);
            let gap = (tracker.offset() - target).abs();
            prop_assert!(gap <= prev_gap, "offset gap must shrink monotonically");
            prev_gap = gap;
        }
        prop_assert!(prev_gap < (start - target).abs().max(1.0) * 0.01 + 1e-9);
        prop_assert!(filtered.abs() <= prev_gap + 1e-9);
    }

    #[test]
    fn uplink_never_fires_twice_within_interval(
        interval in 1u64..10_000,
        steps in proptest::collection::vec(0u64..3_000, 1..100),
    ) {
        let mut scheduler = UplinkScheduler::new(&UplinkCfg {
            interval_ms: interval,
            priority: 2,
            payload: PayloadMode::Binary,
        });
        let mut radio = RecordingRadio::joined();
        let report = MeteringReport {
            current_rms: 1.0,
            voltage_rms: 230.0,
            active_power: 230.0,
            apparent_power: 230.0,
            reactive_power: 0.0,
            power_factor: 1.0,
        };

        let mut now = 0u64;
        let mut last_attempt: Option<u64> = None;
        for step in steps {
            now += step;
            if scheduler.maybe_send(&mut radio, &report, now) {
                if let Some(prev) = last_attempt {
                    prop_assert!(
                        now - prev > interval,
                        "fired at {now} only {} after {prev}",
                        now - prev
                    );
                }
                last_attempt = Some(now);
            }
        }
    }
}

#[test]
fn binary_round_trip_preserves_bits_for_odd_values() {
    // Values the wire format must carry untouched, including signed zero
    // and subnormals.
    let r = MeteringReport {
        current_rms: f64::MIN_POSITIVE,
        voltage_rms: -0.0,
        active_power: 1e-308,
        apparent_power: f64::MAX,
        reactive_power: 0.0,
        power_factor: -1.0,
    };
    let back = MeteringReport::from_binary(&r.to_binary()).unwrap();
    assert_eq!(r.current_rms.to_bits(), back.current_rms.to_bits());
    assert_eq!(r.voltage_rms.to_bits(), back.voltage_rms.to_bits());
    assert_eq!(r.active_power.to_bits(), back.active_power.to_bits());
    assert_eq!(r.apparent_power.to_bits(), back.apparent_power.to_bits());
    assert_eq!(r.reactive_power.to_bits(), back.reactive_power.to_bits());
    assert_eq!(r.power_factor.to_bits(), back.power_factor.to_bits());
}
