use meter_config::{PayloadMode, load_toml};
use rstest::rstest;

#[test]
fn rejects_zero_sample_window() {
    let toml = r#"
[adc]
bits = 12

[sampling]
window = 0

[uplink]
interval_ms = 10000
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject window=0");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("sampling.window must be > 0")
    );
}

#[test]
fn accepts_reference_config() {
    let toml = r#"
[device]
name = "freedm-meter"
device_eui = "0000000000000000"
app_eui = "0000000000000000"

[adc]
bits = 12
current_channel = 1
voltage_channel = 0

[calibration.current]
scale = 51.61
supply_mv = 3283

[calibration.voltage]
scale = 897.6
supply_mv = 5056

[sampling]
window = 10000

[uplink]
interval_ms = 10000
priority = 2
payload = "binary"

[runner]
pump_timeout_ms = 1480

[logging]
level = "info"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.adc.counts(), 4096);
    assert_eq!(cfg.calibration.voltage.supply_mv, 5056);
}

#[rstest]
#[case(
    r#"
[calibration.current]
scale = 0.0
supply_mv = 3283
"#,
    "calibration.current.scale"
)]
#[case(
    r#"
[calibration.voltage]
scale = 897.6
supply_mv = 0
"#,
    "calibration.voltage.supply_mv"
)]
#[case(
    r#"
[adc]
bits = 0
"#,
    "adc.bits"
)]
#[case(
    r#"
[adc]
current_channel = 0
voltage_channel = 0
"#,
    "channels must be distinct"
)]
#[case(
    r#"
[uplink]
interval_ms = 0
"#,
    "uplink.interval_ms"
)]
#[case(
    r#"
[display]
refresh_divider = 0
"#,
    "display.refresh_divider"
)]
fn rejects_invalid_sections(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("invalid config must be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err} should mention {needle}"
    );
}

#[test]
fn payload_mode_parses_text() {
    let cfg = load_toml("[uplink]\npayload = \"text\"\n").expect("parse");
    assert_eq!(cfg.uplink.payload, PayloadMode::Text);
}

#[test]
fn load_from_tempfile_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("meter.toml");
    std::fs::write(&path, "[sampling]\nwindow = 2000\n").expect("write");
    let text = std::fs::read_to_string(&path).expect("read");
    let cfg = load_toml(&text).expect("parse");
    assert_eq!(cfg.sampling.window, 2000);
}
