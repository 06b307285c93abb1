//! Human-readable error descriptions and structured JSON error formatting.

use meter_core::error::{BuildError, MeterError};

/// Short machine-friendly tag for an error, used in JSON output.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::EmptyWindow => "EmptyWindow",
            BuildError::BitDepth => "BitDepth",
            BuildError::ChannelClash => "ChannelClash",
            BuildError::InvalidConfig(_) => "InvalidConfig",
        };
    }
    if let Some(me) = err.downcast_ref::<MeterError>() {
        return match me {
            MeterError::Hardware(_) => "Hardware",
            MeterError::NotJoined => "NotJoined",
            MeterError::JoinTimeout(_) => "JoinTimeout",
            MeterError::Payload { .. } => "Payload",
        };
    }
    "Error"
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::EmptyWindow => {
                "What happened: The sampling window is empty.\nLikely causes: sampling.window set to 0 in the TOML.\nHow to fix: Set sampling.window to the samples per cycle (reference hardware uses 10000).".to_string()
            }
            BuildError::BitDepth => {
                "What happened: Invalid converter bit depth.\nLikely causes: adc.bits outside 1..=31 in the TOML.\nHow to fix: Set adc.bits to the converter's resolution (reference hardware uses 12).".to_string()
            }
            BuildError::ChannelClash => {
                "What happened: Current and voltage share a converter input.\nLikely causes: adc.current_channel equals adc.voltage_channel.\nHow to fix: Give each transducer its own multiplexer input.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MeterError>() {
        return match me {
            MeterError::Hardware(msg) => format!(
                "What happened: A hardware operation failed ({msg}).\nLikely causes: Converter or radio not responding, or a wiring fault on the real node.\nHow to fix: Check the transducer and modem connections, then start a new run."
            ),
            MeterError::NotJoined => {
                "What happened: An uplink was attempted before the network session was up.\nLikely causes: The join handshake has not completed yet.\nHow to fix: Wait for the CONNECTED banner; check gateway coverage and the device/app EUIs.".to_string()
            }
            MeterError::JoinTimeout(attempts) => format!(
                "What happened: The network join did not complete within {attempts} attempts.\nLikely causes: No gateway in range, wrong EUIs, or radio antenna issues.\nHow to fix: Verify device.device_eui and device.app_eui, or set join.max_attempts = 0 to retry forever."
            ),
            MeterError::Payload { expected, got } => format!(
                "What happened: A payload had the wrong length (expected {expected} bytes, got {got}).\nLikely causes: A truncated frame or a mismatched payload mode.\nHow to fix: Ensure both ends agree on the 48-byte binary layout."
            ),
        };
    }

    format!(
        "What happened: {err}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
    )
}

/// One-line JSON error object for --json mode.
pub fn to_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "event": "error",
        "kind": error_kind(err),
        "message": err.to_string(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_kind_and_hint() {
        let report = eyre::Report::new(BuildError::EmptyWindow);
        assert_eq!(error_kind(&report), "EmptyWindow");
        assert!(humanize(&report).contains("sampling.window"));
    }

    #[test]
    fn join_timeout_names_attempts() {
        let report = eyre::Report::new(MeterError::JoinTimeout(3));
        assert_eq!(error_kind(&report), "JoinTimeout");
        assert!(humanize(&report).contains("3 attempts"));
    }

    #[test]
    fn payload_error_from_decoder_is_classified() {
        // Payload errors come out of the binary decoder; make sure the
        // formatter handles what the decoder actually produces.
        let err = meter_core::MeteringReport::from_binary(&[0u8; 7]).unwrap_err();
        let report = eyre::Report::new(err);
        assert_eq!(error_kind(&report), "Payload");
        assert!(humanize(&report).contains("expected 48 bytes"));
    }

    #[test]
    fn json_error_is_parseable() {
        let report = eyre::Report::new(MeterError::NotJoined);
        let v: serde_json::Value = serde_json::from_str(&to_json(&report)).unwrap();
        assert_eq!(v["event"], "error");
        assert_eq!(v["kind"], "NotJoined");
    }
}
