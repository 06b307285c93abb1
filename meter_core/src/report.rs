//! Metering report and its wire encodings.

use crate::error::MeterError;

/// Byte length of the binary uplink payload: six 8-byte IEEE-754 doubles.
pub const BINARY_PAYLOAD_LEN: usize = 48;

/// One metering cycle's output. Created by the cycle driver, consumed by the
/// uplink scheduler and display presenter within the same tick; no history
/// is retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteringReport {
    pub current_rms: f64,
    pub voltage_rms: f64,
    pub active_power: f64,
    pub apparent_power: f64,
    pub reactive_power: f64,
    pub power_factor: f64,
}

impl MeteringReport {
    /// Fields in wire order.
    fn fields(&self) -> [f64; 6] {
        [
            self.current_rms,
            self.voltage_rms,
            self.active_power,
            self.apparent_power,
            self.reactive_power,
            self.power_factor,
        ]
    }

    /// Fixed-layout binary payload: six consecutive little-endian f64 fields
    /// in the order current, voltage, active, apparent, reactive, power factor.
    pub fn to_binary(&self) -> [u8; BINARY_PAYLOAD_LEN] {
        let mut out = [0u8; BINARY_PAYLOAD_LEN];
        for (chunk, field) in out.chunks_exact_mut(8).zip(self.fields()) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        out
    }

    /// Decode a binary payload. Rejects any length other than
    /// [`BINARY_PAYLOAD_LEN`].
    pub fn from_binary(bytes: &[u8]) -> Result<Self, MeterError> {
        if bytes.len() != BINARY_PAYLOAD_LEN {
            return Err(MeterError::Payload {
                expected: BINARY_PAYLOAD_LEN,
                got: bytes.len(),
            });
        }
        let mut fields = [0.0f64; 6];
        for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *field = f64::from_le_bytes(raw);
        }
        Ok(Self {
            current_rms: fields[0],
            voltage_rms: fields[1],
            active_power: fields[2],
            apparent_power: fields[3],
            reactive_power: fields[4],
            power_factor: fields[5],
        })
    }

    /// Human-readable payload: comma-separated, two decimals, same field
    /// order as the binary layout, no trailing delimiter.
    pub fn to_text(&self) -> String {
        let f = self.fields();
        format!(
            "{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            f[0], f[1], f[2], f[3], f[4], f[5]
        )
    }
}
