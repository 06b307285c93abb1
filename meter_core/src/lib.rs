#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core metering logic (hardware-agnostic).
//!
//! This crate provides the sampling-and-metering pipeline of the power node.
//! All hardware interactions go through the `meter_traits::Adc`,
//! `meter_traits::Radio` and `meter_traits::Canvas` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: per-channel DC-offset tracking (`filter` module)
//! - **RMS**: windowed quadratic mean with calibration (`rms` module)
//! - **Power**: active/apparent/reactive power, power factor (`power` module)
//! - **Cycle driver**: `MeterSession` draws one full acquisition per tick
//!   (`session` module)
//! - **Uplink**: monotonic rate gate and payload serialization (`uplink`,
//!   `report` modules)
//! - **Display**: fixed-format metric lines (`display` module)
//! - **Runner**: join phase and the cooperative tick loop (`runner` module)
//!
//! The execution model is single-threaded and non-preemptive: one logical
//! loop, one tick at a time, every tick running to completion. The only call
//! that may block for a bounded duration is the radio event pump, whose
//! timeout is the effective tick length.

pub mod display;
pub mod error;
pub mod filter;
pub mod mocks;
pub mod power;
pub mod report;
pub mod rms;
pub mod runner;
pub mod session;
pub mod uplink;

pub use display::DisplayPresenter;
pub use error::{BuildError, MeterError, Result};
pub use filter::OffsetTracker;
pub use report::{BINARY_PAYLOAD_LEN, MeteringReport};
pub use session::{CycleState, MeterSession};
pub use uplink::UplinkScheduler;
