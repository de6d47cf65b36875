use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::IronBankResult;

lazy_static! {
    // Write path
    pub static ref POINTS_WRITTEN: IntCounterVec = register_int_counter_vec!(
        "iron_bank_points_written_total",
        "Total number of trade points written to InfluxDB",
        &["bucket"]
    )
    .unwrap();
    pub static ref POINTS_DROPPED: IntCounterVec = register_int_counter_vec!(
        "iron_bank_points_dropped_total",
        "Total number of trade points lost to failed writes",
        &["bucket"]
    )
    .unwrap();

    // Read path
    pub static ref FETCH_FAILURES: IntCounter = register_int_counter!(
        "iron_bank_fetch_failures_total",
        "Total number of fetches that resolved without data"
    )
    .unwrap();
    pub static ref FETCHES_IN_FLIGHT: IntGauge = register_int_gauge!(
        "iron_bank_fetches_in_flight",
        "Number of aggregate fetches currently waiting on the backend"
    )
    .unwrap();
}

/// Decrements [`FETCHES_IN_FLIGHT`] when the fetch ends, however it ends
pub(crate) struct FetchGuard;

impl FetchGuard {
    pub(crate) fn enter() -> Self {
        FETCHES_IN_FLIGHT.inc();
        FetchGuard
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        FETCHES_IN_FLIGHT.dec();
    }
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> IronBankResult<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| crate::iron_bank_error!(internal, format!("Failed to encode metrics: {e}")))?;

    String::from_utf8(buffer)
        .map_err(|e| crate::iron_bank_error!(internal, format!("Metrics are not UTF-8: {e}")))
}
