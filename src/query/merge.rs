use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::debug;

use super::AggregateKind;

/// One row of an aggregate query result as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// Window time label (`_time`)
    pub time: DateTime<FixedOffset>,
    /// Aggregated field (`_field`)
    pub field: String,
    /// Aggregate value (`_value`), absent for empty windows
    pub value: Option<f64>,
    pub exchange: Option<String>,
    pub pair: Option<String>,
}

/// One aggregate record of a fetch.
///
/// Only the field produced by the tick's series is populated: ticks from
/// different series that share a timestamp are not joined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub series: AggregateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Tick {
    fn empty(timestamp: i64, series: AggregateKind, row: AggregateRow) -> Self {
        Self {
            timestamp,
            series,
            exchange: row.exchange,
            pair: row.pair,
            buy: None,
            sell: None,
            liquidation: None,
            count: None,
            price: None,
        }
    }

    /// Convert a result row of `series`. Rows without a value, or carrying a
    /// field the series never asked for, yield nothing.
    pub fn from_row(series: AggregateKind, row: AggregateRow) -> Option<Self> {
        let value = row.value?;
        let timestamp = row.time.timestamp_millis();
        let field = row.field.clone();
        let mut tick = Tick::empty(timestamp, series, row);

        match (series, field.as_str()) {
            (AggregateKind::Sum, "buy") => tick.buy = Some(value),
            (AggregateKind::Sum, "sell") => tick.sell = Some(value),
            (AggregateKind::Sum, "liquidation") => tick.liquidation = Some(value),
            (AggregateKind::Count, "side") => tick.count = Some(value.max(0.0) as u64),
            (AggregateKind::Median, "price") => tick.price = Some(value),
            _ => {
                debug!(?series, field = %field, "Skipping row with unexpected field");
                return None;
            }
        }

        Some(tick)
    }
}

/// Concatenate per-series rows in the given order and sort by timestamp.
///
/// The sort is stable, so ticks sharing a timestamp keep the order of the
/// series they came from.
pub fn merge_ticks<I>(batches: I) -> Vec<Tick>
where
    I: IntoIterator<Item = (AggregateKind, Vec<AggregateRow>)>,
{
    let mut ticks: Vec<Tick> = batches
        .into_iter()
        .flat_map(|(series, rows)| {
            rows.into_iter()
                .filter_map(move |row| Tick::from_row(series, row))
        })
        .collect();

    ticks.sort_by_key(|tick| tick.timestamp);
    ticks
}
