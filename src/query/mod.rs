// Query Planner
// "The maesters read the ledgers window by window"

mod merge;


pub use merge::{merge_ticks, AggregateRow, Tick};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use crate::database::TimeSeriesBackend;
use crate::encoder::TRADES_MEASUREMENT;
use crate::error::IronBankResult;

/// Window used when the caller does not pick one
pub const DEFAULT_TIMEFRAME_MS: i64 = 60_000;

/// The three aggregate series a fetch is assembled from, in merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Sum,
    Count,
    Median,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 3] = [
        AggregateKind::Sum,
        AggregateKind::Count,
        AggregateKind::Median,
    ];

    /// Fields the series aggregates over
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            AggregateKind::Sum => &["sell", "buy", "liquidation"],
            AggregateKind::Count => &["side"],
            AggregateKind::Median => &["price"],
        }
    }

    /// Flux aggregate function applied per window
    pub fn function(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Count => "count",
            AggregateKind::Median => "median",
        }
    }

    /// Name of the yielded result table
    pub fn yield_name(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "sum",
            AggregateKind::Count => "count",
            AggregateKind::Median => "median_price",
        }
    }
}

/// A single windowed aggregate statement
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateQuery {
    pub kind: AggregateKind,
    pub flux: String,
}

/// Time range and window of one fetch, rendered into the three statements
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub from: i64,
    pub to: i64,
    pub timeframe_ms: i64,
    queries: Vec<AggregateQuery>,
}

impl QueryPlan {
    pub fn new(bucket: &str, from: i64, to: i64, timeframe_ms: Option<i64>) -> IronBankResult<Self> {
        let timeframe_ms = timeframe_ms.unwrap_or(DEFAULT_TIMEFRAME_MS);
        if timeframe_ms <= 0 {
            return Err(crate::iron_bank_error!(
                database_query,
                format!("Timeframe must be positive, got {timeframe_ms}ms")
            ));
        }

        let start = to_rfc3339(from)?;
        let stop = to_rfc3339(to)?;

        let queries = AggregateKind::ALL
            .iter()
            .map(|kind| AggregateQuery {
                kind: *kind,
                flux: render_flux(bucket, &start, &stop, timeframe_ms, *kind),
            })
            .collect();

        Ok(Self {
            from,
            to,
            timeframe_ms,
            queries,
        })
    }

    /// Statements in merge order: sum, count, median
    pub fn queries(&self) -> &[AggregateQuery] {
        &self.queries
    }
}

fn to_rfc3339(timestamp_ms: i64) -> IronBankResult<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| {
            crate::iron_bank_error!(
                database_query,
                format!("Timestamp {timestamp_ms} is out of range")
            )
        })
}

fn render_flux(bucket: &str, start: &str, stop: &str, timeframe_ms: i64, kind: AggregateKind) -> String {
    let field_filter = kind
        .fields()
        .iter()
        .map(|field| format!(r#"r._field == "{field}""#))
        .collect::<Vec<_>>()
        .join(" or ");

    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: {start}, stop: {stop})
  |> filter(fn: (r) => r._measurement == "{measurement}")
  |> filter(fn: (r) => {field_filter})
  |> aggregateWindow(every: {timeframe_ms}ms, fn: {function}, createEmpty: false)
  |> yield(name: "{yield_name}")"#,
        bucket = escape_string(bucket),
        measurement = TRADES_MEASUREMENT,
        function = kind.function(),
        yield_name = kind.yield_name(),
    )
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Run the plan's statements concurrently and merge their rows.
pub async fn fetch_ticks(backend: &dyn TimeSeriesBackend, plan: &QueryPlan) -> IronBankResult<Vec<Tick>> {
    let [sum, count, median] = match plan.queries() {
        [sum, count, median] => [sum, count, median],
        _ => {
            return Err(crate::iron_bank_error!(
                internal,
                "Query plan must hold exactly three statements"
            ))
        }
    };

    let (sum_rows, count_rows, median_rows) = tokio::try_join!(
        backend.query_rows(sum),
        backend.query_rows(count),
        backend.query_rows(median),
    )?;

    debug!(
        sum_rows = sum_rows.len(),
        count_rows = count_rows.len(),
        median_rows = median_rows.len(),
        "Aggregate queries completed"
    );

    Ok(merge_ticks([
        (sum.kind, sum_rows),
        (count.kind, count_rows),
        (median.kind, median_rows),
    ]))
}
