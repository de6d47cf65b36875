use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Mutex;

use super::TimeSeriesBackend;
use crate::encoder::TradePoint;
use crate::error::{IronBankError, IronBankResult};
use crate::query::{AggregateKind, AggregateQuery, AggregateRow};

/// In-memory backend recording every call
#[derive(Default)]
pub(crate) struct StubBackend {
    pub writes: Mutex<Vec<Vec<TradePoint>>>,
    pub queries: Mutex<Vec<AggregateQuery>>,
    pub sum_rows: Vec<AggregateRow>,
    pub count_rows: Vec<AggregateRow>,
    pub median_rows: Vec<AggregateRow>,
    pub fail_writes: bool,
    pub fail_queries: bool,
}

impl StubBackend {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn write_calls(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl TimeSeriesBackend for StubBackend {
    async fn write_points(&self, points: &[TradePoint]) -> IronBankResult<()> {
        self.writes.lock().unwrap().push(points.to_vec());
        if self.fail_writes {
            return Err(IronBankError::database_write("backend unreachable"));
        }
        Ok(())
    }

    async fn query_rows(&self, query: &AggregateQuery) -> IronBankResult<Vec<AggregateRow>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_queries {
            return Err(IronBankError::database_query("backend unreachable"));
        }
        Ok(match query.kind {
            AggregateKind::Sum => self.sum_rows.clone(),
            AggregateKind::Count => self.count_rows.clone(),
            AggregateKind::Median => self.median_rows.clone(),
        })
    }
}

/// Row at `timestamp_ms` for `field`
pub(crate) fn row(timestamp_ms: i64, field: &str, value: f64) -> AggregateRow {
    let time: DateTime<FixedOffset> = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap()
        .into();
    AggregateRow {
        time,
        field: field.to_string(),
        value: Some(value),
        exchange: Some("bitfinex".to_string()),
        pair: Some("BTCUSD".to_string()),
    }
}
