// Database Module
// "The Iron Bank - where all trades are stored"

pub mod influx_client;

pub use influx_client::{InfluxBackend, InfluxConfig};

use async_trait::async_trait;

use crate::encoder::TradePoint;
use crate::error::IronBankResult;
use crate::query::{AggregateQuery, AggregateRow};

/// Write and query primitives the storage adapter needs from a
/// time-series database.
#[async_trait]
pub trait TimeSeriesBackend: Send + Sync {
    /// Write a batch of points in a single request
    async fn write_points(&self, points: &[TradePoint]) -> IronBankResult<()>;

    /// Run one aggregate statement and return its rows
    async fn query_rows(&self, query: &AggregateQuery) -> IronBankResult<Vec<AggregateRow>>;

    /// Check that the backend answers
    async fn health(&self) -> IronBankResult<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing;
