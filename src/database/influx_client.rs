// InfluxDB Client
// "The Iron Bank - managing the vaults of time-series data"

use async_trait::async_trait;
use futures_util::stream;
use influxdb2::api::write::TimestampPrecision;
use influxdb2::models::{Query, Status};
use influxdb2::Client;
use influxdb2_structmap::value::Value;
use influxdb2_structmap::GenericMap;
use tracing::{debug, info, warn};

use super::TimeSeriesBackend;
use crate::encoder::{to_data_points, TradePoint};
use crate::error::IronBankResult;
use crate::query::{AggregateQuery, AggregateRow};

/// Connection parameters of the InfluxDB v2 backend
#[derive(Debug, Clone, PartialEq)]
pub struct InfluxConfig {
    /// Full endpoint, e.g. `http://localhost:8086`
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: Option<String>,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: "admin".to_string(),
            bucket: "significant_trades".to_string(),
            token: None,
        }
    }
}

/// [`TimeSeriesBackend`] over the `influxdb2` HTTP client
#[derive(Clone)]
pub struct InfluxBackend {
    config: InfluxConfig,
    client: Client,
}

impl std::fmt::Debug for InfluxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxBackend")
            .field("url", &self.config.url)
            .field("org", &self.config.org)
            .field("bucket", &self.config.bucket)
            .finish()
    }
}

impl InfluxBackend {
    pub fn new(config: InfluxConfig) -> IronBankResult<Self> {
        url::Url::parse(&config.url)?;

        let client = match &config.token {
            Some(token) => {
                debug!("Creating InfluxDB client with token");
                Client::new(&config.url, &config.org, token)
            }
            None => {
                debug!("Creating InfluxDB client without authentication");
                Client::new(&config.url, &config.org, "")
            }
        };

        info!(
            url = %config.url,
            org = %config.org,
            bucket = %config.bucket,
            "⟐ Iron Bank client created"
        );

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }
}

#[async_trait]
impl TimeSeriesBackend for InfluxBackend {
    async fn write_points(&self, points: &[TradePoint]) -> IronBankResult<()> {
        let data_points = to_data_points(points)?;
        let count = data_points.len();

        self.client
            .write_with_precision(
                &self.config.bucket,
                stream::iter(data_points),
                TimestampPrecision::Milliseconds,
            )
            .await
            .map_err(|e| {
                crate::iron_bank_error!(
                    database_write,
                    format!("Failed to write {count} points to '{}': {e}", self.config.bucket)
                )
            })?;

        debug!(points = count, bucket = %self.config.bucket, "✓ Batch write successful");
        Ok(())
    }

    async fn query_rows(&self, query: &AggregateQuery) -> IronBankResult<Vec<AggregateRow>> {
        let records = self
            .client
            .query_raw(Some(Query::new(query.flux.clone())))
            .await
            .map_err(|e| {
                crate::iron_bank_error!(
                    database_query,
                    format!("{} query failed: {e}", query.kind.yield_name())
                )
            })?;

        let total = records.len();
        let rows: Vec<AggregateRow> = records
            .into_iter()
            .filter_map(|record| row_from_values(record.values))
            .collect();

        if rows.len() < total {
            warn!(
                series = query.kind.yield_name(),
                skipped = total - rows.len(),
                "⚠ Skipped records without time or field columns"
            );
        }

        Ok(rows)
    }

    async fn health(&self) -> IronBankResult<()> {
        let check = self.client.health().await.map_err(|e| {
            crate::iron_bank_error!(
                database_connection,
                format!("Health check against {} failed: {e}", self.config.url)
            )
        })?;

        // A 503 still parses into a HealthCheck, only with a failing status
        if !matches!(check.status, Status::Pass) {
            return Err(crate::iron_bank_error!(
                database_connection,
                format!(
                    "InfluxDB at {} is unhealthy: {}",
                    self.config.url,
                    check.message.as_deref().unwrap_or("no message")
                )
            ));
        }

        debug!(url = %self.config.url, "✓ Health check passed");
        Ok(())
    }
}

fn row_from_values(mut values: GenericMap) -> Option<AggregateRow> {
    let time = match values.remove("_time")? {
        Value::TimeRFC(time) => time,
        _ => return None,
    };
    let field = string_value(values.remove("_field"))?;
    let value = match values.remove("_value") {
        Some(Value::Double(value)) => Some(value.0),
        Some(Value::Long(value)) => Some(value as f64),
        Some(Value::UnsignedLong(value)) => Some(value as f64),
        _ => None,
    };

    Some(AggregateRow {
        time,
        field,
        value,
        exchange: string_value(values.remove("exchange")),
        pair: string_value(values.remove("pair")),
    })
}

fn string_value(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}
