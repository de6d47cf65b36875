// Trade Storage
// "The Iron Bank will have its due"


use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::config::{StorageOptions, StorageSettings};
use crate::database::{InfluxBackend, TimeSeriesBackend};
use crate::encoder::encode_trades;
use crate::error::{IronBankError, IronBankResult};
use crate::logging::log_error_with_context;
use crate::query::{fetch_ticks, QueryPlan, Tick};
use crate::telemetry::{FetchGuard, FETCH_FAILURES, POINTS_DROPPED, POINTS_WRITTEN};
use crate::types::Trade;

/// Result of a `save` call. Write failures end up here instead of in an
/// `Err`: ingestion is best effort and a lost batch is only logged.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Empty batch, the backend was not contacted
    Skipped,
    Written { points: usize },
    Dropped { points: usize, reason: String },
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, SaveOutcome::Written { .. })
    }
}

/// Result of a `fetch` call. `Unavailable` means "no data could be read",
/// which is not the same as an empty but valid range.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Ticks(Vec<Tick>),
    Unavailable { reason: String },
}

impl FetchOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Ticks(_))
    }

    pub fn ticks(&self) -> Option<&[Tick]> {
        match self {
            FetchOutcome::Ticks(ticks) => Some(ticks),
            FetchOutcome::Unavailable { .. } => None,
        }
    }

    pub fn into_ticks(self) -> Option<Vec<Tick>> {
        match self {
            FetchOutcome::Ticks(ticks) => Some(ticks),
            FetchOutcome::Unavailable { .. } => None,
        }
    }
}

/// Storage adapter between the trade ingestion pipeline and the
/// time-series backend.
pub struct TradeStorage {
    settings: StorageSettings,
    backend: OnceCell<Arc<dyn TimeSeriesBackend>>,
}

impl std::fmt::Debug for TradeStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeStorage")
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl TradeStorage {
    /// Validate the options and build an unconnected adapter
    pub fn configure(options: &StorageOptions) -> IronBankResult<Self> {
        let settings = options.validate()?;

        info!(
            url = %settings.influx.url,
            org = %settings.influx.org,
            bucket = %settings.influx.bucket,
            pair = %settings.pair,
            "⚬ Trade storage configured"
        );

        Ok(Self {
            settings,
            backend: OnceCell::new(),
        })
    }

    /// Build an adapter that is already connected to `backend`
    pub fn with_backend(settings: StorageSettings, backend: Arc<dyn TimeSeriesBackend>) -> Self {
        Self {
            settings,
            backend: OnceCell::new_with(Some(backend)),
        }
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.backend.initialized()
    }

    /// Create the backend client. Errors are returned as is, there is no retry.
    pub async fn connect(&self) -> IronBankResult<()> {
        if self.is_connected() {
            debug!("Trade storage already connected");
            return Ok(());
        }

        info!(url = %self.settings.influx.url, "⟐ Connecting to the Iron Bank...");

        let result = self
            .backend
            .get_or_try_init(|| async {
                let backend = InfluxBackend::new(self.settings.influx.clone())?;
                if self.settings.verify_connection {
                    backend.health().await?;
                }
                Ok::<_, IronBankError>(Arc::new(backend) as Arc<dyn TimeSeriesBackend>)
            })
            .await;

        match result {
            Ok(_) => {
                info!("✓ Connected to the Iron Bank");
                Ok(())
            }
            Err(e) => {
                log_error_with_context(&e, "connect");
                Err(e)
            }
        }
    }

    /// Encode and write one batch. Never fails from the caller's point of
    /// view; see [`SaveOutcome`].
    pub async fn save(&self, trades: &[Trade]) -> SaveOutcome {
        if trades.is_empty() {
            debug!("Empty batch, nothing to save");
            return SaveOutcome::Skipped;
        }

        let points = encode_trades(trades, &self.settings.pair);
        let count = points.len();

        let Some(backend) = self.backend.get() else {
            return self.dropped(
                count,
                crate::iron_bank_error!(database_connection, "Trade storage is not connected"),
            );
        };

        match backend.write_points(&points).await {
            Ok(()) => {
                POINTS_WRITTEN
                    .with_label_values(&[self.settings.influx.bucket.as_str()])
                    .inc_by(count as u64);
                debug!(points = count, pair = %self.settings.pair, "✓ Saved trade batch");
                SaveOutcome::Written { points: count }
            }
            Err(e) => self.dropped(count, e),
        }
    }

    fn dropped(&self, points: usize, error: IronBankError) -> SaveOutcome {
        POINTS_DROPPED
            .with_label_values(&[self.settings.influx.bucket.as_str()])
            .inc_by(points as u64);
        error!(
            error = %error,
            points,
            pair = %self.settings.pair,
            "✗ Error saving trades to InfluxDB, batch dropped"
        );

        SaveOutcome::Dropped {
            points,
            reason: error.to_string(),
        }
    }

    /// Windowed sum/count/median series between `from` and `to` (ms).
    /// `timeframe_ms` defaults to one minute.
    pub async fn fetch(&self, from: i64, to: i64, timeframe_ms: Option<i64>) -> FetchOutcome {
        let _guard = FetchGuard::enter();

        let result = match self.backend.get() {
            Some(backend) => self.run_fetch(backend.as_ref(), from, to, timeframe_ms).await,
            None => Err(crate::iron_bank_error!(
                database_connection,
                "Trade storage is not connected"
            )),
        };

        match result {
            Ok(ticks) => {
                debug!(from, to, ticks = ticks.len(), "✓ Fetched aggregate ticks");
                FetchOutcome::Ticks(ticks)
            }
            Err(e) => {
                FETCH_FAILURES.inc();
                error!(
                    error = %e,
                    from,
                    to,
                    timeframe_ms = ?timeframe_ms,
                    "✗ Failed to retrieve trades"
                );
                FetchOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run_fetch(
        &self,
        backend: &dyn TimeSeriesBackend,
        from: i64,
        to: i64,
        timeframe_ms: Option<i64>,
    ) -> IronBankResult<Vec<Tick>> {
        let plan = QueryPlan::new(&self.settings.influx.bucket, from, to, timeframe_ms)?;
        fetch_ticks(backend, &plan).await
    }
}
