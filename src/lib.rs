// Iron Bank - Core Library
// "The Iron Bank will have its due"

pub mod config;
pub mod database;
pub mod encoder;
pub mod error;
pub mod logging;
pub mod query;
pub mod storage;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{Settings, StorageOptions, StorageSettings};
pub use database::{InfluxBackend, InfluxConfig, TimeSeriesBackend};
pub use error::{IronBankError, IronBankResult};
pub use logging::LoggingConfig;
pub use query::{AggregateKind, Tick};
pub use storage::{FetchOutcome, SaveOutcome, TradeStorage};
pub use types::{parse_trades, Trade};
