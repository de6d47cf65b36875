// Trade Encoder
// "Every coin that enters the vault is counted and labelled"

use influxdb2::models::DataPoint;

use crate::error::IronBankResult;
use crate::types::Trade;


/// Measurement every trade point is written to
pub const TRADES_MEASUREMENT: &str = "trades";

/// Volume carried by a trade point. A point holds exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeVolume {
    Buy(f64),
    Sell(f64),
    Liquidation(f64),
}

impl TradeVolume {
    /// Classify a trade's size.
    ///
    /// A liquidation flag of exactly `1` wins over the side indicator.
    pub fn classify(trade: &Trade) -> Self {
        if trade.is_liquidation() {
            TradeVolume::Liquidation(trade.size)
        } else if trade.is_buy() {
            TradeVolume::Buy(trade.size)
        } else {
            TradeVolume::Sell(trade.size)
        }
    }

    /// Field name the volume is stored under
    pub fn field_name(&self) -> &'static str {
        match self {
            TradeVolume::Buy(_) => "buy",
            TradeVolume::Sell(_) => "sell",
            TradeVolume::Liquidation(_) => "liquidation",
        }
    }

    pub fn size(&self) -> f64 {
        match self {
            TradeVolume::Buy(size) | TradeVolume::Sell(size) | TradeVolume::Liquidation(size) => {
                *size
            }
        }
    }
}

/// Field set of a trade point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeFields {
    pub price: f64,
    pub side: bool,
    pub volume: TradeVolume,
}

/// One trade ready to be written to the `trades` measurement
#[derive(Debug, Clone, PartialEq)]
pub struct TradePoint {
    pub exchange: String,
    pub pair: String,
    pub fields: TradeFields,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl TradePoint {
    pub fn from_trade(trade: &Trade, pair: &str) -> Self {
        Self {
            exchange: trade.exchange.clone(),
            pair: pair.to_string(),
            fields: TradeFields {
                price: trade.price,
                side: trade.is_buy(),
                volume: TradeVolume::classify(trade),
            },
            timestamp: trade.timestamp,
        }
    }

    pub fn measurement(&self) -> &'static str {
        TRADES_MEASUREMENT
    }

    /// Build the InfluxDB data point. The timestamp stays in milliseconds,
    /// so the write has to be issued with millisecond precision.
    pub fn to_data_point(&self) -> IronBankResult<DataPoint> {
        DataPoint::builder(TRADES_MEASUREMENT)
            .tag("exchange", self.exchange.as_str())
            .tag("pair", self.pair.as_str())
            .field("price", self.fields.price)
            .field("side", self.fields.side)
            .field(self.fields.volume.field_name(), self.fields.volume.size())
            .timestamp(self.timestamp)
            .build()
            .map_err(|e| {
                crate::iron_bank_error!(
                    data_serialization,
                    format!("Failed to create trade DataPoint: {e}")
                )
            })
    }
}

/// Encode a batch of trades, one point per trade in input order
pub fn encode_trades(trades: &[Trade], pair: &str) -> Vec<TradePoint> {
    trades
        .iter()
        .map(|trade| TradePoint::from_trade(trade, pair))
        .collect()
}

/// Convert encoded points into InfluxDB data points
pub fn to_data_points(points: &[TradePoint]) -> IronBankResult<Vec<DataPoint>> {
    points.iter().map(TradePoint::to_data_point).collect()
}
