// Common Types
// "Every ledger line has the same six columns"

use serde::Deserialize;

use crate::error::IronBankError;


/// A single trade as handed over by the ingestion pipeline.
///
/// On the wire a trade is a six element array
/// `[exchange, timestamp, price, size, side, liquidation]` whose numeric
/// members may be JSON numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawTrade")]
pub struct Trade {
    pub exchange: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub price: f64,
    pub size: f64,
    /// Positive for buys, zero or negative for sells
    pub side: f64,
    /// `1` marks a liquidation
    pub liquidation: f64,
}

impl Trade {
    pub fn new<S: Into<String>>(
        exchange: S,
        timestamp: i64,
        price: f64,
        size: f64,
        side: f64,
        liquidation: f64,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            timestamp,
            price,
            size,
            side,
            liquidation,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side > 0.0
    }

    pub fn is_liquidation(&self) -> bool {
        self.liquidation == 1.0
    }
}

/// Wire shape of a trade before numeric coercion
#[derive(Debug, Deserialize)]
struct RawTrade(String, Numeric, Numeric, Numeric, Numeric, Numeric);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self, name: &str) -> Result<f64, IronBankError> {
        let value = match self {
            Numeric::Number(value) => Some(*value),
            Numeric::Text(text) => text.trim().parse::<f64>().ok(),
        };

        value.filter(|v| v.is_finite()).ok_or_else(|| {
            crate::iron_bank_error!(data_validation, format!("{name} is not a finite number: {self}"))
        })
    }

    /// Integer reading of the value; fractional parts are truncated.
    fn as_timestamp(&self) -> Result<i64, IronBankError> {
        if let Numeric::Text(text) = self {
            if let Ok(value) = text.trim().parse::<i64>() {
                return Ok(value);
            }
        }

        Ok(self.as_f64("timestamp")?.trunc() as i64)
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Numeric::Number(value) => write!(f, "{value}"),
            Numeric::Text(text) => write!(f, "{text:?}"),
        }
    }
}

impl TryFrom<RawTrade> for Trade {
    type Error = IronBankError;

    fn try_from(raw: RawTrade) -> Result<Self, Self::Error> {
        let RawTrade(exchange, timestamp, price, size, side, liquidation) = raw;

        Ok(Trade {
            exchange,
            timestamp: timestamp.as_timestamp()?,
            price: price.as_f64("price")?,
            size: size.as_f64("size")?,
            side: side.as_f64("side")?,
            liquidation: liquidation.as_f64("liquidation")?,
        })
    }
}

/// Parse a JSON array of trade tuples
pub fn parse_trades(json: &str) -> Result<Vec<Trade>, IronBankError> {
    Ok(serde_json::from_str(json)?)
}
