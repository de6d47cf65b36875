// Storage Configuration
// "Know the vault before you open it"

use serde::{Deserialize, Serialize};

use crate::database::InfluxConfig;
use crate::error::IronBankResult;

/// Raw storage options as read from the config file and environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// InfluxDB host, or a full `scheme://host:port` endpoint
    pub influx_url: Option<String>,
    pub influx_protocol: String,
    pub influx_port: u16,
    pub influx_token: Option<String>,
    /// Trading pair written as the `pair` tag on every point
    pub pair: String,
    pub org: String,
    pub bucket: String,
    /// Ping the backend health endpoint during `connect`
    pub verify_connection: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            influx_url: None,
            influx_protocol: "http".to_string(),
            influx_port: 8086,
            influx_token: None,
            pair: String::new(),
            org: "admin".to_string(),
            bucket: "significant_trades".to_string(),
            verify_connection: false,
        }
    }
}

/// Validated, immutable storage configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub influx: InfluxConfig,
    pub pair: String,
    pub verify_connection: bool,
}

impl StorageOptions {
    pub fn validate(&self) -> IronBankResult<StorageSettings> {
        let host = match self.influx_url.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host,
            _ => {
                crate::iron_bank_bail!(crate::iron_bank_error!(
                    configuration,
                    "Please set the InfluxDB url using the influx_url property"
                ));
            }
        };

        for (key, value) in [("pair", &self.pair), ("bucket", &self.bucket), ("org", &self.org)] {
            if value.trim().is_empty() {
                crate::iron_bank_bail!(crate::iron_bank_error!(missing_config_value, key));
            }
        }
        let pair = self.pair.trim();
        let url = self.endpoint(host)?;

        Ok(StorageSettings {
            influx: InfluxConfig {
                url,
                org: self.org.trim().to_string(),
                bucket: self.bucket.trim().to_string(),
                token: self
                    .influx_token
                    .as_ref()
                    .map(|token| token.trim().to_string())
                    .filter(|token| !token.is_empty()),
            },
            pair: pair.to_string(),
            verify_connection: self.verify_connection,
        })
    }

    /// Full endpoint; a url that already names its scheme is used as is.
    fn endpoint(&self, host: &str) -> IronBankResult<String> {
        if host.contains("://") {
            return Ok(host.trim_end_matches('/').to_string());
        }

        let protocol = self.influx_protocol.trim().to_lowercase();
        if protocol != "http" && protocol != "https" {
            crate::iron_bank_bail!(crate::iron_bank_error!(
                invalid_config_value,
                "influx_protocol",
                self.influx_protocol.clone()
            ));
        }

        if self.influx_port == 0 {
            crate::iron_bank_bail!(crate::iron_bank_error!(
                invalid_config_value,
                "influx_port",
                "0"
            ));
        }

        Ok(format!(
            "{protocol}://{}:{}",
            host.trim_end_matches('/'),
            self.influx_port
        ))
    }
}
