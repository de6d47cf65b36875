// Error Handling Module
// "A Lannister always pays his debts - and so does the Iron Bank, with errors"

use thiserror::Error;


/// Error types for the trade storage adapter
#[derive(Error, Debug, Clone)]
pub enum IronBankError {
    // Database errors
    #[error("Database connection failed: {message}")]
    DatabaseConnection { message: String },

    #[error("Database write failed: {message}")]
    DatabaseWrite { message: String },

    #[error("Database query failed: {message}")]
    DatabaseQuery { message: String },

    // Data processing errors
    #[error("Data validation failed: {message}")]
    DataValidation { message: String },

    #[error("Data serialization failed: {message}")]
    DataSerialization { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidConfigValue { key: String, value: String },

    #[error("Missing required configuration value: {key}")]
    MissingConfigValue { key: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type IronBankResult<T> = Result<T, IronBankError>;

impl IronBankError {
    /// Create a database connection error
    pub fn database_connection<S: Into<String>>(message: S) -> Self {
        Self::DatabaseConnection {
            message: message.into(),
        }
    }

    /// Create a database write error
    pub fn database_write<S: Into<String>>(message: S) -> Self {
        Self::DatabaseWrite {
            message: message.into(),
        }
    }

    /// Create a database query error
    pub fn database_query<S: Into<String>>(message: S) -> Self {
        Self::DatabaseQuery {
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation<S: Into<String>>(message: S) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a data serialization error
    pub fn data_serialization<S: Into<String>>(message: S) -> Self {
        Self::DataSerialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config_value<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::InvalidConfigValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a missing config value error
    pub fn missing_config_value<K: Into<String>>(key: K) -> Self {
        Self::MissingConfigValue { key: key.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::DatabaseConnection { .. }
            | Self::DatabaseWrite { .. }
            | Self::DatabaseQuery { .. } => "database",
            Self::DataValidation { .. } | Self::DataSerialization { .. } => "data",
            Self::Configuration { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfigValue { .. } => "configuration",
            Self::Internal { .. } => "general",
        }
    }

    /// Whether a caller could reasonably try the same operation again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DatabaseConnection { .. }
            | Self::DatabaseWrite { .. }
            | Self::DatabaseQuery { .. } => true,
            Self::DataValidation { .. }
            | Self::DataSerialization { .. }
            | Self::Configuration { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfigValue { .. }
            | Self::Internal { .. } => false,
        }
    }

    /// Log level an occurrence of this error deserves
    pub fn severity(&self) -> tracing::Level {
        match self {
            Self::DatabaseConnection { .. }
            | Self::Configuration { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfigValue { .. } => tracing::Level::ERROR,
            Self::DatabaseWrite { .. }
            | Self::DatabaseQuery { .. }
            | Self::DataValidation { .. }
            | Self::DataSerialization { .. } => tracing::Level::WARN,
            Self::Internal { .. } => tracing::Level::DEBUG,
        }
    }
}

impl From<serde_json::Error> for IronBankError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() || error.is_syntax() || error.is_eof() {
            IronBankError::data_validation(error.to_string())
        } else {
            IronBankError::data_serialization(error.to_string())
        }
    }
}

impl From<config::ConfigError> for IronBankError {
    fn from(error: config::ConfigError) -> Self {
        IronBankError::configuration(error.to_string())
    }
}

impl From<url::ParseError> for IronBankError {
    fn from(error: url::ParseError) -> Self {
        IronBankError::database_connection(format!("Invalid InfluxDB endpoint: {error}"))
    }
}

impl From<std::io::Error> for IronBankError {
    fn from(error: std::io::Error) -> Self {
        IronBankError::internal(error.to_string())
    }
}

/// Build an [`IronBankError`] from one of its constructor names
#[macro_export]
macro_rules! iron_bank_error {
    ($variant:ident $(, $arg:expr)* $(,)?) => {
        $crate::error::IronBankError::$variant($($arg),*)
    };
}

/// Log an error at its own severity and return it from the enclosing function
#[macro_export]
macro_rules! iron_bank_bail {
    ($error:expr) => {{
        let error = $error;
        match error.severity() {
            tracing::Level::ERROR => tracing::error!(error = %error, category = error.category(), "Operation failed"),
            tracing::Level::WARN => tracing::warn!(error = %error, category = error.category(), "Operation failed"),
            tracing::Level::INFO => tracing::info!(error = %error, category = error.category(), "Operation failed"),
            tracing::Level::DEBUG => tracing::debug!(error = %error, category = error.category(), "Operation failed"),
            _ => tracing::trace!(error = %error, category = error.category(), "Operation failed"),
        }
        return Err(error.into());
    }};
}
