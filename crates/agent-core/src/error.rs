//! Error types for the stock agent.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level agent error.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data: need {required} rows, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model has not been trained")]
    UntrainedModel,

    #[error(
        "Trading window ineligible: equity {equity} below threshold with {day_trades} of {limit} day trades used"
    )]
    IneligibleTradingWindow {
        equity: Decimal,
        day_trades: u32,
        limit: u32,
    },

    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    #[error("Model error: {0}")]
    Model(ModelError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DataError> for AgentError {
    fn from(e: DataError) -> Self {
        AgentError::ExternalService(ExternalServiceError::Data(e))
    }
}

impl From<BrokerError> for AgentError {
    fn from(e: BrokerError) -> Self {
        AgentError::ExternalService(ExternalServiceError::Broker(e))
    }
}

impl From<NotifyError> for AgentError {
    fn from(e: NotifyError) -> Self {
        AgentError::ExternalService(ExternalServiceError::Notify(e))
    }
}

/// Failure of a collaborator outside this process: market data, brokerage
/// or notification channel.
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    #[error("Data source: {0}")]
    Data(#[from] DataError),

    #[error("Broker: {0}")]
    Broker(#[from] BrokerError),

    #[error("Notifier: {0}")]
    Notify(#[from] NotifyError),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

/// Broker-specific errors.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("API error: {0}")]
    ApiError(String),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Notification channel errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Classifier errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Insufficient training data: need {required} rows, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model has not been trained")]
    UntrainedModel,

    #[error("Feature/label length mismatch: {features} features, {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
}

impl From<ModelError> for AgentError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InsufficientData { required, available } => {
                AgentError::InsufficientData { required, available }
            }
            ModelError::UntrainedModel => AgentError::UntrainedModel,
            other => AgentError::Model(other),
        }
    }
}

/// Feature engineering errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
