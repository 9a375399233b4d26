use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Invalid row collection: {0}")]
    InvalidRows(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown period selector '{0}'")]
    UnknownPeriod(String),

    #[error("Invalid category code '{0}': expected one of AX..CZ")]
    InvalidCategory(String),

    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("Profit shares sum to {total} but {expected} was expected")]
    ProfitShareViolation { total: f64, expected: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
