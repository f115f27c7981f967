use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invalid capture key: must be non-empty")]
    InvalidKey,
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Gateway rejected the request: {detail}")]
    GatewayRejected {
        code: Option<String>,
        detail: String,
    },
    #[error("No balance available for appointment {0}")]
    MissingBalance(String),
    #[error("Timed out waiting for capture; the gateway call is still running")]
    WaitTimeout,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BillingError>;

/// Failure reported by a payment gateway client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Transport(String),
    #[error("gateway rejected request: {message}")]
    Rejected {
        code: Option<String>,
        message: String,
    },
}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(detail) => BillingError::TransportError(detail),
            GatewayError::Rejected { code, message } => BillingError::GatewayRejected {
                code,
                detail: message,
            },
        }
    }
}
