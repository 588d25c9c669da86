use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Data node '{0}' is not registered")]
    UnknownDataNode(String),

    #[error("Data node '{0}' has no connection source")]
    NoConnectionSource(String),

    #[error("Query failed on data node '{0}': {1}")]
    QueryFailed(String, String),

    #[error("Query timed out on data node '{0}' after {1:?}")]
    Timeout(String, std::time::Duration),

    #[error("Result column '{0}' missing from data node '{1}'")]
    MissingColumn(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, MetaError>;

impl<T> From<std::sync::PoisonError<T>> for MetaError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for MetaError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
