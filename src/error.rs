//! Error types for the db-access helper.
//!
//! All failures surface as a distinguishable [`AccessError`] variant; nothing
//! is retried internally and partial results are never returned alongside an
//! error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Driver resolution failed for '{type_name}' in '{package}': {message}")]
    DriverResolution {
        package: String,
        type_name: String,
        message: String,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Mapping failed: {message}")]
    Mapping {
        message: String,
        column: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AccessError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a driver resolution error for the given driver identity.
    pub fn driver_resolution(
        package: impl Into<String>,
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DriverResolution {
            package: package.into(),
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create a mapping error.
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
            column: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach a source column name to a mapping error. Other variants pass
    /// through unchanged.
    pub fn for_column(self, column: impl Into<String>) -> Self {
        match self {
            Self::Mapping { message, .. } => Self::Mapping {
                message,
                column: Some(column.into()),
            },
            other => other,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Execution { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Get the SQL state code reported by the driver, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to AccessError.
impl From<sqlx::Error> for AccessError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AccessError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AccessError::execution(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::Io(io_err) => AccessError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => AccessError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => AccessError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                AccessError::mapping(format!("Column not found: {}", col)).for_column(col)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => AccessError::mapping(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                AccessError::mapping(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AccessError::mapping(format!("Decode error: {}", source)),
            sqlx::Error::RowNotFound => AccessError::execution(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::WorkerCrashed => AccessError::internal("Database worker crashed"),
            other => AccessError::execution(
                format!("Driver error: {}", other),
                None,
                "Check the underlying driver configuration",
            ),
        }
    }
}

/// Result type alias for helper operations.
pub type AccessResult<T> = Result<T, AccessError>;
