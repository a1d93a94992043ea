// Error types for the route monitor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a verification run
#[derive(Error, Debug)]
pub enum AppError {
    #[error("cannot read file path=\"{}\" {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file=\"{}\" {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid address or range: {0}")]
    InvalidRange(String),

    #[error("no route to host: {0}")]
    NoRoute(String),

    #[error("failed to execute command: {0}")]
    CommandExecution(String),

    #[error("failed to parse route output: {0}")]
    RouteOutputParse(String),

    #[error("route lookup is not supported on this platform")]
    UnsupportedPlatform,

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convert error to an operator-facing hint
    pub fn user_message(&self) -> String {
        match self {
            AppError::ConfigRead { .. } => {
                "Configuration file could not be read. Check the path and permissions.".to_string()
            }
            AppError::ConfigParse { .. } => {
                "Configuration file is invalid. Check field names and value types.".to_string()
            }
            AppError::InvalidRange(target) => {
                format!("Route target {} is not an IPv4 address or CIDR range.", target)
            }
            AppError::NoRoute(_) => {
                "No route found to destination. Check your routing table and network connectivity.".to_string()
            }
            AppError::CommandExecution(_) => {
                "Failed to query the routing table. Make sure iproute2 is installed.".to_string()
            }
            AppError::RouteOutputParse(_) => {
                "Unexpected output from the routing table query. This might be a bug, please report it.".to_string()
            }
            AppError::UnsupportedPlatform => {
                "Route lookups are only implemented for Linux.".to_string()
            }
            AppError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
        }
    }

    /// Whether the error stems from the configuration rather than the host
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AppError::ConfigRead { .. } | AppError::ConfigParse { .. } | AppError::InvalidRange(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_read_message() {
        let err = AppError::ConfigRead {
            path: PathBuf::from("/dev/null/foo"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("cannot read file path=\"/dev/null/foo\""));
    }

    #[test]
    fn test_config_read_hint() {
        let err = AppError::ConfigRead {
            path: PathBuf::from("routes.toml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_config_error());
        assert!(err.user_message().contains("could not be read"));
    }

    #[test]
    fn test_error_is_config() {
        assert!(AppError::InvalidRange("nope".to_string()).is_config_error());
        assert!(!AppError::NoRoute("10.0.0.1".to_string()).is_config_error());
        assert!(!AppError::UnsupportedPlatform.is_config_error());
    }
}
