use thiserror::Error;

#[derive(Error, Debug)]
pub enum PointsError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Backend returned {status} for {operation}: {body}")]
    BackendError {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Backend call timed out: {operation}")]
    TimeoutError { operation: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Receptacle not found: {name}")]
    ReceptacleNotFound { name: String },

    #[error("Receptacle '{name}' has invalid capacity {capacity}")]
    InvalidCapacity { name: String, capacity: i64 },

    #[error("No receptacles are registered")]
    NoReceptacles,

    #[error("Invalid receptacle selection '{input}': {reason}")]
    InvalidSelection { input: String, reason: String },

    #[error("Capture device unavailable: {message}")]
    CaptureUnavailable { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
    DataIntegrity,
    Configuration,
    Device,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PointsError {
    /// Transient errors are worth retrying: the same call may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            PointsError::HttpError(e) => e.is_timeout() || e.is_connect(),
            PointsError::TimeoutError { .. } => true,
            PointsError::BackendError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PointsError::HttpError(_) | PointsError::TimeoutError { .. } => ErrorCategory::Network,
            PointsError::BackendError { .. } => ErrorCategory::Backend,
            PointsError::UserNotFound { .. }
            | PointsError::ReceptacleNotFound { .. }
            | PointsError::InvalidCapacity { .. } => ErrorCategory::DataIntegrity,
            PointsError::ConfigError { .. }
            | PointsError::MissingConfigError { .. }
            | PointsError::InvalidConfigValueError { .. }
            | PointsError::NoReceptacles
            | PointsError::InvalidSelection { .. } => ErrorCategory::Configuration,
            PointsError::CaptureUnavailable { .. } => ErrorCategory::Device,
            PointsError::IoError(_) | PointsError::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            _ if self.is_transient() => ErrorSeverity::Medium,
            ErrorCategory::DataIntegrity => ErrorSeverity::Medium,
            ErrorCategory::Network | ErrorCategory::Backend => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::High,
            ErrorCategory::Device => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and the backend URL",
            ErrorCategory::Backend => "Check the backend API key and table permissions",
            ErrorCategory::DataIntegrity => {
                "Check that the user and receptacle records exist and have a positive capacity"
            }
            ErrorCategory::Configuration => "Review the configuration file and command-line flags",
            ErrorCategory::Device => "Check that the scanner is connected and the capture path is correct",
            ErrorCategory::Internal => "Re-run with --verbose and inspect the logs",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PointsError::CaptureUnavailable { message } => {
                format!("Could not open the scanner: {}", message)
            }
            PointsError::NoReceptacles => "No receptacles are registered in the backend".to_string(),
            PointsError::InvalidSelection { input, .. } => {
                format!("'{}' is not a valid receptacle number", input)
            }
            PointsError::HttpError(_) | PointsError::TimeoutError { .. } => {
                "Could not reach the backend".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PointsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(status: u16) -> PointsError {
        PointsError::BackendError {
            operation: "claim_order".to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(backend(503).is_transient());
        assert!(backend(429).is_transient());
        assert!(!backend(400).is_transient());
        assert!(PointsError::TimeoutError {
            operation: "fetch_user".to_string()
        }
        .is_transient());
        assert!(!PointsError::UserNotFound {
            user_id: "U1".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_capture_failure_is_critical() {
        let err = PointsError::CaptureUnavailable {
            message: "/dev/ttyACM0".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Device);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_missing_records_are_data_integrity() {
        let err = PointsError::ReceptacleNotFound {
            name: "bin-a".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::DataIntegrity);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}
