use std::fmt;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, TrafficError>;

/// Main error type for the signal controller
#[derive(Debug, Clone)]
pub enum TrafficError {
    /// Missing or malformed training configuration
    Config(String),

    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action outside the signal-plan table
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Failure to start, step, query or close the simulator
    Simulator(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),
}

impl fmt::Display for TrafficError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TrafficError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            TrafficError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            TrafficError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            TrafficError::Simulator(msg) => write!(f, "Simulator error: {}", msg),
            TrafficError::IoError(msg) => write!(f, "IO error: {}", msg),
            TrafficError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for TrafficError {}

impl From<std::io::Error> for TrafficError {
    fn from(err: std::io::Error) -> Self {
        TrafficError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for TrafficError {
    fn from(err: bincode::Error) -> Self {
        TrafficError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for TrafficError {
    fn from(err: serde_json::Error) -> Self {
        TrafficError::SerializationError(err.to_string())
    }
}

// Helper functions for common error patterns
impl TrafficError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        TrafficError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        TrafficError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn simulator<S: Into<String>>(msg: S) -> Self {
        TrafficError::Simulator(msg.into())
    }
}
