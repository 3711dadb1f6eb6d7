use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchitectureError {
    #[error("Cyclic hierarchy in training {training_id}: LU {lu_id} is its own ancestor")]
    CyclicHierarchy { training_id: i64, lu_id: i64 },

    #[error("Unknown training: {training_id}")]
    UnknownTraining { training_id: i64 },

    #[error("Link store error: {message}")]
    StoreError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Hierarchy,
    DataSource,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ArchitectureError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CyclicHierarchy { .. } | Self::UnknownTraining { .. } => ErrorCategory::Hierarchy,
            Self::StoreError { .. } | Self::CsvError(_) => ErrorCategory::DataSource,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一培訓的資料錯誤，其他培訓仍可顯示
            ErrorCategory::Hierarchy => ErrorSeverity::Medium,
            ErrorCategory::DataSource | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::CyclicHierarchy { .. } => {
                "Check the LU links of this training: an LU must not be linked below itself"
            }
            Self::UnknownTraining { .. } => "Check the cohort to training assignments",
            Self::StoreError { .. } => "Check that the data source is reachable and readable",
            Self::CsvError(_) => "Check the CSV exports: headers and column types must match",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Report this as a bug with the rendered input",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration value and retry",
            Self::MissingConfigError { .. } => "Add the missing configuration entry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::CyclicHierarchy { training_id, .. } => {
                format!("The architecture of training {} contains a loop", training_id)
            }
            Self::UnknownTraining { training_id } => {
                format!("Training {} does not exist", training_id)
            }
            Self::StoreError { .. } | Self::CsvError(_) => {
                "The training data could not be read".to_string()
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => format!("Invalid configuration: {}", self),
            Self::IoError(_) | Self::SerializationError(_) => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchitectureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_is_hierarchy_error() {
        let err = ArchitectureError::CyclicHierarchy {
            training_id: 3,
            lu_id: 7,
        };
        assert_eq!(err.category(), ErrorCategory::Hierarchy);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("LU 7"));
        assert!(err.user_friendly_message().contains("training 3"));
    }

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = ArchitectureError::MissingConfigError {
            field: "site.wwwroot".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
