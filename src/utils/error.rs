use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input table has no '{column}' column")]
    MissingColumnError { column: String },

    #[error("Search provider error: {message}")]
    SearchError { message: String },

    #[error("LLM provider error: {message}")]
    LlmError { message: String },

    #[error("Stream parsing error: {message}")]
    StreamError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::SearchError { .. } | EtlError::LlmError { .. } => {
                ErrorCategory::Network
            }
            EtlError::CsvError(_) | EtlError::MissingColumnError { .. } => ErrorCategory::Input,
            EtlError::StreamError { .. } => ErrorCategory::Processing,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重跑即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Processing => {
                ErrorSeverity::High
            }
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check network connectivity and the provider base URL",
            EtlError::SearchError { .. } => {
                "Verify SERPAPI_API_KEY and the remaining search quota, then re-run"
            }
            EtlError::LlmError { .. } | EtlError::StreamError { .. } => {
                "Verify OPENAI_API_KEY and the configured model name"
            }
            EtlError::CsvError(_) => "Make sure the input file is valid comma-separated UTF-8",
            EtlError::MissingColumnError { .. } => {
                "Add a header row containing a PROMPT column to the input file"
            }
            EtlError::IoError(_) => "Check that the input file exists and the output path is writable",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the command-line flags and the TOML settings file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("External service failed: {}", self),
            ErrorCategory::Input => format!("Input file problem: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
