use thiserror::Error;

/// Type alias for Result with SailthruError
pub type Result<T> = std::result::Result<T, SailthruError>;

/// Sailthru error codes that point at a bad or unreachable recipient rather
/// than a problem with the request itself.
pub const USER_EMAIL_ERROR_CODES: &[(i64, &str)] = &[
    (11, "Invalid email"),
    (32, "Email has opted out of delivery from client"),
    (33, "Email has opted out of delivery from template"),
    (34, "Email may not be emailed"),
    (35, "Email is a known hardbounce"),
    (37, "Email will only accept basic templates"),
];

/// Error types for the Sailthru campaign client
#[derive(Error, Debug)]
pub enum SailthruError {
    /// Sailthru answered with a non-OK response
    #[error("{message} ({code})")]
    Api { code: i64, message: String },

    /// Non-OK response whose code identifies an invalid or unreachable recipient
    #[error("{message} ({code})")]
    UserEmail { code: i64, message: String },

    /// The API reported more (or fewer) records than it actually returned
    #[error("Incomplete 'blast' API data. Expected {expected} records, got {actual}")]
    IncompleteData { expected: u64, actual: u64 },

    /// A job was still pending after the maximum wait
    #[error("Exceeded max wait time of {max_wait_secs} seconds on job id '{job_id}'")]
    JobTimeout { job_id: String, max_wait_secs: u64 },

    /// A job finished in a state other than pending or completed
    #[error("Job '{job_id}' ended with unexpected status '{status}'")]
    UnexpectedJobStatus { job_id: String, status: String },

    /// Could not open a connection before the transport timed out
    #[error("Connection timed out: {0}")]
    ConnectTimeout(String),

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SailthruError {
    /// Build the error for a non-OK API response, separating recipient problems
    /// from everything else.
    pub fn from_api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_user_email_error_code(code) {
            SailthruError::UserEmail { code, message }
        } else {
            SailthruError::Api { code, message }
        }
    }

    /// Only connection timeouts are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, SailthruError::ConnectTimeout(_))
    }

    /// The Sailthru error code, when the error came from an API response
    pub fn api_code(&self) -> Option<i64> {
        match self {
            SailthruError::Api { code, .. } | SailthruError::UserEmail { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub fn is_user_email_error_code(code: i64) -> bool {
    USER_EMAIL_ERROR_CODES.iter().any(|(c, _)| *c == code)
}

impl From<reqwest::Error> for SailthruError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() && error.is_timeout() {
            SailthruError::ConnectTimeout(error.to_string())
        } else if error.is_decode() {
            SailthruError::InvalidResponse(error.to_string())
        } else {
            SailthruError::Network(error.to_string())
        }
    }
}
