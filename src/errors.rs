use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkcardError>;

/// Shown whenever an error cannot be mapped to something more specific.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

const MEBIBYTE: u64 = 1024 * 1024;

/// Local rule violations. These are detected before any request is built
/// and their `Display` text is already suitable for inline display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a username")]
    SlugEmpty,
    #[error("Username must be at least {min} characters")]
    SlugTooShort { min: usize },
    #[error("Username must be at most {max} characters")]
    SlugTooLong { max: usize },
    #[error("Username can only contain lowercase letters, numbers and hyphens")]
    SlugInvalidChars,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Only JPEG and PNG images are allowed")]
    UnsupportedMediaType(String),
    #[error("Image must be {} MB or smaller", .max / MEBIBYTE)]
    MediaTooLarge { size: u64, max: u64 },
    #[error("Choose an available username first")]
    NotSubmittable,
}

#[derive(Error, Debug)]
pub enum LinkcardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Not available: {0}")]
    AvailabilityConflict(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Authentication required")]
    Unauthenticated,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error")]
    Parse,
    #[error("Storage error: {0} {1}")]
    Storage(String, String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LinkcardError {
    /// Translate the error into a stable message for the person using the
    /// app. Backend payloads and transport details never pass through
    /// verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LinkcardError::Validation(e) => e.to_string(),
            LinkcardError::AvailabilityConflict(_) => {
                "That username is already taken. Please choose another one."
                    .to_owned()
            }
            LinkcardError::Unauthenticated => {
                "Your session has expired. Please sign in again.".to_owned()
            }
            LinkcardError::Network(detail) => {
                if detail.to_lowercase().contains("timed out") {
                    "The request timed out. Please try again.".to_owned()
                } else {
                    "Unable to reach the server. Check your connection and try again."
                        .to_owned()
                }
            }
            LinkcardError::Server { status, message } => {
                translate_server_failure(*status, message).to_owned()
            }
            _ => GENERIC_MESSAGE.to_owned(),
        }
    }

    /// Whether offering a retry makes sense for this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkcardError::Network(_) => true,
            LinkcardError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

fn translate_server_failure(status: u16, message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if lower.contains("duplicate key")
        || lower.contains("unique constraint")
        || lower.contains("already exists")
        || lower.contains("already taken")
        || status == 409
    {
        "That value is already in use. Please choose another one."
    } else if status == 413
        || lower.contains("too large")
        || lower.contains("file size")
    {
        "The file is too large. Please choose an image under 5 MB."
    } else if status == 415
        || lower.contains("invalid file type")
        || lower.contains("unsupported media")
    {
        "Only JPEG and PNG images are allowed."
    } else if status == 404 {
        "We couldn't find what you were looking for."
    } else if status == 429 {
        "Too many requests. Please wait a moment and try again."
    } else if status >= 500 {
        "Something went wrong on our side. Please try again later."
    } else {
        GENERIC_MESSAGE
    }
}

impl From<serde_json::Error> for LinkcardError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}

impl From<url::ParseError> for LinkcardError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<toml::de::Error> for LinkcardError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for LinkcardError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<reqwest::Error> for LinkcardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Parse;
        }
        match e.status() {
            Some(status) => Self::Server {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => Self::Network(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violations_become_friendly() {
        let err = LinkcardError::Server {
            status: 500,
            message: "ERROR: duplicate key value violates unique constraint \"users_slug_key\"".to_owned(),
        };
        let message = err.user_message();
        assert_eq!(
            message,
            "That value is already in use. Please choose another one."
        );
        assert!(!message.contains("users_slug_key"));
    }

    #[test]
    fn unknown_failures_fall_back_to_generic() {
        let err = LinkcardError::Server {
            status: 400,
            message: "stack trace at Handler.java:42".to_owned(),
        };
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
        assert_eq!(LinkcardError::Parse.user_message(), GENERIC_MESSAGE);
    }

    #[test]
    fn server_errors_are_retryable_but_conflicts_are_not() {
        assert!(LinkcardError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(LinkcardError::Network("connection refused".to_owned())
            .is_retryable());
        assert!(!LinkcardError::AvailabilityConflict("taken".to_owned())
            .is_retryable());
        assert!(!LinkcardError::Unauthenticated.is_retryable());
    }

    #[test]
    fn media_size_message_names_the_limit() {
        let err = ValidationError::MediaTooLarge {
            size: 6 * MEBIBYTE,
            max: 5 * MEBIBYTE,
        };
        assert_eq!(err.to_string(), "Image must be 5 MB or smaller");
    }
}
