use linkcard::{LinkcardError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}", .0.user_message())]
    Linkcard(#[from] LinkcardError),

    #[error("{}", join(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Not signed in. Run `linkcard login` first.")]
    NotSignedIn,

    #[error("You have no slug yet. Run `linkcard claim <slug>` first.")]
    NoSlug,

    #[error("{0}")]
    Rejected(String),

    #[error("Couldn't render QR code: {0}")]
    QrCode(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Invalid(vec![e])
    }
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
