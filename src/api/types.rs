use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{LinkcardError, Result};
use crate::profile::Profile;

/// Every backend response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> Envelope<T> {
    pub fn into_data(self, status: u16) -> Result<T> {
        if !self.success {
            return Err(LinkcardError::Server {
                status,
                message: self.message.unwrap_or_default(),
            });
        }
        self.data.ok_or(LinkcardError::Parse)
    }
}

/// Result of a remote availability lookup. A taken slug is an ordinary
/// answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Availability {
    pub fn available() -> Self {
        Self {
            available: true,
            message: None,
        }
    }

    pub fn taken(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            message: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaimResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Profile>,
}

/// Token and user returned by the sign-up, login and Google endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: Profile,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GoogleCallbackRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSlugRequest {
    pub slug: String,
}

/// QR image rendered by the backend, as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QrCode {
    #[serde(alias = "qrCode", alias = "qr_code")]
    pub data_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_data() {
        let envelope: Envelope<Availability> = serde_json::from_str(
            r#"{"success":true,"data":{"available":false,"message":"taken"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_data(200).unwrap(), Availability::taken("taken"));
    }

    #[test]
    fn unsuccessful_envelope_is_an_error() {
        let envelope: Envelope<Availability> =
            serde_json::from_str(r#"{"success":false,"message":"nope"}"#)
                .unwrap();
        match envelope.into_data(200) {
            Err(LinkcardError::Server { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn qr_code_accepts_camel_case() {
        let qr: QrCode =
            serde_json::from_str(r#"{"qrCode":"data:image/png;base64,AAAA"}"#)
                .unwrap();
        assert!(qr.data_url.starts_with("data:image/png"));
    }

    #[test]
    fn secrets_stay_out_of_debug_output() {
        let request = LoginRequest {
            email: "a@b.co".to_owned(),
            password: "hunter22".to_owned(),
        };
        assert!(!format!("{:?}", request).contains("hunter22"));

        let session = AuthSession {
            token: "secret-token".to_owned(),
            user: Profile::default(),
        };
        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}
