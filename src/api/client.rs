use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::types::{
    Availability, AuthSession, ClaimResponse, Envelope, GoogleCallbackRequest,
    LoginRequest, QrCode, RegisterRequest, UpdateSlugRequest,
};
use super::{
    AuthService, ProfileService, SlugService, CHECK_SLUG_PATH,
    CONTACT_INFO_PATH, GOOGLE_CALLBACK_PATH, LOGIN_PATH, OWN_QR_CODE_PATH,
    PROFILE_PATH, REGISTER_PATH, UPDATE_SLUG_PATH, USERS_PATH,
};
use crate::config::ClientConfig;
use crate::profile::{Contact, Profile, ProfileUpdate};
use crate::slug::Slug;
use crate::{LinkcardError, Result};

/// HTTP client for the card backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("linkcard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: config.api_base_url.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let (status, body) = self.fetch(request).await?;
        decode_envelope(status, &body)
    }

    /// Run `request` and return the body of a 2xx response. Any other
    /// status is classified into an error.
    async fn fetch(&self, request: RequestBuilder) -> Result<(u16, String)> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        log::debug!("api: response status {}", status);

        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &body));
        }
        Ok((status, body))
    }

    pub async fn update_contact_info(
        &self,
        token: &str,
        contact: &Contact,
    ) -> Result<Profile> {
        let token = bearer(token)?;
        let url = self.endpoint(CONTACT_INFO_PATH)?;
        log::info!("api: updating contact info");
        self.send(self.http.put(url).bearer_auth(token).json(contact))
            .await
    }

    pub async fn qr_code(&self, token: &str) -> Result<QrCode> {
        let token = bearer(token)?;
        let url = self.endpoint(OWN_QR_CODE_PATH)?;
        self.send(self.http.get(url).bearer_auth(token)).await
    }

    pub async fn public_qr_code(&self, slug: &Slug) -> Result<QrCode> {
        let url = self.endpoint(&format!("{}/{}/qrcode", USERS_PATH, slug))?;
        self.send(self.http.get(url)).await
    }

    async fn put_profile_form(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile> {
        let mut form = Form::new();
        for (name, value) in update.text_fields() {
            form = form.text(name, value);
        }
        for (slot, file) in update.media() {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(slot.field_name(), part);
        }

        let url = self.endpoint(PROFILE_PATH)?;
        log::info!(
            "api: updating profile fields {:?}",
            update.changed_fields()
        );
        self.send(self.http.put(url).bearer_auth(token).multipart(form))
            .await
    }
}

#[async_trait]
impl SlugService for ApiClient {
    async fn check_availability(&self, slug: &Slug) -> Result<Availability> {
        let url = self.endpoint(&format!("{}/{}", CHECK_SLUG_PATH, slug))?;
        log::debug!("api: checking availability of {}", slug);
        let (status, body) = self.fetch(self.http.get(url)).await?;
        decode_availability(status, &body)
    }

    async fn claim_slug(
        &self,
        slug: &Slug,
        token: &str,
    ) -> Result<ClaimResponse> {
        let token = bearer(token)?;
        let url = self.endpoint(UPDATE_SLUG_PATH)?;
        log::info!("api: claiming {}", slug);
        let request = self.http.put(url).bearer_auth(token).json(
            &UpdateSlugRequest {
                slug: slug.to_string(),
            },
        );
        let (_, body) = self.fetch(request).await.map_err(slug_conflict)?;
        decode_claim(slug, &body)
    }
}

#[async_trait]
impl ProfileService for ApiClient {
    async fn public_profile(&self, slug: &Slug) -> Result<Profile> {
        let url = self.endpoint(&format!("{}/{}", USERS_PATH, slug))?;
        self.send(self.http.get(url)).await
    }

    /// A changed slug is claimed first, then the form fields and media are
    /// sent, then the contact record. The last response wins.
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile> {
        let token = bearer(token)?;
        let mut latest = None;

        if let Some(slug) = &update.slug {
            latest = self.claim_slug(slug, token).await?.data;
        }
        if update.touches_profile_form() {
            latest = Some(self.put_profile_form(token, update).await?);
        }
        if let Some(contact) = &update.contact {
            latest = Some(self.update_contact_info(token, contact).await?);
        }

        match (latest, &update.slug) {
            (Some(profile), _) => Ok(profile),
            (None, Some(slug)) => self.public_profile(slug).await,
            (None, None) => Err(anyhow!("empty profile update").into()),
        }
    }
}

#[async_trait]
impl AuthService for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthSession> {
        let url = self.endpoint(REGISTER_PATH)?;
        log::info!("api: registering {}", request.email);
        self.send(self.http.post(url).json(request)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthSession> {
        let url = self.endpoint(LOGIN_PATH)?;
        log::info!("api: logging in {}", request.email);
        self.send(self.http.post(url).json(request)).await
    }

    async fn google_callback(&self, code: &str) -> Result<AuthSession> {
        let url = self.endpoint(GOOGLE_CALLBACK_PATH)?;
        self.send(self.http.post(url).json(&GoogleCallbackRequest {
            code: code.to_owned(),
        }))
        .await
    }
}

fn bearer(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(LinkcardError::Unauthenticated);
    }
    Ok(token)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    envelope.into_data(status)
}

/// The reason for a taken slug may sit in the envelope instead of the
/// payload.
fn decode_availability(status: u16, body: &str) -> Result<Availability> {
    let envelope: Envelope<Availability> = serde_json::from_str(body)?;
    let message = envelope.message.clone();
    let mut availability = envelope.into_data(status)?;
    if availability.message.is_none() {
        availability.message = message;
    }
    Ok(availability)
}

fn decode_claim(slug: &Slug, body: &str) -> Result<ClaimResponse> {
    let claim: ClaimResponse = serde_json::from_str(body)?;
    if !claim.success {
        return Err(LinkcardError::AvailabilityConflict(slug.to_string()));
    }
    Ok(claim)
}

/// On the slug endpoint a 409 means someone else holds the slug.
fn slug_conflict(err: LinkcardError) -> LinkcardError {
    match err {
        LinkcardError::Server {
            status: 409,
            message,
        } => LinkcardError::AvailabilityConflict(message),
        other => other,
    }
}

/// Map a non-2xx response onto the error taxonomy. The backend message is
/// kept for logs and translation, never shown as is.
pub(crate) fn classify_failure(status: u16, body: &str) -> LinkcardError {
    let message = serde_json::from_str::<Envelope<Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| body.trim().to_owned());
    log::warn!("api: request failed with {}: {}", status, message);

    match status {
        401 | 403 => LinkcardError::Unauthenticated,
        _ => LinkcardError::Server { status, message },
    }
}
