//! Backend collaborators.
//!
//! The core only talks to the backend through the [`SlugService`],
//! [`ProfileService`] and [`AuthService`] traits; [`ApiClient`] implements
//! all three over HTTP.

use async_trait::async_trait;

use crate::profile::{Profile, ProfileUpdate};
use crate::slug::Slug;
use crate::Result;

mod client;
mod types;

pub use client::ApiClient;
pub use types::{
    Availability, AuthSession, ClaimResponse, Envelope,
    GoogleCallbackRequest, LoginRequest, QrCode, RegisterRequest,
    UpdateSlugRequest,
};

pub const REGISTER_PATH: &str = "/api/v1/auth/register";
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const GOOGLE_CALLBACK_PATH: &str = "/api/v1/auth/google/callback";
pub const CHECK_SLUG_PATH: &str = "/api/v1/users/check-slug";
pub const UPDATE_SLUG_PATH: &str = "/api/v1/users/update-slug";
pub const USERS_PATH: &str = "/api/v1/users";
pub const PROFILE_PATH: &str = "/api/v1/users/me/profile";
pub const CONTACT_INFO_PATH: &str = "/api/v1/users/me/contact-info";
pub const OWN_QR_CODE_PATH: &str = "/api/v1/users/me/qrcode";

#[async_trait]
pub trait SlugService: Send + Sync {
    /// Ask whether `slug` is free. A taken slug is reported through
    /// [`Availability::available`], not as an error.
    async fn check_availability(&self, slug: &Slug) -> Result<Availability>;

    /// Claim `slug` for the account behind `token`. Losing a race to
    /// another account yields
    /// [`LinkcardError::AvailabilityConflict`](crate::LinkcardError::AvailabilityConflict).
    async fn claim_slug(&self, slug: &Slug, token: &str)
        -> Result<ClaimResponse>;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn public_profile(&self, slug: &Slug) -> Result<Profile>;

    /// Apply `update` and return the profile as the server now has it.
    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<AuthSession>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthSession>;

    async fn google_callback(&self, code: &str) -> Result<AuthSession>;
}
