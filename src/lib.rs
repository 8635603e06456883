//! Client core for linkcard, a digital business card service.
//!
//! Covers picking and claiming a public slug, editing the profile behind
//! the card, and keeping the signed-in session. Remote calls go through the
//! traits in [`api`] so every flow can run against any backend.

pub mod api;
pub mod auth;
pub mod availability;
pub mod config;
pub mod debounce;
pub mod errors;
pub mod profile;
pub mod registration;
pub mod session;
pub mod share;
pub mod slug;
pub mod storage;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, AuthService, ProfileService, SlugService};
pub use availability::{AvailabilityEvent, SlugStatus};
pub use config::ClientConfig;
pub use errors::{LinkcardError, Result, ValidationError};
pub use profile::{Profile, ProfileEditor, ProfileUpdate, SaveOutcome};
pub use registration::{ClaimOutcome, Navigation, SlugRegistration};
pub use session::SessionStore;
pub use slug::Slug;
