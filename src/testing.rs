//! In-memory backend used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::api::{
    AuthService, AuthSession, Availability, ClaimResponse, LoginRequest,
    ProfileService, RegisterRequest, SlugService,
};
use crate::profile::{Profile, ProfileUpdate};
use crate::slug::Slug;
use crate::{LinkcardError, Result};

pub(crate) fn sample_profile() -> Profile {
    Profile {
        id: Some("user-1".to_owned()),
        display_name: "Alice".to_owned(),
        slug: Some(Slug::parse("alice").unwrap()),
        title: Some("Founder".to_owned()),
        bio: Some("Designer".to_owned()),
        email: "alice@example.com".to_owned(),
        ..Default::default()
    }
}

#[derive(Default)]
struct MockState {
    checks: Vec<String>,
    claims: Vec<String>,
    taken: HashSet<String>,
    claim_conflicts: HashSet<String>,
    held_checks: HashMap<String, oneshot::Receiver<()>>,
    updates: Vec<ProfileUpdate>,
    update_response: Option<Profile>,
    update_failure: Option<u16>,
    server_profile: Profile,
    auth_session: Option<AuthSession>,
}

pub(crate) struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                server_profile: sample_profile(),
                ..Default::default()
            }),
        })
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn mark_taken(&self, slug: &str) {
        self.with(|s| s.taken.insert(slug.to_owned()));
    }

    /// Claims of `slug`, direct or as part of a profile update, conflict.
    pub fn conflict_on_claim(&self, slug: &str) {
        self.with(|s| s.claim_conflicts.insert(slug.to_owned()));
    }

    /// The next check for `slug` blocks until the returned sender fires.
    pub fn hold_check(&self, slug: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.with(|s| s.held_checks.insert(slug.to_owned(), rx));
        tx
    }

    pub fn checks(&self) -> Vec<String> {
        self.with(|s| s.checks.clone())
    }

    pub fn claims(&self) -> Vec<String> {
        self.with(|s| s.claims.clone())
    }

    pub fn updates(&self) -> Vec<ProfileUpdate> {
        self.with(|s| s.updates.clone())
    }

    pub fn respond_to_updates_with(&self, profile: Profile) {
        self.with(|s| s.update_response = Some(profile));
    }

    pub fn fail_updates_with(&self, status: u16) {
        self.with(|s| s.update_failure = Some(status));
    }

    pub fn authenticate_as(&self, session: AuthSession) {
        self.with(|s| s.auth_session = Some(session));
    }
}

#[async_trait]
impl SlugService for MockBackend {
    async fn check_availability(&self, slug: &Slug) -> Result<Availability> {
        let held = self.with(|s| {
            s.checks.push(slug.to_string());
            s.held_checks.remove(slug.as_str())
        });
        if let Some(release) = held {
            let _ = release.await;
        }
        if self.with(|s| s.taken.contains(slug.as_str())) {
            Ok(Availability::taken("This username is already taken"))
        } else {
            Ok(Availability::available())
        }
    }

    async fn claim_slug(&self, slug: &Slug, token: &str) -> Result<ClaimResponse> {
        if token.is_empty() {
            return Err(LinkcardError::Unauthenticated);
        }
        self.with(|s| {
            s.claims.push(slug.to_string());
            if s.claim_conflicts.contains(slug.as_str()) {
                return Err(LinkcardError::AvailabilityConflict(
                    "Slug already taken".to_owned(),
                ));
            }
            s.server_profile.slug = Some(slug.clone());
            Ok(ClaimResponse {
                success: true,
                data: Some(s.server_profile.clone()),
            })
        })
    }
}

#[async_trait]
impl ProfileService for MockBackend {
    async fn public_profile(&self, _slug: &Slug) -> Result<Profile> {
        Ok(self.with(|s| s.server_profile.clone()))
    }

    async fn update_profile(
        &self,
        _token: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile> {
        self.with(|s| {
            s.updates.push(update.clone());
            if let Some(slug) = &update.slug {
                if s.claim_conflicts.contains(slug.as_str()) {
                    return Err(LinkcardError::AvailabilityConflict(
                        "Slug already taken".to_owned(),
                    ));
                }
            }
            if let Some(status) = s.update_failure {
                return Err(LinkcardError::Server {
                    status,
                    message: "update failed".to_owned(),
                });
            }
            if let Some(profile) = &s.update_response {
                return Ok(profile.clone());
            }
            let server = &mut s.server_profile;
            if let Some(name) = &update.display_name {
                server.display_name = name.clone();
            }
            if let Some(slug) = &update.slug {
                server.slug = Some(slug.clone());
            }
            if let Some(bio) = &update.bio {
                server.bio = Some(bio.clone()).filter(|b| !b.is_empty());
            }
            if let Some(title) = &update.title {
                server.title = Some(title.clone()).filter(|t| !t.is_empty());
            }
            if let Some(contact) = &update.contact {
                server.contact = contact.clone();
            }
            if let Some(photo) = &update.photo {
                server.photo_url =
                    Some(format!("https://cdn.example.com/{}", photo.file_name));
            }
            if let Some(logo) = &update.company_logo {
                server.company_logo_url =
                    Some(format!("https://cdn.example.com/{}", logo.file_name));
            }
            Ok(server.clone())
        })
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn register(&self, _request: &RegisterRequest) -> Result<AuthSession> {
        self.with(|s| s.auth_session.clone())
            .ok_or(LinkcardError::Server {
                status: 500,
                message: "no session configured".to_owned(),
            })
    }

    async fn login(&self, _request: &LoginRequest) -> Result<AuthSession> {
        self.with(|s| s.auth_session.clone())
            .ok_or(LinkcardError::Unauthenticated)
    }

    async fn google_callback(&self, _code: &str) -> Result<AuthSession> {
        self.with(|s| s.auth_session.clone())
            .ok_or(LinkcardError::Unauthenticated)
    }
}
