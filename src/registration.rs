//! Claiming a slug after sign-up.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::api::{AuthService, AuthSession, LoginRequest, SlugService};
use crate::availability::{AvailabilityEvent, SlugAvailability, SlugStatus};
use crate::session::SessionStore;
use crate::slug::Slug;
use crate::{LinkcardError, Result};

/// Where the app should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Dashboard,
    ClaimSlug,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    Google,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
            Credential::Google => f.write_str("Google"),
        }
    }
}

/// What sign-up leaves behind for the slug step. Lives only in memory and
/// is consumed once the slug is claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub session: Option<AuthSession>,
    pub created_at: DateTime<Utc>,
}

impl RegistrationDraft {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        credential: Credential,
        session: Option<AuthSession>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            credential,
            session,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRejection {
    /// Someone else got the slug between the check and the claim.
    Conflict,
    Unauthenticated,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed {
        slug: Slug,
        redirect: Navigation,
    },
    Rejected {
        slug: Slug,
        reason: ClaimRejection,
        message: String,
        retryable: bool,
    },
}

/// The slug step of sign-up: debounced availability checks followed by a
/// claim that hands the session over to the [`SessionStore`].
pub struct SlugRegistration {
    availability: SlugAvailability,
    slugs: Arc<dyn SlugService>,
    auth: Arc<dyn AuthService>,
    session: Arc<SessionStore>,
}

impl SlugRegistration {
    pub fn new(
        slugs: Arc<dyn SlugService>,
        auth: Arc<dyn AuthService>,
        session: Arc<SessionStore>,
        debounce: Duration,
    ) -> Self {
        let own_slug = session.current_user().and_then(|user| user.slug);
        Self {
            availability: SlugAvailability::new(
                Arc::clone(&slugs),
                own_slug,
                debounce,
            ),
            slugs,
            auth,
            session,
        }
    }

    pub fn status(&self) -> &SlugStatus {
        self.availability.status()
    }

    pub fn can_submit(&self) -> bool {
        self.status().is_submittable()
    }

    pub fn input(&mut self, raw: &str) -> &SlugStatus {
        self.availability.input(raw)
    }

    pub async fn next_event(&mut self) -> Option<AvailabilityEvent> {
        self.availability.next_event().await
    }

    pub async fn settle(&mut self) -> &SlugStatus {
        self.availability.settle().await
    }

    /// Claim the slug currently shown as available.
    ///
    /// Only a local rule violation (nothing claimable) or a failure to
    /// persist the new session is returned as `Err`. After the latter the
    /// field shows `ClaimFailed` and resubmitting the same slug skips the
    /// availability check. Every remote failure, conflicts included, comes
    /// back as [`ClaimOutcome::Rejected`] and leaves the registration draft
    /// in place.
    pub async fn submit(&mut self) -> Result<ClaimOutcome> {
        let slug = self.availability.tracker_mut().begin_claim()?;
        log::info!("slug/{}: claiming", slug);

        let auth = match self.claiming_session().await {
            Ok(auth) => auth,
            Err(err) => return Ok(self.reject(slug, err)),
        };

        match self.slugs.claim_slug(&slug, &auth.token).await {
            Ok(response) => {
                let mut user = response.data.unwrap_or(auth.user);
                user.slug = Some(slug.clone());
                let claimed = AuthSession {
                    token: auth.token,
                    user,
                };
                if let Err(err) = self.session.login(claimed.clone()) {
                    return Err(self.unsaved(slug, claimed, err));
                }
                self.session.take_draft();
                self.availability
                    .tracker_mut()
                    .claim_succeeded(slug.clone());
                log::info!("slug/{}: claimed", slug);
                Ok(ClaimOutcome::Claimed {
                    slug,
                    redirect: Navigation::Dashboard,
                })
            }
            Err(err) => Ok(self.reject(slug, err)),
        }
    }

    /// The session to claim with: the one carried by the registration
    /// draft, a fresh login with the draft's password, or the current one.
    async fn claiming_session(&self) -> Result<AuthSession> {
        if let Some(mut draft) = self.session.draft() {
            if let Some(session) = draft.session {
                return Ok(session);
            }
            if let Credential::Password(password) = &draft.credential {
                let session = self
                    .auth
                    .login(&LoginRequest {
                        email: draft.email.clone(),
                        password: password.clone(),
                    })
                    .await?;
                draft.session = Some(session.clone());
                self.session.stash_draft(draft);
                return Ok(session);
            }
            return Err(LinkcardError::Unauthenticated);
        }

        match (self.session.token(), self.session.current_user()) {
            (Some(token), Some(user)) => Ok(AuthSession { token, user }),
            _ => Err(LinkcardError::Unauthenticated),
        }
    }

    /// The server holds the claim but the session could not be stored.
    /// The draft keeps the claimed session so the next submit can store it.
    fn unsaved(
        &mut self,
        slug: Slug,
        claimed: AuthSession,
        err: LinkcardError,
    ) -> LinkcardError {
        log::error!("slug/{}: claimed but not saved: {}", slug, err);
        if let Some(mut draft) = self.session.draft() {
            draft.session = Some(claimed);
            self.session.stash_draft(draft);
        }
        self.availability
            .tracker_mut()
            .claim_unsaved(slug, err.user_message());
        err
    }

    fn reject(&mut self, slug: Slug, err: LinkcardError) -> ClaimOutcome {
        let reason = match &err {
            LinkcardError::AvailabilityConflict(_) => ClaimRejection::Conflict,
            LinkcardError::Unauthenticated => ClaimRejection::Unauthenticated,
            _ => ClaimRejection::Failed,
        };
        let message = err.user_message();
        log::warn!("slug/{}: claim failed: {}", slug, err);
        self.availability
            .tracker_mut()
            .claim_failed(slug.clone(), message.clone());
        ClaimOutcome::Rejected {
            slug,
            reason,
            message,
            retryable: err.is_retryable(),
        }
    }
}
