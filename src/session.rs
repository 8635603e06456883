use std::sync::{Arc, PoisonError, RwLock};

use crate::api::{AuthSession, ProfileService};
use crate::profile::{Profile, ProfileUpdate};
use crate::registration::RegistrationDraft;
use crate::slug::Slug;
use crate::storage::SessionFile;
use crate::{LinkcardError, Result};

/// The signed-in user, their token, and the transient registration draft.
///
/// Constructed once by the application and shared by reference; the
/// session survives restarts when backed by a [`SessionFile`], the draft
/// never does.
pub struct SessionStore {
    profiles: Arc<dyn ProfileService>,
    file: Option<SessionFile>,
    current: RwLock<Option<AuthSession>>,
    draft: RwLock<Option<RegistrationDraft>>,
}

impl SessionStore {
    pub fn in_memory(profiles: Arc<dyn ProfileService>) -> Self {
        Self {
            profiles,
            file: None,
            current: RwLock::new(None),
            draft: RwLock::new(None),
        }
    }

    /// Reload whatever session `file` holds.
    pub fn restore(
        profiles: Arc<dyn ProfileService>,
        file: SessionFile,
    ) -> Result<Self> {
        let current = file.read()?;
        if current.is_some() {
            log::info!("session: restored from {:?}", file.path());
        }
        Ok(Self {
            profiles,
            file: Some(file),
            current: RwLock::new(current),
            draft: RwLock::new(None),
        })
    }

    pub fn current_user(&self) -> Option<Profile> {
        self.read_current()
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.read_current()
            .as_ref()
            .map(|session| session.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_current().is_some()
    }

    pub fn login(&self, session: AuthSession) -> Result<()> {
        log::info!("session: signed in as {}", session.user.email);
        self.persist(&session)?;
        *self.write_current() = Some(session);
        Ok(())
    }

    /// Drop the session and any registration in progress.
    pub fn logout(&self) -> Result<()> {
        *self.write_current() = None;
        self.abandon_draft();
        if let Some(file) = &self.file {
            file.erase()?;
        }
        log::info!("session: signed out");
        Ok(())
    }

    /// Send `update` to the server and adopt the profile it returns.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile> {
        let token = self.token().ok_or(LinkcardError::Unauthenticated)?;
        let profile = self.profiles.update_profile(&token, update).await?;
        self.replace_user(profile.clone())?;
        Ok(profile)
    }

    /// The in-memory user only changes once the new session is on disk.
    pub fn replace_user(&self, user: Profile) -> Result<()> {
        let token = self.token().ok_or(LinkcardError::Unauthenticated)?;
        let session = AuthSession { token, user };
        self.persist(&session)?;
        *self.write_current() = Some(session);
        Ok(())
    }

    pub fn set_slug(&self, slug: Slug) -> Result<()> {
        match self.current_user() {
            Some(mut user) => {
                user.slug = Some(slug);
                self.replace_user(user)
            }
            None => Err(LinkcardError::Unauthenticated),
        }
    }

    pub fn stash_draft(&self, draft: RegistrationDraft) {
        log::debug!("session: registration draft for {} stashed", draft.email);
        *self.draft.write().unwrap_or_else(PoisonError::into_inner) = Some(draft);
    }

    pub fn draft(&self) -> Option<RegistrationDraft> {
        self.draft
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Consume the draft; it can be taken only once.
    pub fn take_draft(&self) -> Option<RegistrationDraft> {
        self.draft
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn abandon_draft(&self) {
        if self.take_draft().is_some() {
            log::debug!("session: registration draft abandoned");
        }
    }

    fn persist(&self, session: &AuthSession) -> Result<()> {
        match &self.file {
            Some(file) => file.write(session),
            None => Ok(()),
        }
    }

    fn read_current(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, Option<AuthSession>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_current(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Option<AuthSession>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::Credential;
    use crate::testing::{sample_profile, MockBackend};
    use tempdir::TempDir;

    fn session() -> AuthSession {
        AuthSession {
            token: "token-1".to_owned(),
            user: sample_profile(),
        }
    }

    #[test]
    fn session_survives_a_restart() {
        let dir = TempDir::new("linkcard_store").unwrap();
        let path = dir.path().join("session.json");
        let backend = MockBackend::new();

        let store =
            SessionStore::restore(backend.clone(), SessionFile::new("test", &path))
                .unwrap();
        assert!(!store.is_authenticated());
        store.login(session()).unwrap();

        let reloaded =
            SessionStore::restore(backend.clone(), SessionFile::new("test", &path))
                .unwrap();
        assert_eq!(reloaded.token().as_deref(), Some("token-1"));
        assert_eq!(reloaded.current_user(), Some(sample_profile()));

        reloaded.logout().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn draft_is_taken_once() {
        let store = SessionStore::in_memory(MockBackend::new());
        store.stash_draft(RegistrationDraft::new(
            "Alice",
            "alice@example.com",
            Credential::Password("correct horse".to_owned()),
            Some(session()),
        ));
        assert!(store.draft().is_some());
        assert!(store.take_draft().is_some());
        assert!(store.take_draft().is_none());
    }

    #[tokio::test]
    async fn update_requires_a_session() {
        let store = SessionStore::in_memory(MockBackend::new());
        let result = store.update_profile(&ProfileUpdate::default()).await;
        assert!(matches!(result, Err(LinkcardError::Unauthenticated)));
    }

    #[tokio::test]
    async fn update_adopts_the_server_profile() {
        let backend = MockBackend::new();
        let store = SessionStore::in_memory(backend.clone());
        store.login(session()).unwrap();

        let mut server_side = sample_profile();
        server_side.bio = Some("From the server".to_owned());
        backend.respond_to_updates_with(server_side.clone());

        let update = ProfileUpdate {
            bio: Some("Typed locally".to_owned()),
            ..Default::default()
        };
        let profile = store.update_profile(&update).await.unwrap();
        assert_eq!(profile, server_side);
        assert_eq!(store.current_user(), Some(server_side));
    }

    #[tokio::test]
    async fn unwritable_update_keeps_the_previous_user() {
        let dir = TempDir::new("linkcard_store").unwrap();
        let state = dir.path().join("state");
        let backend = MockBackend::new();
        let store = SessionStore::restore(
            backend.clone(),
            SessionFile::new("test", &state.join("session.json")),
        )
        .unwrap();
        store.login(session()).unwrap();

        std::fs::remove_dir_all(&state).unwrap();
        std::fs::write(&state, b"not a directory").unwrap();

        let mut server_side = sample_profile();
        server_side.bio = Some("From the server".to_owned());
        backend.respond_to_updates_with(server_side);

        let update = ProfileUpdate {
            bio: Some("Typed locally".to_owned()),
            ..Default::default()
        };
        assert!(store.update_profile(&update).await.is_err());
        assert_eq!(store.current_user(), Some(sample_profile()));
        assert_eq!(store.token().as_deref(), Some("token-1"));
    }
}
