use std::sync::Arc;
use std::time::Duration;

use crate::api::SlugService;
use crate::availability::{AvailabilityEvent, SlugAvailability, SlugStatus};
use crate::errors::ValidationError;
use crate::profile::diff::ProfileUpdate;
use crate::profile::media::{MediaFile, MediaSlot, PendingUpload, PreviewRegistry};
use crate::profile::model::{ContactField, Profile, ProfileField};
use crate::session::SessionStore;
use crate::slug::Slug;
use crate::{LinkcardError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NoChanges,
    /// The server accepted the update; this is the profile it returned.
    Saved(Profile),
    Failed { message: String, retryable: bool },
}

/// Edit session for the signed-in user's profile.
///
/// Edits go to a draft. The confirmed snapshot, which is what previews
/// render, only ever changes to a profile returned by the server.
pub struct ProfileEditor {
    session: Arc<SessionStore>,
    confirmed: Profile,
    draft: Profile,
    photo: Option<PendingUpload>,
    company_logo: Option<PendingUpload>,
    previews: Arc<PreviewRegistry>,
    slug: SlugAvailability,
}

impl ProfileEditor {
    pub fn new(
        session: Arc<SessionStore>,
        slugs: Arc<dyn SlugService>,
        debounce: Duration,
    ) -> Result<Self> {
        let profile = session
            .current_user()
            .ok_or(LinkcardError::Unauthenticated)?;
        let slug = SlugAvailability::new(slugs, profile.slug.clone(), debounce);
        Ok(Self {
            session,
            confirmed: profile.clone(),
            draft: profile,
            photo: None,
            company_logo: None,
            previews: PreviewRegistry::new(),
            slug,
        })
    }

    /// Start over from `profile`, dropping every unsaved edit.
    pub fn load_snapshot(&mut self, profile: Profile) {
        self.photo = None;
        self.company_logo = None;
        self.slug.reset(profile.slug.clone());
        self.confirmed = profile.clone();
        self.draft = profile;
    }

    pub fn confirmed(&self) -> &Profile {
        &self.confirmed
    }

    pub fn draft(&self) -> &Profile {
        &self.draft
    }

    /// What the card preview shows.
    pub fn preview(&self) -> &Profile {
        &self.confirmed
    }

    pub fn pending_preview(&self, slot: MediaSlot) -> Option<&str> {
        self.pending(slot).as_ref().map(|upload| upload.preview.uri())
    }

    pub fn previews(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    pub fn update_field(&mut self, field: ProfileField, value: &str) {
        self.draft.set(field, value);
    }

    pub fn update_contact(&mut self, field: ContactField, value: &str) {
        self.draft.contact.set(field, value);
    }

    pub fn slug_status(&self) -> &SlugStatus {
        self.slug.status()
    }

    pub fn slug_input(&mut self, raw: &str) -> &SlugStatus {
        self.slug.input(raw);
        self.draft.slug = Slug::parse(self.slug.tracker().input())
            .ok()
            .or_else(|| self.confirmed.slug.clone());
        self.slug.status()
    }

    pub async fn next_slug_event(&mut self) -> Option<AvailabilityEvent> {
        self.slug.next_event().await
    }

    pub async fn settle_slug(&mut self) -> &SlugStatus {
        self.slug.settle().await
    }

    /// Stage an image for the next save and return its preview reference.
    /// A rejected file leaves whatever was staged before in place.
    pub fn select_media(
        &mut self,
        slot: MediaSlot,
        file: MediaFile,
    ) -> std::result::Result<String, Vec<ValidationError>> {
        let violations = file.violations();
        if !violations.is_empty() {
            log::debug!("media/{}: rejected {:?}", slot, file);
            return Err(violations);
        }
        let preview = self.previews.create(slot);
        let uri = preview.uri().to_owned();
        *self.pending_mut(slot) = Some(PendingUpload { file, preview });
        Ok(uri)
    }

    pub fn clear_media(&mut self, slot: MediaSlot) {
        *self.pending_mut(slot) = None;
    }

    /// Everything that differs from the confirmed snapshot, staged media
    /// included.
    pub fn changes(&self) -> ProfileUpdate {
        let mut update = ProfileUpdate::between(&self.confirmed, &self.draft);
        for slot in [MediaSlot::Photo, MediaSlot::CompanyLogo] {
            if let Some(upload) = self.pending(slot) {
                update = update.with_media(slot, upload.file.clone());
            }
        }
        update
    }

    pub fn is_dirty(&self) -> bool {
        !self.changes().is_empty()
    }

    /// Send the changes to the server.
    ///
    /// Local rule violations are returned as `Err` before anything is sent.
    /// A failed request leaves the draft, the snapshot and staged media as
    /// they were.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        if self.slug.status().is_pending() {
            self.slug.settle().await;
        }
        self.check_slug()?;
        if self.draft.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("display_name").into());
        }

        let update = self.changes();
        if update.is_empty() {
            return Ok(SaveOutcome::NoChanges);
        }
        log::info!("profile: saving {:?}", update.changed_fields());

        match self.session.update_profile(&update).await {
            Ok(profile) => {
                self.load_snapshot(profile.clone());
                Ok(SaveOutcome::Saved(profile))
            }
            Err(err) => {
                log::warn!("profile: save failed: {}", err);
                if let (LinkcardError::AvailabilityConflict(_), Some(slug)) =
                    (&err, update.slug)
                {
                    self.slug
                        .tracker_mut()
                        .claim_failed(slug, err.user_message());
                }
                Ok(SaveOutcome::Failed {
                    message: err.user_message(),
                    retryable: err.is_retryable(),
                })
            }
        }
    }

    pub fn discard(&mut self) {
        self.load_snapshot(self.confirmed.clone());
    }

    fn check_slug(&self) -> std::result::Result<(), ValidationError> {
        match self.slug.status() {
            SlugStatus::Available { .. } | SlugStatus::Claimed { .. } => Ok(()),
            SlugStatus::Empty if self.confirmed.slug.is_none() => Ok(()),
            SlugStatus::Empty => Err(ValidationError::SlugEmpty),
            SlugStatus::Invalid { reason, .. } => Err(reason.clone()),
            _ => Err(ValidationError::NotSubmittable),
        }
    }

    fn pending(&self, slot: MediaSlot) -> &Option<PendingUpload> {
        match slot {
            MediaSlot::Photo => &self.photo,
            MediaSlot::CompanyLogo => &self.company_logo,
        }
    }

    fn pending_mut(&mut self, slot: MediaSlot) -> &mut Option<PendingUpload> {
        match slot {
            MediaSlot::Photo => &mut self.photo,
            MediaSlot::CompanyLogo => &mut self.company_logo,
        }
    }
}
