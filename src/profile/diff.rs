use crate::profile::media::{MediaFile, MediaSlot};
use crate::profile::model::{Contact, Profile};
use crate::slug::Slug;

/// The minimal set of changes to send on save. `None` means "unchanged";
/// a cleared optional text field is sent as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub slug: Option<Slug>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub contact: Option<Contact>,
    pub photo: Option<MediaFile>,
    pub company_logo: Option<MediaFile>,
}

impl ProfileUpdate {
    /// Compare `draft` with `confirmed` field by field. Media is not part
    /// of the profile record and has to be attached separately.
    pub fn between(confirmed: &Profile, draft: &Profile) -> Self {
        Self {
            display_name: changed(&confirmed.display_name, &draft.display_name)
                .cloned(),
            slug: changed(&confirmed.slug, &draft.slug).and_then(Clone::clone),
            title: changed_text(&confirmed.title, &draft.title),
            bio: changed_text(&confirmed.bio, &draft.bio),
            email: changed(&confirmed.email, &draft.email).cloned(),
            website: changed_text(&confirmed.website, &draft.website),
            contact: changed(&confirmed.contact, &draft.contact).cloned(),
            photo: None,
            company_logo: None,
        }
    }

    pub fn with_media(mut self, slot: MediaSlot, file: MediaFile) -> Self {
        match slot {
            MediaSlot::Photo => self.photo = Some(file),
            MediaSlot::CompanyLogo => self.company_logo = Some(file),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of everything this update touches, in wire order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.slug.is_some() {
            fields.push("slug");
        }
        fields.extend(self.text_fields().into_iter().map(|(name, _)| name));
        if self.contact.is_some() {
            fields.push("contact");
        }
        fields.extend(self.media().into_iter().map(|(slot, _)| slot.field_name()));
        fields
    }

    /// Changed plain text fields, ready for a form body.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("display_name", &self.display_name),
            ("title", &self.title),
            ("bio", &self.bio),
            ("email", &self.email),
            ("website", &self.website),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|value| (name, value)))
        .collect()
    }

    pub fn media(&self) -> Vec<(MediaSlot, &MediaFile)> {
        let mut media = Vec::new();
        if let Some(photo) = &self.photo {
            media.push((MediaSlot::Photo, photo));
        }
        if let Some(logo) = &self.company_logo {
            media.push((MediaSlot::CompanyLogo, logo));
        }
        media
    }

    /// Whether the multipart profile endpoint has anything to do.
    pub fn touches_profile_form(&self) -> bool {
        !self.text_fields().is_empty() || !self.media().is_empty()
    }
}

fn changed<'a, T: PartialEq>(confirmed: &T, draft: &'a T) -> Option<&'a T> {
    if confirmed == draft {
        None
    } else {
        Some(draft)
    }
}

fn changed_text(
    confirmed: &Option<String>,
    draft: &Option<String>,
) -> Option<String> {
    changed(confirmed, draft).map(|value| value.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Profile {
        Profile {
            display_name: "Alice".to_owned(),
            slug: Some(Slug::parse("alice").unwrap()),
            bio: Some("Designer".to_owned()),
            email: "alice@example.com".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn identical_profiles_produce_no_update() {
        let update = ProfileUpdate::between(&alice(), &alice());
        assert!(update.is_empty());
        assert!(!update.touches_profile_form());
    }

    #[test]
    fn only_changed_fields_are_included() {
        let mut draft = alice();
        draft.bio = Some("Product designer".to_owned());
        let update = ProfileUpdate::between(&alice(), &draft);

        assert_eq!(update.changed_fields(), vec!["bio"]);
        assert_eq!(
            update.text_fields(),
            vec![("bio", "Product designer".to_owned())]
        );
    }

    #[test]
    fn cleared_text_is_sent_as_empty() {
        let mut draft = alice();
        draft.bio = None;
        let update = ProfileUpdate::between(&alice(), &draft);
        assert_eq!(update.bio.as_deref(), Some(""));
    }

    #[test]
    fn contact_is_compared_as_a_whole() {
        let mut draft = alice();
        draft.contact.linkedin = Some("in/alice".to_owned());
        let update = ProfileUpdate::between(&alice(), &draft);

        assert_eq!(update.changed_fields(), vec!["contact"]);
        assert_eq!(update.contact, Some(draft.contact.clone()));
        assert!(!update.touches_profile_form());
    }

    #[test]
    fn media_is_listed_after_text() {
        let update = ProfileUpdate::default()
            .with_media(
                MediaSlot::CompanyLogo,
                MediaFile::new("logo.png", "image/png", vec![1]),
            )
            .with_media(
                MediaSlot::Photo,
                MediaFile::new("me.jpg", "image/jpeg", vec![2]),
            );
        assert_eq!(update.changed_fields(), vec!["photo", "company_logo"]);
        assert!(update.touches_profile_form());
    }
}
