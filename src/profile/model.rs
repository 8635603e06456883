use serde::{Deserialize, Serialize};

use crate::slug::Slug;

/// Contact details shown on a card. Every entry is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

impl Contact {
    fn entry_mut(&mut self, field: ContactField) -> &mut Option<String> {
        match field {
            ContactField::Phone => &mut self.phone,
            ContactField::Whatsapp => &mut self.whatsapp,
            ContactField::Address => &mut self.address,
            ContactField::Linkedin => &mut self.linkedin,
            ContactField::Twitter => &mut self.twitter,
            ContactField::Instagram => &mut self.instagram,
        }
    }

    pub fn set(&mut self, field: ContactField, value: &str) {
        *self.entry_mut(field) = non_empty(value);
    }
}

/// The durable profile as the server reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company_logo_url: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub contact: Contact,
}

/// Text fields that can be edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    DisplayName,
    Title,
    Bio,
    Email,
    Website,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Phone,
    Whatsapp,
    Address,
    Linkedin,
    Twitter,
    Instagram,
}

impl Profile {
    pub fn set(&mut self, field: ProfileField, value: &str) {
        match field {
            ProfileField::DisplayName => self.display_name = value.to_owned(),
            ProfileField::Email => self.email = value.trim().to_owned(),
            ProfileField::Title => self.title = non_empty(value),
            ProfileField::Bio => self.bio = non_empty(value),
            ProfileField::Website => self.website = non_empty(value),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_are_cleared() {
        let mut profile = Profile {
            bio: Some("hello".to_owned()),
            ..Default::default()
        };
        profile.set(ProfileField::Bio, "   ");
        assert_eq!(profile.bio, None);

        profile.contact.set(ContactField::Phone, "+1 555 0100");
        assert_eq!(profile.contact.phone.as_deref(), Some("+1 555 0100"));
        profile.contact.set(ContactField::Phone, "");
        assert_eq!(profile.contact.phone, None);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let profile: Profile = serde_json::from_str(
            r#"{"display_name":"Alice","slug":"alice","contact":{"phone":"123"}}"#,
        )
        .unwrap();
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.slug.unwrap().as_str(), "alice");
        assert_eq!(profile.contact.phone.as_deref(), Some("123"));
        assert_eq!(profile.contact.linkedin, None);
        assert_eq!(profile.photo_url, None);
    }
}
