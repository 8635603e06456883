use std::path::PathBuf;

use linkcard::profile::{ContactField, MediaFile, MediaSlot, ProfileField};
use linkcard::{ProfileEditor, SaveOutcome};

use super::show::print_card;
use super::{describe, Context};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "edit", about = "Change fields on your card")]
pub struct Edit {
    #[clap(long)]
    name: Option<String>,
    #[clap(long)]
    title: Option<String>,
    #[clap(long)]
    bio: Option<String>,
    #[clap(long)]
    email: Option<String>,
    #[clap(long)]
    website: Option<String>,
    #[clap(long, help = "New slug; checked for availability first")]
    slug: Option<String>,
    #[clap(long)]
    phone: Option<String>,
    #[clap(long)]
    whatsapp: Option<String>,
    #[clap(long)]
    address: Option<String>,
    #[clap(long)]
    linkedin: Option<String>,
    #[clap(long)]
    twitter: Option<String>,
    #[clap(long)]
    instagram: Option<String>,
    #[clap(long, value_parser, help = "JPEG or PNG, 5 MB at most")]
    photo: Option<PathBuf>,
    #[clap(long, value_parser, help = "JPEG or PNG, 5 MB at most")]
    logo: Option<PathBuf>,
}

impl Edit {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        ctx.signed_in_user()?;
        let mut editor = ProfileEditor::new(
            ctx.session.clone(),
            ctx.client.clone(),
            ctx.config.debounce(),
        )?;

        let fields = [
            (ProfileField::DisplayName, &self.name),
            (ProfileField::Title, &self.title),
            (ProfileField::Bio, &self.bio),
            (ProfileField::Email, &self.email),
            (ProfileField::Website, &self.website),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                editor.update_field(field, value);
            }
        }

        let contact = [
            (ContactField::Phone, &self.phone),
            (ContactField::Whatsapp, &self.whatsapp),
            (ContactField::Address, &self.address),
            (ContactField::Linkedin, &self.linkedin),
            (ContactField::Twitter, &self.twitter),
            (ContactField::Instagram, &self.instagram),
        ];
        for (field, value) in contact {
            if let Some(value) = value {
                editor.update_contact(field, value);
            }
        }

        let media = [(MediaSlot::Photo, &self.photo), (MediaSlot::CompanyLogo, &self.logo)];
        for (slot, path) in media {
            if let Some(path) = path {
                let file = MediaFile::from_path(path)?;
                editor
                    .select_media(slot, file)
                    .map_err(AppError::Invalid)?;
            }
        }

        if let Some(slug) = &self.slug {
            editor.slug_input(slug);
            let status = editor.settle_slug().await;
            if !status.is_submittable() {
                return Err(AppError::Rejected(describe(status)));
            }
        }

        match editor.save().await? {
            SaveOutcome::NoChanges => println!("Nothing to change."),
            SaveOutcome::Saved(profile) => {
                println!("Saved.");
                print_card(&profile);
            }
            SaveOutcome::Failed { message, retryable } => {
                let hint = if retryable { " Try again in a moment." } else { "" };
                return Err(AppError::Rejected(format!("{}{}", message, hint)));
            }
        }
        Ok(())
    }
}
