use linkcard::share::profile_url;
use linkcard::{Profile, ProfileService, Slug};

use super::Context;
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "show", about = "Print a public card")]
pub struct Show {
    #[clap(help = "Whose card to show; defaults to your own")]
    slug: Option<String>,
}

impl Show {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        let slug = match &self.slug {
            Some(raw) => Slug::parse(raw)?,
            None => ctx.signed_in_user()?.slug.ok_or(AppError::NoSlug)?,
        };
        let profile = ctx.client.public_profile(&slug).await?;
        print_card(&profile);
        println!(
            "{}",
            profile_url(&ctx.config.public_base_url, &slug)?
        );
        Ok(())
    }
}

pub fn print_card(profile: &Profile) {
    println!("{}", profile.display_name);
    let lines = [
        ("Title", &profile.title),
        ("Bio", &profile.bio),
        ("Website", &profile.website),
        ("Phone", &profile.contact.phone),
        ("WhatsApp", &profile.contact.whatsapp),
        ("Address", &profile.contact.address),
        ("LinkedIn", &profile.contact.linkedin),
        ("Twitter", &profile.contact.twitter),
        ("Instagram", &profile.contact.instagram),
        ("Photo", &profile.photo_url),
        ("Logo", &profile.company_logo_url),
    ];
    if !profile.email.is_empty() {
        println!("  {:<10} {}", "Email", profile.email);
    }
    for (label, value) in lines {
        if let Some(value) = value {
            println!("  {:<10} {}", label, value);
        }
    }
}
