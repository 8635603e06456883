use std::sync::Arc;

use clap::Subcommand;
use linkcard::registration::{ClaimOutcome, SlugRegistration};
use linkcard::storage::SessionFile;
use linkcard::{ApiClient, ClientConfig, Profile, SessionStore, SlugStatus};

use crate::AppError;

mod check;
mod edit;
mod login;
mod qr;
mod show;
mod signup;

#[derive(Debug, Subcommand)]
pub enum Commands {
    Check(check::Check),
    Signup(signup::Signup),
    Login(login::Login),
    Claim(login::Claim),
    Show(show::Show),
    Edit(edit::Edit),
    Qr(qr::Qr),
    #[command(about = "Forget the stored session")]
    Logout,
}

/// Everything a command needs, assembled once per run.
pub struct Context {
    pub config: ClientConfig,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
}

impl Context {
    pub fn load() -> Result<Self, AppError> {
        let config = ClientConfig::load()?;
        log::debug!("cli: talking to {}", config.api_base_url);
        let client = Arc::new(ApiClient::new(&config)?);
        let file = SessionFile::new("session", &config.session_path()?);
        let session = Arc::new(SessionStore::restore(client.clone(), file)?);
        Ok(Self {
            config,
            client,
            session,
        })
    }

    pub fn signed_in_user(&self) -> Result<Profile, AppError> {
        self.session.current_user().ok_or(AppError::NotSignedIn)
    }

    pub fn registration(&self) -> SlugRegistration {
        SlugRegistration::new(
            self.client.clone(),
            self.client.clone(),
            self.session.clone(),
            self.config.debounce(),
        )
    }
}

/// Run the slug step for `slug` to completion.
pub async fn claim(ctx: &Context, slug: &str) -> Result<(), AppError> {
    let mut registration = ctx.registration();
    registration.input(slug);
    let status = registration.settle().await;
    if !status.is_submittable() {
        return Err(AppError::Rejected(describe(status)));
    }

    match registration.submit().await? {
        ClaimOutcome::Claimed { slug, .. } => {
            let url = linkcard::share::profile_url(
                &ctx.config.public_base_url,
                &slug,
            )?;
            println!("Claimed {}. Your card lives at {}", slug, url);
            Ok(())
        }
        ClaimOutcome::Rejected { message, .. } => {
            Err(AppError::Rejected(message))
        }
    }
}

pub fn describe(status: &SlugStatus) -> String {
    match status {
        SlugStatus::Available { slug } => format!("{} is available", slug),
        SlugStatus::Empty => "Enter a slug".to_owned(),
        other => other
            .message()
            .unwrap_or_else(|| format!("{:?}", other)),
    }
}
