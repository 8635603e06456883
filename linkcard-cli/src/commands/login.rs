use linkcard::auth::{google_sign_in, log_in, LoginForm};
use linkcard::Navigation;

use super::{claim, Context};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "login", about = "Sign in to an existing account")]
pub struct Login {
    #[clap(long, required_unless_present = "google_code")]
    email: Option<String>,
    #[clap(long, env = "LINKCARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[clap(
        long,
        conflicts_with = "email",
        help = "Authorization code from the Google sign-in redirect"
    )]
    google_code: Option<String>,
}

impl Login {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        let next = match (&self.google_code, &self.email) {
            (Some(code), _) => {
                google_sign_in(&*ctx.client, &ctx.session, code).await?
            }
            (None, Some(email)) => {
                let form = LoginForm {
                    email: email.clone(),
                    password: self.password.clone().unwrap_or_default(),
                };
                let errors = form.validate();
                if !errors.is_empty() {
                    return Err(AppError::Invalid(errors));
                }
                log_in(&*ctx.client, &ctx.session, &form).await?
            }
            (None, None) => return Err(AppError::NotSignedIn),
        };

        let user = ctx.signed_in_user()?;
        println!("Signed in as {}.", user.display_name);
        if next == Navigation::ClaimSlug {
            println!("Pick a slug next with `linkcard claim <slug>`.");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "claim", about = "Claim a slug for the signed-in account")]
pub struct Claim {
    slug: String,
}

impl Claim {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        ctx.signed_in_user()?;
        claim(ctx, &self.slug).await
    }
}
