use linkcard::auth::{sign_up, SignupForm};
use linkcard::Navigation;

use super::{claim, Context};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "signup", about = "Create an account and claim its slug")]
pub struct Signup {
    #[clap(long, help = "Your full name")]
    name: String,
    #[clap(long, help = "Email address to sign in with")]
    email: String,
    #[clap(long, env = "LINKCARD_PASSWORD", hide_env_values = true)]
    password: String,
    #[clap(
        long,
        help = "Slug to claim for the new account"
    )]
    slug: String,
}

impl Signup {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        let form = SignupForm {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            confirm_password: self.password.clone(),
        };
        let errors = form.validate();
        if !errors.is_empty() {
            return Err(AppError::Invalid(errors));
        }

        match sign_up(&*ctx.client, &ctx.session, &form).await? {
            Navigation::ClaimSlug => claim(ctx, &self.slug).await,
            Navigation::Dashboard => {
                println!("Account already has a slug; you are signed in.");
                Ok(())
            }
        }
    }
}
