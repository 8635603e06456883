use linkcard::availability::SlugAvailability;

use super::{describe, Context};
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "check", about = "Check whether a slug is free to claim")]
pub struct Check {
    #[clap(help = "The slug to check")]
    slug: String,
}

impl Check {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        let own = ctx.session.current_user().and_then(|user| user.slug);
        let mut field = SlugAvailability::new(
            ctx.client.clone(),
            own,
            ctx.config.debounce(),
        );
        field.input(&self.slug);
        let status = field.settle().await;
        println!("{}", describe(status));
        Ok(())
    }
}
