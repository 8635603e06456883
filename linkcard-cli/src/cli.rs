use crate::commands::Commands;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "linkcard")]
#[clap(about = "Claim a slug and manage your digital business card", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn signup_requires_a_slug() {
        let parsed = Cli::try_parse_from([
            "linkcard",
            "signup",
            "--name",
            "Bob",
            "--email",
            "bob@example.com",
            "--password",
            "correct horse",
        ]);
        let err = parsed.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let mut cli = Cli::command();
        let signup = cli.find_subcommand_mut("signup").unwrap();
        let slug = signup
            .get_arguments()
            .find(|arg| arg.get_id() == "slug")
            .unwrap();
        assert!(slug.is_required_set());
        let help = slug.get_help().unwrap().to_string();
        assert_eq!(help, "Slug to claim for the new account");
    }
}
