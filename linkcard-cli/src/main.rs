use clap::Parser;

mod cli;
mod commands;
mod error;

use cli::Cli;
use commands::{Commands, Context};
use error::AppError;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Cli::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<(), AppError> {
    let ctx = Context::load()?;
    match &args.command {
        Commands::Check(check) => check.run(&ctx).await,
        Commands::Signup(signup) => signup.run(&ctx).await,
        Commands::Login(login) => login.run(&ctx).await,
        Commands::Claim(claim) => claim.run(&ctx).await,
        Commands::Show(show) => show.run(&ctx).await,
        Commands::Edit(edit) => edit.run(&ctx).await,
        Commands::Qr(qr) => qr.run(&ctx).await,
        Commands::Logout => {
            ctx.session.logout()?;
            println!("Signed out.");
            Ok(())
        }
    }
}
