pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Catalog CLI - operator tooling for the restaurant catalog API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a bearer token for a user and role")]
    Token(commands::token::TokenArgs),

    #[command(about = "Apply the SQL migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Show the role to permission assignment")]
    Roles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Roles => commands::roles::handle(output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_command() {
        let cli = Cli::try_parse_from([
            "catalog", "--json", "token", "--user", "m-1", "--role", "merchant",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Token(args) => {
                assert_eq!(args.user, "m-1");
                assert_eq!(args.role, "merchant");
                assert_eq!(args.client, "cli");
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn unknown_role_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["catalog", "token", "--user", "u", "--role", "root"]).is_err());
    }
}
