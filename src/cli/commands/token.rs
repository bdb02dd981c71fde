use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::acl::{Identity, ROLE_ADMIN, ROLE_CUSTOMER, ROLE_MERCHANT};
use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id placed in the `sub` claim")]
    pub user: String,

    #[arg(long, value_parser = [ROLE_MERCHANT, ROLE_CUSTOMER, ROLE_ADMIN], help = "Role of the caller")]
    pub role: String,

    #[arg(long, default_value = "cli", help = "Client id of the caller")]
    pub client: String,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub expiry_hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let identity = Identity::new(args.user, args.role, args.client);
    let claims = Claims::new(&identity, args.expiry_hours.unwrap_or(security.jwt_expiry_hours))
        .context("failed to build token claims")?;

    let token = generate_jwt(&claims, &security.jwt_secret).context("failed to mint token")?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token generated",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
