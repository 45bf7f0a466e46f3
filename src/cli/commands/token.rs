use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims, USER_ROLE};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id placed in the `sub` claim")]
    pub user_id: i64,
    #[arg(long, default_value = USER_ROLE, help = "Role claim (`admin` unlocks admin routes)")]
    pub role: String,
    #[arg(long, help = "Lifetime in hours (defaults to the configured expiry)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    // Same secret resolution as the server: preset, CONFIG_PATH, then JWT_SECRET
    let config = AppConfig::load()?;
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);

    let claims = Claims::new(args.user_id, args.role, hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            &output_format,
            "Token generated",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        )?,
    }
    Ok(())
}
