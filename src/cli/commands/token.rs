use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::auth::{expiry_from_hours, Claims, JwtTokenService};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::UserId;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a bearer token for a user id")]
    Issue {
        #[arg(help = "User id (UUID)")]
        user_id: UserId,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a bearer token and show its subject")]
    Inspect {
        #[arg(help = "Token, with or without the 'Bearer ' prefix")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = JwtTokenService::from_config(&config.security).context("cannot build token service")?;

    match cmd {
        TokenCommands::Issue { user_id, hours } => {
            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let lifetime = expiry_from_hours(hours).context("invalid --hours")?;
            let claims = Claims::new(user_id, lifetime).context("invalid --hours")?;
            let token = service.issue_claims(&claims)?;
            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "token": token, "user_id": user_id, "expires_at": timestamp(claims.exp) })
                ),
                OutputFormat::Text => println!("{}", token),
            }
            Ok(())
        }
        TokenCommands::Inspect { token } => {
            let raw = token.strip_prefix("Bearer ").unwrap_or(&token).trim();
            let claims = service
                .decode_claims(raw)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({
                        "user_id": claims.sub,
                        "issued_at": timestamp(claims.iat),
                        "expires_at": timestamp(claims.exp),
                    })
                ),
                OutputFormat::Text => {
                    println!("user:    {}", claims.sub);
                    println!("issued:  {}", display_time(claims.iat));
                    println!("expires: {}", display_time(claims.exp));
                }
            }
            Ok(())
        }
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

fn display_time(secs: i64) -> String {
    timestamp(secs)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}
