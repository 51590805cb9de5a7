use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::JwtTokenService;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore, UserStore};
use crate::services::profile_service::validate_email;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Register a user record so tokens issued for it resolve to a profile")]
    Add {
        #[arg(help = "Login email address")]
        email: String,
        #[arg(long, default_value = "", help = "Credential hash produced by the registration service")]
        password_hash: String,
        #[arg(long, help = "Also print a bearer token for the new user")]
        token: bool,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add {
            email,
            password_hash,
            token,
        } => {
            let email = validate_email(&email)?.to_string();
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let store = PgStore::new(pool.clone());
            let created = store.create_user(&email, &password_hash).await;
            pool.close().await;
            let user = created.with_context(|| format!("could not add user {}", email))?;

            let token = if token {
                let service = JwtTokenService::from_config(&config.security).context("cannot build token service")?;
                Some(service.issue(user.id)?)
            } else {
                None
            };

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "id": user.id, "email": user.email, "token": token })
                ),
                OutputFormat::Text => {
                    println!("{}", user.id);
                    if let Some(token) = token {
                        println!("{}", token);
                    }
                }
            }
            Ok(())
        }
    }
}
