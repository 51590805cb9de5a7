use anyhow::Context;
use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "Create the users and notes tables if missing")]
    Init,
}

pub async fn handle(cmd: SchemaCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::Init => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let store = PgStore::new(pool.clone());
            store.ensure_schema().await.context("schema bootstrap failed")?;
            pool.close().await;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "schema": "ready" })),
                OutputFormat::Text => println!("Schema ready"),
            }
            Ok(())
        }
    }
}
