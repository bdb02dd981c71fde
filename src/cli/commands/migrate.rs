use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = DatabaseManager::connect(&config::config().database).await?;
    let result = manager.migrate().await;
    manager.close().await;
    result?;

    output_success(&output_format, "Migrations applied", None)
}
