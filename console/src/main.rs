use telemetry::init_tracing;

use crate::config::load_console_config;
use crate::core::start_console;

mod config;
mod core;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_name = env!("CARGO_BIN_NAME");

    let _log_flusher = init_tracing(app_name)?;

    let config = load_console_config()?;
    start_console(config).await?;

    Ok(())
}
