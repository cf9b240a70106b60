use config::load_config;
use config::shared::ConsoleConfig;

/// Loads the [`ConsoleConfig`] and validates it.
pub fn load_console_config() -> anyhow::Result<ConsoleConfig> {
    let config = load_config::<ConsoleConfig>()?;
    config.validate()?;

    Ok(config)
}
