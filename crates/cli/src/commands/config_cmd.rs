//! `tickerlens config` — Configuration management commands.

use super::CliError;
use tickerlens_config::AppConfig;

pub fn init(force: bool) -> Result<(), CliError> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    if config_path.exists() && !force {
        println!("  Config already exists: {}", config_path.display());
        println!("  Use --force to overwrite it with defaults.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| CliError::io(format!("Failed to create {}", config_dir.display()), e))?;
    std::fs::write(&config_path, AppConfig::default_toml())
        .map_err(|e| CliError::io(format!("Failed to write {}", config_path.display()), e))?;

    println!("✅ Wrote default config: {}", config_path.display());
    println!("   Set ANTHROPIC_API_KEY (or api_key in the file) before running `analyze`.");
    Ok(())
}

/// Render the effective config as TOML with the key masked.
pub fn render(config: &AppConfig) -> String {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown).unwrap_or_else(|e| format!("# failed to render config: {e}\n"))
}

pub fn show(config: &AppConfig) -> Result<(), CliError> {
    println!("# {}", AppConfig::config_path().display());
    print!("{}", render(config));
    Ok(())
}

pub fn path() -> Result<(), CliError> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
