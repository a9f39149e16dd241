//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use homeops_config::{Config, Paths, StoreMode};

/// Values to change with `homeops config set`.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub store_mode: Option<StoreMode>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.store_mode.is_none()
            && self.supabase_url.is_none()
            && self.supabase_anon_key.is_none()
            && self.log_level.is_none()
    }

    fn apply(self, config: &mut Config) {
        if let Some(mode) = self.store_mode {
            config.store_mode = mode;
        }
        if let Some(url) = self.supabase_url {
            config.supabase_url = Some(url);
        }
        if let Some(key) = self.supabase_anon_key {
            config.supabase_anon_key = Some(key);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

fn redact(key: Option<&str>) -> String {
    match key {
        Some(key) if key.chars().count() > 8 => {
            format!("{}...", key.chars().take(8).collect::<String>())
        }
        Some(_) => "(set)".to_string(),
        None => "(not set)".to_string(),
    }
}

/// Show the effective configuration. The anon key is shortened.
pub fn show(config: &Config, paths: &Paths, format: &OutputFormat) -> Result<()> {
    let anon_key = redact(config.supabase_anon_key.as_deref());
    let validation = config.validate().err().map(|e| e.to_string());

    match format {
        OutputFormat::Text => {
            output::print_heading("HomeOps configuration");
            output::print_row("Config file", &paths.config_file().display().to_string());
            output::print_row("Log file", &paths.log_file().display().to_string());
            output::print_row("Log level", &config.log_level);
            output::print_row("Store mode", &config.store_mode.to_string());
            output::print_row(
                "Supabase URL",
                config.supabase_url.as_deref().unwrap_or("(not set)"),
            );
            output::print_row("Supabase anon key", &anon_key);
            if let Some(problem) = &validation {
                output::print_row("Problem", problem);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "config_file": paths.config_file(),
                "log_file": paths.log_file(),
                "log_level": config.log_level,
                "store_mode": config.store_mode,
                "supabase_url": config.supabase_url,
                "supabase_anon_key": anon_key,
                "problem": validation,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Apply `update` to the saved configuration file.
///
/// Environment overrides are not folded into what gets saved.
pub fn set(paths: &Paths, update: ConfigUpdate, format: &OutputFormat) -> Result<()> {
    if update.is_empty() {
        output::print_error("Nothing to change; pass at least one option", format);
        return Ok(());
    }

    let config_file = paths.config_file();
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)?
    } else {
        Config::default()
    };

    update.apply(&mut config);
    config.validate()?;
    config.save(paths)?;

    output::print_success(
        &format!("Configuration saved to {}", config_file.display()),
        format,
    );
    Ok(())
}
