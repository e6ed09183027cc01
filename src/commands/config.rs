use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let file = paths::config_file()?;
    let mut config = Config::load_from(&file)?;
    if let Some(base_url) = &ctx.base_url {
        config.catalog.base_url = Some(base_url.clone());
    }
    if let Some(token) = &ctx.token {
        config.catalog.token = Some(token.clone());
    }

    ui::header("Configuration");
    ui::kv("Config file", &file.display().to_string());
    if !file.exists() {
        ui::dim("(not found, using defaults)");
    }

    println!();
    ui::info("catalog");
    ui::kv(
        "base_url",
        config.catalog.base_url.as_deref().unwrap_or("(not set)"),
    );
    ui::kv(
        "token",
        &config
            .catalog
            .masked_token()
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    ui::kv("timeout_secs", &config.catalog.timeout_secs.to_string());
    ui::kv("page_size", &config.catalog.page_size.to_string());

    println!();
    ui::info("sync");
    ui::kv("domain", config.sync.domain.as_deref().unwrap_or("(from document)"));
    ui::kv("bump_strategy", &config.sync.bump_strategy.to_string());
    ui::kv("target_state", config.sync.target_state.name());
    ui::kv("retries", &config.sync.retries.to_string());
    ui::kv("shared_events", &config.sync.shared_events.to_string());
    ui::kv("broker_type", &config.sync.broker_type);

    if ctx.verbose > 0 {
        // Never print the raw token
        config.catalog.token = config.catalog.masked_token();
        println!();
        println!("{}", config.to_toml()?);
    }
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", paths::config_file()?.display());
    Ok(())
}
