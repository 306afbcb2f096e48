use super::load_config;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use discogs_sync_config::{Config, DiscogsCredentials, PathManager, RateLimitPolicy, TOKEN_ENV, USER_ENV};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full, config } => {
            let (config_file, config) = load_config(config)?;
            show_config(&config_file, &config, full, output)
        }
        ConfigCommands::Init { config, force } => {
            let config_file = match config {
                Some(path) => path,
                None => PathManager::default_config_file().map_err(|e| color_eyre::eyre::eyre!("{}", e))?,
            };
            init_config(&config_file, force)?;
            output.success(format!("Wrote default configuration to {}", config_file.display()));
            Ok(())
        }
    }
}

fn init_config(config_file: &Path, force: bool) -> Result<()> {
    if config_file.exists() && !force {
        return Err(color_eyre::eyre::eyre!(
            "Configuration file {} already exists (use --force to overwrite)",
            config_file.display()
        ));
    }
    Config::default()
        .save_to_file(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write {}: {}", config_file.display(), e))
}

fn flag(enabled: bool) -> String {
    if enabled { "✓".green().to_string() } else { "✗".red().to_string() }
}

fn describe_rate_limit(policy: &RateLimitPolicy) -> String {
    match policy {
        RateLimitPolicy::Fail => "fail on 429".to_string(),
        RateLimitPolicy::BackoffRetry { max_attempts, base_delay_ms, max_delay_ms } => {
            format!(
                "retry up to {} times, backoff from {} ms (at most {} ms per wait)",
                max_attempts, base_delay_ms, max_delay_ms
            )
        }
    }
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn show_config(config_file: &Path, config: &Config, full: bool, output: &Output) -> Result<()> {
    let credentials = DiscogsCredentials::from_env().ok();
    let username = credentials.as_ref().map(|c| c.username.clone());
    let token = credentials
        .as_ref()
        .map(|c| if full { c.token().to_string() } else { c.masked_token() });

    let paths = PathManager::resolve(None, config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to resolve output directory: {}", e))?;

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "discogs": {
                "user": username,
                "token": token,
                "base_url": config.discogs.base_url,
                "user_agent": config.discogs.user_agent,
                "per_page": config.discogs.per_page,
                "timeout_secs": config.discogs.timeout_secs,
                "rate_limit": config.discogs.rate_limit,
            },
            "sync": config.sync,
            "paths": {
                "output_dir": paths.output_dir().display().to_string(),
                "cache_file": paths.cache_file().display().to_string(),
                "log_file": paths.log_file().display().to_string(),
            },
        }));
        return Ok(());
    }

    if output.is_quiet() {
        return Ok(());
    }

    let mut info_table = Table::new();
    info_table.set_header(vec![
        Cell::new("Config File").add_attribute(Attribute::Bold),
        Cell::new(config_file.display().to_string()),
    ]);
    info_table.load_preset(comfy_table::presets::UTF8_FULL);
    info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    if !config_file.exists() {
        info_table.add_row(vec![Cell::new("Status"), Cell::new("not found, using defaults")]);
    }
    println!("{}", info_table);
    println!();

    let not_set = || "<not set>".bright_black().to_string();
    let mut discogs = section("Discogs");
    discogs.add_row(vec![
        Cell::new(format!("User (${})", USER_ENV)),
        Cell::new(username.unwrap_or_else(not_set)),
    ]);
    discogs.add_row(vec![
        Cell::new(format!("Token (${})", TOKEN_ENV)),
        Cell::new(token.unwrap_or_else(not_set)),
    ]);
    discogs.add_row(vec![Cell::new("Base URL"), Cell::new(&config.discogs.base_url)]);
    discogs.add_row(vec![Cell::new("User Agent"), Cell::new(&config.discogs.user_agent)]);
    discogs.add_row(vec![Cell::new("Page Size"), Cell::new(config.discogs.per_page)]);
    discogs.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{} seconds", config.discogs.timeout_secs))]);
    discogs.add_row(vec![Cell::new("Rate Limit"), Cell::new(describe_rate_limit(&config.discogs.rate_limit))]);
    println!("{}", discogs);
    println!();

    let mut sync = section("Sync Options");
    sync.add_row(vec![Cell::new("Collection"), Cell::new(flag(config.sync.collection))]);
    sync.add_row(vec![Cell::new("Wantlist"), Cell::new(flag(config.sync.wantlist))]);
    sync.add_row(vec![Cell::new("Master Year Cache"), Cell::new(flag(config.sync.use_master_cache))]);
    sync.add_row(vec![Cell::new("Include Release ID"), Cell::new(flag(config.sync.include_id))]);
    sync.add_row(vec![Cell::new("Include Genre"), Cell::new(flag(config.sync.include_genre))]);
    sync.add_row(vec![Cell::new("Purchasing Marker"), Cell::new(&config.sync.purchasing_marker)]);
    println!("{}", sync);
    println!();

    let mut locations = section("Paths");
    locations.add_row(vec![Cell::new("Output Directory"), Cell::new(paths.output_dir().display())]);
    locations.add_row(vec![Cell::new("Master Cache"), Cell::new(paths.cache_file().display())]);
    locations.add_row(vec![Cell::new("Log File (--log-file)"), Cell::new(paths.log_file().display())]);
    println!("{}", locations);

    Ok(())
}
